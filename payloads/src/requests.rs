use crate::StudentId;
use serde::{Deserialize, Serialize};

pub const MONTH_FORMAT_LEN: usize = 7;

#[derive(Serialize, Deserialize)]
pub struct LoginCredentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklyReportQuery {
    pub student_id: StudentId,
    /// `YYYY-MM`
    pub month: String,
}

impl WeeklyReportQuery {
    /// Check the month is shaped like `YYYY-MM` with a real month number.
    pub fn has_valid_month(&self) -> bool {
        let bytes = self.month.as_bytes();
        if bytes.len() != MONTH_FORMAT_LEN || bytes[4] != b'-' {
            return false;
        }
        let digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
        let (year, month) = (&self.month[..4], &self.month[5..]);
        digits(year)
            && digits(month)
            && matches!(month.parse::<u8>(), Ok(1..=12))
    }
}
