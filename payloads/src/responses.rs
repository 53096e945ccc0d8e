use crate::{SessionToken, StudentId, UserId};
use jiff::civil::Date;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Teacher,
    Parent,
}

/// The signed-in user as returned by `user_profile` and `login`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: Role,
}

#[derive(Debug, Deserialize)]
pub struct LoginResponse {
    pub token: SessionToken,
    pub user: UserProfile,
}

/// A `{value, label}` pair used to populate select inputs (students,
/// teachers, parents, classes).
///
/// `value` is the record's stable id in string form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub per_page: u32,
    pub total: u64,
    pub total_pages: u32,
}

/// Paginated envelope. Some endpoints name the list `items` instead of
/// `data`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paginated<T> {
    #[serde(alias = "items")]
    pub data: Vec<T>,
    #[serde(default)]
    pub pagination: Option<Pagination>,
}

/// List endpoints answer with either a bare array or a paginated envelope.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ListResponse<T> {
    Bare(Vec<T>),
    Envelope(Paginated<T>),
}

impl<T> ListResponse<T> {
    /// The listed records in server order, whichever shape was sent.
    pub fn into_items(self) -> Vec<T> {
        match self {
            Self::Bare(items) => items,
            Self::Envelope(page) => page.data,
        }
    }

    pub fn pagination(&self) -> Option<&Pagination> {
        match self {
            Self::Bare(_) => None,
            Self::Envelope(page) => page.pagination.as_ref(),
        }
    }
}

/// Attendance summary for one student over one calendar month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklyReport {
    pub student_id: StudentId,
    /// `YYYY-MM`
    pub month: String,
    pub weeks: Vec<WeekSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekSummary {
    pub week_start: Date,
    pub present_days: u32,
    pub absent_days: u32,
    pub remarks: Option<String>,
}

/// Body the backend sends with a rejected request. Every field is optional
/// because older endpoints only send `error`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ApiErrorBody {
    pub message: Option<String>,
    pub error: Option<String>,
    pub code: Option<String>,
}

impl ApiErrorBody {
    /// The first non-blank human readable message, if any.
    pub fn display_message(&self) -> Option<&str> {
        [self.message.as_deref(), self.error.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|m| !m.is_empty())
    }
}
