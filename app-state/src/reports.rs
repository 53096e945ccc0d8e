use std::sync::Arc;

use payloads::{APIClient, requests::WeeklyReportQuery, responses::WeeklyReport};

use crate::{error::FetchError, request::Request};

/// Screen-local request for one student's weekly attendance in a month.
///
/// Malformed months are rejected before anything is sent.
pub fn weekly_report_request(
    client: Arc<APIClient>,
) -> Request<WeeklyReportQuery, WeeklyReport> {
    Request::new(move |query: WeeklyReportQuery| {
        let client = client.clone();
        async move {
            if !query.has_valid_month() {
                return Err(FetchError::unknown(format!(
                    "Invalid month \"{}\", expected YYYY-MM",
                    query.month
                )));
            }
            Ok(client.weekly_report(&query).await?)
        }
    })
}
