use std::sync::{PoisonError, RwLock};

use crate::{
    SessionToken, requests,
    responses::{self, ApiErrorBody, ListResponse, SelectOption},
};
use reqwest::{RequestBuilder, StatusCode};
use serde::Serialize;

type ReqwestResult = Result<reqwest::Response, reqwest::Error>;

/// An API client for interfacing with the school backend.
pub struct APIClient {
    pub address: String,
    pub inner_client: reqwest::Client,
    token: RwLock<Option<SessionToken>>,
}

/// Token handling
impl APIClient {
    pub fn new(
        address: impl Into<String>,
        inner_client: reqwest::Client,
    ) -> Self {
        Self {
            address: address.into(),
            inner_client,
            token: RwLock::new(None),
        }
    }

    /// Attach `token` as a bearer credential to every following request.
    pub fn set_token(&self, token: SessionToken) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) =
            Some(token);
    }

    pub fn clear_token(&self) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    pub fn has_token(&self) -> bool {
        self.current_token().is_some()
    }

    fn current_token(&self) -> Option<SessionToken> {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// Helper methods for http actions
impl APIClient {
    fn format_url(&self, path: &str) -> String {
        format!("{}/api/{path}", &self.address)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.current_token() {
            Some(token) => request.bearer_auth(token.expose()),
            None => request,
        }
    }

    async fn post(&self, path: &str, body: &impl Serialize) -> ReqwestResult {
        let request = self.inner_client.post(self.format_url(path)).json(body);
        self.authorize(request).send().await
    }

    async fn empty_post(&self, path: &str) -> ReqwestResult {
        let request = self.inner_client.post(self.format_url(path));
        self.authorize(request).send().await
    }

    async fn empty_get(&self, path: &str) -> ReqwestResult {
        let request = self.inner_client.get(self.format_url(path));
        self.authorize(request).send().await
    }

    async fn get_with_query(
        &self,
        path: &str,
        query: &impl Serialize,
    ) -> ReqwestResult {
        let request = self.inner_client.get(self.format_url(path)).query(query);
        self.authorize(request).send().await
    }

    async fn options(
        &self,
        path: &str,
    ) -> Result<Vec<SelectOption>, ClientError> {
        let response = self.empty_get(path).await?;
        let list: ListResponse<SelectOption> = ok_body(response).await?;
        Ok(list.into_items())
    }
}

/// Methods on the backend API
impl APIClient {
    pub async fn health_check(&self) -> Result<(), ClientError> {
        let response = self.empty_get("health_check").await?;
        ok_empty(response).await
    }

    /// Exchange credentials for a session token and the user's profile.
    ///
    /// The token is not stored on the client; see [`APIClient::set_token`].
    pub async fn login(
        &self,
        details: &requests::LoginCredentials,
    ) -> Result<responses::LoginResponse, ClientError> {
        let response = self.post("login", details).await?;
        ok_body(response).await
    }

    pub async fn logout(&self) -> Result<(), ClientError> {
        let response = self.empty_post("logout").await?;
        ok_empty(response).await
    }

    /// Check if the current token is still accepted.
    pub async fn login_check(&self) -> Result<bool, ClientError> {
        let response = self.empty_post("login_check").await?;
        match response.status() {
            StatusCode::OK => Ok(true),
            StatusCode::UNAUTHORIZED => Ok(false),
            _ => Err(ClientError::APIError(
                response.status(),
                response.text().await?,
            )),
        }
    }

    /// Get the current user's profile information.
    pub async fn user_profile(
        &self,
    ) -> Result<responses::UserProfile, ClientError> {
        let response = self.empty_get("user_profile").await?;
        ok_body(response).await
    }

    pub async fn student_options(
        &self,
    ) -> Result<Vec<SelectOption>, ClientError> {
        self.options("students/options").await
    }

    pub async fn teacher_options(
        &self,
    ) -> Result<Vec<SelectOption>, ClientError> {
        self.options("teachers/options").await
    }

    pub async fn parent_options(
        &self,
    ) -> Result<Vec<SelectOption>, ClientError> {
        self.options("parents/options").await
    }

    pub async fn class_options(&self) -> Result<Vec<SelectOption>, ClientError> {
        self.options("classes/options").await
    }

    /// Attendance summary for one student and month.
    pub async fn weekly_report(
        &self,
        query: &requests::WeeklyReportQuery,
    ) -> Result<responses::WeeklyReport, ClientError> {
        let response = self.get_with_query("reports/weekly", query).await?;
        ok_body(response).await
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// An unhandled API error to display, containing response text.
    #[error("{1}")]
    APIError(StatusCode, String),
    #[error("Network error. Please check your connection.")]
    Network(#[from] reqwest::Error),
}

impl ClientError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::APIError(status, _) => Some(*status),
            Self::Network(e) => e.status(),
        }
    }

    /// The structured error body, if the server sent JSON.
    pub fn body(&self) -> Option<ApiErrorBody> {
        match self {
            Self::APIError(_, text) => serde_json::from_str(text).ok(),
            Self::Network(_) => None,
        }
    }
}

/// Deserialize a successful request into the desired type, or return an
/// appropriate error.
pub async fn ok_body<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, ClientError> {
    if !response.status().is_success() {
        return Err(ClientError::APIError(
            response.status(),
            response.text().await?,
        ));
    }
    Ok(response.json::<T>().await?)
}

/// Check that an empty response is OK, returning a ClientError if not.
pub async fn ok_empty(response: reqwest::Response) -> Result<(), ClientError> {
    if !response.status().is_success() {
        return Err(ClientError::APIError(
            response.status(),
            response.text().await?,
        ));
    }
    Ok(())
}
