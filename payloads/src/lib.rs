mod api_client;
pub mod requests;
pub mod responses;

pub use api_client::{APIClient, ClientError, ok_body, ok_empty};

use std::{fmt, sync::Arc};

use derive_more::{Display, From};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// Id type wrapper helps ensure we don't mix up ids for different records.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Display,
    From,
    Serialize,
    Deserialize,
)]
pub struct UserId(pub Uuid);

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Display,
    From,
    Serialize,
    Deserialize,
)]
pub struct StudentId(pub Uuid);

/// Bearer token issued by the backend on login.
///
/// Cloning shares the same secret allocation. The token never shows up in
/// `Debug` output or logs.
#[derive(Clone)]
pub struct SessionToken(Arc<SecretString>);

impl SessionToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(Arc::new(SecretString::from(token.into())))
    }

    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken([REDACTED])")
    }
}

impl<'de> Deserialize<'de> for SessionToken {
    fn deserialize<D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(SessionToken::new)
    }
}
