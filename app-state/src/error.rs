//! The fixed error shape every fetch function reports.

use payloads::ClientError;

pub const GENERIC_MESSAGE: &str = "Request failed";
pub const NETWORK_MESSAGE: &str =
    "Network error. Please check your connection.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Network,
    Server,
    Unknown,
}

/// Failure of an injected fetch function.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    /// The server was never reached.
    #[error("{message}")]
    Network { message: String },
    /// The server answered with a non-success status.
    #[error("{message}")]
    Server {
        message: String,
        status: u16,
        code: Option<String>,
    },
    #[error("{message}")]
    Unknown {
        message: String,
        status: Option<u16>,
    },
}

/// Structured error detail kept alongside the display message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorInfo {
    pub message: String,
    pub status: Option<u16>,
    pub code: Option<String>,
}

impl FetchError {
    pub fn network() -> Self {
        Self::Network {
            message: NETWORK_MESSAGE.into(),
        }
    }

    pub fn server(status: u16, message: impl Into<String>) -> Self {
        Self::Server {
            message: message.into(),
            status,
            code: None,
        }
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::Unknown {
            message: message.into(),
            status: None,
        }
    }

    /// Attach a server error code. No-op for other kinds.
    pub fn with_code(mut self, new_code: impl Into<String>) -> Self {
        if let Self::Server { code, .. } = &mut self {
            *code = Some(new_code.into());
        }
        self
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Network { .. } => ErrorKind::Network,
            Self::Server { .. } => ErrorKind::Server,
            Self::Unknown { .. } => ErrorKind::Unknown,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Network { message }
            | Self::Server { message, .. }
            | Self::Unknown { message, .. } => message,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Network { .. } => None,
            Self::Server { status, .. } => Some(*status),
            Self::Unknown { status, .. } => *status,
        }
    }

    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Server { code, .. } => code.as_deref(),
            _ => None,
        }
    }

    pub fn info(&self) -> ErrorInfo {
        ErrorInfo {
            message: self.message().to_owned(),
            status: self.status(),
            code: self.code().map(str::to_owned),
        }
    }
}

impl From<ClientError> for FetchError {
    fn from(e: ClientError) -> Self {
        let body = e.body().unwrap_or_default();
        match e {
            ClientError::APIError(status, _) => {
                let message = match body.display_message() {
                    Some(message) => message.to_owned(),
                    None => format!(
                        "{GENERIC_MESSAGE} with status {}",
                        status.as_u16()
                    ),
                };
                Self::Server {
                    message,
                    status: status.as_u16(),
                    code: body.code,
                }
            }
            // The server answered but the body was not what we expected.
            ClientError::Network(e) if e.is_decode() => Self::Unknown {
                message: GENERIC_MESSAGE.into(),
                status: e.status().map(|s| s.as_u16()),
            },
            ClientError::Network(_) => Self::network(),
        }
    }
}
