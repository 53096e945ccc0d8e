use std::time::Duration;

use payloads::APIClient;

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Client settings.
///
/// Environment variables can be set directly or loaded from a .env file:
/// - BACKEND_URL: base url of the school API, e.g. `https://school.example.com`
/// - REQUEST_TIMEOUT_SECS: per-request timeout (optional, defaults to 30)
/// - LOG_FILTER: default tracing filter when RUST_LOG is unset (optional,
///   defaults to "info")
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub backend_url: String,
    pub request_timeout: Duration,
    pub log_filter: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing environment variable {0}")]
    Missing(&'static str),
    #[error("invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}

impl ClientConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        // Silently ignore a missing .env file
        let _ = dotenvy::dotenv();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the config from any variable source.
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let backend_url = lookup("BACKEND_URL")
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty())
            .ok_or(ConfigError::Missing("BACKEND_URL"))?;

        let request_timeout = match lookup("REQUEST_TIMEOUT_SECS") {
            None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            Some(value) => match value.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    return Err(ConfigError::Invalid {
                        name: "REQUEST_TIMEOUT_SECS",
                        value,
                    });
                }
            },
        };

        let log_filter = lookup("LOG_FILTER")
            .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());

        Ok(Self {
            backend_url,
            request_timeout,
            log_filter,
        })
    }
}

/// Build an API client for `config`. The request timeout is enforced by the
/// underlying http client.
pub fn get_api_client(
    config: &ClientConfig,
) -> Result<APIClient, reqwest::Error> {
    let inner_client = reqwest::Client::builder()
        .timeout(config.request_timeout)
        .build()?;
    Ok(APIClient::new(config.backend_url.clone(), inner_client))
}
