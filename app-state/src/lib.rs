//! Client-side data core for the school apps: request state, the auth
//! session signal and the per-entity select-list caches.

pub mod auth;
pub mod config;
pub mod entities;
pub mod entity_cache;
pub mod error;
pub mod logs;
pub mod reports;
pub mod request;

pub use auth::{AuthService, AuthSession, AuthStore};
pub use config::{ClientConfig, ConfigError, get_api_client};
pub use entities::{EntityCaches, EntityKind, OptionCache};
pub use entity_cache::{
    CachePhase, CacheSubscription, EntityCache, EntityCacheState,
};
pub use error::{ErrorInfo, ErrorKind, FetchError};
pub use reports::weekly_report_request;
pub use request::{Request, RequestState};
