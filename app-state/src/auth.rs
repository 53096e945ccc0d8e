//! Authentication session signal and the service driving it.

use std::sync::Arc;

use payloads::{
    APIClient, SessionToken, UserId, requests, responses::UserProfile,
};
use tokio::sync::watch;

use crate::error::FetchError;

/// Authentication state read by the caches.
#[derive(Debug, Clone, Default)]
pub struct AuthSession {
    pub user: Option<UserProfile>,
    pub token: Option<SessionToken>,
    pub is_loading: bool,
    /// Number of sign-outs so far. Lets a watcher that only sees the latest
    /// value notice a logout that was immediately followed by a login.
    pub sign_outs: u64,
}

impl AuthSession {
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.user.as_ref().map(|user| user.id)
    }
}

/// Owner of the [`AuthSession`] signal. Everything else only holds
/// receivers from [`AuthStore::subscribe`].
#[derive(Debug, Clone)]
pub struct AuthStore {
    session: Arc<watch::Sender<AuthSession>>,
}

impl Default for AuthStore {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthStore {
    pub fn new() -> Self {
        let (session, _) = watch::channel(AuthSession::default());
        Self {
            session: Arc::new(session),
        }
    }

    pub fn session(&self) -> AuthSession {
        self.session.borrow().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.borrow().is_authenticated()
    }

    pub fn subscribe(&self) -> watch::Receiver<AuthSession> {
        self.session.subscribe()
    }

    pub fn sign_in(&self, user: UserProfile, token: Option<SessionToken>) {
        tracing::info!(user_id = %user.id, role = ?user.role, "signed in");
        self.session.send_modify(|session| {
            session.user = Some(user);
            session.token = token;
            session.is_loading = false;
        });
    }

    pub fn sign_out(&self) {
        tracing::info!("signed out");
        self.session.send_modify(|session| {
            session.user = None;
            session.token = None;
            session.is_loading = false;
            session.sign_outs += 1;
        });
    }

    pub fn set_loading(&self, is_loading: bool) {
        self.session.send_if_modified(|session| {
            let changed = session.is_loading != is_loading;
            session.is_loading = is_loading;
            changed
        });
    }
}

/// Login, logout and startup session checks against the backend.
pub struct AuthService {
    client: Arc<APIClient>,
    store: AuthStore,
}

impl AuthService {
    pub fn new(client: Arc<APIClient>, store: AuthStore) -> Self {
        Self { client, store }
    }

    pub fn store(&self) -> &AuthStore {
        &self.store
    }

    #[tracing::instrument(skip_all, fields(email = %credentials.email))]
    pub async fn login(
        &self,
        credentials: &requests::LoginCredentials,
    ) -> Result<UserProfile, FetchError> {
        self.store.set_loading(true);
        match self.client.login(credentials).await {
            Ok(response) => {
                self.client.set_token(response.token.clone());
                self.store
                    .sign_in(response.user.clone(), Some(response.token));
                Ok(response.user)
            }
            Err(e) => {
                let e = FetchError::from(e);
                tracing::warn!("login failed: {e}");
                self.store.set_loading(false);
                Err(e)
            }
        }
    }

    /// Sign out locally even if the server cannot be reached.
    pub async fn logout(&self) {
        if let Err(e) = self.client.logout().await {
            tracing::warn!("server logout failed: {e}");
        }
        self.client.clear_token();
        self.store.sign_out();
    }

    /// Check whether a previously stored token is still valid and load the
    /// profile for it. Any failure leaves the session signed out.
    pub async fn restore_session(&self, token: Option<SessionToken>) {
        let Some(token) = token else {
            self.store.sign_out();
            return;
        };

        self.store.set_loading(true);
        self.client.set_token(token.clone());

        let profile = match self.client.login_check().await {
            Ok(true) => self.client.user_profile().await.map_err(FetchError::from),
            Ok(false) => Err(FetchError::server(401, "Session expired")),
            Err(e) => Err(FetchError::from(e)),
        };

        match profile {
            Ok(user) => self.store.sign_in(user, Some(token)),
            Err(e) => {
                tracing::info!("could not restore session: {e}");
                self.client.clear_token();
                self.store.sign_out();
            }
        }
    }
}
