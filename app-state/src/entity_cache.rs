//! Session-scoped cache of a single entity list.
//!
//! The cache moves between three phases:
//!
//! - `Empty`: nothing cached. Left on mount with a signed-in user, or on
//!   [`EntityCache::refresh`].
//! - `Loading`: a fetch is in flight. A non-empty result moves to
//!   `Populated`; an empty result or a failure goes back to `Empty`.
//! - `Populated`: the list is served to every subscriber until a refresh or
//!   a logout.
//!
//! Logout clears the list immediately, whatever the phase. Fetches already
//! in flight are not cancelled and still write their result when they
//! settle.

use std::{fmt, future::Future, sync::Arc};

use payloads::UserId;
use tokio::{sync::watch, task::JoinHandle};

use crate::{
    auth::AuthSession,
    entities::EntityKind,
    error::{ErrorInfo, FetchError},
    request::{Request, RequestState},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePhase {
    Empty,
    Loading,
    Populated,
}

/// Snapshot handed to consumers.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityCacheState<E> {
    pub items: Vec<E>,
    pub loading: bool,
    pub error: Option<ErrorInfo>,
    pub error_message: Option<String>,
}

pub struct EntityCache<E> {
    inner: Arc<Inner<E>>,
}

struct Inner<E> {
    kind: EntityKind,
    request: Request<(), Vec<E>>,
    items: watch::Sender<Vec<E>>,
    auth: watch::Receiver<AuthSession>,
}

impl<E> Clone for EntityCache<E> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<E> fmt::Debug for EntityCache<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityCache")
            .field("kind", &self.inner.kind)
            .field("len", &self.inner.items.borrow().len())
            .finish_non_exhaustive()
    }
}

impl<E> EntityCache<E>
where
    E: Clone + Send + Sync + 'static,
{
    pub fn new<F, Fut>(
        kind: EntityKind,
        auth: watch::Receiver<AuthSession>,
        fetch: F,
    ) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Vec<E>, FetchError>> + Send + 'static,
    {
        let (items, _) = watch::channel(Vec::new());
        Self {
            inner: Arc::new(Inner {
                kind,
                request: Request::new(move |()| fetch()),
                items,
                auth,
            }),
        }
    }

    pub fn kind(&self) -> EntityKind {
        self.inner.kind
    }

    pub fn items(&self) -> Vec<E> {
        self.inner.items.borrow().clone()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.items.borrow().is_empty()
    }

    pub fn is_loading(&self) -> bool {
        self.inner.request.is_loading()
    }

    pub fn error(&self) -> Option<ErrorInfo> {
        self.inner.request.error_info()
    }

    pub fn error_message(&self) -> Option<String> {
        self.inner.request.error()
    }

    pub fn snapshot(&self) -> EntityCacheState<E> {
        let RequestState {
            is_loading,
            error,
            error_info,
            ..
        } = self.inner.request.state();
        EntityCacheState {
            items: self.items(),
            loading: is_loading,
            error: error_info,
            error_message: error,
        }
    }

    pub fn phase(&self) -> CachePhase {
        if self.is_loading() {
            CachePhase::Loading
        } else if self.is_empty() {
            CachePhase::Empty
        } else {
            CachePhase::Populated
        }
    }

    /// Receiver notified whenever the cached list changes.
    pub fn subscribe(&self) -> watch::Receiver<Vec<E>> {
        self.inner.items.subscribe()
    }

    /// Receiver for the loading and error state of the underlying request.
    pub fn subscribe_request(&self) -> watch::Receiver<RequestState<Vec<E>>> {
        self.inner.request.subscribe()
    }

    fn is_authenticated(&self) -> bool {
        self.inner.auth.borrow().is_authenticated()
    }

    /// Fetch if a user is signed in, nothing is cached and no fetch is
    /// already running. Returns whether a fetch was made.
    ///
    /// This is a best-effort guard, not a lock: two callers racing past it
    /// before either starts will both fetch.
    pub async fn ensure_loaded(&self) -> bool {
        if !self.is_authenticated() || !self.is_empty() || self.is_loading() {
            return false;
        }
        self.load().await;
        true
    }

    /// Drop the cached list and fetch it again.
    ///
    /// The list is empty from the moment this is called until the new
    /// result arrives. Without a signed-in user the list is only cleared.
    pub async fn refresh(&self) {
        self.clear();
        if !self.is_authenticated() {
            tracing::debug!(
                entity = %self.inner.kind,
                "refresh skipped, no user"
            );
            return;
        }
        self.load().await;
    }

    pub fn clear(&self) {
        self.inner.items.send_if_modified(|items| {
            if items.is_empty() {
                return false;
            }
            items.clear();
            true
        });
    }

    async fn load(&self) {
        let kind = self.inner.kind;
        // The cache has no caller to hand the error to; it stays in the
        // request state for display.
        match self.inner.request.request(()).await {
            Ok(items) if items.is_empty() => {
                tracing::debug!(entity = %kind, "fetched empty list");
            }
            Ok(items) => {
                tracing::debug!(entity = %kind, count = items.len(), "cached");
                self.inner.items.send_replace(items);
            }
            Err(e) => {
                tracing::warn!(entity = %kind, "failed to load: {e}");
            }
        }
    }

    /// React to an authentication change.
    ///
    /// Without a user the list is cleared right away. With a user, the
    /// initial fetch runs on its own task so a logout arriving meanwhile is
    /// never held up behind it.
    pub fn on_auth_change(
        &self,
        session: &AuthSession,
    ) -> Option<JoinHandle<bool>> {
        if !session.is_authenticated() {
            self.clear();
            return None;
        }
        let cache = self.clone();
        Some(tokio::spawn(async move { cache.ensure_loaded().await }))
    }

    /// Start following the auth signal until the returned subscription is
    /// detached or dropped. Must be called inside a tokio runtime.
    ///
    /// Every sign-out clears the list, including one followed by a sign-in
    /// before the watcher got to run.
    pub fn attach(&self) -> CacheSubscription {
        let cache = self.clone();
        let mut auth = self.inner.auth.clone();
        let handle = tokio::spawn(async move {
            let mut seen: Option<(u64, Option<UserId>)> = None;
            loop {
                let session = auth.borrow_and_update().clone();
                let current = (session.sign_outs, session.user_id());
                if let Some((sign_outs, _)) = seen {
                    // a logout may have been overwritten by a later login
                    if sign_outs != session.sign_outs {
                        cache.clear();
                    }
                }
                // loading toggles alone leave the cache alone
                if seen != Some(current) {
                    cache.on_auth_change(&session);
                    seen = Some(current);
                }
                if auth.changed().await.is_err() {
                    break;
                }
            }
        });
        CacheSubscription { handle }
    }
}

/// Keeps an [`EntityCache`] in step with the auth signal while alive.
#[derive(Debug)]
pub struct CacheSubscription {
    handle: JoinHandle<()>,
}

impl CacheSubscription {
    pub fn is_attached(&self) -> bool {
        !self.handle.is_finished()
    }

    /// Stop following the auth signal. The cached list is left as is.
    pub fn detach(self) {
        self.handle.abort();
    }
}

impl Drop for CacheSubscription {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
