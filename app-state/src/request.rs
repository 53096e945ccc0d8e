//! Generic request state wrapper around an injected async fetch function.

use std::{
    fmt,
    future::Future,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use futures::future::{BoxFuture, FutureExt};
use tokio::sync::watch;

use crate::error::{ErrorInfo, FetchError};

type FetchFn<A, T> =
    dyn Fn(A) -> BoxFuture<'static, Result<T, FetchError>> + Send + Sync;

/// Observable state of a [`Request`].
#[derive(Debug, Clone, PartialEq)]
pub struct RequestState<T> {
    /// Last successful result. Kept when a later call fails.
    pub data: Option<T>,
    pub is_loading: bool,
    pub error: Option<String>,
    pub error_info: Option<ErrorInfo>,
}

impl<T> Default for RequestState<T> {
    fn default() -> Self {
        Self {
            data: None,
            is_loading: false,
            error: None,
            error_info: None,
        }
    }
}

/// Wraps a fetch function with `{data, is_loading, error}` bookkeeping.
///
/// Clones share the same state. Calls are not sequenced: when two calls
/// overlap, whichever settles last determines `data` and `error`. Only the
/// most recently started call clears `is_loading`.
///
/// # Example
///
/// ```rust,ignore
/// let report = Request::new(move |query: WeeklyReportQuery| {
///     let client = client.clone();
///     async move { Ok(client.weekly_report(&query).await?) }
/// });
/// match report.request(query).await {
///     Ok(report) => show(report),
///     Err(e) => toast(e.message()),
/// }
/// ```
pub struct Request<A, T> {
    fetch: Arc<FetchFn<A, T>>,
    state: Arc<watch::Sender<RequestState<T>>>,
    latest: Arc<AtomicU64>,
}

impl<A, T> Clone for Request<A, T> {
    fn clone(&self) -> Self {
        Self {
            fetch: self.fetch.clone(),
            state: self.state.clone(),
            latest: self.latest.clone(),
        }
    }
}

impl<A, T: fmt::Debug> fmt::Debug for Request<A, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("state", &*self.state.borrow())
            .finish_non_exhaustive()
    }
}

impl<A, T> Request<A, T>
where
    A: Send + 'static,
    T: Clone + Send + Sync + 'static,
{
    pub fn new<F, Fut>(fetch: F) -> Self
    where
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, FetchError>> + Send + 'static,
    {
        let (state, _) = watch::channel(RequestState::default());
        Self {
            fetch: Arc::new(move |args: A| fetch(args).boxed()),
            state: Arc::new(state),
            latest: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Run the fetch function and record its outcome.
    ///
    /// The error is both stored in the state and returned, so imperative
    /// callers can branch on it while observers render it.
    pub async fn request(&self, args: A) -> Result<T, FetchError> {
        let mut call = 0;
        self.state.send_modify(|state| {
            call = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
            state.is_loading = true;
            state.error = None;
            state.error_info = None;
        });
        tracing::debug!(call, "request started");

        let result = (self.fetch)(args).await;

        match &result {
            Ok(data) => {
                tracing::debug!(call, "request succeeded");
                self.state.send_modify(|state| {
                    self.settle_loading(state, call);
                    state.data = Some(data.clone());
                    state.error = None;
                    state.error_info = None;
                });
            }
            Err(e) => {
                tracing::debug!(
                    call,
                    kind = ?e.kind(),
                    status = ?e.status(),
                    "request failed: {e}"
                );
                self.state.send_modify(|state| {
                    self.settle_loading(state, call);
                    state.error = Some(e.message().to_owned());
                    state.error_info = Some(e.info());
                });
            }
        }

        result
    }

    // An older call settling while a newer one runs leaves the flag set.
    fn settle_loading(&self, state: &mut RequestState<T>, call: u64) {
        if self.latest.load(Ordering::SeqCst) == call {
            state.is_loading = false;
        }
    }

    pub fn state(&self) -> RequestState<T> {
        self.state.borrow().clone()
    }

    pub fn data(&self) -> Option<T> {
        self.state.borrow().data.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().is_loading
    }

    pub fn error(&self) -> Option<String> {
        self.state.borrow().error.clone()
    }

    pub fn error_info(&self) -> Option<ErrorInfo> {
        self.state.borrow().error_info.clone()
    }

    /// Receiver notified on every state transition.
    pub fn subscribe(&self) -> watch::Receiver<RequestState<T>> {
        self.state.subscribe()
    }

    /// Forget data and errors. Does not affect calls still in flight.
    pub fn reset(&self) {
        self.state.send_replace(RequestState::default());
    }
}
