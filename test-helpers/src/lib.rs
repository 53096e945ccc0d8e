pub mod mock;

use std::{
    collections::VecDeque,
    future::Future,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use app_state::{
    AuthStore, EntityKind, FetchError, OptionCache, logs::get_subscriber,
};
use payloads::{ClientError, responses::SelectOption};
use reqwest::StatusCode;
use tokio::sync::{oneshot, watch};
use tracing_log::LogTracer;
use tracing_subscriber::util::SubscriberInitExt;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

pub use mock::*;

/// How long `wait_until` waits before failing the test.
pub const WAIT_TIMEOUT: Duration = Duration::from_secs(2);

/// Install the test subscriber once; later calls are no-ops.
pub fn init_test_logging() {
    let subscriber = get_subscriber("error");
    let _ = LogTracer::init();
    let _ = subscriber.try_init();
}

enum Step<T> {
    Ready(Result<T, FetchError>),
    Gated(oneshot::Receiver<Result<T, FetchError>>),
}

/// A fetch function whose answers are scripted by the test.
///
/// Each call takes the next scripted step in order. Gated steps stay
/// pending until the test settles them through the returned [`Gate`].
pub struct ScriptedFetch<T> {
    calls: Arc<AtomicUsize>,
    script: Arc<Mutex<VecDeque<Step<T>>>>,
}

impl<T> Clone for ScriptedFetch<T> {
    fn clone(&self) -> Self {
        Self {
            calls: self.calls.clone(),
            script: self.script.clone(),
        }
    }
}

impl<T> Default for ScriptedFetch<T> {
    fn default() -> Self {
        Self {
            calls: Arc::new(AtomicUsize::new(0)),
            script: Arc::new(Mutex::new(VecDeque::new())),
        }
    }
}

impl<T: Send + 'static> ScriptedFetch<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ok(&self, value: T) -> &Self {
        self.push(Step::Ready(Ok(value)))
    }

    pub fn fail(&self, error: FetchError) -> &Self {
        self.push(Step::Ready(Err(error)))
    }

    /// Script a call that stays pending until the gate is settled.
    pub fn gated(&self) -> Gate<T> {
        let (sender, receiver) = oneshot::channel();
        self.push(Step::Gated(receiver));
        Gate(sender)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn call(
        &self,
    ) -> impl Future<Output = Result<T, FetchError>> + Send + use<T> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let step = self.script.lock().unwrap().pop_front();
        async move {
            match step {
                Some(Step::Ready(result)) => result,
                Some(Step::Gated(receiver)) => receiver.await.unwrap_or_else(
                    |_| Err(FetchError::unknown("gate dropped")),
                ),
                None => Err(FetchError::unknown("no scripted response")),
            }
        }
    }

    fn push(&self, step: Step<T>) -> &Self {
        self.script.lock().unwrap().push_back(step);
        self
    }
}

/// Settles one gated call of a [`ScriptedFetch`].
pub struct Gate<T>(oneshot::Sender<Result<T, FetchError>>);

impl<T> Gate<T> {
    pub fn resolve(self, value: T) {
        let _ = self.0.send(Ok(value));
    }

    pub fn reject(self, error: FetchError) {
        let _ = self.0.send(Err(error));
    }
}

/// An option cache for `kind` fed by `fetch` and gated by `auth`.
pub fn scripted_cache(
    kind: EntityKind,
    auth: &AuthStore,
    fetch: &ScriptedFetch<Vec<SelectOption>>,
) -> OptionCache {
    let fetch = fetch.clone();
    OptionCache::new(kind, auth.subscribe(), move || fetch.call())
}

/// Wait until `condition` holds for the channel's value, failing the test
/// after [`WAIT_TIMEOUT`].
pub async fn wait_until<T>(
    receiver: &mut watch::Receiver<T>,
    condition: impl FnMut(&T) -> bool,
) {
    tokio::time::timeout(WAIT_TIMEOUT, receiver.wait_for(condition))
        .await
        .expect("timed out waiting for condition")
        .expect("channel closed");
}

/// Let spawned tasks run until they block.
pub async fn settle() {
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
}

/// A wiremock server standing in for the school API, with a client
/// pointing at it.
pub struct MockApi {
    pub server: MockServer,
    pub client: Arc<payloads::APIClient>,
}

impl MockApi {
    pub fn address(&self) -> String {
        self.server.uri()
    }

    /// Serve `body` as JSON with `status` for `GET /api/{route}`.
    pub async fn mock_get(
        &self,
        route: &str,
        status: u16,
        body: serde_json::Value,
    ) {
        Mock::given(method("GET"))
            .and(path(format!("/api/{route}")))
            .respond_with(ResponseTemplate::new(status).set_body_json(body))
            .mount(&self.server)
            .await;
    }

    /// Serve `options` as a bare list from `GET /api/{kind}/options`.
    pub async fn mock_options(
        &self,
        kind: EntityKind,
        options: &[SelectOption],
    ) {
        let body = serde_json::to_value(options).unwrap();
        self.mock_get(&format!("{kind}/options"), 200, body).await;
    }
}

pub async fn spawn_mock_api() -> MockApi {
    init_test_logging();
    let server = MockServer::start().await;
    let client =
        payloads::APIClient::new(server.uri(), reqwest::Client::new());
    MockApi {
        server,
        client: Arc::new(client),
    }
}

/// Assert that the result of an API action results in a specific status code.
pub fn assert_status_code<T>(
    result: Result<T, ClientError>,
    expected: StatusCode,
) {
    match result {
        Err(ClientError::APIError(code, _)) => {
            assert_eq!(code, expected)
        }
        _ => panic!("Expected APIError"),
    };
}
