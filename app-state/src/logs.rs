//! Logging to stderr.

use tracing::Subscriber;
use tracing_log::LogTracer;
use tracing_subscriber::{EnvFilter, Registry, fmt, layer::SubscriberExt};

/// Build a subscriber using `RUST_LOG` when set, `env_filter` otherwise.
pub fn get_subscriber(env_filter: &str) -> impl Subscriber + Sync + Send {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(env_filter));
    let stderr = fmt::Layer::new()
        .with_writer(std::io::stderr)
        .with_line_number(true);
    Registry::default().with(env_filter).with(stderr)
}

/// Register the subscriber as global default and route `log` records into
/// it.
///
/// Fails if logging was already initialised.
pub fn init_logging(env_filter: &str) -> anyhow::Result<()> {
    LogTracer::init()?;
    tracing::subscriber::set_global_default(get_subscriber(env_filter))?;
    tracing::info!("Initialized logs");
    Ok(())
}
