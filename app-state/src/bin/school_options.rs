use std::{sync::Arc, time::Duration};

use anyhow::Context;
use app_state::{
    AuthService, AuthStore, ClientConfig, EntityCaches, get_api_client,
    logs::init_logging,
};
use payloads::requests::LoginCredentials;

/// Log in and print how many options each select list holds.
///
/// Reads the client settings described on `ClientConfig` plus:
/// - SCHOOL_EMAIL / SCHOOL_PASSWORD: credentials to log in with
///
/// Example:
/// BACKEND_URL=http://localhost:8000 SCHOOL_EMAIL=admin@school.test \
/// SCHOOL_PASSWORD=secret cargo run --bin school-options
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ClientConfig::from_env()?;
    init_logging(&config.log_filter)?;

    let credentials = LoginCredentials {
        email: std::env::var("SCHOOL_EMAIL").context("SCHOOL_EMAIL")?,
        password: std::env::var("SCHOOL_PASSWORD")
            .context("SCHOOL_PASSWORD")?,
    };

    let client = Arc::new(get_api_client(&config)?);
    let auth = AuthService::new(client.clone(), AuthStore::new());
    let caches = EntityCaches::new(client, auth.store().subscribe());
    let _subscriptions = caches.attach_all();

    let user = auth.login(&credentials).await?;
    tracing::info!(name = %user.name, "logged in");

    // Loading starts on the watcher tasks; wait for each to settle.
    for cache in caches.iter() {
        let mut request = cache.subscribe_request();
        let settled = tokio::time::timeout(
            config.request_timeout + Duration::from_secs(1),
            request.wait_for(|state| {
                !state.is_loading
                    && (state.data.is_some() || state.error.is_some())
            }),
        )
        .await;
        match settled {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => return Err(e.into()),
            Err(_) => tracing::warn!(entity = %cache.kind(), "timed out"),
        }
    }

    for cache in caches.iter() {
        let state = cache.snapshot();
        match state.error_message {
            Some(message) => println!("{}: error: {message}", cache.kind()),
            None => println!("{}: {} options", cache.kind(), state.items.len()),
        }
    }

    auth.logout().await;
    Ok(())
}
