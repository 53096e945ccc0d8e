use app_state::{AuthStore, CachePhase, EntityKind, FetchError};
use payloads::SessionToken;
use test_helpers::{
    BOB_TOKEN, ScriptedFetch, bob_teacher, init_test_logging, scripted_cache,
    settle, signed_in_store, student_options, wait_until,
};

#[tokio::test]
async fn no_fetch_without_user() -> anyhow::Result<()> {
    init_test_logging();
    let auth = AuthStore::new();
    let fetch = ScriptedFetch::new();
    let cache = scripted_cache(EntityKind::Students, &auth, &fetch);

    let _subscription = cache.attach();
    settle().await;
    assert!(!cache.ensure_loaded().await);
    settle().await;

    assert_eq!(fetch.calls(), 0);
    assert!(cache.items().is_empty());
    assert!(!cache.is_loading());
    assert_eq!(cache.phase(), CachePhase::Empty);

    Ok(())
}

#[tokio::test]
async fn populated_cache_is_not_fetched_again() -> anyhow::Result<()> {
    init_test_logging();
    let auth = signed_in_store();
    let fetch = ScriptedFetch::new();
    fetch.ok(student_options());
    let cache = scripted_cache(EntityKind::Students, &auth, &fetch);

    assert!(cache.ensure_loaded().await);
    assert_eq!(fetch.calls(), 1);
    assert_eq!(cache.phase(), CachePhase::Populated);

    // a second consumer mounting the same cache
    let consumer = cache.clone();
    assert!(!consumer.ensure_loaded().await);
    let _first = cache.attach();
    let _second = consumer.attach();
    settle().await;

    assert_eq!(fetch.calls(), 1);
    assert_eq!(consumer.items(), student_options());

    Ok(())
}

#[tokio::test]
async fn no_second_fetch_while_loading() -> anyhow::Result<()> {
    init_test_logging();
    let auth = signed_in_store();
    let fetch = ScriptedFetch::new();
    let cache = scripted_cache(EntityKind::Students, &auth, &fetch);

    let gate = fetch.gated();
    let task = tokio::spawn({
        let cache = cache.clone();
        async move { cache.ensure_loaded().await }
    });
    settle().await;
    assert_eq!(cache.phase(), CachePhase::Loading);
    assert!(!cache.ensure_loaded().await);

    gate.resolve(student_options());
    assert!(task.await?);
    assert_eq!(fetch.calls(), 1);

    Ok(())
}

#[tokio::test]
async fn refresh_clears_then_refetches() -> anyhow::Result<()> {
    init_test_logging();
    let auth = signed_in_store();
    let fetch = ScriptedFetch::new();
    fetch.ok(student_options());
    let cache = scripted_cache(EntityKind::Students, &auth, &fetch);
    cache.ensure_loaded().await;
    assert_eq!(cache.items(), student_options());

    let gate = fetch.gated();
    let task = tokio::spawn({
        let cache = cache.clone();
        async move { cache.refresh().await }
    });
    settle().await;

    // cleared before the new result arrives
    assert!(cache.items().is_empty());
    assert_eq!(cache.phase(), CachePhase::Loading);
    assert_eq!(fetch.calls(), 2);

    let mut refreshed = student_options();
    refreshed.push(test_helpers::option("3", "Cleo"));
    gate.resolve(refreshed.clone());
    task.await?;

    assert_eq!(cache.items(), refreshed);
    assert_eq!(fetch.calls(), 2);

    Ok(())
}

#[tokio::test]
async fn refresh_without_user_only_clears() -> anyhow::Result<()> {
    init_test_logging();
    let auth = signed_in_store();
    let fetch = ScriptedFetch::new();
    fetch.ok(student_options());
    let cache = scripted_cache(EntityKind::Students, &auth, &fetch);
    cache.ensure_loaded().await;

    auth.sign_out();
    cache.refresh().await;

    assert!(cache.items().is_empty());
    assert_eq!(fetch.calls(), 1);

    Ok(())
}

#[tokio::test]
async fn login_triggers_initial_fetch() -> anyhow::Result<()> {
    init_test_logging();
    let auth = AuthStore::new();
    let fetch = ScriptedFetch::new();
    fetch.ok(student_options());
    let cache = scripted_cache(EntityKind::Students, &auth, &fetch);
    let _subscription = cache.attach();
    settle().await;
    assert_eq!(fetch.calls(), 0);

    auth.sign_in(bob_teacher(), Some(SessionToken::new(BOB_TOKEN)));

    let mut items = cache.subscribe();
    wait_until(&mut items, |items| !items.is_empty()).await;
    assert_eq!(cache.items(), student_options());
    assert_eq!(fetch.calls(), 1);

    Ok(())
}

#[tokio::test]
async fn logout_clears_cache() -> anyhow::Result<()> {
    init_test_logging();
    let auth = signed_in_store();
    let fetch = ScriptedFetch::new();
    fetch.ok(student_options());
    let cache = scripted_cache(EntityKind::Students, &auth, &fetch);
    let _subscription = cache.attach();

    let mut items = cache.subscribe();
    wait_until(&mut items, |items| !items.is_empty()).await;

    auth.sign_out();
    wait_until(&mut items, |items| items.is_empty()).await;
    assert_eq!(cache.phase(), CachePhase::Empty);

    Ok(())
}

#[tokio::test]
async fn logout_during_fetch_clears_cache() -> anyhow::Result<()> {
    init_test_logging();
    let auth = signed_in_store();
    let fetch = ScriptedFetch::new();
    fetch.ok(student_options());
    let cache = scripted_cache(EntityKind::Students, &auth, &fetch);
    let _subscription = cache.attach();
    let mut items = cache.subscribe();
    wait_until(&mut items, |items| !items.is_empty()).await;

    // slow refresh in flight when the user logs out
    let gate = fetch.gated();
    let task = tokio::spawn({
        let cache = cache.clone();
        async move { cache.refresh().await }
    });
    settle().await;
    assert!(cache.is_loading());

    auth.sign_out();
    settle().await;
    assert!(cache.items().is_empty());

    // The in-flight result still lands after logout. Callers re-login and
    // refresh to get rid of it.
    gate.resolve(student_options());
    task.await?;
    assert_eq!(cache.items(), student_options());

    Ok(())
}

#[tokio::test]
async fn failure_leaves_cache_empty() -> anyhow::Result<()> {
    init_test_logging();
    let auth = signed_in_store();
    let fetch = ScriptedFetch::new();
    fetch.fail(FetchError::server(500, "Server error"));
    let cache = scripted_cache(EntityKind::Students, &auth, &fetch);

    assert!(cache.ensure_loaded().await);

    let state = cache.snapshot();
    assert!(state.items.is_empty());
    assert!(!state.loading);
    assert_eq!(state.error_message.as_deref(), Some("Server error"));
    assert_eq!(state.error.as_ref().and_then(|e| e.status), Some(500));
    assert_eq!(cache.phase(), CachePhase::Empty);

    // retryable through refresh
    fetch.ok(student_options());
    cache.refresh().await;
    let state = cache.snapshot();
    assert_eq!(state.items, student_options());
    assert_eq!(state.error, None);
    assert_eq!(state.error_message, None);

    Ok(())
}

#[tokio::test]
async fn empty_result_is_not_an_error() -> anyhow::Result<()> {
    init_test_logging();
    let auth = signed_in_store();
    let fetch = ScriptedFetch::new();
    fetch.ok(Vec::new());
    let cache = scripted_cache(EntityKind::Classes, &auth, &fetch);

    assert!(cache.ensure_loaded().await);
    assert_eq!(cache.phase(), CachePhase::Empty);
    assert_eq!(cache.error_message(), None);

    // still empty, so the next mount tries again
    fetch.ok(test_helpers::class_options());
    assert!(cache.ensure_loaded().await);
    assert_eq!(fetch.calls(), 2);

    Ok(())
}

#[tokio::test]
async fn items_keep_server_order_and_shape() -> anyhow::Result<()> {
    init_test_logging();
    let auth = signed_in_store();
    let fetch = ScriptedFetch::new();
    let options = vec![
        test_helpers::option("1", "Ana"),
        test_helpers::option("2", "Ben"),
    ];
    fetch.ok(options.clone());
    let cache = scripted_cache(EntityKind::Students, &auth, &fetch);

    cache.ensure_loaded().await;
    assert_eq!(cache.items(), options);

    Ok(())
}

#[tokio::test]
async fn logout_then_login_before_watcher_runs() -> anyhow::Result<()> {
    init_test_logging();
    let auth = signed_in_store();
    let fetch = ScriptedFetch::new();
    fetch.ok(student_options());
    let cache = scripted_cache(EntityKind::Students, &auth, &fetch);
    let _subscription = cache.attach();
    let mut items = cache.subscribe();
    wait_until(&mut items, |items| !items.is_empty()).await;

    let bob_students = vec![test_helpers::option("3", "Cal")];
    fetch.ok(bob_students.clone());

    // no yield between the two, the watcher only sees the signed-in value
    auth.sign_out();
    auth.sign_in(bob_teacher(), Some(SessionToken::new(BOB_TOKEN)));

    wait_until(&mut items, |items| *items == bob_students).await;
    assert_eq!(fetch.calls(), 2);

    Ok(())
}

#[tokio::test]
async fn loading_toggle_does_not_refetch() -> anyhow::Result<()> {
    init_test_logging();
    let auth = signed_in_store();
    let fetch = ScriptedFetch::new();
    fetch.ok(student_options());
    let cache = scripted_cache(EntityKind::Students, &auth, &fetch);
    let _subscription = cache.attach();
    let mut items = cache.subscribe();
    wait_until(&mut items, |items| !items.is_empty()).await;

    cache.clear();
    auth.set_loading(true);
    settle().await;
    auth.set_loading(false);
    settle().await;

    // only a change of user or a sign-out wakes the cache
    assert_eq!(fetch.calls(), 1);
    assert!(cache.items().is_empty());

    Ok(())
}

#[tokio::test]
async fn user_switch_keeps_stale_cache() -> anyhow::Result<()> {
    init_test_logging();
    let auth = signed_in_store();
    let fetch = ScriptedFetch::new();
    fetch.ok(student_options());
    let cache = scripted_cache(EntityKind::Students, &auth, &fetch);
    let _subscription = cache.attach();
    let mut items = cache.subscribe();
    wait_until(&mut items, |items| !items.is_empty()).await;

    // a different user without an intervening logout
    auth.sign_in(bob_teacher(), Some(SessionToken::new(BOB_TOKEN)));
    settle().await;

    assert_eq!(fetch.calls(), 1);
    assert_eq!(cache.items(), student_options());

    Ok(())
}

#[tokio::test]
async fn detached_cache_ignores_auth() -> anyhow::Result<()> {
    init_test_logging();
    let auth = signed_in_store();
    let fetch = ScriptedFetch::new();
    fetch.ok(student_options());
    let cache = scripted_cache(EntityKind::Students, &auth, &fetch);
    let subscription = cache.attach();
    let mut items = cache.subscribe();
    wait_until(&mut items, |items| !items.is_empty()).await;

    assert!(subscription.is_attached());
    subscription.detach();
    settle().await;
    auth.sign_out();
    settle().await;

    assert_eq!(cache.items(), student_options());

    Ok(())
}
