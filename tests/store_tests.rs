use std::sync::Arc;
use std::time::{Duration, Instant};

use offerhub_gateway::{
    AppConfig, MemorySessionBackend, MockTokenService, SessionStore,
    cookie,
    models::{PersistedEnvelope, User},
    store::BackendState,
    token::TokenState,
};

// --- Helpers ---

fn sample_user() -> User {
    User {
        id: "u-7".to_string(),
        email: "leo@offerhub.dev".to_string(),
        username: "leo".to_string(),
    }
}

fn build_store(mock: Arc<MockTokenService>) -> (SessionStore, BackendState) {
    let backend: BackendState = Arc::new(MemorySessionBackend::new());
    let tokens: TokenState = mock;
    let store = SessionStore::new(backend.clone(), tokens, &AppConfig::default());
    (store, backend)
}

// --- Lifecycle transitions ---

#[test]
fn test_store_starts_anonymous() {
    let (store, _) = build_store(Arc::new(MockTokenService::new()));
    let state = store.snapshot();
    assert!(state.is_anonymous());
    assert!(state.user.is_none());
    assert!(store.persisted_value().is_none());
}

#[test]
fn test_login_transitions_to_authenticated_and_persists() {
    let (store, _) = build_store(Arc::new(MockTokenService::new()));
    store.login(sample_user());

    let state = store.snapshot();
    assert!(state.is_authenticated);
    assert_eq!(state.user, Some(sample_user()));

    let raw = store.persisted_value().expect("envelope persisted");
    let envelope = cookie::decode_envelope(&raw);
    assert!(envelope.authenticated());
    assert_eq!(envelope.state.user, Some(sample_user()));
}

#[tokio::test]
async fn test_logout_clears_state_and_persisted_record() {
    let mock = Arc::new(MockTokenService::new());
    let (store, _) = build_store(mock.clone());

    store.login(sample_user());
    store.set_redirect_after_login(Some("/app/foo".to_string()));
    store.logout().await;

    let state = store.snapshot();
    assert!(state.is_anonymous());
    assert!(state.user.is_none());
    assert!(state.redirect_after_login.is_none());
    assert!(store.persisted_value().is_none());
    assert_eq!(mock.revoke_calls(), 1);
}

#[tokio::test]
async fn test_logout_is_idempotent() {
    let mock = Arc::new(MockTokenService::new());
    let (store, _) = build_store(mock.clone());

    store.login(sample_user());
    store.logout().await;
    // Second logout from Anonymous: silent no-op, no second revocation call.
    store.logout().await;

    assert!(store.snapshot().is_anonymous());
    assert_eq!(mock.revoke_calls(), 1);
}

#[tokio::test]
async fn test_logout_when_never_logged_in_makes_no_revocation_call() {
    let mock = Arc::new(MockTokenService::new());
    let (store, _) = build_store(mock.clone());

    store.logout().await;

    assert!(store.snapshot().is_anonymous());
    assert_eq!(mock.revoke_calls(), 0);
}

// --- Failure tolerance ---

#[tokio::test]
async fn test_logout_succeeds_locally_when_revocation_fails() {
    let mock = Arc::new(MockTokenService::new_failing());
    let (store, _) = build_store(mock.clone());

    store.login(sample_user());
    store.logout().await;

    // Local sign-out is complete even though the collaborator errored.
    assert!(store.snapshot().is_anonymous());
    assert!(store.persisted_value().is_none());
    assert_eq!(mock.revoke_calls(), 1);
}

#[tokio::test]
async fn test_logout_revocation_is_bounded_by_timeout() {
    // Collaborator hangs far beyond the configured bound; logout must return
    // once the timeout elapses, with local state already cleared.
    let mock = Arc::new(MockTokenService::new_hanging(Duration::from_secs(30)));
    let backend: BackendState = Arc::new(MemorySessionBackend::new());
    let config = AppConfig {
        revoke_timeout_secs: 1,
        ..AppConfig::default()
    };
    let store = SessionStore::new(backend, mock.clone(), &config);

    store.login(sample_user());
    let started = Instant::now();
    store.logout().await;

    assert!(started.elapsed() < Duration::from_secs(5));
    assert!(store.snapshot().is_anonymous());
}

// --- Partial persistence ---

#[test]
fn test_persisted_record_excludes_transient_fields() {
    let (store, _) = build_store(Arc::new(MockTokenService::new()));

    store.set_redirect_after_login(Some("/app/foo".to_string()));
    store.set_loading(true);
    store.login(sample_user());

    let raw = store.persisted_value().expect("envelope persisted");
    assert!(!raw.contains("redirectAfterLogin"));
    assert!(!raw.contains("redirect_after_login"));
    assert!(!raw.contains("isLoading"));
    assert!(raw.contains("isAuthenticated"));
    assert!(raw.contains("\"user\""));
}

#[test]
fn test_transient_setters_do_not_touch_the_backend() {
    let (store, _) = build_store(Arc::new(MockTokenService::new()));

    store.set_redirect_after_login(Some("/app/foo".to_string()));
    store.set_loading(true);

    assert!(store.persisted_value().is_none());
    let state = store.snapshot();
    assert_eq!(state.redirect_after_login.as_deref(), Some("/app/foo"));
    assert!(state.is_loading);
}

#[test]
fn test_login_retains_redirect_after_login() {
    // The store deliberately leaves the remembered path in place; clearing it
    // after a successful login is the caller's job.
    let (store, _) = build_store(Arc::new(MockTokenService::new()));

    store.set_redirect_after_login(Some("/app/foo".to_string()));
    store.login(sample_user());

    assert_eq!(
        store.snapshot().redirect_after_login.as_deref(),
        Some("/app/foo")
    );
}

// --- Rehydration ---

#[test]
fn test_store_rehydrates_authenticated_session_from_backend() {
    let backend: BackendState = Arc::new(MemorySessionBackend::new());
    let envelope = PersistedEnvelope::new(Some(sample_user()), true);
    backend.set("auth-state", &cookie::encode_envelope(&envelope), 7);

    let tokens: TokenState = Arc::new(MockTokenService::new());
    let store = SessionStore::new(backend, tokens, &AppConfig::default());

    let state = store.snapshot();
    assert!(state.is_authenticated);
    assert_eq!(state.user, Some(sample_user()));
}

#[test]
fn test_store_rehydration_fails_closed_without_a_user() {
    // A record claiming authentication with no user violates the session
    // invariant and must materialize as Anonymous.
    let backend: BackendState = Arc::new(MemorySessionBackend::new());
    backend.set(
        "auth-state",
        "{\"state\":{\"user\":null,\"isAuthenticated\":true},\"version\":0}",
        7,
    );

    let tokens: TokenState = Arc::new(MockTokenService::new());
    let store = SessionStore::new(backend, tokens, &AppConfig::default());

    assert!(store.snapshot().is_anonymous());
}

#[test]
fn test_store_rehydration_fails_closed_on_garbage() {
    let backend: BackendState = Arc::new(MemorySessionBackend::new());
    backend.set("auth-state", "{corrupted", 7);

    let tokens: TokenState = Arc::new(MockTokenService::new());
    let store = SessionStore::new(backend, tokens, &AppConfig::default());

    assert!(store.snapshot().is_anonymous());
}
