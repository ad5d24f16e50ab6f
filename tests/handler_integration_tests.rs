use axum::{
    body::Body,
    http::{Request, StatusCode, header},
    response::Response,
};
use std::sync::Arc;
use tower::ServiceExt;

use offerhub_gateway::{
    AppConfig, AppState, MemorySessionBackend, MockTokenService, SessionStore,
    config::Env,
    create_router,
    models::LoginResponse,
    token::TokenState,
};

// --- Helpers ---

fn build_state(mock: Arc<MockTokenService>, config: AppConfig) -> AppState {
    let tokens: TokenState = mock;
    let backend = Arc::new(MemorySessionBackend::new());
    let store = Arc::new(SessionStore::new(backend, tokens.clone(), &config));
    AppState {
        store,
        tokens,
        config,
    }
}

fn default_state() -> AppState {
    build_state(Arc::new(MockTokenService::new()), AppConfig::default())
}

fn login_request(email: &str, password: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(format!(
            "{{\"email\":\"{}\",\"password\":\"{}\"}}",
            email, password
        )))
        .unwrap()
}

fn set_cookies(response: &Response) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect()
}

async fn read_login_response(response: Response) -> LoginResponse {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).expect("Failed to deserialize login response")
}

// --- Login ---

#[tokio::test]
async fn test_login_establishes_session_and_sets_three_cookies() {
    let state = default_state();
    let app = create_router(state.clone());

    let response = app
        .oneshot(login_request("ana@offerhub.dev", "secret"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let cookies = set_cookies(&response);
    assert_eq!(cookies.len(), 3);

    // Client-readable auth-state cookie: percent-encoded envelope, no HttpOnly.
    let auth_state = cookies
        .iter()
        .find(|c| c.starts_with("auth-state="))
        .expect("auth-state cookie set");
    assert!(auth_state.starts_with("auth-state=%7B%22state%22"));
    assert!(auth_state.contains("Max-Age=604800"));
    assert!(auth_state.contains("SameSite=Lax"));
    assert!(!auth_state.contains("HttpOnly"));

    // Server-issued token cookies: HttpOnly, independent lifetimes.
    let auth_token = cookies
        .iter()
        .find(|c| c.starts_with("auth-token="))
        .expect("auth-token cookie set");
    assert!(auth_token.contains("HttpOnly"));
    assert!(auth_token.contains("Max-Age=604800"));

    let refresh_token = cookies
        .iter()
        .find(|c| c.starts_with("refresh-token="))
        .expect("refresh-token cookie set");
    assert!(refresh_token.contains("HttpOnly"));
    assert!(refresh_token.contains("Max-Age=2592000"));

    let body = read_login_response(response).await;
    assert!(body.session.is_authenticated);
    assert_eq!(
        body.session.user.as_ref().map(|u| u.email.as_str()),
        Some("ana@offerhub.dev")
    );
    assert_eq!(
        body.session.user.as_ref().map(|u| u.username.as_str()),
        Some("ana")
    );
    assert_eq!(body.redirect_to, "/app/dashboard");

    // The store persisted exactly the {user, isAuthenticated} subset.
    let persisted = state.store.persisted_value().expect("envelope persisted");
    assert!(persisted.contains("\"isAuthenticated\":true"));
    assert!(!persisted.contains("redirectAfterLogin"));
}

#[tokio::test]
async fn test_login_rejects_empty_credentials() {
    let app = create_router(default_state());
    let response = app.oneshot(login_request("", "secret")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let app = create_router(default_state());
    let response = app
        .oneshot(login_request("ana@offerhub.dev", ""))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_login_honors_then_clears_remembered_redirect() {
    let state = default_state();
    state
        .store
        .set_redirect_after_login(Some("/app/foo".to_string()));

    let app = create_router(state.clone());
    let response = app
        .oneshot(login_request("ana@offerhub.dev", "secret"))
        .await
        .unwrap();
    let body = read_login_response(response).await;
    assert_eq!(body.redirect_to, "/app/foo");

    // The handler performed the caller-owned clear.
    assert!(state.store.snapshot().redirect_after_login.is_none());
}

#[tokio::test]
async fn test_login_survives_token_issuance_failure() {
    let state = build_state(Arc::new(MockTokenService::new_failing()), AppConfig::default());
    let app = create_router(state.clone());

    let response = app
        .oneshot(login_request("ana@offerhub.dev", "secret"))
        .await
        .unwrap();

    // Local session established; only the auth-state cookie could be set.
    assert_eq!(response.status(), StatusCode::OK);
    let cookies = set_cookies(&response);
    assert_eq!(cookies.len(), 1);
    assert!(cookies[0].starts_with("auth-state="));
    assert!(state.store.snapshot().is_authenticated);
}

#[tokio::test]
async fn test_production_login_sets_secure_cookies() {
    let config = AppConfig {
        env: Env::Production,
        ..AppConfig::default()
    };
    let state = build_state(Arc::new(MockTokenService::new()), config);
    let app = create_router(state);

    let response = app
        .oneshot(login_request("ana@offerhub.dev", "secret"))
        .await
        .unwrap();

    for wire in set_cookies(&response) {
        assert!(wire.contains("; Secure"), "cookie must be Secure: {}", wire);
    }
}

// --- Register ---

#[tokio::test]
async fn test_register_signs_in_with_submitted_username() {
    let app = create_router(default_state());

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/register")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    "{\"email\":\"leo@offerhub.dev\",\"username\":\"leo-f\",\"password\":\"pw\"}",
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_login_response(response).await;
    assert!(body.session.is_authenticated);
    assert_eq!(
        body.session.user.as_ref().map(|u| u.username.as_str()),
        Some("leo-f")
    );
}

// --- Logout ---

#[tokio::test]
async fn test_logout_clears_session_and_emits_deletion_cookies() {
    let mock = Arc::new(MockTokenService::new());
    let state = build_state(mock.clone(), AppConfig::default());
    state.store.login(offerhub_gateway::models::User {
        id: "u-1".to_string(),
        email: "ana@offerhub.dev".to_string(),
        username: "ana".to_string(),
    });

    let app = create_router(state.clone());
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/logout")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let cookies = set_cookies(&response);
    assert_eq!(cookies.len(), 3);
    for wire in &cookies {
        assert!(wire.contains("Max-Age=0"), "deletion cookie: {}", wire);
    }

    assert!(state.store.snapshot().is_anonymous());
    assert!(state.store.persisted_value().is_none());
    assert_eq!(mock.revoke_calls(), 1);
}

#[tokio::test]
async fn test_logout_without_session_is_a_silent_no_op() {
    let mock = Arc::new(MockTokenService::new());
    let state = build_state(mock.clone(), AppConfig::default());

    let app = create_router(state);
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/logout")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(mock.revoke_calls(), 0);
}

// --- Session introspection ---

#[tokio::test]
async fn test_session_endpoint_reflects_store_state() {
    let state = default_state();
    let app = create_router(state.clone());

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/session")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let session: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(session["isAuthenticated"], serde_json::json!(false));
    assert_eq!(session["user"], serde_json::Value::Null);

    state.store.login(offerhub_gateway::models::User {
        id: "u-1".to_string(),
        email: "ana@offerhub.dev".to_string(),
        username: "ana".to_string(),
    });

    let response = app
        .oneshot(
            Request::builder()
                .uri("/session")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let session: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(session["isAuthenticated"], serde_json::json!(true));
    assert_eq!(session["user"]["username"], serde_json::json!("ana"));
}
