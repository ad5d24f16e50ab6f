use axum::{
    Json,
    extract::State,
    http::{HeaderName, StatusCode, header},
    response::AppendHeaders,
};
use uuid::Uuid;

use crate::{
    AppState,
    cookie::{self, CookieFlags},
    guard::DEFAULT_AUTH_LANDING,
    models::{LoginRequest, LoginResponse, RegisterRequest, SessionResponse, User},
};

/// Name of the HttpOnly cookie carrying the short-lived auth token.
pub const AUTH_TOKEN_COOKIE: &str = "auth-token";
/// Name of the HttpOnly cookie carrying the long-lived refresh token.
pub const REFRESH_TOKEN_COOKIE: &str = "refresh-token";

// --- Handlers ---

/// login
///
/// [Public Route] Signs the session in.
///
/// The marketplace runs against mocked identity data, so any non-empty
/// credential pair authenticates and the user record is fabricated from the
/// submitted email. The handler drives the SessionStore transition, performs
/// the caller-owned clear of `redirect_after_login` once the post-login
/// destination has been captured, and asks the external token service for the
/// HttpOnly token pair.
///
/// *Degradation*: token issuance failure is logged and the login still
/// succeeds locally; the response then carries only the auth-state cookie.
#[utoipa::path(
    post,
    path = "/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Signed in", body = LoginResponse),
        (status = 400, description = "Empty credentials")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<(AppendHeaders<Vec<(HeaderName, String)>>, Json<LoginResponse>), StatusCode> {
    if payload.email.trim().is_empty() || payload.password.is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }

    state.store.set_loading(true);

    // Mocked identity: the username is the local part of the email.
    let username = payload
        .email
        .split('@')
        .next()
        .unwrap_or(payload.email.as_str())
        .to_string();
    let user = User {
        id: Uuid::new_v4().to_string(),
        email: payload.email.trim().to_string(),
        username,
    };

    let response = establish_session(&state, user).await;
    state.store.set_loading(false);
    Ok(response)
}

/// register
///
/// [Public Route] Creates a mocked account and signs the session in, exactly
/// like `login` but honoring the submitted username.
#[utoipa::path(
    post,
    path = "/register",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Registered and signed in", body = LoginResponse),
        (status = 400, description = "Incomplete signup form")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(AppendHeaders<Vec<(HeaderName, String)>>, Json<LoginResponse>), StatusCode> {
    if payload.email.trim().is_empty()
        || payload.username.trim().is_empty()
        || payload.password.is_empty()
    {
        return Err(StatusCode::BAD_REQUEST);
    }

    state.store.set_loading(true);
    let user = User {
        id: Uuid::new_v4().to_string(),
        email: payload.email.trim().to_string(),
        username: payload.username.trim().to_string(),
    };

    let response = establish_session(&state, user).await;
    state.store.set_loading(false);
    Ok(response)
}

/// establish_session
///
/// Shared tail of login and register: store transition, redirect capture and
/// clear, token issuance, cookie assembly.
async fn establish_session(
    state: &AppState,
    user: User,
) -> (AppendHeaders<Vec<(HeaderName, String)>>, Json<LoginResponse>) {
    state.store.login(user.clone());

    // Capture the remembered destination, then perform the caller-owned clear
    // so a stale path cannot leak into the next session on this device.
    let redirect_to = state
        .store
        .snapshot()
        .redirect_after_login
        .unwrap_or_else(|| DEFAULT_AUTH_LANDING.to_string());
    state.store.set_redirect_after_login(None);

    let client_flags = CookieFlags::client(state.config.secure_cookies());
    let server_flags = CookieFlags::server(state.config.secure_cookies());

    let mut cookies = Vec::new();
    if let Some(envelope) = state.store.persisted_value() {
        cookies.push((
            header::SET_COOKIE,
            cookie::encode(
                &state.config.auth_cookie_name,
                &envelope,
                state.config.expiry_days,
                client_flags,
            ),
        ));
    }

    match state.tokens.issue(&user).await {
        Ok(pair) => {
            cookies.push((
                header::SET_COOKIE,
                cookie::encode(
                    AUTH_TOKEN_COOKIE,
                    &pair.auth_token,
                    state.config.expiry_days,
                    server_flags,
                ),
            ));
            // Note the independent, longer TTL on the refresh token.
            cookies.push((
                header::SET_COOKIE,
                cookie::encode(
                    REFRESH_TOKEN_COOKIE,
                    &pair.refresh_token,
                    state.config.refresh_expiry_days,
                    server_flags,
                ),
            ));
        }
        Err(e) => {
            tracing::warn!("token issuance failed, session established without tokens: {e}");
        }
    }

    let snapshot = state.store.snapshot();
    (
        AppendHeaders(cookies),
        Json(LoginResponse {
            session: SessionResponse {
                user: snapshot.user,
                is_authenticated: snapshot.is_authenticated,
            },
            redirect_to,
        }),
    )
}

/// logout
///
/// [Public Route] Signs the session out. Idempotent: a logout while already
/// Anonymous still answers 204 with the same deletion cookies.
///
/// The SessionStore clears local state first and treats the remote
/// revocation as best-effort, so this handler can never fail on a network
/// error; the three deletion cookies instruct the client to purge the
/// auth-state and both token cookies regardless.
#[utoipa::path(
    post,
    path = "/logout",
    responses((status = 204, description = "Signed out"))
)]
pub async fn logout(
    State(state): State<AppState>,
) -> (StatusCode, AppendHeaders<Vec<(HeaderName, String)>>) {
    state.store.logout().await;

    let client_flags = CookieFlags::client(state.config.secure_cookies());
    let server_flags = CookieFlags::server(state.config.secure_cookies());
    let cookies = vec![
        (
            header::SET_COOKIE,
            cookie::encode_delete(&state.config.auth_cookie_name, client_flags),
        ),
        (
            header::SET_COOKIE,
            cookie::encode_delete(AUTH_TOKEN_COOKIE, server_flags),
        ),
        (
            header::SET_COOKIE,
            cookie::encode_delete(REFRESH_TOKEN_COOKIE, server_flags),
        ),
    ];

    (StatusCode::NO_CONTENT, AppendHeaders(cookies))
}

/// get_session
///
/// [Public Route] Returns the current session snapshot in the same shape as
/// the persisted cookie, so clients can treat either source as authoritative.
#[utoipa::path(
    get,
    path = "/session",
    responses((status = 200, description = "Current session", body = SessionResponse))
)]
pub async fn get_session(State(state): State<AppState>) -> Json<SessionResponse> {
    let snapshot = state.store.snapshot();
    Json(SessionResponse {
        user: snapshot.user,
        is_authenticated: snapshot.is_authenticated,
    })
}

/// dashboard
///
/// [Guarded Route] The default authenticated landing page. Reaching this
/// handler means the Route Guard resolved the session as authenticated.
#[utoipa::path(
    get,
    path = "/app/dashboard",
    responses((status = 200, description = "Dashboard page", body = SessionResponse))
)]
pub async fn dashboard(State(state): State<AppState>) -> Json<serde_json::Value> {
    let snapshot = state.store.snapshot();
    Json(serde_json::json!({
        "page": "dashboard",
        "user": snapshot.user,
    }))
}

/// settings
///
/// [Guarded Route] Account settings page stub on the private surface.
#[utoipa::path(
    get,
    path = "/app/settings",
    responses((status = 200, description = "Settings page"))
)]
pub async fn settings(State(state): State<AppState>) -> Json<serde_json::Value> {
    let snapshot = state.store.snapshot();
    Json(serde_json::json!({
        "page": "settings",
        "user": snapshot.user,
    }))
}
