use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Defines endpoints that are reachable without an authenticated session.
/// The Route Guard still runs in front of these: an already-authenticated
/// visitor hitting `/login` or `/register` is redirected to the dashboard
/// before the handler executes.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // A simple, unauthenticated endpoint used for monitoring and load
        // balancer checks. Returns "ok" immediately.
        .route("/health", get(|| async { "ok" }))
        // POST /login
        // Signs the session in against mocked identity data and sets the
        // auth-state cookie plus the two HttpOnly token cookies.
        .route("/login", post(handlers::login))
        // POST /register
        // Creates a mocked account and signs in, same cookie output as /login.
        .route("/register", post(handlers::register))
        // POST /logout
        // Idempotent sign-out; always clears local state and answers with
        // deletion cookies, regardless of remote revocation outcome.
        .route("/logout", post(handlers::logout))
        // GET /session
        // Introspection endpoint mirroring the persisted cookie shape.
        .route("/session", get(handlers::get_session))
}
