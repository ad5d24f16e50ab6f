use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

use crate::{AppState, cookie};

/// Default landing page for an authenticated user, used when the guard turns
/// an already-signed-in visitor away from the auth pages.
pub const DEFAULT_AUTH_LANDING: &str = "/app/dashboard";

/// Login page, the redirect target for unauthenticated private-route access.
pub const LOGIN_PATH: &str = "/login";

// Exact-match public auth pages and the private application prefix. These two
// sets drive the whole classification; everything else is "other".
const PUBLIC_AUTH_PATHS: [&str; 2] = ["/login", "/register"];
const PRIVATE_PREFIX: &str = "/app";

/// RouteClass
///
/// Static classification of a request path. Pure and stateless: depends on
/// nothing but the path string.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RouteClass {
    /// Auth entry pages (`/login`, `/register`) that a signed-in user should
    /// be steered away from.
    PublicAuth,
    /// The private application surface (`/app` and everything below it).
    PrivateApp,
    /// Everything else (marketplace, landing pages); never guarded.
    Other,
}

impl RouteClass {
    /// classify
    ///
    /// Maps a path into exactly one class. `/app` itself counts as private;
    /// `/application` does not (prefix match respects the segment boundary).
    pub fn classify(path: &str) -> Self {
        if PUBLIC_AUTH_PATHS.contains(&path) {
            return Self::PublicAuth;
        }
        if path == PRIVATE_PREFIX
            || path
                .strip_prefix(PRIVATE_PREFIX)
                .is_some_and(|rest| rest.starts_with('/'))
        {
            return Self::PrivateApp;
        }
        Self::Other
    }
}

/// GuardDecision
///
/// The guard's entire output: either let the request through unmodified or
/// redirect it. Producing this value is the middleware's only effect.
#[derive(Debug, Clone, PartialEq)]
pub enum GuardDecision {
    Continue,
    Redirect(String),
}

/// is_exempt
///
/// Matcher exclusions, part of the guard contract: API routes, static assets,
/// and image files are never intercepted, whatever the session state.
pub fn is_exempt(path: &str) -> bool {
    if path == "/api" || path.starts_with("/api/") {
        return true;
    }
    if path.starts_with("/static/") || path.starts_with("/assets/") {
        return true;
    }
    if path == "/favicon.ico" {
        return true;
    }
    const IMAGE_EXTENSIONS: [&str; 7] = [
        ".png", ".jpg", ".jpeg", ".gif", ".svg", ".webp", ".ico",
    ];
    IMAGE_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}

/// decide
///
/// The pure per-request decision function. Reads nothing but its arguments
/// and mutates nothing; the session cookie is consumed read-only.
///
/// Authentication resolution is fail-closed: a missing cookie, a malformed
/// header segment, invalid percent-encoding, truncated JSON, or a flag of any
/// non-boolean-true shape all resolve to "unauthenticated". The caller passes
/// the bare path (no query string), so a stale `?redirect=` parameter on
/// `/login` can never override the authenticated-user redirect.
pub fn decide(path: &str, cookie_header: Option<&str>, cookie_name: &str) -> GuardDecision {
    if is_exempt(path) {
        return GuardDecision::Continue;
    }

    let cookies = cookie::decode(cookie_header);
    let is_authenticated = cookies
        .get(cookie_name)
        .map(|raw| cookie::decode_envelope(raw).state.is_authenticated)
        .unwrap_or(false);

    match RouteClass::classify(path) {
        RouteClass::PublicAuth if is_authenticated => {
            GuardDecision::Redirect(DEFAULT_AUTH_LANDING.to_string())
        }
        RouteClass::PrivateApp if !is_authenticated => GuardDecision::Redirect(format!(
            "{}?redirect={}",
            LOGIN_PATH,
            cookie::encode_component(path)
        )),
        _ => GuardDecision::Continue,
    }
}

/// route_guard
///
/// The axum middleware wrapper around `decide`, applied router-wide before
/// any handler. Read-only by contract: it inspects the request path and the
/// `Cookie` header and either forwards the request or answers with a 307
/// redirect. It never writes session state and performs no I/O.
pub async fn route_guard(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    let cookie_header = request
        .headers()
        .get(header::COOKIE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);

    match decide(
        &path,
        cookie_header.as_deref(),
        &state.config.auth_cookie_name,
    ) {
        GuardDecision::Continue => next.run(request).await,
        GuardDecision::Redirect(target) => Redirect::temporary(&target).into_response(),
    }
}
