use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::models::User;

/// TokenPair
///
/// The opaque credential pair issued by the external token service. The
/// gateway never inspects these values; it only places them into the two
/// HttpOnly cookies (`auth-token`, `refresh-token`) with their independent
/// lifetimes.
#[derive(Debug, Clone, PartialEq, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub auth_token: String,
    pub refresh_token: String,
}

/// TokenServiceError
///
/// Failures reported by the token collaborator. Callers in the session flow
/// recover from all of these locally: issuance failure degrades to a session
/// without token cookies, revocation failure is swallowed entirely.
#[derive(Debug, thiserror::Error)]
pub enum TokenServiceError {
    #[error("token service transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("token service rejected the request: {0}")]
    Rejected(String),
}

// 1. TokenService Contract
/// TokenService
///
/// Defines the abstract contract for the external token-management
/// collaborator, so the concrete implementation can be swapped from the real
/// HTTP client (HttpTokenService) to the in-memory MockTokenService in tests
/// without affecting the SessionStore or the handlers.
#[async_trait]
pub trait TokenService: Send + Sync {
    /// Requests a fresh token pair for the given user after a successful
    /// login or registration.
    async fn issue(&self, user: &User) -> Result<TokenPair, TokenServiceError>;

    /// Requests revocation of the server-held tokens for the current session.
    /// The caller bounds this with a timeout; local sign-out never waits on
    /// the outcome.
    async fn revoke(&self) -> Result<(), TokenServiceError>;
}

/// TokenState
///
/// The concrete type used to share the token collaborator across the
/// application state.
pub type TokenState = Arc<dyn TokenService>;

// 2. The Real Implementation (HTTP collaborator)
/// HttpTokenService
///
/// The concrete implementation reaching the out-of-process token backend over
/// HTTP. The backend fabricates and revokes the opaque token pair; this
/// client treats both endpoints as black boxes.
#[derive(Clone)]
pub struct HttpTokenService {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTokenService {
    /// new
    ///
    /// Constructs the HTTP client against the base URL resolved by AppConfig.
    /// A per-request transport timeout is set so a wedged collaborator cannot
    /// hold connections open indefinitely; the SessionStore applies its own,
    /// tighter bound on the revocation path.
    pub fn new(base_url: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl TokenService for HttpTokenService {
    /// issue
    ///
    /// POST /api/token with the user id; the backend answers with the pair.
    async fn issue(&self, user: &User) -> Result<TokenPair, TokenServiceError> {
        let response = self
            .client
            .post(format!("{}/api/token", self.base_url))
            .json(&serde_json::json!({ "userId": user.id }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(TokenServiceError::Rejected(response.status().to_string()));
        }

        Ok(response.json::<TokenPair>().await?)
    }

    /// revoke
    ///
    /// POST /api/token/revoke. The backend invalidates whatever server-held
    /// tokens belong to this session; a non-success status is reported but
    /// the caller treats it as advisory.
    async fn revoke(&self) -> Result<(), TokenServiceError> {
        let response = self
            .client
            .post(format!("{}/api/token/revoke", self.base_url))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(TokenServiceError::Rejected(response.status().to_string()));
        }

        Ok(())
    }
}

// 3. The Mock Implementation (For Unit Tests)
/// MockTokenService
///
/// A mock implementation of `TokenService` used exclusively for unit and
/// integration testing. This allows us to test the login/logout flows without
/// a network connection, and to simulate failing or hanging collaborators.
pub struct MockTokenService {
    /// When true, all operations return a simulated failure.
    pub should_fail: bool,
    /// Artificial delay applied before responding, for timeout tests.
    pub delay: Option<Duration>,
    revoke_calls: AtomicUsize,
}

impl MockTokenService {
    pub fn new() -> Self {
        Self {
            should_fail: false,
            delay: None,
            revoke_calls: AtomicUsize::new(0),
        }
    }

    pub fn new_failing() -> Self {
        Self {
            should_fail: true,
            delay: None,
            revoke_calls: AtomicUsize::new(0),
        }
    }

    pub fn new_hanging(delay: Duration) -> Self {
        Self {
            should_fail: false,
            delay: Some(delay),
            revoke_calls: AtomicUsize::new(0),
        }
    }

    /// Number of revocation attempts observed, for assertions on idempotency.
    pub fn revoke_calls(&self) -> usize {
        self.revoke_calls.load(Ordering::SeqCst)
    }
}

impl Default for MockTokenService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TokenService for MockTokenService {
    async fn issue(&self, user: &User) -> Result<TokenPair, TokenServiceError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.should_fail {
            return Err(TokenServiceError::Rejected(
                "mock token error: simulation requested".to_string(),
            ));
        }
        // Deterministic fake pair for mock assertions.
        Ok(TokenPair {
            auth_token: format!("mock-auth-{}", user.id),
            refresh_token: format!("mock-refresh-{}", user.id),
        })
    }

    async fn revoke(&self) -> Result<(), TokenServiceError> {
        self.revoke_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.should_fail {
            return Err(TokenServiceError::Rejected(
                "mock token error: simulation requested".to_string(),
            ));
        }
        Ok(())
    }
}
