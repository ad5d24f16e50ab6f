use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use crate::config::AppConfig;
use crate::cookie;
use crate::models::{PersistedEnvelope, SessionState, User};
use crate::token::TokenState;

// 1. SessionBackend Contract
/// SessionBackend
///
/// Minimal key-value persistence abstraction behind the SessionStore: the
/// client-visible cookie in the original system, but swappable for an
/// in-memory map in tests (or a server session later) without changing any
/// store logic. Values are the raw envelope JSON; transport-level encoding is
/// the Cookie Codec's job, not the backend's.
pub trait SessionBackend: Send + Sync {
    fn get(&self, name: &str) -> Option<String>;
    fn set(&self, name: &str, value: &str, max_age_days: u64);
    fn remove(&self, name: &str);
}

/// BackendState
///
/// The concrete type used to share the persistence backend across the store
/// and the composition root.
pub type BackendState = Arc<dyn SessionBackend>;

/// MemorySessionBackend
///
/// The in-process implementation of `SessionBackend`. Doubles as the test
/// backend; `max_age_days` is accepted for contract parity but entries do not
/// expire in memory.
#[derive(Default)]
pub struct MemorySessionBackend {
    entries: RwLock<HashMap<String, String>>,
}

impl MemorySessionBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionBackend for MemorySessionBackend {
    fn get(&self, name: &str) -> Option<String> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    fn set(&self, name: &str, value: &str, _max_age_days: u64) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.to_string(), value.to_string());
    }

    fn remove(&self, name: &str) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(name);
    }
}

// 2. The Session Store
/// SessionStore
///
/// The single process-wide session object, owned by the composition root and
/// shared through AppState. Implements the two-state lifecycle
/// (Anonymous ⇄ Authenticated) with an explicit partial-persistence contract:
/// only `{user, isAuthenticated}` ever reaches the backend;
/// `redirect_after_login` and `is_loading` are transient and stay in memory.
///
/// Single-writer invariant: the store is the only component that writes the
/// persisted record. The Route Guard reads the cookie on the request path and
/// never mutates it.
pub struct SessionStore {
    state: RwLock<SessionState>,
    backend: BackendState,
    tokens: TokenState,
    cookie_name: String,
    expiry_days: u64,
    revoke_timeout: Duration,
}

impl SessionStore {
    /// new
    ///
    /// Builds the store over the given backend and token collaborator, then
    /// rehydrates from any record the backend already holds. Rehydration is
    /// fail-closed: a malformed record, or one claiming authentication
    /// without a user, materializes as the Anonymous state.
    pub fn new(backend: BackendState, tokens: TokenState, config: &AppConfig) -> Self {
        let store = Self {
            state: RwLock::new(SessionState::default()),
            backend,
            tokens,
            cookie_name: config.auth_cookie_name.clone(),
            expiry_days: config.expiry_days,
            revoke_timeout: Duration::from_secs(config.revoke_timeout_secs),
        };
        store.hydrate();
        store
    }

    /// hydrate
    ///
    /// Materializes the in-memory state from the persisted record, if any.
    /// `PersistedEnvelope::authenticated` enforces the invariant that an
    /// authenticated claim without a user record resolves to Anonymous.
    fn hydrate(&self) {
        let Some(raw) = self.backend.get(&self.cookie_name) else {
            return;
        };
        let envelope = cookie::decode_envelope(&raw);
        if envelope.authenticated() {
            let mut state = self.write_state();
            state.user = envelope.state.user;
            state.is_authenticated = true;
        }
    }

    /// login
    ///
    /// Transition `Anonymous -> Authenticated`: records the user, raises the
    /// flag, and persists the `{user, isAuthenticated}` envelope through the
    /// backend.
    ///
    /// Deliberately does NOT clear `redirect_after_login`; the caller that
    /// completes the post-login navigation owns that clear.
    pub fn login(&self, user: User) {
        {
            let mut state = self.write_state();
            state.user = Some(user);
            state.is_authenticated = true;
        }
        self.persist();
    }

    /// logout
    ///
    /// Transition `Authenticated -> Anonymous`. Idempotent: when already
    /// Anonymous this is a silent no-op and no revocation call is made.
    ///
    /// Local state and the persisted record are cleared *before* the remote
    /// revocation attempt, and the attempt is bounded by the configured
    /// timeout: sign-out on this device never waits on, and never fails
    /// because of, the network. Revocation failures are logged and swallowed.
    pub async fn logout(&self) {
        {
            let mut state = self.write_state();
            if state.is_anonymous() {
                return;
            }
            state.user = None;
            state.is_authenticated = false;
            state.redirect_after_login = None;
        }
        self.backend.remove(&self.cookie_name);

        match tokio::time::timeout(self.revoke_timeout, self.tokens.revoke()).await {
            Ok(Ok(())) => tracing::debug!("server-side tokens revoked"),
            Ok(Err(e)) => {
                tracing::warn!("token revocation failed, local sign-out already done: {e}");
            }
            Err(_) => {
                tracing::warn!(
                    "token revocation timed out after {:?}, local sign-out already done",
                    self.revoke_timeout
                );
            }
        }
    }

    /// set_redirect_after_login
    ///
    /// Remembers (or clears) the path an unauthenticated user was heading to,
    /// so the UI can resume navigation after login. Pure state setter, valid
    /// in either lifecycle state, never persisted.
    pub fn set_redirect_after_login(&self, path: Option<String>) {
        self.write_state().redirect_after_login = path;
    }

    /// set_loading
    ///
    /// UI-facing busy flag, orthogonal to the authentication lifecycle and
    /// never persisted.
    pub fn set_loading(&self, loading: bool) {
        self.write_state().is_loading = loading;
    }

    /// snapshot
    ///
    /// Read accessor returning a clone of the full in-memory state.
    pub fn snapshot(&self) -> SessionState {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// persisted_value
    ///
    /// The raw envelope JSON currently held by the backend, if any. This is
    /// the exact value a Set-Cookie response carries after codec encoding.
    pub fn persisted_value(&self) -> Option<String> {
        self.backend.get(&self.cookie_name)
    }

    // Writes the current {user, isAuthenticated} subset through the backend.
    fn persist(&self) {
        let envelope = {
            let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
            PersistedEnvelope::new(state.user.clone(), state.is_authenticated)
        };
        self.backend.set(
            &self.cookie_name,
            &cookie::encode_envelope(&envelope),
            self.expiry_days,
        );
    }

    fn write_state(&self) -> std::sync::RwLockWriteGuard<'_, SessionState> {
        // The lock is only ever held for plain field updates, never across an
        // await point.
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}
