use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// --- Session Schemas ---

/// User
///
/// The identity record held by an authenticated session. This is the minimal,
/// non-sensitive subset that is allowed to appear in the client-readable
/// auth-state cookie; credentials and tokens never pass through this struct.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, Default)]
pub struct User {
    pub id: String,
    pub email: String,
    pub username: String,
}

/// SessionState
///
/// The full in-memory session record owned by the SessionStore.
///
/// Only `user` and `is_authenticated` are ever persisted (see `PersistedState`);
/// `redirect_after_login` is transient navigation state and `is_loading` is a
/// UI-facing flag, and neither may leak into long-lived storage.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SessionState {
    pub user: Option<User>,
    pub is_authenticated: bool,
    pub redirect_after_login: Option<String>,
    pub is_loading: bool,
}

impl SessionState {
    /// Whether the session is currently in the Anonymous state.
    pub fn is_anonymous(&self) -> bool {
        !self.is_authenticated
    }
}

/// PersistedState
///
/// The persisted subset of the session, exactly `{user, isAuthenticated}`.
/// Field names are part of the cookie wire contract and use the camelCase
/// spelling any other reader of this cookie expects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PersistedState {
    #[serde(default)]
    pub user: Option<User>,
    // A missing flag deserializes as false rather than rejecting the whole
    // envelope: absence of the claim is not an error, it is "anonymous".
    #[serde(default)]
    pub is_authenticated: bool,
}

/// PersistedEnvelope
///
/// The versioned wire envelope written into the auth-state cookie:
/// `{"state":{"user":...,"isAuthenticated":...},"version":0}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PersistedEnvelope {
    pub state: PersistedState,
    #[serde(default)]
    pub version: u32,
}

/// Current envelope schema version. Bump only with a migration path for
/// cookies already in the wild.
pub const ENVELOPE_VERSION: u32 = 0;

impl PersistedEnvelope {
    /// Builds the envelope for the current session snapshot.
    pub fn new(user: Option<User>, is_authenticated: bool) -> Self {
        Self {
            state: PersistedState {
                user,
                is_authenticated,
            },
            version: ENVELOPE_VERSION,
        }
    }

    /// authenticated
    ///
    /// Resolves the envelope to an effective authentication flag for session
    /// materialization. Fail-closed: an envelope claiming `isAuthenticated`
    /// without a user record is treated as anonymous.
    pub fn authenticated(&self) -> bool {
        self.state.is_authenticated && self.state.user.is_some()
    }
}

// --- Request Payloads (Input Schemas) ---

/// LoginRequest
///
/// Input payload for POST /login. Credentials are accepted for shape only;
/// the marketplace runs against mocked identity data, so any non-empty pair
/// authenticates (the external token service owns real verification).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// RegisterRequest
///
/// Input payload for POST /register. Mirrors the marketplace signup form.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct RegisterRequest {
    pub email: String,
    pub username: String,
    pub password: String,
}

// --- Response Schemas ---

/// SessionResponse
///
/// Output of GET /session and the body of successful login/register responses.
/// Deliberately mirrors the persisted cookie shape so clients can treat either
/// source as authoritative.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub user: Option<User>,
    pub is_authenticated: bool,
}

/// LoginResponse
///
/// Successful login/register payload: the session snapshot plus the path the
/// client should navigate to (a remembered `redirect` target, or the default
/// authenticated landing page).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub session: SessionResponse,
    pub redirect_to: String,
}
