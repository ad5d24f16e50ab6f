use std::env;

/// AppConfig
///
/// Holds the gateway's entire configuration state. This struct is designed to be
/// immutable once loaded, ensuring consistency across all requests and services
/// (SessionStore, TokenService, Route Guard). It is pulled into the application
/// state via FromRef, embodying the "immutable AppConfig" part of the Unified
/// State Pattern.
#[derive(Clone)]
pub struct AppConfig {
    // Runtime environment marker. Controls the Secure cookie attribute.
    pub env: Env,
    // Name of the client-readable cookie carrying the persisted session envelope.
    pub auth_cookie_name: String,
    // Lifetime of the auth-state and auth-token cookies, in days.
    pub expiry_days: u64,
    // Lifetime of the refresh-token cookie, in days. Independent of expiry_days;
    // the two TTLs must never be conflated.
    pub refresh_expiry_days: u64,
    // Base URL of the external token service (issue/revoke collaborator).
    pub token_service_url: String,
    // Upper bound on the logout revocation call, in seconds. Local sign-out
    // proceeds regardless of whether the call completes within this window.
    pub revoke_timeout_secs: u64,
}

/// Env
///
/// Defines the runtime context. Production implies the deployment serves over
/// HTTPS, which turns on the `Secure` attribute for every cookie the gateway
/// writes; Local leaves it off so cookies work against plain-HTTP dev servers.
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

impl Default for AppConfig {
    /// default
    ///
    /// Provides a safe, non-panicking AppConfig instance primarily used for test
    /// setup. This allows us to instantiate the configuration without needing to
    /// set environment variables for lightweight unit or integration testing.
    fn default() -> Self {
        Self {
            env: Env::Local,
            auth_cookie_name: "auth-state".to_string(),
            expiry_days: 7,
            refresh_expiry_days: 30,
            token_service_url: "http://localhost:4000".to_string(),
            revoke_timeout_secs: 5,
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// The canonical function for initializing the gateway configuration at startup.
    /// It reads all parameters from environment variables and implements the
    /// **fail-fast** principle.
    ///
    /// # Panics
    /// Panics if a critical environment variable required for the current runtime
    /// environment (especially Production) is not found, or if a numeric variable
    /// does not parse. This prevents the gateway from starting with an incomplete
    /// or insecure configuration.
    pub fn load() -> Self {
        let env_str = env::var("APP_ENV").unwrap_or_else(|_| "local".to_string());
        let env = match env_str.as_str() {
            "production" => Env::Production,
            _ => Env::Local,
        };

        // Token Service Resolution
        // The production endpoint is mandatory and must be explicitly set.
        let token_service_url = match env {
            Env::Production => env::var("TOKEN_SERVICE_URL")
                .expect("FATAL: TOKEN_SERVICE_URL must be set in production."),
            // In local, fall back to the stub collaborator from the dev compose setup.
            _ => env::var("TOKEN_SERVICE_URL")
                .unwrap_or_else(|_| "http://localhost:4000".to_string()),
        };

        Self {
            env,
            auth_cookie_name: env::var("AUTH_COOKIE_NAME")
                .unwrap_or_else(|_| "auth-state".to_string()),
            expiry_days: parse_positive("AUTH_EXPIRY_DAYS", 7),
            refresh_expiry_days: parse_positive("REFRESH_EXPIRY_DAYS", 30),
            token_service_url,
            revoke_timeout_secs: parse_positive("REVOKE_TIMEOUT_SECS", 5),
        }
    }

    /// secure_cookies
    ///
    /// Whether the `Secure` attribute is appended to emitted cookies. True only
    /// in Production, where the deployment is assumed to serve over HTTPS.
    pub fn secure_cookies(&self) -> bool {
        self.env == Env::Production
    }
}

/// parse_positive
///
/// Reads a positive integer environment variable, falling back to the given
/// default when unset. A set-but-unparseable value is a configuration error
/// and fails fast rather than silently running with a wrong lifetime.
fn parse_positive(var: &str, default: u64) -> u64 {
    match env::var(var) {
        Ok(raw) => raw
            .parse()
            .unwrap_or_else(|_| panic!("FATAL: {} must be a positive integer, got '{}'", var, raw)),
        Err(_) => default,
    }
}
