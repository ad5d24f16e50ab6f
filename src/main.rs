use offerhub_gateway::{
    AppState, MemorySessionBackend, SessionStore,
    config::{AppConfig, Env},
    create_router,
    token::{HttpTokenService, TokenState},
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// main
///
/// The asynchronous entry point for the gateway, responsible for initializing
/// all core components: Configuration, Logging, Session Store, Token Service,
/// and the HTTP Server.
#[tokio::main]
async fn main() {
    // 1. Configuration & Environment Loading (Fail-Fast)
    // Loads .env file settings before configuration can be read.
    dotenv::dotenv().ok();
    // AppConfig::load() implements the fail-fast principle for missing Production settings.
    let config = AppConfig::load();

    // 2. Logging Filter Setup
    // Sets the default log level. It prioritizes the RUST_LOG environment variable,
    // falling back to sensible defaults for local development.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "offerhub_gateway=debug,tower_http=info,axum=trace".into());

    // 3. Initialize Logging based on Environment
    // The structured logging format is dynamically selected based on APP_ENV.
    match config.env {
        Env::Local => {
            // LOCAL: Pretty print output for human readability during local debugging.
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            // PROD: JSON format output for ingestion by centralized log aggregators.
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!("Gateway starting in {:?} mode", config.env);

    // 4. Token Collaborator Initialization
    // The external issue/revoke backend, reached over HTTP at the configured URL.
    let tokens = Arc::new(HttpTokenService::new(&config.token_service_url)) as TokenState;

    // 5. Session Store Assembly
    // The composition-root session object over the in-process backend. The
    // store rehydrates (fail-closed) from any record the backend holds.
    let backend = Arc::new(MemorySessionBackend::new());
    let store = Arc::new(SessionStore::new(backend, tokens.clone(), &config));

    // 6. Unified State Assembly
    let app_state = AppState {
        store,
        tokens,
        config,
    };

    // 7. Router and Server Startup
    let app = create_router(app_state);

    // Binds the TCP listener and initiates the HTTP server.
    let listener = TcpListener::bind("0.0.0.0:3000")
        .await
        .expect("FATAL: failed to bind 0.0.0.0:3000");

    tracing::info!("HTTP server bound successfully.");
    tracing::info!("Listening on 0.0.0.0:3000");
    tracing::info!("API Documentation (Swagger UI) available at: http://localhost:3000/swagger-ui");

    // The long-running Axum server process.
    axum::serve(listener, app)
        .await
        .expect("FATAL: server error");
}
