use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tap_in::{
    AppState, ProfileEvents,
    config::{AppConfig, Env, SessionVerifier},
    create_router,
    repository::{LookupState, PostgresRepository, RepositoryState},
    session::{JwtSessionProvider, SessionState, SupabaseSessionProvider},
};
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// main
///
/// Loads configuration, initializes logging, connects to Postgres, selects the
/// session provider and serves HTTP.
#[tokio::main]
async fn main() {
    // 1. Configuration (fail-fast on missing secrets)
    dotenv::dotenv().ok();
    let config = AppConfig::load();

    // 2. Logging: RUST_LOG wins, otherwise debug for this crate.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "tap_in=debug,tower_http=info,axum=info".into());

    match config.env {
        Env::Local => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!("Application starting in {:?} mode", config.env);

    // 3. Database
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.db_url)
        .await
        .expect("FATAL: Failed to connect to Postgres. Check DATABASE_URL.");

    // One repository serves both the API and the guard's lookup.
    let postgres = Arc::new(PostgresRepository::new(pool));
    let repo = postgres.clone() as RepositoryState;
    let lookup = postgres as LookupState;

    // 4. Session provider
    let sessions = match config.session_verifier {
        SessionVerifier::Jwt => Arc::new(JwtSessionProvider::new(
            &config.jwt_secret,
            &config.jwt_audience,
        )) as SessionState,
        SessionVerifier::Remote => {
            let supabase_url = config
                .supabase_url
                .as_deref()
                .expect("FATAL: SUPABASE_URL is required for remote session verification");
            let provider = SupabaseSessionProvider::new(
                supabase_url,
                config.supabase_anon_key.clone(),
                config.session_timeout,
            )
            .expect("FATAL: Failed to build the Supabase HTTP client");
            Arc::new(provider) as SessionState
        }
    };
    tracing::info!(verifier = ?config.session_verifier, "session provider ready");

    let bind_addr = config.bind_addr.clone();
    let app_state = AppState {
        repo,
        lookup,
        sessions,
        events: Arc::new(ProfileEvents::new()),
        config,
    };

    // 5. Router and server
    let app = create_router(app_state);

    let listener = TcpListener::bind(&bind_addr)
        .await
        .expect("FATAL: Failed to bind the HTTP listener. Check BIND_ADDR.");

    tracing::info!("Listening on {}", bind_addr);
    tracing::info!("API Documentation (Swagger UI) available at /api/docs");

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!(error = %e, "server terminated");
    }
}
