use inkpress::{
    AppState, TokenService,
    config::{AppConfig, Env},
    create_router,
    repository::{PostgresRepository, RepositoryState},
    storage::{AssetStoreState, S3AssetStore},
};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// main
///
/// Boots the service in dependency order: configuration, logging, token
/// keys, database pool and migrations, asset store, then the HTTP listener.
#[tokio::main]
async fn main() {
    // 1. Configuration & Environment Loading (Fail-Fast)
    // .env values must land before anything reads the environment.
    dotenv::dotenv().ok();
    // A broken configuration must stop the process before it can serve a
    // single request. Logging is not up yet, so this goes to stderr.
    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("FATAL: configuration error: {err}");
            std::process::exit(1);
        }
    };

    // 2. Logging Filter Setup
    // RUST_LOG wins when set; otherwise default to chatty local levels.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "inkpress=debug,tower_http=info,axum=trace".into());

    // 3. Initialize Logging based on Environment
    match config.env {
        Env::Local => {
            // LOCAL: human-readable multi-line output.
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            // PROD: one JSON object per line, for the log pipeline.
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!("Application starting in {:?} mode", config.env);
    if config.setup_token.is_some() {
        tracing::info!("Account provisioning enabled via setup token.");
    } else {
        tracing::info!("Account provisioning disabled (no SETUP_TOKEN set).");
    }

    // 4. Token Service Initialization
    // The signing secret was already validated by AppConfig::load, so this
    // only fails if the binary is wired up wrong.
    let tokens = match TokenService::new(&config.jwt_secret) {
        Ok(tokens) => tokens,
        Err(err) => {
            eprintln!("FATAL: {err}");
            std::process::exit(1);
        }
    };

    // 5. Database Initialization (Postgres)
    // One pool, built here and reused by every request.
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.db_url)
        .await
        .expect("FATAL: Failed to connect to Postgres. Check DATABASE_URL.");

    // Apply any pending schema migrations embedded at compile time.
    sqlx::migrate!()
        .run(&pool)
        .await
        .expect("FATAL: Failed to run database migrations.");

    // The repository goes into the state as a trait object; handlers never
    // see the concrete Postgres type.
    let repo = Arc::new(PostgresRepository::new(pool)) as RepositoryState;

    // 6. Asset Storage Initialization (S3/MinIO)
    // The same client construction serves MinIO locally and real S3 in
    // production; only endpoint and credentials differ.
    let asset_store = S3AssetStore::new(
        &config.s3_endpoint,
        &config.s3_region,
        &config.s3_key,
        &config.s3_secret,
        &config.s3_bucket,
        &config.s3_public_url,
    );

    // LOCAL-ONLY: a fresh MinIO starts without the bucket, so create it on
    // first run. Production buckets are provisioned out of band.
    if config.env == Env::Local {
        use inkpress::storage::AssetStore;
        asset_store.ensure_bucket_exists().await;
    }

    let assets = Arc::new(asset_store) as AssetStoreState;

    // 7. Unified State Assembly
    // The port is needed after config moves into the state.
    let port = config.port;
    let app_state = AppState {
        repo,
        assets,
        tokens,
        config,
    };

    // 8. Router and Server Startup
    let app = create_router(app_state);

    let listener = TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .expect("FATAL: Failed to bind the listen port.");

    tracing::info!("HTTP server bound successfully.");
    tracing::info!("Listening on 0.0.0.0:{port}");
    tracing::info!(
        "API Documentation (Swagger UI) available at: http://localhost:{port}/swagger-ui"
    );

    // Serves until the process is stopped.
    axum::serve(listener, app)
        .await
        .expect("FATAL: HTTP server terminated unexpectedly.");
}
