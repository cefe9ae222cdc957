use newsroom_api::{
    AppState, Argon2Hasher,
    config::{AppConfig, Env},
    create_router,
    providers::{ImageStore, MokaArticleCache, PayPalClient, S3ImageStore, SendGridSender},
    repository::PostgresRepository,
};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// main
///
/// Loads configuration, sets up logging, connects and migrates the database,
/// wires the third-party collaborators and serves the router.
#[tokio::main]
async fn main() {
    // 1. Configuration (fail-fast on missing production secrets).
    dotenv::dotenv().ok();
    let config = AppConfig::load();

    // 2. Logging: RUST_LOG wins, otherwise our crate at debug.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "newsroom_api=debug,tower_http=info".into());

    match config.env {
        Env::Local => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            // JSON lines for the log aggregator.
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

    let repository = PostgresRepository::new(pool);
    repository
        .migrate()
        .await
        .expect("FATAL: Failed to apply database migrations.");

    // 4. Collaborators
    let storage = S3ImageStore::new(
        &config.s3_endpoint,
        &config.s3_region,
        &config.s3_key,
        &config.s3_secret,
        &config.s3_bucket,
    );

    // LOCAL-ONLY: the dockerized MinIO starts without a bucket.
    if config.env == Env::Local {
        storage.ensure_bucket_exists().await;
    }

    let payments = PayPalClient::new(
        &config.paypal_base_url,
        &config.paypal_client_id,
        &config.paypal_secret,
        &config.paypal_plan_id,
    );
    let mailer = SendGridSender::new(&config.sendgrid_api_key, &config.sendgrid_sender);

    let app_state = AppState {
        repo: Arc::new(repository),
        storage: Arc::new(storage),
        payments: Arc::new(payments),
        mailer: Arc::new(mailer),
        cache: Arc::new(MokaArticleCache::default()),
        hasher: Arc::new(Argon2Hasher::default()),
        config: config.clone(),
    };

    // 5. Server
    let app = create_router(app_state);
    let address = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&address)
        .await
        .unwrap_or_else(|e| panic!("FATAL: Failed to bind {address}: {e}"));

    tracing::info!("Listening on {address}");
    tracing::info!(
        "API Documentation (Swagger UI) available at: http://localhost:{}/swagger-ui",
        config.port
    );

    axum::serve(listener, app).await.expect("FATAL: HTTP server error");
}
