use actix_cors::Cors;
use actix_web::{middleware, App, HttpServer};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use workmatch::auth::JwtVerifier;
use workmatch::config::{Settings, StoreBackend};
use workmatch::routes::{self, AppState};
use workmatch::services::{MemoryStore, PostgresClient, Store};

fn init_logging(level: &str, format: &str) {
    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    if format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.json().init();
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    let settings = match std::env::var("WORKMATCH_CONFIG") {
        Ok(path) => Settings::load_from(path),
        Err(_) => Settings::load(),
    }
    .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, format!("Configuration error: {}", e)))?;

    init_logging(&settings.logging.level, &settings.logging.format);

    info!("Starting Workmatch service...");
    info!("Configuration loaded successfully");

    let store: Arc<dyn Store> = match settings.database.backend {
        StoreBackend::Postgres => {
            let db_max_conn = settings.database.max_connections.unwrap_or(10);

            let postgres = PostgresClient::from_settings(
                &settings.database.url,
                Some(db_max_conn),
                settings.database.min_connections,
                settings.database.acquire_timeout_secs,
                settings.database.idle_timeout_secs,
            )
            .await
            .map_err(|e| {
                error!("Failed to connect to PostgreSQL: {}", e);
                std::io::Error::new(std::io::ErrorKind::Other, e.to_string())
            })?;

            info!("PostgreSQL client initialized (max: {} connections)", db_max_conn);
            Arc::new(postgres)
        }
        StoreBackend::Memory => {
            warn!("Using in-memory store, data will not survive a restart");
            Arc::new(MemoryStore::new())
        }
    };

    let verifier = JwtVerifier::new(
        &settings.auth.jwt_secret,
        settings.auth.issuer.clone(),
        settings.auth.leeway_secs,
    );

    let app_state = AppState::new(store, verifier);

    // Configure HTTP server
    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .configure(routes::configure_app(app_state.clone()))
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}
