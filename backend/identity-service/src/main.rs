/// Identity Service Main Entry Point
///
/// Starts the HTTP API with:
/// - Token codec built once from configuration
/// - PostgreSQL repositories when `DATABASE_URL` is set, in-process otherwise
/// - Session manager wrapped in the logging decorator
use actix_web::{web, App, HttpServer};
use anyhow::{Context, Result};
use identity_service::{
    config::Settings,
    db::Repositories,
    http::{self, AppState, CookieSettings},
    security::TokenCodec,
    LoggingAuthService, SessionManager, SessionPolicy,
};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

#[actix_web::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,identity_service=debug".into()),
        )
        .with_target(false)
        .json()
        .init();

    info!("Starting Identity Service");

    let settings = Settings::load().context("Failed to load configuration")?;
    info!(environment = %settings.environment, "Configuration loaded successfully");

    let codec = Arc::new(
        TokenCodec::new(settings.jwt.codec_config()).context("Failed to build token codec")?,
    );

    let repositories = match &settings.database {
        Some(database) => {
            let pool = PgPoolOptions::new()
                .max_connections(database.max_connections)
                .acquire_timeout(Duration::from_secs(5))
                .connect(&database.url)
                .await
                .context("Failed to connect to PostgreSQL")?;

            info!(
                "Database pool initialized with {} max connections",
                database.max_connections
            );

            sqlx::migrate!("./migrations")
                .run(&pool)
                .await
                .context("Failed to run database migrations")?;
            info!("Database migrations completed");

            Repositories::postgres(pool)
        }
        None => {
            warn!("DATABASE_URL not set; using in-process storage (single node, not durable)");
            Repositories::in_memory()
        }
    };

    let manager = SessionManager::new(
        repositories,
        codec,
        SessionPolicy {
            rotation_threshold: chrono::Duration::seconds(settings.session.rotation_threshold_secs),
            validate_requires_session: settings.session.validate_requires_session,
            app_origin: settings.app_origin.clone(),
        },
    );

    let state = AppState {
        auth: Arc::new(LoggingAuthService::new(manager)),
        cookies: CookieSettings::new(settings.is_production(), &settings.server.api_prefix),
        request_timeout: settings.server.request_timeout(),
    };

    let api_prefix = settings.server.api_prefix.clone();
    let bind_address = format!("{}:{}", settings.server.host, settings.server.port);
    info!("Starting HTTP server on {}{}", bind_address, api_prefix);

    HttpServer::new(move || {
        let prefix = api_prefix.clone();
        App::new()
            .app_data(web::Data::new(state.clone()))
            .wrap(tracing_actix_web::TracingLogger::default())
            .configure(move |cfg| http::configure(cfg, &prefix))
    })
    .bind(&bind_address)
    .with_context(|| format!("Failed to bind {bind_address}"))?
    .run()
    .await
    .context("HTTP server error")?;

    info!("Identity service shutdown complete");

    Ok(())
}
