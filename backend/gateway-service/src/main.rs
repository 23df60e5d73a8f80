/// Gateway entry point
///
/// Builds the route table and identity client once, then serves every
/// request through the role authorization middleware.
use actix_web::{web, App, HttpServer};
use anyhow::{Context, Result};
use gateway_service::{config::Config, HttpIdentityClient, Proxy, RoleAuthorization};
use std::sync::Arc;
use tracing::info;

#[actix_web::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,gateway_service=debug".into()),
        )
        .with_target(false)
        .json()
        .init();

    info!("Starting Gateway Service");

    let config = Config::load().context("Failed to load configuration")?;
    for route in config.routes.routes() {
        info!(
            prefix = %route.prefix,
            upstream = %route.upstream,
            roles = ?route.roles,
            "Route registered"
        );
    }

    let policy = Arc::new(config.routes.clone());
    let validator = Arc::new(
        HttpIdentityClient::new(
            &config.auth.service_url,
            &config.auth.validate_path,
            config.auth.timeout(),
            config.auth.cookie_name.clone(),
        )
        .context("Failed to build identity client")?,
    );
    let proxy = web::Data::new(
        Proxy::new(policy.clone(), config.upstream_timeout())
            .context("Failed to build upstream client")?,
    );
    info!(url = %validator.validate_url(), "Token validation endpoint");

    let cookie_name = config.auth.cookie_name.clone();
    let bind_address = format!("{}:{}", config.server.host, config.server.port);
    info!("Gateway running on {}", bind_address);

    HttpServer::new(move || {
        App::new()
            .app_data(proxy.clone())
            .wrap(RoleAuthorization::new(
                policy.clone(),
                validator.clone(),
                &cookie_name,
            ))
            .wrap(tracing_actix_web::TracingLogger::default())
            .configure(gateway_service::configure)
    })
    .bind(&bind_address)
    .with_context(|| format!("Failed to bind {bind_address}"))?
    .run()
    .await
    .context("HTTP server error")?;

    info!("Gateway shutdown complete");

    Ok(())
}
