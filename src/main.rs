//! Sensorhub
//!
//! In-memory time-series ingestion and aggregation engine for sensor
//! telemetry: bounded rolling windows per sensor, incremental statistics,
//! liveness-based status classification, and fleet-wide queries.

use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use anyhow::Context;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod config;
mod error;
mod gateway;
mod handlers;
mod models;
mod query;
mod status;
mod store;
mod sweep;
mod websocket;
mod window;

use crate::config::Settings;
use crate::gateway::IngestionGateway;
use crate::store::SensorStore;
use crate::sweep::LivenessSweeper;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Load .env
    dotenv::dotenv().ok();

    // Logging
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sensorhub=debug"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().json())
        .init();

    // Load configuration
    let settings = Settings::from_env().context("Failed to load configuration")?;
    let bind_address = format!("{}:{}", settings.server.host, settings.server.port);

    info!("Starting sensorhub backend");
    info!("Binding server to {}", bind_address);
    info!(
        report_interval_secs = settings.engine.report_interval_secs,
        sweep_interval_ms = settings.engine.sweep_interval_ms,
        "Telemetry engine configured"
    );

    // The store is constructed once and passed by handle everywhere
    let store = Arc::new(SensorStore::new(settings.store_config()));
    let gateway = IngestionGateway::new(store.clone());

    // ---------------------------------------------------------------------
    // Liveness sweep background task
    // IMPORTANT: use actix_rt::spawn (NOT tokio::spawn)
    // ---------------------------------------------------------------------
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let sweeper = LivenessSweeper::new(store.clone(), settings.engine.sweep_interval_ms);

    actix_rt::spawn(async move {
        sweeper.run(shutdown_rx).await;
    });

    // ---------------------------------------------------------------------
    // HTTP + WebSocket server
    // ---------------------------------------------------------------------
    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .app_data(web::Data::new(store.clone()))
            .app_data(web::Data::new(gateway.clone()))
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .wrap(tracing_actix_web::TracingLogger::default())
            .configure(handlers::configure_routes)
    })
    .bind(&bind_address)?
    .run()
    .await?;

    // Stop the sweeper before exit so no record is left mid-update
    shutdown_tx.send(true).ok();

    Ok(())
}
