// Main entry point - Dependency injection and server setup
mod application;
mod domain;
mod infrastructure;
mod presentation;

use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use crate::application::report_service::ReportService;
use crate::infrastructure::config::load_config;
use crate::infrastructure::influx_repository::InfluxRepository;
use crate::infrastructure::csv_report::CsvReportRenderer;
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{health_check, space_statistics};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = load_config().context("Failed to load configuration")?;
    let utc_offset = config.report.utc_offset()?;

    // Infrastructure adapters
    let repository = Arc::new(InfluxRepository::new(
        config.influx.host,
        config.influx.token,
        config.influx.database,
        config.influx.retention_policy,
    ));
    let renderer = Arc::new(CsvReportRenderer::new());

    let state = Arc::new(AppState {
        report_service: ReportService::new(repository, renderer, utc_offset),
    });

    // Compression is applied per response in http_response, so no CompressionLayer here
    let router = Router::new()
        .route("/healthz", get(health_check))
        .route("/reports/space-statistics", get(space_statistics))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr: SocketAddr = config
        .server
        .bind_addr
        .parse()
        .with_context(|| format!("Invalid bind address: {}", config.server.bind_addr))?;
    tracing::info!(%addr, %utc_offset, "Starting space energy statistics service");

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router).await?;

    Ok(())
}
