// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Certforge: attendance-checked certificate issuance.
//
// Entry point. Initialises logging, loads config, builds the backend services
// and serves the HTTP API.

mod api;
mod services;

use anyhow::Context;
use certforge_core::AppConfig;

use services::app_services::AppServices;
use services::data_dir;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tracing::info!("Certforge starting");

    let data_dir = data_dir::data_dir();
    let config_path = data_dir::config_path();
    let config = AppConfig::load_or_default(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;

    let services = AppServices::init(config, &data_dir).context("initialising services")?;

    let server = &services.config().server;
    let addr = format!("{}:{}", server.host, server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;

    tracing::info!(
        %addr,
        mode = ?services.config().delivery_mode,
        events = services.events().len(),
        "listening"
    );

    axum::serve(listener, api::router(services)).await?;
    Ok(())
}
