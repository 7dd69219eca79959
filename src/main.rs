//! Star Gazing MCP Server - Entry Point
//!
//! This binary provides an MCP server via STDIO transport for lunar and weather lookups.

use anyhow::{Context, Result};
use rmcp::{transport::stdio, ServiceExt};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use star_gazing::ephemeris::prepare_ephemeris;
use star_gazing::weather::{OpenWeatherClient, USER_AGENT};
use star_gazing::{Config, StarGazingServer};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging to stderr (stdout is used for MCP communication)
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    tracing::info!("Starting Star Gazing MCP Server");

    let config = Config::from_env();
    let http = reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .build()
        .context("Failed to create HTTP client")?;

    let weather = OpenWeatherClient::new(http.clone(), &config);
    if !weather.has_api_key() {
        tracing::warn!("OPENWEATHER_API_KEY is not set; get_weather requests will be rejected upstream");
    }

    let ephemeris = prepare_ephemeris(&config, &http).await;
    tracing::info!(source = %ephemeris.describe(), "Ephemeris ready");

    // Create and run the MCP server
    let server = StarGazingServer::new(ephemeris, weather);
    let service = server.serve(stdio()).await?;

    tracing::info!("Server initialized, waiting for requests...");

    // Wait for shutdown
    service.waiting().await?;

    tracing::info!("Server shutting down");

    Ok(())
}
