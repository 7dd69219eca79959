//! Star Gazing - Lunar and Weather MCP Server
//!
//! A Model Context Protocol server for lunar eclipse search and moon phases
//! using the Swiss Ephemeris library, plus current weather from OpenWeather.

pub mod config;
pub mod ephemeris;
pub mod error;
pub mod models;
pub mod server;
pub mod weather;

pub use config::Config;
pub use ephemeris::Ephemeris;
pub use error::{Error, Result};
pub use server::StarGazingServer;
