//! Environment-driven configuration

use std::env;
use std::path::PathBuf;

pub const DEFAULT_GEO_URL: &str = "https://api.openweathermap.org/geo/1.0";
pub const DEFAULT_WEATHER_URL: &str = "https://api.openweathermap.org/data/2.5";

/// Runtime settings read once at startup
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// OpenWeather API key (`OPENWEATHER_API_KEY`)
    pub openweather_api_key: Option<String>,
    /// Geocoding endpoint base (`OPENWEATHER_GEO_URL`)
    pub geo_base_url: String,
    /// Current-weather endpoint base (`OPENWEATHER_API_URL`)
    pub weather_base_url: String,
    /// Directory holding Swiss Ephemeris data files (`STAR_GAZING_EPHE_PATH`)
    pub ephemeris_dir: Option<PathBuf>,
    /// Download missing data files at startup (`STAR_GAZING_FETCH_EPHEMERIS`)
    pub fetch_ephemeris: bool,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from any key lookup, so tests don't touch the process environment
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Self {
            openweather_api_key: non_empty("OPENWEATHER_API_KEY"),
            geo_base_url: non_empty("OPENWEATHER_GEO_URL")
                .unwrap_or_else(|| DEFAULT_GEO_URL.to_string()),
            weather_base_url: non_empty("OPENWEATHER_API_URL")
                .unwrap_or_else(|| DEFAULT_WEATHER_URL.to_string()),
            ephemeris_dir: non_empty("STAR_GAZING_EPHE_PATH").map(PathBuf::from),
            fetch_ephemeris: non_empty("STAR_GAZING_FETCH_EPHEMERIS")
                .map(|v| parse_flag(&v))
                .unwrap_or(false),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
