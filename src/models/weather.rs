use serde::{Deserialize, Serialize};

/// One entry of the geocoding response
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GeoLocation {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    #[serde(default)]
    pub country: Option<String>,
}

/// Subset of the current-weather response the tool reads
#[derive(Debug, Clone, Deserialize)]
pub struct CurrentWeatherResponse {
    pub main: MainReadings,
    #[serde(default)]
    pub weather: Vec<WeatherCondition>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MainReadings {
    /// Celsius when requested with `units=metric`
    pub temp: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WeatherCondition {
    /// Short group label, e.g. "Clouds"
    pub main: String,
}

/// Result of the weather tool
#[derive(Debug, Clone, PartialEq, Serialize, schemars::JsonSchema)]
pub struct WeatherReport {
    /// City name as given by the caller
    pub location: String,
    /// Temperature in Celsius
    pub temperature: f64,
    /// Short condition label
    pub description: String,
}
