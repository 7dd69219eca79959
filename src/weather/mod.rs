//! OpenWeather client: geocode a city, then read its current conditions

use serde::de::DeserializeOwned;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::models::{CurrentWeatherResponse, GeoLocation, WeatherReport};

pub const USER_AGENT: &str = concat!("star-gazing/", env!("CARGO_PKG_VERSION"));

/// Client for the OpenWeather geocoding and current-weather endpoints
#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    client: reqwest::Client,
    api_key: Option<String>,
    geo_base_url: String,
    weather_base_url: String,
}

impl OpenWeatherClient {
    pub fn new(client: reqwest::Client, config: &Config) -> Self {
        Self {
            client,
            api_key: config.openweather_api_key.clone(),
            geo_base_url: config.geo_base_url.trim_end_matches('/').to_string(),
            weather_base_url: config.weather_base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Current weather for a city, by name
    pub async fn current_weather(&self, city: &str) -> Result<WeatherReport> {
        let location = self.geocode(city).await?;
        tracing::debug!(
            city,
            name = %location.name,
            country = location.country.as_deref().unwrap_or("-"),
            lat = location.lat,
            lon = location.lon,
            "Resolved city"
        );

        let url = format!("{}/weather", self.weather_base_url);
        let lat = location.lat.to_string();
        let lon = location.lon.to_string();
        let body: CurrentWeatherResponse = self
            .get_json(
                &url,
                &[("lat", lat.as_str()), ("lon", lon.as_str()), ("units", "metric")],
            )
            .await?;

        build_report(city, body)
    }

    /// First geocoding match for a city name
    pub async fn geocode(&self, city: &str) -> Result<GeoLocation> {
        let url = format!("{}/direct", self.geo_base_url);
        let matches: Vec<GeoLocation> = self
            .get_json(&url, &[("q", city), ("limit", "1")])
            .await?;

        first_location(city, matches)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str, params: &[(&str, &str)]) -> Result<T> {
        let mut request = self.client.get(url).query(params);
        // Without a key the upstream answers 401, which surfaces as an Upstream error
        if let Some(key) = &self.api_key {
            request = request.query(&[("appid", key.as_str())]);
        }

        tracing::debug!(url, "OpenWeather request");
        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json().await?)
    }
}

fn first_location(city: &str, matches: Vec<GeoLocation>) -> Result<GeoLocation> {
    matches
        .into_iter()
        .next()
        .ok_or_else(|| Error::LocationNotFound(city.to_string()))
}

fn build_report(city: &str, body: CurrentWeatherResponse) -> Result<WeatherReport> {
    let condition = body.weather.into_iter().next().ok_or_else(|| {
        Error::MalformedResponse("weather response has no conditions".to_string())
    })?;

    Ok(WeatherReport {
        location: city.to_string(),
        temperature: body.main.temp,
        description: condition.main,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_first_location() {
        let matches: Vec<GeoLocation> = serde_json::from_value(json!([
            {"name": "London", "lat": 51.5073219, "lon": -0.1276474, "country": "GB"},
            {"name": "London", "lat": 42.98, "lon": -81.24, "country": "CA"}
        ]))
        .unwrap();

        let location = first_location("London", matches).unwrap();
        assert_eq!(location.country.as_deref(), Some("GB"));
        assert!((location.lat - 51.5073219).abs() < 1e-9);
    }

    #[test]
    fn test_first_location_of_empty_list() {
        let matches: Vec<GeoLocation> = serde_json::from_value(json!([])).unwrap();
        let err = first_location("InvalidCityNameXYZ123", matches).unwrap_err();
        assert!(matches!(err, Error::LocationNotFound(ref c) if c == "InvalidCityNameXYZ123"));
    }

    #[test]
    fn test_build_report() {
        let body: CurrentWeatherResponse = serde_json::from_value(json!({
            "coord": {"lon": -0.1276, "lat": 51.5073},
            "weather": [{"id": 803, "main": "Clouds", "description": "broken clouds", "icon": "04d"}],
            "main": {"temp": 12.34, "feels_like": 11.5, "pressure": 1012, "humidity": 81},
            "name": "London"
        }))
        .unwrap();

        let report = build_report("london", body).unwrap();
        assert_eq!(
            report,
            WeatherReport {
                location: "london".to_string(),
                temperature: 12.34,
                description: "Clouds".to_string(),
            }
        );
        assert_eq!(
            serde_json::to_value(&report).unwrap(),
            json!({"location": "london", "temperature": 12.34, "description": "Clouds"})
        );
    }

    #[test]
    fn test_build_report_without_conditions() {
        let body: CurrentWeatherResponse =
            serde_json::from_value(json!({"main": {"temp": 3.0}, "weather": []})).unwrap();
        let err = build_report("Oslo", body).unwrap_err();
        assert!(matches!(err, Error::MalformedResponse(_)));
    }

    #[test]
    fn test_missing_temperature_fails_to_decode() {
        let body = serde_json::from_value::<CurrentWeatherResponse>(json!({
            "weather": [{"main": "Clear"}],
            "main": {}
        }));
        assert!(body.is_err());
    }

    #[test]
    fn test_client_config() {
        let config = Config {
            geo_base_url: "http://localhost:8080/geo/".to_string(),
            ..Config::default()
        };
        let client = OpenWeatherClient::new(reqwest::Client::new(), &config);
        assert_eq!(client.geo_base_url, "http://localhost:8080/geo");
        assert!(!client.has_api_key());
    }

    #[tokio::test]
    async fn test_connection_failure_propagates() {
        let config = Config {
            geo_base_url: "http://127.0.0.1:9".to_string(),
            ..Config::default()
        };
        let client = OpenWeatherClient::new(reqwest::Client::new(), &config);
        let err = client.current_weather("Paris").await.unwrap_err();
        assert!(matches!(err, Error::Http(_)));
    }

    fn mock_client(server: &mockito::Server, api_key: Option<&str>) -> OpenWeatherClient {
        let config = Config {
            openweather_api_key: api_key.map(str::to_string),
            geo_base_url: format!("{}/geo/1.0", server.url()),
            weather_base_url: format!("{}/data/2.5", server.url()),
            ..Config::default()
        };
        OpenWeatherClient::new(reqwest::Client::new(), &config)
    }

    #[tokio::test]
    async fn test_current_weather_success() {
        use mockito::Matcher;

        let mut server = mockito::Server::new_async().await;
        let geo = server
            .mock("GET", "/geo/1.0/direct")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("q".into(), "São Paulo".into()),
                Matcher::UrlEncoded("limit".into(), "1".into()),
                Matcher::UrlEncoded("appid".into(), "test-key".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"[{"name": "São Paulo", "lat": -23.5505, "lon": -46.6333, "country": "BR"}]"#)
            .create_async()
            .await;
        let weather = server
            .mock("GET", "/data/2.5/weather")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("lat".into(), "-23.5505".into()),
                Matcher::UrlEncoded("lon".into(), "-46.6333".into()),
                Matcher::UrlEncoded("units".into(), "metric".into()),
                Matcher::UrlEncoded("appid".into(), "test-key".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"weather": [{"id": 500, "main": "Rain", "description": "light rain"}],
                    "main": {"temp": 21.7, "humidity": 88}, "name": "São Paulo"}"#,
            )
            .create_async()
            .await;

        let client = mock_client(&server, Some("test-key"));
        let report = client.current_weather("São Paulo").await.unwrap();
        assert_eq!(
            report,
            WeatherReport {
                location: "São Paulo".to_string(),
                temperature: 21.7,
                description: "Rain".to_string(),
            }
        );

        geo.assert_async().await;
        weather.assert_async().await;
    }

    #[tokio::test]
    async fn test_unknown_city_is_location_not_found() {
        let mut server = mockito::Server::new_async().await;
        let geo = server
            .mock("GET", "/geo/1.0/direct")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("[]")
            .create_async()
            .await;
        let weather = server
            .mock("GET", "/data/2.5/weather")
            .match_query(mockito::Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let client = mock_client(&server, Some("test-key"));
        let err = client.current_weather("InvalidCityNameXYZ123").await.unwrap_err();
        assert!(matches!(err, Error::LocationNotFound(ref c) if c == "InvalidCityNameXYZ123"));

        geo.assert_async().await;
        weather.assert_async().await;
    }

    #[tokio::test]
    async fn test_missing_api_key_is_upstream_error() {
        let mut server = mockito::Server::new_async().await;
        let geo = server
            .mock("GET", "/geo/1.0/direct")
            .match_query(mockito::Matcher::Any)
            .with_status(401)
            .with_body(r#"{"cod": 401, "message": "Invalid API key."}"#)
            .create_async()
            .await;

        let client = mock_client(&server, None);
        let err = client.current_weather("Paris").await.unwrap_err();
        match err {
            Error::Upstream { status, body } => {
                assert_eq!(status, 401);
                assert!(body.contains("Invalid API key"));
            }
            other => panic!("expected upstream error, got {:?}", other),
        }

        geo.assert_async().await;
    }
}
