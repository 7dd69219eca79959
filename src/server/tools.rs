//! MCP Server tools for lunar eclipses, moon phases and weather

use std::sync::Arc;

use rmcp::{
    RoleServer, ServerHandler,
    model::{
        CallToolRequestParam, CallToolResult, Content, Implementation, ListToolsResult,
        PaginatedRequestParam, ProtocolVersion, ServerCapabilities, ServerInfo, Tool,
    },
    schemars::{self, schema_for},
    service::RequestContext,
};
use serde::Deserialize;
use serde_json::Value;

use crate::ephemeris::{parse_iso_datetime, Ephemeris};
use crate::error::Result;
use crate::models::{EclipseReport, MoonPhase, WeatherReport};
use crate::weather::OpenWeatherClient;

/// Input for the lunar eclipse search
#[derive(Debug, Clone, Deserialize, schemars::JsonSchema)]
pub struct LunarEclipseInput {
    #[schemars(description = "Start of the search window, ISO 8601 (e.g. '2026-01-01T14:30'), UTC")]
    pub starting_time_iso_datetime: String,
    #[schemars(description = "End of the search window, ISO 8601, UTC")]
    pub ending_time_iso_datetime: String,
}

/// Input for the moon phase
#[derive(Debug, Clone, Deserialize, schemars::JsonSchema)]
pub struct MoonPhaseInput {
    #[schemars(description = "Instant of observation, ISO 8601 (e.g. '2026-01-01T14:30'), UTC")]
    pub iso_datetime: String,
}

/// Input for current weather
#[derive(Debug, Clone, Deserialize, schemars::JsonSchema)]
pub struct WeatherInput {
    #[schemars(description = "City name, e.g. 'London' or 'Paris,FR'")]
    pub city: String,
}

fn schema_to_value<T: schemars::JsonSchema>() -> Arc<serde_json::Map<String, Value>> {
    let schema = schema_for!(T);
    match serde_json::to_value(schema) {
        Ok(Value::Object(map)) => Arc::new(map),
        _ => Arc::new(serde_json::Map::new()),
    }
}

fn parse_input<T: serde::de::DeserializeOwned>(args: Value) -> Result<T, rmcp::ErrorData> {
    serde_json::from_value(args).map_err(|e| rmcp::ErrorData::invalid_params(e.to_string(), None))
}

/// MCP Server for lunar and weather lookups
#[derive(Clone)]
pub struct StarGazingServer {
    ephemeris: Arc<Ephemeris>,
    weather: Arc<OpenWeatherClient>,
}

impl StarGazingServer {
    pub fn new(ephemeris: Ephemeris, weather: OpenWeatherClient) -> Self {
        Self {
            ephemeris: Arc::new(ephemeris),
            weather: Arc::new(weather),
        }
    }

    /// Lunar eclipses in a window, as pretty-printed JSON text
    pub async fn get_lunar_eclipse(&self, input: LunarEclipseInput) -> Result<String> {
        let ephemeris = Arc::clone(&self.ephemeris);
        // The search can span centuries and holds the engine lock throughout
        tokio::task::spawn_blocking(move || lunar_eclipse_report(&ephemeris, &input)).await?
    }

    pub async fn get_moon_phase(&self, input: MoonPhaseInput) -> Result<MoonPhase> {
        let ephemeris = Arc::clone(&self.ephemeris);
        tokio::task::spawn_blocking(move || {
            let time = parse_iso_datetime(&input.iso_datetime)?;
            ephemeris.moon_phase(&time)
        })
        .await?
    }

    pub async fn get_weather(&self, input: WeatherInput) -> Result<WeatherReport> {
        self.weather.current_weather(&input.city).await
    }

    fn get_tools(&self) -> Vec<Tool> {
        vec![
            Tool::new(
                "get_lunar_eclipse",
                "Return the lunar eclipses (penumbral, partial, total) whose maximum falls between the start and end times, keyed by UTC timestamp.",
                schema_to_value::<LunarEclipseInput>(),
            ),
            Tool::new(
                "get_moon_phase",
                "Get the moon phase angle (0 = new moon, 180 = full moon) and illuminated percentage at an instant.",
                schema_to_value::<MoonPhaseInput>(),
            ),
            Tool::new(
                "get_weather",
                "Get current weather for a city using the OpenWeather API: temperature in Celsius and a short condition label.",
                schema_to_value::<WeatherInput>(),
            ),
        ]
    }
}

fn lunar_eclipse_report(ephemeris: &Ephemeris, input: &LunarEclipseInput) -> Result<String> {
    let start = parse_iso_datetime(&input.starting_time_iso_datetime)?;
    let end = parse_iso_datetime(&input.ending_time_iso_datetime)?;

    let eclipses = ephemeris.lunar_eclipses(&start, &end)?;
    tracing::debug!(
        start = %start.format_minute(),
        end = %end.format_minute(),
        count = eclipses.len(),
        "Lunar eclipse search"
    );

    EclipseReport::from_eclipses(&eclipses)?.to_json()
}

fn to_json_text<T: serde::Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

impl ServerHandler for StarGazingServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation::from_build_env(),
            instructions: Some(
                "Star gazing - lunar eclipse search and moon phases from Swiss Ephemeris, \
                 plus current weather from OpenWeather. Datetimes are ISO 8601 and read as UTC."
                    .to_string(),
            ),
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::ErrorData> {
        Ok(ListToolsResult {
            tools: self.get_tools(),
            next_cursor: None,
            meta: None,
        })
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::ErrorData> {
        let args: Value = Value::Object(request.arguments.clone().unwrap_or_default());
        tracing::debug!(tool = %request.name, "Tool call");

        let result = match request.name.as_ref() {
            "get_lunar_eclipse" => self.get_lunar_eclipse(parse_input(args)?).await,
            "get_moon_phase" => self
                .get_moon_phase(parse_input(args)?)
                .await
                .and_then(|phase| to_json_text(&phase)),
            "get_weather" => self
                .get_weather(parse_input(args)?)
                .await
                .and_then(|report| to_json_text(&report)),
            _ => {
                return Err(rmcp::ErrorData::invalid_params(
                    format!("Unknown tool: {}", request.name),
                    None,
                ))
            }
        };

        match result {
            Ok(text) => Ok(CallToolResult::success(vec![Content::text(text)])),
            Err(e) => {
                tracing::warn!(tool = %request.name, error = %e, "Tool call failed");
                Ok(CallToolResult::error(vec![Content::text(e.to_string())]))
            }
        }
    }
}
