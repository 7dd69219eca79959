//! MCP server surface

mod tools;

pub use tools::{LunarEclipseInput, MoonPhaseInput, StarGazingServer, WeatherInput};
