use serde::{Deserialize, Serialize};

/// Moon phase at an instant
///
/// Field names are capitalized on the wire (`Phase`, `Percent`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct MoonPhase {
    /// Moon longitude minus Sun longitude in degrees, [0, 360). 0 is new moon, 180 is full moon.
    #[serde(rename = "Phase")]
    pub phase: f64,
    /// Illuminated share of the lunar disc, 0-100
    #[serde(rename = "Percent")]
    pub percent: f64,
}
