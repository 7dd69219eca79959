use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{json, Value};

use crate::ephemeris::{julian_day_to_datetime, time::MINUTE_FORMAT, LunarEclipse};
use crate::error::{Error, Result};

// Swiss Ephemeris eclipse type bits
const SE_ECL_TOTAL: i32 = 4;
const SE_ECL_PARTIAL: i32 = 16;
const SE_ECL_PENUMBRAL: i32 = 64;

/// Lunar eclipse types, ordered by depth into Earth's shadow
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum LunarEclipseKind {
    Penumbral,
    Partial,
    Total,
}

impl LunarEclipseKind {
    /// Decode the type bits returned by the eclipse search
    pub fn from_swe_flags(flags: i32) -> Option<Self> {
        if flags & SE_ECL_TOTAL != 0 {
            Some(LunarEclipseKind::Total)
        } else if flags & SE_ECL_PARTIAL != 0 {
            Some(LunarEclipseKind::Partial)
        } else if flags & SE_ECL_PENUMBRAL != 0 {
            Some(LunarEclipseKind::Penumbral)
        } else {
            None
        }
    }

    pub fn code(&self) -> u8 {
        match self {
            LunarEclipseKind::Penumbral => 0,
            LunarEclipseKind::Partial => 1,
            LunarEclipseKind::Total => 2,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            LunarEclipseKind::Penumbral => "Penumbral",
            LunarEclipseKind::Partial => "Partial",
            LunarEclipseKind::Total => "Total",
        }
    }
}

/// One eclipse on the wire: `["y=<code>", "<label>", {details}]`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EclipseRecord(pub String, pub String, pub BTreeMap<String, Value>);

impl EclipseRecord {
    pub fn code(&self) -> &str {
        &self.0
    }

    pub fn label(&self) -> &str {
        &self.1
    }

    pub fn details(&self) -> &BTreeMap<String, Value> {
        &self.2
    }
}

impl TryFrom<&LunarEclipse> for EclipseRecord {
    type Error = Error;

    fn try_from(eclipse: &LunarEclipse) -> Result<Self> {
        let mut details = BTreeMap::new();
        details.insert("umbral_magnitude".to_string(), json!(eclipse.umbral_magnitude));
        details.insert(
            "penumbral_magnitude".to_string(),
            json!(eclipse.penumbral_magnitude),
        );
        details.insert(
            "distance_from_opposition_degrees".to_string(),
            json!(eclipse.distance_from_opposition),
        );
        details.insert(
            "saros_series".to_string(),
            json!(eclipse.saros_series.round() as i64),
        );
        details.insert(
            "saros_member".to_string(),
            json!(eclipse.saros_member.round() as i64),
        );

        for (name, contact) in eclipse.contacts.named() {
            if let Some(jd) = contact {
                details.insert(name.to_string(), Value::String(format_julian_day(jd)?));
            }
        }

        Ok(EclipseRecord(
            format!("y={}", eclipse.kind.code()),
            eclipse.kind.label().to_string(),
            details,
        ))
    }
}

/// Eclipses keyed by their `YYYY-MM-DD HH:MM` (UTC) maximum
///
/// Keys sort chronologically. Two eclipses rounding to the same minute keep
/// distinct entries: the later one gets a ` #2` suffix, then ` #3`, and so on.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct EclipseReport {
    entries: BTreeMap<String, EclipseRecord>,
}

impl EclipseReport {
    pub fn from_eclipses(eclipses: &[LunarEclipse]) -> Result<Self> {
        let mut report = Self::default();
        for eclipse in eclipses {
            let key = format_julian_day(eclipse.maximum)?;
            report.insert(key, EclipseRecord::try_from(eclipse)?);
        }
        Ok(report)
    }

    /// Insert under `timestamp`, disambiguating a key that is already taken
    pub fn insert(&mut self, timestamp: String, record: EclipseRecord) -> String {
        let mut key = timestamp.clone();
        let mut n = 1;
        while self.entries.contains_key(&key) {
            n += 1;
            key = format!("{} #{}", timestamp, n);
        }
        self.entries.insert(key.clone(), record);
        key
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&EclipseRecord> {
        self.entries.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &EclipseRecord)> {
        self.entries.iter()
    }

    /// Pretty-printed JSON object, `{}` when empty
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

fn format_julian_day(julian_day: f64) -> Result<String> {
    julian_day_to_datetime(julian_day)
        .map(|dt| dt.format(MINUTE_FORMAT).to_string())
        .ok_or_else(|| Error::Ephemeris(format!("Julian day {} is out of range", julian_day)))
}
