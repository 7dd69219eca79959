//! Sun and Moon positions and lunar phase

use crate::error::Result;
use crate::models::MoonPhase;

use super::{error_buffer, swe_error, Ephemeris, EventTime, SEFLG_SPEED};

/// Bodies the tools need from the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Body {
    Sun,
    Moon,
}

impl Body {
    /// Swiss Ephemeris body number
    pub fn swe_id(&self) -> i32 {
        match self {
            Body::Sun => 0,
            Body::Moon => 1,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Body::Sun => "Sun",
            Body::Moon => "Moon",
        }
    }
}

/// Apparent geocentric position in the ecliptic of date
#[derive(Debug, Clone)]
pub struct BodyPosition {
    /// Ecliptic longitude (0-360 degrees)
    pub longitude: f64,
    /// Ecliptic latitude
    pub latitude: f64,
    /// Distance in AU
    pub distance: f64,
    /// Speed in longitude (degrees per day)
    pub speed_longitude: f64,
}

impl Ephemeris {
    /// Calculate the apparent position of a body at a given instant
    pub fn body_position(&self, body: Body, time: &EventTime) -> Result<BodyPosition> {
        let mut xx: [f64; 6] = [0.0; 6];
        let mut serr = error_buffer();

        let iflg = self.flags() | SEFLG_SPEED;

        let ret = {
            let _swe = self.session();
            unsafe {
                libswisseph_sys::swe_calc_ut(
                    time.julian_day(),
                    body.swe_id(),
                    iflg,
                    xx.as_mut_ptr(),
                    serr.as_mut_ptr(),
                )
            }
        };

        if ret < 0 {
            return Err(swe_error(
                &serr,
                &format!("failed to compute {} position", body.name()),
            ));
        }

        Ok(BodyPosition {
            longitude: xx[0],
            latitude: xx[1],
            distance: xx[2],
            speed_longitude: xx[3],
        })
    }

    /// Moon longitude minus Sun longitude, normalized to [0, 360)
    pub fn sun_moon_angle(&self, time: &EventTime) -> Result<f64> {
        let sun = self.body_position(Body::Sun, time)?;
        let moon = self.body_position(Body::Moon, time)?;

        Ok(normalize_degrees(moon.longitude - sun.longitude))
    }

    /// Illuminated fraction of the lunar disc seen from Earth (0.0-1.0)
    pub fn moon_illumination(&self, time: &EventTime) -> Result<f64> {
        let mut attr: [f64; 20] = [0.0; 20];
        let mut serr = error_buffer();

        let ret = {
            let _swe = self.session();
            unsafe {
                libswisseph_sys::swe_pheno_ut(
                    time.julian_day(),
                    Body::Moon.swe_id(),
                    self.flags(),
                    attr.as_mut_ptr(),
                    serr.as_mut_ptr(),
                )
            }
        };

        if ret < 0 {
            return Err(swe_error(&serr, "failed to compute lunar phenomena"));
        }

        // attr[1] is the illuminated fraction
        Ok(attr[1].clamp(0.0, 1.0))
    }

    /// Phase angle and illumination percentage at a given instant
    pub fn moon_phase(&self, time: &EventTime) -> Result<MoonPhase> {
        let phase = self.sun_moon_angle(time)?;
        let percent = 100.0 * self.moon_illumination(time)?;

        Ok(MoonPhase { phase, percent })
    }
}

/// Wrap an angle into [0, 360)
pub fn normalize_degrees(angle: f64) -> f64 {
    let normalized = angle.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs
    if normalized >= 360.0 {
        0.0
    } else {
        normalized
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ephemeris::parse_iso_datetime;

    const SYNODIC_MONTH_MINUTES: i64 = 42_524; // 29.5306 days

    fn at(iso: &str) -> EventTime {
        parse_iso_datetime(iso).unwrap()
    }

    fn angular_distance(a: f64, b: f64) -> f64 {
        let d = (a - b).rem_euclid(360.0);
        d.min(360.0 - d)
    }

    #[test]
    fn test_normalize_degrees() {
        assert_eq!(normalize_degrees(370.0), 10.0);
        assert_eq!(normalize_degrees(-90.0), 270.0);
        assert_eq!(normalize_degrees(-1e-20), 0.0);
        assert!(normalize_degrees(-1e-20) < 360.0);
    }

    #[test]
    fn test_sun_position() {
        let ephemeris = Ephemeris::builtin();
        // Sun is near the March equinox point on 2024-03-20
        let sun = ephemeris
            .body_position(Body::Sun, &at("2024-03-20T03:06"))
            .unwrap();
        assert!(angular_distance(sun.longitude, 0.0) < 0.1);
        assert!(sun.speed_longitude > 0.9 && sun.speed_longitude < 1.1);
    }

    #[test]
    fn test_moon_phase_ranges() {
        let ephemeris = Ephemeris::builtin();
        let instants = [
            "1900-01-01",
            "1969-07-20T20:17",
            "2000-01-01T12:00",
            "2022-05-16T04:11",
            "2024-01-11T11:57",
            "2031-09-30T23:59",
            "2099-12-31",
        ];

        for iso in instants {
            let phase = ephemeris.moon_phase(&at(iso)).unwrap();
            assert!(
                (0.0..360.0).contains(&phase.phase),
                "{}: phase {}",
                iso,
                phase.phase
            );
            assert!(
                (0.0..=100.0).contains(&phase.percent),
                "{}: percent {}",
                iso,
                phase.percent
            );
        }
    }

    #[test]
    fn test_full_moon() {
        let ephemeris = Ephemeris::builtin();
        // Total lunar eclipse, Moon opposite the Sun
        let phase = ephemeris.moon_phase(&at("2022-05-16T04:11")).unwrap();
        assert!(angular_distance(phase.phase, 180.0) < 2.0);
        assert!(phase.percent > 99.0);
    }

    #[test]
    fn test_new_moon() {
        let ephemeris = Ephemeris::builtin();
        let phase = ephemeris.moon_phase(&at("2024-01-11T11:57")).unwrap();
        assert!(angular_distance(phase.phase, 0.0) < 2.0);
        assert!(phase.percent < 1.0);
    }

    #[test]
    fn test_phase_repeats_after_synodic_month() {
        let ephemeris = Ephemeris::builtin();
        let first = at("2024-03-01T00:00");
        let second = EventTime::from_datetime(
            first.datetime() + chrono::Duration::minutes(SYNODIC_MONTH_MINUTES),
        );

        let a = ephemeris.moon_phase(&first).unwrap();
        let b = ephemeris.moon_phase(&second).unwrap();
        assert!(
            angular_distance(a.phase, b.phase) < 8.0,
            "{} vs {}",
            a.phase,
            b.phase
        );
    }

    #[test]
    fn test_handles_share_engine() {
        let builtin = Ephemeris::builtin();
        let dir = tempfile::tempdir().unwrap();
        // No data files: the engine falls back to its analytical model
        let files = Ephemeris::from_dir(dir.path()).unwrap();

        let t = at("2010-06-26T11:38");
        let a = builtin.sun_moon_angle(&t).unwrap();
        let b = files.sun_moon_angle(&t).unwrap();
        let c = builtin.sun_moon_angle(&t).unwrap();
        assert!(angular_distance(a, b) < 0.01);
        assert_eq!(a, c);
    }
}
