//! Lunar eclipse search

use crate::error::{Error, Result};
use crate::models::LunarEclipseKind;

use super::{error_buffer, swe_error, Ephemeris, EventTime};

/// Search all eclipse types
const ANY_ECLIPSE_TYPE: i32 = 0;

/// Days to skip past a found maximum before searching again
const SEARCH_STEP_DAYS: f64 = 1.0;

/// Contact times of an eclipse, as Julian Days (UT)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EclipseContacts {
    pub penumbral_begin: Option<f64>,
    pub partial_begin: Option<f64>,
    pub total_begin: Option<f64>,
    pub total_end: Option<f64>,
    pub partial_end: Option<f64>,
    pub penumbral_end: Option<f64>,
}

impl EclipseContacts {
    fn from_tret(tret: &[f64; 10]) -> Self {
        // The engine reports 0 for phases the eclipse doesn't have
        let contact = |jd: f64| (jd > 0.0).then_some(jd);

        Self {
            partial_begin: contact(tret[2]),
            partial_end: contact(tret[3]),
            total_begin: contact(tret[4]),
            total_end: contact(tret[5]),
            penumbral_begin: contact(tret[6]),
            penumbral_end: contact(tret[7]),
        }
    }

    /// Contacts in chronological order, with their names
    pub fn named(&self) -> [(&'static str, Option<f64>); 6] {
        [
            ("penumbral_begin", self.penumbral_begin),
            ("partial_begin", self.partial_begin),
            ("total_begin", self.total_begin),
            ("total_end", self.total_end),
            ("partial_end", self.partial_end),
            ("penumbral_end", self.penumbral_end),
        ]
    }
}

/// One lunar eclipse as reported by the engine
#[derive(Debug, Clone, PartialEq)]
pub struct LunarEclipse {
    /// Instant of greatest eclipse, Julian Day (UT)
    pub maximum: f64,
    pub kind: LunarEclipseKind,
    pub contacts: EclipseContacts,
    pub umbral_magnitude: f64,
    pub penumbral_magnitude: f64,
    /// Distance of the Moon from the anti-solar point, degrees
    pub distance_from_opposition: f64,
    pub saros_series: f64,
    pub saros_member: f64,
}

impl Ephemeris {
    /// Find every lunar eclipse whose maximum lies in `[start, end]`
    ///
    /// A reversed window yields no eclipses.
    pub fn lunar_eclipses(&self, start: &EventTime, end: &EventTime) -> Result<Vec<LunarEclipse>> {
        let mut eclipses = Vec::new();
        let end_jd = end.julian_day();
        let mut search_from = start.julian_day();

        let _swe = self.session();

        while search_from <= end_jd {
            let mut tret: [f64; 10] = [0.0; 10];
            let mut serr = error_buffer();

            let flags = unsafe {
                libswisseph_sys::swe_lun_eclipse_when(
                    search_from,
                    self.flags(),
                    ANY_ECLIPSE_TYPE,
                    tret.as_mut_ptr(),
                    0,
                    serr.as_mut_ptr(),
                )
            };

            if flags < 0 {
                return Err(swe_error(&serr, "lunar eclipse search failed"));
            }

            let maximum = tret[0];
            if maximum > end_jd {
                break;
            }
            if maximum < search_from {
                return Err(Error::Ephemeris(format!(
                    "lunar eclipse search went backwards from JD {}",
                    search_from
                )));
            }

            let kind = LunarEclipseKind::from_swe_flags(flags).ok_or_else(|| {
                Error::Ephemeris(format!("unknown lunar eclipse type flags {}", flags))
            })?;

            let mut attr: [f64; 20] = [0.0; 20];
            let mut geopos: [f64; 3] = [0.0; 3];
            let mut serr = error_buffer();

            let ret = unsafe {
                libswisseph_sys::swe_lun_eclipse_how(
                    maximum,
                    self.flags(),
                    geopos.as_mut_ptr(),
                    attr.as_mut_ptr(),
                    serr.as_mut_ptr(),
                )
            };

            if ret < 0 {
                return Err(swe_error(&serr, "lunar eclipse attributes failed"));
            }

            tracing::debug!(maximum, kind = kind.label(), "Found lunar eclipse");

            eclipses.push(LunarEclipse {
                maximum,
                kind,
                contacts: EclipseContacts::from_tret(&tret),
                umbral_magnitude: attr[0],
                penumbral_magnitude: attr[1],
                distance_from_opposition: attr[7],
                saros_series: attr[9],
                saros_member: attr[10],
            });

            search_from = maximum + SEARCH_STEP_DAYS;
        }

        Ok(eclipses)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ephemeris::{julian_day_to_datetime, parse_iso_datetime};

    fn window(start: &str, end: &str) -> Vec<LunarEclipse> {
        Ephemeris::builtin()
            .lunar_eclipses(
                &parse_iso_datetime(start).unwrap(),
                &parse_iso_datetime(end).unwrap(),
            )
            .unwrap()
    }

    #[test]
    fn test_no_eclipse_in_quiet_window() {
        assert!(window("2022-06-01", "2022-06-02").is_empty());
    }

    #[test]
    fn test_reversed_window_is_empty() {
        assert!(window("2022-05-17", "2022-05-15").is_empty());
    }

    #[test]
    fn test_total_eclipse_2022_05_16() {
        let eclipses = window("2022-05-15", "2022-05-17");
        assert_eq!(eclipses.len(), 1);

        let eclipse = &eclipses[0];
        assert_eq!(eclipse.kind, LunarEclipseKind::Total);
        assert!(eclipse.umbral_magnitude > 1.0);
        assert!(eclipse.contacts.total_begin.is_some());
        assert!(eclipse.contacts.penumbral_begin.unwrap() < eclipse.maximum);
        assert!(eclipse.contacts.penumbral_end.unwrap() > eclipse.maximum);

        let max = julian_day_to_datetime(eclipse.maximum).unwrap();
        assert_eq!(max.format("%Y-%m-%d %H").to_string(), "2022-05-16 04");
    }

    #[test]
    fn test_partial_eclipse_has_no_totality() {
        // 2021-11-19 partial eclipse, umbral magnitude ~0.97
        let eclipses = window("2021-11-18", "2021-11-20");
        assert_eq!(eclipses.len(), 1);
        assert_eq!(eclipses[0].kind, LunarEclipseKind::Partial);
        assert!(eclipses[0].contacts.total_begin.is_none());
        assert!(eclipses[0].contacts.partial_begin.is_some());
    }

    #[test]
    fn test_year_of_eclipses() {
        // 2024: penumbral in March, partial in September
        let eclipses = window("2024-01-01", "2024-12-31");
        let kinds: Vec<_> = eclipses.iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![LunarEclipseKind::Penumbral, LunarEclipseKind::Partial]
        );
        assert!(eclipses[0].maximum < eclipses[1].maximum);
    }
}
