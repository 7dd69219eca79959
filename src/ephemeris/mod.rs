//! Swiss Ephemeris wrapper for lunar calculations
//!
//! The C library keeps its configuration (data path, caches) in process-global
//! state and is not reentrant. Every call goes through [`Ephemeris::session`],
//! which serializes access and re-points the library at the handle's data
//! source when another handle was used last.

mod calculator;
mod eclipses;
pub mod store;
pub mod time;

use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::error::{Error, Result};

pub use calculator::{Body, BodyPosition};
pub use eclipses::{EclipseContacts, LunarEclipse};
pub use store::{prepare_ephemeris, EphemerisStore};
pub use time::{julian_day_to_datetime, parse_iso_datetime, EventTime};

// Swiss Ephemeris flags
const SEFLG_SWIEPH: i32 = 2; // Use Swiss Ephemeris data files
const SEFLG_MOSEPH: i32 = 4; // Use the built-in Moshier model
const SEFLG_SPEED: i32 = 256; // Include speed in calculations

/// Size of the error buffer every `swe_*` call may write into
const SERR_LEN: usize = 256;

static ACTIVE_SOURCE: Mutex<Option<EphemerisSource>> = Mutex::new(None);

/// Where the engine reads planetary data from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EphemerisSource {
    /// Analytical Moshier model compiled into the library (no files needed)
    Builtin,
    /// Swiss Ephemeris `.se1` files in a directory
    Files { dir: PathBuf, c_dir: CString },
}

impl EphemerisSource {
    fn flags(&self) -> i32 {
        match self {
            EphemerisSource::Builtin => SEFLG_MOSEPH,
            EphemerisSource::Files { .. } => SEFLG_SWIEPH,
        }
    }

    fn activate(&self) {
        match self {
            EphemerisSource::Builtin => unsafe {
                libswisseph_sys::swe_set_ephe_path(std::ptr::null_mut());
            },
            EphemerisSource::Files { c_dir, .. } => unsafe {
                // The library copies the path into its own buffer
                libswisseph_sys::swe_set_ephe_path(c_dir.as_ptr() as *mut c_char);
            },
        }
    }
}

/// Read-only handle to an ephemeris dataset, shared by every tool call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ephemeris {
    source: EphemerisSource,
}

impl Ephemeris {
    /// Use the built-in Moshier model
    ///
    /// Precision is about 0.1 arc seconds for the Sun and 3 arc seconds for the Moon.
    pub fn builtin() -> Self {
        Self {
            source: EphemerisSource::Builtin,
        }
    }

    /// Use Swiss Ephemeris data files from `dir`
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("Ephemeris directory not found: {}", dir.display()),
            )));
        }

        let c_dir = CString::new(dir.to_string_lossy().into_owned()).map_err(|_| {
            Error::Ephemeris(format!("Invalid ephemeris path: {}", dir.display()))
        })?;

        Ok(Self {
            source: EphemerisSource::Files {
                dir: dir.to_path_buf(),
                c_dir,
            },
        })
    }

    pub fn source(&self) -> &EphemerisSource {
        &self.source
    }

    /// Human-readable description of the data source, for logs
    pub fn describe(&self) -> String {
        match &self.source {
            EphemerisSource::Builtin => "built-in Moshier model".to_string(),
            EphemerisSource::Files { dir, .. } => format!("data files in {}", dir.display()),
        }
    }

    fn flags(&self) -> i32 {
        self.source.flags()
    }

    /// Lock the engine and make sure it reads from this handle's source
    fn session(&self) -> MutexGuard<'static, Option<EphemerisSource>> {
        let mut active = ACTIVE_SOURCE
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if active.as_ref() != Some(&self.source) {
            self.source.activate();
            *active = Some(self.source.clone());
        }

        active
    }
}

impl Default for Ephemeris {
    fn default() -> Self {
        Self::builtin()
    }
}

fn error_buffer() -> [c_char; SERR_LEN] {
    [0; SERR_LEN]
}

/// Turn the error buffer of a failed call into an [`Error::Ephemeris`]
fn swe_error(serr: &[c_char; SERR_LEN], fallback: &str) -> Error {
    let message = unsafe { CStr::from_ptr(serr.as_ptr()) }
        .to_string_lossy()
        .trim()
        .to_string();

    if message.is_empty() {
        Error::Ephemeris(fallback.to_string())
    } else {
        Error::Ephemeris(message)
    }
}
