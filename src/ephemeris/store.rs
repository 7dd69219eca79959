//! On-disk Swiss Ephemeris data files
//!
//! The data files live in a fixed writable directory (by default the
//! platform data dir). They are optional: without them the engine uses its
//! analytical model.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;

use crate::config::Config;
use crate::error::{Error, Result};

use super::Ephemeris;

/// Planet and Moon files covering 1800-2400 AD
pub const DATA_FILES: &[&str] = &["sepl_18.se1", "semo_18.se1"];

pub const DEFAULT_DOWNLOAD_URL: &str =
    "https://raw.githubusercontent.com/aloistr/swisseph/master/ephe";

/// Directory of ephemeris data files and where to fetch them from
#[derive(Debug, Clone)]
pub struct EphemerisStore {
    dir: PathBuf,
    base_url: String,
}

impl EphemerisStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            base_url: DEFAULT_DOWNLOAD_URL.to_string(),
        }
    }

    /// Configured directory, or the platform default
    pub fn resolve(config: &Config) -> Self {
        match &config.ephemeris_dir {
            Some(dir) => Self::new(dir),
            None => Self::new(Self::default_dir()),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Platform data directory, e.g. `~/.local/share/star-gazing/ephe`
    pub fn default_dir() -> PathBuf {
        if let Some(proj_dirs) = ProjectDirs::from("com", "star-gazing", "star-gazing") {
            proj_dirs.data_dir().join("ephe")
        } else {
            // Fallback to current directory
            PathBuf::from("ephe")
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Data files not yet present in the directory
    pub fn missing_files(&self) -> Vec<&'static str> {
        DATA_FILES
            .iter()
            .copied()
            .filter(|name| !self.dir.join(name).is_file())
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.missing_files().is_empty()
    }

    /// Open the directory as an ephemeris source
    pub fn open(&self) -> Result<Ephemeris> {
        Ephemeris::from_dir(&self.dir)
    }

    /// Download every missing data file, returning the paths written
    pub async fn fetch_missing(&self, client: &reqwest::Client) -> Result<Vec<PathBuf>> {
        let missing = self.missing_files();
        if missing.is_empty() {
            return Ok(Vec::new());
        }

        tokio::fs::create_dir_all(&self.dir).await?;

        let mut written = Vec::with_capacity(missing.len());
        for name in missing {
            let url = format!("{}/{}", self.base_url.trim_end_matches('/'), name);
            tracing::info!(%url, "Downloading ephemeris file");

            let response = client.get(&url).send().await?;
            if !response.status().is_success() {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                return Err(Error::Upstream {
                    status: status.as_u16(),
                    body,
                });
            }

            let bytes = response.bytes().await?;
            let target = self.dir.join(name);
            let partial = target.with_extension("se1.part");

            // Write then rename so an interrupted download never looks complete
            tokio::fs::write(&partial, &bytes).await?;
            tokio::fs::rename(&partial, &target).await?;

            tracing::info!(path = %target.display(), bytes = bytes.len(), "Saved ephemeris file");
            written.push(target);
        }

        Ok(written)
    }
}

/// Choose the ephemeris for this process
///
/// Downloads missing files first when enabled. Any problem with the data
/// files is logged and the built-in model is used instead.
pub async fn prepare_ephemeris(config: &Config, client: &reqwest::Client) -> Ephemeris {
    let store = EphemerisStore::resolve(config);

    if config.fetch_ephemeris && !store.is_complete() {
        if let Err(e) = store.fetch_missing(client).await {
            tracing::warn!(error = %e, "Failed to download ephemeris files");
        }
    }

    if store.is_complete() {
        match store.open() {
            Ok(ephemeris) => return ephemeris,
            Err(e) => tracing::warn!(error = %e, "Cannot use ephemeris directory"),
        }
    } else {
        tracing::info!(
            dir = %store.dir().display(),
            missing = ?store.missing_files(),
            "Ephemeris files not found, using built-in model"
        );
    }

    Ephemeris::builtin()
}
