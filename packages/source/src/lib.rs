#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Tree census data sources.
//!
//! A [`CensusSource`] produces the raw aggregate rows once at startup.
//! [`SocrataSource`] downloads them from the NYC open-data portal;
//! [`SnapshotSource`] reads a previously saved JSON file so the dashboard
//! can start offline.

pub mod retry;
pub mod socrata;

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tree_census_models::RawRecord;

use crate::socrata::{SocrataConfig, fetch_socrata};

/// Errors that can occur while loading census rows.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error (snapshot read/write).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The server answered with something other than census rows.
    #[error("Bad response: {message}")]
    BadResponse {
        /// Description of what went wrong.
        message: String,
    },
}

/// Options for fetching census rows.
#[derive(Debug, Clone, Default)]
pub struct FetchOptions {
    /// Maximum number of rows to fetch.
    pub limit: Option<u64>,
    /// Rows per request. Defaults to [`socrata::DEFAULT_PAGE_SIZE`].
    pub page_size: Option<u64>,
    /// Socrata application token, sent as `X-App-Token`.
    pub app_token: Option<String>,
}

/// Something that can produce the raw census rows.
#[async_trait]
pub trait CensusSource: Send + Sync {
    /// Human-readable description for log messages.
    fn name(&self) -> String;

    /// Loads every raw row.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the rows cannot be loaded.
    async fn fetch(&self, options: &FetchOptions) -> Result<Vec<RawRecord>, SourceError>;
}

/// Downloads the census aggregate from a Socrata resource.
pub struct SocrataSource {
    api_url: String,
    client: reqwest::Client,
}

impl SocrataSource {
    /// Creates a source for the given resource URL.
    #[must_use]
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            client: reqwest::Client::new(),
        }
    }
}

impl Default for SocrataSource {
    fn default() -> Self {
        Self::new(socrata::TREE_CENSUS_API_URL)
    }
}

#[async_trait]
impl CensusSource for SocrataSource {
    fn name(&self) -> String {
        format!("Socrata ({})", self.api_url)
    }

    async fn fetch(&self, options: &FetchOptions) -> Result<Vec<RawRecord>, SourceError> {
        let config = SocrataConfig::tree_census(&self.api_url);
        fetch_socrata(&self.client, &config, options).await
    }
}

/// Reads census rows from a snapshot file written by [`write_snapshot`].
pub struct SnapshotSource {
    path: PathBuf,
}

impl SnapshotSource {
    /// Creates a source for the snapshot at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl CensusSource for SnapshotSource {
    fn name(&self) -> String {
        format!("snapshot ({})", self.path.display())
    }

    async fn fetch(&self, options: &FetchOptions) -> Result<Vec<RawRecord>, SourceError> {
        let mut records = load_snapshot(&self.path)?;
        if let Some(limit) = options.limit {
            records.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        }
        Ok(records)
    }
}

/// Reads a snapshot: a JSON array of census rows in the Socrata shape.
///
/// # Errors
///
/// Returns [`SourceError`] if the file cannot be read or parsed.
pub fn load_snapshot(path: &Path) -> Result<Vec<RawRecord>, SourceError> {
    let json = std::fs::read_to_string(path)?;
    let records: Vec<RawRecord> = serde_json::from_str(&json)?;
    log::info!("Loaded {} rows from {}", records.len(), path.display());
    Ok(records)
}

/// Writes census rows to a snapshot file, creating parent directories.
///
/// # Errors
///
/// Returns [`SourceError`] if the file cannot be written.
pub fn write_snapshot(path: &Path, records: &[RawRecord]) -> Result<(), SourceError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string(records)?;
    std::fs::write(path, json)?;
    log::info!("Wrote {} rows to {}", records.len(), path.display());
    Ok(())
}
