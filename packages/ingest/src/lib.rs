#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Tree census ingestion: download the aggregate to a snapshot file and
//! summarize what the dashboard would load from it.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use tree_census::encoder::EncodeReport;
use tree_census::store::{AggregatedRow, RecordFilter};
use tree_census::{CensusContext, ContextError};
use tree_census_models::{Borough, Health, RawRecord};
use tree_census_source::{CensusSource, FetchOptions, SourceError, write_snapshot};

/// Where `fetch` writes and `summary` reads by default.
pub const DEFAULT_SNAPSHOT_PATH: &str = "data/tree_census.json";

/// Errors that can occur during ingestion.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// Fetching or writing rows failed.
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    /// The rows could not be encoded.
    #[error("Census error: {0}")]
    Census(#[from] ContextError),
}

/// Fetches every row from `source` and writes them to `output`.
///
/// Returns the number of rows written.
///
/// # Errors
///
/// Returns [`IngestError::Source`] if the fetch or the write fails.
pub async fn fetch_to_snapshot(
    source: &dyn CensusSource,
    options: &FetchOptions,
    output: &Path,
) -> Result<usize, IngestError> {
    log::info!("Fetching tree census from {}...", source.name());
    let records = source.fetch(options).await?;
    write_snapshot(output, &records)?;
    Ok(records.len())
}

/// What a set of raw rows encodes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CensusSummary {
    /// Raw rows read.
    pub raw_rows: usize,
    /// Encoder row counts.
    pub report: EncodeReport,
    /// Distinct species.
    pub species: usize,
    /// Trees across every kept row.
    pub total_trees: u64,
    /// Trees per borough.
    pub by_borough: BTreeMap<Borough, u64>,
    /// Trees per health rating.
    pub by_health: BTreeMap<Health, u64>,
    /// Most numerous species, largest first.
    pub top_species: Vec<(String, u64)>,
}

/// Encodes `records` and tallies the result.
///
/// # Errors
///
/// Returns [`IngestError::Census`] if no row can be encoded.
pub fn summarize(records: &[RawRecord], top_n: usize) -> Result<CensusSummary, IngestError> {
    let census = CensusContext::from_raw(records)?;
    let dataset = census.dataset();
    let all = RecordFilter::all();

    let mut top_species: Vec<(String, u64)> = dataset
        .aggregate(&all, |r| r.species)
        .into_iter()
        .map(|row| (census.tables().species_label(row.key).to_string(), row.count))
        .collect();
    top_species.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    top_species.truncate(top_n);

    Ok(CensusSummary {
        raw_rows: records.len(),
        report: *census.report(),
        species: census.tables().species_count(),
        total_trees: dataset.total_trees(),
        by_borough: tally(dataset.aggregate(&all, |r| r.borough)),
        by_health: tally(dataset.aggregate(&all, |r| r.health)),
        top_species,
    })
}

fn tally<K: Ord>(rows: Vec<AggregatedRow<K>>) -> BTreeMap<K, u64> {
    rows.into_iter().map(|row| (row.key, row.count)).collect()
}

impl fmt::Display for CensusSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:<24} {}", "Raw rows", self.raw_rows)?;
        writeln!(f, "{:<24} {}", "Kept rows", self.report.kept)?;
        writeln!(f, "{:<24} {}", "Missing species", self.report.missing_species)?;
        writeln!(f, "{:<24} {}", "Missing health", self.report.missing_health)?;
        writeln!(f, "{:<24} {}", "Unmapped", self.report.unmapped)?;
        writeln!(f, "{:<24} {}", "Species", self.species)?;
        writeln!(f, "{:<24} {}", "Trees", self.total_trees)?;

        writeln!(f)?;
        writeln!(f, "{:<24} TREES", "BOROUGH")?;
        writeln!(f, "{}", "-".repeat(40))?;
        for (borough, count) in &self.by_borough {
            writeln!(f, "{:<24} {count}", borough.to_string())?;
        }

        writeln!(f)?;
        writeln!(f, "{:<24} TREES", "HEALTH")?;
        writeln!(f, "{}", "-".repeat(40))?;
        for (health, count) in self.by_health.iter().rev() {
            writeln!(f, "{:<24} {count}", health.to_string())?;
        }

        writeln!(f)?;
        writeln!(f, "{:<24} TREES", "SPECIES")?;
        writeln!(f, "{}", "-".repeat(40))?;
        for (species, count) in &self.top_species {
            writeln!(f, "{species:<24} {count}")?;
        }
        Ok(())
    }
}
