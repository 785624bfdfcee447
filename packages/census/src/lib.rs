#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Dictionary encoder and in-memory aggregate store for the tree census.
//!
//! [`CensusContext`] is built once at startup from the raw rows and then
//! shared read-only by every chart view.

pub mod encoder;
pub mod store;

use encoder::{CodeTables, EncodeReport};
use store::EncodedDataset;
use tree_census_models::RawRecord;

/// Errors that can occur while building the census context.
#[derive(Debug, thiserror::Error)]
pub enum ContextError {
    /// No row survived encoding.
    #[error("No usable census rows ({total} raw rows, all dropped)")]
    Empty {
        /// Number of raw rows that were provided.
        total: usize,
    },
}

/// Code tables plus the encoded dataset.
#[derive(Debug, Clone)]
pub struct CensusContext {
    tables: CodeTables,
    dataset: EncodedDataset,
    report: EncodeReport,
}

impl CensusContext {
    /// Builds the code tables and encodes every raw row.
    ///
    /// # Errors
    ///
    /// Returns [`ContextError::Empty`] if no row could be encoded.
    pub fn from_raw(records: &[RawRecord]) -> Result<Self, ContextError> {
        let tables = CodeTables::build(records);
        let (encoded, report) = tables.encode_all(records);

        if encoded.is_empty() {
            return Err(ContextError::Empty {
                total: records.len(),
            });
        }

        log::info!(
            "Encoded {} census rows across {} species ({} dropped: {} missing species, \
             {} missing health, {} unmapped)",
            report.kept,
            tables.species_count(),
            report.dropped(),
            report.missing_species,
            report.missing_health,
            report.unmapped,
        );

        Ok(Self {
            tables,
            dataset: EncodedDataset::new(encoded),
            report,
        })
    }

    /// The code tables.
    #[must_use]
    pub const fn tables(&self) -> &CodeTables {
        &self.tables
    }

    /// The encoded dataset.
    #[must_use]
    pub const fn dataset(&self) -> &EncodedDataset {
        &self.dataset
    }

    /// Row counts from encoding.
    #[must_use]
    pub const fn report(&self) -> &EncodeReport {
        &self.report
    }
}
