#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Chart view pipelines for the tree census dashboard.
//!
//! Each view turns the shared [`tree_census::CensusContext`] plus a set of
//! control values into a [`ChartTable`]: one row per (category, health
//! rating) bar segment and a forced category-axis order. The
//! [`chart`] module turns a table into a renderable figure.
//!
//! Both views are instances of the same health-breakdown pipeline in
//! [`breakdown`]; they differ only in the category (species or steward
//! level), the filters and the sort/normalization choices they expose.

pub mod breakdown;
pub mod chart;
pub mod species;
pub mod steward;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use tree_census_models::Health;

/// Category field of the species view.
pub const SPECIES_FIELD: &str = "Species";
/// Category field of the steward view.
pub const STEWARD_FIELD: &str = "Number of Stewards";
/// Color field shared by both views.
pub const HEALTH_FIELD: &str = "Health Rating";
/// Hover field holding the category total.
pub const FULL_COUNT_FIELD: &str = "Full Count";
/// Value field when bars are normalized.
pub const PROPORTION_LABEL: &str = "Proportion of Trees";
/// Value field when bars show raw counts.
pub const COUNT_LABEL: &str = "Count of Trees";

/// Category-axis ordering policy for the species view.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum SortPolicy {
    /// Species code table order.
    Alpha,
    /// Ascending total count within the selected borough.
    #[default]
    Count,
    /// Ascending count-weighted average health (worst first).
    Health,
}

impl SortPolicy {
    /// Returns all variants.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Alpha, Self::Count, Self::Health]
    }

    /// Human-readable control label.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Alpha => "Alpha",
            Self::Count => "Total Count of Species in Borough",
            Self::Health => "Average Health of Species Population",
        }
    }
}

/// Whether bar segments show proportions within the category or raw counts.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum Normalization {
    /// Each category's segments sum to 1.0.
    #[default]
    Proportion,
    /// Segments are summed tree counts.
    #[strum(to_string = "Full Counts", serialize = "FullCounts")]
    #[serde(rename = "Full Counts", alias = "FullCounts")]
    FullCounts,
}

impl Normalization {
    /// Returns all variants.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Proportion, Self::FullCounts]
    }

    /// Name of the value field for this mode.
    #[must_use]
    pub const fn value_label(self) -> &'static str {
        match self {
            Self::Proportion => PROPORTION_LABEL,
            Self::FullCounts => COUNT_LABEL,
        }
    }
}

/// Error returned for a minimum-count threshold outside the slider's range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error(
    "minimum count {value} must be a multiple of {} between {} and {}",
    MinCount::STEP,
    MinCount::MIN,
    MinCount::MAX
)]
pub struct ThresholdError {
    /// The rejected value.
    pub value: u32,
}

/// Minimum number of trees a species needs to appear in the species view.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "u32", into = "u32")]
pub struct MinCount(u32);

impl MinCount {
    /// Slider minimum.
    pub const MIN: u32 = 0;
    /// Slider maximum.
    pub const MAX: u32 = 100;
    /// Slider step.
    pub const STEP: u32 = 25;

    /// Validates a threshold.
    ///
    /// # Errors
    ///
    /// Returns [`ThresholdError`] unless the value is a multiple of
    /// [`Self::STEP`] within [`Self::MIN`]..=[`Self::MAX`].
    pub const fn new(value: u32) -> Result<Self, ThresholdError> {
        if value > Self::MAX || value % Self::STEP != 0 {
            return Err(ThresholdError { value });
        }
        Ok(Self(value))
    }

    /// The threshold as a tree count.
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0 as u64
    }
}

impl TryFrom<u32> for MinCount {
    type Error = ThresholdError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<MinCount> for u32 {
    fn from(value: MinCount) -> Self {
        value.0
    }
}

/// Value of one bar segment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum BarValue {
    /// Summed tree count.
    Count(u64),
    /// Share of the category total, in `0.0..=1.0`.
    Proportion(f64),
}

impl BarValue {
    /// The value as a float, for plotting.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(self) -> f64 {
        match self {
            Self::Count(n) => n as f64,
            Self::Proportion(p) => p,
        }
    }
}

/// One bar segment, fully labeled.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartRow {
    /// Category label (species name or steward level).
    pub category: String,
    /// Segment value.
    pub value: BarValue,
    /// Health rating of the segment.
    pub health: Health,
    /// Total trees in the category across all health ratings.
    pub full_count: u64,
}

/// Chart-ready output of a view pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartTable {
    /// Name of the category field (y axis).
    pub category_field: &'static str,
    /// Name of the value field (x axis).
    pub value_field: &'static str,
    /// Bar segments, Good first, then Fair, then Poor.
    pub rows: Vec<ChartRow>,
    /// Forced category-axis order. May name categories with no rows.
    pub category_order: Vec<String>,
}

impl ChartTable {
    /// Returns the rows as records keyed by the view's field names.
    #[must_use]
    pub fn records(&self) -> Vec<serde_json::Map<String, serde_json::Value>> {
        self.rows
            .iter()
            .map(|row| {
                let mut record = serde_json::Map::new();
                record.insert(
                    self.category_field.to_string(),
                    serde_json::Value::String(row.category.clone()),
                );
                record.insert(
                    self.value_field.to_string(),
                    serde_json::to_value(row.value).unwrap_or(serde_json::Value::Null),
                );
                record.insert(
                    HEALTH_FIELD.to_string(),
                    serde_json::Value::String(row.health.to_string()),
                );
                record.insert(FULL_COUNT_FIELD.to_string(), row.full_count.into());
                record
            })
            .collect()
    }

    /// Returns `true` if no category has any data.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
