#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the tree census server.
//!
//! These types are serialized to JSON for the REST API. They are separate
//! from the pipeline types in `tree_census_views` so the API contract can
//! evolve independently.

use serde::{Deserialize, Serialize};
use tree_census_views::{ChartTable, Normalization, SortPolicy};

/// Query parameters for the species chart endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeciesChartQueryParams {
    /// Borough code (0-4). Absent = whole city.
    pub borough: Option<u8>,
    /// Category-axis ordering. Defaults to `Count`.
    pub sort: Option<SortPolicy>,
    /// `Proportion` or `Full Counts`. Defaults to `Proportion`.
    pub mode: Option<Normalization>,
    /// Minimum trees per species (0-100, step 25). Defaults to 0.
    pub min_count: Option<u32>,
}

/// Query parameters for the steward chart endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StewardChartQueryParams {
    /// Borough code (0-4). Absent = whole city.
    pub borough: Option<u8>,
    /// Species code. Absent = all species.
    pub species: Option<u32>,
}

/// A chart as returned by the API: the chart-ready table plus the rendered
/// figure.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiChart {
    /// Name of the category field.
    pub category_field: String,
    /// Name of the value field.
    pub value_field: String,
    /// Forced category-axis order.
    pub category_order: Vec<String>,
    /// Bar segments keyed by field name.
    pub rows: Vec<serde_json::Map<String, serde_json::Value>>,
    /// Plotly figure.
    pub figure: serde_json::Value,
}

impl ApiChart {
    /// Bundles a table with its rendered figure.
    #[must_use]
    pub fn new(table: &ChartTable, figure: serde_json::Value) -> Self {
        Self {
            category_field: table.category_field.to_string(),
            value_field: table.value_field.to_string(),
            category_order: table.category_order.clone(),
            rows: table.records(),
            figure,
        }
    }
}

/// One choice of a selector control.
#[derive(Debug, Clone, Serialize)]
pub struct ApiOption<T> {
    /// Display label.
    pub label: String,
    /// Value to send back as the query parameter.
    pub value: T,
}

/// Bounds of the minimum-count slider.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ApiSlider {
    /// Lowest value.
    pub min: u32,
    /// Highest value.
    pub max: u32,
    /// Step between values.
    pub step: u32,
    /// Initial value.
    pub default: u32,
}

/// Control options for both dashboard views.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiOptions {
    /// Borough selector (nullable).
    pub boroughs: Vec<ApiOption<u8>>,
    /// Species selector (nullable), in alphabetical order.
    pub species: Vec<ApiOption<u32>>,
    /// Sort policy selector.
    pub sort_policies: Vec<ApiOption<SortPolicy>>,
    /// Normalization selector.
    pub normalizations: Vec<ApiOption<Normalization>>,
    /// Minimum-count slider.
    pub min_count: ApiSlider,
}

/// Health check response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHealth {
    /// Whether the service is healthy.
    pub healthy: bool,
    /// Service version.
    pub version: String,
    /// Encoded census rows held in memory.
    pub rows: usize,
    /// Distinct species.
    pub species: usize,
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ApiError {
    /// What went wrong.
    pub error: String,
}
