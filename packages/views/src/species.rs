//! Species-by-borough view: health of every species, optionally within one
//! borough.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tree_census::CensusContext;
use tree_census::store::RecordFilter;
use tree_census_models::SpeciesCode;

use crate::breakdown::{
    BreakdownRow, apply_threshold, attach_full_counts, full_counts, to_chart_rows,
    weighted_health,
};
use crate::{ChartTable, MinCount, Normalization, SPECIES_FIELD, SortPolicy};

/// Control values for the species view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeciesViewParams {
    /// Borough code, `None` = whole city.
    pub borough: Option<u8>,
    /// Category-axis ordering.
    pub sort: SortPolicy,
    /// Proportions or raw counts.
    pub normalization: Normalization,
    /// Species with fewer trees than this are left out.
    pub min_count: MinCount,
}

/// Builds the species-by-borough chart table.
#[must_use]
pub fn species_by_borough(ctx: &CensusContext, params: &SpeciesViewParams) -> ChartTable {
    log::debug!(
        "species_by_borough: borough={:?} sort={} normalization={} min_count={}",
        params.borough,
        params.sort,
        params.normalization,
        params.min_count.value(),
    );

    let filter = RecordFilter {
        borough: params.borough,
        species: None,
    };
    let grouped = ctx
        .dataset()
        .aggregate(&filter, |r| (r.species, r.health));

    let totals = full_counts(&grouped);
    let rows = apply_threshold(
        attach_full_counts(&grouped, &totals),
        params.min_count.value(),
    );

    let tables = ctx.tables();
    let category_order = category_order(ctx, params.sort, &rows, &totals)
        .into_iter()
        .map(|code| tables.species_label(code).to_string())
        .collect();

    ChartTable {
        category_field: SPECIES_FIELD,
        value_field: params.normalization.value_label(),
        rows: to_chart_rows(&rows, params.normalization, |code| {
            tables.species_label(code).to_string()
        }),
        category_order,
    }
}

/// Orders every species code for the category axis.
///
/// * `Alpha`: code order.
/// * `Count`: ascending full count within the filter (0 when absent), ties
///   by code.
/// * `Health`: species with rows after thresholding by ascending weighted
///   health, ties by code, then the remaining species in code order.
fn category_order(
    ctx: &CensusContext,
    sort: SortPolicy,
    rows: &[BreakdownRow<SpeciesCode>],
    totals: &BTreeMap<SpeciesCode, u64>,
) -> Vec<SpeciesCode> {
    let all: Vec<SpeciesCode> = ctx.tables().species_codes().collect();

    match sort {
        SortPolicy::Alpha => all,
        SortPolicy::Count => {
            let mut codes = all;
            codes.sort_by_key(|code| totals.get(code).copied().unwrap_or(0));
            codes
        }
        SortPolicy::Health => {
            let averages = weighted_health(rows);
            let mut ranked: Vec<(SpeciesCode, f64)> = averages.into_iter().collect();
            ranked.sort_by(|a, b| a.1.total_cmp(&b.1));

            let mut codes: Vec<SpeciesCode> = ranked.iter().map(|(code, _)| *code).collect();
            codes.extend(
                all.into_iter()
                    .filter(|code| !ranked.iter().any(|(ranked, _)| ranked == code)),
            );
            codes
        }
    }
}
