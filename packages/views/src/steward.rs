//! Steward-by-species view: health by number of stewardship signs.

use serde::{Deserialize, Serialize};
use tree_census::CensusContext;
use tree_census::store::RecordFilter;
use tree_census_models::Steward;

use crate::breakdown::{attach_full_counts, full_counts, to_chart_rows};
use crate::{ChartTable, Normalization, STEWARD_FIELD};

/// Control values for the steward view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StewardViewParams {
    /// Borough code, `None` = whole city.
    pub borough: Option<u8>,
    /// Species code, `None` = all species.
    pub species: Option<u32>,
}

/// Builds the steward chart table. Always proportion-normalized; the
/// category axis is always the four steward levels in code order.
#[must_use]
pub fn steward_by_species(ctx: &CensusContext, params: &StewardViewParams) -> ChartTable {
    log::debug!(
        "steward_by_species: borough={:?} species={:?}",
        params.borough,
        params.species,
    );

    let filter = RecordFilter {
        borough: params.borough,
        species: params.species,
    };
    let grouped = ctx
        .dataset()
        .aggregate(&filter, |r| (r.steward, r.health));
    let rows = attach_full_counts(&grouped, &full_counts(&grouped));

    let normalization = Normalization::Proportion;
    ChartTable {
        category_field: STEWARD_FIELD,
        value_field: normalization.value_label(),
        rows: to_chart_rows(&rows, normalization, |steward: Steward| {
            steward.to_string()
        }),
        category_order: Steward::all().iter().map(ToString::to_string).collect(),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use tree_census_models::{Borough, Health, RawRecord};

    use super::*;

    const STEWARD_ORDER: [&str; 4] = ["None", "1 or 2", "3 or 4", "More than 4"];

    fn raw(species: &str, borough: &str, health: &str, steward: &str, count: u64) -> RawRecord {
        RawRecord {
            species: Some(species.to_string()),
            borough: Some(borough.to_string()),
            health: Some(health.to_string()),
            steward: Some(steward.to_string()),
            count,
        }
    }

    fn context() -> CensusContext {
        CensusContext::from_raw(&[
            raw("ginkgo", "Bronx", "Good", "None", 30),
            raw("ginkgo", "Bronx", "Poor", "None", 10),
            raw("ginkgo", "Queens", "Fair", "1or2", 4),
            raw("pin oak", "Queens", "Good", "1or2", 12),
            raw("pin oak", "Bronx", "Good", "3or4", 2),
            raw("pin oak", "Bronx", "Fair", "4orMore", 1),
            raw("pin oak", "Bronx", "Poor", "4orMore", 3),
        ])
        .unwrap()
    }

    #[test]
    fn whole_city_has_four_proportional_levels() {
        let ctx = context();
        let table = steward_by_species(&ctx, &StewardViewParams::default());

        assert_eq!(table.category_field, "Number of Stewards");
        assert_eq!(table.value_field, "Proportion of Trees");
        assert_eq!(table.category_order, STEWARD_ORDER);

        let levels: BTreeSet<&str> = table.rows.iter().map(|r| r.category.as_str()).collect();
        assert_eq!(levels.len(), 4);

        for level in STEWARD_ORDER {
            let sum: f64 = table
                .rows
                .iter()
                .filter(|r| r.category == level)
                .map(|r| r.value.as_f64())
                .sum();
            assert!((sum - 1.0).abs() < 1e-9, "{level} sums to {sum}");
        }

        let none_poor = table
            .rows
            .iter()
            .find(|r| r.category == "None" && r.health == Health::Poor)
            .unwrap();
        assert_eq!(none_poor.full_count, 40);
        assert!((none_poor.value.as_f64() - 0.25).abs() < 1e-12);
    }

    #[test]
    fn filters_by_borough_and_species() {
        let ctx = context();
        let pin_oak = ctx.tables().species_code("pin oak").unwrap();
        let table = steward_by_species(
            &ctx,
            &StewardViewParams {
                borough: Some(Borough::Bronx.code()),
                species: Some(pin_oak.0),
            },
        );

        let levels: BTreeSet<&str> = table.rows.iter().map(|r| r.category.as_str()).collect();
        assert_eq!(levels, BTreeSet::from(["3 or 4", "More than 4"]));
        assert_eq!(table.category_order, STEWARD_ORDER);
        assert_eq!(table.rows[0].health, Health::Good);
        assert_eq!(table.rows.last().unwrap().health, Health::Poor);
    }

    #[test]
    fn species_without_trees_gives_empty_chart() {
        let ctx = context();
        let table = steward_by_species(
            &ctx,
            &StewardViewParams {
                borough: None,
                species: Some(999),
            },
        );
        assert!(table.is_empty());
        assert_eq!(table.category_order, STEWARD_ORDER);
    }

    #[test]
    fn recomputation_is_identical() {
        let ctx = context();
        let params = StewardViewParams {
            borough: Some(Borough::Queens.code()),
            species: None,
        };
        assert_eq!(
            steward_by_species(&ctx, &params),
            steward_by_species(&ctx, &params)
        );
    }
}
