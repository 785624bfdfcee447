//! Health-breakdown pipeline shared by every chart view.
//!
//! Input is the dataset grouped by `(category, health)`. The pipeline
//! attaches each category's full count, optionally drops small categories,
//! normalizes, and finally labels and orders the bar segments.

use std::collections::BTreeMap;

use tree_census::store::{AggregatedRow, total_by_group};
use tree_census_models::Health;

use crate::{BarValue, ChartRow, Normalization};

/// One `(category, health)` group with its category's full count attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreakdownRow<C> {
    /// Category code.
    pub category: C,
    /// Health rating.
    pub health: Health,
    /// Trees in this `(category, health)` group.
    pub count: u64,
    /// Trees in the category across all health ratings.
    pub full_count: u64,
}

/// Per-category totals across all health ratings.
#[must_use]
pub fn full_counts<C: Ord + Copy>(rows: &[AggregatedRow<(C, Health)>]) -> BTreeMap<C, u64> {
    total_by_group(rows, |(category, _)| *category)
}

/// Attaches each row's category total.
///
/// `totals` must come from [`full_counts`] over the same rows.
#[must_use]
pub fn attach_full_counts<C: Ord + Copy>(
    rows: &[AggregatedRow<(C, Health)>],
    totals: &BTreeMap<C, u64>,
) -> Vec<BreakdownRow<C>> {
    rows.iter()
        .map(|row| {
            let (category, health) = row.key;
            BreakdownRow {
                category,
                health,
                count: row.count,
                full_count: totals.get(&category).copied().unwrap_or(row.count),
            }
        })
        .collect()
}

/// Drops every row whose category has fewer than `min` trees in total.
#[must_use]
pub fn apply_threshold<C>(mut rows: Vec<BreakdownRow<C>>, min: u64) -> Vec<BreakdownRow<C>> {
    rows.retain(|row| row.full_count >= min);
    rows
}

/// Count-weighted average health code per category.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn weighted_health<C: Ord + Copy>(rows: &[BreakdownRow<C>]) -> BTreeMap<C, f64> {
    let mut sums: BTreeMap<C, (u64, u64)> = BTreeMap::new();
    for row in rows {
        let entry = sums.entry(row.category).or_default();
        entry.0 += u64::from(row.health.code()) * row.count;
        entry.1 += row.count;
    }

    sums.into_iter()
        .filter(|(_, (_, weight))| *weight > 0)
        .map(|(category, (weighted, weight))| (category, weighted as f64 / weight as f64))
        .collect()
}

/// Normalizes, labels and orders the bar segments.
///
/// Rows are stably sorted by health descending, so segments stack Good,
/// Fair, Poor while keeping category order within each rating.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn to_chart_rows<C, F>(
    rows: &[BreakdownRow<C>],
    normalization: Normalization,
    label: F,
) -> Vec<ChartRow>
where
    C: Copy,
    F: Fn(C) -> String,
{
    let mut out: Vec<ChartRow> = rows
        .iter()
        .map(|row| {
            let value = match normalization {
                Normalization::Proportion => {
                    debug_assert!(row.full_count > 0, "aggregated rows always have trees");
                    BarValue::Proportion(row.count as f64 / row.full_count as f64)
                }
                Normalization::FullCounts => BarValue::Count(row.count),
            };
            ChartRow {
                category: label(row.category),
                value,
                health: row.health,
                full_count: row.full_count,
            }
        })
        .collect();

    out.sort_by(|a, b| b.health.cmp(&a.health));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grouped() -> Vec<AggregatedRow<(u8, Health)>> {
        vec![
            AggregatedRow {
                key: (0, Health::Poor),
                count: 1,
            },
            AggregatedRow {
                key: (0, Health::Good),
                count: 3,
            },
            AggregatedRow {
                key: (1, Health::Fair),
                count: 10,
            },
            AggregatedRow {
                key: (1, Health::Good),
                count: 30,
            },
        ]
    }

    fn rows() -> Vec<BreakdownRow<u8>> {
        let grouped = grouped();
        attach_full_counts(&grouped, &full_counts(&grouped))
    }

    #[test]
    fn full_counts_sum_health() {
        let totals = full_counts(&grouped());
        assert_eq!(totals.get(&0), Some(&4));
        assert_eq!(totals.get(&1), Some(&40));
        assert!(rows().iter().all(|r| r.full_count >= r.count));
    }

    #[test]
    fn threshold_drops_whole_categories() {
        let kept = apply_threshold(rows(), 5);
        assert_eq!(kept.len(), 2);
        assert!(kept.iter().all(|r| r.category == 1));
        assert_eq!(apply_threshold(rows(), 0).len(), 4);
        assert_eq!(apply_threshold(rows(), 4).len(), 4);
    }

    #[test]
    fn weighted_health_average() {
        let avg = weighted_health(&rows());
        assert!((avg[&0] - 1.5).abs() < 1e-12);
        assert!((avg[&1] - 1.75).abs() < 1e-12);
    }

    #[test]
    fn proportions_sum_to_one() {
        let out = to_chart_rows(&rows(), Normalization::Proportion, |c| c.to_string());
        for category in ["0", "1"] {
            let sum: f64 = out
                .iter()
                .filter(|r| r.category == category)
                .map(|r| r.value.as_f64())
                .sum();
            assert!((sum - 1.0).abs() < 1e-9, "{category} sums to {sum}");
        }
    }

    #[test]
    fn full_counts_keep_raw_values() {
        let out = to_chart_rows(&rows(), Normalization::FullCounts, |c| c.to_string());
        let values: Vec<BarValue> = out.iter().map(|r| r.value).collect();
        assert_eq!(
            values,
            vec![
                BarValue::Count(3),
                BarValue::Count(30),
                BarValue::Count(10),
                BarValue::Count(1),
            ]
        );
    }

    #[test]
    fn segments_ordered_good_to_poor() {
        let out = to_chart_rows(&rows(), Normalization::Proportion, |c| c.to_string());
        let order: Vec<(Health, &str)> = out
            .iter()
            .map(|r| (r.health, r.category.as_str()))
            .collect();
        assert_eq!(
            order,
            vec![
                (Health::Good, "0"),
                (Health::Good, "1"),
                (Health::Fair, "1"),
                (Health::Poor, "0"),
            ]
        );
    }
}
