//! In-memory aggregate store over the encoded census.
//!
//! Every query is a filtered group-by with `count` summed. Results come back
//! in ascending key order so downstream sorting is deterministic.

use std::collections::BTreeMap;

use tree_census_models::EncodedRecord;

/// Equality filter on the borough and species codes.
///
/// Codes are compared as raw integers, so a code that names no borough or
/// species simply matches nothing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecordFilter {
    /// Borough code, `None` = all boroughs.
    pub borough: Option<u8>,
    /// Species code, `None` = all species.
    pub species: Option<u32>,
}

impl RecordFilter {
    /// A filter that keeps every row.
    #[must_use]
    pub const fn all() -> Self {
        Self {
            borough: None,
            species: None,
        }
    }

    /// Returns `true` if the record passes the filter.
    #[must_use]
    pub fn matches(&self, record: &EncodedRecord) -> bool {
        self.borough.is_none_or(|b| record.borough.code() == b)
            && self.species.is_none_or(|s| record.species.0 == s)
    }
}

/// A group-by result row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregatedRow<K> {
    /// Group key.
    pub key: K,
    /// Summed tree count.
    pub count: u64,
}

/// The encoded census, immutable after construction.
#[derive(Debug, Clone, Default)]
pub struct EncodedDataset {
    records: Vec<EncodedRecord>,
}

impl EncodedDataset {
    /// Wraps the encoded rows.
    #[must_use]
    pub const fn new(records: Vec<EncodedRecord>) -> Self {
        Self { records }
    }

    /// All encoded rows.
    #[must_use]
    pub fn records(&self) -> &[EncodedRecord] {
        &self.records
    }

    /// Number of encoded rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if there are no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Total number of trees across every row.
    #[must_use]
    pub fn total_trees(&self) -> u64 {
        self.records.iter().map(|r| r.count).sum()
    }

    /// Filters the rows, groups them by `key_fn` and sums `count`.
    ///
    /// Groups whose summed count is zero are left out, so every returned row
    /// has `count > 0`.
    pub fn aggregate<K, F>(&self, filter: &RecordFilter, key_fn: F) -> Vec<AggregatedRow<K>>
    where
        K: Ord,
        F: Fn(&EncodedRecord) -> K,
    {
        let mut groups: BTreeMap<K, u64> = BTreeMap::new();

        for record in self.records.iter().filter(|r| filter.matches(r)) {
            *groups.entry(key_fn(record)).or_default() += record.count;
        }

        groups
            .into_iter()
            .filter(|(_, count)| *count > 0)
            .map(|(key, count)| AggregatedRow { key, count })
            .collect()
    }
}

/// Sums the counts of already-aggregated rows per coarser group.
pub fn total_by_group<K, G, F>(rows: &[AggregatedRow<K>], group_fn: F) -> BTreeMap<G, u64>
where
    G: Ord,
    F: Fn(&K) -> G,
{
    let mut totals: BTreeMap<G, u64> = BTreeMap::new();
    for row in rows {
        *totals.entry(group_fn(&row.key)).or_default() += row.count;
    }
    totals
}
