//! Dictionary encoder.
//!
//! Builds the species code table from the raw census rows and maps every
//! row's labels to codes. Health, steward and borough use the fixed
//! enumerations from [`tree_census_models`].

use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;

use tree_census_models::{Borough, EncodedRecord, Health, RawRecord, SpeciesCode, Steward};

/// Why a raw row could not be encoded.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EncodeError {
    /// The field was null or absent.
    #[error("missing {field}")]
    Missing {
        /// Field name.
        field: &'static str,
    },

    /// The label is not one of the known values for the field.
    #[error("unknown {field} '{value}'")]
    Unknown {
        /// Field name.
        field: &'static str,
        /// The offending label.
        value: String,
    },
}

/// Row counts from a bulk encode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EncodeReport {
    /// Rows that were encoded and kept.
    pub kept: usize,
    /// Rows dropped because the species was missing.
    pub missing_species: usize,
    /// Rows dropped because the health rating was missing.
    pub missing_health: usize,
    /// Rows dropped for any other reason (missing borough or steward, or
    /// a label outside the fixed enumerations).
    pub unmapped: usize,
}

impl EncodeReport {
    /// Total number of dropped rows.
    #[must_use]
    pub const fn dropped(&self) -> usize {
        self.missing_species + self.missing_health + self.unmapped
    }

    fn record(&mut self, error: &EncodeError) {
        match error {
            EncodeError::Missing { field: "species" } => self.missing_species += 1,
            EncodeError::Missing { field: "health" } => self.missing_health += 1,
            _ => self.unmapped += 1,
        }
    }
}

/// Sort key for species names: surrounding quote characters are stripped
/// and the result is lowercased.
#[must_use]
pub fn species_sort_key(name: &str) -> String {
    name.trim_matches(|c| c == '\'' || c == '"').to_lowercase()
}

/// The four code tables.
///
/// Only the species table is stored; the other three are the fixed
/// enumerations and are exposed through the same interface for symmetry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodeTables {
    species: Vec<String>,
    species_codes: BTreeMap<String, SpeciesCode>,
}

impl CodeTables {
    /// Builds the code tables from the raw census rows.
    ///
    /// Rows without a health rating do not contribute species. Distinct
    /// species names are ordered by [`species_sort_key`]; two raw
    /// names with the same key are ordered by the raw string so the result
    /// never depends on row order.
    #[must_use]
    pub fn build(records: &[RawRecord]) -> Self {
        let distinct: BTreeSet<&str> = records
            .iter()
            .filter(|r| r.health.is_some())
            .filter_map(|r| r.species.as_deref())
            .collect();

        let mut species: Vec<String> = distinct.into_iter().map(String::from).collect();
        species.sort_by_cached_key(|name| species_sort_key(name));

        let species_codes = species
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let code = u32::try_from(i).unwrap_or(u32::MAX);
                (name.clone(), SpeciesCode(code))
            })
            .collect();

        log::debug!("Built species code table with {} entries", species.len());

        Self {
            species,
            species_codes,
        }
    }

    /// Species labels in code order. This is the alphabetical order used by
    /// the `Alpha` sort policy.
    #[must_use]
    pub fn species_labels(&self) -> &[String] {
        &self.species
    }

    /// Number of distinct species.
    #[must_use]
    pub fn species_count(&self) -> usize {
        self.species.len()
    }

    /// Every species code in code order.
    pub fn species_codes(&self) -> impl Iterator<Item = SpeciesCode> + '_ {
        (0..u32::try_from(self.species.len()).unwrap_or(u32::MAX)).map(SpeciesCode)
    }

    /// Decodes a species code.
    ///
    /// # Panics
    ///
    /// Panics if `code` was not produced by this table.
    #[must_use]
    pub fn species_label(&self, code: SpeciesCode) -> &str {
        &self.species[code.index()]
    }

    /// Looks up the code for a species label.
    #[must_use]
    pub fn species_code(&self, label: &str) -> Option<SpeciesCode> {
        self.species_codes.get(label).copied()
    }

    /// Encodes one raw row.
    ///
    /// # Errors
    ///
    /// Returns [`EncodeError`] if any field is missing or its label is not
    /// known. Species and health are checked first.
    pub fn encode(&self, record: &RawRecord) -> Result<EncodedRecord, EncodeError> {
        let species_label = required("species", record.species.as_deref())?;
        let health_label = required("health", record.health.as_deref())?;

        let species = self
            .species_code(species_label)
            .ok_or_else(|| EncodeError::Unknown {
                field: "species",
                value: species_label.to_string(),
            })?;
        let health: Health = parse_label("health", health_label)?;
        let steward: Steward =
            parse_label("steward", required("steward", record.steward.as_deref())?)?;
        let borough: Borough =
            parse_label("borough", required("borough", record.borough.as_deref())?)?;

        Ok(EncodedRecord {
            species,
            borough,
            health,
            steward,
            count: record.count,
        })
    }

    /// Encodes every row, dropping the ones that fail.
    #[must_use]
    pub fn encode_all(&self, records: &[RawRecord]) -> (Vec<EncodedRecord>, EncodeReport) {
        let mut report = EncodeReport::default();
        let mut encoded = Vec::with_capacity(records.len());

        for record in records {
            match self.encode(record) {
                Ok(row) => {
                    encoded.push(row);
                    report.kept += 1;
                }
                Err(e) => {
                    log::trace!("Dropping census row: {e}");
                    report.record(&e);
                }
            }
        }

        (encoded, report)
    }
}

fn required<'a>(field: &'static str, value: Option<&'a str>) -> Result<&'a str, EncodeError> {
    value.ok_or(EncodeError::Missing { field })
}

fn parse_label<T: FromStr>(field: &'static str, value: &str) -> Result<T, EncodeError> {
    value.parse().map_err(|_| EncodeError::Unknown {
        field,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(species: Option<&str>, health: Option<&str>) -> RawRecord {
        RawRecord {
            species: species.map(String::from),
            borough: Some("Brooklyn".to_string()),
            health: health.map(String::from),
            steward: Some("None".to_string()),
            count: 3,
        }
    }

    #[test]
    fn species_order_ignores_quotes_and_case() {
        let records = vec![
            raw(Some("pin oak"), Some("Good")),
            raw(Some("'Schubert' chokecherry"), Some("Good")),
            raw(Some("American linden"), Some("Fair")),
            raw(Some("ginkgo"), Some("Poor")),
            raw(Some("pin oak"), Some("Fair")),
        ];
        let tables = CodeTables::build(&records);
        assert_eq!(
            tables.species_labels(),
            ["American linden", "ginkgo", "pin oak", "'Schubert' chokecherry"]
        );
        assert_eq!(tables.species_code("ginkgo"), Some(SpeciesCode(1)));
        assert_eq!(tables.species_label(SpeciesCode(3)), "'Schubert' chokecherry");
    }

    #[test]
    fn species_order_is_independent_of_row_order() {
        let a = vec![
            raw(Some("Ginkgo"), Some("Good")),
            raw(Some("ginkgo"), Some("Good")),
            raw(Some("ash"), Some("Good")),
        ];
        let mut b = a.clone();
        b.reverse();
        assert_eq!(CodeTables::build(&a), CodeTables::build(&b));
        assert_eq!(CodeTables::build(&a).species_labels(), ["ash", "Ginkgo", "ginkgo"]);
    }

    #[test]
    fn encodes_known_labels() {
        let records = vec![RawRecord {
            species: Some("honeylocust".to_string()),
            borough: Some("Staten Island".to_string()),
            health: Some("Fair".to_string()),
            steward: Some("3or4".to_string()),
            count: 12,
        }];
        let tables = CodeTables::build(&records);
        let row = tables.encode(&records[0]).unwrap();
        assert_eq!(row.species, SpeciesCode(0));
        assert_eq!(row.borough, Borough::StatenIsland);
        assert_eq!(row.health, Health::Fair);
        assert_eq!(row.steward, Steward::ThreeOrFour);
        assert_eq!(row.count, 12);
    }

    #[test]
    fn drops_unencodable_rows() {
        let mut bad_steward = raw(Some("ginkgo"), Some("Good"));
        bad_steward.steward = Some("dozens".to_string());
        let records = vec![
            raw(Some("ginkgo"), Some("Good")),
            raw(None, Some("Good")),
            raw(Some("ginkgo"), None),
            raw(Some("ginkgo"), Some("Dead")),
            bad_steward,
        ];
        let tables = CodeTables::build(&records);
        let (encoded, report) = tables.encode_all(&records);

        assert_eq!(encoded.len(), 1);
        assert_eq!(report.kept, 1);
        assert_eq!(report.missing_species, 1);
        assert_eq!(report.missing_health, 1);
        assert_eq!(report.unmapped, 2);
        assert_eq!(report.dropped(), 4);
    }

    #[test]
    fn species_missing_from_table_is_unknown() {
        let tables = CodeTables::build(&[raw(Some("ginkgo"), Some("Good"))]);
        let err = tables
            .encode(&raw(Some("sweetgum"), Some("Good")))
            .unwrap_err();
        assert_eq!(
            err,
            EncodeError::Unknown {
                field: "species",
                value: "sweetgum".to_string()
            }
        );
    }
}
