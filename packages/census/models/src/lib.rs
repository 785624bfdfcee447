#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Tree census record types and the fixed code enumerations.
//!
//! The census publishes one aggregate row per (species, borough, health,
//! steward) combination. [`RawRecord`] is that row as it arrives from the
//! open-data API; [`EncodedRecord`] is the same row after every label has
//! been replaced by its small integer code.
//!
//! Health, steward and borough are fixed enumerations that do not depend on
//! the data. Species codes are data-dependent and are assigned by the
//! dictionary encoder in `tree_census`.

use serde::{Deserialize, Deserializer, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Error returned when a numeric code does not name a variant of one of the
/// fixed enumerations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidCodeError {
    /// Which enumeration was being decoded (e.g. `"health"`).
    pub kind: &'static str,
    /// The code that was provided.
    pub code: u8,
}

impl std::fmt::Display for InvalidCodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid {} code {}", self.kind, self.code)
    }
}

impl std::error::Error for InvalidCodeError {}

/// Tree health rating as recorded by census volunteers.
///
/// Ordinal: `Poor < Fair < Good`. The discriminant is the code.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum Health {
    /// Code 0
    Poor = 0,
    /// Code 1
    Fair = 1,
    /// Code 2
    Good = 2,
}

impl Health {
    /// Returns the numeric code of this rating.
    #[must_use]
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Creates a rating from its numeric code.
    ///
    /// # Errors
    ///
    /// Returns an error if the code is not in the range 0-2.
    pub const fn from_code(code: u8) -> Result<Self, InvalidCodeError> {
        match code {
            0 => Ok(Self::Poor),
            1 => Ok(Self::Fair),
            2 => Ok(Self::Good),
            _ => Err(InvalidCodeError {
                kind: "health",
                code,
            }),
        }
    }

    /// Returns all variants in code order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Poor, Self::Fair, Self::Good]
    }
}

/// Number of stewardship signs observed around the tree.
///
/// The census publishes `1or2`, `3or4` and `4orMore`; those spellings parse
/// to the same variants as the display labels. `4orMore` is read as "more
/// than 4" since `3or4` already covers four.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum Steward {
    /// Code 0
    #[strum(to_string = "None")]
    #[serde(rename = "None")]
    NoSigns = 0,
    /// Code 1
    #[strum(to_string = "1 or 2", serialize = "1or2")]
    #[serde(rename = "1 or 2")]
    OneOrTwo = 1,
    /// Code 2
    #[strum(to_string = "3 or 4", serialize = "3or4")]
    #[serde(rename = "3 or 4")]
    ThreeOrFour = 2,
    /// Code 3
    #[strum(to_string = "More than 4", serialize = "4orMore")]
    #[serde(rename = "More than 4")]
    MoreThanFour = 3,
}

impl Steward {
    /// Returns the numeric code of this steward level.
    #[must_use]
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Creates a steward level from its numeric code.
    ///
    /// # Errors
    ///
    /// Returns an error if the code is not in the range 0-3.
    pub const fn from_code(code: u8) -> Result<Self, InvalidCodeError> {
        match code {
            0 => Ok(Self::NoSigns),
            1 => Ok(Self::OneOrTwo),
            2 => Ok(Self::ThreeOrFour),
            3 => Ok(Self::MoreThanFour),
            _ => Err(InvalidCodeError {
                kind: "steward",
                code,
            }),
        }
    }

    /// Returns all variants in code order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::NoSigns,
            Self::OneOrTwo,
            Self::ThreeOrFour,
            Self::MoreThanFour,
        ]
    }
}

/// NYC borough. Not ordinal; the code only fixes display order.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum Borough {
    /// Code 0
    Bronx = 0,
    /// Code 1
    Brooklyn = 1,
    /// Code 2
    Manhattan = 2,
    /// Code 3
    Queens = 3,
    /// Code 4
    #[strum(to_string = "Staten Island")]
    #[serde(rename = "Staten Island")]
    StatenIsland = 4,
}

impl Borough {
    /// Returns the numeric code of this borough.
    #[must_use]
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Creates a borough from its numeric code.
    ///
    /// # Errors
    ///
    /// Returns an error if the code is not in the range 0-4.
    pub const fn from_code(code: u8) -> Result<Self, InvalidCodeError> {
        match code {
            0 => Ok(Self::Bronx),
            1 => Ok(Self::Brooklyn),
            2 => Ok(Self::Manhattan),
            3 => Ok(Self::Queens),
            4 => Ok(Self::StatenIsland),
            _ => Err(InvalidCodeError {
                kind: "borough",
                code,
            }),
        }
    }

    /// Returns all variants in code order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Bronx,
            Self::Brooklyn,
            Self::Manhattan,
            Self::Queens,
            Self::StatenIsland,
        ]
    }
}

/// Data-dependent species code. Index into the species code table.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct SpeciesCode(pub u32);

impl SpeciesCode {
    /// Returns the code as a table index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for SpeciesCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One aggregate row of the census as published by the open-data API.
///
/// Socrata omits null fields entirely, so every label is optional. The
/// aggregate column (`count_tree_id`) is returned as a JSON string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRecord {
    /// Common species name (e.g. `"London planetree"`).
    #[serde(default, rename = "spc_common", alias = "species")]
    pub species: Option<String>,
    /// Borough name (e.g. `"Queens"`).
    #[serde(default, rename = "boroname", alias = "borough")]
    pub borough: Option<String>,
    /// Health label (`Poor`, `Fair`, `Good`).
    #[serde(default)]
    pub health: Option<String>,
    /// Steward label (`None`, `1or2`, `3or4`, `4orMore`).
    #[serde(default)]
    pub steward: Option<String>,
    /// Number of trees matching this combination.
    #[serde(
        rename = "count_tree_id",
        alias = "count",
        deserialize_with = "deserialize_count"
    )]
    pub count: u64,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CountValue {
    Number(u64),
    Text(String),
}

fn deserialize_count<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    match CountValue::deserialize(deserializer)? {
        CountValue::Number(n) => Ok(n),
        CountValue::Text(s) => s
            .trim()
            .parse()
            .map_err(|e| serde::de::Error::custom(format!("invalid count '{s}': {e}"))),
    }
}

/// A census row with every label replaced by its code.
///
/// Only constructed by the dictionary encoder, so every code is a valid key
/// into its code table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncodedRecord {
    /// Species code.
    pub species: SpeciesCode,
    /// Borough.
    pub borough: Borough,
    /// Health rating.
    pub health: Health,
    /// Steward level.
    pub steward: Steward,
    /// Number of trees.
    pub count: u64,
}

#[cfg(test)]
mod tests {
    use std::str::FromStr as _;

    use super::*;

    #[test]
    fn code_roundtrip() {
        for h in Health::all() {
            assert_eq!(Health::from_code(h.code()).unwrap(), *h);
        }
        for s in Steward::all() {
            assert_eq!(Steward::from_code(s.code()).unwrap(), *s);
        }
        for b in Borough::all() {
            assert_eq!(Borough::from_code(b.code()).unwrap(), *b);
        }
        assert!(Health::from_code(3).is_err());
        assert!(Steward::from_code(4).is_err());
        assert!(Borough::from_code(5).is_err());
    }

    #[test]
    fn steward_parses_census_and_display_spellings() {
        assert_eq!(Steward::from_str("1or2").unwrap(), Steward::OneOrTwo);
        assert_eq!(Steward::from_str("1 or 2").unwrap(), Steward::OneOrTwo);
        assert_eq!(Steward::from_str("4orMore").unwrap(), Steward::MoreThanFour);
        assert_eq!(Steward::from_str("None").unwrap(), Steward::NoSigns);
        assert_eq!(Steward::MoreThanFour.to_string(), "More than 4");
        assert_eq!(Steward::NoSigns.to_string(), "None");
    }

    #[test]
    fn borough_labels() {
        assert_eq!(Borough::StatenIsland.to_string(), "Staten Island");
        assert_eq!(
            Borough::from_str("Staten Island").unwrap(),
            Borough::StatenIsland
        );
        assert!(Borough::from_str("Jersey City").is_err());
    }

    #[test]
    fn ordinal_health() {
        assert!(Health::Poor < Health::Fair);
        assert!(Health::Fair < Health::Good);
    }

    #[test]
    fn raw_record_from_socrata_json() {
        let json = r#"{
            "spc_common": "pin oak",
            "boroname": "Queens",
            "health": "Good",
            "steward": "1or2",
            "count_tree_id": "1523"
        }"#;
        let record: RawRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.species.as_deref(), Some("pin oak"));
        assert_eq!(record.borough.as_deref(), Some("Queens"));
        assert_eq!(record.count, 1523);
    }

    #[test]
    fn raw_record_missing_fields_are_none() {
        let json = r#"{"boroname": "Bronx", "steward": "None", "count": 7}"#;
        let record: RawRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.species, None);
        assert_eq!(record.health, None);
        assert_eq!(record.count, 7);
    }

    #[test]
    fn raw_record_rejects_bad_count() {
        let json = r#"{"spc_common": "ginkgo", "count_tree_id": "lots"}"#;
        assert!(serde_json::from_str::<RawRecord>(json).is_err());
    }
}
