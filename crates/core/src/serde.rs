//! Serde helper functions for the member export.
//!
//! The export encodes decimals and dates in a locale-specific way; these
//! helpers normalize them while deserializing so every row is treated alike.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};

use crate::member::{normalize_date, normalize_height, validate_height};

/// Deserialize a height that may use a decimal comma.
///
/// Accepts either a string (`"1,70"`, `"1.70"`) or a plain number. Either way
/// the height must be finite and non-negative.
pub fn deserialize_height<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => validate_height(n).map_err(serde::de::Error::custom),
        Raw::Text(s) => normalize_height(&s).map_err(serde::de::Error::custom),
    }
}

/// Deserialize a member date.
///
/// Expects format: MM/DD/YYYY, with YYYY-MM-DD accepted as a fallback.
pub fn deserialize_member_date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    normalize_date(&s).map_err(serde::de::Error::custom)
}
