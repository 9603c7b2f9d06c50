//! Schema-tolerant decoders for the JSON files of a Facebook export.
//!
//! Every decoder reads one file. A file that cannot be read or is not valid
//! JSON for its family yields `Err`, which callers turn into zero records.
//! Individual records that do not decode are skipped and counted without
//! failing the rest of the file; unknown fields are ignored and optional
//! fields default to absent.

use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};

use crate::error::CoreError;

pub mod comments;
pub mod likes;
pub mod messages;
pub mod posts;
pub mod profile;

pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, CoreError> {
    let data = fs::read(path)?;
    Ok(serde_json::from_slice(&data)?)
}

/// Deserializes an optional array, keeping only the elements that decode as `T`.
pub(crate) fn lenient_vec<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let values: Option<Vec<serde_json::Value>> = Option::deserialize(deserializer)?;
    Ok(values
        .unwrap_or_default()
        .into_iter()
        .filter_map(|value| serde_json::from_value(value).ok())
        .collect())
}

/// Decodes a top-level JSON array record by record.
pub(crate) fn read_lenient_array<T: DeserializeOwned>(path: &Path) -> Result<Records<T>, CoreError> {
    let values: Vec<serde_json::Value> = read_json(path)?;
    Ok(Records::from_values(values))
}

/// The records of one file, plus how many array elements failed to decode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Records<T> {
    pub items: Vec<T>,
    pub skipped: usize,
}

impl<T> Default for Records<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            skipped: 0,
        }
    }
}

impl<T: DeserializeOwned> Records<T> {
    fn from_values(values: Vec<serde_json::Value>) -> Self {
        let total = values.len();
        let items: Vec<T> = values
            .into_iter()
            .filter_map(|value| serde_json::from_value(value).ok())
            .collect();
        Self {
            skipped: total - items.len(),
            items,
        }
    }
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for Records<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let values: Option<Vec<serde_json::Value>> = Option::deserialize(deserializer)?;
        Ok(Self::from_values(values.unwrap_or_default()))
    }
}

/// Deserializes a string field, treating non-string JSON values as absent.
pub(crate) fn loose_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<serde_json::Value> = Option::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        _ => None,
    })
}

pub(crate) fn first_non_empty<'a, I>(candidates: I) -> Option<&'a str>
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    candidates.into_iter().flatten().find(|s| !s.is_empty())
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawExternalContext {
    #[serde(default, deserialize_with = "loose_string")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawMedia {
    #[serde(default, deserialize_with = "loose_string")]
    pub uri: Option<String>,
    #[serde(default)]
    pub creation_timestamp: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Wrapper {
        #[serde(default, deserialize_with = "lenient_vec")]
        items: Vec<Item>,
    }

    #[derive(Debug, Deserialize)]
    struct Item {
        n: i64,
    }

    #[test]
    fn lenient_vec_skips_bad_elements() {
        let parsed: Wrapper =
            serde_json::from_str(r#"{"items":[{"n":1},{"n":"two"},{"x":3},{"n":4}]}"#).expect("parse");
        let values: Vec<i64> = parsed.items.iter().map(|i| i.n).collect();
        assert_eq!(values, vec![1, 4]);
    }

    #[test]
    fn lenient_vec_accepts_missing_and_null() {
        let missing: Wrapper = serde_json::from_str("{}").expect("missing");
        assert!(missing.items.is_empty());
        let null: Wrapper = serde_json::from_str(r#"{"items":null}"#).expect("null");
        assert!(null.items.is_empty());
    }

    #[test]
    fn records_count_elements_that_do_not_decode() {
        #[derive(Debug, Deserialize)]
        struct File {
            #[serde(default)]
            items: Records<Item>,
        }
        let parsed: File =
            serde_json::from_str(r#"{"items":[{"n":1},{"n":"two"},{"x":3},{"n":4}]}"#).expect("parse");
        assert_eq!(parsed.items.items.len(), 2);
        assert_eq!(parsed.items.skipped, 2);
        let missing: File = serde_json::from_str("{}").expect("missing");
        assert!(missing.items.items.is_empty());
        assert_eq!(missing.items.skipped, 0);
    }

    #[test]
    fn first_non_empty_skips_blanks() {
        assert_eq!(first_non_empty([None, Some(""), Some("hi"), Some("later")]), Some("hi"));
        assert_eq!(first_non_empty([None, Some("")]), None);
    }
}
