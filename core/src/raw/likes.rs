//! Likes and reactions come in two incompatible layouts:
//! numbered `likes_and_reactions_<n>.json` files with a structured
//! `data[].reaction` object, and a single `likes_and_reactions.json` made of
//! generic `label_values` pairs.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::{lenient_vec, loose_string, read_lenient_array, Records};
use crate::error::CoreError;

const NUMBERED_PREFIX: &str = "likes_and_reactions_";
pub const LABEL_FILE: &str = "likes_and_reactions.json";

#[derive(Debug, Clone, Deserialize)]
pub struct RawLikeItem {
    pub timestamp: i64,
    #[serde(default, deserialize_with = "loose_string")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient_vec")]
    pub data: Vec<RawLikeData>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawLikeData {
    #[serde(default)]
    pub reaction: Option<RawReactionData>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawReactionData {
    pub reaction: String,
    pub actor: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawLikeLabelItem {
    pub timestamp: i64,
    #[serde(default, deserialize_with = "lenient_vec")]
    pub label_values: Vec<RawLabelValue>,
}

/// Some entries are nested dicts without a `label`; their fields decode as absent.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawLabelValue {
    #[serde(default, deserialize_with = "loose_string")]
    pub label: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub value: Option<String>,
}

impl RawLikeItem {
    pub fn reaction(&self) -> Option<&RawReactionData> {
        self.data.iter().find_map(|d| d.reaction.as_ref())
    }
}

impl RawLikeLabelItem {
    pub fn label(&self, key: &str) -> Option<&str> {
        self.label_values
            .iter()
            .find(|lv| lv.label.as_deref() == Some(key))
            .and_then(|lv| lv.value.as_deref())
    }
}

/// Numbered files in name order; the non-numbered label file is excluded.
pub fn numbered_like_files(reactions_dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = match fs::read_dir(reactions_dir) {
        Ok(entries) => entries
            .filter_map(Result::ok)
            .map(|e| e.path())
            .filter(|p| {
                let name = p.file_name().and_then(|n| n.to_str()).unwrap_or("");
                name.starts_with(NUMBERED_PREFIX) && name.ends_with(".json") && p.is_file()
            })
            .collect(),
        Err(_) => Vec::new(),
    };
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    files
}

pub fn label_like_file(reactions_dir: &Path) -> Option<PathBuf> {
    let path = reactions_dir.join(LABEL_FILE);
    path.is_file().then_some(path)
}

pub fn decode_numbered_file(path: &Path) -> Result<Records<RawLikeItem>, CoreError> {
    read_lenient_array(path)
}

pub fn decode_label_file(path: &Path) -> Result<Records<RawLikeLabelItem>, CoreError> {
    read_lenient_array(path)
}
