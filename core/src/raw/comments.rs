use std::path::Path;

use serde::Deserialize;

use super::{first_non_empty, lenient_vec, loose_string, read_json, Records};
use crate::error::CoreError;

pub const COMMENTS_FILE: &str = "comments.json";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawCommentFile {
    #[serde(default)]
    pub comments_v2: Records<RawComment>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawComment {
    pub timestamp: i64,
    #[serde(default, deserialize_with = "loose_string")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient_vec")]
    pub data: Vec<RawCommentData>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawCommentData {
    #[serde(default)]
    pub comment: Option<RawCommentContent>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawCommentContent {
    #[serde(default, deserialize_with = "loose_string")]
    pub comment: Option<String>,
}

impl RawComment {
    pub fn text(&self) -> Option<&str> {
        first_non_empty(
            self.data
                .iter()
                .map(|d| d.comment.as_ref().and_then(|c| c.comment.as_deref())),
        )
    }
}

pub fn decode_comment_file(path: &Path) -> Result<Records<RawComment>, CoreError> {
    let file: RawCommentFile = read_json(path)?;
    Ok(file.comments_v2)
}
