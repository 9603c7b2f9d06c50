use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::{
    first_non_empty, lenient_vec, loose_string, read_json, read_lenient_array, RawExternalContext, RawMedia, Records,
};
use crate::error::CoreError;

const TIMELINE_PREFIX: &str = "your_posts__";
pub const GROUP_POSTS_FILE: &str = "group_posts_and_comments.json";

/// A timeline or group post. Group posts never carry `tags`.
#[derive(Debug, Clone, Deserialize)]
pub struct RawPost {
    pub timestamp: i64,
    #[serde(default, deserialize_with = "loose_string")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient_vec")]
    pub data: Vec<RawPostData>,
    #[serde(default, deserialize_with = "lenient_vec")]
    pub attachments: Vec<RawAttachment>,
    #[serde(default, deserialize_with = "lenient_vec")]
    pub tags: Vec<RawTag>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawPostData {
    #[serde(default, deserialize_with = "loose_string")]
    pub post: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawAttachment {
    #[serde(default, deserialize_with = "lenient_vec")]
    pub data: Vec<RawAttachmentData>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawAttachmentData {
    #[serde(default)]
    pub external_context: Option<RawExternalContext>,
    #[serde(default)]
    pub media: Option<RawMedia>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawTag {
    #[serde(default, deserialize_with = "loose_string")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawGroupPostFile {
    #[serde(default)]
    pub group_posts_v2: Records<RawPost>,
}

impl RawPost {
    /// First non-empty `data[].post`.
    pub fn text(&self) -> Option<&str> {
        first_non_empty(self.data.iter().map(|d| d.post.as_deref()))
    }

    pub fn external_url(&self) -> Option<&str> {
        self.attachment_data()
            .filter_map(|d| d.external_context.as_ref())
            .find_map(|ctx| ctx.url.as_deref())
    }

    pub fn has_media(&self) -> bool {
        self.attachment_data().any(|d| d.media.is_some())
    }

    pub fn tag_names(&self) -> impl Iterator<Item = &str> {
        self.tags
            .iter()
            .filter_map(|t| t.name.as_deref())
            .filter(|name| !name.is_empty())
    }

    fn attachment_data(&self) -> impl Iterator<Item = &RawAttachmentData> {
        self.attachments.iter().flat_map(|a| a.data.iter())
    }
}

/// `your_posts__*.json` files in name order.
pub fn timeline_post_files(posts_dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = match fs::read_dir(posts_dir) {
        Ok(entries) => entries
            .filter_map(Result::ok)
            .map(|e| e.path())
            .filter(|p| {
                let name = p.file_name().and_then(|n| n.to_str()).unwrap_or("");
                name.starts_with(TIMELINE_PREFIX) && name.ends_with(".json") && p.is_file()
            })
            .collect(),
        Err(_) => Vec::new(),
    };
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    files
}

pub fn decode_timeline_file(path: &Path) -> Result<Records<RawPost>, CoreError> {
    read_lenient_array(path)
}

pub fn decode_group_file(path: &Path) -> Result<Records<RawPost>, CoreError> {
    let file: RawGroupPostFile = read_json(path)?;
    Ok(file.group_posts_v2)
}
