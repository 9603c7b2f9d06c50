use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::{lenient_vec, loose_string, read_json, RawMedia, Records};
use crate::error::CoreError;

/// One `message_<n>.json` page of a conversation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawMessageFile {
    #[serde(default, deserialize_with = "lenient_vec")]
    pub participants: Vec<RawParticipant>,
    #[serde(default)]
    pub messages: Records<RawMessage>,
    #[serde(default, deserialize_with = "loose_string")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub thread_path: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawParticipant {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawMessage {
    #[serde(default, deserialize_with = "loose_string")]
    pub sender_name: Option<String>,
    pub timestamp_ms: i64,
    #[serde(default, deserialize_with = "loose_string")]
    pub content: Option<String>,
    #[serde(default, deserialize_with = "lenient_vec")]
    pub photos: Vec<RawMedia>,
    #[serde(default, deserialize_with = "lenient_vec")]
    pub videos: Vec<RawMedia>,
    #[serde(default, deserialize_with = "lenient_vec")]
    pub audio_files: Vec<RawMedia>,
    #[serde(default, deserialize_with = "lenient_vec")]
    pub gifs: Vec<RawMedia>,
    #[serde(default, deserialize_with = "lenient_vec")]
    pub files: Vec<RawMedia>,
    #[serde(default)]
    pub share: Option<RawShare>,
    #[serde(default, deserialize_with = "lenient_vec")]
    pub reactions: Vec<RawReaction>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawShare {
    #[serde(default, deserialize_with = "loose_string")]
    pub link: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawReaction {
    pub reaction: String,
    pub actor: String,
}

/// Lists `message_1.json`, `message_2.json`, ... stopping at the first gap.
pub fn message_files(thread_dir: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    let mut page = 1;
    loop {
        let path = thread_dir.join(format!("message_{}.json", page));
        if !path.is_file() {
            break;
        }
        files.push(path);
        page += 1;
    }
    files
}

pub fn decode_message_file(path: &Path) -> Result<RawMessageFile, CoreError> {
    read_json(path)
}
