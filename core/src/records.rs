//! Clean, import-ready records built from the raw decoders.
//!
//! Each constructor here is the single place where encoding repair is applied
//! to a user-authored field, so persisted text is repaired exactly once.

use crate::encoding::{fix_encoding, fix_optional};
use crate::raw::comments::RawComment;
use crate::raw::likes::{RawLikeItem, RawLikeLabelItem};
use crate::raw::messages::RawMessage;
use crate::raw::posts::RawPost;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageRecord {
    pub sender_name: String,
    pub timestamp_ms: i64,
    pub content: Option<String>,
    pub has_photos: bool,
    pub has_videos: bool,
    pub has_audio: bool,
    pub has_gifs: bool,
    pub has_files: bool,
    pub has_share: bool,
    pub share_url: Option<String>,
    pub reactions: Vec<ReactionRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReactionRecord {
    pub emoji: String,
    pub actor: String,
}

impl MessageRecord {
    pub fn from_raw(raw: &RawMessage) -> Self {
        Self {
            sender_name: raw.sender_name.as_deref().map(fix_encoding).unwrap_or_default(),
            timestamp_ms: raw.timestamp_ms,
            content: fix_optional(raw.content.as_deref()),
            has_photos: !raw.photos.is_empty(),
            has_videos: !raw.videos.is_empty(),
            has_audio: !raw.audio_files.is_empty(),
            has_gifs: !raw.gifs.is_empty(),
            has_files: !raw.files.is_empty(),
            has_share: raw.share.is_some(),
            share_url: raw.share.as_ref().and_then(|s| s.link.clone()),
            reactions: raw
                .reactions
                .iter()
                .map(|r| ReactionRecord {
                    emoji: fix_encoding(&r.reaction),
                    actor: fix_encoding(&r.actor),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostSource {
    Timeline,
    Group,
}

impl PostSource {
    pub fn as_str(self) -> &'static str {
        match self {
            PostSource::Timeline => "timeline",
            PostSource::Group => "group",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostRecord {
    pub source: PostSource,
    pub timestamp: i64,
    pub title: Option<String>,
    pub content: Option<String>,
    pub external_url: Option<String>,
    pub group_name: Option<String>,
    pub has_media: bool,
    pub tags: Vec<String>,
}

impl PostRecord {
    pub fn from_timeline(raw: &RawPost) -> Self {
        Self {
            source: PostSource::Timeline,
            timestamp: raw.timestamp,
            title: fix_optional(raw.title.as_deref()),
            content: fix_optional(raw.text()),
            external_url: raw.external_url().map(str::to_string),
            group_name: None,
            has_media: raw.has_media(),
            tags: raw.tag_names().map(fix_encoding).collect(),
        }
    }

    pub fn from_group(raw: &RawPost) -> Self {
        let title = fix_optional(raw.title.as_deref());
        let group_name = title.as_deref().and_then(group_name_from_title);
        Self {
            source: PostSource::Group,
            timestamp: raw.timestamp,
            title,
            content: fix_optional(raw.text()),
            external_url: raw.external_url().map(str::to_string),
            group_name,
            has_media: raw.has_media(),
            tags: Vec::new(),
        }
    }
}

/// "Me posted in Rust Users." -> "Rust Users"
pub fn group_name_from_title(title: &str) -> Option<String> {
    const MARKER: &str = " posted in ";
    let start = title.find(MARKER)? + MARKER.len();
    let after = &title[start..];
    Some(after.strip_suffix('.').unwrap_or(after).to_string())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LikeRecord {
    pub timestamp: i64,
    pub title: String,
    pub reaction_type: String,
}

impl LikeRecord {
    /// Items without a reaction carry nothing worth keeping.
    pub fn from_numbered(raw: &RawLikeItem) -> Option<Self> {
        let reaction = raw.reaction()?;
        let title = match raw.title.as_deref() {
            Some(title) => fix_encoding(title),
            None => fix_encoding(&reaction.actor),
        };
        Some(Self {
            timestamp: raw.timestamp,
            title,
            reaction_type: reaction.reaction.to_uppercase(),
        })
    }

    pub fn from_label(raw: &RawLikeLabelItem) -> Option<Self> {
        if raw.label_values.is_empty() {
            return None;
        }
        Some(Self {
            timestamp: raw.timestamp,
            title: fix_encoding(raw.label("Name").unwrap_or("")),
            reaction_type: raw.label("Reaction").unwrap_or("LIKE").to_uppercase(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentRecord {
    pub timestamp: i64,
    pub title: Option<String>,
    pub comment_text: Option<String>,
}

impl CommentRecord {
    pub fn from_raw(raw: &RawComment) -> Self {
        Self {
            timestamp: raw.timestamp,
            title: fix_optional(raw.title.as_deref()),
            comment_text: fix_optional(raw.text()),
        }
    }
}
