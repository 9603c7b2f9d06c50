//! Combining records from overlapping export snapshots.

use std::collections::HashSet;

use crate::discovery::{ThreadCategory, ThreadGroup};
use crate::encoding::fix_encoding;
use crate::raw::messages::{decode_message_file, message_files, RawMessageFile};
use crate::records::{LikeRecord, MessageRecord};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedThread {
    pub slug: String,
    pub category: ThreadCategory,
    pub title: String,
    pub participants: Vec<String>,
    pub thread_path: String,
    /// Deduplicated by timestamp, ascending.
    pub messages: Vec<MessageRecord>,
    /// Message files that could not be read or decoded.
    pub failed_files: usize,
    /// Message entries dropped from otherwise readable files.
    pub skipped_records: usize,
}

impl MergedThread {
    pub fn is_group_chat(&self) -> bool {
        self.participants.len() > 2
    }

    pub fn first_message_at(&self) -> Option<i64> {
        self.messages.first().map(|m| m.timestamp_ms)
    }

    pub fn last_message_at(&self) -> Option<i64> {
        self.messages.last().map(|m| m.timestamp_ms)
    }
}

struct ThreadMeta {
    title: String,
    participants: Vec<String>,
    thread_path: Option<String>,
}

impl ThreadMeta {
    fn from_file(file: &RawMessageFile) -> Self {
        Self {
            title: file.title.as_deref().map(fix_encoding).unwrap_or_default(),
            participants: file
                .participants
                .iter()
                .map(|p| fix_encoding(&p.name))
                .collect(),
            thread_path: file.thread_path.clone(),
        }
    }
}

/// Reads every message file of every folder in `group` and merges them.
///
/// The category is the first folder's. Metadata comes from the first file
/// with a non-empty title, falling back to the first file decoded.
pub fn merge_thread_group(group: &ThreadGroup) -> Option<MergedThread> {
    let (_, category) = group.entries.first()?;
    let category = *category;

    let mut fallback_meta: Option<ThreadMeta> = None;
    let mut titled_meta: Option<ThreadMeta> = None;
    let mut seen = HashSet::new();
    let mut messages = Vec::new();
    let mut failed_files = 0;
    let mut skipped_records = 0;

    for (dir, _) in &group.entries {
        for path in message_files(dir) {
            let file = match decode_message_file(&path) {
                Ok(file) => file,
                Err(err) => {
                    tracing::warn!(path = %path.display(), error = %err, "skipping message file");
                    failed_files += 1;
                    continue;
                }
            };
            if titled_meta.is_none() && file.title.as_deref().is_some_and(|t| !t.is_empty()) {
                titled_meta = Some(ThreadMeta::from_file(&file));
            }
            if fallback_meta.is_none() {
                fallback_meta = Some(ThreadMeta::from_file(&file));
            }
            if file.messages.skipped > 0 {
                tracing::warn!(
                    path = %path.display(),
                    skipped = file.messages.skipped,
                    "skipping undecodable messages"
                );
                skipped_records += file.messages.skipped;
            }
            for raw in &file.messages.items {
                if seen.insert(raw.timestamp_ms) {
                    messages.push(MessageRecord::from_raw(raw));
                }
            }
        }
    }

    messages.sort_by_key(|m| m.timestamp_ms);
    let meta = titled_meta.or(fallback_meta);
    let (title, participants, thread_path) = match meta {
        Some(meta) => (meta.title, meta.participants, meta.thread_path),
        None => (String::new(), Vec::new(), None),
    };
    let thread_path =
        thread_path.unwrap_or_else(|| format!("{}/{}", category.dir_name(), group.slug));

    Some(MergedThread {
        slug: group.slug.clone(),
        category,
        title,
        participants,
        thread_path,
        messages,
        failed_files,
        skipped_records,
    })
}

/// Keeps the first like seen for each timestamp.
///
/// Callers pass numbered-file records ahead of label-file records, so the
/// structured variant wins when both formats describe the same like.
pub fn dedup_likes<I>(likes: I) -> Vec<LikeRecord>
where
    I: IntoIterator<Item = LikeRecord>,
{
    let mut seen = HashSet::new();
    likes
        .into_iter()
        .filter(|like| seen.insert(like.timestamp))
        .collect()
}
