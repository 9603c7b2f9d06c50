//! Locating export snapshots inside a user-selected folder and grouping
//! their conversation folders by slug.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::CoreError;

const ROOT_MARKERS: [&str; 3] = ["messages", "posts", "comments_and_reactions"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ThreadCategory {
    Inbox,
    Archived,
    Filtered,
    Requests,
    E2eeCutover,
}

impl ThreadCategory {
    /// Scan order within one activity root.
    pub const ALL: [ThreadCategory; 5] = [
        ThreadCategory::Inbox,
        ThreadCategory::Archived,
        ThreadCategory::Filtered,
        ThreadCategory::Requests,
        ThreadCategory::E2eeCutover,
    ];

    /// Folder name under `messages/`.
    pub fn dir_name(self) -> &'static str {
        match self {
            ThreadCategory::Inbox => "inbox",
            ThreadCategory::Archived => "archived_threads",
            ThreadCategory::Filtered => "filtered_threads",
            ThreadCategory::Requests => "message_requests",
            ThreadCategory::E2eeCutover => "e2ee_cutover",
        }
    }

    /// Name persisted in `threads.category`.
    pub fn as_str(self) -> &'static str {
        match self {
            ThreadCategory::Inbox => "inbox",
            ThreadCategory::Archived => "archived",
            ThreadCategory::Filtered => "filtered",
            ThreadCategory::Requests => "requests",
            ThreadCategory::E2eeCutover => "e2ee-cutover",
        }
    }
}

/// Every folder, across all activity roots, sharing one thread slug.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadGroup {
    pub slug: String,
    /// In discovery order: roots by path, then categories in scan order.
    pub entries: Vec<(PathBuf, ThreadCategory)>,
}

pub fn is_activity_root(dir: &Path) -> bool {
    ROOT_MARKERS.iter().any(|marker| dir.join(marker).is_dir())
}

/// Finds every activity root at most two levels below `selected`.
///
/// The selected folder wins on its own when it qualifies. Otherwise each
/// qualifying child is a root, and non-qualifying children are searched one
/// level deeper.
pub fn find_activity_roots(selected: &Path) -> Result<Vec<PathBuf>, CoreError> {
    if is_activity_root(selected) {
        return Ok(vec![selected.to_path_buf()]);
    }
    let mut roots = Vec::new();
    for child in visible_subdirs(selected) {
        if is_activity_root(&child) {
            roots.push(child);
            continue;
        }
        roots.extend(
            visible_subdirs(&child)
                .into_iter()
                .filter(|grandchild| is_activity_root(grandchild)),
        );
    }
    roots.sort();
    roots.dedup();
    if roots.is_empty() {
        return Err(CoreError::NoActivityRoot(selected.display().to_string()));
    }
    Ok(roots)
}

/// Groups thread folders of all roots by slug, in slug order.
pub fn group_threads(roots: &[PathBuf]) -> Vec<ThreadGroup> {
    let mut by_slug: BTreeMap<String, Vec<(PathBuf, ThreadCategory)>> = BTreeMap::new();
    for root in roots {
        let messages = root.join("messages");
        for category in ThreadCategory::ALL {
            let category_dir = messages.join(category.dir_name());
            if !category_dir.is_dir() {
                continue;
            }
            for thread_dir in visible_subdirs(&category_dir) {
                let Some(slug) = thread_dir.file_name().and_then(|n| n.to_str()) else {
                    continue;
                };
                by_slug
                    .entry(slug.to_string())
                    .or_default()
                    .push((thread_dir.clone(), category));
            }
        }
    }
    by_slug
        .into_iter()
        .map(|(slug, entries)| ThreadGroup { slug, entries })
        .collect()
}

fn visible_subdirs(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut dirs: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .filter(|entry| !entry.file_name().to_string_lossy().starts_with('.'))
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect();
    dirs.sort();
    dirs
}
