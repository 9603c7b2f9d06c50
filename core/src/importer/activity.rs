use std::path::Path;

use rusqlite::params;

use crate::db::Store;
use crate::error::CoreError;
use crate::merge::dedup_likes;
use crate::raw::comments::{decode_comment_file, COMMENTS_FILE};
use crate::raw::likes::{decode_label_file, decode_numbered_file, label_like_file, numbered_like_files};
use crate::raw::posts::{decode_group_file, decode_timeline_file, timeline_post_files, GROUP_POSTS_FILE};
use crate::records::{CommentRecord, LikeRecord, PostRecord};

const POSTS_DIR: &str = "posts";
const GROUPS_DIR: &str = "groups";
const REACTIONS_DIR: &str = "comments_and_reactions";

/// Records written, files skipped and records dropped for one activity root.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(super) struct PhaseTally {
    pub records: usize,
    pub failed_files: usize,
    pub skipped_records: usize,
}

impl PhaseTally {
    fn skip(&mut self, path: &Path, err: &CoreError) {
        tracing::warn!(path = %path.display(), error = %err, "skipping unreadable file");
        self.failed_files += 1;
    }

    fn drop_records(&mut self, path: &Path, count: usize) {
        if count == 0 {
            return;
        }
        tracing::warn!(path = %path.display(), skipped = count, "skipping undecodable records");
        self.skipped_records += count;
    }
}

pub(super) fn import_timeline_posts(store: &Store, root: &Path) -> Result<PhaseTally, CoreError> {
    let mut tally = PhaseTally::default();
    for path in timeline_post_files(&root.join(POSTS_DIR)) {
        match decode_timeline_file(&path) {
            Ok(raw) => {
                tally.drop_records(&path, raw.skipped);
                let records: Vec<PostRecord> = raw.items.iter().map(PostRecord::from_timeline).collect();
                tally.records += insert_posts(store, &records)?;
            }
            Err(err) => tally.skip(&path, &err),
        }
    }
    Ok(tally)
}

pub(super) fn import_group_posts(store: &Store, root: &Path) -> Result<PhaseTally, CoreError> {
    let mut tally = PhaseTally::default();
    let path = root.join(GROUPS_DIR).join(GROUP_POSTS_FILE);
    if !path.is_file() {
        tracing::debug!(root = %root.display(), "no group posts");
        return Ok(tally);
    }
    match decode_group_file(&path) {
        Ok(raw) => {
            tally.drop_records(&path, raw.skipped);
            let records: Vec<PostRecord> = raw.items.iter().map(PostRecord::from_group).collect();
            tally.records += insert_posts(store, &records)?;
        }
        Err(err) => tally.skip(&path, &err),
    }
    Ok(tally)
}

/// Numbered files are read before the label file so their records win the
/// timestamp dedup.
pub(super) fn import_likes(store: &Store, root: &Path) -> Result<PhaseTally, CoreError> {
    let mut tally = PhaseTally::default();
    let dir = root.join(REACTIONS_DIR);
    let mut likes: Vec<LikeRecord> = Vec::new();
    for path in numbered_like_files(&dir) {
        match decode_numbered_file(&path) {
            Ok(raw) => {
                let before = likes.len();
                likes.extend(raw.items.iter().filter_map(LikeRecord::from_numbered));
                let empty = raw.items.len() - (likes.len() - before);
                tally.drop_records(&path, raw.skipped + empty);
            }
            Err(err) => tally.skip(&path, &err),
        }
    }
    if let Some(path) = label_like_file(&dir) {
        match decode_label_file(&path) {
            Ok(raw) => {
                let before = likes.len();
                likes.extend(raw.items.iter().filter_map(LikeRecord::from_label));
                let empty = raw.items.len() - (likes.len() - before);
                tally.drop_records(&path, raw.skipped + empty);
            }
            Err(err) => tally.skip(&path, &err),
        }
    }
    let likes = dedup_likes(likes);
    if likes.is_empty() {
        return Ok(tally);
    }
    tally.records = store.write(|tx| {
        let mut stmt = tx.prepare_cached(
            "INSERT INTO likes (timestamp, title, reaction_type) VALUES (?1, ?2, ?3);",
        )?;
        for like in &likes {
            stmt.execute(params![like.timestamp, like.title, like.reaction_type])?;
        }
        Ok(likes.len())
    })?;
    Ok(tally)
}

pub(super) fn import_comments(store: &Store, root: &Path) -> Result<PhaseTally, CoreError> {
    let mut tally = PhaseTally::default();
    let path = root.join(REACTIONS_DIR).join(COMMENTS_FILE);
    if !path.is_file() {
        return Ok(tally);
    }
    let raw = match decode_comment_file(&path) {
        Ok(raw) => raw,
        Err(err) => {
            tally.skip(&path, &err);
            return Ok(tally);
        }
    };
    tally.drop_records(&path, raw.skipped);
    let comments: Vec<CommentRecord> = raw.items.iter().map(CommentRecord::from_raw).collect();
    if comments.is_empty() {
        return Ok(tally);
    }
    tally.records = store.write(|tx| {
        let mut stmt = tx.prepare_cached(
            "INSERT INTO comments (timestamp, title, comment_text) VALUES (?1, ?2, ?3);",
        )?;
        for comment in &comments {
            stmt.execute(params![comment.timestamp, comment.title, comment.comment_text])?;
        }
        Ok(comments.len())
    })?;
    Ok(tally)
}

fn insert_posts(store: &Store, posts: &[PostRecord]) -> Result<usize, CoreError> {
    if posts.is_empty() {
        return Ok(0);
    }
    store.write(|tx| {
        let mut insert_post = tx.prepare_cached(
            "INSERT INTO posts (source, timestamp, title, content, external_url, group_name, has_media)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
        )?;
        let mut insert_tag =
            tx.prepare_cached("INSERT INTO post_tags (post_id, name) VALUES (?1, ?2);")?;
        for post in posts {
            insert_post.execute(params![
                post.source.as_str(),
                post.timestamp,
                post.title,
                post.content,
                post.external_url,
                post.group_name,
                post.has_media,
            ])?;
            let post_id = tx.last_insert_rowid();
            for tag in &post.tags {
                insert_tag.execute(params![post_id, tag])?;
            }
        }
        Ok(posts.len())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ArchiveLayout, StoreOptions};
    use crate::db::open_store;
    use serde_json::json;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn posts_keep_tags_and_skip_bad_files() {
        let tmp = tempdir().expect("temp");
        let store = open_store(&ArchiveLayout::new(tmp.path().join("data")), &StoreOptions::default())
            .expect("store");
        let root = tmp.path().join("export");
        fs::create_dir_all(root.join("posts")).expect("mkdir");
        let posts = json!([
            {"timestamp": 2, "data": [{"post": "hello"}], "tags": [{"name": "Bob"}, {"name": "Eve"}]},
            {"title": "no timestamp"}
        ]);
        fs::write(root.join("posts/your_posts__1.json"), posts.to_string()).expect("write");
        fs::write(root.join("posts/your_posts__2.json"), "oops").expect("write");

        let tally = import_timeline_posts(&store, &root).expect("import");
        assert_eq!(
            tally,
            PhaseTally {
                records: 1,
                failed_files: 1,
                skipped_records: 1,
            }
        );
        let reader = store.reader().expect("reader");
        let tags: i64 = reader
            .query_row("SELECT COUNT(*) FROM post_tags;", [], |row| row.get(0))
            .expect("tags");
        assert_eq!(tags, 2);
    }

    #[test]
    fn likes_without_reaction_are_counted() {
        let tmp = tempdir().expect("temp");
        let store = open_store(&ArchiveLayout::new(tmp.path().join("data")), &StoreOptions::default())
            .expect("store");
        let root = tmp.path().join("export");
        fs::create_dir_all(root.join("comments_and_reactions")).expect("mkdir");
        let numbered = json!([
            {"timestamp": 1, "data": [{"reaction": {"reaction": "like", "actor": "Me"}}]},
            {"timestamp": 2, "data": []},
            {"data": [{"reaction": {"reaction": "wow", "actor": "Me"}}]}
        ]);
        fs::write(root.join("comments_and_reactions/likes_and_reactions_1.json"), numbered.to_string())
            .expect("write");
        let labelled = json!([
            {"timestamp": 3, "label_values": [{"label": "Reaction", "value": "haha"}]},
            {"timestamp": 4, "label_values": []}
        ]);
        fs::write(root.join("comments_and_reactions/likes_and_reactions.json"), labelled.to_string())
            .expect("write");

        let tally = import_likes(&store, &root).expect("import");
        assert_eq!(tally.records, 2);
        assert_eq!(tally.skipped_records, 3);
        assert_eq!(tally.failed_files, 0);
    }

    #[test]
    fn missing_directories_contribute_nothing() {
        let tmp = tempdir().expect("temp");
        let store = open_store(&ArchiveLayout::new(tmp.path().join("data")), &StoreOptions::default())
            .expect("store");
        let root = tmp.path().join("empty");
        fs::create_dir_all(&root).expect("mkdir");
        for import in [import_timeline_posts, import_group_posts, import_likes, import_comments] {
            assert_eq!(import(&store, &root).expect("import"), PhaseTally::default());
        }
    }
}
