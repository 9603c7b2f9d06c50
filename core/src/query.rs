//! Read-only queries over an imported store.
//!
//! Every function takes a connection from [`crate::db::Store::reader`].
//! Feed queries page backwards in time: pass the oldest timestamp of the
//! previous page as `before_ts` to get the next one.

use std::path::Path;

use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

use crate::error::CoreError;
use crate::models::{
    ArchiveStats, CommentRow, Education, FamilyMember, ImportStateRow, LikeRow, MessageRow, PostRow,
    Profile, ProfilePhoto, ReactionRow, ReactionTypeCount, ScreenName, ThreadSummary, WorkExperience,
};

pub fn has_imported(conn: &Connection) -> Result<bool, CoreError> {
    let exists: Option<i64> = conn
        .query_row("SELECT id FROM import_state WHERE id = 1;", [], |row| row.get(0))
        .optional()?;
    Ok(exists.is_some())
}

pub fn import_state(conn: &Connection) -> Result<Option<ImportStateRow>, CoreError> {
    Ok(conn
        .query_row(
            "SELECT import_date, export_root, thread_count, message_count, post_count, like_count, comment_count
             FROM import_state WHERE id = 1;",
            [],
            |row| {
                Ok(ImportStateRow {
                    import_date: row.get(0)?,
                    export_root: row.get(1)?,
                    thread_count: row.get(2)?,
                    message_count: row.get(3)?,
                    post_count: row.get(4)?,
                    like_count: row.get(5)?,
                    comment_count: row.get(6)?,
                })
            },
        )
        .optional()?)
}

pub fn archive_stats(conn: &Connection) -> Result<ArchiveStats, CoreError> {
    let count = |table: &str| -> Result<i64, CoreError> {
        Ok(conn.query_row(&format!("SELECT COUNT(1) FROM {table};"), [], |row| row.get(0))?)
    };
    Ok(ArchiveStats {
        threads: count("threads")?,
        messages: count("messages")?,
        reactions: count("reactions")?,
        posts: count("posts")?,
        likes: count("likes")?,
        comments: count("comments")?,
    })
}

const THREAD_COLUMNS: &str = "id, thread_slug, thread_path, category, title, is_group_chat, message_count, \
                              first_message_at, last_message_at";

fn thread_from_row(row: &Row) -> rusqlite::Result<ThreadSummary> {
    Ok(ThreadSummary {
        id: row.get(0)?,
        slug: row.get(1)?,
        path: row.get(2)?,
        category: row.get(3)?,
        title: row.get(4)?,
        is_group_chat: row.get::<_, i64>(5)? != 0,
        message_count: row.get(6)?,
        first_message_at: row.get(7)?,
        last_message_at: row.get(8)?,
    })
}

/// Most recently active first; `category` is a persisted name such as `inbox`.
pub fn list_threads(
    conn: &Connection,
    category: Option<&str>,
    limit: i64,
    offset: i64,
) -> Result<Vec<ThreadSummary>, CoreError> {
    let (filter, mut values): (&str, Vec<Value>) = match category {
        Some(category) => ("WHERE category = ?", vec![category.to_string().into()]),
        None => ("", Vec::new()),
    };
    values.push(limit.into());
    values.push(offset.into());
    let mut stmt = conn.prepare(&format!(
        "SELECT {THREAD_COLUMNS} FROM threads {filter}
         ORDER BY last_message_at DESC NULLS LAST, id ASC
         LIMIT ? OFFSET ?;"
    ))?;
    let rows = stmt.query_map(params_from_iter(values), thread_from_row)?;
    Ok(rows.collect::<Result<_, _>>()?)
}

pub fn get_thread(conn: &Connection, thread_id: i64) -> Result<Option<ThreadSummary>, CoreError> {
    Ok(conn
        .query_row(
            &format!("SELECT {THREAD_COLUMNS} FROM threads WHERE id = ?1;"),
            params![thread_id],
            thread_from_row,
        )
        .optional()?)
}

pub fn get_thread_participants(conn: &Connection, thread_id: i64) -> Result<Vec<String>, CoreError> {
    let names: Option<String> = conn
        .query_row(
            "SELECT participant_names FROM threads WHERE id = ?1;",
            params![thread_id],
            |row| row.get(0),
        )
        .optional()?;
    match names {
        Some(json) => Ok(serde_json::from_str(&json)?),
        None => Ok(Vec::new()),
    }
}

/// Newest first, strictly older than `before_ts` when given.
pub fn list_messages(
    conn: &Connection,
    thread_id: i64,
    before_ts: Option<i64>,
    limit: i64,
) -> Result<Vec<MessageRow>, CoreError> {
    let mut values: Vec<Value> = vec![thread_id.into()];
    let cursor = match before_ts {
        Some(ts) => {
            values.push(ts.into());
            "AND timestamp_ms < ?"
        }
        None => "",
    };
    values.push(limit.into());
    let mut stmt = conn.prepare(&format!(
        "SELECT id, thread_id, sender_name, timestamp_ms, content, has_photos, has_videos, has_audio,
                has_gifs, has_files, has_share, share_url, reaction_count
         FROM messages
         WHERE thread_id = ? {cursor}
         ORDER BY timestamp_ms DESC, id DESC
         LIMIT ?;"
    ))?;
    let rows = stmt.query_map(params_from_iter(values), |row| {
        Ok(MessageRow {
            id: row.get(0)?,
            thread_id: row.get(1)?,
            sender_name: row.get(2)?,
            timestamp_ms: row.get(3)?,
            content: row.get(4)?,
            has_photos: row.get::<_, i64>(5)? != 0,
            has_videos: row.get::<_, i64>(6)? != 0,
            has_audio: row.get::<_, i64>(7)? != 0,
            has_gifs: row.get::<_, i64>(8)? != 0,
            has_files: row.get::<_, i64>(9)? != 0,
            has_share: row.get::<_, i64>(10)? != 0,
            share_url: row.get(11)?,
            reaction_count: row.get(12)?,
        })
    })?;
    Ok(rows.collect::<Result<_, _>>()?)
}

pub fn list_reactions_for_message(conn: &Connection, message_id: i64) -> Result<Vec<ReactionRow>, CoreError> {
    let mut stmt = conn.prepare(
        "SELECT id, message_id, reaction_emoji, actor_name FROM reactions WHERE message_id = ?1 ORDER BY id;",
    )?;
    let rows = stmt.query_map(params![message_id], |row| {
        Ok(ReactionRow {
            id: row.get(0)?,
            message_id: row.get(1)?,
            emoji: row.get(2)?,
            actor_name: row.get(3)?,
        })
    })?;
    Ok(rows.collect::<Result<_, _>>()?)
}

/// Builds the WHERE clause shared by the feed queries.
fn feed_filter(before_ts: Option<i64>, search: Option<&str>, columns: &[&str]) -> (String, Vec<Value>) {
    let mut clauses = Vec::new();
    let mut values: Vec<Value> = Vec::new();
    if let Some(ts) = before_ts {
        clauses.push("timestamp < ?".to_string());
        values.push(ts.into());
    }
    if let Some(term) = search.map(str::trim).filter(|t| !t.is_empty()) {
        let pattern = format!("%{}%", escape_like(term));
        let matches: Vec<String> = columns
            .iter()
            .map(|col| format!("{col} LIKE ? ESCAPE '\\'"))
            .collect();
        clauses.push(format!("({})", matches.join(" OR ")));
        values.extend(columns.iter().map(|_| Value::from(pattern.clone())));
    }
    let clause = if clauses.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", clauses.join(" AND "))
    };
    (clause, values)
}

fn escape_like(term: &str) -> String {
    let mut out = String::with_capacity(term.len());
    for ch in term.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

pub fn list_posts(
    conn: &Connection,
    before_ts: Option<i64>,
    search: Option<&str>,
    limit: i64,
) -> Result<Vec<PostRow>, CoreError> {
    let (clause, mut values) = feed_filter(before_ts, search, &["title", "content", "group_name"]);
    values.push(limit.into());
    let mut stmt = conn.prepare(&format!(
        "SELECT id, source, timestamp, title, content, external_url, group_name, has_media
         FROM posts {clause}
         ORDER BY timestamp DESC, id DESC
         LIMIT ?;"
    ))?;
    let rows = stmt.query_map(params_from_iter(values), |row| {
        Ok(PostRow {
            id: row.get(0)?,
            source: row.get(1)?,
            timestamp: row.get(2)?,
            title: row.get(3)?,
            content: row.get(4)?,
            external_url: row.get(5)?,
            group_name: row.get(6)?,
            has_media: row.get::<_, i64>(7)? != 0,
        })
    })?;
    Ok(rows.collect::<Result<_, _>>()?)
}

pub fn list_post_tags(conn: &Connection, post_id: i64) -> Result<Vec<String>, CoreError> {
    let mut stmt = conn.prepare("SELECT name FROM post_tags WHERE post_id = ?1 ORDER BY id;")?;
    let rows = stmt.query_map(params![post_id], |row| row.get(0))?;
    Ok(rows.collect::<Result<_, _>>()?)
}

pub fn list_likes(
    conn: &Connection,
    before_ts: Option<i64>,
    search: Option<&str>,
    limit: i64,
) -> Result<Vec<LikeRow>, CoreError> {
    let (clause, mut values) = feed_filter(before_ts, search, &["title"]);
    values.push(limit.into());
    let mut stmt = conn.prepare(&format!(
        "SELECT id, timestamp, title, reaction_type FROM likes {clause}
         ORDER BY timestamp DESC, id DESC
         LIMIT ?;"
    ))?;
    let rows = stmt.query_map(params_from_iter(values), |row| {
        Ok(LikeRow {
            id: row.get(0)?,
            timestamp: row.get(1)?,
            title: row.get(2)?,
            reaction_type: row.get(3)?,
        })
    })?;
    Ok(rows.collect::<Result<_, _>>()?)
}

pub fn list_comments(
    conn: &Connection,
    before_ts: Option<i64>,
    search: Option<&str>,
    limit: i64,
) -> Result<Vec<CommentRow>, CoreError> {
    let (clause, mut values) = feed_filter(before_ts, search, &["title", "comment_text"]);
    values.push(limit.into());
    let mut stmt = conn.prepare(&format!(
        "SELECT id, timestamp, title, comment_text FROM comments {clause}
         ORDER BY timestamp DESC, id DESC
         LIMIT ?;"
    ))?;
    let rows = stmt.query_map(params_from_iter(values), |row| {
        Ok(CommentRow {
            id: row.get(0)?,
            timestamp: row.get(1)?,
            title: row.get(2)?,
            comment_text: row.get(3)?,
        })
    })?;
    Ok(rows.collect::<Result<_, _>>()?)
}

/// Like counts per reaction with legacy names folded into their current ones.
pub fn reaction_type_stats(conn: &Connection) -> Result<Vec<ReactionTypeCount>, CoreError> {
    let mut stmt = conn.prepare(
        "SELECT CASE reaction_type
                  WHEN 'NONE' THEN 'LIKE'
                  WHEN 'SORRY' THEN 'SAD'
                  WHEN 'ANGER' THEN 'ANGRY'
                  ELSE reaction_type
                END AS canonical,
                COUNT(1) AS n
         FROM likes
         GROUP BY canonical
         ORDER BY n DESC, canonical ASC;",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok(ReactionTypeCount {
            reaction_type: row.get(0)?,
            count: row.get(1)?,
        })
    })?;
    Ok(rows.collect::<Result<_, _>>()?)
}

/// Returns `None` until a profile has been imported. Photos whose asset file
/// is gone are left out.
pub fn load_profile(conn: &Connection, photos_dir: &Path) -> Result<Option<Profile>, CoreError> {
    let base = conn
        .query_row(
            "SELECT name, username, about_me, birthday, city, hometown, gender, friends_count, followers_count
             FROM profile WHERE id = 1;",
            [],
            |row| {
                Ok(Profile {
                    name: row.get(0)?,
                    username: row.get(1)?,
                    about_me: row.get(2)?,
                    birthday: row.get(3)?,
                    city: row.get(4)?,
                    hometown: row.get(5)?,
                    gender: row.get(6)?,
                    friends_count: row.get(7)?,
                    followers_count: row.get(8)?,
                    work: Vec::new(),
                    education: Vec::new(),
                    websites: Vec::new(),
                    screen_names: Vec::new(),
                    family: Vec::new(),
                    photos: Vec::new(),
                })
            },
        )
        .optional()?;
    let Some(mut profile) = base else {
        return Ok(None);
    };

    let mut stmt = conn.prepare("SELECT employer, title, location, period FROM profile_work ORDER BY id;")?;
    profile.work = stmt
        .query_map([], |row| {
            Ok(WorkExperience {
                employer: row.get(0)?,
                title: row.get(1)?,
                location: row.get(2)?,
                period: row.get(3)?,
            })
        })?
        .collect::<Result<_, _>>()?;

    let mut stmt = conn.prepare("SELECT school, degree, field, school_type FROM profile_education ORDER BY id;")?;
    profile.education = stmt
        .query_map([], |row| {
            Ok(Education {
                school: row.get(0)?,
                degree: row.get(1)?,
                field: row.get(2)?,
                school_type: row.get(3)?,
            })
        })?
        .collect::<Result<_, _>>()?;

    let mut stmt = conn.prepare("SELECT address FROM profile_websites ORDER BY id;")?;
    profile.websites = stmt.query_map([], |row| row.get(0))?.collect::<Result<_, _>>()?;

    let mut stmt = conn.prepare("SELECT service, username FROM profile_screen_names ORDER BY id;")?;
    profile.screen_names = stmt
        .query_map([], |row| {
            Ok(ScreenName {
                service: row.get(0)?,
                username: row.get(1)?,
            })
        })?
        .collect::<Result<_, _>>()?;

    let mut stmt = conn.prepare("SELECT name, relation FROM profile_family ORDER BY id;")?;
    profile.family = stmt
        .query_map([], |row| {
            Ok(FamilyMember {
                name: row.get(0)?,
                relation: row.get(1)?,
            })
        })?
        .collect::<Result<_, _>>()?;

    let mut stmt = conn.prepare("SELECT timestamp, filename FROM profile_photos ORDER BY timestamp DESC;")?;
    let photos: Vec<(i64, String)> = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<Result<_, _>>()?;
    profile.photos = photos
        .into_iter()
        .filter_map(|(timestamp, filename)| {
            let path = photos_dir.join(filename);
            path.is_file().then(|| ProfilePhoto {
                timestamp,
                path: path.display().to_string(),
            })
        })
        .collect();

    Ok(Some(profile))
}
