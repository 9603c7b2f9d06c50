use std::sync::mpsc;
use std::thread;

use rusqlite::{params, OptionalExtension, Transaction};

use crate::db::Store;
use crate::discovery::ThreadGroup;
use crate::error::CoreError;
use crate::merge::{merge_thread_group, MergedThread};

use super::CancelToken;

#[derive(Debug, Clone, Copy, Default)]
pub(super) struct ThreadUnit {
    pub messages: usize,
    pub failed_files: usize,
    pub skipped_records: usize,
}

/// Imports thread groups in batches of `batch_size` concurrent workers.
///
/// No worker of batch N+1 starts before every worker of batch N has
/// finished. `on_unit` runs on the calling thread once per finished group.
/// Returns `Ok(false)` when cancellation was observed at a batch boundary.
pub(super) fn import_thread_groups<F>(
    store: &Store,
    groups: &[ThreadGroup],
    batch_size: usize,
    cancel: &CancelToken,
    mut on_unit: F,
) -> Result<bool, CoreError>
where
    F: FnMut(ThreadUnit),
{
    for batch in groups.chunks(batch_size.max(1)) {
        if cancel.is_cancelled() {
            return Ok(false);
        }
        let mut first_error = None;
        thread::scope(|scope| {
            let (tx, rx) = mpsc::channel();
            for group in batch {
                let tx = tx.clone();
                scope.spawn(move || {
                    let _ = tx.send(import_thread_group(store, group));
                });
            }
            drop(tx);
            for result in rx {
                match result {
                    Ok(unit) => on_unit(unit),
                    Err(err) => {
                        tracing::error!(error = %err, "thread group import failed");
                        first_error.get_or_insert(err);
                    }
                }
            }
        });
        if let Some(err) = first_error {
            return Err(err);
        }
    }
    Ok(true)
}

fn import_thread_group(store: &Store, group: &ThreadGroup) -> Result<ThreadUnit, CoreError> {
    let Some(thread) = merge_thread_group(group) else {
        return Ok(ThreadUnit::default());
    };
    let mut unit = ThreadUnit {
        messages: 0,
        failed_files: thread.failed_files,
        skipped_records: thread.skipped_records,
    };
    if thread.messages.is_empty() {
        tracing::debug!(slug = %thread.slug, "thread has no messages");
        return Ok(unit);
    }
    unit.messages = store.write(|tx| write_thread(tx, &thread))?;
    tracing::debug!(slug = %thread.slug, messages = unit.messages, dirs = group.entries.len(), "thread imported");
    Ok(unit)
}

/// Upserts the thread by slug and replaces its messages.
pub(super) fn write_thread(tx: &Transaction, thread: &MergedThread) -> Result<usize, CoreError> {
    let participants = serde_json::to_string(&thread.participants)?;
    let existing: Option<i64> = tx
        .query_row(
            "SELECT id FROM threads WHERE thread_slug = ?1;",
            params![thread.slug],
            |row| row.get(0),
        )
        .optional()?;
    let thread_id = match existing {
        Some(id) => {
            tx.execute(
                "UPDATE threads SET thread_path = ?2, category = ?3, title = ?4, is_group_chat = ?5,
                   participant_names = ?6, message_count = ?7, first_message_at = ?8, last_message_at = ?9
                 WHERE id = ?1;",
                params![
                    id,
                    thread.thread_path,
                    thread.category.as_str(),
                    thread.title,
                    thread.is_group_chat(),
                    participants,
                    thread.messages.len() as i64,
                    thread.first_message_at(),
                    thread.last_message_at(),
                ],
            )?;
            tx.execute("DELETE FROM messages WHERE thread_id = ?1;", params![id])?;
            id
        }
        None => {
            tx.execute(
                "INSERT INTO threads (thread_slug, thread_path, category, title, is_group_chat,
                   participant_names, message_count, first_message_at, last_message_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9);",
                params![
                    thread.slug,
                    thread.thread_path,
                    thread.category.as_str(),
                    thread.title,
                    thread.is_group_chat(),
                    participants,
                    thread.messages.len() as i64,
                    thread.first_message_at(),
                    thread.last_message_at(),
                ],
            )?;
            tx.last_insert_rowid()
        }
    };

    let mut insert_message = tx.prepare_cached(
        "INSERT INTO messages (thread_id, sender_name, timestamp_ms, content, has_photos, has_videos,
           has_audio, has_gifs, has_files, has_share, share_url, reaction_count)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12);",
    )?;
    let mut insert_reaction = tx.prepare_cached(
        "INSERT INTO reactions (message_id, reaction_emoji, actor_name) VALUES (?1, ?2, ?3);",
    )?;
    for message in &thread.messages {
        insert_message.execute(params![
            thread_id,
            message.sender_name,
            message.timestamp_ms,
            message.content,
            message.has_photos,
            message.has_videos,
            message.has_audio,
            message.has_gifs,
            message.has_files,
            message.has_share,
            message.share_url,
            message.reactions.len() as i64,
        ])?;
        let message_id = tx.last_insert_rowid();
        for reaction in &message.reactions {
            insert_reaction.execute(params![message_id, reaction.emoji, reaction.actor])?;
        }
    }
    Ok(thread.messages.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::apply_migrations;
    use crate::discovery::ThreadCategory;
    use crate::records::{MessageRecord, ReactionRecord};
    use rusqlite::Connection;

    fn message(ts: i64, reactions: usize) -> MessageRecord {
        MessageRecord {
            sender_name: "Alice".into(),
            timestamp_ms: ts,
            content: Some(format!("m{ts}")),
            has_photos: false,
            has_videos: false,
            has_audio: false,
            has_gifs: false,
            has_files: false,
            has_share: false,
            share_url: None,
            reactions: (0..reactions)
                .map(|i| ReactionRecord { emoji: "👍".into(), actor: format!("p{i}") })
                .collect(),
        }
    }

    fn thread(title: &str, timestamps: &[i64]) -> MergedThread {
        MergedThread {
            slug: "alice_123".into(),
            category: ThreadCategory::Inbox,
            title: title.into(),
            participants: vec!["Alice".into(), "Me".into()],
            thread_path: "inbox/alice_123".into(),
            messages: timestamps.iter().map(|ts| message(*ts, 1)).collect(),
            failed_files: 0,
            skipped_records: 0,
        }
    }

    #[test]
    fn rewriting_a_slug_updates_in_place() {
        let mut conn = Connection::open_in_memory().expect("db");
        conn.execute_batch("PRAGMA foreign_keys = ON;").expect("pragma");
        apply_migrations(&conn).expect("migrate");
        let tx = conn.transaction().expect("tx");
        write_thread(&tx, &thread("Alice", &[1, 2, 3])).expect("first");
        write_thread(&tx, &thread("Alice B.", &[1, 2])).expect("second");
        tx.commit().expect("commit");

        let (threads, title, count, last): (i64, String, i64, i64) = conn
            .query_row(
                "SELECT COUNT(*), MAX(title), MAX(message_count), MAX(last_message_at) FROM threads;",
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
            )
            .expect("thread");
        assert_eq!((threads, title.as_str(), count, last), (1, "Alice B.", 2, 2));
        let messages: i64 = conn
            .query_row("SELECT COUNT(*) FROM messages;", [], |row| row.get(0))
            .expect("messages");
        assert_eq!(messages, 2);
        let reactions: i64 = conn
            .query_row("SELECT COUNT(*) FROM reactions;", [], |row| row.get(0))
            .expect("reactions");
        assert_eq!(reactions, 2);
    }
}
