mod common;

use std::collections::BTreeSet;
use std::sync::Arc;

use common::{count, import_completed, open_temp_store, ActivityRoot};
use fb_history_core::importer::{ImportPhase, ImportSummary};
use fb_history_core::query::{import_state, list_likes, list_threads};
use fb_history_core::{run_import, spawn_import, CancelToken, CoreError, ImportEvent, ImportOptions, ImportOutcome, Store};
use serde_json::json;
use tempfile::tempdir;

fn message_keys(store: &Store) -> BTreeSet<(String, i64)> {
    let conn = store.reader().expect("reader");
    let mut stmt = conn
        .prepare("SELECT t.thread_slug, m.timestamp_ms FROM messages m JOIN threads t ON t.id = m.thread_id;")
        .expect("prepare");
    let rows = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))
        .expect("query");
    let keys: BTreeSet<(String, i64)> = rows.map(|r| r.expect("row")).collect();
    keys
}

#[test]
fn overlapping_snapshots_merge_into_one_thread() {
    let tmp = tempdir().expect("temp");
    let exports = tmp.path().join("exports");
    let older = ActivityRoot::new(exports.join("facebook-2022/your_facebook_activity"));
    let newer = ActivityRoot::new(exports.join("facebook-2024/your_facebook_activity"));
    older.thread_page("inbox", "alice_123", 1, "Alice", &["Alice", "Me"], 1..=100);
    newer.thread_page("inbox", "alice_123", 1, "", &["Alice", "Me"], 50..=150);

    let store = open_temp_store(&tmp.path().join("data"));
    let summary = import_completed(&store, &exports);
    assert_eq!(summary.thread_count, 1);
    assert_eq!(summary.message_count, 150);

    let conn = store.reader().expect("reader");
    let threads = list_threads(&conn, None, 10, 0).expect("threads");
    assert_eq!(threads.len(), 1);
    let thread = &threads[0];
    assert_eq!(thread.slug, "alice_123");
    assert_eq!(thread.title, "Alice");
    assert_eq!(thread.message_count, 150);
    assert_eq!(thread.first_message_at, Some(1));
    assert_eq!(thread.last_message_at, Some(150));
    assert!(!thread.is_group_chat);

    let ordered: Vec<i64> = conn
        .prepare("SELECT timestamp_ms FROM messages ORDER BY id;")
        .expect("prepare")
        .query_map([], |row| row.get(0))
        .expect("query")
        .map(|r| r.expect("row"))
        .collect();
    assert_eq!(ordered, (1..=150).collect::<Vec<i64>>());
}

#[test]
fn like_formats_collapse_on_timestamp() {
    let tmp = tempdir().expect("temp");
    let root = ActivityRoot::new(tmp.path().join("your_facebook_activity"));
    root.write_json(
        "comments_and_reactions/likes_and_reactions.json",
        &json!([{"timestamp": 500, "label_values": [{"label": "Reaction", "value": "love"}]}]),
    );
    root.write_json(
        "comments_and_reactions/likes_and_reactions_1.json",
        &json!([{"timestamp": 500, "data": [{"reaction": {"reaction": "LOVE", "actor": "Bob"}}]}]),
    );

    let store = open_temp_store(&tmp.path().join("data"));
    let summary = import_completed(&store, &root.path);
    assert_eq!(summary.like_count, 1);

    let conn = store.reader().expect("reader");
    let likes = list_likes(&conn, None, None, 10).expect("likes");
    assert_eq!(likes.len(), 1);
    assert_eq!(likes[0].timestamp, 500);
    assert_eq!(likes[0].reaction_type, "LOVE");
    assert_eq!(likes[0].title, "Bob");
}

#[test]
fn like_count_is_union_minus_shared_timestamps() {
    let tmp = tempdir().expect("temp");
    let root = ActivityRoot::new(tmp.path().join("your_facebook_activity"));
    let numbered: Vec<_> = (1..=5)
        .map(|ts| json!({"timestamp": ts, "title": "Me liked a post.", "data": [{"reaction": {"reaction": "LIKE", "actor": "Me"}}]}))
        .collect();
    let labelled: Vec<_> = (4..=8)
        .map(|ts| json!({"timestamp": ts, "label_values": [{"label": "Name", "value": "Someone"}]}))
        .collect();
    root.write_json("comments_and_reactions/likes_and_reactions_1.json", &json!(numbered));
    root.write_json("comments_and_reactions/likes_and_reactions.json", &json!(labelled));

    let store = open_temp_store(&tmp.path().join("data"));
    import_completed(&store, &root.path);
    assert_eq!(count(&store, "likes"), 5 + 5 - 2);
}

#[test]
fn metadata_comes_from_first_titled_folder() {
    let tmp = tempdir().expect("temp");
    let root = ActivityRoot::new(tmp.path().join("your_facebook_activity"));
    root.thread_page("inbox", "crew_77", 1, "", &["Ann", "Ben"], [10, 11]);
    root.thread_page("archived_threads", "crew_77", 1, "The Crew", &["Ann", "Ben", "Cat"], [12]);

    let store = open_temp_store(&tmp.path().join("data"));
    import_completed(&store, &root.path);

    let conn = store.reader().expect("reader");
    let threads = list_threads(&conn, None, 10, 0).expect("threads");
    assert_eq!(threads.len(), 1);
    assert_eq!(threads[0].title, "The Crew");
    assert_eq!(threads[0].category, "inbox");
    assert!(threads[0].is_group_chat);
    assert_eq!(threads[0].message_count, 3);
    assert!(list_threads(&conn, Some("archived"), 10, 0).expect("archived").is_empty());
}

#[test]
fn rebuilding_from_the_same_export_is_idempotent() {
    let tmp = tempdir().expect("temp");
    let root = ActivityRoot::new(tmp.path().join("your_facebook_activity"));
    root.thread_page("inbox", "alice_123", 1, "Alice", &["Alice", "Me"], 1..=20);
    root.thread_page("inbox", "alice_123", 2, "Alice", &["Alice", "Me"], 15..=30);
    root.thread_page("message_requests", "stranger_9", 1, "Stranger", &["Stranger", "Me"], [5]);
    root.write_json(
        "posts/your_posts__1.json",
        &json!([{"timestamp": 1, "data": [{"post": "first"}]}, {"timestamp": 2, "data": [{"post": "second"}]}]),
    );
    root.write_json(
        "comments_and_reactions/comments.json",
        &json!({"comments_v2": [{"timestamp": 3, "data": [{"comment": {"comment": "nice"}}]}]}),
    );

    let store = open_temp_store(&tmp.path().join("data"));
    let first: ImportSummary = import_completed(&store, &root.path);
    let first_keys = message_keys(&store);
    let second: ImportSummary = import_completed(&store, &root.path);
    let second_keys = message_keys(&store);

    assert_eq!(first, second);
    assert_eq!(first_keys, second_keys);
    assert_eq!(first.message_count, 31);
    assert_eq!(first.post_count, 2);
    assert_eq!(first.comment_count, 1);
    assert_eq!(count(&store, "threads"), 2);

    let conn = store.reader().expect("reader");
    let state = import_state(&conn).expect("state").expect("row");
    assert_eq!(state.message_count, 31);
    assert_eq!(state.comment_count, 1);
    assert_eq!(state.export_root, root.path.display().to_string());
}

#[test]
fn missing_sections_and_malformed_files_are_absorbed() {
    let tmp = tempdir().expect("temp");
    let root = ActivityRoot::new(tmp.path().join("your_facebook_activity"));
    root.thread_page("inbox", "bob_1", 1, "Bob", &["Bob", "Me"], [1, 2]);
    root.write_raw("messages/inbox/bob_1/message_2.json", "{\"messages\": [");
    root.write_raw("posts/your_posts__1.json", "not json at all");
    root.write_json("posts/your_posts__2.json", &json!([{"timestamp": 9}, {"data": []}]));
    root.write_json("comments_and_reactions/comments.json", &json!({"unexpected": true}));
    // no groups/ directory at all

    let store = open_temp_store(&tmp.path().join("data"));
    let summary = import_completed(&store, &root.path);
    assert_eq!(summary.message_count, 2);
    assert_eq!(summary.post_count, 1);
    assert_eq!(summary.comment_count, 0);
    // two unreadable files plus the post without a timestamp
    assert_eq!(summary.error_count, 3);
    assert!(!summary.profile_imported);
}

#[test]
fn missing_activity_root_leaves_store_untouched() {
    let tmp = tempdir().expect("temp");
    let good = ActivityRoot::new(tmp.path().join("good/your_facebook_activity"));
    good.thread_page("inbox", "bob_1", 1, "Bob", &["Bob", "Me"], [1]);
    let store = open_temp_store(&tmp.path().join("data"));
    import_completed(&store, &good.path);

    let empty = tmp.path().join("empty");
    std::fs::create_dir_all(&empty).expect("mkdir");
    let result = run_import(&store, &empty, &ImportOptions::default(), &CancelToken::new(), |_| {});
    assert!(matches!(result, Err(CoreError::NoActivityRoot(_))));
    assert_eq!(count(&store, "messages"), 1);
}

#[test]
fn cancellation_stops_at_a_batch_boundary() {
    let tmp = tempdir().expect("temp");
    let root = ActivityRoot::new(tmp.path().join("your_facebook_activity"));
    for n in 0..6 {
        root.thread_page("inbox", &format!("friend_{n}"), 1, "Friend", &["Friend", "Me"], [n]);
    }
    root.write_json("posts/your_posts__1.json", &json!([{"timestamp": 1}]));

    let store = open_temp_store(&tmp.path().join("data"));
    let cancel = CancelToken::new();
    let options = ImportOptions { batch_size: 2 };
    let outcome = run_import(&store, &root.path, &options, &cancel, |progress| {
        if progress.phase == ImportPhase::Messages && progress.completed_threads == 2 {
            cancel.cancel();
        }
    })
    .expect("run");

    assert_eq!(outcome, ImportOutcome::Cancelled);
    assert_eq!(count(&store, "threads"), 2);
    assert_eq!(count(&store, "posts"), 0);
    assert_eq!(count(&store, "import_state"), 0);
}

#[test]
fn zero_batch_size_is_rejected_before_erasing() {
    let tmp = tempdir().expect("temp");
    let root = ActivityRoot::new(tmp.path().join("your_facebook_activity"));
    root.thread_page("inbox", "bob_1", 1, "Bob", &["Bob", "Me"], [1]);
    let store = open_temp_store(&tmp.path().join("data"));
    import_completed(&store, &root.path);

    let result = run_import(&store, &root.path, &ImportOptions { batch_size: 0 }, &CancelToken::new(), |_| {});
    assert!(matches!(result, Err(CoreError::InvalidArgument(_))));
    assert_eq!(count(&store, "import_state"), 1);
}

#[test]
fn background_session_streams_progress_then_finishes() {
    let tmp = tempdir().expect("temp");
    let root = ActivityRoot::new(tmp.path().join("your_facebook_activity"));
    for n in 0..3 {
        root.thread_page("inbox", &format!("friend_{n}"), 1, "Friend", &["Friend", "Me"], [n, n + 100]);
    }
    let store = Arc::new(open_temp_store(&tmp.path().join("data")));
    let session = spawn_import(Arc::clone(&store), root.path.clone(), ImportOptions::default());

    let mut fractions = Vec::new();
    let mut finished = Vec::new();
    for event in session.events.iter() {
        match event {
            ImportEvent::Progress(progress) => fractions.push(progress.overall_fraction()),
            ImportEvent::Finished(result) => finished.push(result),
        }
    }
    session.wait().expect("join");

    assert_eq!(finished.len(), 1);
    match finished.pop().expect("finished") {
        Ok(ImportOutcome::Completed(summary)) => assert_eq!(summary.message_count, 6),
        other => panic!("unexpected outcome {other:?}"),
    }
    assert!(fractions.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(fractions.last().copied(), Some(1.0));
}

#[test]
fn dropped_records_are_counted_as_errors() {
    let tmp = tempdir().expect("temp");
    let root = ActivityRoot::new(tmp.path().join("your_facebook_activity"));
    root.write_json(
        "messages/inbox/dana_4/message_1.json",
        &json!({
            "participants": [{"name": "Dana"}, {"name": "Me"}],
            "messages": [
                {"sender_name": "Dana", "timestamp_ms": 10, "content": "hello"},
                {"sender_name": "Dana", "content": "no timestamp"}
            ],
            "title": "Dana"
        }),
    );
    root.write_json(
        "comments_and_reactions/likes_and_reactions_1.json",
        &json!([
            {"timestamp": 20, "title": "Me liked a post.", "data": [{"reaction": {"reaction": "LIKE", "actor": "Me"}}]},
            {"timestamp": 21, "data": []}
        ]),
    );

    let store = open_temp_store(&tmp.path().join("data"));
    let summary = import_completed(&store, &root.path);
    assert_eq!(summary.message_count, 1);
    assert_eq!(summary.like_count, 1);
    assert_eq!(summary.error_count, 2);
}

#[test]
fn malformed_profile_photo_history_is_counted() {
    let tmp = tempdir().expect("temp");
    let export = tmp.path().join("facebook-me");
    let root = ActivityRoot::new(export.join("your_facebook_activity"));
    root.thread_page("inbox", "bob_1", 1, "Bob", &["Bob", "Me"], [1]);
    let info = ActivityRoot::new(export.join("personal_information/profile_information"));
    info.write_json(
        "profile_information.json",
        &json!({"profile_v2": {"name": {"full_name": "Me"}}}),
    );
    info.write_raw("profile_update_history.json", "{ not json");

    let store = open_temp_store(&tmp.path().join("data"));
    let summary = import_completed(&store, &root.path);
    assert!(summary.profile_imported);
    assert_eq!(summary.error_count, 1);
    assert_eq!(count(&store, "profile_photos"), 0);
}
