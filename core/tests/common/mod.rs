#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use fb_history_core::importer::{ImportOutcome, ImportSummary};
use fb_history_core::{open_store, run_import, ArchiveLayout, CancelToken, ImportOptions, Store, StoreOptions};
use serde_json::{json, Value};

/// Writes a throw-away activity root (`your_facebook_activity/`).
pub struct ActivityRoot {
    pub path: PathBuf,
}

impl ActivityRoot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        fs::create_dir_all(&path).expect("activity root");
        Self { path }
    }

    pub fn write_json(&self, rel: &str, value: &Value) -> PathBuf {
        let path = self.path.join(rel);
        fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
        fs::write(&path, value.to_string()).expect("write json");
        path
    }

    pub fn write_raw(&self, rel: &str, body: &str) -> PathBuf {
        let path = self.path.join(rel);
        fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
        fs::write(&path, body).expect("write raw");
        path
    }

    /// One `message_<page>.json` of a thread; every message is sent by the first participant.
    pub fn thread_page<I>(&self, category_dir: &str, slug: &str, page: usize, title: &str, participants: &[&str], timestamps: I)
    where
        I: IntoIterator<Item = i64>,
    {
        let sender = participants.first().copied().unwrap_or("");
        let messages: Vec<Value> = timestamps
            .into_iter()
            .map(|ts| json!({"sender_name": sender, "timestamp_ms": ts, "content": format!("message {ts}")}))
            .collect();
        let participants: Vec<Value> = participants.iter().map(|p| json!({"name": p})).collect();
        self.write_json(
            &format!("messages/{category_dir}/{slug}/message_{page}.json"),
            &json!({
                "participants": participants,
                "messages": messages,
                "title": title,
                "thread_path": format!("{category_dir}/{slug}"),
            }),
        );
    }
}

pub fn open_temp_store(data_dir: &Path) -> Store {
    open_store(&ArchiveLayout::new(data_dir), &StoreOptions::default()).expect("open store")
}

pub fn import_completed(store: &Store, selected: &Path) -> ImportSummary {
    let outcome = run_import(store, selected, &ImportOptions::default(), &CancelToken::new(), |_| {})
        .expect("import");
    match outcome {
        ImportOutcome::Completed(summary) => summary,
        ImportOutcome::Cancelled => panic!("import unexpectedly cancelled"),
    }
}

pub fn count(store: &Store, table: &str) -> i64 {
    let conn = store.reader().expect("reader");
    conn.query_row(&format!("SELECT COUNT(1) FROM {table};"), [], |row| row.get(0))
        .expect("count")
}
