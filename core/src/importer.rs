//! The import pipeline: discovery, erase, then one phase per entity family.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use chrono::Utc;
use rusqlite::params;
use serde::Serialize;

use crate::config::ImportOptions;
use crate::db::Store;
use crate::discovery::{find_activity_roots, group_threads};
use crate::error::CoreError;

#[path = "importer/activity.rs"]
mod activity;
#[path = "importer/messages.rs"]
mod messages;
#[path = "importer/profile.rs"]
mod profile;

pub use profile::{format_birthday, format_gender, format_work_period};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportPhase {
    #[default]
    Discovering,
    Messages,
    Posts,
    GroupPosts,
    Likes,
    Comments,
    Profile,
    Finishing,
    Done,
}

impl ImportPhase {
    pub fn label(self) -> &'static str {
        match self {
            ImportPhase::Discovering => "Discovering threads",
            ImportPhase::Messages => "Importing messages",
            ImportPhase::Posts => "Importing posts",
            ImportPhase::GroupPosts => "Importing group posts",
            ImportPhase::Likes => "Importing likes & reactions",
            ImportPhase::Comments => "Importing comments",
            ImportPhase::Profile => "Importing profile",
            ImportPhase::Finishing => "Finishing up",
            ImportPhase::Done => "Done",
        }
    }
}

/// Cumulative counters for one pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImportProgress {
    pub phase: ImportPhase,
    pub total_threads: usize,
    pub completed_threads: usize,
    pub total_messages: usize,
    pub total_posts: usize,
    pub total_likes: usize,
    pub total_comments: usize,
    /// Files that could not be read or decoded, plus records dropped from
    /// readable files.
    pub error_count: usize,
}

impl ImportProgress {
    pub fn overall_fraction(&self) -> f64 {
        match self.phase {
            ImportPhase::Discovering => 0.0,
            ImportPhase::Messages => {
                if self.total_threads == 0 {
                    return 0.05;
                }
                0.05 + 0.70 * self.completed_threads as f64 / self.total_threads as f64
            }
            ImportPhase::Posts => 0.75,
            ImportPhase::GroupPosts => 0.80,
            ImportPhase::Likes => 0.85,
            ImportPhase::Comments => 0.92,
            ImportPhase::Profile => 0.95,
            ImportPhase::Finishing => 0.98,
            ImportPhase::Done => 1.0,
        }
    }
}

/// Cooperative cancellation flag shared between the caller and the pipeline.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    /// Threads persisted with at least one message, not every discovered slug.
    pub thread_count: usize,
    pub message_count: usize,
    pub post_count: usize,
    pub like_count: usize,
    pub comment_count: usize,
    pub profile_imported: bool,
    pub error_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportOutcome {
    Completed(ImportSummary),
    Cancelled,
}

/// Runs the whole pipeline on the calling thread.
///
/// The store is erased once at least one activity root has been found, so a
/// cancelled run leaves a partial store rather than a mix of two imports.
/// `progress` may be called from the calling thread only, once per completed
/// thread group and once per activity root in the later phases.
pub fn run_import<F>(
    store: &Store,
    selected: &Path,
    options: &ImportOptions,
    cancel: &CancelToken,
    progress: F,
) -> Result<ImportOutcome, CoreError>
where
    F: Fn(&ImportProgress),
{
    options.validate()?;
    let mut state = ImportProgress::default();
    progress(&state);

    let roots = find_activity_roots(selected)?;
    tracing::info!(root = %selected.display(), roots = roots.len(), "activity roots found");
    store.erase()?;

    let groups = group_threads(&roots);
    state.total_threads = groups.len();
    progress(&state);

    if cancel.is_cancelled() {
        return Ok(cancelled(&state));
    }
    enter_phase(&mut state, ImportPhase::Messages, &progress);
    let mut thread_count = 0;
    let finished = messages::import_thread_groups(store, &groups, options.batch_size, cancel, |unit| {
        state.completed_threads += 1;
        state.total_messages += unit.messages;
        state.error_count += unit.failed_files + unit.skipped_records;
        if unit.messages > 0 {
            thread_count += 1;
        }
        progress(&state);
    })?;
    if !finished {
        return Ok(cancelled(&state));
    }

    let phases: [(ImportPhase, fn(&Store, &Path) -> Result<activity::PhaseTally, CoreError>); 4] = [
        (ImportPhase::Posts, activity::import_timeline_posts),
        (ImportPhase::GroupPosts, activity::import_group_posts),
        (ImportPhase::Likes, activity::import_likes),
        (ImportPhase::Comments, activity::import_comments),
    ];
    for (phase, import_root) in phases {
        if cancel.is_cancelled() {
            return Ok(cancelled(&state));
        }
        enter_phase(&mut state, phase, &progress);
        for root in &roots {
            let tally = import_root(store, root)?;
            match phase {
                ImportPhase::Posts | ImportPhase::GroupPosts => state.total_posts += tally.records,
                ImportPhase::Likes => state.total_likes += tally.records,
                _ => state.total_comments += tally.records,
            }
            state.error_count += tally.failed_files + tally.skipped_records;
            progress(&state);
        }
    }

    if cancel.is_cancelled() {
        return Ok(cancelled(&state));
    }
    enter_phase(&mut state, ImportPhase::Profile, &progress);
    let profile = profile::import_profile(store, &roots)?;
    state.error_count += profile.failed_files;

    if cancel.is_cancelled() {
        return Ok(cancelled(&state));
    }
    enter_phase(&mut state, ImportPhase::Finishing, &progress);
    let summary = ImportSummary {
        thread_count,
        message_count: state.total_messages,
        post_count: state.total_posts,
        like_count: state.total_likes,
        comment_count: state.total_comments,
        profile_imported: profile.imported,
        error_count: state.error_count,
    };
    write_import_state(store, selected, &summary)?;

    enter_phase(&mut state, ImportPhase::Done, &progress);
    tracing::info!(
        threads = summary.thread_count,
        messages = summary.message_count,
        posts = summary.post_count,
        likes = summary.like_count,
        comments = summary.comment_count,
        errors = summary.error_count,
        "import finished"
    );
    Ok(ImportOutcome::Completed(summary))
}

fn enter_phase<F>(state: &mut ImportProgress, phase: ImportPhase, progress: &F)
where
    F: Fn(&ImportProgress),
{
    state.phase = phase;
    tracing::info!(phase = phase.label(), "import phase");
    progress(state);
}

fn cancelled(state: &ImportProgress) -> ImportOutcome {
    tracing::info!(phase = state.phase.label(), "import cancelled");
    ImportOutcome::Cancelled
}

fn write_import_state(store: &Store, selected: &Path, summary: &ImportSummary) -> Result<(), CoreError> {
    let export_root = selected.display().to_string();
    store.write(|tx| {
        tx.execute(
            "INSERT OR REPLACE INTO import_state
               (id, import_date, export_root, thread_count, message_count, post_count, like_count, comment_count)
             VALUES (1, ?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                Utc::now().timestamp(),
                export_root,
                summary.thread_count as i64,
                summary.message_count as i64,
                summary.post_count as i64,
                summary.like_count as i64,
                summary.comment_count as i64,
            ],
        )?;
        Ok(())
    })
}

#[derive(Debug)]
pub enum ImportEvent {
    Progress(ImportProgress),
    /// Sent exactly once, after the last `Progress`.
    Finished(Result<ImportOutcome, String>),
}

/// A pipeline run on a background thread.
pub struct ImportSession {
    pub events: Receiver<ImportEvent>,
    cancel: CancelToken,
    handle: JoinHandle<()>,
}

impl ImportSession {
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Blocks until the worker thread exits.
    pub fn wait(self) -> Result<(), CoreError> {
        self.handle
            .join()
            .map_err(|_| CoreError::StoreUnavailable("import thread panicked".to_string()))
    }
}

pub fn spawn_import(store: Arc<Store>, selected: PathBuf, options: ImportOptions) -> ImportSession {
    let (tx, rx) = mpsc::channel();
    let cancel = CancelToken::new();
    let worker_cancel = cancel.clone();
    let handle = thread::spawn(move || {
        let progress_tx = tx.clone();
        let result = run_import(&store, &selected, &options, &worker_cancel, |p| {
            let _ = progress_tx.send(ImportEvent::Progress(p.clone()));
        });
        if let Err(err) = &result {
            tracing::error!(error = %err, "import failed");
        }
        let _ = tx.send(ImportEvent::Finished(result.map_err(|e| e.to_string())));
    });
    ImportSession {
        events: rx,
        cancel,
        handle,
    }
}
