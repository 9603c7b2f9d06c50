//! Append-only JSON-lines log of control-surface events (import started,
//! finished, failed, cancelled, store erased).

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

use chrono::Utc;
use serde::Serialize;

const LOG_FILE: &str = "diagnostics.log";
const MAX_LOG_BYTES: u64 = 1_500_000;
const REDACTED: &str = "[redacted]";

#[derive(Debug, Serialize)]
pub struct LogEvent {
    pub ts: String,
    pub kind: String,
    pub message: String,
}

/// Export folders live under the user's home and carry their real name.
fn sanitize(input: &str) -> String {
    input
        .split_whitespace()
        .map(|token| {
            let home_path = ["/Users/", "/home/", "C:\\Users\\", "~/"]
                .iter()
                .any(|prefix| token.contains(prefix));
            let digits = token.chars().filter(|c| c.is_ascii_digit()).count();
            if home_path || digits >= 10 {
                REDACTED.to_string()
            } else {
                token.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn log_event(log_dir: &Path, kind: &str, message: &str) -> io::Result<()> {
    fs::create_dir_all(log_dir)?;
    let path = log_dir.join(LOG_FILE);
    trim_log(&path)?;
    let event = LogEvent {
        ts: Utc::now().to_rfc3339(),
        kind: kind.to_string(),
        message: sanitize(message),
    };
    let line = serde_json::to_string(&event)?;
    let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
    writeln!(file, "{}", line)?;
    Ok(())
}

/// Keeps the newest half once the file outgrows the cap.
fn trim_log(path: &Path) -> io::Result<()> {
    if !path.exists() {
        return Ok(());
    }
    if fs::metadata(path)?.len() <= MAX_LOG_BYTES {
        return Ok(());
    }
    let data = fs::read(path)?;
    let mut keep_from = data.len().saturating_sub((MAX_LOG_BYTES / 2) as usize);
    // start on a line boundary
    if let Some(offset) = data[keep_from..].iter().position(|b| *b == b'\n') {
        keep_from += offset + 1;
    }
    fs::write(path, &data[keep_from..])?;
    Ok(())
}
