use std::collections::HashSet;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Datelike, NaiveDate};
use rusqlite::params;
use tempfile::NamedTempFile;

use crate::db::Store;
use crate::encoding::{fix_encoding, fix_optional};
use crate::error::CoreError;
use crate::raw::profile::{
    count_followers, count_friends, decode_profile, decode_update_history, ProfileSources, RawProfile,
};

const MONTHS: [&str; 12] = [
    "January", "February", "March", "April", "May", "June", "July", "August", "September",
    "October", "November", "December",
];

#[derive(Debug, Clone, Copy, Default)]
pub(super) struct ProfileOutcome {
    pub imported: bool,
    pub failed_files: usize,
}

struct ProfileRow {
    name: String,
    username: String,
    about_me: String,
    birthday: String,
    city: String,
    hometown: String,
    gender: String,
    friends_count: i64,
    followers_count: i64,
    work: Vec<(String, Option<String>, Option<String>, Option<String>)>,
    education: Vec<(String, Option<String>, Option<String>, Option<String>)>,
    websites: Vec<String>,
    screen_names: Vec<(String, String)>,
    family: Vec<(String, String)>,
    photos: Vec<(i64, String)>,
}

/// Imports the profile of the first root whose export parent carries one.
pub(super) fn import_profile(store: &Store, roots: &[PathBuf]) -> Result<ProfileOutcome, CoreError> {
    let mut outcome = ProfileOutcome::default();
    let Some(sources) = roots
        .iter()
        .filter_map(|root| ProfileSources::for_activity_root(root))
        .find(ProfileSources::has_profile)
    else {
        tracing::debug!("no profile information in export");
        return Ok(outcome);
    };
    let profile_path = sources.profile_info();
    let raw = match decode_profile(&profile_path) {
        Ok(raw) => raw,
        Err(err) => {
            tracing::warn!(path = %profile_path.display(), error = %err, "skipping profile");
            outcome.failed_files += 1;
            return Ok(outcome);
        }
    };
    let (photos, failed_photos) = collect_photos(&sources, store.photos_dir());
    outcome.failed_files += failed_photos;
    let row = build_row(&raw, &sources, photos);
    store.write(|tx| {
        tx.execute(
            "INSERT OR REPLACE INTO profile
               (id, name, username, about_me, birthday, city, hometown, gender, friends_count, followers_count)
             VALUES (1, ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9);",
            params![
                row.name,
                row.username,
                row.about_me,
                row.birthday,
                row.city,
                row.hometown,
                row.gender,
                row.friends_count,
                row.followers_count,
            ],
        )?;
        tx.execute_batch(
            "DELETE FROM profile_work; DELETE FROM profile_education; DELETE FROM profile_websites;
             DELETE FROM profile_screen_names; DELETE FROM profile_family; DELETE FROM profile_photos;",
        )?;
        for (employer, title, location, period) in &row.work {
            tx.execute(
                "INSERT INTO profile_work (employer, title, location, period) VALUES (?1, ?2, ?3, ?4);",
                params![employer, title, location, period],
            )?;
        }
        for (school, degree, field, school_type) in &row.education {
            tx.execute(
                "INSERT INTO profile_education (school, degree, field, school_type) VALUES (?1, ?2, ?3, ?4);",
                params![school, degree, field, school_type],
            )?;
        }
        for address in &row.websites {
            tx.execute("INSERT INTO profile_websites (address) VALUES (?1);", params![address])?;
        }
        for (service, username) in &row.screen_names {
            tx.execute(
                "INSERT INTO profile_screen_names (service, username) VALUES (?1, ?2);",
                params![service, username],
            )?;
        }
        for (name, relation) in &row.family {
            tx.execute(
                "INSERT INTO profile_family (name, relation) VALUES (?1, ?2);",
                params![name, relation],
            )?;
        }
        for (timestamp, filename) in &row.photos {
            tx.execute(
                "INSERT INTO profile_photos (timestamp, filename) VALUES (?1, ?2);",
                params![timestamp, filename],
            )?;
        }
        Ok(())
    })?;
    tracing::info!(photos = row.photos.len(), "profile imported");
    outcome.imported = true;
    Ok(outcome)
}

fn build_row(raw: &RawProfile, sources: &ProfileSources, photos: Vec<(i64, String)>) -> ProfileRow {
    let text = |value: Option<&str>| value.map(fix_encoding).unwrap_or_default();
    let birthday = raw
        .birthday
        .as_ref()
        .map(|b| format_birthday(b.year, b.month, b.day))
        .unwrap_or_default();
    ProfileRow {
        name: text(raw.name.as_ref().and_then(|n| n.full_name.as_deref())),
        username: text(raw.username.as_deref()),
        about_me: text(raw.about_me.as_deref()),
        birthday,
        city: text(raw.current_city.as_ref().and_then(|c| c.name.as_deref())),
        hometown: text(raw.hometown.as_ref().and_then(|c| c.name.as_deref())),
        gender: format_gender(raw.gender.as_ref().and_then(|g| g.gender_option.as_deref())),
        friends_count: count_friends(&sources.friends()),
        followers_count: count_followers(&sources.followers()),
        work: raw
            .work_experiences
            .iter()
            .map(|w| {
                (
                    text(w.employer.as_deref()),
                    fix_optional(w.title.as_deref()),
                    fix_optional(w.location.as_deref()),
                    format_work_period(w.start_timestamp, w.end_timestamp),
                )
            })
            .collect(),
        education: raw
            .education_experiences
            .iter()
            .map(|e| {
                (
                    text(e.name.as_deref()),
                    fix_optional(e.degree.as_deref()),
                    fix_optional(e.concentrations.first().map(String::as_str)),
                    fix_optional(e.school_type.as_deref()),
                )
            })
            .collect(),
        websites: raw
            .websites
            .iter()
            .filter_map(|w| fix_optional(w.address.as_deref()))
            .collect(),
        screen_names: raw
            .screen_names
            .iter()
            .filter_map(|s| {
                let service = fix_optional(s.service_name.as_deref())?;
                let name = fix_optional(s.names.first().and_then(|n| n.name.as_deref()))?;
                Some((service, name))
            })
            .collect(),
        family: raw
            .family_members
            .iter()
            .filter_map(|f| {
                Some((fix_optional(f.name.as_deref())?, fix_optional(f.relation.as_deref())?))
            })
            .collect(),
        photos,
    }
}

/// Copies profile pictures into `photos_dir` as `<timestamp>.<ext>`, newest first.
/// Copies profile photos into `photos_dir`, newest first.
///
/// The second value counts an unreadable history file and photos that could
/// not be copied. Photos whose source is absent from the export are skipped
/// without counting.
fn collect_photos(sources: &ProfileSources, photos_dir: &Path) -> (Vec<(i64, String)>, usize) {
    let history_path = sources.update_history();
    if !history_path.is_file() {
        return (Vec::new(), 0);
    }
    let updates = match decode_update_history(&history_path) {
        Ok(updates) => updates,
        Err(err) => {
            tracing::warn!(path = %history_path.display(), error = %err, "skipping profile photo history");
            return (Vec::new(), 1);
        }
    };
    let mut seen = HashSet::new();
    let mut photos = Vec::new();
    let mut failed = 0;
    for update in &updates {
        for datum in update.attachments.iter().flat_map(|a| a.data.iter()) {
            let Some(media) = datum.media.as_ref() else {
                continue;
            };
            let Some(uri) = media.uri.as_deref() else {
                continue;
            };
            let timestamp = media.creation_timestamp.or(update.timestamp).unwrap_or(0);
            if !seen.insert(timestamp) {
                continue;
            }
            let source = sources.resolve_media(uri);
            if !source.is_file() {
                continue;
            }
            let ext = source
                .extension()
                .and_then(|e| e.to_str())
                .filter(|e| !e.is_empty())
                .unwrap_or("jpg");
            let filename = format!("{timestamp}.{ext}");
            let dest = photos_dir.join(&filename);
            if !dest.exists() {
                if let Err(err) = copy_atomic(&source, &dest, photos_dir) {
                    tracing::warn!(path = %source.display(), error = %err, "profile photo copy failed");
                    failed += 1;
                    continue;
                }
            }
            photos.push((timestamp, filename));
        }
    }
    photos.sort_by(|a, b| b.0.cmp(&a.0));
    (photos, failed)
}

fn copy_atomic(source: &Path, dest: &Path, dir: &Path) -> Result<(), CoreError> {
    let mut input = File::open(source)?;
    let mut temp = NamedTempFile::new_in(dir)?;
    io::copy(&mut input, temp.as_file_mut())?;
    temp.persist(dest).map_err(|e| CoreError::Io(e.error))?;
    Ok(())
}

/// "April 2, 1990". Invalid dates with all parts present are spelled out as-is.
pub fn format_birthday(year: Option<i32>, month: Option<u32>, day: Option<u32>) -> String {
    let (Some(year), Some(month), Some(day)) = (year, month, day) else {
        return String::new();
    };
    match NaiveDate::from_ymd_opt(year, month, day) {
        Some(date) => date.format("%B %-d, %Y").to_string(),
        None => {
            let month_name = (1..=12)
                .contains(&month)
                .then(|| MONTHS[month as usize - 1].to_string())
                .unwrap_or_else(|| month.to_string());
            format!("{month_name} {day}, {year}")
        }
    }
}

pub fn format_gender(raw: Option<&str>) -> String {
    match raw {
        Some(value) if value.eq_ignore_ascii_case("male") => "Male".to_string(),
        Some(value) if value.eq_ignore_ascii_case("female") => "Female".to_string(),
        Some(value) => fix_encoding(value),
        None => String::new(),
    }
}

/// "<start year> – <end year|present>" from unix seconds; zero means unset.
pub fn format_work_period(start: Option<i64>, end: Option<i64>) -> Option<String> {
    let year = |ts: Option<i64>| {
        ts.filter(|s| *s > 0)
            .and_then(|s| DateTime::from_timestamp(s, 0))
            .map(|dt| dt.year().to_string())
    };
    let mut parts = Vec::new();
    if let Some(start) = year(start) {
        parts.push(start);
    }
    match year(end) {
        Some(end) => parts.push(end),
        None if !parts.is_empty() => parts.push("present".to_string()),
        None => {}
    }
    (!parts.is_empty()).then(|| parts.join(" – "))
}
