//! Profile data lives beside the activity root rather than inside it:
//! `personal_information/` and `connections/` are siblings of
//! `your_facebook_activity/`.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::{lenient_vec, loose_string, read_json, RawMedia};
use crate::error::CoreError;

#[derive(Debug, Clone, Deserialize)]
pub struct RawProfileFile {
    pub profile_v2: RawProfile,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawProfile {
    #[serde(default)]
    pub name: Option<RawProfileName>,
    #[serde(default)]
    pub birthday: Option<RawBirthday>,
    #[serde(default)]
    pub gender: Option<RawGender>,
    #[serde(default)]
    pub current_city: Option<RawNamedPlace>,
    #[serde(default)]
    pub hometown: Option<RawNamedPlace>,
    #[serde(default, deserialize_with = "lenient_vec")]
    pub family_members: Vec<RawFamilyMember>,
    #[serde(default, deserialize_with = "lenient_vec")]
    pub education_experiences: Vec<RawEducation>,
    #[serde(default, deserialize_with = "lenient_vec")]
    pub work_experiences: Vec<RawWork>,
    #[serde(default, deserialize_with = "lenient_vec")]
    pub websites: Vec<RawWebsite>,
    #[serde(default, deserialize_with = "lenient_vec")]
    pub screen_names: Vec<RawScreenName>,
    #[serde(default, deserialize_with = "loose_string")]
    pub username: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub about_me: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawProfileName {
    #[serde(default, deserialize_with = "loose_string")]
    pub full_name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawBirthday {
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub month: Option<u32>,
    #[serde(default)]
    pub day: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawGender {
    #[serde(default, deserialize_with = "loose_string")]
    pub gender_option: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawNamedPlace {
    #[serde(default, deserialize_with = "loose_string")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawFamilyMember {
    #[serde(default, deserialize_with = "loose_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub relation: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawEducation {
    #[serde(default, deserialize_with = "loose_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_vec")]
    pub concentrations: Vec<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub degree: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub school_type: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawWork {
    #[serde(default, deserialize_with = "loose_string")]
    pub employer: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub location: Option<String>,
    #[serde(default)]
    pub start_timestamp: Option<i64>,
    #[serde(default)]
    pub end_timestamp: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawWebsite {
    #[serde(default, deserialize_with = "loose_string")]
    pub address: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawScreenName {
    #[serde(default, deserialize_with = "loose_string")]
    pub service_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_vec")]
    pub names: Vec<RawNamedPlace>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawProfileUpdateHistory {
    #[serde(default, deserialize_with = "lenient_vec")]
    pub profile_updates_v2: Vec<RawProfileUpdate>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawProfileUpdate {
    #[serde(default)]
    pub timestamp: Option<i64>,
    #[serde(default, deserialize_with = "lenient_vec")]
    pub attachments: Vec<RawUpdateAttachment>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawUpdateAttachment {
    #[serde(default, deserialize_with = "lenient_vec")]
    pub data: Vec<RawUpdateAttachmentData>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawUpdateAttachmentData {
    #[serde(default)]
    pub media: Option<RawMedia>,
}

#[derive(Debug, Default, Deserialize)]
struct RawFriends {
    #[serde(default)]
    friends_v2: Vec<serde_json::Value>,
}

#[derive(Debug, Default, Deserialize)]
struct RawFollowers {
    #[serde(default)]
    followers_v3: Vec<serde_json::Value>,
}

/// Paths of the profile-related files for one export snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileSources {
    pub export_parent: PathBuf,
}

impl ProfileSources {
    /// `activity_root` is the `your_facebook_activity/` folder.
    pub fn for_activity_root(activity_root: &Path) -> Option<Self> {
        activity_root.parent().map(|parent| Self {
            export_parent: parent.to_path_buf(),
        })
    }

    fn profile_info_dir(&self) -> PathBuf {
        self.export_parent
            .join("personal_information")
            .join("profile_information")
    }

    pub fn profile_info(&self) -> PathBuf {
        self.profile_info_dir().join("profile_information.json")
    }

    pub fn update_history(&self) -> PathBuf {
        self.profile_info_dir().join("profile_update_history.json")
    }

    pub fn friends(&self) -> PathBuf {
        self.export_parent
            .join("connections")
            .join("friends")
            .join("your_friends.json")
    }

    pub fn followers(&self) -> PathBuf {
        self.export_parent
            .join("connections")
            .join("followers")
            .join("people_who_followed_you.json")
    }

    pub fn has_profile(&self) -> bool {
        self.profile_info().is_file()
    }

    /// Resolves a media `uri`, which is relative to the export parent.
    pub fn resolve_media(&self, uri: &str) -> PathBuf {
        self.export_parent.join(uri)
    }
}

pub fn decode_profile(path: &Path) -> Result<RawProfile, CoreError> {
    let file: RawProfileFile = read_json(path)?;
    Ok(file.profile_v2)
}

pub fn decode_update_history(path: &Path) -> Result<Vec<RawProfileUpdate>, CoreError> {
    let history: RawProfileUpdateHistory = read_json(path)?;
    Ok(history.profile_updates_v2)
}

/// Number of entries in `your_friends.json`; 0 when missing or unreadable.
pub fn count_friends(path: &Path) -> i64 {
    read_json::<RawFriends>(path)
        .map(|f| f.friends_v2.len() as i64)
        .unwrap_or(0)
}

pub fn count_followers(path: &Path) -> i64 {
    read_json::<RawFollowers>(path)
        .map(|f| f.followers_v3.len() as i64)
        .unwrap_or(0)
}
