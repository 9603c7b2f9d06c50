use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreadSummary {
    pub id: i64,
    pub slug: String,
    pub path: String,
    pub category: String,
    pub title: String,
    pub is_group_chat: bool,
    pub message_count: i64,
    pub first_message_at: Option<i64>,
    pub last_message_at: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageRow {
    pub id: i64,
    pub thread_id: i64,
    pub sender_name: String,
    pub timestamp_ms: i64,
    pub content: Option<String>,
    pub has_photos: bool,
    pub has_videos: bool,
    pub has_audio: bool,
    pub has_gifs: bool,
    pub has_files: bool,
    pub has_share: bool,
    pub share_url: Option<String>,
    pub reaction_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReactionRow {
    pub id: i64,
    pub message_id: i64,
    pub emoji: String,
    pub actor_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostRow {
    pub id: i64,
    pub source: String,
    pub timestamp: i64,
    pub title: Option<String>,
    pub content: Option<String>,
    pub external_url: Option<String>,
    pub group_name: Option<String>,
    pub has_media: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LikeRow {
    pub id: i64,
    pub timestamp: i64,
    pub title: String,
    pub reaction_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentRow {
    pub id: i64,
    pub timestamp: i64,
    pub title: Option<String>,
    pub comment_text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactionTypeCount {
    pub reaction_type: String,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportStateRow {
    pub import_date: i64,
    pub export_root: String,
    pub thread_count: i64,
    pub message_count: i64,
    pub post_count: i64,
    pub like_count: i64,
    pub comment_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchiveStats {
    pub threads: i64,
    pub messages: i64,
    pub reactions: i64,
    pub posts: i64,
    pub likes: i64,
    pub comments: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkExperience {
    pub employer: String,
    pub title: Option<String>,
    pub location: Option<String>,
    pub period: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Education {
    pub school: String,
    pub degree: Option<String>,
    pub field: Option<String>,
    pub school_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreenName {
    pub service: String,
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FamilyMember {
    pub name: String,
    pub relation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfilePhoto {
    pub timestamp: i64,
    /// Absolute path inside the photo asset directory.
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    pub username: String,
    pub about_me: String,
    pub birthday: String,
    pub city: String,
    pub hometown: String,
    pub gender: String,
    pub friends_count: i64,
    pub followers_count: i64,
    pub work: Vec<WorkExperience>,
    pub education: Vec<Education>,
    pub websites: Vec<String>,
    pub screen_names: Vec<ScreenName>,
    pub family: Vec<FamilyMember>,
    pub photos: Vec<ProfilePhoto>,
}
