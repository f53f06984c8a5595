use serde::{Deserialize, Serialize};

// =========================================================================
// Podcasts
// =========================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Podcast {
    pub id: i64,
    pub user_id: i64,
    pub podcast_title: String,
    pub podcast_description: String,
    pub audio_url: Option<String>,
    pub audio_storage_id: Option<String>,
    pub image_url: Option<String>,
    pub image_storage_id: Option<String>,
    pub author: String,
    pub author_id: String,
    pub author_image_url: String,
    pub voice_prompt: String,
    pub image_prompt: String,
    pub voice_type: String,
    pub audio_duration: f64,
    pub views: i64,
    pub podcast_type: Option<String>,
    /// Clerk ids of users who liked this podcast, in like order.
    pub likes: Vec<String>,
    pub like_count: i64,
    pub average_rating: Option<f64>,
    pub rating_count: i64,
    pub language: Option<String>,
    pub created_at: String,
}

impl Podcast {
    pub fn is_liked_by(&self, user_id: &str) -> bool {
        self.likes.iter().any(|id| id == user_id)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewPodcast {
    pub user_id: i64,
    pub podcast_title: String,
    pub podcast_description: String,
    pub audio_url: Option<String>,
    pub audio_storage_id: Option<String>,
    pub image_url: Option<String>,
    pub image_storage_id: Option<String>,
    pub author: String,
    pub author_id: String,
    pub author_image_url: String,
    pub voice_prompt: String,
    pub image_prompt: String,
    pub voice_type: String,
    pub audio_duration: f64,
    pub podcast_type: Option<String>,
    pub language: Option<String>,
}

/// Authoritative like state returned by the toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LikeStatus {
    pub liked: bool,
    pub like_count: i64,
}

// =========================================================================
// Users
// =========================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialLink {
    pub platform: String,
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub image_url: String,
    pub clerk_id: String,
    pub name: String,
    pub followers_count: i64,
    pub following_count: i64,
    pub bio: Option<String>,
    pub website: Option<String>,
    pub is_verified: bool,
    pub social_links: Vec<SocialLink>,
    pub is_admin: bool,
}

// =========================================================================
// Ratings & comments
// =========================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rating {
    pub id: i64,
    pub podcast_id: i64,
    pub user_id: String,
    pub rating: i32,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub podcast_id: i64,
    pub user_id: String,
    pub user_name: String,
    pub user_image_url: String,
    pub content: String,
    pub created_at: String,
}

// =========================================================================
// Notifications
// =========================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    Like,
    Comment,
    Follow,
    NewPodcast,
    System,
}

impl std::fmt::Display for NotificationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Like => write!(f, "like"),
            Self::Comment => write!(f, "comment"),
            Self::Follow => write!(f, "follow"),
            Self::NewPodcast => write!(f, "new_podcast"),
            Self::System => write!(f, "system"),
        }
    }
}

impl From<String> for NotificationType {
    fn from(s: String) -> Self {
        match s.as_str() {
            "like" => Self::Like,
            "comment" => Self::Comment,
            "follow" => Self::Follow,
            "new_podcast" => Self::NewPodcast,
            _ => Self::System,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: i64,
    pub user_id: String,
    pub creator_id: String,
    pub message: Option<String>,
    pub notification_type: NotificationType,
    pub podcast_id: Option<i64>,
    pub is_read: bool,
    pub created_at: String,
}

// =========================================================================
// Reports
// =========================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportType {
    Inappropriate,
    Copyright,
    Offensive,
    Misinformation,
    Other,
}

impl ReportType {
    pub const ALL: [ReportType; 5] = [
        Self::Inappropriate,
        Self::Copyright,
        Self::Offensive,
        Self::Misinformation,
        Self::Other,
    ];

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.to_string() == s)
    }
}

impl std::fmt::Display for ReportType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Inappropriate => write!(f, "inappropriate"),
            Self::Copyright => write!(f, "copyright"),
            Self::Offensive => write!(f, "offensive"),
            Self::Misinformation => write!(f, "misinformation"),
            Self::Other => write!(f, "other"),
        }
    }
}

impl From<String> for ReportType {
    fn from(s: String) -> Self {
        Self::parse(&s).unwrap_or(Self::Other)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    Pending,
    Reviewed,
    Resolved,
    Dismissed,
}

impl Default for ReportStatus {
    fn default() -> Self {
        Self::Pending
    }
}

impl std::fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Reviewed => write!(f, "reviewed"),
            Self::Resolved => write!(f, "resolved"),
            Self::Dismissed => write!(f, "dismissed"),
        }
    }
}

impl From<String> for ReportStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "pending" => Self::Pending,
            "reviewed" => Self::Reviewed,
            "resolved" => Self::Resolved,
            "dismissed" => Self::Dismissed,
            _ => Self::Pending,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewReport {
    pub podcast_id: i64,
    pub podcast_title: String,
    pub report_type: ReportType,
    pub details: Option<String>,
    pub contact_email: Option<String>,
    pub reported_by: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub id: i64,
    pub podcast_id: i64,
    pub podcast_title: String,
    pub report_type: ReportType,
    pub details: Option<String>,
    pub contact_email: Option<String>,
    pub reported_by: Option<String>,
    pub status: ReportStatus,
    pub reviewed_by: Option<String>,
    pub review_notes: Option<String>,
    pub created_at: String,
}

// =========================================================================
// Admin requests
// =========================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminRequestStatus {
    Pending,
    Approved,
    Rejected,
}

impl std::fmt::Display for AdminRequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Approved => write!(f, "approved"),
            Self::Rejected => write!(f, "rejected"),
        }
    }
}

impl From<String> for AdminRequestStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "approved" => Self::Approved,
            "rejected" => Self::Rejected,
            _ => Self::Pending,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminRequest {
    pub id: i64,
    pub user_id: String,
    pub reason: String,
    pub status: AdminRequestStatus,
    pub created_at: String,
    pub reviewed_at: Option<String>,
    pub reviewed_by: Option<String>,
    pub review_notes: Option<String>,
}

// =========================================================================
// Storage
// =========================================================================

#[derive(Debug, Clone)]
pub struct StoredFile {
    pub id: String,
    pub content_type: String,
    pub data: Vec<u8>,
    pub created_at: String,
}
