use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A user as seen by themselves.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct User {
    /// The unique identifier for this user.
    pub id: String,

    /// The user's unique display handle.
    pub nickname: String,

    /// The user's email address.
    pub email: String,

    pub about_me: Option<String>,

    /// Gravatar image for the user at 128 pixels.
    pub avatar_url: String,

    pub last_seen: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// A user as seen by other users.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Profile {
    pub id: String,
    pub nickname: String,
    pub about_me: Option<String>,
    pub avatar_url: String,
    pub last_seen: DateTime<Utc>,

    /// Number of users following this user, not counting the user themselves.
    pub followers: u64,

    /// Number of users this user follows, not counting the user themselves.
    pub following: u64,

    /// Whether the requesting user follows this user.
    pub is_following: bool,
}
