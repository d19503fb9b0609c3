use std::fmt::Display;

use chrono::{DateTime, Utc};
use diesel::{Insertable, Queryable, Selectable, pg::Pg};
use murmur_common::{caller::Caller, views::User};
use sha2::{Digest, Sha256};

use crate::{models::DbUlid, schema::users};

/// Size of the avatar handed out with user views.
pub const DEFAULT_AVATAR_SIZE: u32 = 128;

#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable, Insertable)]
#[diesel(table_name = users, check_for_backend(Pg))]
pub struct DbUser {
    pub id: DbUlid,
    pub nickname: String,
    pub email: String,
    pub about_me: Option<String>,
    pub last_seen: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Display for DbUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "DbUser {{ id: {}, nickname: {}, email: {} }}",
            self.id, self.nickname, self.email
        )
    }
}

impl DbUser {
    /// A fresh user row, not yet stored. `last_seen` starts at creation time.
    pub fn new(nickname: impl Into<String>, email: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: DbUlid::new(),
            nickname: nickname.into(),
            email: email.into(),
            about_me: None,
            last_seen: now,
            created_at: now,
        }
    }

    pub fn avatar(&self, size: u32) -> String {
        avatar_url(&self.email, size)
    }

    pub fn to_caller(&self) -> Caller {
        Caller::new(self.id.to_string(), self.nickname.clone())
    }
}

/// Gravatar URL for an email address at the given pixel size.
pub fn avatar_url(email: &str, size: u32) -> String {
    let digest = Sha256::digest(email.trim().to_lowercase().as_bytes());
    format!(
        "https://www.gravatar.com/avatar/{}?d=mm&s={}",
        hex::encode(digest),
        size
    )
}

impl From<DbUser> for User {
    fn from(value: DbUser) -> Self {
        Self {
            avatar_url: value.avatar(DEFAULT_AVATAR_SIZE),
            id: value.id.into(),
            nickname: value.nickname,
            email: value.email,
            about_me: value.about_me,
            last_seen: value.last_seen,
            created_at: value.created_at,
        }
    }
}
