use std::{fmt, sync::Arc};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use murmur_common::params::ProfileUpdate;
use thiserror::Error;

use crate::models::{DbPost, DbUlid, DbUser, NewDbPost};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStorage;
pub use postgres::PostgresStorage;

/// Database URL that selects the in-memory store.
pub const MEMORY_URL: &str = "memory://";

/// Columns carrying a uniqueness constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueField {
    Email,
    Nickname,
}

impl fmt::Display for UniqueField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UniqueField::Email => write!(f, "email"),
            UniqueField::Nickname => write!(f, "nickname"),
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Record not found")]
    NotFound,

    #[error("Conflict: {field} is already taken")]
    Conflict { field: UniqueField },

    /// The store could not be reached or the transaction could not complete.
    /// Retrying the whole operation may succeed.
    #[error("Store unavailable: {0}")]
    Transient(String),

    #[error("Query Error: {0}")]
    Query(DieselError),
}

impl StoreError {
    pub fn conflict(field: UniqueField) -> Self {
        Self::Conflict { field }
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Transient(_))
    }
}

impl From<DieselError> for StoreError {
    fn from(err: DieselError) -> Self {
        let mapped = match &err {
            DieselError::NotFound => Some(StoreError::NotFound),
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
                match info.constraint_name() {
                    Some(name) if name.contains("nickname") => {
                        Some(StoreError::conflict(UniqueField::Nickname))
                    }
                    Some(name) if name.contains("email") => {
                        Some(StoreError::conflict(UniqueField::Email))
                    }
                    _ => None,
                }
            }
            DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _) => {
                Some(StoreError::NotFound)
            }
            DieselError::DatabaseError(
                DatabaseErrorKind::ClosedConnection
                | DatabaseErrorKind::SerializationFailure
                | DatabaseErrorKind::UnableToSendCommand,
                _,
            ) => Some(StoreError::Transient(err.to_string())),
            _ => None,
        };

        match mapped {
            Some(mapped) => mapped,
            None => StoreError::Query(err),
        }
    }
}

/// Outcome of [`FollowStore::follow`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowOutcome {
    EdgeCreated,
    NoOp,
}

/// Outcome of [`FollowStore::unfollow`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnfollowOutcome {
    EdgeRemoved,
    NoOp,
}

/// A window into an ordered list of posts. Pages are numbered from one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub per_page: u64,
}

impl PageRequest {
    pub fn new(page: u64, per_page: u64) -> Self {
        Self {
            page: page.max(1),
            per_page,
        }
    }

    pub fn offset(&self) -> u64 {
        (self.page - 1).saturating_mul(self.per_page)
    }

    pub fn limit(&self) -> u64 {
        self.per_page
    }
}

#[async_trait]
pub trait Storage: UserStore + FollowStore + PostStore + Send + Sync + 'static {
    async fn ping(&self) -> Result<(), StoreError>;
}

#[async_trait]
pub trait UserStore {
    async fn get_user(&self, id: &DbUlid) -> Result<Option<DbUser>, StoreError>;

    async fn find_by_nickname(&self, nickname: &str) -> Result<Option<DbUser>, StoreError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<DbUser>, StoreError>;

    async fn nickname_taken(&self, nickname: &str) -> Result<bool, StoreError>;

    /// Insert a user together with its bootstrap self-follow edge, in one
    /// transaction. Fails with [`StoreError::Conflict`] when the email or the
    /// nickname is already taken; the nickname is not rewritten here, see
    /// [`crate::accounts::create_user`].
    async fn insert_user(&self, user: DbUser) -> Result<DbUser, StoreError>;

    /// Apply a profile edit. Setting a nickname held by a different user is a
    /// [`StoreError::Conflict`]; an empty edit returns the user unchanged.
    async fn update_profile(
        &self,
        id: &DbUlid,
        update: ProfileUpdate,
    ) -> Result<DbUser, StoreError>;

    async fn touch_last_seen(&self, id: &DbUlid, now: DateTime<Utc>) -> Result<(), StoreError>;
}

#[async_trait]
pub trait FollowStore {
    /// Create the edge `follower -> followed` unless it exists. Both users
    /// must exist. Self-edges are accepted.
    async fn follow(
        &self,
        follower: &DbUlid,
        followed: &DbUlid,
    ) -> Result<FollowOutcome, StoreError>;

    /// Remove the edge `follower -> followed` if present. The bootstrap
    /// self-edge gets no special treatment here.
    async fn unfollow(
        &self,
        follower: &DbUlid,
        followed: &DbUlid,
    ) -> Result<UnfollowOutcome, StoreError>;

    async fn is_following(&self, follower: &DbUlid, followed: &DbUlid) -> Result<bool, StoreError>;

    /// Users following `id`, without the self-edge.
    async fn follower_count(&self, id: &DbUlid) -> Result<u64, StoreError>;

    /// Users `id` follows, without the self-edge.
    async fn following_count(&self, id: &DbUlid) -> Result<u64, StoreError>;
}

#[async_trait]
pub trait PostStore {
    async fn create_post(&self, post: NewDbPost) -> Result<DbPost, StoreError>;

    /// Posts by every author `user` follows, the user included through the
    /// self-edge. Newest first, equal timestamps in insertion order. Computed
    /// fresh on each call; `None` returns the whole timeline.
    async fn followed_timeline(
        &self,
        user: &DbUlid,
        page: Option<PageRequest>,
    ) -> Result<Vec<DbPost>, StoreError>;

    /// Posts written by `author`, in timeline order.
    async fn posts_by(
        &self,
        author: &DbUlid,
        page: Option<PageRequest>,
    ) -> Result<Vec<DbPost>, StoreError>;
}

/// Open the store named by `url`: [`MEMORY_URL`] for the in-memory store,
/// anything else is handed to Postgres.
pub async fn connect(url: &str) -> Result<Arc<dyn Storage>, StoreError> {
    if url == MEMORY_URL {
        tracing::warn!("Using the in-memory store; nothing will be persisted");
        return Ok(Arc::new(MemoryStorage::new()));
    }

    Ok(Arc::new(PostgresStorage::new(url).await?))
}
