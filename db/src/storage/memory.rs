use std::{
    collections::BTreeSet,
    sync::{Mutex, MutexGuard},
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use murmur_common::params::{EMAIL_MAX_LEN, NICKNAME_MAX_LEN, ProfileUpdate};
use tracing::instrument;

use crate::{
    models::{DbFollow, DbPost, DbUlid, DbUser, NewDbPost},
    storage::{
        FollowOutcome, FollowStore, PageRequest, PostStore, Storage, StoreError, UniqueField,
        UnfollowOutcome, UserStore,
    },
};

/// A store kept entirely in process memory.
///
/// Enforces the same constraints as the Postgres schema: unique nicknames and
/// emails, one edge per ordered pair, edges and posts only between existing
/// users. Every operation runs under one lock, which makes it atomic.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    tables: Mutex<Tables>,
}

#[derive(Debug, Default)]
struct Tables {
    users: Vec<DbUser>,
    /// Kept in insertion order.
    posts: Vec<DbPost>,
    followers: BTreeSet<DbFollow>,
    next_seq: i64,
}

impl Tables {
    fn user(&self, id: &DbUlid) -> Option<&DbUser> {
        self.users.iter().find(|u| u.id == *id)
    }

    fn user_mut(&mut self, id: &DbUlid) -> Option<&mut DbUser> {
        self.users.iter_mut().find(|u| u.id == *id)
    }

    fn nickname_holder(&self, nickname: &str) -> Option<&DbUser> {
        self.users.iter().find(|u| u.nickname == nickname)
    }

    fn count_edges(&self, matches: impl Fn(&DbFollow) -> bool) -> u64 {
        self.followers
            .iter()
            .filter(|edge| !edge.is_self_edge() && matches(edge))
            .count() as u64
    }

    /// Newest first; the sort is stable so equal timestamps keep insertion
    /// order.
    fn ordered_posts(
        &self,
        include: impl Fn(&DbPost) -> bool,
        page: Option<PageRequest>,
    ) -> Vec<DbPost> {
        let mut posts: Vec<DbPost> = self.posts.iter().filter(|p| include(p)).cloned().collect();
        posts.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

        match page {
            Some(page) => posts
                .into_iter()
                .skip(page.offset() as usize)
                .take(page.limit() as usize)
                .collect(),
            None => posts,
        }
    }
}

/// Rejects what a `VARCHAR(max)` column would, with the same error kind.
fn check_length(column: &str, value: &str, max: usize) -> Result<(), StoreError> {
    if value.chars().count() > max {
        return Err(StoreError::Query(DieselError::DatabaseError(
            DatabaseErrorKind::Unknown,
            Box::new(format!(
                "value too long for type character varying({max}) in column {column}"
            )),
        )));
    }
    Ok(())
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> Result<MutexGuard<'_, Tables>, StoreError> {
        self.tables
            .lock()
            .map_err(|_| StoreError::Transient("memory store lock poisoned".into()))
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn ping(&self) -> Result<(), StoreError> {
        self.tables().map(|_| ())
    }
}

#[async_trait]
impl UserStore for MemoryStorage {
    async fn get_user(&self, id: &DbUlid) -> Result<Option<DbUser>, StoreError> {
        Ok(self.tables()?.user(id).cloned())
    }

    async fn find_by_nickname(&self, nickname: &str) -> Result<Option<DbUser>, StoreError> {
        Ok(self.tables()?.nickname_holder(nickname).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<DbUser>, StoreError> {
        Ok(self
            .tables()?
            .users
            .iter()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn nickname_taken(&self, nickname: &str) -> Result<bool, StoreError> {
        Ok(self.tables()?.nickname_holder(nickname).is_some())
    }

    #[instrument(skip(self, user), fields(nickname = %user.nickname))]
    async fn insert_user(&self, user: DbUser) -> Result<DbUser, StoreError> {
        check_length("nickname", &user.nickname, NICKNAME_MAX_LEN)?;
        check_length("email", &user.email, EMAIL_MAX_LEN)?;

        let mut tables = self.tables()?;

        if tables.users.iter().any(|u| u.email == user.email) {
            return Err(StoreError::conflict(UniqueField::Email));
        }
        if tables.nickname_holder(&user.nickname).is_some() {
            return Err(StoreError::conflict(UniqueField::Nickname));
        }

        tables.followers.insert(DbFollow::bootstrap(user.id));
        tables.users.push(user.clone());

        Ok(user)
    }

    #[instrument(skip(self))]
    async fn update_profile(
        &self,
        id: &DbUlid,
        update: ProfileUpdate,
    ) -> Result<DbUser, StoreError> {
        if let Some(nickname) = &update.nickname {
            check_length("nickname", nickname, NICKNAME_MAX_LEN)?;
        }

        let mut tables = self.tables()?;

        if let Some(nickname) = &update.nickname {
            if tables
                .nickname_holder(nickname)
                .is_some_and(|holder| holder.id != *id)
            {
                return Err(StoreError::conflict(UniqueField::Nickname));
            }
        }

        let user = tables.user_mut(id).ok_or(StoreError::NotFound)?;
        if let Some(nickname) = update.nickname {
            user.nickname = nickname;
        }
        if let Some(about_me) = update.about_me {
            user.about_me = about_me;
        }

        Ok(user.clone())
    }

    async fn touch_last_seen(&self, id: &DbUlid, now: DateTime<Utc>) -> Result<(), StoreError> {
        let mut tables = self.tables()?;
        let user = tables.user_mut(id).ok_or(StoreError::NotFound)?;
        user.last_seen = now;
        Ok(())
    }
}

#[async_trait]
impl FollowStore for MemoryStorage {
    #[instrument(skip(self))]
    async fn follow(
        &self,
        follower: &DbUlid,
        followed: &DbUlid,
    ) -> Result<FollowOutcome, StoreError> {
        let mut tables = self.tables()?;

        if tables.user(follower).is_none() || tables.user(followed).is_none() {
            return Err(StoreError::NotFound);
        }

        if tables.followers.insert(DbFollow::new(*follower, *followed)) {
            Ok(FollowOutcome::EdgeCreated)
        } else {
            Ok(FollowOutcome::NoOp)
        }
    }

    #[instrument(skip(self))]
    async fn unfollow(
        &self,
        follower: &DbUlid,
        followed: &DbUlid,
    ) -> Result<UnfollowOutcome, StoreError> {
        let mut tables = self.tables()?;

        if tables.followers.remove(&DbFollow::new(*follower, *followed)) {
            Ok(UnfollowOutcome::EdgeRemoved)
        } else {
            Ok(UnfollowOutcome::NoOp)
        }
    }

    async fn is_following(&self, follower: &DbUlid, followed: &DbUlid) -> Result<bool, StoreError> {
        Ok(self
            .tables()?
            .followers
            .contains(&DbFollow::new(*follower, *followed)))
    }

    async fn follower_count(&self, id: &DbUlid) -> Result<u64, StoreError> {
        Ok(self.tables()?.count_edges(|edge| edge.followed_id == *id))
    }

    async fn following_count(&self, id: &DbUlid) -> Result<u64, StoreError> {
        Ok(self.tables()?.count_edges(|edge| edge.follower_id == *id))
    }
}

#[async_trait]
impl PostStore for MemoryStorage {
    #[instrument(skip(self, post), fields(author_id = %post.author_id))]
    async fn create_post(&self, post: NewDbPost) -> Result<DbPost, StoreError> {
        let mut tables = self.tables()?;

        if tables.user(&post.author_id).is_none() {
            return Err(StoreError::NotFound);
        }

        tables.next_seq += 1;
        let stored = DbPost {
            id: post.id,
            seq: tables.next_seq,
            author_id: post.author_id,
            body: post.body,
            timestamp: post.timestamp,
        };
        tables.posts.push(stored.clone());

        Ok(stored)
    }

    async fn followed_timeline(
        &self,
        user: &DbUlid,
        page: Option<PageRequest>,
    ) -> Result<Vec<DbPost>, StoreError> {
        let tables = self.tables()?;
        Ok(tables.ordered_posts(
            |post| {
                tables
                    .followers
                    .contains(&DbFollow::new(*user, post.author_id))
            },
            page,
        ))
    }

    async fn posts_by(
        &self,
        author: &DbUlid,
        page: Option<PageRequest>,
    ) -> Result<Vec<DbPost>, StoreError> {
        let tables = self.tables()?;
        Ok(tables.ordered_posts(|post| post.author_id == *author, page))
    }
}
