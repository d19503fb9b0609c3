use async_trait::async_trait;
use bb8::{Pool, PooledConnection};
use chrono::{DateTime, Utc};
use diesel::{
    AsChangeset, BoolExpressionMethods, ExpressionMethods, JoinOnDsl, OptionalExtension,
    QueryDsl, SelectableHelper, dsl::exists,
};
use diesel_async::{
    AsyncConnection, AsyncPgConnection, RunQueryDsl,
    pooled_connection::AsyncDieselConnectionManager, scoped_futures::ScopedFutureExt,
};
use murmur_common::params::ProfileUpdate;
use tracing::{debug, instrument};

use crate::{
    models::{DbFollow, DbPost, DbUlid, DbUser, NewDbPost},
    schema::{followers, posts, users},
    storage::{
        FollowOutcome, FollowStore, PageRequest, PostStore, Storage, StoreError, UnfollowOutcome,
        UserStore,
    },
};

type Manager = AsyncDieselConnectionManager<AsyncPgConnection>;

#[derive(AsChangeset)]
#[diesel(table_name = users)]
struct ProfileChangeset {
    nickname: Option<String>,
    about_me: Option<Option<String>>,
}

impl From<ProfileUpdate> for ProfileChangeset {
    fn from(update: ProfileUpdate) -> Self {
        Self {
            nickname: update.nickname,
            about_me: update.about_me,
        }
    }
}

fn window(page: Option<PageRequest>) -> (i64, i64) {
    match page {
        Some(page) => (
            i64::try_from(page.limit()).unwrap_or(i64::MAX),
            i64::try_from(page.offset()).unwrap_or(i64::MAX),
        ),
        None => (i64::MAX, 0),
    }
}

/// Store backed by Postgres through a bb8 pool of diesel-async connections.
/// Expects the tables from `db/schema.sql`.
#[derive(Clone)]
pub struct PostgresStorage {
    pool: Pool<Manager>,
}

impl PostgresStorage {
    pub async fn new(url: &str) -> Result<Self, StoreError> {
        let manager = Manager::new(url);
        let pool = Pool::builder()
            .build(manager)
            .await
            .map_err(|e| StoreError::Transient(e.to_string()))?;

        Ok(Self { pool })
    }

    async fn conn(&self) -> Result<PooledConnection<'_, Manager>, StoreError> {
        self.pool
            .get()
            .await
            .map_err(|e| StoreError::Transient(e.to_string()))
    }
}

#[async_trait]
impl Storage for PostgresStorage {
    async fn ping(&self) -> Result<(), StoreError> {
        let mut conn = self.conn().await?;
        diesel::sql_query("SELECT 1").execute(&mut conn).await?;
        Ok(())
    }
}

#[async_trait]
impl UserStore for PostgresStorage {
    async fn get_user(&self, id: &DbUlid) -> Result<Option<DbUser>, StoreError> {
        let mut conn = self.conn().await?;
        Ok(users::table
            .find(*id)
            .select(DbUser::as_select())
            .first(&mut conn)
            .await
            .optional()?)
    }

    async fn find_by_nickname(&self, nickname: &str) -> Result<Option<DbUser>, StoreError> {
        let mut conn = self.conn().await?;
        Ok(users::table
            .filter(users::nickname.eq(nickname))
            .select(DbUser::as_select())
            .first(&mut conn)
            .await
            .optional()?)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<DbUser>, StoreError> {
        let mut conn = self.conn().await?;
        Ok(users::table
            .filter(users::email.eq(email))
            .select(DbUser::as_select())
            .first(&mut conn)
            .await
            .optional()?)
    }

    async fn nickname_taken(&self, nickname: &str) -> Result<bool, StoreError> {
        let mut conn = self.conn().await?;
        Ok(
            diesel::select(exists(users::table.filter(users::nickname.eq(nickname))))
                .get_result(&mut conn)
                .await?,
        )
    }

    #[instrument(skip(self, user), fields(nickname = %user.nickname))]
    async fn insert_user(&self, user: DbUser) -> Result<DbUser, StoreError> {
        let mut conn = self.conn().await?;
        conn.transaction::<_, StoreError, _>(|conn| {
            async move {
                let created = diesel::insert_into(users::table)
                    .values(&user)
                    .returning(DbUser::as_returning())
                    .get_result(conn)
                    .await?;

                diesel::insert_into(followers::table)
                    .values(DbFollow::bootstrap(created.id))
                    .execute(conn)
                    .await?;

                debug!(id = %created.id, "Inserted user with bootstrap self-follow");
                Ok(created)
            }
            .scope_boxed()
        })
        .await
    }

    #[instrument(skip(self))]
    async fn update_profile(
        &self,
        id: &DbUlid,
        update: ProfileUpdate,
    ) -> Result<DbUser, StoreError> {
        let id = *id;
        let mut conn = self.conn().await?;

        if update.is_empty() {
            return users::table
                .find(id)
                .select(DbUser::as_select())
                .first(&mut conn)
                .await
                .map_err(StoreError::from);
        }

        let changes = ProfileChangeset::from(update);
        conn.transaction::<_, StoreError, _>(|conn| {
            async move {
                diesel::update(users::table.find(id))
                    .set(&changes)
                    .returning(DbUser::as_returning())
                    .get_result(conn)
                    .await
                    .optional()?
                    .ok_or(StoreError::NotFound)
            }
            .scope_boxed()
        })
        .await
    }

    async fn touch_last_seen(&self, id: &DbUlid, now: DateTime<Utc>) -> Result<(), StoreError> {
        let mut conn = self.conn().await?;
        let updated = diesel::update(users::table.find(*id))
            .set(users::last_seen.eq(now))
            .execute(&mut conn)
            .await?;

        if updated == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl FollowStore for PostgresStorage {
    #[instrument(skip(self))]
    async fn follow(
        &self,
        follower: &DbUlid,
        followed: &DbUlid,
    ) -> Result<FollowOutcome, StoreError> {
        let mut conn = self.conn().await?;
        let inserted = diesel::insert_into(followers::table)
            .values(DbFollow::new(*follower, *followed))
            .on_conflict_do_nothing()
            .execute(&mut conn)
            .await?;

        Ok(if inserted == 0 {
            FollowOutcome::NoOp
        } else {
            FollowOutcome::EdgeCreated
        })
    }

    #[instrument(skip(self))]
    async fn unfollow(
        &self,
        follower: &DbUlid,
        followed: &DbUlid,
    ) -> Result<UnfollowOutcome, StoreError> {
        let mut conn = self.conn().await?;
        let deleted = diesel::delete(followers::table.find((*follower, *followed)))
            .execute(&mut conn)
            .await?;

        Ok(if deleted == 0 {
            UnfollowOutcome::NoOp
        } else {
            UnfollowOutcome::EdgeRemoved
        })
    }

    async fn is_following(&self, follower: &DbUlid, followed: &DbUlid) -> Result<bool, StoreError> {
        let mut conn = self.conn().await?;
        Ok(
            diesel::select(exists(followers::table.find((*follower, *followed))))
                .get_result(&mut conn)
                .await?,
        )
    }

    async fn follower_count(&self, id: &DbUlid) -> Result<u64, StoreError> {
        let mut conn = self.conn().await?;
        let count: i64 = followers::table
            .filter(
                followers::followed_id
                    .eq(*id)
                    .and(followers::follower_id.ne(*id)),
            )
            .count()
            .get_result(&mut conn)
            .await?;
        Ok(count.max(0) as u64)
    }

    async fn following_count(&self, id: &DbUlid) -> Result<u64, StoreError> {
        let mut conn = self.conn().await?;
        let count: i64 = followers::table
            .filter(
                followers::follower_id
                    .eq(*id)
                    .and(followers::followed_id.ne(*id)),
            )
            .count()
            .get_result(&mut conn)
            .await?;
        Ok(count.max(0) as u64)
    }
}

#[async_trait]
impl PostStore for PostgresStorage {
    #[instrument(skip(self, post), fields(author_id = %post.author_id))]
    async fn create_post(&self, post: NewDbPost) -> Result<DbPost, StoreError> {
        let mut conn = self.conn().await?;
        Ok(diesel::insert_into(posts::table)
            .values(&post)
            .returning(DbPost::as_returning())
            .get_result(&mut conn)
            .await?)
    }

    async fn followed_timeline(
        &self,
        user: &DbUlid,
        page: Option<PageRequest>,
    ) -> Result<Vec<DbPost>, StoreError> {
        let (limit, offset) = window(page);
        let mut conn = self.conn().await?;
        Ok(posts::table
            .inner_join(followers::table.on(followers::followed_id.eq(posts::author_id)))
            .filter(followers::follower_id.eq(*user))
            .select(DbPost::as_select())
            .order((posts::timestamp.desc(), posts::seq.asc()))
            .limit(limit)
            .offset(offset)
            .load(&mut conn)
            .await?)
    }

    async fn posts_by(
        &self,
        author: &DbUlid,
        page: Option<PageRequest>,
    ) -> Result<Vec<DbPost>, StoreError> {
        let (limit, offset) = window(page);
        let mut conn = self.conn().await?;
        Ok(posts::table
            .filter(posts::author_id.eq(*author))
            .select(DbPost::as_select())
            .order((posts::timestamp.desc(), posts::seq.asc()))
            .limit(limit)
            .offset(offset)
            .load(&mut conn)
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unpaged_window_is_unbounded() {
        assert_eq!(window(None), (i64::MAX, 0));
    }

    #[test]
    fn paged_window_uses_offset() {
        assert_eq!(window(Some(PageRequest::new(3, 10))), (10, 20));
    }

    #[test]
    fn empty_update_has_no_changes() {
        let changes = ProfileChangeset::from(ProfileUpdate::default());
        assert!(changes.nickname.is_none());
        assert!(changes.about_me.is_none());
    }
}
