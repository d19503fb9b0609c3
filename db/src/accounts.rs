//! Account creation and login resolution.
//!
//! The store only enforces uniqueness; picking a free nickname happens here.
//! A candidate is used as-is when free, otherwise `candidate2`,
//! `candidate3`, ... are probed in order and the first free one wins. The
//! suffix never pushes a nickname past [`NICKNAME_MAX_LEN`]: the candidate is
//! cut short to make room for it. Probing and inserting are separate steps, so two callers can pick the same free
//! nickname at once. The store's unique constraint rejects the slower one,
//! which then probes again from the start.

use chrono::{DateTime, Utc};
use murmur_common::params::{NICKNAME_MAX_LEN, VerifiedIdentity};
use tracing::{debug, info, instrument, warn};

use crate::{
    models::DbUser,
    storage::{StoreError, UniqueField, UserStore},
};

/// How many times a lost insert race is retried before giving up.
const MAX_NICKNAME_ROUNDS: usize = 8;

/// Find the first free nickname for `candidate`, following the suffix rule
/// described in the module docs.
pub async fn unique_nickname<S>(stg: &S, candidate: &str) -> Result<String, StoreError>
where
    S: UserStore + Sync + ?Sized,
{
    let candidate: String = candidate.chars().take(NICKNAME_MAX_LEN).collect();
    if !stg.nickname_taken(&candidate).await? {
        return Ok(candidate);
    }

    let mut suffix: u64 = 2;
    loop {
        let nickname = with_suffix(&candidate, suffix);
        if !stg.nickname_taken(&nickname).await? {
            return Ok(nickname);
        }
        suffix += 1;
    }
}

fn with_suffix(candidate: &str, suffix: u64) -> String {
    let suffix = suffix.to_string();
    let base: String = candidate
        .chars()
        .take(NICKNAME_MAX_LEN.saturating_sub(suffix.len()))
        .collect();
    format!("{base}{suffix}")
}

/// Create a user, rewriting `nickname` if it is taken. Fails only on a taken
/// email or a store failure. The user is stored together with its bootstrap
/// self-follow.
#[instrument(skip(stg))]
pub async fn create_user<S>(
    stg: &S,
    nickname: &str,
    email: &str,
    now: DateTime<Utc>,
) -> Result<DbUser, StoreError>
where
    S: UserStore + Sync + ?Sized,
{
    for round in 0..MAX_NICKNAME_ROUNDS {
        let free = unique_nickname(stg, nickname).await?;

        match stg.insert_user(DbUser::new(free, email, now)).await {
            Err(StoreError::Conflict {
                field: UniqueField::Nickname,
            }) => {
                debug!(round, "Nickname claimed concurrently, probing again");
            }
            Ok(user) => {
                info!(id = %user.id, nickname = %user.nickname, "Created user");
                return Ok(user);
            }
            Err(e) => return Err(e),
        }
    }

    warn!("Gave up finding a free nickname");
    Err(StoreError::conflict(UniqueField::Nickname))
}

/// What a login resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    /// The email belonged to an existing user.
    Existing(DbUser),

    /// No user had the email; one was created.
    Created(DbUser),
}

impl LoginOutcome {
    pub fn user(&self) -> &DbUser {
        match self {
            LoginOutcome::Existing(user) | LoginOutcome::Created(user) => user,
        }
    }

    pub fn into_user(self) -> DbUser {
        match self {
            LoginOutcome::Existing(user) | LoginOutcome::Created(user) => user,
        }
    }

    pub fn is_created(&self) -> bool {
        matches!(self, LoginOutcome::Created(_))
    }
}

/// Resolve an identity verified by the external provider to a user, creating
/// the account on first login. Existing users get their `last_seen` bumped.
#[instrument(skip(stg, identity), fields(email = %identity.email))]
pub async fn resolve_login<S>(
    stg: &S,
    identity: &VerifiedIdentity,
    now: DateTime<Utc>,
) -> Result<LoginOutcome, StoreError>
where
    S: UserStore + Sync + ?Sized,
{
    if let Some(mut user) = stg.find_by_email(&identity.email).await? {
        stg.touch_last_seen(&user.id, now).await?;
        user.last_seen = now;
        return Ok(LoginOutcome::Existing(user));
    }

    match create_user(stg, &identity.nickname, &identity.email, now).await {
        Ok(user) => Ok(LoginOutcome::Created(user)),
        // A concurrent first login for the same email won the insert.
        Err(StoreError::Conflict {
            field: UniqueField::Email,
        }) => stg
            .find_by_email(&identity.email)
            .await?
            .map(LoginOutcome::Existing)
            .ok_or(StoreError::conflict(UniqueField::Email)),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use std::{
        collections::BTreeSet,
        sync::{
            Arc,
            atomic::{AtomicUsize, Ordering},
        },
    };

    use async_trait::async_trait;
    use murmur_common::params::ProfileUpdate;

    use super::*;
    use crate::{
        models::{DbUlid, NewDbPost},
        storage::{FollowStore, MemoryStorage, PostStore},
    };

    fn identity(email: &str, nickname: &str) -> VerifiedIdentity {
        VerifiedIdentity {
            email: email.into(),
            nickname: nickname.into(),
        }
    }

    #[tokio::test]
    async fn free_nickname_is_kept() {
        let stg = MemoryStorage::new();
        let user = create_user(&stg, "john", "j@x.com", Utc::now())
            .await
            .unwrap();
        assert_eq!(user.nickname, "john");
    }

    #[tokio::test]
    async fn taken_nickname_gets_numbered() {
        let stg = MemoryStorage::new();
        let now = Utc::now();

        create_user(&stg, "john", "j1@x.com", now).await.unwrap();
        let second = create_user(&stg, "john", "j2@x.com", now).await.unwrap();
        let third = create_user(&stg, "john", "j3@x.com", now).await.unwrap();

        assert_eq!(second.nickname, "john2");
        assert_eq!(third.nickname, "john3");
    }

    #[tokio::test]
    async fn suffix_skips_taken_numbers() {
        let stg = MemoryStorage::new();
        let now = Utc::now();

        create_user(&stg, "mike", "m1@x.com", now).await.unwrap();
        create_user(&stg, "mike2", "m2@x.com", now).await.unwrap();
        create_user(&stg, "mike3", "m3@x.com", now).await.unwrap();

        assert_eq!(unique_nickname(&stg, "mike").await.unwrap(), "mike4");
    }

    #[tokio::test]
    async fn suffix_is_appended_to_the_original_candidate() {
        let stg = MemoryStorage::new();
        let now = Utc::now();

        create_user(&stg, "bob", "b1@x.com", now).await.unwrap();
        create_user(&stg, "bob", "b2@x.com", now).await.unwrap();

        // Not "bob22" or "bob23".
        assert_eq!(unique_nickname(&stg, "bob").await.unwrap(), "bob3");
    }

    #[tokio::test]
    async fn suffix_keeps_long_nicknames_within_limit() {
        let stg = MemoryStorage::new();
        let now = Utc::now();
        let longest = "a".repeat(NICKNAME_MAX_LEN);

        let first = create_user(&stg, &longest, "a1@x.com", now).await.unwrap();
        let second = create_user(&stg, &longest, "a2@x.com", now).await.unwrap();

        assert_eq!(first.nickname, longest);
        assert_eq!(second.nickname.chars().count(), NICKNAME_MAX_LEN);
        assert_eq!(second.nickname, format!("{}2", "a".repeat(NICKNAME_MAX_LEN - 1)));
    }

    #[test]
    fn wider_suffixes_cut_more_of_the_candidate() {
        let longest = "b".repeat(NICKNAME_MAX_LEN);
        let nickname = with_suffix(&longest, 123);

        assert_eq!(nickname.chars().count(), NICKNAME_MAX_LEN);
        assert!(nickname.ends_with("b123"));
        assert_eq!(with_suffix("bob", 10), "bob10");
    }

    #[tokio::test]
    async fn taken_email_is_a_conflict() {
        let stg = MemoryStorage::new();
        let now = Utc::now();

        create_user(&stg, "john", "j@x.com", now).await.unwrap();
        let err = create_user(&stg, "someone", "j@x.com", now)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            StoreError::Conflict {
                field: UniqueField::Email
            }
        ));
    }

    #[tokio::test]
    async fn created_user_follows_and_sees_themselves() {
        let stg = MemoryStorage::new();
        let now = Utc::now();
        let john = create_user(&stg, "john", "j@x.com", now).await.unwrap();

        stg.create_post(NewDbPost::new(john.id, "one", now))
            .await
            .unwrap();
        stg.create_post(NewDbPost::new(john.id, "two", now))
            .await
            .unwrap();

        assert!(stg.is_following(&john.id, &john.id).await.unwrap());
        let timeline = stg.followed_timeline(&john.id, None).await.unwrap();
        assert_eq!(timeline.len(), 2);
    }

    #[tokio::test]
    async fn john_and_susan() {
        let stg = MemoryStorage::new();
        let now = Utc::now();

        let john = create_user(&stg, "john", "j@x.com", now).await.unwrap();
        assert!(stg.is_following(&john.id, &john.id).await.unwrap());

        let susan = create_user(&stg, "susan", "s@x.com", now).await.unwrap();
        stg.create_post(NewDbPost::new(susan.id, "hello", now))
            .await
            .unwrap();

        stg.follow(&john.id, &susan.id).await.unwrap();
        let timeline = stg.followed_timeline(&john.id, None).await.unwrap();
        let bodies: Vec<_> = timeline.iter().map(|p| p.body.as_str()).collect();
        assert_eq!(bodies, vec!["hello"]);

        stg.unfollow(&john.id, &susan.id).await.unwrap();
        assert!(
            stg.followed_timeline(&john.id, None)
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_signups_never_share_a_nickname() {
        let stg = Arc::new(MemoryStorage::new());
        let now = Utc::now();

        let a = tokio::spawn({
            let stg = Arc::clone(&stg);
            async move { create_user(&*stg, "mike", "m1@x.com", now).await }
        });
        let b = tokio::spawn({
            let stg = Arc::clone(&stg);
            async move { create_user(&*stg, "mike", "m2@x.com", now).await }
        });

        let a = a.await.unwrap().unwrap();
        let b = b.await.unwrap().unwrap();

        let nicknames: BTreeSet<_> = [a.nickname, b.nickname].into_iter().collect();
        assert_eq!(
            nicknames,
            BTreeSet::from(["mike".to_string(), "mike2".to_string()])
        );
    }

    /// Reports every nickname as free for the first `stale_probes` probes, as
    /// if another writer committed between probe and insert.
    struct StaleProbes {
        inner: MemoryStorage,
        stale_probes: AtomicUsize,
    }

    #[async_trait]
    impl UserStore for StaleProbes {
        async fn get_user(&self, id: &DbUlid) -> Result<Option<DbUser>, StoreError> {
            self.inner.get_user(id).await
        }

        async fn find_by_nickname(&self, nickname: &str) -> Result<Option<DbUser>, StoreError> {
            self.inner.find_by_nickname(nickname).await
        }

        async fn find_by_email(&self, email: &str) -> Result<Option<DbUser>, StoreError> {
            self.inner.find_by_email(email).await
        }

        async fn nickname_taken(&self, nickname: &str) -> Result<bool, StoreError> {
            let stale = self
                .stale_probes
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if stale {
                return Ok(false);
            }
            self.inner.nickname_taken(nickname).await
        }

        async fn insert_user(&self, user: DbUser) -> Result<DbUser, StoreError> {
            self.inner.insert_user(user).await
        }

        async fn update_profile(
            &self,
            id: &DbUlid,
            update: ProfileUpdate,
        ) -> Result<DbUser, StoreError> {
            self.inner.update_profile(id, update).await
        }

        async fn touch_last_seen(
            &self,
            id: &DbUlid,
            now: DateTime<Utc>,
        ) -> Result<(), StoreError> {
            self.inner.touch_last_seen(id, now).await
        }
    }

    #[tokio::test]
    async fn lost_insert_race_probes_again() {
        let stg = StaleProbes {
            inner: MemoryStorage::new(),
            stale_probes: AtomicUsize::new(0),
        };
        let now = Utc::now();

        create_user(&stg, "mike", "m1@x.com", now).await.unwrap();

        stg.stale_probes.store(1, Ordering::SeqCst);
        let second = create_user(&stg, "mike", "m2@x.com", now).await.unwrap();

        assert_eq!(second.nickname, "mike2");
    }

    #[tokio::test]
    async fn endless_races_surface_a_conflict() {
        let stg = StaleProbes {
            inner: MemoryStorage::new(),
            stale_probes: AtomicUsize::new(0),
        };
        let now = Utc::now();

        create_user(&stg, "mike", "m1@x.com", now).await.unwrap();

        stg.stale_probes.store(usize::MAX, Ordering::SeqCst);
        let err = create_user(&stg, "mike", "m2@x.com", now)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            StoreError::Conflict {
                field: UniqueField::Nickname
            }
        ));
    }

    #[tokio::test]
    async fn first_login_creates_account() {
        let stg = MemoryStorage::new();
        let outcome = resolve_login(&stg, &identity("j@x.com", "john"), Utc::now())
            .await
            .unwrap();

        assert!(outcome.is_created());
        assert_eq!(outcome.user().nickname, "john");
        assert!(
            stg.is_following(&outcome.user().id, &outcome.user().id)
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn repeat_login_finds_account_by_email() {
        let stg = MemoryStorage::new();
        let first = resolve_login(&stg, &identity("j@x.com", "john"), Utc::now())
            .await
            .unwrap()
            .into_user();

        let later = Utc::now() + chrono::Duration::minutes(5);
        let second = resolve_login(&stg, &identity("j@x.com", "whatever"), later)
            .await
            .unwrap();

        assert!(!second.is_created());
        assert_eq!(second.user().id, first.id);
        assert_eq!(second.user().nickname, "john");
        assert_eq!(second.user().last_seen, later);
        assert_eq!(
            stg.get_user(&first.id).await.unwrap().unwrap().last_seen,
            later
        );
    }

    #[tokio::test]
    async fn login_with_taken_nickname_gets_numbered() {
        let stg = MemoryStorage::new();
        resolve_login(&stg, &identity("a@x.com", "sam"), Utc::now())
            .await
            .unwrap();
        let outcome = resolve_login(&stg, &identity("b@x.com", "sam"), Utc::now())
            .await
            .unwrap();

        assert!(outcome.is_created());
        assert_eq!(outcome.user().nickname, "sam2");
    }
}
