use diesel::{Insertable, Queryable, Selectable, pg::Pg};

use crate::{models::DbUlid, schema::followers};

/// A directed follow edge: `follower_id` sees posts of `followed_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Queryable, Selectable, Insertable)]
#[diesel(table_name = followers, check_for_backend(Pg))]
pub struct DbFollow {
    pub follower_id: DbUlid,
    pub followed_id: DbUlid,
}

impl DbFollow {
    pub fn new(follower_id: DbUlid, followed_id: DbUlid) -> Self {
        Self {
            follower_id,
            followed_id,
        }
    }

    /// The edge every user holds to themselves from account creation on.
    pub fn bootstrap(user_id: DbUlid) -> Self {
        Self::new(user_id, user_id)
    }

    pub fn is_self_edge(&self) -> bool {
        self.follower_id == self.followed_id
    }
}
