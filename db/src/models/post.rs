use chrono::{DateTime, Utc};
use diesel::{Insertable, Queryable, Selectable, pg::Pg};
use murmur_common::views::Post;

use crate::{models::DbUlid, schema::posts};

#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable)]
#[diesel(table_name = posts, check_for_backend(Pg))]
pub struct DbPost {
    pub id: DbUlid,

    /// Insertion order, assigned by the store. Breaks timestamp ties.
    pub seq: i64,

    pub author_id: DbUlid,
    pub body: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = posts)]
pub struct NewDbPost {
    pub id: DbUlid,
    pub author_id: DbUlid,
    pub body: String,
    pub timestamp: DateTime<Utc>,
}

impl NewDbPost {
    pub fn new(author_id: DbUlid, body: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: DbUlid::new(),
            author_id,
            body: body.into(),
            timestamp,
        }
    }
}

impl From<DbPost> for Post {
    fn from(value: DbPost) -> Self {
        Self {
            id: value.id.into(),
            author_id: value.author_id.into(),
            body: value.body,
            timestamp: value.timestamp,
        }
    }
}
