use std::{fmt, io::Write, str::FromStr};

use diesel::{
    deserialize::{self, FromSql, FromSqlRow},
    expression::AsExpression,
    pg::{Pg, PgValue},
    serialize::{self, IsNull, Output, ToSql},
    sql_types::Text,
};
use ulid::Ulid;

/// Primary key of every Murmur row: a ULID, stored as its 26-character text
/// form.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, AsExpression, FromSqlRow,
)]
#[diesel(sql_type = Text)]
pub struct DbUlid(Ulid);

impl DbUlid {
    pub fn new() -> Self {
        DbUlid(Ulid::new())
    }

    pub fn from_string(s: &str) -> Option<Self> {
        Ulid::from_string(s).ok().map(DbUlid)
    }

    pub fn inner(&self) -> &Ulid {
        &self.0
    }
}

impl Default for DbUlid {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DbUlid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for DbUlid {
    type Err = ulid::DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ulid::from_string(s).map(DbUlid)
    }
}

impl From<Ulid> for DbUlid {
    fn from(u: Ulid) -> Self {
        Self(u)
    }
}

impl From<DbUlid> for Ulid {
    fn from(d: DbUlid) -> Self {
        d.0
    }
}

impl From<DbUlid> for String {
    fn from(d: DbUlid) -> Self {
        d.0.to_string()
    }
}

impl ToSql<Text, Pg> for DbUlid {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
        out.write_all(self.0.to_string().as_bytes())?;
        Ok(IsNull::No)
    }
}

impl FromSql<Text, Pg> for DbUlid {
    fn from_sql(bytes: PgValue<'_>) -> deserialize::Result<Self> {
        let text = <String as FromSql<Text, Pg>>::from_sql(bytes)?;
        Ok(DbUlid(Ulid::from_string(&text)?))
    }
}
