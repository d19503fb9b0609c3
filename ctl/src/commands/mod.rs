use anyhow::anyhow;
use murmur_db::{
    models::DbUser,
    storage::{Storage, UserStore},
};

mod create_user;
mod graph;
mod post;
mod timeline;

pub use create_user::*;
pub use graph::*;
pub use post::*;
pub use timeline::*;

async fn user_by_nickname(stg: &dyn Storage, nickname: &str) -> anyhow::Result<DbUser> {
    UserStore::find_by_nickname(stg, nickname)
        .await?
        .ok_or_else(|| anyhow!("No user with nickname {}", nickname))
}
