use chrono::Utc;
use clap::Parser;
use murmur_common::params::validate_post_body;
use murmur_db::{
    models::NewDbPost,
    storage::{PostStore, Storage},
};

use super::user_by_nickname;

#[derive(Clone, Parser)]
pub struct PostParams {
    /// Nickname of the author.
    #[clap(short, long)]
    pub author: String,

    pub body: String,
}

pub async fn post(stg: &dyn Storage, params: PostParams) -> anyhow::Result<String> {
    let author = user_by_nickname(stg, &params.author).await?;
    let body = validate_post_body(&params.body)?;

    let post = PostStore::create_post(stg, NewDbPost::new(author.id, body, Utc::now())).await?;
    Ok(format!("Published post {} by {}", post.id, author.nickname))
}
