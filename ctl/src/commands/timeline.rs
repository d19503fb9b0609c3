use std::collections::HashMap;

use clap::Parser;
use murmur_db::{
    models::DbUlid,
    storage::{PageRequest, PostStore, Storage, UserStore},
};

use super::user_by_nickname;

#[derive(Clone, Parser)]
pub struct TimelineParams {
    pub nickname: String,

    /// Show only this page. Without it the whole timeline is printed.
    #[clap(short, long)]
    pub page: Option<u64>,

    #[clap(long, default_value_t = 3)]
    pub per_page: u64,
}

/// One line per post, newest first: `<timestamp> <author>: <body>`.
pub async fn timeline(stg: &dyn Storage, params: TimelineParams) -> anyhow::Result<String> {
    let user = user_by_nickname(stg, &params.nickname).await?;
    let page = params
        .page
        .map(|page| PageRequest::new(page, params.per_page.max(1)));

    let posts = PostStore::followed_timeline(stg, &user.id, page).await?;

    let mut authors: HashMap<DbUlid, String> = HashMap::new();
    let mut lines = Vec::with_capacity(posts.len());
    for post in posts {
        if !authors.contains_key(&post.author_id) {
            let nickname = UserStore::get_user(stg, &post.author_id)
                .await?
                .map(|author| author.nickname)
                .unwrap_or_else(|| post.author_id.to_string());
            authors.insert(post.author_id, nickname);
        }

        lines.push(format!(
            "{} {}: {}",
            post.timestamp.to_rfc3339(),
            authors[&post.author_id],
            post.body
        ));
    }

    if lines.is_empty() {
        return Ok(format!("No posts on {}'s timeline", user.nickname));
    }
    Ok(lines.join("\n"))
}
