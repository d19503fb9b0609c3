//! Output views for the various functions within Murmur.

use std::fmt::Debug;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

mod auth;
pub use auth::*;

mod graph;
pub use graph::*;

mod post;
pub use post::*;

mod user;
pub use user::*;

/// One page of a longer list of records.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct PaginatedList<T> {
    pub items: Vec<T>,

    /// The page these items belong to, starting at 1.
    pub page: u64,

    /// The page to request next. Present whenever this page came back full,
    /// so it may point at an empty page.
    pub next_page: Option<u64>,
}

impl<T> PaginatedList<T> {
    pub fn new(items: Vec<T>, page: u64, per_page: u64) -> Self {
        let next_page = (items.len() as u64 >= per_page && per_page > 0).then(|| page + 1);
        Self {
            items,
            page,
            next_page,
        }
    }
}

/// An error response for an API endpoint. This is used to return errors to the
/// client in a consistent format.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct ApiErrorResponse {
    /// An optional error code that can be used to identify the type of error
    /// that occurred.
    pub code: Option<String>,

    /// A human-readable message describing the error that occurred.
    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}
