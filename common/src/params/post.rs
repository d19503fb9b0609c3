use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{ValidationError, validate_post_body};

/// Request body for publishing a post.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct CreatePostParams {
    /// The text of the post, 1 to 140 characters.
    pub body: String,
}

impl CreatePostParams {
    pub fn validate(&self) -> Result<String, ValidationError> {
        validate_post_body(&self.body)
    }
}
