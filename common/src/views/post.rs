use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Post {
    pub id: String,
    pub author_id: String,
    pub body: String,
    pub timestamp: DateTime<Utc>,
}
