//! Input parameters for the various functions within Murmur.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

mod auth;
pub use auth::*;

mod post;
pub use post::*;

mod user;
pub use user::*;

mod validate;
pub use validate::*;

/// Parameters for paging through a list of records. Pages are numbered from
/// one; a missing or zero page means the first page.
#[derive(Debug, Clone, Default, Deserialize, Serialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct PaginationParams {
    /// The page to return, starting at 1.
    pub page: Option<u64>,
}

impl PaginationParams {
    pub fn page(&self) -> u64 {
        self.page.unwrap_or(1).max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_defaults_to_first() {
        assert_eq!(PaginationParams::default().page(), 1);
        assert_eq!(PaginationParams { page: Some(0) }.page(), 1);
        assert_eq!(PaginationParams { page: Some(4) }.page(), 4);
    }
}
