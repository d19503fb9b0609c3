pub mod follow;
pub mod post;
pub mod typed_ulid;
pub mod user;

pub use follow::*;
pub use post::*;
pub use typed_ulid::*;
pub use user::*;
