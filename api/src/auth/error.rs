use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing credentials")]
    MissingCredentials,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error(transparent)]
    Storage(#[from] murmur_db::storage::StoreError),
}
