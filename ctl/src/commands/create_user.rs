use chrono::Utc;
use clap::Parser;
use murmur_common::params::{validate_email, validate_nickname};
use murmur_db::{accounts, storage::Storage};

#[derive(Clone, Parser)]
pub struct CreateUserParams {
    /// Preferred nickname. A numeric suffix is added when it is taken.
    #[clap(short, long)]
    pub nickname: String,

    #[clap(short, long)]
    pub email: String,
}

pub async fn create_user(
    stg: &dyn Storage,
    CreateUserParams { nickname, email }: CreateUserParams,
) -> anyhow::Result<String> {
    let nickname = validate_nickname(&nickname)?;
    let email = validate_email(&email)?;

    let user = accounts::create_user(stg, &nickname, &email, Utc::now()).await?;

    Ok(format!(
        "Created user {} with ID {}",
        user.nickname, user.id
    ))
}

#[cfg(test)]
mod tests {
    use murmur_db::storage::MemoryStorage;

    use super::*;

    fn params(nickname: &str, email: &str) -> CreateUserParams {
        CreateUserParams {
            nickname: nickname.into(),
            email: email.into(),
        }
    }

    #[tokio::test]
    async fn taken_nickname_is_suffixed() {
        let stg = MemoryStorage::new();

        let first = create_user(&stg, params("john", "john@example.com"))
            .await
            .unwrap();
        assert!(first.starts_with("Created user john with ID "));

        let second = create_user(&stg, params("john", "john@elsewhere.org"))
            .await
            .unwrap();
        assert!(second.starts_with("Created user john2 with ID "));
    }

    #[tokio::test]
    async fn duplicate_email_fails() {
        let stg = MemoryStorage::new();
        create_user(&stg, params("john", "john@example.com"))
            .await
            .unwrap();

        let err = create_user(&stg, params("johnny", "john@example.com"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("email"));
    }

    #[tokio::test]
    async fn invalid_input_is_rejected_before_the_store() {
        let stg = MemoryStorage::new();
        assert!(create_user(&stg, params("two words", "a@b.c")).await.is_err());
        assert!(create_user(&stg, params("fine", "not-an-email")).await.is_err());
    }
}
