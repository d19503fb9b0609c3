use thiserror::Error;

#[derive(Debug, Error)]
pub enum CallerError {
    #[error("Unauthorized: {reason}")]
    Unauthorized { reason: String },
}

impl CallerError {
    pub fn unauthorized(reason: Option<String>) -> Self {
        Self::Unauthorized {
            reason: reason.unwrap_or_else(|| "No reason provided".to_string()),
        }
    }
}

/// The signed-in user acting on a request.
///
/// Every operation receives the acting user explicitly; nothing reads the
/// caller from request-scoped state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    id: String,
    nickname: String,
}

impl Caller {
    pub fn new(id: impl Into<String>, nickname: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            nickname: nickname.into(),
        }
    }

    pub fn user_id(&self) -> &str {
        &self.id
    }

    pub fn nickname(&self) -> &str {
        &self.nickname
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn caller_exposes_id_and_nickname() {
        let caller = Caller::new("01HZX3K6T8W7Q2M5N4P9R0S1V2", "john");
        assert_eq!(caller.user_id(), "01HZX3K6T8W7Q2M5N4P9R0S1V2");
        assert_eq!(caller.nickname(), "john");
    }

    #[test]
    fn unauthorized_defaults_reason() {
        let err = CallerError::unauthorized(None);
        assert_eq!(err.to_string(), "Unauthorized: No reason provided");

        let err = CallerError::unauthorized(Some("session expired".into()));
        assert_eq!(err.to_string(), "Unauthorized: session expired");
    }
}
