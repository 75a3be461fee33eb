use chatsync_protocol::TOKEN_NOT_VALID;

use crate::auth::SessionManager;
use crate::connection::ApiError;
use crate::error::ClientError;

/// What a failed API call means for the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// The server no longer accepts the access token
    AuthExpired,
    /// Anything else; the session and selection stay as they are
    Transient,
}

pub fn classify(error: &ApiError) -> Classification {
    match error.code() {
        Some(TOKEN_NOT_VALID) => Classification::AuthExpired,
        _ => Classification::Transient,
    }
}

/// Classify a failed call and apply its consequence.
///
/// `AuthExpired` terminates the session before returning.
pub(crate) fn escalate(session: &SessionManager, error: ApiError) -> ClientError {
    match classify(&error) {
        Classification::AuthExpired => {
            session.terminate();
            ClientError::SessionExpired
        }
        Classification::Transient => {
            tracing::warn!(error = %error, "Transient API failure");
            ClientError::Network(error)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(status: u16, code: Option<&str>) -> ApiError {
        ApiError::Status {
            status,
            code: code.map(String::from),
            detail: "detail".to_string(),
        }
    }

    #[test]
    fn test_token_not_valid_is_auth_expired() {
        assert_eq!(
            classify(&status(401, Some("token_not_valid"))),
            Classification::AuthExpired
        );
        // The code decides, not the status
        assert_eq!(
            classify(&status(403, Some("token_not_valid"))),
            Classification::AuthExpired
        );
    }

    #[test]
    fn test_other_failures_are_transient() {
        assert_eq!(classify(&status(401, None)), Classification::Transient);
        assert_eq!(
            classify(&status(401, Some("not_authenticated"))),
            Classification::Transient
        );
        assert_eq!(classify(&status(500, None)), Classification::Transient);
        assert_eq!(classify(&ApiError::Timeout), Classification::Transient);
        assert_eq!(
            classify(&ApiError::Decode("eof".to_string())),
            Classification::Transient
        );
    }
}
