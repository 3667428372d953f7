//! Error types for SceneID client operations

/// Errors raised by the OAuth client and its stores.
///
/// Every failure reaches the immediate caller. The only condition absorbed
/// internally is a single `invalid_token` resource reply, which triggers one
/// refresh and one retry.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("environment error: {0}")]
    Environment(String),

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("authentication error: {0}")]
    Authentication(String),

    #[error("not implemented: {0}")]
    NotImplemented(String),

    #[error("transport error: {0}")]
    Transport(#[from] transport::TransportError),

    #[error("storage error: {0}")]
    Storage(String),
}

/// Result alias for client operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_category() {
        assert_eq!(
            Error::Protocol("state mismatch".into()).to_string(),
            "protocol error: state mismatch"
        );
        assert_eq!(
            Error::Authentication("not authenticated".into()).to_string(),
            "authentication error: not authenticated"
        );
    }

    #[test]
    fn transport_errors_convert_unchanged() {
        let err: Error = transport::TransportError::Timeout("30s elapsed".into()).into();
        assert!(matches!(
            err,
            Error::Transport(transport::TransportError::Timeout(_))
        ));
        assert!(err.to_string().contains("30s elapsed"));
    }
}
