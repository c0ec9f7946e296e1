use thiserror::Error;

/// Errors raised while resolving a mood and gathering recommendations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RecommendError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("authentication error: {0}")]
    Authentication(String),
    #[error("api error{}: {message}", status_suffix(.status))]
    Api { message: String, status: Option<u16> },
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("library has {found} saved tracks, at least {required} are needed")]
    InsufficientLibrary { found: usize, required: usize },
    #[error("no matches found")]
    NoMatches,
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|code| format!(" ({code})")).unwrap_or_default()
}

impl RecommendError {
    pub fn api(message: impl Into<String>) -> Self {
        RecommendError::Api {
            message: message.into(),
            status: None,
        }
    }

    /// Whether the fallback chain may recover from this error by trying another strategy
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            RecommendError::Authentication(_)
                | RecommendError::Api { .. }
                | RecommendError::InsufficientLibrary { .. }
                | RecommendError::NoMatches
        )
    }
}

impl From<ureq::Error> for RecommendError {
    fn from(e: ureq::Error) -> Self {
        match e {
            ureq::Error::Status(401, response) => RecommendError::Authentication(format!(
                "{} rejected the access token",
                response.get_url()
            )),
            ureq::Error::Status(code, response) => RecommendError::Api {
                message: format!("{} returned {}", response.get_url(), response.status_text()),
                status: Some(code),
            },
            ureq::Error::Transport(transport) => RecommendError::api(transport.to_string()),
        }
    }
}

impl From<std::io::Error> for RecommendError {
    fn from(e: std::io::Error) -> Self {
        RecommendError::api(format!("failed to read response: {e}"))
    }
}

impl From<serde_json::Error> for RecommendError {
    fn from(e: serde_json::Error) -> Self {
        RecommendError::api(format!("failed to parse JSON response: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_display_includes_status() {
        let err = RecommendError::Api {
            message: "search failed".to_string(),
            status: Some(503),
        };
        assert_eq!(err.to_string(), "api error (503): search failed");
        assert_eq!(
            RecommendError::api("timeout").to_string(),
            "api error: timeout"
        );
    }

    #[test]
    fn test_validation_errors_are_not_recoverable() {
        assert!(!RecommendError::InvalidInput("tempo".to_string()).is_recoverable());
        assert!(!RecommendError::Configuration("mood".to_string()).is_recoverable());
        assert!(RecommendError::InsufficientLibrary { found: 3, required: 5 }.is_recoverable());
        assert!(RecommendError::Authentication("no token".to_string()).is_recoverable());
    }
}
