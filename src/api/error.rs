use thiserror::Error;

/// Failure modes of backend calls. Display strings double as the error
/// text shown on a record, so `Server` and `Rejected` render the backend's
/// message verbatim.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// The request never completed (DNS, connect, timeout, dropped body).
    #[error("request failed: {0}")]
    Network(String),
    /// The backend answered with a non-2xx status.
    #[error("{message}")]
    Server { status: u16, message: String },
    /// A 2xx response whose body reports `success: false`.
    #[error("{0}")]
    Rejected(String),
    /// The response body did not match the expected shape.
    #[error("unexpected response: {0}")]
    Decode(String),
}

impl ApiError {
    pub fn is_network(&self) -> bool {
        matches!(self, ApiError::Network(_))
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else {
            ApiError::Network(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejection_renders_backend_message_verbatim() {
        let err = ApiError::Rejected("disk full".to_string());
        assert_eq!(err.to_string(), "disk full");
    }

    #[test]
    fn server_error_renders_extracted_message() {
        let err = ApiError::Server {
            status: 500,
            message: "backend returned status 500".to_string(),
        };
        assert_eq!(err.to_string(), "backend returned status 500");
    }

    #[test]
    fn network_errors_are_flagged() {
        let err = ApiError::Network("connection refused".to_string());
        assert!(err.is_network());
        assert!(err.to_string().starts_with("request failed"));
    }
}
