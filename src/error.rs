use reqwest::StatusCode;
use thiserror::Error;

pub type PredictResult<T> = Result<T, PredictError>;
pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Error)]
pub enum PredictError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Prediction endpoint returned {status}")]
    Server {
        status: StatusCode,
        message: Option<String>,
    },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Invalid upload: {0}")]
    InvalidUpload(String),
}

impl PredictError {
    pub fn server(status: StatusCode, message: Option<String>) -> Self {
        Self::Server { status, message }
    }

    /// Text shown to the user when an analysis fails.
    pub fn user_message(&self) -> String {
        match self {
            PredictError::Network(_) => {
                "Error: Could not reach the prediction service".to_string()
            }
            PredictError::Server {
                message: Some(message),
                ..
            } => format!("Error: Prediction failed ({})", message),
            PredictError::InvalidUpload(_) => {
                "Error: The selected file could not be uploaded".to_string()
            }
            PredictError::Server { .. } | PredictError::InvalidResponse(_) => {
                "Error: Prediction failed".to_string()
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} must be a valid {expected}, got {value:?}")]
    InvalidValue {
        name: &'static str,
        expected: &'static str,
        value: String,
    },

    #[error("PREDICT_ENDPOINT is not a valid URL: {0}")]
    InvalidEndpoint(String),

    #[error("Cannot resolve bind address {0}")]
    UnresolvableHost(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_message_is_included_when_present() {
        let err = PredictError::server(
            StatusCode::UNPROCESSABLE_ENTITY,
            Some("cannot identify image file".into()),
        );
        assert_eq!(
            err.user_message(),
            "Error: Prediction failed (cannot identify image file)"
        );
    }

    #[test]
    fn bare_server_error_has_generic_message() {
        let err = PredictError::server(StatusCode::INTERNAL_SERVER_ERROR, None);
        assert_eq!(err.user_message(), "Error: Prediction failed");
        assert_eq!(
            err.to_string(),
            "Prediction endpoint returned 500 Internal Server Error"
        );
    }

    #[test]
    fn invalid_upload_is_not_reported_as_network_failure() {
        let err = PredictError::InvalidUpload("invalid mime".into());
        assert_eq!(
            err.user_message(),
            "Error: The selected file could not be uploaded"
        );
    }

    #[test]
    fn invalid_response_is_a_generic_failure() {
        let err = PredictError::InvalidResponse("expected value at line 1".into());
        assert_eq!(err.user_message(), "Error: Prediction failed");
    }
}
