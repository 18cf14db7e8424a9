use thiserror::Error;

/// Application-level failure carrying the process exit code.
///
/// Exit codes:
/// - 2: invalid request or configuration
/// - 3: not enough data to run the forecast
/// - 4: data acquisition / generation failure
#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

/// Why a single model produced no forecast.
///
/// These never cross the orchestrator boundary as failures; they become an
/// absent entry in the bundle for that model only.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    #[error("insufficient data: need {required} samples, have {available}")]
    InsufficientData { required: usize, available: usize },

    #[error("model fit failed: {0}")]
    FitFailure(String),
}

impl ModelError {
    pub fn insufficient(required: usize, available: usize) -> Self {
        ModelError::InsufficientData {
            required,
            available,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_error_keeps_exit_code_and_message() {
        let err = AppError::new(3, "Insufficient data for AAPL.");
        assert_eq!(err.exit_code(), 3);
        assert_eq!(err.to_string(), "Insufficient data for AAPL.");
    }

    #[test]
    fn model_error_messages_name_the_shortfall() {
        let err = ModelError::insufficient(10, 0);
        assert_eq!(err.to_string(), "insufficient data: need 10 samples, have 0");
        let err = ModelError::FitFailure("non-finite loss".into());
        assert_eq!(err.to_string(), "model fit failed: non-finite loss");
    }
}
