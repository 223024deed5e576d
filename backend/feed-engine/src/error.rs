use thiserror::Error;

pub type Result<T> = std::result::Result<T, EngineError>;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] envy::Error),

    #[error("Backend initialization failed: {0}")]
    BackendInit(String),
}

impl EngineError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        EngineError::InvalidInput(msg.into())
    }

    /// Malformed-input errors are the caller's fault; everything else is ours.
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            EngineError::InvalidInput(_) | EngineError::Serialization(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_caller_error_classification() {
        assert!(EngineError::invalid("bad vote").is_caller_error());

        let parse_err = serde_json::from_str::<u32>("-1").unwrap_err();
        assert!(EngineError::from(parse_err).is_caller_error());

        assert!(!EngineError::BackendInit("missing".to_string()).is_caller_error());
    }

    #[test]
    fn test_error_messages() {
        let err = EngineError::invalid("columns must be >= 1");
        assert_eq!(err.to_string(), "Invalid input: columns must be >= 1");
    }
}
