//! Error types for csvstream

use thiserror::Error;

/// Result type alias for csvstream operations
pub type Result<T> = std::result::Result<T, CsvError>;

/// Errors that can occur while configuring or running a CSV tokenizer
#[derive(Debug, Error)]
pub enum CsvError {
    /// Invalid options: unknown newline variant or encoding, or colliding
    /// delimiter/quote/newline characters. Raised at construction time.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// Input could not be tokenized (e.g. text and byte chunks mixed in one session)
    #[error("Tokenization error: {0}")]
    TokenizationError(String),

    /// Operation not allowed in the current state (fed after end, or after a terminal error)
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// The row consumer is gone
    #[error("Sink closed: {0}")]
    SinkClosed(String),

    /// I/O failure in a reader adapter
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CsvError {
    /// True for errors raised while validating options
    pub fn is_configuration(&self) -> bool {
        matches!(self, CsvError::ConfigurationError(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = CsvError::ConfigurationError("delimiter and quote are both ','".to_string());
        assert_eq!(
            err.to_string(),
            "Configuration error: delimiter and quote are both ','"
        );
        assert!(err.is_configuration());
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "short read");
        let err: CsvError = io.into();
        assert!(matches!(err, CsvError::Io(_)));
        assert!(!err.is_configuration());
    }
}
