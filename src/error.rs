use std::fmt;

/// Result type for Plutus operations
pub type Result<T> = std::result::Result<T, PlutusError>;

/// Main error type for the Plutus library
#[derive(Debug, Clone)]
pub enum PlutusError {
    /// Invalid dimensions for operations
    DimensionMismatch {
        expected: String,
        actual: String,
    },

    /// Invalid parameter value
    InvalidParameter {
        name: String,
        reason: String,
    },

    /// IO errors (file operations)
    IoError(String),

    /// Serialization/deserialization errors
    SerializationError(String),

    /// Empty buffer or container
    EmptyBuffer(String),
}

impl fmt::Display for PlutusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlutusError::DimensionMismatch { expected, actual } => {
                write!(f, "Dimension mismatch: expected {}, got {}", expected, actual)
            }
            PlutusError::InvalidParameter { name, reason } => {
                write!(f, "Invalid parameter '{}': {}", name, reason)
            }
            PlutusError::IoError(msg) => write!(f, "IO error: {}", msg),
            PlutusError::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
            PlutusError::EmptyBuffer(msg) => write!(f, "Empty buffer: {}", msg),
        }
    }
}

impl std::error::Error for PlutusError {}

// Conversion from std::io::Error
impl From<std::io::Error> for PlutusError {
    fn from(err: std::io::Error) -> Self {
        PlutusError::IoError(err.to_string())
    }
}

// Conversion from bincode::Error
impl From<bincode::Error> for PlutusError {
    fn from(err: bincode::Error) -> Self {
        PlutusError::SerializationError(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for PlutusError {
    fn from(err: serde_json::Error) -> Self {
        PlutusError::SerializationError(err.to_string())
    }
}

// Helper functions for common error patterns
impl PlutusError {
    pub fn dimension_mismatch<S: Into<String>>(expected: S, actual: S) -> Self {
        PlutusError::DimensionMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    pub fn invalid_parameter<S: Into<String>>(name: S, reason: S) -> Self {
        PlutusError::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }
}
