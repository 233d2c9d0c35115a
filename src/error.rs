//! Error types for chainstate

use std::fmt;

#[derive(Debug, Clone)]
pub enum StateError {
    DatabaseError(String),
    SerializationError(String),
    IoError(String),
    ConfigError(String),
    TaskJoinError(String),
}

impl fmt::Display for StateError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            StateError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            StateError::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
            StateError::IoError(msg) => write!(f, "IO error: {}", msg),
            StateError::ConfigError(msg) => write!(f, "Config error: {}", msg),
            StateError::TaskJoinError(msg) => write!(f, "Task join error: {}", msg),
        }
    }
}

impl std::error::Error for StateError {}

impl From<std::io::Error> for StateError {
    fn from(err: std::io::Error) -> Self {
        StateError::IoError(err.to_string())
    }
}

/// Convenience alias used across the crate
pub type Result<T> = std::result::Result<T, StateError>;
