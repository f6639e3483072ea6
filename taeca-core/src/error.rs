//! # Error Types for TAECA
//!
//! Unified error handling across all TAECA crates.
//!
//! Every variant is recoverable: the caller decides whether to prompt
//! again. Nothing in the core is fatal.

use thiserror::Error;

/// Main error type for TAECA operations
#[derive(Error, Debug)]
pub enum TaecaError {
    /// Rule table for the requested (r, k) does not fit the capacity ceiling
    #[error("Rule table for r={r}, k={k} needs {required_bytes} bytes, ceiling is {ceiling}")]
    CapacityExceeded {
        r: u32,
        k: u32,
        required_bytes: u64,
        ceiling: u64,
    },

    /// Rule number is not in [0, k^table_size)
    #[error("Rule number does not fit in {table_size} base-{k} digits")]
    OutOfRange { table_size: usize, k: u32 },

    /// Malformed decimal input
    #[error("Invalid rule number literal: {0:?}")]
    InvalidDigitLiteral(String),

    /// Radius or state count below their minimum
    #[error("Invalid rule parameters: r={r}, k={k} (need r >= 1, k >= 2)")]
    InvalidRuleInfo { r: u32, k: u32 },

    /// Operation not valid in the current state
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Dependency graph node does not exist
    #[error("Resource {0} not found")]
    ResourceNotFound(u32),

    /// Dependency graph node holds a value of another type
    #[error("Resource {0} holds a value of a different type")]
    ResourceType(u32),

    /// Reading a node led back to itself
    #[error("Dependency cycle through resource {0}")]
    DependencyCycle(u32),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type for TAECA operations
pub type TaecaResult<T> = Result<T, TaecaError>;

impl TaecaError {
    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an invalid state error
    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState(msg.into())
    }

    /// True for the errors a UI should show and let the user retry
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            Self::CapacityExceeded { .. }
                | Self::OutOfRange { .. }
                | Self::InvalidDigitLiteral(_)
                | Self::InvalidRuleInfo { .. }
        )
    }
}

impl From<serde_json::Error> for TaecaError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_message() {
        let err = TaecaError::CapacityExceeded {
            r: 6,
            k: 6,
            required_bytes: 8_707_129_344,
            ceiling: 134_217_728,
        };
        let msg = err.to_string();
        assert!(msg.contains("r=6"));
        assert!(msg.contains("134217728"));
        assert!(err.is_user_facing());
    }

    #[test]
    fn test_internal_errors_not_user_facing() {
        assert!(!TaecaError::DependencyCycle(3).is_user_facing());
        assert!(!TaecaError::invalid_state("stepper not seeded").is_user_facing());
    }
}
