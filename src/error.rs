//! Unified error handling for the pace-zones library.
//!
//! Every fallible operation in the crate returns [`Result`], so callers see one
//! error type whether a pace failed to parse or an activity failed to classify.

use thiserror::Error;

use crate::units::Unit;

/// Unified error type for pace-zones operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PaceZonesError {
    /// Unit string is neither miles nor kilometers
    #[error("Unit must be mi or km, got '{unit}'")]
    InvalidUnit { unit: String },

    /// Arithmetic between paces of different units
    #[error("Cannot combine paces with different units ({left} and {right})")]
    UnitMismatch { left: Unit, right: Unit },

    /// Malformed pace text
    #[error("Invalid pace '{input}': {message}")]
    ParseError { input: String, message: String },

    /// Zone rank outside the valid set
    #[error("Zone rank {rank} is not a valid heart rate zone")]
    InvalidZone { rank: usize },

    /// Zone label that names no heart rate zone
    #[error("Unknown heart rate zone '{label}'")]
    UnknownZone { label: String },

    /// Heart rate sample that falls in no configured bucket
    #[error("HR {heart_rate} is out of range")]
    OutOfRange { heart_rate: f64 },

    /// Parallel streams that cannot be aligned
    #[error("Stream '{stream}' has {actual} samples, expected {expected}")]
    LengthMismatch {
        stream: String,
        expected: usize,
        actual: usize,
    },

    /// Operation needs at least one value
    #[error("Cannot compute {operation} of an empty input")]
    EmptyInput { operation: String },

    /// Division by zero or a non-finite scalar
    #[error("Cannot divide a pace by {divisor}")]
    InvalidDivisor { divisor: f64 },

    /// Required stream absent from an API response
    #[error("Activity {activity_id} has no '{stream}' stream")]
    MissingStream { activity_id: String, stream: String },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// HTTP/API error
    #[error("HTTP error{}: {message}", status_suffix(.status_code))]
    Http {
        message: String,
        status_code: Option<u16>,
    },
}

fn status_suffix(status_code: &Option<u16>) -> String {
    match status_code {
        Some(code) => format!(" ({})", code),
        None => String::new(),
    }
}

/// Result type alias for pace-zones operations.
pub type Result<T> = std::result::Result<T, PaceZonesError>;

/// Extension trait for converting Option to PaceZonesError.
pub trait OptionExt<T> {
    /// Convert Option to Result with an empty input error.
    fn ok_or_empty(self, operation: &str) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_empty(self, operation: &str) -> Result<T> {
        self.ok_or_else(|| PaceZonesError::EmptyInput {
            operation: operation.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PaceZonesError::LengthMismatch {
            stream: "heartrate".to_string(),
            expected: 10,
            actual: 8,
        };
        assert!(err.to_string().contains("heartrate"));
        assert!(err.to_string().contains("8 samples"));

        let err = PaceZonesError::Http {
            message: "Too many requests".to_string(),
            status_code: Some(429),
        };
        assert_eq!(err.to_string(), "HTTP error (429): Too many requests");

        let err = PaceZonesError::Http {
            message: "timeout".to_string(),
            status_code: None,
        };
        assert_eq!(err.to_string(), "HTTP error: timeout");
    }

    #[test]
    fn test_option_ext() {
        let none: Option<i32> = None;
        let result = none.ok_or_empty("mean");
        assert!(matches!(result, Err(PaceZonesError::EmptyInput { .. })));
    }
}
