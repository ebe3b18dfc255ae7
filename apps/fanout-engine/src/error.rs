//! Structured error handling for the fan-out engine.
//!
//! Every failure carries an [`ErrorCode`] plus free-form context. Codes fall
//! into two categories:
//!
//! | Category | Codes | When |
//! |----------|-------|------|
//! | Configuration | `INVALID_INPUT`, `INVALID_WINDOW`, `INVALID_WORKER_COUNT`, `INVALID_PARTITION` | Raised synchronously, before any worker is spawned |
//! | Computation | `COMPUTATION_FAILED`, `WORKER_PANICKED` | Raised after every worker has been joined |
//!
//! Allocation timeouts are not errors: a request that never fits before the
//! deadline is simply absent from the result.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Context key naming the work unit that failed.
pub const UNIT_CONTEXT_KEY: &str = "unit";

/// Error codes for the fan-out engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Configuration errors
    /// Input collection is empty, malformed, or contains invalid values.
    InvalidInput,
    /// Window size is zero, larger than the data, or inconsistent with `ddof`.
    InvalidWindow,
    /// Worker count is zero.
    InvalidWorkerCount,
    /// Partition ranges overlap, leave gaps, or fall out of bounds.
    InvalidPartition,

    // Computation errors
    /// A worker's function returned an error.
    ComputationFailed,
    /// A worker panicked.
    WorkerPanicked,
}

/// Broad category of an [`ErrorCode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Detected before any concurrency is introduced.
    Configuration,
    /// Surfaced from a worker after the join.
    Computation,
}

impl ErrorCode {
    /// Get the category for this error code.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidInput
            | Self::InvalidWindow
            | Self::InvalidWorkerCount
            | Self::InvalidPartition => ErrorCategory::Configuration,
            Self::ComputationFailed | Self::WorkerPanicked => ErrorCategory::Computation,
        }
    }

    /// Get the error reason string.
    #[must_use]
    pub const fn reason(&self) -> &'static str {
        match self {
            Self::InvalidInput => "INVALID_INPUT",
            Self::InvalidWindow => "INVALID_WINDOW",
            Self::InvalidWorkerCount => "INVALID_WORKER_COUNT",
            Self::InvalidPartition => "INVALID_PARTITION",
            Self::ComputationFailed => "COMPUTATION_FAILED",
            Self::WorkerPanicked => "WORKER_PANICKED",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.reason())
    }
}

/// A rich error with context for the fan-out engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub struct EngineError {
    /// Error code.
    code: ErrorCode,
    /// Human-readable message.
    message: String,
    /// Additional context (key-value pairs).
    context: Vec<(String, String)>,
}

/// Result alias used throughout the crate.
pub type EngineResult<T> = Result<T, EngineError>;

impl EngineError {
    /// Create a new engine error.
    #[must_use]
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            context: Vec::new(),
        }
    }

    /// Add context to the error.
    #[must_use]
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.push((key.into(), value.into()));
        self
    }

    /// Get the error code.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        self.code
    }

    /// Get the message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the context.
    #[must_use]
    pub fn context(&self) -> &[(String, String)] {
        &self.context
    }

    /// Name of the failing work unit, if this error came from a worker.
    #[must_use]
    pub fn unit(&self) -> Option<&str> {
        self.context
            .iter()
            .find(|(key, _)| key == UNIT_CONTEXT_KEY)
            .map(|(_, value)| value.as_str())
    }

    /// Whether this error was raised before any worker started.
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(self.code.category(), ErrorCategory::Configuration)
    }
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code.reason(), self.message)?;
        if let Some(unit) = self.unit() {
            write!(f, " (unit {unit})")?;
        }
        Ok(())
    }
}

/// Convenience constructors for common errors.
impl EngineError {
    /// Malformed or empty input.
    #[must_use]
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }

    /// Window size does not fit the data.
    #[must_use]
    pub fn invalid_window(window: usize, len: usize) -> Self {
        Self::new(
            ErrorCode::InvalidWindow,
            format!("window {window} must be between 1 and the data length {len}"),
        )
        .with_context("window", window.to_string())
        .with_context("len", len.to_string())
    }

    /// Zero workers requested.
    #[must_use]
    pub fn invalid_worker_count(workers: usize) -> Self {
        Self::new(
            ErrorCode::InvalidWorkerCount,
            format!("worker count must be positive, got {workers}"),
        )
    }

    /// Partition ranges are not a contiguous, in-bounds cover.
    #[must_use]
    pub fn invalid_partition(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidPartition, message)
    }

    /// A worker's function failed.
    #[must_use]
    pub fn computation_failed(unit: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ComputationFailed, message).with_context(UNIT_CONTEXT_KEY, unit)
    }

    /// A worker panicked.
    #[must_use]
    pub fn worker_panicked(unit: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorCode::WorkerPanicked, message).with_context(UNIT_CONTEXT_KEY, unit)
    }
}

/// Render a panic payload caught by `catch_unwind` or a failed `join`.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "worker panicked with a non-string payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_categories() {
        assert_eq!(
            ErrorCode::InvalidWindow.category(),
            ErrorCategory::Configuration
        );
        assert_eq!(
            ErrorCode::InvalidPartition.category(),
            ErrorCategory::Configuration
        );
        assert_eq!(
            ErrorCode::WorkerPanicked.category(),
            ErrorCategory::Computation
        );
    }

    #[test]
    fn test_invalid_window_context() {
        let err = EngineError::invalid_window(10, 4);

        assert!(err.is_configuration());
        assert_eq!(err.code(), ErrorCode::InvalidWindow);
        assert!(err.context().iter().any(|(k, v)| k == "len" && v == "4"));
        assert_eq!(err.unit(), None);
    }

    #[test]
    fn test_computation_error_names_unit() {
        let err = EngineError::computation_failed("partition-3", "bad slice");

        assert!(!err.is_configuration());
        assert_eq!(err.unit(), Some("partition-3"));
        assert_eq!(
            err.to_string(),
            "[COMPUTATION_FAILED] bad slice (unit partition-3)"
        );
    }

    #[test]
    fn test_error_code_serialization() {
        let json = serde_json::to_string(&ErrorCode::InvalidWorkerCount).unwrap();
        assert_eq!(json, "\"INVALID_WORKER_COUNT\"");
    }

    #[test]
    fn test_panic_message_downcasts() {
        let boxed: Box<dyn std::any::Any + Send> = Box::new("boom");
        assert_eq!(panic_message(boxed.as_ref()), "boom");

        let boxed: Box<dyn std::any::Any + Send> = Box::new(String::from("owned boom"));
        assert_eq!(panic_message(boxed.as_ref()), "owned boom");

        let boxed: Box<dyn std::any::Any + Send> = Box::new(42_u8);
        assert!(panic_message(boxed.as_ref()).contains("non-string"));
    }
}
