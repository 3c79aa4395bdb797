//! Validation utilities for memory input data.
//!
//! This module provides validation for:
//! - Note content
//! - Importance scores
//! - Tunable parameter ranges

use crate::error::MemoryError;

// ─────────────────────────────────────────────────────────────────────────────
// Validation Error
// ─────────────────────────────────────────────────────────────────────────────

/// Specific validation error types for memory input.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    /// Note content is empty or whitespace.
    #[error("note content is empty")]
    EmptyContent,

    /// Importance is not a number.
    #[error("importance is NaN")]
    NanImportance,

    /// A query string is empty or whitespace.
    #[error("query is empty")]
    EmptyQuery,

    /// A tunable parameter is outside its legal range.
    #[error("{name} = {value} is out of range {range}")]
    OutOfRange {
        /// Parameter name.
        name: &'static str,
        /// Offending value.
        value: f64,
        /// Human-readable legal range.
        range: &'static str,
    },

    /// A combination of parameters is unusable.
    #[error("{0}")]
    Inconsistent(String),
}

impl From<ValidationError> for MemoryError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::OutOfRange { .. } | ValidationError::Inconsistent(_) => {
                MemoryError::InvalidParams(err.to_string())
            }
            _ => MemoryError::InvalidInput(err.to_string()),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Note Input Validation
// ─────────────────────────────────────────────────────────────────────────────

/// Reject empty or whitespace-only content.
pub fn validate_content(content: &str) -> Result<(), ValidationError> {
    if content.trim().is_empty() {
        return Err(ValidationError::EmptyContent);
    }
    Ok(())
}

/// Reject empty or whitespace-only queries.
pub fn validate_query(query: &str) -> Result<(), ValidationError> {
    if query.trim().is_empty() {
        return Err(ValidationError::EmptyQuery);
    }
    Ok(())
}

/// Clamp importance into `[0, 1]`; NaN is rejected.
pub fn normalize_importance(importance: f32) -> Result<f32, ValidationError> {
    if importance.is_nan() {
        return Err(ValidationError::NanImportance);
    }
    Ok(importance.clamp(0.0, 1.0))
}

// ─────────────────────────────────────────────────────────────────────────────
// Parameter Ranges
// ─────────────────────────────────────────────────────────────────────────────

/// Interval shape used by [`check_range`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bounds {
    /// `[lo, hi]`
    Closed,
    /// `[lo, hi)`
    ClosedOpen,
    /// `(lo, hi]`
    OpenClosed,
}

/// Check that `value` lies in the interval `lo..hi` with the given bounds.
///
/// NaN never passes.
pub fn check_range(
    name: &'static str,
    value: f32,
    lo: f32,
    hi: f32,
    bounds: Bounds,
    range: &'static str,
) -> Result<(), ValidationError> {
    let ok = match bounds {
        Bounds::Closed => value >= lo && value <= hi,
        Bounds::ClosedOpen => value >= lo && value < hi,
        Bounds::OpenClosed => value > lo && value <= hi,
    };
    if ok {
        Ok(())
    } else {
        Err(ValidationError::OutOfRange {
            name,
            value: value as f64,
            range,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_content() {
        assert!(validate_content("hello").is_ok());
        assert_eq!(validate_content(""), Err(ValidationError::EmptyContent));
        assert_eq!(validate_content(" \n\t"), Err(ValidationError::EmptyContent));
    }

    #[test]
    fn test_normalize_importance() {
        assert_eq!(normalize_importance(0.3).unwrap(), 0.3);
        assert_eq!(normalize_importance(-2.0).unwrap(), 0.0);
        assert_eq!(normalize_importance(7.0).unwrap(), 1.0);
        assert_eq!(
            normalize_importance(f32::NAN),
            Err(ValidationError::NanImportance)
        );
    }

    #[test]
    fn test_check_range_bounds() {
        assert!(check_range("x", 0.0, 0.0, 1.0, Bounds::ClosedOpen, "[0, 1)").is_ok());
        assert!(check_range("x", 1.0, 0.0, 1.0, Bounds::ClosedOpen, "[0, 1)").is_err());
        assert!(check_range("x", 0.0, 0.0, 1.0, Bounds::OpenClosed, "(0, 1]").is_err());
        assert!(check_range("x", 1.0, 0.0, 1.0, Bounds::OpenClosed, "(0, 1]").is_ok());
        assert!(check_range("x", f32::NAN, 0.0, 1.0, Bounds::Closed, "[0, 1]").is_err());
    }

    #[test]
    fn test_conversion_to_memory_error() {
        let err: MemoryError = ValidationError::EmptyContent.into();
        assert!(matches!(err, MemoryError::InvalidInput(_)));

        let err: MemoryError = check_range("decay_rate", 2.0, 0.0, 1.0, Bounds::ClosedOpen, "[0, 1)")
            .unwrap_err()
            .into();
        match err {
            MemoryError::InvalidParams(msg) => assert!(msg.contains("decay_rate")),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
