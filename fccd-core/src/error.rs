//! Error types for fccd-core.

use thiserror::Error;

/// Result type alias for fccd operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for fccd operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Reference array shape inconsistent with the frame shape.
    #[error("shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch {
        /// The shape required by the operation.
        expected: String,
        /// The shape that was supplied.
        actual: String,
    },

    /// Input array has the wrong number of dimensions.
    #[error("dimension error: expected {expected} dimensions, got {actual}")]
    DimensionError {
        /// The rank required by the operation.
        expected: usize,
        /// The rank that was supplied.
        actual: usize,
    },

    /// Invalid parameter value.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl Error {
    /// Builds a `ShapeMismatch` from two concrete shape slices.
    pub fn shape_mismatch(expected: &[usize], actual: &[usize]) -> Self {
        Error::ShapeMismatch {
            expected: format!("{expected:?}"),
            actual: format!("{actual:?}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_mismatch_message() {
        let err = Error::shape_mismatch(&[3, 960, 960], &[2, 960, 960]);
        let msg = err.to_string();
        assert!(msg.contains("[3, 960, 960]"));
        assert!(msg.contains("[2, 960, 960]"));
    }

    #[test]
    fn test_dimension_error_message() {
        let err = Error::DimensionError {
            expected: 4,
            actual: 3,
        };
        assert_eq!(
            err.to_string(),
            "dimension error: expected 4 dimensions, got 3"
        );
    }
}
