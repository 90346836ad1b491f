//! Error types for Lie group operations.
//!
//! Every failure is raised synchronously by the call that violates a
//! precondition, before any work is done. Numerical degeneracies such as
//! near-zero rotation angles are handled by series expansions and never show
//! up here.

use thiserror::Error;

/// Errors that can occur while constructing or operating on Lie tensors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LieError {
    /// An operand's trailing dimension does not match what the operation expects.
    ///
    /// Raised when a coordinate buffer's last axis differs from the group
    /// dimension, or when a secondary operand is neither the tangent
    /// dimension nor a 3/4-vector as the operator requires.
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimensions
        expected: String,
        /// Actual dimensions
        actual: String,
    },

    /// Two batch shapes cannot be aligned under broadcasting rules.
    #[error("Batch shapes {lhs:?} and {rhs:?} cannot be broadcast together")]
    BroadcastIncompatible {
        /// Batch shape of the first operand
        lhs: Vec<usize>,
        /// Batch shape of the second operand
        rhs: Vec<usize>,
    },

    /// Operator invoked on the wrong kind of element.
    ///
    /// For example `Exp` on an element that is already a group element, or
    /// `Mul` between an SO3 and an SE3 element.
    #[error("{operation} is not defined on {gtype} elements")]
    InvalidDomain {
        /// Name of the rejected operation
        operation: String,
        /// Group kind it was invoked on
        gtype: String,
    },

    /// Coordinates that cannot be packed into a valid group element.
    #[error("Invalid group coordinates: {reason}")]
    InvalidPoint {
        /// Description of why the coordinates are invalid
        reason: String,
    },

    /// Configuration value out of range or installed too late.
    #[error("Invalid configuration: {reason}")]
    InvalidConfig {
        /// Description of the configuration error
        reason: String,
    },

    /// Misuse of the gradient tape.
    ///
    /// Mixing operands recorded on different tapes, querying nodes that do
    /// not exist, or seeding backward with a gradient of the wrong shape.
    #[error("Gradient tape error: {reason}")]
    Tape {
        /// Description of the tape error
        reason: String,
    },
}

impl LieError {
    /// Create a DimensionMismatch error.
    pub fn dimension_mismatch<S1, S2>(expected: S1, actual: S2) -> Self
    where
        S1: std::fmt::Display,
        S2: std::fmt::Display,
    {
        Self::DimensionMismatch {
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }

    /// Create a BroadcastIncompatible error from two batch shapes.
    pub fn broadcast_incompatible(lhs: &[usize], rhs: &[usize]) -> Self {
        Self::BroadcastIncompatible {
            lhs: lhs.to_vec(),
            rhs: rhs.to_vec(),
        }
    }

    /// Create an InvalidDomain error.
    pub fn invalid_domain<S1, S2>(operation: S1, gtype: S2) -> Self
    where
        S1: std::fmt::Display,
        S2: std::fmt::Display,
    {
        Self::InvalidDomain {
            operation: operation.to_string(),
            gtype: gtype.to_string(),
        }
    }

    /// Create an InvalidPoint error with a custom reason.
    pub fn invalid_point<S: Into<String>>(reason: S) -> Self {
        Self::InvalidPoint {
            reason: reason.into(),
        }
    }

    /// Create an InvalidConfig error with a custom reason.
    pub fn invalid_config<S: Into<String>>(reason: S) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }

    /// Create a Tape error with a custom reason.
    pub fn tape<S: Into<String>>(reason: S) -> Self {
        Self::Tape {
            reason: reason.into(),
        }
    }
}

/// Result type alias for Lie tensor operations.
pub type Result<T> = std::result::Result<T, LieError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = LieError::dimension_mismatch(4, 7);
        assert!(matches!(err, LieError::DimensionMismatch { .. }));
        assert_eq!(err.to_string(), "Dimension mismatch: expected 4, got 7");

        let err = LieError::broadcast_incompatible(&[2, 3], &[4]);
        assert_eq!(
            err.to_string(),
            "Batch shapes [2, 3] and [4] cannot be broadcast together"
        );

        let err = LieError::invalid_domain("Exp", "SO3");
        assert_eq!(err.to_string(), "Exp is not defined on SO3 elements");
    }

    #[test]
    fn test_error_display() {
        let errors = vec![
            LieError::invalid_point("zero-norm quaternion"),
            LieError::invalid_config("series must have at least one term"),
            LieError::tape("operands recorded on different tapes"),
        ];

        for err in errors {
            assert!(!err.to_string().is_empty());
        }
    }

    #[test]
    fn test_errors_compare_by_value() {
        assert_eq!(
            LieError::invalid_domain("Log", "so3"),
            LieError::InvalidDomain {
                operation: "Log".to_string(),
                gtype: "so3".to_string(),
            }
        );
    }
}
