//! Error types for algorithm construction, binding, and execution.
//!
//! ## Purpose
//!
//! This module defines every failure condition the invocation protocol can
//! report: construction-time contract violations, identifier-set violations,
//! compute preconditions, engine failures, lifecycle misuse, and
//! serialization problems.
//!
//! ## Design notes
//!
//! * **Contextual**: Errors carry the relevant values (family name, offending
//!   identifier, expected vs. actual sizes).
//! * **Synchronous**: Every error is returned at the call that detects it;
//!   nothing is logged and suppressed.
//! * **Pass-Through**: Engine-side numerical failures surface verbatim inside
//!   [`NumflowError::ComputationFailed`]; this layer never retries.
//!
//! ## Key concepts
//!
//! 1. **Construction errors**: unsupported precision/method combinations and
//!    invalid fixed parameters, reported before any engine state exists.
//! 2. **Binding errors**: identifiers outside a family's closed input/result
//!    sets, or values of the wrong kind for an identifier.
//! 3. **Lifecycle errors**: compute after finalize, fan-in index misuse.
//!
//! ## Invariants
//!
//! * All variants provide sufficient context for diagnosis.
//! * Error messages are consistent in tone and formatting.
//!
//! ## Non-goals
//!
//! * This module does not perform the validation logic itself.
//! * This module does not provide recovery or fallback strategies.

// External dependencies
use core::fmt::{Display, Formatter, Result};
use std::error::Error;

// Internal dependencies
use crate::primitives::collection::{InputId, ResultId};
use crate::primitives::precision::Precision;

// ============================================================================
// Error Type
// ============================================================================

/// Error type for all protocol operations.
#[derive(Debug, Clone, PartialEq)]
pub enum NumflowError {
    /// The method is not available at the requested precision.
    UnsupportedPrecision {
        /// Algorithm family name.
        family: &'static str,
        /// Method name.
        method: &'static str,
        /// The rejected precision.
        precision: Precision,
    },

    /// The method is not available for this family or processing mode.
    UnsupportedMethod {
        /// Algorithm family name.
        family: &'static str,
        /// Method name.
        method: &'static str,
        /// Processing mode name ("batch", "online", "distributed").
        mode: &'static str,
    },

    /// The input identifier is outside the family's accepted set.
    UnsupportedInputId {
        /// Algorithm family name.
        family: &'static str,
        /// The rejected identifier.
        id: InputId,
    },

    /// The result identifier is outside the family's declared set.
    UnsupportedResultId {
        /// Algorithm family name.
        family: &'static str,
        /// The rejected identifier.
        id: ResultId,
    },

    /// A bound value has the wrong kind for its identifier.
    InputTypeMismatch {
        /// Algorithm family name.
        family: &'static str,
        /// The identifier the value was bound to.
        id: InputId,
        /// Description of the expected kind ("dense table", "model", ...).
        expected: &'static str,
    },

    /// A required input identifier was never bound.
    MissingInput {
        /// Algorithm family name.
        family: &'static str,
        /// The unbound identifier.
        id: InputId,
    },

    /// A table has zero rows or zero columns.
    EmptyTable {
        /// Description of where the table was encountered.
        context: &'static str,
    },

    /// Two dimensions that must agree do not.
    DimensionMismatch {
        /// Description of the dimension being checked.
        context: &'static str,
        /// Expected extent.
        expected: usize,
        /// Actual extent.
        got: usize,
    },

    /// Input data contains NaN or infinite values.
    InvalidNumericValue(String),

    /// A tunable or fixed parameter is outside its legal range.
    InvalidParameter {
        /// Parameter name.
        parameter: &'static str,
        /// Description of the violation.
        message: String,
    },

    /// A builder parameter was set multiple times.
    DuplicateParameter {
        /// Parameter name.
        parameter: &'static str,
    },

    /// The engine reported a numerical failure during compute.
    ComputationFailed {
        /// Algorithm family name.
        family: &'static str,
        /// Engine-specific diagnostic.
        message: String,
    },

    /// `compute` was invoked after `finalize` consumed the accumulated state.
    HandleFinalized {
        /// Algorithm family name.
        family: &'static str,
    },

    /// A finalizing accessor ran before the producing compute step.
    ResultNotReady {
        /// Algorithm family name.
        family: &'static str,
    },

    /// A partial result was added twice for the same partition index.
    DuplicatePartition {
        /// The repeated partition index.
        index: usize,
    },

    /// A partition index is outside the fixed partition count.
    PartitionOutOfRange {
        /// The rejected index.
        index: usize,
        /// Number of partitions fixed at construction.
        partitions: usize,
    },

    /// The fan-in is incomplete or inconsistent at finalize time.
    PartitionMismatch {
        /// Number of partitions fixed at construction.
        expected: usize,
        /// Number of partial results actually supplied.
        got: usize,
    },

    /// A serialized artifact carries a different type tag than expected.
    TagMismatch {
        /// Tag expected for the requested concrete type.
        expected: u32,
        /// Tag found in the byte stream.
        got: u32,
    },

    /// Encoding or decoding of an artifact failed.
    SerializationFailed(String),
}

// ============================================================================
// Display Implementation
// ============================================================================

impl Display for NumflowError {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            Self::UnsupportedPrecision {
                family,
                method,
                precision,
            } => {
                write!(
                    f,
                    "Family '{family}' does not support method '{method}' at {precision} precision"
                )
            }
            Self::UnsupportedMethod {
                family,
                method,
                mode,
            } => {
                write!(
                    f,
                    "Family '{family}' does not support method '{method}' in {mode} mode"
                )
            }
            Self::UnsupportedInputId { family, id } => {
                write!(f, "Family '{family}' does not accept input id '{id}'")
            }
            Self::UnsupportedResultId { family, id } => {
                write!(f, "Family '{family}' does not expose result id '{id}'")
            }
            Self::InputTypeMismatch {
                family,
                id,
                expected,
            } => {
                write!(
                    f,
                    "Family '{family}' expects a {expected} for input id '{id}'"
                )
            }
            Self::MissingInput { family, id } => {
                write!(f, "Family '{family}' requires input id '{id}' to be bound")
            }
            Self::EmptyTable { context } => {
                write!(f, "Empty table: {context}")
            }
            Self::DimensionMismatch {
                context,
                expected,
                got,
            } => {
                write!(f, "Dimension mismatch for {context}: expected {expected}, got {got}")
            }
            Self::InvalidNumericValue(s) => write!(f, "Invalid numeric value: {s}"),
            Self::InvalidParameter { parameter, message } => {
                write!(f, "Invalid parameter '{parameter}': {message}")
            }
            Self::DuplicateParameter { parameter } => {
                write!(
                    f,
                    "Parameter '{parameter}' was set multiple times. Each parameter can only be configured once."
                )
            }
            Self::ComputationFailed { family, message } => {
                write!(f, "Computation failed in family '{family}': {message}")
            }
            Self::HandleFinalized { family } => {
                write!(
                    f,
                    "Family '{family}': compute invoked after finalize; the handle no longer accepts data"
                )
            }
            Self::ResultNotReady { family } => {
                write!(
                    f,
                    "Family '{family}': result requested before the producing compute step ran"
                )
            }
            Self::DuplicatePartition { index } => {
                write!(f, "Partial result for partition {index} was added twice")
            }
            Self::PartitionOutOfRange { index, partitions } => {
                write!(
                    f,
                    "Partition index {index} is out of range for {partitions} partitions"
                )
            }
            Self::PartitionMismatch { expected, got } => {
                write!(
                    f,
                    "Fan-in incomplete: expected {expected} partial results, got {got}"
                )
            }
            Self::TagMismatch { expected, got } => {
                write!(
                    f,
                    "Serialization tag mismatch: expected {expected}, got {got}"
                )
            }
            Self::SerializationFailed(msg) => write!(f, "Serialization failed: {msg}"),
        }
    }
}

// ============================================================================
// Standard Error Trait
// ============================================================================

impl Error for NumflowError {}
