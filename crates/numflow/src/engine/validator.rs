//! Input and parameter validation for algorithm execution.
//!
//! ## Purpose
//!
//! This module provides the fail-fast validation functions shared by all
//! algorithm families: table content checks, dimension agreement, and
//! parameter bounds.
//!
//! ## Design notes
//!
//! * **Fail-Fast**: Validation stops at the first error encountered.
//! * **Efficiency**: Checks are ordered from cheap to expensive.
//! * **Generics**: Validation is generic over `Float` types.
//!
//! ## Key concepts
//!
//! * **Finite Checks**: Ensures all table values are finite (no NaN/Inf).
//! * **Dimension Agreement**: Row and column counts that must match across
//!   tables and accumulation steps.
//!
//! ## Invariants
//!
//! * All validated inputs satisfy their respective constraints.
//! * Validation logic is deterministic and side-effect free.
//!
//! ## Non-goals
//!
//! * This module does not transform or filter input data.
//! * This module does not perform the numeric kernels themselves.

// External dependencies
use num_traits::Float;

// Internal dependencies
use crate::primitives::errors::NumflowError;
use crate::primitives::table::{CsrTable, NumericTable};

// ============================================================================
// Validator
// ============================================================================

/// Validation utility for algorithm inputs and parameters.
///
/// Provides static methods returning `Result<(), NumflowError>` that fail
/// fast upon the first violation.
pub struct Validator;

impl Validator {
    // ========================================================================
    // Table Content Validation
    // ========================================================================

    /// Validate that every value of a dense table is finite.
    pub fn validate_dense<T: Float>(
        table: &NumericTable<T>,
        name: &str,
    ) -> Result<(), NumflowError> {
        for (i, &v) in table.values().iter().enumerate() {
            if !v.is_finite() {
                let (row, col) = (i / table.cols(), i % table.cols());
                return Err(NumflowError::InvalidNumericValue(format!(
                    "{name}[{row}][{col}]={}",
                    v.to_f64().unwrap_or(f64::NAN)
                )));
            }
        }
        Ok(())
    }

    /// Validate that every stored value of a CSR table is finite.
    pub fn validate_csr<T: Float>(table: &CsrTable<T>, name: &str) -> Result<(), NumflowError> {
        for (i, &v) in table.values().iter().enumerate() {
            if !v.is_finite() {
                return Err(NumflowError::InvalidNumericValue(format!(
                    "{name}: stored value #{i}={}",
                    v.to_f64().unwrap_or(f64::NAN)
                )));
            }
        }
        Ok(())
    }

    // ========================================================================
    // Dimension Agreement
    // ========================================================================

    /// Validate that two row counts agree.
    pub fn validate_same_rows(
        expected: usize,
        got: usize,
        context: &'static str,
    ) -> Result<(), NumflowError> {
        if expected != got {
            return Err(NumflowError::DimensionMismatch {
                context,
                expected,
                got,
            });
        }
        Ok(())
    }

    /// Validate that a chunk's column count matches the accumulated one.
    pub fn validate_same_cols(
        expected: usize,
        got: usize,
        context: &'static str,
    ) -> Result<(), NumflowError> {
        if expected != got {
            return Err(NumflowError::DimensionMismatch {
                context,
                expected,
                got,
            });
        }
        Ok(())
    }

    /// Validate that a table is at least as tall as it is wide.
    ///
    /// Thin factorizations require rows >= columns.
    pub fn validate_tall(rows: usize, cols: usize) -> Result<(), NumflowError> {
        if rows < cols {
            return Err(NumflowError::DimensionMismatch {
                context: "rows (thin factorization needs rows >= columns)",
                expected: cols,
                got: rows,
            });
        }
        Ok(())
    }

    // ========================================================================
    // Parameter Validation
    // ========================================================================

    /// Validate a ridge regularization term.
    pub fn validate_ridge<T: Float>(ridge: T) -> Result<(), NumflowError> {
        if !ridge.is_finite() || ridge < T::zero() {
            return Err(NumflowError::InvalidParameter {
                parameter: "ridge",
                message: format!(
                    "must be finite and >= 0, got {}",
                    ridge.to_f64().unwrap_or(f64::NAN)
                ),
            });
        }
        Ok(())
    }

    /// Validate a distributed partition count fixed at construction.
    pub fn validate_partitions(partitions: usize) -> Result<(), NumflowError> {
        if partitions == 0 {
            return Err(NumflowError::InvalidParameter {
                parameter: "partitions",
                message: "must be at least 1".into(),
            });
        }
        Ok(())
    }

    /// Validate that no builder parameter was set multiple times.
    pub fn validate_no_duplicates(
        duplicate_param: Option<&'static str>,
    ) -> Result<(), NumflowError> {
        if let Some(parameter) = duplicate_param {
            return Err(NumflowError::DuplicateParameter { parameter });
        }
        Ok(())
    }
}
