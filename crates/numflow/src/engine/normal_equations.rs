//! Normal-equations accumulation kernel for least-squares training.
//!
//! ## Purpose
//!
//! This module implements the additive state behind linear-regression
//! training: the cross-products `X^T X` and `X^T Y` (with an optional
//! intercept column appended to `X`), their block-wise merge, and the
//! Cholesky solve that turns accumulated state into coefficients.
//!
//! ## Design notes
//!
//! * **Additive State**: The cross-products sum exactly over row blocks, so
//!   online and distributed training reproduce batch training up to
//!   floating-point associativity.
//! * **Ridge**: Regularization is applied at solve time to the feature block
//!   of the system only; the intercept row is never penalized.
//! * **Serializable**: The accumulator is the partial-result artifact of the
//!   distributed mode.
//!
//! ## Invariants
//!
//! * `xtx` is d x d and symmetric; `xty` is d x r; d = features (+1 with
//!   intercept).
//! * `count` equals the total number of accumulated rows.
//!
//! ## Non-goals
//!
//! * This module does not validate finiteness (see the validator).
//! * This module does not implement the QR-based training path; that solves
//!   directly from raw data in the family layer.

// External dependencies
use num_traits::Float;
use serde::{Deserialize, Serialize};

// Internal dependencies
use crate::engine::ops::{accumulate_cross, accumulate_gram, cholesky_solve};
use crate::primitives::errors::NumflowError;
use crate::primitives::serial::{Persistable, SerializationTag};
use crate::primitives::table::NumericTable;

const FAMILY: &str = "linear";

// ============================================================================
// Normal-Equations Partial
// ============================================================================

/// Additive partial state of a least-squares training computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalEquationsPartial<T> {
    features: usize,
    responses: usize,
    intercept: bool,
    count: usize,
    xtx: Vec<T>,
    xty: Vec<T>,
}

impl<T: Float> NormalEquationsPartial<T> {
    /// Create an empty accumulator for fixed feature/response counts.
    pub fn new(features: usize, responses: usize, intercept: bool) -> Self {
        let d = features + usize::from(intercept);
        Self {
            features,
            responses,
            intercept,
            count: 0,
            xtx: vec![T::zero(); d * d],
            xty: vec![T::zero(); d * responses],
        }
    }

    /// Width of the augmented design matrix.
    #[inline]
    pub fn dim(&self) -> usize {
        self.features + usize::from(self.intercept)
    }

    /// Number of feature columns.
    #[inline]
    pub fn features(&self) -> usize {
        self.features
    }

    /// Number of response columns.
    #[inline]
    pub fn responses(&self) -> usize {
        self.responses
    }

    /// Whether an intercept column is modeled.
    #[inline]
    pub fn intercept(&self) -> bool {
        self.intercept
    }

    /// Number of rows accumulated so far.
    #[inline]
    pub fn count(&self) -> usize {
        self.count
    }

    /// Accumulate one block of observations and responses.
    pub fn update(
        &mut self,
        data: &NumericTable<T>,
        responses: &NumericTable<T>,
    ) -> Result<(), NumflowError> {
        if data.cols() != self.features {
            return Err(NumflowError::DimensionMismatch {
                context: "training feature columns",
                expected: self.features,
                got: data.cols(),
            });
        }
        if responses.cols() != self.responses {
            return Err(NumflowError::DimensionMismatch {
                context: "training response columns",
                expected: self.responses,
                got: responses.cols(),
            });
        }
        if data.rows() != responses.rows() {
            return Err(NumflowError::DimensionMismatch {
                context: "training rows",
                expected: data.rows(),
                got: responses.rows(),
            });
        }

        let augmented = augment(data, self.intercept);
        let d = self.dim();
        accumulate_gram(&mut self.xtx, &augmented, data.rows(), d);
        accumulate_cross(
            &mut self.xty,
            &augmented,
            responses.values(),
            data.rows(),
            d,
            self.responses,
        );
        self.count += data.rows();
        Ok(())
    }

    /// Fold another partial into this one.
    pub fn merge(&mut self, other: &NormalEquationsPartial<T>) -> Result<(), NumflowError> {
        if other.features != self.features
            || other.responses != self.responses
            || other.intercept != self.intercept
        {
            return Err(NumflowError::DimensionMismatch {
                context: "normal-equations merge shape",
                expected: self.dim(),
                got: other.dim(),
            });
        }
        log::trace!(
            "normal-equations merge: {} + {} rows",
            self.count,
            other.count
        );
        for (dst, src) in self.xtx.iter_mut().zip(&other.xtx) {
            *dst = *dst + *src;
        }
        for (dst, src) in self.xty.iter_mut().zip(&other.xty) {
            *dst = *dst + *src;
        }
        self.count += other.count;
        Ok(())
    }

    /// Solve the accumulated system into a d x r coefficient table.
    ///
    /// The ridge term is added to the feature diagonal only. A singular
    /// system surfaces as a computation failure.
    pub fn solve(&self, ridge: T) -> Result<NumericTable<T>, NumflowError> {
        if self.count == 0 {
            return Err(NumflowError::ComputationFailed {
                family: FAMILY,
                message: "no rows were accumulated".into(),
            });
        }
        let d = self.dim();
        let mut system = self.xtx.clone();
        if ridge > T::zero() {
            for i in 0..self.features {
                system[i * d + i] = system[i * d + i] + ridge;
            }
        }
        let mut solution = self.xty.clone();
        cholesky_solve(system, d, &mut solution, self.responses, FAMILY)?;
        NumericTable::new(d, self.responses, solution)
    }
}

/// Append the intercept column of ones when requested.
pub(crate) fn augment<T: Float>(data: &NumericTable<T>, intercept: bool) -> Vec<T> {
    if !intercept {
        return data.values().to_vec();
    }
    let d = data.cols() + 1;
    let mut out = Vec::with_capacity(data.rows() * d);
    for r in 0..data.rows() {
        out.extend_from_slice(data.row(r));
        out.push(T::one());
    }
    out
}

// ============================================================================
// Serialization Tags
// ============================================================================

impl Persistable for NormalEquationsPartial<f32> {
    const TAG: SerializationTag = SerializationTag::NormalEquationsPartialF32;
}

impl Persistable for NormalEquationsPartial<f64> {
    const TAG: SerializationTag = SerializationTag::NormalEquationsPartialF64;
}

// ============================================================================
// Tests
// ============================================================================
