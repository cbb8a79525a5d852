//! Low-order moments accumulation kernel.
//!
//! ## Purpose
//!
//! This module implements the additive accumulator behind the moments
//! family: per-column sums, sums of squares, minima, and maxima, plus the
//! finalization into means and variances. The same accumulator serves the
//! batch, online, and distributed modes, because the statistics it tracks
//! merge exactly across row blocks.
//!
//! ## Design notes
//!
//! * **Additive State**: Everything the finalization needs is a sum or an
//!   extremum, so chunked and partitioned execution reproduce the batch
//!   result up to floating-point associativity.
//! * **CSR Awareness**: Implicit zeros of a sparse row contribute nothing to
//!   the sums but do participate in the per-column extrema.
//! * **Serializable**: The accumulator is the partial-result artifact of the
//!   distributed mode, so it derives the serde traits and registers
//!   serialization tags.
//!
//! ## Invariants
//!
//! * `count` equals the total number of accumulated rows.
//! * All vectors have length `cols`.
//! * `min[c] <= max[c]` for every column once at least one row was seen.
//!
//! ## Non-goals
//!
//! * This module does not validate finiteness (see the validator).
//! * This module does not decide the variance estimate; the caller passes
//!   the estimate kind at finalization.

// External dependencies
use num_traits::Float;
use serde::{Deserialize, Serialize};

// Internal dependencies
use crate::primitives::errors::NumflowError;
use crate::primitives::serial::{Persistable, SerializationTag};
use crate::primitives::table::{CsrTable, NumericTable};

const FAMILY: &str = "moments";

// ============================================================================
// Variance Estimate
// ============================================================================

/// Divisor convention for the variance finalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VarianceEstimate {
    /// Unbiased sample variance (divides by n - 1). Requires n >= 2.
    #[default]
    Sample,

    /// Population variance (divides by n).
    Population,
}

// ============================================================================
// Moments Partial
// ============================================================================

/// Additive partial state of a moments computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MomentsPartial<T> {
    cols: usize,
    count: usize,
    sum: Vec<T>,
    sum_squares: Vec<T>,
    min: Vec<T>,
    max: Vec<T>,
}

impl<T: Float> MomentsPartial<T> {
    /// Create an empty accumulator for a fixed column count.
    pub fn new(cols: usize) -> Self {
        Self {
            cols,
            count: 0,
            sum: vec![T::zero(); cols],
            sum_squares: vec![T::zero(); cols],
            min: vec![T::infinity(); cols],
            max: vec![T::neg_infinity(); cols],
        }
    }

    /// Number of columns this accumulator tracks.
    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Number of rows accumulated so far.
    #[inline]
    pub fn count(&self) -> usize {
        self.count
    }

    /// Accumulate every row of a dense block.
    pub fn update_dense(&mut self, block: &NumericTable<T>) -> Result<(), NumflowError> {
        if block.cols() != self.cols {
            return Err(NumflowError::DimensionMismatch {
                context: "moments accumulation columns",
                expected: self.cols,
                got: block.cols(),
            });
        }
        for r in 0..block.rows() {
            for (c, &v) in block.row(r).iter().enumerate() {
                self.sum[c] = self.sum[c] + v;
                self.sum_squares[c] = self.sum_squares[c] + v * v;
                if v < self.min[c] {
                    self.min[c] = v;
                }
                if v > self.max[c] {
                    self.max[c] = v;
                }
            }
        }
        self.count += block.rows();
        Ok(())
    }

    /// Accumulate every row of a CSR block.
    ///
    /// Implicit zeros contribute zero to the sums; a column whose explicit
    /// entries do not cover every row of the block also has zero as a
    /// candidate extremum.
    pub fn update_csr(&mut self, block: &CsrTable<T>) -> Result<(), NumflowError> {
        if block.cols() != self.cols {
            return Err(NumflowError::DimensionMismatch {
                context: "moments accumulation columns",
                expected: self.cols,
                got: block.cols(),
            });
        }
        let mut explicit = vec![0usize; self.cols];
        for r in 0..block.rows() {
            let (cols, vals) = block.row_entries(r);
            for (&c, &v) in cols.iter().zip(vals) {
                self.sum[c] = self.sum[c] + v;
                self.sum_squares[c] = self.sum_squares[c] + v * v;
                if v < self.min[c] {
                    self.min[c] = v;
                }
                if v > self.max[c] {
                    self.max[c] = v;
                }
                explicit[c] += 1;
            }
        }
        for c in 0..self.cols {
            if explicit[c] < block.rows() {
                if T::zero() < self.min[c] {
                    self.min[c] = T::zero();
                }
                if T::zero() > self.max[c] {
                    self.max[c] = T::zero();
                }
            }
        }
        self.count += block.rows();
        Ok(())
    }

    /// Fold another partial into this one.
    pub fn merge(&mut self, other: &MomentsPartial<T>) -> Result<(), NumflowError> {
        if other.cols != self.cols {
            return Err(NumflowError::DimensionMismatch {
                context: "moments merge columns",
                expected: self.cols,
                got: other.cols,
            });
        }
        log::trace!("moments merge: {} + {} rows", self.count, other.count);
        for c in 0..self.cols {
            self.sum[c] = self.sum[c] + other.sum[c];
            self.sum_squares[c] = self.sum_squares[c] + other.sum_squares[c];
            if other.min[c] < self.min[c] {
                self.min[c] = other.min[c];
            }
            if other.max[c] > self.max[c] {
                self.max[c] = other.max[c];
            }
        }
        self.count += other.count;
        Ok(())
    }

    /// Finalize the accumulated state into the full set of statistics.
    ///
    /// Returns per-column tables in the order (sum, sum of squares, minimum,
    /// maximum, mean, variance), each 1 x cols.
    pub fn finalize(
        &self,
        estimate: VarianceEstimate,
    ) -> Result<MomentsSummary<T>, NumflowError> {
        if self.count == 0 {
            return Err(NumflowError::ComputationFailed {
                family: FAMILY,
                message: "no rows were accumulated".into(),
            });
        }
        if estimate == VarianceEstimate::Sample && self.count < 2 {
            return Err(NumflowError::ComputationFailed {
                family: FAMILY,
                message: format!(
                    "sample variance needs at least 2 rows, got {}",
                    self.count
                ),
            });
        }

        let n = T::from(self.count).ok_or_else(|| NumflowError::ComputationFailed {
            family: FAMILY,
            message: format!("row count {} is not representable", self.count),
        })?;
        let divisor = match estimate {
            VarianceEstimate::Sample => n - T::one(),
            VarianceEstimate::Population => n,
        };

        let mut mean = vec![T::zero(); self.cols];
        let mut variance = vec![T::zero(); self.cols];
        for c in 0..self.cols {
            mean[c] = self.sum[c] / n;
            // Centered second moment; clamp the tiny negatives produced by
            // cancellation.
            let centered = self.sum_squares[c] - self.sum[c] * mean[c];
            variance[c] = (centered / divisor).max(T::zero());
        }

        Ok(MomentsSummary {
            sum: NumericTable::new(1, self.cols, self.sum.clone())?,
            sum_squares: NumericTable::new(1, self.cols, self.sum_squares.clone())?,
            minimum: NumericTable::new(1, self.cols, self.min.clone())?,
            maximum: NumericTable::new(1, self.cols, self.max.clone())?,
            mean: NumericTable::new(1, self.cols, mean)?,
            variance: NumericTable::new(1, self.cols, variance)?,
        })
    }
}

/// Finalized per-column statistics of a moments computation.
#[derive(Debug, Clone, PartialEq)]
pub struct MomentsSummary<T> {
    /// Per-column sums.
    pub sum: NumericTable<T>,

    /// Per-column sums of squares.
    pub sum_squares: NumericTable<T>,

    /// Per-column minima.
    pub minimum: NumericTable<T>,

    /// Per-column maxima.
    pub maximum: NumericTable<T>,

    /// Per-column means.
    pub mean: NumericTable<T>,

    /// Per-column variances.
    pub variance: NumericTable<T>,
}

// ============================================================================
// Serialization Tags
// ============================================================================

impl Persistable for MomentsPartial<f32> {
    const TAG: SerializationTag = SerializationTag::MomentsPartialF32;
}

impl Persistable for MomentsPartial<f64> {
    const TAG: SerializationTag = SerializationTag::MomentsPartialF64;
}

// ============================================================================
// Tests
// ============================================================================
