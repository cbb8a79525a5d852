//! Low-order moments algorithm family.
//!
//! ## Purpose
//!
//! This module provides the per-column descriptive-statistics family: sums,
//! sums of squares, extrema, means, and variances of a numeric table, in
//! batch, online, and distributed processing modes.
//!
//! ## Design notes
//!
//! * **Methods**: `DefaultDense` reads a dense table; `SinglePassCsr` reads
//!   a CSR table in one sweep. Both methods are available at both
//!   precisions.
//! * **Additive Core**: All modes share the engine's additive accumulator,
//!   so chunked and partitioned execution agree with batch execution.
//!
//! ## Key concepts
//!
//! * **Input set**: `data` only.
//! * **Result set**: sum, sum of squares, minimum, maximum, mean, variance.
//!
//! ## Invariants
//!
//! * Method and precision are fixed once a mode builder runs `build()`.
//! * Every result table is 1 x cols.
//!
//! ## Non-goals
//!
//! * Higher-order moments (skewness, kurtosis) are not part of this family.

// Internal dependencies
use crate::api::ProcessingMode;
use crate::engine::moments::MomentsSummary;
use crate::primitives::collection::{InputId, ResultCollection, ResultId, ResultValue};
use crate::primitives::errors::NumflowError;
use crate::primitives::precision::PrecisionToken;

// Publicly re-exported types
pub use crate::engine::moments::{MomentsPartial, VarianceEstimate};

/// Batch execution for moments.
pub mod batch;

/// Online execution for moments.
pub mod online;

/// Distributed execution for moments.
pub mod distributed;

pub(crate) const FAMILY: &str = "moments";

/// Accepted input identifiers of the family.
pub const INPUT_IDS: &[InputId] = &[InputId::Data];

/// Declared result identifiers of the family.
pub const RESULT_IDS: &[ResultId] = &[
    ResultId::Sum,
    ResultId::SumSquares,
    ResultId::Minimum,
    ResultId::Maximum,
    ResultId::Mean,
    ResultId::Variance,
];

// ============================================================================
// Method
// ============================================================================

/// Computational strategy for the moments family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MomentsMethod {
    /// Single sweep over a dense table.
    #[default]
    DefaultDense,

    /// Single sweep over a CSR table.
    SinglePassCsr,
}

impl MomentsMethod {
    /// Get the name of the method.
    pub const fn name(&self) -> &'static str {
        match self {
            MomentsMethod::DefaultDense => "default_dense",
            MomentsMethod::SinglePassCsr => "single_pass_csr",
        }
    }
}

// ============================================================================
// Parameter Block
// ============================================================================

/// Tunable parameters of the moments family.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MomentsParameters {
    estimate: VarianceEstimate,
}

impl MomentsParameters {
    /// The variance estimate convention.
    pub fn estimate(&self) -> VarianceEstimate {
        self.estimate
    }

    /// Set the variance estimate convention.
    pub fn set_estimate(&mut self, estimate: VarianceEstimate) {
        self.estimate = estimate;
    }
}

// ============================================================================
// Family Builder
// ============================================================================

/// Fluent builder for configuring a moments computation.
///
/// Chain configuration setters, then select a processing mode:
///
/// ```
/// use numflow::prelude::*;
///
/// let algorithm = Moments::<f64>::new()
///     .method(MomentsMethod::DefaultDense)
///     .mode(Batch)
///     .build()?;
/// # let _ = algorithm;
/// # Result::<(), NumflowError>::Ok(())
/// ```
#[derive(Debug, Clone)]
pub struct MomentsBuilder<T: PrecisionToken> {
    /// Computational strategy.
    pub(crate) method: Option<MomentsMethod>,

    /// Variance estimate convention.
    pub(crate) estimate: Option<VarianceEstimate>,

    /// Tracks if any parameter was set multiple times (for validation).
    pub(crate) duplicate_param: Option<&'static str>,

    pub(crate) _precision: core::marker::PhantomData<T>,
}

impl<T: PrecisionToken> Default for MomentsBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: PrecisionToken> MomentsBuilder<T> {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self {
            method: None,
            estimate: None,
            duplicate_param: None,
            _precision: core::marker::PhantomData,
        }
    }

    /// Set the computational strategy.
    pub fn method(mut self, method: MomentsMethod) -> Self {
        if self.method.is_some() {
            self.duplicate_param = Some("method");
        }
        self.method = Some(method);
        self
    }

    /// Set the variance estimate convention.
    pub fn estimate(mut self, estimate: VarianceEstimate) -> Self {
        if self.estimate.is_some() {
            self.duplicate_param = Some("estimate");
        }
        self.estimate = Some(estimate);
        self
    }

    /// Select a processing mode to transition to an execution builder.
    pub fn mode<M>(self, _mode: M) -> M::Output
    where
        M: ProcessingMode<Self>,
    {
        M::convert(self)
    }
}

// ============================================================================
// Result Assembly
// ============================================================================

/// Fill a fresh result collection from a finalized summary.
pub(crate) fn fill_results<T: PrecisionToken>(
    summary: MomentsSummary<T>,
) -> Result<ResultCollection<T>, NumflowError> {
    let mut results = ResultCollection::new(FAMILY, RESULT_IDS);
    results.insert(ResultId::Sum, ResultValue::Dense(summary.sum))?;
    results.insert(ResultId::SumSquares, ResultValue::Dense(summary.sum_squares))?;
    results.insert(ResultId::Minimum, ResultValue::Dense(summary.minimum))?;
    results.insert(ResultId::Maximum, ResultValue::Dense(summary.maximum))?;
    results.insert(ResultId::Mean, ResultValue::Dense(summary.mean))?;
    results.insert(ResultId::Variance, ResultValue::Dense(summary.variance))?;
    Ok(results)
}
