//! Batch execution for the moments family.
//!
//! ## Purpose
//!
//! This module provides the one-shot execution mode: bind a data table,
//! call `compute`, read the full result set.
//!
//! ## Design notes
//!
//! * **Idempotent**: Batch compute builds a fresh accumulator per call, so
//!   re-invoking with unchanged inputs reproduces the same result.
//! * **Validated**: The accumulation runs only after the bound table passes
//!   the finite-value check.
//!
//! ## Invariants
//!
//! * The `data` input must be bound before `compute`.
//! * The bound table kind must match the method (dense vs. CSR).
//!
//! ## Non-goals
//!
//! * This mode does not accumulate across calls (use the online mode).

// External dependencies
use log::debug;

// Internal dependencies
use crate::api::{Batch, ProcessingMode};
use crate::engine::moments::MomentsPartial;
use crate::engine::validator::Validator;
use crate::families::moments::{
    fill_results, MomentsBuilder, MomentsMethod, MomentsParameters, FAMILY, INPUT_IDS,
};
use crate::primitives::collection::{InputCollection, InputId, ResultCollection};
use crate::primitives::errors::NumflowError;
use crate::primitives::precision::{Precision, PrecisionToken};

// ============================================================================
// Batch Builder
// ============================================================================

/// Builder for the batch moments processor.
#[derive(Debug, Clone)]
pub struct BatchMomentsBuilder<T: PrecisionToken> {
    /// Computational strategy.
    pub method: MomentsMethod,

    /// Parameter block seeded into the built algorithm.
    pub params: MomentsParameters,

    /// Tracks if any parameter was set multiple times (for validation).
    pub(crate) duplicate_param: Option<&'static str>,

    _precision: core::marker::PhantomData<T>,
}

impl<T: PrecisionToken> Default for BatchMomentsBuilder<T> {
    fn default() -> Self {
        Self {
            method: MomentsMethod::default(),
            params: MomentsParameters::default(),
            duplicate_param: None,
            _precision: core::marker::PhantomData,
        }
    }
}

impl<T: PrecisionToken> ProcessingMode<MomentsBuilder<T>> for Batch {
    type Output = BatchMomentsBuilder<T>;

    fn convert(builder: MomentsBuilder<T>) -> Self::Output {
        let mut result = BatchMomentsBuilder::default();
        if let Some(method) = builder.method {
            result.method = method;
        }
        if let Some(estimate) = builder.estimate {
            result.params.set_estimate(estimate);
        }
        result.duplicate_param = builder.duplicate_param;
        result
    }
}

impl<T: PrecisionToken> BatchMomentsBuilder<T> {
    /// Set the computational strategy.
    pub fn method(mut self, method: MomentsMethod) -> Self {
        self.method = method;
        self
    }

    /// Build the batch processor.
    pub fn build(self) -> Result<BatchMoments<T>, NumflowError> {
        Validator::validate_no_duplicates(self.duplicate_param)?;
        Ok(BatchMoments {
            method: self.method,
            params: self.params,
            input: InputCollection::new(FAMILY, INPUT_IDS),
        })
    }
}

// ============================================================================
// Batch Processor
// ============================================================================

/// Batch moments processor.
#[derive(Debug, Clone)]
pub struct BatchMoments<T: PrecisionToken> {
    method: MomentsMethod,
    params: MomentsParameters,
    input: InputCollection<T>,
}

impl<T: PrecisionToken> BatchMoments<T> {
    /// The fixed computational strategy.
    pub fn method(&self) -> MomentsMethod {
        self.method
    }

    /// The fixed precision.
    pub fn precision(&self) -> Precision {
        T::PRECISION
    }

    /// The input collection.
    pub fn input(&self) -> &InputCollection<T> {
        &self.input
    }

    /// Mutable access to the input collection.
    pub fn input_mut(&mut self) -> &mut InputCollection<T> {
        &mut self.input
    }

    /// The parameter block.
    pub fn parameter(&self) -> &MomentsParameters {
        &self.params
    }

    /// Mutable access to the parameter block.
    pub fn parameter_mut(&mut self) -> &mut MomentsParameters {
        &mut self.params
    }

    /// Run the computation over the currently bound input.
    pub fn compute(&self) -> Result<ResultCollection<T>, NumflowError> {
        let mut partial;
        match self.method {
            MomentsMethod::DefaultDense => {
                let data = self.input.required_table(InputId::Data)?;
                Validator::validate_dense(data, "data")?;
                debug!(
                    "moments batch compute: {}x{} dense, {} precision",
                    data.rows(),
                    data.cols(),
                    T::PRECISION
                );
                partial = MomentsPartial::new(data.cols());
                partial.update_dense(data)?;
            }
            MomentsMethod::SinglePassCsr => {
                let data = self.input.required_csr(InputId::Data)?;
                Validator::validate_csr(data, "data")?;
                debug!(
                    "moments batch compute: {}x{} CSR, {} precision",
                    data.rows(),
                    data.cols(),
                    T::PRECISION
                );
                partial = MomentsPartial::new(data.cols());
                partial.update_csr(data)?;
            }
        }
        fill_results(partial.finalize(self.params.estimate())?)
    }
}
