//! Online execution for the moments family.
//!
//! ## Purpose
//!
//! This module provides the incremental execution mode: re-bind the `data`
//! input between `compute` calls to stream row chunks through the
//! accumulator, then call `finalize` exactly once to obtain the result set.
//!
//! ## Design notes
//!
//! * **Accumulating**: Each `compute` folds the currently bound chunk into
//!   the engine accumulator; no final statistics exist until `finalize`.
//! * **Terminal Finalize**: `finalize` consumes the accumulated state. Any
//!   later `compute` or `finalize` fails with a lifecycle error instead of
//!   silently reprocessing.
//! * **Ordering**: Chunks are accumulated in call order; the protocol never
//!   reorders or buffers.
//!
//! ## Invariants
//!
//! * All chunks of one accumulation share a column count.
//! * After a successful `finalize`, the handle accepts no further data.
//!
//! ## Non-goals
//!
//! * This mode does not window or evict rows; every accumulated row counts.

// External dependencies
use log::debug;

// Internal dependencies
use crate::api::{Online, ProcessingMode};
use crate::engine::moments::MomentsPartial;
use crate::engine::validator::Validator;
use crate::families::moments::{
    fill_results, MomentsBuilder, MomentsMethod, MomentsParameters, FAMILY, INPUT_IDS,
};
use crate::primitives::collection::{InputCollection, InputId, ResultCollection};
use crate::primitives::errors::NumflowError;
use crate::primitives::precision::{Precision, PrecisionToken};

// ============================================================================
// Online Builder
// ============================================================================

/// Builder for the online moments processor.
#[derive(Debug, Clone)]
pub struct OnlineMomentsBuilder<T: PrecisionToken> {
    /// Computational strategy.
    pub method: MomentsMethod,

    /// Parameter block seeded into the built algorithm.
    pub params: MomentsParameters,

    /// Tracks if any parameter was set multiple times (for validation).
    pub(crate) duplicate_param: Option<&'static str>,

    _precision: core::marker::PhantomData<T>,
}

impl<T: PrecisionToken> Default for OnlineMomentsBuilder<T> {
    fn default() -> Self {
        Self {
            method: MomentsMethod::default(),
            params: MomentsParameters::default(),
            duplicate_param: None,
            _precision: core::marker::PhantomData,
        }
    }
}

impl<T: PrecisionToken> ProcessingMode<MomentsBuilder<T>> for Online {
    type Output = OnlineMomentsBuilder<T>;

    fn convert(builder: MomentsBuilder<T>) -> Self::Output {
        let mut result = OnlineMomentsBuilder::default();
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

impl<T: PrecisionToken> OnlineMomentsBuilder<T> {
    /// Set the computational strategy.
    pub fn method(mut self, method: MomentsMethod) -> Self {
        self.method = method;
        self
    }

    /// Build the online processor.
    pub fn build(self) -> Result<OnlineMoments<T>, NumflowError> {
        Validator::validate_no_duplicates(self.duplicate_param)?;
        Ok(OnlineMoments {
            method: self.method,
            params: self.params,
            input: InputCollection::new(FAMILY, INPUT_IDS),
            partial: None,
            finalized: false,
        })
    }
}

// ============================================================================
// Online Processor
// ============================================================================

/// Online moments processor.
pub struct OnlineMoments<T: PrecisionToken> {
    method: MomentsMethod,
    params: MomentsParameters,
    input: InputCollection<T>,
    partial: Option<MomentsPartial<T>>,
    finalized: bool,
}

impl<T: PrecisionToken> OnlineMoments<T> {
    /// The fixed computational strategy.
    pub fn method(&self) -> MomentsMethod {
        self.method
    }

    /// The fixed precision.
    pub fn precision(&self) -> Precision {
        T::PRECISION
    }

    /// Mutable access to the input collection (re-bind `data` per chunk).
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

    /// The accumulated partial state, once at least one chunk was consumed.
    pub fn partial(&self) -> Option<&MomentsPartial<T>> {
        self.partial.as_ref()
    }

    /// Fold the currently bound `data` chunk into the accumulator.
    pub fn compute(&mut self) -> Result<&MomentsPartial<T>, NumflowError> {
        if self.finalized {
            return Err(NumflowError::HandleFinalized { family: FAMILY });
        }

        match self.method {
            MomentsMethod::DefaultDense => {
                let data = self.input.required_table(InputId::Data)?;
                Validator::validate_dense(data, "data")?;
                let partial = self
                    .partial
                    .get_or_insert_with(|| MomentsPartial::new(data.cols()));
                Validator::validate_same_cols(
                    partial.cols(),
                    data.cols(),
                    "online chunk columns",
                )?;
                debug!("moments online compute: chunk {}x{}", data.rows(), data.cols());
                partial.update_dense(data)?;
            }
            MomentsMethod::SinglePassCsr => {
                let data = self.input.required_csr(InputId::Data)?;
                Validator::validate_csr(data, "data")?;
                let partial = self
                    .partial
                    .get_or_insert_with(|| MomentsPartial::new(data.cols()));
                Validator::validate_same_cols(
                    partial.cols(),
                    data.cols(),
                    "online chunk columns",
                )?;
                debug!(
                    "moments online compute: CSR chunk {}x{}",
                    data.rows(),
                    data.cols()
                );
                partial.update_csr(data)?;
            }
        }

        self.partial
            .as_ref()
            .ok_or(NumflowError::ResultNotReady { family: FAMILY })
    }

    /// Consume the accumulated state and produce the result set.
    pub fn finalize(&mut self) -> Result<ResultCollection<T>, NumflowError> {
        if self.finalized {
            return Err(NumflowError::HandleFinalized { family: FAMILY });
        }
        let partial = self
            .partial
            .as_ref()
            .ok_or(NumflowError::ResultNotReady { family: FAMILY })?;
        let results = fill_results(partial.finalize(self.params.estimate())?)?;
        self.finalized = true;
        Ok(results)
    }
}

impl<T: PrecisionToken> Clone for OnlineMoments<T> {
    /// Copy method, parameters, and input bindings into a fresh handle.
    ///
    /// The clone starts with empty accumulation state and shares nothing
    /// with the source.
    fn clone(&self) -> Self {
        Self {
            method: self.method,
            params: self.params,
            input: self.input.clone(),
            partial: None,
            finalized: false,
        }
    }
}
