//! Batch and online training for the linear family.
//!
//! ## Purpose
//!
//! This module provides the in-memory training modes: one-shot batch
//! training over fully bound data, and incremental online training that
//! accumulates normal-equations state over re-bound chunks and solves at
//! `finalize`.
//!
//! ## Design notes
//!
//! * **Method Split**: Batch training dispatches on the method; the
//!   `QrDense` path factorizes the augmented design matrix and
//!   back-substitutes, the `NormEqDense` path accumulates and solves. The
//!   online mode is normal-equations only, enforced at `build()`.
//! * **Tunable Between Computes**: The ridge term may be changed on the
//!   built object between computes; the intercept choice is baked into the
//!   accumulated state and therefore fixed.
//!
//! ## Invariants
//!
//! * `data` and `responses` must be bound, row counts agreeing, before
//!   `compute`.
//! * After a successful online `finalize`, the handle accepts no further
//!   data.
//!
//! ## Non-goals
//!
//! * No standardization or feature scaling; callers prepare their tables.

// External dependencies
use log::debug;

// Internal dependencies
use crate::api::{Batch, Online, ProcessingMode};
use crate::engine::factorization::factorize;
use crate::engine::normal_equations::{augment, NormalEquationsPartial};
use crate::engine::ops::{transpose_matmul, upper_solve};
use crate::engine::validator::Validator;
use crate::families::linear::model::LinearModel;
use crate::families::linear::{
    validate_train_method, TrainMethod, TrainParameters, TrainingBuilder, FAMILY,
    TRAIN_INPUT_IDS, TRAIN_RESULT_IDS,
};
use crate::primitives::collection::{
    InputCollection, InputId, ResultCollection, ResultId, ResultValue,
};
use crate::primitives::errors::NumflowError;
use crate::primitives::precision::{Precision, PrecisionToken};
use crate::primitives::table::NumericTable;
use std::sync::Arc;

// ============================================================================
// Batch Builder
// ============================================================================

/// Builder for the batch training processor.
#[derive(Debug, Clone)]
pub struct BatchTrainingBuilder<T: PrecisionToken> {
    /// Computational strategy.
    pub method: TrainMethod,

    /// Parameter block seeded into the built algorithm.
    pub params: TrainParameters<T>,

    /// Tracks if any parameter was set multiple times (for validation).
    pub(crate) duplicate_param: Option<&'static str>,
}

impl<T: PrecisionToken> Default for BatchTrainingBuilder<T> {
    fn default() -> Self {
        Self {
            method: TrainMethod::default(),
            params: TrainParameters::default(),
            duplicate_param: None,
        }
    }
}

impl<T: PrecisionToken> ProcessingMode<TrainingBuilder<T>> for Batch {
    type Output = BatchTrainingBuilder<T>;

    fn convert(builder: TrainingBuilder<T>) -> Self::Output {
        let mut result = BatchTrainingBuilder::default();
        if let Some(method) = builder.method {
            result.method = method;
        }
        if let Some(intercept) = builder.intercept {
            result.params.set_intercept(intercept);
        }
        if let Some(ridge) = builder.ridge {
            result.params.set_ridge(ridge);
        }
        result.duplicate_param = builder.duplicate_param;
        result
    }
}

impl<T: PrecisionToken> BatchTrainingBuilder<T> {
    /// Set the computational strategy.
    pub fn method(mut self, method: TrainMethod) -> Self {
        self.method = method;
        self
    }

    /// Build the batch trainer.
    pub fn build(self) -> Result<BatchTraining<T>, NumflowError> {
        Validator::validate_no_duplicates(self.duplicate_param)?;
        validate_train_method::<T>(self.method, "batch")?;
        Ok(BatchTraining {
            method: self.method,
            params: self.params,
            input: InputCollection::new(FAMILY, TRAIN_INPUT_IDS),
        })
    }
}

// ============================================================================
// Batch Trainer
// ============================================================================

/// Batch linear-regression trainer.
#[derive(Debug, Clone)]
pub struct BatchTraining<T: PrecisionToken> {
    method: TrainMethod,
    params: TrainParameters<T>,
    input: InputCollection<T>,
}

impl<T: PrecisionToken> BatchTraining<T> {
    /// The fixed computational strategy.
    pub fn method(&self) -> TrainMethod {
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
    pub fn parameter(&self) -> &TrainParameters<T> {
        &self.params
    }

    /// Mutable access to the parameter block.
    pub fn parameter_mut(&mut self) -> &mut TrainParameters<T> {
        &mut self.params
    }

    /// Train a model over the currently bound inputs.
    pub fn compute(&self) -> Result<ResultCollection<T>, NumflowError> {
        let data = self.input.required_table(InputId::Data)?;
        let responses = self.input.required_table(InputId::Responses)?;
        Validator::validate_dense(data, "data")?;
        Validator::validate_dense(responses, "responses")?;
        Validator::validate_same_rows(data.rows(), responses.rows(), "training rows")?;
        Validator::validate_ridge(self.params.ridge())?;
        debug!(
            "linear batch train: {}x{} data, {} responses, method {}",
            data.rows(),
            data.cols(),
            responses.cols(),
            self.method.name()
        );

        let coefficients = match self.method {
            TrainMethod::NormEqDense => {
                let mut partial = NormalEquationsPartial::new(
                    data.cols(),
                    responses.cols(),
                    self.params.intercept(),
                );
                partial.update(data, responses)?;
                partial.solve(self.params.ridge())?
            }
            TrainMethod::QrDense => {
                if self.params.ridge() > T::zero() {
                    return Err(NumflowError::InvalidParameter {
                        parameter: "ridge",
                        message: "only supported by the norm_eq_dense method".into(),
                    });
                }
                let d = data.cols() + usize::from(self.params.intercept());
                Validator::validate_tall(data.rows(), d)?;
                let augmented =
                    NumericTable::new(data.rows(), d, augment(data, self.params.intercept()))?;
                let factors = factorize(&augmented)?;
                let mut projected = transpose_matmul(&factors.q, responses)?;
                let rhs_cols = projected.cols();
                upper_solve(&factors.r, projected.values_mut(), rhs_cols, FAMILY)?;
                projected
            }
        };

        let model = LinearModel::new(coefficients, self.params.intercept());
        let mut results = ResultCollection::new(FAMILY, TRAIN_RESULT_IDS);
        results.insert(ResultId::Model, ResultValue::Model(Arc::new(model)))?;
        Ok(results)
    }
}

// ============================================================================
// Online Builder
// ============================================================================

/// Builder for the online training processor.
#[derive(Debug, Clone)]
pub struct OnlineTrainingBuilder<T: PrecisionToken> {
    /// Computational strategy.
    pub method: TrainMethod,

    /// Parameter block seeded into the built algorithm.
    pub params: TrainParameters<T>,

    /// Tracks if any parameter was set multiple times (for validation).
    pub(crate) duplicate_param: Option<&'static str>,
}

impl<T: PrecisionToken> Default for OnlineTrainingBuilder<T> {
    fn default() -> Self {
        Self {
            method: TrainMethod::default(),
            params: TrainParameters::default(),
            duplicate_param: None,
        }
    }
}

impl<T: PrecisionToken> ProcessingMode<TrainingBuilder<T>> for Online {
    type Output = OnlineTrainingBuilder<T>;

    fn convert(builder: TrainingBuilder<T>) -> Self::Output {
        let mut result = OnlineTrainingBuilder::default();
        if let Some(method) = builder.method {
            result.method = method;
        }
        if let Some(intercept) = builder.intercept {
            result.params.set_intercept(intercept);
        }
        if let Some(ridge) = builder.ridge {
            result.params.set_ridge(ridge);
        }
        result.duplicate_param = builder.duplicate_param;
        result
    }
}

impl<T: PrecisionToken> OnlineTrainingBuilder<T> {
    /// Build the online trainer.
    pub fn build(self) -> Result<OnlineTraining<T>, NumflowError> {
        Validator::validate_no_duplicates(self.duplicate_param)?;
        validate_train_method::<T>(self.method, "online")?;
        Ok(OnlineTraining {
            params: self.params,
            input: InputCollection::new(FAMILY, TRAIN_INPUT_IDS),
            partial: None,
            finalized: false,
        })
    }
}

// ============================================================================
// Online Trainer
// ============================================================================

/// Online linear-regression trainer.
#[derive(Debug)]
pub struct OnlineTraining<T: PrecisionToken> {
    params: TrainParameters<T>,
    input: InputCollection<T>,
    partial: Option<NormalEquationsPartial<T>>,
    finalized: bool,
}

impl<T: PrecisionToken> OnlineTraining<T> {
    /// The fixed precision.
    pub fn precision(&self) -> Precision {
        T::PRECISION
    }

    /// Mutable access to the input collection (re-bind per chunk).
    pub fn input_mut(&mut self) -> &mut InputCollection<T> {
        &mut self.input
    }

    /// The parameter block.
    pub fn parameter(&self) -> &TrainParameters<T> {
        &self.params
    }

    /// Mutable access to the parameter block.
    pub fn parameter_mut(&mut self) -> &mut TrainParameters<T> {
        &mut self.params
    }

    /// The accumulated partial state, once at least one chunk was consumed.
    pub fn partial(&self) -> Option<&NormalEquationsPartial<T>> {
        self.partial.as_ref()
    }

    /// Fold the currently bound chunk into the accumulator.
    pub fn compute(&mut self) -> Result<&NormalEquationsPartial<T>, NumflowError> {
        if self.finalized {
            return Err(NumflowError::HandleFinalized { family: FAMILY });
        }
        let data = self.input.required_table(InputId::Data)?;
        let responses = self.input.required_table(InputId::Responses)?;
        Validator::validate_dense(data, "data")?;
        Validator::validate_dense(responses, "responses")?;
        Validator::validate_same_rows(data.rows(), responses.rows(), "training rows")?;
        debug!(
            "linear online train: chunk {}x{} data",
            data.rows(),
            data.cols()
        );

        let intercept = self.params.intercept();
        let partial = self.partial.get_or_insert_with(|| {
            NormalEquationsPartial::new(data.cols(), responses.cols(), intercept)
        });
        partial.update(data, responses)?;
        self.partial
            .as_ref()
            .ok_or(NumflowError::ResultNotReady { family: FAMILY })
    }

    /// Solve the accumulated system and produce the model.
    pub fn finalize(&mut self) -> Result<ResultCollection<T>, NumflowError> {
        if self.finalized {
            return Err(NumflowError::HandleFinalized { family: FAMILY });
        }
        Validator::validate_ridge(self.params.ridge())?;
        let partial = self
            .partial
            .as_ref()
            .ok_or(NumflowError::ResultNotReady { family: FAMILY })?;
        let coefficients = partial.solve(self.params.ridge())?;
        let model = LinearModel::new(coefficients, self.params.intercept());

        let mut results = ResultCollection::new(FAMILY, TRAIN_RESULT_IDS);
        results.insert(ResultId::Model, ResultValue::Model(Arc::new(model)))?;
        self.finalized = true;
        Ok(results)
    }
}

impl<T: PrecisionToken> Clone for OnlineTraining<T> {
    /// Copy parameters and input bindings into a fresh handle.
    ///
    /// The clone starts with empty accumulation state and shares nothing
    /// with the source.
    fn clone(&self) -> Self {
        Self {
            params: self.params,
            input: self.input.clone(),
            partial: None,
            finalized: false,
        }
    }
}
