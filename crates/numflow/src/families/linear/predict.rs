//! Batch prediction for the linear family.
//!
//! ## Purpose
//!
//! This module provides the prediction side of the linear family: a batch
//! processor that consumes a trained model under the `model` input id and a
//! data table under `data`, producing the `prediction` table.
//!
//! ## Design notes
//!
//! * **Model Downcast**: The model arrives through the input collection as
//!   an opaque artifact; a model of a different family fails with a typed
//!   mismatch, not a panic.
//! * **Shape Check**: The data's feature count must match what the model
//!   was trained on; the check runs before any arithmetic.
//!
//! ## Invariants
//!
//! * The prediction table is rows x responses.
//!
//! ## Non-goals
//!
//! * No prediction intervals or leverage diagnostics.

// External dependencies
use log::debug;

// Internal dependencies
use crate::api::{Batch, ProcessingMode};
use crate::engine::normal_equations::augment;
use crate::engine::ops::matmul;
use crate::engine::validator::Validator;
use crate::families::linear::model::LinearModel;
use crate::families::linear::{
    PredictMethod, PredictionBuilder, FAMILY, PREDICT_INPUT_IDS, PREDICT_RESULT_IDS,
};
use crate::primitives::collection::{
    InputCollection, InputId, ResultCollection, ResultId, ResultValue,
};
use crate::primitives::errors::NumflowError;
use crate::primitives::precision::{Precision, PrecisionToken};
use crate::primitives::table::NumericTable;

// ============================================================================
// Batch Builder
// ============================================================================

/// Builder for the batch prediction processor.
#[derive(Debug, Clone)]
pub struct BatchPredictionBuilder<T: PrecisionToken> {
    /// Computational strategy.
    pub method: PredictMethod,

    /// Tracks if any parameter was set multiple times (for validation).
    pub(crate) duplicate_param: Option<&'static str>,

    _precision: core::marker::PhantomData<T>,
}

impl<T: PrecisionToken> Default for BatchPredictionBuilder<T> {
    fn default() -> Self {
        Self {
            method: PredictMethod::default(),
            duplicate_param: None,
            _precision: core::marker::PhantomData,
        }
    }
}

impl<T: PrecisionToken> ProcessingMode<PredictionBuilder<T>> for Batch {
    type Output = BatchPredictionBuilder<T>;

    fn convert(builder: PredictionBuilder<T>) -> Self::Output {
        let mut result = BatchPredictionBuilder::default();
        if let Some(method) = builder.method {
            result.method = method;
        }
        result.duplicate_param = builder.duplicate_param;
        result
    }
}

impl<T: PrecisionToken> BatchPredictionBuilder<T> {
    /// Build the batch predictor.
    pub fn build(self) -> Result<BatchPrediction<T>, NumflowError> {
        Validator::validate_no_duplicates(self.duplicate_param)?;
        Ok(BatchPrediction {
            method: self.method,
            input: InputCollection::new(FAMILY, PREDICT_INPUT_IDS),
        })
    }
}

// ============================================================================
// Batch Predictor
// ============================================================================

/// Batch linear-regression predictor.
#[derive(Clone)]
pub struct BatchPrediction<T: PrecisionToken> {
    method: PredictMethod,
    input: InputCollection<T>,
}

impl<T: PrecisionToken> BatchPrediction<T> {
    /// The fixed computational strategy.
    pub fn method(&self) -> PredictMethod {
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

    /// Predict responses for the currently bound inputs.
    pub fn compute(&self) -> Result<ResultCollection<T>, NumflowError> {
        let model = self.input.required_model::<LinearModel<T>>(InputId::Model)?;
        let data = self.input.required_table(InputId::Data)?;
        Validator::validate_dense(data, "data")?;
        Validator::validate_same_cols(model.features(), data.cols(), "prediction features")?;
        debug!(
            "linear predict: {} rows through a {}-feature model",
            data.rows(),
            model.features()
        );

        let d = data.cols() + usize::from(model.intercept());
        let augmented = NumericTable::new(data.rows(), d, augment(data, model.intercept()))?;
        let prediction = matmul(&augmented, model.coefficients())?;

        let mut results = ResultCollection::new(FAMILY, PREDICT_RESULT_IDS);
        results.insert(ResultId::Prediction, ResultValue::Dense(prediction))?;
        Ok(results)
    }
}
