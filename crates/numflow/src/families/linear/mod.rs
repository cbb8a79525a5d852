//! Linear regression algorithm family.
//!
//! ## Purpose
//!
//! This module provides least-squares linear regression: a training side
//! that produces a persistable [`LinearModel`](model::LinearModel) in
//! batch, online, or distributed mode, and a prediction side that consumes
//! a trained model and a data table.
//!
//! ## Design notes
//!
//! * **Methods**: `NormEqDense` accumulates the normal equations and is
//!   available at both precisions and in every processing mode. `QrDense`
//!   solves through an orthogonal factorization for better conditioning; it
//!   is batch-only and double-precision-only, and those limits are enforced
//!   when the mode builder runs `build()`.
//! * **Ridge**: The optional ridge term penalizes the feature block only;
//!   it belongs to the normal-equations path and is rejected by `QrDense`.
//! * **Model Hand-Off**: Training exposes the model under the `model`
//!   result id; prediction consumes it under the `model` input id. The
//!   model outlives both algorithm objects.
//!
//! ## Key concepts
//!
//! * **Training input set**: `data`, `responses`.
//! * **Training result set**: `model`.
//! * **Prediction input set**: `data`, `model`.
//! * **Prediction result set**: `prediction`.
//!
//! ## Invariants
//!
//! * Method, precision, and the intercept choice are fixed once `build()`
//!   runs; the ridge term stays tunable between computes.
//!
//! ## Non-goals
//!
//! * No variance estimates or confidence intervals on coefficients.

// External dependencies
use num_traits::Float;

// Internal dependencies
use crate::api::ProcessingMode;
use crate::primitives::collection::{InputId, ResultId};
use crate::primitives::errors::NumflowError;
use crate::primitives::precision::{Precision, PrecisionToken};

/// Trained model artifact.
pub mod model;

/// Batch and online training.
pub mod train;

/// Distributed training.
pub mod distributed;

/// Batch prediction.
pub mod predict;

pub(crate) const FAMILY: &str = "linear";

/// Accepted input identifiers of the training side.
pub const TRAIN_INPUT_IDS: &[InputId] = &[InputId::Data, InputId::Responses];

/// Declared result identifiers of the training side.
pub const TRAIN_RESULT_IDS: &[ResultId] = &[ResultId::Model];

/// Accepted input identifiers of the prediction side.
pub const PREDICT_INPUT_IDS: &[InputId] = &[InputId::Data, InputId::Model];

/// Declared result identifiers of the prediction side.
pub const PREDICT_RESULT_IDS: &[ResultId] = &[ResultId::Prediction];

// ============================================================================
// Methods
// ============================================================================

/// Computational strategy for linear-regression training.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrainMethod {
    /// Normal-equations accumulation with a Cholesky solve.
    #[default]
    NormEqDense,

    /// Orthogonal-factorization solve (batch, double precision only).
    QrDense,
}

impl TrainMethod {
    /// Get the name of the method.
    pub const fn name(&self) -> &'static str {
        match self {
            TrainMethod::NormEqDense => "norm_eq_dense",
            TrainMethod::QrDense => "qr_dense",
        }
    }
}

/// Computational strategy for linear-regression prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PredictMethod {
    /// Dense product of the augmented data with the coefficients.
    #[default]
    DefaultDense,
}

impl PredictMethod {
    /// Get the name of the method.
    pub const fn name(&self) -> &'static str {
        match self {
            PredictMethod::DefaultDense => "default_dense",
        }
    }
}

/// Validate a training method against the fixed precision and mode.
pub(crate) fn validate_train_method<T: PrecisionToken>(
    method: TrainMethod,
    mode: &'static str,
) -> Result<(), NumflowError> {
    if method == TrainMethod::QrDense {
        if T::PRECISION != Precision::Double {
            return Err(NumflowError::UnsupportedPrecision {
                family: FAMILY,
                method: method.name(),
                precision: T::PRECISION,
            });
        }
        if mode != "batch" {
            return Err(NumflowError::UnsupportedMethod {
                family: FAMILY,
                method: method.name(),
                mode,
            });
        }
    }
    Ok(())
}

// ============================================================================
// Parameter Block
// ============================================================================

/// Tunable parameters of linear-regression training.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainParameters<T> {
    intercept: bool,
    ridge: T,
}

impl<T: Float> Default for TrainParameters<T> {
    fn default() -> Self {
        Self {
            intercept: true,
            ridge: T::zero(),
        }
    }
}

impl<T: Float> TrainParameters<T> {
    /// Whether an intercept column is modeled.
    pub fn intercept(&self) -> bool {
        self.intercept
    }

    /// Set whether an intercept column is modeled.
    pub fn set_intercept(&mut self, intercept: bool) {
        self.intercept = intercept;
    }

    /// The ridge regularization term.
    pub fn ridge(&self) -> T {
        self.ridge
    }

    /// Set the ridge regularization term.
    ///
    /// The value is range-checked by the engine at compute time.
    pub fn set_ridge(&mut self, ridge: T) {
        self.ridge = ridge;
    }
}

// ============================================================================
// Training Builder
// ============================================================================

/// Fluent builder for configuring linear-regression training.
///
/// ```
/// use numflow::prelude::*;
///
/// let trainer = LinearTraining::<f64>::new()
///     .method(TrainMethod::NormEqDense)
///     .intercept(true)
///     .ridge(0.1)
///     .mode(Batch)
///     .build()?;
/// # let _ = trainer;
/// # Result::<(), NumflowError>::Ok(())
/// ```
#[derive(Debug, Clone)]
pub struct TrainingBuilder<T: PrecisionToken> {
    /// Computational strategy.
    pub(crate) method: Option<TrainMethod>,

    /// Intercept choice.
    pub(crate) intercept: Option<bool>,

    /// Ridge regularization term.
    pub(crate) ridge: Option<T>,

    /// Tracks if any parameter was set multiple times (for validation).
    pub(crate) duplicate_param: Option<&'static str>,
}

impl<T: PrecisionToken> Default for TrainingBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: PrecisionToken> TrainingBuilder<T> {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self {
            method: None,
            intercept: None,
            ridge: None,
            duplicate_param: None,
        }
    }

    /// Set the computational strategy.
    pub fn method(mut self, method: TrainMethod) -> Self {
        if self.method.is_some() {
            self.duplicate_param = Some("method");
        }
        self.method = Some(method);
        self
    }

    /// Set whether an intercept column is modeled.
    pub fn intercept(mut self, intercept: bool) -> Self {
        if self.intercept.is_some() {
            self.duplicate_param = Some("intercept");
        }
        self.intercept = Some(intercept);
        self
    }

    /// Set the ridge regularization term.
    pub fn ridge(mut self, ridge: T) -> Self {
        if self.ridge.is_some() {
            self.duplicate_param = Some("ridge");
        }
        self.ridge = Some(ridge);
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
// Prediction Builder
// ============================================================================

/// Fluent builder for configuring linear-regression prediction.
#[derive(Debug, Clone)]
pub struct PredictionBuilder<T: PrecisionToken> {
    /// Computational strategy.
    pub(crate) method: Option<PredictMethod>,

    /// Tracks if any parameter was set multiple times (for validation).
    pub(crate) duplicate_param: Option<&'static str>,

    pub(crate) _precision: core::marker::PhantomData<T>,
}

impl<T: PrecisionToken> Default for PredictionBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: PrecisionToken> PredictionBuilder<T> {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self {
            method: None,
            duplicate_param: None,
            _precision: core::marker::PhantomData,
        }
    }

    /// Set the computational strategy.
    pub fn method(mut self, method: PredictMethod) -> Self {
        if self.method.is_some() {
            self.duplicate_param = Some("method");
        }
        self.method = Some(method);
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
