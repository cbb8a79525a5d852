//! Batch execution for the QR family.
//!
//! ## Purpose
//!
//! This module provides the one-shot execution mode: bind a data table,
//! call `compute`, read the factor pair.
//!
//! ## Design notes
//!
//! * **Idempotent**: Batch compute factorizes from scratch per call, so
//!   re-invoking with unchanged inputs reproduces the same factors.
//!
//! ## Invariants
//!
//! * The `data` input must be bound before `compute` and must be at least
//!   as tall as it is wide.
//!
//! ## Non-goals
//!
//! * This mode does not accumulate across calls (use the online mode).

// External dependencies
use log::debug;

// Internal dependencies
use crate::api::{Batch, ProcessingMode};
use crate::engine::factorization::factorize;
use crate::engine::validator::Validator;
use crate::families::qr::{QrBuilder, QrMethod, FAMILY, INPUT_IDS, RESULT_IDS};
use crate::primitives::collection::{
    InputCollection, InputId, ResultCollection, ResultId, ResultValue,
};
use crate::primitives::errors::NumflowError;
use crate::primitives::precision::{Precision, PrecisionToken};

// ============================================================================
// Batch Builder
// ============================================================================

/// Builder for the batch QR processor.
#[derive(Debug, Clone)]
pub struct BatchQrBuilder<T: PrecisionToken> {
    /// Computational strategy.
    pub method: QrMethod,

    /// Tracks if any parameter was set multiple times (for validation).
    pub(crate) duplicate_param: Option<&'static str>,

    _precision: core::marker::PhantomData<T>,
}

impl<T: PrecisionToken> Default for BatchQrBuilder<T> {
    fn default() -> Self {
        Self {
            method: QrMethod::default(),
            duplicate_param: None,
            _precision: core::marker::PhantomData,
        }
    }
}

impl<T: PrecisionToken> ProcessingMode<QrBuilder<T>> for Batch {
    type Output = BatchQrBuilder<T>;

    fn convert(builder: QrBuilder<T>) -> Self::Output {
        let mut result = BatchQrBuilder::default();
        if let Some(method) = builder.method {
            result.method = method;
        }
        result.duplicate_param = builder.duplicate_param;
        result
    }
}

impl<T: PrecisionToken> BatchQrBuilder<T> {
    /// Build the batch processor.
    pub fn build(self) -> Result<BatchQr<T>, NumflowError> {
        Validator::validate_no_duplicates(self.duplicate_param)?;
        Ok(BatchQr {
            method: self.method,
            input: InputCollection::new(FAMILY, INPUT_IDS),
        })
    }
}

// ============================================================================
// Batch Processor
// ============================================================================

/// Batch QR processor.
#[derive(Clone)]
pub struct BatchQr<T: PrecisionToken> {
    method: QrMethod,
    input: InputCollection<T>,
}

impl<T: PrecisionToken> BatchQr<T> {
    /// The fixed computational strategy.
    pub fn method(&self) -> QrMethod {
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

    /// Factorize the currently bound input.
    pub fn compute(&self) -> Result<ResultCollection<T>, NumflowError> {
        let data = self.input.required_table(InputId::Data)?;
        Validator::validate_dense(data, "data")?;
        Validator::validate_tall(data.rows(), data.cols())?;
        debug!(
            "qr batch compute: {}x{}, {} precision",
            data.rows(),
            data.cols(),
            T::PRECISION
        );

        let factors = factorize(data)?;
        let mut results = ResultCollection::new(FAMILY, RESULT_IDS);
        results.insert(ResultId::MatrixQ, ResultValue::Dense(factors.q))?;
        results.insert(ResultId::MatrixR, ResultValue::Dense(factors.r))?;
        Ok(results)
    }
}
