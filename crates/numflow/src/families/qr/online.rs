//! Online execution for the QR family.
//!
//! ## Purpose
//!
//! This module provides the incremental execution mode: re-bind the `data`
//! input between `compute` calls to stream row blocks, then call `finalize`
//! exactly once to obtain the factors of the stacked data.
//!
//! ## Design notes
//!
//! * **Per-Chunk Factorization**: Each `compute` factorizes the bound chunk
//!   and retains only its factor pair; the raw chunk is released back to
//!   the caller.
//! * **Merge at Finalize**: `finalize` merges the retained triangular
//!   factors into the global R, rotates every retained local Q with its
//!   correction, and stacks the rotated blocks into the global Q.
//! * **Terminal Finalize**: A finalized handle rejects further `compute`
//!   and `finalize` calls with a lifecycle error.
//!
//! ## Invariants
//!
//! * Every chunk must have at least as many rows as columns.
//! * All chunks of one accumulation share a column count.
//! * Row order of the final Q matches the order chunks were supplied in.
//!
//! ## Non-goals
//!
//! * This mode does not bound memory in the row count: the orthogonal
//!   blocks of all chunks are retained until finalize.

// External dependencies
use log::debug;

// Internal dependencies
use crate::api::{Online, ProcessingMode};
use crate::engine::factorization::{factorize, merge_triangular, QrFactors};
use crate::engine::ops::matmul;
use crate::engine::validator::Validator;
use crate::families::qr::{QrBuilder, QrMethod, FAMILY, INPUT_IDS, RESULT_IDS};
use crate::primitives::collection::{
    InputCollection, InputId, ResultCollection, ResultId, ResultValue,
};
use crate::primitives::errors::NumflowError;
use crate::primitives::precision::{Precision, PrecisionToken};
use crate::primitives::table::NumericTable;

// ============================================================================
// Online Builder
// ============================================================================

/// Builder for the online QR processor.
#[derive(Debug, Clone)]
pub struct OnlineQrBuilder<T: PrecisionToken> {
    /// Computational strategy.
    pub method: QrMethod,

    /// Tracks if any parameter was set multiple times (for validation).
    pub(crate) duplicate_param: Option<&'static str>,

    _precision: core::marker::PhantomData<T>,
}

impl<T: PrecisionToken> Default for OnlineQrBuilder<T> {
    fn default() -> Self {
        Self {
            method: QrMethod::default(),
            duplicate_param: None,
            _precision: core::marker::PhantomData,
        }
    }
}

impl<T: PrecisionToken> ProcessingMode<QrBuilder<T>> for Online {
    type Output = OnlineQrBuilder<T>;

    fn convert(builder: QrBuilder<T>) -> Self::Output {
        let mut result = OnlineQrBuilder::default();
        if let Some(method) = builder.method {
            result.method = method;
        }
        result.duplicate_param = builder.duplicate_param;
        result
    }
}

impl<T: PrecisionToken> OnlineQrBuilder<T> {
    /// Build the online processor.
    pub fn build(self) -> Result<OnlineQr<T>, NumflowError> {
        Validator::validate_no_duplicates(self.duplicate_param)?;
        Ok(OnlineQr {
            method: self.method,
            input: InputCollection::new(FAMILY, INPUT_IDS),
            blocks: Vec::new(),
            finalized: false,
        })
    }
}

// ============================================================================
// Online Processor
// ============================================================================

/// Online QR processor.
pub struct OnlineQr<T: PrecisionToken> {
    method: QrMethod,
    input: InputCollection<T>,
    blocks: Vec<QrFactors<T>>,
    finalized: bool,
}

impl<T: PrecisionToken> OnlineQr<T> {
    /// The fixed computational strategy.
    pub fn method(&self) -> QrMethod {
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

    /// Number of chunks consumed so far.
    pub fn chunks(&self) -> usize {
        self.blocks.len()
    }

    /// Factorize the currently bound `data` chunk and retain its factors.
    pub fn compute(&mut self) -> Result<(), NumflowError> {
        if self.finalized {
            return Err(NumflowError::HandleFinalized { family: FAMILY });
        }
        let data = self.input.required_table(InputId::Data)?;
        Validator::validate_dense(data, "data")?;
        Validator::validate_tall(data.rows(), data.cols())?;
        if let Some(first) = self.blocks.first() {
            Validator::validate_same_cols(first.r.cols(), data.cols(), "online chunk columns")?;
        }
        debug!(
            "qr online compute: chunk #{} {}x{}",
            self.blocks.len(),
            data.rows(),
            data.cols()
        );
        self.blocks.push(factorize(data)?);
        Ok(())
    }

    /// Merge the retained factors and produce the result set.
    pub fn finalize(&mut self) -> Result<ResultCollection<T>, NumflowError> {
        if self.finalized {
            return Err(NumflowError::HandleFinalized { family: FAMILY });
        }
        if self.blocks.is_empty() {
            return Err(NumflowError::ResultNotReady { family: FAMILY });
        }
        debug!("qr online finalize: merging {} chunks", self.blocks.len());

        let triangular: Vec<&NumericTable<T>> = self.blocks.iter().map(|f| &f.r).collect();
        let (matrix_r, corrections) = merge_triangular(&triangular)?;

        let mut rotated = Vec::with_capacity(self.blocks.len());
        for (factors, correction) in self.blocks.iter().zip(&corrections) {
            rotated.push(matmul(&factors.q, correction)?);
        }
        let blocks: Vec<&NumericTable<T>> = rotated.iter().collect();
        let matrix_q = NumericTable::vstack(&blocks)?;

        let mut results = ResultCollection::new(FAMILY, RESULT_IDS);
        results.insert(ResultId::MatrixQ, ResultValue::Dense(matrix_q))?;
        results.insert(ResultId::MatrixR, ResultValue::Dense(matrix_r))?;
        self.finalized = true;
        Ok(results)
    }
}

impl<T: PrecisionToken> Clone for OnlineQr<T> {
    /// Copy method and input bindings into a fresh handle.
    ///
    /// The clone starts with empty accumulation state and shares nothing
    /// with the source.
    fn clone(&self) -> Self {
        Self {
            method: self.method,
            input: self.input.clone(),
            blocks: Vec::new(),
            finalized: false,
        }
    }
}
