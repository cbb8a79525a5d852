//! QR factorization algorithm family.
//!
//! ## Purpose
//!
//! This module provides the thin QR factorization family: an n x p table
//! (n >= p) is factorized into an orthogonal `matrix_q` and an upper
//! triangular `matrix_r`, in batch, online, and three-step distributed
//! processing modes.
//!
//! ## Design notes
//!
//! * **Unique Factors**: The engine normalizes the R diagonal non-negative,
//!   so the factors of full-column-rank data are unique and every
//!   processing mode converges to the same pair up to floating-point
//!   tolerance.
//! * **Merge-Based Modes**: Online and distributed execution factorize row
//!   blocks locally and combine the triangular factors through the engine's
//!   merge step.
//!
//! ## Key concepts
//!
//! * **Input set**: `data` only.
//! * **Result set**: `matrix_q` and `matrix_r` (batch/online); the
//!   distributed master exposes `matrix_r`, the final local steps expose
//!   their `matrix_q` block.
//!
//! ## Invariants
//!
//! * Every factorized block must have at least as many rows as columns.
//!
//! ## Non-goals
//!
//! * No pivoting or rank-revealing variants.

// Internal dependencies
use crate::api::ProcessingMode;
use crate::primitives::collection::{InputId, ResultId};
use crate::primitives::precision::PrecisionToken;

/// Batch execution for QR.
pub mod batch;

/// Online execution for QR.
pub mod online;

/// Distributed execution for QR.
pub mod distributed;

pub(crate) const FAMILY: &str = "qr";

/// Accepted input identifiers of the family.
pub const INPUT_IDS: &[InputId] = &[InputId::Data];

/// Declared result identifiers of the batch and online modes.
pub const RESULT_IDS: &[ResultId] = &[ResultId::MatrixQ, ResultId::MatrixR];

/// Declared result identifiers of the distributed master step.
pub const MASTER_RESULT_IDS: &[ResultId] = &[ResultId::MatrixR];

/// Declared result identifiers of the distributed final local step.
pub const LOCAL_RESULT_IDS: &[ResultId] = &[ResultId::MatrixQ];

// ============================================================================
// Method
// ============================================================================

/// Computational strategy for the QR family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QrMethod {
    /// Householder factorization of a dense table.
    #[default]
    DefaultDense,
}

impl QrMethod {
    /// Get the name of the method.
    pub const fn name(&self) -> &'static str {
        match self {
            QrMethod::DefaultDense => "default_dense",
        }
    }
}

// ============================================================================
// Family Builder
// ============================================================================

/// Fluent builder for configuring a QR factorization.
///
/// The family has no tunable parameters; the builder exists to keep the
/// construction flow uniform with the other families:
///
/// ```
/// use numflow::prelude::*;
///
/// let algorithm = Qr::<f64>::new().mode(Batch).build()?;
/// # let _ = algorithm;
/// # Result::<(), NumflowError>::Ok(())
/// ```
#[derive(Debug, Clone)]
pub struct QrBuilder<T: PrecisionToken> {
    /// Computational strategy.
    pub(crate) method: Option<QrMethod>,

    /// Tracks if any parameter was set multiple times (for validation).
    pub(crate) duplicate_param: Option<&'static str>,

    pub(crate) _precision: core::marker::PhantomData<T>,
}

impl<T: PrecisionToken> Default for QrBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: PrecisionToken> QrBuilder<T> {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self {
            method: None,
            duplicate_param: None,
            _precision: core::marker::PhantomData,
        }
    }

    /// Set the computational strategy.
    pub fn method(mut self, method: QrMethod) -> Self {
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
