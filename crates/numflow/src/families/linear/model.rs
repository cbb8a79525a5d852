//! Trained linear-regression model artifact.
//!
//! ## Purpose
//!
//! This module defines [`LinearModel`], the persistable artifact produced
//! by linear-regression training and consumed by prediction. A model's
//! lifetime is independent of the algorithm object that produced it.
//!
//! ## Design notes
//!
//! * **Opaque at the Boundary**: The model travels through input/result
//!   collections as a [`ModelArtifact`]; only the linear family downcasts
//!   to the concrete type.
//! * **Persistable**: The model registers serialization tags per precision
//!   and round-trips through the tagged envelope.
//!
//! ## Invariants
//!
//! * The coefficient table is (features + intercept) x responses; with an
//!   intercept, its last row holds the intercept terms.
//!
//! ## Non-goals
//!
//! * The model stores no training diagnostics.

// External dependencies
use core::any::Any;
use serde::{Deserialize, Serialize};

// Internal dependencies
use crate::primitives::collection::ModelArtifact;
use crate::primitives::precision::PrecisionToken;
use crate::primitives::serial::{Persistable, SerializationTag};
use crate::primitives::table::NumericTable;

// ============================================================================
// Linear Model
// ============================================================================

/// Coefficients of a trained linear-regression model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModel<T> {
    coefficients: NumericTable<T>,
    intercept: bool,
}

impl<T: PrecisionToken> LinearModel<T> {
    /// Create a model from a coefficient table.
    pub(crate) fn new(coefficients: NumericTable<T>, intercept: bool) -> Self {
        Self {
            coefficients,
            intercept,
        }
    }

    /// The coefficient table, (features + intercept) x responses.
    pub fn coefficients(&self) -> &NumericTable<T> {
        &self.coefficients
    }

    /// Whether the model carries an intercept row.
    pub fn intercept(&self) -> bool {
        self.intercept
    }

    /// Number of feature columns the model expects.
    pub fn features(&self) -> usize {
        self.coefficients.rows() - usize::from(self.intercept)
    }

    /// Number of response columns the model produces.
    pub fn responses(&self) -> usize {
        self.coefficients.cols()
    }
}

impl<T: PrecisionToken> ModelArtifact for LinearModel<T> {
    fn artifact_name(&self) -> &'static str {
        "linear regression model"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ============================================================================
// Serialization Tags
// ============================================================================

impl Persistable for LinearModel<f32> {
    const TAG: SerializationTag = SerializationTag::LinearModelF32;
}

impl Persistable for LinearModel<f64> {
    const TAG: SerializationTag = SerializationTag::LinearModelF64;
}

// ============================================================================
// Tests
// ============================================================================
