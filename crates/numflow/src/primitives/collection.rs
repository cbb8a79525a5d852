//! Keyed input, result, and fan-in collections.
//!
//! ## Purpose
//!
//! This module implements the identifier-keyed containers of the invocation
//! protocol: the closed [`InputId`]/[`ResultId`] vocabularies, the
//! [`InputCollection`] an algorithm reads at compute time, the
//! [`ResultCollection`] a compute call returns, and the partition-indexed
//! [`PartialCollection`] used by distributed master steps.
//!
//! ## Design notes
//!
//! * **Closed Sets**: Identifiers are crate-wide enums; each family declares
//!   its accepted subset as a `const` slice and every access is checked
//!   against it.
//! * **Reference Semantics**: Input values are stored behind `Arc`; binding a
//!   table records a reference, never a copy, and re-binding the same id
//!   overwrites the previous binding.
//! * **Opaque Models**: Models travel through the input collection as
//!   `Arc<dyn ModelArtifact>`; the consuming family downcasts to its concrete
//!   model type and reports a typed mismatch otherwise.
//! * **Produced Results**: A [`ResultCollection`] only exists as the return
//!   value of a compute or finalize call, so reading a result before the
//!   producing call completes is impossible by construction.
//!
//! ## Invariants
//!
//! * Every stored entry's identifier is a member of the declared subset.
//! * At most one entry per identifier (last write wins).
//! * A [`PartialCollection`] holds at most one partial per partition index,
//!   all indices below the fixed partition count.
//!
//! ## Non-goals
//!
//! * This module does not decide which identifiers a family requires; the
//!   family's compute path checks required bindings itself.
//! * This module does not validate numeric content (see the engine validator).

// External dependencies
use core::any::Any;
use core::fmt::{Debug, Display, Formatter, Result as FmtResult};
use std::collections::BTreeMap;
use std::sync::Arc;

// Internal dependencies
use crate::primitives::errors::NumflowError;
use crate::primitives::precision::PrecisionToken;
use crate::primitives::table::{CsrTable, NumericTable};

// ============================================================================
// Identifier Enums
// ============================================================================

/// Identifiers for values bound to an algorithm before compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum InputId {
    /// Observation table (rows x features).
    Data,

    /// Response table for supervised training (rows x responses).
    Responses,

    /// Trained model consumed by a prediction algorithm.
    Model,

    /// A partition's own step-1 artifact, consumed by its final local step.
    LocalFactor,

    /// The master-produced artifact for a partition, consumed by its final
    /// local step.
    MasterFactor,
}

impl InputId {
    /// Get the name of the identifier.
    pub const fn name(&self) -> &'static str {
        match self {
            InputId::Data => "data",
            InputId::Responses => "responses",
            InputId::Model => "model",
            InputId::LocalFactor => "local_factor",
            InputId::MasterFactor => "master_factor",
        }
    }
}

impl Display for InputId {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.name())
    }
}

/// Identifiers for values exposed by a result collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ResultId {
    /// Per-column sums.
    Sum,

    /// Per-column sums of squares.
    SumSquares,

    /// Per-column minima.
    Minimum,

    /// Per-column maxima.
    Maximum,

    /// Per-column means.
    Mean,

    /// Per-column variances.
    Variance,

    /// Orthogonal factor of a factorization.
    MatrixQ,

    /// Upper-triangular factor of a factorization.
    MatrixR,

    /// Trained model artifact.
    Model,

    /// Predicted responses (rows x responses).
    Prediction,
}

impl ResultId {
    /// Get the name of the identifier.
    pub const fn name(&self) -> &'static str {
        match self {
            ResultId::Sum => "sum",
            ResultId::SumSquares => "sum_squares",
            ResultId::Minimum => "minimum",
            ResultId::Maximum => "maximum",
            ResultId::Mean => "mean",
            ResultId::Variance => "variance",
            ResultId::MatrixQ => "matrix_q",
            ResultId::MatrixR => "matrix_r",
            ResultId::Model => "model",
            ResultId::Prediction => "prediction",
        }
    }
}

impl Display for ResultId {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.name())
    }
}

// ============================================================================
// Model Artifact Trait
// ============================================================================

/// Opaque trained artifact exchanged between training and prediction.
///
/// The protocol layer treats models opaquely; a prediction family downcasts
/// to its concrete model type via [`ModelArtifact::as_any`].
pub trait ModelArtifact: Send + Sync {
    /// Name of the concrete model type, used in diagnostics.
    fn artifact_name(&self) -> &'static str;

    /// Downcast support.
    fn as_any(&self) -> &dyn Any;
}

// ============================================================================
// Input Collection
// ============================================================================

/// A value bound to an input identifier.
#[derive(Clone)]
pub enum InputValue<T: PrecisionToken> {
    /// Dense numeric table.
    Dense(Arc<NumericTable<T>>),

    /// Compressed sparse row table.
    Csr(Arc<CsrTable<T>>),

    /// Opaque trained model.
    Model(Arc<dyn ModelArtifact>),
}

impl<T: PrecisionToken> Debug for InputValue<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            InputValue::Dense(t) => f.debug_tuple("Dense").field(t).finish(),
            InputValue::Csr(t) => f.debug_tuple("Csr").field(t).finish(),
            InputValue::Model(m) => {
                f.debug_tuple("Model").field(&m.artifact_name()).finish()
            }
        }
    }
}

impl<T: PrecisionToken> InputValue<T> {
    /// Kind name used in mismatch diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            InputValue::Dense(_) => "dense table",
            InputValue::Csr(_) => "CSR table",
            InputValue::Model(_) => "model",
        }
    }
}

/// Identifier-keyed collection of input bindings.
///
/// Constructed empty by an algorithm builder with the family's accepted
/// identifier subset; every `set`/`get` is validated against that subset.
#[derive(Debug, Clone)]
pub struct InputCollection<T: PrecisionToken> {
    family: &'static str,
    accepted: &'static [InputId],
    entries: Vec<(InputId, InputValue<T>)>,
}

impl<T: PrecisionToken> InputCollection<T> {
    /// Create an empty collection for a family's accepted identifier set.
    pub(crate) fn new(family: &'static str, accepted: &'static [InputId]) -> Self {
        Self {
            family,
            accepted,
            entries: Vec::new(),
        }
    }

    /// The family's accepted identifier subset.
    pub fn accepted(&self) -> &'static [InputId] {
        self.accepted
    }

    fn check(&self, id: InputId) -> Result<(), NumflowError> {
        if self.accepted.contains(&id) {
            Ok(())
        } else {
            Err(NumflowError::UnsupportedInputId {
                family: self.family,
                id,
            })
        }
    }

    /// Bind a value to an identifier.
    ///
    /// Re-binding an identifier overwrites the previous binding; no history
    /// is kept.
    pub fn set(&mut self, id: InputId, value: InputValue<T>) -> Result<(), NumflowError> {
        self.check(id)?;
        if let Some(entry) = self.entries.iter_mut().find(|(k, _)| *k == id) {
            entry.1 = value;
        } else {
            self.entries.push((id, value));
        }
        Ok(())
    }

    /// Bind a dense table to an identifier.
    pub fn set_table(
        &mut self,
        id: InputId,
        table: Arc<NumericTable<T>>,
    ) -> Result<(), NumflowError> {
        self.set(id, InputValue::Dense(table))
    }

    /// Bind a CSR table to an identifier.
    pub fn set_csr(&mut self, id: InputId, table: Arc<CsrTable<T>>) -> Result<(), NumflowError> {
        self.set(id, InputValue::Csr(table))
    }

    /// Bind a model to an identifier.
    pub fn set_model(
        &mut self,
        id: InputId,
        model: Arc<dyn ModelArtifact>,
    ) -> Result<(), NumflowError> {
        self.set(id, InputValue::Model(model))
    }

    /// Get the binding for an identifier, if any.
    pub fn get(&self, id: InputId) -> Result<Option<&InputValue<T>>, NumflowError> {
        self.check(id)?;
        Ok(self.entries.iter().find(|(k, _)| *k == id).map(|(_, v)| v))
    }

    /// Get a required binding, failing if it was never set.
    pub fn required(&self, id: InputId) -> Result<&InputValue<T>, NumflowError> {
        self.get(id)?.ok_or(NumflowError::MissingInput {
            family: self.family,
            id,
        })
    }

    /// Get a required dense-table binding.
    pub fn required_table(&self, id: InputId) -> Result<&Arc<NumericTable<T>>, NumflowError> {
        match self.required(id)? {
            InputValue::Dense(table) => Ok(table),
            _ => Err(NumflowError::InputTypeMismatch {
                family: self.family,
                id,
                expected: "dense table",
            }),
        }
    }

    /// Get a required CSR-table binding.
    pub fn required_csr(&self, id: InputId) -> Result<&Arc<CsrTable<T>>, NumflowError> {
        match self.required(id)? {
            InputValue::Csr(table) => Ok(table),
            _ => Err(NumflowError::InputTypeMismatch {
                family: self.family,
                id,
                expected: "CSR table",
            }),
        }
    }

    /// Get a required model binding, downcast to a concrete model type.
    pub fn required_model<M: ModelArtifact + 'static>(
        &self,
        id: InputId,
    ) -> Result<&M, NumflowError> {
        match self.required(id)? {
            InputValue::Model(model) => {
                model
                    .as_any()
                    .downcast_ref::<M>()
                    .ok_or(NumflowError::InputTypeMismatch {
                        family: self.family,
                        id,
                        expected: "model of the consuming family",
                    })
            }
            _ => Err(NumflowError::InputTypeMismatch {
                family: self.family,
                id,
                expected: "model",
            }),
        }
    }
}

// ============================================================================
// Result Collection
// ============================================================================

/// A value exposed by a result collection.
#[derive(Clone)]
pub enum ResultValue<T: PrecisionToken> {
    /// Dense numeric table.
    Dense(NumericTable<T>),

    /// Opaque trained model.
    Model(Arc<dyn ModelArtifact>),
}

impl<T: PrecisionToken> Debug for ResultValue<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            ResultValue::Dense(t) => f.debug_tuple("Dense").field(t).finish(),
            ResultValue::Model(m) => {
                f.debug_tuple("Model").field(&m.artifact_name()).finish()
            }
        }
    }
}

/// Identifier-keyed collection of computed results.
///
/// Produced only by a `compute` or `finalize` call; exposes exactly the
/// family's declared result subset.
#[derive(Debug, Clone)]
pub struct ResultCollection<T: PrecisionToken> {
    family: &'static str,
    declared: &'static [ResultId],
    entries: Vec<(ResultId, ResultValue<T>)>,
}

impl<T: PrecisionToken> ResultCollection<T> {
    /// Create an empty collection for a family's declared result set.
    pub(crate) fn new(family: &'static str, declared: &'static [ResultId]) -> Self {
        Self {
            family,
            declared,
            entries: Vec::new(),
        }
    }

    /// The family's declared result subset.
    pub fn declared(&self) -> &'static [ResultId] {
        self.declared
    }

    fn check(&self, id: ResultId) -> Result<(), NumflowError> {
        if self.declared.contains(&id) {
            Ok(())
        } else {
            Err(NumflowError::UnsupportedResultId {
                family: self.family,
                id,
            })
        }
    }

    /// Insert a computed value. Only the engine-facing layer fills results.
    pub(crate) fn insert(&mut self, id: ResultId, value: ResultValue<T>) -> Result<(), NumflowError> {
        self.check(id)?;
        self.entries.push((id, value));
        Ok(())
    }

    /// Get a computed value.
    pub fn get(&self, id: ResultId) -> Result<&ResultValue<T>, NumflowError> {
        self.check(id)?;
        self.entries
            .iter()
            .find(|(k, _)| *k == id)
            .map(|(_, v)| v)
            .ok_or(NumflowError::ResultNotReady {
                family: self.family,
            })
    }

    /// Get a computed dense table.
    pub fn table(&self, id: ResultId) -> Result<&NumericTable<T>, NumflowError> {
        match self.get(id)? {
            ResultValue::Dense(table) => Ok(table),
            ResultValue::Model(_) => Err(NumflowError::UnsupportedResultId {
                family: self.family,
                id,
            }),
        }
    }

    /// Get a computed model, downcast to a concrete model type.
    pub fn model<M: ModelArtifact + Clone + 'static>(
        &self,
        id: ResultId,
    ) -> Result<M, NumflowError> {
        match self.get(id)? {
            ResultValue::Model(model) => model
                .as_any()
                .downcast_ref::<M>()
                .cloned()
                .ok_or(NumflowError::ResultNotReady {
                    family: self.family,
                }),
            ResultValue::Dense(_) => Err(NumflowError::UnsupportedResultId {
                family: self.family,
                id,
            }),
        }
    }
}

// ============================================================================
// Partial Collection (distributed fan-in)
// ============================================================================

/// Partition-indexed fan-in collection for a distributed master step.
///
/// The partition count is fixed when the master step is built; every
/// partition must contribute exactly one partial before finalize.
#[derive(Debug, Clone)]
pub struct PartialCollection<P> {
    partitions: usize,
    entries: BTreeMap<usize, P>,
}

impl<P> PartialCollection<P> {
    /// Create an empty fan-in for a fixed partition count.
    pub(crate) fn new(partitions: usize) -> Self {
        Self {
            partitions,
            entries: BTreeMap::new(),
        }
    }

    /// The fixed partition count.
    pub fn partitions(&self) -> usize {
        self.partitions
    }

    /// Number of partials supplied so far.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no partials have been supplied yet.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Add one partition's partial result.
    pub fn add(&mut self, partition: usize, partial: P) -> Result<(), NumflowError> {
        if partition >= self.partitions {
            return Err(NumflowError::PartitionOutOfRange {
                index: partition,
                partitions: self.partitions,
            });
        }
        if self.entries.contains_key(&partition) {
            return Err(NumflowError::DuplicatePartition { index: partition });
        }
        self.entries.insert(partition, partial);
        Ok(())
    }

    /// Consume the fan-in in partition order, failing unless every partition
    /// contributed.
    pub(crate) fn drain_complete(&mut self) -> Result<Vec<(usize, P)>, NumflowError> {
        if self.entries.len() != self.partitions {
            return Err(NumflowError::PartitionMismatch {
                expected: self.partitions,
                got: self.entries.len(),
            });
        }
        let drained = core::mem::take(&mut self.entries);
        Ok(drained.into_iter().collect())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const ACCEPTED: &[InputId] = &[InputId::Data];
    const DECLARED: &[ResultId] = &[ResultId::Mean];

    #[test]
    fn input_collection_rejects_foreign_id() {
        let mut input = InputCollection::<f64>::new("test", ACCEPTED);
        let table = Arc::new(NumericTable::new(1, 1, vec![1.0]).unwrap());
        let err = input.set_table(InputId::Model, table).unwrap_err();
        assert!(matches!(err, NumflowError::UnsupportedInputId { .. }));
    }

    #[test]
    fn input_rebinding_overwrites() {
        let mut input = InputCollection::<f64>::new("test", ACCEPTED);
        let a = Arc::new(NumericTable::new(1, 1, vec![1.0]).unwrap());
        let b = Arc::new(NumericTable::new(1, 1, vec![2.0]).unwrap());
        input.set_table(InputId::Data, a).unwrap();
        input.set_table(InputId::Data, b).unwrap();
        let bound = input.required_table(InputId::Data).unwrap();
        assert_eq!(bound.at(0, 0), 2.0);
    }

    #[test]
    fn result_collection_rejects_foreign_id() {
        let result = ResultCollection::<f64>::new("test", DECLARED);
        let err = result.table(ResultId::MatrixQ).unwrap_err();
        assert!(matches!(err, NumflowError::UnsupportedResultId { .. }));
    }

    #[test]
    fn fan_in_guards_indices() {
        let mut fan_in = PartialCollection::new(2);
        fan_in.add(0, 1u8).unwrap();
        assert!(matches!(
            fan_in.add(0, 2u8),
            Err(NumflowError::DuplicatePartition { index: 0 })
        ));
        assert!(matches!(
            fan_in.add(5, 2u8),
            Err(NumflowError::PartitionOutOfRange { .. })
        ));
        assert!(matches!(
            fan_in.drain_complete(),
            Err(NumflowError::PartitionMismatch {
                expected: 2,
                got: 1
            })
        ));
    }
}
