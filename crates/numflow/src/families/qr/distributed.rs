//! Distributed execution for the QR family.
//!
//! ## Purpose
//!
//! This module provides the three-step distributed pipeline:
//!
//! 1. **Step 1 (local)** — one instance per partition factorizes that
//!    partition's rows, producing a triangular partial for the master and an
//!    orthogonal partial the partition keeps for step 3.
//! 2. **Step 2 (master)** — fans in every partition's triangular partial by
//!    partition index, merges them into the global `matrix_r`, and produces
//!    one correction partial per partition.
//! 3. **Step 3 (local)** — one instance per partition rotates its retained
//!    orthogonal partial with the matching correction, producing that
//!    partition's block of the global `matrix_q`.
//!
//! ## Design notes
//!
//! * **Typed Hand-Off**: Each step's output type is exactly the next step's
//!    input type, so wiring mistakes fail at compile time rather than by
//!    convention.
//! * **Index Carrying**: Partials carry their partition index, and step 3
//!    rejects a local/correction pair whose indices disagree; the silent
//!    wrong-result mode of index mixups becomes a typed error.
//! * **Serializable Fan-In**: The triangular partial crosses process
//!    boundaries in real deployments, so it registers serialization tags.
//!
//! ## Invariants
//!
//! * The master merges triangular partials in ascending partition order,
//!   which makes the correction-to-partition mapping deterministic.
//! * Every partition's data block must be at least as tall as it is wide.
//!
//! ## Non-goals
//!
//! * No fault tolerance and no dynamic rebalancing: a failed step 1 stalls
//!   the pipeline.

// External dependencies
use log::debug;
use serde::{Deserialize, Serialize};

// Internal dependencies
use crate::api::{Distributed, ProcessingMode};
use crate::engine::factorization::{factorize, merge_triangular};
use crate::engine::ops::matmul;
use crate::engine::validator::Validator;
use crate::families::qr::{
    QrBuilder, QrMethod, FAMILY, INPUT_IDS, LOCAL_RESULT_IDS, MASTER_RESULT_IDS,
};
use crate::primitives::collection::{
    InputCollection, InputId, PartialCollection, ResultCollection, ResultId, ResultValue,
};
use crate::primitives::errors::NumflowError;
use crate::primitives::precision::{Precision, PrecisionToken};
use crate::primitives::serial::{Persistable, SerializationTag};
use crate::primitives::table::NumericTable;

// ============================================================================
// Step Artifacts
// ============================================================================

/// Triangular partial produced by step 1 for the master.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QrTriangularPartial<T> {
    /// Producing partition index.
    pub partition: usize,

    /// The partition's p x p triangular factor.
    pub factor: NumericTable<T>,
}

impl Persistable for QrTriangularPartial<f32> {
    const TAG: SerializationTag = SerializationTag::TriangularPartialF32;
}

impl Persistable for QrTriangularPartial<f64> {
    const TAG: SerializationTag = SerializationTag::TriangularPartialF64;
}

/// Orthogonal partial retained by a partition for step 3.
#[derive(Debug, Clone, PartialEq)]
pub struct QrOrthogonalPartial<T> {
    /// Producing partition index.
    pub partition: usize,

    /// The partition's local orthogonal factor.
    pub factor: NumericTable<T>,
}

/// Correction partial produced by the master for one partition's step 3.
#[derive(Debug, Clone, PartialEq)]
pub struct QrCorrectionPartial<T> {
    /// Destination partition index.
    pub partition: usize,

    /// The p x p rotation onto the global orthogonal factor.
    pub factor: NumericTable<T>,
}

/// Output of one partition's step 1.
#[derive(Debug, Clone, PartialEq)]
pub struct QrStep1Output<T> {
    /// Partial destined for the master's fan-in.
    pub for_master: QrTriangularPartial<T>,

    /// Partial the partition retains for its step 3.
    pub for_local: QrOrthogonalPartial<T>,
}

// ============================================================================
// Distributed Builder
// ============================================================================

/// Builder for the distributed QR pipeline.
///
/// One builder configures the whole pipeline; `build_step1`/`build_step3`
/// are called once per partition and `build_step2` once for the master.
#[derive(Debug, Clone)]
pub struct DistributedQrBuilder<T: PrecisionToken> {
    /// Computational strategy.
    pub method: QrMethod,

    /// Number of partitions fixed for the pipeline.
    pub partitions: usize,

    /// Tracks if any parameter was set multiple times (for validation).
    pub(crate) duplicate_param: Option<&'static str>,

    _precision: core::marker::PhantomData<T>,
}

impl<T: PrecisionToken> Default for DistributedQrBuilder<T> {
    fn default() -> Self {
        Self {
            method: QrMethod::default(),
            partitions: 1,
            duplicate_param: None,
            _precision: core::marker::PhantomData,
        }
    }
}

impl<T: PrecisionToken> ProcessingMode<QrBuilder<T>> for Distributed {
    type Output = DistributedQrBuilder<T>;

    fn convert(builder: QrBuilder<T>) -> Self::Output {
        let mut result = DistributedQrBuilder::default();
        if let Some(method) = builder.method {
            result.method = method;
        }
        result.duplicate_param = builder.duplicate_param;
        result
    }
}

impl<T: PrecisionToken> DistributedQrBuilder<T> {
    /// Fix the number of partitions of the pipeline.
    pub fn partitions(mut self, partitions: usize) -> Self {
        self.partitions = partitions;
        self
    }

    /// Build the first local step for one partition.
    pub fn build_step1(&self, partition: usize) -> Result<QrStep1Local<T>, NumflowError> {
        Validator::validate_no_duplicates(self.duplicate_param)?;
        Validator::validate_partitions(self.partitions)?;
        if partition >= self.partitions {
            return Err(NumflowError::PartitionOutOfRange {
                index: partition,
                partitions: self.partitions,
            });
        }
        Ok(QrStep1Local {
            partition,
            input: InputCollection::new(FAMILY, INPUT_IDS),
        })
    }

    /// Build the master step.
    pub fn build_step2(&self) -> Result<QrStep2Master<T>, NumflowError> {
        Validator::validate_no_duplicates(self.duplicate_param)?;
        Validator::validate_partitions(self.partitions)?;
        Ok(QrStep2Master {
            fan_in: PartialCollection::new(self.partitions),
            matrix_r: None,
            finalized: false,
        })
    }

    /// Build the final local step for one partition.
    pub fn build_step3(&self, partition: usize) -> Result<QrStep3Local<T>, NumflowError> {
        Validator::validate_no_duplicates(self.duplicate_param)?;
        Validator::validate_partitions(self.partitions)?;
        if partition >= self.partitions {
            return Err(NumflowError::PartitionOutOfRange {
                index: partition,
                partitions: self.partitions,
            });
        }
        Ok(QrStep3Local {
            partition,
            local: None,
            correction: None,
        })
    }
}

// ============================================================================
// Step 1: Local Factorization
// ============================================================================

/// Per-partition first step of the distributed QR pipeline.
#[derive(Clone)]
pub struct QrStep1Local<T: PrecisionToken> {
    partition: usize,
    input: InputCollection<T>,
}

impl<T: PrecisionToken> QrStep1Local<T> {
    /// The partition this step belongs to.
    pub fn partition(&self) -> usize {
        self.partition
    }

    /// The fixed precision.
    pub fn precision(&self) -> Precision {
        T::PRECISION
    }

    /// Mutable access to the input collection.
    pub fn input_mut(&mut self) -> &mut InputCollection<T> {
        &mut self.input
    }

    /// Factorize this partition's data block.
    pub fn compute(&self) -> Result<QrStep1Output<T>, NumflowError> {
        let data = self.input.required_table(InputId::Data)?;
        Validator::validate_dense(data, "data")?;
        Validator::validate_tall(data.rows(), data.cols())?;
        debug!(
            "qr step1 compute: partition {}, {}x{}",
            self.partition,
            data.rows(),
            data.cols()
        );

        let factors = factorize(data)?;
        Ok(QrStep1Output {
            for_master: QrTriangularPartial {
                partition: self.partition,
                factor: factors.r,
            },
            for_local: QrOrthogonalPartial {
                partition: self.partition,
                factor: factors.q,
            },
        })
    }
}

// ============================================================================
// Step 2: Master Merge
// ============================================================================

/// Master step of the distributed QR pipeline.
pub struct QrStep2Master<T: PrecisionToken> {
    fan_in: PartialCollection<QrTriangularPartial<T>>,
    matrix_r: Option<NumericTable<T>>,
    finalized: bool,
}

impl<T: PrecisionToken> QrStep2Master<T> {
    /// Mutable access to the partition-indexed fan-in.
    pub fn input_mut(&mut self) -> &mut PartialCollection<QrTriangularPartial<T>> {
        &mut self.fan_in
    }

    /// Merge every partition's triangular partial.
    ///
    /// Returns the per-partition correction partials in ascending partition
    /// order; the global `matrix_r` is retained for `finalize`.
    pub fn compute(&mut self) -> Result<Vec<QrCorrectionPartial<T>>, NumflowError> {
        if self.finalized {
            return Err(NumflowError::HandleFinalized { family: FAMILY });
        }
        let drained = self.fan_in.drain_complete()?;
        debug!("qr step2 compute: merging {} partials", drained.len());

        let factors: Vec<&NumericTable<T>> = drained.iter().map(|(_, p)| &p.factor).collect();
        let (matrix_r, corrections) = merge_triangular(&factors)?;
        self.matrix_r = Some(matrix_r);

        Ok(drained
            .iter()
            .zip(corrections)
            .map(|((partition, _), factor)| QrCorrectionPartial {
                partition: *partition,
                factor,
            })
            .collect())
    }

    /// Produce the master result set (`matrix_r`).
    pub fn finalize(&mut self) -> Result<ResultCollection<T>, NumflowError> {
        if self.finalized {
            return Err(NumflowError::HandleFinalized { family: FAMILY });
        }
        let matrix_r = self
            .matrix_r
            .take()
            .ok_or(NumflowError::ResultNotReady { family: FAMILY })?;
        let mut results = ResultCollection::new(FAMILY, MASTER_RESULT_IDS);
        results.insert(ResultId::MatrixR, ResultValue::Dense(matrix_r))?;
        self.finalized = true;
        Ok(results)
    }
}

// ============================================================================
// Step 3: Local Reconstruction
// ============================================================================

/// Per-partition final step of the distributed QR pipeline.
#[derive(Clone)]
pub struct QrStep3Local<T: PrecisionToken> {
    partition: usize,
    local: Option<QrOrthogonalPartial<T>>,
    correction: Option<QrCorrectionPartial<T>>,
}

impl<T: PrecisionToken> QrStep3Local<T> {
    /// The partition this step belongs to.
    pub fn partition(&self) -> usize {
        self.partition
    }

    /// Bind the orthogonal partial retained from this partition's step 1.
    pub fn set_local(&mut self, partial: QrOrthogonalPartial<T>) -> Result<(), NumflowError> {
        if partial.partition != self.partition {
            return Err(NumflowError::PartitionMismatch {
                expected: self.partition,
                got: partial.partition,
            });
        }
        self.local = Some(partial);
        Ok(())
    }

    /// Bind the correction partial produced by the master for this
    /// partition.
    pub fn set_correction(&mut self, partial: QrCorrectionPartial<T>) -> Result<(), NumflowError> {
        if partial.partition != self.partition {
            return Err(NumflowError::PartitionMismatch {
                expected: self.partition,
                got: partial.partition,
            });
        }
        self.correction = Some(partial);
        Ok(())
    }

    /// Rotate the local orthogonal factor onto the global one.
    pub fn compute(&self) -> Result<ResultCollection<T>, NumflowError> {
        let local = self.local.as_ref().ok_or(NumflowError::MissingInput {
            family: FAMILY,
            id: InputId::LocalFactor,
        })?;
        let correction = self
            .correction
            .as_ref()
            .ok_or(NumflowError::MissingInput {
                family: FAMILY,
                id: InputId::MasterFactor,
            })?;
        debug!(
            "qr step3 compute: partition {}, {} rows",
            self.partition,
            local.factor.rows()
        );

        let matrix_q = matmul(&local.factor, &correction.factor)?;
        let mut results = ResultCollection::new(FAMILY, LOCAL_RESULT_IDS);
        results.insert(ResultId::MatrixQ, ResultValue::Dense(matrix_q))?;
        Ok(results)
    }
}
