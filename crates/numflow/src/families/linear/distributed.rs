//! Distributed training for the linear family.
//!
//! ## Purpose
//!
//! This module provides the two-step distributed training pipeline: one
//! local step per data partition accumulating normal-equations state, and
//! one master step that fans the partials in by partition index, merges
//! them, and solves for the model.
//!
//! ## Design notes
//!
//! * **Additive Partials**: The normal-equations state sums exactly across
//!   partitions, so the pipeline reproduces batch training up to
//!   floating-point associativity.
//! * **Shared Configuration**: One builder configures every step, which
//!   keeps the intercept choice consistent between the local accumulators
//!   and the master's solve; a partial accumulated under a different shape
//!   is rejected at merge time.
//!
//! ## Invariants
//!
//! * Fan-in indices are unique and below the fixed partition count.
//! * Every partition must contribute before the master finalizes.
//!
//! ## Non-goals
//!
//! * No fault tolerance: a failed local step stalls the pipeline.

// External dependencies
use log::debug;
use std::sync::Arc;

// Internal dependencies
use crate::api::{Distributed, ProcessingMode};
use crate::engine::normal_equations::NormalEquationsPartial;
use crate::engine::validator::Validator;
use crate::families::linear::model::LinearModel;
use crate::families::linear::{
    validate_train_method, TrainMethod, TrainParameters, TrainingBuilder, FAMILY,
    TRAIN_INPUT_IDS, TRAIN_RESULT_IDS,
};
use crate::primitives::collection::{
    InputCollection, InputId, PartialCollection, ResultCollection, ResultId, ResultValue,
};
use crate::primitives::errors::NumflowError;
use crate::primitives::precision::{Precision, PrecisionToken};

// ============================================================================
// Distributed Builder
// ============================================================================

/// Builder for the distributed training pipeline.
///
/// One builder configures the whole pipeline; `build_step1` is called once
/// per partition and `build_step2` once for the master.
#[derive(Debug, Clone)]
pub struct DistributedTrainingBuilder<T: PrecisionToken> {
    /// Computational strategy.
    pub method: TrainMethod,

    /// Parameter block shared by every step.
    pub params: TrainParameters<T>,

    /// Number of partitions fixed for the pipeline.
    pub partitions: usize,

    /// Tracks if any parameter was set multiple times (for validation).
    pub(crate) duplicate_param: Option<&'static str>,
}

impl<T: PrecisionToken> Default for DistributedTrainingBuilder<T> {
    fn default() -> Self {
        Self {
            method: TrainMethod::default(),
            params: TrainParameters::default(),
            partitions: 1,
            duplicate_param: None,
        }
    }
}

impl<T: PrecisionToken> ProcessingMode<TrainingBuilder<T>> for Distributed {
    type Output = DistributedTrainingBuilder<T>;

    fn convert(builder: TrainingBuilder<T>) -> Self::Output {
        let mut result = DistributedTrainingBuilder::default();
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

impl<T: PrecisionToken> DistributedTrainingBuilder<T> {
    /// Fix the number of partitions of the pipeline.
    pub fn partitions(mut self, partitions: usize) -> Self {
        self.partitions = partitions;
        self
    }

    /// Build the local step for one partition.
    pub fn build_step1(&self, partition: usize) -> Result<TrainingStep1Local<T>, NumflowError> {
        Validator::validate_no_duplicates(self.duplicate_param)?;
        validate_train_method::<T>(self.method, "distributed")?;
        Validator::validate_partitions(self.partitions)?;
        if partition >= self.partitions {
            return Err(NumflowError::PartitionOutOfRange {
                index: partition,
                partitions: self.partitions,
            });
        }
        Ok(TrainingStep1Local {
            params: self.params,
            partition,
            input: InputCollection::new(FAMILY, TRAIN_INPUT_IDS),
        })
    }

    /// Build the master step.
    pub fn build_step2(&self) -> Result<TrainingStep2Master<T>, NumflowError> {
        Validator::validate_no_duplicates(self.duplicate_param)?;
        validate_train_method::<T>(self.method, "distributed")?;
        Validator::validate_partitions(self.partitions)?;
        Ok(TrainingStep2Master {
            params: self.params,
            fan_in: PartialCollection::new(self.partitions),
            finalized: false,
        })
    }
}

// ============================================================================
// Step 1: Local Accumulation
// ============================================================================

/// Per-partition local step of the distributed training pipeline.
#[derive(Debug, Clone)]
pub struct TrainingStep1Local<T: PrecisionToken> {
    params: TrainParameters<T>,
    partition: usize,
    input: InputCollection<T>,
}

impl<T: PrecisionToken> TrainingStep1Local<T> {
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

    /// Accumulate this partition's data into a partial result.
    pub fn compute(&self) -> Result<NormalEquationsPartial<T>, NumflowError> {
        let data = self.input.required_table(InputId::Data)?;
        let responses = self.input.required_table(InputId::Responses)?;
        Validator::validate_dense(data, "data")?;
        Validator::validate_dense(responses, "responses")?;
        Validator::validate_same_rows(data.rows(), responses.rows(), "training rows")?;
        debug!(
            "linear step1 compute: partition {}, {}x{}",
            self.partition,
            data.rows(),
            data.cols()
        );

        let mut partial = NormalEquationsPartial::new(
            data.cols(),
            responses.cols(),
            self.params.intercept(),
        );
        partial.update(data, responses)?;
        Ok(partial)
    }
}

// ============================================================================
// Step 2: Master Solve
// ============================================================================

/// Master step of the distributed training pipeline.
pub struct TrainingStep2Master<T: PrecisionToken> {
    params: TrainParameters<T>,
    fan_in: PartialCollection<NormalEquationsPartial<T>>,
    finalized: bool,
}

impl<T: PrecisionToken> TrainingStep2Master<T> {
    /// The parameter block.
    pub fn parameter(&self) -> &TrainParameters<T> {
        &self.params
    }

    /// Mutable access to the parameter block.
    pub fn parameter_mut(&mut self) -> &mut TrainParameters<T> {
        &mut self.params
    }

    /// Mutable access to the partition-indexed fan-in.
    pub fn input_mut(&mut self) -> &mut PartialCollection<NormalEquationsPartial<T>> {
        &mut self.fan_in
    }

    /// Merge every partition's partial, solve, and produce the model.
    pub fn finalize(&mut self) -> Result<ResultCollection<T>, NumflowError> {
        if self.finalized {
            return Err(NumflowError::HandleFinalized { family: FAMILY });
        }
        Validator::validate_ridge(self.params.ridge())?;
        let drained = self.fan_in.drain_complete()?;
        debug!("linear step2 finalize: merging {} partials", drained.len());

        let mut iter = drained.into_iter();
        let (_, mut merged) = iter
            .next()
            .ok_or(NumflowError::ResultNotReady { family: FAMILY })?;
        for (_, partial) in iter {
            merged.merge(&partial)?;
        }

        let coefficients = merged.solve(self.params.ridge())?;
        let model = LinearModel::new(coefficients, self.params.intercept());
        let mut results = ResultCollection::new(FAMILY, TRAIN_RESULT_IDS);
        results.insert(ResultId::Model, ResultValue::Model(Arc::new(model)))?;
        self.finalized = true;
        Ok(results)
    }
}
