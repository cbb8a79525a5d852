//! Distributed execution for the moments family.
//!
//! ## Purpose
//!
//! This module provides the two-step distributed pipeline: one local step
//! per data partition producing an additive partial result, and one master
//! step that fans the partials in by partition index and finalizes the
//! global result set.
//!
//! ## Design notes
//!
//! * **Fixed Topology**: The partition count is a construction-time
//!   parameter of the pipeline; every partition must contribute exactly one
//!   partial before the master finalizes.
//! * **By-Value Hand-Off**: A local step returns its partial by value; the
//!   caller moves it into the master's fan-in and keeps no claim on it.
//! * **Caller Orchestration**: Steps run wherever the caller puts them; the
//!   protocol imposes no scheduling (the examples loop sequentially).
//!
//! ## Invariants
//!
//! * Fan-in indices are unique and below the fixed partition count.
//! * The master merges partials in ascending partition order.
//!
//! ## Non-goals
//!
//! * No fault tolerance: a failed local step stalls the pipeline.
//! * No cross-validation of partition contents; index agreement is the
//!   caller's responsibility.

// External dependencies
use log::debug;

// Internal dependencies
use crate::api::{Distributed, ProcessingMode};
use crate::engine::moments::MomentsPartial;
use crate::engine::validator::Validator;
use crate::families::moments::{
    fill_results, MomentsBuilder, MomentsMethod, MomentsParameters, FAMILY, INPUT_IDS,
};
use crate::primitives::collection::{
    InputCollection, InputId, PartialCollection, ResultCollection,
};
use crate::primitives::errors::NumflowError;
use crate::primitives::precision::{Precision, PrecisionToken};

// ============================================================================
// Distributed Builder
// ============================================================================

/// Builder for the distributed moments pipeline.
///
/// One builder configures the whole pipeline; `build_step1` is called once
/// per partition and `build_step2` once for the master.
#[derive(Debug, Clone)]
pub struct DistributedMomentsBuilder<T: PrecisionToken> {
    /// Computational strategy.
    pub method: MomentsMethod,

    /// Parameter block seeded into the master step.
    pub params: MomentsParameters,

    /// Number of partitions fixed for the pipeline.
    pub partitions: usize,

    /// Tracks if any parameter was set multiple times (for validation).
    pub(crate) duplicate_param: Option<&'static str>,

    _precision: core::marker::PhantomData<T>,
}

impl<T: PrecisionToken> Default for DistributedMomentsBuilder<T> {
    fn default() -> Self {
        Self {
            method: MomentsMethod::default(),
            params: MomentsParameters::default(),
            partitions: 1,
            duplicate_param: None,
            _precision: core::marker::PhantomData,
        }
    }
}

impl<T: PrecisionToken> ProcessingMode<MomentsBuilder<T>> for Distributed {
    type Output = DistributedMomentsBuilder<T>;

    fn convert(builder: MomentsBuilder<T>) -> Self::Output {
        let mut result = DistributedMomentsBuilder::default();
        if let Some(method) = builder.method {
            result.method = method;
        }
        if let Some(estimate) = builder.estimate {
            result.params.set_estimate(estimate);
        }
        result.duplicate_param = builder.duplicate_param;
        result
    }
}

impl<T: PrecisionToken> DistributedMomentsBuilder<T> {
    /// Set the computational strategy.
    pub fn method(mut self, method: MomentsMethod) -> Self {
        self.method = method;
        self
    }

    /// Fix the number of partitions of the pipeline.
    pub fn partitions(mut self, partitions: usize) -> Self {
        self.partitions = partitions;
        self
    }

    /// Build the local step for one partition.
    pub fn build_step1(&self, partition: usize) -> Result<MomentsStep1Local<T>, NumflowError> {
        Validator::validate_no_duplicates(self.duplicate_param)?;
        Validator::validate_partitions(self.partitions)?;
        if partition >= self.partitions {
            return Err(NumflowError::PartitionOutOfRange {
                index: partition,
                partitions: self.partitions,
            });
        }
        Ok(MomentsStep1Local {
            method: self.method,
            partition,
            input: InputCollection::new(FAMILY, INPUT_IDS),
        })
    }

    /// Build the master step.
    pub fn build_step2(&self) -> Result<MomentsStep2Master<T>, NumflowError> {
        Validator::validate_no_duplicates(self.duplicate_param)?;
        Validator::validate_partitions(self.partitions)?;
        Ok(MomentsStep2Master {
            params: self.params,
            fan_in: PartialCollection::new(self.partitions),
            finalized: false,
        })
    }
}

// ============================================================================
// Step 1: Local Accumulation
// ============================================================================

/// Per-partition local step of the distributed moments pipeline.
#[derive(Clone)]
pub struct MomentsStep1Local<T: PrecisionToken> {
    method: MomentsMethod,
    partition: usize,
    input: InputCollection<T>,
}

impl<T: PrecisionToken> MomentsStep1Local<T> {
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
    ///
    /// The partial is returned by value and is meant to be moved into the
    /// master's fan-in.
    pub fn compute(&self) -> Result<MomentsPartial<T>, NumflowError> {
        let mut partial;
        match self.method {
            MomentsMethod::DefaultDense => {
                let data = self.input.required_table(InputId::Data)?;
                Validator::validate_dense(data, "data")?;
                debug!(
                    "moments step1 compute: partition {}, {}x{}",
                    self.partition,
                    data.rows(),
                    data.cols()
                );
                partial = MomentsPartial::new(data.cols());
                partial.update_dense(data)?;
            }
            MomentsMethod::SinglePassCsr => {
                let data = self.input.required_csr(InputId::Data)?;
                Validator::validate_csr(data, "data")?;
                debug!(
                    "moments step1 compute: partition {}, CSR {}x{}",
                    self.partition,
                    data.rows(),
                    data.cols()
                );
                partial = MomentsPartial::new(data.cols());
                partial.update_csr(data)?;
            }
        }
        Ok(partial)
    }
}

// ============================================================================
// Step 2: Master Fan-In
// ============================================================================

/// Master step of the distributed moments pipeline.
#[derive(Debug)]
pub struct MomentsStep2Master<T: PrecisionToken> {
    params: MomentsParameters,
    fan_in: PartialCollection<MomentsPartial<T>>,
    finalized: bool,
}

impl<T: PrecisionToken> MomentsStep2Master<T> {
    /// The parameter block.
    pub fn parameter(&self) -> &MomentsParameters {
        &self.params
    }

    /// Mutable access to the parameter block.
    pub fn parameter_mut(&mut self) -> &mut MomentsParameters {
        &mut self.params
    }

    /// Mutable access to the partition-indexed fan-in.
    pub fn input_mut(&mut self) -> &mut PartialCollection<MomentsPartial<T>> {
        &mut self.fan_in
    }

    /// Merge every partition's partial and produce the result set.
    pub fn finalize(&mut self) -> Result<ResultCollection<T>, NumflowError> {
        if self.finalized {
            return Err(NumflowError::HandleFinalized { family: FAMILY });
        }
        let drained = self.fan_in.drain_complete()?;
        debug!("moments step2 finalize: merging {} partials", drained.len());

        let mut iter = drained.into_iter();
        let (_, mut merged) = iter
            .next()
            .ok_or(NumflowError::ResultNotReady { family: FAMILY })?;
        for (_, partial) in iter {
            merged.merge(&partial)?;
        }

        let results = fill_results(merged.finalize(self.params.estimate())?)?;
        self.finalized = true;
        Ok(results)
    }
}
