//! Tests for the QR family across processing modes.
//!
//! The engine normalizes the R diagonal non-negative, making the thin
//! factors of full-column-rank data unique, so every processing mode must
//! converge to the same factor pair up to floating-point tolerance. These
//! tests verify:
//! - Batch factor structure and reconstruction of the input
//! - Online chunked factorization against batch
//! - The three-step distributed pipeline against batch
//! - Partition-index matching in the final local step
//!
//! ## Test Organization
//!
//! 1. **Batch Correctness** - structure and reconstruction
//! 2. **Mode Equivalence** - online and distributed vs. batch
//! 3. **Pipeline Wiring** - fan-in and index mismatch errors

use std::sync::Arc;

use approx::assert_abs_diff_eq;
use numflow::prelude::*;

/// 8x2 data whose consecutive 2-row blocks are all full rank.
fn sample_rows() -> Vec<f64> {
    vec![
        2.0, 1.0, 1.0, 3.0, 4.0, 1.0, 1.0, 2.0, 3.0, 2.0, 2.0, 5.0, 5.0, 1.0, 1.0, 4.0,
    ]
}

fn assert_tables_close(a: &NumericTable<f64>, b: &NumericTable<f64>, tolerance: f64) {
    assert_eq!(a.rows(), b.rows());
    assert_eq!(a.cols(), b.cols());
    for r in 0..a.rows() {
        for c in 0..a.cols() {
            assert_abs_diff_eq!(a.at(r, c), b.at(r, c), epsilon = tolerance);
        }
    }
}

fn batch_factors(data: &NumericTable<f64>) -> (NumericTable<f64>, NumericTable<f64>) {
    let mut algorithm = Qr::<f64>::new().mode(Batch).build().unwrap();
    algorithm
        .input_mut()
        .set_table(InputId::Data, Arc::new(data.clone()))
        .unwrap();
    let results = algorithm.compute().unwrap();
    (
        results.table(ResultId::MatrixQ).unwrap().clone(),
        results.table(ResultId::MatrixR).unwrap().clone(),
    )
}

// ============================================================================
// Batch Correctness Tests
// ============================================================================

/// Test that batch factors reconstruct the input.
///
/// Verifies Q * R == A elementwise up to tolerance, R upper triangular
/// with a non-negative diagonal, and the declared result shapes.
#[test]
fn test_batch_factors_reconstruct_input() {
    let data = NumericTable::new(8, 2, sample_rows()).unwrap();
    let (q, r) = batch_factors(&data);

    assert_eq!(q.rows(), 8);
    assert_eq!(q.cols(), 2);
    assert_eq!(r.rows(), 2);
    assert_eq!(r.cols(), 2);

    assert_eq!(r.at(1, 0), 0.0);
    assert!(r.at(0, 0) >= 0.0);
    assert!(r.at(1, 1) >= 0.0);

    for i in 0..8 {
        for j in 0..2 {
            let mut rebuilt = 0.0;
            for k in 0..2 {
                rebuilt += q.at(i, k) * r.at(k, j);
            }
            assert_abs_diff_eq!(rebuilt, data.at(i, j), epsilon = 1e-12);
        }
    }
}

/// Test that a wide table is rejected before factorization.
#[test]
fn test_wide_input_rejected() {
    let mut algorithm = Qr::<f64>::new().mode(Batch).build().unwrap();
    algorithm
        .input_mut()
        .set_table(
            InputId::Data,
            Arc::new(NumericTable::new(2, 3, vec![1.0; 6]).unwrap()),
        )
        .unwrap();
    let err = algorithm.compute().unwrap_err();
    assert!(matches!(err, NumflowError::DimensionMismatch { .. }));
}

/// Test that rank-deficient data surfaces as an engine failure.
#[test]
fn test_rank_deficient_input_fails_compute() {
    let mut algorithm = Qr::<f64>::new().mode(Batch).build().unwrap();
    // Second column is twice the first.
    algorithm
        .input_mut()
        .set_table(
            InputId::Data,
            Arc::new(NumericTable::new(3, 2, vec![1.0, 2.0, 2.0, 4.0, 3.0, 6.0]).unwrap()),
        )
        .unwrap();
    let err = algorithm.compute().unwrap_err();
    assert!(matches!(err, NumflowError::ComputationFailed { .. }));
}

// ============================================================================
// Mode Equivalence Tests
// ============================================================================

/// Test that online chunked factorization equals batch factorization.
///
/// Feeds the same 8 rows as chunks of 4 and 4 and compares both factors
/// against the batch pair.
#[test]
fn test_online_equals_batch() {
    let values = sample_rows();
    let data = NumericTable::new(8, 2, values.clone()).unwrap();
    let (batch_q, batch_r) = batch_factors(&data);

    let mut online = Qr::<f64>::new().mode(Online).build().unwrap();
    online
        .input_mut()
        .set_table(
            InputId::Data,
            Arc::new(NumericTable::new(4, 2, values[..8].to_vec()).unwrap()),
        )
        .unwrap();
    online.compute().unwrap();
    online
        .input_mut()
        .set_table(
            InputId::Data,
            Arc::new(NumericTable::new(4, 2, values[8..].to_vec()).unwrap()),
        )
        .unwrap();
    online.compute().unwrap();
    assert_eq!(online.chunks(), 2);

    let results = online.finalize().unwrap();
    assert_tables_close(results.table(ResultId::MatrixR).unwrap(), &batch_r, 1e-10);
    assert_tables_close(results.table(ResultId::MatrixQ).unwrap(), &batch_q, 1e-10);
}

/// Test that the 4-partition distributed pipeline equals batch execution.
///
/// Runs step 1 on every partition, fans the triangular partials into the
/// master in index order, rotates each partition's orthogonal partial with
/// its correction in step 3, and compares the assembled factors against the
/// batch pair over the concatenated data.
#[test]
fn test_distributed_equals_batch() {
    let data = NumericTable::new(8, 2, sample_rows()).unwrap();
    let (batch_q, batch_r) = batch_factors(&data);

    let pipeline = Qr::<f64>::new().mode(Distributed).partitions(4);
    let mut master = pipeline.build_step2().unwrap();

    let mut locals = Vec::new();
    for (index, block) in data.split_rows(4).unwrap().into_iter().enumerate() {
        let mut step1 = pipeline.build_step1(index).unwrap();
        step1
            .input_mut()
            .set_table(InputId::Data, Arc::new(block))
            .unwrap();
        let output = step1.compute().unwrap();
        master
            .input_mut()
            .add(output.for_master.partition, output.for_master)
            .unwrap();
        locals.push(output.for_local);
    }

    let corrections = master.compute().unwrap();
    assert_eq!(corrections.len(), 4);

    let master_results = master.finalize().unwrap();
    assert_tables_close(
        master_results.table(ResultId::MatrixR).unwrap(),
        &batch_r,
        1e-10,
    );

    let mut q_blocks = Vec::new();
    for (local, correction) in locals.into_iter().zip(corrections) {
        let index = local.partition;
        let mut step3 = pipeline.build_step3(index).unwrap();
        step3.set_local(local).unwrap();
        step3.set_correction(correction).unwrap();
        let results = step3.compute().unwrap();
        q_blocks.push(results.table(ResultId::MatrixQ).unwrap().clone());
    }

    let refs: Vec<&NumericTable<f64>> = q_blocks.iter().collect();
    let assembled_q = NumericTable::vstack(&refs).unwrap();
    assert_tables_close(&assembled_q, &batch_q, 1e-10);
}

// ============================================================================
// Pipeline Wiring Tests
// ============================================================================

/// Test that step 3 rejects partials from the wrong partition.
///
/// Verifies that the partition index carried by each partial is matched
/// against the step's own index instead of being trusted silently.
#[test]
fn test_step3_rejects_mismatched_partition() {
    let data = NumericTable::new(4, 2, sample_rows()[..8].to_vec()).unwrap();

    let pipeline = Qr::<f64>::new().mode(Distributed).partitions(2);
    let mut step1 = pipeline.build_step1(0).unwrap();
    step1
        .input_mut()
        .set_table(InputId::Data, Arc::new(data))
        .unwrap();
    let output = step1.compute().unwrap();

    let mut step3 = pipeline.build_step3(1).unwrap();
    let err = step3.set_local(output.for_local).unwrap_err();
    assert_eq!(
        err,
        NumflowError::PartitionMismatch {
            expected: 1,
            got: 0
        }
    );
}

/// Test that the master fan-in enforces completeness and uniqueness.
#[test]
fn test_master_fan_in_guards() {
    let data = NumericTable::new(4, 2, sample_rows()[..8].to_vec()).unwrap();

    let pipeline = Qr::<f64>::new().mode(Distributed).partitions(2);
    let mut step1 = pipeline.build_step1(0).unwrap();
    step1
        .input_mut()
        .set_table(InputId::Data, Arc::new(data))
        .unwrap();
    let output = step1.compute().unwrap();

    let mut master = pipeline.build_step2().unwrap();
    master.input_mut().add(0, output.for_master.clone()).unwrap();

    // Same index twice.
    let err = master.input_mut().add(0, output.for_master.clone()).unwrap_err();
    assert_eq!(err, NumflowError::DuplicatePartition { index: 0 });

    // Index beyond the fixed partition count.
    let err = master.input_mut().add(7, output.for_master).unwrap_err();
    assert!(matches!(err, NumflowError::PartitionOutOfRange { .. }));

    // Incomplete fan-in at compute time.
    let err = master.compute().unwrap_err();
    assert_eq!(
        err,
        NumflowError::PartitionMismatch {
            expected: 2,
            got: 1
        }
    );
}

/// Test that the triangular partial survives the serialization boundary.
///
/// The step-1-to-master hand-off crosses process boundaries in real
/// deployments; the envelope must reconstruct the partial by its tag.
#[test]
fn test_triangular_partial_round_trips() {
    let data = NumericTable::new(4, 2, sample_rows()[..8].to_vec()).unwrap();

    let pipeline = Qr::<f64>::new().mode(Distributed).partitions(1);
    let mut step1 = pipeline.build_step1(0).unwrap();
    step1
        .input_mut()
        .set_table(InputId::Data, Arc::new(data))
        .unwrap();
    let output = step1.compute().unwrap();

    let bytes = pack(&output.for_master).unwrap();
    assert_eq!(peek_tag(&bytes).unwrap(), SerializationTag::TriangularPartialF64);
    let restored: QrTriangularPartial<f64> = unpack(&bytes).unwrap();
    assert_eq!(restored, output.for_master);
}
