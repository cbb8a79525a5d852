//! Tests for the moments family across processing modes.
//!
//! The moments family accumulates additively, so its online and distributed
//! modes must agree with batch execution on identical data. These tests
//! verify:
//! - Batch statistics against hand-computed values
//! - The CSR method against the dense method
//! - Online chunked accumulation against batch
//! - The distributed two-step pipeline against batch
//! - Parameter semantics (variance estimate) and clone independence
//!
//! ## Test Organization
//!
//! 1. **Batch Correctness** - values and the variance estimate parameter
//! 2. **Method Agreement** - CSR vs. dense
//! 3. **Mode Equivalence** - online and distributed vs. batch
//! 4. **Clone Semantics** - parameter and state independence

use std::sync::Arc;

use approx::assert_relative_eq;
use numflow::prelude::*;

fn table(rows: usize, cols: usize, values: Vec<f64>) -> Arc<NumericTable<f64>> {
    Arc::new(NumericTable::new(rows, cols, values).unwrap())
}

// ============================================================================
// Batch Correctness Tests
// ============================================================================

/// Test batch moments against hand-computed statistics.
#[test]
fn test_batch_statistics() {
    let mut algorithm = Moments::<f64>::new().mode(Batch).build().unwrap();
    algorithm
        .input_mut()
        .set_table(
            InputId::Data,
            table(4, 2, vec![1.0, -2.0, 2.0, 0.0, 3.0, 2.0, 4.0, 4.0]),
        )
        .unwrap();
    let results = algorithm.compute().unwrap();

    assert_eq!(results.table(ResultId::Sum).unwrap().values(), &[10.0, 4.0]);
    assert_eq!(results.table(ResultId::Mean).unwrap().values(), &[2.5, 1.0]);
    assert_eq!(
        results.table(ResultId::Minimum).unwrap().values(),
        &[1.0, -2.0]
    );
    assert_eq!(
        results.table(ResultId::Maximum).unwrap().values(),
        &[4.0, 4.0]
    );

    // Sample variance of {1,2,3,4} is 5/3; of {-2,0,2,4} is 20/3.
    let variance = results.table(ResultId::Variance).unwrap();
    assert_relative_eq!(variance.at(0, 0), 5.0 / 3.0, max_relative = 1e-12);
    assert_relative_eq!(variance.at(0, 1), 20.0 / 3.0, max_relative = 1e-12);
}

/// Test that the population estimate changes the variance divisor.
///
/// Verifies that the parameter block is read at compute time, including
/// after post-construction mutation through the typed setter.
#[test]
fn test_variance_estimate_parameter() {
    let data = table(4, 1, vec![1.0, 2.0, 3.0, 4.0]);

    let mut algorithm = Moments::<f64>::new()
        .estimate(VarianceEstimate::Population)
        .mode(Batch)
        .build()
        .unwrap();
    algorithm
        .input_mut()
        .set_table(InputId::Data, data.clone())
        .unwrap();
    let population = algorithm.compute().unwrap();
    assert_relative_eq!(
        population.table(ResultId::Variance).unwrap().at(0, 0),
        1.25,
        max_relative = 1e-12
    );

    // Mutate the parameter block on the built object and recompute.
    algorithm
        .parameter_mut()
        .set_estimate(VarianceEstimate::Sample);
    let sample = algorithm.compute().unwrap();
    assert_relative_eq!(
        sample.table(ResultId::Variance).unwrap().at(0, 0),
        5.0 / 3.0,
        max_relative = 1e-12
    );
}

// ============================================================================
// Method Agreement Tests
// ============================================================================

/// Test that the CSR method agrees with the dense method.
///
/// Verifies every declared result id on a table with explicit zeros, where
/// the implicit-zero handling of the CSR sweep must still reproduce the
/// dense extrema.
#[test]
fn test_csr_method_matches_dense() {
    let dense_values = vec![0.0, 2.0, 3.0, 0.0, 0.0, 5.0, 1.0, 0.0];
    let dense = table(4, 2, dense_values);
    let csr = Arc::new(CsrTable::from_dense(&dense).unwrap());

    let mut via_dense = Moments::<f64>::new().mode(Batch).build().unwrap();
    via_dense
        .input_mut()
        .set_table(InputId::Data, dense)
        .unwrap();
    let dense_results = via_dense.compute().unwrap();

    let mut via_csr = Moments::<f64>::new()
        .method(MomentsMethod::SinglePassCsr)
        .mode(Batch)
        .build()
        .unwrap();
    via_csr.input_mut().set_csr(InputId::Data, csr).unwrap();
    let csr_results = via_csr.compute().unwrap();

    for id in [
        ResultId::Sum,
        ResultId::SumSquares,
        ResultId::Minimum,
        ResultId::Maximum,
        ResultId::Mean,
        ResultId::Variance,
    ] {
        assert_eq!(
            dense_results.table(id).unwrap().values(),
            csr_results.table(id).unwrap().values(),
            "{id} should agree between methods"
        );
    }
}

// ============================================================================
// Mode Equivalence Tests
// ============================================================================

/// Test that chunked online accumulation equals batch computation.
///
/// Feeds the same 6 rows as one batch table and as chunks of 2 and 4 rows,
/// re-binding the `data` input between compute calls.
#[test]
fn test_online_equals_batch() {
    let values = vec![
        1.0, 10.0, 2.0, 20.0, 3.0, 30.0, 4.0, 40.0, 5.0, 50.0, 6.0, 60.0,
    ];
    let full = table(6, 2, values.clone());

    let mut batch = Moments::<f64>::new().mode(Batch).build().unwrap();
    batch.input_mut().set_table(InputId::Data, full).unwrap();
    let batch_results = batch.compute().unwrap();

    let mut online = Moments::<f64>::new().mode(Online).build().unwrap();
    online
        .input_mut()
        .set_table(InputId::Data, table(2, 2, values[..4].to_vec()))
        .unwrap();
    online.compute().unwrap();
    online
        .input_mut()
        .set_table(InputId::Data, table(4, 2, values[4..].to_vec()))
        .unwrap();
    online.compute().unwrap();
    let online_results = online.finalize().unwrap();

    for id in [
        ResultId::Sum,
        ResultId::SumSquares,
        ResultId::Minimum,
        ResultId::Maximum,
        ResultId::Mean,
        ResultId::Variance,
    ] {
        let batch_stat = batch_results.table(id).unwrap();
        let online_stat = online_results.table(id).unwrap();
        for c in 0..2 {
            assert_relative_eq!(
                online_stat.at(0, c),
                batch_stat.at(0, c),
                max_relative = 1e-12,
                epsilon = 1e-12
            );
        }
    }
}

/// Test that the 4-partition distributed pipeline equals batch computation.
///
/// Splits 8 rows into 4 partitions, runs one local step per partition,
/// fans the partials into the master in index order, and compares the
/// finalized statistics against batch execution over the concatenated
/// data.
#[test]
fn test_distributed_equals_batch() {
    let values: Vec<f64> = (0..16).map(|i| (i as f64) * 0.75 - 3.0).collect();
    let full = NumericTable::new(8, 2, values).unwrap();

    let mut batch = Moments::<f64>::new().mode(Batch).build().unwrap();
    batch
        .input_mut()
        .set_table(InputId::Data, Arc::new(full.clone()))
        .unwrap();
    let batch_results = batch.compute().unwrap();

    let pipeline = Moments::<f64>::new().mode(Distributed).partitions(4);
    let mut master = pipeline.build_step2().unwrap();
    for (index, block) in full.split_rows(4).unwrap().into_iter().enumerate() {
        let mut local = pipeline.build_step1(index).unwrap();
        local
            .input_mut()
            .set_table(InputId::Data, Arc::new(block))
            .unwrap();
        let partial = local.compute().unwrap();
        master.input_mut().add(index, partial).unwrap();
    }
    let distributed_results = master.finalize().unwrap();

    for id in [
        ResultId::Sum,
        ResultId::Minimum,
        ResultId::Maximum,
        ResultId::Mean,
        ResultId::Variance,
    ] {
        let batch_stat = batch_results.table(id).unwrap();
        let distributed_stat = distributed_results.table(id).unwrap();
        for c in 0..2 {
            assert_relative_eq!(
                distributed_stat.at(0, c),
                batch_stat.at(0, c),
                max_relative = 1e-12,
                epsilon = 1e-12
            );
        }
    }
}

// ============================================================================
// Clone Semantics Tests
// ============================================================================

/// Test that a clone's parameter block is independent of the source's.
#[test]
fn test_clone_parameter_independence() {
    let mut source = Moments::<f64>::new().mode(Batch).build().unwrap();
    source
        .input_mut()
        .set_table(InputId::Data, table(4, 1, vec![1.0, 2.0, 3.0, 4.0]))
        .unwrap();

    let mut clone = source.clone();
    clone
        .parameter_mut()
        .set_estimate(VarianceEstimate::Population);

    assert_eq!(source.parameter().estimate(), VarianceEstimate::Sample);
    assert_eq!(clone.parameter().estimate(), VarianceEstimate::Population);

    // Both compute over the copied binding, each under its own parameters.
    let source_variance = source.compute().unwrap();
    let clone_variance = clone.compute().unwrap();
    assert_relative_eq!(
        source_variance.table(ResultId::Variance).unwrap().at(0, 0),
        5.0 / 3.0,
        max_relative = 1e-12
    );
    assert_relative_eq!(
        clone_variance.table(ResultId::Variance).unwrap().at(0, 0),
        1.25,
        max_relative = 1e-12
    );
}

/// Test that cloning an online handle resets accumulation.
///
/// Verifies the clone copies configuration and bindings but shares no
/// engine state with the source.
#[test]
fn test_online_clone_starts_fresh() {
    let mut source = Moments::<f64>::new().mode(Online).build().unwrap();
    source
        .input_mut()
        .set_table(InputId::Data, table(2, 1, vec![1.0, 2.0]))
        .unwrap();
    source.compute().unwrap();

    let mut clone = source.clone();
    assert!(clone.partial().is_none());

    // The clone accumulates independently from its copied binding.
    clone.compute().unwrap();
    assert_eq!(clone.partial().unwrap().count(), 2);
    assert_eq!(source.partial().unwrap().count(), 2);

    clone.compute().unwrap();
    assert_eq!(clone.partial().unwrap().count(), 4);
    assert_eq!(source.partial().unwrap().count(), 2);
}
