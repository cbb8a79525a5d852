//! Tests for handle lifecycle and scoped resource release.
//!
//! Online and distributed handles are terminal after `finalize`: the
//! accumulated state is consumed exactly once, and later calls fail with a
//! typed lifecycle error instead of silently reprocessing. These tests
//! verify:
//! - Compute after finalize is an error, not a reprocess
//! - Finalize is not repeatable and not callable before any compute
//! - The master step enforces the same discipline
//! - `ResourceScope` releases adopted resources exactly once
//!
//! ## Test Organization
//!
//! 1. **Online Lifecycle** - terminal finalize semantics
//! 2. **Distributed Lifecycle** - master step ordering
//! 3. **Resource Scope** - bulk release behavior

use std::sync::Arc;

use numflow::prelude::*;

fn table(rows: usize, cols: usize, values: Vec<f64>) -> Arc<NumericTable<f64>> {
    Arc::new(NumericTable::new(rows, cols, values).unwrap())
}

// ============================================================================
// Online Lifecycle Tests
// ============================================================================

/// Test that an online handle rejects compute after finalize.
#[test]
fn test_online_compute_after_finalize_is_error() {
    let mut algorithm = Moments::<f64>::new().mode(Online).build().unwrap();
    algorithm
        .input_mut()
        .set_table(InputId::Data, table(2, 1, vec![1.0, 2.0]))
        .unwrap();
    algorithm.compute().unwrap();
    algorithm.finalize().unwrap();

    let err = algorithm.compute().unwrap_err();
    assert_eq!(err, NumflowError::HandleFinalized { family: "moments" });
}

/// Test that finalize cannot run twice.
#[test]
fn test_online_double_finalize_is_error() {
    let mut algorithm = Moments::<f64>::new().mode(Online).build().unwrap();
    algorithm
        .input_mut()
        .set_table(InputId::Data, table(2, 1, vec![1.0, 2.0]))
        .unwrap();
    algorithm.compute().unwrap();
    algorithm.finalize().unwrap();

    let err = algorithm.finalize().unwrap_err();
    assert!(matches!(err, NumflowError::HandleFinalized { .. }));
}

/// Test that finalize before any compute reports an unready result.
#[test]
fn test_online_finalize_without_compute_is_error() {
    let mut algorithm = Moments::<f64>::new().mode(Online).build().unwrap();
    let err = algorithm.finalize().unwrap_err();
    assert!(matches!(err, NumflowError::ResultNotReady { .. }));
}

/// Test the same terminal discipline on the online QR handle.
#[test]
fn test_online_qr_lifecycle() {
    let mut algorithm = Qr::<f64>::new().mode(Online).build().unwrap();
    algorithm
        .input_mut()
        .set_table(InputId::Data, table(2, 2, vec![2.0, 1.0, 1.0, 3.0]))
        .unwrap();
    algorithm.compute().unwrap();
    algorithm.finalize().unwrap();

    assert!(matches!(
        algorithm.compute(),
        Err(NumflowError::HandleFinalized { .. })
    ));
    assert!(matches!(
        algorithm.finalize(),
        Err(NumflowError::HandleFinalized { .. })
    ));
}

/// Test the terminal discipline on the online trainer.
#[test]
fn test_online_training_lifecycle() {
    let mut trainer = LinearTraining::<f64>::new().mode(Online).build().unwrap();
    trainer
        .input_mut()
        .set_table(InputId::Data, table(3, 1, vec![0.0, 1.0, 2.0]))
        .unwrap();
    trainer
        .input_mut()
        .set_table(InputId::Responses, table(3, 1, vec![1.0, 3.0, 5.0]))
        .unwrap();
    trainer.compute().unwrap();
    trainer.finalize().unwrap();

    assert!(matches!(
        trainer.compute(),
        Err(NumflowError::HandleFinalized { .. })
    ));
}

// ============================================================================
// Distributed Lifecycle Tests
// ============================================================================

/// Test that the QR master requires compute before finalize.
#[test]
fn test_master_finalize_requires_compute() {
    let pipeline = Qr::<f64>::new().mode(Distributed).partitions(1);
    let mut master = pipeline.build_step2().unwrap();
    let err = master.finalize().unwrap_err();
    assert!(matches!(err, NumflowError::ResultNotReady { .. }));
}

/// Test that a finalized master rejects further calls.
#[test]
fn test_master_is_terminal_after_finalize() {
    let pipeline = Moments::<f64>::new().mode(Distributed).partitions(1);
    let mut local = pipeline.build_step1(0).unwrap();
    local
        .input_mut()
        .set_table(InputId::Data, table(2, 1, vec![1.0, 2.0]))
        .unwrap();

    let mut master = pipeline.build_step2().unwrap();
    master.input_mut().add(0, local.compute().unwrap()).unwrap();
    master.finalize().unwrap();

    let err = master.finalize().unwrap_err();
    assert!(matches!(err, NumflowError::HandleFinalized { .. }));
}

// ============================================================================
// Resource Scope Tests
// ============================================================================

/// Test that adopted resources are released in bulk, exactly once.
///
/// Uses reference counts as the observable release signal: the scope holds
/// the only other strong reference to each table.
#[test]
fn test_scope_bulk_release() {
    let kept = table(2, 1, vec![1.0, 2.0]);

    let mut scope = ResourceScope::new();
    scope.adopt(kept.clone());
    scope.adopt(table(2, 1, vec![3.0, 4.0]));
    assert_eq!(scope.len(), 2);
    assert_eq!(Arc::strong_count(&kept), 2);

    scope.release_all();
    assert!(scope.is_empty());
    assert_eq!(Arc::strong_count(&kept), 1);
}

/// Test that scope drop releases whatever is still held.
#[test]
fn test_scope_releases_on_drop() {
    let kept = table(2, 1, vec![1.0, 2.0]);
    {
        let mut scope = ResourceScope::new();
        scope.adopt(kept.clone());
        assert_eq!(Arc::strong_count(&kept), 2);
    }
    assert_eq!(Arc::strong_count(&kept), 1);
}

/// Test staging a whole online pass through one scope.
///
/// Chunk tables are adopted by the scope as they are consumed, giving the
/// caller a single release point once the result is out.
#[test]
fn test_scope_stages_online_chunks() {
    let mut scope = ResourceScope::new();
    let mut algorithm = Moments::<f64>::new().mode(Online).build().unwrap();

    for chunk in [vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]] {
        let chunk_table = table(2, 1, chunk);
        algorithm
            .input_mut()
            .set_table(InputId::Data, chunk_table.clone())
            .unwrap();
        algorithm.compute().unwrap();
        scope.adopt(chunk_table);
    }

    let results = algorithm.finalize().unwrap();
    assert_eq!(results.table(ResultId::Mean).unwrap().values(), &[3.5]);

    scope.adopt(algorithm);
    scope.release_all();
    assert!(scope.is_empty());
}
