//! Tests for the linear family: training, prediction, and model hand-off.
//!
//! Training accumulates the normal equations (or factorizes, for the
//! QR-based method) and produces a persistable model; prediction consumes
//! that model through the input collection. These tests verify:
//! - Coefficient recovery on exactly linear data
//! - Agreement between the two training methods
//! - Online and distributed training against batch
//! - Model serialization and the prediction-side contracts
//!
//! ## Test Organization
//!
//! 1. **Batch Training** - recovery, ridge, method agreement
//! 2. **Mode Equivalence** - online and distributed vs. batch
//! 3. **Prediction** - round trip and contract violations
//! 4. **Model Persistence** - tagged envelope round trip
//! 5. **Clone Semantics** - parameter independence

use std::sync::Arc;

use approx::assert_abs_diff_eq;
use numflow::prelude::*;

/// Observations with an exact relationship y = 1.5*x0 - 2.0*x1 + 0.5.
fn exact_data() -> (Arc<NumericTable<f64>>, Arc<NumericTable<f64>>) {
    let x_values = vec![
        1.0, 0.0, 0.0, 1.0, 2.0, 1.0, 1.0, 3.0, 4.0, 2.0, 3.0, 1.0, 2.0, 4.0, 5.0, 3.0,
    ];
    let x = NumericTable::new(8, 2, x_values).unwrap();
    let mut y_values = Vec::with_capacity(8);
    for r in 0..8 {
        y_values.push(1.5 * x.at(r, 0) - 2.0 * x.at(r, 1) + 0.5);
    }
    (
        Arc::new(x),
        Arc::new(NumericTable::new(8, 1, y_values).unwrap()),
    )
}

fn train_batch(method: TrainMethod) -> LinearModel<f64> {
    let (x, y) = exact_data();
    let mut trainer = LinearTraining::<f64>::new()
        .method(method)
        .mode(Batch)
        .build()
        .unwrap();
    trainer.input_mut().set_table(InputId::Data, x).unwrap();
    trainer.input_mut().set_table(InputId::Responses, y).unwrap();
    trainer.compute().unwrap().model(ResultId::Model).unwrap()
}

// ============================================================================
// Batch Training Tests
// ============================================================================

/// Test that batch training recovers an exact linear relationship.
///
/// Verifies the coefficient layout: feature rows first, intercept last.
#[test]
fn test_batch_training_recovers_coefficients() {
    let model = train_batch(TrainMethod::NormEqDense);
    assert_eq!(model.features(), 2);
    assert_eq!(model.responses(), 1);
    assert!(model.intercept());

    let beta = model.coefficients();
    assert_abs_diff_eq!(beta.at(0, 0), 1.5, epsilon = 1e-9);
    assert_abs_diff_eq!(beta.at(1, 0), -2.0, epsilon = 1e-9);
    assert_abs_diff_eq!(beta.at(2, 0), 0.5, epsilon = 1e-9);
}

/// Test that the QR-based method agrees with the normal equations.
#[test]
fn test_training_methods_agree() {
    let via_normal = train_batch(TrainMethod::NormEqDense);
    let via_qr = train_batch(TrainMethod::QrDense);
    for r in 0..3 {
        assert_abs_diff_eq!(
            via_normal.coefficients().at(r, 0),
            via_qr.coefficients().at(r, 0),
            epsilon = 1e-9
        );
    }
}

/// Test that a positive ridge term shrinks the solution.
///
/// Also verifies the term is tunable on the built object between computes.
#[test]
fn test_ridge_is_tunable_between_computes() {
    let (x, y) = exact_data();
    let mut trainer = LinearTraining::<f64>::new()
        .intercept(false)
        .mode(Batch)
        .build()
        .unwrap();
    trainer.input_mut().set_table(InputId::Data, x).unwrap();
    trainer.input_mut().set_table(InputId::Responses, y).unwrap();

    let plain: LinearModel<f64> = trainer.compute().unwrap().model(ResultId::Model).unwrap();

    trainer.parameter_mut().set_ridge(100.0);
    let shrunk: LinearModel<f64> = trainer.compute().unwrap().model(ResultId::Model).unwrap();

    let plain_norm: f64 = plain
        .coefficients()
        .values()
        .iter()
        .map(|v| v * v)
        .sum::<f64>();
    let shrunk_norm: f64 = shrunk
        .coefficients()
        .values()
        .iter()
        .map(|v| v * v)
        .sum::<f64>();
    assert!(shrunk_norm < plain_norm);
}

/// Test that the QR-based method rejects a ridge term.
#[test]
fn test_qr_dense_rejects_ridge() {
    let (x, y) = exact_data();
    let mut trainer = LinearTraining::<f64>::new()
        .method(TrainMethod::QrDense)
        .ridge(0.5)
        .mode(Batch)
        .build()
        .unwrap();
    trainer.input_mut().set_table(InputId::Data, x).unwrap();
    trainer.input_mut().set_table(InputId::Responses, y).unwrap();
    let err = trainer.compute().unwrap_err();
    assert!(matches!(
        err,
        NumflowError::InvalidParameter {
            parameter: "ridge",
            ..
        }
    ));
}

/// Test that a negative ridge term is rejected at compute time.
#[test]
fn test_negative_ridge_rejected() {
    let (x, y) = exact_data();
    let mut trainer = LinearTraining::<f64>::new().mode(Batch).build().unwrap();
    trainer.input_mut().set_table(InputId::Data, x).unwrap();
    trainer.input_mut().set_table(InputId::Responses, y).unwrap();
    trainer.parameter_mut().set_ridge(-1.0);
    let err = trainer.compute().unwrap_err();
    assert!(matches!(err, NumflowError::InvalidParameter { .. }));
}

// ============================================================================
// Mode Equivalence Tests
// ============================================================================

/// Test that online chunked training equals batch training.
#[test]
fn test_online_equals_batch() {
    let (x, y) = exact_data();
    let batch_model = train_batch(TrainMethod::NormEqDense);

    let x_chunks = x.split_rows(3).unwrap();
    let y_chunks = y.split_rows(3).unwrap();

    let mut online = LinearTraining::<f64>::new().mode(Online).build().unwrap();
    for (x_chunk, y_chunk) in x_chunks.into_iter().zip(y_chunks) {
        online
            .input_mut()
            .set_table(InputId::Data, Arc::new(x_chunk))
            .unwrap();
        online
            .input_mut()
            .set_table(InputId::Responses, Arc::new(y_chunk))
            .unwrap();
        online.compute().unwrap();
    }
    let online_model: LinearModel<f64> =
        online.finalize().unwrap().model(ResultId::Model).unwrap();

    for r in 0..3 {
        assert_abs_diff_eq!(
            online_model.coefficients().at(r, 0),
            batch_model.coefficients().at(r, 0),
            epsilon = 1e-10
        );
    }
}

/// Test that the 4-partition distributed pipeline equals batch training.
#[test]
fn test_distributed_equals_batch() {
    let (x, y) = exact_data();
    let batch_model = train_batch(TrainMethod::NormEqDense);

    let pipeline = LinearTraining::<f64>::new().mode(Distributed).partitions(4);
    let mut master = pipeline.build_step2().unwrap();

    let x_blocks = x.split_rows(4).unwrap();
    let y_blocks = y.split_rows(4).unwrap();
    for (index, (x_block, y_block)) in x_blocks.into_iter().zip(y_blocks).enumerate() {
        let mut local = pipeline.build_step1(index).unwrap();
        local
            .input_mut()
            .set_table(InputId::Data, Arc::new(x_block))
            .unwrap();
        local
            .input_mut()
            .set_table(InputId::Responses, Arc::new(y_block))
            .unwrap();
        master.input_mut().add(index, local.compute().unwrap()).unwrap();
    }
    let distributed_model: LinearModel<f64> =
        master.finalize().unwrap().model(ResultId::Model).unwrap();

    for r in 0..3 {
        assert_abs_diff_eq!(
            distributed_model.coefficients().at(r, 0),
            batch_model.coefficients().at(r, 0),
            epsilon = 1e-10
        );
    }
}

// ============================================================================
// Prediction Tests
// ============================================================================

/// Test the train-then-predict round trip on exact data.
#[test]
fn test_prediction_round_trip() {
    let (x, y) = exact_data();
    let model = train_batch(TrainMethod::NormEqDense);

    let mut predictor = LinearPrediction::<f64>::new().mode(Batch).build().unwrap();
    predictor
        .input_mut()
        .set_table(InputId::Data, x)
        .unwrap();
    predictor
        .input_mut()
        .set_model(InputId::Model, Arc::new(model))
        .unwrap();
    let results = predictor.compute().unwrap();
    let prediction = results.table(ResultId::Prediction).unwrap();

    assert_eq!(prediction.rows(), 8);
    assert_eq!(prediction.cols(), 1);
    for r in 0..8 {
        assert_abs_diff_eq!(prediction.at(r, 0), y.at(r, 0), epsilon = 1e-9);
    }
}

/// Test that prediction rejects a feature-count mismatch.
#[test]
fn test_prediction_rejects_feature_mismatch() {
    let model = train_batch(TrainMethod::NormEqDense);

    let mut predictor = LinearPrediction::<f64>::new().mode(Batch).build().unwrap();
    predictor
        .input_mut()
        .set_table(
            InputId::Data,
            Arc::new(NumericTable::new(2, 3, vec![1.0; 6]).unwrap()),
        )
        .unwrap();
    predictor
        .input_mut()
        .set_model(InputId::Model, Arc::new(model))
        .unwrap();
    let err = predictor.compute().unwrap_err();
    assert!(matches!(err, NumflowError::DimensionMismatch { .. }));
}

/// Test that prediction without a bound model is a missing-input error.
#[test]
fn test_prediction_requires_model() {
    let mut predictor = LinearPrediction::<f64>::new().mode(Batch).build().unwrap();
    predictor
        .input_mut()
        .set_table(
            InputId::Data,
            Arc::new(NumericTable::new(2, 2, vec![1.0; 4]).unwrap()),
        )
        .unwrap();
    let err = predictor.compute().unwrap_err();
    assert!(matches!(
        err,
        NumflowError::MissingInput {
            id: InputId::Model,
            ..
        }
    ));
}

// ============================================================================
// Model Persistence Tests
// ============================================================================

/// Test that a trained model survives the tagged envelope and still
/// predicts.
#[test]
fn test_model_persistence_round_trip() {
    let (x, y) = exact_data();
    let model = train_batch(TrainMethod::NormEqDense);

    let bytes = pack(&model).unwrap();
    assert_eq!(peek_tag(&bytes).unwrap(), SerializationTag::LinearModelF64);
    let restored: LinearModel<f64> = unpack(&bytes).unwrap();
    assert_eq!(restored, model);

    let mut predictor = LinearPrediction::<f64>::new().mode(Batch).build().unwrap();
    predictor.input_mut().set_table(InputId::Data, x).unwrap();
    predictor
        .input_mut()
        .set_model(InputId::Model, Arc::new(restored))
        .unwrap();
    let results = predictor.compute().unwrap();
    let prediction = results.table(ResultId::Prediction).unwrap();
    assert_abs_diff_eq!(prediction.at(0, 0), y.at(0, 0), epsilon = 1e-9);
}

/// Test that an envelope written for another type is rejected by tag.
#[test]
fn test_model_envelope_tag_mismatch() {
    let model = train_batch(TrainMethod::NormEqDense);
    let bytes = pack(&model).unwrap();
    let err = unpack::<LinearModel<f32>>(&bytes).unwrap_err();
    assert!(matches!(err, NumflowError::TagMismatch { .. }));
}

// ============================================================================
// Clone Semantics Tests
// ============================================================================

/// Test that a trainer clone's parameter block is independent.
#[test]
fn test_clone_parameter_independence() {
    let (x, y) = exact_data();
    let mut source = LinearTraining::<f64>::new().mode(Batch).build().unwrap();
    source.input_mut().set_table(InputId::Data, x).unwrap();
    source.input_mut().set_table(InputId::Responses, y).unwrap();

    let mut clone = source.clone();
    clone.parameter_mut().set_ridge(5.0);
    source.parameter_mut().set_ridge(0.25);

    assert_eq!(clone.parameter().ridge(), 5.0);
    assert_eq!(source.parameter().ridge(), 0.25);
}
