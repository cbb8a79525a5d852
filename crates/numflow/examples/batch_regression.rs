//! Batch Linear Regression Examples
//!
//! This example demonstrates the batch processing mode end to end:
//! - Constructing a training algorithm with a fixed precision and method
//! - Binding identifier-keyed inputs and tuning the parameter block
//! - Reading the trained model from the result collection
//! - Persisting the model and feeding it into a prediction algorithm
//!
//! Each scenario includes the expected output as comments.

use std::sync::Arc;

use numflow::prelude::*;

fn main() -> Result<(), NumflowError> {
    env_logger::init();

    println!("{}", "=".repeat(80));
    println!("numflow Batch Linear Regression - Examples");
    println!("{}", "=".repeat(80));
    println!();

    example_1_train_and_predict()?;
    example_2_ridge_tuning()?;
    example_3_model_persistence()?;

    Ok(())
}

/// Example 1: Train and Predict
/// Trains on exactly linear data and predicts it back.
fn example_1_train_and_predict() -> Result<(), NumflowError> {
    println!("Example 1: Train and Predict");
    println!("{}", "-".repeat(80));

    // y = 2*x0 - x1 + 1 over six observations.
    let x = Arc::new(NumericTable::new(
        6,
        2,
        vec![
            1.0, 0.0, 0.0, 1.0, 2.0, 1.0, 1.0, 2.0, 3.0, 1.0, 2.0, 3.0,
        ],
    )?);
    let y = Arc::new(NumericTable::new(
        6,
        1,
        vec![3.0, 0.0, 4.0, 1.0, 6.0, 2.0],
    )?);

    let mut trainer = LinearTraining::<f64>::new()
        .method(TrainMethod::NormEqDense)
        .intercept(true)
        .mode(Batch)
        .build()?;
    trainer.input_mut().set_table(InputId::Data, x.clone())?;
    trainer.input_mut().set_table(InputId::Responses, y)?;

    let model: LinearModel<f64> = trainer.compute()?.model(ResultId::Model)?;
    println!("Trained coefficients (features first, intercept last):");
    for r in 0..model.coefficients().rows() {
        println!("  beta[{r}] = {:+.4}", model.coefficients().at(r, 0));
    }

    let mut predictor = LinearPrediction::<f64>::new().mode(Batch).build()?;
    predictor.input_mut().set_table(InputId::Data, x)?;
    predictor
        .input_mut()
        .set_model(InputId::Model, Arc::new(model))?;
    let prediction = predictor.compute()?;
    println!(
        "Predictions: {:?}",
        prediction.table(ResultId::Prediction)?.values()
    );

    /* Expected Output:
    Trained coefficients (features first, intercept last):
      beta[0] = +2.0000
      beta[1] = -1.0000
      beta[2] = +1.0000
    Predictions: [3.0, 0.0, 4.0, 1.0, 6.0, 2.0]
    */

    println!();
    Ok(())
}

/// Example 2: Ridge Tuning on a Built Algorithm
/// Mutates the parameter block between computes of the same handle.
fn example_2_ridge_tuning() -> Result<(), NumflowError> {
    println!("Example 2: Ridge Tuning");
    println!("{}", "-".repeat(80));

    let x = Arc::new(NumericTable::new(5, 1, vec![1.0, 2.0, 3.0, 4.0, 5.0])?);
    let y = Arc::new(NumericTable::new(5, 1, vec![2.1, 3.9, 6.2, 7.8, 10.1])?);

    let mut trainer = LinearTraining::<f64>::new()
        .intercept(false)
        .mode(Batch)
        .build()?;
    trainer.input_mut().set_table(InputId::Data, x)?;
    trainer.input_mut().set_table(InputId::Responses, y)?;

    for ridge in [0.0, 1.0, 10.0, 100.0] {
        trainer.parameter_mut().set_ridge(ridge);
        let model: LinearModel<f64> = trainer.compute()?.model(ResultId::Model)?;
        println!(
            "  ridge = {ridge:>6.1} -> slope = {:.4}",
            model.coefficients().at(0, 0)
        );
    }

    /* Expected Output:
      ridge =    0.0 -> slope = 2.0036
      ridge =    1.0 -> slope = 1.9679
      ridge =   10.0 -> slope = 1.6954
      ridge =  100.0 -> slope = 0.7110
    */

    println!();
    Ok(())
}

/// Example 3: Model Persistence
/// Round-trips the model through the tagged serialization envelope.
fn example_3_model_persistence() -> Result<(), NumflowError> {
    println!("Example 3: Model Persistence");
    println!("{}", "-".repeat(80));

    let x = Arc::new(NumericTable::new(4, 1, vec![0.0, 1.0, 2.0, 3.0])?);
    let y = Arc::new(NumericTable::new(4, 1, vec![1.0, 3.0, 5.0, 7.0])?);

    let mut trainer = LinearTraining::<f64>::new().mode(Batch).build()?;
    trainer.input_mut().set_table(InputId::Data, x.clone())?;
    trainer.input_mut().set_table(InputId::Responses, y)?;
    let model: LinearModel<f64> = trainer.compute()?.model(ResultId::Model)?;

    // The model outlives the trainer: serialize, drop everything, restore.
    let bytes = pack(&model)?;
    drop(trainer);
    drop(model);
    println!("Serialized model: {} bytes, tag {:?}", bytes.len(), peek_tag(&bytes)?);

    let restored: LinearModel<f64> = unpack(&bytes)?;
    let mut predictor = LinearPrediction::<f64>::new().mode(Batch).build()?;
    predictor.input_mut().set_table(InputId::Data, x)?;
    predictor
        .input_mut()
        .set_model(InputId::Model, Arc::new(restored))?;
    let prediction = predictor.compute()?;
    println!(
        "Predictions from the restored model: {:?}",
        prediction.table(ResultId::Prediction)?.values()
    );

    /* Expected Output (byte count varies with the payload encoding):
    Serialized model: 69 bytes, tag LinearModelF64
    Predictions from the restored model: [1.0, 3.0, 5.0, 7.0]
    */

    println!();
    Ok(())
}
