//! Online Moments Examples
//!
//! This example demonstrates the online processing mode:
//! - Re-binding the `data` input between compute calls to stream chunks
//! - Inspecting the accumulated partial state mid-stream
//! - The terminal finalize contract (compute after finalize is an error)
//! - Staging chunk tables in a resource scope for one bulk release point
//!
//! Each scenario includes the expected output as comments.

use std::sync::Arc;

use numflow::prelude::*;

fn main() -> Result<(), NumflowError> {
    env_logger::init();

    println!("{}", "=".repeat(80));
    println!("numflow Online Moments - Examples");
    println!("{}", "=".repeat(80));
    println!();

    example_1_chunked_accumulation()?;
    example_2_terminal_finalize()?;
    example_3_scoped_staging()?;

    Ok(())
}

/// Example 1: Chunked Accumulation
/// Streams three chunks and reads the finalized statistics.
fn example_1_chunked_accumulation() -> Result<(), NumflowError> {
    println!("Example 1: Chunked Accumulation");
    println!("{}", "-".repeat(80));

    let chunks = [
        vec![1.0, 10.0, 2.0, 20.0],
        vec![3.0, 30.0, 4.0, 40.0],
        vec![5.0, 50.0, 6.0, 60.0],
    ];

    let mut algorithm = Moments::<f64>::new()
        .estimate(VarianceEstimate::Sample)
        .mode(Online)
        .build()?;

    for (i, chunk) in chunks.into_iter().enumerate() {
        let table = Arc::new(NumericTable::new(2, 2, chunk)?);
        algorithm.input_mut().set_table(InputId::Data, table)?;
        let partial = algorithm.compute()?;
        println!("  chunk {i}: {} rows accumulated", partial.count());
    }

    let results = algorithm.finalize()?;
    println!("  mean:     {:?}", results.table(ResultId::Mean)?.values());
    println!("  variance: {:?}", results.table(ResultId::Variance)?.values());
    println!("  minimum:  {:?}", results.table(ResultId::Minimum)?.values());
    println!("  maximum:  {:?}", results.table(ResultId::Maximum)?.values());

    /* Expected Output:
      chunk 0: 2 rows accumulated
      chunk 1: 4 rows accumulated
      chunk 2: 6 rows accumulated
      mean:     [3.5, 35.0]
      variance: [3.5, 350.0]
      minimum:  [1.0, 10.0]
      maximum:  [6.0, 60.0]
    */

    println!();
    Ok(())
}

/// Example 2: Terminal Finalize
/// Shows that a finalized handle rejects further data.
fn example_2_terminal_finalize() -> Result<(), NumflowError> {
    println!("Example 2: Terminal Finalize");
    println!("{}", "-".repeat(80));

    let mut algorithm = Moments::<f64>::new().mode(Online).build()?;
    let table = Arc::new(NumericTable::new(2, 1, vec![1.0, 2.0])?);
    algorithm.input_mut().set_table(InputId::Data, table)?;
    algorithm.compute()?;
    algorithm.finalize()?;

    match algorithm.compute() {
        Err(error) => println!("  compute after finalize: {error}"),
        Ok(_) => println!("  unexpected: handle accepted data after finalize"),
    }

    /* Expected Output:
      compute after finalize: Family 'moments': compute invoked after finalize; the handle no longer accepts data
    */

    println!();
    Ok(())
}

/// Example 3: Scoped Staging
/// Adopts per-chunk tables into a resource scope and releases them at once.
fn example_3_scoped_staging() -> Result<(), NumflowError> {
    println!("Example 3: Scoped Staging");
    println!("{}", "-".repeat(80));

    let mut scope = ResourceScope::new();
    let mut algorithm = Moments::<f64>::new().mode(Online).build()?;

    for start in [0, 4, 8] {
        let values: Vec<f64> = (start..start + 4).map(f64::from).collect();
        let table = Arc::new(NumericTable::new(4, 1, values)?);
        algorithm.input_mut().set_table(InputId::Data, table.clone())?;
        algorithm.compute()?;
        scope.adopt(table);
    }
    println!("  staged resources: {}", scope.len());

    let results = algorithm.finalize()?;
    println!("  mean over 12 rows: {:?}", results.table(ResultId::Mean)?.values());

    scope.release_all();
    println!("  staged resources after release: {}", scope.len());

    /* Expected Output:
      staged resources: 3
      mean over 12 rows: [5.5]
      staged resources after release: 0
    */

    println!();
    Ok(())
}
