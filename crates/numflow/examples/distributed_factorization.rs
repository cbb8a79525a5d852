//! Distributed QR Factorization Example
//!
//! This example walks the full three-step pipeline over four data
//! partitions, orchestrated as simple sequential loops:
//! - Step 1 factorizes each partition locally
//! - Step 2 fans the triangular partials into the master by partition index
//! - Step 3 rotates each partition's orthogonal factor onto the global one
//!
//! The assembled factors match a single batch factorization over the
//! concatenated data up to floating-point tolerance.

use std::sync::Arc;

use numflow::prelude::*;

fn main() -> Result<(), NumflowError> {
    env_logger::init();

    println!("{}", "=".repeat(80));
    println!("numflow Distributed QR - Four-Partition Pipeline");
    println!("{}", "=".repeat(80));
    println!();

    // 8x2 data split into four row blocks of two rows each.
    let data = NumericTable::new(
        8,
        2,
        vec![
            2.0, 1.0, 1.0, 3.0, 4.0, 1.0, 1.0, 2.0, 3.0, 2.0, 2.0, 5.0, 5.0, 1.0, 1.0, 4.0,
        ],
    )?;
    let partitions = data.split_rows(4)?;

    let pipeline = Qr::<f64>::new().mode(Distributed).partitions(4);

    // Step 1: local factorization per partition.
    let mut master = pipeline.build_step2()?;
    let mut locals = Vec::new();
    for (index, block) in partitions.into_iter().enumerate() {
        let mut step1 = pipeline.build_step1(index)?;
        step1
            .input_mut()
            .set_table(InputId::Data, Arc::new(block))?;
        let output = step1.compute()?;
        println!(
            "step1 partition {index}: produced a {}x{} triangular partial",
            output.for_master.factor.rows(),
            output.for_master.factor.cols()
        );
        master
            .input_mut()
            .add(index, output.for_master)?;
        locals.push(output.for_local);
    }

    // Step 2: master merge and fan-out of corrections.
    let corrections = master.compute()?;
    let master_results = master.finalize()?;
    let matrix_r = master_results.table(ResultId::MatrixR)?;
    println!("\nstep2 master: global matrix_r =");
    print!("{matrix_r}");

    // Step 3: per-partition reconstruction of the orthogonal factor.
    println!("\nstep3: per-partition blocks of matrix_q");
    for (local, correction) in locals.into_iter().zip(corrections) {
        let index = local.partition;
        let mut step3 = pipeline.build_step3(index)?;
        step3.set_local(local)?;
        step3.set_correction(correction)?;
        let results = step3.compute()?;
        let block = results.table(ResultId::MatrixQ)?;
        println!("  partition {index}: {}x{} block", block.rows(), block.cols());
    }

    // Reference: the same factorization in one batch call.
    let mut batch = Qr::<f64>::new().mode(Batch).build()?;
    batch
        .input_mut()
        .set_table(InputId::Data, Arc::new(data))?;
    let batch_results = batch.compute()?;
    println!("\nbatch reference: matrix_r =");
    print!("{}", batch_results.table(ResultId::MatrixR)?);

    Ok(())
}
