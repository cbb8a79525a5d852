//! # numflow — a uniform invocation protocol for numeric analytics algorithms
//!
//! `numflow` provides one construction, binding, and execution convention
//! shared by every algorithm family it ships: fix the floating-point
//! **precision** and the computational **method** when the algorithm object
//! is built, bind identifier-keyed **inputs** and tune a typed **parameter
//! block**, run **compute**, and read an identifier-keyed **result
//! collection**. The same convention scales across three processing modes:
//!
//! * **Batch** — one synchronous compute over fully bound data.
//! * **Online** — repeated computes over re-bound data chunks, closed by a
//!   single `finalize`.
//! * **Distributed** — a fixed pipeline of local and master steps connected
//!   by typed partial results, fanned in by partition index.
//!
//! ## Quick Start
//!
//! ```rust
//! use numflow::prelude::*;
//! use std::sync::Arc;
//!
//! // Column statistics of a 4x2 table, double precision, batch mode.
//! let data = Arc::new(NumericTable::new(
//!     4,
//!     2,
//!     vec![1.0, 10.0, 2.0, 20.0, 3.0, 30.0, 4.0, 40.0],
//! )?);
//!
//! let mut algorithm = Moments::<f64>::new().mode(Batch).build()?;
//! algorithm.input_mut().set_table(InputId::Data, data)?;
//!
//! let results = algorithm.compute()?;
//! let mean = results.table(ResultId::Mean)?;
//! assert_eq!(mean.values(), &[2.5, 25.0]);
//! # Result::<(), NumflowError>::Ok(())
//! ```
//!
//! ## Training and Prediction
//!
//! Training families produce a persistable model under the `model` result
//! id; the matching prediction family consumes it under the `model` input
//! id. The model outlives both algorithm objects:
//!
//! ```rust
//! use numflow::prelude::*;
//! use std::sync::Arc;
//!
//! let x = Arc::new(NumericTable::new(4, 1, vec![0.0, 1.0, 2.0, 3.0])?);
//! let y = Arc::new(NumericTable::new(4, 1, vec![1.0, 3.0, 5.0, 7.0])?);
//!
//! let mut trainer = LinearTraining::<f64>::new().mode(Batch).build()?;
//! trainer.input_mut().set_table(InputId::Data, x.clone())?;
//! trainer.input_mut().set_table(InputId::Responses, y)?;
//! let model: LinearModel<f64> = trainer.compute()?.model(ResultId::Model)?;
//!
//! let mut predictor = LinearPrediction::<f64>::new().mode(Batch).build()?;
//! predictor.input_mut().set_table(InputId::Data, x)?;
//! predictor.input_mut().set_model(InputId::Model, Arc::new(model))?;
//! let prediction = predictor.compute()?;
//! assert!(prediction.table(ResultId::Prediction).is_ok());
//! # Result::<(), NumflowError>::Ok(())
//! ```
//!
//! ## Online Processing
//!
//! Online algorithms accumulate engine state per chunk and produce the
//! result set exactly once. Calling `compute` after `finalize` is a typed
//! lifecycle error, never a silent reprocess:
//!
//! ```rust
//! use numflow::prelude::*;
//! use std::sync::Arc;
//!
//! let mut algorithm = Moments::<f64>::new().mode(Online).build()?;
//! for chunk in [vec![1.0, 2.0], vec![3.0, 4.0]] {
//!     let table = Arc::new(NumericTable::new(2, 1, chunk)?);
//!     algorithm.input_mut().set_table(InputId::Data, table)?;
//!     algorithm.compute()?;
//! }
//! let results = algorithm.finalize()?;
//! assert_eq!(results.table(ResultId::Mean)?.values(), &[2.5]);
//! assert!(algorithm.compute().is_err());
//! # Result::<(), NumflowError>::Ok(())
//! ```
//!
//! ## Contract Errors
//!
//! Every contract violation is reported synchronously at the call that
//! detects it: unsupported (precision, method) pairs fail at `build()`,
//! identifiers outside a family's closed input/result sets fail at the
//! binding or read, and engine-side numerical failures surface verbatim as
//! [`NumflowError::ComputationFailed`](prelude::NumflowError) with no retry.
//!
//! ## Resource Model
//!
//! Every built algorithm object exclusively owns its engine state and
//! releases it on drop. Callers staging many short-lived artifacts can
//! adopt them into a [`ResourceScope`](prelude::ResourceScope) for one
//! bulk release point.

// Layer 1-2: Primitives - data structures and basic utilities.
mod primitives;

// Layer 3: Engine - numeric kernels behind the protocol boundary.
mod engine;

// Layer 4: Families - algorithm families on the uniform protocol.
mod families;

// Layer 5: API - processing-mode selection.
mod api;

// Standard numflow prelude.
pub mod prelude {
    pub use crate::api::{Batch, Distributed, Online, ProcessingMode};
    pub use crate::primitives::collection::{
        InputId, InputValue, ModelArtifact, PartialCollection, ResultId, ResultValue,
    };
    pub use crate::primitives::errors::NumflowError;
    pub use crate::primitives::precision::{Precision, PrecisionToken};
    pub use crate::primitives::scope::ResourceScope;
    pub use crate::primitives::serial::{pack, peek_tag, unpack, Persistable, SerializationTag};
    pub use crate::primitives::table::{CsrTable, NumericTable};

    pub use crate::families::moments::{
        MomentsBuilder as Moments, MomentsMethod, MomentsParameters, MomentsPartial,
        VarianceEstimate,
    };

    pub use crate::families::qr::distributed::{
        QrCorrectionPartial, QrOrthogonalPartial, QrStep1Output, QrTriangularPartial,
    };
    pub use crate::families::qr::{QrBuilder as Qr, QrMethod};

    pub use crate::families::linear::model::LinearModel;
    pub use crate::families::linear::{
        PredictMethod, PredictionBuilder as LinearPrediction, TrainMethod,
        TrainParameters, TrainingBuilder as LinearTraining,
    };
    pub use crate::engine::normal_equations::NormalEquationsPartial;
}

// Internal modules for development and testing.
//
// This module re-exports internal layers for development and testing
// purposes. It is only available with the `dev` feature enabled.
#[cfg(feature = "dev")]
pub mod internals {
    pub mod primitives {
        pub use crate::primitives::*;
    }
    pub mod engine {
        pub use crate::engine::*;
    }
    pub mod families {
        pub use crate::families::*;
    }
    pub mod api {
        pub use crate::api::*;
    }
}
