//! Layer 4: Algorithm Families
//!
//! # Purpose
//!
//! This layer provides the algorithm families exposed through the uniform
//! invocation protocol. Every family follows the same shape: a fluent
//! builder fixes precision, method, and construction-time parameters; a
//! processing-mode marker selects batch, online, or distributed execution;
//! the built object owns its engine state, binds identifier-keyed inputs,
//! and produces an identifier-keyed result collection.
//!
//! # Architecture
//!
//! ```text
//! Layer 5: API
//!   ↓
//! Layer 4: Families ← You are here
//!   ↓
//! Layer 3: Engine
//!   ↓
//! Layer 1-2: Primitives
//! ```

/// Low-order statistical moments.
pub mod moments;

/// Thin QR factorization.
pub mod qr;

/// Linear regression training and prediction.
pub mod linear;
