//! Layer 3: Engine
//!
//! # Purpose
//!
//! This layer holds the numeric kernels the algorithm families dispatch
//! into, plus the shared validation utilities. The protocol treats these
//! kernels as opaque collaborators: families own the construction, binding,
//! and lifecycle contracts, and hand validated data across this boundary.
//!
//! # Architecture
//!
//! ```text
//! Layer 5: API
//!   ↓
//! Layer 4: Families
//!   ↓
//! Layer 3: Engine ← You are here
//!   ↓
//! Layer 1-2: Primitives
//! ```

/// Fail-fast validation utilities.
pub mod validator;

/// Shared dense linear-algebra helpers.
pub(crate) mod ops;

/// Low-order moments accumulation.
pub mod moments;

/// Householder QR factorization and triangular merge.
pub mod factorization;

/// Normal-equations accumulation and solve.
pub mod normal_equations;
