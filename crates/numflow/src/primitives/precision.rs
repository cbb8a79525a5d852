//! Floating-point precision selection.
//!
//! ## Purpose
//!
//! This module defines the precision vocabulary of the crate: the closed
//! [`Precision`] enumeration and the sealed [`PrecisionToken`] trait that ties
//! each supported scalar type to its precision at compile time.
//!
//! ## Design notes
//!
//! * **Sealed**: Only `f32` and `f64` implement [`PrecisionToken`]; downstream
//!   crates cannot widen the set.
//! * **Construction-Time**: Algorithm builders read `T::PRECISION` once when
//!   `build()` runs; the choice is baked into the constructed object.
//! * **Zero-Cost**: The token is an ordinary generic parameter, so kernel code
//!   monomorphizes per precision with no runtime dispatch.
//!
//! ## Key concepts
//!
//! * **Precision**: the floating-point width used for all internal arithmetic
//!   of an algorithm object.
//! * **Token**: the scalar type (`f32`/`f64`) the caller supplies as the
//!   generic parameter of a builder.
//!
//! ## Invariants
//!
//! * A constructed algorithm never changes precision.
//! * `Precision::of::<T>()` agrees with `T::PRECISION` for every token.
//!
//! ## Non-goals
//!
//! * This module does not decide which (precision, method) pairs a family
//!   supports; families declare that themselves.

// External dependencies
use core::fmt::{Debug, Display, Formatter, Result};
use num_traits::Float;

mod sealed {
    pub trait Sealed {}

    impl Sealed for f32 {}
    impl Sealed for f64 {}
}

// ============================================================================
// Precision Enum
// ============================================================================

/// Floating-point width of an algorithm's internal arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Precision {
    /// 32-bit IEEE-754 arithmetic (`f32`).
    Single,

    /// 64-bit IEEE-754 arithmetic (`f64`).
    Double,
}

impl Precision {
    /// Get the precision of a token type.
    #[inline]
    pub fn of<T: PrecisionToken>() -> Self {
        T::PRECISION
    }

    /// Get the name of the precision.
    #[inline]
    pub const fn name(&self) -> &'static str {
        match self {
            Precision::Single => "single",
            Precision::Double => "double",
        }
    }
}

impl Display for Precision {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// Precision Token Trait
// ============================================================================

/// Scalar types accepted as precision selectors.
///
/// The trait is sealed: `f32` and `f64` are the complete set. Every algorithm
/// builder in the crate is generic over a `PrecisionToken`, and the chosen
/// token fixes the precision of the constructed object for its lifetime.
pub trait PrecisionToken:
    Float + Debug + Display + Send + Sync + sealed::Sealed + 'static
{
    /// The precision this token selects.
    const PRECISION: Precision;
}

impl PrecisionToken for f32 {
    const PRECISION: Precision = Precision::Single;
}

impl PrecisionToken for f64 {
    const PRECISION: Precision = Precision::Double;
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_precision_agrees_with_of() {
        assert_eq!(Precision::of::<f32>(), Precision::Single);
        assert_eq!(Precision::of::<f64>(), Precision::Double);
    }

    #[test]
    fn precision_names() {
        assert_eq!(Precision::Single.name(), "single");
        assert_eq!(Precision::Double.name(), "double");
    }
}
