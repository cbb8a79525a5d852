#![cfg(feature = "dev")]
//! Tests for internal layers exposed through the `dev` feature.
//!
//! These tests reach below the public protocol surface to exercise the
//! engine and validator layers directly. They verify:
//! - The validator's fail-fast checks in isolation
//! - The triangular-merge identity the distributed QR pipeline relies on
//! - Additive-merge agreement of the accumulation kernels
//!
//! ## Test Organization
//!
//! 1. **Validator** - isolated parameter and content checks
//! 2. **Factorization Kernel** - merge identity
//! 3. **Accumulation Kernels** - merge vs. single pass

use approx::assert_abs_diff_eq;
use numflow::internals::engine::factorization::{factorize, merge_triangular};
use numflow::internals::engine::moments::{MomentsPartial, VarianceEstimate};
use numflow::internals::engine::validator::Validator;
use numflow::prelude::*;

// ============================================================================
// Validator Tests
// ============================================================================

/// Test that non-finite table content is caught with its position.
#[test]
fn test_validator_flags_non_finite_values() {
    let data = NumericTable::new(2, 2, vec![1.0, 2.0, f64::NAN, 4.0]).unwrap();
    let err = Validator::validate_dense(&data, "data").unwrap_err();
    assert!(matches!(err, NumflowError::InvalidNumericValue(_)));
}

/// Test the tall-table requirement of thin factorizations.
#[test]
fn test_validator_tall_requirement() {
    assert!(Validator::validate_tall(3, 2).is_ok());
    assert!(Validator::validate_tall(2, 2).is_ok());
    assert!(Validator::validate_tall(1, 2).is_err());
}

/// Test ridge bounds.
#[test]
fn test_validator_ridge_bounds() {
    assert!(Validator::validate_ridge(0.0_f64).is_ok());
    assert!(Validator::validate_ridge(2.5_f64).is_ok());
    assert!(Validator::validate_ridge(-0.1_f64).is_err());
    assert!(Validator::validate_ridge(f64::INFINITY).is_err());
}

// ============================================================================
// Factorization Kernel Tests
// ============================================================================

/// Test the merge identity over three row blocks.
///
/// Verifies that factorizing per block and merging the triangular factors
/// reproduces the triangular factor of the stacked data.
#[test]
fn test_merge_identity_three_blocks() {
    let blocks = [
        NumericTable::new(2, 2, vec![2.0, 1.0, 1.0, 3.0]).unwrap(),
        NumericTable::new(3, 2, vec![4.0, 1.0, 1.0, 2.0, 3.0, 2.0]).unwrap(),
        NumericTable::new(2, 2, vec![2.0, 5.0, 5.0, 1.0]).unwrap(),
    ];
    let refs: Vec<&NumericTable<f64>> = blocks.iter().collect();
    let whole = NumericTable::vstack(&refs).unwrap();
    let batch = factorize(&whole).unwrap();

    let locals: Vec<_> = blocks.iter().map(|b| factorize(b).unwrap()).collect();
    let triangulars: Vec<&NumericTable<f64>> = locals.iter().map(|f| &f.r).collect();
    let (merged, corrections) = merge_triangular(&triangulars).unwrap();

    assert_eq!(corrections.len(), 3);
    for i in 0..2 {
        for j in 0..2 {
            assert_abs_diff_eq!(merged.at(i, j), batch.r.at(i, j), epsilon = 1e-10);
        }
    }
}

// ============================================================================
// Accumulation Kernel Tests
// ============================================================================

/// Test that splitting the accumulation does not change the statistics.
#[test]
fn test_moments_merge_matches_single_pass() {
    let data = NumericTable::new(6, 1, vec![2.0, 4.0, 6.0, 8.0, 10.0, 12.0]).unwrap();

    let mut whole = MomentsPartial::new(1);
    whole.update_dense(&data).unwrap();

    let blocks = data.split_rows(3).unwrap();
    let mut merged = MomentsPartial::new(1);
    for block in &blocks {
        let mut partial = MomentsPartial::new(1);
        partial.update_dense(block).unwrap();
        merged.merge(&partial).unwrap();
    }

    let a = whole.finalize(VarianceEstimate::Sample).unwrap();
    let b = merged.finalize(VarianceEstimate::Sample).unwrap();
    assert_eq!(a.mean, b.mean);
    assert_eq!(a.variance, b.variance);
    assert_eq!(a.minimum, b.minimum);
    assert_eq!(a.maximum, b.maximum);
}
