//! Householder QR factorization kernel.
//!
//! ## Purpose
//!
//! This module implements the thin QR factorization behind the qr family:
//! the one-shot Householder factorization used by batch compute, and the
//! triangular-merge step that lets online and distributed execution combine
//! per-block factors into the factors of the stacked data.
//!
//! ## Design notes
//!
//! * **Thin Factors**: For an n x p input with n >= p, Q is n x p with
//!   orthonormal columns and R is p x p upper triangular.
//! * **Unique Factors**: The diagonal of R is normalized non-negative, which
//!   makes the factorization unique for full-column-rank input. Block-wise
//!   merging then reproduces the batch factors up to floating-point
//!   tolerance.
//! * **Merge Identity**: Stacking the per-block triangular factors and
//!   factorizing once yields the global R; the row blocks of the stacked
//!   orthogonal factor are the per-block corrections that rotate each local
//!   Q onto the global one.
//!
//! ## Invariants
//!
//! * `q * r` reproduces the input up to floating-point error.
//! * `r[i][j] == 0` for i > j, and `r[i][i] >= 0`.
//!
//! ## Non-goals
//!
//! * No pivoting and no rank-revealing variant; rank-deficient input is
//!   reported as a computation failure.

// External dependencies
use num_traits::Float;

// Internal dependencies
use crate::primitives::errors::NumflowError;
use crate::primitives::table::NumericTable;

const FAMILY: &str = "qr";

// ============================================================================
// Factor Pair
// ============================================================================

/// Thin QR factors of a dense table.
#[derive(Debug, Clone, PartialEq)]
pub struct QrFactors<T> {
    /// Orthogonal factor, n x p with orthonormal columns.
    pub q: NumericTable<T>,

    /// Upper-triangular factor, p x p with non-negative diagonal.
    pub r: NumericTable<T>,
}

// ============================================================================
// Householder Factorization
// ============================================================================

/// Factorize an n x p table (n >= p) into thin QR factors.
pub fn factorize<T: Float>(data: &NumericTable<T>) -> Result<QrFactors<T>, NumflowError> {
    let n = data.rows();
    let p = data.cols();
    let mut a: Vec<T> = data.values().to_vec();
    let mut reflectors: Vec<Vec<T>> = Vec::with_capacity(p);

    for k in 0..p {
        let mut norm_sq = T::zero();
        for i in k..n {
            let v = a[i * p + k];
            norm_sq = norm_sq + v * v;
        }
        let norm = norm_sq.sqrt();
        if norm == T::zero() {
            return Err(NumflowError::ComputationFailed {
                family: FAMILY,
                message: format!("input is rank deficient at column {k}"),
            });
        }

        // Reflect the column onto +/- norm * e1, choosing the sign that
        // avoids cancellation.
        let pivot = a[k * p + k];
        let alpha = if pivot >= T::zero() { -norm } else { norm };
        let mut v = vec![T::zero(); n - k];
        v[0] = pivot - alpha;
        for i in k + 1..n {
            v[i - k] = a[i * p + k];
        }
        let vtv = v.iter().fold(T::zero(), |acc, &x| acc + x * x);

        if vtv > T::zero() {
            for j in k + 1..p {
                let mut dot = T::zero();
                for i in k..n {
                    dot = dot + v[i - k] * a[i * p + j];
                }
                let factor = (dot + dot) / vtv;
                for i in k..n {
                    a[i * p + j] = a[i * p + j] - factor * v[i - k];
                }
            }
        }

        a[k * p + k] = alpha;
        for i in k + 1..n {
            a[i * p + k] = T::zero();
        }
        reflectors.push(v);
    }

    // Upper triangle of the work buffer is R.
    let mut r = vec![T::zero(); p * p];
    for i in 0..p {
        for j in i..p {
            r[i * p + j] = a[i * p + j];
        }
    }

    // Q = H_0 * ... * H_{p-1} applied to the leading columns of the identity.
    let mut q = vec![T::zero(); n * p];
    for j in 0..p {
        q[j * p + j] = T::one();
    }
    for k in (0..p).rev() {
        let v = &reflectors[k];
        let vtv = v.iter().fold(T::zero(), |acc, &x| acc + x * x);
        if vtv == T::zero() {
            continue;
        }
        for j in 0..p {
            let mut dot = T::zero();
            for i in k..n {
                dot = dot + v[i - k] * q[i * p + j];
            }
            if dot == T::zero() {
                continue;
            }
            let factor = (dot + dot) / vtv;
            for i in k..n {
                q[i * p + j] = q[i * p + j] - factor * v[i - k];
            }
        }
    }

    // Normalize so diag(R) >= 0; the factor pair stays a valid product.
    for j in 0..p {
        if r[j * p + j] < T::zero() {
            for c in j..p {
                r[j * p + c] = -r[j * p + c];
            }
            for i in 0..n {
                q[i * p + j] = -q[i * p + j];
            }
        }
    }

    Ok(QrFactors {
        q: NumericTable::new(n, p, q)?,
        r: NumericTable::new(p, p, r)?,
    })
}

// ============================================================================
// Triangular Merge
// ============================================================================

/// Merge per-block triangular factors into the global factor pair.
///
/// Given the p x p triangular factors of k row blocks, returns the global
/// p x p triangular factor of the stacked data plus, per input block in
/// order, the p x p correction that maps the block's local orthogonal factor
/// onto the global one (`q_global_block = q_local * correction`).
pub fn merge_triangular<T: Float>(
    blocks: &[&NumericTable<T>],
) -> Result<(NumericTable<T>, Vec<NumericTable<T>>), NumflowError> {
    let first = blocks.first().ok_or(NumflowError::ComputationFailed {
        family: FAMILY,
        message: "triangular merge received no blocks".into(),
    })?;
    let p = first.cols();
    for block in blocks {
        if block.rows() != p || block.cols() != p {
            return Err(NumflowError::DimensionMismatch {
                context: "triangular merge block shape",
                expected: p,
                got: block.rows().max(block.cols()),
            });
        }
    }

    log::trace!("qr triangular merge of {} blocks, order {p}", blocks.len());

    let mut stacked = Vec::with_capacity(blocks.len() * p * p);
    for block in blocks {
        stacked.extend_from_slice(block.values());
    }
    let stacked = NumericTable::new(blocks.len() * p, p, stacked)?;
    let factors = factorize(&stacked)?;

    let mut corrections = Vec::with_capacity(blocks.len());
    for b in 0..blocks.len() {
        let mut values = Vec::with_capacity(p * p);
        for i in 0..p {
            values.extend_from_slice(factors.q.row(b * p + i));
        }
        corrections.push(NumericTable::new(p, p, values)?);
    }

    Ok((factors.r, corrections))
}

// ============================================================================
// Tests
// ============================================================================
