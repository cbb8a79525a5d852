//! Shared dense linear-algebra helpers for the engine kernels.
//!
//! ## Purpose
//!
//! This module holds the small dense operations the kernels share: matrix
//! multiplication, transpose-products for normal-equations accumulation, and
//! the Cholesky solve used by least-squares training.
//!
//! ## Design notes
//!
//! * **Row-Major**: All helpers operate on the row-major layout of
//!   [`NumericTable`].
//! * **Generics**: Generic over `Float` so kernels monomorphize per
//!   precision token.
//!
//! ## Invariants
//!
//! * Callers validate dimensions before invoking a helper; helpers assume
//!   agreeing shapes except where they return a typed error.
//!
//! ## Non-goals
//!
//! * No blocking, vectorization, or parallel execution; the engine is a
//!   reference implementation behind the protocol boundary.

// External dependencies
use num_traits::Float;

// Internal dependencies
use crate::primitives::errors::NumflowError;
use crate::primitives::table::NumericTable;

// ============================================================================
// Products
// ============================================================================

/// Dense product `A * B` for an m x k table and a k x n table.
pub(crate) fn matmul<T: Float>(
    a: &NumericTable<T>,
    b: &NumericTable<T>,
) -> Result<NumericTable<T>, NumflowError> {
    if a.cols() != b.rows() {
        return Err(NumflowError::DimensionMismatch {
            context: "matrix product inner dimension",
            expected: a.cols(),
            got: b.rows(),
        });
    }
    let (m, k, n) = (a.rows(), a.cols(), b.cols());
    let mut out = NumericTable::zeros(m, n)?;
    for i in 0..m {
        let a_row = a.row(i);
        for l in 0..k {
            let a_il = a_row[l];
            if a_il == T::zero() {
                continue;
            }
            let b_row = b.row(l);
            let out_row = &mut out.values_mut()[i * n..(i + 1) * n];
            for j in 0..n {
                out_row[j] = out_row[j] + a_il * b_row[j];
            }
        }
    }
    Ok(out)
}

/// Accumulate `dst += X^T * X` for a row-major n x d block.
///
/// `dst` is a d x d row-major buffer.
pub(crate) fn accumulate_gram<T: Float>(dst: &mut [T], x: &[T], rows: usize, d: usize) {
    for r in 0..rows {
        let row = &x[r * d..(r + 1) * d];
        for i in 0..d {
            let xi = row[i];
            if xi == T::zero() {
                continue;
            }
            for j in 0..d {
                dst[i * d + j] = dst[i * d + j] + xi * row[j];
            }
        }
    }
}

/// Accumulate `dst += X^T * Y` for n x d and n x r row-major blocks.
///
/// `dst` is a d x r row-major buffer.
pub(crate) fn accumulate_cross<T: Float>(
    dst: &mut [T],
    x: &[T],
    y: &[T],
    rows: usize,
    d: usize,
    r: usize,
) {
    for row in 0..rows {
        let x_row = &x[row * d..(row + 1) * d];
        let y_row = &y[row * r..(row + 1) * r];
        for i in 0..d {
            let xi = x_row[i];
            if xi == T::zero() {
                continue;
            }
            for j in 0..r {
                dst[i * r + j] = dst[i * r + j] + xi * y_row[j];
            }
        }
    }
}

/// Dense product `A^T * B` for an n x p table and an n x r table.
pub(crate) fn transpose_matmul<T: Float>(
    a: &NumericTable<T>,
    b: &NumericTable<T>,
) -> Result<NumericTable<T>, NumflowError> {
    if a.rows() != b.rows() {
        return Err(NumflowError::DimensionMismatch {
            context: "transpose product row count",
            expected: a.rows(),
            got: b.rows(),
        });
    }
    let (n, p, r) = (a.rows(), a.cols(), b.cols());
    let mut out = NumericTable::zeros(p, r)?;
    for row in 0..n {
        let a_row = a.row(row);
        let b_row = b.row(row);
        for i in 0..p {
            let ai = a_row[i];
            if ai == T::zero() {
                continue;
            }
            let out_row = &mut out.values_mut()[i * r..(i + 1) * r];
            for j in 0..r {
                out_row[j] = out_row[j] + ai * b_row[j];
            }
        }
    }
    Ok(out)
}

/// Back-substitute `R * X = B` for an upper-triangular d x d factor and a
/// d x r right-hand side, overwriting `b` with the solution.
pub(crate) fn upper_solve<T: Float>(
    r_factor: &NumericTable<T>,
    b: &mut [T],
    rhs_cols: usize,
    family: &'static str,
) -> Result<(), NumflowError> {
    let d = r_factor.rows();
    for col in 0..rhs_cols {
        for i in (0..d).rev() {
            let diag = r_factor.at(i, i);
            if diag == T::zero() || !diag.is_finite() {
                return Err(NumflowError::ComputationFailed {
                    family,
                    message: format!("triangular factor is singular at row {i}"),
                });
            }
            let mut s = b[i * rhs_cols + col];
            for k in i + 1..d {
                s = s - r_factor.at(i, k) * b[k * rhs_cols + col];
            }
            b[i * rhs_cols + col] = s / diag;
        }
    }
    Ok(())
}

// ============================================================================
// Cholesky Solve
// ============================================================================

/// Solve `A * X = B` for a symmetric positive-definite d x d system with r
/// right-hand-side columns, via an in-place Cholesky factorization.
///
/// `a` is consumed as the d x d row-major system; `b` is d x r row-major and
/// is overwritten with the solution.
pub(crate) fn cholesky_solve<T: Float>(
    mut a: Vec<T>,
    d: usize,
    b: &mut [T],
    r: usize,
    family: &'static str,
) -> Result<(), NumflowError> {
    // Factor A = L * L^T, storing L in the lower triangle.
    for i in 0..d {
        for j in 0..=i {
            let mut s = a[i * d + j];
            for k in 0..j {
                s = s - a[i * d + k] * a[j * d + k];
            }
            if i == j {
                if s <= T::zero() || !s.is_finite() {
                    return Err(NumflowError::ComputationFailed {
                        family,
                        message: format!(
                            "system is not positive definite at pivot {i} (value {})",
                            s.to_f64().unwrap_or(f64::NAN)
                        ),
                    });
                }
                a[i * d + j] = s.sqrt();
            } else {
                a[i * d + j] = s / a[j * d + j];
            }
        }
    }

    // Forward substitution: L * Z = B.
    for col in 0..r {
        for i in 0..d {
            let mut s = b[i * r + col];
            for k in 0..i {
                s = s - a[i * d + k] * b[k * r + col];
            }
            b[i * r + col] = s / a[i * d + i];
        }
        // Back substitution: L^T * X = Z.
        for i in (0..d).rev() {
            let mut s = b[i * r + col];
            for k in i + 1..d {
                s = s - a[k * d + i] * b[k * r + col];
            }
            b[i * r + col] = s / a[i * d + i];
        }
    }
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
