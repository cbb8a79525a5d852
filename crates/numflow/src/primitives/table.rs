//! Numeric table containers for algorithm input and output.
//!
//! ## Purpose
//!
//! This module provides the two-dimensional numeric containers exchanged
//! across the protocol boundary: the dense row-major [`NumericTable`] and the
//! compressed sparse row [`CsrTable`].
//!
//! ## Design notes
//!
//! * **Row-Major**: Dense storage is a single contiguous `Vec` in row order,
//!   so row slices come out for free.
//! * **Reference Semantics**: Algorithms bind tables behind `Arc`; binding
//!   never copies the data.
//! * **Serializable**: Both containers derive `serde` traits so partial
//!   results and models embedding them can cross the serialization boundary.
//!
//! ## Key concepts
//!
//! * **Numeric table**: rows x columns container, rows are observations and
//!   columns are features.
//! * **CSR layout**: `values`/`col_indices` flattened per row with
//!   `row_offsets` of length rows + 1.
//!
//! ## Invariants
//!
//! * `values.len() == rows * cols` for dense tables.
//! * `row_offsets` is monotonically non-decreasing and starts at 0.
//! * Column indices within each CSR row are strictly increasing.
//!
//! ## Non-goals
//!
//! * This module does not validate finiteness of values (see the engine
//!   validator).
//! * This module does not implement arithmetic; kernels read slices directly.

// External dependencies
use core::fmt::{Display, Formatter, Result as FmtResult};
use num_traits::Float;
use serde::{Deserialize, Serialize};

// Internal dependencies
use crate::primitives::errors::NumflowError;

// ============================================================================
// Dense Table
// ============================================================================

/// Dense row-major numeric table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericTable<T> {
    rows: usize,
    cols: usize,
    values: Vec<T>,
}

impl<T: Float> NumericTable<T> {
    /// Create a table from row-major values.
    ///
    /// Fails if the value count does not equal `rows * cols` or if either
    /// extent is zero.
    pub fn new(rows: usize, cols: usize, values: Vec<T>) -> Result<Self, NumflowError> {
        if rows == 0 || cols == 0 {
            return Err(NumflowError::EmptyTable {
                context: "table construction",
            });
        }
        if values.len() != rows * cols {
            return Err(NumflowError::DimensionMismatch {
                context: "table values",
                expected: rows * cols,
                got: values.len(),
            });
        }
        Ok(Self { rows, cols, values })
    }

    /// Create a zero-filled table.
    pub fn zeros(rows: usize, cols: usize) -> Result<Self, NumflowError> {
        Self::new(rows, cols, vec![T::zero(); rows * cols])
    }

    /// Number of rows.
    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Value at (row, col).
    ///
    /// # Panics
    ///
    /// Panics if the position is out of bounds, like slice indexing.
    #[inline]
    pub fn at(&self, row: usize, col: usize) -> T {
        self.values[row * self.cols + col]
    }

    /// One row as a slice.
    #[inline]
    pub fn row(&self, row: usize) -> &[T] {
        let start = row * self.cols;
        &self.values[start..start + self.cols]
    }

    /// All values in row-major order.
    #[inline]
    pub fn values(&self) -> &[T] {
        &self.values
    }

    /// Mutable access to all values in row-major order.
    #[inline]
    pub(crate) fn values_mut(&mut self) -> &mut [T] {
        &mut self.values
    }

    /// Vertically concatenate tables with identical column counts.
    ///
    /// Used by callers splitting data into partitions and by tests comparing
    /// distributed against batch execution.
    pub fn vstack(blocks: &[&NumericTable<T>]) -> Result<Self, NumflowError> {
        let first = blocks.first().ok_or(NumflowError::EmptyTable {
            context: "vertical concatenation",
        })?;
        let cols = first.cols;
        let mut values = Vec::new();
        let mut rows = 0;
        for block in blocks {
            if block.cols != cols {
                return Err(NumflowError::DimensionMismatch {
                    context: "vertical concatenation columns",
                    expected: cols,
                    got: block.cols,
                });
            }
            values.extend_from_slice(&block.values);
            rows += block.rows;
        }
        Self::new(rows, cols, values)
    }

    /// Split the table into `parts` contiguous row blocks.
    ///
    /// The first `rows % parts` blocks receive one extra row, so every row is
    /// assigned to exactly one block.
    pub fn split_rows(&self, parts: usize) -> Result<Vec<NumericTable<T>>, NumflowError> {
        if parts == 0 || parts > self.rows {
            return Err(NumflowError::InvalidParameter {
                parameter: "parts",
                message: format!("must be in [1, {}], got {parts}", self.rows),
            });
        }
        let base = self.rows / parts;
        let extra = self.rows % parts;
        let mut blocks = Vec::with_capacity(parts);
        let mut row = 0;
        for p in 0..parts {
            let height = base + usize::from(p < extra);
            let start = row * self.cols;
            let end = (row + height) * self.cols;
            blocks.push(NumericTable::new(
                height,
                self.cols,
                self.values[start..end].to_vec(),
            )?);
            row += height;
        }
        Ok(blocks)
    }
}

impl<T: Float + Display> Display for NumericTable<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        writeln!(f, "NumericTable {}x{}:", self.rows, self.cols)?;
        for r in 0..self.rows {
            write!(f, " ")?;
            for c in 0..self.cols {
                write!(f, " {:>12.6}", self.at(r, c))?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

// ============================================================================
// CSR Table
// ============================================================================

/// Compressed sparse row numeric table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CsrTable<T> {
    rows: usize,
    cols: usize,
    values: Vec<T>,
    col_indices: Vec<usize>,
    row_offsets: Vec<usize>,
}

impl<T: Float> CsrTable<T> {
    /// Create a CSR table from its three arrays.
    pub fn new(
        rows: usize,
        cols: usize,
        values: Vec<T>,
        col_indices: Vec<usize>,
        row_offsets: Vec<usize>,
    ) -> Result<Self, NumflowError> {
        if rows == 0 || cols == 0 {
            return Err(NumflowError::EmptyTable {
                context: "CSR table construction",
            });
        }
        if row_offsets.len() != rows + 1 {
            return Err(NumflowError::DimensionMismatch {
                context: "CSR row offsets",
                expected: rows + 1,
                got: row_offsets.len(),
            });
        }
        if values.len() != col_indices.len() {
            return Err(NumflowError::DimensionMismatch {
                context: "CSR value/index arrays",
                expected: values.len(),
                got: col_indices.len(),
            });
        }
        if row_offsets[0] != 0 || *row_offsets.last().unwrap_or(&0) != values.len() {
            return Err(NumflowError::InvalidParameter {
                parameter: "row_offsets",
                message: "offsets must start at 0 and end at the value count".into(),
            });
        }
        for window in row_offsets.windows(2) {
            if window[1] < window[0] {
                return Err(NumflowError::InvalidParameter {
                    parameter: "row_offsets",
                    message: "offsets must be non-decreasing".into(),
                });
            }
            let row_cols = &col_indices[window[0]..window[1]];
            for pair in row_cols.windows(2) {
                if pair[1] <= pair[0] {
                    return Err(NumflowError::InvalidParameter {
                        parameter: "col_indices",
                        message: "column indices must be strictly increasing per row".into(),
                    });
                }
            }
            if let Some(&last) = row_cols.last() {
                if last >= cols {
                    return Err(NumflowError::DimensionMismatch {
                        context: "CSR column index",
                        expected: cols,
                        got: last,
                    });
                }
            }
        }
        Ok(Self {
            rows,
            cols,
            values,
            col_indices,
            row_offsets,
        })
    }

    /// Build a CSR table from a dense one, dropping exact zeros.
    pub fn from_dense(dense: &NumericTable<T>) -> Result<Self, NumflowError> {
        let mut values = Vec::new();
        let mut col_indices = Vec::new();
        let mut row_offsets = Vec::with_capacity(dense.rows() + 1);
        row_offsets.push(0);
        for r in 0..dense.rows() {
            for (c, &v) in dense.row(r).iter().enumerate() {
                if v != T::zero() {
                    values.push(v);
                    col_indices.push(c);
                }
            }
            row_offsets.push(values.len());
        }
        Self::new(dense.rows(), dense.cols(), values, col_indices, row_offsets)
    }

    /// Number of rows.
    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Stored (explicit) entries of one row as parallel slices.
    #[inline]
    pub fn row_entries(&self, row: usize) -> (&[usize], &[T]) {
        let start = self.row_offsets[row];
        let end = self.row_offsets[row + 1];
        (&self.col_indices[start..end], &self.values[start..end])
    }

    /// All stored values.
    #[inline]
    pub fn values(&self) -> &[T] {
        &self.values
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dense_round_indexing() {
        let t = NumericTable::new(2, 3, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        assert_eq!(t.at(0, 2), 3.0);
        assert_eq!(t.row(1), &[4.0, 5.0, 6.0]);
    }

    #[test]
    fn dense_rejects_bad_shapes() {
        assert!(NumericTable::<f64>::new(0, 3, vec![]).is_err());
        assert!(NumericTable::new(2, 2, vec![1.0, 2.0, 3.0]).is_err());
    }

    #[test]
    fn split_then_stack_is_identity() {
        let t = NumericTable::new(5, 2, (0..10).map(f64::from).collect()).unwrap();
        let blocks = t.split_rows(3).unwrap();
        assert_eq!(blocks.iter().map(NumericTable::rows).sum::<usize>(), 5);
        let refs: Vec<&NumericTable<f64>> = blocks.iter().collect();
        assert_eq!(NumericTable::vstack(&refs).unwrap(), t);
    }

    #[test]
    fn csr_from_dense_keeps_structure() {
        let dense = NumericTable::new(2, 3, vec![1.0, 0.0, 2.0, 0.0, 0.0, 3.0]).unwrap();
        let csr = CsrTable::from_dense(&dense).unwrap();
        assert_eq!(csr.row_entries(0), (&[0usize, 2][..], &[1.0, 2.0][..]));
        assert_eq!(csr.row_entries(1), (&[2usize][..], &[3.0][..]));
    }

    #[test]
    fn csr_rejects_unsorted_columns() {
        let r = CsrTable::new(1, 3, vec![1.0, 2.0], vec![2, 0], vec![0, 2]);
        assert!(r.is_err());
    }
}
