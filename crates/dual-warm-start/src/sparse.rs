//! Column-major CSC assembly.
//!
//! [`CscBuilder`] fills a [`CscMatrix`] one column at a time and checks the
//! structural invariants on [`CscBuilder::build`]:
//!
//! - `colptr.len() == ncols + 1`, `colptr[0] == 0`, non-decreasing
//! - `colptr[ncols] == rowval.len() == nzval.len()`
//! - every row index `< nrows`, strictly increasing within a column
//!
//! Violations are programming errors in the caller and panic.

use clarabel::algebra::CscMatrix;
use nalgebra::DMatrix;

/// Incremental column-by-column CSC builder.
#[derive(Clone, Debug)]
pub struct CscBuilder {
    nrows: usize,
    ncols: usize,
    colptr: Vec<usize>,
    rowval: Vec<usize>,
    nzval: Vec<f64>,
}

impl CscBuilder {
    /// Empty builder for an `nrows x ncols` matrix.
    pub fn new(nrows: usize, ncols: usize) -> Self {
        Self::with_capacity(nrows, ncols, 0)
    }

    /// Reserve room for `nnz` stored entries.
    pub fn with_capacity(nrows: usize, ncols: usize, nnz: usize) -> Self {
        let mut colptr = Vec::with_capacity(ncols + 1);
        colptr.push(0);
        Self {
            nrows,
            ncols,
            colptr,
            rowval: Vec::with_capacity(nnz),
            nzval: Vec::with_capacity(nnz),
        }
    }

    /// Index of the column currently being filled.
    pub fn current_column(&self) -> usize {
        self.colptr.len() - 1
    }

    /// Entries stored so far.
    pub fn nnz(&self) -> usize {
        self.nzval.len()
    }

    /// Append an entry to the current column. Explicit zeros are stored.
    pub fn push(&mut self, row: usize, value: f64) {
        assert!(
            self.current_column() < self.ncols,
            "push past last column ({} columns)",
            self.ncols
        );
        assert!(row < self.nrows, "row {row} out of range ({} rows)", self.nrows);
        self.rowval.push(row);
        self.nzval.push(value);
    }

    /// Close the current column.
    pub fn end_column(&mut self) {
        assert!(
            self.current_column() < self.ncols,
            "end_column past last column ({} columns)",
            self.ncols
        );
        self.colptr.push(self.rowval.len());
    }

    /// Close columns until `col` is the current column.
    pub fn skip_to_column(&mut self, col: usize) {
        while self.current_column() < col {
            self.end_column();
        }
    }

    /// Close any remaining columns and produce the matrix.
    pub fn build(mut self) -> CscMatrix<f64> {
        self.skip_to_column(self.ncols);
        let m = CscMatrix::new(self.nrows, self.ncols, self.colptr, self.rowval, self.nzval);
        assert_csc_invariants(&m);
        m
    }
}

/// Panic unless `m` is a structurally valid CSC matrix with sorted rows.
pub fn assert_csc_invariants(m: &CscMatrix<f64>) {
    assert_eq!(
        m.colptr.len(),
        m.n + 1,
        "column pointer length must be ncols + 1"
    );
    assert_eq!(m.colptr[0], 0, "column pointers must start at 0");
    assert_eq!(
        m.rowval.len(),
        m.nzval.len(),
        "row index and value arrays must have equal length"
    );
    assert_eq!(
        m.colptr[m.n],
        m.nzval.len(),
        "last column pointer must equal nnz"
    );
    for col in 0..m.n {
        let (start, end) = (m.colptr[col], m.colptr[col + 1]);
        assert!(start <= end, "column pointers must be non-decreasing");
        for k in start..end {
            assert!(m.rowval[k] < m.m, "row index out of range in column {col}");
            if k > start {
                assert!(
                    m.rowval[k - 1] < m.rowval[k],
                    "row indices must be strictly increasing in column {col}"
                );
            }
        }
    }
}

/// Keep only the entries on or above the diagonal.
pub fn upper_triangle(m: &CscMatrix<f64>) -> CscMatrix<f64> {
    let mut out = CscBuilder::with_capacity(m.m, m.n, m.nzval.len());
    for col in 0..m.n {
        for k in m.colptr[col]..m.colptr[col + 1] {
            if m.rowval[k] <= col {
                out.push(m.rowval[k], m.nzval[k]);
            }
        }
        out.end_column();
    }
    out.build()
}

/// Map every input row to zero or more `(output_row, scale)` targets.
///
/// Entries landing in the same column are re-sorted by output row. Two input
/// rows must not map to the same output row.
pub fn remap_rows(
    m: &CscMatrix<f64>,
    nrows_out: usize,
    targets: &[Vec<(usize, f64)>],
) -> CscMatrix<f64> {
    assert_eq!(targets.len(), m.m, "one target list per input row");
    let mut out = CscBuilder::with_capacity(nrows_out, m.n, m.nzval.len());
    let mut column: Vec<(usize, f64)> = Vec::new();
    for col in 0..m.n {
        column.clear();
        for k in m.colptr[col]..m.colptr[col + 1] {
            for &(row, scale) in &targets[m.rowval[k]] {
                column.push((row, scale * m.nzval[k]));
            }
        }
        column.sort_unstable_by_key(|&(row, _)| row);
        for &(row, value) in &column {
            out.push(row, value);
        }
        out.end_column();
    }
    out.build()
}

/// `y = M x`.
pub fn mul_vec(m: &CscMatrix<f64>, x: &[f64]) -> Vec<f64> {
    assert_eq!(x.len(), m.n, "vector length must equal ncols");
    let mut y = vec![0.0; m.m];
    for (col, &xc) in x.iter().enumerate() {
        for k in m.colptr[col]..m.colptr[col + 1] {
            y[m.rowval[k]] += m.nzval[k] * xc;
        }
    }
    y
}

/// Dense copy, for inspection and tests.
pub fn to_dense(m: &CscMatrix<f64>) -> DMatrix<f64> {
    let mut d = DMatrix::zeros(m.m, m.n);
    for col in 0..m.n {
        for k in m.colptr[col]..m.colptr[col + 1] {
            d[(m.rowval[k], col)] += m.nzval[k];
        }
    }
    d
}
