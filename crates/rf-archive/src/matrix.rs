//! Immutable dense matrix decoded from archive text.

use nalgebra::DMatrix;

/// A dense `rows x cols` matrix with column-major storage.
///
/// Archive files are written row by row; parsing transposes them into the
/// column-major layout the numeric engine consumes. Once built a `Matrix` is
/// never mutated.
#[derive(Clone, Debug, PartialEq)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    values: Vec<f64>,
}

impl Matrix {
    /// Build from values given row by row (the on-disk order).
    ///
    /// Returns `None` when `values.len() != rows * cols`.
    pub fn from_row_major(rows: usize, cols: usize, values: &[f64]) -> Option<Self> {
        if values.len() != rows * cols {
            return None;
        }
        let mut col_major = vec![0.0; values.len()];
        for r in 0..rows {
            for c in 0..cols {
                col_major[c * rows + r] = values[r * cols + c];
            }
        }
        Some(Self {
            rows,
            cols,
            values: col_major,
        })
    }

    /// Build element by element.
    pub fn from_fn(rows: usize, cols: usize, mut f: impl FnMut(usize, usize) -> f64) -> Self {
        let mut values = Vec::with_capacity(rows * cols);
        for c in 0..cols {
            for r in 0..rows {
                values.push(f(r, c));
            }
        }
        Self { rows, cols, values }
    }

    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self::from_fn(rows, cols, |_, _| 0.0)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Column-major values.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        if row < self.rows && col < self.cols {
            Some(self.values[col * self.rows + row])
        } else {
            None
        }
    }

    /// Copy into an nalgebra matrix (same orientation, same storage order).
    pub fn to_dmatrix(&self) -> DMatrix<f64> {
        DMatrix::from_column_slice(self.rows, self.cols, &self.values)
    }

    /// Render in the archive text format: one row per line, space separated.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for r in 0..self.rows {
            let row: Vec<String> = (0..self.cols)
                .map(|c| format!("{:e}", self.values[c * self.rows + r]))
                .collect();
            out.push_str(&row.join(" "));
            out.push('\n');
        }
        out
    }
}

impl From<&Matrix> for DMatrix<f64> {
    fn from(m: &Matrix) -> Self {
        m.to_dmatrix()
    }
}
