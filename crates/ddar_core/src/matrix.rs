//! Sparse column-major matrix (C2).
//!
//! Backs the AR engine's witness system (§4.4 `why`): each registered
//! expression appends a column, and the LP adapter reads `A` column by
//! column. The dense `Matrix` variant from the original implementation is
//! not carried over — its own doc comment marks it "not used" (see
//! DESIGN.md, Open Question: duplicate `Matrix` definitions).

use crate::error::MatrixError;

/// Column-major sparse matrix with a fixed per-column capacity `s`.
#[derive(Debug, Clone)]
pub struct SparseMatrix {
    m: usize,
    n: usize,
    s: usize,
    row_indices: Vec<Vec<i64>>,
    values: Vec<Vec<f64>>,
}

impl SparseMatrix {
    pub fn new(m: usize, n: usize, s: usize) -> SparseMatrix {
        SparseMatrix {
            m,
            n,
            s,
            row_indices: vec![vec![-1; s]; n],
            values: vec![vec![0.0; s]; n],
        }
    }

    pub fn rows(&self) -> usize {
        self.m
    }

    pub fn cols(&self) -> usize {
        self.n
    }

    pub fn capacity_per_column(&self) -> usize {
        self.s
    }

    fn in_bounds(&self, i: usize, j: usize) -> bool {
        i < self.m && j < self.n
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        if !self.in_bounds(i, j) {
            return 0.0;
        }
        let col_rows = &self.row_indices[j];
        for (slot, &row) in col_rows.iter().enumerate() {
            if row == i as i64 {
                return self.values[j][slot];
            }
        }
        0.0
    }

    /// Sets `A[i][j] = value`. Setting to (near) zero deletes the entry.
    /// Returns `Err` if the column has no free slot and no existing entry
    /// at row `i`.
    pub fn set(&mut self, i: usize, j: usize, value: f64) -> Result<(), MatrixError> {
        if !self.in_bounds(i, j) {
            return Err(MatrixError::OutOfBounds { row: i, col: j });
        }
        let col_rows = &mut self.row_indices[j];
        let col_vals = &mut self.values[j];

        if let Some(slot) = col_rows.iter().position(|&row| row == i as i64) {
            if value == 0.0 {
                col_rows[slot] = -1;
                col_vals[slot] = 0.0;
            } else {
                col_vals[slot] = value;
            }
            return Ok(());
        }

        if value == 0.0 {
            return Ok(());
        }

        if let Some(slot) = col_rows.iter().position(|&row| row == -1) {
            col_rows[slot] = i as i64;
            col_vals[slot] = value;
            Ok(())
        } else {
            Err(MatrixError::ColumnFull { column: j })
        }
    }

    pub fn extend_rows(&mut self, k: usize) {
        self.m += k;
    }

    pub fn extend_columns(&mut self, k: usize) {
        for _ in 0..k {
            self.row_indices.push(vec![-1; self.s]);
            self.values.push(vec![0.0; self.s]);
        }
        self.n += k;
    }

    /// Appends one column built from a sparse `row -> value` map,
    /// truncating entries beyond the column capacity `s`.
    pub fn extend_columns_from_map(&mut self, col: &std::collections::BTreeMap<usize, f64>) {
        let mut rows = vec![-1i64; self.s];
        let mut vals = vec![0.0; self.s];
        for (slot, (&row, &value)) in col.iter().enumerate() {
            if slot >= self.s {
                break;
            }
            rows[slot] = row as i64;
            vals[slot] = value;
        }
        self.row_indices.push(rows);
        self.values.push(vals);
        self.n += 1;
    }

    /// Steals `other`'s columns, provided `other.m <= self.m` and
    /// `other.s <= self.s`.
    pub fn extend_columns_from(&mut self, other: &SparseMatrix) -> bool {
        if other.m > self.m || other.s > self.s {
            return false;
        }
        for j in 0..other.n {
            let mut rows = vec![-1i64; self.s];
            let mut vals = vec![0.0; self.s];
            for slot in 0..other.s {
                rows[slot] = other.row_indices[j][slot];
                vals[slot] = other.values[j][slot];
            }
            self.row_indices.push(rows);
            self.values.push(vals);
        }
        self.n += other.n;
        true
    }

    /// Iterates the nonzero `(row, value)` entries of column `j`.
    pub fn column_entries(&self, j: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.row_indices[j]
            .iter()
            .zip(self.values[j].iter())
            .filter_map(|(&row, &val)| if row >= 0 { Some((row as usize, val)) } else { None })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_and_get_round_trip() {
        let mut mat = SparseMatrix::new(3, 2, 2);
        mat.set(0, 0, 1.5).unwrap();
        mat.set(2, 0, -2.0).unwrap();
        assert_eq!(mat.get(0, 0), 1.5);
        assert_eq!(mat.get(2, 0), -2.0);
        assert_eq!(mat.get(1, 0), 0.0);
    }

    #[test]
    fn zero_deletes_entry() {
        let mut mat = SparseMatrix::new(2, 1, 1);
        mat.set(0, 0, 5.0).unwrap();
        mat.set(0, 0, 0.0).unwrap();
        assert_eq!(mat.get(0, 0), 0.0);
        // slot freed, so a different row can now be set.
        mat.set(1, 0, 9.0).unwrap();
        assert_eq!(mat.get(1, 0), 9.0);
    }

    #[test]
    fn full_column_errors() {
        let mut mat = SparseMatrix::new(5, 1, 1);
        mat.set(0, 0, 1.0).unwrap();
        assert_eq!(
            mat.set(1, 0, 2.0),
            Err(MatrixError::ColumnFull { column: 0 })
        );
    }

    #[test]
    fn extend_rows_and_columns() {
        let mut mat = SparseMatrix::new(1, 1, 1);
        mat.extend_rows(2);
        mat.extend_columns(1);
        assert_eq!(mat.rows(), 3);
        assert_eq!(mat.cols(), 2);
        mat.set(2, 1, 7.0).unwrap();
        assert_eq!(mat.get(2, 1), 7.0);
    }

    #[test]
    fn extend_columns_from_steals_when_compatible() {
        let mut small = SparseMatrix::new(2, 1, 1);
        small.set(1, 0, 3.0).unwrap();
        let mut big = SparseMatrix::new(2, 0, 1);
        assert!(big.extend_columns_from(&small));
        assert_eq!(big.cols(), 1);
        assert_eq!(big.get(1, 0), 3.0);

        let mut bigger_rows = SparseMatrix::new(5, 0, 1);
        assert!(!bigger_rows.extend_columns_from(&SparseMatrix::new(6, 1, 1)));
    }
}
