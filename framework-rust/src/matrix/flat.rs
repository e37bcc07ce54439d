use std::cell::Cell;

use crate::matrix::DataMatrix;

/// Matrix stored in one contiguous array; row `r` starts at `r * columns`.
pub struct FlatMatrix {
    cells: Vec<Cell<u32>>,
    outliers: Vec<Cell<bool>>,
    columns: usize,
    cursor: Cell<usize>,
}

impl FlatMatrix {
    pub fn new(rows: usize, columns: usize) -> Self {
        FlatMatrix {
            cells: (0..rows * columns).map(|_| Cell::new(0)).collect(),
            outliers: (0..rows).map(|_| Cell::new(false)).collect(),
            columns,
            cursor: Cell::new(0),
        }
    }
}

impl DataMatrix for FlatMatrix {
    fn num_rows(&self) -> usize {
        self.outliers.len()
    }

    fn num_columns(&self) -> usize {
        self.columns
    }

    #[inline]
    fn row(&self, row: usize) -> &[Cell<u32>] {
        let offset = row * self.columns;
        &self.cells[offset..offset + self.columns]
    }

    fn outlier_flag(&self, row: usize) -> &Cell<bool> {
        &self.outliers[row]
    }

    fn cursor(&self) -> &Cell<usize> {
        &self.cursor
    }
}
