use std::cell::Cell;

use crate::matrix::DataMatrix;

/// Matrix stored as one array per row, for grids too large for a single array.
pub struct JaggedMatrix {
    rows: Vec<Box<[Cell<u32>]>>,
    outliers: Vec<Cell<bool>>,
    columns: usize,
    cursor: Cell<usize>,
}

impl JaggedMatrix {
    pub fn new(rows: usize, columns: usize) -> Self {
        JaggedMatrix {
            rows: (0..rows)
                .map(|_| (0..columns).map(|_| Cell::new(0)).collect::<Vec<Cell<u32>>>().into_boxed_slice())
                .collect(),
            outliers: (0..rows).map(|_| Cell::new(false)).collect(),
            columns,
            cursor: Cell::new(0),
        }
    }
}

impl DataMatrix for JaggedMatrix {
    fn num_rows(&self) -> usize {
        self.rows.len()
    }

    fn num_columns(&self) -> usize {
        self.columns
    }

    #[inline]
    fn row(&self, row: usize) -> &[Cell<u32>] {
        &self.rows[row]
    }

    fn outlier_flag(&self, row: usize) -> &Cell<bool> {
        &self.outliers[row]
    }

    fn cursor(&self) -> &Cell<usize> {
        &self.cursor
    }
}
