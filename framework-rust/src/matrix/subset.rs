use std::cell::Cell;
use std::rc::Rc;

use crate::matrix::DataMatrix;

/// A view on selected rows of a backing matrix.
///
/// Row `i` of the view is row `subset[i]` of the backing matrix. Nothing is copied:
/// writes through the view land in the shared backing matrix.
pub struct DataMatrixSubset {
    backing: Rc<dyn DataMatrix>,
    subset: Vec<usize>,
    cursor: Cell<usize>,
}

impl DataMatrixSubset {
    pub fn new(backing: Rc<dyn DataMatrix>, subset: Vec<usize>) -> Self {
        DataMatrixSubset { backing, subset, cursor: Cell::new(0) }
    }

    /// Row index in the backing matrix.
    pub fn translate(&self, row: usize) -> usize {
        self.subset[row]
    }
}

impl DataMatrix for DataMatrixSubset {
    fn num_rows(&self) -> usize {
        self.subset.len()
    }

    fn num_columns(&self) -> usize {
        self.backing.num_columns()
    }

    #[inline]
    fn row(&self, row: usize) -> &[Cell<u32>] {
        self.backing.row(self.subset[row])
    }

    fn outlier_flag(&self, row: usize) -> &Cell<bool> {
        self.backing.outlier_flag(self.subset[row])
    }

    fn cursor(&self) -> &Cell<usize> {
        &self.cursor
    }
}
