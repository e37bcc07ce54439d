//! Row-major grids of dictionary codes.
//!
//! A matrix is backed either by one flat array (`FlatMatrix`) or, when the number of cells
//! exceeds what a single array may address, by one array per row (`JaggedMatrix`).
//! `new_matrix` selects the representation; every other component works against the
//! `DataMatrix` trait only.
//!
//! Cells use interior mutability so that views (`DataMatrixSubset`) and the `Data` bundles
//! sharing one backing matrix all observe the same writes. Matrices are therefore not `Sync`;
//! each thread must work on its own matrix.

pub mod flat;
pub mod jagged;
pub mod subset;

use std::cell::Cell;
use std::iter::Map;
use std::slice::Iter;

pub use flat::FlatMatrix;
pub use jagged::JaggedMatrix;
pub use subset::DataMatrixSubset;

/// Largest number of cells stored in a single flat array.
pub const MAX_FLAT_CELLS: usize = i32::MAX as usize - 2;

const HASH_SEED: u32 = 23;
const HASH_MULTIPLIER: u32 = 37;
const OUTLIER_BIT: u32 = 1 << 31;

/// Whether the suppression flag of a row takes part in equality and hashing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Suppression {
    Respect,
    Ignore,
}

/// Iterator over the codes of one row.
pub type RowIter<'a> = Map<Iter<'a, Cell<u32>>, fn(&Cell<u32>) -> u32>;

pub trait DataMatrix {
    fn num_rows(&self) -> usize;

    fn num_columns(&self) -> usize;

    /// The cells of one row.
    fn row(&self, row: usize) -> &[Cell<u32>];

    /// The suppression flag of one row.
    fn outlier_flag(&self, row: usize) -> &Cell<bool>;

    /// Row selected by `set_row`, used by the column accessors.
    fn cursor(&self) -> &Cell<usize>;

    fn get(&self, row: usize, column: usize) -> u32 {
        self.row(row)[column].get()
    }

    fn set(&self, row: usize, column: usize, value: u32) {
        self.row(row)[column].set(value)
    }

    fn set_row(&self, row: usize) {
        self.cursor().set(row)
    }

    fn value_at_column(&self, column: usize) -> u32 {
        self.row(self.cursor().get())[column].get()
    }

    fn set_value_at_column(&self, column: usize, value: u32) {
        self.row(self.cursor().get())[column].set(value)
    }

    fn is_outlier(&self, row: usize) -> bool {
        self.outlier_flag(row).get()
    }

    fn set_outlier(&self, row: usize, outlier: bool) {
        self.outlier_flag(row).set(outlier)
    }

    fn iter(&self, row: usize) -> RowIter<'_> {
        self.row(row).iter().map(Cell::<u32>::get as fn(&Cell<u32>) -> u32)
    }

    /// Overwrite `row` with the codes and flag of `source_row` in `source`.
    fn copy_from(&self, row: usize, source: &dyn DataMatrix, source_row: usize) {
        self.row(row).iter().zip(source.row(source_row))
            .for_each(|(target, value)| target.set(value.get()));
        self.set_outlier(row, source.is_outlier(source_row));
    }

    fn swap(&self, row1: usize, row2: usize) {
        if row1 == row2 {
            return;
        }
        self.row(row1).iter().zip(self.row(row2))
            .for_each(|(left, right)| left.swap(right));
        self.outlier_flag(row1).swap(self.outlier_flag(row2));
    }

    fn equals(&self, row1: usize, row2: usize, suppression: Suppression) -> bool {
        if suppression == Suppression::Respect && self.is_outlier(row1) != self.is_outlier(row2) {
            return false;
        }
        self.row(row1).iter().zip(self.row(row2))
            .all(|(left, right)| left.get() == right.get())
    }

    /// Equality over all columns but `ignore`. Suppression flags are not compared.
    fn equals_ignore(&self, row1: usize, row2: usize, ignore: usize) -> bool {
        self.row(row1).iter().zip(self.row(row2)).enumerate()
            .all(|(column, (left, right))| column == ignore || left.get() == right.get())
    }

    /// Compare the codes of `row` against a key. Suppression flags are not compared.
    fn equals_key(&self, row: usize, key: &[u32]) -> bool {
        let cells = self.row(row);
        cells.len() == key.len() && cells.iter().zip(key).all(|(cell, code)| cell.get() == *code)
    }

    /// Hash consistent with `equals` under the same suppression mode.
    fn hash_code(&self, row: usize, suppression: Suppression) -> u32 {
        let outlier = match suppression {
            Suppression::Respect if self.is_outlier(row) => OUTLIER_BIT,
            _ => 0
        };
        hash_cells(self.row(row), outlier)
    }

    /// Hash consistent with `equals_ignore`.
    fn hash_code_ignore(&self, row: usize, ignore: usize) -> u32 {
        let cells = self.row(row);
        unrolled_fold(cells.len(), |hash, index| {
            if index == ignore { hash } else { mix(hash, cells[index].get()) }
        })
    }

    /// A new, independent matrix holding copies of the given rows in the given order.
    fn clone_rows(&self, rows: &[usize]) -> Box<dyn DataMatrix> {
        let matrix = new_matrix(rows.len(), self.num_columns());
        rows.iter().enumerate().for_each(|(target, &source)| {
            matrix.row(target).iter().zip(self.row(source))
                .for_each(|(cell, value)| cell.set(value.get()));
            matrix.set_outlier(target, self.is_outlier(source));
        });
        matrix
    }
}

/// True if a `rows` x `columns` grid fits into one flat array.
pub fn fits_flat(rows: usize, columns: usize) -> bool {
    rows.checked_mul(columns).map_or(false, |cells| cells <= MAX_FLAT_CELLS)
}

/// Allocate a zeroed matrix, choosing the backing representation by cell count.
pub fn new_matrix(rows: usize, columns: usize) -> Box<dyn DataMatrix> {
    if fits_flat(rows, columns) {
        Box::new(FlatMatrix::new(rows, columns))
    } else {
        debug!("{} x {} cells exceed a flat array, allocating one array per row", rows, columns);
        Box::new(JaggedMatrix::new(rows, columns))
    }
}

/// Hash of a key array, equal to `hash_code(row, Suppression::Ignore)` of a row holding the same codes.
pub fn hash_key(key: &[u32]) -> u32 {
    key.iter().fold(HASH_SEED, |hash, code| mix(hash, *code))
}

#[inline]
fn mix(hash: u32, value: u32) -> u32 {
    hash.wrapping_mul(HASH_MULTIPLIER).wrapping_add(value)
}

macro_rules! unrolled {
    ($width:expr, $step:ident, $( $len:literal => [$( $index:literal ),*] ),*) => {
        match $width {
            $( $len => {
                let hash = HASH_SEED;
                $( let hash = $step(hash, $index); )*
                hash
            } )*
            width => (0..width).fold(HASH_SEED, $step)
        }
    }
}

/// Fold `step` over the column indices of a row of `width` cells, starting from the seed.
#[inline]
fn unrolled_fold<F: Fn(u32, usize) -> u32>(width: usize, step: F) -> u32 {
    unrolled!(width, step,
        0 => [],
        1 => [0],
        2 => [0, 1],
        3 => [0, 1, 2],
        4 => [0, 1, 2, 3],
        5 => [0, 1, 2, 3, 4],
        6 => [0, 1, 2, 3, 4, 5],
        7 => [0, 1, 2, 3, 4, 5, 6],
        8 => [0, 1, 2, 3, 4, 5, 6, 7],
        9 => [0, 1, 2, 3, 4, 5, 6, 7, 8],
        10 => [0, 1, 2, 3, 4, 5, 6, 7, 8, 9],
        11 => [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10],
        12 => [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11],
        13 => [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12],
        14 => [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13],
        15 => [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14],
        16 => [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15],
        17 => [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16],
        18 => [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 17],
        19 => [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 17, 18],
        20 => [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 17, 18, 19]
    )
}

/// Rolling hash over a row, with `outlier` or-ed into the first code.
fn hash_cells(cells: &[Cell<u32>], outlier: u32) -> u32 {
    if cells.is_empty() {
        return if outlier == 0 { HASH_SEED } else { mix(HASH_SEED, outlier) };
    }
    unrolled_fold(cells.len(), |hash, index| {
        let code = cells[index].get();
        mix(hash, if index == 0 { code | outlier } else { code })
    })
}


#[cfg(test)]
mod test_matrix {
    use crate::matrix::{DataMatrix, FlatMatrix, JaggedMatrix, Suppression, fits_flat, hash_key, new_matrix, MAX_FLAT_CELLS};

    fn fill(matrix: &dyn DataMatrix, rows: &[Vec<u32>]) {
        rows.iter().enumerate().for_each(|(row, values)| values.iter().enumerate()
            .for_each(|(column, value)| matrix.set(row, column, *value)));
    }

    fn sample_rows() -> Vec<Vec<u32>> {
        vec![
            vec![1, 2, 3],
            vec![1, 2, 3],
            vec![1, 5, 3],
            vec![4, 2, 3],
        ]
    }

    fn both() -> Vec<Box<dyn DataMatrix>> {
        let flat: Box<dyn DataMatrix> = Box::new(FlatMatrix::new(4, 3));
        let jagged: Box<dyn DataMatrix> = Box::new(JaggedMatrix::new(4, 3));
        fill(flat.as_ref(), &sample_rows());
        fill(jagged.as_ref(), &sample_rows());
        vec![flat, jagged]
    }

    #[test]
    fn representation_selection() {
        assert!(fits_flat(0, 10));
        assert!(fits_flat(10, 0));
        assert!(fits_flat(MAX_FLAT_CELLS, 1));
        assert!(!fits_flat(MAX_FLAT_CELLS, 2));
        assert!(!fits_flat(usize::MAX, 2));

        let empty = new_matrix(0, 5);
        assert_eq!(empty.num_rows(), 0);
        assert_eq!(empty.num_columns(), 5);
        let no_columns = new_matrix(3, 0);
        assert_eq!(no_columns.num_rows(), 3);
        assert!(no_columns.equals(0, 1, Suppression::Respect));
    }

    #[test]
    fn representations_agree() {
        let matrices = both();
        let (flat, jagged) = (&matrices[0], &matrices[1]);
        flat.set_outlier(1, true);
        jagged.set_outlier(1, true);

        for row1 in 0..4 {
            assert_eq!(flat.iter(row1).collect::<Vec<u32>>(), jagged.iter(row1).collect::<Vec<u32>>());
            for suppression in &[Suppression::Respect, Suppression::Ignore] {
                assert_eq!(flat.hash_code(row1, *suppression), jagged.hash_code(row1, *suppression));
                for row2 in 0..4 {
                    assert_eq!(flat.equals(row1, row2, *suppression), jagged.equals(row1, row2, *suppression));
                }
            }
        }
    }

    #[test]
    fn outlier_flag_masks_equality() {
        for matrix in both() {
            assert!(matrix.equals(0, 1, Suppression::Respect));
            matrix.set_outlier(0, true);
            assert!(!matrix.equals(0, 1, Suppression::Respect));
            assert!(matrix.equals(0, 1, Suppression::Ignore));
            assert_ne!(matrix.hash_code(0, Suppression::Respect), matrix.hash_code(1, Suppression::Respect));
            assert_eq!(matrix.hash_code(0, Suppression::Ignore), matrix.hash_code(1, Suppression::Ignore));
            // codes are untouched by the flag
            assert_eq!(matrix.get(0, 0), 1);
        }
    }

    #[test]
    fn ignore_one_column() {
        for matrix in both() {
            assert!(!matrix.equals(0, 2, Suppression::Ignore));
            assert!(matrix.equals_ignore(0, 2, 1));
            assert!(!matrix.equals_ignore(0, 3, 1));
            assert_eq!(matrix.hash_code_ignore(0, 1), matrix.hash_code_ignore(2, 1));
        }
    }

    #[test]
    fn key_hash_matches_row_hash() {
        for matrix in both() {
            assert_eq!(hash_key(&[1, 2, 3]), matrix.hash_code(0, Suppression::Ignore));
            assert!(matrix.equals_key(2, &[1, 5, 3]));
            assert!(!matrix.equals_key(2, &[1, 5]));
        }
    }

    #[test]
    fn wide_rows_hash_like_narrow_rows() {
        // beyond the unrolled widths the fallback must follow the same recurrence
        let matrix = new_matrix(1, 25);
        let key = (0..25).collect::<Vec<u32>>();
        key.iter().enumerate().for_each(|(column, value)| matrix.set(0, column, *value));
        assert_eq!(matrix.hash_code(0, Suppression::Ignore), hash_key(&key));

        let matrix = new_matrix(1, 7);
        (0..7).for_each(|column| matrix.set(0, column, column as u32 * 3));
        assert_eq!(matrix.hash_code(0, Suppression::Ignore), hash_key(&[0, 3, 6, 9, 12, 15, 18]));
    }

    #[test]
    fn ignore_hash_skips_one_column_at_every_width() {
        for width in &[1usize, 3, 20, 21, 25] {
            let matrix = new_matrix(1, *width);
            (0..*width).for_each(|column| matrix.set(0, column, column as u32 + 1));
            for ignore in 0..*width {
                let rest = (0..*width).filter(|column| *column != ignore)
                    .map(|column| column as u32 + 1)
                    .collect::<Vec<u32>>();
                assert_eq!(matrix.hash_code_ignore(0, ignore), hash_key(&rest), "width {}", width);
            }
        }
    }

    #[test]
    fn cursor_swap_copy() {
        for matrix in both() {
            matrix.set_row(2);
            assert_eq!(matrix.value_at_column(1), 5);
            matrix.set_value_at_column(1, 9);
            assert_eq!(matrix.get(2, 1), 9);

            matrix.set_outlier(3, true);
            matrix.swap(0, 3);
            assert_eq!(matrix.iter(0).collect::<Vec<u32>>(), vec![4, 2, 3]);
            assert!(matrix.is_outlier(0));
            assert!(!matrix.is_outlier(3));

            let copy = new_matrix(1, 3);
            copy.copy_from(0, matrix.as_ref(), 0);
            assert!(copy.equals_key(0, &[4, 2, 3]));
            assert!(copy.is_outlier(0));
        }
    }

    #[test]
    fn clone_rows_is_independent() {
        for matrix in both() {
            let clone = matrix.clone_rows(&[3, 0]);
            assert_eq!(clone.num_rows(), 2);
            assert!(clone.equals_key(0, &[4, 2, 3]));
            assert!(clone.equals_key(1, &[1, 2, 3]));
            clone.set(0, 0, 7);
            assert_eq!(matrix.get(3, 0), 4);
        }
    }
}
