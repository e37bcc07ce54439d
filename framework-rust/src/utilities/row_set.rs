use crate::errors::*;

use bitvec::vec::BitVec;
use itertools::Itertools;

/// A fixed-length set of row indices, stored as a bitset.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RowSet {
    bits: BitVec,
}

impl RowSet {
    /// Empty set over rows `0..length`.
    pub fn new(length: usize) -> Self {
        RowSet { bits: BitVec::repeat(false, length) }
    }

    /// Set over `0..length` holding the given rows.
    pub fn from_rows(length: usize, rows: &[usize]) -> Result<Self> {
        let mut set = RowSet::new(length);
        for row in rows {
            set.add(*row)?;
        }
        Ok(set)
    }

    pub fn add(&mut self, row: usize) -> Result<()> {
        self.check(row)?;
        self.bits.set(row, true);
        Ok(())
    }

    pub fn remove(&mut self, row: usize) -> Result<()> {
        self.check(row)?;
        self.bits.set(row, false);
        Ok(())
    }

    pub fn contains(&self, row: usize) -> bool {
        self.bits.get(row).map_or(false, |bit| *bit)
    }

    /// Number of rows in the set.
    pub fn size(&self) -> usize {
        self.bits.count_ones()
    }

    /// Number of rows the set ranges over.
    pub fn length(&self) -> usize {
        self.bits.len()
    }

    /// Selected rows in ascending order.
    pub fn iter(&self) -> impl Iterator<Item=usize> + '_ {
        self.bits.iter_ones()
    }

    pub fn to_vec(&self) -> Vec<usize> {
        self.iter().collect_vec()
    }

    fn check(&self, row: usize) -> Result<()> {
        if row >= self.bits.len() {
            return Err(format!("row {} is outside a set over {} rows", row, self.bits.len()).into());
        }
        Ok(())
    }
}


#[cfg(test)]
mod test_row_set {
    use crate::utilities::row_set::RowSet;

    #[test]
    fn add_remove_contains() {
        let mut set = RowSet::new(130);
        set.add(0).unwrap();
        set.add(64).unwrap();
        set.add(129).unwrap();
        set.add(64).unwrap();
        assert_eq!(set.size(), 3);
        assert!(set.contains(129));
        assert!(!set.contains(1));
        assert!(!set.contains(500));

        set.remove(64).unwrap();
        set.remove(65).unwrap();
        assert_eq!(set.size(), 2);
        assert_eq!(set.to_vec(), vec![0, 129]);
    }

    #[test]
    fn from_rows() {
        let set = RowSet::from_rows(5, &[4, 1, 1]).unwrap();
        assert_eq!(set.length(), 5);
        assert_eq!(set.iter().collect::<Vec<usize>>(), vec![1, 4]);
    }

    #[test]
    fn rows_outside_the_range_are_rejected() {
        // within the last storage word and beyond it
        assert!(RowSet::from_rows(4, &[1, 5]).is_err());
        assert!(RowSet::from_rows(4, &[1, 4]).is_err());
        assert!(RowSet::from_rows(4, &[200]).is_err());

        let mut set = RowSet::from_rows(4, &[1, 3]).unwrap();
        assert!(set.add(4).is_err());
        assert!(set.remove(70).is_err());
        assert_eq!(set.size(), set.to_vec().len());
        assert_eq!(set.to_vec(), vec![1, 3]);
    }
}
