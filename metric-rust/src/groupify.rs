//! Equivalence classes of a dataset under a transformation.

use kanon_framework::errors::*;

use kanon_framework::matrix::{hash_key, new_matrix, DataMatrix, Suppression};
use kanon_framework::{Data, GeneralizationHierarchy};

use crate::transformation::Transformation;

use itertools::Itertools;
use std::collections::HashMap;

/// An equivalence class: rows sharing one generalized key.
#[derive(Clone, Debug, PartialEq)]
pub struct GroupifyEntry {
    pub key: Vec<u32>,
    pub count: usize,
    pub is_outlier: bool,
    /// First row of the class.
    pub representative: usize,
}

pub trait Groupify {
    /// Classes in order of first appearance.
    fn entries(&self) -> &[GroupifyEntry];

    fn num_groups(&self) -> usize {
        self.entries().len()
    }

    fn num_rows(&self) -> usize {
        self.entries().iter().map(|entry| entry.count).sum()
    }

    fn num_outlying_rows(&self) -> usize {
        self.entries().iter().filter(|entry| entry.is_outlier).map(|entry| entry.count).sum()
    }
}

/// Groups rows by hashing their generalized codes.
///
/// Classes smaller than `k` are outliers; their rows are flagged in the buffer.
pub struct HashGroupify {
    buffer: Box<dyn DataMatrix>,
    entries: Vec<GroupifyEntry>,
    groups: Vec<usize>,
    buckets: HashMap<u32, Vec<usize>>,
}

impl HashGroupify {
    pub fn build(
        data: &Data,
        hierarchies: &[GeneralizationHierarchy],
        transformation: &Transformation,
        k: usize,
    ) -> Result<HashGroupify> {
        if hierarchies.len() != data.num_columns() {
            return Err(format!("{} hierarchies given for {} generalized columns",
                               hierarchies.len(), data.num_columns()).into());
        }
        let heights = hierarchies.iter().map(GeneralizationHierarchy::height).collect_vec();
        transformation.check(&heights)?;

        let input = data.matrix();
        let buffer = new_matrix(input.num_rows(), input.num_columns());
        for row in 0..input.num_rows() {
            buffer.set_row(row);
            input.set_row(row);
            for (column, (hierarchy, level)) in hierarchies.iter().zip(transformation.levels()).enumerate() {
                buffer.set_value_at_column(column, hierarchy.generalize(input.value_at_column(column), *level));
            }
        }

        let mut entries = Vec::<GroupifyEntry>::new();
        let mut groups = Vec::with_capacity(buffer.num_rows());
        let mut buckets = HashMap::<u32, Vec<usize>>::new();
        for row in 0..buffer.num_rows() {
            let bucket = buckets.entry(buffer.hash_code(row, Suppression::Ignore)).or_default();
            let found = bucket.iter().cloned()
                .find(|group| buffer.equals(entries[*group].representative, row, Suppression::Ignore));
            let group = match found {
                Some(group) => group,
                None => {
                    bucket.push(entries.len());
                    entries.push(GroupifyEntry {
                        key: buffer.iter(row).collect(),
                        count: 0,
                        is_outlier: false,
                        representative: row,
                    });
                    entries.len() - 1
                }
            };
            entries[group].count += 1;
            groups.push(group);
        }

        entries.iter_mut().for_each(|entry| entry.is_outlier = entry.count < k);
        groups.iter().enumerate()
            .for_each(|(row, group)| buffer.set_outlier(row, entries[*group].is_outlier));

        debug!("{:?}: {} classes, {} outlying rows", transformation.levels(), entries.len(),
               entries.iter().filter(|entry| entry.is_outlier).map(|entry| entry.count).sum::<usize>());

        Ok(HashGroupify { buffer, entries, groups, buckets })
    }

    /// The generalized rows, with outliers flagged.
    pub fn buffer(&self) -> &dyn DataMatrix {
        self.buffer.as_ref()
    }

    /// Index into `entries()` of the class containing `row`.
    pub fn group_of(&self, row: usize) -> usize {
        self.groups[row]
    }

    /// The class whose generalized codes equal `key`.
    pub fn find(&self, key: &[u32]) -> Option<&GroupifyEntry> {
        self.buckets.get(&hash_key(key))?.iter()
            .map(|group| &self.entries[*group])
            .find(|entry| self.buffer.equals_key(entry.representative, key))
    }

    pub fn is_k_anonymous(&self) -> bool {
        self.entries.iter().all(|entry| !entry.is_outlier)
    }
}

impl Groupify for HashGroupify {
    fn entries(&self) -> &[GroupifyEntry] {
        &self.entries
    }
}


#[cfg(test)]
mod test_groupify {
    use crate::groupify::{Groupify, HashGroupify};
    use crate::test_data::ages;
    use crate::transformation::Transformation;

    #[test]
    fn groups_by_generalized_key() {
        let (data, hierarchies) = ages(&["34", "36", "38", "45"]);

        let identity = HashGroupify::build(&data, &hierarchies, &Transformation::new(vec![0]), 2).unwrap();
        assert_eq!(identity.num_groups(), 4);
        assert_eq!(identity.num_outlying_rows(), 4);
        assert!(!identity.is_k_anonymous());

        let decades = HashGroupify::build(&data, &hierarchies, &Transformation::new(vec![1]), 2).unwrap();
        assert_eq!(decades.num_groups(), 2);
        assert_eq!(decades.entries()[0].count, 3);
        assert!(!decades.entries()[0].is_outlier);
        assert!(decades.entries()[1].is_outlier);
        assert_eq!(decades.group_of(3), 1);
        assert!(decades.buffer().is_outlier(3));
        assert!(!decades.buffer().is_outlier(0));
        assert_eq!(decades.num_rows(), 4);

        let thirties = decades.entries()[0].key.clone();
        assert_eq!(decades.find(&thirties).map(|entry| entry.count), Some(3));
        let forties = decades.buffer().iter(3).collect::<Vec<u32>>();
        assert_eq!(decades.find(&forties).map(|entry| entry.representative), Some(3));
        assert!(decades.find(&[u32::MAX]).is_none());
        assert!(decades.find(&[]).is_none());

        let top = HashGroupify::build(&data, &hierarchies, &Transformation::new(vec![2]), 2).unwrap();
        assert!(top.is_k_anonymous());
        assert_eq!(top.entries()[0].representative, 0);
    }

    #[test]
    fn rejects_invalid_transformations() {
        let (data, hierarchies) = ages(&["34"]);
        assert!(HashGroupify::build(&data, &hierarchies, &Transformation::new(vec![3]), 1).is_err());
        assert!(HashGroupify::build(&data, &hierarchies, &Transformation::new(vec![0, 0]), 1).is_err());
        assert!(HashGroupify::build(&data, &[], &Transformation::new(vec![]), 1).is_err());
    }
}
