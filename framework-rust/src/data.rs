use crate::errors::*;

use crate::dictionary::Dictionary;
use crate::matrix::{new_matrix, DataMatrix, DataMatrixSubset};
use crate::utilities::row_set::RowSet;

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// An encoded table: a matrix of codes together with its header and dictionary.
///
/// `columns[i]` is the index of local column `i` in the original input.
/// Cloning is cheap; clones share the matrix and the dictionary.
#[derive(Clone)]
pub struct Data {
    matrix: Rc<dyn DataMatrix>,
    header: Vec<String>,
    columns: Vec<usize>,
    dictionary: Rc<Dictionary>,
    index: HashMap<String, usize>,
}

impl Data {
    /// Encode raw rows. The returned data owns a finalized dictionary.
    pub fn encode(header: &[String], rows: &[Vec<String>]) -> Result<Data> {
        let mut dictionary = Dictionary::new(header.len());
        let matrix = new_matrix(rows.len(), header.len());

        for (index, row) in rows.iter().enumerate() {
            if row.len() != header.len() {
                return Err(format!("row {} has {} values, but the header names {} columns",
                                   index, row.len(), header.len()).into());
            }
            matrix.set_row(index);
            for (column, value) in row.iter().enumerate() {
                matrix.set_value_at_column(column, dictionary.register(column, value)?);
            }
        }
        dictionary.finalize_all();

        Ok(Data::create_wrapper(
            Rc::from(matrix),
            header.to_vec(),
            (0..header.len()).collect(),
            Rc::new(dictionary)))
    }

    /// Copy the given columns of `matrix` into a new matrix, with a matching dictionary projection.
    pub fn create_projection(
        matrix: &dyn DataMatrix,
        header: &[String],
        columns: &[usize],
        dictionary: &Dictionary,
    ) -> Result<Data> {
        if let Some(column) = columns.iter().find(|column| **column >= header.len()) {
            return Err(format!("cannot project column {} of a table with {} columns", column, header.len()).into());
        }

        let projection = new_matrix(matrix.num_rows(), columns.len());
        for row in 0..matrix.num_rows() {
            let source = matrix.row(row);
            projection.set_row(row);
            columns.iter().enumerate()
                .for_each(|(target, column)| projection.set_value_at_column(target, source[*column].get()));
        }

        Ok(Data::create_wrapper(
            Rc::from(projection),
            columns.iter().map(|column| header[*column].clone()).collect(),
            columns.to_vec(),
            Rc::new(dictionary.project(columns)?)))
    }

    /// Wrap an existing matrix and dictionary without copying.
    pub fn create_wrapper(
        matrix: Rc<dyn DataMatrix>,
        header: Vec<String>,
        columns: Vec<usize>,
        dictionary: Rc<Dictionary>,
    ) -> Data {
        let index = header.iter().enumerate()
            .map(|(column, name)| (name.clone(), column))
            .collect();
        Data { matrix, header, columns, dictionary, index }
    }

    /// A view on the selected rows, sharing matrix, header and dictionary.
    pub fn get_subset_instance(&self, rowset: &RowSet) -> Result<Data> {
        if rowset.length() != self.num_rows() {
            return Err(format!("row set covers {} rows, but the data has {}",
                               rowset.length(), self.num_rows()).into());
        }
        let subset = DataMatrixSubset::new(self.matrix.clone(), rowset.to_vec());
        Ok(Data {
            matrix: Rc::new(subset),
            header: self.header.clone(),
            columns: self.columns.clone(),
            dictionary: self.dictionary.clone(),
            index: self.index.clone(),
        })
    }

    pub fn matrix(&self) -> &dyn DataMatrix {
        self.matrix.as_ref()
    }

    pub fn shared_matrix(&self) -> Rc<dyn DataMatrix> {
        self.matrix.clone()
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    pub fn columns(&self) -> &[usize] {
        &self.columns
    }

    pub fn dictionary(&self) -> &Dictionary {
        &self.dictionary
    }

    /// Mutable access to the dictionary, detaching it first if it is shared.
    pub fn dictionary_mut(&mut self) -> &mut Dictionary {
        Rc::make_mut(&mut self.dictionary)
    }

    pub fn index_of(&self, attribute: &str) -> Option<usize> {
        self.index.get(attribute).cloned()
    }

    pub fn num_rows(&self) -> usize {
        self.matrix.num_rows()
    }

    pub fn num_columns(&self) -> usize {
        self.header.len()
    }

    /// Decoded value of a cell.
    pub fn value(&self, row: usize, column: usize) -> Option<&str> {
        self.dictionary.value(column, self.matrix.get(row, column))
    }
}

impl fmt::Debug for Data {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Data")
            .field("header", &self.header)
            .field("columns", &self.columns)
            .field("rows", &self.matrix.num_rows())
            .finish()
    }
}


#[cfg(test)]
mod test_data {
    use crate::data::Data;
    use crate::matrix::Suppression;
    use crate::utilities::row_set::RowSet;

    pub fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    fn sample() -> Data {
        Data::encode(
            &strings(&["name", "age", "zip", "disease"]),
            &[
                strings(&["ann", "34", "4711", "flu"]),
                strings(&["bob", "36", "4712", "cold"]),
                strings(&["cid", "34", "4711", "flu"]),
            ]).unwrap()
    }

    #[test]
    fn encoding() {
        let data = sample();
        assert_eq!(data.num_rows(), 3);
        assert_eq!(data.num_columns(), 4);
        assert!(data.dictionary().is_finalized());
        assert_eq!(data.value(1, 1), Some("36"));
        assert_eq!(data.matrix().get(2, 1), data.matrix().get(0, 1));
        assert_eq!(data.index_of("zip"), Some(2));
        assert_eq!(data.index_of("salary"), None);

        let ragged = Data::encode(&strings(&["a", "b"]), &[strings(&["1"])]);
        assert!(ragged.is_err());
    }

    #[test]
    fn projection_copies_selected_columns() {
        let data = sample();
        let projection = Data::create_projection(
            data.matrix(), data.header(), &[1, 3], data.dictionary()).unwrap();

        assert_eq!(projection.num_columns(), 2);
        assert_eq!(projection.header(), &strings(&["age", "disease"])[..]);
        assert_eq!(projection.columns(), &[1, 3]);
        for row in 0..3 {
            assert_eq!(projection.matrix().get(row, 0), data.matrix().get(row, 1));
            assert_eq!(projection.matrix().get(row, 1), data.matrix().get(row, 3));
            assert_eq!(projection.value(row, 1), data.value(row, 3));
        }
        // the projection owns its cells
        projection.matrix().set(0, 0, 1);
        assert_eq!(data.matrix().get(0, 1), 0);

        assert!(Data::create_projection(data.matrix(), data.header(), &[4], data.dictionary()).is_err());
    }

    #[test]
    fn subset_shares_backing_matrix() {
        let data = sample();
        let subset = data.get_subset_instance(&RowSet::from_rows(3, &[0, 2]).unwrap()).unwrap();
        assert_eq!(subset.num_rows(), 2);
        assert_eq!(subset.value(1, 0), Some("cid"));
        assert!(subset.matrix().equals_ignore(0, 1, 0));

        subset.matrix().set_outlier(1, true);
        assert!(data.matrix().is_outlier(2));
        assert!(!data.matrix().equals(0, 2, Suppression::Respect));

        assert!(data.get_subset_instance(&RowSet::from_rows(5, &[0, 4]).unwrap()).is_err());
        assert!(data.get_subset_instance(&RowSet::new(2)).is_err());
    }

    #[test]
    fn dictionary_detaches_on_write() {
        let data = sample();
        let mut copy = data.clone();
        copy.dictionary_mut().definalize_all();
        copy.dictionary_mut().register(1, "99").unwrap();
        assert_eq!(copy.dictionary().num_codes(1), 3);
        assert_eq!(data.dictionary().num_codes(1), 2);
        assert!(data.dictionary().is_finalized());
    }
}
