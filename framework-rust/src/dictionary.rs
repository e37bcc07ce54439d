use crate::errors::*;

use indexmap::IndexSet;

/// Per-column storage of a dictionary.
///
/// While growable, each column is an insertion-ordered set, so the index of a value is its code.
/// Once finalized, only the plain `code -> value` arrays are kept.
#[derive(Clone, Debug)]
enum Columns {
    Growable(Vec<IndexSet<String>>),
    Finalized(Vec<Vec<String>>),
}

/// Bidirectional mapping between the string values of each column and dense integer codes.
///
/// Codes of a column are always the contiguous range `0..num_codes(column)`.
#[derive(Clone, Debug)]
pub struct Dictionary {
    columns: Columns,
}

impl Dictionary {
    /// Create an empty, growable dictionary for `dimensions` columns.
    pub fn new(dimensions: usize) -> Self {
        Dictionary {
            columns: Columns::Growable((0..dimensions).map(|_| IndexSet::new()).collect())
        }
    }

    pub fn num_dimensions(&self) -> usize {
        match &self.columns {
            Columns::Growable(sets) => sets.len(),
            Columns::Finalized(mapping) => mapping.len()
        }
    }

    /// Number of codes assigned in a column.
    pub fn num_codes(&self, column: usize) -> usize {
        match &self.columns {
            Columns::Growable(sets) => sets[column].len(),
            Columns::Finalized(mapping) => mapping[column].len()
        }
    }

    pub fn is_finalized(&self) -> bool {
        matches!(self.columns, Columns::Finalized(_))
    }

    /// Return the code of `value` in `column`, assigning the next free code if the value is new.
    pub fn register(&mut self, column: usize, value: &str) -> Result<u32> {
        match &mut self.columns {
            Columns::Growable(sets) => {
                let set = sets.get_mut(column)
                    .ok_or_else(|| Error::from(format!("dictionary has no column {}", column)))?;
                if let Some((code, _)) = set.get_full(value) {
                    return Ok(code as u32);
                }
                let (code, _) = set.insert_full(value.to_string());
                Ok(code as u32)
            }
            Columns::Finalized(_) => Err("dictionary is finalized; definalize it before registering values".into())
        }
    }

    /// Look up the code of `value` in `column` without assigning a new one.
    pub fn probe(&self, column: usize, value: &str) -> Result<Option<u32>> {
        match &self.columns {
            Columns::Growable(sets) => Ok(sets.get(column)
                .ok_or_else(|| Error::from(format!("dictionary has no column {}", column)))?
                .get_full(value)
                .map(|(code, _)| code as u32)),
            Columns::Finalized(_) => Err("dictionary is finalized; definalize it before probing values".into())
        }
    }

    /// Reverse lookup, available in both states.
    pub fn value(&self, column: usize, code: u32) -> Option<&str> {
        match &self.columns {
            Columns::Growable(sets) => sets.get(column)?.get_index(code as usize).map(String::as_str),
            Columns::Finalized(mapping) => mapping.get(column)?.get(code as usize).map(String::as_str)
        }
    }

    /// The frozen `code -> value` array of a column.
    pub fn mapping(&self, column: usize) -> Result<&[String]> {
        match &self.columns {
            Columns::Finalized(mapping) => mapping.get(column)
                .map(Vec::as_slice)
                .ok_or_else(|| format!("dictionary has no column {}", column).into()),
            Columns::Growable(_) => Err("dictionary must be finalized before its mapping is read".into())
        }
    }

    /// Freeze all columns into plain arrays. Finalizing twice is a no-op.
    pub fn finalize_all(&mut self) {
        if let Columns::Growable(sets) = &mut self.columns {
            let mapping = sets.drain(..)
                .map(|set| set.into_iter().collect::<Vec<String>>())
                .collect();
            self.columns = Columns::Finalized(mapping);
        }
    }

    /// Rebuild the lookup sets so that further values can be registered.
    pub fn definalize_all(&mut self) {
        if let Columns::Finalized(mapping) = &mut self.columns {
            let sets = mapping.drain(..)
                .map(|values| values.into_iter().collect::<IndexSet<String>>())
                .collect();
            self.columns = Columns::Growable(sets);
        }
    }

    /// A dictionary over the given columns only, keeping their code assignments.
    pub fn project(&self, columns: &[usize]) -> Result<Dictionary> {
        let columns = match &self.columns {
            Columns::Growable(sets) => Columns::Growable(columns.iter()
                .map(|&column| sets.get(column).cloned()
                    .ok_or_else(|| Error::from(format!("dictionary has no column {}", column))))
                .collect::<Result<_>>()?),
            Columns::Finalized(mapping) => Columns::Finalized(columns.iter()
                .map(|&column| mapping.get(column).cloned()
                    .ok_or_else(|| Error::from(format!("dictionary has no column {}", column))))
                .collect::<Result<_>>()?)
        };
        Ok(Dictionary { columns })
    }
}


#[cfg(test)]
mod test_dictionary {
    use crate::dictionary::Dictionary;

    fn sample() -> Dictionary {
        let mut dictionary = Dictionary::new(2);
        for value in &["34", "36", "34", "38"] {
            dictionary.register(0, value).unwrap();
        }
        for value in &["male", "female", "female"] {
            dictionary.register(1, value).unwrap();
        }
        dictionary
    }

    #[test]
    fn codes_are_dense() {
        let dictionary = sample();
        assert_eq!(dictionary.num_codes(0), 3);
        assert_eq!(dictionary.num_codes(1), 2);
        assert_eq!(dictionary.probe(0, "34").unwrap(), Some(0));
        assert_eq!(dictionary.probe(0, "38").unwrap(), Some(2));
        assert_eq!(dictionary.probe(0, "40").unwrap(), None);
        // probing never grows the code space
        assert_eq!(dictionary.num_codes(0), 3);
    }

    #[test]
    fn round_trip_after_finalize() {
        let mut dictionary = Dictionary::new(1);
        let values = ["a", "b", "c", "b", "a", "d"];
        let codes = values.iter()
            .map(|value| dictionary.register(0, value).unwrap())
            .collect::<Vec<u32>>();
        dictionary.finalize_all();

        let mapping = dictionary.mapping(0).unwrap();
        values.iter().zip(codes.iter())
            .for_each(|(value, code)| assert_eq!(&mapping[*code as usize], value));
        assert_eq!(mapping.len(), 4);
    }

    #[test]
    fn finalized_rejects_registration() {
        let mut dictionary = sample();
        dictionary.finalize_all();
        assert!(dictionary.register(0, "40").is_err());
        assert!(dictionary.probe(0, "34").is_err());

        dictionary.definalize_all();
        assert_eq!(dictionary.register(0, "34").unwrap(), 0);
        assert_eq!(dictionary.register(0, "40").unwrap(), 3);
        assert!(dictionary.mapping(0).is_err());
    }

    #[test]
    fn projection_keeps_codes() {
        let mut dictionary = sample();
        dictionary.finalize_all();
        let projected = dictionary.project(&[1]).unwrap();
        assert_eq!(projected.num_dimensions(), 1);
        assert_eq!(projected.value(0, 1), Some("female"));
        assert!(dictionary.project(&[2]).is_err());
    }
}
