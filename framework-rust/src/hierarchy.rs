use crate::errors::*;

use crate::dictionary::Dictionary;

use itertools::Itertools;
use std::collections::HashMap;

/// Encoded generalization rules of one attribute.
///
/// `map[code][level]` is the code `code` generalizes to at `level`; level 0 is the identity.
#[derive(Clone, Debug)]
pub struct GeneralizationHierarchy {
    attribute: String,
    dimension: usize,
    map: Vec<Vec<u32>>,
    distinct_values: Vec<usize>,
}

impl GeneralizationHierarchy {
    /// Encode the rules of `attribute`, stored in `dimension` of `dictionary`.
    ///
    /// Every code currently in the dictionary column must have a rule. All values of the
    /// hierarchy are registered, so the dictionary must not be finalized.
    /// Rows for values absent from the data are skipped.
    pub fn new(
        attribute: &str,
        hierarchy: &[Vec<String>],
        dimension: usize,
        dictionary: &mut Dictionary,
    ) -> Result<GeneralizationHierarchy> {
        let height = match hierarchy.first() {
            Some(first) if !first.is_empty() => first.len(),
            _ => return Err(format!("hierarchy for attribute '{}' is empty", attribute).into())
        };

        let domain = dictionary.num_codes(dimension);
        let mut rules: Vec<Option<Vec<u32>>> = vec![None; domain];
        let mut skipped = 0;

        for (index, row) in hierarchy.iter().enumerate() {
            if row.len() != height {
                return Err(format!(
                    "hierarchy for attribute '{}' is malformed: row {} has {} levels, expected {}",
                    attribute, index, row.len(), height).into());
            }
            let code = match dictionary.probe(dimension, &row[0])? {
                Some(code) if (code as usize) < domain => code as usize,
                _ => {
                    skipped += 1;
                    continue;
                }
            };
            if rules[code].is_some() {
                return Err(format!(
                    "hierarchy for attribute '{}' defines value '{}' more than once", attribute, row[0]).into());
            }
            rules[code] = Some(row.iter()
                .map(|value| dictionary.register(dimension, value))
                .collect::<Result<Vec<u32>>>()?);
        }

        if skipped > 0 {
            debug!("hierarchy for attribute '{}': {} rows describe values absent from the data", attribute, skipped);
        }

        let map = rules.into_iter().enumerate()
            .map(|(code, rule)| rule.ok_or_else(|| Error::from(format!(
                "hierarchy for attribute '{}' has no rule for value '{}'",
                attribute, dictionary.value(dimension, code as u32).unwrap_or("<unknown>")))))
            .collect::<Result<Vec<Vec<u32>>>>()?;

        let distinct_values = (0..height)
            .map(|level| map.iter().map(|rule| rule[level]).unique().count())
            .collect();

        Ok(GeneralizationHierarchy {
            attribute: attribute.to_string(),
            dimension,
            map,
            distinct_values,
        })
    }

    /// Ensure the rules form a tree: values equal at one level stay equal at the next.
    pub fn check_monotonicity(&self, dictionary: &Dictionary) -> Result<()> {
        let mut successors = HashMap::<u32, u32>::new();
        for level in 0..self.height().saturating_sub(1) {
            successors.clear();
            for rule in &self.map {
                let (current, next) = (rule[level], rule[level + 1]);
                match successors.get(&current) {
                    Some(&previous) if previous != next => {
                        let name = |code: u32| dictionary.value(self.dimension, code)
                            .unwrap_or("<unknown>").to_string();
                        return Err(format!(
                            "the transformation rule for the attribute '{}' is not a hierarchy. ({}) can either be transformed to ({}) or to ({})",
                            self.attribute, name(current), name(previous), name(next)).into());
                    }
                    Some(_) => (),
                    None => {
                        successors.insert(current, next);
                    }
                }
            }
        }
        Ok(())
    }

    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Number of levels, including the identity level.
    pub fn height(&self) -> usize {
        self.map.first().map_or(0, Vec::len)
    }

    pub fn map(&self) -> &[Vec<u32>] {
        &self.map
    }

    /// Code that `code` generalizes to at `level`.
    #[inline]
    pub fn generalize(&self, code: u32, level: usize) -> u32 {
        self.map[code as usize][level]
    }

    /// Number of distinct codes per level.
    pub fn distinct_value_counts(&self) -> &[usize] {
        &self.distinct_values
    }

    /// The distinct codes at a level, ascending.
    pub fn distinct_values(&self, level: usize) -> Vec<u32> {
        self.map.iter().map(|rule| rule[level]).unique().sorted().collect()
    }
}


#[cfg(test)]
mod test_hierarchy {
    use crate::base::hierarchy;
    use crate::dictionary::Dictionary;
    use crate::hierarchy::GeneralizationHierarchy;

    fn dictionary(values: &[&str]) -> Dictionary {
        let mut dictionary = Dictionary::new(1);
        values.iter().for_each(|value| { dictionary.register(0, value).unwrap(); });
        dictionary
    }

    #[test]
    fn complete_hierarchy() {
        let mut dictionary = dictionary(&["34", "36", "38"]);
        let rules = hierarchy(&[
            &["34", "30-39", "*"],
            &["36", "30-39", "*"],
            &["38", "30-39", "*"],
            &["45", "40-49", "*"],
        ]);
        let hierarchy = GeneralizationHierarchy::new("age", &rules, 0, &mut dictionary).unwrap();
        assert_eq!(hierarchy.height(), 3);
        assert_eq!(hierarchy.map().len(), 3);
        assert_eq!(hierarchy.distinct_value_counts(), &[3, 1, 1]);
        assert_eq!(hierarchy.distinct_values(1), vec![3]);
        assert_eq!(dictionary.value(0, hierarchy.generalize(1, 1)), Some("30-39"));
        // values of skipped rows are never registered
        assert_eq!(dictionary.probe(0, "40-49").unwrap(), None);
        assert!(hierarchy.check_monotonicity(&dictionary).is_ok());
    }

    #[test]
    fn missing_rule_names_value() {
        let mut dictionary = dictionary(&["34", "36", "38"]);
        let rules = hierarchy(&[&["34", "*"], &["38", "*"]]);
        let err = GeneralizationHierarchy::new("age", &rules, 0, &mut dictionary).unwrap_err();
        assert!(err.to_string().contains("'36'"));
    }

    #[test]
    fn malformed_hierarchies() {
        let mut dictionary = dictionary(&["34", "36"]);
        assert!(GeneralizationHierarchy::new("age", &[], 0, &mut dictionary).is_err());
        assert!(GeneralizationHierarchy::new("age", &[vec![]], 0, &mut dictionary).is_err());
        let uneven = hierarchy(&[&["34", "*"], &["36", "30-39", "*"]]);
        assert!(GeneralizationHierarchy::new("age", &uneven, 0, &mut dictionary).is_err());
        let duplicate = hierarchy(&[&["34", "*"], &["36", "*"], &["34", "*"]]);
        assert!(GeneralizationHierarchy::new("age", &duplicate, 0, &mut dictionary).is_err());
    }

    #[test]
    fn finalized_dictionary_is_rejected() {
        let mut dictionary = dictionary(&["34"]);
        dictionary.finalize_all();
        assert!(GeneralizationHierarchy::new("age", &hierarchy(&[&["34", "*"]]), 0, &mut dictionary).is_err());
    }

    #[test]
    fn branching_rules_are_not_monotonic() {
        let mut dictionary = dictionary(&["a", "b", "c"]);
        let rules = hierarchy(&[
            &["a", "x", "1"],
            &["b", "x", "2"],
            &["c", "y", "2"],
        ]);
        let hierarchy = GeneralizationHierarchy::new("attr", &rules, 0, &mut dictionary).unwrap();
        let err = hierarchy.check_monotonicity(&dictionary).unwrap_err().to_string();
        assert!(err.contains("(x)"));
        assert!(err.contains("(1)"));
        assert!(err.contains("(2)"));
    }
}
