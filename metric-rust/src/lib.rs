//! Information-loss metrics for generalization-based anonymization.
//!
//! A search proposes [`Transformation`](transformation::Transformation)s over the generalized
//! data of a [`DataManager`](kanon_framework::DataManager). Each candidate is grouped into
//! equivalence classes by a [`Groupify`](groupify::Groupify) and scored by a
//! [`Metric`](metrics::Metric). The best candidate is kept in a
//! [`GlobalOptimum`](loss::GlobalOptimum) owned by the caller.

#[macro_use]
extern crate log;

pub use kanon_framework::errors;

pub mod groupify;
pub mod loss;
pub mod metrics;
pub mod transformation;

pub use crate::groupify::{Groupify, GroupifyEntry, HashGroupify};
pub use crate::loss::{GlobalOptimum, InformationLoss, InformationLossCombined, InformationLossDefault};
pub use crate::metrics::Metric;
pub use crate::transformation::Transformation;

#[cfg(test)]
pub(crate) mod test_data {
    use kanon_framework::base::hierarchy;
    use kanon_framework::{AttributeDefinition, Data, DataDefinition, DataManager, GeneralizationHierarchy, ManagerOptions};

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    fn age_hierarchy() -> Vec<Vec<String>> {
        hierarchy(&[
            &["34", "30-39", "*"],
            &["36", "30-39", "*"],
            &["38", "30-39", "*"],
            &["45", "40-49", "*"],
            &["47", "40-49", "*"],
        ])
    }

    fn generalized(data: Data, definition: &DataDefinition) -> (Data, Vec<GeneralizationHierarchy>) {
        let manager = DataManager::new(data, definition, &[], ManagerOptions::default()).unwrap();
        (manager.data_generalized().clone(), manager.hierarchies().to_vec())
    }

    /// A single generalized column of ages.
    pub fn ages(values: &[&str]) -> (Data, Vec<GeneralizationHierarchy>) {
        let rows = values.iter().map(|value| strings(&[*value])).collect::<Vec<Vec<String>>>();
        let data = Data::encode(&strings(&["age"]), &rows).unwrap();

        let mut definition = DataDefinition::new();
        definition.define("age", AttributeDefinition::quasi_identifying(age_hierarchy()));
        generalized(data, &definition)
    }

    /// Ages and zip codes, with a sensitive disease column that is not generalized.
    pub fn people() -> (Data, Vec<GeneralizationHierarchy>) {
        let rows = [
            ["34", "4711", "flu"],
            ["36", "4712", "cold"],
            ["38", "4711", "flu"],
            ["45", "4799", "gastritis"],
            ["47", "4798", "flu"],
            ["34", "4711", "cold"],
            ["45", "4712", "flu"],
            ["38", "4799", "gastritis"],
        ].iter().map(|row| strings(row)).collect::<Vec<Vec<String>>>();
        let data = Data::encode(&strings(&["age", "zip", "disease"]), &rows).unwrap();

        let mut definition = DataDefinition::new();
        definition
            .define("age", AttributeDefinition::quasi_identifying(age_hierarchy()))
            .define("zip", AttributeDefinition::quasi_identifying(hierarchy(&[
                &["4711", "471*", "47**", "*"],
                &["4712", "471*", "47**", "*"],
                &["4798", "479*", "47**", "*"],
                &["4799", "479*", "47**", "*"],
            ])))
            .define("disease", AttributeDefinition::sensitive());
        generalized(data, &definition)
    }
}
