//! Privacy criteria as seen by the data manager.
//!
//! Criteria are evaluated elsewhere. The manager only needs to know whether a criterion
//! restricts the analysis to a subset of rows, fixes the generalization of attributes
//! (differential privacy), or requires a hierarchy for a sensitive attribute.

use crate::errors::*;

use crate::base::DataDefinition;
use crate::utilities::row_set::RowSet;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

pub trait PrivacyCriterion: Debug {
    fn name(&self) -> &str;

    fn is_subset_available(&self) -> bool {
        self.data_subset().is_some()
    }

    fn data_subset(&self) -> Option<&RowSet> {
        None
    }

    /// Fixed generalization required by the criterion, if any.
    fn generalization_scheme(&self) -> Option<&GeneralizationScheme> {
        None
    }

    /// Sensitive attribute that needs a generalization hierarchy, if any.
    fn hierarchical_attribute(&self) -> Option<&str> {
        None
    }
}

/// Fraction of an attribute's generalization range to apply.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeneralizationDegree {
    None,
    Low,
    LowMedium,
    Medium,
    MediumHigh,
    High,
    Complete,
}

impl GeneralizationDegree {
    pub fn factor(self) -> f64 {
        match self {
            GeneralizationDegree::None => 0.,
            GeneralizationDegree::Low => 0.2,
            GeneralizationDegree::LowMedium => 0.4,
            GeneralizationDegree::Medium => 0.5,
            GeneralizationDegree::MediumHigh => 0.6,
            GeneralizationDegree::High => 0.8,
            GeneralizationDegree::Complete => 1.,
        }
    }
}

/// Per-attribute override of a scheme.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeGeneralization {
    Degree(GeneralizationDegree),
    Level(usize),
}

/// Data-independent choice of generalization levels.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeneralizationScheme {
    pub degree: GeneralizationDegree,
    #[serde(default)]
    pub attributes: IndexMap<String, AttributeGeneralization>,
}

impl GeneralizationScheme {
    pub fn new(degree: GeneralizationDegree) -> Self {
        GeneralizationScheme { degree, attributes: IndexMap::new() }
    }

    pub fn with_degree(mut self, attribute: &str, degree: GeneralizationDegree) -> Self {
        self.attributes.insert(attribute.to_string(), AttributeGeneralization::Degree(degree));
        self
    }

    pub fn with_level(mut self, attribute: &str, level: usize) -> Self {
        self.attributes.insert(attribute.to_string(), AttributeGeneralization::Level(level));
        self
    }

    /// Level to apply to `attribute`, between its minimum and maximum generalization.
    ///
    /// Bounds default to the full hierarchy. Explicit levels are returned as given.
    pub fn generalization_level(&self, attribute: &str, definition: &DataDefinition) -> Result<usize> {
        let degree = match self.attributes.get(attribute) {
            Some(AttributeGeneralization::Level(level)) => return Ok(*level),
            Some(AttributeGeneralization::Degree(degree)) => *degree,
            None => self.degree
        };

        let height = definition.get(attribute)
            .and_then(|attribute| attribute.hierarchy_height())
            .ok_or_else(|| Error::from(format!("attribute '{}' has no generalization hierarchy", attribute)))?;
        let minimum = definition.minimum_generalization(attribute).unwrap_or(0);
        let maximum = definition.maximum_generalization(attribute).unwrap_or(height - 1);
        if minimum > maximum {
            return Err(format!("minimum generalization of attribute '{}' exceeds its maximum", attribute).into());
        }

        Ok((minimum as f64 + (maximum - minimum) as f64 * degree.factor()).round() as usize)
    }
}

/// Requires every equivalence class to contain at least `k` rows.
#[derive(Clone, Debug)]
pub struct KAnonymity {
    pub k: usize,
}

impl PrivacyCriterion for KAnonymity {
    fn name(&self) -> &str {
        "k-anonymity"
    }
}

/// (ε,δ)-differential privacy through random sampling and a fixed generalization.
#[derive(Clone, Debug)]
pub struct EdDifferentialPrivacy {
    pub epsilon: f64,
    pub delta: f64,
    pub scheme: GeneralizationScheme,
    pub subset: Option<RowSet>,
}

impl PrivacyCriterion for EdDifferentialPrivacy {
    fn name(&self) -> &str {
        "(e,d)-differential privacy"
    }

    fn data_subset(&self) -> Option<&RowSet> {
        self.subset.as_ref()
    }

    fn generalization_scheme(&self) -> Option<&GeneralizationScheme> {
        Some(&self.scheme)
    }
}

/// t-closeness of a sensitive attribute, measured along its generalization hierarchy.
#[derive(Clone, Debug)]
pub struct HierarchicalDistanceTCloseness {
    pub attribute: String,
    pub t: f64,
}

impl PrivacyCriterion for HierarchicalDistanceTCloseness {
    fn name(&self) -> &str {
        "t-closeness with hierarchical distance"
    }

    fn hierarchical_attribute(&self) -> Option<&str> {
        Some(&self.attribute)
    }
}
