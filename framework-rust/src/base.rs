//! Definition types: how every attribute of a dataset is to be treated.
//!
//! A [`DataDefinition`] is plain configuration. It may be assembled in code or
//! deserialized from JSON with [`DataDefinition::from_json`].

use crate::errors::*;

use indexmap::{IndexMap, IndexSet};
use itertools::Itertools;
use noisy_float::prelude::{n64, N64};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Role of an attribute in the anonymization process.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeKind {
    /// Removed from the output.
    Identifying,
    /// Generalized or microaggregated.
    QuasiIdentifying,
    /// Kept, but protected by privacy criteria.
    Sensitive,
    /// Kept as is.
    Insensitive,
}

impl Default for AttributeKind {
    fn default() -> Self {
        AttributeKind::Insensitive
    }
}

/// Value domain of an attribute. Determines ordering and numeric interpretation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    String,
    Integer,
    Decimal,
    /// Values ordered by their position in the list.
    Ordinal(Vec<String>),
}

impl Default for DataType {
    fn default() -> Self {
        DataType::String
    }
}

impl DataType {
    pub fn is_missing(value: &str) -> bool {
        value.is_empty() || value.eq_ignore_ascii_case("null")
    }

    pub fn is_numeric(&self) -> bool {
        match self {
            DataType::Integer | DataType::Decimal => true,
            _ => false
        }
    }

    /// Numeric interpretation of a value. Ordinal values map to their position.
    pub fn to_number(&self, value: &str) -> Result<N64> {
        let number = match self {
            DataType::Integer => value.trim().parse::<i64>()
                .map(|v| v as f64)
                .map_err(|_| Error::from(format!("'{}' is not an integer", value)))?,
            DataType::Decimal => value.trim().parse::<f64>()
                .map_err(|_| Error::from(format!("'{}' is not a decimal", value)))?,
            DataType::Ordinal(order) => order.iter().position(|v| v == value)
                .ok_or_else(|| Error::from(format!("'{}' is not part of the ordinal domain", value)))? as f64,
            DataType::String => return Err(format!("'{}' has no numeric interpretation", value).into())
        };
        if number.is_nan() {
            return Err(format!("'{}' is not a number", value).into());
        }
        Ok(n64(number))
    }

    /// Compare two values of this type. Missing values sort first.
    pub fn compare(&self, left: &str, right: &str) -> Result<Ordering> {
        match (DataType::is_missing(left), DataType::is_missing(right)) {
            (true, true) => return Ok(Ordering::Equal),
            (true, false) => return Ok(Ordering::Less),
            (false, true) => return Ok(Ordering::Greater),
            _ => ()
        }
        Ok(match self {
            DataType::String => left.cmp(right),
            _ => self.to_number(left)?.cmp(&self.to_number(right)?)
        })
    }

    /// Rank of every value when sorted by this type. Equal values keep their relative order.
    pub fn ranks(&self, values: &[String]) -> Result<Vec<usize>> {
        let mut failure = None;
        let order = (0..values.len())
            .sorted_by(|left, right| match self.compare(&values[*left], &values[*right]) {
                Ok(ordering) => ordering,
                Err(err) => {
                    failure.get_or_insert(err);
                    Ordering::Equal
                }
            });
        if let Some(err) = failure {
            return Err(err);
        }

        let mut ranks = vec![0; values.len()];
        order.enumerate().for_each(|(rank, index)| ranks[index] = rank);
        Ok(ranks)
    }
}

/// How a generalization hierarchy was produced. Selects the domain-share strategy.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HierarchyOrigin {
    /// An explicit table of values.
    Materialized,
    /// Intervals over the numeric range `[lower, upper]`.
    Interval { lower: f64, upper: f64 },
    /// Characters replaced right-to-left by `redaction_character`.
    Redaction { alphabet_size: usize, max_length: usize, redaction_character: char },
}

impl Default for HierarchyOrigin {
    fn default() -> Self {
        HierarchyOrigin::Materialized
    }
}

/// Strategy used to summarize the values of an equivalence class.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregateKind {
    Mode,
    Median,
    Interval,
    ArithmeticMean,
    GeometricMean,
    Set,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Microaggregation {
    pub function: AggregateKind,
    /// Cluster by generalization before aggregating.
    #[serde(default)]
    pub clustering: bool,
    #[serde(default = "default_ignore_missing")]
    pub ignore_missing: bool,
}

fn default_ignore_missing() -> bool { true }

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AttributeDefinition {
    pub kind: AttributeKind,
    #[serde(default)]
    pub data_type: DataType,
    /// One row per value: the value followed by its generalizations, most specific first.
    #[serde(default)]
    pub hierarchy: Option<Vec<Vec<String>>>,
    #[serde(default)]
    pub hierarchy_origin: HierarchyOrigin,
    #[serde(default)]
    pub minimum_generalization: Option<usize>,
    #[serde(default)]
    pub maximum_generalization: Option<usize>,
    #[serde(default)]
    pub microaggregation: Option<Microaggregation>,
    #[serde(default)]
    pub response_variable: bool,
}

impl AttributeDefinition {
    pub fn identifying() -> Self {
        AttributeDefinition { kind: AttributeKind::Identifying, ..Default::default() }
    }

    pub fn insensitive() -> Self {
        AttributeDefinition::default()
    }

    pub fn sensitive() -> Self {
        AttributeDefinition { kind: AttributeKind::Sensitive, ..Default::default() }
    }

    pub fn quasi_identifying(hierarchy: Vec<Vec<String>>) -> Self {
        AttributeDefinition {
            kind: AttributeKind::QuasiIdentifying,
            hierarchy: Some(hierarchy),
            ..Default::default()
        }
    }

    pub fn with_hierarchy(mut self, hierarchy: Vec<Vec<String>>) -> Self {
        self.hierarchy = Some(hierarchy);
        self
    }

    pub fn with_data_type(mut self, data_type: DataType) -> Self {
        self.data_type = data_type;
        self
    }

    pub fn with_origin(mut self, origin: HierarchyOrigin) -> Self {
        self.hierarchy_origin = origin;
        self
    }

    pub fn with_generalization_bounds(mut self, minimum: usize, maximum: usize) -> Self {
        self.minimum_generalization = Some(minimum);
        self.maximum_generalization = Some(maximum);
        self
    }

    pub fn with_microaggregation(mut self, function: AggregateKind, clustering: bool) -> Self {
        self.microaggregation = Some(Microaggregation { function, clustering, ignore_missing: true });
        self
    }

    pub fn as_response_variable(mut self) -> Self {
        self.response_variable = true;
        self
    }

    /// Number of levels of the hierarchy, including the identity level.
    pub fn hierarchy_height(&self) -> Option<usize> {
        self.hierarchy.as_ref()?.first().map(Vec::len)
    }
}

/// Treatment of every attribute of a dataset, keyed by attribute name.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DataDefinition {
    pub attributes: IndexMap<String, AttributeDefinition>,
}

impl DataDefinition {
    pub fn new() -> Self {
        DataDefinition::default()
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn define(&mut self, attribute: &str, definition: AttributeDefinition) -> &mut Self {
        self.attributes.insert(attribute.to_string(), definition);
        self
    }

    pub fn get(&self, attribute: &str) -> Option<&AttributeDefinition> {
        self.attributes.get(attribute)
    }

    /// Attributes without a definition are insensitive.
    pub fn kind(&self, attribute: &str) -> AttributeKind {
        self.get(attribute).map(|definition| definition.kind).unwrap_or_default()
    }

    pub fn data_type(&self, attribute: &str) -> DataType {
        self.get(attribute).map(|definition| definition.data_type.clone()).unwrap_or_default()
    }

    pub fn hierarchy(&self, attribute: &str) -> Option<&Vec<Vec<String>>> {
        self.get(attribute)?.hierarchy.as_ref()
    }

    pub fn hierarchy_origin(&self, attribute: &str) -> HierarchyOrigin {
        self.get(attribute).map(|definition| definition.hierarchy_origin.clone()).unwrap_or_default()
    }

    pub fn microaggregation(&self, attribute: &str) -> Option<&Microaggregation> {
        self.get(attribute)?.microaggregation.as_ref()
    }

    pub fn minimum_generalization(&self, attribute: &str) -> Option<usize> {
        self.get(attribute)?.minimum_generalization
    }

    pub fn maximum_generalization(&self, attribute: &str) -> Option<usize> {
        self.get(attribute)?.maximum_generalization
    }

    fn select(&self, predicate: impl Fn(&AttributeDefinition) -> bool) -> IndexSet<String> {
        self.attributes.iter()
            .filter(|(_, definition)| predicate(definition))
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Quasi-identifiers transformed by generalization, including clustered microaggregation.
    pub fn quasi_identifiers_with_generalization(&self) -> IndexSet<String> {
        self.select(|definition| definition.kind == AttributeKind::QuasiIdentifying
            && definition.microaggregation.as_ref().map_or(true, |m| m.clustering))
    }

    /// Quasi-identifiers transformed by microaggregation only.
    pub fn quasi_identifiers_with_microaggregation(&self) -> IndexSet<String> {
        self.select(|definition| definition.kind == AttributeKind::QuasiIdentifying
            && definition.microaggregation.as_ref().map_or(false, |m| !m.clustering))
    }

    /// Quasi-identifiers clustered by generalization and then microaggregated.
    pub fn quasi_identifiers_with_clustering(&self) -> IndexSet<String> {
        self.select(|definition| definition.kind == AttributeKind::QuasiIdentifying
            && definition.microaggregation.as_ref().map_or(false, |m| m.clustering))
    }

    pub fn sensitive_attributes(&self) -> IndexSet<String> {
        self.select(|definition| definition.kind == AttributeKind::Sensitive)
    }

    /// Response variables that are neither quasi-identifying nor sensitive.
    pub fn response_variables(&self) -> IndexSet<String> {
        self.select(|definition| definition.response_variable
            && definition.kind != AttributeKind::QuasiIdentifying
            && definition.kind != AttributeKind::Sensitive)
    }
}

/// Build a hierarchy table from string slices.
pub fn hierarchy(rows: &[&[&str]]) -> Vec<Vec<String>> {
    rows.iter()
        .map(|row| row.iter().map(|value| value.to_string()).collect())
        .collect()
}
