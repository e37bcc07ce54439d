//! Assembly of the generalized and analyzed views of a dataset.

use crate::errors::*;

use crate::aggregation::DataAggregationInformation;
use crate::base::DataDefinition;
use crate::criteria::PrivacyCriterion;
use crate::data::Data;
use crate::hierarchy::GeneralizationHierarchy;
use crate::shares::{domain_share, DomainShare};
use crate::utilities::row_set::RowSet;

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ManagerOptions {
    /// Analyze microaggregated attributes during the search instead of once afterwards.
    #[serde(default)]
    pub utility_based_microaggregation: bool,
}

type DomainShares = Rc<Vec<Box<dyn DomainShare>>>;

/// Views, hierarchies and generalization bounds derived from one input dataset.
///
/// Cloning is cheap: hierarchies, definition and cached domain shares are shared.
#[derive(Clone)]
pub struct DataManager {
    data_input: Data,
    data_generalized: Data,
    data_analyzed: Data,
    definition: Rc<DataDefinition>,
    hierarchies_generalized: Rc<Vec<GeneralizationHierarchy>>,
    hierarchies_analyzed: Rc<IndexMap<String, GeneralizationHierarchy>>,
    aggregation: DataAggregationInformation,
    min_levels: Vec<usize>,
    max_levels: Vec<usize>,
    subset: Option<RowSet>,
    domain_shares: Rc<RefCell<Option<DomainShares>>>,
    source: Option<Rc<DataManager>>,
}

impl DataManager {
    pub fn new(
        data_input: Data,
        definition: &DataDefinition,
        criteria: &[Box<dyn PrivacyCriterion>],
        options: ManagerOptions,
    ) -> Result<DataManager> {
        let header = data_input.header().to_vec();
        let in_header = |set: IndexSet<String>| -> Result<IndexSet<String>> {
            if let Some(missing) = set.iter().find(|attribute| !header.contains(*attribute)) {
                return Err(format!("attribute '{}' is defined but not present in the input", missing).into());
            }
            Ok(header.iter()
                .filter(|attribute| set.contains(*attribute))
                .cloned()
                .collect::<IndexSet<String>>())
        };

        let generalized = in_header(definition.quasi_identifiers_with_generalization())?;
        let microaggregated = in_header(definition.quasi_identifiers_with_microaggregation())?;
        let clustered = in_header(definition.quasi_identifiers_with_clustering())?;
        let sensitive = in_header(definition.sensitive_attributes())?;
        let response = in_header(definition.response_variables())?;

        let (hot_not_generalized, hot_generalized, cold) = if options.utility_based_microaggregation {
            (microaggregated, clustered, IndexSet::new())
        } else {
            (IndexSet::new(), IndexSet::new(), microaggregated.into_iter().chain(clustered).collect())
        };

        // hot columns must precede cold columns
        let analyzed = sensitive.iter()
            .chain(hot_not_generalized.iter())
            .chain(hot_generalized.iter())
            .chain(response.iter())
            .chain(cold.iter())
            .cloned()
            .collect::<IndexSet<String>>();

        debug!("generalized attributes: {:?}", generalized);
        debug!("analyzed attributes: {:?}", analyzed);

        let columns_of = |attributes: &IndexSet<String>| attributes.iter()
            .map(|attribute| data_input.index_of(attribute)
                .ok_or_else(|| Error::from(format!("attribute '{}' is not part of the input", attribute))))
            .collect::<Result<Vec<usize>>>();

        let mut data_generalized = Data::create_projection(
            data_input.matrix(), data_input.header(), &columns_of(&generalized)?, data_input.dictionary())?;
        let mut data_analyzed = Data::create_projection(
            data_input.matrix(), data_input.header(), &columns_of(&analyzed)?, data_input.dictionary())?;

        let hierarchies_generalized = {
            let dictionary = data_generalized.dictionary_mut();
            dictionary.definalize_all();
            let hierarchies = generalized.iter().enumerate()
                .map(|(dimension, attribute)| {
                    let rules = definition.hierarchy(attribute)
                        .ok_or_else(|| Error::from(format!("quasi-identifier '{}' has no generalization hierarchy", attribute)))?;
                    GeneralizationHierarchy::new(attribute, rules, dimension, dictionary)
                })
                .collect::<Result<Vec<GeneralizationHierarchy>>>()?;
            dictionary.finalize_all();
            hierarchies
        };

        let hierarchical = criteria.iter()
            .filter_map(|criterion| criterion.hierarchical_attribute())
            .collect::<IndexSet<&str>>();
        let hierarchies_analyzed = {
            let dimensions = hierarchical.iter()
                .map(|attribute| match data_analyzed.index_of(attribute) {
                    Some(dimension) if sensitive.contains(*attribute) => Ok((*attribute, dimension)),
                    _ => Err(Error::from(format!(
                        "hierarchical distance requires '{}' to be a sensitive attribute of the input", attribute)))
                })
                .collect::<Result<Vec<(&str, usize)>>>()?;

            let dictionary = data_analyzed.dictionary_mut();
            dictionary.definalize_all();
            let hierarchies = dimensions.into_iter()
                .map(|(attribute, dimension)| {
                    let rules = definition.hierarchy(attribute)
                        .ok_or_else(|| Error::from(format!("sensitive attribute '{}' has no generalization hierarchy", attribute)))?;
                    Ok((attribute.to_string(), GeneralizationHierarchy::new(attribute, rules, dimension, dictionary)?))
                })
                .collect::<Result<IndexMap<String, GeneralizationHierarchy>>>()?;
            dictionary.finalize_all();
            hierarchies
        };

        let scheme = criteria.iter().find_map(|criterion| criterion.generalization_scheme());
        let mut min_levels = Vec::with_capacity(generalized.len());
        let mut max_levels = Vec::with_capacity(generalized.len());
        for (attribute, hierarchy) in generalized.iter().zip(hierarchies_generalized.iter()) {
            let top = hierarchy.height() - 1;
            let (minimum, maximum) = match scheme {
                Some(scheme) => {
                    let level = scheme.generalization_level(attribute, definition)?;
                    warn!("attribute '{}' is fixed to generalization level {} by differential privacy", attribute, level);
                    (level, level)
                }
                None => (
                    definition.minimum_generalization(attribute).unwrap_or(0),
                    definition.maximum_generalization(attribute).unwrap_or(top))
            };
            if minimum > maximum || maximum > top {
                return Err(format!(
                    "invalid generalization bounds [{}, {}] for attribute '{}' with hierarchy height {}",
                    minimum, maximum, attribute, hierarchy.height()).into());
            }
            min_levels.push(minimum);
            max_levels.push(maximum);
        }

        let subset = criteria.iter()
            .filter(|criterion| criterion.is_subset_available())
            .find_map(|criterion| criterion.data_subset())
            .cloned();
        if let Some(subset) = &subset {
            if subset.length() != data_input.num_rows() {
                return Err(format!("data subset covers {} rows, but the input has {}",
                                   subset.length(), data_input.num_rows()).into());
            }
        }

        let aggregation = DataAggregationInformation::new(
            &data_analyzed, &hot_not_generalized, &hot_generalized, &cold, definition)?;

        info!("data manager: {} rows, {} generalized, {} analyzed ({} hot), {} sensitive hierarchies",
              data_input.num_rows(), data_generalized.num_columns(), data_analyzed.num_columns(),
              aggregation.hot_columns().len(), hierarchies_analyzed.len());

        Ok(DataManager {
            data_input,
            data_generalized,
            data_analyzed,
            definition: Rc::new(definition.clone()),
            hierarchies_generalized: Rc::new(hierarchies_generalized),
            hierarchies_analyzed: Rc::new(hierarchies_analyzed),
            aggregation,
            min_levels,
            max_levels,
            subset,
            domain_shares: Rc::new(RefCell::new(None)),
            source: None,
        })
    }

    /// A manager restricted to the selected rows of the input.
    ///
    /// Hierarchies, bounds and domain shares are shared. Distributions, orders and trees
    /// are still computed over the rows of the original input.
    pub fn get_subset_instance(&self, rowset: &RowSet) -> Result<DataManager> {
        let data_input = self.data_input.get_subset_instance(rowset)
            .chain_err(|| "cannot restrict the data manager to a row set")?;
        let source = self.source.clone().unwrap_or_else(|| Rc::new(self.clone()));
        Ok(DataManager {
            data_input,
            data_generalized: self.data_generalized.get_subset_instance(rowset)?,
            data_analyzed: self.data_analyzed.get_subset_instance(rowset)?,
            aggregation: self.aggregation.clone(),
            source: Some(source),
            ..self.clone()
        })
    }

    fn origin(&self) -> &DataManager {
        self.source.as_ref().map_or(self, |source| source.as_ref())
    }

    pub fn is_subset_instance(&self) -> bool {
        self.source.is_some()
    }

    pub fn data_input(&self) -> &Data {
        &self.data_input
    }

    pub fn data_generalized(&self) -> &Data {
        &self.data_generalized
    }

    pub fn data_analyzed(&self) -> &Data {
        &self.data_analyzed
    }

    pub fn definition(&self) -> &DataDefinition {
        &self.definition
    }

    /// One hierarchy per column of the generalized data.
    pub fn hierarchies(&self) -> &[GeneralizationHierarchy] {
        &self.hierarchies_generalized
    }

    pub fn hierarchy(&self, attribute: &str) -> Option<&GeneralizationHierarchy> {
        self.hierarchies_generalized.iter().find(|hierarchy| hierarchy.attribute() == attribute)
    }

    pub fn sensitive_hierarchy(&self, attribute: &str) -> Option<&GeneralizationHierarchy> {
        self.hierarchies_analyzed.get(attribute)
    }

    pub fn hierarchy_heights(&self) -> Vec<usize> {
        self.hierarchies_generalized.iter().map(GeneralizationHierarchy::height).collect()
    }

    pub fn aggregation_information(&self) -> &DataAggregationInformation {
        &self.aggregation
    }

    pub fn min_levels(&self) -> &[usize] {
        &self.min_levels
    }

    pub fn max_levels(&self) -> &[usize] {
        &self.max_levels
    }

    /// Rows selected by a privacy criterion, if any.
    pub fn data_subset(&self) -> Option<&RowSet> {
        self.subset.as_ref()
    }

    /// Verify that every hierarchy is a tree.
    pub fn check_monotonicity(&self) -> Result<()> {
        self.hierarchies_generalized.iter()
            .try_for_each(|hierarchy| hierarchy.check_monotonicity(self.data_generalized.dictionary()))?;
        self.hierarchies_analyzed.values()
            .try_for_each(|hierarchy| hierarchy.check_monotonicity(self.data_analyzed.dictionary()))
    }

    /// Domain shares of the generalized attributes, built on first use.
    pub fn domain_shares(&self) -> Result<Rc<Vec<Box<dyn DomainShare>>>> {
        if let Some(shares) = self.domain_shares.borrow().as_ref() {
            return Ok(shares.clone());
        }

        let shares = self.hierarchies_generalized.iter()
            .map(|hierarchy| {
                let attribute = hierarchy.attribute();
                let rules = self.definition.hierarchy(attribute)
                    .ok_or_else(|| Error::from(format!("attribute '{}' has no generalization hierarchy", attribute)))?;
                domain_share(&self.definition.hierarchy_origin(attribute), hierarchy, rules, self.data_generalized.dictionary())
                    .chain_err(|| format!("while building the domain share of attribute '{}'", attribute))
            })
            .collect::<Result<Vec<Box<dyn DomainShare>>>>()?;
        debug!("built {} domain shares", shares.len());

        let shares = Rc::new(shares);
        *self.domain_shares.borrow_mut() = Some(shares.clone());
        Ok(shares)
    }

    /// Relative frequency of every code of an analyzed attribute.
    pub fn get_distribution(&self, attribute: &str) -> Result<Vec<f64>> {
        let origin = self.origin();
        let data = &origin.data_analyzed;
        let column = origin.analyzed_index(attribute)?;

        let mut distribution = vec![0.; data.dictionary().num_codes(column)];
        let matrix = data.matrix();
        (0..matrix.num_rows()).for_each(|row| distribution[matrix.get(row, column) as usize] += 1.);

        let rows = matrix.num_rows() as f64;
        if rows > 0. {
            distribution.iter_mut().for_each(|frequency| *frequency /= rows);
        }
        Ok(distribution)
    }

    /// Rank of every code of an analyzed attribute, ordered by its data type.
    pub fn get_order(&self, attribute: &str) -> Result<Vec<usize>> {
        let origin = self.origin();
        let column = origin.analyzed_index(attribute)?;
        origin.definition.data_type(attribute)
            .ranks(origin.data_analyzed.dictionary().mapping(column)?)
            .chain_err(|| format!("while ordering the values of attribute '{}'", attribute))
    }

    /// Flattened hierarchy of a sensitive attribute, annotated with leaf counts.
    ///
    /// Layout: `[rows, leaves, height, count of each leaf..., node blocks...]`.
    /// A node block is `[level, children, offset of each child..., leaves below]`;
    /// children of level-1 nodes point to leaf counts, other children to their node block.
    /// Blocks are emitted level by level, so the root comes last.
    pub fn get_tree(&self, attribute: &str) -> Result<Vec<usize>> {
        let origin = self.origin();
        let hierarchy = origin.hierarchies_analyzed.get(attribute)
            .ok_or_else(|| Error::from(format!("attribute '{}' has no sensitive hierarchy", attribute)))?;
        let data = &origin.data_analyzed;
        let column = hierarchy.dimension();
        let map = hierarchy.map();
        let leaves = map.len();
        let height = hierarchy.height();

        const HEADER: usize = 3;
        let mut tree = vec![data.num_rows(), leaves, height - 1];
        tree.resize(HEADER + leaves, 0);
        let matrix = data.matrix();
        (0..matrix.num_rows()).for_each(|row| tree[HEADER + matrix.get(row, column) as usize] += 1);

        // node ids are unique across levels
        let offset = data.dictionary().num_codes(column);
        let id = |code: u32, level: usize| code as usize + level * offset;

        let mut levels = vec![IndexMap::<usize, IndexSet<usize>>::new(); height];
        for level in 1..height {
            for rule in map {
                levels[level].entry(id(rule[level], level))
                    .or_insert_with(IndexSet::new)
                    .insert(id(rule[level - 1], level - 1));
            }
        }

        let mut blocks = std::collections::HashMap::<usize, (usize, usize)>::new();
        for (level, nodes) in levels.iter().enumerate().skip(1) {
            for (node, children) in nodes {
                let position = tree.len();
                tree.push(level);
                tree.push(children.len());
                let mut below = 0;
                for child in children {
                    if level == 1 {
                        tree.push(HEADER + child);
                        below += 1;
                    } else {
                        let (child_position, child_below) = blocks[child];
                        tree.push(child_position);
                        below += child_below;
                    }
                }
                tree.push(below);
                blocks.insert(*node, (position, below));
            }
        }

        debug!("tree for attribute '{}' has {} entries", attribute, tree.len());
        Ok(tree)
    }

    fn analyzed_index(&self, attribute: &str) -> Result<usize> {
        self.data_analyzed.index_of(attribute)
            .ok_or_else(|| format!("attribute '{}' is not analyzed", attribute).into())
    }
}

impl fmt::Debug for DataManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataManager")
            .field("generalized", &self.data_generalized.header())
            .field("analyzed", &self.data_analyzed.header())
            .field("min_levels", &self.min_levels)
            .field("max_levels", &self.max_levels)
            .field("subset_instance", &self.is_subset_instance())
            .finish()
    }
}
