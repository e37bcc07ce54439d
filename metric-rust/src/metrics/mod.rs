//! Information-loss metrics
//!
//! A metric is initialized once with the generalized data and its hierarchies, then scores
//! any number of transformations. Metrics are not thread safe: caches are filled lazily
//! during evaluation, so every searching thread needs its own instance.

use kanon_framework::errors::*;

use kanon_framework::{Data, GeneralizationHierarchy};

use crate::groupify::Groupify;
use crate::loss::{GlobalOptimum, InformationLoss};
use crate::transformation::Transformation;

use itertools::Itertools;

pub mod combined;
pub mod dm;
pub mod entropy;
pub mod height;
pub mod nm_entropy;
pub mod precision;
pub mod weighted;

pub use self::combined::MetricCombined;
pub use self::dm::{MetricDM, MetricDMStar};
pub use self::entropy::MetricEntropy;
pub use self::height::MetricHeight;
pub use self::nm_entropy::MetricNMEntropy;
pub use self::precision::MetricPrecision;
pub use self::weighted::MetricWeighted;

pub trait Metric {
    type Loss: InformationLoss;

    fn name(&self) -> &str;

    /// Loss never decreases when any attribute is generalized further.
    fn is_monotonic(&self) -> bool;

    /// Loss can be computed from the transformation alone, without a grouping.
    fn is_independent(&self) -> bool;

    /// Bind the metric to the generalized data. Discards cached state.
    fn initialize(&mut self, data: &Data, hierarchies: &[GeneralizationHierarchy]) -> Result<()>;

    /// Score a transformation. Dependent metrics require the grouping it induces.
    fn evaluate(&mut self, transformation: &Transformation, groupify: Option<&dyn Groupify>) -> Result<Self::Loss>;

    /// Lower bound of the loss over all transformations.
    fn min_loss(&self) -> Result<Self::Loss>;

    /// Upper bound of the loss over all transformations.
    fn max_loss(&self) -> Result<Self::Loss>;

    /// Score a transformation and offer the result to `optimum`.
    fn evaluate_tracked(
        &mut self,
        transformation: &Transformation,
        groupify: Option<&dyn Groupify>,
        optimum: &mut GlobalOptimum<Self::Loss>,
    ) -> Result<Self::Loss> {
        let loss = self.evaluate(transformation, groupify)?;
        if optimum.offer(transformation, &loss) {
            debug!("{}: new optimum {:?} with loss {:?}", self.name(), transformation.levels(), loss);
        }
        Ok(loss)
    }
}

/// Heights of the hierarchies, after checking they describe the columns of `data`.
pub(crate) fn check_hierarchies(data: &Data, hierarchies: &[GeneralizationHierarchy]) -> Result<Vec<usize>> {
    if hierarchies.len() != data.num_columns() {
        return Err(format!("{} hierarchies given for {} generalized columns",
                           hierarchies.len(), data.num_columns()).into());
    }
    if let Some((column, hierarchy)) = hierarchies.iter().enumerate()
        .find(|(column, hierarchy)| hierarchy.dimension() != *column) {
        return Err(format!("hierarchy of attribute '{}' describes column {}, expected {}",
                           hierarchy.attribute(), hierarchy.dimension(), column).into());
    }
    Ok(hierarchies.iter().map(GeneralizationHierarchy::height).collect_vec())
}

pub(crate) fn not_initialized(name: &str) -> Error {
    format!("metric {} must be initialized before use", name).into()
}

pub(crate) fn requires_groupify<'a>(name: &str, groupify: Option<&'a dyn Groupify>) -> Result<&'a dyn Groupify> {
    groupify.ok_or_else(|| format!("metric {} requires a grouping of the data", name).into())
}
