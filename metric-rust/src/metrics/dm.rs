use kanon_framework::errors::*;

use kanon_framework::{Data, GeneralizationHierarchy};

use crate::groupify::Groupify;
use crate::loss::InformationLossDefault;
use crate::metrics::{check_hierarchies, not_initialized, requires_groupify, Metric};
use crate::transformation::Transformation;

/// Discernability with suppression: every suppressed row is indistinguishable from all rows.
#[derive(Clone, Debug, Default)]
pub struct MetricDM {
    rows: Option<usize>,
}

impl MetricDM {
    pub fn new() -> Self {
        MetricDM::default()
    }
}

impl Metric for MetricDM {
    type Loss = InformationLossDefault;

    fn name(&self) -> &str {
        "Discernability"
    }

    fn is_monotonic(&self) -> bool {
        false
    }

    fn is_independent(&self) -> bool {
        false
    }

    fn initialize(&mut self, data: &Data, hierarchies: &[GeneralizationHierarchy]) -> Result<()> {
        check_hierarchies(data, hierarchies)?;
        self.rows = Some(data.num_rows());
        Ok(())
    }

    fn evaluate(&mut self, _transformation: &Transformation, groupify: Option<&dyn Groupify>) -> Result<InformationLossDefault> {
        let rows = self.rows.ok_or_else(|| not_initialized(self.name()))? as f64;
        let groupify = requires_groupify(self.name(), groupify)?;

        InformationLossDefault::new(groupify.entries().iter()
            .map(|entry| {
                let count = entry.count as f64;
                if entry.is_outlier { rows * count } else { count * count }
            })
            .sum())
    }

    fn min_loss(&self) -> Result<InformationLossDefault> {
        InformationLossDefault::new(self.rows.ok_or_else(|| not_initialized(self.name()))? as f64)
    }

    fn max_loss(&self) -> Result<InformationLossDefault> {
        let rows = self.rows.ok_or_else(|| not_initialized(self.name()))? as f64;
        InformationLossDefault::new(rows * rows)
    }
}

/// Discernability ignoring suppression: the sum of the squared class sizes.
#[derive(Clone, Debug, Default)]
pub struct MetricDMStar {
    rows: Option<usize>,
}

impl MetricDMStar {
    pub fn new() -> Self {
        MetricDMStar::default()
    }
}

impl Metric for MetricDMStar {
    type Loss = InformationLossDefault;

    fn name(&self) -> &str {
        "Discernability*"
    }

    fn is_monotonic(&self) -> bool {
        true
    }

    fn is_independent(&self) -> bool {
        false
    }

    fn initialize(&mut self, data: &Data, hierarchies: &[GeneralizationHierarchy]) -> Result<()> {
        check_hierarchies(data, hierarchies)?;
        self.rows = Some(data.num_rows());
        Ok(())
    }

    fn evaluate(&mut self, _transformation: &Transformation, groupify: Option<&dyn Groupify>) -> Result<InformationLossDefault> {
        self.rows.ok_or_else(|| not_initialized(self.name()))?;
        let groupify = requires_groupify(self.name(), groupify)?;

        InformationLossDefault::new(groupify.entries().iter()
            .map(|entry| (entry.count * entry.count) as f64)
            .sum())
    }

    fn min_loss(&self) -> Result<InformationLossDefault> {
        InformationLossDefault::new(self.rows.ok_or_else(|| not_initialized(self.name()))? as f64)
    }

    fn max_loss(&self) -> Result<InformationLossDefault> {
        let rows = self.rows.ok_or_else(|| not_initialized(self.name()))? as f64;
        InformationLossDefault::new(rows * rows)
    }
}
