use kanon_framework::errors::*;

use kanon_framework::{Data, GeneralizationHierarchy};

use crate::groupify::Groupify;
use crate::loss::InformationLossDefault;
use crate::metrics::{check_hierarchies, not_initialized, Metric};
use crate::transformation::Transformation;

/// Sum of the generalization levels.
#[derive(Clone, Debug, Default)]
pub struct MetricHeight {
    heights: Option<Vec<usize>>,
}

impl MetricHeight {
    pub fn new() -> Self {
        MetricHeight::default()
    }

    fn heights(&self) -> Result<&[usize]> {
        self.heights.as_ref().map(Vec::as_slice).ok_or_else(|| not_initialized(self.name()))
    }
}

impl Metric for MetricHeight {
    type Loss = InformationLossDefault;

    fn name(&self) -> &str {
        "Height"
    }

    fn is_monotonic(&self) -> bool {
        true
    }

    fn is_independent(&self) -> bool {
        true
    }

    fn initialize(&mut self, data: &Data, hierarchies: &[GeneralizationHierarchy]) -> Result<()> {
        self.heights = Some(check_hierarchies(data, hierarchies)?);
        Ok(())
    }

    fn evaluate(&mut self, transformation: &Transformation, _groupify: Option<&dyn Groupify>) -> Result<InformationLossDefault> {
        transformation.check(self.heights()?)?;
        InformationLossDefault::new(transformation.total() as f64)
    }

    fn min_loss(&self) -> Result<InformationLossDefault> {
        self.heights()?;
        InformationLossDefault::new(0.)
    }

    fn max_loss(&self) -> Result<InformationLossDefault> {
        InformationLossDefault::new(self.heights()?.iter().map(|height| height - 1).sum::<usize>() as f64)
    }
}
