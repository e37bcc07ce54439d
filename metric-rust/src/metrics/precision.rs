use kanon_framework::errors::*;

use kanon_framework::{Data, GeneralizationHierarchy};

use crate::groupify::Groupify;
use crate::loss::InformationLossDefault;
use crate::metrics::{check_hierarchies, not_initialized, Metric};
use crate::transformation::Transformation;

/// Mean relative generalization level: `level / (height - 1)` per attribute.
///
/// Attributes with a single-level hierarchy contribute 0.
#[derive(Clone, Debug, Default)]
pub struct MetricPrecision {
    heights: Option<Vec<usize>>,
}

impl MetricPrecision {
    pub fn new() -> Self {
        MetricPrecision::default()
    }

    fn heights(&self) -> Result<&[usize]> {
        self.heights.as_ref().map(Vec::as_slice).ok_or_else(|| not_initialized(self.name()))
    }
}

impl Metric for MetricPrecision {
    type Loss = InformationLossDefault;

    fn name(&self) -> &str {
        "Precision"
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
        let heights = self.heights()?;
        transformation.check(heights)?;
        if heights.is_empty() {
            return InformationLossDefault::new(0.);
        }

        let sum = transformation.levels().iter().zip(heights)
            .map(|(level, height)| match height {
                0 | 1 => 0.,
                _ => *level as f64 / (height - 1) as f64
            })
            .sum::<f64>();
        InformationLossDefault::new(sum / heights.len() as f64)
    }

    fn min_loss(&self) -> Result<InformationLossDefault> {
        self.heights()?;
        InformationLossDefault::new(0.)
    }

    fn max_loss(&self) -> Result<InformationLossDefault> {
        let heights = self.heights()?;
        let generalizable = heights.iter().filter(|height| **height > 1).count();
        InformationLossDefault::new(match heights.len() {
            0 => 0.,
            total => generalizable as f64 / total as f64
        })
    }
}


#[cfg(test)]
mod test_precision {
    use crate::loss::InformationLoss;
    use crate::metrics::{Metric, MetricHeight, MetricPrecision};
    use crate::test_data::people;
    use crate::transformation::Transformation;

    #[test]
    fn relative_levels() {
        let (data, hierarchies) = people();
        let mut precision = MetricPrecision::new();
        precision.initialize(&data, &hierarchies).unwrap();
        // age has 3 levels, zip 4
        let loss = precision.evaluate(&Transformation::new(vec![1, 3]), None).unwrap();
        assert_eq!(loss.value(), (0.5 + 1.) / 2.);
        assert_eq!(precision.max_loss().unwrap().value(), 1.);

        let mut height = MetricHeight::new();
        height.initialize(&data, &hierarchies).unwrap();
        assert_eq!(height.evaluate(&Transformation::new(vec![1, 3]), None).unwrap().value(), 4.);
        assert_eq!(height.max_loss().unwrap().value(), 5.);
    }
}
