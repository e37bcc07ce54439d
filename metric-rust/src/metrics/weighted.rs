use kanon_framework::errors::*;

use kanon_framework::{Data, GeneralizationHierarchy};

use crate::groupify::Groupify;
use crate::loss::{InformationLoss, InformationLossDefault};
use crate::metrics::Metric;
use crate::transformation::Transformation;

type Constituent = Box<dyn Metric<Loss=InformationLossDefault>>;

/// Weighted sum of several metrics.
pub struct MetricWeighted {
    metrics: Vec<(f64, Constituent)>,
}

impl MetricWeighted {
    pub fn new(metrics: Vec<(f64, Constituent)>) -> Result<Self> {
        if metrics.is_empty() {
            return Err("a weighted metric needs at least one constituent".into());
        }
        if let Some((weight, metric)) = metrics.iter().find(|(weight, _)| !(*weight >= 0.) || weight.is_infinite()) {
            return Err(format!("invalid weight {} for metric {}", weight, metric.name()).into());
        }
        Ok(MetricWeighted { metrics })
    }

    fn fold(&self, bound: impl Fn(&Constituent) -> Result<InformationLossDefault>) -> Result<InformationLossDefault> {
        let mut sum = 0.;
        for (weight, metric) in &self.metrics {
            sum += weight * bound(metric)?.value();
        }
        InformationLossDefault::new(sum)
    }
}

impl Metric for MetricWeighted {
    type Loss = InformationLossDefault;

    fn name(&self) -> &str {
        "Weighted"
    }

    fn is_monotonic(&self) -> bool {
        self.metrics.iter().all(|(_, metric)| metric.is_monotonic())
    }

    fn is_independent(&self) -> bool {
        self.metrics.iter().all(|(_, metric)| metric.is_independent())
    }

    fn initialize(&mut self, data: &Data, hierarchies: &[GeneralizationHierarchy]) -> Result<()> {
        self.metrics.iter_mut().try_for_each(|(_, metric)| metric.initialize(data, hierarchies))
    }

    fn evaluate(&mut self, transformation: &Transformation, groupify: Option<&dyn Groupify>) -> Result<InformationLossDefault> {
        let mut sum = 0.;
        for (weight, metric) in self.metrics.iter_mut() {
            sum += *weight * metric.evaluate(transformation, groupify)?.value();
        }
        InformationLossDefault::new(sum)
    }

    fn min_loss(&self) -> Result<InformationLossDefault> {
        self.fold(|metric| metric.min_loss())
    }

    fn max_loss(&self) -> Result<InformationLossDefault> {
        self.fold(|metric| metric.max_loss())
    }
}


#[cfg(test)]
mod test_weighted {
    use crate::groupify::HashGroupify;
    use crate::loss::InformationLoss;
    use crate::metrics::{Metric, MetricDM, MetricDMStar, MetricHeight, MetricWeighted};
    use crate::test_data::ages;
    use crate::transformation::Transformation;

    #[test]
    fn weighted_sum() {
        let (data, hierarchies) = ages(&["34", "36", "38"]);
        let mut metric = MetricWeighted::new(vec![
            (2., Box::new(MetricHeight::new())),
            (0.5, Box::new(MetricDMStar::new())),
        ]).unwrap();
        metric.initialize(&data, &hierarchies).unwrap();
        assert!(metric.is_monotonic());
        assert!(!metric.is_independent());

        let transformation = Transformation::new(vec![1]);
        let groupify = HashGroupify::build(&data, &hierarchies, &transformation, 1).unwrap();
        assert_eq!(metric.evaluate(&transformation, Some(&groupify)).unwrap().value(), 2. * 1. + 0.5 * 9.);
        assert_eq!(metric.min_loss().unwrap().value(), 0.5 * 3.);
        assert_eq!(metric.max_loss().unwrap().value(), 2. * 2. + 0.5 * 9.);

        let with_dm = MetricWeighted::new(vec![(1., Box::new(MetricHeight::new())), (1., Box::new(MetricDM::new()))]).unwrap();
        assert!(!with_dm.is_monotonic());
        assert!(MetricWeighted::new(vec![(-1., Box::new(MetricHeight::new()))]).is_err());
        assert!(MetricWeighted::new(vec![]).is_err());
    }
}
