use kanon_framework::errors::*;

use kanon_framework::{Data, GeneralizationHierarchy};

use crate::groupify::Groupify;
use crate::loss::{InformationLoss, InformationLossCombined, InformationLossDefault};
use crate::metrics::Metric;
use crate::transformation::Transformation;

use indexmap::{IndexMap, IndexSet};

type Constituent = Box<dyn Metric<Loss=InformationLossDefault>>;

/// Orders by a main metric and reports the losses of further metrics alongside.
pub struct MetricCombined {
    main: Constituent,
    others: Vec<Constituent>,
}

impl MetricCombined {
    pub fn new(main: Constituent, others: Vec<Constituent>) -> Result<Self> {
        let mut names = IndexSet::new();
        let duplicate = others.iter()
            .map(|metric| metric.name().to_string())
            .find(|name| !names.insert(name.clone()));
        if let Some(duplicate) = duplicate {
            return Err(format!("metric {} is combined more than once", duplicate).into());
        }
        Ok(MetricCombined { main, others })
    }

    fn combine(&self, main: InformationLossDefault, others: Vec<InformationLossDefault>) -> Result<InformationLossCombined> {
        let losses = self.others.iter().zip(others)
            .map(|(metric, loss)| (metric.name().to_string(), loss.value()))
            .collect::<IndexMap<String, f64>>();
        InformationLossCombined::new(main.value(), &losses)
    }
}

impl Metric for MetricCombined {
    type Loss = InformationLossCombined;

    fn name(&self) -> &str {
        "Combined"
    }

    fn is_monotonic(&self) -> bool {
        self.main.is_monotonic() && self.others.iter().all(|metric| metric.is_monotonic())
    }

    fn is_independent(&self) -> bool {
        self.main.is_independent() && self.others.iter().all(|metric| metric.is_independent())
    }

    fn initialize(&mut self, data: &Data, hierarchies: &[GeneralizationHierarchy]) -> Result<()> {
        self.main.initialize(data, hierarchies)?;
        self.others.iter_mut().try_for_each(|metric| metric.initialize(data, hierarchies))
    }

    fn evaluate(&mut self, transformation: &Transformation, groupify: Option<&dyn Groupify>) -> Result<InformationLossCombined> {
        let main = self.main.evaluate(transformation, groupify)?;
        let others = self.others.iter_mut()
            .map(|metric| metric.evaluate(transformation, groupify))
            .collect::<Result<Vec<InformationLossDefault>>>()?;
        self.combine(main, others)
    }

    fn min_loss(&self) -> Result<InformationLossCombined> {
        let others = self.others.iter().map(|metric| metric.min_loss()).collect::<Result<Vec<_>>>()?;
        self.combine(self.main.min_loss()?, others)
    }

    fn max_loss(&self) -> Result<InformationLossCombined> {
        let others = self.others.iter().map(|metric| metric.max_loss()).collect::<Result<Vec<_>>>()?;
        self.combine(self.main.max_loss()?, others)
    }
}
