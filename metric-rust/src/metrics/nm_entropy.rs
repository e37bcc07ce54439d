use kanon_framework::errors::*;

use kanon_framework::{Data, GeneralizationHierarchy};

use crate::groupify::Groupify;
use crate::loss::{InformationLoss, InformationLossDefault};
use crate::metrics::{requires_groupify, Metric, MetricEntropy};
use crate::transformation::Transformation;

use std::collections::HashMap;

/// Non-uniform entropy that also charges for suppressed rows.
///
/// The penalty is the entropy of the suppressed rows' generalized values, per column.
#[derive(Clone, Debug, Default)]
pub struct MetricNMEntropy {
    entropy: MetricEntropy,
    rows: usize,
}

impl MetricNMEntropy {
    pub fn new() -> Self {
        MetricNMEntropy::default()
    }
}

impl Metric for MetricNMEntropy {
    type Loss = InformationLossDefault;

    fn name(&self) -> &str {
        "Non-monotonic non-uniform entropy"
    }

    fn is_monotonic(&self) -> bool {
        false
    }

    fn is_independent(&self) -> bool {
        false
    }

    fn initialize(&mut self, data: &Data, hierarchies: &[GeneralizationHierarchy]) -> Result<()> {
        self.entropy.initialize(data, hierarchies)?;
        self.rows = data.num_rows();
        Ok(())
    }

    fn evaluate(&mut self, transformation: &Transformation, groupify: Option<&dyn Groupify>) -> Result<InformationLossDefault> {
        let groupify = requires_groupify(self.name(), groupify)?;
        let entropy = self.entropy.entropy(transformation.levels())?;

        let mut counts = vec![HashMap::<u32, usize>::new(); transformation.len()];
        let mut suppressed = 0;
        for entry in groupify.entries().iter().filter(|entry| entry.is_outlier && entry.count > 0) {
            suppressed += entry.count;
            for (column, code) in entry.key.iter().enumerate() {
                *counts[column].entry(*code).or_insert(0) += entry.count;
            }
        }

        let penalty = if suppressed == 0 {
            0.
        } else {
            let suppressed = suppressed as f64;
            counts.iter()
                .flat_map(|column| column.values())
                .map(|count| {
                    let count = *count as f64;
                    count * (count / suppressed).log2()
                })
                .sum::<f64>()
        };

        InformationLossDefault::new(entropy - penalty)
    }

    fn min_loss(&self) -> Result<InformationLossDefault> {
        self.entropy.min_loss()
    }

    /// Entropy at the top of every hierarchy plus the penalty for suppressing all rows
    /// with distinct values in every column.
    fn max_loss(&self) -> Result<InformationLossDefault> {
        let top = self.entropy.max_loss()?;
        let rows = self.rows as f64;
        let columns = self.entropy.num_columns()? as f64;
        let penalty = if rows > 0. { columns * rows * rows.log2() } else { 0. };
        InformationLossDefault::new(top.value() + penalty)
    }
}
