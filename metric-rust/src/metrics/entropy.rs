use kanon_framework::errors::*;

use kanon_framework::{Data, GeneralizationHierarchy};

use crate::groupify::Groupify;
use crate::loss::InformationLossDefault;
use crate::metrics::{check_hierarchies, not_initialized, Metric};
use crate::transformation::Transformation;

use ndarray::Array2;

/// Non-uniform entropy: the information lost when every value is replaced by its generalization.
///
/// Per column, a cardinality table `[code, level]` counts the rows whose value generalizes
/// to `code` at `level`. The contribution of a column at a level is memoized on first use.
#[derive(Clone, Debug, Default)]
pub struct MetricEntropy {
    state: Option<EntropyState>,
}

#[derive(Clone, Debug)]
struct EntropyState {
    hierarchies: Vec<GeneralizationHierarchy>,
    cardinalities: Vec<Array2<usize>>,
    cache: Vec<Vec<Option<f64>>>,
}

impl MetricEntropy {
    pub fn new() -> Self {
        MetricEntropy::default()
    }

    pub(crate) fn num_columns(&self) -> Result<usize> {
        Ok(self.state.as_ref().ok_or_else(|| not_initialized("entropy"))?.hierarchies.len())
    }

    /// Sum of the column contributions at the given levels.
    pub(crate) fn entropy(&mut self, levels: &[usize]) -> Result<f64> {
        let state = self.state.as_mut().ok_or_else(|| not_initialized("entropy"))?;
        let heights = state.hierarchies.iter().map(GeneralizationHierarchy::height).collect::<Vec<usize>>();
        Transformation::new(levels.to_vec()).check(&heights)?;

        Ok(levels.iter().enumerate()
            .map(|(column, level)| state.contribution(column, *level))
            .sum())
    }
}

impl EntropyState {
    fn build(data: &Data, hierarchies: &[GeneralizationHierarchy]) -> Result<EntropyState> {
        let heights = check_hierarchies(data, hierarchies)?;
        let matrix = data.matrix();

        let cardinalities = hierarchies.iter().enumerate()
            .map(|(column, hierarchy)| {
                let mut cardinality = Array2::<usize>::zeros((data.dictionary().num_codes(column), hierarchy.height()));
                for row in 0..matrix.num_rows() {
                    let code = matrix.get(row, column);
                    for level in 0..hierarchy.height() {
                        cardinality[[hierarchy.generalize(code, level) as usize, level]] += 1;
                    }
                }
                cardinality
            })
            .collect();

        Ok(EntropyState {
            hierarchies: hierarchies.to_vec(),
            cardinalities,
            cache: heights.iter().map(|height| vec![None; *height]).collect(),
        })
    }

    fn contribution(&mut self, column: usize, level: usize) -> f64 {
        if let Some(value) = self.cache[column][level] {
            return value;
        }

        let hierarchy = &self.hierarchies[column];
        let cardinality = &self.cardinalities[column];
        let sum = hierarchy.map().iter().enumerate()
            .map(|(code, rule)| {
                let input = cardinality[[code, 0]] as f64;
                if input == 0. {
                    return 0.;
                }
                let output = cardinality[[rule[level] as usize, level]] as f64;
                input * (input / output).log2()
            })
            .sum::<f64>();

        // the sum is never positive; report a positive loss
        let value = if sum == 0. { 0. } else { -sum };
        debug!("entropy of column {} at level {}: {}", column, level, value);
        self.cache[column][level] = Some(value);
        value
    }
}

impl Metric for MetricEntropy {
    type Loss = InformationLossDefault;

    fn name(&self) -> &str {
        "Non-uniform entropy"
    }

    fn is_monotonic(&self) -> bool {
        true
    }

    fn is_independent(&self) -> bool {
        true
    }

    fn initialize(&mut self, data: &Data, hierarchies: &[GeneralizationHierarchy]) -> Result<()> {
        self.state = Some(EntropyState::build(data, hierarchies)?);
        Ok(())
    }

    fn evaluate(&mut self, transformation: &Transformation, _groupify: Option<&dyn Groupify>) -> Result<InformationLossDefault> {
        InformationLossDefault::new(self.entropy(transformation.levels())?)
    }

    fn min_loss(&self) -> Result<InformationLossDefault> {
        self.state.as_ref().ok_or_else(|| not_initialized("entropy"))?;
        InformationLossDefault::new(0.)
    }

    fn max_loss(&self) -> Result<InformationLossDefault> {
        let state = self.state.as_ref().ok_or_else(|| not_initialized("entropy"))?;
        let top = state.hierarchies.iter().map(|hierarchy| hierarchy.height() - 1).collect::<Vec<usize>>();
        // evaluate on a copy so bounds can be queried through a shared reference
        let mut scratch = state.clone();
        InformationLossDefault::new(top.iter().enumerate()
            .map(|(column, level)| scratch.contribution(column, *level))
            .sum())
    }
}


#[cfg(test)]
mod test_entropy {
    use crate::loss::InformationLoss;
    use crate::metrics::{Metric, MetricEntropy};
    use crate::test_data::ages;
    use crate::transformation::Transformation;

    #[test]
    fn entropy_of_ages() {
        let (data, hierarchies) = ages(&["34", "36", "38", "38"]);
        let mut metric = MetricEntropy::new();
        metric.initialize(&data, &hierarchies).unwrap();

        assert_eq!(metric.evaluate(&Transformation::new(vec![0]), None).unwrap().value(), 0.);
        // 34 and 36 appear once, 38 twice, all in one decade of 4 rows
        let expected = -(2. * (1f64 / 4.).log2() + 2. * (2f64 / 4.).log2());
        let decade = metric.evaluate(&Transformation::new(vec![1]), None).unwrap().value();
        assert!((decade - expected).abs() < 1e-12);
        // cached
        assert_eq!(metric.evaluate(&Transformation::new(vec![1]), None).unwrap().value(), decade);
        assert_eq!(metric.max_loss().unwrap().value(), decade);
    }
}
