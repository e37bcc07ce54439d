//! Microaggregation: aggregate functions and the classification of aggregated attributes.

use crate::errors::*;

use crate::base::{AggregateKind, DataDefinition, DataType};
use crate::data::Data;
use crate::utilities::check_disjoint;

use indexmap::IndexSet;
use itertools::Itertools;

/// Summarizes the values of one attribute within an equivalence class.
///
/// The function must be initialized with the dictionary mapping of its column before use.
/// Initialization caches the rank of every code, so each projected or subset manager
/// needs its own copy; `Clone` is a deep copy.
#[derive(Clone, Debug)]
pub struct AggregateFunction {
    kind: AggregateKind,
    ignore_missing: bool,
    data_type: DataType,
    mapping: Vec<String>,
    ranks: Vec<usize>,
    initialized: bool,
}

impl AggregateFunction {
    pub fn new(kind: AggregateKind, ignore_missing: bool) -> Self {
        AggregateFunction {
            kind,
            ignore_missing,
            data_type: DataType::String,
            mapping: Vec::new(),
            ranks: Vec::new(),
            initialized: false,
        }
    }

    pub fn kind(&self) -> AggregateKind {
        self.kind
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Bind the function to the values of its column.
    pub fn initialize(&mut self, mapping: &[String], data_type: DataType) -> Result<()> {
        match self.kind {
            AggregateKind::ArithmeticMean | AggregateKind::GeometricMean if !data_type.is_numeric() =>
                return Err(format!("{:?} requires a numeric data type, found {:?}", self.kind, data_type).into()),
            _ => ()
        }

        let ranks = data_type.ranks(mapping)?;

        self.mapping = mapping.to_vec();
        self.ranks = ranks;
        self.data_type = data_type;
        self.initialized = true;
        Ok(())
    }

    /// Aggregate a distribution of `(code, count)` pairs into a single value.
    pub fn aggregate(&self, distribution: &[(u32, usize)]) -> Result<String> {
        if !self.is_initialized() {
            return Err("aggregate function must be initialized before use".into());
        }

        let mut entries = distribution.iter()
            .filter(|(_, count)| *count > 0)
            .map(|(code, count)| Ok((self.value(*code)?, *count, self.ranks[*code as usize])))
            .collect::<Result<Vec<(&str, usize, usize)>>>()?;
        if self.ignore_missing {
            entries.retain(|(value, _, _)| !DataType::is_missing(value));
        }
        if entries.is_empty() {
            return Ok("NULL".to_string());
        }
        entries.sort_by_key(|(_, _, rank)| *rank);

        let total = entries.iter().map(|(_, count, _)| count).sum::<usize>();

        Ok(match self.kind {
            AggregateKind::Mode => entries.iter()
                // ties resolve to the smallest value
                .fold(None, |best: Option<&(&str, usize, usize)>, entry| match best {
                    Some(best) if best.1 >= entry.1 => Some(best),
                    _ => Some(entry)
                })
                .map(|(value, _, _)| value.to_string())
                .unwrap_or_default(),
            AggregateKind::Median => {
                let position = (total - 1) / 2;
                let mut seen = 0;
                entries.iter()
                    .find(|(_, count, _)| {
                        seen += count;
                        seen > position
                    })
                    .map(|(value, _, _)| value.to_string())
                    .unwrap_or_default()
            }
            AggregateKind::Interval => match (entries.first(), entries.last()) {
                (Some(first), Some(last)) => format!("[{}, {}]", first.0, last.0),
                _ => "NULL".to_string()
            },
            AggregateKind::Set => format!("{{{}}}", entries.iter().map(|(value, _, _)| value).join(", ")),
            AggregateKind::ArithmeticMean => {
                let sum = entries.iter()
                    .map(|(value, count, _)| Ok(self.data_type.to_number(value)?.raw() * *count as f64))
                    .collect::<Result<Vec<f64>>>()?
                    .into_iter().sum::<f64>();
                format!("{}", sum / total as f64)
            }
            AggregateKind::GeometricMean => {
                let log_sum = entries.iter()
                    .map(|(value, count, _)| {
                        let number = self.data_type.to_number(value)?.raw();
                        if number <= 0. {
                            return Err(format!("geometric mean is undefined for non-positive value {}", value).into());
                        }
                        Ok(number.ln() * *count as f64)
                    })
                    .collect::<Result<Vec<f64>>>()?
                    .into_iter().sum::<f64>();
                format!("{}", (log_sum / total as f64).exp())
            }
        })
    }

    fn value(&self, code: u32) -> Result<&str> {
        self.mapping.get(code as usize)
            .map(String::as_str)
            .ok_or_else(|| format!("code {} is outside of the aggregated domain", code).into())
    }
}

/// Parallel arrays describing one group of aggregated columns.
#[derive(Clone, Debug, Default)]
pub struct AggregatedColumns {
    pub columns: Vec<usize>,
    pub attributes: Vec<String>,
    pub functions: Vec<AggregateFunction>,
    pub domain_sizes: Vec<usize>,
}

impl AggregatedColumns {
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    fn push(&mut self, column: usize, attribute: &str, function: AggregateFunction, domain_size: usize) {
        self.columns.push(column);
        self.attributes.push(attribute.to_string());
        self.functions.push(function);
        self.domain_sizes.push(domain_size);
    }
}

/// Which columns of the analyzed data are microaggregated, and when.
///
/// Hot columns are aggregated for every transformation visited by the search,
/// cold columns only once for the final result. All hot columns precede all cold columns;
/// `hot_threshold` is the index of the first cold column.
#[derive(Clone, Debug)]
pub struct DataAggregationInformation {
    header: Vec<String>,
    hot_qis_not_generalized: AggregatedColumns,
    hot_qis_generalized: AggregatedColumns,
    cold_qis: AggregatedColumns,
    hot_threshold: usize,
}

impl DataAggregationInformation {
    pub fn new(
        data: &Data,
        hot_qis_not_generalized: &IndexSet<String>,
        hot_qis_generalized: &IndexSet<String>,
        cold_qis: &IndexSet<String>,
        definition: &DataDefinition,
    ) -> Result<DataAggregationInformation> {
        check_disjoint(&[
            ("hot not generalized", hot_qis_not_generalized),
            ("hot generalized", hot_qis_generalized),
            ("cold", cold_qis),
        ]).chain_err(|| "aggregation roles must be mutually exclusive")?;

        if let Some(missing) = hot_qis_not_generalized.iter()
            .chain(hot_qis_generalized.iter())
            .chain(cold_qis.iter())
            .find(|attribute| data.index_of(attribute).is_none()) {
            return Err(format!("aggregated attribute '{}' is not part of the analyzed data", missing).into());
        }

        let mut information = DataAggregationInformation {
            header: data.header().to_vec(),
            hot_qis_not_generalized: AggregatedColumns::default(),
            hot_qis_generalized: AggregatedColumns::default(),
            cold_qis: AggregatedColumns::default(),
            hot_threshold: data.num_columns(),
        };

        let mut first_cold = None;
        for (column, attribute) in data.header().iter().enumerate() {
            let target = if hot_qis_not_generalized.contains(attribute) {
                &mut information.hot_qis_not_generalized
            } else if hot_qis_generalized.contains(attribute) {
                &mut information.hot_qis_generalized
            } else if cold_qis.contains(attribute) {
                first_cold.get_or_insert(column);
                &mut information.cold_qis
            } else {
                continue;
            };

            if let Some(first_cold) = first_cold {
                if column > first_cold && !cold_qis.contains(attribute) {
                    return Err(format!("hot attribute '{}' is placed after the first cold attribute", attribute).into());
                }
            }

            let microaggregation = definition.microaggregation(attribute)
                .ok_or_else(|| Error::from(format!("no aggregate function is defined for attribute '{}'", attribute)))?;
            let mut function = AggregateFunction::new(microaggregation.function, microaggregation.ignore_missing);
            function.initialize(data.dictionary().mapping(column)?, definition.data_type(attribute))
                .chain_err(|| format!("while initializing the aggregate function of attribute '{}'", attribute))?;

            target.push(column, attribute, function, data.dictionary().num_codes(column));
        }

        if let Some(first_cold) = first_cold {
            information.hot_threshold = first_cold;
        }
        Ok(information)
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    pub fn hot_qis_not_generalized(&self) -> &AggregatedColumns {
        &self.hot_qis_not_generalized
    }

    pub fn hot_qis_generalized(&self) -> &AggregatedColumns {
        &self.hot_qis_generalized
    }

    pub fn cold_qis(&self) -> &AggregatedColumns {
        &self.cold_qis
    }

    /// Index of the first cold column, or the number of columns if there is none.
    pub fn hot_threshold(&self) -> usize {
        self.hot_threshold
    }

    /// Columns aggregated during the search.
    pub fn hot_columns(&self) -> Vec<usize> {
        self.hot_qis_not_generalized.columns.iter()
            .chain(self.hot_qis_generalized.columns.iter())
            .cloned().sorted().collect()
    }
}


#[cfg(test)]
mod test_aggregation {
    use crate::aggregation::{AggregateFunction, DataAggregationInformation};
    use crate::attributes;
    use crate::base::{AggregateKind, AttributeDefinition, DataDefinition, DataType};
    use crate::data::Data;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    fn function(kind: AggregateKind, values: &[&str], data_type: DataType) -> AggregateFunction {
        let mut function = AggregateFunction::new(kind, true);
        function.initialize(&strings(values), data_type).unwrap();
        function
    }

    #[test]
    fn aggregates() {
        let values = ["10", "2", "30", "NULL"];
        let distribution = [(0, 1), (1, 2), (2, 1), (3, 5)];

        let mode = function(AggregateKind::Mode, &values, DataType::Integer);
        assert_eq!(mode.aggregate(&distribution).unwrap(), "2");
        let median = function(AggregateKind::Median, &values, DataType::Integer);
        assert_eq!(median.aggregate(&distribution).unwrap(), "2");
        assert_eq!(median.aggregate(&[(0, 1), (1, 1), (2, 1)]).unwrap(), "10");
        let interval = function(AggregateKind::Interval, &values, DataType::Integer);
        assert_eq!(interval.aggregate(&distribution).unwrap(), "[2, 30]");
        let set = function(AggregateKind::Set, &values, DataType::Integer);
        assert_eq!(set.aggregate(&distribution).unwrap(), "{2, 10, 30}");
        let mean = function(AggregateKind::ArithmeticMean, &values, DataType::Integer);
        assert_eq!(mean.aggregate(&distribution).unwrap(), "11");
        let geometric = function(AggregateKind::GeometricMean, &values, DataType::Integer);
        let root = geometric.aggregate(&[(1, 1), (0, 1), (2, 0)]).unwrap().parse::<f64>().unwrap();
        assert!((root - 20f64.sqrt()).abs() < 1e-9);
        assert_eq!(mode.aggregate(&[(3, 4)]).unwrap(), "NULL");
    }

    #[test]
    fn invalid_functions() {
        let mut mean = AggregateFunction::new(AggregateKind::ArithmeticMean, true);
        assert!(mean.aggregate(&[(0, 1)]).is_err());
        assert!(mean.initialize(&strings(&["a"]), DataType::String).is_err());
        let mut mode = AggregateFunction::new(AggregateKind::Mode, true);
        assert!(mode.initialize(&strings(&["1", "x"]), DataType::Integer).is_err());
    }

    fn analyzed() -> Data {
        Data::encode(
            &strings(&["disease", "income", "zip", "weight"]),
            &[strings(&["flu", "10", "4711", "70"]), strings(&["cold", "20", "4712", "80"])]).unwrap()
    }

    fn definition() -> DataDefinition {
        let mut definition = DataDefinition::new();
        definition
            .define("disease", AttributeDefinition::sensitive())
            .define("income", AttributeDefinition::quasi_identifying(vec![])
                .with_data_type(DataType::Integer)
                .with_microaggregation(AggregateKind::ArithmeticMean, false))
            .define("zip", AttributeDefinition::quasi_identifying(vec![])
                .with_microaggregation(AggregateKind::Mode, true))
            .define("weight", AttributeDefinition::quasi_identifying(vec![])
                .with_data_type(DataType::Integer)
                .with_microaggregation(AggregateKind::Median, false));
        definition
    }

    #[test]
    fn classification() {
        let information = DataAggregationInformation::new(
            &analyzed(), &attributes!["income"], &attributes!["zip"], &attributes!["weight"], &definition()).unwrap();
        assert_eq!(information.hot_qis_not_generalized().columns, vec![1]);
        assert_eq!(information.hot_qis_generalized().columns, vec![2]);
        assert_eq!(information.cold_qis().columns, vec![3]);
        assert_eq!(information.cold_qis().domain_sizes, vec![2]);
        assert_eq!(information.hot_threshold(), 3);
        assert_eq!(information.hot_columns(), vec![1, 2]);

        let clone = information.clone();
        assert_eq!(clone.hot_qis_not_generalized().functions[0].aggregate(&[(0, 1), (1, 1)]).unwrap(), "15");

        let no_cold = DataAggregationInformation::new(
            &analyzed(), &attributes!["income"], &attributes![], &attributes![], &definition()).unwrap();
        assert_eq!(no_cold.hot_threshold(), 4);
    }

    #[test]
    fn roles_must_be_exclusive_and_ordered() {
        let overlapping = DataAggregationInformation::new(
            &analyzed(), &attributes!["income"], &attributes!["income"], &attributes![], &definition());
        assert!(overlapping.is_err());

        let misplaced = DataAggregationInformation::new(
            &analyzed(), &attributes![], &attributes!["weight"], &attributes!["income"], &definition());
        assert!(misplaced.is_err());

        let unknown = DataAggregationInformation::new(
            &analyzed(), &attributes!["salary"], &attributes![], &attributes![], &definition());
        assert!(unknown.is_err());
    }
}
