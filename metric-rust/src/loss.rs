//! Information-loss values and the best transformation seen by a search.

use kanon_framework::errors::*;

use crate::transformation::Transformation;

use indexmap::IndexMap;
use noisy_float::prelude::{n64, N64};
use std::cmp::Ordering;
use std::fmt::Debug;

/// An ordered score; lower means less distortion.
pub trait InformationLoss: Clone + Debug + PartialOrd {
    fn value(&self) -> f64;

    /// Merge `other` into `self`, keeping the larger value.
    fn max_with(&mut self, other: &Self);

    /// Merge `other` into `self`, keeping the smaller value.
    fn min_with(&mut self, other: &Self);

    /// Position of this loss between `min` and `max`, in `[0, 1]`.
    fn relative_to(&self, min: &Self, max: &Self) -> f64 {
        let range = max.value() - min.value();
        if range <= 0. {
            return 0.;
        }
        ((self.value() - min.value()) / range).max(0.).min(1.)
    }
}

fn checked(value: f64) -> Result<N64> {
    if value.is_nan() {
        return Err("information loss must be a number".into());
    }
    Ok(n64(value))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct InformationLossDefault {
    value: N64,
}

impl InformationLossDefault {
    pub fn new(value: f64) -> Result<Self> {
        Ok(InformationLossDefault { value: checked(value)? })
    }
}

impl InformationLoss for InformationLossDefault {
    fn value(&self) -> f64 {
        self.value.raw()
    }

    fn max_with(&mut self, other: &Self) {
        self.value = self.value.max(other.value);
    }

    fn min_with(&mut self, other: &Self) {
        self.value = self.value.min(other.value);
    }
}

/// The loss of a main metric, along with the losses of every metric it was combined with.
///
/// Ordering and equality consider the main value only.
#[derive(Clone, Debug)]
pub struct InformationLossCombined {
    value: N64,
    losses: IndexMap<String, N64>,
}

impl InformationLossCombined {
    pub fn new(value: f64, losses: &IndexMap<String, f64>) -> Result<Self> {
        Ok(InformationLossCombined {
            value: checked(value)?,
            losses: losses.iter()
                .map(|(name, loss)| Ok((name.clone(), checked(*loss)?)))
                .collect::<Result<IndexMap<String, N64>>>()?,
        })
    }

    pub fn loss(&self, metric: &str) -> Option<f64> {
        self.losses.get(metric).map(|loss| loss.raw())
    }

    pub fn losses(&self) -> impl Iterator<Item=(&str, f64)> + '_ {
        self.losses.iter().map(|(name, loss)| (name.as_str(), loss.raw()))
    }

    fn merge(&mut self, other: &Self, keep: fn(N64, N64) -> N64) {
        self.value = keep(self.value, other.value);
        for (name, loss) in &other.losses {
            self.losses.entry(name.clone())
                .and_modify(|current| *current = keep(*current, *loss))
                .or_insert(*loss);
        }
    }
}

impl PartialEq for InformationLossCombined {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl PartialOrd for InformationLossCombined {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.value.cmp(&other.value))
    }
}

impl InformationLoss for InformationLossCombined {
    fn value(&self) -> f64 {
        self.value.raw()
    }

    fn max_with(&mut self, other: &Self) {
        self.merge(other, N64::max)
    }

    fn min_with(&mut self, other: &Self) {
        self.merge(other, N64::min)
    }
}

/// Best transformation offered so far, kept by the caller of a metric.
#[derive(Clone, Debug)]
pub struct GlobalOptimum<L> {
    best: Option<(Transformation, L)>,
}

impl<L: InformationLoss> GlobalOptimum<L> {
    pub fn new() -> Self {
        GlobalOptimum { best: None }
    }

    /// Record `loss` if it beats the current optimum. Ties keep the earlier transformation.
    pub fn offer(&mut self, transformation: &Transformation, loss: &L) -> bool {
        let better = match &self.best {
            Some((_, best)) => loss < best,
            None => true
        };
        if better {
            self.best = Some((transformation.clone(), loss.clone()));
        }
        better
    }

    pub fn transformation(&self) -> Option<&Transformation> {
        self.best.as_ref().map(|(transformation, _)| transformation)
    }

    pub fn loss(&self) -> Option<&L> {
        self.best.as_ref().map(|(_, loss)| loss)
    }

    pub fn reset(&mut self) {
        self.best = None;
    }
}

impl<L: InformationLoss> Default for GlobalOptimum<L> {
    fn default() -> Self {
        GlobalOptimum::new()
    }
}
