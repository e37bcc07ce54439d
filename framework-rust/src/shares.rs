//! Domain shares: the fraction of an attribute's domain covered by a (generalized) value.

use crate::errors::*;

use crate::base::HierarchyOrigin;
use crate::dictionary::Dictionary;
use crate::hierarchy::GeneralizationHierarchy;

use std::collections::{HashMap, HashSet};
use std::fmt::Debug;

pub trait DomainShare: Debug {
    /// Share of the domain covered by `code`, found at `level` of the hierarchy.
    fn share(&self, code: u32, level: usize) -> f64;

    /// Number of leaf values in the domain.
    fn domain_size(&self) -> f64;
}

/// Build the domain share of a hierarchy according to how the hierarchy was produced.
pub fn domain_share(
    origin: &HierarchyOrigin,
    hierarchy: &GeneralizationHierarchy,
    rules: &[Vec<String>],
    dictionary: &Dictionary,
) -> Result<Box<dyn DomainShare>> {
    Ok(match origin {
        HierarchyOrigin::Materialized =>
            Box::new(DomainShareMaterialized::new(hierarchy, rules, dictionary)),
        HierarchyOrigin::Interval { lower, upper } =>
            Box::new(DomainShareInterval::new(hierarchy, dictionary, *lower, *upper)?),
        HierarchyOrigin::Redaction { alphabet_size, max_length, redaction_character } =>
            Box::new(DomainShareRedaction::new(
                hierarchy, dictionary, *alphabet_size, *max_length, *redaction_character)?),
    })
}

fn codes_per_level(hierarchy: &GeneralizationHierarchy) -> Vec<(u32, usize)> {
    (0..hierarchy.height())
        .flat_map(|level| hierarchy.distinct_values(level).into_iter().map(move |code| (code, level)))
        .collect()
}

/// Shares counted from the leaves of an explicit hierarchy table.
#[derive(Debug)]
pub struct DomainShareMaterialized {
    shares: HashMap<u32, f64>,
    size: f64,
}

impl DomainShareMaterialized {
    pub fn new(hierarchy: &GeneralizationHierarchy, rules: &[Vec<String>], dictionary: &Dictionary) -> Self {
        let size = rules.len() as f64;

        let mut leaves = HashMap::<&str, HashSet<&str>>::new();
        for rule in rules {
            let leaf = match rule.first() {
                Some(leaf) => leaf.as_str(),
                None => continue
            };
            rule.iter().for_each(|value| { leaves.entry(value.as_str()).or_default().insert(leaf); });
        }

        let shares = codes_per_level(hierarchy).into_iter()
            .filter_map(|(code, _)| {
                let value = dictionary.value(hierarchy.dimension(), code)?;
                Some((code, leaves.get(value).map_or(1, HashSet::len) as f64 / size))
            })
            .collect();

        DomainShareMaterialized { shares, size }
    }
}

impl DomainShare for DomainShareMaterialized {
    fn share(&self, code: u32, _level: usize) -> f64 {
        self.shares.get(&code).cloned().unwrap_or(1. / self.size)
    }

    fn domain_size(&self) -> f64 {
        self.size
    }
}

/// Shares of intervals labelled `[lower, upper[`, relative to the range of the builder.
#[derive(Debug)]
pub struct DomainShareInterval {
    shares: HashMap<u32, f64>,
    size: f64,
}

impl DomainShareInterval {
    pub fn new(hierarchy: &GeneralizationHierarchy, dictionary: &Dictionary, lower: f64, upper: f64) -> Result<Self> {
        if !(upper > lower) {
            return Err(format!("interval hierarchy for attribute '{}' has an empty range", hierarchy.attribute()).into());
        }
        let size = hierarchy.distinct_value_counts().first().cloned().unwrap_or(1).max(1) as f64;

        let shares = codes_per_level(hierarchy).into_iter()
            .filter(|(_, level)| *level > 0)
            .map(|(code, _)| {
                let share = dictionary.value(hierarchy.dimension(), code)
                    .and_then(parse_interval)
                    .map_or(1., |(low, high)| ((high - low) / (upper - lower)).max(0.).min(1.));
                (code, share)
            })
            .collect();

        Ok(DomainShareInterval { shares, size })
    }
}

/// Bounds of a label such as `[10, 20[` or `[10, 20]`.
fn parse_interval(label: &str) -> Option<(f64, f64)> {
    let inner = label.trim().strip_prefix('[')?;
    let inner = inner.strip_suffix('[').or_else(|| inner.strip_suffix(']'))?;
    let mut bounds = inner.split(',').map(|bound| bound.trim().parse::<f64>());
    match (bounds.next(), bounds.next(), bounds.next()) {
        (Some(Ok(low)), Some(Ok(high)), None) if high >= low => Some((low, high)),
        _ => None
    }
}

impl DomainShare for DomainShareInterval {
    fn share(&self, code: u32, level: usize) -> f64 {
        if level == 0 {
            return 1. / self.size;
        }
        self.shares.get(&code).cloned().unwrap_or(1.)
    }

    fn domain_size(&self) -> f64 {
        self.size
    }
}

/// Shares of values redacted character by character.
#[derive(Debug)]
pub struct DomainShareRedaction {
    redacted: HashMap<u32, usize>,
    alphabet_size: f64,
    max_length: usize,
}

impl DomainShareRedaction {
    pub fn new(
        hierarchy: &GeneralizationHierarchy,
        dictionary: &Dictionary,
        alphabet_size: usize,
        max_length: usize,
        redaction_character: char,
    ) -> Result<Self> {
        if alphabet_size == 0 || max_length == 0 {
            return Err(format!("redaction hierarchy for attribute '{}' has an empty domain", hierarchy.attribute()).into());
        }
        let redacted = codes_per_level(hierarchy).into_iter()
            .filter_map(|(code, _)| {
                let value = dictionary.value(hierarchy.dimension(), code)?;
                let count = value.chars().filter(|c| *c == redaction_character).count();
                Some((code, count.min(max_length)))
            })
            .collect();

        Ok(DomainShareRedaction { redacted, alphabet_size: alphabet_size as f64, max_length })
    }
}

impl DomainShare for DomainShareRedaction {
    fn share(&self, code: u32, level: usize) -> f64 {
        let redacted = self.redacted.get(&code).cloned().unwrap_or(level.min(self.max_length));
        self.alphabet_size.powi(redacted as i32) / self.domain_size()
    }

    fn domain_size(&self) -> f64 {
        self.alphabet_size.powi(self.max_length as i32)
    }
}
