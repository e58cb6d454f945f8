//! Spacing system inference from component style bags.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::component::DetectedComponent;

pub const SPACING_PROPERTIES: &[&str] = &[
    "gap",
    "row-gap",
    "column-gap",
    "padding",
    "padding-top",
    "padding-right",
    "padding-bottom",
    "padding-left",
    "margin",
    "margin-top",
    "margin-right",
    "margin-bottom",
    "margin-left",
];

/// Tunables for spacing inference. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpacingSettings {
    pub candidate_units: Vec<u32>,
    pub multipliers: Vec<f64>,
    pub default_unit: u32,
    pub min_samples: usize,
    pub max_scale_entries: usize,
}

impl Default for SpacingSettings {
    fn default() -> Self {
        Self {
            candidate_units: vec![4, 5, 6, 8, 10, 12],
            multipliers: vec![0.5, 1.0, 1.5, 2.0, 3.0, 4.0, 6.0, 8.0, 12.0, 16.0],
            default_unit: 8,
            min_samples: 3,
            max_scale_entries: 12,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpacingSystem {
    pub base_unit: u32,
    pub scale: Vec<u32>,
    /// Raw value -> occurrences
    pub gap_values: BTreeMap<String, usize>,
    pub padding_values: BTreeMap<String, usize>,
    pub margin_values: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, Default)]
pub struct SpacingSystemDetector {
    settings: SpacingSettings,
}

impl SpacingSystemDetector {
    pub fn new(settings: SpacingSettings) -> Self {
        Self { settings }
    }

    pub fn detect<'a>(&self, components: impl IntoIterator<Item = &'a DetectedComponent>) -> SpacingSystem {
        let mut system = SpacingSystem::default();
        let mut samples = Vec::new();

        for component in components {
            for property in SPACING_PROPERTIES {
                let Some(value) = component.visual.style(property) else {
                    continue;
                };
                let table = if property.contains("gap") {
                    &mut system.gap_values
                } else if property.starts_with("padding") {
                    &mut system.padding_values
                } else {
                    &mut system.margin_values
                };
                *table.entry(value.to_string()).or_default() += 1;
                samples.extend(px_tokens(value));
            }
        }

        system.base_unit = self.base_unit(&samples);
        system.scale = self.scale(system.base_unit, &samples);
        system
    }

    /// Candidate unit dividing the most samples; larger unit wins ties.
    pub fn base_unit(&self, samples: &[f64]) -> u32 {
        let usable: Vec<u32> = samples
            .iter()
            .map(|v| v.round())
            .filter(|v| *v > 0.0 && *v <= 200.0)
            .map(|v| v as u32)
            .collect();
        if usable.len() < self.settings.min_samples {
            return self.settings.default_unit;
        }

        let mut best = (self.settings.default_unit, 0usize);
        for &unit in &self.settings.candidate_units {
            if unit == 0 {
                continue;
            }
            let divisors = usable.iter().filter(|v| *v % unit == 0).count();
            if divisors > best.1 || (divisors == best.1 && unit > best.0) {
                best = (unit, divisors);
            }
        }
        best.0
    }

    pub fn scale(&self, base_unit: u32, samples: &[f64]) -> Vec<u32> {
        let base = base_unit as f64;
        let observed: Vec<f64> = samples
            .iter()
            .map(|v| v.round())
            .filter(|v| *v > 0.0 && *v <= 200.0)
            .collect();

        let mut scale: Vec<u32> = Vec::new();
        for multiplier in &self.settings.multipliers {
            let target = base * multiplier;
            let closest = observed
                .iter()
                .copied()
                .filter(|v| (v - target).abs() <= base / 2.0)
                .min_by(|a, b| (a - target).abs().total_cmp(&(b - target).abs()));
            match closest {
                Some(value) => scale.push(value as u32),
                None if (2.0..=128.0).contains(&target) => scale.push(target.round() as u32),
                None => {}
            }
        }
        scale.sort_unstable();
        scale.dedup();
        scale.truncate(self.settings.max_scale_entries);
        scale
    }
}

/// Every `px` token in a (possibly shorthand) value.
fn px_tokens(value: &str) -> impl Iterator<Item = f64> + '_ {
    value
        .split_whitespace()
        .filter_map(|token| token.strip_suffix("px"))
        .filter_map(|n| n.parse::<f64>().ok())
        .filter(|n| n.is_finite())
}
