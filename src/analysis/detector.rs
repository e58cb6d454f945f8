//! Rule-based component detection with duplicate suppression.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::debug;

use super::component::DetectedComponent;
use super::fingerprint::FingerprintGenerator;
use super::rules::RuleCatalog;
use crate::dom::{DomElement, DomTree};
use crate::types::{BoundingBox, StyleMap, VisualProperties};

/// Tags that never render as components.
pub const NON_VISUAL_TAGS: &[&str] = &[
    "html", "head", "title", "meta", "link", "script", "style", "noscript", "template", "br",
    "wbr", "base",
];

/// Which side of an ancestor/descendant pair survives when their
/// confidences are equal and their types differ.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContainmentTieBreak {
    /// Equal confidence removes the ancestor
    #[default]
    PreferDescendant,
    /// Equal confidence keeps both; only a strictly more confident
    /// descendant removes the ancestor
    PreferAncestor,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    pub confidence_threshold: f64,
    pub min_width: f64,
    pub min_height: f64,
    /// Boxes larger than this in both dimensions are page containers
    pub max_width: f64,
    pub max_height: f64,
    /// Intersection share of the smaller box that counts as overlap
    pub overlap_ratio: f64,
    pub tie_break: ContainmentTieBreak,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.65,
            min_width: 20.0,
            min_height: 20.0,
            max_width: 1900.0,
            max_height: 1000.0,
            overlap_ratio: 0.8,
            tie_break: ContainmentTieBreak::PreferDescendant,
        }
    }
}

pub struct ComponentTypeDetector<'a> {
    catalog: &'a RuleCatalog,
    config: DetectorConfig,
    fingerprints: FingerprintGenerator,
}

impl<'a> ComponentTypeDetector<'a> {
    pub fn new(catalog: &'a RuleCatalog, config: DetectorConfig) -> Self {
        Self {
            catalog,
            config,
            fingerprints: FingerprintGenerator::default(),
        }
    }

    /// Classify every visually significant element and drop duplicates.
    ///
    /// Elements without a measured box are skipped; elements without styles
    /// get an empty style bag. The result is in document order but callers
    /// should treat it as a set.
    pub fn detect(
        &self,
        tree: &DomTree,
        styles: &HashMap<usize, StyleMap>,
        boxes: &HashMap<usize, BoundingBox>,
    ) -> Vec<DetectedComponent> {
        let mut candidates = Vec::new();

        for element in tree.elements() {
            let Some(bounds) = boxes.get(&element.index) else {
                continue;
            };
            if !self.is_candidate(element, bounds) {
                continue;
            }
            let Some(fingerprint) = self.fingerprints.generate(tree, element.index) else {
                continue;
            };
            let visual = VisualProperties::new(
                *bounds,
                styles.get(&element.index).cloned().unwrap_or_default(),
            );

            let Some((component_type, score)) = self.catalog.best_match(&fingerprint, &visual)
            else {
                continue;
            };
            if score < self.config.confidence_threshold {
                continue;
            }
            candidates.push(DetectedComponent::new(
                component_type,
                score,
                fingerprint,
                visual,
                element.index,
                element.outer_html.clone(),
            ));
        }

        let found = candidates.len();
        let survivors = suppress_duplicates(tree, candidates, &self.config);
        debug!(
            candidates = found,
            kept = survivors.len(),
            "component detection finished"
        );
        survivors
    }

    fn is_candidate(&self, element: &DomElement, bounds: &BoundingBox) -> bool {
        if NON_VISUAL_TAGS.contains(&element.tag.as_str()) {
            return false;
        }
        if bounds.width() < self.config.min_width || bounds.height() < self.config.min_height {
            return false;
        }
        if bounds.width() > self.config.max_width && bounds.height() > self.config.max_height {
            return false;
        }
        // Decorative single glyphs (bullets, arrows, close crosses).
        let glyph = element.children.is_empty() && element.direct_text().chars().count() == 1;
        !glyph
    }
}

/// Containment pass followed by overlap pass. Idempotent.
pub fn suppress_duplicates(
    tree: &DomTree,
    components: Vec<DetectedComponent>,
    config: &DetectorConfig,
) -> Vec<DetectedComponent> {
    let contained = remove_contained(tree, components, config.tie_break);
    let mut survivors = remove_overlapping(contained, config.overlap_ratio);
    survivors.sort_by_key(|c| c.dom_index);
    survivors
}

fn remove_contained(
    tree: &DomTree,
    components: Vec<DetectedComponent>,
    tie_break: ContainmentTieBreak,
) -> Vec<DetectedComponent> {
    let mut removed = vec![false; components.len()];
    for (i, outer) in components.iter().enumerate() {
        for inner in &components {
            if !tree.is_ancestor(outer.dom_index, inner.dom_index) {
                continue;
            }
            let descendant_wins = match tie_break {
                ContainmentTieBreak::PreferDescendant => inner.confidence >= outer.confidence,
                ContainmentTieBreak::PreferAncestor => inner.confidence > outer.confidence,
            };
            if outer.component_type == inner.component_type || descendant_wins {
                removed[i] = true;
                break;
            }
        }
    }
    components
        .into_iter()
        .zip(removed)
        .filter_map(|(c, gone)| (!gone).then_some(c))
        .collect()
}

fn remove_overlapping(mut components: Vec<DetectedComponent>, ratio: f64) -> Vec<DetectedComponent> {
    components.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(Ordering::Equal)
            .then(a.dom_index.cmp(&b.dom_index))
    });
    let mut removed = vec![false; components.len()];
    for i in 0..components.len() {
        if removed[i] {
            continue;
        }
        for j in (i + 1)..components.len() {
            if removed[j] {
                continue;
            }
            let (a, b) = (components[i].bounds(), components[j].bounds());
            let smaller = a.area().min(b.area());
            if smaller > 0.0 && a.intersection_area(b) > ratio * smaller {
                removed[j] = true;
            }
        }
    }
    components
        .into_iter()
        .zip(removed)
        .filter_map(|(c, gone)| (!gone).then_some(c))
        .collect()
}
