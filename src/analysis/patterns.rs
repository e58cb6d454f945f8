//! Repeated UI pattern detection (card grids, list items, nav links).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

use super::component::DetectedComponent;
use super::spatial::{LayoutType, SpatialAnalyzer, SpatialArrangement};
use crate::types::BoundingBox;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepeatedPattern {
    /// Fingerprint hash, or `similar:<seed hash>` for similarity groups
    pub key: String,
    pub component_type: String,
    pub member_ids: Vec<String>,
    pub count: usize,
    pub arrangement: SpatialArrangement,
    pub layout: LayoutType,
    pub similarity_based: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RepeatedPatternDetector {
    pub similarity_threshold: f64,
}

impl Default for RepeatedPatternDetector {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.8,
        }
    }
}

impl RepeatedPatternDetector {
    pub fn new(similarity_threshold: f64) -> Self {
        Self {
            similarity_threshold,
        }
    }

    pub fn detect(&self, components: &[DetectedComponent]) -> Vec<RepeatedPattern> {
        let mut patterns = Vec::new();
        let mut consumed = vec![false; components.len()];

        // Pass 1: exact hashes, in order of first appearance.
        let mut order: Vec<&str> = Vec::new();
        let mut by_hash: HashMap<&str, Vec<usize>> = HashMap::new();
        for (i, component) in components.iter().enumerate() {
            let members = by_hash.entry(component.hash()).or_default();
            if members.is_empty() {
                order.push(component.hash());
            }
            members.push(i);
        }
        for hash in order {
            let members = &by_hash[hash];
            if members.len() < 2 {
                continue;
            }
            for &i in members {
                consumed[i] = true;
            }
            patterns.push(pattern(hash.to_string(), components, members, false));
        }

        // Pass 2: greedy similarity grouping of what is left.
        for seed in 0..components.len() {
            if consumed[seed] {
                continue;
            }
            consumed[seed] = true;
            let mut members = vec![seed];
            for other in (seed + 1)..components.len() {
                if consumed[other] {
                    continue;
                }
                let similarity = components[seed]
                    .fingerprint
                    .similarity(&components[other].fingerprint);
                if similarity >= self.similarity_threshold {
                    consumed[other] = true;
                    members.push(other);
                }
            }
            if members.len() >= 2 {
                let key = format!("similar:{}", components[seed].hash());
                patterns.push(pattern(key, components, &members, true));
            }
        }

        // Stable, so equal counts keep discovery order.
        patterns.sort_by(|a, b| b.count.cmp(&a.count));
        debug!(patterns = patterns.len(), "repeated pattern detection finished");
        patterns
    }
}

fn pattern(
    key: String,
    components: &[DetectedComponent],
    members: &[usize],
    similarity_based: bool,
) -> RepeatedPattern {
    let boxes: Vec<BoundingBox> = members.iter().map(|&i| *components[i].bounds()).collect();
    let arrangement = SpatialAnalyzer.analyze(&boxes);
    RepeatedPattern {
        key,
        component_type: components[members[0]].component_type.clone(),
        member_ids: members.iter().map(|&i| components[i].id.clone()).collect(),
        count: members.len(),
        layout: arrangement.layout,
        arrangement,
        similarity_based,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::fingerprint::{SemanticFlags, StructuralFingerprint};
    use crate::types::{StyleMap, VisualProperties};

    fn component(index: usize, signature: &str, children: usize, x: f64, y: f64) -> DetectedComponent {
        let flags = SemanticFlags {
            has_heading: true,
            has_image: true,
            ..Default::default()
        };
        let fp = StructuralFingerprint::new(signature.into(), children, 3, 0, 0, 1, flags, None, None);
        let visual = VisualProperties::new(
            BoundingBox::new(x, y, 280.0, 360.0).unwrap(),
            StyleMap::new(),
        );
        DetectedComponent::new("card", 0.8, fp, visual, index, String::new())
    }

    #[test]
    fn exact_hash_groups_form_patterns() {
        let components = vec![
            component(1, "div[img,h3,p]", 3, 0.0, 0.0),
            component(2, "div[img,h3,p]", 3, 300.0, 0.0),
            component(3, "div[img,h3,p]", 3, 600.0, 0.0),
            component(4, "nav[ul]", 1, 0.0, 900.0),
        ];
        let patterns = RepeatedPatternDetector::default().detect(&components);
        assert_eq!(patterns.len(), 1);
        let p = &patterns[0];
        assert_eq!(p.count, 3);
        assert!(!p.similarity_based);
        assert_eq!(p.layout, LayoutType::Row);
        assert_eq!(p.member_ids, vec!["cmp-1", "cmp-2", "cmp-3"]);
    }

    #[test]
    fn near_identical_structures_form_similarity_pattern() {
        // Different signatures but same root tag and flags: 1.5 + 1 + 7 = 9.5 / 11
        let components = vec![
            component(1, "div[img,h3,p]", 3, 0.0, 0.0),
            component(2, "div[img,h3,p,a]", 3, 300.0, 0.0),
        ];
        let patterns = RepeatedPatternDetector::default().detect(&components);
        assert_eq!(patterns.len(), 1);
        assert!(patterns[0].similarity_based);
        assert!(patterns[0].key.starts_with("similar:"));
        assert_eq!(patterns[0].count, 2);
    }

    #[test]
    fn each_component_joins_at_most_one_pattern() {
        let components = vec![
            component(1, "div[img,h3,p]", 3, 0.0, 0.0),
            component(2, "div[img,h3,p]", 3, 300.0, 0.0),
            component(3, "div[img,h3,p,a]", 3, 600.0, 0.0),
            component(4, "div[img,h3,p,a]", 3, 900.0, 0.0),
            component(5, "div[img,h3,span]", 3, 1200.0, 0.0),
        ];
        let patterns = RepeatedPatternDetector::default().detect(&components);
        let mut seen: Vec<&String> = patterns.iter().flat_map(|p| &p.member_ids).collect();
        let total = seen.len();
        seen.sort();
        seen.dedup();
        assert_eq!(seen.len(), total);
        assert!(patterns.windows(2).all(|w| w[0].count >= w[1].count));
    }

    #[test]
    fn singletons_are_not_patterns() {
        let components = vec![component(1, "div[img,h3,p]", 3, 0.0, 0.0)];
        assert!(RepeatedPatternDetector::default().detect(&components).is_empty());
        assert!(RepeatedPatternDetector::default().detect(&[]).is_empty());
    }
}
