//! Pairwise component matching and page-level grouping.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

use super::component::DetectedComponent;
use super::features::VisualFeatureVector;
use crate::viewport::Viewport;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchKind {
    Exact,
    Similar,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResult {
    pub is_match: bool,
    pub kind: MatchKind,
    pub similarity: f64,
    pub visual_distance: f64,
}

/// Components judged equivalent on one page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentGroup {
    /// Fingerprint hash of the representative
    pub key: String,
    pub component_type: String,
    pub kind: MatchKind,
    pub representative: DetectedComponent,
    pub member_ids: Vec<String>,
    pub instance_count: usize,
    #[serde(skip)]
    pub members: Vec<DetectedComponent>,
}

impl ComponentGroup {
    fn new(kind: MatchKind, members: Vec<DetectedComponent>) -> Option<Self> {
        let representative = members.first()?.clone();
        Some(Self {
            key: representative.hash().to_string(),
            component_type: representative.component_type.clone(),
            kind,
            member_ids: members.iter().map(|m| m.id.clone()).collect(),
            instance_count: members.len(),
            representative,
            members,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComponentMatcher {
    pub similarity_threshold: f64,
    pub max_visual_distance: f64,
    pub viewport: Viewport,
}

impl Default for ComponentMatcher {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.8,
            max_visual_distance: 0.2,
            viewport: Viewport::default(),
        }
    }
}

impl ComponentMatcher {
    pub fn match_pair(&self, a: &DetectedComponent, b: &DetectedComponent) -> MatchResult {
        let visual_distance = self.features(a).distance(&self.features(b));
        if a.hash() == b.hash() {
            return MatchResult {
                is_match: true,
                kind: MatchKind::Exact,
                similarity: 1.0,
                visual_distance,
            };
        }

        let similarity = a.fingerprint.similarity(&b.fingerprint);
        let similar = similarity >= self.similarity_threshold
            && a.component_type == b.component_type
            && visual_distance <= self.max_visual_distance;
        MatchResult {
            is_match: similar,
            kind: if similar {
                MatchKind::Similar
            } else {
                MatchKind::None
            },
            similarity,
            visual_distance,
        }
    }

    /// Exact-hash buckets first, then greedy similar-match grouping of the
    /// rest. Every component lands in exactly one group; unmatched ones form
    /// singleton groups.
    pub fn group_components(&self, components: &[DetectedComponent]) -> Vec<ComponentGroup> {
        let mut groups = Vec::new();
        let mut consumed = vec![false; components.len()];

        let mut order: Vec<&str> = Vec::new();
        let mut buckets: HashMap<&str, Vec<usize>> = HashMap::new();
        for (i, component) in components.iter().enumerate() {
            let bucket = buckets.entry(component.hash()).or_default();
            if bucket.is_empty() {
                order.push(component.hash());
            }
            bucket.push(i);
        }
        for hash in order {
            let bucket = &buckets[hash];
            if bucket.len() < 2 {
                continue;
            }
            for &i in bucket {
                consumed[i] = true;
            }
            let members = bucket.iter().map(|&i| components[i].clone()).collect();
            groups.extend(ComponentGroup::new(MatchKind::Exact, members));
        }

        for seed in 0..components.len() {
            if consumed[seed] {
                continue;
            }
            consumed[seed] = true;
            let mut members = vec![components[seed].clone()];
            for other in (seed + 1)..components.len() {
                if consumed[other] {
                    continue;
                }
                if self.match_pair(&components[seed], &components[other]).is_match {
                    consumed[other] = true;
                    members.push(components[other].clone());
                }
            }
            let kind = if members.len() > 1 {
                MatchKind::Similar
            } else {
                MatchKind::None
            };
            groups.extend(ComponentGroup::new(kind, members));
        }

        debug!(
            components = components.len(),
            groups = groups.len(),
            "page-level grouping finished"
        );
        groups
    }

    fn features(&self, component: &DetectedComponent) -> VisualFeatureVector {
        VisualFeatureVector::from_visual(&component.visual, &self.viewport)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::fingerprint::{SemanticFlags, StructuralFingerprint};
    use crate::types::{BoundingBox, VisualProperties};

    fn component(index: usize, kind: &str, signature: &str, width: f64, bg: &str) -> DetectedComponent {
        let fp = StructuralFingerprint::new(
            signature.into(),
            0,
            4,
            1,
            0,
            0,
            SemanticFlags::default(),
            None,
            None,
        );
        let visual = VisualProperties::new(
            BoundingBox::new(index as f64 * 150.0, 0.0, width, 40.0).unwrap(),
            [("background-color".to_string(), bg.to_string())].into_iter().collect(),
        );
        DetectedComponent::new(kind, 0.9, fp, visual, index, String::new())
    }

    #[test]
    fn identical_hash_is_exact_match() {
        let a = component(1, "button", "button", 120.0, "rgb(0, 0, 255)");
        let b = component(2, "button", "button", 300.0, "rgb(255, 0, 0)");
        let result = ComponentMatcher::default().match_pair(&a, &b);
        assert!(result.is_match);
        assert_eq!(result.kind, MatchKind::Exact);
        assert_eq!(result.similarity, 1.0);
    }

    #[test]
    fn similar_match_needs_type_and_visual_closeness() {
        let matcher = ComponentMatcher::default();
        let a = component(1, "button", "button", 120.0, "rgb(0, 0, 255)");
        let b = component(2, "button", "button[span]", 124.0, "rgb(0, 0, 250)");
        let result = matcher.match_pair(&a, &b);
        assert_eq!(result.kind, MatchKind::Similar);
        assert!(result.similarity >= 0.8);

        let other_type = component(3, "link", "button[span]", 124.0, "rgb(0, 0, 250)");
        assert!(!matcher.match_pair(&a, &other_type).is_match);

        let far = component(4, "button", "button[span]", 124.0, "rgb(255, 255, 0)");
        assert!(!matcher.match_pair(&a, &far).is_match);
    }

    #[test]
    fn grouping_covers_every_component_once() {
        let components = vec![
            component(1, "button", "button", 120.0, "rgb(0, 0, 255)"),
            component(2, "button", "button", 120.0, "rgb(0, 0, 255)"),
            component(3, "button", "button[span]", 122.0, "rgb(0, 0, 250)"),
            component(4, "button", "button[span,svg]", 124.0, "rgb(0, 0, 250)"),
            component(5, "card", "div[img,h3,p]", 300.0, "rgb(255, 255, 255)"),
        ];
        let groups = ComponentMatcher::default().group_components(&components);
        assert_eq!(groups.len(), 3);
        assert_eq!(groups[0].kind, MatchKind::Exact);
        assert_eq!(groups[0].member_ids, vec!["cmp-1", "cmp-2"]);
        assert_eq!(groups[1].kind, MatchKind::Similar);
        assert_eq!(groups[1].instance_count, 2);
        assert_eq!(groups[2].kind, MatchKind::None);
        let total: usize = groups.iter().map(|g| g.instance_count).sum();
        assert_eq!(total, components.len());
    }
}
