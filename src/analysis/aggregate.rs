//! Site-level aggregation of page component groups.
//!
//! A pure reduce over per-page results. Each run owns its own
//! [`SiteAggregator`]; nothing is shared between runs.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

use super::component::DetectedComponent;
use super::matcher::ComponentGroup;

const COLOR_STEP: u8 = 32;
const WIDTH_BUCKET: f64 = 50.0;

/// Coarse visual identity used to split one structural component into
/// visual variants.
pub fn visual_key(component: &DetectedComponent) -> String {
    let visual = &component.visual;
    let background = visual
        .background_color()
        .filter(|c| !c.is_transparent())
        .map(|c| c.quantized(COLOR_STEP).to_hex())
        .unwrap_or_else(|| "none".to_string());
    let width = (visual.bounds().width() / WIDTH_BUCKET).floor() as i64;
    let font = visual.font_size().map(|f| f.round() as i64).unwrap_or(0);
    format!(
        "{background}|w{width}|f{font}|s{}|b{}",
        u8::from(visual.has_shadow()),
        u8::from(visual.has_border())
    )
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualVariant {
    pub visual_key: String,
    pub pages: Vec<String>,
    pub instances: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedComponent {
    pub hash: String,
    pub component_type: String,
    pub representative: DetectedComponent,
    pub pages: Vec<String>,
    pub page_count: usize,
    pub total_instances: usize,
    pub variants: Vec<VisualVariant>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteSummary {
    pub pages_analyzed: usize,
    pub pages_failed: usize,
    pub unique_components: usize,
    pub total_instances: usize,
    /// Components seen on more than one page
    pub shared_components: usize,
}

impl SiteSummary {
    pub fn from_aggregated(aggregated: &[AggregatedComponent], analyzed: usize, failed: usize) -> Self {
        Self {
            pages_analyzed: analyzed,
            pages_failed: failed,
            unique_components: aggregated.len(),
            total_instances: aggregated.iter().map(|a| a.total_instances).sum(),
            shared_components: aggregated.iter().filter(|a| a.page_count > 1).count(),
        }
    }
}

struct Entry {
    hash: String,
    component_type: String,
    representative: DetectedComponent,
    pages: BTreeSet<String>,
    instances: usize,
    variant_order: Vec<String>,
    variants: HashMap<String, (BTreeSet<String>, usize)>,
}

#[derive(Default)]
pub struct SiteAggregator {
    entries: Vec<Entry>,
    index: HashMap<String, usize>,
}

impl SiteAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one page's groups in. Every group member counts as one
    /// occurrence on `url`.
    pub fn add_page(&mut self, url: &str, groups: &[ComponentGroup]) {
        for group in groups {
            let slot = match self.index.get(&group.key) {
                Some(&slot) => slot,
                None => {
                    self.entries.push(Entry {
                        hash: group.key.clone(),
                        component_type: group.component_type.clone(),
                        representative: group.representative.clone(),
                        pages: BTreeSet::new(),
                        instances: 0,
                        variant_order: Vec::new(),
                        variants: HashMap::new(),
                    });
                    self.index.insert(group.key.clone(), self.entries.len() - 1);
                    self.entries.len() - 1
                }
            };
            let entry = &mut self.entries[slot];
            entry.pages.insert(url.to_string());

            if group.members.is_empty() {
                // Groups that went through serialization lose their members.
                entry.instances += group.instance_count;
                continue;
            }
            for member in &group.members {
                entry.instances += 1;
                let key = visual_key(member);
                let variant = entry.variants.entry(key.clone()).or_insert_with(|| {
                    entry.variant_order.push(key);
                    (BTreeSet::new(), 0)
                });
                variant.0.insert(url.to_string());
                variant.1 += 1;
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Ordered by page count, then instance count (both descending), then
    /// first appearance.
    pub fn finish(self) -> Vec<AggregatedComponent> {
        let mut aggregated: Vec<AggregatedComponent> = self
            .entries
            .into_iter()
            .map(|mut entry| {
                let variants = entry
                    .variant_order
                    .iter()
                    .filter_map(|key| {
                        let (pages, instances) = entry.variants.remove(key)?;
                        Some(VisualVariant {
                            visual_key: key.clone(),
                            pages: pages.into_iter().collect(),
                            instances,
                        })
                    })
                    .collect();
                AggregatedComponent {
                    page_count: entry.pages.len(),
                    pages: entry.pages.into_iter().collect(),
                    hash: entry.hash,
                    component_type: entry.component_type,
                    representative: entry.representative,
                    total_instances: entry.instances,
                    variants,
                }
            })
            .collect();
        aggregated.sort_by(|a, b| {
            b.page_count
                .cmp(&a.page_count)
                .then(b.total_instances.cmp(&a.total_instances))
        });
        aggregated
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::fingerprint::{SemanticFlags, StructuralFingerprint};
    use crate::analysis::matcher::ComponentMatcher;
    use crate::types::{BoundingBox, StyleMap, VisualProperties};

    fn button(index: usize, width: f64, bg: &str) -> DetectedComponent {
        let fp = StructuralFingerprint::new("button".into(), 0, 4, 1, 0, 0, SemanticFlags::default(), None, None);
        let styles: StyleMap = [("background-color".to_string(), bg.to_string())]
            .into_iter()
            .collect();
        let visual = VisualProperties::new(BoundingBox::new(0.0, 0.0, width, 40.0).unwrap(), styles);
        DetectedComponent::new("button", 0.9, fp, visual, index, String::new())
    }

    fn card(index: usize) -> DetectedComponent {
        let flags = SemanticFlags {
            has_image: true,
            has_heading: true,
            ..Default::default()
        };
        let fp = StructuralFingerprint::new("div[img,h3,p]".into(), 3, 4, 0, 0, 1, flags, None, None);
        let visual = VisualProperties::new(BoundingBox::new(0.0, 0.0, 300.0, 400.0).unwrap(), StyleMap::new());
        DetectedComponent::new("card", 0.8, fp, visual, index, String::new())
    }

    #[test]
    fn visual_key_quantizes_color_and_width() {
        let a = visual_key(&button(1, 120.0, "rgb(59, 130, 246)"));
        let b = visual_key(&button(2, 140.0, "rgb(60, 131, 250)"));
        assert_eq!(a, b);
        assert_eq!(a, "#2080e0|w2|f0|s0|b0");
        let transparent = visual_key(&button(3, 120.0, "rgba(0, 0, 0, 0)"));
        assert!(transparent.starts_with("none|"));
    }

    #[test]
    fn merges_across_pages_with_variants() {
        let matcher = ComponentMatcher::default();
        let home = matcher.group_components(&[
            button(1, 120.0, "rgb(0, 0, 255)"),
            button(2, 120.0, "rgb(0, 0, 255)"),
            card(3),
        ]);
        let about = matcher.group_components(&[button(7, 120.0, "rgb(255, 0, 0)")]);

        let mut aggregator = SiteAggregator::new();
        aggregator.add_page("https://example.com/", &home);
        aggregator.add_page("https://example.com/about", &about);
        let aggregated = aggregator.finish();

        assert_eq!(aggregated.len(), 2);
        let buttons = &aggregated[0];
        assert_eq!(buttons.component_type, "button");
        assert_eq!(buttons.page_count, 2);
        assert_eq!(buttons.total_instances, 3);
        assert_eq!(buttons.variants.len(), 2);
        assert_eq!(buttons.variants[0].instances, 2);
        assert_eq!(buttons.variants[1].pages, vec!["https://example.com/about"]);

        let summary = SiteSummary::from_aggregated(&aggregated, 2, 0);
        assert_eq!(summary.unique_components, 2);
        assert_eq!(summary.total_instances, 4);
        assert_eq!(summary.shared_components, 1);
    }

    #[test]
    fn single_page_round_trip_preserves_counts() {
        let matcher = ComponentMatcher::default();
        let groups = matcher.group_components(&[
            button(1, 120.0, "rgb(0, 0, 255)"),
            button(2, 120.0, "rgb(0, 0, 255)"),
            button(3, 120.0, "rgb(0, 0, 255)"),
            card(4),
        ]);
        let mut aggregator = SiteAggregator::new();
        aggregator.add_page("https://example.com/", &groups);
        let aggregated = aggregator.finish();

        assert_eq!(aggregated.len(), groups.len());
        for group in &groups {
            let found = aggregated.iter().find(|a| a.hash == group.key).unwrap();
            assert_eq!(found.total_instances, group.instance_count);
        }
    }
}
