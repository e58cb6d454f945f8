//! Per-type size, color and state variants.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::component::DetectedComponent;
use crate::color::{SemanticColor, SemanticPalette};
use crate::dom::{DomElement, DomTree};

const HEIGHT_STEP: f64 = 4.0;
const SIZE_GAP: f64 = 8.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SizeVariant {
    pub name: String,
    pub min_height: f64,
    pub max_height: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColorVariant {
    pub role: SemanticColor,
    /// First background seen for this role
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample: Option<String>,
    pub count: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateCounts {
    pub disabled: usize,
    pub active: usize,
    pub selected: usize,
    pub expanded: usize,
}

impl StateCounts {
    pub fn absorb(&mut self, other: &StateCounts) {
        self.disabled += other.disabled;
        self.active += other.active;
        self.selected += other.selected;
        self.expanded += other.expanded;
    }

    pub fn is_empty(&self) -> bool {
        *self == StateCounts::default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentVariants {
    pub component_type: String,
    pub instances: usize,
    pub sizes: Vec<SizeVariant>,
    pub colors: Vec<ColorVariant>,
    #[serde(default, skip_serializing_if = "StateCounts::is_empty")]
    pub states: StateCounts,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SizeVariantDetector;

impl SizeVariantDetector {
    /// Cluster rounded heights; neighbours at most 8px apart share a size.
    pub fn detect(&self, components: &[&DetectedComponent]) -> Vec<SizeVariant> {
        let mut heights: Vec<f64> = components
            .iter()
            .map(|c| (c.bounds().height() / HEIGHT_STEP).round() * HEIGHT_STEP)
            .collect();
        heights.sort_by(f64::total_cmp);

        let mut clusters: Vec<Vec<f64>> = Vec::new();
        for h in heights {
            let extends = clusters
                .last()
                .and_then(|c| c.last())
                .is_some_and(|last| h - last <= SIZE_GAP);
            if extends {
                if let Some(current) = clusters.last_mut() {
                    current.push(h);
                    continue;
                }
            }
            clusters.push(vec![h]);
        }

        let names = size_names(clusters.len());
        clusters
            .into_iter()
            .zip(names)
            .map(|(cluster, name)| SizeVariant {
                name,
                min_height: cluster.first().copied().unwrap_or_default(),
                max_height: cluster.last().copied().unwrap_or_default(),
                count: cluster.len(),
            })
            .collect()
    }
}

fn size_names(count: usize) -> Vec<String> {
    let fixed: &[&str] = match count {
        1 => &["default"],
        2 => &["sm", "lg"],
        3 => &["sm", "md", "lg"],
        4 => &["sm", "md", "lg", "xl"],
        5 => &["xs", "sm", "md", "lg", "xl"],
        _ => &[],
    };
    if fixed.is_empty() {
        (1..=count).map(|i| format!("size-{i}")).collect()
    } else {
        fixed.iter().map(|n| n.to_string()).collect()
    }
}

pub struct ColorVariantDetector<'a> {
    palette: &'a SemanticPalette,
}

impl<'a> ColorVariantDetector<'a> {
    pub fn new(palette: &'a SemanticPalette) -> Self {
        Self { palette }
    }

    /// Bucket by semantic background role; most common first.
    pub fn detect(&self, components: &[&DetectedComponent]) -> Vec<ColorVariant> {
        let mut variants: Vec<ColorVariant> = Vec::new();
        for component in components {
            let background = component.visual.background_color();
            let role = self.palette.classify(background.as_ref());
            match variants.iter_mut().find(|v| v.role == role) {
                Some(variant) => variant.count += 1,
                None => variants.push(ColorVariant {
                    role,
                    sample: background.filter(|c| !c.is_transparent()).map(|c| c.to_hex()),
                    count: 1,
                }),
            }
        }
        variants.sort_by(|a, b| b.count.cmp(&a.count));
        variants
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StateVariantDetector;

impl StateVariantDetector {
    pub fn detect(&self, tree: &DomTree, components: &[&DetectedComponent]) -> StateCounts {
        let mut counts = StateCounts::default();
        for component in components {
            let Some(element) = tree.get(component.dom_index) else {
                continue;
            };
            counts.disabled += usize::from(is_disabled(element));
            counts.active += usize::from(is_active(element));
            counts.selected += usize::from(is_selected(element));
            counts.expanded += usize::from(is_expanded(element));
        }
        counts
    }
}

fn has_any_class(element: &DomElement, classes: &[&str]) -> bool {
    element.class_tokens().any(|t| classes.contains(&t))
}

fn is_disabled(element: &DomElement) -> bool {
    element.attr("disabled").is_some()
        || element.attr("aria-disabled") == Some("true")
        || has_any_class(element, &["disabled", "is-disabled"])
}

fn is_active(element: &DomElement) -> bool {
    element.attr("aria-current").is_some_and(|v| v != "false")
        || element.attr("aria-pressed") == Some("true")
        || has_any_class(element, &["active", "is-active", "current"])
}

fn is_selected(element: &DomElement) -> bool {
    element.attr("aria-selected") == Some("true")
        || element.attr("selected").is_some()
        || element.attr("checked").is_some()
        || has_any_class(element, &["selected", "is-selected"])
}

fn is_expanded(element: &DomElement) -> bool {
    element.attr("aria-expanded") == Some("true")
        || element.attr("open").is_some()
        || has_any_class(element, &["open", "expanded", "is-open", "show"])
}

/// Size, color and (when a tree is given) state variants for every type,
/// ordered by type name.
pub fn component_variants(
    components: &[DetectedComponent],
    tree: Option<&DomTree>,
    palette: &SemanticPalette,
) -> Vec<ComponentVariants> {
    let mut by_type: BTreeMap<&str, Vec<&DetectedComponent>> = BTreeMap::new();
    for component in components {
        by_type
            .entry(component.component_type.as_str())
            .or_default()
            .push(component);
    }

    let colors = ColorVariantDetector::new(palette);
    by_type
        .into_iter()
        .map(|(component_type, members)| ComponentVariants {
            component_type: component_type.to_string(),
            instances: members.len(),
            sizes: SizeVariantDetector.detect(&members),
            colors: colors.detect(&members),
            states: tree
                .map(|t| StateVariantDetector.detect(t, &members))
                .unwrap_or_default(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::fingerprint::FingerprintGenerator;
    use crate::types::{BoundingBox, StyleMap, VisualProperties};

    fn button(tree: &DomTree, index: usize, height: f64, bg: &str) -> DetectedComponent {
        let fp = FingerprintGenerator::default().generate(tree, index).unwrap();
        let styles: StyleMap = [("background-color".to_string(), bg.to_string())]
            .into_iter()
            .collect();
        let visual = VisualProperties::new(BoundingBox::new(0.0, 0.0, 120.0, height).unwrap(), styles);
        DetectedComponent::new("button", 0.9, fp, visual, index, String::new())
    }

    // html0 head1 body2 button3..button7
    const PAGE: &str = r#"<html><body>
        <button>A</button>
        <button disabled>B</button>
        <button class="btn active">C</button>
        <button aria-expanded="true">D</button>
        <button>E</button>
    </body></html>"#;

    #[test]
    fn sizes_cluster_by_rounded_height() {
        let tree = DomTree::parse_html(PAGE);
        let components = [
            button(&tree, 3, 31.0, "rgb(0, 0, 255)"),
            button(&tree, 4, 33.0, "rgb(0, 0, 255)"),
            button(&tree, 5, 40.0, "rgb(0, 0, 255)"),
            button(&tree, 6, 56.0, "rgb(0, 0, 255)"),
        ];
        let refs: Vec<&DetectedComponent> = components.iter().collect();
        let sizes = SizeVariantDetector.detect(&refs);
        let names: Vec<&str> = sizes.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["sm", "lg"]);
        assert_eq!(sizes[0].count, 3);
        assert_eq!((sizes[0].min_height, sizes[0].max_height), (32.0, 40.0));
    }

    #[test]
    fn size_names_fall_back_to_ordinals() {
        assert_eq!(size_names(1), vec!["default"]);
        assert_eq!(size_names(5)[0], "xs");
        assert_eq!(size_names(7)[6], "size-7");
    }

    #[test]
    fn colors_bucket_by_semantic_role() {
        let tree = DomTree::parse_html(PAGE);
        let components = [
            button(&tree, 3, 40.0, "rgb(37, 99, 235)"),
            button(&tree, 4, 40.0, "rgb(220, 38, 38)"),
            button(&tree, 5, 40.0, "rgb(29, 78, 216)"),
            button(&tree, 6, 40.0, "rgba(0, 0, 0, 0)"),
        ];
        let refs: Vec<&DetectedComponent> = components.iter().collect();
        let palette = SemanticPalette::default();
        let colors = ColorVariantDetector::new(&palette).detect(&refs);
        assert_eq!(colors[0].role, SemanticColor::Primary);
        assert_eq!(colors[0].count, 2);
        assert_eq!(colors[0].sample.as_deref(), Some("#2563eb"));
        assert!(colors.iter().any(|c| c.role == SemanticColor::Danger));
        assert!(colors
            .iter()
            .any(|c| c.role == SemanticColor::Transparent && c.sample.is_none()));
    }

    #[test]
    fn states_come_from_attributes_and_classes() {
        let tree = DomTree::parse_html(PAGE);
        let components: Vec<DetectedComponent> = (3..=7)
            .map(|i| button(&tree, i, 40.0, "rgb(0, 0, 255)"))
            .collect();
        let variants = component_variants(&components, Some(&tree), &SemanticPalette::default());
        assert_eq!(variants.len(), 1);
        let states = variants[0].states;
        assert_eq!(
            states,
            StateCounts {
                disabled: 1,
                active: 1,
                selected: 0,
                expanded: 1
            }
        );
        assert_eq!(variants[0].instances, 5);
        assert_eq!(variants[0].sizes[0].name, "default");
    }
}
