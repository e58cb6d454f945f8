//! Page-structure linking: assigns each component to its landmark section.

use serde::{Deserialize, Serialize};

use super::component::DetectedComponent;
use crate::dom::DomTree;

pub const LANDMARK_TAGS: &[&str] = &["header", "nav", "main", "section", "article", "aside", "footer"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSection {
    pub id: String,
    pub tag: String,
    pub dom_index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub component_ids: Vec<String>,
}

/// Collect landmark sections and set `section_id` on every component that
/// sits inside one (the nearest landmark ancestor-or-self wins).
pub fn link_sections(tree: &DomTree, components: &mut [DetectedComponent]) -> Vec<PageSection> {
    let mut sections: Vec<PageSection> = tree
        .elements()
        .iter()
        .filter(|e| LANDMARK_TAGS.contains(&e.tag.as_str()))
        .map(|e| PageSection {
            id: format!("section-{}", e.index),
            tag: e.tag.clone(),
            dom_index: e.index,
            label: e
                .attr("aria-label")
                .or_else(|| e.attr("id"))
                .map(str::to_string),
            component_ids: Vec::new(),
        })
        .collect();

    for component in components.iter_mut() {
        let mut cursor = Some(component.dom_index);
        let mut landmark = None;
        while let Some(index) = cursor {
            let Some(element) = tree.get(index) else {
                break;
            };
            if LANDMARK_TAGS.contains(&element.tag.as_str()) {
                landmark = Some(index);
                break;
            }
            cursor = element.parent;
        }

        component.section_id = landmark.map(|index| format!("section-{index}"));
        if let Some(index) = landmark {
            if let Some(section) = sections.iter_mut().find(|s| s.dom_index == index) {
                section.component_ids.push(component.id.clone());
            }
        }
    }

    sections
}
