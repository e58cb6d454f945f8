use serde::{Deserialize, Serialize};

use super::fingerprint::StructuralFingerprint;
use crate::types::{BoundingBox, VisualProperties};

/// How a hierarchy node's children relate to each other.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompositionType {
    #[default]
    None,
    Nested,
    Sequential,
    Grouped,
    Mixed,
}

/// A classified UI component found on a page.
///
/// Created by the type detector; afterwards only the hierarchy and section
/// links are filled in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectedComponent {
    pub id: String,
    /// Open set: any rule name registered in the catalog
    #[serde(rename = "type")]
    pub component_type: String,
    pub confidence: f64,
    pub fingerprint: StructuralFingerprint,
    pub visual: VisualProperties,
    pub dom_index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub child_ids: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section_id: Option<String>,
    #[serde(default)]
    pub composition: CompositionType,
    #[serde(default)]
    pub is_atomic: bool,
    #[serde(default)]
    pub is_compound: bool,
    /// Outer HTML, truncated
    pub html_snapshot: String,
}

impl DetectedComponent {
    pub fn new(
        component_type: impl Into<String>,
        confidence: f64,
        fingerprint: StructuralFingerprint,
        visual: VisualProperties,
        dom_index: usize,
        html_snapshot: String,
    ) -> Self {
        Self {
            id: format!("cmp-{dom_index}"),
            component_type: component_type.into(),
            confidence,
            fingerprint,
            visual,
            dom_index,
            parent_id: None,
            child_ids: Vec::new(),
            section_id: None,
            composition: CompositionType::None,
            is_atomic: true,
            is_compound: false,
            html_snapshot,
        }
    }

    pub fn bounds(&self) -> &BoundingBox {
        self.visual.bounds()
    }

    pub fn hash(&self) -> &str {
        self.fingerprint.hash()
    }
}
