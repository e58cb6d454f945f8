//! Page capture input supplied by the external browser driver.
//!
//! A capture holds the serialized page (either an HTML string or a
//! flattened node list in document order) plus per-element computed styles
//! and measured boxes, both keyed by document-order element index.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use super::core::BoundingBox;
use super::style::StyleMap;
use crate::viewport::Viewport;

/// Everything the engine needs to analyze one rendered page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageCapture {
    /// Page URL, used as the page identity during aggregation
    pub url: String,
    /// Serialized page HTML
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
    /// Flattened DOM nodes in document order (alternative to `html`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nodes: Option<Vec<CapturedNode>>,
    /// Element index -> computed CSS properties
    #[serde(default)]
    pub styles: HashMap<usize, StyleMap>,
    /// Element index -> measured bounding box
    #[serde(default)]
    pub boxes: HashMap<usize, BoundingBox>,
    /// Viewport the page was rendered at
    #[serde(skip_serializing_if = "Option::is_none")]
    pub viewport: Option<Viewport>,
}

/// A single captured DOM element.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapturedNode {
    /// HTML tag name (e.g., "div", "span", "button")
    pub tag: String,
    /// Index of the parent node; must precede this node
    pub parent: Option<usize>,
    /// HTML attributes (id, class, role, data-*, etc.)
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
    /// Direct text content of the element
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub text: Vec<String>,
}

impl PageCapture {
    pub fn from_html(url: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            html: Some(html.into()),
            ..Self::default()
        }
    }

    pub fn with_box(mut self, index: usize, bounds: BoundingBox) -> Self {
        self.boxes.insert(index, bounds);
        self
    }

    pub fn with_styles<'a>(
        mut self,
        index: usize,
        styles: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Self {
        self.styles.insert(
            index,
            styles
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        );
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capture_deserializes_with_integer_keys() {
        let json = r#"{
            "url": "https://example.com",
            "html": "<html><body><button>Go</button></body></html>",
            "styles": {"3": {"background-color": "rgb(0, 0, 255)"}},
            "boxes": {"3": {"x": 10, "y": 20, "width": 80, "height": 32}},
            "viewport": {"width": 1280, "height": 800}
        }"#;

        let capture: PageCapture = serde_json::from_str(json).expect("should deserialize");
        assert_eq!(capture.url, "https://example.com");
        assert!(capture.nodes.is_none());
        assert_eq!(
            capture.styles[&3].get("background-color").map(String::as_str),
            Some("rgb(0, 0, 255)")
        );
        assert_eq!(capture.boxes[&3].width(), 80.0);
        assert_eq!(capture.viewport.map(|v| v.width), Some(1280));
    }

    #[test]
    fn capture_with_nodes_and_missing_maps() {
        let json = r#"{
            "url": "https://example.com/about",
            "nodes": [
                {"tag": "html", "parent": null},
                {"tag": "body", "parent": 0},
                {"tag": "a", "parent": 1, "attributes": {"href": "/"}, "text": ["Home"]}
            ]
        }"#;

        let capture: PageCapture = serde_json::from_str(json).expect("should deserialize");
        let nodes = capture.nodes.expect("nodes present");
        assert_eq!(nodes.len(), 3);
        assert_eq!(nodes[2].attributes.get("href").map(String::as_str), Some("/"));
        assert!(capture.styles.is_empty());
        assert!(capture.boxes.is_empty());
    }

    #[test]
    fn negative_box_is_rejected() {
        let json = r#"{
            "url": "u",
            "html": "<p>x</p>",
            "boxes": {"0": {"x": 0, "y": 0, "width": -5, "height": 1}}
        }"#;
        assert!(serde_json::from_str::<PageCapture>(json).is_err());
    }
}
