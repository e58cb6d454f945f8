//! Index-addressed DOM arena.
//!
//! Elements are stored in document order; an element's position in the arena
//! is the same index the capture uses for its style and box maps. Parent and
//! child links are plain indices, so the tree can be walked with explicit
//! worklists and never holds reference cycles.

use scraper::{ElementRef, Html};
use std::collections::BTreeMap;

use crate::error::{CbxError, Result};
use crate::types::CapturedNode;

/// Outer HTML kept per element is truncated to this many characters.
pub const HTML_SNAPSHOT_LIMIT: usize = 1000;

#[derive(Debug, Clone)]
pub struct DomElement {
    pub index: usize,
    pub tag: String,
    pub attributes: BTreeMap<String, String>,
    pub parent: Option<usize>,
    pub children: Vec<usize>,
    /// Direct, non-whitespace text nodes
    pub text_nodes: Vec<String>,
    /// Distance to the document root (root = 0)
    pub depth: usize,
    pub outer_html: String,
}

impl DomElement {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .is_some_and(|c| c.split_whitespace().any(|token| token == class))
    }

    pub fn class_tokens(&self) -> impl Iterator<Item = &str> {
        self.attr("class").unwrap_or("").split_whitespace()
    }

    /// Concatenated direct text, trimmed.
    pub fn direct_text(&self) -> String {
        self.text_nodes.join(" ").trim().to_string()
    }
}

#[derive(Debug, Clone, Default)]
pub struct DomTree {
    elements: Vec<DomElement>,
}

impl DomTree {
    /// Parse an HTML document. The `<html>` element is index 0.
    pub fn parse_html(html: &str) -> Self {
        let document = Html::parse_document(html);
        let mut elements: Vec<DomElement> = Vec::new();
        let mut stack: Vec<(ElementRef<'_>, Option<usize>, usize)> =
            vec![(document.root_element(), None, 0)];

        while let Some((element, parent, depth)) = stack.pop() {
            let index = elements.len();
            let mut text_nodes = Vec::new();
            let mut element_children = Vec::new();
            for child in element.children() {
                if let Some(text) = child.value().as_text() {
                    let trimmed = text.trim();
                    if !trimmed.is_empty() {
                        text_nodes.push(trimmed.to_string());
                    }
                } else if let Some(child_element) = ElementRef::wrap(child) {
                    element_children.push(child_element);
                }
            }

            elements.push(DomElement {
                index,
                tag: element.value().name().to_ascii_lowercase(),
                attributes: element
                    .value()
                    .attrs()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
                parent,
                children: Vec::new(),
                text_nodes,
                depth,
                outer_html: truncate_chars(&element.html(), HTML_SNAPSHOT_LIMIT),
            });
            if let Some(parent) = parent {
                elements[parent].children.push(index);
            }

            // Reverse so the first child is popped (and indexed) first.
            for child in element_children.into_iter().rev() {
                stack.push((child, Some(index), depth + 1));
            }
        }

        Self { elements }
    }

    /// Build from a flattened capture. Every parent index must be strictly
    /// smaller than its child's index, which also rules out cycles.
    pub fn from_nodes(nodes: &[CapturedNode]) -> Result<Self> {
        let mut elements: Vec<DomElement> = Vec::with_capacity(nodes.len());
        for (index, node) in nodes.iter().enumerate() {
            let depth = match node.parent {
                None if index == 0 => 0,
                None => {
                    return Err(CbxError::invalid_input(format!(
                        "node {index} has no parent; only node 0 may be the root"
                    )))
                }
                Some(parent) if parent >= index => {
                    return Err(CbxError::invalid_input(format!(
                        "node {index} has parent {parent} which does not precede it"
                    )))
                }
                Some(parent) => elements[parent].depth + 1,
            };
            if let Some(parent) = node.parent {
                elements[parent].children.push(index);
            }
            let text_nodes: Vec<String> = node
                .text
                .iter()
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect();
            elements.push(DomElement {
                index,
                tag: node.tag.to_ascii_lowercase(),
                attributes: node.attributes.clone(),
                parent: node.parent,
                children: Vec::new(),
                text_nodes,
                depth,
                outer_html: String::new(),
            });
        }

        // Synthesize a shallow outer HTML so snapshots are never empty.
        for index in 0..elements.len() {
            let element = &elements[index];
            let attrs: String = element
                .attributes
                .iter()
                .map(|(k, v)| format!(" {k}=\"{v}\""))
                .collect();
            let html = format!(
                "<{tag}{attrs}>{text}</{tag}>",
                tag = element.tag,
                text = element.direct_text()
            );
            elements[index].outer_html = truncate_chars(&html, HTML_SNAPSHOT_LIMIT);
        }

        Ok(Self { elements })
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn root(&self) -> Option<&DomElement> {
        self.elements.first()
    }

    pub fn get(&self, index: usize) -> Option<&DomElement> {
        self.elements.get(index)
    }

    pub fn elements(&self) -> &[DomElement] {
        &self.elements
    }

    pub fn children(&self, index: usize) -> impl Iterator<Item = &DomElement> {
        self.elements
            .get(index)
            .map(|e| e.children.as_slice())
            .unwrap_or(&[])
            .iter()
            .filter_map(|&c| self.elements.get(c))
    }

    /// True when `ancestor` strictly contains `descendant`.
    pub fn is_ancestor(&self, ancestor: usize, descendant: usize) -> bool {
        let mut current = self.elements.get(descendant).and_then(|e| e.parent);
        while let Some(index) = current {
            if index == ancestor {
                return true;
            }
            current = self.elements[index].parent;
        }
        false
    }

    /// Strict descendants of `index` in document order.
    pub fn descendants(&self, index: usize) -> Descendants<'_> {
        let stack = self
            .elements
            .get(index)
            .map(|e| e.children.iter().rev().copied().collect())
            .unwrap_or_default();
        Descendants { tree: self, stack }
    }

    /// Whether any strict descendant matches `predicate`.
    pub fn any_descendant(&self, index: usize, predicate: impl Fn(&DomElement) -> bool) -> bool {
        self.descendants(index).any(predicate)
    }
}

pub struct Descendants<'a> {
    tree: &'a DomTree,
    stack: Vec<usize>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a DomElement;

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.stack.pop()?;
        let element = self.tree.elements.get(index)?;
        self.stack.extend(element.children.iter().rev().copied());
        Some(element)
    }
}

fn truncate_chars(value: &str, limit: usize) -> String {
    match value.char_indices().nth(limit) {
        Some((cut, _)) => value[..cut].to_string(),
        None => value.to_string(),
    }
}
