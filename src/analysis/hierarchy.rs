//! Component hierarchy: an arena of nodes mirroring the DOM, pruned to the
//! parts that carry components.
//!
//! Nodes refer to each other by arena id. Metrics are computed bottom-up
//! from an explicit post-order, and component links are back-filled with a
//! breadth-first walk.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use tracing::debug;

use super::component::{CompositionType, DetectedComponent};
use crate::dom::DomTree;
use crate::error::{CbxError, Result};

/// Subtrees under these tags never appear in the hierarchy.
pub const SKIPPED_TAGS: &[&str] = &["script", "style", "meta", "link", "template"];

/// Sets of component types that commonly appear together as one unit.
///
/// Built once and shared by reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogicalGroupings(pub Vec<Vec<String>>);

impl Default for LogicalGroupings {
    fn default() -> Self {
        let sets: &[&[&str]] = &[
            &["avatar", "badge", "text"],
            &["icon", "text", "button"],
            &["image", "heading", "text", "button"],
            &["input", "label", "button"],
            &["avatar", "heading", "text"],
            &["badge", "text"],
        ];
        Self(
            sets.iter()
                .map(|set| set.iter().map(|t| t.to_string()).collect())
                .collect(),
        )
    }
}

impl LogicalGroupings {
    /// True when every type belongs to a single grouping.
    pub fn contains_all(&self, types: &[String]) -> bool {
        self.0
            .iter()
            .any(|set| types.iter().all(|t| set.contains(t)))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HierarchyNode {
    pub id: usize,
    pub dom_index: usize,
    pub tag: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub component_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub component_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<usize>,
    pub children: Vec<usize>,
    pub subtree_size: usize,
    pub is_atomic: bool,
    pub is_compound: bool,
    pub composition: CompositionType,
    /// Distinct types of component-carrying children, first-seen order
    pub child_types: Vec<String>,
}

impl HierarchyNode {
    fn new(id: usize, dom_index: usize, tag: &str, parent: Option<usize>) -> Self {
        Self {
            id,
            dom_index,
            tag: tag.to_string(),
            component_id: None,
            component_type: None,
            parent,
            children: Vec::new(),
            subtree_size: 1,
            is_atomic: true,
            is_compound: false,
            composition: CompositionType::None,
            child_types: Vec::new(),
        }
    }

    pub fn has_component(&self) -> bool {
        self.component_id.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentHierarchy {
    nodes: Vec<HierarchyNode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    root: Option<usize>,
    #[serde(skip)]
    groupings: LogicalGroupings,
}

impl ComponentHierarchy {
    pub fn root(&self) -> Option<&HierarchyNode> {
        self.root.and_then(|id| self.nodes.get(id))
    }

    pub fn node(&self, id: usize) -> Option<&HierarchyNode> {
        self.nodes.get(id)
    }

    pub fn nodes(&self) -> &[HierarchyNode] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn find_component(&self, component_id: &str) -> Option<&HierarchyNode> {
        self.nodes
            .iter()
            .find(|n| n.component_id.as_deref() == Some(component_id))
    }

    /// Move `node` under `new_parent`. Rejects moves that would create a
    /// cycle, then recomputes metrics and re-syncs the links and
    /// composition on `components`.
    pub fn reparent(
        &mut self,
        node: usize,
        new_parent: usize,
        components: &mut [DetectedComponent],
    ) -> Result<()> {
        if node >= self.nodes.len() || new_parent >= self.nodes.len() {
            return Err(CbxError::invariant(format!(
                "hierarchy node {node} or {new_parent} does not exist"
            )));
        }
        if Some(node) == self.root {
            return Err(CbxError::invariant("cannot reparent the hierarchy root"));
        }
        let mut cursor = Some(new_parent);
        while let Some(id) = cursor {
            if id == node {
                return Err(CbxError::invariant(format!(
                    "moving node {node} under {new_parent} would create a cyclic hierarchy"
                )));
            }
            cursor = self.nodes[id].parent;
        }

        if let Some(old) = self.nodes[node].parent {
            self.nodes[old].children.retain(|c| *c != node);
        }
        self.nodes[new_parent].children.push(node);
        self.nodes[node].parent = Some(new_parent);
        self.recompute_metrics();
        self.back_fill(components);
        Ok(())
    }

    /// Recompute sizes, atomic/compound flags, child types and composition
    /// for every node, children before parents.
    pub fn recompute_metrics(&mut self) {
        for id in self.post_order() {
            let children = self.nodes[id].children.clone();
            let subtree_size = 1 + children
                .iter()
                .map(|c| self.nodes[*c].subtree_size)
                .sum::<usize>();

            let mut child_types: Vec<String> = Vec::new();
            for c in &children {
                if let Some(t) = &self.nodes[*c].component_type {
                    if !child_types.contains(t) {
                        child_types.push(t.clone());
                    }
                }
            }
            let all_carry = children.iter().all(|c| self.nodes[*c].has_component());
            let composition = self.classify(children.len(), all_carry, &child_types);

            let node = &mut self.nodes[id];
            node.subtree_size = subtree_size;
            node.is_atomic = children.is_empty();
            node.is_compound = !children.is_empty();
            node.child_types = child_types;
            node.composition = composition;
        }
    }

    fn classify(&self, child_count: usize, all_carry: bool, types: &[String]) -> CompositionType {
        match child_count {
            0 => CompositionType::None,
            1 => CompositionType::Nested,
            _ if all_carry && types.len() == 1 => CompositionType::Sequential,
            // at most three typed children, plain containers alongside are allowed
            _ if (1..=3).contains(&types.len()) && self.groupings.contains_all(types) => {
                CompositionType::Grouped
            }
            _ => CompositionType::Mixed,
        }
    }

    fn post_order(&self) -> Vec<usize> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let Some(root) = self.root else {
            return order;
        };
        let mut stack = vec![(root, false)];
        while let Some((id, expanded)) = stack.pop() {
            if expanded {
                order.push(id);
                continue;
            }
            stack.push((id, true));
            for child in self.nodes[id].children.iter().rev() {
                stack.push((*child, false));
            }
        }
        order
    }

    /// Copy links and composition from the hierarchy onto the components.
    fn back_fill(&self, components: &mut [DetectedComponent]) {
        let position: HashMap<&str, usize> = components
            .iter()
            .enumerate()
            .map(|(i, c)| (c.id.as_str(), i))
            .collect();

        let mut parents: Vec<(usize, usize, Option<String>)> = Vec::new();
        let mut children: HashMap<usize, Vec<String>> = HashMap::new();

        let Some(root) = self.root else {
            return;
        };
        // (node, nearest component-carrying ancestor)
        let mut queue: VecDeque<(usize, Option<usize>)> = VecDeque::from([(root, None)]);
        while let Some((id, carrier)) = queue.pop_front() {
            let node = &self.nodes[id];
            let mut next_carrier = carrier;
            if let Some(component_id) = &node.component_id {
                if let Some(&at) = position.get(component_id.as_str()) {
                    let parent_id = carrier.and_then(|c| self.nodes[c].component_id.clone());
                    parents.push((at, id, parent_id));
                    if let Some(c) = carrier {
                        children.entry(c).or_default().push(component_id.clone());
                    }
                }
                next_carrier = Some(id);
            }
            queue.extend(node.children.iter().map(|c| (*c, next_carrier)));
        }

        for (at, id, parent_id) in parents {
            let node = &self.nodes[id];
            let component = &mut components[at];
            component.parent_id = parent_id;
            component.child_ids = children.remove(&node.id).unwrap_or_default();
            component.composition = node.composition;
            component.is_atomic = node.is_atomic;
            component.is_compound = node.is_compound;
        }
    }
}

pub struct ComponentHierarchyBuilder<'a> {
    groupings: &'a LogicalGroupings,
}

impl<'a> ComponentHierarchyBuilder<'a> {
    pub fn new(groupings: &'a LogicalGroupings) -> Self {
        Self { groupings }
    }

    /// Build the hierarchy for `tree` and back-fill `components` with
    /// parent/child ids and composition flags.
    pub fn build(&self, tree: &DomTree, components: &mut [DetectedComponent]) -> ComponentHierarchy {
        let by_dom: HashMap<usize, &DetectedComponent> =
            components.iter().map(|c| (c.dom_index, c)).collect();

        let elements = tree.elements();
        let mut skipped = vec![false; elements.len()];
        for element in elements {
            let inherited = element.parent.is_some_and(|p| skipped[p]);
            skipped[element.index] = inherited || SKIPPED_TAGS.contains(&element.tag.as_str());
        }

        // Parents precede children, so one reverse sweep propagates bearing.
        let mut bearing = vec![false; elements.len()];
        for element in elements.iter().rev() {
            if skipped[element.index] {
                continue;
            }
            if by_dom.contains_key(&element.index) {
                bearing[element.index] = true;
            }
            if bearing[element.index] {
                if let Some(p) = element.parent {
                    bearing[p] = true;
                }
            }
        }

        let mut hierarchy = ComponentHierarchy {
            nodes: Vec::new(),
            root: None,
            groupings: self.groupings.clone(),
        };
        let Some(root) = tree.root().filter(|r| bearing[r.index]) else {
            debug!("no components; hierarchy is empty");
            return hierarchy;
        };

        let mut stack: Vec<(usize, Option<usize>)> = vec![(root.index, None)];
        while let Some((dom_index, parent)) = stack.pop() {
            let Some(element) = tree.get(dom_index) else {
                continue;
            };
            let id = hierarchy.nodes.len();
            let mut node = HierarchyNode::new(id, dom_index, &element.tag, parent);
            if let Some(component) = by_dom.get(&dom_index) {
                node.component_id = Some(component.id.clone());
                node.component_type = Some(component.component_type.clone());
            }
            hierarchy.nodes.push(node);
            if let Some(p) = parent {
                hierarchy.nodes[p].children.push(id);
            }
            for child in element.children.iter().rev() {
                if bearing[*child] && !skipped[*child] {
                    stack.push((*child, Some(id)));
                }
            }
        }
        hierarchy.root = Some(0);

        hierarchy.recompute_metrics();
        hierarchy.back_fill(components);
        debug!(nodes = hierarchy.len(), "component hierarchy built");
        hierarchy
    }
}
