//! Structural fingerprints of DOM subtrees.
//!
//! A fingerprint condenses a subtree into a depth-bounded tag signature
//! (`div[img,h3,p,a]`), a few counts and seven semantic presence flags. The
//! pipe-joined [`StructuralFingerprint::hash`] is the exact grouping key used
//! throughout the engine; [`StructuralFingerprint::similarity`] is the fuzzy
//! comparison.

use serde::{Deserialize, Serialize};

use crate::dom::{DomElement, DomTree};

/// Tags that never contribute to structure.
pub const NON_STRUCTURAL_TAGS: &[&str] = &[
    "script", "style", "noscript", "template", "meta", "link", "head", "title", "br", "wbr",
];

const HEADING_TAGS: &[&str] = &["h1", "h2", "h3", "h4", "h5", "h6"];
const IMAGE_TAGS: &[&str] = &["img", "svg", "picture"];
const MEDIA_TAGS: &[&str] = &["img", "svg", "picture", "video", "canvas"];
const FORM_CONTROL_TAGS: &[&str] = &["input", "select", "textarea"];
const LIST_TAGS: &[&str] = &["ul", "ol"];
const INTERACTIVE_TAGS: &[&str] = &["a", "button", "input", "select", "textarea"];

const SIGNATURE_WEIGHT: f64 = 3.0;
const CHILD_COUNT_WEIGHT: f64 = 1.0;
const FLAG_WEIGHT: f64 = 1.0;
const TOTAL_WEIGHT: f64 = SIGNATURE_WEIGHT + CHILD_COUNT_WEIGHT + FLAG_WEIGHT * 7.0;

/// Presence of semantic content among an element's descendants.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SemanticFlags {
    pub has_heading: bool,
    pub has_image: bool,
    pub has_link: bool,
    pub has_button: bool,
    pub has_form: bool,
    pub has_list: bool,
    pub has_table: bool,
}

impl SemanticFlags {
    fn as_array(&self) -> [bool; 7] {
        [
            self.has_heading,
            self.has_image,
            self.has_link,
            self.has_button,
            self.has_form,
            self.has_list,
            self.has_table,
        ]
    }

    /// Single-letter codes in fixed order, e.g. `HIL`.
    pub fn letters(&self) -> String {
        const LETTERS: [char; 7] = ['H', 'I', 'L', 'B', 'F', 'U', 'T'];
        self.as_array()
            .iter()
            .zip(LETTERS)
            .filter(|(set, _)| **set)
            .map(|(_, letter)| letter)
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuralFingerprint {
    pub tag_signature: String,
    pub child_count: usize,
    pub depth: usize,
    pub text_node_count: usize,
    pub interactive_count: usize,
    pub media_count: usize,
    pub flags: SemanticFlags,
    /// `role` attribute of the element itself (not hashed)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// `type` attribute of the element itself (not hashed)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_type: Option<String>,
    hash: String,
}

impl StructuralFingerprint {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        tag_signature: String,
        child_count: usize,
        depth: usize,
        text_node_count: usize,
        interactive_count: usize,
        media_count: usize,
        flags: SemanticFlags,
        role: Option<String>,
        input_type: Option<String>,
    ) -> Self {
        let hash = canonical_hash(
            &tag_signature,
            child_count,
            depth,
            text_node_count,
            interactive_count,
            media_count,
            &flags,
        );
        Self {
            tag_signature,
            child_count,
            depth,
            text_node_count,
            interactive_count,
            media_count,
            flags,
            role,
            input_type,
            hash,
        }
    }

    pub fn hash(&self) -> &str {
        &self.hash
    }

    /// Tag of the fingerprinted element itself.
    pub fn root_tag(&self) -> &str {
        root_tag_of(&self.tag_signature)
    }

    pub fn role_is(&self, role: &str) -> bool {
        self.role.as_deref() == Some(role)
    }

    /// Weighted structural similarity in `[0, 1]`; symmetric, and 1.0 for
    /// fingerprints with identical hashes.
    pub fn similarity(&self, other: &StructuralFingerprint) -> f64 {
        let mut score = 0.0;

        if self.tag_signature == other.tag_signature {
            score += SIGNATURE_WEIGHT;
        } else if self.root_tag() == other.root_tag() {
            score += SIGNATURE_WEIGHT / 2.0;
        }

        let child_delta = self.child_count.abs_diff(other.child_count);
        if child_delta == 0 {
            score += CHILD_COUNT_WEIGHT;
        } else if child_delta <= 2 {
            score += CHILD_COUNT_WEIGHT / 2.0;
        }

        let agreeing = self
            .flags
            .as_array()
            .iter()
            .zip(other.flags.as_array())
            .filter(|(a, b)| **a == *b)
            .count();
        score += agreeing as f64 * FLAG_WEIGHT;

        score / TOTAL_WEIGHT
    }
}

fn root_tag_of(signature: &str) -> &str {
    signature
        .split(['[', '*'])
        .next()
        .unwrap_or(signature)
}

fn canonical_hash(
    signature: &str,
    child_count: usize,
    depth: usize,
    text_node_count: usize,
    interactive_count: usize,
    media_count: usize,
    flags: &SemanticFlags,
) -> String {
    let mut parts = vec![signature.to_string()];
    for (prefix, count) in [
        ('c', child_count),
        ('d', depth),
        ('t', text_node_count),
        ('i', interactive_count),
        ('m', media_count),
    ] {
        if count > 0 {
            parts.push(format!("{prefix}{count}"));
        }
    }
    let letters = flags.letters();
    if !letters.is_empty() {
        parts.push(letters);
    }
    parts.join("|")
}

/// Builds fingerprints for elements of a [`DomTree`].
#[derive(Debug, Clone, Copy)]
pub struct FingerprintGenerator {
    pub max_depth: usize,
    pub max_children: usize,
}

impl Default for FingerprintGenerator {
    fn default() -> Self {
        Self {
            max_depth: 4,
            max_children: 10,
        }
    }
}

impl FingerprintGenerator {
    pub fn generate(&self, tree: &DomTree, index: usize) -> Option<StructuralFingerprint> {
        let element = tree.get(index)?;

        let has_descendant = |tags: &[&str]| tree.any_descendant(index, |e| tags.contains(&e.tag.as_str()));
        let flags = SemanticFlags {
            has_heading: has_descendant(HEADING_TAGS),
            has_image: has_descendant(IMAGE_TAGS),
            has_link: tree.any_descendant(index, |e| e.tag == "a" && e.attr("href").is_some()),
            has_button: tree.any_descendant(index, is_button_like),
            has_form: has_descendant(FORM_CONTROL_TAGS),
            has_list: has_descendant(LIST_TAGS),
            has_table: has_descendant(&["table"]),
        };

        let child_count = tree.children(index).filter(|c| is_structural(c)).count();
        let interactive_count = tree.descendants(index).filter(|e| is_interactive(e)).count();
        let media_count = tree
            .descendants(index)
            .filter(|e| MEDIA_TAGS.contains(&e.tag.as_str()))
            .count();

        Some(StructuralFingerprint::new(
            self.signature(tree, element, 0),
            child_count,
            element.depth,
            element.text_nodes.len(),
            interactive_count,
            media_count,
            flags,
            element.attr("role").map(str::to_ascii_lowercase),
            element.attr("type").map(str::to_ascii_lowercase),
        ))
    }

    fn signature(&self, tree: &DomTree, element: &DomElement, level: usize) -> String {
        let children: Vec<&DomElement> = tree
            .children(element.index)
            .filter(|c| is_structural(c))
            .take(self.max_children)
            .collect();
        if children.is_empty() {
            return element.tag.clone();
        }
        if level >= self.max_depth {
            return format!("{}[...]", element.tag);
        }

        let child_signatures: Vec<String> = children
            .iter()
            .map(|child| self.signature(tree, child, level + 1))
            .collect();
        format!("{}[{}]", element.tag, run_length(&child_signatures).join(","))
    }
}

/// Collapse consecutive identical entries into `sig*N`.
fn run_length(signatures: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    let mut iter = signatures.iter().peekable();
    while let Some(current) = iter.next() {
        let mut run = 1;
        while iter.peek().is_some_and(|next| *next == current) {
            iter.next();
            run += 1;
        }
        if run > 1 {
            out.push(format!("{current}*{run}"));
        } else {
            out.push(current.clone());
        }
    }
    out
}

pub(crate) fn is_structural(element: &DomElement) -> bool {
    !NON_STRUCTURAL_TAGS.contains(&element.tag.as_str())
}

fn is_button_like(element: &DomElement) -> bool {
    element.tag == "button"
        || element.attr("role") == Some("button")
        || (element.tag == "input"
            && matches!(element.attr("type"), Some("submit" | "button" | "reset")))
}

fn is_interactive(element: &DomElement) -> bool {
    INTERACTIVE_TAGS.contains(&element.tag.as_str())
        || element.attr("onclick").is_some()
        || element.attr("role") == Some("button")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fingerprint_of(html: &str, tag: &str) -> StructuralFingerprint {
        let tree = DomTree::parse_html(html);
        let index = tree
            .elements()
            .iter()
            .find(|e| e.tag == tag)
            .map(|e| e.index)
            .expect("tag present");
        FingerprintGenerator::default()
            .generate(&tree, index)
            .expect("fingerprint")
    }

    #[test]
    fn card_signature_and_flags() {
        let fp = fingerprint_of(
            r#"<html><body><article><img src="a.png"><h3>T</h3><p>B</p><a href="/x">More</a></article></body></html>"#,
            "article",
        );
        assert_eq!(fp.tag_signature, "article[img,h3,p,a]");
        assert_eq!(fp.child_count, 4);
        assert_eq!(fp.depth, 2);
        assert_eq!(fp.interactive_count, 1);
        assert_eq!(fp.media_count, 1);
        assert!(fp.flags.has_heading && fp.flags.has_image && fp.flags.has_link);
        assert!(!fp.flags.has_button);
        assert_eq!(fp.hash(), "article[img,h3,p,a]|c4|d2|i1|m1|HIL");
        assert_eq!(fp.root_tag(), "article");
    }

    #[test]
    fn repeated_children_are_run_length_compressed() {
        let fp = fingerprint_of(
            "<html><body><ul><li>a</li><li>b</li><li>c</li></ul></body></html>",
            "ul",
        );
        assert_eq!(fp.tag_signature, "ul[li*3]");
    }

    #[test]
    fn non_structural_children_are_ignored() {
        let fp = fingerprint_of(
            "<html><body><div><script>x()</script><span>a</span><style>p{}</style></div></body></html>",
            "div",
        );
        assert_eq!(fp.tag_signature, "div[span]");
        assert_eq!(fp.child_count, 1);
    }

    #[test]
    fn deep_content_collapses_at_depth_cap() {
        let fp = fingerprint_of(
            "<html><body><section><div><div><div><div><p>deep</p></div></div></div></div></section></body></html>",
            "section",
        );
        assert_eq!(fp.tag_signature, "section[div[div[div[div[...]]]]]");
    }

    #[test]
    fn children_beyond_limit_are_not_examined() {
        let items = "<li>x</li>".repeat(14);
        let fp = fingerprint_of(&format!("<html><body><ul>{items}</ul></body></html>"), "ul");
        assert_eq!(fp.tag_signature, "ul[li*10]");
        assert_eq!(fp.child_count, 14);
    }

    #[test]
    fn similarity_is_reflexive_and_symmetric() {
        let a = fingerprint_of(
            r#"<html><body><div><img src="a"><h3>T</h3><p>B</p></div></body></html>"#,
            "div",
        );
        let b = fingerprint_of(
            r#"<html><body><div><h3>T</h3><p>B</p><button>Go</button></div></body></html>"#,
            "div",
        );
        assert_eq!(a.similarity(&a), 1.0);
        assert_eq!(a.similarity(&b), b.similarity(&a));
        // Root tags match (1.5), child counts match (1), 5 of 7 flags agree.
        assert!((a.similarity(&b) - 7.5 / 11.0).abs() < 1e-9);
    }

    #[test]
    fn identical_hash_implies_full_similarity() {
        let html = r#"<html><body><button class="btn">A</button><button class="btn">B</button></body></html>"#;
        let tree = DomTree::parse_html(html);
        let generator = FingerprintGenerator::default();
        let a = generator.generate(&tree, 3).unwrap();
        let b = generator.generate(&tree, 4).unwrap();
        assert_eq!(a.hash(), b.hash());
        assert_eq!(a.similarity(&b), 1.0);
    }

    #[test]
    fn interactive_count_includes_onclick_and_roles() {
        let fp = fingerprint_of(
            r#"<html><body><nav><span onclick="go()">A</span><div role="button">B</div><a href="/">C</a></nav></body></html>"#,
            "nav",
        );
        assert_eq!(fp.interactive_count, 3);
        assert!(fp.flags.has_button);
        assert!(fp.flags.has_link);
    }
}
