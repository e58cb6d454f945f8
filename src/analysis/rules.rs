//! Component type rules.
//!
//! Every rule maps a fingerprint plus visual properties to a score in
//! `[0, 1]`. Rules apply hard gates first (returning 0.0 when a required
//! feature is absent) and then add weighted partial credit; the weights
//! listed on each rule sum to at most 1.0. The catalog is ordered and ties
//! go to the earlier rule.

use crate::analysis::fingerprint::StructuralFingerprint;
use crate::types::VisualProperties;

/// A single scoring rule for one component type.
pub trait ComponentRule: Send + Sync {
    fn component_type(&self) -> &str;
    fn score(&self, fingerprint: &StructuralFingerprint, visual: &VisualProperties) -> f64;
}

pub type ScoreFn = fn(&StructuralFingerprint, &VisualProperties) -> f64;

/// A rule backed by a plain function, used for the built-in table.
#[derive(Debug, Clone, Copy)]
pub struct FnRule {
    pub name: &'static str,
    pub scorer: ScoreFn,
}

impl ComponentRule for FnRule {
    fn component_type(&self) -> &str {
        self.name
    }

    fn score(&self, fingerprint: &StructuralFingerprint, visual: &VisualProperties) -> f64 {
        (self.scorer)(fingerprint, visual).clamp(0.0, 1.0)
    }
}

const STANDARD_RULES: &[FnRule] = &[
    FnRule { name: "navigation", scorer: navigation },
    FnRule { name: "hero", scorer: hero },
    FnRule { name: "footer", scorer: footer },
    FnRule { name: "modal", scorer: modal },
    FnRule { name: "card", scorer: card },
    FnRule { name: "button", scorer: button },
    FnRule { name: "input", scorer: input },
    FnRule { name: "form", scorer: form },
    FnRule { name: "avatar", scorer: avatar },
    FnRule { name: "badge", scorer: badge },
    FnRule { name: "icon", scorer: icon },
    FnRule { name: "image", scorer: image },
    FnRule { name: "list", scorer: list },
    FnRule { name: "table", scorer: table },
    FnRule { name: "heading", scorer: heading },
    FnRule { name: "label", scorer: label },
    FnRule { name: "link", scorer: link },
    FnRule { name: "text", scorer: text },
];

/// Ordered rule catalog. Built once, then shared read-only.
pub struct RuleCatalog {
    rules: Vec<Box<dyn ComponentRule>>,
}

impl std::fmt::Debug for RuleCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.rules.iter().map(|r| r.component_type()))
            .finish()
    }
}

impl Default for RuleCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

impl RuleCatalog {
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    pub fn standard() -> Self {
        let mut catalog = Self::empty();
        for rule in STANDARD_RULES {
            catalog.register(*rule);
        }
        catalog
    }

    /// Append a rule; it loses ties against every rule already registered.
    pub fn register(&mut self, rule: impl ComponentRule + 'static) {
        self.rules.push(Box::new(rule));
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn types(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(|r| r.component_type())
    }

    /// Highest-scoring `(type, score)`; earlier rules win ties.
    pub fn best_match(
        &self,
        fingerprint: &StructuralFingerprint,
        visual: &VisualProperties,
    ) -> Option<(&str, f64)> {
        let mut best: Option<(&str, f64)> = None;
        for rule in &self.rules {
            let score = rule.score(fingerprint, visual);
            if best.map_or(true, |(_, s)| score > s) {
                best = Some((rule.component_type(), score));
            }
        }
        best
    }
}

/// Accumulates weighted credit for one rule.
struct Credit(f64);

impl Credit {
    fn new() -> Self {
        Credit(0.0)
    }

    fn add(&mut self, weight: f64, condition: bool) -> &mut Self {
        if condition {
            self.0 += weight;
        }
        self
    }

    fn total(&self) -> f64 {
        self.0
    }
}

fn is_heading_tag(tag: &str) -> bool {
    matches!(tag, "h1" | "h2" | "h3" | "h4" | "h5" | "h6")
}

fn width(v: &VisualProperties) -> f64 {
    v.bounds().width()
}

fn height(v: &VisualProperties) -> f64 {
    v.bounds().height()
}

/// Gate: `<nav>`, `role=navigation`, or a link cluster.
/// Weights: landmark 0.4, >=3 interactive 0.2, list 0.1, near top 0.15,
/// wide 0.1, horizontal 0.05.
fn navigation(fp: &StructuralFingerprint, v: &VisualProperties) -> f64 {
    let landmark = fp.root_tag() == "nav" || fp.role_is("navigation");
    if !landmark && !(fp.flags.has_link && fp.interactive_count >= 3) {
        return 0.0;
    }
    Credit::new()
        .add(0.4, landmark)
        .add(0.2, fp.interactive_count >= 3)
        .add(0.1, fp.flags.has_list)
        .add(0.15, v.bounds().y() < 200.0)
        .add(0.1, width(v) >= 600.0)
        .add(0.05, v.bounds().aspect_ratio() > 3.0)
        .total()
}

/// Gate: at least 800x300.
/// Weights: heading 0.3, call to action 0.2, above the fold 0.2,
/// background 0.15, section/header tag 0.1, multiple children 0.05.
fn hero(fp: &StructuralFingerprint, v: &VisualProperties) -> f64 {
    if width(v) < 800.0 || height(v) < 300.0 {
        return 0.0;
    }
    Credit::new()
        .add(0.3, fp.flags.has_heading)
        .add(0.2, fp.flags.has_button || fp.flags.has_link)
        .add(0.2, v.bounds().y() < 800.0)
        .add(0.15, v.has_distinct_background())
        .add(0.1, matches!(fp.root_tag(), "section" | "header"))
        .add(0.05, fp.child_count >= 2)
        .total()
}

/// Gate: `<footer>`, `role=contentinfo`, or a wide low block of links.
/// Weights: landmark 0.45, links 0.2, low on page 0.15, wide 0.1, list 0.1.
fn footer(fp: &StructuralFingerprint, v: &VisualProperties) -> f64 {
    let landmark = fp.root_tag() == "footer" || fp.role_is("contentinfo");
    let low = v.bounds().y() > 600.0;
    if !landmark && !(fp.flags.has_link && low && width(v) >= 800.0) {
        return 0.0;
    }
    Credit::new()
        .add(0.45, landmark)
        .add(0.2, fp.flags.has_link)
        .add(0.15, low)
        .add(0.1, width(v) >= 800.0)
        .add(0.1, fp.flags.has_list)
        .total()
}

/// Gate: dialog semantics, or fixed/absolute positioning above z-index 100.
/// Weights: dialog 0.3, z-index 0.2 (0.1 below 1000), fixed 0.15,
/// shadow 0.15, button 0.1, rounded 0.1.
fn modal(fp: &StructuralFingerprint, v: &VisualProperties) -> f64 {
    let dialog = fp.root_tag() == "dialog" || fp.role_is("dialog") || fp.role_is("alertdialog");
    let z = v.z_index().unwrap_or(0);
    let layered = matches!(v.position(), Some("fixed" | "absolute")) && z >= 100;
    if !dialog && !layered {
        return 0.0;
    }
    Credit::new()
        .add(0.3, dialog)
        .add(0.2, z >= 1000)
        .add(0.1, (100..1000).contains(&z))
        .add(0.15, v.position() == Some("fixed"))
        .add(0.15, v.has_shadow())
        .add(0.1, fp.flags.has_button)
        .add(0.1, v.has_border_radius())
        .total()
}

/// Gate: image and heading.
/// Weights: image+heading 0.35, card-sized 0.2, shadow 0.15 or else
/// border 0.1, rounded 0.1, 2-8 children 0.1, link or button 0.1.
fn card(fp: &StructuralFingerprint, v: &VisualProperties) -> f64 {
    if !(fp.flags.has_image && fp.flags.has_heading) {
        return 0.0;
    }
    let sized = (150.0..=600.0).contains(&width(v)) && (150.0..=800.0).contains(&height(v));
    Credit::new()
        .add(0.35, true)
        .add(0.2, sized)
        .add(0.15, v.has_shadow())
        .add(0.1, !v.has_shadow() && v.has_border())
        .add(0.1, v.has_border_radius())
        .add(0.1, (2..=8).contains(&fp.child_count))
        .add(0.1, fp.flags.has_link || fp.flags.has_button)
        .total()
}

/// Gate: interactive element with a background or border.
/// Weights: interactive tag/role 0.3, button-sized 0.2, label 0.15,
/// rounded 0.1, padded 0.1, at most 2 children 0.05.
fn button(fp: &StructuralFingerprint, v: &VisualProperties) -> f64 {
    if !(v.has_distinct_background() || v.has_border()) {
        return 0.0;
    }
    let tag = fp.root_tag();
    let input_button = tag == "input"
        && matches!(fp.input_type.as_deref(), Some("submit" | "button" | "reset"));
    let interactive = tag == "button" || tag == "a" || fp.role_is("button") || input_button;
    if !interactive {
        return 0.0;
    }
    let sized = (40.0..=400.0).contains(&width(v)) && (20.0..=80.0).contains(&height(v));
    Credit::new()
        .add(0.3, true)
        .add(0.2, sized)
        .add(0.15, fp.text_node_count >= 1 || input_button)
        .add(0.1, v.has_border_radius())
        .add(0.1, v.padding().is_some_and(|p| p > 0.0))
        .add(0.05, fp.child_count <= 2)
        .total()
}

/// Gate: text-entry control.
/// Weights: control 0.45, border 0.15, input height 0.15, input width 0.15.
fn input(fp: &StructuralFingerprint, v: &VisualProperties) -> f64 {
    let tag = fp.root_tag();
    let entry = match tag {
        "textarea" | "select" => true,
        "input" => !matches!(
            fp.input_type.as_deref(),
            Some("submit" | "button" | "reset" | "hidden" | "checkbox" | "radio")
        ),
        _ => false,
    };
    if !entry {
        return 0.0;
    }
    Credit::new()
        .add(0.45, true)
        .add(0.15, v.has_border())
        .add(0.15, (20.0..=60.0).contains(&height(v)) || tag == "textarea")
        .add(0.15, width(v) >= 100.0)
        .total()
}

/// Gate: `<form>` or controls with a submit button.
/// Weights: form tag 0.35, controls 0.25, button 0.2, >=2 children 0.1,
/// width 0.1.
fn form(fp: &StructuralFingerprint, v: &VisualProperties) -> f64 {
    let tag_form = fp.root_tag() == "form";
    if !tag_form && !(fp.flags.has_form && fp.flags.has_button) {
        return 0.0;
    }
    Credit::new()
        .add(0.35, tag_form)
        .add(0.25, fp.flags.has_form)
        .add(0.2, fp.flags.has_button)
        .add(0.1, fp.child_count >= 2)
        .add(0.1, width(v) >= 200.0)
        .total()
}

/// Gate: near-circular, near-square and small.
/// Weights: shape 0.45, image 0.25, avatar size 0.2.
fn avatar(fp: &StructuralFingerprint, v: &VisualProperties) -> f64 {
    let (w, h) = (width(v), height(v));
    let short = w.min(h);
    let circular = v.border_radius().is_some_and(|r| r >= short / 2.0 * 0.9);
    let square = (w - h).abs() <= w.max(h) * 0.15;
    if !(circular && square && w <= 200.0) {
        return 0.0;
    }
    let imaged = fp.flags.has_image || matches!(fp.root_tag(), "img" | "picture" | "svg");
    Credit::new()
        .add(0.45, true)
        .add(0.25, imaged)
        .add(0.2, (24.0..=120.0).contains(&w))
        .total()
}

/// Gate: small filled label.
/// Weights: text 0.25, rounded 0.15, inline tag 0.15, small font 0.1,
/// leaf 0.15.
fn badge(fp: &StructuralFingerprint, v: &VisualProperties) -> f64 {
    if !(height(v) <= 32.0 && width(v) <= 150.0 && v.has_distinct_background()) {
        return 0.0;
    }
    if matches!(fp.root_tag(), "button" | "a" | "input" | "img") {
        return 0.0;
    }
    Credit::new()
        .add(0.25, fp.text_node_count >= 1)
        .add(0.15, v.has_border_radius())
        .add(0.15, matches!(fp.root_tag(), "span" | "small" | "sup" | "mark"))
        .add(0.1, v.font_size().is_some_and(|f| f <= 14.0))
        .add(0.15, fp.child_count == 0)
        .total()
}

/// Gate: at most 48x48 glyph or graphic.
/// Weights: graphic 0.4, square 0.2, no text 0.1.
fn icon(fp: &StructuralFingerprint, v: &VisualProperties) -> f64 {
    let (w, h) = (width(v), height(v));
    if w > 48.0 || h > 48.0 {
        return 0.0;
    }
    let graphic = matches!(fp.root_tag(), "svg" | "i" | "img") || fp.media_count == 1;
    if !graphic {
        return 0.0;
    }
    Credit::new()
        .add(0.4, true)
        .add(0.2, (w - h).abs() <= 4.0)
        .add(0.1, fp.text_node_count == 0)
        .total()
}

/// Gate: image element.
/// Weights: tag 0.45, at least 50x50 0.15, rounded or shadowed 0.1.
fn image(fp: &StructuralFingerprint, v: &VisualProperties) -> f64 {
    if !matches!(fp.root_tag(), "img" | "picture" | "svg" | "video") {
        return 0.0;
    }
    Credit::new()
        .add(0.45, true)
        .add(0.15, width(v) >= 50.0 && height(v) >= 50.0)
        .add(0.1, v.has_border_radius() || v.has_shadow())
        .total()
}

/// Gate: `<ul>`/`<ol>`.
/// Weights: tag 0.35, >=2 items 0.25, links 0.1, width 0.1.
fn list(fp: &StructuralFingerprint, v: &VisualProperties) -> f64 {
    if !matches!(fp.root_tag(), "ul" | "ol") {
        return 0.0;
    }
    Credit::new()
        .add(0.35, true)
        .add(0.25, fp.child_count >= 2)
        .add(0.1, fp.flags.has_link)
        .add(0.1, width(v) >= 100.0)
        .total()
}

/// Gate: `<table>`. Weights: tag 0.6, rows 0.2.
fn table(fp: &StructuralFingerprint, _v: &VisualProperties) -> f64 {
    if fp.root_tag() != "table" {
        return 0.0;
    }
    Credit::new()
        .add(0.6, true)
        .add(0.2, fp.child_count >= 1)
        .total()
}

/// Gate: `<h1>`-`<h6>`. Weights: tag 0.5, large font 0.1, text 0.1.
fn heading(fp: &StructuralFingerprint, v: &VisualProperties) -> f64 {
    if !is_heading_tag(fp.root_tag()) {
        return 0.0;
    }
    Credit::new()
        .add(0.5, true)
        .add(0.1, v.font_size().is_some_and(|f| f >= 20.0))
        .add(0.1, fp.text_node_count >= 1)
        .total()
}

/// Gate: `<label>`. Weights: tag 0.5, text 0.1, small font 0.1.
fn label(fp: &StructuralFingerprint, v: &VisualProperties) -> f64 {
    if fp.root_tag() != "label" {
        return 0.0;
    }
    Credit::new()
        .add(0.5, true)
        .add(0.1, fp.text_node_count >= 1)
        .add(0.1, v.font_size().map_or(true, |f| f <= 16.0))
        .total()
}

/// Gate: plain anchor. Weights: tag 0.45, text 0.1, font 0.05, inline width 0.1.
fn link(fp: &StructuralFingerprint, v: &VisualProperties) -> f64 {
    if fp.root_tag() != "a" || v.has_distinct_background() || v.has_border() {
        return 0.0;
    }
    Credit::new()
        .add(0.45, true)
        .add(0.1, fp.text_node_count >= 1)
        .add(0.05, v.font_size().is_some())
        .add(0.1, width(v) <= 400.0)
        .total()
}

/// Gate: paragraph-like text leaf.
/// Weights: tag 0.4, text 0.1, leaf-ish 0.1, readable font 0.1.
fn text(fp: &StructuralFingerprint, v: &VisualProperties) -> f64 {
    if !matches!(fp.root_tag(), "p" | "span" | "blockquote" | "small" | "strong" | "em") {
        return 0.0;
    }
    if fp.text_node_count == 0 {
        return 0.0;
    }
    Credit::new()
        .add(0.4, true)
        .add(0.1, true)
        .add(0.1, fp.child_count <= 2)
        .add(0.1, v.font_size().is_some_and(|f| (10.0..=24.0).contains(&f)))
        .total()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::fingerprint::{SemanticFlags, StructuralFingerprint};
    use crate::types::BoundingBox;

    fn fp(signature: &str, children: usize, text: usize, flags: SemanticFlags) -> StructuralFingerprint {
        StructuralFingerprint::new(signature.into(), children, 3, text, 0, 0, flags, None, None)
    }

    fn visual(x: f64, y: f64, w: f64, h: f64, styles: &[(&str, &str)]) -> VisualProperties {
        VisualProperties::new(
            BoundingBox::new(x, y, w, h).unwrap(),
            styles
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn standard_catalog_order() {
        let catalog = RuleCatalog::standard();
        let types: Vec<&str> = catalog.types().collect();
        assert_eq!(types.first(), Some(&"navigation"));
        assert!(types.contains(&"card"));
        assert_eq!(catalog.len(), STANDARD_RULES.len());
    }

    #[test]
    fn card_scores_above_threshold() {
        let flags = SemanticFlags {
            has_heading: true,
            has_image: true,
            ..Default::default()
        };
        let f = fp("div[img,h3,p]", 3, 0, flags);
        let v = visual(
            100.0,
            900.0,
            300.0,
            400.0,
            &[("box-shadow", "rgba(0, 0, 0, 0.1) 0px 4px 6px 0px")],
        );
        let score = card(&f, &v);
        assert!(score >= 0.65, "card score was {score}");
        let catalog = RuleCatalog::standard();
        assert_eq!(catalog.best_match(&f, &v).map(|(t, _)| t), Some("card"));
    }

    #[test]
    fn card_border_credit_only_without_shadow() {
        let flags = SemanticFlags {
            has_heading: true,
            has_image: true,
            has_link: true,
            ..Default::default()
        };
        let f = fp("div[img,h3,p,a]", 4, 0, flags);
        let everything = visual(
            0.0,
            0.0,
            300.0,
            400.0,
            &[
                ("box-shadow", "rgba(0, 0, 0, 0.1) 0px 4px 6px 0px"),
                ("border-width", "1px"),
                ("border-style", "solid"),
                ("border-radius", "8px"),
            ],
        );
        let score = card(&f, &everything);
        assert!((score - 1.0).abs() < 1e-9, "card score was {score}");

        let bordered = visual(
            0.0,
            0.0,
            300.0,
            400.0,
            &[
                ("border-width", "1px"),
                ("border-style", "solid"),
                ("border-radius", "8px"),
            ],
        );
        let score = card(&f, &bordered);
        assert!((score - 0.95).abs() < 1e-9, "card score was {score}");
    }

    #[test]
    fn card_requires_image_and_heading() {
        let flags = SemanticFlags {
            has_heading: true,
            ..Default::default()
        };
        let v = visual(0.0, 0.0, 300.0, 400.0, &[("box-shadow", "0 1px 2px black")]);
        assert_eq!(card(&fp("div[h3,p]", 2, 0, flags), &v), 0.0);
    }

    #[test]
    fn button_requires_background_or_border() {
        let f = fp("button", 0, 1, SemanticFlags::default());
        let plain = visual(0.0, 0.0, 120.0, 40.0, &[]);
        assert_eq!(button(&f, &plain), 0.0);

        let filled = visual(
            0.0,
            0.0,
            120.0,
            40.0,
            &[
                ("background-color", "rgb(59, 130, 246)"),
                ("padding", "8px 16px"),
                ("border-radius", "6px"),
            ],
        );
        assert!((button(&f, &filled) - 0.9).abs() < 1e-9);
    }

    #[test]
    fn avatar_requires_circle() {
        let f = fp("img", 0, 0, SemanticFlags::default());
        let round = visual(0.0, 0.0, 48.0, 48.0, &[("border-radius", "50%")]);
        let square = visual(0.0, 0.0, 48.0, 48.0, &[("border-radius", "4px")]);
        assert!((avatar(&f, &round) - 0.9).abs() < 1e-9);
        assert_eq!(avatar(&f, &square), 0.0);
        let catalog = RuleCatalog::standard();
        assert_eq!(catalog.best_match(&f, &round).map(|(t, _)| t), Some("avatar"));
    }

    #[test]
    fn modal_needs_layering() {
        let f = fp("div[h2,p,button]", 3, 0, SemanticFlags {
            has_button: true,
            has_heading: true,
            ..Default::default()
        });
        let flat = visual(400.0, 200.0, 500.0, 300.0, &[]);
        assert_eq!(modal(&f, &flat), 0.0);
        let layered = visual(
            400.0,
            200.0,
            500.0,
            300.0,
            &[
                ("position", "fixed"),
                ("z-index", "1000"),
                ("box-shadow", "0 10px 20px black"),
            ],
        );
        assert!((modal(&f, &layered) - 0.6).abs() < 1e-9);
    }

    struct Always(&'static str, f64);

    impl ComponentRule for Always {
        fn component_type(&self) -> &str {
            self.0
        }

        fn score(&self, _: &StructuralFingerprint, _: &VisualProperties) -> f64 {
            self.1
        }
    }

    #[test]
    fn ties_go_to_the_earlier_rule() {
        let mut catalog = RuleCatalog::empty();
        catalog.register(Always("first", 0.7));
        catalog.register(Always("second", 0.7));
        catalog.register(Always("third", 0.5));
        let f = fp("div", 0, 0, SemanticFlags::default());
        let v = visual(0.0, 0.0, 10.0, 10.0, &[]);
        assert_eq!(catalog.best_match(&f, &v), Some(("first", 0.7)));
    }

    #[test]
    fn registered_rules_participate_without_detector_changes() {
        let mut catalog = RuleCatalog::standard();
        catalog.register(Always("pricing-table", 0.99));
        let f = fp("div", 0, 0, SemanticFlags::default());
        let v = visual(0.0, 0.0, 10.0, 10.0, &[]);
        assert_eq!(catalog.best_match(&f, &v).map(|(t, _)| t), Some("pricing-table"));
    }
}
