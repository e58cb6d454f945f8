//! Per-element style bag with typed accessors.
//!
//! A missing or empty style key is an explicit `None`, never an error; all
//! derived flags treat "absent" as "not present".

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::core::BoundingBox;
use crate::color::CssColor;

/// Resolved CSS property name -> value map for one element.
pub type StyleMap = BTreeMap<String, String>;

/// Measured box plus computed styles of one element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualProperties {
    bounds: BoundingBox,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    styles: StyleMap,
}

impl VisualProperties {
    pub fn new(bounds: BoundingBox, styles: StyleMap) -> Self {
        Self { bounds, styles }
    }

    pub fn bounds(&self) -> &BoundingBox {
        &self.bounds
    }

    pub fn styles(&self) -> &StyleMap {
        &self.styles
    }

    /// Raw value of a style property, `None` when absent or blank.
    pub fn style(&self, property: &str) -> Option<&str> {
        self.styles
            .get(property)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    pub fn font_size(&self) -> Option<f64> {
        self.style("font-size").and_then(parse_length)
    }

    /// Numeric font weight; keywords `normal`/`bold` map to 400/700.
    pub fn font_weight(&self) -> Option<f64> {
        match self.style("font-weight")? {
            "normal" => Some(400.0),
            "bold" | "bolder" => Some(700.0),
            "lighter" => Some(300.0),
            other => other.parse().ok(),
        }
    }

    /// Mean of the four padding sides in px.
    pub fn padding(&self) -> Option<f64> {
        let sides = box_sides(self, "padding")?;
        Some(sides.iter().sum::<f64>() / 4.0)
    }

    pub fn border_radius(&self) -> Option<f64> {
        self.style("border-radius")
            .or_else(|| self.style("border-top-left-radius"))
            .and_then(|v| v.split_whitespace().next())
            .and_then(|v| {
                if let Some(pct) = v.strip_suffix('%') {
                    let pct: f64 = pct.parse().ok()?;
                    Some(self.bounds.width().min(self.bounds.height()) * pct / 100.0)
                } else {
                    parse_length(v)
                }
            })
    }

    pub fn z_index(&self) -> Option<i64> {
        self.style("z-index").and_then(|v| v.parse().ok())
    }

    pub fn position(&self) -> Option<&str> {
        self.style("position")
    }

    pub fn background_color(&self) -> Option<CssColor> {
        self.style("background-color").and_then(CssColor::parse)
    }

    pub fn text_color(&self) -> Option<CssColor> {
        self.style("color").and_then(CssColor::parse)
    }

    pub fn has_shadow(&self) -> bool {
        self.style("box-shadow").is_some_and(|v| v != "none")
    }

    pub fn has_border(&self) -> bool {
        if let Some(style) = self.style("border-style") {
            if style.split_whitespace().all(|s| s == "none" || s == "hidden") {
                return false;
            }
        }
        let width = self
            .style("border-width")
            .or_else(|| self.style("border-top-width"))
            .and_then(|v| v.split_whitespace().filter_map(parse_length).reduce(f64::max));
        match width {
            Some(w) => w > 0.0,
            None => self
                .style("border")
                .is_some_and(|v| v != "none" && !v.starts_with("0px") && !v.starts_with("0 ")),
        }
    }

    pub fn has_border_radius(&self) -> bool {
        self.border_radius().is_some_and(|r| r > 0.0)
    }

    /// Opaque background color or a background image.
    pub fn has_distinct_background(&self) -> bool {
        let colored = self
            .background_color()
            .is_some_and(|c| !c.is_transparent());
        let imaged = self.style("background-image").is_some_and(|v| v != "none");
        colored || imaged
    }

    /// Horizontal center within 5% of the viewport center, or centered text.
    pub fn is_centered(&self, viewport_width: f64) -> bool {
        let (cx, _) = self.bounds.center();
        let near_center = viewport_width > 0.0
            && (cx - viewport_width / 2.0).abs() <= viewport_width * 0.05;
        near_center || self.style("text-align") == Some("center")
    }
}

/// Parse a CSS length into px. `rem`/`em` assume a 16px root.
pub fn parse_length(value: &str) -> Option<f64> {
    let value = value.trim();
    let (number, scale) = if let Some(n) = value.strip_suffix("px") {
        (n, 1.0)
    } else if let Some(n) = value.strip_suffix("rem") {
        (n, 16.0)
    } else if let Some(n) = value.strip_suffix("em") {
        (n, 16.0)
    } else {
        (value, 1.0)
    };
    let parsed: f64 = number.trim().parse().ok()?;
    parsed.is_finite().then_some(parsed * scale)
}

/// Resolve `[top, right, bottom, left]` for `padding`/`margin` from the
/// longhands, falling back to the shorthand.
fn box_sides(props: &VisualProperties, prefix: &str) -> Option<[f64; 4]> {
    let longhand = |side: &str| {
        props
            .style(&format!("{prefix}-{side}"))
            .and_then(parse_length)
    };
    let sides = [
        longhand("top"),
        longhand("right"),
        longhand("bottom"),
        longhand("left"),
    ];
    if sides.iter().any(Option::is_some) {
        return Some(sides.map(|s| s.unwrap_or(0.0)));
    }
    let values: Vec<f64> = props
        .style(prefix)?
        .split_whitespace()
        .filter_map(parse_length)
        .collect();
    match values.as_slice() {
        [all] => Some([*all; 4]),
        [v, h] => Some([*v, *h, *v, *h]),
        [t, h, b] => Some([*t, *h, *b, *h]),
        [t, r, b, l, ..] => Some([*t, *r, *b, *l]),
        [] => None,
    }
}
