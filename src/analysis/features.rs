//! Normalized visual feature vectors.

use serde::{Deserialize, Serialize};

use crate::types::VisualProperties;
use crate::viewport::Viewport;

pub const FEATURE_DIMENSIONS: usize = 15;

/// Fifteen visual features, each scaled to `[0, 1]`.
///
/// Layout: width, height, aspect ratio, background hue/saturation/lightness,
/// text hue/saturation/lightness, font size, font weight, padding, border
/// radius, shadow, border.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VisualFeatureVector(pub [f64; FEATURE_DIMENSIONS]);

impl Default for VisualFeatureVector {
    fn default() -> Self {
        Self([0.0; FEATURE_DIMENSIONS])
    }
}

impl VisualFeatureVector {
    /// Project an element into feature space relative to a viewport.
    ///
    /// A missing background reads as white and a missing text color as
    /// black, which is what the browser paints by default.
    pub fn from_visual(visual: &VisualProperties, viewport: &Viewport) -> Self {
        let bounds = visual.bounds();
        let ratio = bounds.aspect_ratio();

        let (bg_h, bg_s, bg_l) = visual
            .background_color()
            .filter(|c| !c.is_transparent())
            .map(|c| c.to_hsl())
            .unwrap_or((0.0, 0.0, 1.0));
        let (fg_h, fg_s, fg_l) = visual
            .text_color()
            .map(|c| c.to_hsl())
            .unwrap_or((0.0, 0.0, 0.0));

        let font = visual.font_size().unwrap_or(16.0);
        let weight = visual.font_weight().unwrap_or(400.0);

        let raw = [
            bounds.width() / viewport.width_px(),
            bounds.height() / viewport.height_px(),
            ratio / (ratio + 1.0),
            bg_h / 360.0,
            bg_s,
            bg_l,
            fg_h / 360.0,
            fg_s,
            fg_l,
            (font - 8.0) / 64.0,
            (weight - 100.0) / 800.0,
            visual.padding().unwrap_or(0.0) / 64.0,
            visual.border_radius().unwrap_or(0.0) / 50.0,
            flag(visual.has_shadow()),
            flag(visual.has_border()),
        ];
        Self(raw.map(|v| if v.is_finite() { v.clamp(0.0, 1.0) } else { 0.0 }))
    }

    pub fn distance(&self, other: &Self) -> f64 {
        self.0
            .iter()
            .zip(other.0.iter())
            .map(|(a, b)| (a - b).powi(2))
            .sum::<f64>()
            .sqrt()
    }

    /// Per-dimension mean; `None` for an empty set.
    pub fn centroid<'a>(vectors: impl IntoIterator<Item = &'a Self>) -> Option<Self> {
        let mut sum = [0.0; FEATURE_DIMENSIONS];
        let mut count = 0usize;
        for vector in vectors {
            for (acc, v) in sum.iter_mut().zip(vector.0.iter()) {
                *acc += v;
            }
            count += 1;
        }
        (count > 0).then(|| Self(sum.map(|s| s / count as f64)))
    }
}

fn flag(value: bool) -> f64 {
    if value {
        1.0
    } else {
        0.0
    }
}
