//! Geometry primitives shared by every analysis stage.
//!
//! - [`BoundingBox`] - measured element rectangle in viewport pixels

use serde::{Deserialize, Serialize};

use crate::error::{CbxError, Result};

/// Rectangle bounds for an element, in viewport pixel coordinates.
///
/// Width and height are validated at construction and never negative.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawBoundingBox")]
pub struct BoundingBox {
    x: f64,
    y: f64,
    width: f64,
    height: f64,
}

#[derive(Deserialize)]
struct RawBoundingBox {
    x: f64,
    y: f64,
    width: f64,
    height: f64,
}

impl TryFrom<RawBoundingBox> for BoundingBox {
    type Error = CbxError;

    fn try_from(raw: RawBoundingBox) -> Result<Self> {
        BoundingBox::new(raw.x, raw.y, raw.width, raw.height)
    }
}

impl BoundingBox {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Result<Self> {
        if !(x.is_finite() && y.is_finite() && width.is_finite() && height.is_finite()) {
            return Err(CbxError::invariant(format!(
                "bounding box has non-finite coordinates ({x}, {y}, {width}, {height})"
            )));
        }
        if width < 0.0 {
            return Err(CbxError::invariant(format!(
                "bounding box width is negative ({width})"
            )));
        }
        if height < 0.0 {
            return Err(CbxError::invariant(format!(
                "bounding box height is negative ({height})"
            )));
        }
        Ok(Self {
            x,
            y,
            width,
            height,
        })
    }

    pub fn x(&self) -> f64 {
        self.x
    }

    pub fn y(&self) -> f64 {
        self.y
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    /// Width divided by height; 0.0 for zero-height boxes.
    pub fn aspect_ratio(&self) -> f64 {
        if self.height > 0.0 {
            self.width / self.height
        } else {
            0.0
        }
    }

    pub fn intersection_area(&self, other: &BoundingBox) -> f64 {
        let overlap_w = self.right().min(other.right()) - self.x.max(other.x);
        let overlap_h = self.bottom().min(other.bottom()) - self.y.max(other.y);
        if overlap_w <= 0.0 || overlap_h <= 0.0 {
            0.0
        } else {
            overlap_w * overlap_h
        }
    }
}
