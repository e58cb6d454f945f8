use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// Viewport a page was rendered at. Feature normalization and the
/// centered/near-top heuristics are relative to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
        }
    }
}

impl Viewport {
    pub fn width_px(&self) -> f64 {
        self.width as f64
    }

    pub fn height_px(&self) -> f64 {
        self.height as f64
    }
}

#[derive(Debug, Error)]
pub enum ViewportParseError {
    #[error("Invalid viewport format: expected WIDTHxHEIGHT (e.g., 1920x1080)")]
    InvalidFormat,
    #[error("Invalid width: {0}")]
    InvalidWidth(String),
    #[error("Invalid height: {0}")]
    InvalidHeight(String),
    #[error("Viewport dimensions must be positive")]
    Zero,
}

impl FromStr for Viewport {
    type Err = ViewportParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (w, h) = s
            .trim()
            .split_once(['x', 'X'])
            .ok_or(ViewportParseError::InvalidFormat)?;
        if h.contains(['x', 'X']) {
            return Err(ViewportParseError::InvalidFormat);
        }

        let width: u32 = w
            .trim()
            .parse()
            .map_err(|_| ViewportParseError::InvalidWidth(w.trim().to_string()))?;
        let height: u32 = h
            .trim()
            .parse()
            .map_err(|_| ViewportParseError::InvalidHeight(h.trim().to_string()))?;

        if width == 0 || height == 0 {
            return Err(ViewportParseError::Zero);
        }

        Ok(Viewport { width, height })
    }
}

impl std::fmt::Display for Viewport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_width_by_height() {
        let vp: Viewport = " 1280 x 800 ".parse().unwrap();
        assert_eq!((vp.width, vp.height), (1280, 800));
        let upper: Viewport = "375X812".parse().unwrap();
        assert_eq!((upper.width, upper.height), (375, 812));
    }

    #[test]
    fn rejects_malformed_values() {
        assert!("1440".parse::<Viewport>().is_err());
        assert!("1440x900x600".parse::<Viewport>().is_err());
        assert!("abcx900".parse::<Viewport>().is_err());
        assert!("0x900".parse::<Viewport>().is_err());
    }

    #[test]
    fn default_is_desktop_full_hd() {
        let vp = Viewport::default();
        assert_eq!(vp.to_string(), "1920x1080");
        assert_eq!(vp.width_px(), 1920.0);
    }
}
