//! CSS color parsing and projection.
//!
//! Computed styles report colors as `rgb(...)`/`rgba(...)`; hex and a handful
//! of keywords are accepted too so hand-written captures work. Colors are
//! projected to HSL through `palette` for the feature vector and semantic
//! naming.

use palette::{FromColor, Hsl, Srgb};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CssColor {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
    pub alpha: f32,
}

impl CssColor {
    pub const fn rgb(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red,
            green,
            blue,
            alpha: 1.0,
        }
    }

    /// Parse a CSS color value. Returns `None` for anything unrecognized
    /// (gradients, `currentcolor`, `var(...)`).
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim().to_ascii_lowercase();
        if let Some(hex) = value.strip_prefix('#') {
            return parse_hex(hex);
        }
        if let Some(args) = value
            .strip_prefix("rgba(")
            .or_else(|| value.strip_prefix("rgb("))
        {
            return parse_rgb_args(args.strip_suffix(')')?);
        }
        match value.as_str() {
            "transparent" => Some(Self {
                red: 0,
                green: 0,
                blue: 0,
                alpha: 0.0,
            }),
            "white" => Some(Self::rgb(255, 255, 255)),
            "black" => Some(Self::rgb(0, 0, 0)),
            "red" => Some(Self::rgb(255, 0, 0)),
            "green" => Some(Self::rgb(0, 128, 0)),
            "blue" => Some(Self::rgb(0, 0, 255)),
            "gray" | "grey" => Some(Self::rgb(128, 128, 128)),
            _ => None,
        }
    }

    pub fn is_transparent(&self) -> bool {
        self.alpha <= 0.01
    }

    /// Hue in degrees `[0, 360)`, saturation and lightness in `[0, 1]`.
    pub fn to_hsl(&self) -> (f64, f64, f64) {
        let rgb = Srgb::new(
            self.red as f32 / 255.0,
            self.green as f32 / 255.0,
            self.blue as f32 / 255.0,
        );
        let hsl: Hsl = Hsl::from_color(rgb);
        (
            hsl.hue.into_positive_degrees() as f64 % 360.0,
            hsl.saturation.clamp(0.0, 1.0) as f64,
            hsl.lightness.clamp(0.0, 1.0) as f64,
        )
    }

    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.red, self.green, self.blue)
    }

    /// Snap every channel down to a multiple of `step` so near-identical
    /// colors share a key.
    pub fn quantized(&self, step: u8) -> Self {
        let step = step.max(1);
        let snap = |c: u8| (c / step) * step;
        Self {
            red: snap(self.red),
            green: snap(self.green),
            blue: snap(self.blue),
            alpha: self.alpha,
        }
    }
}

fn parse_hex(hex: &str) -> Option<CssColor> {
    let digits: Vec<u8> = hex
        .chars()
        .map(|c| c.to_digit(16).map(|d| d as u8))
        .collect::<Option<_>>()?;
    let pair = |hi: u8, lo: u8| hi * 16 + lo;
    match digits.len() {
        3 | 4 => Some(CssColor {
            red: pair(digits[0], digits[0]),
            green: pair(digits[1], digits[1]),
            blue: pair(digits[2], digits[2]),
            alpha: digits
                .get(3)
                .map(|a| pair(*a, *a) as f32 / 255.0)
                .unwrap_or(1.0),
        }),
        6 | 8 => Some(CssColor {
            red: pair(digits[0], digits[1]),
            green: pair(digits[2], digits[3]),
            blue: pair(digits[4], digits[5]),
            alpha: if digits.len() == 8 {
                pair(digits[6], digits[7]) as f32 / 255.0
            } else {
                1.0
            },
        }),
        _ => None,
    }
}

fn parse_rgb_args(args: &str) -> Option<CssColor> {
    // Accepts both `r, g, b, a` and the space form `r g b / a`.
    let parts: Vec<&str> = args
        .split(|c: char| c == ',' || c == '/' || c.is_whitespace())
        .filter(|p| !p.is_empty())
        .collect();
    if parts.len() < 3 {
        return None;
    }
    let channel = |s: &str| -> Option<u8> {
        let v = if let Some(pct) = s.strip_suffix('%') {
            pct.parse::<f32>().ok()? * 2.55
        } else {
            s.parse::<f32>().ok()?
        };
        Some(v.round().clamp(0.0, 255.0) as u8)
    };
    let alpha = match parts.get(3) {
        Some(a) => {
            if let Some(pct) = a.strip_suffix('%') {
                pct.parse::<f32>().ok()? / 100.0
            } else {
                a.parse::<f32>().ok()?
            }
        }
        None => 1.0,
    };
    Some(CssColor {
        red: channel(parts[0])?,
        green: channel(parts[1])?,
        blue: channel(parts[2])?,
        alpha: alpha.clamp(0.0, 1.0),
    })
}

/// Named color role used for color variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SemanticColor {
    Primary,
    Secondary,
    Success,
    Danger,
    Warning,
    Info,
    Neutral,
    Dark,
    Light,
    Transparent,
}

impl SemanticColor {
    pub fn as_str(&self) -> &'static str {
        match self {
            SemanticColor::Primary => "primary",
            SemanticColor::Secondary => "secondary",
            SemanticColor::Success => "success",
            SemanticColor::Danger => "danger",
            SemanticColor::Warning => "warning",
            SemanticColor::Info => "info",
            SemanticColor::Neutral => "neutral",
            SemanticColor::Dark => "dark",
            SemanticColor::Light => "light",
            SemanticColor::Transparent => "transparent",
        }
    }
}

/// A hue band (degrees, inclusive start, exclusive end) mapped to a role.
#[derive(Debug, Clone, Copy)]
pub struct HueBand {
    pub start: f64,
    pub end: f64,
    pub role: SemanticColor,
}

/// Immutable hue/lightness table used to name colors.
///
/// Built once and shared by reference; nothing mutates it after
/// construction.
#[derive(Debug, Clone)]
pub struct SemanticPalette {
    pub bands: Vec<HueBand>,
    /// Saturation below this is treated as a gray.
    pub min_saturation: f64,
    pub dark_lightness: f64,
    pub light_lightness: f64,
}

impl Default for SemanticPalette {
    fn default() -> Self {
        Self {
            bands: vec![
                HueBand {
                    start: 0.0,
                    end: 20.0,
                    role: SemanticColor::Danger,
                },
                HueBand {
                    start: 20.0,
                    end: 65.0,
                    role: SemanticColor::Warning,
                },
                HueBand {
                    start: 65.0,
                    end: 170.0,
                    role: SemanticColor::Success,
                },
                HueBand {
                    start: 170.0,
                    end: 200.0,
                    role: SemanticColor::Info,
                },
                HueBand {
                    start: 200.0,
                    end: 260.0,
                    role: SemanticColor::Primary,
                },
                HueBand {
                    start: 260.0,
                    end: 330.0,
                    role: SemanticColor::Secondary,
                },
                HueBand {
                    start: 330.0,
                    end: 360.0,
                    role: SemanticColor::Danger,
                },
            ],
            min_saturation: 0.15,
            dark_lightness: 0.2,
            light_lightness: 0.92,
        }
    }
}

impl SemanticPalette {
    pub fn classify(&self, color: Option<&CssColor>) -> SemanticColor {
        let Some(color) = color.filter(|c| !c.is_transparent()) else {
            return SemanticColor::Transparent;
        };
        let (hue, saturation, lightness) = color.to_hsl();
        if lightness <= self.dark_lightness {
            return SemanticColor::Dark;
        }
        if lightness >= self.light_lightness {
            return SemanticColor::Light;
        }
        if saturation < self.min_saturation {
            return SemanticColor::Neutral;
        }
        self.bands
            .iter()
            .find(|band| hue >= band.start && hue < band.end)
            .map(|band| band.role)
            .unwrap_or(SemanticColor::Neutral)
    }
}
