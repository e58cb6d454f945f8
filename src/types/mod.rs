//! Core data types shared by the analysis stages.

mod capture;
mod core;
mod style;

pub use self::capture::{CapturedNode, PageCapture};
pub use self::core::BoundingBox;
pub use self::style::{parse_length, StyleMap, VisualProperties};
