//! Component Blueprint Extractor (CBX) Library
//!
//! Detects reusable UI components in rendered pages, groups equivalent
//! instances, infers their composition and extracts design tokens. Input is
//! a page capture (serialized DOM plus computed styles and measured boxes)
//! produced by an external browser driver; the engine itself never touches
//! the network.
//!
//! # Module Overview
//!
//! - [`types`] - Geometry, style bags and page capture input
//! - [`dom`] - Index-addressed DOM arena
//! - [`color`] - CSS color parsing and semantic color names
//! - [`analysis`] - Fingerprinting, detection, clustering, hierarchy, matching
//! - [`pipeline`] - Per-page orchestration and site aggregation
//! - [`config`] - Configuration file support
//! - [`output`] - Versioned output schemas
//!
//! # Example
//!
//! ```no_run
//! use cbx_lib::{analyze_site, Config, PageAnalyzer, PageCapture};
//!
//! # fn example() -> cbx_lib::Result<()> {
//! let text = std::fs::read_to_string("home.json")?;
//! let capture: PageCapture = serde_json::from_str(&text)?;
//!
//! let analyzer = PageAnalyzer::new(Config::load(None)?);
//! let site = analyze_site(&analyzer, &[capture]);
//! println!("{} unique components", site.summary.unique_components);
//! # Ok(())
//! # }
//! ```

pub mod analysis;
pub mod color;
pub mod config;
pub mod dom;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod types;
pub mod viewport;

pub use analysis::{
    AggregatedComponent, ComponentGroup, ComponentHierarchy, ComponentRule, DetectedComponent,
    RuleCatalog, SiteSummary, SpacingSystem,
};
pub use color::{CssColor, SemanticColor, SemanticPalette};
pub use config::Config;
pub use dom::DomTree;
pub use error::{CbxError, ErrorCategory, ErrorPayload, Result};
pub use output::{
    AnalyzeOutput, CbxOutput, ErrorOutput, OutputMode, TokensOutput, CBX_OUTPUT_VERSION,
};
pub use pipeline::{
    analyze_site, summarize_site, DesignTokens, PageAnalysis, PageAnalyzer, PageOutcome,
    SiteAnalysis,
};
pub use types::{BoundingBox, CapturedNode, PageCapture, VisualProperties};
pub use viewport::Viewport;
