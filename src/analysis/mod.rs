//! Component detection, grouping and design-system inference.
//!
//! Stages, in dependency order:
//!
//! - [`fingerprint`] - structural fingerprints and similarity
//! - [`rules`] / [`detector`] - rule-based classification with duplicate
//!   suppression
//! - [`clustering`], [`patterns`], [`hierarchy`], [`sections`] - independent
//!   consumers of the detected components
//! - [`matcher`] / [`aggregate`] - page-level grouping and site-level merge
//! - [`spacing`] / [`variants`] - design-token inference

pub mod aggregate;
pub mod clustering;
pub mod component;
pub mod detector;
pub mod features;
pub mod fingerprint;
pub mod hierarchy;
pub mod matcher;
pub mod patterns;
pub mod rules;
pub mod sections;
pub mod spacing;
pub mod spatial;
pub mod variants;

pub use aggregate::{AggregatedComponent, SiteAggregator, SiteSummary, VisualVariant};
pub use clustering::{ClusterableElement, VisualCluster, VisualClusteringEngine};
pub use component::{CompositionType, DetectedComponent};
pub use detector::{ComponentTypeDetector, ContainmentTieBreak, DetectorConfig};
pub use features::VisualFeatureVector;
pub use fingerprint::{FingerprintGenerator, SemanticFlags, StructuralFingerprint};
pub use hierarchy::{ComponentHierarchy, ComponentHierarchyBuilder, HierarchyNode, LogicalGroupings};
pub use matcher::{ComponentGroup, ComponentMatcher, MatchKind, MatchResult};
pub use patterns::{RepeatedPattern, RepeatedPatternDetector};
pub use rules::{ComponentRule, FnRule, RuleCatalog};
pub use sections::{link_sections, PageSection};
pub use spacing::{SpacingSettings, SpacingSystem, SpacingSystemDetector};
pub use spatial::{LayoutType, SpatialAnalyzer, SpatialArrangement};
pub use variants::{
    component_variants, ColorVariant, ColorVariantDetector, ComponentVariants, SizeVariant,
    SizeVariantDetector, StateCounts, StateVariantDetector,
};
