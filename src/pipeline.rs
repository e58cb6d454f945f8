//! Per-page orchestration and the site-level reduce.
//!
//! [`PageAnalyzer`] runs every analysis stage over one [`PageCapture`].
//! [`analyze_site`] folds a batch of captures into a [`SiteAnalysis`],
//! recording a failed page instead of aborting the run.

use serde::{Deserialize, Serialize};
use tracing::{debug, info_span, warn};

use crate::analysis::{
    component_variants, link_sections, AggregatedComponent, ClusterableElement, ComponentGroup,
    ComponentHierarchy, ComponentHierarchyBuilder, ComponentMatcher, ComponentTypeDetector,
    ComponentVariants, DetectedComponent, LogicalGroupings, PageSection, RepeatedPattern,
    RepeatedPatternDetector, RuleCatalog, SiteAggregator, SiteSummary, SpacingSystem,
    SpacingSystemDetector, VisualCluster, VisualClusteringEngine,
};
use crate::color::SemanticPalette;
use crate::config::Config;
use crate::dom::DomTree;
use crate::error::{CbxError, ErrorPayload, Result};
use crate::types::PageCapture;

/// Everything extracted from one page.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageAnalysis {
    pub url: String,
    pub components: Vec<DetectedComponent>,
    pub clusters: Vec<VisualCluster>,
    pub patterns: Vec<RepeatedPattern>,
    pub hierarchy: ComponentHierarchy,
    pub sections: Vec<PageSection>,
    pub groups: Vec<ComponentGroup>,
    pub spacing: SpacingSystem,
    pub variants: Vec<ComponentVariants>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum PageOutcome {
    Analyzed(Box<PageAnalysis>),
    Failed { url: String, error: ErrorPayload },
}

impl PageOutcome {
    pub fn url(&self) -> &str {
        match self {
            PageOutcome::Analyzed(page) => &page.url,
            PageOutcome::Failed { url, .. } => url,
        }
    }

    pub fn analysis(&self) -> Option<&PageAnalysis> {
        match self {
            PageOutcome::Analyzed(page) => Some(&**page),
            PageOutcome::Failed { .. } => None,
        }
    }
}

/// Spacing scale and component variants across a whole run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DesignTokens {
    pub spacing: SpacingSystem,
    pub variants: Vec<ComponentVariants>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteAnalysis {
    pub pages: Vec<PageOutcome>,
    pub aggregated: Vec<AggregatedComponent>,
    pub summary: SiteSummary,
    pub tokens: DesignTokens,
}

/// Holds the immutable tables one run shares across pages.
#[derive(Debug, Default)]
pub struct PageAnalyzer {
    config: Config,
    catalog: RuleCatalog,
    palette: SemanticPalette,
    groupings: LogicalGroupings,
}

impl PageAnalyzer {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn with_catalog(mut self, catalog: RuleCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn palette(&self) -> &SemanticPalette {
        &self.palette
    }

    /// Parse the capture and run detection, section linking, hierarchy,
    /// clustering, pattern detection, grouping, spacing and variants.
    pub fn analyze(&self, capture: &PageCapture) -> Result<PageAnalysis> {
        let span = info_span!("page", url = %capture.url);
        let _guard = span.enter();

        let tree = build_tree(capture)?;
        let viewport = capture.viewport.unwrap_or(self.config.viewport);

        let detector = ComponentTypeDetector::new(&self.catalog, self.config.detection);
        let mut components = detector.detect(&tree, &capture.styles, &capture.boxes);
        let sections = link_sections(&tree, &mut components);
        let hierarchy = ComponentHierarchyBuilder::new(&self.groupings).build(&tree, &mut components);

        let points: Vec<ClusterableElement> = components
            .iter()
            .map(|c| ClusterableElement::from_component(c, &viewport))
            .collect();
        let clustering = &self.config.clustering;
        let clusters =
            VisualClusteringEngine::new(clustering.epsilon, clustering.min_points).cluster(&points);

        let patterns =
            RepeatedPatternDetector::new(self.config.patterns.similarity_threshold).detect(&components);

        let matcher = ComponentMatcher {
            similarity_threshold: self.config.matching.similarity_threshold,
            max_visual_distance: self.config.matching.max_visual_distance,
            viewport,
        };
        let groups = matcher.group_components(&components);

        let spacing = SpacingSystemDetector::new(self.config.spacing.clone()).detect(&components);
        let variants = component_variants(&components, Some(&tree), &self.palette);

        debug!(
            elements = tree.len(),
            components = components.len(),
            clusters = clusters.len(),
            patterns = patterns.len(),
            groups = groups.len(),
            "page analyzed"
        );

        Ok(PageAnalysis {
            url: capture.url.clone(),
            components,
            clusters,
            patterns,
            hierarchy,
            sections,
            groups,
            spacing,
            variants,
        })
    }
}

fn build_tree(capture: &PageCapture) -> Result<DomTree> {
    match (&capture.html, &capture.nodes) {
        (Some(html), None) => Ok(DomTree::parse_html(html)),
        (None, Some(nodes)) => DomTree::from_nodes(nodes),
        (Some(_), Some(_)) => Err(CbxError::invalid_input(format!(
            "capture {} has both html and nodes",
            capture.url
        ))),
        (None, None) => Err(CbxError::invalid_input(format!(
            "capture {} has neither html nor nodes",
            capture.url
        ))),
    }
}

/// Analyze every capture and fold the results into one site view.
pub fn analyze_site(analyzer: &PageAnalyzer, captures: &[PageCapture]) -> SiteAnalysis {
    let outcomes = captures
        .iter()
        .map(|capture| match analyzer.analyze(capture) {
            Ok(page) => PageOutcome::Analyzed(Box::new(page)),
            Err(err) => {
                warn!(url = %capture.url, error = %err, "page analysis failed");
                PageOutcome::Failed {
                    url: capture.url.clone(),
                    error: err.to_payload(),
                }
            }
        })
        .collect();
    summarize_site(analyzer, outcomes)
}

/// Reduce already-computed page outcomes. Used by callers that analyze
/// pages concurrently.
pub fn summarize_site(analyzer: &PageAnalyzer, pages: Vec<PageOutcome>) -> SiteAnalysis {
    let mut aggregator = SiteAggregator::new();
    let mut failed = 0;
    for outcome in &pages {
        match outcome {
            PageOutcome::Analyzed(page) => aggregator.add_page(&page.url, &page.groups),
            PageOutcome::Failed { .. } => failed += 1,
        }
    }
    let analyzed = pages.len() - failed;
    let aggregated = aggregator.finish();
    let summary = SiteSummary::from_aggregated(&aggregated, analyzed, failed);
    let tokens = design_tokens(analyzer, &pages);

    SiteAnalysis {
        pages,
        aggregated,
        summary,
        tokens,
    }
}

/// Spacing and variants recomputed over every analyzed component. State
/// counts need each page's tree, so they come from the per-page variants.
pub fn design_tokens(analyzer: &PageAnalyzer, pages: &[PageOutcome]) -> DesignTokens {
    let analyses: Vec<&PageAnalysis> = pages.iter().filter_map(PageOutcome::analysis).collect();
    let all: Vec<DetectedComponent> = analyses
        .iter()
        .flat_map(|page| page.components.iter().cloned())
        .collect();

    let spacing = SpacingSystemDetector::new(analyzer.config.spacing.clone()).detect(&all);
    let mut variants = component_variants(&all, None, &analyzer.palette);
    for entry in &mut variants {
        for page in &analyses {
            if let Some(page_variants) = page
                .variants
                .iter()
                .find(|v| v.component_type == entry.component_type)
            {
                entry.states.absorb(&page_variants.states);
            }
        }
    }

    DesignTokens { spacing, variants }
}
