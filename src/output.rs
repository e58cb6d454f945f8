use crate::error::ErrorPayload;
use crate::pipeline::{DesignTokens, PageOutcome, SiteAnalysis};
use crate::analysis::{AggregatedComponent, SiteSummary};
use crate::viewport::Viewport;
use serde::{Deserialize, Serialize};

/// Schema version for output payloads.
pub const CBX_OUTPUT_VERSION: &str = "0.1.0";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "kebab-case")]
pub enum CbxOutput {
    Analyze(AnalyzeOutput),
    Tokens(TokensOutput),
    Error(ErrorOutput),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputMode {
    Analyze,
    Tokens,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeOutput {
    pub version: String,
    pub viewport: Viewport,
    /// Capture files in the order given
    pub inputs: Vec<String>,
    pub summary: SiteSummary,
    pub pages: Vec<PageOutcome>,
    pub aggregated: Vec<AggregatedComponent>,
    pub tokens: DesignTokens,
}

impl AnalyzeOutput {
    pub fn new(viewport: Viewport, inputs: Vec<String>, site: SiteAnalysis) -> Self {
        Self {
            version: CBX_OUTPUT_VERSION.to_string(),
            viewport,
            inputs,
            summary: site.summary,
            pages: site.pages,
            aggregated: site.aggregated,
            tokens: site.tokens,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokensOutput {
    pub version: String,
    pub inputs: Vec<String>,
    pub summary: SiteSummary,
    pub tokens: DesignTokens,
}

impl TokensOutput {
    pub fn new(inputs: Vec<String>, site: SiteAnalysis) -> Self {
        Self {
            version: CBX_OUTPUT_VERSION.to_string(),
            inputs,
            summary: site.summary,
            tokens: site.tokens,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorOutput {
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub error: ErrorPayload,
}

impl ErrorOutput {
    pub fn new(error: ErrorPayload) -> Self {
        Self {
            version: CBX_OUTPUT_VERSION.to_string(),
            message: Some(error.message.clone()),
            error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CbxError;
    use crate::pipeline::{analyze_site, PageAnalyzer};
    use crate::types::PageCapture;

    #[test]
    fn analyze_output_serializes() {
        let site = analyze_site(
            &PageAnalyzer::default(),
            &[PageCapture::from_html("https://example.com", "<html><body></body></html>")],
        );
        let output = CbxOutput::Analyze(AnalyzeOutput::new(
            Viewport::default(),
            vec!["home.json".into()],
            site,
        ));

        let json = serde_json::to_string(&output).expect("serialize analyze output");
        assert!(json.contains("\"mode\":\"analyze\""));
        assert!(json.contains("\"pagesAnalyzed\":1"));
        assert!(json.contains("\"status\":\"analyzed\""));
    }

    #[test]
    fn tokens_output_serializes_to_yaml() {
        let site = analyze_site(&PageAnalyzer::default(), &[]);
        let output = CbxOutput::Tokens(TokensOutput::new(Vec::new(), site));
        let yaml = serde_yaml::to_string(&output).expect("serialize tokens output");
        assert!(yaml.contains("mode: tokens"));
        assert!(yaml.contains("baseUnit: 8"));
    }

    #[test]
    fn error_output_serializes() {
        let output = CbxOutput::Error(ErrorOutput::new(
            CbxError::invalid_input("capture a.json has neither html nor nodes").to_payload(),
        ));
        let json = serde_json::to_string(&output).expect("serialize error output");
        assert!(json.contains("\"mode\":\"error\""));
        assert!(json.contains("\"category\":\"input\""));
        assert!(json.contains("neither html nor nodes"));
    }
}
