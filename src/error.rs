use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CbxError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Config parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invariant violated: {0}")]
    Invariant(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Analysis error: {0}")]
    Analysis(String),
}

impl CbxError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        CbxError::InvalidInput(message.into())
    }

    pub fn invariant(message: impl Into<String>) -> Self {
        CbxError::Invariant(message.into())
    }

    pub fn analysis(message: impl Into<String>) -> Self {
        CbxError::Analysis(message.into())
    }

    pub fn to_payload(&self) -> ErrorPayload {
        match self {
            CbxError::Io(e) => ErrorPayload::new(
                ErrorCategory::Config,
                e.to_string(),
                "Check capture file paths/permissions.",
            ),
            CbxError::Serialization(e) => ErrorPayload::new(
                ErrorCategory::Input,
                e.to_string(),
                "Verify the capture is valid JSON with url, html (or nodes), styles and boxes.",
            ),
            CbxError::Yaml(e) => ErrorPayload::new(
                ErrorCategory::Config,
                e.to_string(),
                "Retry with --format json; run with --verbose for details.",
            ),
            CbxError::TomlParse(e) => ErrorPayload::new(
                ErrorCategory::Config,
                e.to_string(),
                "Fix the TOML syntax in the config file or pass --config with a valid file.",
            ),
            CbxError::InvalidInput(msg) => {
                let lower = msg.to_ascii_lowercase();
                if lower.contains("parent") {
                    ErrorPayload::new(
                        ErrorCategory::Input,
                        msg.to_string(),
                        "Captured nodes must be listed in document order; each parent index must precede its children.",
                    )
                } else if lower.contains("html") && lower.contains("nodes") {
                    ErrorPayload::new(
                        ErrorCategory::Input,
                        msg.to_string(),
                        "Provide either an `html` string or a `nodes` list in the capture.",
                    )
                } else {
                    ErrorPayload::new(
                        ErrorCategory::Input,
                        msg.to_string(),
                        "Inspect the capture file; missing styles/boxes are allowed, malformed ones are not.",
                    )
                }
            }
            CbxError::Invariant(msg) => ErrorPayload::new(
                ErrorCategory::Input,
                msg.to_string(),
                "Bounding boxes must have finite, non-negative width and height.",
            ),
            CbxError::Config(msg) => {
                let lower = msg.to_ascii_lowercase();
                if lower.contains("threshold") || lower.contains("epsilon") {
                    ErrorPayload::new(
                        ErrorCategory::Config,
                        msg.to_string(),
                        "Thresholds and epsilon must lie within 0.0-1.0.",
                    )
                } else if lower.contains("no capture") {
                    ErrorPayload::new(
                        ErrorCategory::Config,
                        msg.to_string(),
                        "Pass one or more capture JSON files, e.g. `cbx analyze page.json`.",
                    )
                } else {
                    ErrorPayload::new(
                        ErrorCategory::Config,
                        msg.to_string(),
                        "Check flags/paths and the config file values.",
                    )
                }
            }
            CbxError::Analysis(msg) => ErrorPayload::new(
                ErrorCategory::Analysis,
                msg.to_string(),
                "Re-run with --verbose to see which stage failed.",
            ),
        }
    }
}

pub type Result<T> = std::result::Result<T, CbxError>;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ErrorCategory {
    Config,
    Input,
    Analysis,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorPayload {
    pub category: ErrorCategory,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remediation: Option<String>,
}

impl ErrorPayload {
    pub fn new(category: ErrorCategory, message: String, remediation: impl Into<String>) -> Self {
        Self {
            category,
            message,
            remediation: Some(remediation.into()),
        }
    }
}
