use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::analysis::{DetectorConfig, SpacingSettings};
use crate::error::{CbxError, Result};
use crate::Viewport;

pub const LOCAL_CONFIG_FILE: &str = "cbx.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub viewport: Viewport,
    pub detection: DetectorConfig,
    pub clustering: ClusteringConfig,
    pub patterns: PatternConfig,
    pub matching: MatchingConfig,
    pub spacing: SpacingSettings,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusteringConfig {
    pub epsilon: f64,
    pub min_points: usize,
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            epsilon: 0.2,
            min_points: 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternConfig {
    pub similarity_threshold: f64,
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.8,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
    pub similarity_threshold: f64,
    pub max_visual_distance: f64,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.8,
            max_visual_distance: 0.2,
        }
    }
}

impl Config {
    /// Load from an explicit TOML path, else `./cbx.toml` when present, else
    /// defaults. The result is validated.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let source: Option<PathBuf> = match path {
            Some(p) => Some(p.to_path_buf()),
            None => Some(PathBuf::from(LOCAL_CONFIG_FILE)).filter(|p| p.is_file()),
        };
        let Some(source) = source else {
            return Ok(Self::default());
        };

        let text = fs::read_to_string(&source).map_err(|e| {
            CbxError::Config(format!("Failed to read config {}: {}", source.display(), e))
        })?;
        let config = Self::from_toml(&text).map_err(|e| match e {
            CbxError::Config(msg) => {
                CbxError::Config(format!("Invalid config ({}): {}", source.display(), msg))
            }
            other => other,
        })?;
        Ok(config)
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Config = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let unit = |name: &str, value: f64| -> Result<()> {
            if (0.0..=1.0).contains(&value) {
                Ok(())
            } else {
                Err(CbxError::Config(format!(
                    "{name} must be between 0.0 and 1.0 (got {value})"
                )))
            }
        };
        unit("detection.confidence_threshold", self.detection.confidence_threshold)?;
        unit("detection.overlap_ratio", self.detection.overlap_ratio)?;
        unit("patterns.similarity_threshold", self.patterns.similarity_threshold)?;
        unit("matching.similarity_threshold", self.matching.similarity_threshold)?;

        if !(self.clustering.epsilon > 0.0 && self.clustering.epsilon.is_finite()) {
            return Err(CbxError::Config(format!(
                "clustering.epsilon must be positive (got {})",
                self.clustering.epsilon
            )));
        }
        if self.clustering.min_points == 0 {
            return Err(CbxError::Config("clustering.min_points must be at least 1".into()));
        }
        if self.matching.max_visual_distance < 0.0 {
            return Err(CbxError::Config(
                "matching.max_visual_distance must not be negative".into(),
            ));
        }
        if self.detection.min_width < 0.0 || self.detection.min_height < 0.0 {
            return Err(CbxError::Config("detection minimum sizes must not be negative".into()));
        }
        if self.viewport.width == 0 || self.viewport.height == 0 {
            return Err(CbxError::Config("viewport dimensions must be positive".into()));
        }
        if self.spacing.candidate_units.iter().all(|u| *u == 0) {
            return Err(CbxError::Config(
                "spacing.candidate_units needs at least one non-zero unit".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::ContainmentTieBreak;

    #[test]
    fn default_values_match_expected() {
        let cfg = Config::default();

        assert_eq!(cfg.viewport.width, 1920);
        assert_eq!(cfg.viewport.height, 1080);
        assert!((cfg.detection.confidence_threshold - 0.65).abs() < f64::EPSILON);
        assert!((cfg.clustering.epsilon - 0.2).abs() < f64::EPSILON);
        assert_eq!(cfg.clustering.min_points, 2);
        assert_eq!(cfg.spacing.default_unit, 8);
        assert_eq!(cfg.detection.tie_break, ContainmentTieBreak::PreferDescendant);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let cfg = Config::from_toml(
            r#"
            [viewport]
            width = 1280
            height = 800

            [detection]
            confidence_threshold = 0.7
            tie_break = "prefer-ancestor"

            [clustering]
            epsilon = 0.25
            "#,
        )
        .unwrap();

        assert_eq!(cfg.viewport.width, 1280);
        assert!((cfg.detection.confidence_threshold - 0.7).abs() < f64::EPSILON);
        assert!((cfg.detection.overlap_ratio - 0.8).abs() < f64::EPSILON);
        assert_eq!(cfg.detection.tie_break, ContainmentTieBreak::PreferAncestor);
        assert!((cfg.clustering.epsilon - 0.25).abs() < f64::EPSILON);
        assert_eq!(cfg.clustering.min_points, 2);
    }

    #[test]
    fn rejects_out_of_range_threshold() {
        let err = Config::from_toml("[detection]\nconfidence_threshold = 1.5\n").unwrap_err();
        assert!(matches!(err, CbxError::Config(_)));
        assert!(err.to_string().contains("confidence_threshold"));
    }

    #[test]
    fn rejects_malformed_toml() {
        let err = Config::from_toml("[detection\n").unwrap_err();
        assert!(matches!(err, CbxError::TomlParse(_)));
    }

    #[test]
    fn explicit_missing_path_is_config_error() {
        let err = Config::load(Some(Path::new("/definitely/not/here/cbx.toml"))).unwrap_err();
        assert!(err.to_string().contains("Failed to read config"));
    }
}
