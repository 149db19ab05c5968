//! Engine configuration
//!
//! Defaults match the lead scoring production settings; any field can be
//! overridden from a JSON or YAML file.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Directory holding model, scaler and encoder artifacts.
    pub model_dir: PathBuf,
    /// Minimum labeled rows required to train.
    pub min_training_rows: usize,
    /// Fraction of rows held out per class for evaluation.
    pub test_split: f64,
    /// Seed shared by the split and the forest.
    pub seed: u64,
    pub n_estimators: usize,
    pub max_depth: usize,
    /// Fill missing prediction inputs from the batch instead of the
    /// statistics captured at training time.
    pub impute_from_batch: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("models"),
            min_training_rows: 10,
            test_split: 0.2,
            seed: 42,
            n_estimators: 100,
            max_depth: 10,
            impute_from_batch: false,
        }
    }
}

impl EngineConfig {
    /// Load from a JSON or YAML file, dispatching on extension.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        match ext.as_str() {
            "yaml" | "yml" => serde_yaml::from_str(&text)
                .map_err(|e| Error::Serialization(format!("config {}: {e}", path.display()))),
            _ => serde_json::from_str(&text)
                .map_err(|e| Error::Serialization(format!("config {}: {e}", path.display()))),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..1.0).contains(&self.test_split) || self.test_split <= 0.0 {
            return Err(Error::DataFormat(format!(
                "test_split must be in (0, 1), got {}",
                self.test_split
            )));
        }
        if self.n_estimators == 0 {
            return Err(Error::DataFormat("n_estimators must be positive".to_string()));
        }
        if self.min_training_rows < 2 {
            return Err(Error::DataFormat(
                "min_training_rows must be at least 2".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.min_training_rows, 10);
        assert_eq!(config.test_split, 0.2);
        assert_eq!(config.seed, 42);
        assert_eq!(config.n_estimators, 100);
        assert_eq!(config.max_depth, 10);
        assert!(!config.impute_from_batch);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_overlay() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let mut f = std::fs::File::create(&path).unwrap();
        write!(f, r#"{{"n_estimators": 10, "seed": 7}}"#).unwrap();

        let config = EngineConfig::from_file(&path).unwrap();
        assert_eq!(config.n_estimators, 10);
        assert_eq!(config.seed, 7);
        assert_eq!(config.max_depth, 10); // default survives
    }

    #[test]
    fn test_yaml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "model_dir: /tmp/artifacts\ntest_split: 0.3\n").unwrap();

        let config = EngineConfig::from_file(&path).unwrap();
        assert_eq!(config.model_dir, PathBuf::from("/tmp/artifacts"));
        assert_eq!(config.test_split, 0.3);
    }

    #[test]
    fn test_invalid_split_rejected() {
        let config = EngineConfig {
            test_split: 1.5,
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
