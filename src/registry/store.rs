//! On-disk artifact store
//!
//! Each trained tenant persists as three JSON files in the model
//! directory:
//!
//! - `lead_scoring_<tenant>.json` — forest plus training metadata
//! - `scaler_<tenant>.json` — standard scaler statistics
//! - `encoder_<tenant>.json` — category encoders and imputation stats
//!
//! Writes go through a temp file and rename so a crashed save never
//! leaves a half-written artifact behind.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

use super::{ModelKey, ModelKind, TenantId};
use crate::error::{Error, Result};
use crate::model::RandomForest;
use crate::preprocess::{PreprocessorBundle, StandardScaler};

/// Everything needed to score a tenant's leads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenantArtifacts {
    pub model: RandomForest,
    pub scaler: StandardScaler,
    pub bundle: PreprocessorBundle,
    pub trained_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ModelFile {
    kind: ModelKind,
    tenant: String,
    trained_at: DateTime<Utc>,
    model: RandomForest,
}

#[derive(Debug, Serialize, Deserialize)]
struct EncoderFile {
    bundle: PreprocessorBundle,
}

#[derive(Debug, Clone)]
pub struct FsStore {
    dir: PathBuf,
}

impl FsStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn model_path(&self, key: &ModelKey) -> PathBuf {
        self.dir
            .join(format!("{}_{}.json", key.kind.as_str(), key.tenant.as_str()))
    }

    fn scaler_path(&self, key: &ModelKey) -> PathBuf {
        self.dir.join(format!("scaler_{}.json", key.tenant.as_str()))
    }

    fn encoder_path(&self, key: &ModelKey) -> PathBuf {
        self.dir
            .join(format!("encoder_{}.json", key.tenant.as_str()))
    }

    pub fn save(&self, key: &ModelKey, artifacts: &TenantArtifacts) -> Result<()> {
        fs::create_dir_all(&self.dir)?;

        let model_file = ModelFile {
            kind: key.kind,
            tenant: key.tenant.as_str().to_string(),
            trained_at: artifacts.trained_at,
            model: artifacts.model.clone(),
        };
        write_json(&self.model_path(key), &model_file)?;
        write_json(&self.scaler_path(key), &artifacts.scaler)?;
        write_json(
            &self.encoder_path(key),
            &EncoderFile {
                bundle: artifacts.bundle.clone(),
            },
        )?;
        Ok(())
    }

    /// Load one tenant's artifacts. A missing model file is
    /// `ModelNotFound`; missing companions fall back to empty
    /// preprocessing state with a warning, matching older artifact
    /// layouts that only wrote the model.
    pub fn load(&self, key: &ModelKey) -> Result<TenantArtifacts> {
        let model_path = self.model_path(key);
        if !model_path.exists() {
            return Err(Error::ModelNotFound {
                kind: key.kind.as_str().to_string(),
                tenant: key.tenant.as_str().to_string(),
            });
        }
        let model_file: ModelFile = read_json(&model_path)?;

        let scaler = match read_json::<StandardScaler>(&self.scaler_path(key)) {
            Ok(s) => s,
            Err(Error::Persistence(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(tenant = key.tenant.as_str(), "scaler artifact missing, using pass-through");
                StandardScaler::default()
            }
            Err(e) => return Err(e),
        };
        let bundle = match read_json::<EncoderFile>(&self.encoder_path(key)) {
            Ok(f) => f.bundle,
            Err(Error::Persistence(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(tenant = key.tenant.as_str(), "encoder artifact missing, using empty bundle");
                PreprocessorBundle::default()
            }
            Err(e) => return Err(e),
        };

        Ok(TenantArtifacts {
            model: model_file.model,
            scaler,
            bundle,
            trained_at: model_file.trained_at,
        })
    }

    /// Scan the model directory and load every readable artifact set.
    /// Unreadable artifacts are skipped with a warning rather than
    /// failing the whole scan.
    pub fn load_all(&self) -> Result<Vec<(ModelKey, TenantArtifacts)>> {
        let mut loaded = Vec::new();
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(loaded),
            Err(e) => return Err(e.into()),
        };

        for entry in entries {
            let path = entry?.path();
            let Some(key) = key_from_path(&path) else {
                continue;
            };
            match self.load(&key) {
                Ok(artifacts) => loaded.push((key, artifacts)),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipping unreadable artifact");
                }
            }
        }

        loaded.sort_by(|a, b| a.0.tenant.as_str().cmp(b.0.tenant.as_str()));
        Ok(loaded)
    }
}

/// Parse `<kind>_<tenant>.json` back into a key. Scaler and encoder
/// files don't map to keys and return `None`.
fn key_from_path(path: &Path) -> Option<ModelKey> {
    let stem = path.file_stem()?.to_str()?;
    if path.extension()?.to_str()? != "json" {
        return None;
    }
    for kind in [ModelKind::LeadScoring] {
        if let Some(tenant) = stem.strip_prefix(&format!("{}_", kind.as_str())) {
            if !tenant.is_empty() {
                return Some(ModelKey::new(kind, TenantId::new(tenant)));
            }
        }
    }
    None
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let tmp = path.with_extension("json.tmp");
    let text = serde_json::to_string_pretty(value)?;
    fs::write(&tmp, text)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T> {
    let text = fs::read_to_string(path)?;
    serde_json::from_str(&text)
        .map_err(|e| Error::Serialization(format!("{}: {e}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    fn fitted_artifacts() -> TenantArtifacts {
        let x = Array2::from_shape_fn((8, 1), |(r, _)| r as f64);
        let y = [0, 0, 0, 0, 1, 1, 1, 1];
        let mut model = RandomForest::new_classifier(5);
        model.fit(&x, &y).unwrap();
        TenantArtifacts {
            model,
            scaler: StandardScaler::default(),
            bundle: PreprocessorBundle::default(),
            trained_at: Utc::now(),
        }
    }

    fn key(tenant: &str) -> ModelKey {
        ModelKey::new(ModelKind::LeadScoring, TenantId::new(tenant))
    }

    #[test]
    fn test_save_writes_three_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::new(dir.path());
        store.save(&key("acme"), &fitted_artifacts()).unwrap();

        assert!(dir.path().join("lead_scoring_acme.json").exists());
        assert!(dir.path().join("scaler_acme.json").exists());
        assert!(dir.path().join("encoder_acme.json").exists());
    }

    #[test]
    fn test_round_trip_predicts_identically() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::new(dir.path());
        let artifacts = fitted_artifacts();
        store.save(&key("acme"), &artifacts).unwrap();

        let restored = store.load(&key("acme")).unwrap();
        let x = Array2::from_shape_fn((4, 1), |(r, _)| r as f64);
        assert_eq!(
            artifacts.model.predict_proba(&x).unwrap(),
            restored.model.predict_proba(&x).unwrap()
        );
    }

    #[test]
    fn test_missing_model_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::new(dir.path());
        let err = store.load(&key("ghost")).unwrap_err();
        assert!(matches!(err, Error::ModelNotFound { .. }));
    }

    #[test]
    fn test_missing_scaler_tolerated() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::new(dir.path());
        store.save(&key("acme"), &fitted_artifacts()).unwrap();
        fs::remove_file(dir.path().join("scaler_acme.json")).unwrap();

        let restored = store.load(&key("acme")).unwrap();
        assert!(restored.scaler.is_empty());
    }

    #[test]
    fn test_load_all_skips_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::new(dir.path());
        store.save(&key("acme"), &fitted_artifacts()).unwrap();
        store.save(&key("globex"), &fitted_artifacts()).unwrap();
        fs::write(dir.path().join("lead_scoring_broken.json"), "{not json").unwrap();

        let loaded = store.load_all().unwrap();
        let tenants: Vec<&str> = loaded.iter().map(|(k, _)| k.tenant.as_str()).collect();
        assert_eq!(tenants, ["acme", "globex"]);
    }

    #[test]
    fn test_load_all_missing_dir_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::new(dir.path().join("nope"));
        assert!(store.load_all().unwrap().is_empty());
    }
}
