//! Lead scoring training procedure
//!
//! Fits preprocessing and a seeded forest on a labeled frame, evaluates
//! on a stratified holdout, and commits the artifacts to the registry.
//! The public entry point reports failures in the returned
//! [`TrainingReport`] instead of raising.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{error, info};

use crate::config::EngineConfig;
use crate::error::{Error, Result};
use crate::frame::{Frame, Value};
use crate::model::{accuracy, classification_report, stratified_split, ClassificationReport, RandomForest};
use crate::preprocess;
use crate::registry::{ModelKey, ModelRegistry, TenantArtifacts};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    Success,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingReport {
    pub status: ReportStatus,
    pub tenant: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trained_at: Option<DateTime<Utc>>,
    pub training_samples: usize,
    pub test_samples: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub train_accuracy: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_accuracy: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classification_report: Option<ClassificationReport>,
    pub feature_importance: BTreeMap<String, f64>,
}

impl TrainingReport {
    fn failure(tenant: &str, err: &Error) -> Self {
        Self {
            status: ReportStatus::Error,
            tenant: tenant.to_string(),
            message: Some(err.to_string()),
            trained_at: None,
            training_samples: 0,
            test_samples: 0,
            train_accuracy: None,
            test_accuracy: None,
            classification_report: None,
            feature_importance: BTreeMap::new(),
        }
    }
}

/// Train and commit a lead scoring model for one tenant.
///
/// Never panics or returns an error: failures come back as a report with
/// `status: error` and a message.
pub fn train(
    registry: &ModelRegistry,
    config: &EngineConfig,
    tenant: &str,
    frame: &Frame,
    label_column: &str,
) -> TrainingReport {
    match train_inner(registry, config, tenant, frame, label_column) {
        Ok(report) => report,
        Err(err) => {
            error!(tenant, error = %err, "training failed");
            TrainingReport::failure(tenant, &err)
        }
    }
}

fn train_inner(
    registry: &ModelRegistry,
    config: &EngineConfig,
    tenant: &str,
    frame: &Frame,
    label_column: &str,
) -> Result<TrainingReport> {
    config.validate()?;

    let (mut predictors, raw_labels) = frame.split_column(label_column).ok_or_else(|| {
        Error::DataFormat(format!("label column '{label_column}' not found"))
    })?;

    // Keep only rows with a usable binary label.
    let mut labels = Vec::with_capacity(raw_labels.len());
    let mut usable = vec![false; raw_labels.len()];
    for (i, value) in raw_labels.iter().enumerate() {
        if let Some(label) = parse_label(value) {
            labels.push(label);
            usable[i] = true;
        }
    }
    let mut row = 0;
    predictors.retain_rows(|_| {
        let keep = usable[row];
        row += 1;
        keep
    });

    if labels.len() < config.min_training_rows {
        return Err(Error::InsufficientData {
            rows: labels.len(),
            min: config.min_training_rows,
        });
    }

    let (train_idx, test_idx) = stratified_split(&labels, config.test_split, config.seed);

    let (features, bundle, scaler) = preprocess::fit(&predictors)?;
    let x_train = features.x.select(ndarray::Axis(0), &train_idx);
    let x_test = features.x.select(ndarray::Axis(0), &test_idx);
    let y_train: Vec<u8> = train_idx.iter().map(|&i| labels[i]).collect();
    let y_test: Vec<u8> = test_idx.iter().map(|&i| labels[i]).collect();

    let mut model = RandomForest::new_classifier(config.n_estimators)
        .with_max_depth(config.max_depth)
        .with_random_state(config.seed);
    model.fit(&x_train, &y_train)?;

    let train_pred = model.predict(&x_train)?;
    let test_pred = model.predict(&x_test)?;
    let train_accuracy = accuracy(&y_train, &train_pred);
    let test_accuracy = accuracy(&y_test, &test_pred);
    let report = classification_report(&y_test, &test_pred);

    let feature_importance: BTreeMap<String, f64> = features
        .names
        .iter()
        .cloned()
        .zip(model.feature_importances().iter().copied())
        .collect();

    let trained_at = Utc::now();
    let key = ModelKey::lead_scoring(tenant);
    let commit_lock = registry.lock_for_commit(&key);
    {
        let _guard = commit_lock.lock().expect("commit lock poisoned");
        registry.save(
            &key,
            TenantArtifacts {
                model,
                scaler,
                bundle,
                trained_at,
            },
        )?;
    }

    info!(
        tenant,
        training_samples = train_idx.len(),
        test_samples = test_idx.len(),
        train_accuracy,
        test_accuracy,
        "model trained"
    );

    Ok(TrainingReport {
        status: ReportStatus::Success,
        tenant: tenant.to_string(),
        message: None,
        trained_at: Some(trained_at),
        training_samples: train_idx.len(),
        test_samples: test_idx.len(),
        train_accuracy: Some(train_accuracy),
        test_accuracy: Some(test_accuracy),
        classification_report: Some(report),
        feature_importance,
    })
}

/// Binary label from a cell: numbers and booleans directly, strings via
/// the usual spellings. Anything else (including null) is unusable.
fn parse_label(value: &Value) -> Option<u8> {
    match value {
        Value::Bool(b) => Some(u8::from(*b)),
        Value::Num(n) if *n == 0.0 => Some(0),
        Value::Num(n) if *n == 1.0 => Some(1),
        Value::Str(s) => match s.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" => Some(1),
            "0" | "false" | "no" => Some(0),
            _ => None,
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_label_spellings() {
        assert_eq!(parse_label(&Value::Num(1.0)), Some(1));
        assert_eq!(parse_label(&Value::Num(0.0)), Some(0));
        assert_eq!(parse_label(&Value::Bool(true)), Some(1));
        assert_eq!(parse_label(&Value::Str("Yes".to_string())), Some(1));
        assert_eq!(parse_label(&Value::Str("no".to_string())), Some(0));
        assert_eq!(parse_label(&Value::Num(0.5)), None);
        assert_eq!(parse_label(&Value::Null), None);
    }
}
