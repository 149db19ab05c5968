//! Lead scoring inference
//!
//! Replays a tenant's stored preprocessing on an incoming frame and
//! scores each row. Failures never escape: a missing model or a
//! preprocessing mismatch yields per-row error entries instead.

use serde::{Deserialize, Serialize};
use tracing::{error, info};

use super::train::ReportStatus;
use crate::config::EngineConfig;
use crate::error::Result;
use crate::frame::{Frame, Value};
use crate::preprocess;
use crate::registry::{ModelKey, ModelRegistry};

/// Columns searched, in order, for a caller-facing row identifier.
const ID_COLUMNS: &[&str] = &["id", "lead_id"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prediction {
    pub id: String,
    pub status: ReportStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub probability: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Score every row of `frame` with the tenant's committed model.
///
/// Never panics or returns an error: if the tenant has no model or the
/// batch cannot be transformed, every row comes back with
/// `status: error` and the reason.
pub fn predict(
    registry: &ModelRegistry,
    config: &EngineConfig,
    tenant: &str,
    frame: &Frame,
) -> Vec<Prediction> {
    let ids = row_ids(frame);
    match predict_inner(registry, config, tenant, frame) {
        Ok(scores) => {
            info!(tenant, rows = scores.len(), "batch scored");
            ids.into_iter()
                .zip(scores)
                .map(|(id, probability)| Prediction {
                    id,
                    status: ReportStatus::Success,
                    label: Some(u8::from(probability >= 0.5)),
                    probability: Some(probability),
                    message: None,
                })
                .collect()
        }
        Err(err) => {
            error!(tenant, error = %err, "scoring failed");
            let message = err.to_string();
            ids.into_iter()
                .map(|id| Prediction {
                    id,
                    status: ReportStatus::Error,
                    label: None,
                    probability: None,
                    message: Some(message.clone()),
                })
                .collect()
        }
    }
}

fn predict_inner(
    registry: &ModelRegistry,
    config: &EngineConfig,
    tenant: &str,
    frame: &Frame,
) -> Result<Vec<f64>> {
    let key = ModelKey::lead_scoring(tenant);
    let artifacts = registry.load(&key)?;
    let features = preprocess::transform(
        frame,
        &artifacts.bundle,
        Some(&artifacts.scaler),
        config.impute_from_batch,
    )?;
    artifacts.model.predict_proba(&features.x)
}

/// Row identifiers from an `id`/`lead_id` column, falling back to the
/// row index.
fn row_ids(frame: &Frame) -> Vec<String> {
    let id_col = ID_COLUMNS
        .iter()
        .find_map(|name| frame.column_index(name));

    (0..frame.n_rows())
        .map(|row| match id_col.and_then(|col| frame.get(row, col)) {
            Some(value) if !value.is_null() => match value {
                Value::Num(n) if n.fract() == 0.0 => format!("{}", *n as i64),
                other => other.to_string(),
            },
            _ => row.to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_ids_from_column() {
        let frame = Frame::new(
            vec!["lead_id".to_string(), "v".to_string()],
            vec![
                vec![Value::Num(7.0), Value::Num(1.0)],
                vec![Value::Str("abc".to_string()), Value::Num(2.0)],
                vec![Value::Null, Value::Num(3.0)],
            ],
        );
        assert_eq!(row_ids(&frame), ["7", "abc", "2"]);
    }

    #[test]
    fn test_row_ids_fall_back_to_index() {
        let frame = Frame::new(
            vec!["v".to_string()],
            vec![vec![Value::Num(1.0)], vec![Value::Num(2.0)]],
        );
        assert_eq!(row_ids(&frame), ["0", "1"]);
    }
}
