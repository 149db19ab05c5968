//! Per-tenant preprocessing state
//!
//! The [`PreprocessorBundle`] is everything training fits about a tenant's
//! feature space besides the model itself: column order and kinds, one
//! [`CategoryEncoder`] per categorical column, and the [`ImputeStats`].
//! The [`StandardScaler`] is fitted alongside but persisted as its own
//! artifact. [`fit`] and [`transform`] live in one module so the
//! train/inference consistency invariant has a single owner: inference
//! replays the stored transforms and never refits.

mod encoder;
mod impute;
mod scaler;

pub use encoder::{CategoryEncoder, UNSEEN_CODE};
pub use impute::ImputeStats;
pub use scaler::{ColumnStats, StandardScaler};

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

use crate::error::{Error, Result};
use crate::frame::{Frame, Value};

/// How a predictor column is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeatureKind {
    Numeric,
    Categorical,
}

/// Fitted preprocessing state for one tenant.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PreprocessorBundle {
    /// Predictor columns in training order; inference must present all of
    /// them.
    pub feature_names: Vec<String>,
    pub kinds: BTreeMap<String, FeatureKind>,
    pub encoders: BTreeMap<String, CategoryEncoder>,
    pub imputer: ImputeStats,
}

/// Dense feature table ready for the classifier.
#[derive(Debug, Clone)]
pub struct FeatureMatrix {
    pub names: Vec<String>,
    pub x: Array2<f64>,
}

/// Numeric view of a cell for feature building. Dates become epoch
/// seconds; numeric-looking strings parse; anything else is missing.
fn numeric_view(value: &Value) -> Option<f64> {
    match value {
        Value::Num(_) | Value::Bool(_) => value.as_f64(),
        Value::Date(d) => Some(d.and_utc().timestamp() as f64),
        Value::Str(s) => s.trim().parse().ok(),
        Value::Null => None,
    }
}

/// String view of a cell for categorical encoding.
fn categorical_view(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

fn column_kind(frame: &Frame, idx: usize) -> FeatureKind {
    // Any string cell makes the column categorical; numbers, booleans and
    // dates all have a numeric view. All-null columns default to numeric
    // with a zero fill.
    if frame.column(idx).any(|v| matches!(v, Value::Str(_))) {
        FeatureKind::Categorical
    } else {
        FeatureKind::Numeric
    }
}

/// Fit preprocessing on a training predictor frame and produce the
/// transformed feature table along with the fitted state.
pub fn fit(frame: &Frame) -> Result<(FeatureMatrix, PreprocessorBundle, StandardScaler)> {
    if frame.n_cols() == 0 {
        return Err(Error::DataFormat("no predictor columns".to_string()));
    }

    let n_rows = frame.n_rows();
    let feature_names: Vec<String> = frame.columns().to_vec();
    let mut kinds = BTreeMap::new();
    let mut encoders = BTreeMap::new();
    let mut imputer = ImputeStats::default();
    let mut numeric_samples: Vec<(String, Vec<f64>)> = Vec::new();
    let mut columns: Vec<Vec<f64>> = Vec::with_capacity(feature_names.len());

    for (idx, name) in feature_names.iter().enumerate() {
        let kind = column_kind(frame, idx);
        kinds.insert(name.clone(), kind);

        match kind {
            FeatureKind::Numeric => {
                let observed: Vec<f64> =
                    frame.column(idx).filter_map(numeric_view).collect();
                let fill = impute::numeric_mean(&observed).unwrap_or(0.0);
                imputer.numeric.insert(name.clone(), fill);

                let values: Vec<f64> = frame
                    .column(idx)
                    .map(|v| numeric_view(v).unwrap_or(fill))
                    .collect();
                numeric_samples.push((name.clone(), values.clone()));
                columns.push(values);
            }
            FeatureKind::Categorical => {
                let observed: Vec<String> =
                    frame.column(idx).filter_map(|v| categorical_view(v)).collect();
                let fill = impute::categorical_mode(observed.iter().map(String::as_str))
                    .unwrap_or_default();
                imputer.categorical.insert(name.clone(), fill.clone());

                let imputed: Vec<String> = frame
                    .column(idx)
                    .map(|v| categorical_view(v).unwrap_or_else(|| fill.clone()))
                    .collect();
                let encoder = CategoryEncoder::fit(imputed.iter());
                let values = imputed.iter().map(|v| encoder.encode(v) as f64).collect();
                encoders.insert(name.clone(), encoder);
                columns.push(values);
            }
        }
    }

    let scaler = StandardScaler::fit(&numeric_samples);
    for (idx, name) in feature_names.iter().enumerate() {
        if kinds[name] == FeatureKind::Numeric {
            for v in columns[idx].iter_mut() {
                *v = scaler.transform(name, *v);
            }
        }
    }

    let x = Array2::from_shape_fn((n_rows, columns.len()), |(r, c)| columns[c][r]);
    let bundle = PreprocessorBundle {
        feature_names: feature_names.clone(),
        kinds,
        encoders,
        imputer,
    };
    Ok((
        FeatureMatrix {
            names: feature_names,
            x,
        },
        bundle,
        scaler,
    ))
}

/// Replay stored preprocessing on an inference predictor frame.
///
/// The frame must contain every training column (extras are ignored).
/// Unseen categories map to [`UNSEEN_CODE`]; a missing scaler leaves
/// numeric columns unscaled; both degrade with a warning rather than fail.
/// `impute_from_batch` switches missing-value fills to this batch's own
/// statistics instead of the persisted training statistics.
pub fn transform(
    frame: &Frame,
    bundle: &PreprocessorBundle,
    scaler: Option<&StandardScaler>,
    impute_from_batch: bool,
) -> Result<FeatureMatrix> {
    let n_rows = frame.n_rows();
    let mut columns: Vec<Vec<f64>> = Vec::with_capacity(bundle.feature_names.len());

    for name in &bundle.feature_names {
        let idx = frame.column_index(name).ok_or_else(|| {
            Error::PreprocessingMismatch(format!("column '{name}' missing from input"))
        })?;
        let kind = bundle.kinds.get(name).copied().ok_or_else(|| {
            Error::PreprocessingMismatch(format!("no stored kind for column '{name}'"))
        })?;

        match kind {
            FeatureKind::Numeric => {
                let fill = if impute_from_batch {
                    let observed: Vec<f64> =
                        frame.column(idx).filter_map(numeric_view).collect();
                    impute::numeric_mean(&observed)
                        .or_else(|| bundle.imputer.numeric_fill(name))
                        .unwrap_or(0.0)
                } else {
                    bundle.imputer.numeric_fill(name).unwrap_or(0.0)
                };

                let values = frame
                    .column(idx)
                    .map(|v| {
                        let raw = numeric_view(v).unwrap_or(fill);
                        match scaler {
                            Some(s) => s.transform(name, raw),
                            None => raw,
                        }
                    })
                    .collect();
                columns.push(values);
            }
            FeatureKind::Categorical => {
                let fill = if impute_from_batch {
                    let observed: Vec<String> =
                        frame.column(idx).filter_map(|v| categorical_view(v)).collect();
                    impute::categorical_mode(observed.iter().map(String::as_str))
                        .or_else(|| bundle.imputer.categorical_fill(name).map(str::to_string))
                        .unwrap_or_default()
                } else {
                    bundle
                        .imputer
                        .categorical_fill(name)
                        .map(str::to_string)
                        .unwrap_or_default()
                };

                let values = match bundle.encoders.get(name) {
                    Some(encoder) => {
                        let mut unseen = 0usize;
                        let values: Vec<f64> = frame
                            .column(idx)
                            .map(|v| {
                                let s = categorical_view(v).unwrap_or_else(|| fill.clone());
                                let code = encoder.encode(&s);
                                if code == UNSEEN_CODE {
                                    unseen += 1;
                                }
                                code as f64
                            })
                            .collect();
                        if unseen > 0 {
                            warn!(column = %name, unseen, "unseen categories mapped to fallback code");
                        }
                        values
                    }
                    None => {
                        warn!(column = %name, "no stored encoder; encoding entire column as unseen");
                        vec![UNSEEN_CODE as f64; n_rows]
                    }
                };
                columns.push(values);
            }
        }
    }

    if scaler.is_none() && bundle.kinds.values().any(|k| *k == FeatureKind::Numeric) {
        warn!("no stored scaler; numeric columns pass through unscaled");
    }

    let x = Array2::from_shape_fn((n_rows, columns.len()), |(r, c)| columns[c][r]);
    Ok(FeatureMatrix {
        names: bundle.feature_names.clone(),
        x,
    })
}
