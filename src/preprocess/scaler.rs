//! Fitted numeric scaler
//!
//! One scaler per tenant, covering every numeric predictor column. Stores
//! per-column center/scale statistics at fit time and applies them
//! identically at training and inference.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColumnStats {
    pub mean: f64,
    pub std: f64,
}

/// Standard (z-score) scaler over named numeric columns.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StandardScaler {
    stats: BTreeMap<String, ColumnStats>,
}

impl StandardScaler {
    /// Fit from named column samples. Columns with no samples are skipped.
    pub fn fit(columns: &[(String, Vec<f64>)]) -> Self {
        let mut stats = BTreeMap::new();
        for (name, values) in columns {
            if values.is_empty() {
                continue;
            }
            let n = values.len() as f64;
            let mean = values.iter().sum::<f64>() / n;
            let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
            stats.insert(
                name.clone(),
                ColumnStats {
                    mean,
                    std: var.sqrt(),
                },
            );
        }
        Self { stats }
    }

    /// Scale one value of a named column. A zero-variance column is only
    /// centered; a column the scaler never saw passes through unchanged.
    pub fn transform(&self, column: &str, value: f64) -> f64 {
        match self.stats.get(column) {
            Some(s) if s.std > 0.0 => (value - s.mean) / s.std,
            Some(s) => value - s.mean,
            None => value,
        }
    }

    pub fn covers(&self, column: &str) -> bool {
        self.stats.contains_key(column)
    }

    pub fn is_empty(&self) -> bool {
        self.stats.is_empty()
    }
}
