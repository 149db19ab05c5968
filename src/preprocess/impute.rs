//! Fitted imputation statistics
//!
//! Fill values are computed at training time (numeric column mean,
//! categorical in-column mode) and persisted with the encoder bundle so
//! inference imputes from the training distribution rather than from
//! whatever small batch it happens to receive. The batch-statistics
//! behavior remains available behind `EngineConfig::impute_from_batch`.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Per-column fitted fill values for a tenant.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ImputeStats {
    /// Numeric column -> mean of non-null values at fit time.
    pub numeric: BTreeMap<String, f64>,
    /// Categorical column -> most frequent value at fit time.
    pub categorical: BTreeMap<String, String>,
}

impl ImputeStats {
    pub fn numeric_fill(&self, column: &str) -> Option<f64> {
        self.numeric.get(column).copied()
    }

    pub fn categorical_fill(&self, column: &str) -> Option<&str> {
        self.categorical.get(column).map(String::as_str)
    }
}

/// Mean of the non-null samples; `None` when there are none.
pub fn numeric_mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Most frequent value; ties break to the lexicographically smallest so
/// refitting is deterministic.
pub fn categorical_mode<'a, I: IntoIterator<Item = &'a str>>(values: I) -> Option<String> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for v in values {
        *counts.entry(v).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.cmp(a.0)))
        .map(|(v, _)| v.to_string())
}
