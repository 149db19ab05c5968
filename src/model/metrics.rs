//! Classification metrics
//!
//! Accuracy plus a per-class precision/recall/F1/support report for binary
//! labels. Zero denominators yield 0.0 rather than NaN.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Fraction of correct predictions.
pub fn accuracy(y_true: &[u8], y_pred: &[u8]) -> f64 {
    assert_eq!(y_true.len(), y_pred.len());
    if y_true.is_empty() {
        return 0.0;
    }
    let correct = y_true
        .iter()
        .zip(y_pred.iter())
        .filter(|(t, p)| t == p)
        .count();
    correct as f64 / y_true.len() as f64
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

/// Per-class report keyed by label ("0", "1").
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ClassificationReport {
    pub classes: BTreeMap<String, ClassMetrics>,
}

pub fn classification_report(y_true: &[u8], y_pred: &[u8]) -> ClassificationReport {
    assert_eq!(y_true.len(), y_pred.len());
    let mut classes = BTreeMap::new();

    for class in [0u8, 1u8] {
        let mut true_positives = 0usize;
        let mut predicted = 0usize;
        let mut actual = 0usize;

        for (&t, &p) in y_true.iter().zip(y_pred.iter()) {
            if p == class {
                predicted += 1;
                if t == class {
                    true_positives += 1;
                }
            }
            if t == class {
                actual += 1;
            }
        }

        let precision = if predicted == 0 {
            0.0
        } else {
            true_positives as f64 / predicted as f64
        };
        let recall = if actual == 0 {
            0.0
        } else {
            true_positives as f64 / actual as f64
        };
        let f1 = if precision + recall == 0.0 {
            0.0
        } else {
            2.0 * precision * recall / (precision + recall)
        };

        classes.insert(
            class.to_string(),
            ClassMetrics {
                precision,
                recall,
                f1,
                support: actual,
            },
        );
    }

    ClassificationReport { classes }
}
