//! Data-quality validation
//!
//! Runs over the record set before cleaning so the counters describe the
//! input as uploaded; the cleaning pass appends its per-column coercion
//! outcomes to the same report afterwards.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

use crate::frame::Frame;

/// What cleaning did to a column, recorded instead of silently swallowed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CoercionOutcome {
    /// No cleaning rule applies to the column.
    None,
    /// Every non-null value parsed as a date; the column was converted.
    DatesParsed { parsed: usize },
    /// Date parsing was attempted but some values failed; the column was
    /// left unchanged.
    DatesUnchanged { unparsed: usize },
    /// Amount-like column coerced to numbers; unparseable values nulled.
    NumbersCoerced { coerced: usize, nulled: usize },
}

/// Quality report for one ingested record set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub total_rows: usize,
    /// Rows where every cell is null.
    pub empty_rows: usize,
    /// Rows identical to an earlier row.
    pub duplicate_rows: usize,
    /// Per-column percentage of null cells (0..=100).
    pub missing_pct: BTreeMap<String, f64>,
    /// Per-column inferred type: a single type name, "mixed", or "null".
    pub column_types: BTreeMap<String, String>,
    /// Per-column cleaning outcome, filled in by the cleaning pass.
    pub coercions: BTreeMap<String, CoercionOutcome>,
}

/// Validate a raw (pre-cleaning) frame.
pub fn validate(frame: &Frame) -> ValidationReport {
    let total_rows = frame.n_rows();

    let empty_rows = frame
        .rows()
        .iter()
        .filter(|row| row.iter().all(|v| v.is_null()))
        .count();

    let mut seen: HashSet<String> = HashSet::with_capacity(total_rows);
    let mut duplicate_rows = 0;
    for row in frame.rows() {
        // Serialized row as the dedup key; Value has no Hash because of f64
        let key = serde_json::to_string(row).unwrap_or_default();
        if !seen.insert(key) {
            duplicate_rows += 1;
        }
    }

    let mut missing_pct = BTreeMap::new();
    let mut column_types = BTreeMap::new();
    for (idx, name) in frame.columns().iter().enumerate() {
        let nulls = frame.column(idx).filter(|v| v.is_null()).count();
        let pct = if total_rows == 0 {
            0.0
        } else {
            nulls as f64 / total_rows as f64 * 100.0
        };
        missing_pct.insert(name.clone(), pct);
        column_types.insert(name.clone(), infer_column_type(frame, idx));
    }

    ValidationReport {
        total_rows,
        empty_rows,
        duplicate_rows,
        missing_pct,
        column_types,
        coercions: BTreeMap::new(),
    }
}

fn infer_column_type(frame: &Frame, idx: usize) -> String {
    let mut inferred: Option<&'static str> = None;
    for v in frame.column(idx) {
        if v.is_null() {
            continue;
        }
        match inferred {
            None => inferred = Some(v.type_name()),
            Some(t) if t == v.type_name() => {}
            Some(_) => return "mixed".to_string(),
        }
    }
    inferred.unwrap_or("null").to_string()
}
