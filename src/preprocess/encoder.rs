//! Fitted categorical encoder
//!
//! One encoder per (tenant, column) pair. Codes are assigned over the
//! sorted distinct values observed at fit time, so refitting on the same
//! data reproduces the same mapping. Values never seen during fitting get
//! the reserved fallback code at transform time instead of an error.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Reserved code for categories unseen during fitting.
pub const UNSEEN_CODE: i64 = -1;

/// Fitted category -> integer code mapping for a single column.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CategoryEncoder {
    codes: BTreeMap<String, i64>,
}

impl CategoryEncoder {
    /// Fit an encoder over observed values. Distinct values are coded in
    /// sorted order starting at 0.
    pub fn fit<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut distinct: Vec<String> = values
            .into_iter()
            .map(|v| v.as_ref().to_string())
            .collect();
        distinct.sort();
        distinct.dedup();

        let codes = distinct
            .into_iter()
            .enumerate()
            .map(|(code, value)| (value, code as i64))
            .collect();
        Self { codes }
    }

    /// Code for a value; [`UNSEEN_CODE`] when the value was not observed
    /// at fit time.
    pub fn encode(&self, value: &str) -> i64 {
        self.codes.get(value).copied().unwrap_or(UNSEEN_CODE)
    }

    pub fn contains(&self, value: &str) -> bool {
        self.codes.contains_key(value)
    }

    /// Number of known categories.
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}
