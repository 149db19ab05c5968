//! In-memory tabular structure
//!
//! A [`Frame`] is an ordered sequence of rows over a stable column set, the
//! shape every ingestion source (CSV, spreadsheet, API records) normalizes
//! into and every downstream consumer (validation, preprocessing, training,
//! inference) reads from. Cells are loosely-typed [`Value`]s; column-level
//! typing is inferred, not declared, because tenants upload whatever their
//! CRM exports.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A single cell value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Num(f64),
    Date(NaiveDateTime),
    Str(String),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Numeric view of the cell, if one exists.
    ///
    /// Booleans map to 0/1; strings and dates do not coerce here (cleaning
    /// owns string→number coercion so the outcome can be reported).
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Num(n) => Some(*n),
            Value::Bool(b) => Some(f64::from(u8::from(*b))),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Coarse type name used in validation reports.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Num(_) => "number",
            Value::Date(_) => "date",
            Value::Str(_) => "string",
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => write!(f, ""),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Num(n) => write!(f, "{n}"),
            Value::Date(d) => write!(f, "{d}"),
            Value::Str(s) => write!(f, "{s}"),
        }
    }
}

/// Ordered record set with a stable column set.
///
/// Invariant: every row has exactly `columns.len()` cells, in column order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Frame {
    /// Build a frame from a column list and rows.
    ///
    /// Rows shorter than the column set are padded with nulls; longer rows
    /// are truncated. Ragged CSV input is common enough that this is the
    /// ingestion default rather than an error.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, Value::Null);
                row
            })
            .collect();
        Self { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn get(&self, row: usize, col: usize) -> Option<&Value> {
        self.rows.get(row).and_then(|r| r.get(col))
    }

    /// Iterate one column's cells in row order.
    pub fn column(&self, idx: usize) -> impl Iterator<Item = &Value> {
        self.rows.iter().map(move |r| &r[idx])
    }

    /// Replace one cell. No-op when out of bounds.
    pub fn set(&mut self, row: usize, col: usize, value: Value) {
        if let Some(r) = self.rows.get_mut(row) {
            if let Some(cell) = r.get_mut(col) {
                *cell = value;
            }
        }
    }

    /// Retain only rows matching the predicate, preserving order.
    pub fn retain_rows<F: FnMut(&[Value]) -> bool>(&mut self, mut keep: F) {
        self.rows.retain(|r| keep(r));
    }

    /// A column is treated as numeric when every non-null cell has a
    /// numeric view and at least one cell is non-null.
    pub fn is_numeric_column(&self, idx: usize) -> bool {
        let mut seen = false;
        for v in self.column(idx) {
            if v.is_null() {
                continue;
            }
            if v.as_f64().is_none() {
                return false;
            }
            seen = true;
        }
        seen
    }

    /// Consume the frame into its column list and rows.
    pub fn into_parts(self) -> (Vec<String>, Vec<Vec<Value>>) {
        (self.columns, self.rows)
    }

    /// Split off the named column, returning (predictor frame, column cells).
    pub fn split_column(&self, name: &str) -> Option<(Frame, Vec<Value>)> {
        let target = self.column_index(name)?;
        let columns = self
            .columns
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != target)
            .map(|(_, c)| c.clone())
            .collect();
        let mut extracted = Vec::with_capacity(self.rows.len());
        let rows = self
            .rows
            .iter()
            .map(|row| {
                extracted.push(row[target].clone());
                row.iter()
                    .enumerate()
                    .filter(|(i, _)| *i != target)
                    .map(|(_, v)| v.clone())
                    .collect()
            })
            .collect();
        Some((Frame { columns, rows }, extracted))
    }
}
