//! Tabular Ingestor
//!
//! Every source — CSV/TSV bytes, spreadsheet files, API-sourced JSON
//! records — funnels into the same pipeline: decode, normalize column
//! names, classify the semantic data type, validate quality, clean and
//! coerce, summarize. Re-ingesting byte-identical input is deterministic
//! and leaves the source untouched.

mod clean;
mod decode;
mod reader;
mod roles;
mod validate;

pub use decode::{decode, Encoding, ENCODING_PRIORITY};
pub use roles::{classify_columns, column_role, normalize_column, ColumnRole, DataType};
pub use validate::{CoercionOutcome, ValidationReport};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::frame::Frame;

/// Summary statistics over the cleaned record set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryStats {
    pub record_count: usize,
    pub column_count: usize,
    pub data_type: DataType,
    /// Descriptive stats for each numeric column.
    pub numeric_summary: BTreeMap<String, NumericSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericSummary {
    pub count: usize,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub max: f64,
}

/// Result of one ingestion: the cleaned record set plus everything a
/// caller needs to decide what to do with it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestReport {
    pub data_type: DataType,
    pub frame: Frame,
    pub record_count: usize,
    pub columns: Vec<String>,
    pub validation: ValidationReport,
    pub summary: SummaryStats,
}

/// Tabular ingestor over files, byte streams and JSON records.
#[derive(Debug, Default)]
pub struct Ingestor;

impl Ingestor {
    pub fn new() -> Self {
        Self
    }

    /// Ingest a file, dispatching on extension: delimited text is decoded
    /// under the encoding priority list; spreadsheets go through the
    /// workbook reader.
    pub fn ingest_path(&self, path: impl AsRef<Path>) -> Result<IngestReport> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();

        let raw = match ext.as_str() {
            "xls" | "xlsx" | "xlsm" | "xlsb" | "ods" => reader::read_workbook(path)?,
            "tsv" => self.decode_delimited(&std::fs::read(path)?, b'\t')?,
            // csv, txt and anything unrecognized: treat as comma-delimited text
            _ => self.decode_delimited(&std::fs::read(path)?, b',')?,
        };
        self.run_pipeline(raw)
    }

    /// Ingest CSV bytes (e.g. an upload body held in memory).
    pub fn ingest_csv_bytes(&self, bytes: &[u8]) -> Result<IngestReport> {
        let raw = self.decode_delimited(bytes, b',')?;
        self.run_pipeline(raw)
    }

    /// Ingest API-sourced records (one JSON object per row), the entry
    /// point ad-platform connectors feed.
    pub fn ingest_json(&self, records: &[serde_json::Value]) -> Result<IngestReport> {
        let raw = reader::read_json_records(records)?;
        self.run_pipeline(raw)
    }

    fn decode_delimited(&self, bytes: &[u8], delimiter: u8) -> Result<Frame> {
        let (text, encoding) = decode::decode(bytes)?;
        debug!(encoding = encoding.name(), "decoded tabular input");
        reader::read_csv(&text, delimiter)
    }

    fn run_pipeline(&self, raw: Frame) -> Result<IngestReport> {
        let (raw_columns, rows) = raw.into_parts();
        let columns: Vec<String> = raw_columns.iter().map(|c| normalize_column(c)).collect();
        if columns.is_empty() {
            return Err(Error::DataFormat("input has no columns".to_string()));
        }
        let mut frame = Frame::new(columns.clone(), rows);

        let data_type = classify_columns(frame.columns());
        let mut validation = validate::validate(&frame);
        validation.coercions = clean::clean(&mut frame);
        let summary = summarize(&frame, data_type);

        info!(
            %data_type,
            rows = frame.n_rows(),
            cols = frame.n_cols(),
            empty = validation.empty_rows,
            duplicates = validation.duplicate_rows,
            "ingested dataset"
        );

        Ok(IngestReport {
            data_type,
            record_count: frame.n_rows(),
            columns: frame.columns().to_vec(),
            validation,
            summary,
            frame,
        })
    }
}

fn summarize(frame: &Frame, data_type: DataType) -> SummaryStats {
    let mut numeric_summary = BTreeMap::new();
    for (idx, name) in frame.columns().iter().enumerate() {
        if !frame.is_numeric_column(idx) {
            continue;
        }
        let values: Vec<f64> = frame.column(idx).filter_map(|v| v.as_f64()).collect();
        if values.is_empty() {
            continue;
        }
        let count = values.len();
        let mean = values.iter().sum::<f64>() / count as f64;
        let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / count as f64;
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        numeric_summary.insert(
            name.clone(),
            NumericSummary {
                count,
                mean,
                std: var.sqrt(),
                min,
                max,
            },
        );
    }

    SummaryStats {
        record_count: frame.n_rows(),
        column_count: frame.n_cols(),
        data_type,
        numeric_summary,
    }
}
