//! Cleaning and best-effort type coercion
//!
//! Drops fully-empty rows, trims string cells, then applies the role-driven
//! coercions: date parsing for date-like columns, numeric coercion for
//! amount-like columns. All coercion is best-effort and per-column outcomes
//! are returned for the validation report rather than discarded.

use chrono::{NaiveDate, NaiveDateTime};
use std::collections::BTreeMap;

use super::roles::{column_role, ColumnRole};
use super::validate::CoercionOutcome;
use crate::frame::{Frame, Value};

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y", "%m/%d/%Y", "%d-%m-%Y"];
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Clean the frame in place and report what happened to each column.
pub fn clean(frame: &mut Frame) -> BTreeMap<String, CoercionOutcome> {
    frame.retain_rows(|row| !row.iter().all(|v| v.is_null()));
    trim_strings(frame);

    let mut outcomes = BTreeMap::new();
    let columns: Vec<String> = frame.columns().to_vec();
    for (idx, name) in columns.iter().enumerate() {
        let outcome = match column_role(name) {
            Some(ColumnRole::DateLike) => coerce_dates(frame, idx),
            Some(ColumnRole::AmountLike) => coerce_numbers(frame, idx),
            None => CoercionOutcome::None,
        };
        outcomes.insert(name.clone(), outcome);
    }
    outcomes
}

fn trim_strings(frame: &mut Frame) {
    for row in 0..frame.n_rows() {
        for col in 0..frame.n_cols() {
            if let Some(Value::Str(s)) = frame.get(row, col) {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    frame.set(row, col, Value::Null);
                } else if trimmed.len() != s.len() {
                    frame.set(row, col, Value::Str(trimmed.to_string()));
                }
            }
        }
    }
}

/// Parse a date or datetime string against the supported formats.
pub fn parse_date(s: &str) -> Option<NaiveDateTime> {
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return d.and_hms_opt(0, 0, 0);
        }
    }
    None
}

/// Convert the column to dates only when every non-null cell parses;
/// a partial parse leaves the column untouched, mirroring whole-column
/// date inference.
fn coerce_dates(frame: &mut Frame, idx: usize) -> CoercionOutcome {
    let mut parsed: Vec<(usize, NaiveDateTime)> = Vec::new();
    let mut unparsed = 0usize;

    for (row, value) in frame.column(idx).enumerate() {
        match value {
            Value::Null | Value::Date(_) => {}
            Value::Str(s) => match parse_date(s) {
                Some(dt) => parsed.push((row, dt)),
                None => unparsed += 1,
            },
            _ => unparsed += 1,
        }
    }

    if unparsed > 0 {
        return CoercionOutcome::DatesUnchanged { unparsed };
    }

    let count = parsed.len();
    for (row, dt) in parsed {
        frame.set(row, idx, Value::Date(dt));
    }
    CoercionOutcome::DatesParsed { parsed: count }
}

/// Coerce every cell of an amount-like column to a number; unparseable
/// values become null instead of failing the ingestion.
fn coerce_numbers(frame: &mut Frame, idx: usize) -> CoercionOutcome {
    let mut coerced = 0usize;
    let mut nulled = 0usize;
    let mut updates: Vec<(usize, Value)> = Vec::new();

    for (row, value) in frame.column(idx).enumerate() {
        match value {
            Value::Null | Value::Num(_) => {}
            Value::Bool(b) => {
                updates.push((row, Value::Num(f64::from(u8::from(*b)))));
                coerced += 1;
            }
            Value::Str(s) => match s.trim().parse::<f64>() {
                Ok(n) => {
                    updates.push((row, Value::Num(n)));
                    coerced += 1;
                }
                Err(_) => {
                    updates.push((row, Value::Null));
                    nulled += 1;
                }
            },
            Value::Date(_) => {
                updates.push((row, Value::Null));
                nulled += 1;
            }
        }
    }

    for (row, value) in updates {
        frame.set(row, idx, value);
    }
    CoercionOutcome::NumbersCoerced { coerced, nulled }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drops_fully_empty_rows() {
        let mut f = Frame::new(
            vec!["a".to_string()],
            vec![vec![Value::Null], vec![Value::Str("x".into())]],
        );
        clean(&mut f);
        assert_eq!(f.n_rows(), 1);
    }

    #[test]
    fn test_trims_strings_and_nulls_blank() {
        let mut f = Frame::new(
            vec!["a".to_string()],
            vec![vec![Value::Str("  hi  ".into())], vec![Value::Str("   ".into())]],
        );
        clean(&mut f);
        assert_eq!(f.get(0, 0), Some(&Value::Str("hi".to_string())));
        // "   " trims to empty -> null, then the row is NOT dropped because
        // row-dropping ran before trimming, matching validation counters
        assert_eq!(f.get(1, 0), Some(&Value::Null));
    }

    #[test]
    fn test_date_column_parses_fully() {
        let mut f = Frame::new(
            vec!["fecha".to_string()],
            vec![
                vec![Value::Str("2024-01-15".into())],
                vec![Value::Str("16/01/2024".into())],
                vec![Value::Null],
            ],
        );
        let outcomes = clean(&mut f);
        assert_eq!(outcomes["fecha"], CoercionOutcome::DatesParsed { parsed: 2 });
        assert!(matches!(f.get(0, 0), Some(Value::Date(_))));
    }

    #[test]
    fn test_date_column_partial_failure_left_unchanged() {
        let mut f = Frame::new(
            vec!["fecha".to_string()],
            vec![
                vec![Value::Str("2024-01-15".into())],
                vec![Value::Str("next tuesday".into())],
            ],
        );
        let outcomes = clean(&mut f);
        assert_eq!(
            outcomes["fecha"],
            CoercionOutcome::DatesUnchanged { unparsed: 1 }
        );
        assert_eq!(f.get(0, 0), Some(&Value::Str("2024-01-15".to_string())));
    }

    #[test]
    fn test_amount_column_coerces_and_nulls() {
        let mut f = Frame::new(
            vec!["precio".to_string()],
            vec![
                vec![Value::Str("12.5".into())],
                vec![Value::Str("n/a".into())],
                vec![Value::Num(3.0)],
            ],
        );
        let outcomes = clean(&mut f);
        assert_eq!(
            outcomes["precio"],
            CoercionOutcome::NumbersCoerced { coerced: 1, nulled: 1 }
        );
        assert_eq!(f.get(0, 0), Some(&Value::Num(12.5)));
        assert_eq!(f.get(1, 0), Some(&Value::Null));
        assert_eq!(f.get(2, 0), Some(&Value::Num(3.0)));
    }

    #[test]
    fn test_unrelated_column_untouched() {
        let mut f = Frame::new(
            vec!["nombre".to_string()],
            vec![vec![Value::Str("ana".into())]],
        );
        let outcomes = clean(&mut f);
        assert_eq!(outcomes["nombre"], CoercionOutcome::None);
    }

    #[test]
    fn test_parse_date_formats() {
        assert!(parse_date("2024-03-01").is_some());
        assert!(parse_date("01/03/2024").is_some());
        assert!(parse_date("2024-03-01 10:30:00").is_some());
        assert!(parse_date("soon").is_none());
    }
}
