//! Column-name normalization and the declarative keyword tables
//!
//! Both the semantic data-type classifier and the cleaning rules key off
//! column names. The keyword sets live here as data, evaluated once per
//! ingestion, instead of string matching scattered through the cleaning
//! code. Keywords are substrings of the normalized (trimmed, lowercased,
//! underscored) column name; the vocabulary is bilingual because tenant
//! exports mix Spanish and English headers.

use serde::{Deserialize, Serialize};

/// Semantic type of a record set, inferred from its column names.
///
/// Best-effort: downstream consumers must tolerate `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    Sales,
    Customers,
    Campaigns,
    Unknown,
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DataType::Sales => "sales",
            DataType::Customers => "customers",
            DataType::Campaigns => "campaigns",
            DataType::Unknown => "unknown",
        };
        write!(f, "{s}")
    }
}

/// Cleaning role a column can take on, by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnRole {
    /// Best-effort date parsing applies.
    DateLike,
    /// Best-effort numeric coercion applies.
    AmountLike,
}

struct RoleRule {
    role: ColumnRole,
    keywords: &'static [&'static str],
}

const ROLE_RULES: &[RoleRule] = &[
    RoleRule {
        role: ColumnRole::DateLike,
        keywords: &["fecha", "date"],
    },
    RoleRule {
        role: ColumnRole::AmountLike,
        keywords: &["precio", "total", "cantidad", "value", "amount"],
    },
];

const CATEGORY_RULES: &[(DataType, &[&str])] = &[
    (
        DataType::Sales,
        &["venta", "precio", "total", "cantidad", "revenue", "sale"],
    ),
    (
        DataType::Customers,
        &["cliente", "customer", "email", "telefono", "phone"],
    ),
    (
        DataType::Campaigns,
        &["campaign", "campaña", "ad", "impression", "click"],
    ),
];

/// Normalize a raw header: trim, lowercase, spaces to underscores.
pub fn normalize_column(raw: &str) -> String {
    raw.trim().to_lowercase().replace(' ', "_")
}

/// Cleaning role for a normalized column name, if any rule matches.
/// Date rules take precedence so a column like `fecha_total` parses as a
/// date rather than getting nulled by numeric coercion.
pub fn column_role(name: &str) -> Option<ColumnRole> {
    ROLE_RULES
        .iter()
        .find(|rule| rule.keywords.iter().any(|kw| name.contains(kw)))
        .map(|rule| rule.role)
}

/// Classify the record set by keyword-overlap scoring: each (column,
/// keyword) containment match counts one point for the keyword's category,
/// and the strictly highest score wins. Ties or an all-zero score yield
/// [`DataType::Unknown`].
pub fn classify_columns(columns: &[String]) -> DataType {
    let mut scores: Vec<(DataType, usize)> = CATEGORY_RULES
        .iter()
        .map(|(category, keywords)| {
            let score = columns
                .iter()
                .map(|col| keywords.iter().filter(|kw| col.contains(*kw)).count())
                .sum();
            (*category, score)
        })
        .collect();

    scores.sort_by(|a, b| b.1.cmp(&a.1));
    let (best, best_score) = scores[0];
    let runner_up = scores[1].1;
    if best_score == 0 || best_score == runner_up {
        DataType::Unknown
    } else {
        best
    }
}
