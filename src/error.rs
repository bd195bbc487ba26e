//! Error taxonomy for the aggregation core
//!
//! Structural failures are fatal and abort the normalization of the offending
//! source. Cell-level and identity-level issues are non-fatal [`Warning`]s,
//! accumulated and returned beside the successful result so the caller can
//! decide whether to proceed.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fatal errors surfaced to the caller. No partial result accompanies these.
#[derive(Debug, Error)]
pub enum ReportError {
    /// A required structural element (e.g. the name column) is missing.
    #[error("malformed source {source_name}: {detail}")]
    MalformedSource { source_name: String, detail: String },

    /// A report specification failed validation.
    #[error("invalid report specification ({field}): {detail}")]
    InvalidSpec { field: String, detail: String },

    /// A calendar-day label in a report specification could not be parsed.
    #[error("unparseable date label: {0}")]
    DateParse(String),

    #[error("CSV read error: {0}")]
    Csv(#[from] csv::Error),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl ReportError {
    pub fn malformed(source_name: &str, detail: impl Into<String>) -> Self {
        ReportError::MalformedSource {
            source_name: source_name.to_string(),
            detail: detail.into(),
        }
    }

    pub fn invalid_spec(field: &str, detail: impl Into<String>) -> Self {
        ReportError::InvalidSpec {
            field: field.to_string(),
            detail: detail.into(),
        }
    }
}

/// Non-fatal issues recorded during normalization and aggregation.
///
/// Warnings never change the shape of the result: a bad cell degrades to
/// zero/null, a conflicting spelling keeps the first-seen form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Warning {
    /// An individual cell failed numeric/duration parsing and was degraded.
    CellParse {
        source_name: String,
        student: String,
        column: String,
        raw: String,
    },
    /// Two raw identities normalized to the same key with different spellings.
    IdentityConflict { kept: String, discarded: String },
    /// A study-day label did not match the "MMM D" calendar format; the entry
    /// is kept but excluded from week and date-range computations.
    UnparseableDate { student: String, label: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_names_source_and_column() {
        let err = ReportError::malformed("classgradebook.csv", "missing 'Student' column");
        assert_eq!(
            err.to_string(),
            "malformed source classgradebook.csv: missing 'Student' column"
        );
    }

    #[test]
    fn test_warning_serializes_with_kind_tag() {
        let warning = Warning::IdentityConflict {
            kept: "Doe, Jane".to_string(),
            discarded: "doe,  jane".to_string(),
        };
        let json = serde_json::to_value(&warning).unwrap();
        assert_eq!(json["kind"], "identity_conflict");
        assert_eq!(json["kept"], "Doe, Jane");
    }
}
