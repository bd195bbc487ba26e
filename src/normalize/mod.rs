//! Source normalizers
//!
//! Each normalizer consumes one raw CSV export (rows = students, columns =
//! activity/resource/day labels) and produces the matching canonical
//! document. A missing required column is fatal; individual bad cells degrade
//! to zero/null with an accumulated [`Warning`].

mod gradebook;
mod resource_time;
mod study_history;

pub use gradebook::GradebookNormalizer;
pub use resource_time::ResourceTimeNormalizer;
pub use study_history::StudyHistoryNormalizer;

use crate::error::{ReportError, Warning};

/// Trait for raw-source normalizers.
pub trait SourceNormalizer {
    type Document;

    /// Parse raw CSV text into a canonical document plus non-fatal warnings.
    /// `source_name` is echoed into errors and warnings for diagnosis.
    fn normalize(
        &self,
        csv_text: &str,
        source_name: &str,
    ) -> Result<(Self::Document, Vec<Warning>), ReportError>;
}

/// Column header naming the student in every source.
pub(crate) const STUDENT_COLUMN: &str = "Student";

/// Locate a required header, case-insensitively.
pub(crate) fn require_column(
    headers: &csv::StringRecord,
    name: &str,
    source_name: &str,
) -> Result<usize, ReportError> {
    headers
        .iter()
        .position(|h| h.trim().eq_ignore_ascii_case(name))
        .ok_or_else(|| ReportError::malformed(source_name, format!("missing '{name}' column")))
}

/// Split a raw identity cell `"Last, First (email@host)"` into name and email.
/// The parenthesized suffix is optional.
pub(crate) fn split_identity(raw: &str) -> (String, String) {
    if let (Some(open), Some(close)) = (raw.find('('), raw.rfind(')')) {
        if open < close {
            let name = raw[..open].trim().to_string();
            let email = raw[open + 1..close].trim().to_string();
            return (name, email);
        }
    }
    (raw.trim().to_string(), String::new())
}
