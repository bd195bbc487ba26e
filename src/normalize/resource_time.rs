//! Resource-time source normalizer
//!
//! Transforms the time-per-resource CSV (one row per student, one column per
//! resource label) into a canonical [`ResourceTimeDocument`]. Zero-time cells
//! yield no entry; the student row itself is always kept.

use crate::classify::ColumnClassifier;
use crate::duration::parse_duration;
use crate::error::{ReportError, Warning};
use crate::types::{
    Category, ResourceTimeDocument, ResourceTimeEntry, ResourceTimeMetadata, ResourceTimeStudent,
};
use tracing::warn;

use super::{require_column, split_identity, SourceNormalizer, STUDENT_COLUMN};

/// Normalizer for time-per-resource exports.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResourceTimeNormalizer {
    classifier: ColumnClassifier,
}

impl ResourceTimeNormalizer {
    pub fn new(classifier: ColumnClassifier) -> Self {
        ResourceTimeNormalizer { classifier }
    }
}

impl SourceNormalizer for ResourceTimeNormalizer {
    type Document = ResourceTimeDocument;

    fn normalize(
        &self,
        csv_text: &str,
        source_name: &str,
    ) -> Result<(ResourceTimeDocument, Vec<Warning>), ReportError> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(csv_text.as_bytes());
        let headers = reader.headers()?.clone();
        let student_idx = require_column(&headers, STUDENT_COLUMN, source_name)?;

        let columns: Vec<(usize, String, Category)> = headers
            .iter()
            .enumerate()
            .filter(|(idx, _)| *idx != student_idx)
            .map(|(idx, label)| (idx, label.to_string(), self.classifier.categorize(label)))
            .collect();

        let mut warnings = Vec::new();
        let mut students = Vec::new();
        let mut class_total_seconds = 0u64;

        for row in reader.records() {
            let row = row?;
            let raw_name = row.get(student_idx).unwrap_or("").trim();
            if raw_name.is_empty() {
                continue;
            }
            let (name, email) = split_identity(raw_name);

            let mut resources = Vec::new();
            for (idx, label, category) in &columns {
                let cell = row.get(*idx).unwrap_or("").trim();
                let seconds = match parse_duration(cell) {
                    Some(seconds) => seconds,
                    None => {
                        warn!(source = source_name, student = %name, column = %label, raw = cell,
                              "resource-time cell failed to parse; degraded to zero");
                        warnings.push(Warning::CellParse {
                            source_name: source_name.to_string(),
                            student: name.clone(),
                            column: label.clone(),
                            raw: cell.to_string(),
                        });
                        0
                    }
                };
                if seconds == 0 {
                    continue;
                }
                class_total_seconds += seconds;
                resources.push(ResourceTimeEntry {
                    label: label.clone(),
                    category: *category,
                    seconds,
                });
            }

            students.push(ResourceTimeStudent {
                name,
                email,
                resources,
            });
        }

        let metadata = ResourceTimeMetadata {
            total_students: students.len(),
            total_resources: columns.len(),
            class_total_seconds,
        };

        Ok((ResourceTimeDocument { students, metadata }, warnings))
    }
}
