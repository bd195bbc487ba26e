//! Study-history source normalizer
//!
//! Transforms the daily study-time CSV (one row per student, one column per
//! calendar-day label) into a canonical [`StudyHistoryDocument`]. Every date
//! column yields an entry, zero seconds when blank, so downstream aggregation
//! sees the complete day grid.

use crate::duration::parse_duration;
use crate::error::{ReportError, Warning};
use crate::types::{StudyDayEntry, StudyHistoryDocument, StudyHistoryMetadata, StudyHistoryStudent};
use tracing::warn;

use super::{require_column, split_identity, SourceNormalizer, STUDENT_COLUMN};

/// Column holding each student's term-to-date total. Required for structural
/// validation; daily entries are the authoritative figures downstream.
const TOTAL_COLUMN: &str = "Total Time Spent";

/// Normalizer for daily study-history exports.
#[derive(Debug, Clone, Copy, Default)]
pub struct StudyHistoryNormalizer;

impl SourceNormalizer for StudyHistoryNormalizer {
    type Document = StudyHistoryDocument;

    fn normalize(
        &self,
        csv_text: &str,
        source_name: &str,
    ) -> Result<(StudyHistoryDocument, Vec<Warning>), ReportError> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(csv_text.as_bytes());
        let headers = reader.headers()?.clone();
        let student_idx = require_column(&headers, STUDENT_COLUMN, source_name)?;
        let total_idx = require_column(&headers, TOTAL_COLUMN, source_name)?;

        let date_columns: Vec<(usize, String)> = headers
            .iter()
            .enumerate()
            .filter(|(idx, _)| *idx != student_idx && *idx != total_idx)
            .map(|(idx, label)| (idx, label.to_string()))
            .collect();

        let mut warnings = Vec::new();
        let mut students = Vec::new();

        for row in reader.records() {
            let row = row?;
            let raw_name = row.get(student_idx).unwrap_or("").trim();
            if raw_name.is_empty() {
                continue;
            }
            let (name, email) = split_identity(raw_name);

            let mut daily_study = Vec::with_capacity(date_columns.len());
            for (idx, label) in &date_columns {
                let cell = row.get(*idx).unwrap_or("").trim();
                let seconds = match parse_duration(cell) {
                    Some(seconds) => seconds,
                    None => {
                        warn!(source = source_name, student = %name, column = %label, raw = cell,
                              "study-history cell failed to parse; degraded to zero");
                        warnings.push(Warning::CellParse {
                            source_name: source_name.to_string(),
                            student: name.clone(),
                            column: label.clone(),
                            raw: cell.to_string(),
                        });
                        0
                    }
                };
                daily_study.push(StudyDayEntry {
                    date: label.clone(),
                    seconds,
                });
            }

            students.push(StudyHistoryStudent {
                name,
                email,
                daily_study,
            });
        }

        let metadata = StudyHistoryMetadata {
            total_students: students.len(),
            date_range: match (date_columns.first(), date_columns.last()) {
                (Some((_, first)), Some((_, last))) => Some((first.clone(), last.clone())),
                _ => None,
            },
            total_study_days: date_columns.len(),
        };

        Ok((StudyHistoryDocument { students, metadata }, warnings))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = "\
Student,Total Time Spent,\"Apr 1, Tuesday\",\"Apr 2, Wednesday\",\"Apr 3, Thursday\"
\"Doe, Jane (jdoe@example.edu)\",1h 40m 0s,1h 30m 0s,10m 0s,
\"Roe, Rex\",3m 20s,bogus,,3m 20s
";

    #[test]
    fn test_normalize_study_history() {
        let normalizer = StudyHistoryNormalizer;
        let (doc, warnings) = normalizer.normalize(SAMPLE, "studyhistory.csv").unwrap();

        assert_eq!(doc.students.len(), 2);
        assert_eq!(doc.metadata.total_study_days, 3);
        assert_eq!(
            doc.metadata.date_range,
            Some(("Apr 1, Tuesday".to_string(), "Apr 3, Thursday".to_string()))
        );

        let jane = &doc.students[0];
        assert_eq!(jane.daily_study.len(), 3);
        assert_eq!(jane.daily_study[0].seconds, 5400);
        assert_eq!(jane.daily_study[1].seconds, 600);
        // Blank day still appears, with zero seconds.
        assert_eq!(jane.daily_study[2].seconds, 0);

        // Rex's "bogus" cell degrades to zero with a warning.
        let rex = &doc.students[1];
        assert_eq!(rex.daily_study[0].seconds, 0);
        assert_eq!(rex.daily_study[2].seconds, 200);
        assert_eq!(warnings.len(), 1);
        assert!(matches!(&warnings[0], Warning::CellParse { raw, .. } if raw == "bogus"));
    }

    #[test]
    fn test_missing_total_column_is_fatal() {
        let normalizer = StudyHistoryNormalizer;
        let err = normalizer
            .normalize("Student,\"Apr 1, Tuesday\"\n\"Doe, Jane\",10m 0s\n", "s.csv")
            .unwrap_err();
        assert!(err.to_string().contains("Total Time Spent"));
    }
}
