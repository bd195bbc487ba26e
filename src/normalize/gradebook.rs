//! Gradebook source normalizer
//!
//! Transforms the class gradebook CSV (one row per student, one column per
//! graded item) into a canonical [`GradebookDocument`]. Cells are completion
//! percentages ("85%" or plain 85); labels are classified by the
//! [`ColumnClassifier`].

use crate::classify::ColumnClassifier;
use crate::error::{ReportError, Warning};
use crate::types::{ActivityItem, Category, GradebookDocument, GradebookMetadata, GradebookStudent};
use std::collections::BTreeMap;
use tracing::warn;

use super::{require_column, split_identity, SourceNormalizer, STUDENT_COLUMN};

/// Normalizer for class gradebook exports.
#[derive(Debug, Clone, Copy, Default)]
pub struct GradebookNormalizer {
    classifier: ColumnClassifier,
}

impl GradebookNormalizer {
    pub fn new(classifier: ColumnClassifier) -> Self {
        GradebookNormalizer { classifier }
    }
}

impl SourceNormalizer for GradebookNormalizer {
    type Document = GradebookDocument;

    fn normalize(
        &self,
        csv_text: &str,
        source_name: &str,
    ) -> Result<(GradebookDocument, Vec<Warning>), ReportError> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(csv_text.as_bytes());
        let headers = reader.headers()?.clone();
        let student_idx = require_column(&headers, STUDENT_COLUMN, source_name)?;

        // Classify every data column once, up front.
        let columns: Vec<(usize, String, Category, Option<u32>)> = headers
            .iter()
            .enumerate()
            .filter(|(idx, _)| *idx != student_idx)
            .map(|(idx, label)| {
                let (category, module) = self.classifier.classify(label);
                (idx, label.to_string(), category, module)
            })
            .collect();

        let mut category_counts: BTreeMap<Category, usize> = BTreeMap::new();
        for (_, _, category, _) in &columns {
            *category_counts.entry(*category).or_default() += 1;
        }

        let mut warnings = Vec::new();
        let mut students = Vec::new();

        for row in reader.records() {
            let row = row?;
            let raw_name = row.get(student_idx).unwrap_or("").trim();
            if raw_name.is_empty() {
                continue;
            }
            let (name, email) = split_identity(raw_name);

            let mut items = Vec::new();
            for (idx, label, category, module) in &columns {
                let cell = row.get(*idx).unwrap_or("").trim();
                if cell.is_empty() {
                    continue;
                }
                let item = match parse_percentage(cell) {
                    Some(fraction) => ActivityItem {
                        label: label.clone(),
                        category: *category,
                        module: *module,
                        score: Some(fraction),
                        completion: fraction,
                    },
                    None => {
                        warn!(source = source_name, student = %name, column = %label, raw = cell,
                              "gradebook cell failed to parse; degraded to zero");
                        warnings.push(Warning::CellParse {
                            source_name: source_name.to_string(),
                            student: name.clone(),
                            column: label.clone(),
                            raw: cell.to_string(),
                        });
                        ActivityItem {
                            label: label.clone(),
                            category: *category,
                            module: *module,
                            score: None,
                            completion: 0.0,
                        }
                    }
                };
                items.push(item);
            }

            students.push(GradebookStudent { name, email, items });
        }

        let metadata = GradebookMetadata {
            total_students: students.len(),
            category_counts,
        };

        Ok((GradebookDocument { students, metadata }, warnings))
    }
}

/// Parse a percentage cell ("85%", "85", "92.5") to a fraction in [0, 1].
fn parse_percentage(cell: &str) -> Option<f64> {
    let digits = cell.strip_suffix('%').unwrap_or(cell).trim();
    let value: f64 = digits.parse().ok()?;
    if !value.is_finite() || value < 0.0 {
        return None;
    }
    Some((value / 100.0).clamp(0.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = "\
Student,Lab - 3.1.2 Configure a Switch,Assessment - 3.1 Module Quiz,Course Survey
\"Doe, Jane (jdoe@example.edu)\",100%,85%,n/a
\"Roe, Rex\",40,,100%
";

    #[test]
    fn test_normalize_gradebook() {
        let normalizer = GradebookNormalizer::default();
        let (doc, warnings) = normalizer
            .normalize(SAMPLE, "classgradebook.csv")
            .unwrap();

        assert_eq!(doc.students.len(), 2);
        assert_eq!(doc.metadata.total_students, 2);
        assert_eq!(doc.metadata.category_counts[&Category::Lab], 1);
        assert_eq!(doc.metadata.category_counts[&Category::Assessment], 1);
        assert_eq!(doc.metadata.category_counts[&Category::Other], 1);

        let jane = &doc.students[0];
        assert_eq!(jane.name, "Doe, Jane");
        assert_eq!(jane.email, "jdoe@example.edu");
        assert_eq!(jane.items.len(), 3);
        assert_eq!(jane.items[0].category, Category::Lab);
        assert_eq!(jane.items[0].module, Some(3));
        assert_eq!(jane.items[0].completion, 1.0);
        assert_eq!(jane.items[1].score, Some(0.85));

        // "n/a" degrades to zero completion with a null score.
        assert_eq!(jane.items[2].completion, 0.0);
        assert_eq!(jane.items[2].score, None);
        assert_eq!(warnings.len(), 1);

        // Rex's empty assessment cell yields no item.
        let rex = &doc.students[1];
        assert_eq!(rex.items.len(), 2);
        assert_eq!(rex.items[0].completion, 0.4);
    }

    #[test]
    fn test_missing_student_column_is_fatal() {
        let normalizer = GradebookNormalizer::default();
        let err = normalizer
            .normalize("Name,Lab - 1.1.1\nJane,50%\n", "classgradebook.csv")
            .unwrap_err();
        assert!(err.to_string().contains("classgradebook.csv"));
        assert!(err.to_string().contains("Student"));
    }

    #[test]
    fn test_blank_rows_are_skipped() {
        let normalizer = GradebookNormalizer::default();
        let (doc, _) = normalizer
            .normalize("Student,Lab - 1.1.1\n,50%\n\"Doe, Jane\",\n", "g.csv")
            .unwrap();
        // The nameless row is dropped; Jane survives with zero items.
        assert_eq!(doc.students.len(), 1);
        assert!(doc.students[0].items.is_empty());
    }

    #[test]
    fn test_overrange_percentage_clamps() {
        assert_eq!(parse_percentage("120%"), Some(1.0));
        assert_eq!(parse_percentage("-5"), None);
        assert_eq!(parse_percentage("92.5"), Some(0.925));
    }
}
