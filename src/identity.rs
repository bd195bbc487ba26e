//! Identity resolution
//!
//! Merges per-student documents from up to three sources under one canonical
//! key. Keys normalize whitespace and compare case-insensitively; the
//! first-seen spelling is kept for display. A student appearing in only some
//! sources is retained with empty lists for the rest, never dropped.

use crate::error::Warning;
use crate::types::{
    ActivityItem, GradebookDocument, ResourceTimeDocument, ResourceTimeEntry, StudentIdentity,
    StudyDayEntry, StudyHistoryDocument,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

/// Whitespace/case-normalized identity. Two raw names refer to the same
/// student iff their keys are equal.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StudentKey(String);

impl StudentKey {
    /// Trim, collapse internal whitespace, and lowercase the raw name.
    pub fn from_raw(raw: &str) -> Self {
        StudentKey(collapse_whitespace(raw).to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for StudentKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Trim and collapse runs of internal whitespace to single spaces,
/// preserving case.
pub fn collapse_whitespace(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// The merged raw contributions for one canonical key.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StudentSources {
    pub identity: StudentIdentity,
    pub items: Vec<ActivityItem>,
    pub study_days: Vec<StudyDayEntry>,
    pub resources: Vec<ResourceTimeEntry>,
}

/// Resolver merging the three normalized documents by canonical key.
///
/// Resolution is idempotent: the same inputs always yield the same key set
/// and display spellings.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityResolver;

impl IdentityResolver {
    pub fn new() -> Self {
        IdentityResolver
    }

    pub fn resolve(
        &self,
        gradebook: Option<&GradebookDocument>,
        study_history: Option<&StudyHistoryDocument>,
        resource_time: Option<&ResourceTimeDocument>,
    ) -> (BTreeMap<StudentKey, StudentSources>, Vec<Warning>) {
        let mut merged: BTreeMap<StudentKey, StudentSources> = BTreeMap::new();
        let mut warnings = Vec::new();

        if let Some(doc) = gradebook {
            for student in &doc.students {
                let entry = self.entry_for(&mut merged, &mut warnings, &student.name, &student.email);
                entry.items.extend(student.items.iter().cloned());
            }
        }
        if let Some(doc) = study_history {
            for student in &doc.students {
                let entry = self.entry_for(&mut merged, &mut warnings, &student.name, &student.email);
                entry.study_days.extend(student.daily_study.iter().cloned());
            }
        }
        if let Some(doc) = resource_time {
            for student in &doc.students {
                let entry = self.entry_for(&mut merged, &mut warnings, &student.name, &student.email);
                entry.resources.extend(student.resources.iter().cloned());
            }
        }

        (merged, warnings)
    }

    fn entry_for<'a>(
        &self,
        merged: &'a mut BTreeMap<StudentKey, StudentSources>,
        warnings: &mut Vec<Warning>,
        raw_name: &str,
        email: &str,
    ) -> &'a mut StudentSources {
        let key = StudentKey::from_raw(raw_name);
        let spelling = collapse_whitespace(raw_name);
        let entry = merged.entry(key).or_default();

        if entry.identity.display_name.is_empty() {
            entry.identity.display_name = spelling;
        } else if entry.identity.display_name != spelling {
            // First-seen spelling wins; the conflict is noted, never merged
            // destructively.
            warn!(kept = %entry.identity.display_name, discarded = %spelling,
                  "identity spelling conflict");
            warnings.push(Warning::IdentityConflict {
                kept: entry.identity.display_name.clone(),
                discarded: spelling,
            });
        }
        if entry.identity.email.is_empty() && !email.is_empty() {
            entry.identity.email = email.to_string();
        }
        entry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        GradebookMetadata, GradebookStudent, StudyHistoryMetadata, StudyHistoryStudent,
    };

    fn gradebook_with(names: &[&str]) -> GradebookDocument {
        GradebookDocument {
            students: names
                .iter()
                .map(|name| GradebookStudent {
                    name: name.to_string(),
                    email: String::new(),
                    items: vec![],
                })
                .collect(),
            metadata: GradebookMetadata::default(),
        }
    }

    fn study_with(names: &[&str]) -> StudyHistoryDocument {
        StudyHistoryDocument {
            students: names
                .iter()
                .map(|name| StudyHistoryStudent {
                    name: name.to_string(),
                    email: String::new(),
                    daily_study: vec![StudyDayEntry {
                        date: "Apr 1, Tuesday".to_string(),
                        seconds: 100,
                    }],
                })
                .collect(),
            metadata: StudyHistoryMetadata::default(),
        }
    }

    #[test]
    fn test_key_normalizes_whitespace_and_case() {
        assert_eq!(
            StudentKey::from_raw("  Doe,   Jane "),
            StudentKey::from_raw("doe, jane")
        );
        assert_ne!(
            StudentKey::from_raw("Doe, Jane"),
            StudentKey::from_raw("Doe, Janet")
        );
    }

    #[test]
    fn test_merge_across_sources() {
        let resolver = IdentityResolver::new();
        let gradebook = gradebook_with(&["Doe, Jane"]);
        let study = study_with(&["doe,  jane", "Roe, Rex"]);

        let (merged, warnings) = resolver.resolve(Some(&gradebook), Some(&study), None);

        assert_eq!(merged.len(), 2);
        let jane = &merged[&StudentKey::from_raw("Doe, Jane")];
        // First-seen spelling (from the gradebook) is kept for display.
        assert_eq!(jane.identity.display_name, "Doe, Jane");
        assert_eq!(jane.study_days.len(), 1);
        assert_eq!(warnings.len(), 1);

        // Rex appears only in the study source; retained with empty lists.
        let rex = &merged[&StudentKey::from_raw("Roe, Rex")];
        assert!(rex.items.is_empty());
        assert!(rex.resources.is_empty());
        assert_eq!(rex.study_days.len(), 1);
    }

    #[test]
    fn test_spelling_conflict_records_both_forms() {
        let resolver = IdentityResolver::new();
        let gradebook = gradebook_with(&["Doe, Jane"]);
        let study = study_with(&["DOE,   jane"]);

        let (_, warnings) = resolver.resolve(Some(&gradebook), Some(&study), None);
        assert_eq!(
            warnings,
            vec![Warning::IdentityConflict {
                kept: "Doe, Jane".to_string(),
                discarded: "DOE, jane".to_string(),
            }]
        );
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let resolver = IdentityResolver::new();
        let gradebook = gradebook_with(&["Doe, Jane", "ROE,  rex"]);
        let study = study_with(&["doe, jane"]);

        let (first, _) = resolver.resolve(Some(&gradebook), Some(&study), None);
        let (second, _) = resolver.resolve(Some(&gradebook), Some(&study), None);

        let first_names: Vec<_> = first
            .iter()
            .map(|(k, v)| (k.clone(), v.identity.display_name.clone()))
            .collect();
        let second_names: Vec<_> = second
            .iter()
            .map(|(k, v)| (k.clone(), v.identity.display_name.clone()))
            .collect();
        assert_eq!(first_names, second_names);
    }
}
