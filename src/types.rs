//! Core types for the aggregation pipeline
//!
//! This module defines the data that flows through each stage: canonical
//! per-source documents, the per-student metrics record, and the rollup
//! tallies the report engines consume.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Semantic category of a gradebook item or learning resource.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Assessment,
    Lab,
    Lesson,
    FactSheet,
    Video,
    Other,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Assessment => "assessment",
            Category::Lab => "lab",
            Category::Lesson => "lesson",
            Category::FactSheet => "fact_sheet",
            Category::Video => "video",
            Category::Other => "other",
        }
    }

    /// All categories, in rollup display order.
    pub const ALL: [Category; 6] = [
        Category::Assessment,
        Category::Lab,
        Category::Lesson,
        Category::FactSheet,
        Category::Video,
        Category::Other,
    ];
}

/// One gradebook entry for one student.
///
/// `module` is derived from the leading numeric token of the label
/// (`"<module>.<unit>.<item>"`). Items without a parseable module number are
/// excluded from module-scoped rollups but retained in category rollups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityItem {
    pub label: String,
    pub category: Category,
    pub module: Option<u32>,
    /// Score in [0, 1]; `None` when the cell was empty or failed to parse.
    pub score: Option<f64>,
    /// Completion fraction in [0, 1].
    pub completion: f64,
}

/// One calendar day of study activity.
///
/// Dates are free-text labels ("Apr 15, Tuesday") with no timezone; source
/// order is not guaranteed chronological.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudyDayEntry {
    pub date: String,
    pub seconds: u64,
}

/// Time spent on one learning resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceTimeEntry {
    pub label: String,
    pub category: Category,
    pub seconds: u64,
}

/// Display identity carried through from the raw sources.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentIdentity {
    pub display_name: String,
    pub email: String,
}

// ---------------------------------------------------------------------------
// Canonical per-source documents (normalizer output, aggregator input)
// ---------------------------------------------------------------------------

/// Canonical gradebook document: one entry per student row.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GradebookDocument {
    pub students: Vec<GradebookStudent>,
    pub metadata: GradebookMetadata,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradebookStudent {
    pub name: String,
    pub email: String,
    pub items: Vec<ActivityItem>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GradebookMetadata {
    pub total_students: usize,
    /// Item count per category across the column set.
    pub category_counts: BTreeMap<Category, usize>,
}

/// Canonical study-history document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StudyHistoryDocument {
    pub students: Vec<StudyHistoryStudent>,
    pub metadata: StudyHistoryMetadata,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudyHistoryStudent {
    pub name: String,
    pub email: String,
    pub daily_study: Vec<StudyDayEntry>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StudyHistoryMetadata {
    pub total_students: usize,
    /// First and last day-column labels, in source order.
    pub date_range: Option<(String, String)>,
    pub total_study_days: usize,
}

/// Canonical resource-time document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResourceTimeDocument {
    pub students: Vec<ResourceTimeStudent>,
    pub metadata: ResourceTimeMetadata,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceTimeStudent {
    pub name: String,
    pub email: String,
    pub resources: Vec<ResourceTimeEntry>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResourceTimeMetadata {
    pub total_students: usize,
    pub total_resources: usize,
    pub class_total_seconds: u64,
}

// ---------------------------------------------------------------------------
// Metrics record (aggregator output, engine input)
// ---------------------------------------------------------------------------

/// Lab completion tally for one module.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleTally {
    pub completed: usize,
    pub total: usize,
}

/// Per-category counts, resource time, and mean score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryTally {
    pub count: usize,
    pub total_seconds: u64,
    /// Mean of non-null scores; 0 when no item in the category has a score.
    pub avg_score: f64,
}

/// Study time bucketed into one 7-day window.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekTally {
    pub seconds: u64,
    /// Per-day seconds keyed by the original date label, in calendar order.
    pub per_day: Vec<(String, u64)>,
}

/// The unified per-student aggregate built from all three sources.
///
/// Owned exclusively by the aggregator: constructed once per invocation,
/// immutable after construction, discarded at the end of the run. Rollups are
/// policy-free conveniences; engines re-derive figures from `items` under the
/// caller's thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsRecord {
    pub identity: StudentIdentity,
    pub items: Vec<ActivityItem>,
    pub study_days: Vec<StudyDayEntry>,
    pub resources: Vec<ResourceTimeEntry>,
    pub module_rollup: BTreeMap<u32, ModuleTally>,
    pub category_rollup: BTreeMap<Category, CategoryTally>,
    pub weekly_rollup: BTreeMap<u32, WeekTally>,
}

/// Class-wide aggregate over one run's metrics records.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClassSummary {
    pub total_students: usize,
    pub total_study_seconds: u64,
    pub average_study_seconds: u64,
    /// Total resource time per category across the class.
    pub category_seconds: BTreeMap<Category, u64>,
}
