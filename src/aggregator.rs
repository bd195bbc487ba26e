//! Metrics aggregation
//!
//! Builds the unified per-student [`MetricsRecord`] from the merged source
//! documents: module rollups, category rollups, weekly study rollups, and a
//! class-wide summary. Records are policy-free; report engines re-derive
//! figures from the raw items under the caller's thresholds.

use crate::calendar::{day_of_year, week_index};
use crate::error::Warning;
use crate::identity::{StudentKey, StudentSources};
use crate::types::{
    Category, CategoryTally, ClassSummary, MetricsRecord, ModuleTally, WeekTally,
};
use std::collections::BTreeMap;
use tracing::debug;

/// Full completion threshold used by the record's convenience rollup. Engines
/// apply their own policy over the raw fractions.
const FULL_COMPLETION: f64 = 1.0;

/// Output of one aggregation run.
#[derive(Debug, Clone)]
pub struct AggregateOutcome {
    pub records: BTreeMap<StudentKey, MetricsRecord>,
    pub class_summary: ClassSummary,
    pub warnings: Vec<Warning>,
}

/// Aggregator over resolved per-student sources.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsAggregator;

impl MetricsAggregator {
    pub fn new() -> Self {
        MetricsAggregator
    }

    /// Build one metrics record per canonical key, plus the class summary.
    pub fn aggregate(&self, merged: BTreeMap<StudentKey, StudentSources>) -> AggregateOutcome {
        let mut warnings = Vec::new();
        let mut records = BTreeMap::new();
        let mut class_summary = ClassSummary {
            total_students: merged.len(),
            ..ClassSummary::default()
        };

        for (key, sources) in merged {
            let record = self.build_record(sources, &mut warnings);

            class_summary.total_study_seconds +=
                record.study_days.iter().map(|d| d.seconds).sum::<u64>();
            for resource in &record.resources {
                *class_summary
                    .category_seconds
                    .entry(resource.category)
                    .or_default() += resource.seconds;
            }

            records.insert(key, record);
        }

        if class_summary.total_students > 0 {
            class_summary.average_study_seconds =
                class_summary.total_study_seconds / class_summary.total_students as u64;
        }

        debug!(
            students = class_summary.total_students,
            warnings = warnings.len(),
            "aggregation complete"
        );

        AggregateOutcome {
            records,
            class_summary,
            warnings,
        }
    }

    fn build_record(&self, sources: StudentSources, warnings: &mut Vec<Warning>) -> MetricsRecord {
        let module_rollup = build_module_rollup(&sources);
        let category_rollup = build_category_rollup(&sources);
        let weekly_rollup = build_weekly_rollup(&sources, warnings);

        MetricsRecord {
            identity: sources.identity,
            items: sources.items,
            study_days: sources.study_days,
            resources: sources.resources,
            module_rollup,
            category_rollup,
            weekly_rollup,
        }
    }
}

/// Group lab items with a module number; items without one are module-less
/// and appear only in category rollups.
fn build_module_rollup(sources: &StudentSources) -> BTreeMap<u32, ModuleTally> {
    let mut rollup: BTreeMap<u32, ModuleTally> = BTreeMap::new();
    for item in &sources.items {
        let (Category::Lab, Some(module)) = (item.category, item.module) else {
            continue;
        };
        let tally = rollup.entry(module).or_default();
        tally.total += 1;
        if item.completion >= FULL_COMPLETION {
            tally.completed += 1;
        }
    }
    rollup
}

/// Count items, sum resource time, and average non-null scores per category.
fn build_category_rollup(sources: &StudentSources) -> BTreeMap<Category, CategoryTally> {
    let mut rollup: BTreeMap<Category, CategoryTally> = BTreeMap::new();
    let mut score_sums: BTreeMap<Category, (f64, usize)> = BTreeMap::new();

    for item in &sources.items {
        let tally = rollup.entry(item.category).or_default();
        tally.count += 1;
        if let Some(score) = item.score {
            let (sum, n) = score_sums.entry(item.category).or_default();
            *sum += score;
            *n += 1;
        }
    }
    for resource in &sources.resources {
        rollup.entry(resource.category).or_default().total_seconds += resource.seconds;
    }
    for (category, (sum, n)) in score_sums {
        if n > 0 {
            rollup.entry(category).or_default().avg_score = sum / n as f64;
        }
    }
    rollup
}

/// Sort study days by the calendar ordinal mapping (never lexically) and
/// bucket into 7-day windows from the first entry's date. Entries with
/// unparseable labels are excluded here but retained in `study_days`.
fn build_weekly_rollup(
    sources: &StudentSources,
    warnings: &mut Vec<Warning>,
) -> BTreeMap<u32, WeekTally> {
    let mut dated: Vec<(u16, &str, u64)> = Vec::with_capacity(sources.study_days.len());
    for entry in &sources.study_days {
        match day_of_year(&entry.date) {
            Ok(ordinal) => dated.push((ordinal, &entry.date, entry.seconds)),
            Err(_) => warnings.push(Warning::UnparseableDate {
                student: sources.identity.display_name.clone(),
                label: entry.date.clone(),
            }),
        }
    }
    dated.sort_by_key(|(ordinal, _, _)| *ordinal);

    let mut rollup: BTreeMap<u32, WeekTally> = BTreeMap::new();
    let Some(&(origin, _, _)) = dated.first() else {
        return rollup;
    };
    for (ordinal, date, seconds) in dated {
        let week = rollup.entry(week_index(ordinal, origin)).or_default();
        week.seconds += seconds;
        week.per_day.push((date.to_string(), seconds));
    }
    rollup
}
