//! Study-time engine
//!
//! Study behavior per student over an inclusive date range (and an optional
//! focus subset): total time, days that clear the study-day threshold, and
//! the average per study day, plus one sub-table per calendar week showing
//! the day-by-day breakdown. Weeks count in 7-day windows from the range
//! start. Entries whose labels failed calendar parsing were already flagged
//! during aggregation and are simply skipped here.

use crate::calendar::{day_of_year, DateRange, ResolvedRange};
use crate::duration::format_duration;
use crate::error::ReportError;
use crate::identity::StudentKey;
use crate::report::spec::StudyTimeReportSpec;
use crate::report::table::{config_echo, CellValue, DerivedTable, Provenance, ReportKind, Section, Table};
use crate::types::MetricsRecord;
use std::collections::BTreeMap;
use tracing::debug;

struct RangeFigures {
    total_seconds: u64,
    study_days: usize,
}

impl RangeFigures {
    fn average(&self) -> u64 {
        if self.study_days == 0 {
            0
        } else {
            self.total_seconds / self.study_days as u64
        }
    }
}

fn range_figures(record: &MetricsRecord, range: ResolvedRange, min_seconds: u64) -> RangeFigures {
    let mut figures = RangeFigures {
        total_seconds: 0,
        study_days: 0,
    };
    for entry in &record.study_days {
        let Ok(ordinal) = day_of_year(&entry.date) else {
            continue;
        };
        if !range.contains(ordinal) {
            continue;
        }
        figures.total_seconds += entry.seconds;
        if entry.seconds >= min_seconds {
            figures.study_days += 1;
        }
    }
    figures
}

/// Weekly sub-tables for one resolved range: every 7-day window from the
/// range start, each listing every student against the day labels actually
/// present in that window.
fn weekly_sections(
    records: &BTreeMap<StudentKey, MetricsRecord>,
    range: ResolvedRange,
    title_prefix: &str,
) -> Vec<Section> {
    let span = u32::from(range.end - range.start) + 1;
    let weeks = span.div_ceil(7);

    let mut sections = Vec::with_capacity(weeks as usize);
    for week in 1..=weeks {
        let window_start = range.start + ((week - 1) * 7) as u16;
        let window_end = (window_start + 6).min(range.end);

        // Day labels seen in any student's history for this window, in
        // calendar order.
        let mut labels: BTreeMap<u16, String> = BTreeMap::new();
        for record in records.values() {
            for entry in &record.study_days {
                if let Ok(ordinal) = day_of_year(&entry.date) {
                    if ordinal >= window_start && ordinal <= window_end {
                        labels.entry(ordinal).or_insert_with(|| entry.date.clone());
                    }
                }
            }
        }

        let mut columns = vec!["Student".to_string()];
        columns.extend(labels.values().cloned());
        columns.push("Week Total".to_string());

        let mut table = Table::new(columns);
        for record in records.values() {
            let mut by_ordinal: BTreeMap<u16, u64> = BTreeMap::new();
            for entry in &record.study_days {
                if let Ok(ordinal) = day_of_year(&entry.date) {
                    if ordinal >= window_start && ordinal <= window_end {
                        *by_ordinal.entry(ordinal).or_default() += entry.seconds;
                    }
                }
            }
            let mut row = vec![CellValue::from(record.identity.display_name.clone())];
            let mut week_total = 0u64;
            for ordinal in labels.keys() {
                let seconds = by_ordinal.get(ordinal).copied().unwrap_or(0);
                week_total += seconds;
                row.push(seconds.into());
            }
            row.push(week_total.into());
            table.push_row(row);
        }

        sections.push(Section {
            title: format!("{title_prefix}Week {week}"),
            table,
        });
    }
    sections
}

fn range_label(range: &DateRange) -> String {
    format!("{} to {}", range.start, range.end)
}

/// Run the study-time engine over aggregated records.
pub fn study_time_report(
    records: &BTreeMap<StudentKey, MetricsRecord>,
    spec: &StudyTimeReportSpec,
) -> Result<DerivedTable, ReportError> {
    spec.validate()?;
    let overall = spec.overall.resolve()?;
    let subset = spec.subset.as_ref().map(DateRange::resolve).transpose()?;
    debug!(students = records.len(), "study-time report");

    let mut columns = vec![
        "Student".to_string(),
        "Total Time (s)".to_string(),
        "Study Days".to_string(),
        "Avg Per Study Day (s)".to_string(),
    ];
    if subset.is_some() {
        columns.extend([
            "Subset Total Time (s)".to_string(),
            "Subset Study Days".to_string(),
            "Subset Avg Per Study Day (s)".to_string(),
        ]);
    }

    let mut summary = Table::new(columns);
    for record in records.values() {
        let figures = range_figures(record, overall, spec.min_study_seconds);
        let mut row = vec![
            CellValue::from(record.identity.display_name.clone()),
            figures.total_seconds.into(),
            figures.study_days.into(),
            figures.average().into(),
        ];
        if let Some(subset) = subset {
            let figures = range_figures(record, subset, spec.min_study_seconds);
            row.extend([
                figures.total_seconds.into(),
                figures.study_days.into(),
                figures.average().into(),
            ]);
        }
        summary.push_row(row);
    }

    let mut sections = weekly_sections(records, overall, "");
    if let Some(subset) = subset {
        sections.extend(weekly_sections(records, subset, "Subset "));
    }

    let echo = config_echo(vec![
        ("Overall Range", range_label(&spec.overall)),
        (
            "Subset Range",
            spec.subset
                .as_ref()
                .map_or_else(|| "none".to_string(), range_label),
        ),
        (
            "Minimum Study Time",
            format_duration(spec.min_study_seconds),
        ),
    ]);

    Ok(DerivedTable {
        kind: ReportKind::StudyTime,
        provenance: Provenance::new(),
        summary,
        sections,
        config_echo: echo,
    })
}
