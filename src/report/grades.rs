//! Grades engine
//!
//! Assessment performance per student: pass counts against a threshold,
//! averages that may treat zero scores as not-yet-attempted, and a weighted
//! average across assessment types. Types are label substrings ("Quiz",
//! "Exam"), orthogonal to the coarse column categories.

use crate::error::ReportError;
use crate::identity::StudentKey;
use crate::report::module_completion::percent;
use crate::report::spec::GradesReportSpec;
use crate::report::table::{config_echo, CellValue, DerivedTable, Provenance, ReportKind, Section, Table};
use crate::types::{ActivityItem, MetricsRecord};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

fn score_percent(score: f64) -> f64 {
    (score * 1000.0).round() / 10.0
}

/// First type filter matching the item's label, case-insensitively.
fn matched_type<'a>(spec: &'a GradesReportSpec, item: &ActivityItem) -> Option<&'a str> {
    let label = item.label.to_lowercase();
    spec.type_filters
        .iter()
        .find(|filter| label.contains(&filter.to_lowercase()))
        .map(String::as_str)
}

fn included(spec: &GradesReportSpec, item: &ActivityItem) -> bool {
    if let Some(modules) = &spec.modules {
        match item.module {
            Some(module) if modules.contains(&module) => {}
            _ => return false,
        }
    }
    spec.type_filters.is_empty() || matched_type(spec, item).is_some()
}

fn passed(spec: &GradesReportSpec, item: &ActivityItem) -> bool {
    item.score.is_some_and(|score| score >= spec.threshold)
}

/// Average over scored items. With `include_incomplete` off, zero scores are
/// treated as not-yet-attempted and left out of the mean; unscored items never
/// contribute either way.
fn average_score<'a>(
    spec: &GradesReportSpec,
    items: impl Iterator<Item = &'a ActivityItem>,
) -> f64 {
    let mut sum = 0.0;
    let mut n = 0usize;
    for item in items {
        let Some(score) = item.score else { continue };
        if score == 0.0 && !spec.include_incomplete {
            continue;
        }
        sum += score;
        n += 1;
    }
    if n == 0 {
        0.0
    } else {
        sum / n as f64
    }
}

/// Weighted mean of per-type averages. Types with a zero average carry no
/// weight; with no type filters this degenerates to the plain average.
fn weighted_average(spec: &GradesReportSpec, items: &[&ActivityItem]) -> f64 {
    if spec.type_filters.is_empty() {
        return average_score(spec, items.iter().copied());
    }
    let mut weighted_sum = 0.0;
    let mut weight_total = 0.0;
    for filter in &spec.type_filters {
        let avg = average_score(
            spec,
            items
                .iter()
                .copied()
                .filter(|item| matched_type(spec, item) == Some(filter.as_str())),
        );
        if avg == 0.0 {
            continue;
        }
        let weight = spec.type_weights.get(filter).copied().unwrap_or(1.0);
        weighted_sum += avg * weight;
        weight_total += weight;
    }
    if weight_total == 0.0 {
        0.0
    } else {
        weighted_sum / weight_total
    }
}

fn figures_row<'a>(
    spec: &GradesReportSpec,
    name: &str,
    items: &[&'a ActivityItem],
) -> Vec<CellValue> {
    let total = items.len();
    let passed_count = items.iter().filter(|item| passed(spec, item)).count();
    vec![
        name.into(),
        total.into(),
        passed_count.into(),
        percent(passed_count, total).into(),
        score_percent(average_score(spec, items.iter().copied())).into(),
    ]
}

/// Run the grades engine over aggregated records.
pub fn grades_report(
    records: &BTreeMap<StudentKey, MetricsRecord>,
    spec: &GradesReportSpec,
) -> Result<DerivedTable, ReportError> {
    spec.validate()?;
    debug!(students = records.len(), "grades report");

    // Included items per student, computed once and sliced by dimension below.
    let per_student: Vec<(&MetricsRecord, Vec<&ActivityItem>)> = records
        .values()
        .map(|record| {
            let items: Vec<&ActivityItem> = record
                .items
                .iter()
                .filter(|item| included(spec, item))
                .collect();
            (record, items)
        })
        .collect();

    let mut summary = Table::new([
        "Student",
        "Items",
        "Passed",
        "Completion %",
        "Average Score %",
        "Weighted Average %",
    ]);
    for (record, items) in &per_student {
        let mut row = figures_row(spec, &record.identity.display_name, items);
        row.push(score_percent(weighted_average(spec, items)).into());
        summary.push_row(row);
    }

    let mut sections = Vec::new();

    // Per-module sub-tables over the spec'd set, or every module encountered.
    let module_scope: BTreeSet<u32> = match &spec.modules {
        Some(modules) => modules.clone(),
        None => per_student
            .iter()
            .flat_map(|(_, items)| items.iter().filter_map(|item| item.module))
            .collect(),
    };
    for module in &module_scope {
        let mut table = Table::new(["Student", "Items", "Passed", "Completion %", "Average Score %"]);
        for (record, items) in &per_student {
            let in_module: Vec<&ActivityItem> = items
                .iter()
                .copied()
                .filter(|item| item.module == Some(*module))
                .collect();
            table.push_row(figures_row(spec, &record.identity.display_name, &in_module));
        }
        sections.push(Section {
            title: format!("Module {module}"),
            table,
        });
    }

    // Per-type sub-tables, one per filter in spec order.
    for filter in &spec.type_filters {
        let mut table = Table::new(["Student", "Items", "Passed", "Completion %", "Average Score %"]);
        for (record, items) in &per_student {
            let of_type: Vec<&ActivityItem> = items
                .iter()
                .copied()
                .filter(|item| matched_type(spec, item) == Some(filter.as_str()))
                .collect();
            table.push_row(figures_row(spec, &record.identity.display_name, &of_type));
        }
        sections.push(Section {
            title: format!("Type: {filter}"),
            table,
        });
    }

    // Flat detail listing, one row per included item.
    let mut detail = Table::new(["Student", "Module", "Label", "Type", "Score %", "Passed"]);
    for (record, items) in &per_student {
        for item in items {
            detail.push_row(vec![
                record.identity.display_name.clone().into(),
                item.module
                    .map_or_else(|| CellValue::from("n/a"), CellValue::from),
                item.label.clone().into(),
                matched_type(spec, item).unwrap_or("n/a").into(),
                item.score
                    .map_or_else(|| CellValue::from("n/a"), |s| score_percent(s).into()),
                passed(spec, item).into(),
            ]);
        }
    }
    sections.push(Section {
        title: "Items".to_string(),
        table: detail,
    });

    let echo = config_echo(vec![
        (
            "Modules",
            spec.modules.as_ref().map_or_else(
                || "all".to_string(),
                |modules| {
                    modules
                        .iter()
                        .map(u32::to_string)
                        .collect::<Vec<_>>()
                        .join(", ")
                },
            ),
        ),
        (
            "Type Filters",
            if spec.type_filters.is_empty() {
                "all".to_string()
            } else {
                spec.type_filters.join(", ")
            },
        ),
        ("Threshold", format!("{}", spec.threshold)),
        (
            "Include Incomplete",
            if spec.include_incomplete { "yes" } else { "no" }.to_string(),
        ),
        (
            "Type Weights",
            if spec.type_weights.is_empty() {
                "default".to_string()
            } else {
                spec.type_weights
                    .iter()
                    .map(|(name, weight)| format!("{name}={weight}"))
                    .collect::<Vec<_>>()
                    .join(", ")
            },
        ),
    ]);

    Ok(DerivedTable {
        kind: ReportKind::Grades,
        provenance: Provenance::new(),
        summary,
        sections,
        config_echo: echo,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::MetricsAggregator;
    use crate::identity::StudentSources;
    use crate::types::{Category, StudentIdentity};
    use pretty_assertions::assert_eq;

    fn assessment(label: &str, module: u32, score: Option<f64>) -> ActivityItem {
        ActivityItem {
            label: label.to_string(),
            category: Category::Assessment,
            module: Some(module),
            score,
            completion: score.unwrap_or(0.0),
        }
    }

    fn records_for(items: Vec<ActivityItem>) -> BTreeMap<StudentKey, MetricsRecord> {
        let mut merged = BTreeMap::new();
        merged.insert(
            StudentKey::from_raw("Doe, Jane"),
            StudentSources {
                identity: StudentIdentity {
                    display_name: "Doe, Jane".to_string(),
                    email: String::new(),
                },
                items,
                study_days: vec![],
                resources: vec![],
            },
        );
        MetricsAggregator::new().aggregate(merged).records
    }

    #[test]
    fn test_zero_scores_skew_completion_not_average() {
        let records = records_for(vec![
            assessment("Quiz - 1.1", 1, Some(1.0)),
            assessment("Quiz - 1.2", 1, Some(0.0)),
            assessment("Quiz - 1.3", 1, Some(0.8)),
        ]);
        let spec = GradesReportSpec {
            threshold: 0.7,
            ..GradesReportSpec::default()
        };
        let report = grades_report(&records, &spec).unwrap();
        let row = &report.summary.rows[0];
        // 2 of 3 pass; the zero score stays out of the average.
        assert_eq!(row[1], CellValue::Int(3));
        assert_eq!(row[2], CellValue::Int(2));
        assert_eq!(row[3], CellValue::Float(66.7));
        assert_eq!(row[4], CellValue::Float(90.0));
    }

    #[test]
    fn test_include_incomplete_pulls_average_down() {
        let records = records_for(vec![
            assessment("Quiz - 1.1", 1, Some(1.0)),
            assessment("Quiz - 1.2", 1, Some(0.0)),
        ]);
        let spec = GradesReportSpec {
            include_incomplete: true,
            ..GradesReportSpec::default()
        };
        let report = grades_report(&records, &spec).unwrap();
        assert_eq!(report.summary.rows[0][4], CellValue::Float(50.0));
    }

    #[test]
    fn test_unscored_items_count_toward_denominator_only() {
        let records = records_for(vec![
            assessment("Exam - 2.1", 2, Some(0.9)),
            assessment("Exam - 2.2", 2, None),
        ]);
        let spec = GradesReportSpec::default();
        let report = grades_report(&records, &spec).unwrap();
        let row = &report.summary.rows[0];
        assert_eq!(row[1], CellValue::Int(2));
        assert_eq!(row[2], CellValue::Int(1));
        assert_eq!(row[4], CellValue::Float(90.0));
    }

    #[test]
    fn test_type_filters_select_and_section() {
        let records = records_for(vec![
            assessment("Module Quiz - 1.1", 1, Some(0.6)),
            assessment("Final Exam", 3, Some(0.9)),
            assessment("Survey - 1.2", 1, Some(1.0)),
        ]);
        let spec = GradesReportSpec {
            type_filters: vec!["Quiz".to_string(), "Exam".to_string()],
            ..GradesReportSpec::default()
        };
        let report = grades_report(&records, &spec).unwrap();
        // The survey never matches a filter.
        assert_eq!(report.summary.rows[0][1], CellValue::Int(2));

        let quiz = report
            .sections
            .iter()
            .find(|s| s.title == "Type: Quiz")
            .unwrap();
        assert_eq!(quiz.table.rows[0][1], CellValue::Int(1));
        assert_eq!(quiz.table.rows[0][4], CellValue::Float(60.0));
    }

    #[test]
    fn test_weighted_average_skips_zero_average_types() {
        let records = records_for(vec![
            assessment("Quiz - 1.1", 1, Some(0.8)),
            assessment("Exam - 1.1", 1, Some(0.0)),
        ]);
        let spec = GradesReportSpec {
            type_filters: vec!["Quiz".to_string(), "Exam".to_string()],
            type_weights: BTreeMap::from([
                ("Quiz".to_string(), 1.0),
                ("Exam".to_string(), 3.0),
            ]),
            ..GradesReportSpec::default()
        };
        let report = grades_report(&records, &spec).unwrap();
        // The exam average is zero, so its weight drops out entirely.
        assert_eq!(report.summary.rows[0][5], CellValue::Float(80.0));
    }

    #[test]
    fn test_config_echo_documents_weights() {
        let records = records_for(vec![assessment("Quiz - 1.1", 1, Some(0.8))]);
        let spec = GradesReportSpec {
            type_filters: vec!["Quiz".to_string(), "Exam".to_string()],
            type_weights: BTreeMap::from([
                ("Exam".to_string(), 3.0),
                ("Quiz".to_string(), 1.0),
            ]),
            ..GradesReportSpec::default()
        };
        let report = grades_report(&records, &spec).unwrap();
        let weights_row = report
            .config_echo
            .rows
            .iter()
            .find(|row| row[0] == CellValue::Text("Type Weights".to_string()))
            .unwrap();
        assert_eq!(weights_row[1], CellValue::Text("Exam=3, Quiz=1".to_string()));

        let unweighted = grades_report(&records, &GradesReportSpec::default()).unwrap();
        let default_row = unweighted
            .config_echo
            .rows
            .iter()
            .find(|row| row[0] == CellValue::Text("Type Weights".to_string()))
            .unwrap();
        assert_eq!(default_row[1], CellValue::Text("default".to_string()));
    }

    #[test]
    fn test_module_filter_restricts_items() {
        let records = records_for(vec![
            assessment("Quiz - 1.1", 1, Some(1.0)),
            assessment("Quiz - 2.1", 2, Some(0.2)),
        ]);
        let spec = GradesReportSpec {
            modules: Some(BTreeSet::from([1])),
            ..GradesReportSpec::default()
        };
        let report = grades_report(&records, &spec).unwrap();
        assert_eq!(report.summary.rows[0][1], CellValue::Int(1));
        assert_eq!(report.sections[0].title, "Module 1");
    }

    #[test]
    fn test_detail_section_lists_every_included_item() {
        let records = records_for(vec![
            assessment("Quiz - 1.1", 1, Some(0.75)),
            assessment("Quiz - 1.2", 1, None),
        ]);
        let spec = GradesReportSpec::default();
        let report = grades_report(&records, &spec).unwrap();
        let detail = report.sections.last().unwrap();
        assert_eq!(detail.title, "Items");
        assert_eq!(detail.table.rows.len(), 2);
        assert_eq!(detail.table.rows[0][4], CellValue::Float(75.0));
        assert_eq!(detail.table.rows[1][4], CellValue::Text("n/a".to_string()));
    }
}
