//! Module-completion engine
//!
//! Lab completion per student over a configurable module scope: the full
//! course scope (minus exclusions) and an optional focus subset, plus one
//! sub-table per module so a reader can see exactly where a student stalled.

use crate::identity::StudentKey;
use crate::report::spec::ModuleReportSpec;
use crate::report::table::{config_echo, CellValue, DerivedTable, Provenance, ReportKind, Section, Table};
use crate::types::{Category, MetricsRecord};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Round a completion fraction to a one-decimal percentage; 0 on an empty
/// denominator.
pub(crate) fn percent(completed: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (completed as f64 / total as f64 * 1000.0).round() / 10.0
}

fn module_set_label(modules: &BTreeSet<u32>) -> String {
    if modules.is_empty() {
        return "none".to_string();
    }
    modules
        .iter()
        .map(u32::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Completed/total lab counts for one student over a module set.
fn group_figures(
    record: &MetricsRecord,
    modules: &BTreeSet<u32>,
    count_partial: bool,
) -> (usize, usize) {
    let mut completed = 0;
    let mut total = 0;
    for item in &record.items {
        let (Category::Lab, Some(module)) = (item.category, item.module) else {
            continue;
        };
        if !modules.contains(&module) {
            continue;
        }
        total += 1;
        let done = item.completion >= 1.0 || (count_partial && item.completion > 0.0);
        if done {
            completed += 1;
        }
    }
    (completed, total)
}

fn group_cells(record: &MetricsRecord, modules: &BTreeSet<u32>, count_partial: bool) -> Vec<CellValue> {
    let (completed, total) = group_figures(record, modules, count_partial);
    vec![
        total.into(),
        completed.into(),
        (total - completed).into(),
        percent(completed, total).into(),
    ]
}

/// Run the module-completion engine over aggregated records.
pub fn module_completion_report(
    records: &BTreeMap<StudentKey, MetricsRecord>,
    spec: &ModuleReportSpec,
) -> Result<DerivedTable, crate::error::ReportError> {
    spec.validate()?;
    let effective = spec.effective_modules();
    debug!(students = records.len(), modules = effective.len(), "module-completion report");

    let mut columns = vec![
        "Student".to_string(),
        "Total Labs".to_string(),
        "Completed Labs".to_string(),
        "Labs Remaining".to_string(),
        "Completion %".to_string(),
    ];
    if spec.subset_modules.is_some() {
        columns.extend([
            "Subset Total Labs".to_string(),
            "Subset Completed Labs".to_string(),
            "Subset Labs Remaining".to_string(),
            "Subset Completion %".to_string(),
        ]);
    }

    let mut summary = Table::new(columns);
    for record in records.values() {
        let mut row = vec![CellValue::from(record.identity.display_name.clone())];
        row.extend(group_cells(record, &effective, spec.count_partial));
        if let Some(subset) = &spec.subset_modules {
            row.extend(group_cells(record, subset, spec.count_partial));
        }
        summary.push_row(row);
    }

    // One sub-table per module in scope, every student listed even at 0/0.
    let mut sections = Vec::with_capacity(effective.len());
    for module in &effective {
        let single = BTreeSet::from([*module]);
        let mut table = Table::new([
            "Student",
            "Total Labs",
            "Completed Labs",
            "Labs Remaining",
            "Completion %",
        ]);
        for record in records.values() {
            let mut row = vec![CellValue::from(record.identity.display_name.clone())];
            row.extend(group_cells(record, &single, spec.count_partial));
            table.push_row(row);
        }
        sections.push(Section {
            title: format!("Module {module}"),
            table,
        });
    }

    let echo = config_echo(vec![
        ("All Modules", module_set_label(&spec.all_modules)),
        (
            "Subset Modules",
            spec.subset_modules
                .as_ref()
                .map_or_else(|| "none".to_string(), module_set_label),
        ),
        ("Excluded Modules", module_set_label(&spec.exclude_modules)),
        (
            "Count Partial",
            if spec.count_partial { "yes" } else { "no" }.to_string(),
        ),
    ]);

    Ok(DerivedTable {
        kind: ReportKind::ModuleCompletion,
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
    use crate::types::{ActivityItem, StudentIdentity};
    use pretty_assertions::assert_eq;

    fn lab(label: &str, module: u32, completion: f64) -> ActivityItem {
        ActivityItem {
            label: label.to_string(),
            category: Category::Lab,
            module: Some(module),
            score: Some(completion),
            completion,
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

    fn summary_row(table: &DerivedTable) -> &[CellValue] {
        &table.summary.rows[0]
    }

    #[test]
    fn test_empty_module_set_yields_zeroes() {
        let records = records_for(vec![lab("Lab - 3.1.2", 3, 1.0)]);
        let spec = ModuleReportSpec::default();
        let report = module_completion_report(&records, &spec).unwrap();
        assert_eq!(
            summary_row(&report)[1..],
            [
                CellValue::Int(0),
                CellValue::Int(0),
                CellValue::Int(0),
                CellValue::Float(0.0)
            ]
        );
        assert!(report.sections.is_empty());
    }

    #[test]
    fn test_single_completed_lab() {
        let records = records_for(vec![lab("Lab - 3.1.2", 3, 1.0)]);
        let spec = ModuleReportSpec {
            all_modules: BTreeSet::from([3]),
            ..ModuleReportSpec::default()
        };
        let report = module_completion_report(&records, &spec).unwrap();
        assert_eq!(
            summary_row(&report)[1..],
            [
                CellValue::Int(1),
                CellValue::Int(1),
                CellValue::Int(0),
                CellValue::Float(100.0)
            ]
        );
    }

    #[test]
    fn test_partial_policy_flips_outcome() {
        let records = records_for(vec![lab("Lab - 3.1.2", 3, 0.4)]);
        let base = ModuleReportSpec {
            all_modules: BTreeSet::from([3]),
            ..ModuleReportSpec::default()
        };

        let strict = module_completion_report(&records, &base).unwrap();
        assert_eq!(summary_row(&strict)[2], CellValue::Int(0));

        let lenient = ModuleReportSpec {
            count_partial: true,
            ..base
        };
        let report = module_completion_report(&records, &lenient).unwrap();
        assert_eq!(summary_row(&report)[2], CellValue::Int(1));
    }

    #[test]
    fn test_subset_columns_and_per_module_sections() {
        let records = records_for(vec![
            lab("Lab - 1.1.1", 1, 1.0),
            lab("Lab - 2.1.1", 2, 0.0),
        ]);
        let spec = ModuleReportSpec {
            all_modules: BTreeSet::from([1, 2]),
            subset_modules: Some(BTreeSet::from([2])),
            ..ModuleReportSpec::default()
        };
        let report = module_completion_report(&records, &spec).unwrap();

        // Overall 1/2, subset 0/1.
        let row = summary_row(&report);
        assert_eq!(row[1], CellValue::Int(2));
        assert_eq!(row[2], CellValue::Int(1));
        assert_eq!(row[5], CellValue::Int(1));
        assert_eq!(row[6], CellValue::Int(0));

        assert_eq!(report.sections.len(), 2);
        assert_eq!(report.sections[0].title, "Module 1");
        assert_eq!(report.sections[1].title, "Module 2");
        // Every student appears in every module section.
        assert_eq!(report.sections[0].table.rows.len(), 1);
    }

    #[test]
    fn test_excluded_module_leaves_scope() {
        let records = records_for(vec![
            lab("Lab - 1.1.1", 1, 1.0),
            lab("Lab - 2.1.1", 2, 1.0),
        ]);
        let spec = ModuleReportSpec {
            all_modules: BTreeSet::from([1, 2]),
            exclude_modules: BTreeSet::from([2]),
            ..ModuleReportSpec::default()
        };
        let report = module_completion_report(&records, &spec).unwrap();
        assert_eq!(summary_row(&report)[1], CellValue::Int(1));
        assert_eq!(report.sections.len(), 1);
    }
}
