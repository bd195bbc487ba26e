//! End-to-end pipeline
//!
//! Wires the stages together: raw CSV text through the source normalizers,
//! identity resolution, and the metrics aggregator, then hands the resulting
//! records to whichever report engine the caller asks for. Any combination of
//! sources may be present; students are merged across whatever is supplied.

use crate::aggregator::MetricsAggregator;
use crate::error::{ReportError, Warning};
use crate::identity::{IdentityResolver, StudentKey};
use crate::normalize::{
    GradebookNormalizer, ResourceTimeNormalizer, SourceNormalizer, StudyHistoryNormalizer,
};
use crate::report::{
    grades_report, module_completion_report, study_time_report, DerivedTable, GradesReportSpec,
    ModuleReportSpec, StudyTimeReportSpec,
};
use crate::types::{ClassSummary, GradebookDocument, MetricsRecord, ResourceTimeDocument,
    StudyHistoryDocument};
use std::collections::BTreeMap;
use tracing::info;

/// Raw CSV text for up to three source exports.
#[derive(Debug, Clone, Default)]
pub struct RawSources {
    pub gradebook_csv: Option<String>,
    pub study_history_csv: Option<String>,
    pub resource_time_csv: Option<String>,
}

/// Aggregated output of one normalization run.
#[derive(Debug, Clone)]
pub struct NormalizeOutcome {
    pub records: BTreeMap<StudentKey, MetricsRecord>,
    pub class_summary: ClassSummary,
    pub warnings: Vec<Warning>,
}

/// Normalize raw sources into per-student metrics records.
pub fn normalize(sources: &RawSources) -> Result<NormalizeOutcome, ReportError> {
    let mut warnings = Vec::new();

    let gradebook = sources
        .gradebook_csv
        .as_deref()
        .map(|text| GradebookNormalizer::default().normalize(text, "gradebook"))
        .transpose()?
        .map(|(doc, w)| {
            warnings.extend(w);
            doc
        });
    let study_history = sources
        .study_history_csv
        .as_deref()
        .map(|text| StudyHistoryNormalizer.normalize(text, "study_history"))
        .transpose()?
        .map(|(doc, w)| {
            warnings.extend(w);
            doc
        });
    let resource_time = sources
        .resource_time_csv
        .as_deref()
        .map(|text| ResourceTimeNormalizer::default().normalize(text, "resource_time"))
        .transpose()?
        .map(|(doc, w)| {
            warnings.extend(w);
            doc
        });

    let mut outcome = aggregate_documents(
        gradebook.as_ref(),
        study_history.as_ref(),
        resource_time.as_ref(),
    );
    warnings.append(&mut outcome.warnings);
    outcome.warnings = warnings;

    info!(
        students = outcome.class_summary.total_students,
        warnings = outcome.warnings.len(),
        "normalization complete"
    );
    Ok(outcome)
}

/// Resolve identities across already-normalized documents and aggregate.
pub fn aggregate_documents(
    gradebook: Option<&GradebookDocument>,
    study_history: Option<&StudyHistoryDocument>,
    resource_time: Option<&ResourceTimeDocument>,
) -> NormalizeOutcome {
    let (merged, mut warnings) =
        IdentityResolver::new().resolve(gradebook, study_history, resource_time);
    let outcome = MetricsAggregator::new().aggregate(merged);
    warnings.extend(outcome.warnings);
    NormalizeOutcome {
        records: outcome.records,
        class_summary: outcome.class_summary,
        warnings,
    }
}

/// Normalize and run the module-completion engine in one step.
pub fn run_module_report(
    sources: &RawSources,
    spec: &ModuleReportSpec,
) -> Result<(DerivedTable, Vec<Warning>), ReportError> {
    let outcome = normalize(sources)?;
    let table = module_completion_report(&outcome.records, spec)?;
    Ok((table, outcome.warnings))
}

/// Normalize and run the grades engine in one step.
pub fn run_grades_report(
    sources: &RawSources,
    spec: &GradesReportSpec,
) -> Result<(DerivedTable, Vec<Warning>), ReportError> {
    let outcome = normalize(sources)?;
    let table = grades_report(&outcome.records, spec)?;
    Ok((table, outcome.warnings))
}

/// Normalize and run the study-time engine in one step.
pub fn run_study_time_report(
    sources: &RawSources,
    spec: &StudyTimeReportSpec,
) -> Result<(DerivedTable, Vec<Warning>), ReportError> {
    let outcome = normalize(sources)?;
    let table = study_time_report(&outcome.records, spec)?;
    Ok((table, outcome.warnings))
}
