//! Cohort Metrics - Normalization and flexible aggregation for per-student activity data
//!
//! Transforms raw learning-platform CSV exports into derived report tables
//! through a deterministic pipeline: source normalization → identity
//! resolution → metrics aggregation → report engines.
//!
//! ## Modules
//!
//! - **Normalizers**: Parse the gradebook, study-history, and resource-time
//!   exports into canonical documents
//! - **Aggregator**: Merge students across sources into policy-free metrics
//!   records
//! - **Report engines**: Module completion, grades, and study time, each
//!   driven by a validated specification

pub mod aggregator;
pub mod calendar;
pub mod classify;
pub mod duration;
pub mod error;
pub mod identity;
pub mod normalize;
pub mod pipeline;
pub mod report;
pub mod types;

pub use error::{ReportError, Warning};
pub use identity::{IdentityResolver, StudentKey};
pub use pipeline::{
    normalize, run_grades_report, run_module_report, run_study_time_report, NormalizeOutcome,
    RawSources,
};
pub use report::{
    grades_report, module_completion_report, study_time_report, DerivedTable, GradesReportSpec,
    ModuleReportSpec, StudyTimeReportSpec,
};
pub use types::{ClassSummary, MetricsRecord};

/// Crate version embedded in report provenance
pub const CRATE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for report provenance
pub const PRODUCER_NAME: &str = "cohort-metrics";
