//! Report engines
//!
//! Each engine consumes the aggregated per-student records plus a validated
//! specification and emits a [`DerivedTable`]: summary rows, per-dimension
//! sub-tables, and a configuration echo. Engines are pure; all rendering and
//! I/O stays with the caller.

mod grades;
mod module_completion;
mod spec;
mod study_time;
mod table;

pub use grades::grades_report;
pub use module_completion::module_completion_report;
pub use spec::{GradesReportSpec, ModuleReportSpec, StudyTimeReportSpec};
pub use study_time::study_time_report;
pub use table::{CellValue, DerivedTable, Provenance, ReportKind, Section, Table};
