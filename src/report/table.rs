//! Derived tables
//!
//! The sole output of a report engine: a summary table with one row per
//! student, named sub-tables per dimension (module, assessment type, week),
//! and a trailing configuration echo documenting the specification used.
//! Pure data; rendering belongs to external collaborators.

use crate::{CRATE_VERSION, PRODUCER_NAME};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single table cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Text(String),
    Int(i64),
    Float(f64),
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<usize> for CellValue {
    fn from(value: usize) -> Self {
        CellValue::Int(value as i64)
    }
}

impl From<u64> for CellValue {
    fn from(value: u64) -> Self {
        CellValue::Int(value as i64)
    }
}

impl From<u32> for CellValue {
    fn from(value: u32) -> Self {
        CellValue::Int(i64::from(value))
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Float(value)
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        CellValue::Text(if value { "yes" } else { "no" }.to_string())
    }
}

/// Column headers plus data rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl Table {
    pub fn new<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
        Table {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, row: Vec<CellValue>) {
        debug_assert_eq!(row.len(), self.columns.len());
        self.rows.push(row);
    }
}

/// A named sub-table for one dimension value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub title: String,
    pub table: Table,
}

/// Which engine produced a derived table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
    ModuleCompletion,
    Grades,
    StudyTime,
}

/// Producer metadata stamped onto every derived table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Provenance {
    pub producer: String,
    pub version: String,
    pub instance_id: String,
    pub computed_at: DateTime<Utc>,
}

impl Provenance {
    pub fn new() -> Self {
        Provenance {
            producer: PRODUCER_NAME.to_string(),
            version: CRATE_VERSION.to_string(),
            instance_id: Uuid::new_v4().to_string(),
            computed_at: Utc::now(),
        }
    }
}

impl Default for Provenance {
    fn default() -> Self {
        Self::new()
    }
}

/// The engine output handed to renderers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DerivedTable {
    pub kind: ReportKind,
    pub provenance: Provenance,
    pub summary: Table,
    pub sections: Vec<Section>,
    pub config_echo: Table,
}

/// Build the trailing configuration-echo table from parameter/value pairs.
pub fn config_echo(pairs: Vec<(&str, String)>) -> Table {
    let mut table = Table::new(["Parameter", "Value"]);
    for (parameter, value) in pairs {
        table.push_row(vec![parameter.into(), value.into()]);
    }
    table
}
