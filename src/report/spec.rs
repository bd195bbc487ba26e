//! Report specifications
//!
//! Declarative descriptions of what each engine should compute. Specifications
//! are validated up front; engines assume a valid spec and never re-check.

use crate::calendar::DateRange;
use crate::error::ReportError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

fn check_modules(field: &str, modules: &BTreeSet<u32>) -> Result<(), ReportError> {
    if modules.contains(&0) {
        return Err(ReportError::invalid_spec(
            field,
            "module numbers must be positive",
        ));
    }
    Ok(())
}

/// Specification for the module-completion engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleReportSpec {
    /// Modules making up the full course scope.
    pub all_modules: BTreeSet<u32>,
    /// Optional focus group reported beside the full scope.
    pub subset_modules: Option<BTreeSet<u32>>,
    /// Modules removed from the full scope (e.g. not yet assigned).
    pub exclude_modules: BTreeSet<u32>,
    /// Count partially-completed labs (completion > 0) as completed.
    pub count_partial: bool,
}

impl ModuleReportSpec {
    pub fn validate(&self) -> Result<(), ReportError> {
        check_modules("all_modules", &self.all_modules)?;
        if let Some(subset) = &self.subset_modules {
            check_modules("subset_modules", subset)?;
        }
        check_modules("exclude_modules", &self.exclude_modules)?;
        Ok(())
    }

    /// The full scope with exclusions applied.
    pub fn effective_modules(&self) -> BTreeSet<u32> {
        self.all_modules
            .difference(&self.exclude_modules)
            .copied()
            .collect()
    }
}

/// Specification for the grades engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradesReportSpec {
    /// Restrict to these modules; `None` means every module encountered.
    pub modules: Option<BTreeSet<u32>>,
    /// Case-insensitive label substrings selecting assessment types
    /// ("Quiz", "Exam"). Empty means every scored item.
    pub type_filters: Vec<String>,
    /// Passing threshold on the normalized score, in `[0, 1]`.
    pub threshold: f64,
    /// Include zero scores in averages instead of treating them as
    /// not-yet-attempted.
    pub include_incomplete: bool,
    /// Per-type weights for the weighted average, keyed by type filter.
    /// Missing types weigh 1.0.
    pub type_weights: BTreeMap<String, f64>,
}

impl Default for GradesReportSpec {
    fn default() -> Self {
        GradesReportSpec {
            modules: None,
            type_filters: Vec::new(),
            threshold: 0.7,
            include_incomplete: false,
            type_weights: BTreeMap::new(),
        }
    }
}

impl GradesReportSpec {
    pub fn validate(&self) -> Result<(), ReportError> {
        if let Some(modules) = &self.modules {
            check_modules("modules", modules)?;
        }
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(ReportError::invalid_spec(
                "threshold",
                format!("{} is outside [0, 1]", self.threshold),
            ));
        }
        for (name, weight) in &self.type_weights {
            if !weight.is_finite() || *weight < 0.0 {
                return Err(ReportError::invalid_spec(
                    "type_weights",
                    format!("weight for '{name}' must be a finite non-negative number"),
                ));
            }
        }
        Ok(())
    }
}

/// Specification for the study-time engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudyTimeReportSpec {
    /// The full reporting window.
    pub overall: DateRange,
    /// Optional focus window reported beside the full one.
    pub subset: Option<DateRange>,
    /// A day counts as a study day only at or above this many seconds.
    pub min_study_seconds: u64,
}

impl StudyTimeReportSpec {
    pub fn validate(&self) -> Result<(), ReportError> {
        self.overall.resolve()?;
        if let Some(subset) = &self.subset {
            subset.resolve()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_spec_rejects_zero() {
        let spec = ModuleReportSpec {
            all_modules: BTreeSet::from([0, 1]),
            ..ModuleReportSpec::default()
        };
        assert!(spec.validate().is_err());
    }

    #[test]
    fn test_effective_modules_applies_exclusions() {
        let spec = ModuleReportSpec {
            all_modules: BTreeSet::from([1, 2, 3, 4]),
            exclude_modules: BTreeSet::from([2, 9]),
            ..ModuleReportSpec::default()
        };
        assert_eq!(spec.effective_modules(), BTreeSet::from([1, 3, 4]));
    }

    #[test]
    fn test_grades_spec_threshold_bounds() {
        let mut spec = GradesReportSpec::default();
        assert!(spec.validate().is_ok());
        spec.threshold = 1.2;
        assert!(spec.validate().is_err());
        spec.threshold = -0.1;
        assert!(spec.validate().is_err());
    }

    #[test]
    fn test_grades_spec_rejects_negative_weight() {
        let spec = GradesReportSpec {
            type_weights: BTreeMap::from([("Quiz".to_string(), -1.0)]),
            ..GradesReportSpec::default()
        };
        assert!(spec.validate().is_err());
    }

    #[test]
    fn test_study_spec_validates_ranges() {
        let spec = StudyTimeReportSpec {
            overall: DateRange::new("Apr 1", "May 15"),
            subset: Some(DateRange::new("May 2", "Apr 30")),
            min_study_seconds: 60,
        };
        assert!(spec.validate().is_err());
    }
}
