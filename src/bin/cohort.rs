//! Cohort CLI - Command-line interface for Cohort Metrics
//!
//! Commands:
//! - normalize: Aggregate raw CSV exports into per-student metrics records
//! - module-report: Lab completion over a configurable module scope
//! - grades-report: Assessment performance against a passing threshold
//! - study-report: Study time over an inclusive date range

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use cohort_metrics::calendar::DateRange;
use cohort_metrics::{
    normalize, run_grades_report, run_module_report, run_study_time_report, GradesReportSpec,
    ModuleReportSpec, RawSources, ReportError, StudyTimeReportSpec, Warning, CRATE_VERSION,
};

/// Cohort - Normalization and flexible aggregation for student activity data
#[derive(Parser)]
#[command(name = "cohort")]
#[command(version = CRATE_VERSION)]
#[command(about = "Transform learning-platform CSV exports into report tables", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Source files shared by every command. At least one must be given.
#[derive(Args)]
struct SourceArgs {
    /// Gradebook CSV export (use - for stdin)
    #[arg(long)]
    gradebook: Option<PathBuf>,

    /// Daily study-history CSV export (use - for stdin)
    #[arg(long)]
    study_history: Option<PathBuf>,

    /// Time-per-resource CSV export (use - for stdin)
    #[arg(long)]
    resource_time: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Aggregate raw CSV exports into per-student metrics records
    Normalize {
        #[command(flatten)]
        sources: SourceArgs,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Output format
        #[arg(long, default_value = "json-pretty")]
        format: OutputFormat,
    },

    /// Lab completion over a configurable module scope
    ModuleReport {
        #[command(flatten)]
        sources: SourceArgs,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Output format
        #[arg(long, default_value = "json-pretty")]
        format: OutputFormat,

        /// Modules making up the full course scope
        #[arg(long, value_delimiter = ',', required = true)]
        modules: Vec<u32>,

        /// Focus subset reported beside the full scope
        #[arg(long, value_delimiter = ',')]
        subset: Vec<u32>,

        /// Modules removed from the full scope
        #[arg(long, value_delimiter = ',')]
        exclude: Vec<u32>,

        /// Count partially-completed labs as completed
        #[arg(long)]
        count_partial: bool,
    },

    /// Assessment performance against a passing threshold
    GradesReport {
        #[command(flatten)]
        sources: SourceArgs,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Output format
        #[arg(long, default_value = "json-pretty")]
        format: OutputFormat,

        /// Restrict to these modules (default: every module encountered)
        #[arg(long, value_delimiter = ',')]
        modules: Vec<u32>,

        /// Assessment-type label substrings, e.g. Quiz,Exam
        #[arg(long, value_delimiter = ',')]
        types: Vec<String>,

        /// Passing threshold on the normalized score, in [0, 1]
        #[arg(long, default_value = "0.7")]
        threshold: f64,

        /// Include zero scores in averages
        #[arg(long)]
        include_incomplete: bool,

        /// Per-type weight as TYPE=WEIGHT, repeatable
        #[arg(long = "weight", value_parser = parse_weight)]
        weights: Vec<(String, f64)>,
    },

    /// Study time over an inclusive date range
    StudyReport {
        #[command(flatten)]
        sources: SourceArgs,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Output format
        #[arg(long, default_value = "json-pretty")]
        format: OutputFormat,

        /// Range start, e.g. "Apr 1"
        #[arg(long)]
        start: String,

        /// Range end, e.g. "May 15"
        #[arg(long)]
        end: String,

        /// Focus subset range start
        #[arg(long)]
        subset_start: Option<String>,

        /// Focus subset range end
        #[arg(long)]
        subset_end: Option<String>,

        /// A day counts as a study day only at or above this many seconds
        #[arg(long, default_value = "60")]
        min_seconds: u64,
    },
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Compact JSON
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

fn parse_weight(raw: &str) -> Result<(String, f64), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected TYPE=WEIGHT, got '{raw}'"))?;
    let weight: f64 = value
        .parse()
        .map_err(|_| format!("'{value}' is not a number"))?;
    Ok((name.to_string(), weight))
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Commands::Normalize {
            sources,
            output,
            format,
        } => {
            let sources = load_sources(&sources)?;
            let outcome = normalize(&sources)?;
            report_warnings(&outcome.warnings);
            let records: Vec<_> = outcome.records.values().collect();
            let body = serde_json::json!({
                "class_summary": outcome.class_summary,
                "students": records,
            });
            write_output(&output, &format, &body)
        }

        Commands::ModuleReport {
            sources,
            output,
            format,
            modules,
            subset,
            exclude,
            count_partial,
        } => {
            let spec = ModuleReportSpec {
                all_modules: modules.into_iter().collect(),
                subset_modules: if subset.is_empty() {
                    None
                } else {
                    Some(subset.into_iter().collect())
                },
                exclude_modules: exclude.into_iter().collect(),
                count_partial,
            };
            let sources = load_sources(&sources)?;
            let (table, warnings) = run_module_report(&sources, &spec)?;
            report_warnings(&warnings);
            write_output(&output, &format, &table)
        }

        Commands::GradesReport {
            sources,
            output,
            format,
            modules,
            types,
            threshold,
            include_incomplete,
            weights,
        } => {
            let spec = GradesReportSpec {
                modules: if modules.is_empty() {
                    None
                } else {
                    Some(modules.into_iter().collect::<BTreeSet<u32>>())
                },
                type_filters: types,
                threshold,
                include_incomplete,
                type_weights: weights.into_iter().collect::<BTreeMap<String, f64>>(),
            };
            let sources = load_sources(&sources)?;
            let (table, warnings) = run_grades_report(&sources, &spec)?;
            report_warnings(&warnings);
            write_output(&output, &format, &table)
        }

        Commands::StudyReport {
            sources,
            output,
            format,
            start,
            end,
            subset_start,
            subset_end,
            min_seconds,
        } => {
            let subset = match (subset_start, subset_end) {
                (Some(start), Some(end)) => Some(DateRange::new(start, end)),
                (None, None) => None,
                _ => {
                    return Err(CliError::Usage(
                        "--subset-start and --subset-end must be given together".to_string(),
                    ))
                }
            };
            let spec = StudyTimeReportSpec {
                overall: DateRange::new(start, end),
                subset,
                min_study_seconds: min_seconds,
            };
            let sources = load_sources(&sources)?;
            let (table, warnings) = run_study_time_report(&sources, &spec)?;
            report_warnings(&warnings);
            write_output(&output, &format, &table)
        }
    }
}

fn read_source(path: &Path) -> Result<String, CliError> {
    if path.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(path)?)
    }
}

fn load_sources(args: &SourceArgs) -> Result<RawSources, CliError> {
    if args.gradebook.is_none() && args.study_history.is_none() && args.resource_time.is_none() {
        return Err(CliError::Usage(
            "at least one of --gradebook, --study-history, --resource-time is required"
                .to_string(),
        ));
    }
    Ok(RawSources {
        gradebook_csv: args.gradebook.as_deref().map(read_source).transpose()?,
        study_history_csv: args.study_history.as_deref().map(read_source).transpose()?,
        resource_time_csv: args.resource_time.as_deref().map(read_source).transpose()?,
    })
}

fn report_warnings(warnings: &[Warning]) {
    for warning in warnings {
        match serde_json::to_string(warning) {
            Ok(json) => eprintln!("warning: {json}"),
            Err(_) => eprintln!("warning: {warning:?}"),
        }
    }
}

fn write_output<T: serde::Serialize>(
    output: &Path,
    format: &OutputFormat,
    body: &T,
) -> Result<(), CliError> {
    let text = match format {
        OutputFormat::Json => serde_json::to_string(body)?,
        OutputFormat::JsonPretty => serde_json::to_string_pretty(body)?,
    };
    if output.to_string_lossy() == "-" {
        println!("{text}");
    } else {
        fs::write(output, text)?;
    }
    Ok(())
}

#[derive(Debug)]
enum CliError {
    Io(io::Error),
    Report(ReportError),
    Json(serde_json::Error),
    Usage(String),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Io(e) => write!(f, "{e}"),
            CliError::Report(e) => write!(f, "{e}"),
            CliError::Json(e) => write!(f, "{e}"),
            CliError::Usage(msg) => f.write_str(msg),
        }
    }
}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        CliError::Io(e)
    }
}

impl From<ReportError> for CliError {
    fn from(e: ReportError) -> Self {
        CliError::Report(e)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::Json(e)
    }
}
