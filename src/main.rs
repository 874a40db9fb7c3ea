//! CLI entry point for the weighted grade calculator.
//!
//! Reads a gradebook export (CSV, or a single human-readable record), groups
//! its columns according to a groups file, and prints each student's weighted
//! course grade as a delimited table on stdout.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::ffi::OsStr;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};
use weighted_grade::{
    binding::GradingContext,
    grading::letter::{LetterScheme, SchemeFormat},
    groups::load_groups,
    output::{Delimiter, write_columns, write_report},
    report::Grader,
    roster::{HumanRecord, IdentityColumns, Roster},
};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum SchemeFormatArg {
    /// `letter,threshold[,gpa]` with a header row
    Csv,
    /// `<letter> [gpa] <threshold>` per line, `#` comments
    Text,
}

impl From<SchemeFormatArg> for SchemeFormat {
    fn from(arg: SchemeFormatArg) -> Self {
        match arg {
            SchemeFormatArg::Csv => SchemeFormat::Csv,
            SchemeFormatArg::Text => SchemeFormat::Text,
        }
    }
}

#[derive(Parser)]
#[command(name = "weighted_grade", version)]
#[command(about = "Compute weighted course grades from a gradebook export", long_about = None)]
struct Cli {
    /// Gradebook CSV (or record with --human); stdin when absent or `-`
    #[arg(value_name = "FILE")]
    input: Option<PathBuf>,

    /// Dump the column names of the input and exit
    #[arg(short, long)]
    columns: bool,

    /// File declaring the weighted groups of columns
    #[arg(short, long, value_name = "GROUPS", env = "WEIGHTED_GRADE_GROUPS")]
    groups: Option<PathBuf>,

    /// Add a letter-grade column according to this scheme
    #[arg(short, long, value_name = "SCHEME", env = "WEIGHTED_GRADE_LETTER")]
    letter: Option<PathBuf>,

    /// Format of the letter scheme file
    #[arg(long, value_enum, default_value_t = SchemeFormatArg::Csv)]
    scheme_format: SchemeFormatArg,

    /// Also print the GPA value of each letter
    #[arg(long, requires = "letter")]
    gpa: bool,

    /// Output tab-separated values (default is CSV)
    #[arg(short, long)]
    tab_separated: bool,

    /// Input is a single student as `<label>: <value>` lines
    #[arg(long)]
    human: bool,

    /// Column holding the student's first name
    #[arg(long, default_value = "First Name", env = "WEIGHTED_GRADE_FIRST_NAME_COLUMN")]
    first_name_column: String,

    /// Column holding the student's last name
    #[arg(long, default_value = "Last Name", env = "WEIGHTED_GRADE_LAST_NAME_COLUMN")]
    last_name_column: String,

    /// Column holding the student's (possibly `#`-prefixed) username
    #[arg(long, default_value = "Username", env = "WEIGHTED_GRADE_USERNAME_COLUMN")]
    username_column: String,
}

impl Cli {
    fn identity(&self) -> IdentityColumns {
        IdentityColumns {
            first: self.first_name_column.clone(),
            last: self.last_name_column.clone(),
            username: self.username_column.clone(),
        }
    }

    fn delimiter(&self) -> Delimiter {
        if self.tab_separated {
            Delimiter::Tab
        } else {
            Delimiter::Comma
        }
    }
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    let _file_guard = init_logging();

    let cli = Cli::parse();

    let input = open_input(cli.input.as_deref())?;
    if cli.human {
        run_human(&cli, input)
    } else {
        run_roster(&cli, input)
    }
}

/// Logging setup: coloured stderr, plus a JSON rolling log file when
/// `LOG_FILE_PATH` is set. stdout is reserved for the report.
fn init_logging() -> Option<WorkerGuard> {
    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(io::stderr)
        .with_filter(EnvFilter::try_from_env("RUST_LOG").unwrap_or_else(|_| EnvFilter::new("info")));

    let (json_layer, guard) = match std::env::var("LOG_FILE_PATH") {
        Ok(log_file_path) => {
            let path = Path::new(&log_file_path);
            let log_dir = path.parent().unwrap_or(Path::new("logs"));
            let log_file_name = path
                .file_name()
                .unwrap_or(OsStr::new("weighted_grade.log"));

            let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
            let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);

            let layer = fmt::layer()
                .json()
                .with_current_span(true)
                .with_span_list(true)
                .with_writer(non_blocking_file)
                .with_filter(
                    EnvFilter::try_from_env("RUST_LOG_JSON")
                        .unwrap_or_else(|_| EnvFilter::new("debug")),
                );
            (Some(layer), Some(guard))
        }
        Err(_) => (None, None),
    };

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    guard
}

fn open_input(path: Option<&Path>) -> Result<Box<dyn Read>> {
    match path {
        Some(path) if path != Path::new("-") => {
            let file = std::fs::File::open(path)
                .with_context(|| format!("failed to open {}", path.display()))?;
            Ok(Box::new(file))
        }
        _ => Ok(Box::new(io::stdin().lock())),
    }
}

fn load_scheme(cli: &Cli) -> Result<Option<LetterScheme>> {
    cli.letter
        .as_deref()
        .map(|path| {
            LetterScheme::load(path, cli.scheme_format.into())
                .with_context(|| format!("failed to load letter scheme {}", path.display()))
        })
        .transpose()
}

/// Grades every row of a CSV export.
#[tracing::instrument(skip_all)]
fn run_roster(cli: &Cli, input: Box<dyn Read>) -> Result<()> {
    let mut roster = Roster::from_reader(input).context("failed to read roster header")?;

    if cli.columns {
        write_columns(io::stdout().lock(), roster.headers())?;
        return Ok(());
    }

    let Some(groups_path) = cli.groups.as_deref() else {
        info!("No groups file given, nothing to grade");
        return Ok(());
    };

    let spec = load_groups(groups_path)
        .with_context(|| format!("failed to load groups file {}", groups_path.display()))?;
    let scheme = load_scheme(cli)?;
    let ctx = GradingContext::new(spec, roster.headers(), cli.identity())
        .context("roster does not match groups file")?;

    let report = Grader::new(&ctx, scheme.as_ref())
        .build_report(roster.rows())
        .context("failed to grade roster")?;

    write_report(io::stdout().lock(), &report, cli.delimiter(), cli.gpa)?;
    Ok(())
}

/// Grades a single human-readable record.
#[tracing::instrument(skip_all)]
fn run_human(cli: &Cli, mut input: Box<dyn Read>) -> Result<()> {
    let mut text = String::new();
    input
        .read_to_string(&mut text)
        .context("failed to read record")?;
    let record = HumanRecord::parse(&text)?;

    if cli.columns {
        write_columns(io::stdout().lock(), record.labels())?;
        return Ok(());
    }

    let Some(groups_path) = cli.groups.as_deref() else {
        info!("No groups file given, nothing to grade");
        return Ok(());
    };

    let spec = load_groups(groups_path)
        .with_context(|| format!("failed to load groups file {}", groups_path.display()))?;
    let scheme = load_scheme(cli)?;
    let identity = cli.identity();

    let (headers, row) = record
        .into_row(&spec, &identity)
        .context("record does not match groups file")?;
    let ctx = GradingContext::new(spec, &headers, identity)?;

    let report = Grader::new(&ctx, scheme.as_ref())
        .build_report([Ok(row)])
        .context("failed to grade record")?;

    write_report(io::stdout().lock(), &report, cli.delimiter(), cli.gpa)?;
    Ok(())
}
