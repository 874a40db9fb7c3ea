//! Error type shared by every stage of the grading pipeline.
//!
//! All variants are fatal for the run: the binary reports the message and
//! exits non-zero without writing any report rows.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, GradeError>;

#[derive(Error, Debug)]
pub enum GradeError {
    #[error("malformed groups file (line {line}): {reason}")]
    MalformedSpec { line: usize, reason: String },

    #[error("group weights sum to {sum:.6}, expected 1")]
    WeightSum { sum: f64 },

    #[error(
        "groups file and roster columns differ (only in groups file: [{}]; only in roster: [{}])",
        .only_in_spec.join(", "),
        .only_in_roster.join(", ")
    )]
    ColumnMismatch {
        only_in_spec: Vec<String>,
        only_in_roster: Vec<String>,
    },

    #[error("invalid score {value:?} in column `{column}`")]
    InvalidScore { column: String, value: String },

    #[error("missing value for `{label}`")]
    MissingColumn { label: String },

    #[error("column `{0}` is not bound to the roster")]
    UnknownColumn(String),

    #[error("malformed letter scheme (line {line}): {reason}")]
    MalformedScheme { line: usize, reason: String },

    #[error("malformed record (line {line}): {reason}")]
    MalformedRecord { line: usize, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl GradeError {
    /// Every column on either side of a failed universe check, sorted.
    pub fn symmetric_difference(&self) -> Vec<&str> {
        match self {
            GradeError::ColumnMismatch {
                only_in_spec,
                only_in_roster,
            } => {
                let mut all: Vec<&str> = only_in_spec
                    .iter()
                    .chain(only_in_roster)
                    .map(String::as_str)
                    .collect();
                all.sort_unstable();
                all
            }
            _ => Vec::new(),
        }
    }
}
