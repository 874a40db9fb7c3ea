//! Letter-grade schemes: ordered lower-bound thresholds mapped to letters.
//!
//! | Format | Example line     | Notes                                        |
//! |--------|------------------|----------------------------------------------|
//! | `csv`  | `A,90,4.0`       | header row `letter,threshold[,gpa]` required |
//! | `text` | `A 4.0 90`       | `<letter> [gpa] <threshold>`, `#` comments   |

use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, Trim};
use serde::Deserialize;
use tracing::debug;

use crate::error::{GradeError, Result};

/// Source format of a letter scheme file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SchemeFormat {
    #[default]
    Csv,
    Text,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SchemeEntry {
    pub threshold: f64,
    pub letter: String,
    pub gpa: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct SchemeRecord {
    #[serde(alias = "Letter")]
    letter: String,
    #[serde(alias = "Threshold")]
    threshold: f64,
    #[serde(default, alias = "GPA")]
    gpa: Option<f64>,
}

/// Thresholds sorted ascending; never empty.
#[derive(Debug, Clone, PartialEq)]
pub struct LetterScheme {
    entries: Vec<SchemeEntry>,
}

fn malformed(line: usize, reason: impl Into<String>) -> GradeError {
    GradeError::MalformedScheme {
        line,
        reason: reason.into(),
    }
}

impl LetterScheme {
    /// Validates and sorts `(line, entry)` pairs.
    ///
    /// Thresholds must be finite, within [0, 100] and distinct.
    fn build(mut entries: Vec<(usize, SchemeEntry)>) -> Result<Self> {
        if entries.is_empty() {
            return Err(malformed(0, "scheme has no entries"));
        }

        for (line, entry) in &entries {
            if !entry.threshold.is_finite() || !(0.0..=100.0).contains(&entry.threshold) {
                return Err(malformed(
                    *line,
                    format!("threshold {} is outside [0, 100]", entry.threshold),
                ));
            }
        }

        entries.sort_by(|a, b| a.1.threshold.total_cmp(&b.1.threshold));
        if let Some(pair) = entries
            .windows(2)
            .find(|w| w[0].1.threshold == w[1].1.threshold)
        {
            return Err(malformed(
                pair[1].0,
                format!("threshold {} appears twice", pair[1].1.threshold),
            ));
        }

        debug!(entries = entries.len(), "Letter scheme loaded");
        Ok(LetterScheme {
            entries: entries.into_iter().map(|(_, e)| e).collect(),
        })
    }

    pub fn from_entries(entries: Vec<SchemeEntry>) -> Result<Self> {
        Self::build(entries.into_iter().map(|e| (0, e)).collect())
    }

    /// Reads a CSV scheme with a `letter,threshold[,gpa]` header row.
    pub fn from_csv<R: Read>(rdr: R) -> Result<Self> {
        let mut reader = ReaderBuilder::new().trim(Trim::All).from_reader(rdr);
        let mut entries = Vec::new();

        for (idx, record) in reader.deserialize::<SchemeRecord>().enumerate() {
            let line = idx + 2;
            let record = record.map_err(|e| malformed(line, e.to_string()))?;
            entries.push((
                line,
                SchemeEntry {
                    threshold: record.threshold,
                    letter: record.letter,
                    gpa: record.gpa,
                },
            ));
        }

        Self::build(entries)
    }

    /// Reads whitespace-separated `<letter> [gpa] <threshold>` lines.
    pub fn from_text(text: &str) -> Result<Self> {
        let mut entries = Vec::new();

        for (idx, line) in text.lines().enumerate() {
            let line_no = idx + 1;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            let tokens: Vec<&str> = trimmed.split_whitespace().collect();
            let (letter, gpa, threshold) = match tokens.as_slice() {
                [letter, threshold] => (*letter, None, *threshold),
                [letter, gpa, threshold] => (*letter, Some(*gpa), *threshold),
                _ => {
                    return Err(malformed(line_no, "expected `<letter> [gpa] <threshold>`"));
                }
            };

            let threshold = threshold.parse::<f64>().map_err(|_| {
                malformed(line_no, format!("threshold `{threshold}` is not a number"))
            })?;
            let gpa = gpa
                .map(|g| {
                    g.parse::<f64>()
                        .map_err(|_| malformed(line_no, format!("GPA `{g}` is not a number")))
                })
                .transpose()?;

            entries.push((
                line_no,
                SchemeEntry {
                    threshold,
                    letter: letter.to_string(),
                    gpa,
                },
            ));
        }

        Self::build(entries)
    }

    #[tracing::instrument(skip(path), fields(path = %path.display()))]
    pub fn load(path: &Path, format: SchemeFormat) -> Result<Self> {
        match format {
            SchemeFormat::Csv => Self::from_csv(std::fs::File::open(path)?),
            SchemeFormat::Text => Self::from_text(&std::fs::read_to_string(path)?),
        }
    }

    pub fn entries(&self) -> &[SchemeEntry] {
        &self.entries
    }

    /// Entry with the greatest threshold not above `percentage`; the lowest
    /// entry when `percentage` is below every threshold.
    pub fn lookup(&self, percentage: f64) -> &SchemeEntry {
        let idx = self
            .entries
            .partition_point(|e| e.threshold <= percentage)
            .saturating_sub(1);
        &self.entries[idx]
    }

    pub fn letter(&self, percentage: f64) -> &str {
        &self.lookup(percentage).letter
    }
}
