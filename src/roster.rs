//! Roster input: streaming CSV rows and the single-student record shape.

use std::collections::HashMap;
use std::io::Read;

use csv::{ReaderBuilder, StringRecord};
use tracing::debug;

use crate::column;
use crate::error::{GradeError, Result};
use crate::grading::types::GroupSpec;

const NEEDS_GRADING: &str = "Needs Grading";
const IN_PROGRESS: &str = "In Progress";

/// Names of the roster columns that identify a student.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityColumns {
    pub first: String,
    pub last: String,
    pub username: String,
}

impl Default for IdentityColumns {
    fn default() -> Self {
        IdentityColumns {
            first: "First Name".to_string(),
            last: "Last Name".to_string(),
            username: "Username".to_string(),
        }
    }
}

impl IdentityColumns {
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        [&self.first, &self.last, &self.username]
            .into_iter()
            .map(String::as_str)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.iter().any(|c| column::normalize(c) == column)
    }
}

/// One student's raw cells keyed by the literal roster header.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StudentRow {
    cells: HashMap<String, String>,
}

impl StudentRow {
    pub fn from_record(headers: &[String], record: &StringRecord) -> Self {
        headers
            .iter()
            .cloned()
            .zip(record.iter().map(str::to_string))
            .collect()
    }

    pub fn get(&self, header: &str) -> Option<&str> {
        self.cells.get(header).map(String::as_str)
    }
}

impl FromIterator<(String, String)> for StudentRow {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        StudentRow {
            cells: iter.into_iter().collect(),
        }
    }
}

/// A raw cell classified at the point where it is first consumed.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    /// Nothing submitted.
    Empty,
    /// A grading sentinel such as `Needs Grading`; carries the raw text.
    Pending(String),
    Score(f64),
}

impl Cell {
    /// # Errors
    ///
    /// [`GradeError::InvalidScore`] when the cell is neither empty, a
    /// grading sentinel, nor a finite number.
    pub fn parse(column: &str, raw: &str) -> Result<Cell> {
        let value = raw.trim();
        if value.is_empty() {
            return Ok(Cell::Empty);
        }
        if value == NEEDS_GRADING || value.starts_with(IN_PROGRESS) {
            return Ok(Cell::Pending(value.to_string()));
        }
        match value.parse::<f64>() {
            Ok(score) if score.is_finite() => Ok(Cell::Score(score)),
            _ => Err(GradeError::InvalidScore {
                column: column.to_string(),
                value: raw.to_string(),
            }),
        }
    }
}

/// Forward-only reader over a CSV gradebook export.
pub struct Roster<R> {
    reader: csv::Reader<R>,
    headers: Vec<String>,
}

impl<R: Read> Roster<R> {
    pub fn from_reader(rdr: R) -> Result<Self> {
        let mut reader = ReaderBuilder::new().from_reader(rdr);
        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').to_string())
            .collect();
        debug!(columns = headers.len(), "Roster header read");
        Ok(Roster { reader, headers })
    }

    /// Literal header strings, in file order.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Streams the remaining rows one at a time.
    pub fn rows(&mut self) -> impl Iterator<Item = Result<StudentRow>> + '_ {
        let headers = &self.headers;
        self.reader.records().map(move |record| {
            record
                .map(|r| StudentRow::from_record(headers, &r))
                .map_err(GradeError::from)
        })
    }
}

/// A single student given as `<label>: <value>` lines.
///
/// Labels are column display names (the text before any metadata token). The
/// value is everything after the last `:` on the line.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HumanRecord {
    entries: Vec<(String, String)>,
}

impl HumanRecord {
    pub fn parse(text: &str) -> Result<Self> {
        let mut entries = Vec::new();
        for (idx, line) in text.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let Some((label, value)) = trimmed.rsplit_once(':') else {
                return Err(GradeError::MalformedRecord {
                    line: idx + 1,
                    reason: "expected `<label>: <value>`".to_string(),
                });
            };
            entries.push((label.trim().to_string(), value.trim().to_string()));
        }
        Ok(HumanRecord { entries })
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(label, _)| label.as_str())
    }

    pub fn get(&self, label: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, v)| v.as_str())
    }

    /// Lays the record out as a one-row roster over the spec's universe.
    ///
    /// Scored and identity columns must be present; other header columns
    /// default to empty.
    ///
    /// # Errors
    ///
    /// [`GradeError::MissingColumn`] naming the display label of the first
    /// required column the record lacks.
    pub fn into_row(
        self,
        spec: &GroupSpec,
        identity: &IdentityColumns,
    ) -> Result<(Vec<String>, StudentRow)> {
        let mut headers = Vec::with_capacity(spec.universe().len());
        let mut cells = Vec::with_capacity(spec.universe().len());

        for column in spec.universe() {
            let label = column::display_label(column);
            let required = spec.max_points(column).is_some() || identity.contains(column);
            let value = match self.get(label) {
                Some(value) => value.to_string(),
                None if required => {
                    return Err(GradeError::MissingColumn {
                        label: label.to_string(),
                    });
                }
                None => String::new(),
            };
            headers.push(column.clone());
            cells.push((column.clone(), value));
        }

        Ok((headers, cells.into_iter().collect()))
    }
}
