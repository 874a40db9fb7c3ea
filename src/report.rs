//! Per-student report rows and the sorted report built from a roster.

use std::fmt;

use tracing::{debug, error, info};

use crate::binding::GradingContext;
use crate::error::Result;
use crate::grading::aggregate::aggregate;
use crate::grading::letter::LetterScheme;
use crate::grading::types::CourseGrade;
use crate::roster::StudentRow;

/// Sort key of a report row.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct StudentKey {
    pub last: String,
    pub username: String,
}

impl fmt::Display for StudentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.last, self.username)
    }
}

/// Strips the `#` prefix Brightspace puts on usernames.
pub fn deprefix_username(raw: &str) -> &str {
    raw.trim().trim_start_matches('#')
}

/// A weighted group as it appears in the report header.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportColumn {
    pub name: String,
    pub weight: f64,
}

impl ReportColumn {
    pub fn label(&self) -> String {
        format!("{}({:.3})", self.name, self.weight)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportRow {
    pub key: StudentKey,
    pub first: String,
    pub letter: Option<String>,
    pub gpa: Option<f64>,
    pub grade: CourseGrade,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub columns: Vec<ReportColumn>,
    /// Sorted by [`StudentKey`].
    pub rows: Vec<ReportRow>,
    pub has_letter: bool,
}

/// Grades rows against a context and an optional letter scheme.
pub struct Grader<'a> {
    ctx: &'a GradingContext,
    scheme: Option<&'a LetterScheme>,
}

impl<'a> Grader<'a> {
    pub fn new(ctx: &'a GradingContext, scheme: Option<&'a LetterScheme>) -> Self {
        Grader { ctx, scheme }
    }

    pub fn key(&self, row: &StudentRow) -> Result<StudentKey> {
        let identity = self.ctx.identity();
        Ok(StudentKey {
            last: self.ctx.cell(row, &identity.last)?.trim().to_string(),
            username: deprefix_username(self.ctx.cell(row, &identity.username)?).to_string(),
        })
    }

    pub fn grade_row(&self, row: &StudentRow) -> Result<ReportRow> {
        let key = self.key(row)?;
        let first = self
            .ctx
            .cell(row, &self.ctx.identity().first)?
            .trim()
            .to_string();

        let grade = aggregate(row, self.ctx).inspect_err(|e| {
            error!(student = %key, error = %e, "Grading failed");
        })?;

        let entry = self.scheme.map(|s| s.lookup(grade.percentage as f64));
        debug!(student = %key, percentage = grade.percentage, "Student graded");

        Ok(ReportRow {
            key,
            first,
            letter: entry.map(|e| e.letter.clone()),
            gpa: entry.and_then(|e| e.gpa),
            grade,
        })
    }

    /// Grades every row, then sorts by student key.
    ///
    /// Stops at the first error; nothing graded so far is returned.
    #[tracing::instrument(skip_all)]
    pub fn build_report<I>(&self, rows: I) -> Result<Report>
    where
        I: IntoIterator<Item = Result<StudentRow>>,
    {
        let mut graded = Vec::new();
        for row in rows {
            graded.push(self.grade_row(&row?)?);
        }
        graded.sort_by(|a, b| a.key.cmp(&b.key));

        info!(students = graded.len(), "Report built");

        Ok(Report {
            columns: self
                .ctx
                .spec()
                .reported_groups()
                .map(|g| ReportColumn {
                    name: g.name.clone(),
                    weight: g.weight,
                })
                .collect(),
            rows: graded,
            has_letter: self.scheme.is_some(),
        })
    }
}
