//! Binding of groups-file columns to the literal headers of a roster.

use std::collections::{BTreeSet, HashMap};

use tracing::{debug, warn};

use crate::column;
use crate::error::{GradeError, Result};
use crate::grading::types::GroupSpec;
use crate::roster::{Cell, IdentityColumns, StudentRow};

/// Map from normalized column name to the roster's literal header.
#[derive(Debug, Clone, Default)]
pub struct ColumnBinding {
    literal: HashMap<String, String>,
}

impl ColumnBinding {
    /// Checks that `universe` and the normalized `headers` are the same set.
    ///
    /// # Errors
    ///
    /// [`GradeError::ColumnMismatch`] carrying both halves of the symmetric
    /// difference.
    pub fn bind(universe: &BTreeSet<String>, headers: &[String]) -> Result<Self> {
        let mut literal = HashMap::with_capacity(headers.len());
        for header in headers {
            let normalized = column::normalize(header);
            if let Some(previous) = literal.insert(normalized, header.clone()) {
                warn!(
                    header = %header,
                    previous = %previous,
                    "Roster headers normalize to the same column; using the later one"
                );
            }
        }

        let roster: BTreeSet<&String> = literal.keys().collect();
        let spec: BTreeSet<&String> = universe.iter().collect();

        if roster != spec {
            return Err(GradeError::ColumnMismatch {
                only_in_spec: spec.difference(&roster).map(|c| c.to_string()).collect(),
                only_in_roster: roster.difference(&spec).map(|c| c.to_string()).collect(),
            });
        }

        debug!(columns = literal.len(), "Roster columns bound");
        Ok(ColumnBinding { literal })
    }

    pub fn literal(&self, column: &str) -> Option<&str> {
        self.literal.get(column).map(String::as_str)
    }
}

/// Read-only state shared by every row of a run.
#[derive(Debug, Clone)]
pub struct GradingContext {
    spec: GroupSpec,
    binding: ColumnBinding,
    identity: IdentityColumns,
}

impl GradingContext {
    /// Binds `spec` to a roster's `headers` and checks the identity columns.
    ///
    /// # Errors
    ///
    /// [`GradeError::ColumnMismatch`] from binding, or
    /// [`GradeError::MissingColumn`] when an identity column is not a roster
    /// column.
    pub fn new(spec: GroupSpec, headers: &[String], identity: IdentityColumns) -> Result<Self> {
        let binding = ColumnBinding::bind(spec.universe(), headers)?;

        let identity = IdentityColumns {
            first: column::normalize(&identity.first),
            last: column::normalize(&identity.last),
            username: column::normalize(&identity.username),
        };
        if let Some(missing) = identity.iter().find(|c| binding.literal(c).is_none()) {
            return Err(GradeError::MissingColumn {
                label: missing.to_string(),
            });
        }

        Ok(GradingContext {
            spec,
            binding,
            identity,
        })
    }

    pub fn spec(&self) -> &GroupSpec {
        &self.spec
    }

    pub fn identity(&self) -> &IdentityColumns {
        &self.identity
    }

    /// Raw text of `column` (normalized name) in `row`.
    pub fn cell<'r>(&self, row: &'r StudentRow, column: &str) -> Result<&'r str> {
        self.binding
            .literal(column)
            .and_then(|header| row.get(header))
            .ok_or_else(|| GradeError::UnknownColumn(column.to_string()))
    }

    /// Classified content of `column` in `row`.
    pub fn score(&self, row: &StudentRow, column: &str) -> Result<Cell> {
        Cell::parse(column, self.cell(row, column)?)
    }
}
