//! Data types shared by the groups parser and the aggregation engine.

use std::collections::{BTreeSet, HashMap};

/// Name reserved for the synthetic group opened by the `##` line.
pub const HEADER_GROUP: &str = "header";

/// A named, weighted collection of roster columns.
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub name: String,
    pub weight: f64,
    pub drop_lowest: usize,
    /// Normalized column names, in declaration order.
    pub members: Vec<String>,
}

impl Group {
    pub fn header() -> Self {
        Group {
            name: HEADER_GROUP.to_string(),
            weight: 0.0,
            drop_lowest: 0,
            members: Vec::new(),
        }
    }

    pub fn is_header(&self) -> bool {
        self.name == HEADER_GROUP
    }
}

/// Immutable grouping model parsed from a groups file.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupSpec {
    pub(crate) groups: Vec<Group>,
    pub(crate) max_points: HashMap<String, f64>,
    pub(crate) universe: BTreeSet<String>,
}

impl GroupSpec {
    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    /// Groups that take part in aggregation, in declaration order.
    pub fn scored_groups(&self) -> impl Iterator<Item = &Group> {
        self.groups.iter().filter(|g| !g.is_header())
    }

    /// Scored groups that carry weight and so appear in the report.
    pub fn reported_groups(&self) -> impl Iterator<Item = &Group> {
        self.scored_groups().filter(|g| g.weight != 0.0)
    }

    pub fn group(&self, name: &str) -> Option<&Group> {
        self.groups.iter().find(|g| g.name == name)
    }

    pub fn max_points(&self, column: &str) -> Option<f64> {
        self.max_points.get(column).copied()
    }

    /// Every column mentioned by any group, header included.
    pub fn universe(&self) -> &BTreeSet<String> {
        &self.universe
    }
}

/// Weighted contribution of one group to a student's course total.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupScore {
    pub name: String,
    pub weighted: f64,
}

/// Aggregation result for a single student.
#[derive(Debug, Clone, PartialEq)]
pub struct CourseGrade {
    pub groups: Vec<GroupScore>,
    /// Sum of weighted group contributions, nominally in [0, 1].
    pub total: f64,
    pub percentage: i64,
}

impl CourseGrade {
    pub fn group(&self, name: &str) -> Option<f64> {
        self.groups
            .iter()
            .find(|g| g.name == name)
            .map(|g| g.weighted)
    }
}
