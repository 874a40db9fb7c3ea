//! Parser for the line-oriented groups file.
//!
//! ```text
//! ## identifying columns
//! Username
//! Last Name
//!
//! # homework 0.4 drop 1
//! Homework 1 Points Grade <Numeric MaxPoints:10>
//! Homework 2 Points Grade <Numeric MaxPoints:10>
//!
//! # final 0.6
//! Final Exam Points Grade <Numeric MaxPoints:100>
//! ```
//!
//! The `##` line opens the unweighted `header` group and must come first.
//! Each `#` line opens a weighted group; every other non-blank line is a
//! column of the group opened most recently.

use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use tracing::{debug, info};

use crate::column;
use crate::error::{GradeError, Result};
use crate::grading::types::{Group, GroupSpec, HEADER_GROUP};

const HEADER_MARKER: &str = "##";
const GROUP_MARKER: char = '#';
const DROP_KEYWORD: &str = "drop";
const WEIGHT_TOLERANCE: f64 = 1e-6;

fn malformed(line: usize, reason: impl Into<String>) -> GradeError {
    GradeError::MalformedSpec {
        line,
        reason: reason.into(),
    }
}

/// Reads and parses a groups file from disk.
#[tracing::instrument(skip(path), fields(path = %path.display()))]
pub fn load_groups(path: &Path) -> Result<GroupSpec> {
    let content = std::fs::read_to_string(path)?;
    parse_groups(content.lines())
}

/// Parses groups-file lines into a validated [`GroupSpec`].
///
/// # Errors
///
/// [`GradeError::MalformedSpec`] for structural problems, including a group
/// that drops as many scores as it has columns, and
/// [`GradeError::WeightSum`] when the weighted groups do not sum to 1.
pub fn parse_groups<I, S>(lines: I) -> Result<GroupSpec>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut groups: Vec<Group> = Vec::new();
    // line on which each group was declared, parallel to `groups`
    let mut declared_at: Vec<usize> = Vec::new();
    let mut max_points = HashMap::new();
    let mut universe = BTreeSet::new();

    for (idx, line) in lines.into_iter().enumerate() {
        let line_no = idx + 1;
        let line = line.as_ref();

        if line.trim().is_empty() {
            continue;
        }

        if line.starts_with(HEADER_MARKER) {
            if !groups.is_empty() {
                return Err(malformed(
                    line_no,
                    "`##` header line must be the first declaration and appear once",
                ));
            }
            groups.push(Group::header());
            declared_at.push(line_no);
            continue;
        }

        if groups.is_empty() {
            let reason = if line.starts_with(GROUP_MARKER) {
                "groups file must begin with a `##` header line"
            } else {
                "column declared before any group"
            };
            return Err(malformed(line_no, reason));
        }

        if line.starts_with(GROUP_MARKER) {
            let group = parse_group_line(line, line_no)?;
            if groups.iter().any(|g| g.name == group.name) {
                return Err(malformed(
                    line_no,
                    format!("group `{}` declared twice", group.name),
                ));
            }
            debug!(
                group = %group.name,
                weight = group.weight,
                drop_lowest = group.drop_lowest,
                "Group declared"
            );
            groups.push(group);
            declared_at.push(line_no);
            continue;
        }

        let name = column::normalize(line);
        let Some(group) = groups.last_mut() else {
            return Err(malformed(line_no, "column declared before any group"));
        };

        if !group.is_header() {
            let points = column::max_points(&name)
                .map_err(|e| malformed(line_no, format!("column `{name}`: {e}")))?;
            max_points.insert(name.clone(), points);
        }

        universe.insert(name.clone());
        group.members.push(name);
    }

    if groups.is_empty() {
        return Err(malformed(0, "groups file is empty"));
    }

    for (group, line_no) in groups.iter().zip(&declared_at) {
        if !group.is_header() && group.drop_lowest >= group.members.len() {
            return Err(malformed(
                *line_no,
                format!(
                    "group `{}` drops {} of its {} column(s)",
                    group.name,
                    group.drop_lowest,
                    group.members.len()
                ),
            ));
        }
    }

    let sum: f64 = groups
        .iter()
        .filter(|g| !g.is_header())
        .map(|g| g.weight)
        .sum();
    if (sum - 1.0).abs() > WEIGHT_TOLERANCE {
        return Err(GradeError::WeightSum { sum });
    }

    info!(
        groups = groups.len(),
        columns = universe.len(),
        "Groups file parsed"
    );

    Ok(GroupSpec {
        groups,
        max_points,
        universe,
    })
}

/// Parses `# <name> <weight> [drop <n>]`.
fn parse_group_line(line: &str, line_no: usize) -> Result<Group> {
    let tokens: Vec<&str> = line[GROUP_MARKER.len_utf8()..].split_whitespace().collect();

    let (name, weight, drop_lowest) = match tokens.as_slice() {
        [name, weight] => (*name, *weight, None),
        [name, weight, keyword, count] if *keyword == DROP_KEYWORD => {
            (*name, *weight, Some(*count))
        }
        _ => {
            return Err(malformed(
                line_no,
                "expected `# <name> <weight> [drop <n>]`",
            ));
        }
    };

    if name == HEADER_GROUP {
        return Err(malformed(
            line_no,
            format!("`{HEADER_GROUP}` is reserved for the `##` group"),
        ));
    }

    let weight: f64 = weight
        .parse()
        .map_err(|_| malformed(line_no, format!("weight `{weight}` is not a number")))?;
    if !weight.is_finite() || !(0.0..=1.0).contains(&weight) {
        return Err(malformed(
            line_no,
            format!("weight {weight} is outside [0, 1]"),
        ));
    }

    let drop_lowest = match drop_lowest {
        Some(count) => count.parse::<usize>().map_err(|_| {
            malformed(
                line_no,
                format!("drop count `{count}` is not a non-negative integer"),
            )
        })?,
        None => 0,
    };

    Ok(Group {
        name: name.to_string(),
        weight,
        drop_lowest,
        members: Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
## identifying columns
Username
Last Name

# homework 0.4 drop 1
Homework 1 <Numeric MaxPoints:10>
Homework 2 <Numeric MaxPoints:10>
Homework 3 <Numeric MaxPoints:20>

# final 0.6
Final Exam <Numeric MaxPoints:100 Weight:60> |trailing
";

    fn parse(text: &str) -> Result<GroupSpec> {
        parse_groups(text.lines())
    }

    fn assert_malformed(text: &str, expected_line: usize) {
        match parse(text) {
            Err(GradeError::MalformedSpec { line, .. }) => assert_eq!(line, expected_line),
            other => panic!("expected MalformedSpec, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_sample() {
        let spec = parse(SAMPLE).unwrap();

        let names: Vec<_> = spec.groups().iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["header", "homework", "final"]);

        let homework = spec.group("homework").unwrap();
        assert_eq!(homework.weight, 0.4);
        assert_eq!(homework.drop_lowest, 1);
        assert_eq!(homework.members.len(), 3);

        let header = spec.group("header").unwrap();
        assert_eq!(header.weight, 0.0);
        assert_eq!(header.members, vec!["Username", "Last Name"]);

        assert_eq!(spec.max_points("Homework 3 <Numeric MaxPoints:20>"), Some(20.0));
        assert_eq!(spec.max_points("Username"), None);
        assert!(
            spec.universe()
                .contains("Final Exam <Numeric MaxPoints:100 Weight:60>")
        );
        assert_eq!(spec.universe().len(), 6);
    }

    #[test]
    fn test_drop_defaults_to_zero() {
        let spec = parse(SAMPLE).unwrap();
        assert_eq!(spec.group("final").unwrap().drop_lowest, 0);
    }

    #[test]
    fn test_missing_header_line() {
        assert_malformed("\n# homework 1.0\nHW <Numeric MaxPoints:1>\n", 2);
    }

    #[test]
    fn test_column_before_group() {
        assert_malformed("Username\n## header\n", 1);
    }

    #[test]
    fn test_second_header_line() {
        assert_malformed("## a\n# hw 1.0\nHW <Numeric MaxPoints:1>\n## b\n", 4);
    }

    #[test]
    fn test_bad_group_lines() {
        assert_malformed("## h\n# homework\n", 2);
        assert_malformed("## h\n# homework abc\n", 2);
        assert_malformed("## h\n# homework 0.5 skip 1\n", 2);
        assert_malformed("## h\n# homework 0.5 drop -1\n", 2);
        assert_malformed("## h\n# homework 1.5\n", 2);
        assert_malformed("## h\n# header 1.0\n", 2);
    }

    #[test]
    fn test_duplicate_group_name() {
        assert_malformed(
            "## h\n# hw 0.5\nA <Numeric MaxPoints:1>\n# hw 0.5\nB <Numeric MaxPoints:1>\n",
            4,
        );
    }

    #[test]
    fn test_column_without_token() {
        assert_malformed("## h\n# hw 1.0\nHomework 1 [Total Pts: 100 Score]\n", 3);
    }

    #[test]
    fn test_drop_must_leave_a_score() {
        assert_malformed(
            "## h\n# hw 1.0 drop 2\nA <Numeric MaxPoints:1>\nB <Numeric MaxPoints:1>\n",
            2,
        );
        assert_malformed("## h\n# empty 1.0\n", 2);
    }

    #[test]
    fn test_weights_must_sum_to_one() {
        let text = "## h\n# a 0.5\nA <Numeric MaxPoints:1>\n# b 0.4\nB <Numeric MaxPoints:1>\n";
        match parse(text) {
            Err(GradeError::WeightSum { sum }) => assert!((sum - 0.9).abs() < 1e-9),
            other => panic!("expected WeightSum, got {other:?}"),
        }
    }

    #[test]
    fn test_weights_within_tolerance() {
        let text = "## h\n# a 0.3333333\nA <Numeric MaxPoints:1>\n# b 0.6666667\nB <Numeric MaxPoints:1>\n";
        assert!(parse(text).is_ok());
    }

    #[test]
    fn test_duplicate_columns_are_kept_in_membership() {
        let text = "## h\n# a 1.0\nA <Numeric MaxPoints:1>\nA <Numeric MaxPoints:1>\n";
        let spec = parse(text).unwrap();
        assert_eq!(spec.group("a").unwrap().members.len(), 2);
        assert_eq!(spec.universe().len(), 1);
    }

    #[test]
    fn test_empty_file() {
        assert_malformed("\n\n", 0);
    }

    #[test]
    fn test_load_groups_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("groups.txt");
        std::fs::write(&path, SAMPLE).unwrap();

        let spec = load_groups(&path).unwrap();
        assert_eq!(spec.scored_groups().count(), 2);
    }
}
