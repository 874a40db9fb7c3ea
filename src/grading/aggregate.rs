use tracing::warn;

use crate::binding::GradingContext;
use crate::error::{GradeError, Result};
use crate::grading::types::{CourseGrade, GroupScore};
use crate::grading::utility::{drop_lowest, mean};
use crate::roster::{Cell, StudentRow};

/// Added before rounding so totals such as 0.835 land on 84, not 83.
pub const ROUNDING_EPSILON: f64 = 1e-7;

/// Converts a course total in [0, 1] to an integer percentage.
pub fn percentage(total: f64) -> i64 {
    (100.0 * total + ROUNDING_EPSILON).round() as i64
}

/// Grades one student against the context's groups.
///
/// For each weighted group, in declaration order: every member cell is
/// normalized by its column's maximum points (empty and pending cells count
/// as 0), the `drop_lowest` smallest values are discarded, the rest are
/// averaged and the average is scaled by the group weight. The course total
/// is the sum over groups.
///
/// # Errors
///
/// [`GradeError::InvalidScore`] for a cell that is neither empty, pending,
/// nor numeric.
pub fn aggregate(row: &StudentRow, ctx: &GradingContext) -> Result<CourseGrade> {
    let mut groups = Vec::new();
    let mut total = 0.0;

    for group in ctx.spec().scored_groups() {
        let mut normalized = Vec::with_capacity(group.members.len());

        for column in &group.members {
            let max_points = ctx
                .spec()
                .max_points(column)
                .ok_or_else(|| GradeError::UnknownColumn(column.clone()))?;

            let raw = match ctx.score(row, column)? {
                Cell::Score(score) => score,
                Cell::Empty => 0.0,
                Cell::Pending(value) => {
                    warn!(column = %column, value = %value, "Cell awaits grading, counted as 0");
                    0.0
                }
            };
            normalized.push(raw / max_points);
        }

        let kept = drop_lowest(normalized, group.drop_lowest);
        let weighted = mean(&kept) * group.weight;
        total += weighted;

        groups.push(GroupScore {
            name: group.name.clone(),
            weighted,
        });
    }

    Ok(CourseGrade {
        groups,
        total,
        percentage: percentage(total),
    })
}
