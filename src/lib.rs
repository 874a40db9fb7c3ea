pub mod binding;
pub mod column;
pub mod error;
pub mod grading;
pub mod groups;
pub mod output;
pub mod report;
pub mod roster;

pub use error::{GradeError, Result};
