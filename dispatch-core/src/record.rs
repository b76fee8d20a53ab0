//! Typed records for the assignment engine.
//!
//! These replace loose tabular rows with compile-time-checked fields;
//! validation happens once at the mutation boundary (`Engine`), not on every
//! access. All three serialize flat so they round-trip through CSV tables
//! unchanged.

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// A person tasks can be assigned to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub user_id: u32,
    pub name: String,
}

/// A unit of work. `kind` is a free-form label ("Design", "Review", ...)
/// used for skill bucketing; `deadline` is a budget in hours, not a date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub task_id: u32,
    pub kind: String,
    /// Difficulty in [0, 1].
    pub complexity: f64,
    /// Hours allotted; must be > 0.
    pub deadline: f64,
}

/// A recorded completion outcome. Append-only; the store does not enforce
/// (task, user) uniqueness, the assignment policy treats an existing row as
/// "this user already did this task".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub task_id: u32,
    pub user_id: u32,
    /// Hours actually spent, as reported by the caller; must be > 0.
    pub time_taken: f64,
    /// Outcome rating, 1..=5.
    pub quality: u8,
}

pub(crate) fn validate_user_name(name: &str) -> Result<(), EngineError> {
    if name.trim().is_empty() {
        return Err(EngineError::Validation(
            "user name must not be empty".to_string(),
        ));
    }
    Ok(())
}

pub(crate) fn validate_task_fields(
    kind: &str,
    complexity: f64,
    deadline: f64,
) -> Result<(), EngineError> {
    if kind.trim().is_empty() {
        return Err(EngineError::Validation(
            "task kind must not be empty".to_string(),
        ));
    }
    if !complexity.is_finite() || !(0.0..=1.0).contains(&complexity) {
        return Err(EngineError::Validation(format!(
            "complexity must be in [0, 1], got {complexity}"
        )));
    }
    if !deadline.is_finite() || deadline <= 0.0 {
        return Err(EngineError::Validation(format!(
            "deadline must be > 0 hours, got {deadline}"
        )));
    }
    Ok(())
}

pub(crate) fn validate_result_fields(time_taken: f64, quality: u8) -> Result<(), EngineError> {
    if !time_taken.is_finite() || time_taken <= 0.0 {
        return Err(EngineError::Validation(format!(
            "time_taken must be > 0 hours, got {time_taken}"
        )));
    }
    if !(1..=5).contains(&quality) {
        return Err(EngineError::Validation(format!(
            "quality must be 1..=5, got {quality}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_field_bounds() {
        assert!(validate_task_fields("Design", 0.0, 1.0).is_ok());
        assert!(validate_task_fields("Design", 1.0, 0.5).is_ok());
        assert!(validate_task_fields("", 0.5, 1.0).is_err());
        assert!(validate_task_fields("Design", 1.1, 1.0).is_err());
        assert!(validate_task_fields("Design", -0.1, 1.0).is_err());
        assert!(validate_task_fields("Design", 0.5, 0.0).is_err());
        assert!(validate_task_fields("Design", f64::NAN, 1.0).is_err());
    }

    #[test]
    fn result_field_bounds() {
        assert!(validate_result_fields(0.5, 1).is_ok());
        assert!(validate_result_fields(8.0, 5).is_ok());
        assert!(validate_result_fields(0.0, 3).is_err());
        assert!(validate_result_fields(2.0, 0).is_err());
        assert!(validate_result_fields(2.0, 6).is_err());
    }
}
