use serde::{Deserialize, Serialize};
use time::macros::format_description;
use time::Date;

use crate::ValidationError;

time::serde::format_description!(sprint_date, Date, "[year]-[month]-[day]");

/// Lifecycle state of a sprint (an iteration, in Azure DevOps terms).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SprintStatus {
    Active,
    Future,
    Completed,
}

impl SprintStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Future => "future",
            Self::Completed => "completed",
        }
    }

    /// Maps tracker vocabulary onto the closed status set.
    ///
    /// Azure DevOps reports `past`/`current`/`future` time frames, Jira reports
    /// `closed`/`active`/`future` states. Unrecognized values are treated as
    /// not yet started.
    pub fn from_source(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "active" | "current" => Self::Active,
            "closed" | "completed" | "past" => Self::Completed,
            _ => Self::Future,
        }
    }
}

/// Normalized sprint with point totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sprint {
    pub id: String,
    pub name: String,
    #[serde(default, with = "sprint_date::option")]
    pub start_date: Option<Date>,
    #[serde(default, with = "sprint_date::option")]
    pub end_date: Option<Date>,
    pub status: SprintStatus,
    pub velocity: f64,
    pub planned_points: f64,
    pub completed_points: f64,
}

impl Sprint {
    /// Percentage of planned points completed, rounded to the nearest integer.
    ///
    /// Zero planned points yields 0. Completed points above the plan are
    /// reported as-is (values over 100 are possible).
    pub fn progress(&self) -> u32 {
        if self.planned_points == 0.0 {
            return 0;
        }
        (self.completed_points / self.planned_points * 100.0).round() as u32
    }
}

/// Parses a tracker date, accepting either `YYYY-MM-DD` or an RFC 3339
/// timestamp whose first ten characters are the calendar date.
pub fn parse_sprint_date(raw: &str) -> Result<Date, ValidationError> {
    let trimmed = raw.trim();
    let date_part = trimmed.get(..10).unwrap_or(trimmed);
    Date::parse(date_part, format_description!("[year]-[month]-[day]")).map_err(|_| {
        ValidationError::InvalidDate {
            value: trimmed.to_owned(),
        }
    })
}
