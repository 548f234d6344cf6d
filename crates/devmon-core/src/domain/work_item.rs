use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Tracker work item reduced to the fields metrics are computed from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkItem {
    pub id: u64,
    pub title: String,
    pub state: String,
    #[serde(default)]
    pub assigned_to: Option<String>,
    #[serde(default)]
    pub story_points: Option<f64>,
    pub iteration_path: String,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub activated_at: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub closed_at: Option<OffsetDateTime>,
}

impl WorkItem {
    pub fn new(id: u64, title: impl Into<String>, state: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            state: state.into(),
            assigned_to: None,
            story_points: None,
            iteration_path: String::new(),
            activated_at: None,
            closed_at: None,
        }
    }

    pub fn with_story_points(mut self, points: f64) -> Self {
        self.story_points = Some(points);
        self
    }

    fn points(&self) -> f64 {
        self.story_points.unwrap_or(0.0)
    }
}

/// Work item state names that count as completed or in flight.
///
/// State names match exactly; the defaults are the Azure DevOps Agile process
/// names, which Jira's default workflow shares.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkItemStates {
    pub completed: Vec<String>,
    pub active: Vec<String>,
}

impl Default for WorkItemStates {
    fn default() -> Self {
        Self {
            completed: vec![
                String::from("Done"),
                String::from("Closed"),
                String::from("Resolved"),
            ],
            active: vec![String::from("Active"), String::from("In Progress")],
        }
    }
}

impl WorkItemStates {
    pub fn new(completed: Vec<String>, active: Vec<String>) -> Self {
        Self { completed, active }
    }

    pub fn is_completed(&self, item: &WorkItem) -> bool {
        self.completed.iter().any(|state| state == &item.state)
    }

    pub fn is_active(&self, item: &WorkItem) -> bool {
        self.active.iter().any(|state| state == &item.state)
    }

    /// Sum of story points over completed items.
    pub fn velocity(&self, items: &[WorkItem]) -> f64 {
        items
            .iter()
            .filter(|item| self.is_completed(item))
            .map(WorkItem::points)
            .sum()
    }

    pub fn active_story_count(&self, items: &[WorkItem]) -> u32 {
        let count = items.iter().filter(|item| self.is_active(item)).count();
        u32::try_from(count).unwrap_or(u32::MAX)
    }

    /// Sum of story points over every item in the iteration.
    pub fn planned_points(&self, items: &[WorkItem]) -> f64 {
        items.iter().map(WorkItem::points).sum()
    }

    /// Mean `closed_at - activated_at` in days over completed items carrying
    /// both timestamps.
    pub fn average_cycle_time_days(&self, items: &[WorkItem]) -> Option<f64> {
        let durations = items
            .iter()
            .filter(|item| self.is_completed(item))
            .filter_map(|item| match (item.activated_at, item.closed_at) {
                (Some(activated), Some(closed)) if closed >= activated => {
                    Some((closed - activated).as_seconds_f64() / 86_400.0)
                }
                _ => None,
            })
            .collect::<Vec<_>>();

        if durations.is_empty() {
            return None;
        }

        let mean = durations.iter().sum::<f64>() / durations.len() as f64;
        Some((mean * 10.0).round() / 10.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn item(id: u64, state: &str, points: Option<f64>) -> WorkItem {
        let mut item = WorkItem::new(id, format!("item {id}"), state);
        item.story_points = points;
        item
    }

    #[test]
    fn velocity_counts_only_completed_states() {
        let states = WorkItemStates::default();
        let items = vec![
            item(1, "Done", Some(5.0)),
            item(2, "Closed", Some(3.0)),
            item(3, "Resolved", Some(2.0)),
            item(4, "Active", Some(8.0)),
            item(5, "In Progress", Some(13.0)),
            item(6, "New", Some(21.0)),
            item(7, "done", Some(40.0)),
        ];

        assert_eq!(states.velocity(&items), 10.0);
    }

    #[test]
    fn velocity_treats_missing_points_as_zero() {
        let states = WorkItemStates::default();
        let items = vec![item(1, "Done", None), item(2, "Done", Some(3.0))];

        assert_eq!(states.velocity(&items), 3.0);
    }

    #[test]
    fn active_stories_count_active_and_in_progress() {
        let states = WorkItemStates::default();
        let items = vec![
            item(1, "Active", None),
            item(2, "In Progress", Some(1.0)),
            item(3, "Done", Some(1.0)),
            item(4, "New", None),
        ];

        assert_eq!(states.active_story_count(&items), 2);
        assert_eq!(states.planned_points(&items), 2.0);
    }

    #[test]
    fn custom_states_replace_the_defaults() {
        let states = WorkItemStates::new(vec![String::from("Shipped")], Vec::new());
        let items = vec![item(1, "Shipped", Some(4.0)), item(2, "Done", Some(4.0))];

        assert_eq!(states.velocity(&items), 4.0);
        assert_eq!(states.active_story_count(&items), 0);
    }

    #[test]
    fn cycle_time_averages_completed_items_with_both_timestamps() {
        let states = WorkItemStates::default();
        let mut first = item(1, "Done", Some(3.0));
        first.activated_at = Some(datetime!(2024-01-15 09:00 UTC));
        first.closed_at = Some(datetime!(2024-01-17 09:00 UTC));
        let mut second = item(2, "Closed", Some(3.0));
        second.activated_at = Some(datetime!(2024-01-15 09:00 UTC));
        second.closed_at = Some(datetime!(2024-01-19 21:00 UTC));
        let mut still_open = item(3, "Active", Some(3.0));
        still_open.activated_at = Some(datetime!(2024-01-10 09:00 UTC));
        let no_activation = item(4, "Done", Some(1.0));

        let average = states.average_cycle_time_days(&[first, second, still_open, no_activation]);
        assert_eq!(average, Some(3.3));
    }

    #[test]
    fn cycle_time_is_none_without_qualifying_items() {
        let states = WorkItemStates::default();
        assert_eq!(states.average_cycle_time_days(&[]), None);
        assert_eq!(
            states.average_cycle_time_days(&[item(1, "Done", Some(2.0))]),
            None
        );
    }
}
