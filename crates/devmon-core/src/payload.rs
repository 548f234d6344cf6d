//! Tracker wire payloads.
//!
//! These mirror the JSON the trackers return, with every nested field
//! optional so partial responses deserialize. [`crate::normalize`] turns them
//! into the shared domain model.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// `{ "value": [...] }` collection wrapper used by Azure DevOps list APIs.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ValueList<T> {
    #[serde(default = "Vec::new")]
    pub value: Vec<T>,
}

/// Metrics attached to a team payload by the tracker client.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsPayload {
    #[serde(default)]
    pub velocity: Option<f64>,
    #[serde(default)]
    pub active_stories: Option<u32>,
    #[serde(default)]
    pub average_cycle_time: Option<f64>,
    #[serde(default)]
    pub sprint_progress: Option<u32>,
    #[serde(default)]
    pub planned_points: Option<f64>,
    #[serde(default)]
    pub completed_points: Option<f64>,
}

pub mod azure_devops {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Team {
        pub id: String,
        pub name: String,
        #[serde(default)]
        pub description: Option<String>,
        #[serde(default)]
        pub url: Option<String>,
    }

    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Identity {
        pub id: String,
        #[serde(default)]
        pub display_name: String,
        /// Usually the member's email address.
        #[serde(default)]
        pub unique_name: String,
        #[serde(default)]
        pub image_url: Option<String>,
        #[serde(default)]
        pub descriptor: Option<String>,
    }

    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Member {
        pub identity: Identity,
        #[serde(default)]
        pub is_team_admin: bool,
        /// Role string supplied by the integration; the REST API has none.
        #[serde(default)]
        pub role: Option<String>,
    }

    #[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct IterationAttributes {
        #[serde(default)]
        pub start_date: Option<String>,
        #[serde(default)]
        pub finish_date: Option<String>,
        #[serde(default)]
        pub time_frame: Option<String>,
    }

    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Iteration {
        pub id: String,
        pub name: String,
        /// Iteration path used to scope work item queries.
        #[serde(default)]
        pub path: Option<String>,
        #[serde(default)]
        pub attributes: IterationAttributes,
        #[serde(default)]
        pub status: Option<String>,
    }

    impl Iteration {
        pub fn is_current(&self) -> bool {
            self.status.as_deref() == Some("active")
                || self.attributes.time_frame.as_deref() == Some("current")
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
    pub struct WorkItemReference {
        pub id: u64,
    }

    #[derive(Debug, Clone, PartialEq, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct WiqlResult {
        #[serde(default)]
        pub work_items: Vec<WorkItemReference>,
    }

    #[derive(Debug, Clone, PartialEq, Default, Deserialize)]
    pub struct WorkItemFields {
        #[serde(rename = "System.Title", default)]
        pub title: String,
        #[serde(rename = "System.State", default)]
        pub state: String,
        /// Identity object in API 7.0, a plain string in older versions.
        #[serde(rename = "System.AssignedTo", default)]
        pub assigned_to: Option<Value>,
        #[serde(rename = "Microsoft.VSTS.Scheduling.StoryPoints", default)]
        pub story_points: Option<f64>,
        #[serde(rename = "System.IterationPath", default)]
        pub iteration_path: String,
        #[serde(rename = "Microsoft.VSTS.Common.ActivatedDate", default)]
        pub activated_date: Option<String>,
        #[serde(rename = "Microsoft.VSTS.Common.ClosedDate", default)]
        pub closed_date: Option<String>,
    }

    #[derive(Debug, Clone, PartialEq, Deserialize)]
    pub struct WorkItem {
        pub id: u64,
        #[serde(default)]
        pub fields: WorkItemFields,
    }

    /// Team enriched with members, current iteration and metrics.
    #[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct TeamPayload {
        pub id: String,
        pub name: String,
        #[serde(default)]
        pub description: Option<String>,
        #[serde(default)]
        pub members: Option<Vec<Member>>,
        #[serde(default)]
        pub sprint: Option<Iteration>,
        #[serde(default)]
        pub metrics: Option<MetricsPayload>,
    }

    impl TeamPayload {
        pub fn from_team(team: &Team) -> Self {
            Self {
                id: team.id.clone(),
                name: team.name.clone(),
                description: team.description.clone(),
                ..Self::default()
            }
        }
    }
}

pub mod jira {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Project {
        pub id: String,
        pub key: String,
        #[serde(default)]
        pub name: String,
    }

    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Board {
        pub id: u64,
        pub name: String,
        #[serde(rename = "type", default)]
        pub board_type: Option<String>,
    }

    /// Page of an agile API listing.
    #[derive(Debug, Clone, PartialEq, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Page<T> {
        #[serde(default = "Vec::new")]
        pub values: Vec<T>,
        #[serde(default)]
        pub is_last: Option<bool>,
    }

    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct User {
        pub account_id: String,
        #[serde(default)]
        pub display_name: String,
        #[serde(default)]
        pub email_address: Option<String>,
        #[serde(default)]
        pub avatar_urls: HashMap<String, String>,
        #[serde(default = "default_true")]
        pub active: bool,
        /// Role string supplied by the integration; Jira itself has none.
        #[serde(default)]
        pub role: Option<String>,
    }

    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Sprint {
        pub id: u64,
        pub name: String,
        #[serde(default)]
        pub state: String,
        #[serde(default)]
        pub start_date: Option<String>,
        #[serde(default)]
        pub end_date: Option<String>,
        #[serde(default)]
        pub goal: Option<String>,
    }

    #[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct StatusCategory {
        #[serde(default)]
        pub key: String,
    }

    #[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Status {
        #[serde(default)]
        pub name: String,
        #[serde(default)]
        pub status_category: StatusCategory,
    }

    #[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Assignee {
        #[serde(default)]
        pub display_name: String,
    }

    #[derive(Debug, Clone, PartialEq, Default, Deserialize)]
    pub struct IssueFields {
        #[serde(default)]
        pub summary: String,
        #[serde(default)]
        pub status: Status,
        #[serde(default)]
        pub assignee: Option<Assignee>,
        #[serde(default)]
        pub resolutiondate: Option<String>,
        /// Custom fields, including the story point estimate.
        #[serde(flatten)]
        pub extra: HashMap<String, Value>,
    }

    #[derive(Debug, Clone, PartialEq, Deserialize)]
    pub struct Issue {
        pub id: String,
        #[serde(default)]
        pub key: String,
        #[serde(default)]
        pub fields: IssueFields,
    }

    #[derive(Debug, Clone, PartialEq, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct IssuePage {
        #[serde(default)]
        pub issues: Vec<Issue>,
        #[serde(default)]
        pub total: Option<u64>,
    }

    /// Board enriched with members, active sprint and metrics.
    #[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct TeamPayload {
        pub id: String,
        pub name: String,
        #[serde(default)]
        pub description: Option<String>,
        #[serde(default)]
        pub members: Option<Vec<User>>,
        #[serde(default)]
        pub sprint: Option<Sprint>,
        #[serde(default)]
        pub metrics: Option<MetricsPayload>,
    }

    impl TeamPayload {
        pub fn from_board(board: &Board) -> Self {
            Self {
                id: board.id.to_string(),
                name: board.name.clone(),
                description: board.board_type.as_ref().map(|kind| format!("{kind} board")),
                ..Self::default()
            }
        }
    }

    fn default_true() -> bool {
        true
    }
}
