//! Conversion of tracker payloads into the shared domain model.
//!
//! Every function here is pure and total: absent or malformed fields degrade
//! to empty collections, `None` or zero instead of failing the whole team.

use serde_json::Value;
use time::format_description::well_known::Rfc3339;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::OffsetDateTime;

use crate::payload::{azure_devops, jira, MetricsPayload};
use crate::{
    parse_sprint_date, Member, MemberRole, SourceId, Sprint, SprintStatus, Team, TeamMetrics,
    WorkItem,
};

/// Normalizes an enriched Azure DevOps team.
pub fn normalize_azure_devops_team(payload: azure_devops::TeamPayload) -> Team {
    let metrics = payload.metrics.unwrap_or_default();
    let sprint = payload
        .sprint
        .map(|iteration| normalize_azure_devops_iteration(iteration, &metrics));
    let members = payload
        .members
        .unwrap_or_default()
        .into_iter()
        .map(normalize_azure_devops_member)
        .collect();

    Team {
        id: payload.id,
        name: payload.name,
        description: payload.description,
        members,
        metrics: team_metrics(&metrics, sprint.as_ref()),
        sprint,
        source: SourceId::AzureDevOps,
    }
}

pub fn normalize_azure_devops_member(member: azure_devops::Member) -> Member {
    let role = match member.role.as_deref() {
        Some(role) => MemberRole::from_source_role(role),
        None if member.is_team_admin => MemberRole::Lead,
        None => MemberRole::Developer,
    };
    let identity = member.identity;
    Member::new(
        identity.id,
        identity.display_name,
        identity.unique_name,
        role,
    )
    .with_avatar(identity.image_url)
}

/// Builds a sprint from an iteration. Point totals come from the metrics the
/// client computed over the iteration's work items.
pub fn normalize_azure_devops_iteration(
    iteration: azure_devops::Iteration,
    metrics: &MetricsPayload,
) -> Sprint {
    let status = if iteration.is_current() {
        SprintStatus::Active
    } else {
        iteration
            .attributes
            .time_frame
            .as_deref()
            .or(iteration.status.as_deref())
            .map(SprintStatus::from_source)
            .unwrap_or(SprintStatus::Future)
    };

    Sprint {
        id: iteration.id,
        name: iteration.name,
        start_date: optional_date(iteration.attributes.start_date.as_deref()),
        end_date: optional_date(iteration.attributes.finish_date.as_deref()),
        status,
        velocity: metrics.velocity.unwrap_or(0.0),
        planned_points: metrics.planned_points.unwrap_or(0.0),
        completed_points: completed_points(metrics),
    }
}

pub fn normalize_azure_devops_work_item(item: azure_devops::WorkItem) -> WorkItem {
    let fields = item.fields;
    WorkItem {
        id: item.id,
        title: fields.title,
        state: fields.state,
        assigned_to: fields.assigned_to.as_ref().and_then(display_name),
        story_points: fields.story_points,
        iteration_path: fields.iteration_path,
        activated_at: optional_timestamp(fields.activated_date.as_deref()),
        closed_at: optional_timestamp(fields.closed_date.as_deref()),
    }
}

/// Normalizes an enriched Jira board.
pub fn normalize_jira_team(payload: jira::TeamPayload) -> Team {
    let metrics = payload.metrics.unwrap_or_default();
    let sprint = payload
        .sprint
        .map(|sprint| normalize_jira_sprint(sprint, &metrics));
    let members = payload
        .members
        .unwrap_or_default()
        .into_iter()
        .map(normalize_jira_user)
        .collect();

    Team {
        id: payload.id,
        name: payload.name,
        description: payload.description,
        members,
        metrics: team_metrics(&metrics, sprint.as_ref()),
        sprint,
        source: SourceId::Jira,
    }
}

pub fn normalize_jira_user(user: jira::User) -> Member {
    let role = user
        .role
        .as_deref()
        .map(MemberRole::from_source_role)
        .unwrap_or_default();
    let avatar = user.avatar_urls.get("48x48").cloned();
    let mut member = Member::new(
        user.account_id,
        user.display_name,
        user.email_address.unwrap_or_default(),
        role,
    )
    .with_avatar(avatar);
    member.is_active = user.active;
    member
}

pub fn normalize_jira_sprint(sprint: jira::Sprint, metrics: &MetricsPayload) -> Sprint {
    Sprint {
        id: sprint.id.to_string(),
        name: sprint.name,
        start_date: optional_date(sprint.start_date.as_deref()),
        end_date: optional_date(sprint.end_date.as_deref()),
        status: SprintStatus::from_source(&sprint.state),
        velocity: metrics.velocity.unwrap_or(0.0),
        planned_points: metrics.planned_points.unwrap_or(0.0),
        completed_points: completed_points(metrics),
    }
}

/// Reduces a Jira issue to a work item. `story_points_field` names the custom
/// field holding the estimate.
///
/// Jira exposes no activation timestamp without the changelog, so
/// `activated_at` stays empty and cycle time is not computed for Jira.
pub fn normalize_jira_issue(issue: jira::Issue, story_points_field: &str) -> WorkItem {
    let fields = issue.fields;
    let story_points = fields.extra.get(story_points_field).and_then(Value::as_f64);
    WorkItem {
        id: issue.id.parse().unwrap_or_default(),
        title: fields.summary,
        state: fields.status.name,
        assigned_to: fields.assignee.map(|assignee| assignee.display_name),
        story_points,
        iteration_path: issue.key,
        activated_at: None,
        closed_at: optional_timestamp(fields.resolutiondate.as_deref()),
    }
}

fn team_metrics(metrics: &MetricsPayload, sprint: Option<&Sprint>) -> TeamMetrics {
    // A present sprint is authoritative, even with nothing planned.
    let sprint_progress = match sprint {
        Some(sprint) => sprint.progress(),
        None => metrics.sprint_progress.unwrap_or(0),
    };

    TeamMetrics {
        velocity: metrics.velocity.unwrap_or(0.0),
        active_stories: metrics.active_stories.unwrap_or(0),
        average_cycle_time_days: metrics.average_cycle_time,
        sprint_progress,
    }
}

// Completed story points and velocity are the same quantity within a sprint.
fn completed_points(metrics: &MetricsPayload) -> f64 {
    metrics
        .completed_points
        .or(metrics.velocity)
        .unwrap_or(0.0)
}

fn optional_date(raw: Option<&str>) -> Option<time::Date> {
    raw.and_then(|raw| parse_sprint_date(raw).ok())
}

/// Jira timestamps carry a colon-less offset, e.g. `2024-01-10T12:00:00.000+0000`.
const JIRA_TIMESTAMP: &[BorrowedFormatItem<'static>] = format_description!(
    "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond][offset_hour sign:mandatory][offset_minute]"
);

fn optional_timestamp(raw: Option<&str>) -> Option<OffsetDateTime> {
    raw.and_then(|raw| {
        OffsetDateTime::parse(raw, &Rfc3339)
            .or_else(|_| OffsetDateTime::parse(raw, JIRA_TIMESTAMP))
            .ok()
    })
}

fn display_name(value: &Value) -> Option<String> {
    match value {
        Value::String(name) => Some(name.clone()),
        Value::Object(identity) => identity
            .get("displayName")
            .and_then(Value::as_str)
            .map(str::to_owned),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use time::macros::{date, datetime};

    fn azure_payload(value: Value) -> azure_devops::TeamPayload {
        serde_json::from_value(value).expect("payload parses")
    }

    #[test]
    fn azure_team_with_missing_members_and_sprint_normalizes_to_empty() {
        let team = normalize_azure_devops_team(azure_payload(json!({
            "id": "team-1",
            "name": "Platform"
        })));

        assert_eq!(team.source, SourceId::AzureDevOps);
        assert!(team.members.is_empty());
        assert!(team.sprint.is_none());
        assert_eq!(team.metrics, TeamMetrics::zero());
    }

    #[test]
    fn azure_team_maps_members_sprint_and_progress() {
        let team = normalize_azure_devops_team(azure_payload(json!({
            "id": "team-1",
            "name": "Platform",
            "description": "Platform team",
            "members": [
                {
                    "identity": {
                        "id": "m-1",
                        "displayName": "Sarah Johnson",
                        "uniqueName": "sarah.johnson@company.com",
                        "imageUrl": "https://avatars.test/sarah"
                    },
                    "isTeamAdmin": true
                },
                {
                    "identity": { "id": "m-2", "displayName": "Mike Chen", "uniqueName": "mike.chen@company.com" },
                    "role": "test_engineer"
                },
                {
                    "identity": { "id": "m-3", "displayName": "Emily Rodriguez", "uniqueName": "emily@company.com" }
                }
            ],
            "sprint": {
                "id": "it-15",
                "name": "Sprint 15",
                "attributes": {
                    "startDate": "2024-01-15T00:00:00Z",
                    "finishDate": "2024-01-29T00:00:00Z",
                    "timeFrame": "current"
                }
            },
            "metrics": {
                "velocity": 18.0,
                "activeStories": 4,
                "plannedPoints": 40.0,
                "sprintProgress": 99
            }
        })));

        let roles = team.members.iter().map(|m| m.role).collect::<Vec<_>>();
        assert_eq!(
            roles,
            vec![MemberRole::Lead, MemberRole::Qa, MemberRole::Developer]
        );
        assert_eq!(
            team.members[0].avatar_url.as_deref(),
            Some("https://avatars.test/sarah")
        );

        let sprint = team.sprint.expect("sprint present");
        assert_eq!(sprint.status, SprintStatus::Active);
        assert_eq!(sprint.start_date, Some(date!(2024 - 01 - 15)));
        assert_eq!(sprint.end_date, Some(date!(2024 - 01 - 29)));
        assert_eq!(sprint.completed_points, 18.0);

        // 18 / 40 = 45%, recomputed from the sprint rather than the payload.
        assert_eq!(team.metrics.sprint_progress, 45);
        assert_eq!(team.metrics.active_stories, 4);
    }

    #[test]
    fn sprint_with_nothing_planned_reports_zero_progress() {
        let team = normalize_azure_devops_team(azure_payload(json!({
            "id": "team-1",
            "name": "Platform",
            "sprint": { "id": "it-15", "name": "Sprint 15", "attributes": { "timeFrame": "current" } },
            "metrics": { "velocity": 0.0, "plannedPoints": 0.0, "sprintProgress": 70 }
        })));

        let sprint = team.sprint.as_ref().expect("sprint present");
        assert_eq!(sprint.progress(), 0);
        assert_eq!(team.metrics.sprint_progress, 0);
    }

    #[test]
    fn payload_progress_is_kept_without_a_sprint() {
        let team = normalize_azure_devops_team(azure_payload(json!({
            "id": "team-1",
            "name": "Platform",
            "metrics": { "sprintProgress": 70 }
        })));

        assert!(team.sprint.is_none());
        assert_eq!(team.metrics.sprint_progress, 70);
    }

    #[test]
    fn malformed_sprint_dates_become_none() {
        let team = normalize_azure_devops_team(azure_payload(json!({
            "id": "team-1",
            "name": "Platform",
            "sprint": {
                "id": "it-1",
                "name": "Sprint 1",
                "attributes": { "startDate": "next week", "timeFrame": "future" }
            }
        })));

        let sprint = team.sprint.expect("sprint present");
        assert_eq!(sprint.start_date, None);
        assert_eq!(sprint.end_date, None);
        assert_eq!(sprint.status, SprintStatus::Future);
        assert_eq!(team.metrics.sprint_progress, 0);
    }

    #[test]
    fn azure_work_item_reads_identity_and_timestamps() {
        let item: azure_devops::WorkItem = serde_json::from_value(json!({
            "id": 42,
            "fields": {
                "System.Title": "Rotate certificates",
                "System.State": "Done",
                "System.AssignedTo": { "displayName": "Mike Chen" },
                "Microsoft.VSTS.Scheduling.StoryPoints": 5.0,
                "System.IterationPath": "Platform\\Sprint 15",
                "Microsoft.VSTS.Common.ActivatedDate": "2024-01-16T10:00:00Z",
                "Microsoft.VSTS.Common.ClosedDate": "2024-01-18T10:00:00Z"
            }
        }))
        .expect("work item parses");

        let item = normalize_azure_devops_work_item(item);
        assert_eq!(item.assigned_to.as_deref(), Some("Mike Chen"));
        assert_eq!(item.story_points, Some(5.0));
        assert!(item.activated_at.is_some());
        assert!(item.closed_at.is_some());
    }

    #[test]
    fn jira_board_normalizes_users_and_sprint() {
        let payload: jira::TeamPayload = serde_json::from_value(json!({
            "id": "84",
            "name": "DEV board",
            "members": [
                {
                    "accountId": "acc-1",
                    "displayName": "Lisa Wang",
                    "emailAddress": "lisa.wang@company.com",
                    "avatarUrls": { "48x48": "https://avatars.test/lisa" },
                    "active": false,
                    "role": "product_owner"
                },
                { "accountId": "acc-2", "displayName": "James Wilson" }
            ],
            "sprint": {
                "id": 7,
                "name": "DEV Sprint 7",
                "state": "active",
                "startDate": "2024-01-01T09:00:00.000Z",
                "endDate": "2024-01-15T09:00:00.000Z"
            },
            "metrics": { "velocity": 10.0, "plannedPoints": 20.0, "completedPoints": 10.0 }
        }))
        .expect("payload parses");

        let team = normalize_jira_team(payload);
        assert_eq!(team.source, SourceId::Jira);
        assert_eq!(team.members[0].role, MemberRole::Product);
        assert!(!team.members[0].is_active);
        assert_eq!(team.members[1].email, "");
        assert_eq!(team.members[1].role, MemberRole::Developer);

        let sprint = team.sprint.as_ref().expect("sprint present");
        assert_eq!(sprint.id, "7");
        assert_eq!(sprint.status, SprintStatus::Active);
        assert_eq!(team.metrics.sprint_progress, 50);
    }

    #[test]
    fn jira_issue_reads_the_configured_story_points_field() {
        let issue: jira::Issue = serde_json::from_value(json!({
            "id": "10001",
            "key": "DEV-1",
            "fields": {
                "summary": "Add login",
                "status": { "name": "Done" },
                "customfield_10016": 3.0,
                "customfield_10028": 8.0,
                "resolutiondate": "2024-01-10T12:00:00.000+0000"
            }
        }))
        .expect("issue parses");

        let item = normalize_jira_issue(issue.clone(), "customfield_10028");
        assert_eq!(item.id, 10001);
        assert_eq!(item.story_points, Some(8.0));
        assert_eq!(item.activated_at, None);
        assert_eq!(item.closed_at, Some(datetime!(2024-01-10 12:00:00 UTC)));

        let item = normalize_jira_issue(issue, "customfield_99999");
        assert_eq!(item.story_points, None);
    }
}
