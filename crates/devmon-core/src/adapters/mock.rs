//! Deterministic adapter used when no tracker credentials are configured.
//!
//! The dataset is shaped like Azure DevOps responses and goes through the same
//! normalizer as live data. Each call sleeps for a fixed latency so callers
//! exercise their loading paths; [`MockLatency::none`] disables that.

use std::time::Duration;

use futures::future::join_all;

use crate::normalize::{
    normalize_azure_devops_iteration, normalize_azure_devops_member, normalize_azure_devops_team,
};
use crate::payload::azure_devops::{
    Identity, Iteration, IterationAttributes, Member as AzureMember, Team as AzureTeam, TeamPayload,
};
use crate::payload::MetricsPayload;
use crate::team_source::{SourceFuture, TeamSource};
use crate::{Member, SourceId, Sprint, Team, TeamMetrics};

/// Artificial per-call delays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockLatency {
    pub teams: Duration,
    pub members: Duration,
    pub sprint: Duration,
}

impl Default for MockLatency {
    fn default() -> Self {
        Self {
            teams: Duration::from_millis(1_000),
            members: Duration::from_millis(500),
            sprint: Duration::from_millis(300),
        }
    }
}

impl MockLatency {
    pub const fn none() -> Self {
        Self {
            teams: Duration::ZERO,
            members: Duration::ZERO,
            sprint: Duration::ZERO,
        }
    }
}

/// Sample data standing in for a tracker.
#[derive(Debug, Clone)]
pub struct MockAdapter {
    source: SourceId,
    latency: MockLatency,
}

impl Default for MockAdapter {
    fn default() -> Self {
        Self::new(SourceId::AzureDevOps)
    }
}

impl MockAdapter {
    /// Mock reporting its teams under `source`.
    pub fn new(source: SourceId) -> Self {
        Self {
            source,
            latency: MockLatency::default(),
        }
    }

    pub fn with_latency(mut self, latency: MockLatency) -> Self {
        self.latency = latency;
        self
    }

    pub const fn latency(&self) -> MockLatency {
        self.latency
    }

    async fn pause(duration: Duration) {
        if !duration.is_zero() {
            tokio::time::sleep(duration).await;
        }
    }

    async fn raw_teams(&self) -> Vec<AzureTeam> {
        Self::pause(self.latency.teams).await;
        sample_teams()
    }

    async fn raw_members(&self, team_id: &str) -> Vec<AzureMember> {
        Self::pause(self.latency.members).await;
        sample_members(team_id)
    }

    async fn raw_sprint(&self, team_id: &str) -> Option<(Iteration, MetricsPayload)> {
        Self::pause(self.latency.sprint).await;
        sample_sprint(team_id)
    }

    async fn team_payload(&self, team: &AzureTeam) -> TeamPayload {
        let (members, sprint) = tokio::join!(self.raw_members(&team.id), self.raw_sprint(&team.id));
        let (sprint, metrics) = match sprint {
            Some((iteration, metrics)) => (Some(iteration), metrics),
            None => (None, MetricsPayload::default()),
        };
        TeamPayload {
            members: Some(members),
            sprint,
            metrics: Some(metrics),
            ..TeamPayload::from_team(team)
        }
    }

    fn stamp(&self, mut team: Team) -> Team {
        team.source = self.source;
        team
    }
}

impl TeamSource for MockAdapter {
    fn id(&self) -> SourceId {
        self.source
    }

    fn teams(&self) -> SourceFuture<'_, Vec<Team>> {
        Box::pin(async move {
            let teams = self.raw_teams().await;
            let payloads = join_all(teams.iter().map(|team| self.team_payload(team))).await;
            Ok(payloads
                .into_iter()
                .map(|payload| self.stamp(normalize_azure_devops_team(payload)))
                .collect())
        })
    }

    fn team<'a>(&'a self, team_id: &'a str) -> SourceFuture<'a, Option<Team>> {
        Box::pin(async move {
            let teams = self.raw_teams().await;
            let Some(team) = teams.iter().find(|team| team.id == team_id) else {
                return Ok(None);
            };
            let payload = self.team_payload(team).await;
            Ok(Some(self.stamp(normalize_azure_devops_team(payload))))
        })
    }

    fn team_members<'a>(&'a self, team_id: &'a str) -> SourceFuture<'a, Vec<Member>> {
        Box::pin(async move {
            let members = self.raw_members(team_id).await;
            Ok(members.into_iter().map(normalize_azure_devops_member).collect())
        })
    }

    fn current_sprint<'a>(&'a self, team_id: &'a str) -> SourceFuture<'a, Option<Sprint>> {
        Box::pin(async move {
            Ok(self
                .raw_sprint(team_id)
                .await
                .map(|(iteration, metrics)| normalize_azure_devops_iteration(iteration, &metrics)))
        })
    }

    fn team_metrics<'a>(&'a self, team_id: &'a str) -> SourceFuture<'a, TeamMetrics> {
        Box::pin(async move {
            let team = AzureTeam {
                id: team_id.to_owned(),
                name: String::new(),
                description: None,
                url: None,
            };
            let payload = self.team_payload(&team).await;
            Ok(normalize_azure_devops_team(payload).metrics)
        })
    }

    fn check_connection(&self) -> SourceFuture<'_, ()> {
        Box::pin(async { Ok(()) })
    }
}

fn sample_teams() -> Vec<AzureTeam> {
    [
        ("ciro-irp-1", "ciro - IRP 1", "Infrastructure and Reliability Platform Team 1"),
        ("ciro-irp-2", "ciro - IRP 2", "Infrastructure and Reliability Platform Team 2"),
    ]
    .into_iter()
    .map(|(id, name, description)| AzureTeam {
        id: id.to_owned(),
        name: name.to_owned(),
        description: Some(description.to_owned()),
        url: Some(format!(
            "https://dev.azure.com/mock-org/mock-project/_apis/teams/{id}"
        )),
    })
    .collect()
}

fn sample_members(team_id: &str) -> Vec<AzureMember> {
    let roster: &[(u32, &str, &str, &str)] = match team_id {
        "ciro-irp-1" => &[
            (1, "Sarah", "Johnson", "scrum_master"),
            (2, "Mike", "Chen", "backend_developer"),
            (3, "Emily", "Rodriguez", "test_engineer"),
            (4, "David", "Kim", "ui_ux_designer"),
        ],
        "ciro-irp-2" => &[
            (5, "Alex", "Thompson", "lead"),
            (6, "Lisa", "Wang", "product_owner"),
            (7, "James", "Wilson", "frontend_developer"),
            (8, "Maria", "Garcia", "qa"),
        ],
        _ => &[],
    };

    roster
        .iter()
        .map(|(id, first, last, role)| AzureMember {
            identity: Identity {
                id: id.to_string(),
                display_name: format!("{first} {last}"),
                unique_name: format!(
                    "{}.{}@company.com",
                    first.to_ascii_lowercase(),
                    last.to_ascii_lowercase()
                ),
                image_url: Some(format!(
                    "https://api.dicebear.com/7.x/avataaars/svg?seed={first}"
                )),
                descriptor: Some(format!("aad.{}", 1_234_567_889 + id)),
            },
            is_team_admin: *role == "scrum_master" || *role == "lead",
            role: Some((*role).to_owned()),
        })
        .collect()
}

fn sample_sprint(team_id: &str) -> Option<(Iteration, MetricsPayload)> {
    let (id, name, start, end, metrics) = match team_id {
        "ciro-irp-1" => (
            "sprint-15",
            "Sprint 15",
            "2024-01-15",
            "2024-01-29",
            MetricsPayload {
                velocity: Some(28.0),
                active_stories: Some(5),
                average_cycle_time: Some(3.2),
                sprint_progress: None,
                planned_points: Some(40.0),
                completed_points: Some(28.0),
            },
        ),
        "ciro-irp-2" => (
            "sprint-12",
            "Sprint 12",
            "2024-01-01",
            "2024-01-15",
            MetricsPayload {
                velocity: Some(21.0),
                active_stories: Some(4),
                average_cycle_time: Some(2.8),
                sprint_progress: None,
                planned_points: Some(34.0),
                completed_points: Some(21.0),
            },
        ),
        _ => return None,
    };

    let iteration = Iteration {
        id: id.to_owned(),
        name: name.to_owned(),
        path: Some(format!("mock-project\\{name}")),
        attributes: IterationAttributes {
            start_date: Some(start.to_owned()),
            finish_date: Some(end.to_owned()),
            time_frame: Some(String::from("current")),
        },
        status: Some(String::from("active")),
    };
    Some((iteration, metrics))
}
