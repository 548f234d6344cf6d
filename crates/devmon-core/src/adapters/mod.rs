//! Tracker adapters.
//!
//! | Adapter | Source | Backing |
//! |---------|--------|---------|
//! | [`AzureDevOpsAdapter`] | `azure-devops` | Azure DevOps REST API 7.0 |
//! | [`JiraAdapter`] | `jira` | Jira Cloud REST v3 and Agile 1.0 |
//! | [`MockAdapter`] | either | Deterministic sample dataset |
//!
//! [`TrackerAdapter`] closes the set: it is resolved once from a
//! [`TrackerConfig`] and dispatches statically.

pub mod azure_devops;
pub mod jira;
pub mod mock;

use std::sync::Arc;

use serde::de::DeserializeOwned;

pub use azure_devops::{AzureDevOpsAdapter, AzureDevOpsClient, AzureDevOpsTeamData};
pub use jira::{JiraAdapter, JiraClient, JiraTeamData};
pub use mock::{MockAdapter, MockLatency};

use crate::config::{DevMonConfig, TrackerConfig};
use crate::http_client::{HttpClient, HttpRequest};
use crate::payload::MetricsPayload;
use crate::team_source::{SourceError, SourceFuture, TeamSource};
use crate::{Member, SourceId, Sprint, Team, TeamMetrics, WorkItem, WorkItemStates};

/// Executes `request` and decodes a JSON body, classifying every failure
/// as a [`SourceError`].
pub(crate) async fn fetch_json<T: DeserializeOwned>(
    http_client: &dyn HttpClient,
    source: SourceId,
    request: HttpRequest,
) -> Result<T, SourceError> {
    let url = request.url.clone();
    let response = http_client.execute(request).await.map_err(|error| {
        if error.is_timeout() {
            SourceError::timeout(format!("{source} request timed out: {error}"))
        } else {
            SourceError::unavailable(format!("{source} transport error: {error}"))
        }
    })?;

    if !response.is_success() {
        return Err(SourceError::from_status(source, response.status));
    }

    response.json::<T>().map_err(|error| {
        SourceError::malformed_payload(format!("{source} returned malformed JSON from {url}: {error}"))
    })
}

/// Reduces a sprint's work items to the metrics attached to a team payload.
pub(crate) fn metrics_for(states: &WorkItemStates, items: &[WorkItem]) -> MetricsPayload {
    let velocity = states.velocity(items);
    MetricsPayload {
        velocity: Some(velocity),
        active_stories: Some(states.active_story_count(items)),
        average_cycle_time: states.average_cycle_time_days(items),
        sprint_progress: None,
        planned_points: Some(states.planned_points(items)),
        completed_points: Some(velocity),
    }
}

/// Every supported tracker integration.
#[derive(Clone)]
pub enum TrackerAdapter {
    AzureDevOps(AzureDevOpsAdapter),
    Jira(JiraAdapter),
    Mock(MockAdapter),
}

impl TrackerAdapter {
    /// Builds the adapter for `tracker`, sharing `http_client` and the
    /// request settings of `config`.
    pub fn from_config(
        tracker: TrackerConfig,
        http_client: Arc<dyn HttpClient>,
        config: &DevMonConfig,
    ) -> Self {
        match tracker {
            TrackerConfig::AzureDevOps(azure) => Self::AzureDevOps(AzureDevOpsAdapter::new(
                AzureDevOpsClient::new(azure, http_client)
                    .with_work_item_states(config.work_item_states.clone())
                    .with_timeout_ms(config.request_timeout_ms()),
            )),
            TrackerConfig::Jira(jira) => Self::Jira(JiraAdapter::new(
                JiraClient::new(jira, http_client)
                    .with_work_item_states(config.work_item_states.clone())
                    .with_timeout_ms(config.request_timeout_ms()),
            )),
            TrackerConfig::Mock(source) => Self::Mock(MockAdapter::new(source)),
        }
    }

    fn inner(&self) -> &dyn TeamSource {
        match self {
            Self::AzureDevOps(adapter) => adapter,
            Self::Jira(adapter) => adapter,
            Self::Mock(adapter) => adapter,
        }
    }

    pub const fn is_mock(&self) -> bool {
        matches!(self, Self::Mock(_))
    }
}

impl TeamSource for TrackerAdapter {
    fn id(&self) -> SourceId {
        self.inner().id()
    }

    fn teams(&self) -> SourceFuture<'_, Vec<Team>> {
        self.inner().teams()
    }

    fn team<'a>(&'a self, team_id: &'a str) -> SourceFuture<'a, Option<Team>> {
        self.inner().team(team_id)
    }

    fn team_members<'a>(&'a self, team_id: &'a str) -> SourceFuture<'a, Vec<Member>> {
        self.inner().team_members(team_id)
    }

    fn current_sprint<'a>(&'a self, team_id: &'a str) -> SourceFuture<'a, Option<Sprint>> {
        self.inner().current_sprint(team_id)
    }

    fn team_metrics<'a>(&'a self, team_id: &'a str) -> SourceFuture<'a, TeamMetrics> {
        self.inner().team_metrics(team_id)
    }

    fn check_connection(&self) -> SourceFuture<'_, ()> {
        self.inner().check_connection()
    }
}
