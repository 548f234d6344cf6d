use std::sync::Arc;

use futures::future::{join_all, try_join_all};
use serde_json::json;
use tracing::{debug, warn};

use crate::adapters::{fetch_json, metrics_for};
use crate::config::AzureDevOpsConfig;
use crate::http_client::{HttpAuth, HttpClient, HttpRequest, DEFAULT_TIMEOUT_MS};
use crate::normalize::{
    normalize_azure_devops_iteration, normalize_azure_devops_member,
    normalize_azure_devops_team, normalize_azure_devops_work_item,
};
use crate::payload::azure_devops::{
    Iteration, Member as AzureMember, Team as AzureTeam, TeamPayload, WiqlResult,
    WorkItem as AzureWorkItem,
};
use crate::payload::{MetricsPayload, ValueList};
use crate::team_source::{SourceError, SourceFuture, TeamSource};
use crate::{Member, SourceId, Sprint, Team, TeamMetrics, WorkItem, WorkItemStates};

const API_VERSION: &str = "7.0";
/// Upper bound on ids per work item batch request.
const WORK_ITEM_BATCH_SIZE: usize = 200;

/// Members, current iteration and metrics of one team.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AzureDevOpsTeamData {
    pub members: Vec<AzureMember>,
    pub sprint: Option<Iteration>,
    pub metrics: MetricsPayload,
}

impl AzureDevOpsTeamData {
    pub fn into_payload(self, team: &AzureTeam) -> TeamPayload {
        TeamPayload {
            members: Some(self.members),
            sprint: self.sprint,
            metrics: Some(self.metrics),
            ..TeamPayload::from_team(team)
        }
    }
}

/// Azure DevOps REST client scoped to one organization and project.
#[derive(Clone)]
pub struct AzureDevOpsClient {
    http_client: Arc<dyn HttpClient>,
    config: AzureDevOpsConfig,
    auth: HttpAuth,
    states: WorkItemStates,
    timeout_ms: u64,
}

impl AzureDevOpsClient {
    pub fn new(config: AzureDevOpsConfig, http_client: Arc<dyn HttpClient>) -> Self {
        let auth = HttpAuth::personal_access_token(config.personal_access_token.clone());
        Self {
            http_client,
            config,
            auth,
            states: WorkItemStates::default(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }

    pub fn with_work_item_states(mut self, states: WorkItemStates) -> Self {
        self.states = states;
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn config(&self) -> &AzureDevOpsConfig {
        &self.config
    }

    fn url(&self, endpoint: &str) -> String {
        format!(
            "{}/{}/{}/_apis{endpoint}",
            self.config.base_url,
            urlencoding::encode(&self.config.organization),
            urlencoding::encode(&self.config.project),
        )
    }

    fn request(&self, request: HttpRequest) -> HttpRequest {
        request
            .with_auth(&self.auth)
            .with_header("content-type", "application/json")
            .with_timeout_ms(self.timeout_ms)
    }

    async fn get<T: serde::de::DeserializeOwned>(&self, endpoint: &str) -> Result<T, SourceError> {
        let request = self.request(HttpRequest::get(self.url(endpoint)));
        fetch_json(self.http_client.as_ref(), SourceId::AzureDevOps, request).await
    }

    /// Cheapest authenticated call: reads the configured project.
    pub async fn verify_project(&self) -> Result<(), SourceError> {
        let url = format!(
            "{}/{}/_apis/projects/{}?api-version={API_VERSION}",
            self.config.base_url,
            urlencoding::encode(&self.config.organization),
            urlencoding::encode(&self.config.project),
        );
        let request = self.request(HttpRequest::get(url));
        fetch_json::<serde_json::Value>(self.http_client.as_ref(), SourceId::AzureDevOps, request)
            .await
            .map(|_| ())
    }

    pub async fn list_teams(&self) -> Result<Vec<AzureTeam>, SourceError> {
        let list: ValueList<AzureTeam> = self.get(&format!("/teams?api-version={API_VERSION}")).await?;
        Ok(list.value)
    }

    pub async fn list_team_members(&self, team_id: &str) -> Result<Vec<AzureMember>, SourceError> {
        let list: ValueList<AzureMember> = self
            .get(&format!(
                "/teams/{}/members?api-version={API_VERSION}",
                urlencoding::encode(team_id)
            ))
            .await?;
        Ok(list.value)
    }

    /// First iteration reported as active or in the current time frame.
    pub async fn current_sprint(&self, team_id: &str) -> Result<Option<Iteration>, SourceError> {
        let list: ValueList<Iteration> = self
            .get(&format!(
                "/work/teamsettings/iterations?api-version={API_VERSION}&teamId={}",
                urlencoding::encode(team_id)
            ))
            .await?;
        Ok(list.value.into_iter().find(Iteration::is_current))
    }

    /// Work items of type User Story, Bug or Task in `iteration_path`.
    pub async fn list_sprint_work_items(
        &self,
        team_id: &str,
        iteration_path: &str,
    ) -> Result<Vec<WorkItem>, SourceError> {
        let query = format!(
            "SELECT [System.Id], [System.Title], [System.State], [System.AssignedTo], \
             [Microsoft.VSTS.Scheduling.StoryPoints], [System.IterationPath] \
             FROM WorkItems \
             WHERE [System.TeamProject] = '{}' \
             AND [System.IterationPath] = '{}' \
             AND [System.WorkItemType] IN ('User Story', 'Bug', 'Task')",
            escape_wiql(&self.config.project),
            escape_wiql(iteration_path),
        );
        let request = self
            .request(HttpRequest::post(self.url(&format!("/wit/wiql?api-version={API_VERSION}"))))
            .with_json_body(&json!({ "query": query }));
        let result: WiqlResult =
            fetch_json(self.http_client.as_ref(), SourceId::AzureDevOps, request).await?;

        let ids = result.work_items.iter().map(|item| item.id).collect::<Vec<_>>();
        debug!(team_id, iteration_path, count = ids.len(), "wiql query matched work items");
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let batches = try_join_all(ids.chunks(WORK_ITEM_BATCH_SIZE).map(|chunk| {
            let ids = chunk
                .iter()
                .map(u64::to_string)
                .collect::<Vec<_>>()
                .join(",");
            async move {
                let list: ValueList<AzureWorkItem> = self
                    .get(&format!("/wit/workitems?ids={ids}&api-version={API_VERSION}"))
                    .await?;
                Ok::<_, SourceError>(list.value)
            }
        }))
        .await?;

        Ok(batches
            .into_iter()
            .flatten()
            .map(normalize_azure_devops_work_item)
            .collect())
    }

    /// Sum of story points over completed work items in the iteration.
    pub async fn calculate_team_velocity(
        &self,
        team_id: &str,
        iteration_path: &str,
    ) -> Result<f64, SourceError> {
        let items = self.list_sprint_work_items(team_id, iteration_path).await?;
        Ok(self.states.velocity(&items))
    }

    async fn iteration_metrics(
        &self,
        team_id: &str,
        iteration: &Iteration,
    ) -> Result<MetricsPayload, SourceError> {
        let Some(path) = iteration.path.as_deref() else {
            return Ok(MetricsPayload::default());
        };
        let items = self.list_sprint_work_items(team_id, path).await?;
        Ok(metrics_for(&self.states, &items))
    }

    /// Members and current sprint are fetched concurrently, then the sprint's
    /// work items are reduced to metrics.
    pub async fn team_data(&self, team_id: &str) -> Result<AzureDevOpsTeamData, SourceError> {
        let (members, sprint) =
            tokio::join!(self.list_team_members(team_id), self.current_sprint(team_id));
        let members = members?;
        let sprint = sprint?;

        let metrics = match &sprint {
            Some(iteration) => self.iteration_metrics(team_id, iteration).await?,
            None => MetricsPayload::default(),
        };

        Ok(AzureDevOpsTeamData {
            members,
            sprint,
            metrics,
        })
    }

    /// Every team with its data. A team whose data cannot be fetched keeps
    /// its slot with no members, no sprint and zero metrics.
    pub async fn all_teams_data(&self) -> Result<Vec<TeamPayload>, SourceError> {
        let teams = self.list_teams().await?;
        let payloads = join_all(teams.iter().map(|team| async move {
            match self.team_data(&team.id).await {
                Ok(data) => data.into_payload(team),
                Err(error) => {
                    warn!(team = %team.name, error = %error, "failed to fetch azure devops team data");
                    TeamPayload {
                        members: Some(Vec::new()),
                        metrics: Some(MetricsPayload::default()),
                        ..TeamPayload::from_team(team)
                    }
                }
            }
        }))
        .await;
        Ok(payloads)
    }
}

fn escape_wiql(value: &str) -> String {
    value.replace('\'', "''")
}

/// [`TeamSource`] over a live Azure DevOps project.
#[derive(Clone)]
pub struct AzureDevOpsAdapter {
    client: AzureDevOpsClient,
}

impl AzureDevOpsAdapter {
    pub fn new(client: AzureDevOpsClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &AzureDevOpsClient {
        &self.client
    }
}

impl TeamSource for AzureDevOpsAdapter {
    fn id(&self) -> SourceId {
        SourceId::AzureDevOps
    }

    fn teams(&self) -> SourceFuture<'_, Vec<Team>> {
        Box::pin(async move {
            let payloads = self.client.all_teams_data().await?;
            Ok(payloads.into_iter().map(normalize_azure_devops_team).collect())
        })
    }

    fn team<'a>(&'a self, team_id: &'a str) -> SourceFuture<'a, Option<Team>> {
        Box::pin(async move {
            let teams = self.client.list_teams().await?;
            let Some(team) = teams.into_iter().find(|team| team.id == team_id) else {
                return Ok(None);
            };
            let data = self.client.team_data(&team.id).await?;
            Ok(Some(normalize_azure_devops_team(data.into_payload(&team))))
        })
    }

    fn team_members<'a>(&'a self, team_id: &'a str) -> SourceFuture<'a, Vec<Member>> {
        Box::pin(async move {
            let members = self.client.list_team_members(team_id).await?;
            Ok(members.into_iter().map(normalize_azure_devops_member).collect())
        })
    }

    fn current_sprint<'a>(&'a self, team_id: &'a str) -> SourceFuture<'a, Option<Sprint>> {
        Box::pin(async move {
            let Some(iteration) = self.client.current_sprint(team_id).await? else {
                return Ok(None);
            };
            let metrics = self.client.iteration_metrics(team_id, &iteration).await?;
            Ok(Some(normalize_azure_devops_iteration(iteration, &metrics)))
        })
    }

    fn team_metrics<'a>(&'a self, team_id: &'a str) -> SourceFuture<'a, TeamMetrics> {
        Box::pin(async move {
            let data = self.client.team_data(team_id).await?;
            let placeholder = AzureTeam {
                id: team_id.to_owned(),
                name: String::new(),
                description: None,
                url: None,
            };
            Ok(normalize_azure_devops_team(data.into_payload(&placeholder)).metrics)
        })
    }

    fn check_connection(&self) -> SourceFuture<'_, ()> {
        Box::pin(self.client.verify_project())
    }
}
