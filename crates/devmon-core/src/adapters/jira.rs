use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, warn};

use crate::adapters::{fetch_json, metrics_for};
use crate::config::JiraConfig;
use crate::http_client::{HttpAuth, HttpClient, HttpRequest, DEFAULT_TIMEOUT_MS};
use crate::normalize::{normalize_jira_issue, normalize_jira_sprint, normalize_jira_team, normalize_jira_user};
use crate::payload::jira::{Board, IssuePage, Page, Project, Sprint as JiraSprint, TeamPayload, User};
use crate::payload::MetricsPayload;
use crate::team_source::{SourceError, SourceFuture, TeamSource};
use crate::{Member, SourceId, Sprint, Team, TeamMetrics, WorkItem, WorkItemStates};

const ISSUE_PAGE_SIZE: usize = 100;

/// Members, active sprint and metrics of one board.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct JiraTeamData {
    pub members: Vec<User>,
    pub sprint: Option<JiraSprint>,
    pub metrics: MetricsPayload,
}

impl JiraTeamData {
    pub fn into_payload(self, board: &Board) -> TeamPayload {
        TeamPayload {
            members: Some(self.members),
            sprint: self.sprint,
            metrics: Some(self.metrics),
            ..TeamPayload::from_board(board)
        }
    }
}

/// Jira Cloud client scoped to one project. Each agile board of the project
/// is reported as a team.
#[derive(Clone)]
pub struct JiraClient {
    http_client: Arc<dyn HttpClient>,
    config: JiraConfig,
    auth: HttpAuth,
    states: WorkItemStates,
    timeout_ms: u64,
}

impl JiraClient {
    pub fn new(config: JiraConfig, http_client: Arc<dyn HttpClient>) -> Self {
        let auth = HttpAuth::Basic {
            username: config.email.clone(),
            password: config.api_token.clone(),
        };
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

    pub fn config(&self) -> &JiraConfig {
        &self.config
    }

    async fn get<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T, SourceError> {
        let request = HttpRequest::get(format!("{}{path}", self.config.base_url))
            .with_auth(&self.auth)
            .with_header("accept", "application/json")
            .with_timeout_ms(self.timeout_ms);
        fetch_json(self.http_client.as_ref(), SourceId::Jira, request).await
    }

    fn project_key(&self) -> String {
        urlencoding::encode(&self.config.project_key).into_owned()
    }

    /// Reads the configured project; doubles as the credential check.
    pub async fn verify_project(&self) -> Result<Project, SourceError> {
        self.get(&format!("/rest/api/3/project/{}", self.project_key()))
            .await
    }

    /// Every board of the project. Pages are followed until one reports
    /// `isLast` or comes back empty; a page without `isLast` ends the listing.
    pub async fn list_boards(&self) -> Result<Vec<Board>, SourceError> {
        let base = format!("/rest/agile/1.0/board?projectKeyOrId={}", self.project_key());
        let mut boards = Vec::new();
        loop {
            let endpoint = if boards.is_empty() {
                base.clone()
            } else {
                format!("{base}&startAt={}", boards.len())
            };
            let page: Page<Board> = self.get(&endpoint).await?;
            let fetched = page.values.len();
            boards.extend(page.values);

            if fetched == 0 || page.is_last != Some(false) {
                return Ok(boards);
            }
        }
    }

    /// Users assignable to issues in the project.
    pub async fn list_members(&self) -> Result<Vec<User>, SourceError> {
        self.get(&format!(
            "/rest/api/3/user/assignable/search?project={}",
            self.project_key()
        ))
        .await
    }

    /// Active sprint of a board. Kanban boards have no sprints and answer
    /// 400, which is reported as no sprint.
    pub async fn current_sprint(&self, board_id: u64) -> Result<Option<JiraSprint>, SourceError> {
        let result: Result<Page<JiraSprint>, SourceError> = self
            .get(&format!("/rest/agile/1.0/board/{board_id}/sprint?state=active"))
            .await;
        match result {
            Ok(page) => Ok(page.values.into_iter().next()),
            Err(error) if error.status() == Some(400) => {
                debug!(board_id, "board does not support sprints");
                Ok(None)
            }
            Err(error) => Err(error),
        }
    }

    /// Every issue in a sprint, following pagination.
    pub async fn list_sprint_issues(&self, sprint_id: u64) -> Result<Vec<WorkItem>, SourceError> {
        let fields = format!(
            "summary,status,assignee,resolutiondate,{}",
            self.config.story_points_field
        );
        let mut items = Vec::new();
        loop {
            let page: IssuePage = self
                .get(&format!(
                    "/rest/agile/1.0/sprint/{sprint_id}/issue?fields={}&startAt={}&maxResults={ISSUE_PAGE_SIZE}",
                    urlencoding::encode(&fields),
                    items.len()
                ))
                .await?;
            let fetched = page.issues.len();
            items.extend(
                page.issues
                    .into_iter()
                    .map(|issue| normalize_jira_issue(issue, &self.config.story_points_field)),
            );

            let total = page.total.unwrap_or(0) as usize;
            if fetched == 0 || items.len() >= total {
                return Ok(items);
            }
        }
    }

    pub async fn calculate_team_velocity(&self, sprint_id: u64) -> Result<f64, SourceError> {
        let items = self.list_sprint_issues(sprint_id).await?;
        Ok(self.states.velocity(&items))
    }

    async fn sprint_metrics(&self, sprint_id: u64) -> Result<MetricsPayload, SourceError> {
        let items = self.list_sprint_issues(sprint_id).await?;
        Ok(metrics_for(&self.states, &items))
    }

    pub async fn team_data(&self, board_id: u64) -> Result<JiraTeamData, SourceError> {
        let (members, sprint) = tokio::join!(self.list_members(), self.current_sprint(board_id));
        let members = members?;
        let sprint = sprint?;

        let metrics = match &sprint {
            Some(sprint) => self.sprint_metrics(sprint.id).await?,
            None => MetricsPayload::default(),
        };

        Ok(JiraTeamData {
            members,
            sprint,
            metrics,
        })
    }

    /// Every board with its data; a board whose data cannot be fetched is
    /// kept with no members, no sprint and zero metrics.
    pub async fn all_teams_data(&self) -> Result<Vec<TeamPayload>, SourceError> {
        let boards = self.list_boards().await?;
        let payloads = join_all(boards.iter().map(|board| async move {
            match self.team_data(board.id).await {
                Ok(data) => data.into_payload(board),
                Err(error) => {
                    warn!(board = %board.name, error = %error, "failed to fetch jira board data");
                    TeamPayload {
                        members: Some(Vec::new()),
                        metrics: Some(MetricsPayload::default()),
                        ..TeamPayload::from_board(board)
                    }
                }
            }
        }))
        .await;
        Ok(payloads)
    }
}

/// [`TeamSource`] over a live Jira Cloud project.
#[derive(Clone)]
pub struct JiraAdapter {
    client: JiraClient,
}

impl JiraAdapter {
    pub fn new(client: JiraClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &JiraClient {
        &self.client
    }
}

fn board_id(team_id: &str) -> Result<u64, SourceError> {
    team_id
        .parse()
        .map_err(|_| SourceError::invalid_request(format!("'{team_id}' is not a jira board id")))
}

impl TeamSource for JiraAdapter {
    fn id(&self) -> SourceId {
        SourceId::Jira
    }

    fn teams(&self) -> SourceFuture<'_, Vec<Team>> {
        Box::pin(async move {
            let payloads = self.client.all_teams_data().await?;
            Ok(payloads.into_iter().map(normalize_jira_team).collect())
        })
    }

    fn team<'a>(&'a self, team_id: &'a str) -> SourceFuture<'a, Option<Team>> {
        Box::pin(async move {
            let Ok(id) = team_id.parse::<u64>() else {
                return Ok(None);
            };
            let boards = self.client.list_boards().await?;
            let Some(board) = boards.into_iter().find(|board| board.id == id) else {
                return Ok(None);
            };
            let data = self.client.team_data(board.id).await?;
            Ok(Some(normalize_jira_team(data.into_payload(&board))))
        })
    }

    fn team_members<'a>(&'a self, team_id: &'a str) -> SourceFuture<'a, Vec<Member>> {
        Box::pin(async move {
            board_id(team_id)?;
            let users = self.client.list_members().await?;
            Ok(users.into_iter().map(normalize_jira_user).collect())
        })
    }

    fn current_sprint<'a>(&'a self, team_id: &'a str) -> SourceFuture<'a, Option<Sprint>> {
        Box::pin(async move {
            let Some(sprint) = self.client.current_sprint(board_id(team_id)?).await? else {
                return Ok(None);
            };
            let metrics = self.client.sprint_metrics(sprint.id).await?;
            Ok(Some(normalize_jira_sprint(sprint, &metrics)))
        })
    }

    fn team_metrics<'a>(&'a self, team_id: &'a str) -> SourceFuture<'a, TeamMetrics> {
        Box::pin(async move {
            let id = board_id(team_id)?;
            let data = self.client.team_data(id).await?;
            let board = Board {
                id,
                name: String::new(),
                board_type: None,
            };
            Ok(normalize_jira_team(data.into_payload(&board)).metrics)
        })
    }

    fn check_connection(&self) -> SourceFuture<'_, ()> {
        Box::pin(async move {
            let project = self.client.verify_project().await?;
            debug!(project = %project.key, "jira credentials verified");
            Ok(())
        })
    }
}
