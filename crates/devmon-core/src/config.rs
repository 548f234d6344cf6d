//! Tracker and service configuration.
//!
//! Settings are read from `DEVMON_*` environment variables with the
//! conventional unprefixed name as fallback:
//!
//! | Setting | Primary Env Var | Fallback Env Var |
//! |---------|-----------------|------------------|
//! | Azure organization | `DEVMON_AZURE_DEVOPS_ORG` | `AZURE_DEVOPS_ORG` |
//! | Azure project | `DEVMON_AZURE_DEVOPS_PROJECT` | `AZURE_DEVOPS_PROJECT` |
//! | Azure PAT | `DEVMON_AZURE_DEVOPS_PAT` | `AZURE_DEVOPS_PAT` |
//! | Azure base URL | `DEVMON_AZURE_DEVOPS_BASE_URL` | - |
//! | Jira base URL | `DEVMON_JIRA_BASE_URL` | `JIRA_BASE_URL` |
//! | Jira email | `DEVMON_JIRA_EMAIL` | `JIRA_EMAIL` |
//! | Jira API token | `DEVMON_JIRA_API_TOKEN` | `JIRA_API_TOKEN` |
//! | Jira project key | `DEVMON_JIRA_PROJECT_KEY` | `JIRA_PROJECT_KEY` |
//! | Jira story points field | `DEVMON_JIRA_STORY_POINTS_FIELD` | - |
//! | Completed states | `DEVMON_COMPLETED_STATES` | - |
//! | Active states | `DEVMON_ACTIVE_STATES` | - |
//! | Request timeout (ms) | `DEVMON_REQUEST_TIMEOUT_MS` | - |
//! | Source timeout (ms) | `DEVMON_SOURCE_TIMEOUT_MS` | - |
//!
//! A tracker is configured only when all of its required settings are
//! present. Secrets never appear in `Debug` output.

use std::fmt::{Debug, Formatter};
use std::time::Duration;

use crate::http_client::DEFAULT_TIMEOUT_MS;
use crate::retry::RetryConfig;
use crate::{SourceId, ValidationError, WorkItemStates};

pub const DEFAULT_AZURE_DEVOPS_BASE_URL: &str = "https://dev.azure.com";
pub const DEFAULT_JIRA_STORY_POINTS_FIELD: &str = "customfield_10016";
pub const DEFAULT_SOURCE_TIMEOUT_MS: u64 = 30_000;

/// Connection parameters for one Azure DevOps project.
#[derive(Clone, PartialEq, Eq)]
pub struct AzureDevOpsConfig {
    pub base_url: String,
    pub organization: String,
    pub project: String,
    pub personal_access_token: String,
}

impl AzureDevOpsConfig {
    pub fn new(
        organization: impl Into<String>,
        project: impl Into<String>,
        personal_access_token: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        Self {
            base_url: DEFAULT_AZURE_DEVOPS_BASE_URL.to_owned(),
            organization: organization.into(),
            project: project.into(),
            personal_access_token: personal_access_token.into(),
        }
        .validated()
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Result<Self, ValidationError> {
        self.base_url = base_url.into();
        self.validated()
    }

    fn validated(mut self) -> Result<Self, ValidationError> {
        self.base_url = validate_base_url("base_url", &self.base_url)?;
        require("organization", &self.organization)?;
        require("project", &self.project)?;
        require("personal_access_token", &self.personal_access_token)?;
        Ok(self)
    }
}

impl Debug for AzureDevOpsConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AzureDevOpsConfig")
            .field("base_url", &self.base_url)
            .field("organization", &self.organization)
            .field("project", &self.project)
            .field("personal_access_token", &"<redacted>")
            .finish()
    }
}

/// Connection parameters for one Jira Cloud project.
#[derive(Clone, PartialEq, Eq)]
pub struct JiraConfig {
    pub base_url: String,
    pub email: String,
    pub api_token: String,
    pub project_key: String,
    /// Custom field holding story point estimates.
    pub story_points_field: String,
}

impl JiraConfig {
    pub fn new(
        base_url: impl Into<String>,
        email: impl Into<String>,
        api_token: impl Into<String>,
        project_key: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let base_url = base_url.into();
        let config = Self {
            base_url: validate_base_url("base_url", &base_url)?,
            email: email.into(),
            api_token: api_token.into(),
            project_key: project_key.into(),
            story_points_field: DEFAULT_JIRA_STORY_POINTS_FIELD.to_owned(),
        };
        require("email", &config.email)?;
        require("api_token", &config.api_token)?;
        require("project_key", &config.project_key)?;
        Ok(config)
    }

    pub fn with_story_points_field(mut self, field: impl Into<String>) -> Self {
        self.story_points_field = field.into();
        self
    }
}

impl Debug for JiraConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JiraConfig")
            .field("base_url", &self.base_url)
            .field("email", &self.email)
            .field("api_token", &"<redacted>")
            .field("project_key", &self.project_key)
            .field("story_points_field", &self.story_points_field)
            .finish()
    }
}

/// Selection of one tracker integration, resolved once at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackerConfig {
    AzureDevOps(AzureDevOpsConfig),
    Jira(JiraConfig),
    /// Deterministic sample data standing in for the given source.
    Mock(SourceId),
}

impl TrackerConfig {
    pub fn source(&self) -> SourceId {
        match self {
            Self::AzureDevOps(_) => SourceId::AzureDevOps,
            Self::Jira(_) => SourceId::Jira,
            Self::Mock(source) => *source,
        }
    }
}

/// Complete configuration for the team data layer.
#[derive(Debug, Clone, PartialEq)]
pub struct DevMonConfig {
    pub trackers: Vec<TrackerConfig>,
    pub work_item_states: WorkItemStates,
    pub request_timeout: Duration,
    /// Upper bound on one source's whole fan-out call.
    pub source_timeout: Duration,
    pub retry: RetryConfig,
}

impl Default for DevMonConfig {
    fn default() -> Self {
        Self {
            trackers: Vec::new(),
            work_item_states: WorkItemStates::default(),
            request_timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            source_timeout: Duration::from_millis(DEFAULT_SOURCE_TIMEOUT_MS),
            retry: RetryConfig::default(),
        }
    }
}

impl DevMonConfig {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> Result<Self, ValidationError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through `lookup`, which maps a variable name to
    /// its value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ValidationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |primary: &str, fallback: Option<&str>| {
            lookup(primary)
                .or_else(|| fallback.and_then(&lookup))
                .map(|value| value.trim().to_owned())
                .filter(|value| !value.is_empty())
        };

        let mut config = Self::default();

        if let (Some(organization), Some(project), Some(token)) = (
            get("DEVMON_AZURE_DEVOPS_ORG", Some("AZURE_DEVOPS_ORG")),
            get("DEVMON_AZURE_DEVOPS_PROJECT", Some("AZURE_DEVOPS_PROJECT")),
            get("DEVMON_AZURE_DEVOPS_PAT", Some("AZURE_DEVOPS_PAT")),
        ) {
            let mut azure = AzureDevOpsConfig::new(organization, project, token)?;
            if let Some(base_url) = get("DEVMON_AZURE_DEVOPS_BASE_URL", None) {
                azure = azure.with_base_url(base_url)?;
            }
            config.trackers.push(TrackerConfig::AzureDevOps(azure));
        }

        if let (Some(base_url), Some(email), Some(token), Some(project_key)) = (
            get("DEVMON_JIRA_BASE_URL", Some("JIRA_BASE_URL")),
            get("DEVMON_JIRA_EMAIL", Some("JIRA_EMAIL")),
            get("DEVMON_JIRA_API_TOKEN", Some("JIRA_API_TOKEN")),
            get("DEVMON_JIRA_PROJECT_KEY", Some("JIRA_PROJECT_KEY")),
        ) {
            let mut jira = JiraConfig::new(base_url, email, token, project_key)?;
            if let Some(field) = get("DEVMON_JIRA_STORY_POINTS_FIELD", None) {
                jira = jira.with_story_points_field(field);
            }
            config.trackers.push(TrackerConfig::Jira(jira));
        }

        if let Some(states) = get("DEVMON_COMPLETED_STATES", None) {
            config.work_item_states.completed = split_list(&states);
        }
        if let Some(states) = get("DEVMON_ACTIVE_STATES", None) {
            config.work_item_states.active = split_list(&states);
        }

        if let Some(raw) = get("DEVMON_REQUEST_TIMEOUT_MS", None) {
            config.request_timeout = parse_millis("DEVMON_REQUEST_TIMEOUT_MS", &raw)?;
        }
        if let Some(raw) = get("DEVMON_SOURCE_TIMEOUT_MS", None) {
            config.source_timeout = parse_millis("DEVMON_SOURCE_TIMEOUT_MS", &raw)?;
        }

        Ok(config)
    }

    pub fn with_tracker(mut self, tracker: TrackerConfig) -> Self {
        self.trackers.push(tracker);
        self
    }

    pub fn request_timeout_ms(&self) -> u64 {
        self.request_timeout.as_millis().min(u128::from(u64::MAX)) as u64
    }
}

fn require(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::EmptyField { field });
    }
    Ok(())
}

fn validate_base_url(field: &'static str, value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim().trim_end_matches('/');
    let host = trimmed
        .strip_prefix("https://")
        .or_else(|| trimmed.strip_prefix("http://"));
    match host {
        Some(host) if !host.is_empty() => Ok(trimmed.to_owned()),
        _ => Err(ValidationError::InvalidUrl {
            field,
            value: value.to_owned(),
        }),
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|state| !state.is_empty())
        .map(str::to_owned)
        .collect()
}

fn parse_millis(key: &'static str, raw: &str) -> Result<Duration, ValidationError> {
    raw.parse::<u64>()
        .ok()
        .filter(|millis| *millis > 0)
        .map(Duration::from_millis)
        .ok_or_else(|| ValidationError::InvalidSetting {
            key,
            value: raw.to_owned(),
        })
}
