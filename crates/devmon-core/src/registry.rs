//! Source-keyed registry of tracker adapters.
//!
//! [`TeamRegistry::all_teams`] fans out to every registered source
//! concurrently. A source that fails or exceeds the per-source timeout
//! contributes no teams and is logged; it never fails the aggregate.
//! Asking for one unregistered source is a caller error and is returned.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use serde::Serialize;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::adapters::{MockAdapter, MockLatency, TrackerAdapter};
use crate::config::{DevMonConfig, TrackerConfig, DEFAULT_SOURCE_TIMEOUT_MS};
use crate::http_client::{HttpClient, ReqwestHttpClient};
use crate::retry::RetryingHttpClient;
use crate::team_source::{SourceError, TeamSource};
use crate::{CoreError, SourceId, Team};

/// Result of one source's part in a fan-out.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceOutcome {
    pub source: SourceId,
    pub team_count: usize,
    pub latency_ms: u64,
    pub error: Option<SourceError>,
}

impl SourceOutcome {
    pub fn is_failure(&self) -> bool {
        self.error.is_some()
    }
}

/// Aggregated teams plus per-source diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct FanOutReport {
    pub teams: Vec<Team>,
    pub outcomes: Vec<SourceOutcome>,
    pub latency_ms: u64,
}

impl FanOutReport {
    pub fn failures(&self) -> impl Iterator<Item = &SourceOutcome> {
        self.outcomes.iter().filter(|outcome| outcome.is_failure())
    }

    pub fn sources(&self) -> Vec<SourceId> {
        self.outcomes.iter().map(|outcome| outcome.source).collect()
    }
}

/// Connection probe result used by the `sources` command.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceStatus {
    pub source: SourceId,
    pub mock: bool,
    pub connected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// At most one adapter per source, kept in registration order.
pub struct TeamRegistry {
    adapters: Vec<(SourceId, Arc<dyn TeamSource>)>,
    mock_sources: Vec<SourceId>,
    source_timeout: Duration,
}

impl Default for TeamRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TeamRegistry {
    pub fn new() -> Self {
        Self {
            adapters: Vec::new(),
            mock_sources: Vec::new(),
            source_timeout: Duration::from_millis(DEFAULT_SOURCE_TIMEOUT_MS),
        }
    }

    pub fn with_source_timeout(mut self, source_timeout: Duration) -> Self {
        self.source_timeout = source_timeout;
        self
    }

    pub const fn source_timeout(&self) -> Duration {
        self.source_timeout
    }

    /// Registers `adapter` under `source`, replacing any previous adapter for
    /// that source.
    pub fn register(&mut self, source: SourceId, adapter: Arc<dyn TeamSource>) {
        if let Some(slot) = self.adapters.iter_mut().find(|(id, _)| *id == source) {
            slot.1 = adapter;
        } else {
            self.adapters.push((source, adapter));
        }
        self.mock_sources.retain(|id| *id != source);
    }

    fn register_tracker(&mut self, adapter: TrackerAdapter) {
        let source = adapter.id();
        let mock = adapter.is_mock();
        self.register(source, Arc::new(adapter));
        if mock {
            self.mock_sources.push(source);
        }
    }

    pub fn registered_sources(&self) -> Vec<SourceId> {
        self.adapters.iter().map(|(source, _)| *source).collect()
    }

    pub fn is_mock(&self, source: SourceId) -> bool {
        self.mock_sources.contains(&source)
    }

    fn adapter(&self, source: SourceId) -> Result<&Arc<dyn TeamSource>, SourceError> {
        self.adapters
            .iter()
            .find(|(id, _)| *id == source)
            .map(|(_, adapter)| adapter)
            .ok_or_else(|| SourceError::not_configured(source))
    }

    async fn bounded<T>(
        &self,
        source: SourceId,
        call: impl std::future::Future<Output = Result<T, SourceError>>,
    ) -> Result<T, SourceError> {
        match tokio::time::timeout(self.source_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(SourceError::timeout(format!(
                "{source} did not answer within {} ms",
                self.source_timeout.as_millis()
            ))),
        }
    }

    /// Teams from every registered source; failed sources contribute none.
    pub async fn all_teams(&self) -> Vec<Team> {
        self.all_teams_report().await.teams
    }

    /// Same fan-out as [`all_teams`](Self::all_teams), keeping per-source
    /// latency and failures.
    pub async fn all_teams_report(&self) -> FanOutReport {
        let started = Instant::now();
        let calls = self.adapters.iter().map(|(source, adapter)| async move {
            let source_started = Instant::now();
            let result = self.bounded(*source, adapter.teams()).await;
            (*source, result, elapsed_ms(source_started))
        });
        let results = join_all(calls).await;

        let mut teams = Vec::new();
        let mut outcomes = Vec::with_capacity(results.len());
        for (source, result, latency_ms) in results {
            match result {
                Ok(source_teams) => {
                    debug!(%source, count = source_teams.len(), latency_ms, "source returned teams");
                    outcomes.push(SourceOutcome {
                        source,
                        team_count: source_teams.len(),
                        latency_ms,
                        error: None,
                    });
                    teams.extend(source_teams);
                }
                Err(error) => {
                    warn!(%source, error = %error, latency_ms, "source failed; contributing no teams");
                    outcomes.push(SourceOutcome {
                        source,
                        team_count: 0,
                        latency_ms,
                        error: Some(error),
                    });
                }
            }
        }

        FanOutReport {
            teams,
            outcomes,
            latency_ms: elapsed_ms(started),
        }
    }

    /// Teams from one source. Unlike the fan-out, the source's own failure is
    /// returned to the caller.
    pub async fn teams_by_source(&self, source: SourceId) -> Result<Vec<Team>, SourceError> {
        let adapter = self.adapter(source)?;
        self.bounded(source, adapter.teams()).await
    }

    /// [`teams_by_source`](Self::teams_by_source) keyed by a source name such
    /// as `azure-devops` or `jira`.
    pub async fn teams_by_source_name(&self, name: &str) -> Result<Vec<Team>, CoreError> {
        let source = name.parse::<SourceId>()?;
        Ok(self.teams_by_source(source).await?)
    }

    pub async fn team(&self, source: SourceId, team_id: &str) -> Result<Option<Team>, SourceError> {
        let adapter = self.adapter(source)?;
        self.bounded(source, adapter.team(team_id)).await
    }

    /// Probes every registered source concurrently.
    pub async fn check_connections(&self) -> Vec<SourceStatus> {
        let probes = self.adapters.iter().map(|(source, adapter)| async move {
            let result = self.bounded(*source, adapter.check_connection()).await;
            SourceStatus {
                source: *source,
                mock: self.is_mock(*source),
                connected: result.is_ok(),
                error: result.err().map(|error| error.to_string()),
            }
        });
        join_all(probes).await
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis().min(u128::from(u64::MAX)) as u64
}

/// Builds a [`TeamRegistry`] from configuration.
///
/// # Example
///
/// ```rust,ignore
/// use devmon_core::{DevMonConfig, TeamRegistryBuilder};
///
/// // Live adapters for every tracker with credentials in the environment.
/// let registry = TeamRegistryBuilder::new()
///     .with_config(DevMonConfig::from_env()?)
///     .build();
///
/// // Sample data only.
/// let mock = TeamRegistryBuilder::new().with_mock_mode().build();
/// ```
#[derive(Default)]
pub struct TeamRegistryBuilder {
    use_mock: bool,
    mock_latency: Option<MockLatency>,
    config: Option<DevMonConfig>,
    http_client: Option<Arc<dyn HttpClient>>,
}

impl TeamRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers mock adapters in place of every configured tracker.
    pub fn with_mock_mode(mut self) -> Self {
        self.use_mock = true;
        self
    }

    pub fn with_mock_latency(mut self, latency: MockLatency) -> Self {
        self.mock_latency = Some(latency);
        self
    }

    pub fn with_config(mut self, config: DevMonConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Transport for tracker clients; wrapped with the configured retries.
    pub fn with_http_client(mut self, http_client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(http_client);
        self
    }

    pub fn build(self) -> TeamRegistry {
        let config = self.config.unwrap_or_default();
        let mut registry = TeamRegistry::new().with_source_timeout(config.source_timeout);
        let latency = self.mock_latency.unwrap_or_default();
        let mock = |source| TrackerAdapter::Mock(MockAdapter::new(source).with_latency(latency));

        if config.trackers.is_empty() {
            if !self.use_mock {
                warn!("no tracker credentials configured; serving sample data");
            }
            registry.register_tracker(mock(SourceId::AzureDevOps));
            return registry;
        }

        if self.use_mock {
            for tracker in &config.trackers {
                registry.register_tracker(mock(tracker.source()));
            }
            return registry;
        }

        let transport = self
            .http_client
            .unwrap_or_else(|| Arc::new(ReqwestHttpClient::new()));
        let http_client: Arc<dyn HttpClient> =
            Arc::new(RetryingHttpClient::new(transport, config.retry.clone()));

        for tracker in config.trackers.iter().cloned() {
            let adapter = match tracker {
                TrackerConfig::Mock(source) => mock(source),
                live => TrackerAdapter::from_config(live, Arc::clone(&http_client), &config),
            };
            debug!(source = %adapter.id(), mock = adapter.is_mock(), "registering tracker");
            registry.register_tracker(adapter);
        }

        registry
    }
}
