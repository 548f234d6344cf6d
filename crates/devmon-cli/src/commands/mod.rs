mod analyze;
mod insights;
mod sources;
mod team;
mod teams;

use std::time::{Duration, Instant};

use devmon_ai::AiService;
use devmon_core::{DevMonConfig, SourceId, Team, TeamRegistry, TeamRegistryBuilder};
use serde_json::Value;
use tracing::debug;

use crate::cli::{Cli, Command, TeamSelection};
use crate::envelope::{Envelope, EnvelopeError, EnvelopeMeta};
use crate::error::CliError;

pub struct CommandResult {
    pub data: Value,
    pub warnings: Vec<String>,
    pub errors: Vec<EnvelopeError>,
    pub latency_ms: u64,
    pub sources: Vec<SourceId>,
}

impl CommandResult {
    pub fn ok(data: Value, sources: Vec<SourceId>) -> Self {
        Self {
            data,
            warnings: Vec::new(),
            errors: Vec::new(),
            latency_ms: 0,
            sources,
        }
    }

    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }

    pub fn with_warnings(mut self, warnings: Vec<String>) -> Self {
        self.warnings.extend(warnings);
        self
    }

    pub fn with_errors(mut self, errors: Vec<EnvelopeError>) -> Self {
        self.errors.extend(errors);
        self
    }

    pub fn with_latency(mut self, latency_ms: u64) -> Self {
        self.latency_ms = latency_ms;
        self
    }
}

/// Registry and AI service shared by every command.
pub struct Context {
    pub registry: TeamRegistry,
    pub ai: AiService,
}

impl Context {
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        let mut config = DevMonConfig::from_env()?;
        if let Some(timeout_ms) = cli.timeout_ms {
            if timeout_ms == 0 {
                return Err(CliError::Command(String::from(
                    "--timeout-ms must be greater than zero",
                )));
            }
            config.request_timeout = Duration::from_millis(timeout_ms);
        }
        debug!(
            trackers = config.trackers.len(),
            mock = cli.mock,
            request_timeout_ms = config.request_timeout_ms(),
            "building registry"
        );

        let mut builder = TeamRegistryBuilder::new().with_config(config);
        if cli.mock {
            builder = builder.with_mock_mode();
        }

        Ok(Self {
            registry: builder.build(),
            ai: AiService::from_env(),
        })
    }
}

pub async fn run(cli: &Cli) -> Result<Envelope<Value>, CliError> {
    let context = Context::from_cli(cli)?;
    run_with(cli, &context).await
}

pub async fn run_with(cli: &Cli, context: &Context) -> Result<Envelope<Value>, CliError> {
    let command_result = match &cli.command {
        Command::Teams(args) => teams::run(args, &context.registry).await?,
        Command::Team(args) => team::run(args, &context.registry).await?,
        Command::Sources => sources::run(&context.registry).await?,
        Command::Analyze(args) => analyze::run(args, context).await?,
        Command::Insights(args) => insights::run(args, context).await?,
    };

    let CommandResult {
        data,
        mut warnings,
        errors,
        latency_ms,
        sources,
    } = command_result;

    if cli.mock {
        warnings.insert(0, String::from("serving sample data (--mock)"));
    }

    let mut meta = EnvelopeMeta::new(sources, latency_ms);
    for warning in warnings {
        meta.push_warning(warning);
    }

    Ok(Envelope { meta, data, errors })
}

/// Teams picked by a [`TeamSelection`], with the errors met on the way.
pub(crate) struct SelectedTeams {
    pub teams: Vec<Team>,
    pub sources: Vec<SourceId>,
    pub errors: Vec<EnvelopeError>,
    pub latency_ms: u64,
}

pub(crate) async fn select_teams(
    selection: &TeamSelection,
    registry: &TeamRegistry,
) -> Result<SelectedTeams, CliError> {
    let started = Instant::now();

    let Some(source) = selection.source.map(SourceId::from) else {
        let report = registry.all_teams_report().await;
        let errors = report
            .failures()
            .filter_map(|outcome| {
                outcome
                    .error
                    .as_ref()
                    .map(|error| EnvelopeError::from_source_error(outcome.source, error))
            })
            .collect();
        return Ok(SelectedTeams {
            sources: report.sources(),
            teams: report.teams,
            errors,
            latency_ms: report.latency_ms,
        });
    };

    let result = match &selection.team {
        Some(team_id) => {
            let team_id = team_id.trim();
            if team_id.is_empty() {
                return Err(CliError::Command(String::from("--team must not be empty")));
            }
            match registry.team(source, team_id).await {
                Ok(Some(team)) => Ok(vec![team]),
                Ok(None) => Err(EnvelopeError::new(
                    "team.not_found",
                    format!("team '{team_id}' not found in {source}"),
                )
                .with_team(team_id)),
                Err(error) => Err(EnvelopeError::from_source_error(source, &error)),
            }
        }
        None => registry
            .teams_by_source(source)
            .await
            .map_err(|error| EnvelopeError::from_source_error(source, &error)),
    };

    let (teams, errors) = match result {
        Ok(teams) => (teams, Vec::new()),
        Err(error) => (Vec::new(), vec![error]),
    };
    Ok(SelectedTeams {
        teams,
        sources: vec![source],
        errors,
        latency_ms: elapsed_ms(started),
    })
}

pub(crate) fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
