use serde::Serialize;

use devmon_core::{Team, TeamRegistry};

use crate::cli::{TeamSelection, TeamsArgs};
use crate::error::CliError;

use super::{select_teams, CommandResult};

#[derive(Debug, Serialize)]
struct TeamsResponseData {
    teams: Vec<Team>,
}

pub async fn run(args: &TeamsArgs, registry: &TeamRegistry) -> Result<CommandResult, CliError> {
    let selection = TeamSelection {
        team: None,
        source: args.source,
    };
    let selected = select_teams(&selection, registry).await?;

    let warnings = selected
        .sources
        .iter()
        .filter(|source| registry.is_mock(**source))
        .map(|source| format!("{source}: no credentials configured, sample data served"))
        .collect::<Vec<_>>();

    let data = serde_json::to_value(TeamsResponseData {
        teams: selected.teams,
    })?;
    Ok(CommandResult::ok(data, selected.sources)
        .with_errors(selected.errors)
        .with_warnings(warnings)
        .with_latency(selected.latency_ms))
}
