use serde::Serialize;

use devmon_core::{SourceId, Team, TeamRegistry};

use crate::cli::TeamArgs;
use crate::envelope::EnvelopeError;
use crate::error::CliError;

use super::{elapsed_ms, CommandResult};

#[derive(Debug, Serialize)]
struct TeamResponseData {
    team: Option<Team>,
}

pub async fn run(args: &TeamArgs, registry: &TeamRegistry) -> Result<CommandResult, CliError> {
    let team_id = args.team_id.trim();
    if team_id.is_empty() {
        return Err(CliError::Command(String::from("team id must not be empty")));
    }
    let source = SourceId::from(args.source);

    let started = std::time::Instant::now();
    let (team, errors) = match registry.team(source, team_id).await {
        Ok(Some(team)) => (Some(team), Vec::new()),
        Ok(None) => (
            None,
            vec![EnvelopeError::new(
                "team.not_found",
                format!("team '{team_id}' not found in {source}"),
            )
            .with_team(team_id)],
        ),
        Err(error) => (
            None,
            vec![EnvelopeError::from_source_error(source, &error).with_team(team_id)],
        ),
    };

    let data = serde_json::to_value(TeamResponseData { team })?;
    Ok(CommandResult::ok(data, vec![source])
        .with_errors(errors)
        .with_latency(elapsed_ms(started)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::SourceArg;
    use crate::commands::testing::mock_registry;

    fn args(team_id: &str, source: SourceArg) -> TeamArgs {
        TeamArgs {
            team_id: String::from(team_id),
            source,
        }
    }

    #[tokio::test]
    async fn returns_the_requested_team() {
        let result = run(&args("ciro-irp-1", SourceArg::AzureDevops), &mock_registry())
            .await
            .expect("runs");

        assert_eq!(result.data["team"]["name"], "ciro - IRP 1");
        assert_eq!(result.data["team"]["members"].as_array().map(Vec::len), Some(4));
        assert!(result.errors.is_empty());
    }

    #[tokio::test]
    async fn unknown_team_and_unregistered_source_are_envelope_errors() {
        let registry = mock_registry();

        let missing = run(&args("nope", SourceArg::AzureDevops), &registry)
            .await
            .expect("runs");
        assert!(missing.data["team"].is_null());
        assert_eq!(missing.errors[0].code, "team.not_found");

        let unregistered = run(&args("ciro-irp-1", SourceArg::Jira), &registry)
            .await
            .expect("runs");
        assert_eq!(unregistered.errors[0].code, "source.not_configured");
    }

    #[tokio::test]
    async fn blank_team_id_is_a_usage_error() {
        let error = run(&args("  ", SourceArg::AzureDevops), &mock_registry())
            .await
            .err()
            .expect("rejected");
        assert_eq!(error.exit_code(), 2);
    }
}
