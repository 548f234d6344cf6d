use serde::Serialize;

use devmon_ai::{fallback_predictions, AnalysisError, Prediction, PredictionRequest};
use devmon_core::SourceId;

use crate::cli::AnalyzeArgs;
use crate::envelope::EnvelopeError;
use crate::error::CliError;

use super::{select_teams, CommandResult, Context};

const UNCONFIGURED_WARNING: &str =
    "AI analysis is not configured (set DEVMON_OPENAI_API_KEY); fallback predictions shown";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TeamAnalysis {
    team_id: String,
    team_name: String,
    source: SourceId,
    request: PredictionRequest,
    predictions: Vec<Prediction>,
}

#[derive(Debug, Serialize)]
struct AnalyzeResponseData {
    analyses: Vec<TeamAnalysis>,
}

pub async fn run(args: &AnalyzeArgs, context: &Context) -> Result<CommandResult, CliError> {
    if args.sprint_days == Some(0) {
        return Err(CliError::Command(String::from(
            "--sprint-days must be greater than zero",
        )));
    }

    let selected = select_teams(&args.selection, &context.registry).await?;
    let mut errors = selected.errors;
    let mut unconfigured = false;
    let mut analyses = Vec::with_capacity(selected.teams.len());

    for team in &selected.teams {
        let request = PredictionRequest::from_team(team, args.sprint_days);
        let predictions = match context.ai.analyze_metrics(&request).await {
            Ok(predictions) => predictions,
            Err(AnalysisError::NotConfigured) => {
                unconfigured = true;
                fallback_predictions()
            }
            Err(error) => {
                errors.push(EnvelopeError::from_analysis_error(&error).with_team(&team.id));
                fallback_predictions()
            }
        };
        analyses.push(TeamAnalysis {
            team_id: team.id.clone(),
            team_name: team.name.clone(),
            source: team.source,
            request,
            predictions,
        });
    }

    let data = serde_json::to_value(AnalyzeResponseData { analyses })?;
    let mut result = CommandResult::ok(data, selected.sources)
        .with_errors(errors)
        .with_latency(selected.latency_ms);
    if unconfigured {
        result = result.with_warning(UNCONFIGURED_WARNING);
    }
    Ok(result)
}
