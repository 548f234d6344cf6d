use serde::Serialize;

use devmon_ai::{fallback_insights, AnalysisError, PredictionRequest};
use devmon_core::SourceId;

use crate::cli::TeamSelection;
use crate::envelope::EnvelopeError;
use crate::error::CliError;

use super::{select_teams, CommandResult, Context};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TeamInsights {
    team_id: String,
    team_name: String,
    source: SourceId,
    insights: Vec<String>,
}

#[derive(Debug, Serialize)]
struct InsightsResponseData {
    insights: Vec<TeamInsights>,
}

pub async fn run(selection: &TeamSelection, context: &Context) -> Result<CommandResult, CliError> {
    let selected = select_teams(selection, &context.registry).await?;
    let mut errors = selected.errors;
    let mut unconfigured = false;
    let mut results = Vec::with_capacity(selected.teams.len());

    for team in &selected.teams {
        let metrics = PredictionRequest::from_team(team, None).metrics;
        let insights = match context.ai.generate_insights(&metrics).await {
            Ok(insights) => insights,
            Err(error) => {
                match &error {
                    AnalysisError::NotConfigured => unconfigured = true,
                    _ => errors.push(EnvelopeError::from_analysis_error(&error).with_team(&team.id)),
                }
                fallback_insights(&error)
            }
        };
        results.push(TeamInsights {
            team_id: team.id.clone(),
            team_name: team.name.clone(),
            source: team.source,
            insights,
        });
    }

    let data = serde_json::to_value(InsightsResponseData { insights: results })?;
    let mut result = CommandResult::ok(data, selected.sources)
        .with_errors(errors)
        .with_latency(selected.latency_ms);
    if unconfigured {
        result = result.with_warning("AI insights are not configured (set DEVMON_OPENAI_API_KEY)");
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use devmon_ai::{AiService, CompletionClient, CompletionRequest};

    use super::*;
    use crate::commands::testing::mock_registry;

    struct Bullets;

    #[async_trait]
    impl CompletionClient for Bullets {
        async fn complete(
            &self,
            request: CompletionRequest,
        ) -> Result<Option<String>, AnalysisError> {
            assert!(request.prompt.contains("velocity: "));
            Ok(Some(String::from("- Velocity is steady\n- Watch cycle time")))
        }
    }

    fn all_teams() -> TeamSelection {
        TeamSelection {
            team: None,
            source: None,
        }
    }

    #[tokio::test]
    async fn unconfigured_ai_returns_guidance_lines() {
        let context = Context {
            registry: mock_registry(),
            ai: AiService::unconfigured(),
        };

        let result = run(&all_teams(), &context).await.expect("runs");

        assert_eq!(
            result.data["insights"][0]["insights"][1],
            "Configure AI analysis for detailed insights"
        );
        assert_eq!(result.warnings.len(), 1);
        assert!(result.errors.is_empty());
    }

    #[tokio::test]
    async fn model_bullets_become_insights() {
        let context = Context {
            registry: mock_registry(),
            ai: AiService::new(Arc::new(Bullets)),
        };

        let result = run(&all_teams(), &context).await.expect("runs");

        assert_eq!(
            result.data["insights"][1]["insights"],
            serde_json::json!(["Velocity is steady", "Watch cycle time"])
        );
        assert!(result.warnings.is_empty());
    }
}
