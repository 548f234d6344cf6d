use std::sync::Arc;

use tracing::{debug, error, warn};

use crate::client::{CompletionClient, CompletionRequest, OpenAiClient, OpenAiConfig};
use crate::parse::{fallback_predictions, parse_insights, parse_predictions};
use crate::prompt::{
    build_analysis_prompt, build_insights_prompt, ANALYSIS_SYSTEM_PROMPT, INSIGHTS_SYSTEM_PROMPT,
};
use crate::{AnalysisError, MetricSample, Prediction, PredictionRequest};

const ANALYSIS_TEMPERATURE: f32 = 0.3;
const ANALYSIS_MAX_TOKENS: u32 = 1_000;
const INSIGHTS_MAX_TOKENS: u32 = 500;

const NO_METRICS_INSIGHT: &str = "No metrics data available for analysis";
const NO_CONTENT_INSIGHT: &str = "Unable to generate insights at this time";
const NO_BULLETS_INSIGHT: &str = "Analysis completed but no specific insights generated";
const FAILED_INSIGHT: &str = "Error generating insights - please try again later";
const UNCONFIGURED_INSIGHTS: [&str; 3] = [
    "Metrics collection is active",
    "Configure AI analysis for detailed insights",
    "Review team performance trends manually",
];

/// Risk predictions and insights backed by a completion model.
///
/// Without a client every call reports [`AnalysisError::NotConfigured`].
#[derive(Clone, Default)]
pub struct AiService {
    client: Option<Arc<dyn CompletionClient>>,
}

impl AiService {
    pub fn new(client: Arc<dyn CompletionClient>) -> Self {
        Self {
            client: Some(client),
        }
    }

    pub fn unconfigured() -> Self {
        Self::default()
    }

    /// OpenAI-backed service when a key is present in the environment.
    pub fn from_env() -> Self {
        Self::from_config(OpenAiConfig::from_env())
    }

    pub fn from_config(config: Option<OpenAiConfig>) -> Self {
        match config {
            Some(config) => Self::new(Arc::new(OpenAiClient::new(config))),
            None => Self::unconfigured(),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.client.is_some()
    }

    fn client(&self) -> Result<&dyn CompletionClient, AnalysisError> {
        self.client.as_deref().ok_or(AnalysisError::NotConfigured)
    }

    /// Asks the model for risk predictions about `request`.
    ///
    /// `Ok(vec![])` means the model answered with an empty array.
    pub async fn analyze_metrics(
        &self,
        request: &PredictionRequest,
    ) -> Result<Vec<Prediction>, AnalysisError> {
        if request.metrics.is_empty() {
            return Err(AnalysisError::InvalidInput(String::from(
                "metrics array is required and cannot be empty",
            )));
        }
        let client = self.client()?;

        debug!(
            metrics = request.metrics.len(),
            team_size = request.team_size,
            "requesting risk analysis"
        );
        let content = client
            .complete(CompletionRequest {
                system: String::from(ANALYSIS_SYSTEM_PROMPT),
                prompt: build_analysis_prompt(request),
                temperature: ANALYSIS_TEMPERATURE,
                max_tokens: ANALYSIS_MAX_TOKENS,
            })
            .await?
            .ok_or(AnalysisError::EmptyResponse)?;

        parse_predictions(&content)
    }

    /// [`Self::analyze_metrics`] that always yields something to display.
    pub async fn analyze_metrics_or_fallback(&self, request: &PredictionRequest) -> Vec<Prediction> {
        match self.analyze_metrics(request).await {
            Ok(predictions) => predictions,
            Err(err) => {
                log_failure("analysis", &err);
                fallback_predictions()
            }
        }
    }

    /// Asks the model for a handful of bulleted insights.
    ///
    /// Empty input and a reply without bullet lines are not errors; they
    /// yield a single explanatory line.
    pub async fn generate_insights(
        &self,
        metrics: &[MetricSample],
    ) -> Result<Vec<String>, AnalysisError> {
        if metrics.is_empty() {
            return Ok(vec![String::from(NO_METRICS_INSIGHT)]);
        }
        let client = self.client()?;

        let content = client
            .complete(CompletionRequest {
                system: String::from(INSIGHTS_SYSTEM_PROMPT),
                prompt: build_insights_prompt(metrics),
                temperature: ANALYSIS_TEMPERATURE,
                max_tokens: INSIGHTS_MAX_TOKENS,
            })
            .await?
            .ok_or(AnalysisError::EmptyResponse)?;

        let insights = parse_insights(&content);
        if insights.is_empty() {
            return Ok(vec![String::from(NO_BULLETS_INSIGHT)]);
        }
        Ok(insights)
    }

    pub async fn generate_insights_or_fallback(&self, metrics: &[MetricSample]) -> Vec<String> {
        match self.generate_insights(metrics).await {
            Ok(insights) => insights,
            Err(err) => {
                log_failure("insights", &err);
                fallback_insights(&err)
            }
        }
    }
}

/// Fixed lines shown in place of insights when `err` prevented them.
pub fn fallback_insights(err: &AnalysisError) -> Vec<String> {
    match err {
        AnalysisError::NotConfigured => UNCONFIGURED_INSIGHTS.iter().copied().map(String::from).collect(),
        AnalysisError::EmptyResponse => vec![String::from(NO_CONTENT_INSIGHT)],
        _ => vec![String::from(FAILED_INSIGHT)],
    }
}

fn log_failure(operation: &'static str, err: &AnalysisError) {
    match err {
        AnalysisError::NotConfigured | AnalysisError::InvalidInput(_) => {
            warn!(operation, code = err.code(), error = %err, "AI request skipped");
        }
        _ => error!(operation, code = err.code(), error = %err, "AI request failed"),
    }
}
