//! Prompt text sent to the completion API.

use crate::{MetricSample, PredictionRequest};

pub const ANALYSIS_SYSTEM_PROMPT: &str = "You are an expert software engineering analyst \
specializing in developer productivity metrics. Analyze the provided metrics and generate \
actionable insights and predictions about team performance, sprint risks, and improvement \
opportunities. Be specific and provide concrete recommendations.";

pub const INSIGHTS_SYSTEM_PROMPT: &str = "You are a software engineering productivity expert. \
Provide clear, actionable insights from metrics data.";

const PREDICTION_FORMAT_EXAMPLE: &str = r#"[
  {
    "type": "SPRINT_SPILLOVER_RISK",
    "title": "High risk of sprint spillover",
    "description": "Detailed explanation of the risk",
    "confidence": 85,
    "severity": "high",
    "recommendations": ["Recommendation 1", "Recommendation 2"]
  }
]"#;

/// User prompt asking for a JSON array of predictions.
pub fn build_analysis_prompt(request: &PredictionRequest) -> String {
    let summary = request
        .metrics
        .iter()
        .map(|sample| format!("{}: {}", sample.metric_type, format_number(sample.value)))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "Analyze the following developer metrics and generate predictions about potential risks and opportunities:\n\
         \n\
         Metrics: {summary}\n\
         Team Size: {team_size}\n\
         Sprint Duration: {duration} days\n\
         Current Sprint Progress: {progress}%\n\
         \n\
         Generate predictions in the following JSON format:\n\
         {PREDICTION_FORMAT_EXAMPLE}\n\
         \n\
         Focus on:\n\
         1. Sprint completion risks\n\
         2. Team burnout indicators\n\
         3. Delivery timeline risks\n\
         4. Quality concerns\n\
         5. Capacity issues\n\
         \n\
         Be specific and provide actionable recommendations.",
        team_size = request.team_size,
        duration = request.sprint_duration,
        progress = request.current_sprint_progress,
    )
}

/// User prompt asking for 3-5 bulleted insights.
pub fn build_insights_prompt(metrics: &[MetricSample]) -> String {
    let lines = metrics
        .iter()
        .map(|sample| {
            format!(
                "{}: {} ({})",
                sample.metric_type,
                format_number(sample.value),
                sample.date
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Analyze these developer metrics and provide 3-5 key insights:\n\
         \n\
         {lines}\n\
         \n\
         Provide insights in the format:\n\
         - Insight 1\n\
         - Insight 2\n\
         - Insight 3"
    )
}

/// Whole numbers print without a fractional part.
fn format_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}
