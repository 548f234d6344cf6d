//! Parsing completion text into predictions and insights.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;
use tracing::warn;

use crate::{AnalysisError, Prediction, PredictionType, Severity};

const DEFAULT_TITLE: &str = "Analysis Result";
const DEFAULT_DESCRIPTION: &str = "No description available";
const DEFAULT_CONFIDENCE: u8 = 50;

fn json_array_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?s)\[.*\]").expect("static pattern compiles"))
}

/// Validates the first JSON array found in `text` field by field.
///
/// Entries that are not objects, or that end up with a blank title or
/// description, are dropped rather than filled with defaults. An empty
/// result is `Ok(vec![])`.
pub fn parse_predictions(text: &str) -> Result<Vec<Prediction>, AnalysisError> {
    let Some(span) = json_array_pattern().find(text) else {
        return Err(AnalysisError::MalformedPayload(String::from(
            "no JSON array in completion",
        )));
    };

    let value: Value = serde_json::from_str(span.as_str())
        .map_err(|error| AnalysisError::MalformedPayload(error.to_string()))?;
    let Value::Array(entries) = value else {
        return Err(AnalysisError::MalformedPayload(String::from(
            "completion JSON is not an array",
        )));
    };

    Ok(entries.iter().filter_map(prediction_from_value).collect())
}

/// [`parse_predictions`] collapsed onto [`fallback_predictions`] on failure.
pub fn parse_analysis(text: &str) -> Vec<Prediction> {
    match parse_predictions(text) {
        Ok(predictions) => predictions,
        Err(error) => {
            warn!(error = %error, "unparseable analysis, using fallback");
            fallback_predictions()
        }
    }
}

/// Single low-severity placeholder shown when analysis is unavailable.
pub fn fallback_predictions() -> Vec<Prediction> {
    vec![Prediction {
        prediction_type: PredictionType::SprintSpilloverRisk,
        title: String::from("Analysis Unavailable"),
        description: String::from(
            "AI analysis is currently unavailable. Please check your configuration.",
        ),
        confidence: 0,
        severity: Severity::Low,
        recommendations: vec![
            String::from("Check AI service configuration"),
            String::from("Review metrics manually"),
        ],
    }]
}

/// Bullet lines (`-` prefixed) of `text`, marker stripped.
pub fn parse_insights(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter_map(|line| line.strip_prefix('-'))
        .map(str::trim)
        .filter(|insight| !insight.is_empty())
        .map(str::to_owned)
        .collect()
}

/// One array entry with defaults applied to missing fields.
///
/// Returns `None` for entries that are not objects (a bare `"text"` entry is
/// not turned into a default-filled prediction) and for entries whose title
/// or description is blank after trimming, including whitespace-only values.
fn prediction_from_value(value: &Value) -> Option<Prediction> {
    let object = value.as_object()?;

    let prediction_type = object
        .get("type")
        .and_then(Value::as_str)
        .and_then(PredictionType::parse)
        .unwrap_or_default();
    let title = non_empty_str(object.get("title")).unwrap_or(DEFAULT_TITLE);
    let description = non_empty_str(object.get("description")).unwrap_or(DEFAULT_DESCRIPTION);
    let severity = object
        .get("severity")
        .and_then(Value::as_str)
        .and_then(Severity::parse)
        .unwrap_or(Severity::Medium);
    let recommendations = object
        .get("recommendations")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_owned)
                .collect()
        })
        .unwrap_or_default();

    let title = title.trim();
    let description = description.trim();
    if title.is_empty() || description.is_empty() {
        return None;
    }

    Some(Prediction {
        prediction_type,
        title: title.to_owned(),
        description: description.to_owned(),
        confidence: confidence(object.get("confidence")),
        severity,
        recommendations,
    })
}

fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value.and_then(Value::as_str).filter(|text| !text.is_empty())
}

/// Numbers (or numeric strings) clamped into 0..=100; anything else is 50.
fn confidence(value: Option<&Value>) -> u8 {
    let raw = match value {
        Some(Value::Number(number)) => number.as_f64(),
        Some(Value::String(text)) => text.trim().parse::<f64>().ok(),
        _ => None,
    };
    match raw {
        Some(raw) if raw.is_finite() => raw.clamp(0.0, 100.0).round() as u8,
        _ => DEFAULT_CONFIDENCE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_array_surrounded_by_prose() {
        let text = r#"Here is my analysis:
[
  {"type": "TEAM_BURNOUT_RISK", "title": "Burnout", "description": "Long hours",
   "confidence": 72, "severity": "high", "recommendations": ["Rebalance", 3]}
]
Let me know if you need more."#;

        let predictions = parse_predictions(text).expect("parses");

        assert_eq!(predictions.len(), 1);
        assert_eq!(predictions[0].prediction_type, PredictionType::TeamBurnoutRisk);
        assert_eq!(predictions[0].confidence, 72);
        assert_eq!(predictions[0].severity, Severity::High);
        assert_eq!(predictions[0].recommendations, vec![String::from("Rebalance")]);
    }

    #[test]
    fn fills_defaults_and_clamps_confidence() {
        let text = r#"[
  {"type": "MADE_UP", "confidence": 150, "severity": "critical"},
  {"title": "Low", "description": "Below zero", "confidence": -20},
  {"title": "Zero", "description": "Kept", "confidence": 0},
  {"title": "Text", "description": "Numeric string", "confidence": "64"}
]"#;

        let predictions = parse_predictions(text).expect("parses");

        assert_eq!(predictions[0].prediction_type, PredictionType::SprintSpilloverRisk);
        assert_eq!(predictions[0].title, "Analysis Result");
        assert_eq!(predictions[0].description, "No description available");
        assert_eq!(predictions[0].confidence, 100);
        assert_eq!(predictions[0].severity, Severity::Medium);
        assert!(predictions[0].recommendations.is_empty());
        assert_eq!(predictions[1].confidence, 0);
        assert_eq!(predictions[2].confidence, 0);
        assert_eq!(predictions[3].confidence, 64);
    }

    #[test]
    fn drops_non_objects_and_blank_entries() {
        let text = r#"["text", 4, {"title": "   ", "description": "blank title"}, {"title": "Ok", "description": "Kept"}]"#;

        let predictions = parse_predictions(text).expect("parses");

        assert_eq!(predictions.len(), 1);
        assert_eq!(predictions[0].title, "Ok");
    }

    #[test]
    fn empty_array_is_a_successful_empty_result() {
        assert_eq!(parse_predictions("[]").expect("parses"), Vec::new());
        assert!(parse_analysis("[]").is_empty());
    }

    #[test]
    fn missing_or_invalid_json_collapses_to_fallback() {
        assert!(matches!(
            parse_predictions("no predictions today"),
            Err(AnalysisError::MalformedPayload(_))
        ));

        for text in ["no predictions today", "[not json]"] {
            let predictions = parse_analysis(text);
            assert_eq!(predictions.len(), 1);
            assert_eq!(predictions[0].title, "Analysis Unavailable");
            assert_eq!(predictions[0].confidence, 0);
            assert_eq!(predictions[0].severity, Severity::Low);
        }
    }

    #[test]
    fn insights_keep_bullet_lines_only() {
        let text = "Summary first\n- Velocity is stable\n  -   Cycle time is rising  \n-\nnot a bullet";

        assert_eq!(
            parse_insights(text),
            vec![
                String::from("Velocity is stable"),
                String::from("Cycle time is rising"),
            ]
        );
        assert!(parse_insights("no bullets here").is_empty());
    }
}
