use devmon_core::Team;
use serde::{Deserialize, Serialize};

/// Sprint length assumed when a team's sprint has no dates.
pub const DEFAULT_SPRINT_DURATION_DAYS: u32 = 14;

/// One observed metric value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSample {
    #[serde(rename = "type")]
    pub metric_type: String,
    pub value: f64,
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

impl MetricSample {
    pub fn new(metric_type: impl Into<String>, value: f64, date: impl Into<String>) -> Self {
        Self {
            metric_type: metric_type.into(),
            value,
            date: date.into(),
            metadata: None,
        }
    }
}

/// Input to a risk analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionRequest {
    pub metrics: Vec<MetricSample>,
    pub team_size: u32,
    pub sprint_duration: u32,
    /// Percentage, may exceed 100.
    pub current_sprint_progress: u32,
}

impl PredictionRequest {
    /// Builds a request from a normalized team. The sprint duration comes
    /// from `sprint_duration_days`, else from the sprint's dates, else
    /// [`DEFAULT_SPRINT_DURATION_DAYS`].
    pub fn from_team(team: &Team, sprint_duration_days: Option<u32>) -> Self {
        let sprint = team.sprint.as_ref();
        let date = sprint
            .and_then(|sprint| sprint.start_date)
            .map(|date| date.to_string())
            .unwrap_or_else(|| String::from("current"));

        let metrics = &team.metrics;
        let mut samples = vec![
            MetricSample::new("velocity", metrics.velocity, date.clone()),
            MetricSample::new("active_stories", f64::from(metrics.active_stories), date.clone()),
            MetricSample::new("sprint_progress", f64::from(metrics.sprint_progress), date.clone()),
        ];
        if let Some(cycle_time) = metrics.average_cycle_time_days {
            samples.push(MetricSample::new("average_cycle_time_days", cycle_time, date.clone()));
        }
        if let Some(sprint) = sprint.filter(|sprint| sprint.planned_points > 0.0) {
            samples.push(MetricSample::new("planned_points", sprint.planned_points, date.clone()));
            samples.push(MetricSample::new("completed_points", sprint.completed_points, date));
        }

        let dated_duration = sprint.and_then(|sprint| match (sprint.start_date, sprint.end_date) {
            (Some(start), Some(end)) if end > start => u32::try_from((end - start).whole_days()).ok(),
            _ => None,
        });

        Self {
            metrics: samples,
            team_size: u32::try_from(team.active_member_count()).unwrap_or(u32::MAX),
            sprint_duration: sprint_duration_days
                .or(dated_duration)
                .unwrap_or(DEFAULT_SPRINT_DURATION_DAYS),
            current_sprint_progress: metrics.sprint_progress,
        }
    }
}

/// Closed set of risk categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PredictionType {
    SprintSpilloverRisk,
    TeamBurnoutRisk,
    DeliveryDelayRisk,
    QualityDegradationRisk,
    CapacityOverloadRisk,
}

impl PredictionType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SprintSpilloverRisk => "SPRINT_SPILLOVER_RISK",
            Self::TeamBurnoutRisk => "TEAM_BURNOUT_RISK",
            Self::DeliveryDelayRisk => "DELIVERY_DELAY_RISK",
            Self::QualityDegradationRisk => "QUALITY_DEGRADATION_RISK",
            Self::CapacityOverloadRisk => "CAPACITY_OVERLOAD_RISK",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "SPRINT_SPILLOVER_RISK" => Some(Self::SprintSpilloverRisk),
            "TEAM_BURNOUT_RISK" => Some(Self::TeamBurnoutRisk),
            "DELIVERY_DELAY_RISK" => Some(Self::DeliveryDelayRisk),
            "QUALITY_DEGRADATION_RISK" => Some(Self::QualityDegradationRisk),
            "CAPACITY_OVERLOAD_RISK" => Some(Self::CapacityOverloadRisk),
            _ => None,
        }
    }
}

impl Default for PredictionType {
    fn default() -> Self {
        Self::SprintSpilloverRisk
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }
}

/// One validated risk prediction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prediction {
    #[serde(rename = "type")]
    pub prediction_type: PredictionType,
    pub title: String,
    pub description: String,
    /// 0 to 100.
    pub confidence: u8,
    pub severity: Severity,
    pub recommendations: Vec<String>,
}
