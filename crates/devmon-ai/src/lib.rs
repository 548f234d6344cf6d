//! # DevMon AI
//!
//! Risk predictions and short insights generated from team metrics by a
//! chat-completion model.
//!
//! The service never invents metrics: it sends what [`PredictionRequest`]
//! carries, then validates the model's reply field by field. Every call has a
//! strict form returning [`AnalysisError`] and an `*_or_fallback` form that
//! always yields displayable output.
//!
//! ```rust,ignore
//! use devmon_ai::{AiService, PredictionRequest};
//!
//! let service = AiService::from_env();
//! let request = PredictionRequest::from_team(&team, None);
//! for prediction in service.analyze_metrics_or_fallback(&request).await {
//!     println!("[{}] {}", prediction.severity.as_str(), prediction.title);
//! }
//! ```

pub mod client;
pub mod error;
pub mod model;
pub mod parse;
pub mod prompt;
pub mod service;

pub use client::{CompletionClient, CompletionRequest, OpenAiClient, OpenAiConfig};
pub use error::AnalysisError;
pub use model::{
    MetricSample, Prediction, PredictionRequest, PredictionType, Severity,
    DEFAULT_SPRINT_DURATION_DAYS,
};
pub use parse::{fallback_predictions, parse_analysis, parse_insights, parse_predictions};
pub use service::{fallback_insights, AiService};
