use thiserror::Error;

/// Validation and contract errors exposed by `devmon-core`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("invalid source '{value}', expected one of azure-devops, jira")]
    InvalidSource { value: String },

    #[error("invalid sprint date '{value}', expected YYYY-MM-DD")]
    InvalidDate { value: String },

    #[error("field '{field}' cannot be empty")]
    EmptyField { field: &'static str },

    #[error("field '{field}' must be a valid URL with an http(s) scheme: '{value}'")]
    InvalidUrl { field: &'static str, value: String },

    #[error("invalid value '{value}' for setting '{key}'")]
    InvalidSetting { key: &'static str, value: String },
}

/// Top-level error type for core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Source(#[from] crate::team_source::SourceError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
