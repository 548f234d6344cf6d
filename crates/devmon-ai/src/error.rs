use thiserror::Error;

/// Why an analysis produced no predictions.
///
/// Callers that only want something to display use the `*_or_fallback`
/// helpers on [`crate::AiService`], which turn every variant into the fixed
/// fallback values.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    #[error("AI analysis is not configured: no API key")]
    NotConfigured,

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("completion request failed: {0}")]
    Transport(String),

    #[error("completion API returned status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("completion API returned no content")]
    EmptyResponse,

    #[error("malformed analysis payload: {0}")]
    MalformedPayload(String),
}

impl AnalysisError {
    pub const fn code(&self) -> &'static str {
        match self {
            Self::NotConfigured => "ai.not_configured",
            Self::InvalidInput(_) => "ai.invalid_input",
            Self::Transport(_) => "ai.transport",
            Self::Status { .. } => "ai.status",
            Self::EmptyResponse => "ai.empty_response",
            Self::MalformedPayload(_) => "ai.malformed_payload",
        }
    }
}
