use thiserror::Error;

/// CLI-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Validation(#[from] devmon_core::ValidationError),

    #[error("command error: {0}")]
    Command(String),

    #[error("strict mode failed: warnings={warning_count}, errors={error_count}")]
    StrictModeViolation {
        warning_count: usize,
        error_count: usize,
    },

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Validation(_) | Self::Command(_) => 2,
            Self::StrictModeViolation { .. } => 5,
            Self::Serialization(_) => 4,
            Self::Io(_) => 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use devmon_core::ValidationError;

    #[test]
    fn exit_codes_follow_error_category() {
        let validation = CliError::from(ValidationError::EmptyField { field: "team_id" });
        let strict = CliError::StrictModeViolation {
            warning_count: 1,
            error_count: 0,
        };
        let io = CliError::from(std::io::Error::other("closed pipe"));

        assert_eq!(validation.exit_code(), 2);
        assert_eq!(strict.exit_code(), 5);
        assert_eq!(io.exit_code(), 10);
    }
}
