//! CLI error type

use thiserror::Error;

use crate::error::ImportError;

/// Errors reported by CLI commands
#[derive(Error, Debug)]
pub enum CliError {
    #[error("{0}")]
    Import(#[from] ImportError),

    #[error("Failed to serialize output: {0}")]
    Output(String),

    /// Some tables failed to promote; details were already printed
    #[error("{failed} of {total} table(s) failed to promote")]
    PromotionFailed { failed: usize, total: usize },

    /// The import failed and the outcome was already printed as JSON
    #[error("Import failed")]
    Reported,
}

impl CliError {
    /// Message shown to the operator, with a hint where one exists
    pub fn user_message(&self) -> String {
        match self {
            CliError::Import(err) => format!("[{}] {}", err.kind(), err.user_message()),
            other => other.to_string(),
        }
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        CliError::Output(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_by_variant() {
        let err = CliError::from(ImportError::TableAlreadyExists("RawAccount".into()));
        assert!(err.user_message().starts_with("[TableAlreadyExists]"));

        let err = CliError::PromotionFailed {
            failed: 1,
            total: 3,
        };
        assert_eq!(err.user_message(), "1 of 3 table(s) failed to promote");
    }
}
