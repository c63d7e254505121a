// CLI error types and user-facing rendering

use lada_config::ConfigError;
use lada_providers::LlmError;
use thiserror::Error;

/// CLI-specific errors
#[derive(Error, Debug)]
pub enum CliError {
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Llm(#[from] LlmError),
}

impl CliError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        CliError::InvalidArgument {
            message: message.into(),
        }
    }

    /// User-friendly message with remediation hints
    pub fn user_message(&self) -> String {
        match self {
            CliError::InvalidArgument { message } => {
                format!("Invalid argument: {}\n\nRun 'lada --help' for usage information.", message)
            }
            CliError::Config(e) => match e {
                ConfigError::UnknownKey(_) => {
                    format!("{}\n\nRun 'lada config show' to see the available keys.", e)
                }
                _ => format!("{}\n\nCheck your configuration with 'lada config show'.", e),
            },
            CliError::Llm(e) => match e.remediation() {
                Some(hint) => format!("{}\n\n{}", e, hint),
                None => e.to_string(),
            },
        }
    }

    /// Technical details for verbose mode
    pub fn technical_details(&self) -> String {
        format!("{:?}", self)
    }
}

pub type CliResult<T> = Result<T, CliError>;
