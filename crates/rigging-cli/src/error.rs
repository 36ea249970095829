//! CLI error types with exit code handling

use miette::Diagnostic;
use rigging_core::CoreError;
use rigging_helm::HelmError;
use thiserror::Error;

use crate::exit_codes;

/// CLI-specific error type that includes exit code information
#[derive(Error, Debug, Diagnostic, Clone)]
pub enum CliError {
    /// Deploy configuration or builds file is missing or invalid
    #[error("Configuration error: {message}")]
    #[diagnostic(code(rigging::cli::config))]
    Config {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// A helm invocation failed
    #[error("{message}")]
    #[diagnostic(code(rigging::cli::deploy))]
    Deploy {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// Interrupted before helm finished
    #[error("Interrupted: {message}")]
    #[diagnostic(code(rigging::cli::interrupted))]
    Interrupted { message: String },

    /// IO error (file not found, permissions, etc.)
    #[error("IO error: {message}")]
    #[diagnostic(code(rigging::cli::io))]
    Io { message: String },
}

impl CliError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Config { .. } => exit_codes::CONFIG_ERROR,
            CliError::Deploy { .. } => exit_codes::DEPLOY_ERROR,
            CliError::Interrupted { .. } => exit_codes::INTERRUPTED,
            CliError::Io { .. } => exit_codes::IO_ERROR,
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            help: None,
        }
    }

    /// Create a configuration error with help text
    pub fn config_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            help: Some(help.into()),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::Io {
            message: err.to_string(),
        }
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConfigNotFound { .. } => CliError::config_with_help(
                err.to_string(),
                "Create a rigging.yaml or point --config at your deploy configuration",
            ),
            other => CliError::config(other.to_string()),
        }
    }
}

impl From<HelmError> for CliError {
    fn from(err: HelmError) -> Self {
        if err.is_cancelled() {
            return CliError::Interrupted {
                message: err.to_string(),
            };
        }

        let help = match &err {
            HelmError::Spawn { .. } => {
                Some("Install helm or point --helm-binary (RIGGING_HELM) at it".to_string())
            }
            HelmError::Release { source, .. } if matches!(**source, HelmError::Spawn { .. }) => {
                Some("Install helm or point --helm-binary (RIGGING_HELM) at it".to_string())
            }
            HelmError::Release { source, .. }
                if matches!(**source, HelmError::NoBuildPresent { .. }) =>
            {
                Some("Pass the image with --image NAME=TAG or list it in --builds".to_string())
            }
            _ => None,
        };

        CliError::Deploy {
            message: err.to_string(),
            help,
        }
    }
}

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
