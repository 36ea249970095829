//! Engine error types

use miette::Diagnostic;
use thiserror::Error;

/// Template expansion error
#[derive(Error, Debug, Diagnostic)]
pub enum EngineError {
    /// The template source is malformed
    #[error("parsing template {template:?}: {source}")]
    #[diagnostic(code(rigging::template::parse))]
    Parse {
        template: String,
        #[source]
        source: minijinja::Error,
    },

    /// The template failed while rendering, usually an undefined variable
    #[error("executing template {template:?}: {source}")]
    #[diagnostic(
        code(rigging::template::render),
        help("variables come from the environment and, for build templates, IMAGE_NAME/DIGEST/DIGEST_ALGO/DIGEST_HEX")
    )]
    Render {
        template: String,
        #[source]
        source: minijinja::Error,
    },
}

impl EngineError {
    /// The template source that failed
    pub fn template(&self) -> &str {
        match self {
            Self::Parse { template, .. } | Self::Render { template, .. } => template,
        }
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
