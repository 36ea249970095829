//! Environment templates based on MiniJinja

use minijinja::{Environment, UndefinedBehavior};
use std::collections::BTreeMap;
use std::ffi::OsString;

use crate::error::{EngineError, Result};

const TEMPLATE_NAME: &str = "env";

/// A parsed template, rendered against environment variables
pub struct EnvTemplate {
    env: Environment<'static>,
    source: String,
}

impl std::fmt::Debug for EnvTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnvTemplate")
            .field("source", &self.source)
            .finish()
    }
}

impl EnvTemplate {
    /// Parse a template string
    pub fn parse(source: &str) -> Result<Self> {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        env.add_template_owned(TEMPLATE_NAME, source.to_string())
            .map_err(|e| EngineError::Parse {
                template: source.to_string(),
                source: e,
            })?;

        Ok(Self {
            env,
            source: source.to_string(),
        })
    }

    /// Render with the process environment, overlaid by `vars`
    pub fn execute(&self, vars: Option<&BTreeMap<String, String>>) -> Result<String> {
        let mut context = env_context(std::env::vars_os());
        if let Some(vars) = vars {
            context.extend(vars.iter().map(|(k, v)| (k.clone(), v.clone())));
        }

        let render_error = |e| EngineError::Render {
            template: self.source.clone(),
            source: e,
        };

        self.env
            .get_template(TEMPLATE_NAME)
            .map_err(render_error)?
            .render(&context)
            .map_err(render_error)
    }

    /// The original template source
    pub fn source(&self) -> &str {
        &self.source
    }
}

/// Template context from environment entries
///
/// Entries whose name or value is not valid UTF-8 cannot be named by a
/// template and are skipped.
fn env_context(vars: impl IntoIterator<Item = (OsString, OsString)>) -> BTreeMap<String, String> {
    vars.into_iter()
        .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
        .collect()
}

/// Parse and execute `source` with an optional variable map
pub fn expand(source: &str, vars: Option<&BTreeMap<String, String>>) -> Result<String> {
    EnvTemplate::parse(source)?.execute(vars)
}
