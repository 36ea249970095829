//! Rigging Engine - template expansion for release configuration
//!
//! Release names, `setValueTemplates`, values file paths and packaging
//! versions are MiniJinja templates rendered against the process
//! environment, optionally overlaid with build variables such as
//! `IMAGE_NAME` or `DIGEST`.

pub mod error;
pub mod template;

pub use error::{EngineError, Result};
pub use template::{EnvTemplate, expand};
