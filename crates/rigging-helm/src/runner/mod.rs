//! The `helm` command capability
//!
//! The deployer never spawns processes itself: every invocation goes through a
//! [`CommandRunner`], so tests can substitute [`MockRunner`] for the real binary.

mod mock;
mod process;

pub use mock::{MockResponse, MockRunner};
pub use process::ProcessRunner;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::Result;

/// Runs one helm invocation and returns its combined stdout and stderr
///
/// Implementations must stop the invocation and return
/// [`HelmError::Cancelled`](crate::HelmError::Cancelled) once `cancel` fires.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, args: &[String], cancel: &CancellationToken) -> Result<String>;
}

/// Render an invocation for logs and error messages
pub(crate) fn display_command(binary: &str, args: &[String]) -> String {
    std::iter::once(binary)
        .chain(args.iter().map(String::as_str))
        .collect::<Vec<_>>()
        .join(" ")
}
