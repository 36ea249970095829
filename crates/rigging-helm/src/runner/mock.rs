//! Mock runner for testing
//!
//! Returns canned output for invocations matching an argument window and
//! records every invocation, so tests can assert on exact argument vectors
//! without a helm binary.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;

use super::{CommandRunner, display_command};
use crate::error::{HelmError, Result};

/// Canned result for a matched invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockResponse {
    /// Succeed with this combined output
    Output(String),
    /// Exit non-zero with this combined output
    Failure(String),
}

impl MockResponse {
    pub fn output(output: impl Into<String>) -> Self {
        Self::Output(output.into())
    }

    pub fn failure(output: impl Into<String>) -> Self {
        Self::Failure(output.into())
    }
}

/// In-memory runner for testing
#[derive(Clone, Default)]
pub struct MockRunner {
    /// Rules checked in registration order; the first match wins
    rules: Arc<Mutex<Vec<(Vec<String>, MockResponse)>>>,
    /// Every invocation, in order
    calls: Arc<Mutex<Vec<Vec<String>>>>,
}

impl MockRunner {
    /// Create a runner that succeeds with empty output for everything
    pub fn new() -> Self {
        Self::default()
    }

    /// Respond to invocations containing `pattern` as a contiguous window
    pub fn on(self, pattern: &[&str], response: MockResponse) -> Self {
        self.rules.lock().unwrap().push((
            pattern.iter().map(|s| s.to_string()).collect(),
            response,
        ));
        self
    }

    /// Every invocation so far
    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of invocations containing `pattern`
    pub fn call_count(&self, pattern: &[&str]) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|args| contains_window(args, pattern))
            .count()
    }
}

fn contains_window(args: &[String], pattern: &[impl AsRef<str>]) -> bool {
    pattern.is_empty()
        || args
            .windows(pattern.len())
            .any(|w| w.iter().zip(pattern).all(|(a, p)| a == p.as_ref()))
}

#[async_trait]
impl CommandRunner for MockRunner {
    async fn run(&self, args: &[String], cancel: &CancellationToken) -> Result<String> {
        self.calls.lock().unwrap().push(args.to_vec());

        let command = display_command("helm", args);
        if cancel.is_cancelled() {
            return Err(HelmError::Cancelled { command });
        }

        let response = self
            .rules
            .lock()
            .unwrap()
            .iter()
            .find(|(pattern, _)| contains_window(args, pattern.as_slice()))
            .map(|(_, response)| response.clone());

        match response {
            Some(MockResponse::Failure(output)) => Err(HelmError::CommandFailed {
                command,
                status: "exit status: 1".to_string(),
                output,
            }),
            Some(MockResponse::Output(output)) => Ok(output),
            None => Ok(String::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_first_matching_rule_wins() {
        let runner = MockRunner::new()
            .on(&["get", "foo"], MockResponse::failure("not found"))
            .on(&["get"], MockResponse::output("REVISION: 1"));
        let cancel = CancellationToken::new();

        assert!(runner.run(&args(&["get", "foo"]), &cancel).await.is_err());
        assert_eq!(
            runner.run(&args(&["get", "bar"]), &cancel).await.unwrap(),
            "REVISION: 1"
        );
        assert_eq!(runner.run(&args(&["dep", "build"]), &cancel).await.unwrap(), "");
    }

    #[tokio::test]
    async fn test_records_calls() {
        let runner = MockRunner::new();
        let cancel = CancellationToken::new();
        runner
            .run(&args(&["--kube-context", "kind", "get", "foo"]), &cancel)
            .await
            .unwrap();
        runner.run(&args(&["version"]), &cancel).await.unwrap();

        assert_eq!(runner.calls().len(), 2);
        assert_eq!(runner.call_count(&["get", "foo"]), 1);
        assert_eq!(runner.call_count(&["kind", "version"]), 0);
    }

    #[tokio::test]
    async fn test_cancelled_token() {
        let runner = MockRunner::new();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = runner.run(&args(&["get", "foo"]), &cancel).await.unwrap_err();
        assert!(err.is_cancelled());
    }
}
