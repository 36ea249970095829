//! Standard exit codes for CLI operations
//!
//! These exit codes follow Unix conventions and sysexits.h where applicable.

/// Configuration error - missing or invalid rigging.yaml or builds file
pub const CONFIG_ERROR: i32 = 2;

/// Deploy error - a helm invocation failed
pub const DEPLOY_ERROR: i32 = 3;

/// IO error - file not found, permission denied, etc.
pub const IO_ERROR: i32 = 5;

/// Interrupted - cancelled with Ctrl-C (128 + SIGINT)
pub const INTERRUPTED: i32 = 130;
