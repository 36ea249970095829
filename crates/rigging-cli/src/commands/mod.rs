//! CLI commands

pub mod cleanup;
pub mod deploy;
pub mod deps;
pub mod version;
