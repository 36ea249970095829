//! Rigging Core - Core types for the Helm deployment engine
//!
//! This crate provides the foundational types used throughout rigging:
//! - `HelmDeploy` / `HelmRelease`: The declarative release configuration
//! - `BuildArtifact`: An image produced by the build phase
//! - `DeployedArtifact`: A Kubernetes object recovered after a deploy
//! - `ImageReference`: Container image reference decomposition

pub mod artifact;
pub mod config;
pub mod error;
pub mod image;

pub use artifact::{BuildArtifact, DeployedArtifact};
pub use config::{
    HelmConventionConfig, HelmDeploy, HelmDeployFlags, HelmPackaged, HelmRelease, ImageStrategy,
    RiggingConfig,
};
pub use error::{CoreError, Result};
pub use image::ImageReference;
