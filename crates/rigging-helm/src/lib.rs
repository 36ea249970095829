//! Rigging Helm - deploy Helm releases with freshly built images
//!
//! This crate provides:
//! - **Deployer**: Install-or-upgrade orchestration across releases with cleanup
//! - **Runner**: The `helm` process capability, with a mock for tests
//! - **Version**: Binary version detection and version-specific syntax
//! - **Dependencies**: File sets that should trigger a redeploy
//! - **Packaging**: `helm package` with version overrides
//! - **Binding**: Build artifacts mapped onto chart values
//! - **Args**: Deterministic `install`/`upgrade` argument vectors
//! - **Release info**: Kubernetes objects recovered from `helm get`

pub mod args;
pub mod binder;
pub mod dependencies;
pub mod deployer;
pub mod error;
pub mod package;
pub mod release_info;
pub mod runner;
pub mod version;

pub use args::{InstallOptions, ValuesSetTracker, env_var_for_image, install_args};
pub use binder::{image_set_from_config, pair_params_to_artifacts};
pub use dependencies::dependencies;
pub use deployer::{DeployResult, DeployerOptions, HelmDeployer, OVERRIDES_FILENAME};
pub use error::{HelmError, Result};
pub use package::locate_archive;
pub use release_info::parse_release_info;
pub use runner::{CommandRunner, MockResponse, MockRunner, ProcessRunner};
pub use version::{HelmSyntax, parse_version};
