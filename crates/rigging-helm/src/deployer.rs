//! Helm deployer: install or upgrade every configured release
//!
//! Releases are deployed one after the other in declaration order. The first
//! failure aborts the deploy; releases that already succeeded stay applied.

use console::style;
use once_cell::sync::OnceCell;
use rigging_core::{BuildArtifact, DeployedArtifact, HelmDeploy, HelmRelease};
use semver::Version;
use std::collections::BTreeSet;
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::args::{InstallOptions, ValuesSetTracker, install_args};
use crate::binder::pair_params_to_artifacts;
use crate::error::{HelmError, Result};
use crate::package::{locate_archive, package_args, package_destination};
use crate::release_info::parse_release_info;
use crate::runner::CommandRunner;
use crate::version::{HelmSyntax, VERSION_ARGS, parse_version};

/// Name of the overrides values file written next to the working directory
pub const OVERRIDES_FILENAME: &str = "rigging-overrides.yaml";

/// Options shared by every release of a deploy
#[derive(Debug, Clone, Default)]
pub struct DeployerOptions {
    /// `--kube-context` for every invocation
    pub kube_context: String,

    /// `--kubeconfig` for every invocation
    pub kube_config: String,

    /// Namespace that overrides every release's namespace
    pub namespace: String,

    /// Pass `--force` to upgrades
    pub force: bool,

    /// Directory for the overrides file, the current directory when unset
    pub work_dir: Option<PathBuf>,

    /// Fixed packaging directory, only for predictable test output
    pub package_dir: Option<PathBuf>,
}

/// Outcome of a successful deploy
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeployResult {
    /// Objects reported by helm for every release
    pub artifacts: Vec<DeployedArtifact>,

    /// Distinct non-empty namespaces, sorted
    pub namespaces: Vec<String>,

    /// Builds that no release referenced
    pub unused_images: Vec<BuildArtifact>,
}

struct ReleaseOutcome {
    namespace: String,
    artifacts: Vec<DeployedArtifact>,
}

/// Overrides values file, removed when dropped
struct OverridesFile {
    path: PathBuf,
}

impl OverridesFile {
    fn write(path: PathBuf, overrides: &serde_yaml::Mapping) -> Result<Self> {
        let content = serde_yaml::to_string(overrides).map_err(HelmError::OverridesMarshal)?;
        std::fs::write(&path, content).map_err(|source| HelmError::OverridesWrite {
            path: path.display().to_string(),
            source,
        })?;
        Ok(Self { path })
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for OverridesFile {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            debug!("cannot remove {}: {}", self.path.display(), e);
        }
    }
}

/// Deploys helm releases through a [`CommandRunner`]
pub struct HelmDeployer<R: CommandRunner> {
    config: HelmDeploy,
    options: DeployerOptions,
    runner: R,
    /// Resolved once, never holds 0.0.0
    bin_version: OnceCell<Version>,
}

impl<R: CommandRunner> HelmDeployer<R> {
    pub fn new(config: HelmDeploy, options: DeployerOptions, runner: R) -> Self {
        Self {
            config,
            options,
            runner,
            bin_version: OnceCell::new(),
        }
    }

    /// Get the runner
    pub fn runner(&self) -> &R {
        &self.runner
    }

    pub fn releases(&self) -> &[HelmRelease] {
        &self.config.releases
    }

    // ========== Deploy ==========

    /// Deploy every release with the given builds
    ///
    /// helm output is written to `out`. Builds whose tag no release consumed
    /// are reported as warnings and returned in the result.
    pub async fn deploy(
        &self,
        out: &mut (dyn Write + Send),
        builds: &[BuildArtifact],
        cancel: &CancellationToken,
    ) -> Result<DeployResult> {
        let syntax = self.syntax(cancel).await?;

        let mut artifacts = Vec::new();
        let mut namespaces = BTreeSet::new();
        let mut values_set = ValuesSetTracker::new();

        for release in &self.config.releases {
            let release_name = expand_release_name(release)?;

            let outcome = self
                .deploy_release(out, release, &release_name, builds, &mut values_set, syntax, cancel)
                .await
                .map_err(|e| e.in_release(&release_name))?;

            let namespace = outcome.namespace.trim();
            if !namespace.is_empty() {
                namespaces.insert(namespace.to_string());
            }
            artifacts.extend(outcome.artifacts);
        }

        // Every built tag should reach a chart through --set or --set-string,
        // otherwise the chart keeps deploying the unbuilt image.
        let unused_images: Vec<BuildArtifact> =
            values_set.unused(builds).into_iter().cloned().collect();
        for build in &unused_images {
            warn!("image [{}] is not used.", build.tag);
            warn!("image [{}] is used instead.", build.image_name);
        }

        Ok(DeployResult {
            artifacts,
            namespaces: namespaces.into_iter().collect(),
            unused_images,
        })
    }

    #[allow(clippy::too_many_arguments)]
    async fn deploy_release(
        &self,
        out: &mut (dyn Write + Send),
        release: &HelmRelease,
        release_name: &str,
        builds: &[BuildArtifact],
        values_set: &mut ValuesSetTracker,
        syntax: HelmSyntax,
        cancel: &CancellationToken,
    ) -> Result<ReleaseOutcome> {
        // Bind images before helm touches the chart or the cluster.
        let params = pair_params_to_artifacts(builds, &release.values)?;

        let mut opts = InstallOptions {
            release_name: release_name.to_string(),
            chart_path: release.chart_path.clone(),
            flags: self.config.flags.upgrade.clone(),
            upgrade: true,
            force: self.options.force,
            syntax,
            ..Default::default()
        };

        match self.exec(false, syntax.get_args(release_name), cancel).await {
            Ok(_) => {}
            Err(e) if e.is_cancelled() => return Err(e),
            Err(_) => {
                writeln!(
                    out,
                    "{}",
                    style(format!("Helm release {release_name} not installed. Installing..."))
                        .yellow()
                )?;
                opts.upgrade = false;
                opts.flags = self.config.flags.install.clone();
            }
        }

        opts.namespace = if self.options.namespace.is_empty() {
            release.namespace.clone()
        } else {
            self.options.namespace.clone()
        };

        // Only build local dependencies, but allow a user to skip them.
        if !release.skip_build_dependencies && !release.remote {
            info!("Building helm dependencies...");
            let args = vec![
                "dep".to_string(),
                "build".to_string(),
                release.chart_path.clone(),
            ];
            let output = self
                .exec(false, args, cancel)
                .await
                .map_err(|e| HelmError::DependencyBuild(Box::new(e)))?;
            out.write_all(output.as_bytes())?;
        }

        // Lives until the release returns, on every path.
        let overrides = if release.overrides.is_empty() {
            None
        } else {
            Some(OverridesFile::write(self.overrides_path(), &release.overrides)?)
        };
        opts.overrides_file = overrides
            .as_ref()
            .map(|file| file.path().to_string_lossy().into_owned());

        if release.packaged.is_some() {
            let archive = self.package_chart(release, cancel).await?;
            opts.chart_path = archive.to_string_lossy().into_owned();
        }

        let args = install_args(release, builds, &params, values_set, &opts)?;
        let output = self.exec(release.use_helm_secrets, args, cancel).await?;
        out.write_all(output.as_bytes())?;

        // The release is deployed; the query only enriches the result.
        let artifacts = match self.exec(false, syntax.get_args(release_name), cancel).await {
            Ok(info) => parse_release_info(&opts.namespace, &info),
            Err(e) if e.is_cancelled() => return Err(e),
            Err(e) => {
                warn!("{}", e);
                Vec::new()
            }
        };

        Ok(ReleaseOutcome {
            namespace: opts.namespace,
            artifacts,
        })
    }

    fn overrides_path(&self) -> PathBuf {
        match &self.options.work_dir {
            Some(dir) => dir.join(OVERRIDES_FILENAME),
            None => PathBuf::from(OVERRIDES_FILENAME),
        }
    }

    /// Package the release's chart and return the archive path
    async fn package_chart(
        &self,
        release: &HelmRelease,
        cancel: &CancellationToken,
    ) -> Result<PathBuf> {
        let destination = package_destination(self.options.package_dir.as_deref())?;
        let args = package_args(release, &destination)?;

        let output = self
            .exec(false, args.clone(), cancel)
            .await
            .map_err(|e| HelmError::PackageCommand {
                args,
                source: Box::new(e),
            })?;

        locate_archive(&output, &destination).ok_or(HelmError::ArchiveNotFound)
    }

    // ========== Cleanup ==========

    /// Delete every release
    pub async fn cleanup(
        &self,
        out: &mut (dyn Write + Send),
        cancel: &CancellationToken,
    ) -> Result<()> {
        let syntax = self.syntax(cancel).await?;

        for release in &self.config.releases {
            let release_name = expand_release_name(release)?;

            let output = self
                .exec(false, syntax.delete_args(&release_name), cancel)
                .await
                .map_err(|e| HelmError::Delete {
                    name: release_name.clone(),
                    source: Box::new(e),
                })?;
            out.write_all(output.as_bytes())?;
        }
        Ok(())
    }

    // ========== Dependencies ==========

    /// Files the configured releases depend on, sorted
    pub fn dependencies(&self) -> Result<Vec<String>> {
        crate::dependencies::dependencies(&self.config.releases)
    }

    // ========== Binary version ==========

    /// Version of the helm binary, resolved on first use
    pub async fn bin_version(&self, cancel: &CancellationToken) -> Result<Version> {
        if let Some(version) = self.bin_version.get() {
            return Ok(version.clone());
        }

        let args = VERSION_ARGS.iter().map(|s| s.to_string()).collect();
        let output = self.exec(false, args, cancel).await?;
        let version = parse_version(&output)?;

        // 0.0.0 means unknown: resolve again next time.
        if version != Version::new(0, 0, 0) {
            let _ = self.bin_version.set(version.clone());
        }
        Ok(version)
    }

    /// Syntax for the binary in use; an unknown version falls back to Helm 2
    async fn syntax(&self, cancel: &CancellationToken) -> Result<HelmSyntax> {
        match self.bin_version(cancel).await {
            Ok(version) => {
                debug!("deploying with helm version {}", version);
                Ok(HelmSyntax::for_version(Some(&version)))
            }
            Err(e) if e.is_cancelled() => Err(e),
            Err(e) => {
                debug!("failed to parse binary version: {}", e);
                Ok(HelmSyntax::V2)
            }
        }
    }

    // ========== Invocation ==========

    /// Full argument vector for an invocation
    ///
    /// Everything but `version` targets the configured cluster context, gets
    /// the global flags, and runs through the secrets plugin when asked.
    pub fn command_args(&self, use_secrets: bool, args: Vec<String>) -> Vec<String> {
        if args.first().is_some_and(|a| a == "version") {
            return args;
        }

        let mut full = Vec::with_capacity(args.len() + 6);
        if use_secrets {
            full.push("secrets".to_string());
        }
        if !self.options.kube_context.is_empty() {
            full.extend(["--kube-context".to_string(), self.options.kube_context.clone()]);
        }
        full.extend(args);
        full.extend(self.config.flags.global.iter().cloned());
        if !self.options.kube_config.is_empty() {
            full.extend(["--kubeconfig".to_string(), self.options.kube_config.clone()]);
        }
        full
    }

    async fn exec(
        &self,
        use_secrets: bool,
        args: Vec<String>,
        cancel: &CancellationToken,
    ) -> Result<String> {
        let args = self.command_args(use_secrets, args);
        self.runner.run(&args, cancel).await
    }
}

fn expand_release_name(release: &HelmRelease) -> Result<String> {
    rigging_engine::expand(&release.name, None).map_err(|source| HelmError::NameTemplate {
        template: release.name.clone(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::{MockResponse, MockRunner};
    use rigging_core::{HelmDeployFlags, HelmPackaged};
    use tempfile::TempDir;

    const TEST_TAG: &str = "docker.io:5000/web-app:3605e7bc17cf46e53f4d81c4cbc24e5b4c495184";

    const GET_OUTPUT: &str = r#"REVISION: 1
CHART: web-app-0.1.0
MANIFEST:

---
apiVersion: v1
kind: Service
metadata:
  name: web-app
---
apiVersion: apps/v1
kind: Deployment
metadata:
  name: web-app
"#;

    fn test_release(name: &str) -> HelmRelease {
        let mut release = HelmRelease::new(name, "examples/test");
        release.values = [("image".to_string(), "web-app".to_string())]
            .into_iter()
            .collect();
        release
    }

    fn test_builds() -> Vec<BuildArtifact> {
        vec![BuildArtifact::new("web-app", TEST_TAG)]
    }

    fn deploy_config(releases: Vec<HelmRelease>) -> HelmDeploy {
        HelmDeploy {
            releases,
            flags: HelmDeployFlags::default(),
        }
    }

    fn v2_runner() -> MockRunner {
        MockRunner::new().on(&["version"], MockResponse::output("Client: v2.16.1+gbbdfe5e"))
    }

    fn deployer(
        releases: Vec<HelmRelease>,
        options: DeployerOptions,
        runner: MockRunner,
    ) -> HelmDeployer<MockRunner> {
        HelmDeployer::new(deploy_config(releases), options, runner)
    }

    /// Records the contents of the first `-f` file of each invocation while
    /// it still exists
    struct FileCapturingRunner {
        inner: MockRunner,
        files: std::sync::Mutex<Vec<(Vec<String>, String)>>,
    }

    impl FileCapturingRunner {
        fn new(inner: MockRunner) -> Self {
            Self {
                inner,
                files: std::sync::Mutex::new(Vec::new()),
            }
        }

        fn captured(&self, first: &[&str]) -> Option<String> {
            self.files
                .lock()
                .unwrap()
                .iter()
                .find(|(args, _)| args.iter().take(first.len()).eq(first.iter().copied()))
                .map(|(_, content)| content.clone())
        }
    }

    #[async_trait::async_trait]
    impl CommandRunner for FileCapturingRunner {
        async fn run(&self, args: &[String], cancel: &CancellationToken) -> Result<String> {
            if let Some(idx) = args.iter().position(|a| a == "-f") {
                if let Some(content) =
                    args.get(idx + 1).and_then(|path| std::fs::read_to_string(path).ok())
                {
                    self.files.lock().unwrap().push((args.to_vec(), content));
                }
            }
            self.inner.run(args, cancel).await
        }
    }

    fn find_call<'a>(calls: &'a [Vec<String>], first: &str) -> Option<&'a Vec<String>> {
        calls.iter().find(|c| c.first().map(String::as_str) == Some(first))
    }

    #[tokio::test]
    async fn test_install_when_release_missing() {
        let runner = v2_runner().on(&["get", "web-app"], MockResponse::failure("not found"));
        let d = deployer(vec![test_release("web-app")], DeployerOptions::default(), runner);
        let mut out = Vec::new();

        let result = d
            .deploy(&mut out, &test_builds(), &CancellationToken::new())
            .await
            .unwrap();

        let calls = d.runner().calls();
        let install = find_call(&calls, "install").unwrap();
        assert_eq!(&install[..4], ["install", "--name", "web-app", "examples/test"]);
        assert_eq!(d.runner().call_count(&["upgrade"]), 0);
        assert!(String::from_utf8(out).unwrap().contains("not installed. Installing..."));
        // the post-deploy query failed too: still a success, without artifacts
        assert!(result.artifacts.is_empty());
    }

    #[tokio::test]
    async fn test_upgrade_when_release_exists() {
        let runner = v2_runner().on(&["get", "web-app"], MockResponse::output(GET_OUTPUT));
        let mut release = test_release("web-app");
        release.namespace = "apps".to_string();
        let d = deployer(vec![release], DeployerOptions::default(), runner);

        let result = d
            .deploy(&mut Vec::new(), &test_builds(), &CancellationToken::new())
            .await
            .unwrap();

        let calls = d.runner().calls();
        assert_eq!(
            calls.iter().map(|c| c[0].as_str()).collect::<Vec<_>>(),
            ["version", "get", "dep", "upgrade", "get"]
        );
        assert_eq!(d.runner().call_count(&["install"]), 0);
        assert_eq!(result.artifacts.len(), 2);
        assert_eq!(result.artifacts[0].namespace, "apps");
        assert_eq!(result.namespaces, vec!["apps"]);
        assert!(result.unused_images.is_empty());
    }

    #[tokio::test]
    async fn test_force_only_on_upgrade() {
        let runner = v2_runner();
        let options = DeployerOptions {
            force: true,
            ..Default::default()
        };
        let d = deployer(vec![test_release("web-app")], options, runner);

        d.deploy(&mut Vec::new(), &test_builds(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(d.runner().call_count(&["upgrade", "web-app", "--force"]), 1);
    }

    #[tokio::test]
    async fn test_context_and_global_flags() {
        let runner = v2_runner();
        let mut config = deploy_config(vec![test_release("web-app")]);
        config.flags.global = vec!["--tls".to_string()];
        let options = DeployerOptions {
            kube_context: "kubecontext".to_string(),
            kube_config: "kubeconfig".to_string(),
            ..Default::default()
        };
        let d = HelmDeployer::new(config, options, runner);

        d.deploy(&mut Vec::new(), &test_builds(), &CancellationToken::new())
            .await
            .unwrap();

        let calls = d.runner().calls();
        assert_eq!(calls[0], ["version", "--short", "-c"]);
        assert_eq!(
            calls[1],
            [
                "--kube-context",
                "kubecontext",
                "get",
                "web-app",
                "--tls",
                "--kubeconfig",
                "kubeconfig"
            ]
        );
    }

    #[tokio::test]
    async fn test_secrets_plugin_prefix() {
        let mut release = test_release("web-app");
        release.use_helm_secrets = true;
        let d = deployer(vec![release], DeployerOptions::default(), v2_runner());

        d.deploy(&mut Vec::new(), &test_builds(), &CancellationToken::new())
            .await
            .unwrap();

        let calls = d.runner().calls();
        let secrets = find_call(&calls, "secrets").unwrap();
        assert_eq!(secrets[1], "upgrade");
        // queries never go through the plugin
        assert!(calls.iter().filter(|c| c.contains(&"get".to_string())).all(|c| c[0] == "get"));
    }

    #[tokio::test]
    async fn test_skips_dependency_build() {
        let mut skipped = test_release("skipped");
        skipped.skip_build_dependencies = true;
        let mut remote = test_release("remote");
        remote.remote = true;
        remote.values.clear();
        let d = deployer(vec![skipped, remote], DeployerOptions::default(), v2_runner());

        d.deploy(&mut Vec::new(), &test_builds(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(d.runner().call_count(&["dep", "build"]), 0);
    }

    #[tokio::test]
    async fn test_dependency_build_failure() {
        let runner = v2_runner().on(&["dep", "build"], MockResponse::failure("no Chart.yaml"));
        let d = deployer(vec![test_release("web-app")], DeployerOptions::default(), runner);

        let err = d
            .deploy(&mut Vec::new(), &test_builds(), &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(err.to_string().starts_with("deploying web-app: building helm dependencies"));
        assert_eq!(d.runner().call_count(&["upgrade"]), 0);
    }

    #[tokio::test]
    async fn test_first_failure_aborts_remaining_releases() {
        let runner = v2_runner().on(&["upgrade", "first"], MockResponse::failure("boom"));
        let d = deployer(
            vec![test_release("first"), test_release("second")],
            DeployerOptions::default(),
            runner,
        );

        let err = d
            .deploy(&mut Vec::new(), &test_builds(), &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, HelmError::Release { ref name, .. } if name == "first"));
        assert_eq!(d.runner().call_count(&["second"]), 0);
    }

    #[tokio::test]
    async fn test_release_name_template_error() {
        let d = deployer(
            vec![test_release("{{ RIGGING_UNDEFINED_RELEASE_NAME }}")],
            DeployerOptions::default(),
            v2_runner(),
        );

        let err = d
            .deploy(&mut Vec::new(), &test_builds(), &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            HelmError::NameTemplate { ref template, .. } if template == "{{ RIGGING_UNDEFINED_RELEASE_NAME }}"
        ));
        assert_eq!(d.runner().calls().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_build_has_no_side_effects() {
        let temp = TempDir::new().unwrap();
        let mut release = test_release("web-app");
        release.values.insert("other".to_string(), "not-built".to_string());
        release.overrides = serde_yaml::from_str("foo: bar\n").unwrap();
        release.packaged = Some(HelmPackaged {
            version: "0.1.2".to_string(),
            app_version: String::new(),
        });
        let options = DeployerOptions {
            work_dir: Some(temp.path().to_path_buf()),
            package_dir: Some(temp.path().to_path_buf()),
            ..Default::default()
        };
        let d = deployer(vec![release], options, v2_runner());
        let mut out = Vec::new();

        let err = d
            .deploy(&mut out, &test_builds(), &CancellationToken::new())
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "deploying web-app: no build present for not-built");
        assert_eq!(d.runner().calls(), vec![vec!["version", "--short", "-c"]]);
        assert_eq!(d.runner().call_count(&["dep", "build"]), 0);
        assert_eq!(d.runner().call_count(&["package"]), 0);
        assert!(out.is_empty());
        assert_eq!(std::fs::read_dir(temp.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_overrides_file_written_then_removed() {
        let temp = TempDir::new().unwrap();
        let mut release = test_release("web-app");
        release.overrides = serde_yaml::from_str("foo:\n  bar: baz\nreplicas: 2\n").unwrap();
        let options = DeployerOptions {
            work_dir: Some(temp.path().to_path_buf()),
            ..Default::default()
        };
        let d = HelmDeployer::new(
            deploy_config(vec![release.clone()]),
            options,
            FileCapturingRunner::new(v2_runner()),
        );

        d.deploy(&mut Vec::new(), &test_builds(), &CancellationToken::new())
            .await
            .unwrap();

        let overrides = temp.path().join(OVERRIDES_FILENAME);
        let overrides = overrides.to_string_lossy();
        assert_eq!(d.runner().inner.call_count(&["-f", overrides.as_ref()]), 1);

        let written = d.runner().captured(&["upgrade"]).unwrap();
        assert_eq!(written, serde_yaml::to_string(&release.overrides).unwrap());
        let parsed: serde_yaml::Mapping = serde_yaml::from_str(&written).unwrap();
        assert_eq!(parsed, release.overrides);

        assert!(!temp.path().join(OVERRIDES_FILENAME).exists());
    }

    #[tokio::test]
    async fn test_overrides_file_removed_after_failure() {
        let temp = TempDir::new().unwrap();
        let mut release = test_release("web-app");
        release.overrides = serde_yaml::from_str("foo: bar\n").unwrap();
        let options = DeployerOptions {
            work_dir: Some(temp.path().to_path_buf()),
            ..Default::default()
        };
        let runner = v2_runner().on(&["upgrade"], MockResponse::failure("boom"));
        let d = deployer(vec![release], options, runner);

        assert!(
            d.deploy(&mut Vec::new(), &test_builds(), &CancellationToken::new())
                .await
                .is_err()
        );
        assert!(!temp.path().join(OVERRIDES_FILENAME).exists());
    }

    #[tokio::test]
    async fn test_packaged_chart() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("web-app-0.1.2.tgz");
        let runner = v2_runner().on(
            &["package"],
            MockResponse::output(format!(
                "Successfully packaged chart and saved it to: {}\n",
                archive.display()
            )),
        );
        let mut release = test_release("web-app");
        release.version = "9.9.9".to_string();
        release.packaged = Some(HelmPackaged {
            version: "0.1.2".to_string(),
            app_version: "1.2.3".to_string(),
        });
        let options = DeployerOptions {
            package_dir: Some(temp.path().to_path_buf()),
            ..Default::default()
        };
        let d = deployer(vec![release], options, runner);

        d.deploy(&mut Vec::new(), &test_builds(), &CancellationToken::new())
            .await
            .unwrap();

        let calls = d.runner().calls();
        let package = find_call(&calls, "package").unwrap();
        assert!(package.ends_with(&[
            "--version".to_string(),
            "0.1.2".to_string(),
            "--app-version".to_string(),
            "1.2.3".to_string()
        ]));
        let upgrade = find_call(&calls, "upgrade").unwrap();
        assert_eq!(upgrade[2], archive.to_string_lossy());
        assert!(!upgrade.contains(&"--version".to_string()));
    }

    #[tokio::test]
    async fn test_packaged_chart_archive_not_found() {
        let temp = TempDir::new().unwrap();
        let runner = v2_runner().on(&["package"], MockResponse::output("packaged somewhere"));
        let mut release = test_release("web-app");
        release.packaged = Some(HelmPackaged::default());
        let options = DeployerOptions {
            package_dir: Some(temp.path().to_path_buf()),
            ..Default::default()
        };
        let d = deployer(vec![release], options, runner);

        let err = d
            .deploy(&mut Vec::new(), &test_builds(), &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(err.to_string().contains("cannot locate packaged chart archive"));
    }

    #[tokio::test]
    async fn test_unused_images_reported() {
        let builds = vec![
            BuildArtifact::new("web-app", TEST_TAG),
            BuildArtifact::new("unreferenced", "unreferenced:v1"),
        ];
        let d = deployer(
            vec![test_release("web-app")],
            DeployerOptions::default(),
            v2_runner(),
        );

        let result = d
            .deploy(&mut Vec::new(), &builds, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(result.unused_images, vec![builds[1].clone()]);
    }

    #[tokio::test]
    async fn test_namespace_override_and_collection() {
        let mut a = test_release("a");
        a.namespace = "team-a".to_string();
        let mut b = test_release("b");
        b.namespace = " team-b ".to_string();
        let c = test_release("c");

        let d = deployer(vec![a.clone(), b.clone(), c.clone()], DeployerOptions::default(), v2_runner());
        let result = d
            .deploy(&mut Vec::new(), &test_builds(), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(result.namespaces, vec!["team-a", "team-b"]);

        let options = DeployerOptions {
            namespace: "override".to_string(),
            ..Default::default()
        };
        let d = deployer(vec![a, b, c], options, v2_runner());
        let result = d
            .deploy(&mut Vec::new(), &test_builds(), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(result.namespaces, vec!["override"]);
        assert_eq!(d.runner().call_count(&["--namespace", "override"]), 3);
    }

    #[tokio::test]
    async fn test_cancelled_deploy() {
        let d = deployer(
            vec![test_release("web-app")],
            DeployerOptions::default(),
            v2_runner(),
        );
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = d.deploy(&mut Vec::new(), &test_builds(), &cancel).await.unwrap_err();

        assert!(err.is_cancelled());
        assert_eq!(d.runner().call_count(&["upgrade"]), 0);
    }

    #[tokio::test]
    async fn test_helm3_syntax() {
        let runner = MockRunner::new()
            .on(&["version"], MockResponse::output("v3.1.0+gb29d20b"))
            .on(&["get"], MockResponse::failure("not found"));
        let d = deployer(vec![test_release("web-app")], DeployerOptions::default(), runner);

        d.deploy(&mut Vec::new(), &test_builds(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(d.runner().call_count(&["get", "all", "web-app"]), 2);
        assert_eq!(d.runner().call_count(&["install", "web-app", "examples/test"]), 1);
    }

    #[tokio::test]
    async fn test_unknown_version_uses_helm2_syntax() {
        let runner = MockRunner::new()
            .on(&["version"], MockResponse::failure("unknown command"))
            .on(&["get"], MockResponse::failure("not found"));
        let d = deployer(vec![test_release("web-app")], DeployerOptions::default(), runner);

        d.deploy(&mut Vec::new(), &test_builds(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(d.runner().call_count(&["install", "--name", "web-app"]), 1);
    }

    #[tokio::test]
    async fn test_bin_version_cached() {
        let d = deployer(vec![], DeployerOptions::default(), v2_runner());
        let cancel = CancellationToken::new();

        let first = d.bin_version(&cancel).await.unwrap();
        let second = d.bin_version(&cancel).await.unwrap();

        assert_eq!(first, Version::new(2, 16, 1));
        assert_eq!(first, second);
        assert_eq!(d.runner().call_count(&["version"]), 1);
    }

    #[tokio::test]
    async fn test_zero_version_not_cached() {
        let runner = MockRunner::new().on(&["version"], MockResponse::output("v0.0.0"));
        let d = deployer(vec![], DeployerOptions::default(), runner);
        let cancel = CancellationToken::new();

        d.bin_version(&cancel).await.unwrap();
        d.bin_version(&cancel).await.unwrap();

        assert_eq!(d.runner().call_count(&["version"]), 2);
    }

    #[tokio::test]
    async fn test_cleanup() {
        let mut config = deploy_config(vec![test_release("first"), test_release("second")]);
        config.flags.global = vec!["--tls".to_string()];
        let d = HelmDeployer::new(config, DeployerOptions::default(), v2_runner());

        d.cleanup(&mut Vec::new(), &CancellationToken::new())
            .await
            .unwrap();

        let calls = d.runner().calls();
        assert_eq!(calls[1], ["delete", "first", "--purge", "--tls"]);
        assert_eq!(calls[2], ["delete", "second", "--purge", "--tls"]);
    }

    #[tokio::test]
    async fn test_cleanup_failure() {
        let runner = v2_runner().on(&["delete", "first"], MockResponse::failure("boom"));
        let d = deployer(
            vec![test_release("first"), test_release("second")],
            DeployerOptions::default(),
            runner,
        );

        let err = d
            .cleanup(&mut Vec::new(), &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, HelmError::Delete { ref name, .. } if name == "first"));
        assert_eq!(d.runner().call_count(&["second"]), 0);
    }

    #[test]
    fn test_dependencies_of_remote_releases() {
        let mut release = test_release("web-app");
        release.remote = true;
        release.values_files = vec!["values.yaml".to_string()];
        let d = deployer(vec![release], DeployerOptions::default(), MockRunner::new());

        assert_eq!(d.dependencies().unwrap(), vec!["values.yaml"]);
    }
}
