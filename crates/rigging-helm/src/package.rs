//! Chart packaging with `helm package`

use rigging_core::HelmRelease;
use std::path::{Path, PathBuf};

use crate::error::{HelmError, Result};

const TEMP_DIR_PREFIX: &str = "rigging-helm";

/// Directory that receives the packaged archive
///
/// A fixed directory is only used by tests that need predictable output.
/// Otherwise a fresh directory is created for every package so two archives
/// with the same name can never collide. The directory is left on disk: the
/// archive must outlive this call.
pub fn package_destination(fixed: Option<&Path>) -> Result<PathBuf> {
    match fixed {
        Some(dir) => Ok(dir.to_path_buf()),
        None => tempfile::Builder::new()
            .prefix(TEMP_DIR_PREFIX)
            .tempdir()
            .map(|dir| dir.keep())
            .map_err(HelmError::TempDir),
    }
}

/// Arguments to `helm package`, with `packaged.version` and
/// `packaged.appVersion` expanded
pub fn package_args(release: &HelmRelease, destination: &Path) -> Result<Vec<String>> {
    let mut args = vec![
        "package".to_string(),
        release.chart_path.clone(),
        "--destination".to_string(),
        destination.to_string_lossy().into_owned(),
    ];

    let Some(packaged) = &release.packaged else {
        return Ok(args);
    };

    if !packaged.version.is_empty() {
        let version = rigging_engine::expand(&packaged.version, None).map_err(|source| {
            HelmError::Concretize {
                field: "packaged.version",
                source,
            }
        })?;
        args.extend(["--version".to_string(), version]);
    }

    if !packaged.app_version.is_empty() {
        let app_version =
            rigging_engine::expand(&packaged.app_version, None).map_err(|source| {
                HelmError::Concretize {
                    field: "packaged.appVersion",
                    source,
                }
            })?;
        args.extend(["--app-version".to_string(), app_version]);
    }

    Ok(args)
}

/// Find the archive path in `helm package` output
///
/// helm reports `Successfully packaged chart and saved it to: <dest>/<file>`;
/// everything after the destination directory is the archive file name.
pub fn locate_archive(output: &str, destination: &Path) -> Option<PathBuf> {
    let output = output.trim();
    let destination_str = destination.to_string_lossy();

    let idx = output.find(destination_str.as_ref())?;
    let file = output[idx + destination_str.len()..].trim_start_matches(['/', '\\']);

    Some(destination.join(file))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rigging_core::HelmPackaged;

    fn packaged_release(version: &str, app_version: &str) -> HelmRelease {
        let mut release = HelmRelease::new("web-app", "examples/test");
        release.packaged = Some(HelmPackaged {
            version: version.to_string(),
            app_version: app_version.to_string(),
        });
        release
    }

    #[test]
    fn test_package_args_with_versions() {
        let release = packaged_release("0.1.2", "1.2.3");
        let args = package_args(&release, Path::new("/tmp/pkg")).unwrap();

        assert_eq!(
            args,
            [
                "package",
                "examples/test",
                "--destination",
                "/tmp/pkg",
                "--version",
                "0.1.2",
                "--app-version",
                "1.2.3"
            ]
        );
    }

    #[test]
    fn test_package_args_without_versions() {
        let release = packaged_release("", "");
        let args = package_args(&release, Path::new("/tmp/pkg")).unwrap();

        assert_eq!(args, ["package", "examples/test", "--destination", "/tmp/pkg"]);
    }

    #[test]
    fn test_package_args_bad_template() {
        let release = packaged_release("{{ RIGGING_UNDEFINED_PACKAGE_VERSION }}", "");
        let err = package_args(&release, Path::new("/tmp/pkg")).unwrap_err();

        assert!(matches!(
            err,
            HelmError::Concretize {
                field: "packaged.version",
                ..
            }
        ));
    }

    #[test]
    fn test_package_args_bad_app_version_template() {
        let release = packaged_release("1.0.0", "{{ oops");
        let err = package_args(&release, Path::new("/tmp/pkg")).unwrap_err();

        assert!(err.to_string().contains("packaged.appVersion"));
    }

    #[test]
    fn test_locate_archive() {
        let output = "Successfully packaged chart and saved it to: /tmp/pkg/web-app-0.1.2.tgz\n";
        let path = locate_archive(output, Path::new("/tmp/pkg")).unwrap();

        assert_eq!(path, PathBuf::from("/tmp/pkg/web-app-0.1.2.tgz"));
    }

    #[test]
    fn test_locate_archive_missing() {
        assert!(locate_archive("Error: something went wrong", Path::new("/tmp/pkg")).is_none());
    }

    #[test]
    fn test_fixed_destination() {
        let dir = package_destination(Some(Path::new("/tmp/fixed"))).unwrap();
        assert_eq!(dir, PathBuf::from("/tmp/fixed"));
    }

    #[test]
    fn test_fresh_destinations_are_unique() {
        let first = package_destination(None).unwrap();
        let second = package_destination(None).unwrap();

        assert_ne!(first, second);
        assert!(first.is_dir());

        std::fs::remove_dir_all(first).unwrap();
        std::fs::remove_dir_all(second).unwrap();
    }
}
