//! Binding build artifacts to chart values

use indexmap::IndexMap;
use rigging_core::{BuildArtifact, HelmConventionConfig, ImageReference};
use std::collections::HashMap;

use crate::error::{HelmError, Result};

/// Associate each chart parameter with the build that produced its image
///
/// Parameters keep their declaration order. An image without a build is an
/// error: deploying would leave a dangling image reference in the chart.
pub fn pair_params_to_artifacts(
    builds: &[BuildArtifact],
    params: &IndexMap<String, String>,
) -> Result<IndexMap<String, BuildArtifact>> {
    let image_to_build: HashMap<&str, &BuildArtifact> = builds
        .iter()
        .map(|b| (b.image_name.as_str(), b))
        .collect();

    params
        .iter()
        .map(|(param, image_name)| {
            image_to_build
                .get(image_name.as_str())
                .map(|build| (param.clone(), (*build).clone()))
                .ok_or_else(|| HelmError::NoBuildPresent {
                    image: image_name.clone(),
                })
        })
        .collect()
}

/// The `--set-string` value for one bound parameter
///
/// - no convention: `param=tag`
/// - convention: `param.repository=<base name>,param.tag=<tag[@digest]>`
/// - explicit registry: `param.registry=<domain>,param.repository=<path>,param.tag=<tag[@digest]>`
pub fn image_set_from_config(
    cfg: Option<&HelmConventionConfig>,
    value_name: &str,
    tag: &str,
) -> Result<String> {
    let Some(cfg) = cfg else {
        return Ok(format!("{value_name}={tag}"));
    };

    let reference = ImageReference::parse(tag).map_err(|source| HelmError::ImageReference {
        reference: tag.to_string(),
        source,
    })?;
    let image_tag = reference.tag_with_digest();

    if cfg.explicit_registry {
        if reference.domain.is_empty() {
            return Err(HelmError::NoDomain {
                reference: tag.to_string(),
            });
        }
        return Ok(format!(
            "{value_name}.registry={},{value_name}.repository={},{value_name}.tag={image_tag}",
            reference.domain, reference.path
        ));
    }

    Ok(format!(
        "{value_name}.repository={},{value_name}.tag={image_tag}",
        reference.base_name
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    const DIGEST: &str = "sha256:e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

    fn params(pairs: &[(&str, &str)]) -> IndexMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_pair_params() {
        let builds = vec![
            BuildArtifact::new("web-app", "web-app:v1"),
            BuildArtifact::new("sidecar", "sidecar:v2"),
        ];
        let paired = pair_params_to_artifacts(
            &builds,
            &params(&[("sidecar.image", "sidecar"), ("image", "web-app")]),
        )
        .unwrap();

        assert_eq!(
            paired.keys().collect::<Vec<_>>(),
            vec!["sidecar.image", "image"]
        );
        assert_eq!(paired["image"].tag, "web-app:v1");
    }

    #[test]
    fn test_pair_params_missing_build() {
        let builds = vec![BuildArtifact::new("web-app", "web-app:v1")];
        let err = pair_params_to_artifacts(&builds, &params(&[("image", "other")])).unwrap_err();

        assert!(matches!(err, HelmError::NoBuildPresent { ref image } if image == "other"));
        assert_eq!(err.to_string(), "no build present for other");
    }

    #[test]
    fn test_no_convention() {
        let value = image_set_from_config(None, "param", "myrepo/img:v1").unwrap();
        assert_eq!(value, "param=myrepo/img:v1");
    }

    #[test]
    fn test_default_convention() {
        let cfg = HelmConventionConfig::default();
        let value = image_set_from_config(Some(&cfg), "param", "myrepo/img:v1").unwrap();

        assert_eq!(value, "param.repository=myrepo/img,param.tag=v1");
    }

    #[test]
    fn test_default_convention_with_digest() {
        let cfg = HelmConventionConfig::default();
        let tag = format!("gcr.io/myrepo/img:v1@{DIGEST}");
        let value = image_set_from_config(Some(&cfg), "param", &tag).unwrap();

        assert_eq!(
            value,
            format!("param.repository=gcr.io/myrepo/img,param.tag=v1@{DIGEST}")
        );
    }

    #[test]
    fn test_explicit_registry() {
        let cfg = HelmConventionConfig {
            explicit_registry: true,
        };
        let value = image_set_from_config(Some(&cfg), "param", "gcr.io/myrepo/img:v1").unwrap();

        assert_eq!(
            value,
            "param.registry=gcr.io,param.repository=myrepo/img,param.tag=v1"
        );
    }

    #[test]
    fn test_explicit_registry_without_domain() {
        let cfg = HelmConventionConfig {
            explicit_registry: true,
        };
        let err = image_set_from_config(Some(&cfg), "param", "myrepo/img:v1").unwrap_err();

        assert!(matches!(err, HelmError::NoDomain { .. }));
    }

    #[test]
    fn test_invalid_reference() {
        let cfg = HelmConventionConfig::default();
        let err = image_set_from_config(Some(&cfg), "param", "Not A Reference").unwrap_err();

        assert!(matches!(err, HelmError::ImageReference { .. }));
    }
}
