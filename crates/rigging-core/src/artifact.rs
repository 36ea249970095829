//! Build results consumed by a deploy, and the objects a deploy produced

use serde::{Deserialize, Serialize};

/// An image produced by the build phase
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildArtifact {
    /// Image name as referenced from the configuration
    pub image_name: String,

    /// Fully qualified tag, possibly digest-qualified
    pub tag: String,
}

impl BuildArtifact {
    pub fn new(image_name: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            image_name: image_name.into(),
            tag: tag.into(),
        }
    }
}

/// A Kubernetes object reported by helm after a release was deployed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployedArtifact {
    /// Namespace the release was deployed into (may be empty)
    pub namespace: String,

    pub api_version: String,

    pub kind: String,

    pub name: String,

    /// `metadata.namespace` of the object, if the manifest sets one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_namespace: Option<String>,
}

impl std::fmt::Display for DeployedArtifact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.kind, self.name)
    }
}
