//! Objects recovered from `helm get` output
//!
//! The output starts with release metadata, followed by `---`-separated
//! manifests. Parsing is best effort: a document that is not a Kubernetes
//! object is skipped, never reported as an error.

use rigging_core::DeployedArtifact;
use serde::Deserialize;
use tracing::debug;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ObjectHeader {
    #[serde(default)]
    api_version: String,
    #[serde(default)]
    kind: String,
    #[serde(default)]
    metadata: ObjectMeta,
}

#[derive(Debug, Default, Deserialize)]
struct ObjectMeta {
    #[serde(default)]
    name: String,
    #[serde(default)]
    namespace: Option<String>,
}

/// Parse the output of `helm get` into deployed objects
pub fn parse_release_info(namespace: &str, output: &str) -> Vec<DeployedArtifact> {
    split_documents(output)
        .iter()
        .skip(1)
        .filter_map(|doc| parse_object(namespace, doc))
        .collect()
}

/// Split on `---` separator lines, dropping blank documents
fn split_documents(output: &str) -> Vec<String> {
    let mut docs = Vec::new();
    let mut current = String::new();

    for line in output.lines() {
        let is_separator = line
            .strip_prefix("---")
            .is_some_and(|after| after.trim().is_empty());

        if is_separator {
            if !current.trim().is_empty() {
                docs.push(std::mem::take(&mut current));
            }
            current.clear();
            continue;
        }

        current.push_str(line);
        current.push('\n');
    }

    if !current.trim().is_empty() {
        docs.push(current);
    }
    docs
}

fn parse_object(namespace: &str, doc: &str) -> Option<DeployedArtifact> {
    let header: ObjectHeader = match serde_yaml::from_str(doc) {
        Ok(header) => header,
        Err(e) => {
            debug!("skipping document in release info: {}", e);
            return None;
        }
    };

    if header.api_version.is_empty() || header.kind.is_empty() || header.metadata.name.is_empty()
    {
        debug!("skipping document without apiVersion, kind or metadata.name");
        return None;
    }

    Some(DeployedArtifact {
        namespace: namespace.to_string(),
        api_version: header.api_version,
        kind: header.kind,
        name: header.metadata.name,
        object_namespace: header.metadata.namespace,
    })
}
