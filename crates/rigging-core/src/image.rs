//! Container image reference parsing
//!
//! References are decomposed without normalization: `myrepo/img:v1` has no
//! domain, it is not rewritten to `docker.io/myrepo/img`.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{CoreError, Result};

static PATH_COMPONENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9]+(?:(?:[._]|__|-+)[a-z0-9]+)*$").unwrap());

static DOMAIN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?:[a-zA-Z0-9]|[a-zA-Z0-9][a-zA-Z0-9-]*[a-zA-Z0-9])(?:\.(?:[a-zA-Z0-9]|[a-zA-Z0-9][a-zA-Z0-9-]*[a-zA-Z0-9]))*(?::[0-9]+)?$",
    )
    .unwrap()
});

static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[\w][\w.-]{0,127}$").unwrap());

static DIGEST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z][A-Za-z0-9]*(?:[-_+.][A-Za-z][A-Za-z0-9]*)*:[0-9a-fA-F]{32,}$").unwrap()
});

const NAME_TOTAL_LENGTH_MAX: usize = 255;

/// A parsed container image reference
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageReference {
    /// Registry host, empty when the reference has none
    pub domain: String,

    /// Repository path without the domain
    pub path: String,

    /// `domain/path`, or just `path`
    pub base_name: String,

    /// Tag, empty when absent
    pub tag: String,

    /// `algo:hex` digest, empty when absent
    pub digest: String,
}

impl ImageReference {
    /// Parse `[domain/]path[:tag][@digest]`
    pub fn parse(reference: &str) -> Result<Self> {
        let invalid = |reason: &str| CoreError::InvalidImageReference {
            reference: reference.to_string(),
            reason: reason.to_string(),
        };

        if reference.is_empty() {
            return Err(invalid("empty reference"));
        }

        let (rest, digest) = match reference.split_once('@') {
            Some((rest, digest)) => {
                if !DIGEST.is_match(digest) {
                    return Err(invalid("invalid digest format"));
                }
                (rest, digest)
            }
            None => (reference, ""),
        };

        // A colon after the last slash introduces the tag; before it, a port.
        let (name, tag) = match rest.rfind(':') {
            Some(idx) if !rest[idx..].contains('/') => {
                let tag = &rest[idx + 1..];
                if !TAG.is_match(tag) {
                    return Err(invalid("invalid tag format"));
                }
                (&rest[..idx], tag)
            }
            _ => (rest, ""),
        };

        if name.is_empty() {
            return Err(invalid("repository name must have at least one component"));
        }

        if name.len() > NAME_TOTAL_LENGTH_MAX {
            return Err(invalid("repository name must not be more than 255 characters"));
        }

        let (domain, path) = match name.split_once('/') {
            Some((first, remainder))
                if first.contains(['.', ':']) || first == "localhost" =>
            {
                (first, remainder)
            }
            _ => ("", name),
        };

        if !domain.is_empty() && !DOMAIN.is_match(domain) {
            return Err(invalid("invalid domain"));
        }

        if path.split('/').any(|component| !PATH_COMPONENT.is_match(component)) {
            return Err(invalid("invalid reference format: repository name must be lowercase"));
        }

        Ok(Self {
            domain: domain.to_string(),
            path: path.to_string(),
            base_name: name.to_string(),
            tag: tag.to_string(),
            digest: digest.to_string(),
        })
    }

    /// `tag@digest` when a digest is present, otherwise the tag
    pub fn tag_with_digest(&self) -> String {
        if self.digest.is_empty() {
            self.tag.clone()
        } else {
            format!("{}@{}", self.tag, self.digest)
        }
    }
}
