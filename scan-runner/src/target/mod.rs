//! Scan targets and the workflow inputs they dispatch with.

mod error;
mod tag;

pub use error::TargetError;
pub use tag::sanitize_tag;

use crate::reference::{resolve, RepositoryReference};
use serde::Serialize;
use std::collections::BTreeMap;
use tag::strip_archive_extension;
use url::Url;

/// Archive kinds the workflow knows how to unpack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArchiveFormat {
    /// `.zip`
    Zip,
    /// `.tar`, optionally gzip/xz compressed.
    Tar,
}

impl ArchiveFormat {
    /// Infers the format from the last path segment of `url`.
    #[must_use]
    pub fn infer(url: &Url) -> Option<Self> {
        let file_name = url.path_segments()?.next_back()?.to_ascii_lowercase();
        if file_name.ends_with(".zip") {
            Some(Self::Zip)
        } else if [".tar", ".tar.gz", ".tgz", ".tar.xz", ".txz"]
            .iter()
            .any(|ext| file_name.ends_with(ext))
        {
            Some(Self::Tar)
        } else {
            None
        }
    }
}

/// What a scan should look at.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScanTarget {
    /// A container image reference, e.g. `alpine:latest`.
    Docker { image: String },

    /// A repository at a ref.
    Git { reference: RepositoryReference },

    /// A downloadable source archive.
    Archive { url: Url, format: ArchiveFormat },
}

impl ScanTarget {
    /// Creates a container image target.
    ///
    /// # Errors
    ///
    /// Returns [`TargetError::EmptyImage`] for a blank image.
    pub fn docker(image: &str) -> Result<Self, TargetError> {
        let image = image.trim();
        if image.is_empty() {
            return Err(TargetError::EmptyImage);
        }
        Ok(Self::Docker {
            image: image.to_string(),
        })
    }

    /// Creates a repository target from a pasted URL and optional ref.
    ///
    /// # Errors
    ///
    /// Returns [`TargetError::MalformedReference`] if the URL is not a repository
    /// URL on one of `allowed_hosts`, or [`TargetError::InvalidRef`] if the
    /// resolved ref is not a valid ref name.
    pub fn git(
        raw_url: &str,
        explicit_ref: &str,
        allowed_hosts: &[String],
    ) -> Result<Self, TargetError> {
        let reference = resolve(raw_url, explicit_ref);
        if !allowed_hosts.iter().any(|host| reference.is_hosted_on(host)) {
            return Err(TargetError::MalformedReference {
                input: reference.raw_input,
                allowed: allowed_hosts.join(", "),
            });
        }
        reference
            .validate_ref()
            .map_err(|message| TargetError::InvalidRef {
                reference: reference.resolved_ref.clone(),
                message,
            })?;
        Ok(Self::Git { reference })
    }

    /// Creates an archive target. The format is inferred from the URL unless given.
    ///
    /// # Errors
    ///
    /// Returns [`TargetError::InvalidArchiveUrl`] for a non-http(s) URL, or
    /// [`TargetError::UnknownArchiveFormat`] if no format was given or inferred.
    pub fn archive(raw_url: &str, format: Option<ArchiveFormat>) -> Result<Self, TargetError> {
        let input = raw_url.trim();
        let url = Url::parse(input).map_err(|e| TargetError::InvalidArchiveUrl {
            input: input.to_string(),
            message: e.to_string(),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(TargetError::InvalidArchiveUrl {
                input: input.to_string(),
                message: format!("unsupported scheme '{}'", url.scheme()),
            });
        }
        let format = format
            .or_else(|| ArchiveFormat::infer(&url))
            .ok_or_else(|| TargetError::UnknownArchiveFormat {
                input: input.to_string(),
            })?;
        Ok(Self::Archive { url, format })
    }

    /// Returns the workflow's `scan_type` input value.
    #[must_use]
    pub fn scan_type(&self) -> &'static str {
        match self {
            Self::Docker { .. } => "docker",
            Self::Git { .. } => "git",
            Self::Archive {
                format: ArchiveFormat::Zip,
                ..
            } => "upload-zip",
            Self::Archive {
                format: ArchiveFormat::Tar,
                ..
            } => "upload-tar",
        }
    }

    /// Predicts the tag the workflow suffixes report files and artifacts with.
    #[must_use]
    pub fn input_tag(&self) -> String {
        match self {
            Self::Docker { image } => sanitize_tag(image),
            Self::Git { reference } => {
                let name = reference.name.as_deref().unwrap_or("repo");
                sanitize_tag(&format!("{name}_{}", reference.resolved_ref))
            }
            Self::Archive { url, .. } => {
                let file_name = url
                    .path_segments()
                    .and_then(|mut segments| segments.next_back())
                    .filter(|segment| !segment.is_empty())
                    .unwrap_or("file");
                sanitize_tag(strip_archive_extension(file_name))
            }
        }
    }

    /// Builds the dispatch inputs.
    ///
    /// Inputs not relevant to the target kind are sent as empty strings, since
    /// the workflow declares all of them. Each agent toggle becomes
    /// `agent_<name>` = `"true"`/`"false"`.
    #[must_use]
    pub fn workflow_inputs(
        &self,
        client_run_id: &str,
        agents: &BTreeMap<String, bool>,
    ) -> BTreeMap<String, String> {
        let mut inputs = BTreeMap::new();
        let (docker_image, git_url, git_ref, archive_url) = match self {
            Self::Docker { image } => (image.as_str(), "", "", ""),
            Self::Git { reference } => (
                "",
                reference.canonical_url.as_str(),
                reference.resolved_ref.as_str(),
                "",
            ),
            Self::Archive { url, .. } => ("", "", "", url.as_str()),
        };

        inputs.insert("scan_type".to_string(), self.scan_type().to_string());
        inputs.insert("docker_image".to_string(), docker_image.to_string());
        inputs.insert("git_url".to_string(), git_url.to_string());
        inputs.insert("git_ref".to_string(), git_ref.to_string());
        inputs.insert("archive_url".to_string(), archive_url.to_string());
        inputs.insert("client_run_id".to_string(), client_run_id.to_string());
        for (agent, enabled) in agents {
            inputs.insert(format!("agent_{agent}"), enabled.to_string());
        }
        inputs
    }
}
