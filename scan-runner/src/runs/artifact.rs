//! Workflow run artifacts.

use serde::{Deserialize, Serialize};
use tracing::info;

/// A file bundle produced by a workflow run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    /// Artifact ID.
    pub id: u64,

    /// Artifact name, usually suffixed with the scan's input tag.
    pub name: String,

    /// Compressed size in bytes.
    #[serde(rename = "size_in_bytes")]
    pub size_bytes: u64,

    /// Whether the artifact is past retention and can no longer be downloaded.
    pub expired: bool,
}

/// Artifacts of a run split by whether they can still be downloaded.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ArtifactReport {
    /// Artifacts that can be downloaded.
    pub available: Vec<Artifact>,

    /// Artifacts past retention. Informational only.
    pub expired: Vec<Artifact>,
}

impl ArtifactReport {
    /// Partitions artifacts, logging each expired one.
    #[must_use]
    pub fn from_artifacts(run_id: u64, artifacts: Vec<Artifact>) -> Self {
        let (expired, available): (Vec<_>, Vec<_>) =
            artifacts.into_iter().partition(|a| a.expired);
        for artifact in &expired {
            info!(run_id, artifact = %artifact.name, "Artifact expired");
        }
        Self { available, expired }
    }

    /// Returns true if the run produced no artifacts at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.available.is_empty() && self.expired.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artifact(id: u64, expired: bool) -> Artifact {
        Artifact {
            id,
            name: format!("fossology-report-{id}"),
            size_bytes: 1024,
            expired,
        }
    }

    #[test]
    fn partitions_expired_artifacts() {
        let report =
            ArtifactReport::from_artifacts(7, vec![artifact(1, false), artifact(2, true)]);

        assert_eq!(report.available.len(), 1);
        assert_eq!(report.available[0].id, 1);
        assert_eq!(report.expired.len(), 1);
        assert_eq!(report.expired[0].id, 2);
        assert!(!report.is_empty());
    }

    #[test]
    fn deserializes_github_artifact() {
        let json = r#"{"id": 9, "name": "report", "size_in_bytes": 512, "expired": false, "url": "x"}"#;
        let artifact: Artifact = serde_json::from_str(json).unwrap();
        assert_eq!(artifact.size_bytes, 512);
    }
}
