//! Diagnostic artifact storage
//!
//! Failure evidence captured during a run: full-page screenshots and
//! serialized page content, one directory per scenario. The store is
//! append-only for the lifetime of a run; nothing here deletes failure
//! evidence.

use chrono::{DateTime, Utc};
use gatecheck_core::{GatecheckError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::fs;
use tracing::{debug, info};

/// Kinds of diagnostic artifacts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    /// Full-page browser screenshot
    Screenshot,
    /// Serialized DOM at capture time
    PageContent,
}

impl std::fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArtifactKind::Screenshot => write!(f, "screenshot"),
            ArtifactKind::PageContent => write!(f, "page_content"),
        }
    }
}

impl ArtifactKind {
    /// File extension for this artifact kind
    pub fn extension(&self) -> &str {
        match self {
            ArtifactKind::Screenshot => "png",
            ArtifactKind::PageContent => "html",
        }
    }

    /// MIME type for this artifact kind
    pub fn mime_type(&self) -> &str {
        match self {
            ArtifactKind::Screenshot => "image/png",
            ArtifactKind::PageContent => "text/html",
        }
    }
}

/// Reference to one stored artifact
///
/// Paths are relative to the store's base directory so the run report stays
/// relocatable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactRef {
    pub kind: ArtifactKind,
    /// Relative path from the artifacts base directory
    pub path: PathBuf,
    pub mime_type: String,
    pub size_bytes: u64,
    pub created_at: DateTime<Utc>,
    pub description: String,
}

impl ArtifactRef {
    /// Absolute path given the store's base directory
    pub fn absolute_path(&self, base_dir: &PathBuf) -> PathBuf {
        base_dir.join(&self.path)
    }
}

/// Append-only artifact storage for one verification run
pub struct ArtifactStore {
    base_dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Store an artifact for a scenario
    ///
    /// Files land under `<base>/<scenario>/` named
    /// `{timestamp}-{label}-{kind}.{ext}`.
    pub async fn store(
        &self,
        scenario: &str,
        kind: ArtifactKind,
        label: &str,
        data: &[u8],
        description: &str,
    ) -> Result<ArtifactRef> {
        let scenario_dir = self.base_dir.join(scenario);
        fs::create_dir_all(&scenario_dir).await?;

        let timestamp = Utc::now().format("%Y%m%d-%H%M%S");
        let filename = format!("{}-{}-{}.{}", timestamp, label, kind, kind.extension());
        let file_path = scenario_dir.join(&filename);

        fs::write(&file_path, data).await?;

        let size_bytes = data.len() as u64;
        info!(
            "Artifact stored: {} ({} bytes)",
            file_path.display(),
            size_bytes
        );

        Ok(ArtifactRef {
            kind: kind.clone(),
            path: PathBuf::from(scenario).join(&filename),
            mime_type: kind.mime_type().to_string(),
            size_bytes,
            created_at: Utc::now(),
            description: description.to_string(),
        })
    }

    /// List all artifacts recorded for a scenario
    pub async fn list(&self, scenario: &str) -> Result<Vec<ArtifactRef>> {
        let scenario_dir = self.base_dir.join(scenario);

        if !scenario_dir.exists() {
            return Ok(Vec::new());
        }

        let mut artifacts = Vec::new();
        let mut entries = fs::read_dir(&scenario_dir).await?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }

            let metadata = fs::metadata(&path).await?;
            let file_name = path
                .file_name()
                .and_then(|n| n.to_str())
                .ok_or_else(|| {
                    GatecheckError::Driver(format!(
                        "Unreadable artifact name in {}",
                        scenario_dir.display()
                    ))
                })?
                .to_string();

            let kind = if file_name.ends_with(".png") {
                ArtifactKind::Screenshot
            } else {
                ArtifactKind::PageContent
            };

            artifacts.push(ArtifactRef {
                kind: kind.clone(),
                path: PathBuf::from(scenario).join(&file_name),
                mime_type: kind.mime_type().to_string(),
                size_bytes: metadata.len(),
                created_at: metadata
                    .modified()
                    .ok()
                    .and_then(|t| {
                        DateTime::from_timestamp(
                            t.duration_since(std::time::UNIX_EPOCH).ok()?.as_secs() as i64,
                            0,
                        )
                    })
                    .unwrap_or_else(Utc::now),
                description: format!("Artifact: {}", file_name),
            });
        }

        debug!("{} artifacts listed for {}", artifacts.len(), scenario);
        Ok(artifacts)
    }

    /// Base directory the store writes under
    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_artifact_kind_display() {
        assert_eq!(ArtifactKind::Screenshot.to_string(), "screenshot");
        assert_eq!(ArtifactKind::PageContent.to_string(), "page_content");
    }

    #[test]
    fn test_artifact_kind_extensions() {
        assert_eq!(ArtifactKind::Screenshot.extension(), "png");
        assert_eq!(ArtifactKind::PageContent.extension(), "html");
        assert_eq!(ArtifactKind::Screenshot.mime_type(), "image/png");
        assert_eq!(ArtifactKind::PageContent.mime_type(), "text/html");
    }

    #[tokio::test]
    async fn test_store_writes_file() {
        let temp_dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(temp_dir.path().to_path_buf());

        let data = b"<html></html>";
        let artifact = store
            .store(
                "role-gating",
                ArtifactKind::PageContent,
                "failure",
                data,
                "Page state at failing step",
            )
            .await
            .unwrap();

        assert_eq!(artifact.size_bytes, data.len() as u64);
        assert_eq!(artifact.mime_type, "text/html");

        let abs_path = artifact.absolute_path(store.base_dir());
        assert!(abs_path.exists());
        let content = fs::read(&abs_path).await.unwrap();
        assert_eq!(content, data);
    }

    #[tokio::test]
    async fn test_list_returns_stored_artifacts() {
        let temp_dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(temp_dir.path().to_path_buf());

        store
            .store(
                "task-ownership",
                ArtifactKind::Screenshot,
                "failure",
                b"png-bytes",
                "Snapshot",
            )
            .await
            .unwrap();
        store
            .store(
                "task-ownership",
                ArtifactKind::PageContent,
                "failure",
                b"<html></html>",
                "Dump",
            )
            .await
            .unwrap();

        let artifacts = store.list("task-ownership").await.unwrap();
        assert_eq!(artifacts.len(), 2);
    }

    #[tokio::test]
    async fn test_list_empty_for_unknown_scenario() {
        let temp_dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(temp_dir.path().to_path_buf());
        let artifacts = store.list("never-ran").await.unwrap();
        assert!(artifacts.is_empty());
    }
}
