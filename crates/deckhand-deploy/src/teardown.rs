//! Teardown orchestration
//!
//! Iterates all configured deployments in declaration order,
//! instantiates the correct backend for each and invokes deletion.
//! Failures are collected and reported, never raised: one misconfigured
//! deployment must not block teardown of the rest, and a partially
//! torn-down set of deployments is an accepted terminal state.

use crate::backend::{ClusterHandle, create_backend};
use crate::error::DeployError;
use deckhand_core::DeploymentConfig;
use std::path::Path;

/// Outcome for a single deployment in a teardown batch
#[derive(Debug)]
pub enum TeardownOutcome {
    /// Backend constructed and deletion succeeded
    Deleted { deployment: String },
    /// Backend could not be constructed; the deployment was skipped
    Skipped {
        deployment: String,
        error: DeployError,
    },
    /// Deletion was attempted and failed
    DeleteFailed {
        deployment: String,
        error: DeployError,
    },
}

impl TeardownOutcome {
    pub fn deployment(&self) -> &str {
        match self {
            TeardownOutcome::Deleted { deployment }
            | TeardownOutcome::Skipped { deployment, .. }
            | TeardownOutcome::DeleteFailed { deployment, .. } => deployment,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, TeardownOutcome::Deleted { .. })
    }
}

/// Collected per-deployment outcomes of a teardown batch
#[derive(Debug, Default)]
pub struct TeardownReport {
    pub outcomes: Vec<TeardownOutcome>,
}

impl TeardownReport {
    /// Whether every deployment was deleted successfully
    pub fn is_clean(&self) -> bool {
        self.outcomes.iter().all(TeardownOutcome::is_success)
    }

    pub fn failures(&self) -> impl Iterator<Item = &TeardownOutcome> {
        self.outcomes.iter().filter(|o| !o.is_success())
    }
}

/// Delete all configured deployments, best effort
///
/// Sequential by design: log output ordering matches deployment
/// declaration order, and one deployment's failure cannot race with
/// another's cleanup of shared cluster state. No rollback.
pub async fn teardown_all(
    cluster: &ClusterHandle,
    deployments: &[DeploymentConfig],
    project_root: &Path,
) -> TeardownReport {
    let mut report = TeardownReport::default();

    for config in deployments {
        let backend = match create_backend(cluster, config, project_root) {
            Ok(backend) => backend,
            Err(error) => {
                tracing::warn!(
                    "Unable to create deploy backend for '{}': {}",
                    config.name,
                    error
                );
                report.outcomes.push(TeardownOutcome::Skipped {
                    deployment: config.name.clone(),
                    error,
                });
                continue;
            }
        };

        match backend.delete().await {
            Ok(()) => {
                tracing::info!("Successfully deleted deployment '{}'", config.name);
                report.outcomes.push(TeardownOutcome::Deleted {
                    deployment: config.name.clone(),
                });
            }
            Err(error) => {
                tracing::warn!("Error deleting deployment '{}': {}", config.name, error);
                report.outcomes.push(TeardownOutcome::DeleteFailed {
                    deployment: config.name.clone(),
                    error,
                });
            }
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use deckhand_core::{HelmConfig, ManifestConfig};
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_construction_failure_does_not_abort_batch() {
        let temp_dir = tempdir().unwrap();

        // 両方とも構築に失敗するが、ループは全件を処理する
        let deployments = vec![
            DeploymentConfig {
                name: "broken-helm".to_string(),
                helm: Some(HelmConfig {
                    chart: "missing-chart".into(),
                    ..Default::default()
                }),
                ..Default::default()
            },
            DeploymentConfig {
                name: "broken-kubectl".to_string(),
                manifests: Some(ManifestConfig {
                    paths: vec!["missing.yaml".into()],
                }),
                ..Default::default()
            },
        ];

        let report =
            teardown_all(&ClusterHandle::default(), &deployments, temp_dir.path()).await;

        assert_eq!(report.outcomes.len(), 2);
        assert!(!report.is_clean());
        assert!(matches!(
            report.outcomes[0],
            TeardownOutcome::Skipped { .. }
        ));
        assert!(matches!(
            report.outcomes[1],
            TeardownOutcome::Skipped { .. }
        ));
        // 宣言順が保たれる
        assert_eq!(report.outcomes[0].deployment(), "broken-helm");
        assert_eq!(report.outcomes[1].deployment(), "broken-kubectl");
    }

    #[tokio::test]
    async fn test_empty_batch_is_clean() {
        let temp_dir = tempdir().unwrap();
        let report = teardown_all(&ClusterHandle::default(), &[], temp_dir.path()).await;
        assert!(report.is_clean());
        assert!(report.outcomes.is_empty());
    }

    #[tokio::test]
    async fn test_one_bad_entry_reports_remaining() {
        // 1件が構築に失敗しても、残りは個別に処理・報告される
        let temp_dir = tempdir().unwrap();
        std::fs::create_dir(temp_dir.path().join("chart")).unwrap();

        let deployments = vec![
            DeploymentConfig {
                name: "bad".to_string(),
                manifests: Some(ManifestConfig { paths: vec![] }),
                ..Default::default()
            },
            DeploymentConfig {
                name: "good-config".to_string(),
                helm: Some(HelmConfig {
                    chart: "chart".into(),
                    ..Default::default()
                }),
                ..Default::default()
            },
        ];

        // 存在しないcontextを指定し、実クラスタに触れないようにする
        let cluster = ClusterHandle::new(Some("deckhand-test-nonexistent".to_string()), None);
        let report = teardown_all(&cluster, &deployments, temp_dir.path()).await;

        // 2件とも結果が報告される（2件目は削除失敗として記録される）
        assert_eq!(report.outcomes.len(), 2);
        assert!(matches!(
            report.outcomes[0],
            TeardownOutcome::Skipped { .. }
        ));
        assert!(!matches!(
            report.outcomes[1],
            TeardownOutcome::Skipped { .. }
        ));
    }
}
