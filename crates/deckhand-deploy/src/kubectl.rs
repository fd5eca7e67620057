//! kubectl manifest engine
//!
//! Applies raw resource definitions directly, without release or
//! versioning semantics: deploy is `kubectl apply -f`, delete is
//! `kubectl delete -f --ignore-not-found`.

use crate::backend::{ClusterHandle, DeployBackend, DeployStatus, run_command};
use crate::error::{DeployError, Result};
use async_trait::async_trait;
use deckhand_core::DeploymentConfig;
use std::path::{Path, PathBuf};

/// Manifest-apply deployment backend
pub struct KubectlBackend {
    cluster: ClusterHandle,
    name: String,
    manifests: Vec<PathBuf>,
}

impl KubectlBackend {
    /// Construct the backend for one deployment
    ///
    /// Fails when the manifest list is missing, empty, or references
    /// paths that do not exist. Construction failures are
    /// per-deployment and non-fatal for batch operations.
    pub fn new(
        cluster: ClusterHandle,
        config: &DeploymentConfig,
        project_root: &Path,
    ) -> Result<Self> {
        let construction = |message: String| DeployError::BackendConstruction {
            deployment: config.name.clone(),
            backend: "kubectl",
            message,
        };

        let manifest_config = config
            .manifests
            .as_ref()
            .ok_or_else(|| construction("missing manifest configuration".to_string()))?;

        if manifest_config.paths.is_empty() {
            return Err(construction("manifest path list is empty".to_string()));
        }

        let mut manifests = Vec::with_capacity(manifest_config.paths.len());
        for path in &manifest_config.paths {
            let resolved = project_root.join(path);
            if !resolved.exists() {
                return Err(construction(format!(
                    "manifest path does not exist: {}",
                    resolved.display()
                )));
            }
            manifests.push(resolved);
        }

        Ok(Self {
            cluster,
            name: config.name.clone(),
            manifests,
        })
    }

    /// Flags shared by every kubectl invocation (context/namespace)
    fn cluster_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        if let Some(context) = &self.cluster.context {
            args.push("--context".to_string());
            args.push(context.clone());
        }
        if let Some(namespace) = &self.cluster.namespace {
            args.push("--namespace".to_string());
            args.push(namespace.clone());
        }
        args
    }

    async fn kubectl(&self, args: Vec<String>) -> Result<String> {
        run_command("kubectl", &args, DeployError::KubectlNotFound).await
    }
}

#[async_trait]
impl DeployBackend for KubectlBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn engine(&self) -> &'static str {
        "kubectl"
    }

    async fn deploy(&self) -> Result<()> {
        for manifest in &self.manifests {
            let mut args = vec![
                "apply".to_string(),
                "-f".to_string(),
                manifest.display().to_string(),
            ];
            args.extend(self.cluster_args());

            self.kubectl(args).await?;
            tracing::info!("Applied manifest {}", manifest.display());
        }
        Ok(())
    }

    async fn delete(&self) -> Result<()> {
        for manifest in &self.manifests {
            let mut args = vec![
                "delete".to_string(),
                "-f".to_string(),
                manifest.display().to_string(),
                "--ignore-not-found".to_string(),
            ];
            args.extend(self.cluster_args());

            self.kubectl(args).await?;
            tracing::info!("Deleted manifest {}", manifest.display());
        }
        Ok(())
    }

    async fn status(&self) -> Result<DeployStatus> {
        let mut missing = 0usize;
        for manifest in &self.manifests {
            let mut args = vec![
                "get".to_string(),
                "-f".to_string(),
                manifest.display().to_string(),
                "--output".to_string(),
                "name".to_string(),
            ];
            args.extend(self.cluster_args());

            if self.kubectl(args).await.is_err() {
                missing += 1;
            }
        }

        let ready = missing == 0;
        Ok(DeployStatus {
            name: self.name.clone(),
            engine: "kubectl".to_string(),
            ready,
            detail: if ready {
                format!("{} manifest(s) applied", self.manifests.len())
            } else {
                format!(
                    "{}/{} manifest(s) missing",
                    missing,
                    self.manifests.len()
                )
            },
        })
    }
}
