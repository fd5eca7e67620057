//! Helm release engine
//!
//! Wraps the `helm` CLI to manage a deployment as a named, versioned
//! release: deploy is `helm upgrade --install`, delete is
//! `helm uninstall`.

use crate::backend::{ClusterHandle, DeployBackend, DeployStatus, run_command};
use crate::error::{DeployError, Result};
use async_trait::async_trait;
use deckhand_core::DeploymentConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Release-based deployment backend
pub struct HelmBackend {
    cluster: ClusterHandle,
    name: String,
    release: String,
    chart: PathBuf,
    values: Option<PathBuf>,
}

/// Subset of `helm status -o json` we care about
#[derive(Debug, Deserialize)]
struct HelmStatusResponse {
    info: HelmStatusInfo,
}

#[derive(Debug, Deserialize)]
struct HelmStatusInfo {
    status: String,
}

impl HelmBackend {
    /// Construct the backend for one deployment
    ///
    /// Fails when the deployment carries no usable Helm configuration or
    /// the chart path does not exist. Construction failures are
    /// per-deployment and non-fatal for batch operations.
    pub fn new(
        cluster: ClusterHandle,
        config: &DeploymentConfig,
        project_root: &Path,
    ) -> Result<Self> {
        let construction = |message: String| DeployError::BackendConstruction {
            deployment: config.name.clone(),
            backend: "helm",
            message,
        };

        let helm = config
            .helm
            .as_ref()
            .ok_or_else(|| construction("missing helm configuration".to_string()))?;

        let chart = project_root.join(&helm.chart);
        if !chart.exists() {
            return Err(construction(format!(
                "chart path does not exist: {}",
                chart.display()
            )));
        }

        let values = helm.values.as_ref().map(|v| project_root.join(v));
        if let Some(values_path) = &values
            && !values_path.exists()
        {
            return Err(construction(format!(
                "values file does not exist: {}",
                values_path.display()
            )));
        }

        Ok(Self {
            cluster,
            name: config.name.clone(),
            release: helm.release.clone().unwrap_or_else(|| config.name.clone()),
            chart,
            values,
        })
    }

    /// Flags shared by every helm invocation (context/namespace)
    fn cluster_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        if let Some(context) = &self.cluster.context {
            args.push("--kube-context".to_string());
            args.push(context.clone());
        }
        if let Some(namespace) = &self.cluster.namespace {
            args.push("--namespace".to_string());
            args.push(namespace.clone());
        }
        args
    }

    async fn helm(&self, args: Vec<String>) -> Result<String> {
        run_command("helm", &args, DeployError::HelmNotFound).await
    }
}

#[async_trait]
impl DeployBackend for HelmBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn engine(&self) -> &'static str {
        "helm"
    }

    async fn deploy(&self) -> Result<()> {
        let mut args = vec![
            "upgrade".to_string(),
            "--install".to_string(),
            self.release.clone(),
            self.chart.display().to_string(),
        ];
        if let Some(values) = &self.values {
            args.push("--values".to_string());
            args.push(values.display().to_string());
        }
        args.extend(self.cluster_args());

        self.helm(args).await?;
        tracing::info!("Deployed release '{}'", self.release);
        Ok(())
    }

    async fn delete(&self) -> Result<()> {
        let mut args = vec!["uninstall".to_string(), self.release.clone()];
        args.extend(self.cluster_args());

        self.helm(args).await?;
        tracing::info!("Uninstalled release '{}'", self.release);
        Ok(())
    }

    async fn status(&self) -> Result<DeployStatus> {
        let mut args = vec![
            "status".to_string(),
            self.release.clone(),
            "--output".to_string(),
            "json".to_string(),
        ];
        args.extend(self.cluster_args());

        let output = match self.helm(args).await {
            Ok(output) => output,
            Err(DeployError::CommandFailed { stderr, .. })
                if stderr.contains("release: not found") =>
            {
                return Ok(DeployStatus {
                    name: self.name.clone(),
                    engine: "helm".to_string(),
                    ready: false,
                    detail: format!("release '{}' not found", self.release),
                });
            }
            Err(e) => return Err(e),
        };

        let response: HelmStatusResponse = serde_json::from_str(&output)?;
        Ok(DeployStatus {
            name: self.name.clone(),
            engine: "helm".to_string(),
            ready: response.info.status == "deployed",
            detail: format!("release '{}' is {}", self.release, response.info.status),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deckhand_core::HelmConfig;
    use std::fs;
    use tempfile::tempdir;

    fn helm_deployment(chart: &str) -> DeploymentConfig {
        DeploymentConfig {
            name: "app".to_string(),
            helm: Some(HelmConfig {
                chart: chart.into(),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_release_defaults_to_deployment_name() {
        let temp_dir = tempdir().unwrap();
        fs::create_dir(temp_dir.path().join("chart")).unwrap();

        let backend = HelmBackend::new(
            ClusterHandle::default(),
            &helm_deployment("chart"),
            temp_dir.path(),
        )
        .unwrap();

        assert_eq!(backend.release, "app");
        assert_eq!(backend.name(), "app");
    }

    #[test]
    fn test_missing_chart_fails_construction() {
        let temp_dir = tempdir().unwrap();
        let result = HelmBackend::new(
            ClusterHandle::default(),
            &helm_deployment("missing"),
            temp_dir.path(),
        );
        assert!(matches!(
            result,
            Err(DeployError::BackendConstruction { .. })
        ));
    }

    #[test]
    fn test_missing_helm_config_fails_construction() {
        let temp_dir = tempdir().unwrap();
        let config = DeploymentConfig {
            name: "app".to_string(),
            ..Default::default()
        };
        let result = HelmBackend::new(ClusterHandle::default(), &config, temp_dir.path());
        assert!(matches!(
            result,
            Err(DeployError::BackendConstruction { .. })
        ));
    }

    #[test]
    fn test_cluster_args_include_context_and_namespace() {
        let temp_dir = tempdir().unwrap();
        fs::create_dir(temp_dir.path().join("chart")).unwrap();

        let cluster = ClusterHandle::new(
            Some("staging".to_string()),
            Some("deckhand".to_string()),
        );
        let backend =
            HelmBackend::new(cluster, &helm_deployment("chart"), temp_dir.path()).unwrap();

        let args = backend.cluster_args();
        assert_eq!(
            args,
            vec!["--kube-context", "staging", "--namespace", "deckhand"]
        );
    }
}
