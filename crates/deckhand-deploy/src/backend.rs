//! Deployment backend trait definition

use crate::error::{DeployError, Result};
use crate::helm::HelmBackend;
use crate::kubectl::KubectlBackend;
use async_trait::async_trait;
use deckhand_core::DeploymentConfig;
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

/// Opaque cluster connection handle
///
/// Constructed by the CLI collaborator and passed unmodified into
/// whichever backend is selected. Backends never construct cluster
/// connections themselves.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClusterHandle {
    /// kubeconfig context to target (None uses the current context)
    pub context: Option<String>,
    /// Namespace to operate in (None uses the default namespace)
    pub namespace: Option<String>,
}

impl ClusterHandle {
    pub fn new(context: Option<String>, namespace: Option<String>) -> Self {
        Self { context, namespace }
    }
}

/// Deployment backend abstraction trait
///
/// Both engines (Helm release, kubectl manifests) implement this trait
/// to provide a unified interface for deploying, deleting and
/// inspecting a single declared deployment.
#[async_trait]
pub trait DeployBackend: Send + Sync {
    /// Returns the deployment name this backend manages
    fn name(&self) -> &str;

    /// Returns the engine name (e.g., "helm", "kubectl")
    fn engine(&self) -> &'static str;

    /// Deploy (create or update) the resources
    async fn deploy(&self) -> Result<()>;

    /// Delete the deployed resources
    async fn delete(&self) -> Result<()>;

    /// Get the current status of the deployment
    async fn status(&self) -> Result<DeployStatus>;
}

/// Status information for a single deployment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeployStatus {
    /// Deployment name
    pub name: String,

    /// Engine that manages it
    pub engine: String,

    /// Whether the deployment is present and healthy
    pub ready: bool,

    /// Human-readable detail (release status, resource summary, ...)
    pub detail: String,
}

/// Select and construct the backend for a deployment
///
/// Presence-based dispatch: a populated manifest sub-config selects the
/// kubectl engine; its absence selects the Helm release engine by
/// default. There is no stored type tag.
pub fn create_backend(
    cluster: &ClusterHandle,
    config: &DeploymentConfig,
    project_root: &Path,
) -> Result<Box<dyn DeployBackend>> {
    if config.manifests.is_some() {
        Ok(Box::new(KubectlBackend::new(
            cluster.clone(),
            config,
            project_root,
        )?))
    } else {
        Ok(Box::new(HelmBackend::new(
            cluster.clone(),
            config,
            project_root,
        )?))
    }
}

/// Run a cluster CLI command and return stdout
///
/// A missing binary maps to the engine-specific not-found error so the
/// caller can print an actionable message.
pub(crate) async fn run_command(
    program: &str,
    args: &[String],
    not_found: DeployError,
) -> Result<String> {
    let mut cmd = Command::new(program);
    cmd.args(args);
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());

    tracing::debug!("Running: {} {}", program, args.join(" "));

    let output = match cmd.output().await {
        Ok(output) => output,
        Err(e) if e.kind() == ErrorKind::NotFound => return Err(not_found),
        Err(e) => return Err(DeployError::Io(e)),
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(DeployError::CommandFailed {
            program: program.to_string(),
            stderr: stderr.trim().to_string(),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}
