//! Deckhand deployment backends
//!
//! This crate provides the deployment backend abstraction for Deckhand:
//! a capability trait implemented by two interchangeable engines, a
//! release engine backed by the `helm` CLI and a manifest engine backed
//! by the `kubectl` CLI. The engine for each deployment is selected by
//! inspecting which sub-config is populated, never by a stored type tag.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                  Deckhand CLI                    │
//! │              (deckhand deploy/down)              │
//! └─────────────────┬───────────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────────┐
//! │               deckhand-deploy                    │
//! │  ┌──────────────────────────────────────────┐   │
//! │  │          Backend Abstraction              │   │
//! │  │  trait DeployBackend { ... }              │   │
//! │  └──────────────────────────────────────────┘   │
//! └───────┬─────────────────┬───────────────────────┘
//!         │                 │
//! ┌───────▼───────┐ ┌───────▼───────┐
//! │     helm      │ │    kubectl    │
//! │   (release)   │ │  (manifests)  │
//! └───────────────┘ └───────────────┘
//! ```

pub mod backend;
pub mod error;
pub mod helm;
pub mod kubectl;
pub mod teardown;

// Re-exports
pub use backend::{ClusterHandle, DeployBackend, DeployStatus, create_backend};
pub use error::{DeployError, Result};
pub use helm::HelmBackend;
pub use kubectl::KubectlBackend;
pub use teardown::{TeardownOutcome, TeardownReport, teardown_all};
