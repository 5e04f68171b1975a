//! Cycles one named Kubernetes batch Job: create it, let it run, delete it
//! together with its Pods, pause, and start over.

/// Kubernetes session setup with in-cluster/kubeconfig fallback
pub mod client;
/// The create/hold/delete/pause control loop
pub mod cycler;
/// Error types
pub mod error;
/// Template for the cycled Job
pub mod job;
/// Batch API access behind a mockable trait
pub mod orchestrator;

pub use error::Error;
