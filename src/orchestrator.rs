//! Kubernetes batch API access
//!
//! The cycler talks to the cluster through the `JobOrchestrator` trait,
//! enabling dependency injection and mocking for tests. `KubeJobClient`
//! is the kube-rs implementation, bound to a single namespace at startup.

use k8s_openapi::api::batch::v1::Job;
use k8s_openapi::api::core::v1::Pod;
use kube::api::{Api, DeleteParams, ListParams, PostParams};
use kube::Client;

use crate::error::Error;

/// Capabilities the cycler needs from the cluster
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait JobOrchestrator: Send + Sync {
    /// Submit a Job for creation
    async fn create_job(&self, job: &Job) -> Result<(), Error>;

    /// Delete a Job by name
    async fn delete_job(&self, name: &str) -> Result<(), Error>;

    /// Delete all Pods matching a label selector
    async fn delete_pods_by_selector(&self, selector: &str) -> Result<(), Error>;
}

/// kube-rs implementation over one namespace
pub struct KubeJobClient {
    jobs: Api<Job>,
    pods: Api<Pod>,
}

impl KubeJobClient {
    /// Bind the batch and pod APIs to a namespace
    pub fn new(client: Client, namespace: &str) -> Self {
        Self {
            jobs: Api::namespaced(client.clone(), namespace),
            pods: Api::namespaced(client, namespace),
        }
    }
}

#[async_trait::async_trait]
impl JobOrchestrator for KubeJobClient {
    async fn create_job(&self, job: &Job) -> Result<(), Error> {
        self.jobs
            .create(&PostParams::default(), job)
            .await
            .map(|_| ())
            .map_err(Error::from)
    }

    async fn delete_job(&self, name: &str) -> Result<(), Error> {
        self.jobs
            .delete(name, &DeleteParams::default())
            .await
            .map(|_| ())
            .map_err(Error::from)
    }

    async fn delete_pods_by_selector(&self, selector: &str) -> Result<(), Error> {
        self.pods
            .delete_collection(
                &DeleteParams::default(),
                &ListParams::default().labels(selector),
            )
            .await
            .map(|_| ())
            .map_err(Error::from)
    }
}
