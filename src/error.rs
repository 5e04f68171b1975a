//! Error types for the job cycler
//!
//! Kubernetes API failures are discriminated by status code rather than by
//! matching on error message text.

use thiserror::Error;

/// Main error type for cycler operations
#[derive(Debug, Error)]
pub enum Error {
    /// Kubernetes API error
    #[error("kubernetes error: {source}")]
    Kube {
        /// The underlying kube-rs error
        #[from]
        source: kube::Error,
    },

    /// The ambient in-cluster configuration could not be loaded
    #[error("in-cluster configuration unavailable: {message}")]
    InClusterConfig {
        /// Description of what failed
        message: String,
    },

    /// A kubeconfig file could not be read or parsed
    #[error("kubeconfig error at {path}: {message}")]
    Kubeconfig {
        /// Path of the kubeconfig file
        path: String,
        /// Description of what failed
        message: String,
    },
}

impl Error {
    /// True if the API rejected a create because the resource already exists (409)
    pub fn is_already_exists(&self) -> bool {
        matches!(
            self,
            Error::Kube {
                source: kube::Error::Api(ae)
            } if ae.code == 409
        )
    }

    /// True if the API could not find the resource (404)
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Error::Kube {
                source: kube::Error::Api(ae)
            } if ae.code == 404
        )
    }
}
