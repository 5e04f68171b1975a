//! Kubernetes session setup
//!
//! Resolves client configuration in two tiers: the ambient in-cluster
//! configuration first, then a kubeconfig file when running outside a
//! cluster. The discovery seam is trait-based so the fallback policy can
//! be tested without touching the environment.

use std::path::{Path, PathBuf};
use std::time::Duration;

use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config};
use tracing::info;

use crate::error::Error;

/// Default connection timeout for kube clients (5s is plenty for local API server)
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
/// Default read timeout for kube clients
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(30);

/// Trait for loading Kubernetes client configuration
///
/// This abstracts the two configuration sources, enabling proper unit
/// testing of the fallback policy without a real cluster or filesystem.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait ConfigDiscovery: Send + Sync {
    /// Load the ambient in-cluster configuration
    fn incluster(&self) -> Result<Config, Error>;

    /// Load configuration from a kubeconfig file
    async fn kubeconfig(&self, path: &Path) -> Result<Config, Error>;
}

/// Default implementation backed by kube-rs config loading
#[derive(Clone, Default)]
pub struct KubeConfigDiscovery;

#[async_trait::async_trait]
impl ConfigDiscovery for KubeConfigDiscovery {
    fn incluster(&self) -> Result<Config, Error> {
        Config::incluster().map_err(|e| Error::InClusterConfig {
            message: e.to_string(),
        })
    }

    async fn kubeconfig(&self, path: &Path) -> Result<Config, Error> {
        let kubeconfig = Kubeconfig::read_from(path).map_err(|e| Error::Kubeconfig {
            path: path.display().to_string(),
            message: format!("failed to read kubeconfig: {e}"),
        })?;
        Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
            .await
            .map_err(|e| Error::Kubeconfig {
                path: path.display().to_string(),
                message: format!("failed to load kubeconfig: {e}"),
            })
    }
}

/// Resolve client configuration with the in-cluster-first policy.
///
/// The kubeconfig fallback is consulted only when in-cluster loading fails;
/// any other failure surfaces unchanged. With no fallback path available,
/// the original in-cluster error is returned.
pub async fn resolve_config(
    discovery: &dyn ConfigDiscovery,
    fallback: Option<&Path>,
) -> Result<Config, Error> {
    match discovery.incluster() {
        Ok(config) => Ok(config),
        Err(Error::InClusterConfig { message }) => match fallback {
            Some(path) => {
                info!(
                    path = %path.display(),
                    "in-cluster configuration unavailable, falling back to kubeconfig"
                );
                discovery.kubeconfig(path).await
            }
            None => Err(Error::InClusterConfig { message }),
        },
        Err(e) => Err(e),
    }
}

/// Create a kube client, falling back to the given kubeconfig path when
/// in-cluster configuration is unavailable
pub async fn create_client(kubeconfig: Option<&Path>) -> Result<Client, Error> {
    let mut config = resolve_config(&KubeConfigDiscovery, kubeconfig).await?;
    config.connect_timeout = Some(DEFAULT_CONNECT_TIMEOUT);
    config.read_timeout = Some(DEFAULT_READ_TIMEOUT);
    Client::try_from(config).map_err(Error::from)
}

/// Default kubeconfig location under the user's home directory
pub fn default_kubeconfig_path() -> Option<PathBuf> {
    home_dir(|var| std::env::var(var).ok()).map(|home| home.join(".kube").join("config"))
}

/// Home directory from `HOME` or `USERPROFILE`, first non-empty wins
fn home_dir(lookup: impl Fn(&str) -> Option<String>) -> Option<PathBuf> {
    ["HOME", "USERPROFILE"]
        .iter()
        .find_map(|var| lookup(var).filter(|v| !v.is_empty()))
        .map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stub_config() -> Config {
        Config::new("https://10.96.0.1:443".parse().unwrap())
    }

    #[tokio::test]
    async fn in_cluster_config_wins_when_available() {
        let mut discovery = MockConfigDiscovery::new();
        discovery
            .expect_incluster()
            .times(1)
            .returning(|| Ok(stub_config()));
        // The fallback must never be consulted
        discovery.expect_kubeconfig().never();

        let result = resolve_config(&discovery, Some(Path::new("/home/u/.kube/config"))).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn kubeconfig_fallback_is_attempted_exactly_once() {
        let mut discovery = MockConfigDiscovery::new();
        discovery.expect_incluster().times(1).returning(|| {
            Err(Error::InClusterConfig {
                message: "not running in a cluster".to_string(),
            })
        });
        discovery
            .expect_kubeconfig()
            .times(1)
            .withf(|path| path == Path::new("/home/u/.kube/config"))
            .returning(|_| Ok(stub_config()));

        let result = resolve_config(&discovery, Some(Path::new("/home/u/.kube/config"))).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn original_error_surfaces_without_fallback_path() {
        let mut discovery = MockConfigDiscovery::new();
        discovery.expect_incluster().times(1).returning(|| {
            Err(Error::InClusterConfig {
                message: "not running in a cluster".to_string(),
            })
        });
        discovery.expect_kubeconfig().never();

        let result = resolve_config(&discovery, None).await;
        match result {
            Err(Error::InClusterConfig { message }) => {
                assert_eq!(message, "not running in a cluster");
            }
            other => panic!("expected InClusterConfig error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn kubeconfig_failure_surfaces_to_caller() {
        let mut discovery = MockConfigDiscovery::new();
        discovery.expect_incluster().times(1).returning(|| {
            Err(Error::InClusterConfig {
                message: "not running in a cluster".to_string(),
            })
        });
        discovery.expect_kubeconfig().times(1).returning(|_| {
            Err(Error::Kubeconfig {
                path: "/nope".to_string(),
                message: "failed to read kubeconfig: no such file".to_string(),
            })
        });

        let result = resolve_config(&discovery, Some(Path::new("/nope"))).await;
        assert!(matches!(result, Err(Error::Kubeconfig { .. })));
    }

    #[test]
    fn home_dir_prefers_home_over_userprofile() {
        let home = home_dir(|var| match var {
            "HOME" => Some("/home/u".to_string()),
            "USERPROFILE" => Some("C:/Users/u".to_string()),
            _ => None,
        });
        assert_eq!(home, Some(PathBuf::from("/home/u")));
    }

    #[test]
    fn home_dir_falls_back_past_empty_values() {
        let home = home_dir(|var| match var {
            "HOME" => Some(String::new()),
            "USERPROFILE" => Some("C:/Users/u".to_string()),
            _ => None,
        });
        assert_eq!(home, Some(PathBuf::from("C:/Users/u")));
    }

    #[test]
    fn home_dir_is_none_when_unset() {
        assert_eq!(home_dir(|_| None), None);
    }
}
