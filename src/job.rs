//! Template for the cycled batch Job
//!
//! The template is fixed for the process lifetime: one container, restart
//! policy `Never`, no orchestrator-level retries, and a TTL so the cluster
//! garbage-collects a finished Job even if the explicit delete never ran.
//! Pods are tagged with a label derived from the Job name so they can be
//! cleaned up by selector.

use std::collections::BTreeMap;

use k8s_openapi::api::batch::v1::{Job, JobSpec};
use k8s_openapi::api::core::v1::{Container, EnvVar, PodSpec, PodTemplateSpec};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

/// Label key linking Pods back to the Job that owns them
pub const POD_LABEL_KEY: &str = "job_name";

/// No in-place retries; a failed Job stays failed until the next cycle
pub const BACKOFF_LIMIT: i32 = 0;

/// Finished Jobs are garbage-collected by the cluster after this many seconds
pub const TTL_SECONDS_AFTER_FINISHED: i32 = 20;

/// Immutable spec for the Job the cycler creates and deletes
#[derive(Clone, Debug)]
pub struct JobTemplate {
    /// Job name, reused every cycle
    pub name: String,
    /// Namespace the Job lives in
    pub namespace: String,
    /// Container image
    pub image: String,
    /// Shell command the container runs (via `sh -c`)
    pub command: String,
    /// Environment variables for the container
    pub env: Vec<(String, String)>,
}

impl JobTemplate {
    /// Label selector matching the Pods spawned for this Job
    pub fn pod_selector(&self) -> String {
        format!("{}={}", POD_LABEL_KEY, self.name)
    }

    /// Render the template as a batch/v1 Job
    pub fn to_job(&self) -> Job {
        let env: Vec<EnvVar> = self
            .env
            .iter()
            .map(|(name, value)| EnvVar {
                name: name.clone(),
                value: Some(value.clone()),
                ..Default::default()
            })
            .collect();

        Job {
            metadata: ObjectMeta {
                name: Some(self.name.clone()),
                namespace: Some(self.namespace.clone()),
                ..Default::default()
            },
            spec: Some(JobSpec {
                backoff_limit: Some(BACKOFF_LIMIT),
                ttl_seconds_after_finished: Some(TTL_SECONDS_AFTER_FINISHED),
                template: PodTemplateSpec {
                    metadata: Some(ObjectMeta {
                        labels: Some(BTreeMap::from([(
                            POD_LABEL_KEY.to_string(),
                            self.name.clone(),
                        )])),
                        ..Default::default()
                    }),
                    spec: Some(PodSpec {
                        containers: vec![Container {
                            name: "workload".to_string(),
                            image: Some(self.image.clone()),
                            image_pull_policy: Some("Always".to_string()),
                            command: Some(vec!["sh".to_string(), "-c".to_string()]),
                            args: Some(vec![self.command.clone()]),
                            env: if env.is_empty() { None } else { Some(env) },
                            ..Default::default()
                        }],
                        restart_policy: Some("Never".to_string()),
                        ..Default::default()
                    }),
                },
                ..Default::default()
            }),
            status: None,
        }
    }
}

/// Parse a `KEY=VALUE` environment variable pair from the command line
pub fn parse_env_var(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got '{s}'")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_template() -> JobTemplate {
        JobTemplate {
            name: "cycled".to_string(),
            namespace: "default".to_string(),
            image: "alpine".to_string(),
            command: "sleep 30".to_string(),
            env: vec![("LEVEL".to_string(), "debug".to_string())],
        }
    }

    #[test]
    fn job_carries_name_and_namespace() {
        let job = sample_template().to_job();
        assert_eq!(job.metadata.name.as_deref(), Some("cycled"));
        assert_eq!(job.metadata.namespace.as_deref(), Some("default"));
    }

    #[test]
    fn job_never_retries_and_expires() {
        let job = sample_template().to_job();
        let spec = job.spec.expect("job spec");
        assert_eq!(spec.backoff_limit, Some(0));
        assert_eq!(spec.ttl_seconds_after_finished, Some(20));

        let pod_spec = spec.template.spec.expect("pod spec");
        assert_eq!(pod_spec.restart_policy.as_deref(), Some("Never"));
    }

    #[test]
    fn pods_are_labeled_with_the_job_name() {
        let template = sample_template();
        let job = template.to_job();
        let labels = job
            .spec
            .and_then(|s| s.template.metadata)
            .and_then(|m| m.labels)
            .expect("pod labels");
        assert_eq!(labels.get(POD_LABEL_KEY), Some(&"cycled".to_string()));
        assert_eq!(template.pod_selector(), "job_name=cycled");
    }

    #[test]
    fn container_runs_the_command_through_a_shell() {
        let job = sample_template().to_job();
        let container = job
            .spec
            .and_then(|s| s.template.spec)
            .map(|p| p.containers)
            .and_then(|mut c| c.pop())
            .expect("container");

        assert_eq!(container.image.as_deref(), Some("alpine"));
        assert_eq!(container.image_pull_policy.as_deref(), Some("Always"));
        assert_eq!(
            container.command,
            Some(vec!["sh".to_string(), "-c".to_string()])
        );
        assert_eq!(container.args, Some(vec!["sleep 30".to_string()]));

        let env = container.env.expect("env");
        assert_eq!(env.len(), 1);
        assert_eq!(env[0].name, "LEVEL");
        assert_eq!(env[0].value.as_deref(), Some("debug"));
    }

    #[test]
    fn env_is_omitted_when_empty() {
        let mut template = sample_template();
        template.env.clear();
        let job = template.to_job();
        let container = job
            .spec
            .and_then(|s| s.template.spec)
            .map(|p| p.containers)
            .and_then(|mut c| c.pop())
            .expect("container");
        assert!(container.env.is_none());
    }

    #[test]
    fn env_pairs_parse_from_the_command_line() {
        assert_eq!(
            parse_env_var("KEY=value"),
            Ok(("KEY".to_string(), "value".to_string()))
        );
        // Values may themselves contain '='
        assert_eq!(
            parse_env_var("KEY=a=b"),
            Ok(("KEY".to_string(), "a=b".to_string()))
        );
        assert!(parse_env_var("no-equals").is_err());
        assert!(parse_env_var("=value").is_err());
    }
}
