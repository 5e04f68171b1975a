//! The workload cycler
//!
//! Oscillates one named Job between present and absent on a fixed
//! wall-clock schedule: create, hold, delete (with pod cleanup by
//! selector), pause, repeat. Failures along the way are logged and the
//! cycle continues; nothing short of session loss stops the loop.
//!
//! Time is injected through the `Clock` trait so tests can observe the
//! schedule instead of sleeping through it, and swallowed errors are
//! carried in the per-cycle report instead of being discarded.

use std::time::Duration;

use tracing::{info, warn};

use crate::error::Error;
use crate::job::JobTemplate;
use crate::orchestrator::JobOrchestrator;

/// How long the Job is left running after creation
pub const ACTIVE_WINDOW: Duration = Duration::from_secs(40);

/// Pause between deleting the Job and creating the next one
pub const PAUSE_WINDOW: Duration = Duration::from_secs(10);

/// Trait for waiting out the cycle windows
///
/// This abstracts `tokio::time::sleep`, enabling tests to assert on the
/// schedule without blocking on real time.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait Clock: Send + Sync {
    /// Wait for the given period
    async fn sleep(&self, period: Duration);
}

/// Default clock backed by the tokio timer
#[derive(Clone, Default)]
pub struct TokioClock;

#[async_trait::async_trait]
impl Clock for TokioClock {
    async fn sleep(&self, period: Duration) {
        tokio::time::sleep(period).await;
    }
}

/// Result of a create call
#[derive(Debug, PartialEq, Eq)]
pub enum CreateOutcome {
    /// A new Job was created
    Created,
    /// A Job with this name already exists; creation is a no-op
    AlreadyPresent,
}

/// What happened to one step of a cycle
#[derive(Debug)]
pub enum StepOutcome {
    /// The call went through
    Completed,
    /// Create found the Job already in place
    AlreadyPresent,
    /// The call failed; the error was logged and the cycle continued
    Swallowed(Error),
}

impl StepOutcome {
    /// True if this step failed and the error was swallowed
    pub fn is_swallowed(&self) -> bool {
        matches!(self, StepOutcome::Swallowed(_))
    }
}

/// Outcomes of one full cycle, create through pause
#[derive(Debug)]
pub struct CycleReport {
    /// Outcome of the create step
    pub create: StepOutcome,
    /// Outcome of the delete step (Job plus pod cleanup)
    pub delete: StepOutcome,
}

/// Cycles one named Job in a namespace
pub struct JobCycler {
    api: Box<dyn JobOrchestrator>,
    clock: Box<dyn Clock>,
    template: JobTemplate,
}

impl JobCycler {
    /// Create a cycler over the given orchestrator and clock
    pub fn new(api: Box<dyn JobOrchestrator>, clock: Box<dyn Clock>, template: JobTemplate) -> Self {
        Self {
            api,
            clock,
            template,
        }
    }

    /// Submit the Job for creation.
    ///
    /// An existing Job with the same name is not an error: the invariant is
    /// at most one Job per name, and creation against a live one is a no-op.
    pub async fn create(&self) -> Result<CreateOutcome, Error> {
        info!(job = %self.template.name, "creating job");
        match self.api.create_job(&self.template.to_job()).await {
            Ok(()) => Ok(CreateOutcome::Created),
            Err(e) if e.is_already_exists() => {
                info!(job = %self.template.name, "job already exists, leaving it in place");
                Ok(CreateOutcome::AlreadyPresent)
            }
            Err(e) => Err(e),
        }
    }

    /// Delete the Job, then its Pods by label selector.
    ///
    /// Pod cleanup runs only after the Job delete succeeds; a failed Job
    /// delete (including not-found) skips cleanup and surfaces to the
    /// caller. A cleanup failure after a successful Job delete surfaces as
    /// the cleanup error, not a false success.
    pub async fn delete(&self) -> Result<(), Error> {
        self.api.delete_job(&self.template.name).await?;
        self.api
            .delete_pods_by_selector(&self.template.pod_selector())
            .await
    }

    /// Run one full cycle: create, hold, delete, pause.
    ///
    /// Step failures are logged and recorded in the report; they never
    /// escalate past the cycle.
    pub async fn run_cycle(&self) -> CycleReport {
        let create = match self.create().await {
            Ok(CreateOutcome::Created) => StepOutcome::Completed,
            Ok(CreateOutcome::AlreadyPresent) => StepOutcome::AlreadyPresent,
            Err(e) => {
                warn!(job = %self.template.name, error = %e, "job creation failed, continuing cycle");
                StepOutcome::Swallowed(e)
            }
        };

        self.clock.sleep(ACTIVE_WINDOW).await;

        info!(job = %self.template.name, "deleting job");
        let delete = match self.delete().await {
            Ok(()) => StepOutcome::Completed,
            Err(e) => {
                warn!(job = %self.template.name, error = %e, "job deletion failed, continuing cycle");
                StepOutcome::Swallowed(e)
            }
        };

        self.clock.sleep(PAUSE_WINDOW).await;

        CycleReport { create, delete }
    }

    /// Cycle until the process is killed
    pub async fn run_forever(&self) {
        loop {
            self.run_cycle().await;
        }
    }
}
