//! Page-by-page print execution for a single job.
//!
//! A run claims the job with a guarded `queued -> printing` transition, so a
//! job that was canceled first (or claimed by another run) is left alone.
//! Cancellation is observed before every page and once more when leaving
//! `printing`.

use crate::job_store::JobStore;
use crate::print_job::{JobStatus, PrintJob, PrintJobError};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;
use uuid::Uuid;

#[derive(Debug, Error)]
#[error("printer fault on page {page}: {reason}")]
pub struct PrintFault {
    pub page: u32,
    pub reason: String,
}

#[async_trait]
pub trait PagePrinter: Send + Sync {
    /// Produce page `page` (1-based) of `job`.
    async fn print_page(&self, job: &PrintJob, page: u32) -> Result<(), PrintFault>;
}

/// Spends a fixed delay per page and never fails.
#[derive(Debug, Clone)]
pub struct SimulatedPrinter {
    delay: Duration,
}

impl SimulatedPrinter {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl PagePrinter for SimulatedPrinter {
    async fn print_page(&self, _job: &PrintJob, _page: u32) -> Result<(), PrintFault> {
        tokio::time::sleep(self.delay).await;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The job had already left `queued`; nothing was printed.
    Skipped(JobStatus),
    /// The run drove the job into a terminal state.
    Finished(PrintJob),
}

#[derive(Clone)]
pub struct PrintSimulator {
    store: Arc<JobStore>,
    printer: Arc<dyn PagePrinter>,
}

impl PrintSimulator {
    pub fn new(store: Arc<JobStore>, printer: Arc<dyn PagePrinter>) -> Self {
        Self { store, printer }
    }

    pub async fn run(&self, id: Uuid) -> Result<RunOutcome, PrintJobError> {
        let mut job =
            match self
                .store
                .compare_and_transition(id, &[JobStatus::Queued], JobStatus::Printing)
            {
                Ok(job) => job,
                Err(PrintJobError::InvalidTransition { from, .. }) => {
                    tracing::info!(job_id = %id, status = %from, "Job no longer queued, skipping print");
                    return Ok(RunOutcome::Skipped(from));
                }
                Err(e) => return Err(e),
            };
        tracing::info!(job_id = %id, pages = job.pages, "Print started");

        for page in 1..=job.pages {
            if self.store.is_cancel_requested(id)? {
                let job = self.store.compare_and_transition(
                    id,
                    &[JobStatus::Printing],
                    JobStatus::Canceled,
                )?;
                tracing::info!(job_id = %id, pages_printed = job.pages_printed, "Print canceled");
                return Ok(RunOutcome::Finished(job));
            }
            if let Err(fault) = self.printer.print_page(&job, page).await {
                tracing::error!(job_id = %id, error = %fault, "Print failed");
                let job =
                    self.store
                        .compare_and_transition(id, &[JobStatus::Printing], JobStatus::Error)?;
                return Ok(RunOutcome::Finished(job));
            }
            job = self.store.record_page(id)?;
            tracing::debug!(job_id = %id, page, "Page printed");
        }

        let job = self.store.complete(id)?;
        tracing::info!(job_id = %id, status = %job.status, "Print finished");
        Ok(RunOutcome::Finished(job))
    }

    /// Run `id` on its own task. A panic inside the run moves the job to
    /// `error` instead of taking anything else down with it.
    pub fn spawn(&self, id: Uuid) -> JoinHandle<()> {
        let simulator = self.clone();
        tokio::spawn(async move {
            let run = {
                let simulator = simulator.clone();
                tokio::spawn(async move { simulator.run(id).await })
            };
            match run.await {
                Ok(Ok(_)) => {}
                Ok(Err(e)) => tracing::warn!(job_id = %id, error = %e, "Print run aborted"),
                Err(e) => {
                    tracing::error!(job_id = %id, error = %e, "Print run panicked");
                    if let Err(e) = simulator.fail(id) {
                        tracing::warn!(job_id = %id, error = %e, "Could not mark job as failed");
                    }
                }
            }
        })
    }

    fn fail(&self, id: Uuid) -> Result<PrintJob, PrintJobError> {
        self.store
            .compare_and_transition(id, &[JobStatus::Printing], JobStatus::Error)
    }
}
