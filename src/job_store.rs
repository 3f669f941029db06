//! In-memory job table.
//!
//! Every record sits behind its own mutex so work on one job never waits on
//! another. The table lock is only write-held while inserting. Records are
//! never removed, so a job id stays valid for the life of the process.
//!
//! All status changes funnel through [`JobStore::compare_and_transition_with`]
//! (or the locked helper it shares with cancellation and completion). That
//! keeps the status check, the write, the timestamp bump and the event
//! publication inside one critical section.

use crate::print_job::{JobEvent, JobStatus, PrintJob, PrintJobError};
use bytes::Bytes;
use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::broadcast;
use uuid::Uuid;

pub const DEFAULT_EVENT_BUFFER: usize = 256;

struct JobRecord {
    job: PrintJob,
    source: Bytes,
}

#[derive(Default)]
struct JobTable {
    order: Vec<Uuid>,
    records: HashMap<Uuid, Arc<Mutex<JobRecord>>>,
}

/// Result of a cancel request that was accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CancelOutcome {
    /// The job was still queued and is now `canceled`.
    Immediate(PrintJob),
    /// The job is printing; the simulator will cancel it at the next page boundary.
    Deferred(PrintJob),
}

impl CancelOutcome {
    pub fn is_immediate(&self) -> bool {
        matches!(self, CancelOutcome::Immediate(_))
    }

    pub fn into_job(self) -> PrintJob {
        match self {
            CancelOutcome::Immediate(job) | CancelOutcome::Deferred(job) => job,
        }
    }
}

pub struct JobStore {
    table: RwLock<JobTable>,
    events: broadcast::Sender<JobEvent>,
}

impl Default for JobStore {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER)
    }
}

impl JobStore {
    pub fn new(event_buffer: usize) -> Self {
        let (events, _) = broadcast::channel(event_buffer.max(1));
        Self {
            table: RwLock::new(JobTable::default()),
            events,
        }
    }

    /// Insert a new `queued` job. The page count is final from here on.
    pub fn create(
        &self,
        filename: String,
        title: Option<String>,
        pages: u32,
        source: Bytes,
    ) -> PrintJob {
        let job = PrintJob::new(filename, title, pages);
        let snapshot = job.clone();
        let mut table = self.table.write();
        table.order.push(job.id);
        table
            .records
            .insert(job.id, Arc::new(Mutex::new(JobRecord { job, source })));
        snapshot
    }

    pub fn get(&self, id: Uuid) -> Result<PrintJob, PrintJobError> {
        Ok(self.record(id)?.lock().job.clone())
    }

    /// Jobs in creation order, optionally restricted to one status.
    pub fn list(&self, status: Option<JobStatus>) -> Vec<PrintJob> {
        let records: Vec<_> = {
            let table = self.table.read();
            table
                .order
                .iter()
                .filter_map(|id| table.records.get(id).cloned())
                .collect()
        };
        records
            .iter()
            .map(|record| record.lock().job.clone())
            .filter(|job| status.is_none_or(|s| job.status == s))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.table.read().order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stored payload and original filename, exactly as submitted.
    pub fn source(&self, id: Uuid) -> Result<(Bytes, String), PrintJobError> {
        let record = self.record(id)?;
        let record = record.lock();
        Ok((record.source.clone(), record.job.filename.clone()))
    }

    pub fn compare_and_transition(
        &self,
        id: Uuid,
        expected: &[JobStatus],
        new: JobStatus,
    ) -> Result<PrintJob, PrintJobError> {
        self.compare_and_transition_with(id, expected, new, |_| {})
    }

    /// Atomically move `id` to `new` if its status is one of `expected`,
    /// running `side_effect` on the record inside the same critical section.
    pub fn compare_and_transition_with<F>(
        &self,
        id: Uuid,
        expected: &[JobStatus],
        new: JobStatus,
        side_effect: F,
    ) -> Result<PrintJob, PrintJobError>
    where
        F: FnOnce(&mut PrintJob),
    {
        let record = self.record(id)?;
        let mut record = record.lock();
        self.transition_locked(&mut record.job, expected, new, side_effect)
    }

    /// Cancel a queued job on the spot, or flag a printing one for the
    /// simulator. Terminal jobs are left untouched.
    pub fn request_cancel(&self, id: Uuid) -> Result<CancelOutcome, PrintJobError> {
        let record = self.record(id)?;
        let mut record = record.lock();
        match record.job.status {
            JobStatus::Queued => {
                let job = self.transition_locked(
                    &mut record.job,
                    &[JobStatus::Queued],
                    JobStatus::Canceled,
                    |job| job.cancel_requested = true,
                )?;
                Ok(CancelOutcome::Immediate(job))
            }
            JobStatus::Printing => {
                record.job.cancel_requested = true;
                Ok(CancelOutcome::Deferred(record.job.clone()))
            }
            status => Err(PrintJobError::NotCancelable(status)),
        }
    }

    pub fn is_cancel_requested(&self, id: Uuid) -> Result<bool, PrintJobError> {
        Ok(self.record(id)?.lock().job.cancel_requested)
    }

    /// One page finished: `printing -> printing` with the counter bumped.
    pub fn record_page(&self, id: Uuid) -> Result<PrintJob, PrintJobError> {
        self.compare_and_transition_with(id, &[JobStatus::Printing], JobStatus::Printing, |job| {
            job.pages_printed = (job.pages_printed + 1).min(job.pages);
        })
    }

    /// Leave `printing` after the last page. A cancel that arrived while the
    /// last page was in flight still wins.
    pub fn complete(&self, id: Uuid) -> Result<PrintJob, PrintJobError> {
        let record = self.record(id)?;
        let mut record = record.lock();
        let target = if record.job.cancel_requested {
            JobStatus::Canceled
        } else {
            JobStatus::Done
        };
        self.transition_locked(&mut record.job, &[JobStatus::Printing], target, |_| {})
    }

    pub fn subscribe(&self) -> broadcast::Receiver<JobEvent> {
        self.events.subscribe()
    }

    fn record(&self, id: Uuid) -> Result<Arc<Mutex<JobRecord>>, PrintJobError> {
        self.table
            .read()
            .records
            .get(&id)
            .cloned()
            .ok_or(PrintJobError::NotFound(id))
    }

    // Caller holds the record lock. The event goes out before the lock is
    // released so subscribers see one job's transitions in order.
    fn transition_locked<F>(
        &self,
        job: &mut PrintJob,
        expected: &[JobStatus],
        new: JobStatus,
        side_effect: F,
    ) -> Result<PrintJob, PrintJobError>
    where
        F: FnOnce(&mut PrintJob),
    {
        let from = job.status;
        if !expected.contains(&from) || !from.can_transition_to(new) {
            return Err(PrintJobError::InvalidTransition {
                id: job.id,
                from,
                to: new,
            });
        }
        side_effect(job);
        job.status = new;
        job.updated_at = Utc::now().max(job.updated_at);
        let _ = self.events.send(JobEvent {
            job_id: job.id,
            from,
            to: new,
            pages_printed: job.pages_printed,
            at: job.updated_at,
        });
        Ok(job.clone())
    }
}
