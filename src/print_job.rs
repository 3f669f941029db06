//! Print job records, their lifecycle states and the errors raised when a
//! job is asked to do something its current state does not allow.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PrintJobError {
    #[error("Job {0} not found")]
    NotFound(Uuid),
    #[error("Cannot cancel job in status '{0}'")]
    NotCancelable(JobStatus),
    #[error("Invalid state transition for job {id}: '{from}' -> '{to}'")]
    InvalidTransition {
        id: Uuid,
        from: JobStatus,
        to: JobStatus,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Printing,
    Done,
    Canceled,
    Error,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Printing => "printing",
            JobStatus::Done => "done",
            JobStatus::Canceled => "canceled",
            JobStatus::Error => "error",
        }
    }

    /// `done`, `canceled` and `error` have no outgoing edges.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Done | JobStatus::Canceled | JobStatus::Error)
    }

    /// Whether `self -> next` is an edge of the job state machine.
    /// `printing -> printing` is the per-page progress edge.
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        matches!(
            (self, next),
            (JobStatus::Queued, JobStatus::Printing)
                | (JobStatus::Queued, JobStatus::Canceled)
                | (JobStatus::Printing, JobStatus::Printing)
                | (JobStatus::Printing, JobStatus::Done)
                | (JobStatus::Printing, JobStatus::Canceled)
                | (JobStatus::Printing, JobStatus::Error)
        )
    }
}

impl FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "queued" => Ok(JobStatus::Queued),
            "printing" => Ok(JobStatus::Printing),
            "done" => Ok(JobStatus::Done),
            "canceled" => Ok(JobStatus::Canceled),
            "error" => Ok(JobStatus::Error),
            _ => Err(format!("Invalid job status: {}", s)),
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Point-in-time view of a job. The document payload stays in the store;
/// use [`crate::job_store::JobStore::source`] to read it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrintJob {
    pub id: Uuid,
    pub title: Option<String>,
    pub filename: String,
    pub pages: u32,
    pub pages_printed: u32,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub(crate) cancel_requested: bool,
}

impl PrintJob {
    pub(crate) fn new(filename: String, title: Option<String>, pages: u32) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title,
            filename,
            pages,
            pages_printed: 0,
            status: JobStatus::Queued,
            created_at: now,
            updated_at: now,
            cancel_requested: false,
        }
    }
}

/// Emitted by the store after every successful transition, progress included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobEvent {
    pub job_id: Uuid,
    pub from: JobStatus,
    pub to: JobStatus,
    pub pages_printed: u32,
    pub at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_states_have_no_edges() {
        let all = [
            JobStatus::Queued,
            JobStatus::Printing,
            JobStatus::Done,
            JobStatus::Canceled,
            JobStatus::Error,
        ];
        for from in [JobStatus::Done, JobStatus::Canceled, JobStatus::Error] {
            assert!(from.is_terminal());
            for to in all {
                assert!(!from.can_transition_to(to), "{from} -> {to}");
            }
        }
    }

    #[test]
    fn queued_cannot_finish_without_printing() {
        assert!(!JobStatus::Queued.can_transition_to(JobStatus::Done));
        assert!(!JobStatus::Queued.can_transition_to(JobStatus::Error));
        assert!(JobStatus::Queued.can_transition_to(JobStatus::Canceled));
    }

    #[test]
    fn status_parses_its_own_display() {
        for s in ["queued", "printing", "done", "canceled", "error"] {
            assert_eq!(s.parse::<JobStatus>().unwrap().to_string(), s);
        }
        assert!("paused".parse::<JobStatus>().is_err());
    }

    #[test]
    fn new_job_starts_queued_with_equal_timestamps() {
        let job = PrintJob::new("a.pdf".into(), None, 4);
        assert_eq!(job.status, JobStatus::Queued);
        assert_eq!(job.created_at, job.updated_at);
        assert_eq!(job.pages_printed, 0);
        assert!(!job.cancel_requested);
    }
}
