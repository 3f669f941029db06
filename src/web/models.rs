//! Contains the data models for API requests and responses.

use crate::print_job::{JobEvent, JobStatus, PrintJob};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Returned by `POST /jobs`.
#[derive(Serialize, Debug)]
pub struct JobSummaryResponse {
    pub job_id: Uuid,
    pub filename: String,
    pub pages: u32,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
}

impl From<&PrintJob> for JobSummaryResponse {
    fn from(job: &PrintJob) -> Self {
        Self {
            job_id: job.id,
            filename: job.filename.clone(),
            pages: job.pages,
            status: job.status,
            created_at: job.created_at,
        }
    }
}

/// Full job representation used by get, list and cancel.
#[derive(Serialize, Debug)]
pub struct JobResponse {
    pub job_id: Uuid,
    pub title: Option<String>,
    pub filename: String,
    pub pages: u32,
    pub pages_printed: u32,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&PrintJob> for JobResponse {
    fn from(job: &PrintJob) -> Self {
        Self {
            job_id: job.id,
            title: job.title.clone(),
            filename: job.filename.clone(),
            pages: job.pages,
            pages_printed: job.pages_printed,
            status: job.status,
            created_at: job.created_at,
            updated_at: job.updated_at,
        }
    }
}

/// Query string of `GET /jobs`. An empty `status=` means no filter.
#[derive(Deserialize, Debug, Default)]
pub struct ListJobsQuery {
    pub status: Option<String>,
}

/// Payload of one `transition` event on `GET /events`.
#[derive(Serialize, Debug)]
pub struct JobEventResponse {
    pub job_id: Uuid,
    pub from: JobStatus,
    pub to: JobStatus,
    pub pages_printed: u32,
    pub at: DateTime<Utc>,
}

impl From<&JobEvent> for JobEventResponse {
    fn from(event: &JobEvent) -> Self {
        Self {
            job_id: event.job_id,
            from: event.from,
            to: event.to,
            pages_printed: event.pages_printed,
            at: event.at,
        }
    }
}

#[derive(Serialize, Debug)]
pub struct HealthResponse {
    pub status: &'static str,
    pub jobs: usize,
}
