//! The print queue front door: validates submissions, registers jobs and
//! starts one print run per accepted job.

use crate::config::QueueConfig;
use crate::inspector::{DocumentInspector, InspectError, PdfInspector};
use crate::job_store::JobStore;
use crate::print_job::{JobEvent, JobStatus, PrintJob, PrintJobError};
use crate::simulator::{PagePrinter, PrintSimulator, SimulatedPrinter};
use bytes::Bytes;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::broadcast;
use uuid::Uuid;

pub const DEFAULT_FILENAME: &str = "document.pdf";

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("Missing file.")]
    MissingFile,
    #[error("Content-Type must be application/pdf, got '{0}'.")]
    UnsupportedMediaType(String),
    #[error("Empty file.")]
    EmptyFile,
    #[error("File too large ({size} bytes, limit is {limit}).")]
    TooLarge { size: usize, limit: usize },
    #[error("Invalid PDF: {0}")]
    InvalidDocument(#[from] InspectError),
}

/// An upload as received from the transport, before validation.
#[derive(Debug, Clone, Default)]
pub struct Submission {
    pub data: Option<Bytes>,
    pub filename: Option<String>,
    pub content_type: Option<String>,
    pub title: Option<String>,
}

impl Submission {
    pub fn pdf(data: impl Into<Bytes>, filename: &str) -> Self {
        Self {
            data: Some(data.into()),
            filename: Some(filename.to_string()),
            content_type: Some("application/pdf".to_string()),
            title: None,
        }
    }

    pub fn with_title(mut self, title: &str) -> Self {
        self.title = Some(title.to_string());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDocument {
    pub data: Bytes,
    pub filename: String,
}

pub struct PrintQueue {
    store: Arc<JobStore>,
    inspector: Arc<dyn DocumentInspector>,
    simulator: PrintSimulator,
    config: QueueConfig,
}

impl PrintQueue {
    /// Queue backed by lopdf page counting and a delay-only printer.
    pub fn new(config: QueueConfig) -> Self {
        let printer = Arc::new(SimulatedPrinter::new(config.print_delay()));
        Self::with_components(config, Arc::new(PdfInspector::new()), printer)
    }

    pub fn with_components(
        config: QueueConfig,
        inspector: Arc<dyn DocumentInspector>,
        printer: Arc<dyn PagePrinter>,
    ) -> Self {
        let store = Arc::new(JobStore::new(config.event_buffer));
        let simulator = PrintSimulator::new(store.clone(), printer);
        Self {
            store,
            inspector,
            simulator,
            config,
        }
    }

    pub fn config(&self) -> &QueueConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<JobStore> {
        &self.store
    }

    /// Validate and register an upload, then start printing it in the
    /// background. Returns as soon as the job is `queued`.
    pub async fn submit(&self, submission: Submission) -> Result<PrintJob, SubmitError> {
        let data = submission.data.ok_or(SubmitError::MissingFile)?;
        let content_type = submission.content_type.unwrap_or_default();
        if !self.config.accepts(&content_type) {
            return Err(SubmitError::UnsupportedMediaType(content_type));
        }
        if data.is_empty() {
            return Err(SubmitError::EmptyFile);
        }
        if data.len() > self.config.max_file_size {
            return Err(SubmitError::TooLarge {
                size: data.len(),
                limit: self.config.max_file_size,
            });
        }
        let pages = self.inspector.page_count(data.clone()).await?;
        if pages == 0 {
            return Err(SubmitError::InvalidDocument(InspectError::NoPages));
        }

        let filename = submission
            .filename
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_FILENAME.to_string());
        let title = submission.title.filter(|title| !title.trim().is_empty());

        let job = self.store.create(filename, title, pages, data);
        tracing::info!(job_id = %job.id, filename = %job.filename, pages, "Job queued");
        self.simulator.spawn(job.id);
        Ok(job)
    }

    pub fn list(&self, status: Option<JobStatus>) -> Vec<PrintJob> {
        self.store.list(status)
    }

    pub fn get(&self, id: Uuid) -> Result<PrintJob, PrintJobError> {
        self.store.get(id)
    }

    /// Returns the job as it stands right after the request: `canceled` for
    /// a queued job, still `printing` (with the cancel flag set) otherwise.
    pub fn cancel(&self, id: Uuid) -> Result<PrintJob, PrintJobError> {
        let outcome = self.store.request_cancel(id)?;
        if outcome.is_immediate() {
            tracing::info!(job_id = %id, "Queued job canceled");
        } else {
            tracing::info!(job_id = %id, "Cancel requested for printing job");
        }
        Ok(outcome.into_job())
    }

    pub fn fetch_source(&self, id: Uuid) -> Result<SourceDocument, PrintJobError> {
        let (data, filename) = self.store.source(id)?;
        Ok(SourceDocument { data, filename })
    }

    pub fn subscribe(&self) -> broadcast::Receiver<JobEvent> {
        self.store.subscribe()
    }
}
