//! In-memory PDF print queue with simulated page-by-page printing and
//! race-safe cancellation.

pub mod config;
pub mod inspector;
pub mod job_store;
pub mod print_job;
pub mod queue;
pub mod simulator;
pub mod web;

pub use config::{Config, QueueConfig, ServerConfig};
pub use inspector::{DocumentInspector, InspectError, PdfInspector};
pub use job_store::{CancelOutcome, JobStore};
pub use print_job::{JobEvent, JobStatus, PrintJob, PrintJobError};
pub use queue::{PrintQueue, SourceDocument, Submission, SubmitError};
pub use simulator::{PagePrinter, PrintFault, PrintSimulator, RunOutcome, SimulatedPrinter};
