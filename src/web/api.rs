//! Defines the Axum API routes and handlers.

use crate::print_job::{JobStatus, PrintJobError};
use crate::queue::{PrintQueue, Submission, SubmitError};
use crate::web::models::{
    HealthResponse, JobEventResponse, JobResponse, JobSummaryResponse, ListJobsQuery,
};
use axum::{
    Json, Router,
    body::Body,
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    http::{StatusCode, header},
    response::{
        IntoResponse, Response,
        sse::{Event, KeepAlive, Sse},
    },
    routing::{get, post},
};
use futures_util::stream::Stream;
use std::convert::Infallible;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use uuid::Uuid;

/// Room for multipart boundaries and part headers on top of the file ceiling,
/// so oversized uploads reach the queue's own size check.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

pub type AppState = Arc<PrintQueue>;

/// Helper to create a JSON error response with a message and status code
fn json_error(message: &str, status: StatusCode) -> Response {
    (status, Json(serde_json::json!({ "error": message }))).into_response()
}

fn job_error(err: &PrintJobError) -> Response {
    let status = match err {
        PrintJobError::NotFound(_) => StatusCode::NOT_FOUND,
        PrintJobError::NotCancelable(_) | PrintJobError::InvalidTransition { .. } => {
            StatusCode::CONFLICT
        }
    };
    json_error(&err.to_string(), status)
}

fn submit_error(err: &SubmitError) -> Response {
    let status = match err {
        SubmitError::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
        _ => StatusCode::BAD_REQUEST,
    };
    json_error(&err.to_string(), status)
}

/// Ids that are not UUIDs cannot name a job, so they get the same 404.
fn parse_job_id(raw: &str) -> Result<Uuid, Response> {
    Uuid::parse_str(raw)
        .map_err(|_| json_error(&format!("Job {} not found", raw), StatusCode::NOT_FOUND))
}

/// `attachment` disposition with an ASCII-safe `filename` and, when the
/// original name is not plain ASCII, an RFC 5987 `filename*`.
fn attachment_disposition(filename: &str) -> String {
    let fallback: String = filename
        .chars()
        .map(|c| {
            if c == '"' || c == '\\' || c.is_control() || !c.is_ascii() {
                '_'
            } else {
                c
            }
        })
        .collect();
    if filename.is_ascii() {
        return format!("attachment; filename=\"{}\"", fallback);
    }
    let encoded: String = filename
        .bytes()
        .map(|b| match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                (b as char).to_string()
            }
            _ => format!("%{:02X}", b),
        })
        .collect();
    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback, encoded
    )
}

/// Creates the Axum router with all the API endpoints.
pub fn create_router(queue: AppState) -> Router {
    let body_limit = queue
        .config()
        .max_file_size
        .saturating_add(MULTIPART_OVERHEAD);
    Router::new()
        .route("/jobs", get(list_jobs).post(create_job))
        .route("/jobs/{id}", get(get_job))
        .route("/jobs/{id}/cancel", post(cancel_job))
        .route("/jobs/{id}/file", get(download_file))
        .route("/events", get(job_events))
        .route("/health", get(health))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(queue)
}

/// POST /jobs -- multipart upload with a `file` part and optional `title`.
async fn create_job(State(queue): State<AppState>, mut multipart: Multipart) -> Response {
    let mut submission = Submission::default();
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                return json_error(
                    &format!("Invalid multipart body: {}", e),
                    StatusCode::BAD_REQUEST,
                );
            }
        };
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                submission.filename = field.file_name().map(str::to_string);
                submission.content_type = field.content_type().map(str::to_string);
                match field.bytes().await {
                    Ok(data) => submission.data = Some(data),
                    Err(e) => {
                        return json_error(
                            &format!("Failed to read file: {}", e),
                            StatusCode::BAD_REQUEST,
                        );
                    }
                }
            }
            Some("title") => match field.text().await {
                Ok(title) => submission.title = Some(title),
                Err(e) => {
                    return json_error(
                        &format!("Failed to read title: {}", e),
                        StatusCode::BAD_REQUEST,
                    );
                }
            },
            _ => {}
        }
    }

    match queue.submit(submission).await {
        Ok(job) => (StatusCode::CREATED, Json(JobSummaryResponse::from(&job))).into_response(),
        Err(e) => {
            tracing::info!(error = %e, "Rejected job submission");
            submit_error(&e)
        }
    }
}

/// GET /jobs?status=
async fn list_jobs(
    State(queue): State<AppState>,
    Query(query): Query<ListJobsQuery>,
) -> Response {
    let status = match query.status.as_deref().filter(|s| !s.is_empty()) {
        Some(raw) => match raw.parse::<JobStatus>() {
            Ok(status) => Some(status),
            // No job can carry an unknown status.
            Err(_) => return (StatusCode::OK, Json(Vec::<JobResponse>::new())).into_response(),
        },
        None => None,
    };
    let jobs: Vec<JobResponse> = queue.list(status).iter().map(JobResponse::from).collect();
    (StatusCode::OK, Json(jobs)).into_response()
}

/// GET /jobs/{id}
async fn get_job(State(queue): State<AppState>, Path(id): Path<String>) -> Response {
    let id = match parse_job_id(&id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    match queue.get(id) {
        Ok(job) => (StatusCode::OK, Json(JobResponse::from(&job))).into_response(),
        Err(e) => job_error(&e),
    }
}

/// POST /jobs/{id}/cancel
async fn cancel_job(State(queue): State<AppState>, Path(id): Path<String>) -> Response {
    let id = match parse_job_id(&id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    match queue.cancel(id) {
        Ok(job) => (StatusCode::OK, Json(JobResponse::from(&job))).into_response(),
        Err(e) => job_error(&e),
    }
}

/// GET /jobs/{id}/file -- the uploaded document, unmodified.
async fn download_file(State(queue): State<AppState>, Path(id): Path<String>) -> Response {
    let id = match parse_job_id(&id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    match queue.fetch_source(id) {
        Ok(source) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "application/pdf".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    attachment_disposition(&source.filename),
                ),
            ],
            Body::from(source.data),
        )
            .into_response(),
        Err(e) => job_error(&e),
    }
}

/// GET /events -- server-sent `transition` events for every job.
async fn job_events(
    State(queue): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let mut events = queue.subscribe();
    let stream = async_stream::stream! {
        loop {
            match events.recv().await {
                Ok(event) => {
                    match Event::default()
                        .event("transition")
                        .json_data(JobEventResponse::from(&event))
                    {
                        Ok(sse_event) => yield Ok::<Event, Infallible>(sse_event),
                        Err(e) => tracing::warn!(error = %e, "Failed to encode job event"),
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Event subscriber lagged behind");
                }
                Err(RecvError::Closed) => break,
            }
        }
    };
    Sse::new(stream).keep_alive(KeepAlive::default())
}

/// GET /health
async fn health(State(queue): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        jobs: queue.store().len(),
    })
}

#[cfg(test)]
mod tests {
    use super::attachment_disposition;

    #[test]
    fn ascii_filename_is_quoted() {
        assert_eq!(
            attachment_disposition("report.pdf"),
            "attachment; filename=\"report.pdf\""
        );
    }

    #[test]
    fn quotes_are_replaced() {
        assert_eq!(
            attachment_disposition("a\"b.pdf"),
            "attachment; filename=\"a_b.pdf\""
        );
    }

    #[test]
    fn non_ascii_filename_gets_encoded_variant() {
        assert_eq!(
            attachment_disposition("звіт.pdf"),
            "attachment; filename=\"____.pdf\"; filename*=UTF-8''%D0%B7%D0%B2%D1%96%D1%82.pdf"
        );
    }
}
