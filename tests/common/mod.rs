// Shared fixtures for integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::Body;
use axum::http::Request;
use bytes::Bytes;
use lopdf::{Document, Object, dictionary};
use print_queue::{
    DocumentInspector, InspectError, JobStatus, PagePrinter, PrintFault, PrintJob, PrintQueue,
};
use std::time::Duration;
use uuid::Uuid;

pub const BOUNDARY: &str = "print-queue-test-boundary";

/// A minimal but well-formed PDF with `pages` blank A4 pages.
pub fn pdf_with_pages(pages: u32) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let kids: Vec<Object> = (0..pages)
        .map(|_| {
            doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            })
            .into()
        })
        .collect();
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => i64::from(pages),
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).unwrap();
    buffer
}

/// Inspector stub reporting a fixed page count without touching the bytes.
pub struct FixedPages(pub u32);

#[async_trait]
impl DocumentInspector for FixedPages {
    async fn page_count(&self, _data: Bytes) -> Result<u32, InspectError> {
        Ok(self.0)
    }
}

/// Waits `delay` per page and fails on page `fail_on`.
pub struct FaultyPrinter {
    pub delay: Duration,
    pub fail_on: u32,
}

#[async_trait]
impl PagePrinter for FaultyPrinter {
    async fn print_page(&self, _job: &PrintJob, page: u32) -> Result<(), PrintFault> {
        tokio::time::sleep(self.delay).await;
        if page == self.fail_on {
            return Err(PrintFault {
                page,
                reason: "paper jam".to_string(),
            });
        }
        Ok(())
    }
}

/// Panics on the first page of any job whose filename starts with `boom`.
pub struct PanickingPrinter {
    pub delay: Duration,
}

#[async_trait]
impl PagePrinter for PanickingPrinter {
    async fn print_page(&self, job: &PrintJob, _page: u32) -> Result<(), PrintFault> {
        if job.filename.starts_with("boom") {
            panic!("printer driver crashed");
        }
        tokio::time::sleep(self.delay).await;
        Ok(())
    }
}

/// Poll until `id` reaches `status`, failing the test after `within`.
pub async fn wait_for_status(
    queue: &PrintQueue,
    id: Uuid,
    status: JobStatus,
    within: Duration,
) -> PrintJob {
    let deadline = tokio::time::Instant::now() + within;
    loop {
        let job = queue.get(id).unwrap();
        if job.status == status {
            return job;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "job {} stuck in '{}' while waiting for '{}'",
            id,
            job.status,
            status
        );
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

pub fn multipart_body(file: Option<(&str, &str, &[u8])>, title: Option<&str>) -> Vec<u8> {
    let mut body = Vec::new();
    if let Some(title) = title {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"title\"\r\n\r\n{title}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some((filename, content_type, data)) = file {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub fn upload_request(file: Option<(&str, &str, &[u8])>, title: Option<&str>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/jobs")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(file, title)))
        .unwrap()
}
