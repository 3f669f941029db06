//! Document inspection: bytes in, page count out.

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InspectError {
    #[error("failed to parse PDF: {0}")]
    Malformed(String),
    #[error("PDF has zero pages")]
    NoPages,
    #[error("inspection task failed: {0}")]
    Task(String),
}

#[async_trait]
pub trait DocumentInspector: Send + Sync {
    /// Number of pages in `data`; never `Ok(0)`.
    async fn page_count(&self, data: Bytes) -> Result<u32, InspectError>;
}

/// Counts pages by walking the PDF page tree with lopdf.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfInspector;

impl PdfInspector {
    pub fn new() -> Self {
        Self
    }

    pub fn count_pages(data: &[u8]) -> Result<u32, InspectError> {
        let doc = lopdf::Document::load_mem(data)
            .map_err(|e| InspectError::Malformed(e.to_string()))?;
        let pages = u32::try_from(doc.get_pages().len())
            .map_err(|_| InspectError::Malformed("page count out of range".to_string()))?;
        if pages == 0 {
            return Err(InspectError::NoPages);
        }
        Ok(pages)
    }
}

#[async_trait]
impl DocumentInspector for PdfInspector {
    #[tracing::instrument(skip(self, data), fields(size = data.len()))]
    async fn page_count(&self, data: Bytes) -> Result<u32, InspectError> {
        // lopdf parsing is CPU bound; keep it off the async workers.
        tokio::task::spawn_blocking(move || Self::count_pages(&data))
            .await
            .map_err(|e| InspectError::Task(e.to_string()))?
    }
}
