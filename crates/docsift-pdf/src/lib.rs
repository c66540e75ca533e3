use std::sync::Arc;

use futures_util::future::join_all;
use lopdf::Document;
use serde::Serialize;

use docsift_core::{
    BackendFuture, DetectedType, ExtractionError, ExtractionWarning, PdfBackend, PdfExtraction,
    PdfMetadata, PdfOptions,
};

pub mod metadata;

pub use metadata::{decode_text_string, parse_pdf_date};

/// lopdf-based implementation of [`PdfBackend`].
///
/// Reads the embedded text layer only; scanned pages without one yield empty
/// text, which is the orchestrator's cue to fall back to OCR. Each selected
/// page is decoded on its own blocking task and the results are reassembled
/// in the requested order.
#[derive(Debug, Default, Clone, Copy)]
pub struct LopdfBackend;

impl LopdfBackend {
    pub fn new() -> Self {
        Self
    }
}

impl PdfBackend for LopdfBackend {
    fn name(&self) -> &str {
        "lopdf"
    }

    fn extract<'a>(
        &'a self,
        data: Arc<[u8]>,
        options: &'a PdfOptions,
    ) -> BackendFuture<'a, PdfExtraction> {
        Box::pin(extract_pdf(data, options))
    }
}

async fn load_document(data: Arc<[u8]>) -> Result<Document, ExtractionError> {
    tokio::task::spawn_blocking(move || Document::load_mem(&data))
        .await
        .map_err(|e| ExtractionError::parse(DetectedType::Pdf, e.to_string()))?
        .map_err(|e| ExtractionError::parse(DetectedType::Pdf, e.to_string()))
}

async fn extract_pdf(
    data: Arc<[u8]>,
    options: &PdfOptions,
) -> Result<PdfExtraction, ExtractionError> {
    let doc = Arc::new(load_document(data).await?);
    let page_count = doc.get_pages().len() as u32;

    let selected: Vec<u32> = match &options.page_numbers {
        Some(pages) => pages.clone(),
        None => (1..=page_count).collect(),
    };

    let mut warnings = Vec::new();
    for &page in &selected {
        if page == 0 || page > page_count {
            tracing::warn!(page, page_count, "requested PDF page is out of range");
            warnings.push(ExtractionWarning::PageOutOfRange { page, page_count });
        }
    }

    let tasks = selected.iter().map(|&page| {
        let doc = Arc::clone(&doc);
        async move {
            if page == 0 || page > page_count {
                return String::new();
            }
            match tokio::task::spawn_blocking(move || page_text(&doc, page)).await {
                Ok(Ok(text)) => text,
                Ok(Err(e)) => {
                    tracing::warn!(page, error = %e, "failed to extract PDF page text");
                    String::new()
                }
                Err(e) => {
                    tracing::warn!(page, error = %e, "PDF page task aborted");
                    String::new()
                }
            }
        }
    });
    let pages = join_all(tasks).await;
    let text = pages.join("\n\n").trim().to_string();

    let metadata = if options.include_metadata {
        match metadata::read_metadata(&doc) {
            Ok(meta) => Some(meta),
            Err(reason) => {
                tracing::warn!(error = %reason, "failed to read PDF metadata");
                warnings.push(ExtractionWarning::MetadataUnavailable { reason });
                None
            }
        }
    } else {
        None
    };

    tracing::debug!(page_count, pages = selected.len(), chars = text.len(), "PDF text extracted");

    Ok(PdfExtraction {
        text,
        page_count,
        metadata,
        warnings,
    })
}

/// Text-layer tokens of one page joined by single spaces.
fn page_text(doc: &Document, page: u32) -> Result<String, lopdf::Error> {
    let raw = doc.extract_text(&[page])?;
    Ok(raw.split_whitespace().collect::<Vec<_>>().join(" "))
}

/// Document facts reported without extracting the full text.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PdfInfo {
    pub page_count: u32,
    /// Whether the first page carries a text layer.
    pub has_text: bool,
    pub file_size: u64,
    pub metadata: Option<PdfMetadata>,
}

/// Page count, text-layer probe and metadata for a PDF.
pub async fn pdf_info(data: Arc<[u8]>) -> Result<PdfInfo, ExtractionError> {
    let file_size = data.len() as u64;
    let doc = load_document(data).await?;
    tokio::task::spawn_blocking(move || {
        let page_count = doc.get_pages().len() as u32;
        let has_text = page_count > 0
            && page_text(&doc, 1)
                .map(|t| !t.is_empty())
                .unwrap_or(false);
        let metadata = match metadata::read_metadata(&doc) {
            Ok(meta) => Some(meta),
            Err(reason) => {
                tracing::warn!(error = %reason, "failed to read PDF metadata");
                None
            }
        };
        PdfInfo {
            page_count,
            has_text,
            file_size,
            metadata,
        }
    })
    .await
    .map_err(|e| ExtractionError::parse(DetectedType::Pdf, e.to_string()))
}
