use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::error::ExtractionError;
use crate::options::{DocxOptions, OcrOptions, PdfOptions};
use crate::result::{DocxExtraction, OcrExtraction, PdfExtraction};

/// Boxed future returned by the backend traits.
pub type BackendFuture<'a, T> =
    Pin<Box<dyn Future<Output = Result<T, ExtractionError>> + Send + 'a>>;

/// A PDF text-layer extraction backend.
///
/// Implementors take the raw document bytes; the orchestrator owns format
/// detection, fallback and result normalization.
pub trait PdfBackend: Send + Sync {
    /// Short identifier used in logs (e.g. "lopdf").
    fn name(&self) -> &str;

    fn extract<'a>(
        &'a self,
        data: Arc<[u8]>,
        options: &'a PdfOptions,
    ) -> BackendFuture<'a, PdfExtraction>;
}

/// A DOCX document-model extraction backend.
pub trait DocxBackend: Send + Sync {
    fn name(&self) -> &str;

    fn extract<'a>(
        &'a self,
        data: Arc<[u8]>,
        options: &'a DocxOptions,
    ) -> BackendFuture<'a, DocxExtraction>;
}

/// An image-to-text recognition backend.
pub trait OcrBackend: Send + Sync {
    fn name(&self) -> &str;

    fn extract<'a>(
        &'a self,
        data: Arc<[u8]>,
        options: &'a OcrOptions,
    ) -> BackendFuture<'a, OcrExtraction>;
}
