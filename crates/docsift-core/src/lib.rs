use std::fmt;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

pub mod backend;
pub mod config_file;
pub mod detect;
pub mod error;
pub mod options;
pub mod progress;
pub mod result;

// Re-export for convenience
pub use backend::{BackendFuture, DocxBackend, OcrBackend, PdfBackend};
pub use detect::{content_type_for_name, detect, detect_type, is_supported_image};
pub use error::{ExtractionError, ExtractionWarning};
pub use options::{DocxOptions, ExtractionOptions, OcrOptions, PdfOptions, SizeLimits};
pub use progress::{OcrProgress, OcrStage, ProgressCallback};
pub use result::{
    DocxExtraction, DocxMessage, DocxStats, ExtractionDetail, ExtractionResult, MessageSeverity,
    OcrExtraction, PdfExtraction, PdfMetadata,
};

/// An immutable named byte sequence handed to the pipeline by its caller.
///
/// `size` is the size the caller declared for the file. Constructors set it
/// to the byte length; it is kept separate so a host can report the size it
/// observed upstream.
#[derive(Clone)]
pub struct FileBlob {
    pub name: String,
    pub content_type: String,
    pub size: u64,
    pub data: Arc<[u8]>,
}

impl FileBlob {
    pub fn new(
        name: impl Into<String>,
        content_type: impl Into<String>,
        data: impl Into<Arc<[u8]>>,
    ) -> Self {
        let data = data.into();
        Self {
            name: name.into(),
            content_type: content_type.into(),
            size: data.len() as u64,
            data,
        }
    }

    /// Read a file from disk. The content type is derived from the file
    /// suffix, as a browser file picker would report it.
    pub async fn from_path(path: &Path) -> Result<Self, std::io::Error> {
        let data = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        let content_type = content_type_for_name(&name);
        Ok(Self::new(name, content_type, data))
    }
}

impl fmt::Debug for FileBlob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileBlob")
            .field("name", &self.name)
            .field("content_type", &self.content_type)
            .field("size", &self.size)
            .field("data", &format_args!("<{} bytes>", self.data.len()))
            .finish()
    }
}

/// The format a [`FileBlob`] was classified as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectedType {
    Pdf,
    Docx,
    Image,
    Unsupported,
}

impl DetectedType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DetectedType::Pdf => "pdf",
            DetectedType::Docx => "docx",
            DetectedType::Image => "image",
            DetectedType::Unsupported => "unsupported",
        }
    }

    /// The backend that handles this type first, if any.
    pub fn primary_method(&self) -> ExtractionMethod {
        match self {
            DetectedType::Pdf => ExtractionMethod::Pdf,
            DetectedType::Docx => ExtractionMethod::Docx,
            DetectedType::Image => ExtractionMethod::Ocr,
            DetectedType::Unsupported => ExtractionMethod::None,
        }
    }
}

impl fmt::Display for DetectedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The backend that produced (or was attempted for) a result's text.
///
/// `None` marks results where no backend ran at all (unsupported input).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionMethod {
    Pdf,
    Docx,
    Ocr,
    None,
}

impl ExtractionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractionMethod::Pdf => "pdf",
            ExtractionMethod::Docx => "docx",
            ExtractionMethod::Ocr => "ocr",
            ExtractionMethod::None => "none",
        }
    }
}

impl fmt::Display for ExtractionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
