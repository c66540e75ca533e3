use std::fmt;

use thiserror::Error;

use crate::DetectedType;

/// Failures raised by the format backends.
///
/// The orchestrator converts these into the `error` field of an
/// [`ExtractionResult`](crate::ExtractionResult); they never escape
/// `extract_text`.
#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error(
        "Unsupported file type: {name}. Supported formats: PDF, DOCX, and images (JPEG, PNG, GIF, BMP, TIFF, WebP)"
    )]
    UnsupportedFormat { name: String },
    #[error("Failed to extract text from {}: {message}", format_label(.format))]
    Parse {
        format: DetectedType,
        message: String,
    },
    #[error("Failed to extract text from image: {0}")]
    Recognition(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ExtractionError {
    pub fn parse(format: DetectedType, message: impl Into<String>) -> Self {
        ExtractionError::Parse {
            format,
            message: message.into(),
        }
    }

    pub fn recognition(message: impl Into<String>) -> Self {
        ExtractionError::Recognition(message.into())
    }

    /// Whether retrying the same bytes through OCR makes sense.
    ///
    /// Unsupported inputs are never retried and recognition failures have
    /// no further fallback.
    pub fn is_fallback_eligible(&self) -> bool {
        matches!(self, ExtractionError::Parse { .. } | ExtractionError::Io(_))
    }
}

fn format_label(format: &DetectedType) -> &'static str {
    match format {
        DetectedType::Pdf => "PDF",
        DetectedType::Docx => "DOCX",
        DetectedType::Image => "image",
        DetectedType::Unsupported => "file",
    }
}

/// Non-fatal conditions surfaced as advisory strings on a result.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractionWarning {
    /// A requested PDF page does not exist; it contributed no text.
    PageOutOfRange { page: u32, page_count: u32 },
    /// Document metadata could not be read; text extraction was unaffected.
    MetadataUnavailable { reason: String },
    /// OCR confidence was under the advisory threshold.
    LowConfidence { confidence: f32 },
    /// The DOCX converter reported warning-level messages.
    DocxMessages,
    /// The primary backend failed and OCR produced the text instead.
    FallbackUsed {
        format: DetectedType,
        reason: String,
    },
    /// Image preprocessing failed; the raw image was recognized instead.
    PreprocessingSkipped { reason: String },
}

impl fmt::Display for ExtractionWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractionWarning::PageOutOfRange { page, page_count } => write!(
                f,
                "Page {} is out of range. PDF has {} pages.",
                page, page_count
            ),
            ExtractionWarning::MetadataUnavailable { reason } => {
                write!(f, "Failed to extract document metadata: {}", reason)
            }
            ExtractionWarning::LowConfidence { confidence } => {
                write!(f, "Low OCR confidence: {:.1}%", confidence)
            }
            ExtractionWarning::DocxMessages => {
                f.write_str("DOCX file contains warnings during extraction")
            }
            ExtractionWarning::FallbackUsed { format, reason } => write!(
                f,
                "Primary {} extraction failed ({}), used OCR as fallback",
                format, reason
            ),
            ExtractionWarning::PreprocessingSkipped { reason } => {
                write!(f, "Image preprocessing skipped: {}", reason)
            }
        }
    }
}
