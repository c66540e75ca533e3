use std::time::Duration;

use chrono::{DateTime, FixedOffset};
use serde::{Serialize, Serializer};

use crate::error::ExtractionWarning;
use crate::{DetectedType, ExtractionMethod, FileBlob};

/// Output of the PDF backend.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PdfExtraction {
    pub text: String,
    pub page_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<PdfMetadata>,
    /// Non-fatal problems (skipped pages, unreadable metadata).
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<ExtractionWarning>,
}

/// Fields of the PDF document information dictionary.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PdfMetadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
    pub creation_date: Option<DateTime<FixedOffset>>,
    pub modification_date: Option<DateTime<FixedOffset>>,
}

/// Severity of a DOCX conversion message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageSeverity {
    Info,
    Warning,
    Error,
}

/// A diagnostic produced while converting a DOCX package. Surfaced, never
/// raised.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocxMessage {
    #[serde(rename = "type")]
    pub severity: MessageSeverity,
    pub message: String,
}

impl DocxMessage {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            severity: MessageSeverity::Info,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: MessageSeverity::Warning,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocxStats {
    pub word_count: usize,
    pub paragraph_count: usize,
    pub has_images: bool,
}

/// Output of the DOCX backend.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocxExtraction {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
    pub messages: Vec<DocxMessage>,
    pub metadata: Option<DocxStats>,
}

/// Output of the OCR backend.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OcrExtraction {
    pub text: String,
    /// Engine-reported confidence, 0 to 100.
    pub confidence: f32,
    pub processing_time_ms: u64,
}

/// The backend-specific half of a successful result.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ExtractionDetail {
    Pdf(PdfExtraction),
    Docx(DocxExtraction),
    Ocr(OcrExtraction),
}

impl ExtractionDetail {
    pub fn method(&self) -> ExtractionMethod {
        match self {
            ExtractionDetail::Pdf(_) => ExtractionMethod::Pdf,
            ExtractionDetail::Docx(_) => ExtractionMethod::Docx,
            ExtractionDetail::Ocr(_) => ExtractionMethod::Ocr,
        }
    }

    pub fn text(&self) -> &str {
        match self {
            ExtractionDetail::Pdf(r) => &r.text,
            ExtractionDetail::Docx(r) => &r.text,
            ExtractionDetail::Ocr(r) => &r.text,
        }
    }
}

/// The uniform envelope returned for every file, whatever backend ran.
///
/// Build it with [`ExtractionResult::succeeded`] or
/// [`ExtractionResult::failed`]. Those constructors guarantee that `success`
/// is true exactly when `error` is `None`, that a failed result has empty
/// text and no detail, and that a present detail matches
/// `extraction_method`. The fields stay public for reading and
/// serialization; code that mutates them takes over those guarantees.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionResult {
    pub text: String,
    pub file_type: DetectedType,
    pub extraction_method: ExtractionMethod,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<ExtractionDetail>,
    pub processing_time_ms: u64,
    pub file_size: u64,
    pub file_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub warnings: Vec<String>,
}

impl ExtractionResult {
    pub fn succeeded(
        file: &FileBlob,
        file_type: DetectedType,
        detail: ExtractionDetail,
        warnings: Vec<String>,
    ) -> Self {
        Self {
            text: detail.text().to_string(),
            file_type,
            extraction_method: detail.method(),
            success: true,
            detail: Some(detail),
            processing_time_ms: 0,
            file_size: file.size,
            file_name: file.name.clone(),
            error: None,
            warnings,
        }
    }

    pub fn failed(
        file: &FileBlob,
        file_type: DetectedType,
        attempted: ExtractionMethod,
        error: impl Into<String>,
        warnings: Vec<String>,
    ) -> Self {
        Self {
            text: String::new(),
            file_type,
            extraction_method: attempted,
            success: false,
            detail: None,
            processing_time_ms: 0,
            file_size: file.size,
            file_name: file.name.clone(),
            error: Some(error.into()),
            warnings,
        }
    }

    /// Stamp the elapsed wall-clock time of the call.
    pub fn with_processing_time(mut self, elapsed: Duration) -> Self {
        self.processing_time_ms = elapsed.as_millis() as u64;
        self
    }
}

impl Serialize for ExtractionWarning {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blob() -> FileBlob {
        FileBlob::new("scan.png", "image/png", vec![0u8; 10])
    }

    fn ocr_detail(text: &str) -> ExtractionDetail {
        ExtractionDetail::Ocr(OcrExtraction {
            text: text.to_string(),
            confidence: 91.0,
            processing_time_ms: 3,
        })
    }

    #[test]
    fn succeeded_mirrors_detail() {
        let r = ExtractionResult::succeeded(&blob(), DetectedType::Image, ocr_detail("hi"), vec![]);
        assert!(r.success);
        assert!(r.error.is_none());
        assert_eq!(r.text, "hi");
        assert_eq!(r.extraction_method, ExtractionMethod::Ocr);
        assert_eq!(r.detail.as_ref().map(|d| d.method()), Some(ExtractionMethod::Ocr));
        assert_eq!(r.file_size, 10);
        assert_eq!(r.file_name, "scan.png");
    }

    #[test]
    fn failed_has_error_and_no_text() {
        let r = ExtractionResult::failed(
            &blob(),
            DetectedType::Docx,
            ExtractionMethod::Docx,
            "boom",
            vec![],
        );
        assert!(!r.success);
        assert_eq!(r.error.as_deref(), Some("boom"));
        assert!(r.text.is_empty());
        assert!(r.detail.is_none());
    }

    #[test]
    fn processing_time_is_stamped_in_millis() {
        let r = ExtractionResult::succeeded(&blob(), DetectedType::Image, ocr_detail(""), vec![])
            .with_processing_time(Duration::from_millis(1500));
        assert_eq!(r.processing_time_ms, 1500);
    }

    #[test]
    fn serializes_with_original_field_names() {
        let r = ExtractionResult::failed(
            &blob(),
            DetectedType::Unsupported,
            ExtractionMethod::None,
            "nope",
            vec![],
        );
        let v = serde_json::to_value(&r).unwrap();
        assert_eq!(v["fileType"], "unsupported");
        assert_eq!(v["extractionMethod"], "none");
        assert_eq!(v["success"], false);
        assert_eq!(v["fileName"], "scan.png");
        assert!(v.get("detail").is_none());
    }

    #[test]
    fn docx_message_serializes_type_field() {
        let v = serde_json::to_value(DocxMessage::warning("careful")).unwrap();
        assert_eq!(v["type"], "warning");
        assert_eq!(v["message"], "careful");
    }

    #[test]
    fn warnings_serialize_as_strings() {
        let w = ExtractionWarning::PageOutOfRange {
            page: 9,
            page_count: 3,
        };
        assert_eq!(
            serde_json::to_value(&w).unwrap(),
            "Page 9 is out of range. PDF has 3 pages."
        );
    }
}
