use std::fmt;

use serde::{Deserialize, Serialize};

use crate::DetectedType;
use crate::progress::ProgressCallback;

pub const DEFAULT_OCR_LANGUAGE: &str = "eng";

const MIB: u64 = 1024 * 1024;

/// Options for one extraction call, grouped by backend.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionOptions {
    pub pdf: PdfOptions,
    pub docx: DocxOptions,
    pub ocr: OcrOptions,
    /// Retry through OCR when the primary PDF/DOCX backend fails.
    pub fallback_to_ocr: bool,
    /// Grayscale + contrast-stretch images before recognition.
    pub preprocess_image: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfOptions {
    /// 1-based pages to extract, in output order. `None` means every page.
    pub page_numbers: Option<Vec<u32>>,
    pub include_metadata: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocxOptions {
    /// Also render HTML (and keep its conversion messages).
    pub include_style_info: bool,
    pub ignore_empty_paragraphs: bool,
    /// Style-mapping rules applied to the HTML rendering.
    pub style_map: Vec<String>,
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrOptions {
    /// Tesseract language code(s), e.g. `eng` or `eng+deu`.
    pub language: String,
    pub white_list: Option<String>,
    pub black_list: Option<String>,
    #[serde(skip)]
    pub logger: Option<ProgressCallback>,
}

impl Default for OcrOptions {
    fn default() -> Self {
        Self {
            language: DEFAULT_OCR_LANGUAGE.to_string(),
            white_list: None,
            black_list: None,
            logger: None,
        }
    }
}

impl fmt::Debug for OcrOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OcrOptions")
            .field("language", &self.language)
            .field("white_list", &self.white_list)
            .field("black_list", &self.black_list)
            .field("logger", &self.logger.as_ref().map(|_| "<callback>"))
            .finish()
    }
}

/// Per-type maximum input sizes, in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeLimits {
    pub pdf: u64,
    pub docx: u64,
    pub image: u64,
}

impl Default for SizeLimits {
    fn default() -> Self {
        Self {
            pdf: 50 * MIB,
            docx: 25 * MIB,
            image: 10 * MIB,
        }
    }
}

impl SizeLimits {
    pub fn from_megabytes(pdf_mb: u64, docx_mb: u64, image_mb: u64) -> Self {
        Self {
            pdf: pdf_mb * MIB,
            docx: docx_mb * MIB,
            image: image_mb * MIB,
        }
    }

    /// The cap for a detected type; `None` for unsupported input.
    pub fn limit_for(&self, file_type: DetectedType) -> Option<u64> {
        match file_type {
            DetectedType::Pdf => Some(self.pdf),
            DetectedType::Docx => Some(self.docx),
            DetectedType::Image => Some(self.image),
            DetectedType::Unsupported => None,
        }
    }
}
