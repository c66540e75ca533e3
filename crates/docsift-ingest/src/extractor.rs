use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use docsift_core::{
    DetectedType, DocxBackend, ExtractionDetail, ExtractionError, ExtractionMethod,
    ExtractionOptions, ExtractionResult, ExtractionWarning, FileBlob, MessageSeverity, OcrBackend,
    PdfBackend, SizeLimits, content_type_for_name, detect,
};
use docsift_docx::DocxExtractor;
use docsift_ocr::{OcrEngineFactory, OcrExtractor, preprocess_image};
use docsift_pdf::LopdfBackend;

use crate::validate::{FileValidation, validate_file};

/// OCR confidence under which a result carries an advisory warning.
const LOW_CONFIDENCE_THRESHOLD: f32 = 50.0;

/// A successful backend run: its detail plus advisory warnings.
type BackendOutcome = (ExtractionDetail, Vec<String>);

/// The unified entry point: detects the format of each file, runs the
/// matching backend, optionally retries through OCR, and normalizes every
/// outcome into an [`ExtractionResult`].
#[derive(Clone)]
pub struct Extractor {
    pdf: Arc<dyn PdfBackend>,
    docx: Arc<dyn DocxBackend>,
    ocr: Arc<dyn OcrBackend>,
    limits: SizeLimits,
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new()
    }
}

impl Extractor {
    /// Extractor over the built-in backends and default size limits.
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> ExtractorBuilder {
        ExtractorBuilder::default()
    }

    pub fn limits(&self) -> &SizeLimits {
        &self.limits
    }

    /// Extract text from one file. Never fails: every error is reported in
    /// the returned result.
    pub async fn extract_text(
        &self,
        file: &FileBlob,
        options: &ExtractionOptions,
    ) -> ExtractionResult {
        let start = Instant::now();
        let file_type = detect(file);
        tracing::debug!(file = %file.name, %file_type, size = file.size, "extracting text");

        if file_type == DetectedType::Unsupported {
            let err = ExtractionError::UnsupportedFormat {
                name: file.name.clone(),
            };
            tracing::info!(file = %file.name, content_type = %file.content_type, "unsupported file type");
            return ExtractionResult::failed(
                file,
                file_type,
                ExtractionMethod::None,
                err.to_string(),
                Vec::new(),
            )
            .with_processing_time(start.elapsed());
        }

        let primary = match file_type {
            DetectedType::Pdf => self.run_pdf(file, options).await,
            DetectedType::Docx => self.run_docx(file, options).await,
            _ => self.run_ocr(file, options, options.preprocess_image).await,
        };

        let result = match primary {
            Ok((detail, warnings)) => {
                ExtractionResult::succeeded(file, file_type, detail, warnings)
            }
            Err(err) => match self.fallback(file, file_type, &err, options).await {
                Some(result) => result,
                None => {
                    tracing::warn!(file = %file.name, error = %err, "extraction failed");
                    ExtractionResult::failed(
                        file,
                        file_type,
                        file_type.primary_method(),
                        err.to_string(),
                        Vec::new(),
                    )
                }
            },
        };

        let result = result.with_processing_time(start.elapsed());
        tracing::info!(
            file = %file.name,
            method = %result.extraction_method,
            success = result.success,
            ms = result.processing_time_ms,
            "extraction finished"
        );
        result
    }

    /// Process files strictly one after another; one result per input, in
    /// input order.
    pub async fn extract_text_from_multiple_files(
        &self,
        files: &[FileBlob],
        options: &ExtractionOptions,
    ) -> Vec<ExtractionResult> {
        let mut results = Vec::with_capacity(files.len());
        for file in files {
            results.push(self.extract_text(file, options).await);
        }
        results
    }

    /// Read and extract files from disk, one after another. A file that
    /// cannot be read yields a failed result in its slot.
    pub async fn extract_text_from_paths(
        &self,
        paths: &[PathBuf],
        options: &ExtractionOptions,
    ) -> Vec<ExtractionResult> {
        let mut results = Vec::with_capacity(paths.len());
        for path in paths {
            let start = Instant::now();
            let result = match FileBlob::from_path(path).await {
                Ok(file) => self.extract_text(&file, options).await,
                Err(source) => unreadable(path, source).with_processing_time(start.elapsed()),
            };
            results.push(result);
        }
        results
    }

    pub fn validate_file(&self, file: &FileBlob) -> FileValidation {
        validate_file(file, &self.limits)
    }

    /// Retry a failed PDF/DOCX through OCR. `None` when fallback does not
    /// apply or OCR fails too.
    async fn fallback(
        &self,
        file: &FileBlob,
        file_type: DetectedType,
        err: &ExtractionError,
        options: &ExtractionOptions,
    ) -> Option<ExtractionResult> {
        if !options.fallback_to_ocr
            || file_type == DetectedType::Image
            || !err.is_fallback_eligible()
        {
            return None;
        }

        tracing::warn!(
            file = %file.name,
            error = %err,
            "primary extraction failed, trying OCR as fallback"
        );
        match self.run_ocr(file, options, false).await {
            Ok((detail, mut warnings)) => {
                warnings.push(
                    ExtractionWarning::FallbackUsed {
                        format: file_type,
                        reason: err.to_string(),
                    }
                    .to_string(),
                );
                Some(ExtractionResult::succeeded(file, file_type, detail, warnings))
            }
            Err(ocr_err) => {
                tracing::warn!(file = %file.name, error = %ocr_err, "OCR fallback also failed");
                None
            }
        }
    }

    async fn run_pdf(
        &self,
        file: &FileBlob,
        options: &ExtractionOptions,
    ) -> Result<BackendOutcome, ExtractionError> {
        let result = self
            .pdf
            .extract(Arc::clone(&file.data), &options.pdf)
            .await?;
        let warnings = result.warnings.iter().map(ToString::to_string).collect();
        Ok((ExtractionDetail::Pdf(result), warnings))
    }

    async fn run_docx(
        &self,
        file: &FileBlob,
        options: &ExtractionOptions,
    ) -> Result<BackendOutcome, ExtractionError> {
        let result = self
            .docx
            .extract(Arc::clone(&file.data), &options.docx)
            .await?;
        let mut warnings = Vec::new();
        if result
            .messages
            .iter()
            .any(|m| m.severity == MessageSeverity::Warning)
        {
            warnings.push(ExtractionWarning::DocxMessages.to_string());
        }
        Ok((ExtractionDetail::Docx(result), warnings))
    }

    async fn run_ocr(
        &self,
        file: &FileBlob,
        options: &ExtractionOptions,
        preprocess: bool,
    ) -> Result<BackendOutcome, ExtractionError> {
        let mut warnings = Vec::new();
        let mut data = Arc::clone(&file.data);

        if preprocess {
            let raw = Arc::clone(&data);
            let processed = tokio::task::spawn_blocking(move || preprocess_image(&raw))
                .await
                .map_err(|e| e.to_string())
                .and_then(|r| r);
            match processed {
                Ok(bytes) => data = Arc::from(bytes),
                Err(reason) => {
                    tracing::warn!(file = %file.name, error = %reason, "image preprocessing skipped");
                    warnings.push(ExtractionWarning::PreprocessingSkipped { reason }.to_string());
                }
            }
        }

        let result = self.ocr.extract(data, &options.ocr).await?;
        if result.confidence < LOW_CONFIDENCE_THRESHOLD {
            warnings.push(
                ExtractionWarning::LowConfidence {
                    confidence: result.confidence,
                }
                .to_string(),
            );
        }
        Ok((ExtractionDetail::Ocr(result), warnings))
    }
}

/// Failed result for a path whose bytes could not be read. No backend ran.
fn unreadable(path: &Path, source: std::io::Error) -> ExtractionResult {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());
    let placeholder = FileBlob::new(name.as_str(), content_type_for_name(&name), Vec::<u8>::new());
    let file_type = detect(&placeholder);
    let err = ExtractionError::Io(source);
    tracing::warn!(path = %path.display(), error = %err, "failed to read file");
    ExtractionResult::failed(
        &placeholder,
        file_type,
        ExtractionMethod::None,
        err.to_string(),
        Vec::new(),
    )
}

/// Builder for an [`Extractor`] with injected backends or limits.
#[derive(Default)]
pub struct ExtractorBuilder {
    pdf: Option<Arc<dyn PdfBackend>>,
    docx: Option<Arc<dyn DocxBackend>>,
    ocr: Option<Arc<dyn OcrBackend>>,
    limits: Option<SizeLimits>,
}

impl ExtractorBuilder {
    pub fn pdf_backend(mut self, backend: Arc<dyn PdfBackend>) -> Self {
        self.pdf = Some(backend);
        self
    }

    pub fn docx_backend(mut self, backend: Arc<dyn DocxBackend>) -> Self {
        self.docx = Some(backend);
        self
    }

    pub fn ocr_backend(mut self, backend: Arc<dyn OcrBackend>) -> Self {
        self.ocr = Some(backend);
        self
    }

    /// Use the built-in OCR backend over a specific engine.
    pub fn ocr_engine(self, factory: Arc<dyn OcrEngineFactory>) -> Self {
        self.ocr_backend(Arc::new(OcrExtractor::with_factory(factory)))
    }

    pub fn limits(mut self, limits: SizeLimits) -> Self {
        self.limits = Some(limits);
        self
    }

    pub fn build(self) -> Extractor {
        Extractor {
            pdf: self.pdf.unwrap_or_else(|| Arc::new(LopdfBackend::new())),
            docx: self.docx.unwrap_or_else(|| Arc::new(DocxExtractor::new())),
            ocr: self.ocr.unwrap_or_else(|| Arc::new(OcrExtractor::new())),
            limits: self.limits.unwrap_or_default(),
        }
    }
}
