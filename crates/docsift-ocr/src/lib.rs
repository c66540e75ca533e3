use std::sync::Arc;
use std::time::Instant;

use docsift_core::{BackendFuture, ExtractionError, OcrBackend, OcrExtraction, OcrOptions};

pub mod engine;
pub mod mock;
pub mod preprocess;
pub mod progress;
#[cfg(feature = "tesseract")]
pub mod tesseract;

pub use engine::{
    EngineSession, EngineState, OcrEngine, OcrEngineFactory, Recognition, UnavailableEngineFactory,
};
pub use preprocess::preprocess_image;
pub use progress::ProgressReporter;
#[cfg(feature = "tesseract")]
pub use tesseract::TesseractEngineFactory;

const WHITELIST_PARAM: &str = "tessedit_char_whitelist";
const BLACKLIST_PARAM: &str = "tessedit_char_blacklist";

/// Tesseract language codes accepted by [`OcrOptions::language`].
const SUPPORTED_LANGUAGES: &[&str] = &[
    "afr", "amh", "ara", "asm", "aze", "aze_cyrl", "bel", "ben", "bod", "bos", "bul", "cat",
    "ceb", "ces", "chi_sim", "chi_tra", "chr", "cym", "dan", "deu", "div", "dzo", "ell", "eng",
    "enm", "epo", "est", "eus", "fas", "fin", "fra", "frk", "frm", "gle", "glg", "grc", "guj",
    "hat", "heb", "hin", "hrv", "hun", "iku", "ind", "isl", "ita", "ita_old", "jav", "jpn", "kan",
    "kat", "kat_old", "kaz", "khm", "kir", "kor", "kur", "lao", "lat", "lav", "lit", "mal", "mar",
    "mkd", "mlt", "mon", "mri", "msa", "mya", "nep", "nld", "nor", "oci", "ori", "pan", "pol",
    "por", "pus", "ron", "rus", "san", "sin", "slk", "slv", "spa", "spa_old", "sqi", "srp",
    "srp_latn", "swa", "swe", "syr", "tam", "tel", "tgk", "tgl", "tha", "tir", "tur", "uig",
    "ukr", "urd", "uzb", "uzb_cyrl", "vie", "yid",
];

pub fn supported_languages() -> &'static [&'static str] {
    SUPPORTED_LANGUAGES
}

/// Image-to-text backend. Each call gets its own engine, which is
/// terminated before the call returns.
#[derive(Clone)]
pub struct OcrExtractor {
    factory: Arc<dyn OcrEngineFactory>,
}

impl Default for OcrExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl OcrExtractor {
    /// Extractor over the compiled-in engine.
    pub fn new() -> Self {
        #[cfg(feature = "tesseract")]
        let factory: Arc<dyn OcrEngineFactory> = Arc::new(TesseractEngineFactory::new());
        #[cfg(not(feature = "tesseract"))]
        let factory: Arc<dyn OcrEngineFactory> = Arc::new(UnavailableEngineFactory);
        Self { factory }
    }

    pub fn with_factory(factory: Arc<dyn OcrEngineFactory>) -> Self {
        Self { factory }
    }

    /// Recognize several images one after another. A failed image yields an
    /// empty result with zero confidence instead of aborting the batch.
    pub async fn extract_multiple(
        &self,
        images: &[Arc<[u8]>],
        options: &OcrOptions,
    ) -> Vec<OcrExtraction> {
        let mut results = Vec::with_capacity(images.len());
        for (index, image) in images.iter().enumerate() {
            match self.extract(Arc::clone(image), options).await {
                Ok(r) => results.push(r),
                Err(e) => {
                    tracing::warn!(index, error = %e, "OCR failed for image in batch");
                    results.push(OcrExtraction {
                        text: String::new(),
                        confidence: 0.0,
                        processing_time_ms: 0,
                    });
                }
            }
        }
        results
    }
}

impl OcrBackend for OcrExtractor {
    fn name(&self) -> &str {
        self.factory.name()
    }

    fn extract<'a>(
        &'a self,
        data: Arc<[u8]>,
        options: &'a OcrOptions,
    ) -> BackendFuture<'a, OcrExtraction> {
        let factory = Arc::clone(&self.factory);
        let options = options.clone();
        Box::pin(async move {
            let start = Instant::now();
            let recognition =
                tokio::task::spawn_blocking(move || run_session(factory.as_ref(), &data, &options))
                    .await
                    .map_err(|e| ExtractionError::recognition(e.to_string()))??;

            let confidence = if recognition.confidence.is_nan() {
                0.0
            } else {
                recognition.confidence.clamp(0.0, 100.0)
            };
            let processing_time_ms = start.elapsed().as_millis() as u64;
            tracing::debug!(confidence, processing_time_ms, "OCR complete");

            Ok(OcrExtraction {
                text: recognition.text.trim().to_string(),
                confidence,
                processing_time_ms,
            })
        })
    }
}

/// One engine session, start to terminate, on the current thread.
fn run_session(
    factory: &dyn OcrEngineFactory,
    data: &[u8],
    options: &OcrOptions,
) -> Result<Recognition, ExtractionError> {
    for part in options.language.split('+') {
        if !SUPPORTED_LANGUAGES.contains(&part) {
            tracing::warn!(language = part, "unknown OCR language code");
        }
    }

    let progress = ProgressReporter::new(options.logger.clone());
    let mut session = EngineSession::start(factory, &options.language, &progress)?;

    if let Some(chars) = options.white_list.as_deref().filter(|s| !s.is_empty()) {
        session.set_parameter(WHITELIST_PARAM, chars)?;
    }
    if let Some(chars) = options.black_list.as_deref().filter(|s| !s.is_empty()) {
        session.set_parameter(BLACKLIST_PARAM, chars)?;
    }

    let recognition = session.recognize(data, &progress)?;
    session.terminate();
    Ok(recognition)
}
