//! Tesseract engine via the `tesseract` crate (libtesseract + leptonica).

use std::path::PathBuf;

use tesseract::Tesseract;

use docsift_core::OcrStage;

use crate::engine::{OcrEngine, OcrEngineFactory, Recognition};
use crate::progress::ProgressReporter;

/// Creates Tesseract engines, optionally with an explicit tessdata
/// directory (otherwise `TESSDATA_PREFIX` / the system default applies).
#[derive(Debug, Default, Clone)]
pub struct TesseractEngineFactory {
    tessdata: Option<PathBuf>,
}

impl TesseractEngineFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tessdata(mut self, path: impl Into<PathBuf>) -> Self {
        self.tessdata = Some(path.into());
        self
    }
}

impl OcrEngineFactory for TesseractEngineFactory {
    fn name(&self) -> &str {
        "tesseract"
    }

    fn create(&self) -> Result<Box<dyn OcrEngine>, String> {
        Ok(Box::new(TesseractEngine {
            tessdata: self.tessdata.clone(),
            api: None,
        }))
    }
}

struct TesseractEngine {
    tessdata: Option<PathBuf>,
    api: Option<Tesseract>,
}

impl TesseractEngine {
    fn take_api(&mut self) -> Result<Tesseract, String> {
        self.api
            .take()
            .ok_or_else(|| "Tesseract API is not initialized".to_string())
    }
}

impl OcrEngine for TesseractEngine {
    fn initialize(&mut self, language: &str, progress: &ProgressReporter) -> Result<(), String> {
        let datapath = match &self.tessdata {
            Some(p) => Some(
                p.to_str()
                    .ok_or_else(|| "invalid tessdata path encoding".to_string())?
                    .to_string(),
            ),
            None => None,
        };
        progress.report(OcrStage::LoadingLanguage, 0.0);
        let api = Tesseract::new(datapath.as_deref(), Some(language))
            .map_err(|e| format!("Failed to load language '{}': {}", language, e))?;
        progress.report(OcrStage::LoadingLanguage, 1.0);
        progress.stage_done(OcrStage::InitializingApi);
        self.api = Some(api);
        Ok(())
    }

    fn set_parameter(&mut self, key: &str, value: &str) -> Result<(), String> {
        let api = self.take_api()?;
        let api = api
            .set_variable(key, value)
            .map_err(|e| format!("Failed to set {}: {}", key, e))?;
        self.api = Some(api);
        Ok(())
    }

    fn recognize(
        &mut self,
        image: &[u8],
        progress: &ProgressReporter,
    ) -> Result<Recognition, String> {
        progress.report(OcrStage::RecognizingText, 0.0);
        let api = self.take_api()?;
        let api = api
            .set_image_from_mem(image)
            .map_err(|e| format!("Failed to read image: {}", e))?;
        let mut api = api
            .recognize()
            .map_err(|e| format!("Recognition failed: {}", e))?;
        let text = api
            .get_text()
            .map_err(|e| format!("Failed to read recognized text: {}", e))?;
        let confidence = api.mean_text_conf() as f32;
        self.api = Some(api);
        progress.report(OcrStage::RecognizingText, 1.0);
        Ok(Recognition { text, confidence })
    }

    fn terminate(&mut self) {
        // Dropping the handle calls TessBaseAPIEnd/Delete
        self.api = None;
    }
}
