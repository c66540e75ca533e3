use std::fmt;
use std::sync::Arc;

use serde::Serialize;

/// Recognition stages reported while an OCR call runs, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OcrStage {
    InitializingEngine,
    LoadingLanguage,
    InitializingApi,
    RecognizingText,
}

impl OcrStage {
    pub const ALL: [OcrStage; 4] = [
        OcrStage::InitializingEngine,
        OcrStage::LoadingLanguage,
        OcrStage::InitializingApi,
        OcrStage::RecognizingText,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OcrStage::InitializingEngine => "initializing tesseract",
            OcrStage::LoadingLanguage => "loading language traineddata",
            OcrStage::InitializingApi => "initializing api",
            OcrStage::RecognizingText => "recognizing text",
        }
    }

    /// Share of the overall call this stage accounts for, as `(start, end)`.
    pub fn span(&self) -> (f32, f32) {
        match self {
            OcrStage::InitializingEngine => (0.0, 0.05),
            OcrStage::LoadingLanguage => (0.05, 0.25),
            OcrStage::InitializingApi => (0.25, 0.3),
            OcrStage::RecognizingText => (0.3, 1.0),
        }
    }
}

impl fmt::Display for OcrStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A progress event: the current stage and the overall fraction complete
/// (`0.0..=1.0`). Within one call `progress` never decreases.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OcrProgress {
    pub stage: OcrStage,
    pub progress: f32,
}

/// Caller-supplied sink for [`OcrProgress`] events.
pub type ProgressCallback = Arc<dyn Fn(OcrProgress) + Send + Sync>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_spans_tile_the_unit_interval() {
        let mut cursor = 0.0;
        for stage in OcrStage::ALL {
            let (start, end) = stage.span();
            assert_eq!(start, cursor, "{stage} starts where the previous ended");
            assert!(end > start);
            cursor = end;
        }
        assert_eq!(cursor, 1.0);
    }
}
