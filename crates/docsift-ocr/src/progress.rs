use std::sync::Mutex;

use docsift_core::{OcrProgress, OcrStage, ProgressCallback};

/// Forwards engine stage updates to the caller's logger as overall progress.
///
/// Engines report `(stage, fraction of that stage)`; the reporter maps this
/// onto the stage's share of the whole call and never lets the reported
/// value go backwards.
pub struct ProgressReporter {
    logger: Option<ProgressCallback>,
    last: Mutex<f32>,
}

impl ProgressReporter {
    pub fn new(logger: Option<ProgressCallback>) -> Self {
        Self {
            logger,
            last: Mutex::new(0.0),
        }
    }

    /// A reporter that drops every event.
    pub fn silent() -> Self {
        Self::new(None)
    }

    pub fn report(&self, stage: OcrStage, stage_progress: f32) {
        let (start, end) = stage.span();
        let fraction = stage_progress.clamp(0.0, 1.0);
        let overall = start + (end - start) * fraction;

        let progress = {
            let mut last = self.last.lock().unwrap_or_else(|e| e.into_inner());
            if overall > *last {
                *last = overall;
            }
            *last
        };

        tracing::trace!(stage = stage.as_str(), progress, "OCR progress");
        if let Some(logger) = &self.logger {
            logger(OcrProgress { stage, progress });
        }
    }

    /// Report a stage as started and finished.
    pub fn stage_done(&self, stage: OcrStage) {
        self.report(stage, 0.0);
        self.report(stage, 1.0);
    }
}
