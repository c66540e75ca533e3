//! Engine abstraction and the per-call engine session.

use std::fmt;

use docsift_core::{ExtractionError, OcrStage};

use crate::progress::ProgressReporter;

/// Output of one recognition pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Recognition {
    pub text: String,
    /// Mean word confidence as reported by the engine.
    pub confidence: f32,
}

/// A single OCR engine instance.
///
/// Engines live on the blocking thread that created them and are never
/// shared between calls.
pub trait OcrEngine {
    /// Load language data and bring the engine to a ready state.
    fn initialize(&mut self, language: &str, progress: &ProgressReporter) -> Result<(), String>;

    fn set_parameter(&mut self, key: &str, value: &str) -> Result<(), String>;

    fn recognize(&mut self, image: &[u8], progress: &ProgressReporter)
    -> Result<Recognition, String>;

    /// Release native resources. Called exactly once per engine.
    fn terminate(&mut self);
}

/// Creates a fresh engine for each extraction call.
pub trait OcrEngineFactory: Send + Sync {
    /// Short identifier used in logs (e.g. "tesseract").
    fn name(&self) -> &str;

    fn create(&self) -> Result<Box<dyn OcrEngine>, String>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Uninitialized,
    Ready,
    Recognizing,
    Terminated,
}

impl fmt::Display for EngineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EngineState::Uninitialized => "uninitialized",
            EngineState::Ready => "ready",
            EngineState::Recognizing => "recognizing",
            EngineState::Terminated => "terminated",
        };
        f.write_str(s)
    }
}

/// Scoped owner of one engine for one call.
///
/// Walks `Uninitialized -> Ready -> Recognizing -> Ready -> Terminated`.
/// The engine is terminated exactly once, either by [`EngineSession::terminate`]
/// or when the session is dropped on an error path.
pub struct EngineSession {
    engine: Box<dyn OcrEngine>,
    state: EngineState,
}

impl EngineSession {
    /// Create an engine and load `language` into it.
    pub fn start(
        factory: &dyn OcrEngineFactory,
        language: &str,
        progress: &ProgressReporter,
    ) -> Result<Self, ExtractionError> {
        progress.report(OcrStage::InitializingEngine, 0.0);
        let engine = factory.create().map_err(ExtractionError::recognition)?;
        progress.report(OcrStage::InitializingEngine, 1.0);

        let mut session = EngineSession {
            engine,
            state: EngineState::Uninitialized,
        };
        session
            .engine
            .initialize(language, progress)
            .map_err(ExtractionError::recognition)?;
        session.state = EngineState::Ready;
        tracing::debug!(engine = factory.name(), language, "OCR engine ready");
        Ok(session)
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn set_parameter(&mut self, key: &str, value: &str) -> Result<(), ExtractionError> {
        self.expect_state(EngineState::Ready)?;
        self.engine
            .set_parameter(key, value)
            .map_err(ExtractionError::recognition)
    }

    pub fn recognize(
        &mut self,
        image: &[u8],
        progress: &ProgressReporter,
    ) -> Result<Recognition, ExtractionError> {
        self.expect_state(EngineState::Ready)?;
        self.state = EngineState::Recognizing;
        let result = self.engine.recognize(image, progress);
        self.state = EngineState::Ready;
        result.map_err(ExtractionError::recognition)
    }

    /// Terminate now rather than at drop.
    pub fn terminate(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if self.state != EngineState::Terminated {
            self.engine.terminate();
            self.state = EngineState::Terminated;
            tracing::debug!("OCR engine terminated");
        }
    }

    fn expect_state(&self, expected: EngineState) -> Result<(), ExtractionError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(ExtractionError::recognition(format!(
                "engine is {}, expected {}",
                self.state, expected
            )))
        }
    }
}

impl Drop for EngineSession {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Factory used when no OCR engine is compiled in.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableEngineFactory;

impl OcrEngineFactory for UnavailableEngineFactory {
    fn name(&self) -> &str {
        "unavailable"
    }

    fn create(&self) -> Result<Box<dyn OcrEngine>, String> {
        Err("OCR support not compiled in (build with the `tesseract` feature)".to_string())
    }
}
