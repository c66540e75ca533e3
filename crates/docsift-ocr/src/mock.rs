//! Scripted OCR engine for tests of code that drives [`OcrExtractor`](crate::OcrExtractor).

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use docsift_core::OcrStage;

use crate::engine::{OcrEngine, OcrEngineFactory, Recognition};
use crate::progress::ProgressReporter;

/// What every engine created by a [`MockEngineFactory`] does.
#[derive(Debug, Clone)]
pub struct MockScript {
    pub initialize_error: Option<String>,
    pub recognition: Result<Recognition, String>,
}

impl MockScript {
    pub fn text(text: &str, confidence: f32) -> Self {
        Self {
            initialize_error: None,
            recognition: Ok(Recognition {
                text: text.to_string(),
                confidence,
            }),
        }
    }

    pub fn fail_initialize(message: &str) -> Self {
        Self {
            initialize_error: Some(message.to_string()),
            recognition: Err("not reached".to_string()),
        }
    }

    pub fn fail_recognize(message: &str) -> Self {
        Self {
            initialize_error: None,
            recognition: Err(message.to_string()),
        }
    }
}

#[derive(Default)]
struct Record {
    created: AtomicUsize,
    terminated: AtomicUsize,
    languages: Mutex<Vec<String>>,
    parameters: Mutex<Vec<(String, String)>>,
    images: Mutex<Vec<Vec<u8>>>,
}

/// Factory whose engines replay a [`MockScript`] and record what they saw.
#[derive(Clone)]
pub struct MockEngineFactory {
    script: MockScript,
    record: Arc<Record>,
}

impl MockEngineFactory {
    pub fn new(script: MockScript) -> Self {
        Self {
            script,
            record: Arc::new(Record::default()),
        }
    }

    pub fn created(&self) -> usize {
        self.record.created.load(Ordering::SeqCst)
    }

    pub fn terminated(&self) -> usize {
        self.record.terminated.load(Ordering::SeqCst)
    }

    pub fn languages(&self) -> Vec<String> {
        self.record
            .languages
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn parameters(&self) -> Vec<(String, String)> {
        self.record
            .parameters
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Image bytes handed to `recognize`, in call order.
    pub fn images(&self) -> Vec<Vec<u8>> {
        self.record
            .images
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl OcrEngineFactory for MockEngineFactory {
    fn name(&self) -> &str {
        "mock"
    }

    fn create(&self) -> Result<Box<dyn OcrEngine>, String> {
        self.record.created.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockEngine {
            script: self.script.clone(),
            record: Arc::clone(&self.record),
        }))
    }
}

struct MockEngine {
    script: MockScript,
    record: Arc<Record>,
}

impl OcrEngine for MockEngine {
    fn initialize(&mut self, language: &str, progress: &ProgressReporter) -> Result<(), String> {
        self.record
            .languages
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(language.to_string());
        progress.report(OcrStage::LoadingLanguage, 0.0);
        if let Some(err) = &self.script.initialize_error {
            return Err(err.clone());
        }
        progress.report(OcrStage::LoadingLanguage, 1.0);
        progress.stage_done(OcrStage::InitializingApi);
        Ok(())
    }

    fn set_parameter(&mut self, key: &str, value: &str) -> Result<(), String> {
        self.record
            .parameters
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((key.to_string(), value.to_string()));
        Ok(())
    }

    fn recognize(
        &mut self,
        image: &[u8],
        progress: &ProgressReporter,
    ) -> Result<Recognition, String> {
        self.record
            .images
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(image.to_vec());
        progress.report(OcrStage::RecognizingText, 0.0);
        progress.report(OcrStage::RecognizingText, 0.5);
        let result = self.script.recognition.clone();
        if result.is_ok() {
            progress.report(OcrStage::RecognizingText, 1.0);
        }
        result
    }

    fn terminate(&mut self) {
        self.record.terminated.fetch_add(1, Ordering::SeqCst);
    }
}
