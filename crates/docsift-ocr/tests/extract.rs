use std::sync::{Arc, Mutex};

use docsift_core::{ExtractionError, OcrBackend, OcrOptions, OcrProgress, OcrStage};
use docsift_ocr::mock::{MockEngineFactory, MockScript};
use docsift_ocr::{OcrExtractor, supported_languages};

fn extractor(factory: &MockEngineFactory) -> OcrExtractor {
    OcrExtractor::with_factory(Arc::new(factory.clone()))
}

fn image() -> Arc<[u8]> {
    Arc::from(b"fake image bytes".to_vec())
}

#[tokio::test]
async fn text_is_trimmed_and_confidence_kept() {
    let factory = MockEngineFactory::new(MockScript::text("\n  WITNESS WHEREOF  \n", 87.5));
    let result = extractor(&factory)
        .extract(image(), &OcrOptions::default())
        .await
        .unwrap();
    assert_eq!(result.text, "WITNESS WHEREOF");
    assert_eq!(result.confidence, 87.5);
    assert_eq!(factory.languages(), vec!["eng".to_string()]);
    assert_eq!(factory.terminated(), 1);
}

#[tokio::test]
async fn confidence_is_clamped() {
    let factory = MockEngineFactory::new(MockScript::text("x", 140.0));
    let result = extractor(&factory)
        .extract(image(), &OcrOptions::default())
        .await
        .unwrap();
    assert_eq!(result.confidence, 100.0);
}

#[tokio::test]
async fn white_and_black_lists_become_engine_parameters() {
    let factory = MockEngineFactory::new(MockScript::text("123", 90.0));
    let options = OcrOptions {
        language: "deu".into(),
        white_list: Some("0123456789".into()),
        black_list: Some("O".into()),
        logger: None,
    };
    extractor(&factory).extract(image(), &options).await.unwrap();
    assert_eq!(
        factory.parameters(),
        vec![
            ("tessedit_char_whitelist".to_string(), "0123456789".to_string()),
            ("tessedit_char_blacklist".to_string(), "O".to_string()),
        ]
    );
    assert_eq!(factory.languages(), vec!["deu".to_string()]);
}

#[tokio::test]
async fn recognition_failure_is_an_error_and_engine_is_released() {
    let factory = MockEngineFactory::new(MockScript::fail_recognize("image too small"));
    let err = extractor(&factory)
        .extract(image(), &OcrOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ExtractionError::Recognition(_)));
    assert_eq!(
        err.to_string(),
        "Failed to extract text from image: image too small"
    );
    assert_eq!(factory.created(), 1);
    assert_eq!(factory.terminated(), 1);
}

#[tokio::test]
async fn logger_sees_every_stage_in_order() {
    let events: Arc<Mutex<Vec<OcrProgress>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    let options = OcrOptions {
        logger: Some(Arc::new(move |p| sink.lock().unwrap().push(p))),
        ..Default::default()
    };
    let factory = MockEngineFactory::new(MockScript::text("ok", 95.0));
    extractor(&factory).extract(image(), &options).await.unwrap();

    let events = events.lock().unwrap();
    let mut stages: Vec<OcrStage> = events.iter().map(|e| e.stage).collect();
    stages.dedup();
    assert_eq!(stages, OcrStage::ALL.to_vec());
    assert!(events.windows(2).all(|w| w[1].progress >= w[0].progress));
    assert_eq!(events.last().map(|e| e.progress), Some(1.0));
}

#[tokio::test]
async fn batch_keeps_going_after_a_failure() {
    let ok = MockEngineFactory::new(MockScript::text("page", 80.0));
    let results = extractor(&ok)
        .extract_multiple(&[image(), image()], &OcrOptions::default())
        .await;
    assert_eq!(results.len(), 2);
    assert!(results.iter().all(|r| r.text == "page"));

    let bad = MockEngineFactory::new(MockScript::fail_initialize("missing traineddata"));
    let results = extractor(&bad)
        .extract_multiple(&[image()], &OcrOptions::default())
        .await;
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].text, "");
    assert_eq!(results[0].confidence, 0.0);
    assert_eq!(bad.terminated(), 1);
}

#[test]
fn language_list_contains_common_codes() {
    let langs = supported_languages();
    assert!(langs.contains(&"eng"));
    assert!(langs.contains(&"chi_sim"));
    assert!(!langs.contains(&"klingon"));
}

#[cfg(not(feature = "tesseract"))]
#[tokio::test]
async fn default_extractor_reports_missing_engine() {
    let err = OcrExtractor::new()
        .extract(image(), &OcrOptions::default())
        .await
        .unwrap_err();
    assert!(err.to_string().contains("not compiled in"));
}
