use std::io::Write;
use std::sync::Arc;

use zip::write::SimpleFileOptions;

use docsift_core::{DocxBackend, DocxOptions, ExtractionError, MessageSeverity};
use docsift_docx::{DocxExtractor, docx_info, extract_html, extract_plain_text};

const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:style w:type="paragraph" w:styleId="Heading1"><w:name w:val="heading 1"/></w:style>
  <w:style w:type="paragraph" w:styleId="Clause"><w:name w:val="Clause"/></w:style>
</w:styles>"#;

/// Build a minimal `.docx` around the given body XML.
fn build_docx(body: &str) -> Vec<u8> {
    let document = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"
            xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><w:body>{}</w:body></w:document>"#,
        body
    );
    let mut buf = std::io::Cursor::new(Vec::new());
    {
        let mut zip = zip::ZipWriter::new(&mut buf);
        let options = SimpleFileOptions::default();
        zip.start_file("[Content_Types].xml", options).unwrap();
        zip.write_all(b"<Types/>").unwrap();
        zip.start_file("word/document.xml", options).unwrap();
        zip.write_all(document.as_bytes()).unwrap();
        zip.start_file("word/styles.xml", options).unwrap();
        zip.write_all(STYLES.as_bytes()).unwrap();
        zip.finish().unwrap();
    }
    buf.into_inner()
}

fn p(text: &str) -> String {
    format!("<w:p><w:r><w:t xml:space=\"preserve\">{}</w:t></w:r></w:p>", text)
}

fn styled(style: &str, text: &str) -> String {
    format!(
        r#"<w:p><w:pPr><w:pStyle w:val="{}"/></w:pPr><w:r><w:t>{}</w:t></w:r></w:p>"#,
        style, text
    )
}

async fn run(data: Vec<u8>, options: &DocxOptions) -> Result<docsift_core::DocxExtraction, ExtractionError> {
    DocxExtractor::new().extract(Arc::from(data), options).await
}

#[tokio::test]
async fn raw_text_separates_paragraphs_with_blank_lines() {
    let docx = build_docx(&[p("Hello"), p("World")].concat());
    let result = run(docx, &DocxOptions::default()).await.unwrap();
    assert_eq!(result.text, "Hello\n\nWorld\n\n");
    assert!(result.html.is_none());
    let stats = result.metadata.unwrap();
    assert_eq!(stats.word_count, 2);
    assert_eq!(stats.paragraph_count, 2);
    assert!(!stats.has_images);
}

#[tokio::test]
async fn ignore_empty_paragraphs_drops_blank_lines() {
    let docx = build_docx(&[p("One"), "<w:p/>".to_string(), p("   "), p("Two words")].concat());
    let options = DocxOptions {
        ignore_empty_paragraphs: true,
        ..Default::default()
    };
    let result = run(docx, &options).await.unwrap();
    assert_eq!(result.text, "One\nTwo words");
    let stats = result.metadata.unwrap();
    assert_eq!(stats.word_count, 3);
    assert_eq!(stats.paragraph_count, 2);
}

#[tokio::test]
async fn html_only_when_style_info_requested() {
    let docx = build_docx(&[styled("Heading1", "Agreement"), p("Body")].concat());
    let options = DocxOptions {
        include_style_info: true,
        ..Default::default()
    };
    let result = run(docx, &options).await.unwrap();
    assert_eq!(result.html.as_deref(), Some("<h1>Agreement</h1><p>Body</p>"));
    assert_eq!(result.text, "Agreement\n\nBody\n\n");
}

#[tokio::test]
async fn style_map_overrides_and_reports_bad_rules() {
    let docx = build_docx(&styled("Clause", "Term").to_string());
    let options = DocxOptions {
        include_style_info: true,
        style_map: vec![
            "p[style-name='Clause'] => h3.clause:fresh".to_string(),
            "this is not a rule".to_string(),
        ],
        ..Default::default()
    };
    let result = run(docx, &options).await.unwrap();
    assert_eq!(result.html.as_deref(), Some("<h3 class=\"clause\">Term</h3>"));
    assert_eq!(result.messages.len(), 1);
    assert_eq!(result.messages[0].severity, MessageSeverity::Warning);
    assert!(result.messages[0].message.contains("this is not a rule"));
    // HTML-transform warnings do not feed the image heuristic
    assert!(!result.metadata.unwrap().has_images);
}

#[tokio::test]
async fn unsupported_objects_flag_has_images() {
    let docx = build_docx(&[p("Signed"), "<w:p><w:r><w:object/></w:r></w:p>".to_string()].concat());
    let result = run(docx, &DocxOptions::default()).await.unwrap();
    assert!(result.metadata.unwrap().has_images);
    assert!(
        result
            .messages
            .iter()
            .any(|m| m.severity == MessageSeverity::Warning)
    );
}

#[tokio::test]
async fn corrupt_archive_is_a_parse_error() {
    let err = run(b"PK\x03\x04garbage".to_vec(), &DocxOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ExtractionError::Parse { .. }));
    assert!(err.to_string().starts_with("Failed to extract text from DOCX"));
}

#[tokio::test]
async fn zip_without_document_part_is_rejected() {
    let mut buf = std::io::Cursor::new(Vec::new());
    {
        let mut zip = zip::ZipWriter::new(&mut buf);
        zip.start_file("notes.txt", SimpleFileOptions::default())
            .unwrap();
        zip.write_all(b"hi").unwrap();
        zip.finish().unwrap();
    }
    let err = run(buf.into_inner(), &DocxOptions::default())
        .await
        .unwrap_err();
    assert!(err.to_string().contains("main document part"));
}

#[tokio::test]
async fn convenience_helpers() {
    let docx = build_docx(&[styled("Heading1", "Title"), "<w:p/>".to_string(), p("Text")].concat());
    let data: Arc<[u8]> = Arc::from(docx);

    let text = extract_plain_text(Arc::clone(&data)).await.unwrap();
    assert_eq!(text, "Title\nText");

    let (html, messages) = extract_html(Arc::clone(&data), Vec::new()).await.unwrap();
    assert_eq!(html, "<h1>Title</h1><p>Text</p>");
    assert!(messages.is_empty());

    let info = docx_info(data).await.unwrap();
    assert_eq!(info.word_count, 2);
    assert_eq!(info.paragraph_count, 2);
    assert!(!info.has_warnings);
    assert!(info.file_size > 0);
}
