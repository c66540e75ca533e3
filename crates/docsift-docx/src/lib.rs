use std::sync::Arc;

use serde::Serialize;

use docsift_core::{
    BackendFuture, DetectedType, DocxBackend, DocxExtraction, DocxMessage, DocxOptions, DocxStats,
    ExtractionError, MessageSeverity,
};

pub mod document;
pub mod html;
pub mod package;
pub mod style_map;

pub use document::{DocumentModel, read_document};
pub use html::render_html;
pub use package::DocxPackage;
pub use style_map::{StyleMap, parse_rule};

/// Native DOCX backend: zip + quick-xml document walker with raw-text and
/// HTML transforms.
#[derive(Debug, Default, Clone, Copy)]
pub struct DocxExtractor;

impl DocxExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl DocxBackend for DocxExtractor {
    fn name(&self) -> &str {
        "docx-xml"
    }

    fn extract<'a>(
        &'a self,
        data: Arc<[u8]>,
        options: &'a DocxOptions,
    ) -> BackendFuture<'a, DocxExtraction> {
        let options = options.clone();
        Box::pin(async move {
            tokio::task::spawn_blocking(move || extract_docx(&data, &options))
                .await
                .map_err(|e| ExtractionError::parse(DetectedType::Docx, e.to_string()))?
        })
    }
}

/// Convert a DOCX package synchronously.
///
/// Only an unreadable package fails; everything else the converter notices
/// is returned as a message.
pub fn extract_docx(data: &[u8], options: &DocxOptions) -> Result<DocxExtraction, ExtractionError> {
    let package =
        DocxPackage::open(data).map_err(|e| ExtractionError::parse(DetectedType::Docx, e))?;
    let model = read_document(&package.document_xml)
        .map_err(|e| ExtractionError::parse(DetectedType::Docx, e))?;

    let raw_messages = model.messages.clone();
    let raw_text = raw_text(&model);

    let mut messages = raw_messages.clone();
    let html = if options.include_style_info {
        let (style_map, mut map_messages) = StyleMap::parse(&options.style_map);
        let (html, render_messages) = render_html(&model, &package, &style_map);
        map_messages.extend(render_messages);
        messages.extend(map_messages);
        Some(html)
    } else {
        None
    };

    let text = if options.ignore_empty_paragraphs {
        raw_text
            .split('\n')
            .filter(|line| !line.trim().is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    } else {
        raw_text
    };

    let stats = DocxStats {
        word_count: text.split_whitespace().count(),
        paragraph_count: text.split('\n').filter(|l| !l.trim().is_empty()).count(),
        has_images: raw_messages
            .iter()
            .any(|m| m.message.contains("image") || m.severity == MessageSeverity::Warning),
    };

    tracing::debug!(
        words = stats.word_count,
        paragraphs = stats.paragraph_count,
        messages = messages.len(),
        "DOCX converted"
    );

    Ok(DocxExtraction {
        text,
        html,
        messages,
        metadata: Some(stats),
    })
}

/// Every paragraph's text followed by a blank line.
fn raw_text(model: &DocumentModel) -> String {
    let mut out = String::new();
    for paragraph in model.paragraphs() {
        out.push_str(&paragraph.text());
        out.push_str("\n\n");
    }
    out
}

/// Text with empty lines removed.
pub async fn extract_plain_text(data: Arc<[u8]>) -> Result<String, ExtractionError> {
    let options = DocxOptions {
        ignore_empty_paragraphs: true,
        ..Default::default()
    };
    Ok(DocxExtractor.extract(data, &options).await?.text)
}

/// Styled HTML with the conversion messages.
pub async fn extract_html(
    data: Arc<[u8]>,
    style_map: Vec<String>,
) -> Result<(String, Vec<DocxMessage>), ExtractionError> {
    let options = DocxOptions {
        include_style_info: true,
        ignore_empty_paragraphs: true,
        style_map,
    };
    let result = DocxExtractor.extract(data, &options).await?;
    Ok((result.html.unwrap_or_default(), result.messages))
}

/// Summary statistics for a DOCX file.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocxInfo {
    pub word_count: usize,
    pub paragraph_count: usize,
    pub has_images: bool,
    pub has_warnings: bool,
    pub file_size: u64,
    pub messages: Vec<DocxMessage>,
}

pub async fn docx_info(data: Arc<[u8]>) -> Result<DocxInfo, ExtractionError> {
    let file_size = data.len() as u64;
    let result = DocxExtractor
        .extract(data, &DocxOptions::default())
        .await?;
    let stats = result.metadata.unwrap_or_default();
    Ok(DocxInfo {
        word_count: stats.word_count,
        paragraph_count: stats.paragraph_count,
        has_images: stats.has_images,
        has_warnings: result
            .messages
            .iter()
            .any(|m| m.severity == MessageSeverity::Warning),
        file_size,
        messages: result.messages,
    })
}
