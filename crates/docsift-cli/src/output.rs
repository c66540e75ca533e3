use std::collections::BTreeMap;
use std::fmt::Display;
use std::io::Write;
use std::path::Path;

use indicatif::HumanBytes;
use owo_colors::OwoColorize;
use serde::Serialize;

use docsift_core::{ExtractionDetail, ExtractionResult, PdfMetadata};
use docsift_docx::DocxInfo;
use docsift_ingest::{ExtractionSummary, FileValidation};
use docsift_pdf::PdfInfo;

/// Whether to use colored output.
#[derive(Debug, Clone, Copy)]
pub struct ColorMode(pub bool);

impl ColorMode {
    pub fn enabled(&self) -> bool {
        self.0
    }
}

#[derive(Serialize)]
struct JsonReport<'a> {
    results: &'a [ExtractionResult],
    summary: &'a ExtractionSummary,
}

/// Write `{ "results": [...], "summary": {...} }`.
pub fn write_json(
    w: &mut dyn Write,
    results: &[ExtractionResult],
    summary: &ExtractionSummary,
) -> std::io::Result<()> {
    serde_json::to_writer_pretty(&mut *w, &JsonReport { results, summary })
        .map_err(std::io::Error::from)?;
    writeln!(w)
}

/// Print one file's result: status line, backend details, warnings, error.
pub fn print_result(
    w: &mut dyn Write,
    result: &ExtractionResult,
    show_text: bool,
    color: ColorMode,
) -> std::io::Result<()> {
    let header = format!(
        "{} ({}, {}, {} ms)",
        result.file_name,
        result.file_type,
        result.extraction_method,
        result.processing_time_ms
    );
    if color.enabled() {
        if result.success {
            writeln!(w, "{} {}", "OK".green().bold(), header.bold())?;
        } else {
            writeln!(w, "{} {}", "FAILED".red().bold(), header.bold())?;
        }
    } else {
        let status = if result.success { "OK" } else { "FAILED" };
        writeln!(w, "{} {}", status, header)?;
    }

    match &result.detail {
        Some(ExtractionDetail::Pdf(pdf)) => {
            writeln!(w, "  Pages:      {}", pdf.page_count)?;
            if let Some(meta) = &pdf.metadata {
                print_metadata(w, meta)?;
            }
        }
        Some(ExtractionDetail::Docx(docx)) => {
            if let Some(stats) = &docx.metadata {
                writeln!(
                    w,
                    "  Words:      {} in {} paragraphs{}",
                    stats.word_count,
                    stats.paragraph_count,
                    if stats.has_images { " (has images)" } else { "" }
                )?;
            }
            for message in &docx.messages {
                writeln!(w, "  [{:?}] {}", message.severity, message.message)?;
            }
        }
        Some(ExtractionDetail::Ocr(ocr)) => {
            writeln!(w, "  Confidence: {:.1}%", ocr.confidence)?;
        }
        None => {}
    }

    if result.success {
        writeln!(w, "  Characters: {}", result.text.chars().count())?;
    }

    for warning in &result.warnings {
        if color.enabled() {
            writeln!(w, "  {} {}", "WARNING:".yellow(), warning)?;
        } else {
            writeln!(w, "  WARNING: {}", warning)?;
        }
    }
    if let Some(ref error) = result.error {
        if color.enabled() {
            writeln!(w, "  {} {}", "ERROR:".red(), error)?;
        } else {
            writeln!(w, "  ERROR: {}", error)?;
        }
    }

    if show_text {
        if !result.text.is_empty() {
            writeln!(w)?;
            writeln!(w, "{}", result.text.trim_end())?;
        }
        if let Some(ExtractionDetail::Docx(docx)) = &result.detail
            && let Some(html) = &docx.html
        {
            writeln!(w)?;
            writeln!(w, "{}", html)?;
        }
    }
    writeln!(w)?;
    Ok(())
}

fn print_metadata(w: &mut dyn Write, meta: &PdfMetadata) -> std::io::Result<()> {
    let fields = [
        ("Title", meta.title.as_deref()),
        ("Author", meta.author.as_deref()),
        ("Subject", meta.subject.as_deref()),
        ("Creator", meta.creator.as_deref()),
        ("Producer", meta.producer.as_deref()),
    ];
    for (label, value) in fields {
        if let Some(value) = value {
            writeln!(w, "  {:<11} {}", format!("{}:", label), value)?;
        }
    }
    if let Some(date) = meta.creation_date {
        writeln!(w, "  Created:    {}", date.to_rfc3339())?;
    }
    if let Some(date) = meta.modification_date {
        writeln!(w, "  Modified:   {}", date.to_rfc3339())?;
    }
    Ok(())
}

fn counts<K: Display>(map: &BTreeMap<K, usize>) -> String {
    if map.is_empty() {
        return "-".to_string();
    }
    map.iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Print the batch summary.
pub fn print_summary(
    w: &mut dyn Write,
    summary: &ExtractionSummary,
    color: ColorMode,
) -> std::io::Result<()> {
    let line = format!(
        "{}/{} files extracted ({:.1}%)",
        summary.successful, summary.total, summary.success_rate
    );
    if color.enabled() {
        if summary.failed == 0 {
            writeln!(w, "{}", line.green().bold())?;
        } else {
            writeln!(w, "{}", line.yellow().bold())?;
        }
    } else {
        writeln!(w, "{}", line)?;
    }
    writeln!(w, "  By type:    {}", counts(&summary.by_type))?;
    writeln!(w, "  By method:  {}", counts(&summary.by_method))?;
    writeln!(
        w,
        "  Time:       {} ms total, {:.1} ms average",
        summary.total_processing_time_ms, summary.average_processing_time_ms
    )?;
    writeln!(w, "  Text:       {} characters", summary.total_text_length)?;
    Ok(())
}

pub fn print_validation(
    w: &mut dyn Write,
    name: &str,
    validation: &FileValidation,
    color: ColorMode,
) -> std::io::Result<()> {
    if validation.is_valid {
        if color.enabled() {
            writeln!(w, "{} {} ({})", "VALID  ".green(), name, validation.file_type)?;
        } else {
            writeln!(w, "VALID   {} ({})", name, validation.file_type)?;
        }
        return Ok(());
    }

    let mut reason = validation.reason.clone().unwrap_or_default();
    if let Some(max) = validation.max_size {
        reason.push_str(&format!(" (max {})", HumanBytes(max)));
    }
    if color.enabled() {
        writeln!(
            w,
            "{} {} ({}): {}",
            "INVALID".red(),
            name,
            validation.file_type,
            reason
        )?;
    } else {
        writeln!(w, "INVALID {} ({}): {}", name, validation.file_type, reason)?;
    }
    Ok(())
}

pub fn print_unreadable(
    w: &mut dyn Write,
    path: &Path,
    reason: &str,
    color: ColorMode,
) -> std::io::Result<()> {
    if color.enabled() {
        writeln!(w, "{} {}: {}", "INVALID".red(), path.display(), reason)
    } else {
        writeln!(w, "INVALID {}: {}", path.display(), reason)
    }
}

pub fn print_pdf_info(
    w: &mut dyn Write,
    name: &str,
    info: &PdfInfo,
    color: ColorMode,
) -> std::io::Result<()> {
    if color.enabled() {
        writeln!(w, "{}", name.bold())?;
    } else {
        writeln!(w, "{}", name)?;
    }
    writeln!(w, "  Size:       {}", HumanBytes(info.file_size))?;
    writeln!(w, "  Pages:      {}", info.page_count)?;
    writeln!(
        w,
        "  Text layer: {}",
        if info.has_text { "yes" } else { "no (scanned?)" }
    )?;
    if let Some(meta) = &info.metadata {
        print_metadata(w, meta)?;
    }
    Ok(())
}

pub fn print_docx_info(
    w: &mut dyn Write,
    name: &str,
    info: &DocxInfo,
    color: ColorMode,
) -> std::io::Result<()> {
    if color.enabled() {
        writeln!(w, "{}", name.bold())?;
    } else {
        writeln!(w, "{}", name)?;
    }
    writeln!(w, "  Size:       {}", HumanBytes(info.file_size))?;
    writeln!(w, "  Words:      {}", info.word_count)?;
    writeln!(w, "  Paragraphs: {}", info.paragraph_count)?;
    writeln!(
        w,
        "  Images:     {}",
        if info.has_images { "yes" } else { "no" }
    )?;
    for message in &info.messages {
        if color.enabled() {
            writeln!(w, "  {} {}", "NOTE:".yellow(), message.message)?;
        } else {
            writeln!(w, "  NOTE: {}", message.message)?;
        }
    }
    Ok(())
}
