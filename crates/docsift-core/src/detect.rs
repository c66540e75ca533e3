//! Format detection from file name suffix and declared MIME type.
//!
//! Suffix and MIME are each sufficient on their own: a file with a wrong
//! MIME type but the right suffix (or the reverse) still classifies.

use crate::{DetectedType, FileBlob};

const PDF_MIME: &str = "application/pdf";
const DOCX_MIME: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

const IMAGE_MIMES: &[&str] = &[
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/gif",
    "image/bmp",
    "image/tiff",
    "image/webp",
];

const IMAGE_SUFFIXES: &[&str] = &[
    ".jpg", ".jpeg", ".png", ".gif", ".bmp", ".tiff", ".tif", ".webp",
];

/// Classify a blob. Pure and total.
pub fn detect(file: &FileBlob) -> DetectedType {
    detect_type(&file.name, &file.content_type)
}

/// Classify a (name, content type) pair.
pub fn detect_type(name: &str, content_type: &str) -> DetectedType {
    let name = name.to_lowercase();
    let mime = content_type.trim().to_lowercase();

    if name.ends_with(".pdf") || mime == PDF_MIME {
        return DetectedType::Pdf;
    }
    if name.ends_with(".docx") || mime == DOCX_MIME {
        return DetectedType::Docx;
    }
    if is_supported_image(&name, &mime) {
        return DetectedType::Image;
    }
    DetectedType::Unsupported
}

/// Returns true if either the MIME type or the suffix names a raster image
/// format the OCR backend accepts.
pub fn is_supported_image(name: &str, content_type: &str) -> bool {
    let name = name.to_lowercase();
    let mime = content_type.trim().to_lowercase();
    IMAGE_MIMES.contains(&mime.as_str()) || IMAGE_SUFFIXES.iter().any(|s| name.ends_with(s))
}

/// The MIME type a browser would report for a file name, based on its suffix.
pub fn content_type_for_name(name: &str) -> &'static str {
    let lower = name.to_lowercase();
    let ext = lower.rsplit_once('.').map(|(_, e)| e).unwrap_or("");
    match ext {
        "pdf" => PDF_MIME,
        "docx" => DOCX_MIME,
        "doc" => "application/msword",
        "txt" => "text/plain",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "tif" | "tiff" => "image/tiff",
        "webp" => "image/webp",
        _ => "application/octet-stream",
    }
}
