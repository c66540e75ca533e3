use serde::Serialize;

use docsift_core::{DetectedType, FileBlob, SizeLimits, detect};

/// Whether a file may be submitted for extraction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileValidation {
    pub is_valid: bool,
    pub file_type: DetectedType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// The cap that was exceeded, in bytes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_size: Option<u64>,
}

/// Check format support and the per-type size cap.
pub fn validate_file(file: &FileBlob, limits: &SizeLimits) -> FileValidation {
    let file_type = detect(file);
    let Some(max_size) = limits.limit_for(file_type) else {
        return FileValidation {
            is_valid: false,
            file_type,
            reason: Some("Unsupported file format".to_string()),
            max_size: None,
        };
    };

    if file.size > max_size {
        tracing::debug!(file = %file.name, size = file.size, max_size, "file exceeds size limit");
        return FileValidation {
            is_valid: false,
            file_type,
            reason: Some("File size exceeds limit".to_string()),
            max_size: Some(max_size),
        };
    }

    FileValidation {
        is_valid: true,
        file_type,
        reason: None,
        max_size: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sized(name: &str, content_type: &str, size: u64) -> FileBlob {
        let mut blob = FileBlob::new(name, content_type, Vec::new());
        blob.size = size;
        blob
    }

    #[test]
    fn unsupported_has_reason_and_no_limit() {
        let v = validate_file(&sized("setup.exe", "application/octet-stream", 10), &SizeLimits::default());
        assert!(!v.is_valid);
        assert_eq!(v.file_type, DetectedType::Unsupported);
        assert_eq!(v.reason.as_deref(), Some("Unsupported file format"));
        assert_eq!(v.max_size, None);
    }

    #[test]
    fn per_type_caps() {
        let limits = SizeLimits::default();
        let mib = 1024 * 1024;

        assert!(validate_file(&sized("a.pdf", "", 50 * mib), &limits).is_valid);
        let v = validate_file(&sized("a.pdf", "", 50 * mib + 1), &limits);
        assert!(!v.is_valid);
        assert_eq!(v.reason.as_deref(), Some("File size exceeds limit"));
        assert_eq!(v.max_size, Some(50 * mib));

        assert!(!validate_file(&sized("a.docx", "", 26 * mib), &limits).is_valid);
        assert!(validate_file(&sized("a.docx", "", 25 * mib), &limits).is_valid);

        let v = validate_file(&sized("scan.jpg", "image/jpeg", 11 * mib), &limits);
        assert_eq!(v.max_size, Some(10 * mib));
    }

    #[test]
    fn custom_limits_apply() {
        let limits = SizeLimits::from_megabytes(1, 1, 1);
        let v = validate_file(&sized("a.pdf", "", 2 * 1024 * 1024), &limits);
        assert!(!v.is_valid);
        assert_eq!(v.max_size, Some(1024 * 1024));
    }
}
