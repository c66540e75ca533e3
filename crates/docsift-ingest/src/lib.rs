use std::path::{Path, PathBuf};

use thiserror::Error;

pub mod extractor;
pub mod summary;
pub mod validate;

// Re-export domain types for convenience
pub use docsift_core::{
    DetectedType, ExtractionDetail, ExtractionMethod, ExtractionOptions, ExtractionResult,
    FileBlob, SizeLimits, detect,
};
pub use extractor::{Extractor, ExtractorBuilder};
pub use summary::{ExtractionSummary, summarize};
pub use validate::{FileValidation, validate_file};

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Read a file from disk into a [`FileBlob`].
pub async fn load_file(path: &Path) -> Result<FileBlob, IngestError> {
    FileBlob::from_path(path)
        .await
        .map_err(|source| IngestError::Read {
            path: path.to_path_buf(),
            source,
        })
}
