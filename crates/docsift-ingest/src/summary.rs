use std::collections::BTreeMap;

use serde::Serialize;

use docsift_core::{DetectedType, ExtractionMethod, ExtractionResult};

/// Aggregate statistics over a batch of results.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionSummary {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    /// Percentage of successful results, 0 for an empty batch.
    pub success_rate: f64,
    pub by_type: BTreeMap<DetectedType, usize>,
    pub by_method: BTreeMap<ExtractionMethod, usize>,
    pub total_processing_time_ms: u64,
    pub average_processing_time_ms: f64,
    /// Characters of text across successful results only.
    pub total_text_length: usize,
}

pub fn summarize(results: &[ExtractionResult]) -> ExtractionSummary {
    let total = results.len();
    let successful = results.iter().filter(|r| r.success).count();

    let mut by_type = BTreeMap::new();
    let mut by_method = BTreeMap::new();
    for r in results {
        *by_type.entry(r.file_type).or_insert(0) += 1;
        *by_method.entry(r.extraction_method).or_insert(0) += 1;
    }

    let total_processing_time_ms: u64 = results.iter().map(|r| r.processing_time_ms).sum();
    let (success_rate, average_processing_time_ms) = if total > 0 {
        (
            successful as f64 / total as f64 * 100.0,
            total_processing_time_ms as f64 / total as f64,
        )
    } else {
        (0.0, 0.0)
    };

    ExtractionSummary {
        total,
        successful,
        failed: total - successful,
        success_rate,
        by_type,
        by_method,
        total_processing_time_ms,
        average_processing_time_ms,
        total_text_length: results
            .iter()
            .filter(|r| r.success)
            .map(|r| r.text.chars().count())
            .sum(),
    }
}
