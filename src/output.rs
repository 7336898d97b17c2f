//! Result types returned by the batch driver.

use crate::error::{DocumentError, Md2PdfError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Outcome of one eligible Markdown file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentResult {
    /// Full path of the source Markdown file.
    pub source: PathBuf,
    /// Source file name, as shown in report lines.
    pub file: String,
    /// Planned PDF path. On failure nothing exists there from this run; for
    /// an output collision it is the path another file claimed.
    pub output: PathBuf,
    /// Size of the written PDF; 0 on failure.
    pub pdf_bytes: usize,
    /// Wall-clock time spent on this document.
    pub duration_ms: u64,
    /// Set when the document failed; no PDF was written in that case.
    pub error: Option<DocumentError>,
}

impl DocumentResult {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Aggregate numbers for a batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchStats {
    pub total_documents: usize,
    pub converted: usize,
    pub failed: usize,
    pub total_pdf_bytes: u64,
    pub total_duration_ms: u64,
}

impl BatchStats {
    /// Tally a set of document results.
    pub fn from_results(documents: &[DocumentResult], total_duration_ms: u64) -> Self {
        let converted = documents.iter().filter(|d| d.is_success()).count();
        Self {
            total_documents: documents.len(),
            converted,
            failed: documents.len() - converted,
            total_pdf_bytes: documents.iter().map(|d| d.pdf_bytes as u64).sum(),
            total_duration_ms,
        }
    }
}

/// Everything a batch run produced, in plan order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub documents: Vec<DocumentResult>,
    pub stats: BatchStats,
}

impl BatchReport {
    /// True when every eligible document produced a PDF (vacuously true for
    /// an empty input directory).
    pub fn is_success(&self) -> bool {
        self.stats.failed == 0
    }

    /// The per-document errors, in plan order.
    pub fn failures(&self) -> impl Iterator<Item = &DocumentError> {
        self.documents.iter().filter_map(|d| d.error.as_ref())
    }

    /// Turn any document failure into [`Md2PdfError::PartialFailure`].
    pub fn into_result(self) -> Result<Self, Md2PdfError> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(Md2PdfError::PartialFailure {
                success: self.stats.converted,
                failed: self.stats.failed,
                total: self.stats.total_documents,
            })
        }
    }
}
