//! Eager (whole-batch) conversion entry points.
//!
//! ## Why eager vs. streaming?
//!
//! This module provides the simpler API: process every planned document,
//! then return one [`BatchReport`]. Use [`crate::stream::batch_stream`]
//! instead when you want each [`DocumentResult`] as soon as its PDF is on
//! disk, e.g. to drive a UI.
//!
//! Both share the per-document pipeline in [`process_document`]:
//!
//! ```text
//! collision check → read → Markdown→HTML → engine → atomic write
//!                   └──────── optional deadline ────────┘
//! ```
//!
//! The write sits outside the deadline: once the engine has returned a PDF
//! the document is published, and a document that timed out never gets as
//! far as the write.

use crate::config::BatchConfig;
use crate::error::{DocumentError, Md2PdfError};
use crate::output::{BatchReport, BatchStats, DocumentResult};
use crate::pipeline::discover::{self, match_extension, PlannedDocument};
use crate::pipeline::render::{resolve_engine, resolve_engine_for, PdfEngine};
use crate::pipeline::{markdown, source, write};
use futures::StreamExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Convert every Markdown file in `config.input_dir` into a PDF in
/// `config.output_dir`.
///
/// This is the primary entry point for the library.
///
/// # Returns
/// `Ok(BatchReport)` once every planned document has been attempted, even if
/// some of them failed (check `report.stats.failed` or
/// [`BatchReport::into_result`]).
///
/// # Errors
/// Returns `Err(Md2PdfError)` only for fatal errors:
/// - Input directory missing, not a directory or not listable
/// - Output directory cannot be created
/// - Engine cannot be resolved (bad `MD2PDF_ENGINE`)
pub async fn run_batch(config: &BatchConfig) -> Result<BatchReport, Md2PdfError> {
    let start = Instant::now();

    let documents: Vec<DocumentResult> = crate::stream::batch_stream(config).await?.collect().await;

    let stats = BatchStats::from_results(&documents, start.elapsed().as_millis() as u64);
    info!(
        "Batch complete: {}/{} converted, {} failed, {}ms",
        stats.converted, stats.total_documents, stats.failed, stats.total_duration_ms
    );

    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_complete(stats.total_documents, stats.converted);
    }

    Ok(BatchReport {
        input_dir: config.input_dir.clone(),
        output_dir: config.output_dir.clone(),
        documents,
        stats,
    })
}

/// Synchronous wrapper around [`run_batch`].
///
/// Creates a temporary tokio runtime internally.
pub fn run_batch_sync(config: &BatchConfig) -> Result<BatchReport, Md2PdfError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| Md2PdfError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(run_batch(config))
}

/// Convert a single Markdown file to `dest`.
///
/// Runs the same pipeline as a batch document; `config.input_dir` and
/// `config.output_dir` are ignored. Relative links in the Markdown resolve
/// against the source file's directory. The destination's parent directory
/// is created if needed.
///
/// # Errors
/// Fatal errors only (engine resolution, parent directory creation). A
/// document-level failure is reported in [`DocumentResult::error`].
pub async fn convert_file(
    source_path: impl AsRef<Path>,
    dest: impl AsRef<Path>,
    config: &BatchConfig,
) -> Result<DocumentResult, Md2PdfError> {
    let source_path = source_path.as_ref();
    let dest = dest.as_ref();

    let engine = resolve_engine_for(config, &source_base_dir(source_path))?;

    if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| Md2PdfError::OutputDirFailed {
                path: parent.to_path_buf(),
                source: e,
            })?;
    }

    let file = source_path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| source_path.display().to_string());
    let base_name = match_extension(&file, &config.extensions)
        .map(str::to_string)
        .or_else(|| {
            source_path
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
        })
        .unwrap_or_else(|| file.clone());

    let doc = PlannedDocument {
        source: source_path.to_path_buf(),
        file,
        base_name,
        output: dest.to_path_buf(),
        claimed_by: None,
    };
    Ok(process_document(engine.as_ref(), doc, 1, 1, config).await)
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Directory a source file's relative links are written against.
fn source_base_dir(source: &Path) -> PathBuf {
    match source.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Everything that must succeed before the first document starts: the
/// engine, the plan and the output directory.
pub(crate) async fn prepare(
    config: &BatchConfig,
) -> Result<(Arc<dyn PdfEngine>, Vec<PlannedDocument>), Md2PdfError> {
    let engine = resolve_engine(config)?;
    let planned = discover::plan(config).await?;

    tokio::fs::create_dir_all(&config.output_dir)
        .await
        .map_err(|e| Md2PdfError::OutputDirFailed {
            path: config.output_dir.clone(),
            source: e,
        })?;

    info!(
        "Converting {} document(s) from {} into {} with {}",
        planned.len(),
        config.input_dir.display(),
        config.output_dir.display(),
        engine.name()
    );
    Ok((engine, planned))
}

/// Run one planned document through the pipeline.
///
/// Never fails: every error ends up in the returned [`DocumentResult`],
/// together with a `warn!` line and an `on_document_error` event.
pub(crate) async fn process_document(
    engine: &dyn PdfEngine,
    doc: PlannedDocument,
    index: usize,
    total: usize,
    config: &BatchConfig,
) -> DocumentResult {
    let start = Instant::now();
    if let Some(ref cb) = config.progress_callback {
        cb.on_document_start(&doc.file, index, total);
    }

    let outcome = match doc.collision_error() {
        Some(err) => Err(err),
        None => produce(engine, &doc, config).await,
    };
    let duration_ms = start.elapsed().as_millis() as u64;

    match outcome {
        Ok(pdf_bytes) => {
            info!("PDF generated: {}", doc.output.display());
            if let Some(ref cb) = config.progress_callback {
                cb.on_document_complete(&doc.file, &doc.output, pdf_bytes);
            }
            DocumentResult {
                source: doc.source,
                file: doc.file,
                output: doc.output,
                pdf_bytes,
                duration_ms,
                error: None,
            }
        }
        Err(err) => {
            warn!("Error processing {}: {}", doc.file, err);
            if let Some(ref cb) = config.progress_callback {
                cb.on_document_error(&doc.file, &err.to_string());
            }
            DocumentResult {
                source: doc.source,
                file: doc.file,
                output: doc.output,
                pdf_bytes: 0,
                duration_ms,
                error: Some(err),
            }
        }
    }
}

/// Render under the deadline, then publish. Returns the PDF size.
async fn produce(
    engine: &dyn PdfEngine,
    doc: &PlannedDocument,
    config: &BatchConfig,
) -> Result<usize, DocumentError> {
    let rendering = render_document(engine, doc, config);
    let pdf = match config.document_timeout_secs {
        Some(secs) => tokio::time::timeout(Duration::from_secs(secs), rendering)
            .await
            .map_err(|_| DocumentError::Timeout {
                file: doc.file.clone(),
                secs,
            })??,
        None => rendering.await?,
    };

    let pdf_bytes = pdf.len();
    write::write_artifact(&doc.output, pdf)
        .await
        .map_err(|e| DocumentError::Write {
            file: doc.file.clone(),
            path: doc.output.display().to_string(),
            detail: e.to_string(),
        })?;
    Ok(pdf_bytes)
}

/// Read → Markdown → HTML → PDF bytes.
async fn render_document(
    engine: &dyn PdfEngine,
    doc: &PlannedDocument,
    config: &BatchConfig,
) -> Result<Vec<u8>, DocumentError> {
    let text = source::read_source(&doc.source, &doc.file).await?;

    let html = markdown::markdown_to_html(&text, &config.template_options(&doc.base_name))
        .map_err(|e| DocumentError::Conversion {
            file: doc.file.clone(),
            detail: e.to_string(),
        })?;
    debug!("{}: {} bytes of HTML", doc.file, html.len());

    engine
        .render(&html)
        .await
        .map_err(|e| DocumentError::Render {
            file: doc.file.clone(),
            detail: e.to_string(),
        })
}
