//! Error types for the edgequake-md2pdf library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`Md2PdfError`] — **Fatal**: the batch cannot start at all (input
//!   directory missing, output directory cannot be created, bad config).
//!   Returned as `Err(Md2PdfError)` from the top-level entry points.
//!
//! * [`DocumentError`] — **Non-fatal**: a single Markdown file failed (not
//!   UTF-8, engine crash, disk full) but every other file is still attempted.
//!   Stored inside [`crate::output::DocumentResult`] so callers can inspect
//!   partial success rather than losing the whole batch to one bad file.
//!
//! [`RenderError`] is the engine-level failure produced by
//! [`crate::pipeline::render::PdfEngine`]; the batch driver folds it into
//! [`DocumentError::Render`] together with the offending file name.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the edgequake-md2pdf library.
///
/// Per-document failures use [`DocumentError`] and are stored in
/// [`crate::output::DocumentResult`] rather than propagated here.
#[derive(Debug, Error)]
pub enum Md2PdfError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input directory does not exist.
    #[error("Input directory not found: '{path}'\nCreate it or pass --input <DIR>.")]
    InputNotFound { path: PathBuf },

    /// Input path exists but is a file, not a directory.
    #[error("Input path is not a directory: '{path}'")]
    NotADirectory { path: PathBuf },

    /// Process does not have permission to list the input directory.
    #[error("Permission denied reading '{path}'\nTry: chmod +rx {path:?}")]
    PermissionDenied { path: PathBuf },

    /// Listing the input directory failed for another reason.
    #[error("Failed to read directory '{path}': {source}")]
    ReadDirFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Output errors ─────────────────────────────────────────────────────
    /// The output directory could not be created.
    #[error("Failed to create output directory '{path}': {source}")]
    OutputDirFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not write a PDF in single-file mode.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Batch outcome ─────────────────────────────────────────────────────
    /// Some documents converted but at least one failed.
    ///
    /// Returned by [`crate::output::BatchReport::into_result`] when the
    /// caller wants to treat any document failure as an error.
    #[error("{failed}/{total} documents failed during conversion")]
    PartialFailure {
        success: usize,
        failed: usize,
        total: usize,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single source document.
///
/// Every variant names the file so a report line is self-explanatory.
/// The batch always continues with the next document.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
pub enum DocumentError {
    /// The Markdown file could not be opened or is not valid UTF-8.
    #[error("{file}: read failed: {detail}")]
    Read { file: String, detail: String },

    /// The Markdown could not be turned into a safe HTML document.
    #[error("{file}: conversion failed: {detail}")]
    Conversion { file: String, detail: String },

    /// The HTML-to-PDF engine rejected or failed on the document.
    #[error("{file}: PDF rendering failed: {detail}")]
    Render { file: String, detail: String },

    /// The PDF could not be written to its destination.
    #[error("{file}: write to '{path}' failed: {detail}")]
    Write {
        file: String,
        path: String,
        detail: String,
    },

    /// Reading, converting and rendering did not finish within the deadline.
    #[error("{file}: timed out after {secs}s")]
    Timeout { file: String, secs: u64 },

    /// Another source already claims the same output file.
    #[error("{file}: output '{output}' is already produced by '{claimed_by}'")]
    OutputCollision {
        file: String,
        output: String,
        claimed_by: String,
    },
}

impl DocumentError {
    /// The source file name this error refers to.
    pub fn file(&self) -> &str {
        match self {
            DocumentError::Read { file, .. }
            | DocumentError::Conversion { file, .. }
            | DocumentError::Render { file, .. }
            | DocumentError::Write { file, .. }
            | DocumentError::Timeout { file, .. }
            | DocumentError::OutputCollision { file, .. } => file,
        }
    }
}

/// The rendered fragment cannot be embedded in the document body.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("`{markup}` cannot be embedded in the document body")]
pub struct ConversionError {
    /// The offending markup as it appears in the rendered fragment.
    pub markup: String,
}

/// Failure of a [`crate::pipeline::render::PdfEngine`].
#[derive(Debug, Error)]
pub enum RenderError {
    /// The engine executable is not installed or not on `PATH`.
    #[error("engine '{program}' not found; install it or pass --engine-path")]
    EngineNotFound { program: String },

    /// Spawning or talking to the engine process failed.
    #[error("engine '{program}' I/O error: {source}")]
    Io {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The engine exited unsuccessfully.
    #[error("engine '{program}' exited with {status}: {stderr}")]
    EngineFailed {
        program: String,
        status: String,
        stderr: String,
    },

    /// The engine produced no bytes at all.
    #[error("engine '{program}' produced no output")]
    EmptyOutput { program: String },

    /// The engine produced bytes that do not start with `%PDF`.
    #[error("engine '{program}' output is not a PDF (first bytes: {magic:?})")]
    NotAPdf { program: String, magic: Vec<u8> },
}
