//! # edgequake-md2pdf
//!
//! Batch-convert a directory of Markdown documents into print-styled PDFs.
//!
//! ## Why this crate?
//!
//! Markdown → PDF tools usually either drag in a full TeX distribution or
//! produce screen-styled output that breaks tables across pages. This crate
//! renders each document to HTML with a fixed print stylesheet (2.5cm page
//! margins, justified 12pt text, wrapped code blocks, tables and rows kept on
//! one page) and hands that HTML to a CSS paged-media engine such as
//! WeasyPrint. One bad file never stops the batch.
//!
//! ## Pipeline Overview
//!
//! ```text
//! input/*.md
//!  │
//!  ├─ 1. Discover  list, filter by extension, sort, assign output names
//!  ├─ 2. Read      UTF-8 source (BOM stripped)
//!  ├─ 3. Convert   pulldown-cmark (tables, footnotes, smart punctuation, …)
//!  │               + HTML template with the print stylesheet
//!  ├─ 4. Render    external engine: HTML on stdin → PDF on stdout
//!  └─ 5. Write     temp file + rename into output/<base>.pdf
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_md2pdf::{run_batch, BatchConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // input/ → output/, WeasyPrint unless MD2PDF_ENGINE says otherwise
//!     let config = BatchConfig::default();
//!     let report = run_batch(&config).await?;
//!     for failure in report.failures() {
//!         eprintln!("{failure}");
//!     }
//!     eprintln!("{}/{} converted",
//!         report.stats.converted,
//!         report.stats.total_documents);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `md2pdf` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only deps:
//! ```toml
//! edgequake-md2pdf = { version = "0.1", default-features = false }
//! ```
//!
//! ## Choosing an Engine
//!
//! | Engine | `@page` margins | `page-break-inside` | Notes |
//! |--------|-----------------|---------------------|-------|
//! | `weasyprint`  | yes | yes | Default; pure CSS paged media |
//! | `wkhtmltopdf` | via flags | partial | Margins passed on the command line |
//!
//! Any other renderer can be plugged in by implementing [`PdfEngine`] and
//! passing it to [`BatchConfigBuilder::engine`].

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod stream;
pub mod template;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{BatchConfig, BatchConfigBuilder, CollisionPolicy, EngineKind};
pub use convert::{convert_file, run_batch, run_batch_sync};
pub use error::{ConversionError, DocumentError, Md2PdfError, RenderError};
pub use output::{BatchReport, BatchStats, DocumentResult};
pub use pipeline::discover::{plan, PlannedDocument};
pub use pipeline::markdown::markdown_to_html;
pub use pipeline::render::{CommandEngine, PdfEngine};
pub use progress::{BatchProgressCallback, NoopProgressCallback, ProgressCallback};
pub use stream::{batch_stream, DocumentStream};
pub use template::{compose_document, TemplateOptions, STYLESHEET};
