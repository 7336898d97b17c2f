//! Configuration types for batch Markdown-to-PDF conversion.
//!
//! All batch behaviour is controlled through [`BatchConfig`], built via its
//! [`BatchConfigBuilder`]. Directories, extensions and the engine are passed
//! in explicitly instead of living in process-wide constants, so two batches
//! with different settings can run side by side in one process.

use crate::error::Md2PdfError;
use crate::pipeline::render::PdfEngine;
use crate::progress::ProgressCallback;
use crate::template::{TemplateOptions, DEFAULT_LANG};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Default input directory, relative to the working directory.
pub const DEFAULT_INPUT_DIR: &str = "input";

/// Default output directory, relative to the working directory.
pub const DEFAULT_OUTPUT_DIR: &str = "output";

/// Extensions recognised as Markdown when none are configured.
pub const DEFAULT_EXTENSIONS: &[&str] = &["md", "markdown"];

/// Configuration for a batch conversion.
///
/// Built via [`BatchConfig::builder()`] or using [`BatchConfig::default()`].
///
/// # Example
/// ```rust
/// use edgequake_md2pdf::{BatchConfig, EngineKind};
///
/// let config = BatchConfig::builder()
///     .input_dir("docs")
///     .output_dir("build/pdf")
///     .engine_kind(EngineKind::Wkhtmltopdf)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct BatchConfig {
    /// Directory scanned for Markdown files. Default: `input`.
    pub input_dir: PathBuf,

    /// Directory receiving the PDFs; created if missing. Default: `output`.
    pub output_dir: PathBuf,

    /// Recognised extensions without the dot, matched case-insensitively.
    /// Default: `md`, `markdown`.
    pub extensions: Vec<String>,

    /// Which external engine turns HTML into PDF.
    /// If None, `MD2PDF_ENGINE` is consulted, then WeasyPrint is used.
    pub engine_kind: Option<EngineKind>,

    /// Explicit path to the engine executable. If None, the engine's default
    /// program name is looked up on `PATH`.
    pub engine_program: Option<PathBuf>,

    /// Pre-constructed engine. Takes precedence over `engine_kind`.
    pub engine: Option<Arc<dyn PdfEngine>>,

    /// `lang` attribute of every composed document. Default: `pt-BR`.
    pub lang: String,

    /// Documents converted at the same time. Default: 1 (sequential).
    ///
    /// Each document is independent, so raising this only trades memory and
    /// engine processes for wall-clock time. The report keeps plan order
    /// regardless.
    pub concurrency: usize,

    /// Deadline per document for read → convert → render, in seconds.
    /// None means no deadline. Default: None.
    pub document_timeout_secs: Option<u64>,

    /// What to do when two sources map to the same PDF name.
    pub collision_policy: CollisionPolicy,

    /// Optional per-document progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from(DEFAULT_INPUT_DIR),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            engine_kind: None,
            engine_program: None,
            engine: None,
            lang: DEFAULT_LANG.to_string(),
            concurrency: 1,
            document_timeout_secs: None,
            collision_policy: CollisionPolicy::default(),
            progress_callback: None,
        }
    }
}

impl fmt::Debug for BatchConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchConfig")
            .field("input_dir", &self.input_dir)
            .field("output_dir", &self.output_dir)
            .field("extensions", &self.extensions)
            .field("engine_kind", &self.engine_kind)
            .field("engine_program", &self.engine_program)
            .field("engine", &self.engine.as_ref().map(|e| e.name().to_string()))
            .field("lang", &self.lang)
            .field("concurrency", &self.concurrency)
            .field("document_timeout_secs", &self.document_timeout_secs)
            .field("collision_policy", &self.collision_policy)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn BatchProgressCallback>"),
            )
            .finish()
    }
}

impl BatchConfig {
    /// Create a new builder for `BatchConfig`.
    pub fn builder() -> BatchConfigBuilder {
        BatchConfigBuilder {
            config: Self::default(),
        }
    }

    /// Template options for a document with the given base name.
    pub fn template_options(&self, title: &str) -> TemplateOptions {
        TemplateOptions {
            lang: self.lang.clone(),
            title: Some(title.to_string()),
        }
    }
}

/// Builder for [`BatchConfig`].
#[derive(Debug)]
pub struct BatchConfigBuilder {
    config: BatchConfig,
}

impl BatchConfigBuilder {
    pub fn input_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.input_dir = dir.into();
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    /// Replace the recognised extensions. Leading dots are stripped and
    /// matching is case-insensitive, so `".MD"` and `"md"` are equivalent.
    pub fn extensions<I, S>(mut self, exts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.config.extensions = exts
            .into_iter()
            .map(|e| e.as_ref().trim().trim_start_matches('.').to_lowercase())
            .collect();
        self
    }

    pub fn engine_kind(mut self, kind: EngineKind) -> Self {
        self.config.engine_kind = Some(kind);
        self
    }

    pub fn engine_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.config.engine_program = Some(program.into());
        self
    }

    pub fn engine(mut self, engine: Arc<dyn PdfEngine>) -> Self {
        self.config.engine = Some(engine);
        self
    }

    pub fn lang(mut self, lang: impl Into<String>) -> Self {
        self.config.lang = lang.into();
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n.max(1);
        self
    }

    pub fn document_timeout_secs(mut self, secs: u64) -> Self {
        self.config.document_timeout_secs = Some(secs);
        self
    }

    pub fn collision_policy(mut self, policy: CollisionPolicy) -> Self {
        self.config.collision_policy = policy;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<BatchConfig, Md2PdfError> {
        let c = &self.config;
        if c.extensions.is_empty() || c.extensions.iter().any(|e| e.is_empty()) {
            return Err(Md2PdfError::InvalidConfig(
                "At least one non-empty Markdown extension is required".into(),
            ));
        }
        if c.extensions.iter().any(|e| e.contains(['/', '\\'])) {
            return Err(Md2PdfError::InvalidConfig(format!(
                "Extensions must not contain path separators, got {:?}",
                c.extensions
            )));
        }
        if c.concurrency == 0 {
            return Err(Md2PdfError::InvalidConfig("Concurrency must be ≥ 1".into()));
        }
        if c.document_timeout_secs == Some(0) {
            return Err(Md2PdfError::InvalidConfig(
                "Document timeout must be ≥ 1 second".into(),
            ));
        }
        if c.lang.trim().is_empty() {
            return Err(Md2PdfError::InvalidConfig("Language tag must not be empty".into()));
        }
        if c.input_dir == c.output_dir {
            return Err(Md2PdfError::InvalidConfig(format!(
                "Input and output directories must differ, both are '{}'",
                c.input_dir.display()
            )));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// External HTML-to-PDF engine driven through stdin/stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    /// WeasyPrint: honours `@page` margins and `page-break-inside`. (default)
    #[default]
    WeasyPrint,
    /// wkhtmltopdf: Qt WebKit; page margins are passed on the command line.
    Wkhtmltopdf,
}

impl EngineKind {
    /// Executable looked up on `PATH` when no explicit program is set.
    pub fn default_program(&self) -> &'static str {
        match self {
            EngineKind::WeasyPrint => "weasyprint",
            EngineKind::Wkhtmltopdf => "wkhtmltopdf",
        }
    }

    /// Parse an engine name as accepted by `MD2PDF_ENGINE`.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "weasyprint" | "weasy" => Some(EngineKind::WeasyPrint),
            "wkhtmltopdf" | "wkhtml" => Some(EngineKind::Wkhtmltopdf),
            _ => None,
        }
    }
}

/// Resolution of two sources that share a base name (`a.md`, `a.markdown`).
///
/// Sources are planned in file-name order; the first claimant always keeps
/// `<base>.pdf`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollisionPolicy {
    /// Later claimants are reported as failed and not converted. (default)
    #[default]
    Reject,
    /// Later claimants keep their extension: `a.md` → `a.md.pdf` when
    /// `a.markdown` already owns `a.pdf`.
    Disambiguate,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_fixed_layout() {
        let c = BatchConfig::default();
        assert_eq!(c.input_dir, PathBuf::from("input"));
        assert_eq!(c.output_dir, PathBuf::from("output"));
        assert_eq!(c.extensions, vec!["md", "markdown"]);
        assert_eq!(c.concurrency, 1);
        assert_eq!(c.lang, "pt-BR");
        assert!(c.document_timeout_secs.is_none());
        assert_eq!(c.collision_policy, CollisionPolicy::Reject);
    }

    #[test]
    fn extensions_are_normalised() {
        let c = BatchConfig::builder()
            .extensions([".MD", " Markdown ", "mdown"])
            .build()
            .unwrap();
        assert_eq!(c.extensions, vec!["md", "markdown", "mdown"]);
    }

    #[test]
    fn empty_extensions_rejected() {
        let empty: [&str; 0] = [];
        assert!(BatchConfig::builder().extensions(empty).build().is_err());
        assert!(BatchConfig::builder().extensions(["."]).build().is_err());
    }

    #[test]
    fn same_input_and_output_rejected() {
        let err = BatchConfig::builder()
            .input_dir("docs")
            .output_dir("docs")
            .build()
            .unwrap_err();
        assert!(matches!(err, Md2PdfError::InvalidConfig(_)));
    }

    #[test]
    fn zero_timeout_rejected() {
        assert!(BatchConfig::builder().document_timeout_secs(0).build().is_err());
    }

    #[test]
    fn concurrency_clamped_to_one() {
        let c = BatchConfig::builder().concurrency(0).build().unwrap();
        assert_eq!(c.concurrency, 1);
    }

    #[test]
    fn engine_kind_parse() {
        assert_eq!(EngineKind::parse("WeasyPrint"), Some(EngineKind::WeasyPrint));
        assert_eq!(EngineKind::parse("wkhtmltopdf"), Some(EngineKind::Wkhtmltopdf));
        assert_eq!(EngineKind::parse("latex"), None);
    }

    #[test]
    fn enums_serialise_lowercase() {
        assert_eq!(
            serde_json::to_string(&EngineKind::WeasyPrint).unwrap(),
            "\"weasyprint\""
        );
        assert_eq!(
            serde_json::to_string(&CollisionPolicy::Disambiguate).unwrap(),
            "\"disambiguate\""
        );
    }

    #[test]
    fn template_options_carry_lang_and_title() {
        let c = BatchConfig::builder().lang("en").build().unwrap();
        let t = c.template_options("report");
        assert_eq!(t.lang, "en");
        assert_eq!(t.title.as_deref(), Some("report"));
    }
}
