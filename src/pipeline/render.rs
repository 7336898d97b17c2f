//! PDF rendering: hand the composed HTML to an external engine.
//!
//! ## Why an external process?
//!
//! Laying out HTML with CSS paged media (margins, `page-break-inside`,
//! table layout, font shaping) is a browser-engine-sized problem. The
//! pipeline treats it as a black box behind [`PdfEngine`]; the default
//! [`CommandEngine`] pipes the document into WeasyPrint or wkhtmltopdf on
//! stdin and collects the PDF from stdout, so no temporary HTML file is
//! ever written.
//!
//! The child is spawned with `kill_on_drop`, so when a per-document
//! deadline fires and the future is dropped the engine process dies with it.

use crate::config::{BatchConfig, EngineKind};
use crate::error::{Md2PdfError, RenderError};
use futures::future::BoxFuture;
use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

/// Environment variable consulted when the config names no engine.
pub const ENGINE_ENV_VAR: &str = "MD2PDF_ENGINE";

/// Longest stderr excerpt kept in an error message.
const MAX_STDERR_CHARS: usize = 2000;

/// Turns a complete HTML document into PDF bytes.
///
/// Implementations must be `Send + Sync`; with `concurrency > 1` one engine
/// instance serves several documents at once.
pub trait PdfEngine: Send + Sync {
    /// Short name for logs, e.g. `weasyprint`.
    fn name(&self) -> &str;

    /// Render `html` and return the PDF bytes.
    fn render<'a>(&'a self, html: &'a str) -> BoxFuture<'a, Result<Vec<u8>, RenderError>>;
}

/// A [`PdfEngine`] that runs a stdin → stdout command.
#[derive(Debug, Clone)]
pub struct CommandEngine {
    name: String,
    program: PathBuf,
    args: Vec<OsString>,
}

impl CommandEngine {
    /// Engine of the given kind using its default program name.
    pub fn new(kind: EngineKind) -> Self {
        Self::for_kind(kind, None, None)
    }

    /// Engine of the given kind.
    ///
    /// * `program`  — executable to run instead of the default name
    /// * `base_dir` — directory relative links (images, stylesheets) resolve
    ///   against; only WeasyPrint can use it for stdin input
    pub fn for_kind(kind: EngineKind, program: Option<&Path>, base_dir: Option<&Path>) -> Self {
        let program = program
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(kind.default_program()));

        let mut args: Vec<OsString> = Vec::new();
        match kind {
            EngineKind::WeasyPrint => {
                args.extend(["--quiet", "--encoding", "utf-8"].map(OsString::from));
                if let Some(dir) = base_dir {
                    let dir = std::fs::canonicalize(dir).unwrap_or_else(|_| dir.to_path_buf());
                    args.push("--base-url".into());
                    args.push(dir.into_os_string());
                }
            }
            EngineKind::Wkhtmltopdf => {
                // wkhtmltopdf ignores @page, so the 2.5cm margin goes on the
                // command line.
                args.extend(
                    [
                        "--quiet", "--encoding", "utf-8", "-T", "25mm", "-B", "25mm", "-L",
                        "25mm", "-R", "25mm",
                    ]
                    .map(OsString::from),
                );
            }
        }
        args.push("-".into());
        args.push("-".into());

        Self {
            name: kind.default_program().to_string(),
            program,
            args,
        }
    }

    /// Any command that reads HTML on stdin and writes a PDF to stdout.
    pub fn custom<I, S>(program: impl Into<PathBuf>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        let program = program.into();
        let name = program
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| program.display().to_string());
        Self {
            name,
            program,
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn args(&self) -> &[OsString] {
        &self.args
    }

    async fn run(&self, html: &str) -> Result<Vec<u8>, RenderError> {
        let program = self.program.display().to_string();
        debug!("Spawning {} {:?}", program, self.args);

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => RenderError::EngineNotFound {
                    program: program.clone(),
                },
                _ => RenderError::Io {
                    program: program.clone(),
                    source: e,
                },
            })?;

        let mut stdin = child.stdin.take().ok_or_else(|| RenderError::Io {
            program: program.clone(),
            source: std::io::Error::other("engine stdin was not captured"),
        })?;

        // Feed stdin while stdout/stderr drain; a large document would
        // otherwise deadlock on full pipes.
        let feed = async move {
            let written = stdin.write_all(html.as_bytes()).await;
            drop(stdin);
            written
        };
        let (fed, output) = tokio::join!(feed, child.wait_with_output());

        let output = output.map_err(|e| RenderError::Io {
            program: program.clone(),
            source: e,
        })?;

        if !output.status.success() {
            return Err(RenderError::EngineFailed {
                program,
                status: output.status.to_string(),
                stderr: summarise_stderr(&output.stderr),
            });
        }
        fed.map_err(|e| RenderError::Io {
            program: program.clone(),
            source: e,
        })?;

        check_pdf(&program, &output.stdout)?;
        debug!("{} produced {} bytes", program, output.stdout.len());
        Ok(output.stdout)
    }
}

impl PdfEngine for CommandEngine {
    fn name(&self) -> &str {
        &self.name
    }

    fn render<'a>(&'a self, html: &'a str) -> BoxFuture<'a, Result<Vec<u8>, RenderError>> {
        Box::pin(self.run(html))
    }
}

/// Verify the engine returned something that starts like a PDF.
pub fn check_pdf(program: &str, bytes: &[u8]) -> Result<(), RenderError> {
    if bytes.is_empty() {
        return Err(RenderError::EmptyOutput {
            program: program.to_string(),
        });
    }
    if !bytes.starts_with(b"%PDF") {
        return Err(RenderError::NotAPdf {
            program: program.to_string(),
            magic: bytes.iter().take(4).copied().collect(),
        });
    }
    Ok(())
}

/// Keep the tail of stderr, where engines print the actual failure.
fn summarise_stderr(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let text = text.trim();
    if text.is_empty() {
        return "(no stderr output)".to_string();
    }
    let count = text.chars().count();
    if count <= MAX_STDERR_CHARS {
        return text.to_string();
    }
    let tail: String = text.chars().skip(count - MAX_STDERR_CHARS).collect();
    format!("\u{2026}{tail}")
}

/// Resolve the engine, from most-specific to least-specific.
///
/// 1. **Pre-built engine** (`config.engine`) — used as-is; tests and library
///    users plug in their own renderers here.
/// 2. **Engine kind** (`config.engine_kind`) with the optional program path.
/// 3. **Environment** (`MD2PDF_ENGINE`) — `weasyprint` or `wkhtmltopdf`.
/// 4. **WeasyPrint**, which implements the CSS paged-media rules the
///    stylesheet relies on.
///
/// Relative links resolve against the input directory.
pub fn resolve_engine(config: &BatchConfig) -> Result<Arc<dyn PdfEngine>, Md2PdfError> {
    resolve_engine_for(config, &config.input_dir)
}

/// Like [`resolve_engine`], with relative links resolving against `base_dir`.
pub fn resolve_engine_for(
    config: &BatchConfig,
    base_dir: &Path,
) -> Result<Arc<dyn PdfEngine>, Md2PdfError> {
    if let Some(ref engine) = config.engine {
        return Ok(Arc::clone(engine));
    }
    let engine = command_engine(config, base_dir)?;
    debug!("Using PDF engine {} ({})", engine.name(), engine.program().display());
    Ok(Arc::new(engine))
}

fn command_engine(config: &BatchConfig, base_dir: &Path) -> Result<CommandEngine, Md2PdfError> {
    let kind = match config.engine_kind {
        Some(kind) => kind,
        None => match std::env::var(ENGINE_ENV_VAR) {
            Ok(name) if !name.trim().is_empty() => EngineKind::parse(&name).ok_or_else(|| {
                Md2PdfError::InvalidConfig(format!(
                    "{ENGINE_ENV_VAR}='{name}' is not a known engine (weasyprint, wkhtmltopdf)"
                ))
            })?,
            _ => EngineKind::default(),
        },
    };

    Ok(CommandEngine::for_kind(
        kind,
        config.engine_program.as_deref(),
        Some(base_dir),
    ))
}
