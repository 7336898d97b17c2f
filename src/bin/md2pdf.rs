//! CLI binary for edgequake-md2pdf.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `BatchConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_md2pdf::{
    convert_file, plan, run_batch, BatchConfig, BatchProgressCallback, CollisionPolicy,
    EngineKind, ProgressCallback,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a live progress bar plus one log line per
/// document. Works when documents overlap (`--concurrency > 1`).
struct CliProgressCallback {
    bar: ProgressBar,
    /// Per-document wall-clock start times, keyed by file name.
    start_times: Mutex<HashMap<String, Instant>>,
    /// Documents reported through `on_document_error`.
    errors: AtomicUsize,
}

impl CliProgressCallback {
    /// Spinner until `on_batch_start` tells us how many documents there are.
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Scanning input directory…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self::with_bar(bar))
    }

    fn with_bar(bar: ProgressBar) -> Self {
        Self {
            bar,
            start_times: Mutex::new(HashMap::new()),
            errors: AtomicUsize::new(0),
        }
    }

    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} documents  \
             ⏱ {elapsed_precise}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Converting");
        self.bar.reset_eta();
    }

    fn elapsed_secs(&self, file: &str) -> f64 {
        self.start_times
            .lock()
            .unwrap()
            .remove(file)
            .map(|t| t.elapsed().as_millis() as f64 / 1000.0)
            .unwrap_or(0.0)
    }
}

impl BatchProgressCallback for CliProgressCallback {
    fn on_batch_start(&self, total_documents: usize) {
        self.activate_bar(total_documents);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Converting {total_documents} Markdown file(s)…"))
        ));
    }

    fn on_document_start(&self, file: &str, _index: usize, _total: usize) {
        self.start_times
            .lock()
            .unwrap()
            .insert(file.to_string(), Instant::now());
        self.bar.set_message(file.to_string());
    }

    fn on_document_complete(&self, file: &str, output: &Path, pdf_bytes: usize) {
        let secs = self.elapsed_secs(file);
        self.bar.println(format!(
            "  {} {:<32}  →  {}  {}  {}",
            green("✓"),
            file,
            output.display(),
            dim(&format!("{:>8} bytes", pdf_bytes)),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_document_error(&self, file: &str, error: &str) {
        let secs = self.elapsed_secs(file);
        self.errors.fetch_add(1, Ordering::SeqCst);

        // Truncate very long engine output to keep the log tidy.
        let msg = if error.chars().count() > 100 {
            let head: String = error.chars().take(99).collect();
            format!("{head}\u{2026}")
        } else {
            error.to_string()
        };

        self.bar.println(format!(
            "  {} {}  {}",
            red("✗"),
            red(&msg),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_batch_complete(&self, total_documents: usize, success_count: usize) {
        self.bar.finish_and_clear();
        eprintln!("{}", self.summary(total_documents, success_count));
    }
}

impl CliProgressCallback {
    /// Closing line; the failure count is what the error events reported.
    fn summary(&self, total_documents: usize, success_count: usize) -> String {
        let failed = self.errors.load(Ordering::SeqCst);
        if failed == 0 {
            format!(
                "{} {} document(s) converted successfully",
                green("✔"),
                bold(&success_count.to_string())
            )
        } else {
            format!(
                "{} {}/{} documents converted  ({} failed)",
                if failed >= total_documents {
                    red("✘")
                } else {
                    cyan("⚠")
                },
                bold(&success_count.to_string()),
                total_documents,
                red(&failed.to_string()),
            )
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Convert input/*.md into output/*.pdf
  md2pdf

  # Other directories, four documents at a time
  md2pdf -i docs -o build/pdf -c 4

  # Use wkhtmltopdf from a custom location
  md2pdf --engine wkhtmltopdf --engine-path /opt/wk/bin/wkhtmltopdf

  # Show what would be converted, without running an engine
  md2pdf --dry-run

  # Keep both a.md and a.markdown (a.md becomes a.md.pdf)
  md2pdf --on-collision disambiguate

  # Convert one file
  md2pdf --file notes/today.md -o build

  # Machine-readable report
  md2pdf --json > report.json

ENGINES:
  Engine        Page margins          Keeps tables together
  ───────────   ───────────────────   ─────────────────────
  weasyprint    @page (2.5cm)         ✓  (default)
  wkhtmltopdf   -T/-B/-L/-R 25mm      partial

ENVIRONMENT VARIABLES:
  MD2PDF_INPUT         Input directory (default: input)
  MD2PDF_OUTPUT        Output directory (default: output)
  MD2PDF_ENGINE        weasyprint | wkhtmltopdf
  MD2PDF_ENGINE_PATH   Path to the engine executable
  MD2PDF_CONCURRENCY   Documents converted at once (default: 1)
  MD2PDF_TIMEOUT       Per-document deadline in seconds
  RUST_LOG             Log filter, overrides -v / -q

EXIT STATUS:
  0  every Markdown file produced a PDF (also when there were none)
  1  at least one document failed, or the batch could not start
"#;

/// Batch-convert Markdown files into print-styled PDFs.
#[derive(Parser, Debug)]
#[command(
    name = "md2pdf",
    version,
    about = "Batch-convert Markdown files into print-styled PDFs",
    long_about = "Convert every Markdown file in a directory into a PDF with a fixed print \
stylesheet (2.5cm margins, justified text, tables kept on one page). Markdown is rendered \
to HTML in-process; the PDF is produced by an external engine such as WeasyPrint.",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Directory containing the Markdown files.
    #[arg(short, long, env = "MD2PDF_INPUT", default_value = "input")]
    input: PathBuf,

    /// Directory receiving the PDFs (created if missing).
    #[arg(short, long, env = "MD2PDF_OUTPUT", default_value = "output")]
    output: PathBuf,

    /// Convert this single file into the output directory instead of a batch.
    #[arg(long, env = "MD2PDF_FILE", conflicts_with = "dry_run")]
    file: Option<PathBuf>,

    /// Recognised Markdown extension (repeatable). Default: md, markdown.
    #[arg(long = "ext", env = "MD2PDF_EXTENSIONS", value_delimiter = ',')]
    extensions: Vec<String>,

    /// HTML-to-PDF engine.
    #[arg(long, env = "MD2PDF_ENGINE", value_enum)]
    engine: Option<EngineArg>,

    /// Path to the engine executable.
    #[arg(long, env = "MD2PDF_ENGINE_PATH")]
    engine_path: Option<PathBuf>,

    /// `lang` attribute of the generated HTML documents.
    #[arg(long, env = "MD2PDF_LANG", default_value = "pt-BR")]
    lang: String,

    /// Number of documents converted at the same time.
    #[arg(short, long, env = "MD2PDF_CONCURRENCY", default_value_t = 1,
          value_parser = clap::value_parser!(u16).range(1..=256))]
    concurrency: u16,

    /// Per-document deadline in seconds (read, convert and render).
    #[arg(long, env = "MD2PDF_TIMEOUT",
          value_parser = clap::value_parser!(u64).range(1..))]
    timeout: Option<u64>,

    /// What to do when two files share a base name.
    #[arg(long, env = "MD2PDF_ON_COLLISION", value_enum, default_value = "reject")]
    on_collision: CollisionArg,

    /// Print the conversion plan and exit without running an engine.
    #[arg(long)]
    dry_run: bool,

    /// Print the batch report as JSON on stdout.
    #[arg(long, env = "MD2PDF_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "MD2PDF_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "MD2PDF_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "MD2PDF_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum EngineArg {
    Weasyprint,
    Wkhtmltopdf,
}

impl From<EngineArg> for EngineKind {
    fn from(v: EngineArg) -> Self {
        match v {
            EngineArg::Weasyprint => EngineKind::WeasyPrint,
            EngineArg::Wkhtmltopdf => EngineKind::Wkhtmltopdf,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum CollisionArg {
    Reject,
    Disambiguate,
}

impl From<CollisionArg> for CollisionPolicy {
    fn from(v: CollisionArg) -> Self {
        match v {
            CollisionArg::Reject => CollisionPolicy::Reject,
            CollisionArg::Disambiguate => CollisionPolicy::Disambiguate,
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the progress bar is active;
    // the bar prints one line per document already.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && !cli.dry_run;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        let cb = CliProgressCallback::new_dynamic();
        Some(cb as Arc<dyn BatchProgressCallback>)
    } else {
        None
    };

    let config = build_config(&cli, progress_cb)?;

    // ── Dry run ──────────────────────────────────────────────────────────
    if cli.dry_run {
        let planned = plan(&config).await.context("Failed to plan conversion")?;
        if planned.is_empty() && !cli.quiet {
            eprintln!("No Markdown files in {}", config.input_dir.display());
        }
        for doc in &planned {
            match doc.claimed_by {
                None => println!("{}  →  {}", doc.file, doc.output.display()),
                Some(ref owner) => println!(
                    "{}  {}",
                    doc.file,
                    red(&format!("✗ {} already produced by {owner}", doc.output.display()))
                ),
            }
        }
        let clashes = planned.iter().filter(|d| d.claimed_by.is_some()).count();
        return Ok(if clashes == 0 {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        });
    }

    // ── Single file ──────────────────────────────────────────────────────
    if let Some(ref source) = cli.file {
        return convert_single(&cli, source, &config).await;
    }

    // ── Run batch ────────────────────────────────────────────────────────
    let report = run_batch(&config).await.context("Conversion failed")?;

    if cli.json {
        let json = serde_json::to_string_pretty(&report).context("Failed to serialise report")?;
        println!("{json}");
    } else if !cli.quiet && !show_progress {
        // The progress callback already printed its own summary.
        eprintln!(
            "{}  {}/{} documents  {}ms  →  {}",
            if report.is_success() {
                green("✔")
            } else {
                cyan("⚠")
            },
            report.stats.converted,
            report.stats.total_documents,
            report.stats.total_duration_ms,
            bold(&report.output_dir.display().to_string()),
        );
        for failure in report.failures() {
            eprintln!("   {} {}", red("✗"), failure);
        }
    } else if !cli.quiet && report.stats.converted > 0 {
        eprintln!(
            "   {} of PDF  —  {}ms total",
            dim(&format!("{} bytes", report.stats.total_pdf_bytes)),
            report.stats.total_duration_ms,
        );
    }

    Ok(if report.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// `--file`: one document into the output directory.
async fn convert_single(cli: &Cli, source: &Path, config: &BatchConfig) -> Result<ExitCode> {
    let base = source
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .with_context(|| format!("Not a file path: {}", source.display()))?;
    let dest = config.output_dir.join(format!("{base}.pdf"));

    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_start(1);
    }
    let result = convert_file(source, &dest, config)
        .await
        .context("Conversion failed")?;
    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_complete(1, usize::from(result.is_success()));
    }

    if cli.json {
        let json = serde_json::to_string_pretty(&result).context("Failed to serialise result")?;
        println!("{json}");
    } else if !cli.quiet && config.progress_callback.is_none() {
        match result.error {
            None => eprintln!("{}  {}", green("✔"), bold(&dest.display().to_string())),
            Some(ref e) => eprintln!("{} {}", red("✗"), e),
        }
    }

    Ok(if result.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Map CLI args to `BatchConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<BatchConfig> {
    let mut builder = BatchConfig::builder()
        .input_dir(&cli.input)
        .output_dir(&cli.output)
        .lang(&cli.lang)
        .concurrency(usize::from(cli.concurrency))
        .collision_policy(cli.on_collision.into());

    if !cli.extensions.is_empty() {
        builder = builder.extensions(&cli.extensions);
    }
    if let Some(engine) = cli.engine {
        builder = builder.engine_kind(engine.into());
    }
    if let Some(ref path) = cli.engine_path {
        builder = builder.engine_program(path);
    }
    if let Some(secs) = cli.timeout {
        builder = builder.document_timeout_secs(secs);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn callback() -> CliProgressCallback {
        CliProgressCallback::with_bar(ProgressBar::hidden())
    }

    #[test]
    fn summary_counts_reported_errors() {
        let cb = callback();
        cb.on_batch_start(3);
        for file in ["a.md", "b.md", "c.md"] {
            cb.on_document_start(file, 1, 3);
        }
        cb.on_document_complete("a.md", Path::new("output/a.pdf"), 1024);
        cb.on_document_error("b.md", "b.md: read error: permission denied");
        cb.on_document_error("c.md", "c.md: render error: engine exited");

        let line = cb.summary(3, 1);
        assert!(line.contains("/3 documents converted"), "got: {line}");
        assert!(line.contains(&format!("({} failed)", red("2"))), "got: {line}");
        assert!(line.starts_with(&cyan("⚠")));
    }

    #[test]
    fn summary_without_errors() {
        let cb = callback();
        cb.on_batch_start(2);
        cb.on_document_complete("a.md", Path::new("output/a.pdf"), 10);
        cb.on_document_complete("b.md", Path::new("output/b.pdf"), 10);

        let line = cb.summary(2, 2);
        assert!(line.contains("converted successfully"), "got: {line}");
        assert!(!line.contains("failed"));
    }

    #[test]
    fn every_document_failing_is_marked() {
        let cb = callback();
        cb.on_document_error("a.md", "boom");
        assert!(cb.summary(1, 0).starts_with(&red("✘")));
    }
}
