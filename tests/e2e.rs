//! End-to-end tests for edgequake-md2pdf against a real PDF engine.
//!
//! These tests spawn WeasyPrint (or wkhtmltopdf) and therefore need it on
//! `PATH`. They are gated behind the `E2E_ENABLED` environment variable so
//! they do not run in CI unless explicitly requested.
//!
//! Run with:
//!   E2E_ENABLED=1 cargo test --test e2e -- --nocapture
//!
//! To try wkhtmltopdf instead:
//!   E2E_ENABLED=1 E2E_ENGINE=wkhtmltopdf cargo test --test e2e -- --nocapture

use edgequake_md2pdf::{
    convert_file, run_batch, BatchConfig, CommandEngine, DocumentError, EngineKind, PdfEngine,
};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

// ── Test helpers ─────────────────────────────────────────────────────────────

const SAMPLE: &str = r#"# Relatório trimestral

Texto com "aspas" e reticências... e travessões -- assim --- e mais.

| Item   | Quantidade |
|--------|-----------:|
| Canetas | 12 |
| Cadernos | 3 |

```rust
fn main() {
    println!("<body> stays escaped in code");
}
```

Uma nota de rodapé[^1].

[^1]: Fonte interna.
"#;

/// Skip this test unless E2E_ENABLED is set and the engine can be found.
macro_rules! e2e_skip_unless_ready {
    () => {{
        if std::env::var("E2E_ENABLED").is_err() {
            println!("SKIP — set E2E_ENABLED=1 to run e2e tests");
            return;
        }
        let kind = std::env::var("E2E_ENGINE")
            .ok()
            .and_then(|n| EngineKind::parse(&n))
            .unwrap_or_default();
        let probe = std::process::Command::new(kind.default_program())
            .arg("--version")
            .output();
        if probe.is_err() {
            println!("SKIP — engine not found: {}", kind.default_program());
            return;
        }
        kind
    }};
}

fn assert_pdf(path: &Path, context: &str) {
    let bytes = std::fs::read(path).unwrap_or_else(|e| panic!("[{context}] read: {e}"));
    assert!(bytes.starts_with(b"%PDF"), "[{context}] not a PDF");
    assert!(
        bytes.len() > 1000,
        "[{context}] PDF suspiciously small: {} bytes",
        bytes.len()
    );
    println!("[{context}] ✓  {} bytes", bytes.len());
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_batch_with_real_engine() {
    let kind = e2e_skip_unless_ready!();

    let dir = TempDir::new().unwrap();
    let input = dir.path().join("input");
    std::fs::create_dir_all(&input).unwrap();
    std::fs::write(input.join("relatorio.md"), SAMPLE).unwrap();
    std::fs::write(input.join("latin1.md"), b"caf\xe9\n").unwrap();

    let config = BatchConfig::builder()
        .input_dir(&input)
        .output_dir(dir.path().join("output"))
        .engine_kind(kind)
        .build()
        .unwrap();

    let report = run_batch(&config).await.expect("batch should start");
    println!("{}", serde_json::to_string_pretty(&report.stats).unwrap());

    assert_eq!(report.stats.total_documents, 2);
    assert_eq!(report.stats.converted, 1);
    assert!(matches!(
        report.documents[0].error,
        Some(DocumentError::Read { .. })
    ));
    assert_pdf(&dir.path().join("output/relatorio.pdf"), "batch");
    assert!(!dir.path().join("output/latin1.pdf").exists());
}

#[tokio::test]
async fn test_convert_single_file() {
    let kind = e2e_skip_unless_ready!();

    let dir = TempDir::new().unwrap();
    let src = dir.path().join("single.md");
    std::fs::write(&src, SAMPLE).unwrap();
    let dest = dir.path().join("out/nested/single.pdf");

    let config = BatchConfig::builder()
        .input_dir(dir.path())
        .output_dir(dir.path().join("out"))
        .engine_kind(kind)
        .build()
        .unwrap();

    let result = convert_file(&src, &dest, &config).await.unwrap();
    assert!(result.is_success(), "{:?}", result.error);
    assert_pdf(&dest, "single");
}

#[tokio::test]
async fn test_engine_directly() {
    let kind = e2e_skip_unless_ready!();

    let engine: Arc<dyn PdfEngine> = Arc::new(CommandEngine::new(kind));
    let html = edgequake_md2pdf::markdown_to_html(SAMPLE, &Default::default()).unwrap();
    let pdf = engine.render(&html).await.expect("engine should render");
    assert!(pdf.starts_with(b"%PDF"));
}

#[tokio::test]
async fn test_missing_engine_is_per_document_error() {
    let _ = e2e_skip_unless_ready!();

    let dir = TempDir::new().unwrap();
    let input = dir.path().join("input");
    std::fs::create_dir_all(&input).unwrap();
    std::fs::write(input.join("a.md"), "# a\n").unwrap();

    let config = BatchConfig::builder()
        .input_dir(&input)
        .output_dir(dir.path().join("output"))
        .engine_program("md2pdf-no-such-engine")
        .build()
        .unwrap();

    let report = run_batch(&config).await.unwrap();
    match report.documents[0].error {
        Some(DocumentError::Render { ref detail, .. }) => {
            assert!(detail.contains("not found"), "got: {detail}")
        }
        ref other => panic!("unexpected: {other:?}"),
    }
}
