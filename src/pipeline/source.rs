//! Source reading: load one Markdown file as UTF-8 text.

use crate::error::DocumentError;
use std::io::ErrorKind;
use std::path::Path;
use tracing::debug;

const UTF8_BOM: char = '\u{FEFF}';

/// Read the whole file and decode it as UTF-8.
///
/// A leading byte-order mark is dropped; editors on Windows like to add one
/// and it would otherwise show up as an invisible first character.
pub async fn read_source(path: &Path, file: &str) -> Result<String, DocumentError> {
    let bytes = tokio::fs::read(path).await.map_err(|e| DocumentError::Read {
        file: file.to_string(),
        detail: describe_io_error(&e),
    })?;

    let text = String::from_utf8(bytes).map_err(|e| DocumentError::Read {
        file: file.to_string(),
        detail: format!(
            "not valid UTF-8 (first invalid byte at offset {})",
            e.utf8_error().valid_up_to()
        ),
    })?;

    debug!("Read {} ({} bytes)", file, text.len());
    Ok(strip_bom(text))
}

fn strip_bom(text: String) -> String {
    match text.strip_prefix(UTF8_BOM) {
        Some(rest) => rest.to_string(),
        None => text,
    }
}

fn describe_io_error(e: &std::io::Error) -> String {
    match e.kind() {
        ErrorKind::NotFound => "file not found".to_string(),
        ErrorKind::PermissionDenied => "permission denied".to_string(),
        _ => e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn reads_utf8_and_strips_bom() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bom.md");
        std::fs::write(&path, "\u{FEFF}# Olá\n").unwrap();

        let text = read_source(&path, "bom.md").await.unwrap();
        assert_eq!(text, "# Olá\n");
    }

    #[tokio::test]
    async fn invalid_utf8_is_read_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("latin1.md");
        std::fs::write(&path, b"# caf\xe9\n").unwrap();

        let err = read_source(&path, "latin1.md").await.unwrap_err();
        match err {
            DocumentError::Read { file, detail } => {
                assert_eq!(file, "latin1.md");
                assert!(detail.contains("UTF-8"), "got: {detail}");
                assert!(detail.contains("offset 5"), "got: {detail}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn missing_file_is_read_error() {
        let err = read_source(Path::new("/definitely/not/here.md"), "here.md")
            .await
            .unwrap_err();
        assert!(matches!(err, DocumentError::Read { .. }));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn bom_only_in_front() {
        assert_eq!(strip_bom("a\u{FEFF}b".to_string()), "a\u{FEFF}b");
        assert_eq!(strip_bom("\u{FEFF}".to_string()), "");
    }
}
