//! Artifact writing: publish a PDF at its destination in one step.
//!
//! The bytes go to a temporary file next to the destination, are flushed to
//! disk and then renamed over the destination. Readers see either the old
//! file or the complete new one. If anything fails, the `NamedTempFile` is
//! dropped and removes itself, so an aborted write leaves nothing behind.

use std::io::Write;
use std::path::{Path, PathBuf};

const TEMP_PREFIX: &str = ".md2pdf-";
const TEMP_SUFFIX: &str = ".tmp";

/// Atomically write `bytes` to `dest` without blocking the runtime.
pub async fn write_artifact(dest: &Path, bytes: Vec<u8>) -> std::io::Result<()> {
    let dest: PathBuf = dest.to_path_buf();
    tokio::task::spawn_blocking(move || write_artifact_blocking(&dest, &bytes))
        .await
        .map_err(|e| std::io::Error::other(format!("write task failed: {e}")))?
}

/// Blocking implementation of [`write_artifact`].
pub fn write_artifact_blocking(dest: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let parent = match dest.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let mut tmp = tempfile::Builder::new()
        .prefix(TEMP_PREFIX)
        .suffix(TEMP_SUFFIX)
        .tempfile_in(parent)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(dest).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn leftovers(dir: &Path) -> Vec<String> {
        std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .filter(|n| n.starts_with(TEMP_PREFIX))
            .collect()
    }

    #[tokio::test]
    async fn writes_and_overwrites() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("a.pdf");

        write_artifact(&dest, b"%PDF-old".to_vec()).await.unwrap();
        write_artifact(&dest, b"%PDF-new".to_vec()).await.unwrap();

        assert_eq!(std::fs::read(&dest).unwrap(), b"%PDF-new");
        assert!(leftovers(dir.path()).is_empty());
    }

    #[test]
    fn missing_parent_fails() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("no-such-dir").join("a.pdf");
        let result = tokio_test::block_on(write_artifact(&dest, b"%PDF".to_vec()));
        tokio_test::assert_err!(result);
        assert!(!dest.exists());
    }

    #[test]
    fn failed_persist_removes_temp_file() {
        let dir = TempDir::new().unwrap();
        // A directory at the destination makes the rename fail.
        let dest = dir.path().join("taken.pdf");
        std::fs::create_dir(&dest).unwrap();
        std::fs::write(dest.join("keep"), "x").unwrap();

        tokio_test::assert_err!(write_artifact_blocking(&dest, b"%PDF"));
        assert!(leftovers(dir.path()).is_empty());
        assert!(dest.is_dir());
    }
}
