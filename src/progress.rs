//! Progress-callback trait for per-document batch events.
//!
//! Inject an [`Arc<dyn BatchProgressCallback>`] via
//! [`crate::config::BatchConfigBuilder::progress_callback`] to receive
//! events as the batch driver works through the input directory.
//!
//! # Example
//!
//! ```rust
//! use edgequake_md2pdf::{BatchProgressCallback, BatchConfig};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     completed: Arc<AtomicUsize>,
//! }
//!
//! impl BatchProgressCallback for CountingCallback {
//!     fn on_document_complete(&self, file: &str, output: &std::path::Path, pdf_bytes: usize) {
//!         self.completed.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("{} → {} ({} bytes)", file, output.display(), pdf_bytes);
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback {
//!     completed: Arc::new(AtomicUsize::new(0)),
//! });
//!
//! let config = BatchConfig::builder()
//!     .progress_callback(counter as Arc<dyn BatchProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::path::Path;
use std::sync::Arc;

/// Called by the batch driver as it processes each document.
///
/// Implementations must be `Send + Sync`: with `concurrency > 1` the
/// per-document methods may be called from different tasks at once. All
/// methods have default no-op implementations so callers only override what
/// they care about.
pub trait BatchProgressCallback: Send + Sync {
    /// Called once after discovery, before any document is read.
    ///
    /// # Arguments
    /// * `total_documents` — number of eligible Markdown files
    fn on_batch_start(&self, total_documents: usize) {
        let _ = total_documents;
    }

    /// Called just before a document is read.
    ///
    /// # Arguments
    /// * `file`  — source file name
    /// * `index` — 1-based position in the plan
    /// * `total` — total eligible documents
    fn on_document_start(&self, file: &str, index: usize, total: usize) {
        let _ = (file, index, total);
    }

    /// Called when a document's PDF has been written.
    ///
    /// # Arguments
    /// * `file`      — source file name
    /// * `output`    — path of the written PDF
    /// * `pdf_bytes` — size of the PDF in bytes
    fn on_document_complete(&self, file: &str, output: &Path, pdf_bytes: usize) {
        let _ = (file, output, pdf_bytes);
    }

    /// Called when a document fails at any stage.
    ///
    /// # Arguments
    /// * `file`  — source file name
    /// * `error` — human-readable error description
    fn on_document_error(&self, file: &str, error: &str) {
        let _ = (file, error);
    }

    /// Called once after every document has been attempted.
    ///
    /// # Arguments
    /// * `total_documents` — eligible documents in the batch
    /// * `success_count`   — documents that produced a PDF
    fn on_batch_complete(&self, total_documents: usize, success_count: usize) {
        let _ = (total_documents, success_count);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl BatchProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::BatchConfig`].
pub type ProgressCallback = Arc<dyn BatchProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct TrackingCallback {
        started_total: AtomicUsize,
        starts: AtomicUsize,
        completes: AtomicUsize,
        errors: Mutex<Vec<String>>,
        completed_total: AtomicUsize,
    }

    impl BatchProgressCallback for TrackingCallback {
        fn on_batch_start(&self, total_documents: usize) {
            self.started_total.store(total_documents, Ordering::SeqCst);
        }

        fn on_document_start(&self, _file: &str, _index: usize, _total: usize) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }

        fn on_document_complete(&self, _file: &str, _output: &Path, _pdf_bytes: usize) {
            self.completes.fetch_add(1, Ordering::SeqCst);
        }

        fn on_document_error(&self, file: &str, _error: &str) {
            self.errors.lock().unwrap().push(file.to_string());
        }

        fn on_batch_complete(&self, _total_documents: usize, success_count: usize) {
            self.completed_total.store(success_count, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_batch_start(2);
        cb.on_document_start("a.md", 1, 2);
        cb.on_document_complete("a.md", Path::new("output/a.pdf"), 1024);
        cb.on_document_error("b.md", "some error");
        cb.on_batch_complete(2, 1);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback::default();

        tracker.on_batch_start(3);
        assert_eq!(tracker.started_total.load(Ordering::SeqCst), 3);

        tracker.on_document_start("a.md", 1, 3);
        tracker.on_document_complete("a.md", Path::new("out/a.pdf"), 100);
        tracker.on_document_start("b.md", 2, 3);
        tracker.on_document_complete("b.md", Path::new("out/b.pdf"), 200);
        tracker.on_document_start("c.md", 3, 3);
        tracker.on_document_error("c.md", "engine crashed");

        assert_eq!(tracker.starts.load(Ordering::SeqCst), 3);
        assert_eq!(tracker.completes.load(Ordering::SeqCst), 2);
        assert_eq!(*tracker.errors.lock().unwrap(), vec!["c.md".to_string()]);

        tracker.on_batch_complete(3, 2);
        assert_eq!(tracker.completed_total.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: ProgressCallback = Arc::new(NoopProgressCallback);
        cb.on_batch_start(10);
        cb.on_document_start("x.md", 1, 10);
    }
}
