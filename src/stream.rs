//! Streaming batch API: emit document results as they complete.
//!
//! ## Why stream?
//!
//! A directory of long documents can take minutes. A stream-based API lets
//! callers report each PDF the moment it is written, wire up progress bars,
//! or stop early by dropping the stream; documents not yet started are then
//! never attempted.
//!
//! Unlike the eager [`crate::convert::run_batch`] which returns only after
//! every document finishes, [`batch_stream`] yields [`DocumentResult`] items
//! as they are ready. Results always arrive in plan order (sorted by file
//! name), also with `concurrency > 1`.

use crate::config::BatchConfig;
use crate::convert::{prepare, process_document};
use crate::error::Md2PdfError;
use crate::output::DocumentResult;
use futures::stream::{self, StreamExt};
use std::pin::Pin;
use std::sync::Arc;
use tokio_stream::Stream;

/// A boxed stream of document results.
pub type DocumentStream = Pin<Box<dyn Stream<Item = DocumentResult> + Send>>;

/// Plan the batch and return a stream that converts it.
///
/// Fatal checks (input directory, output directory, engine) run before this
/// returns; the stream itself never fails, each item carries its own
/// outcome. `on_batch_start` fires here, `on_batch_complete` is left to the
/// caller since only the caller knows when it stops consuming.
///
/// # Example
/// ```rust,no_run
/// use edgequake_md2pdf::{batch_stream, BatchConfig};
/// use futures::StreamExt;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = BatchConfig::default();
/// let mut results = batch_stream(&config).await?;
/// while let Some(doc) = results.next().await {
///     match doc.error {
///         None => println!("{} → {}", doc.file, doc.output.display()),
///         Some(e) => eprintln!("{e}"),
///     }
/// }
/// # Ok(())
/// # }
/// ```
pub async fn batch_stream(config: &BatchConfig) -> Result<DocumentStream, Md2PdfError> {
    let (engine, planned) = prepare(config).await?;
    let total = planned.len();

    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_start(total);
    }

    let concurrency = config.concurrency.max(1);
    let config = Arc::new(config.clone());

    let s = stream::iter(planned.into_iter().enumerate().map(move |(i, doc)| {
        let engine = Arc::clone(&engine);
        let cfg = Arc::clone(&config);
        async move { process_document(engine.as_ref(), doc, i + 1, total, &cfg).await }
    }))
    .buffered(concurrency);

    Ok(Box::pin(s))
}
