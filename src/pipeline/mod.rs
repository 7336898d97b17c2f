//! Pipeline stages for Markdown-to-PDF conversion.
//!
//! Each submodule implements exactly one transformation step.
//! Keeping stages separate makes each independently testable and lets us
//! swap implementations (e.g. switch the PDF engine) without touching
//! other stages.
//!
//! ## Data Flow
//!
//! ```text
//! discover ──▶ source ──▶ markdown ──▶ render ──▶ write
//!  (plan)      (UTF-8)    (HTML doc)   (engine)   (atomic)
//! ```
//!
//! 1. [`discover`] — list the input directory, keep Markdown files, assign
//!    each one its output path and detect base-name collisions
//! 2. [`source`]   — read one file as UTF-8 text
//! 3. [`markdown`] — render the fixed extension set to an HTML fragment and
//!    embed it in the print template
//! 4. [`render`]   — hand the HTML to the external engine, get PDF bytes
//! 5. [`write`]    — temp file + rename so a destination is either the old
//!    file, the new file, or absent; never half-written

pub mod discover;
pub mod markdown;
pub mod render;
pub mod source;
pub mod write;
