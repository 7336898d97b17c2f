//! Discovery: turn the input directory into an ordered conversion plan.
//!
//! Directory listings come back in filesystem order, which differs between
//! platforms and even between runs on some filesystems. Candidates are
//! sorted by file name so the plan, the collision winner and the report
//! order are stable.
//!
//! Output names are assigned here, before any conversion starts, so that
//! with `concurrency > 1` no two tasks ever write the same destination.
//! Names are compared case-folded: `Notes.pdf` and `notes.pdf` are one file
//! on macOS and Windows.

use crate::config::{BatchConfig, CollisionPolicy};
use crate::error::{DocumentError, Md2PdfError};
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// One eligible Markdown file and where its PDF goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedDocument {
    /// Full path of the source file.
    pub source: PathBuf,
    /// Source file name, e.g. `Notes.MD`.
    pub file: String,
    /// File name without the recognised extension, e.g. `Notes`.
    pub base_name: String,
    /// Destination PDF path.
    pub output: PathBuf,
    /// Earlier source that already owns `output`, if any.
    pub claimed_by: Option<String>,
}

impl PlannedDocument {
    /// The collision error for this document, if it lost its output name.
    pub fn collision_error(&self) -> Option<DocumentError> {
        self.claimed_by
            .as_ref()
            .map(|owner| DocumentError::OutputCollision {
                file: self.file.clone(),
                output: self.output.display().to_string(),
                claimed_by: owner.clone(),
            })
    }
}

/// Split `file_name` into its base name if it ends with `.` + one of
/// `extensions` (case-insensitive). Longer extensions are tried first.
///
/// Returns None when nothing matches or when the base name would be empty
/// (a file literally named `.md`).
pub fn match_extension<'a>(file_name: &'a str, extensions: &[String]) -> Option<&'a str> {
    let mut exts: Vec<&String> = extensions.iter().collect();
    exts.sort_by_key(|e| std::cmp::Reverse(e.len()));

    for ext in exts {
        let suffix_len = ext.len() + 1;
        if file_name.len() <= suffix_len {
            continue;
        }
        let split = file_name.len() - suffix_len;
        if !file_name.is_char_boundary(split) {
            continue;
        }
        let (base, suffix) = file_name.split_at(split);
        if suffix.starts_with('.') && suffix[1..].to_lowercase() == ext.to_lowercase() {
            return Some(base);
        }
    }
    None
}

/// Build the conversion plan for `config.input_dir`.
///
/// # Errors
/// Fatal only: the input directory is missing, is not a directory, or cannot
/// be listed. Individual unreadable files are planned normally and fail later
/// with a per-document read error.
pub async fn plan(config: &BatchConfig) -> Result<Vec<PlannedDocument>, Md2PdfError> {
    let input_dir = &config.input_dir;

    match tokio::fs::metadata(input_dir).await {
        Ok(meta) if !meta.is_dir() => {
            return Err(Md2PdfError::NotADirectory {
                path: input_dir.clone(),
            })
        }
        Ok(_) => {}
        Err(e) => return Err(read_dir_error(input_dir, e)),
    }

    let mut entries = tokio::fs::read_dir(input_dir)
        .await
        .map_err(|e| read_dir_error(input_dir, e))?;

    let mut candidates: Vec<(String, String, PathBuf)> = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| read_dir_error(input_dir, e))?
    {
        let path = entry.path();
        let file = match entry.file_name().into_string() {
            Ok(name) => name,
            Err(raw) => {
                warn!("Skipping entry with non-UTF-8 name: {:?}", raw);
                continue;
            }
        };

        let Some(base) = match_extension(&file, &config.extensions) else {
            debug!("Skipping non-Markdown entry: {}", file);
            continue;
        };

        // Follows symlinks. Entries whose metadata cannot be read stay in the
        // plan so the read step reports them.
        if let Ok(meta) = tokio::fs::metadata(&path).await {
            if meta.is_dir() {
                debug!("Skipping directory with Markdown-like name: {}", file);
                continue;
            }
        }

        candidates.push((file.clone(), base.to_string(), path));
    }

    candidates.sort_by(|a, b| a.0.cmp(&b.0));

    let planned = assign_outputs(candidates, &config.output_dir, config.collision_policy);
    info!(
        "Found {} Markdown file(s) in {}",
        planned.len(),
        input_dir.display()
    );
    Ok(planned)
}

/// Give every candidate a destination, resolving shared base names.
fn assign_outputs(
    candidates: Vec<(String, String, PathBuf)>,
    output_dir: &Path,
    policy: CollisionPolicy,
) -> Vec<PlannedDocument> {
    // Keyed by the case-folded PDF file name; every output shares `output_dir`.
    let mut owners: HashMap<String, String> = HashMap::new();
    let mut planned = Vec::with_capacity(candidates.len());

    for (file, base_name, source) in candidates {
        let primary = format!("{base_name}.pdf");

        let (name, claimed_by) = match owners.get(&fold(&primary)) {
            None => (primary, None),
            Some(owner) => match policy {
                CollisionPolicy::Reject => (primary, Some(owner.clone())),
                CollisionPolicy::Disambiguate => {
                    let alternate = format!("{file}.pdf");
                    let alt_owner = owners.get(&fold(&alternate)).cloned();
                    (alternate, alt_owner)
                }
            },
        };
        let output = output_dir.join(&name);

        match claimed_by {
            Some(ref owner) => warn!(
                "{} maps to {} which {} already produces",
                file,
                output.display(),
                owner
            ),
            None => {
                owners.insert(fold(&name), file.clone());
            }
        }

        planned.push(PlannedDocument {
            source,
            file,
            base_name,
            output,
            claimed_by,
        });
    }

    planned
}

fn fold(name: &str) -> String {
    name.to_lowercase()
}

fn read_dir_error(path: &Path, e: std::io::Error) -> Md2PdfError {
    match e.kind() {
        ErrorKind::NotFound => Md2PdfError::InputNotFound {
            path: path.to_path_buf(),
        },
        ErrorKind::PermissionDenied => Md2PdfError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => Md2PdfError::ReadDirFailed {
            path: path.to_path_buf(),
            source: e,
        },
    }
}
