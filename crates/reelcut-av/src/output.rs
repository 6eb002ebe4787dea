//! Output path planning and final placement.
//!
//! [`resolve`] computes an [`OutputPlan`] once per operation: where the
//! result should land, where the transcode should write, and whether the two
//! differ because input and output are the same file. Existence checks happen
//! at plan time only -- the race between planning and the subprocess write is
//! accepted, and a write failure is an operation failure.

use std::path::{Path, PathBuf};

use reelcut_core::{Error, Result};

/// Where an operation's output goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPlan {
    /// The path the caller will receive on success.
    pub final_path: PathBuf,
    /// The path the subprocess writes to. Equals `final_path` unless an
    /// atomic replace is required.
    pub staging_path: PathBuf,
    /// True when the requested output is the input file itself: the result is
    /// staged next to it and swapped into place after the transcode.
    pub requires_atomic_replace: bool,
}

impl OutputPlan {
    /// The path passes should write to.
    pub fn write_target(&self) -> &Path {
        &self.staging_path
    }
}

/// Compute the output plan for an operation.
///
/// - `None` requested: synthesize a timestamp/PID-suffixed name from the
///   input's stem inside `scratch_dir`.
/// - Requested path resolves to the input file itself: stage to a sibling
///   temp file with the same extension and mark the plan for atomic replace.
/// - Requested path already exists (and is not the input): append a
///   `" (n)"` counter before the extension, incrementing until free.
pub fn resolve(
    requested: Option<&Path>,
    default_ext: &str,
    input: &Path,
    scratch_dir: &Path,
) -> Result<OutputPlan> {
    match requested {
        None => {
            let stem = input
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| "output".to_string());
            let stamp = chrono::Local::now().format("%Y%m%d-%H%M%S");
            let pid = std::process::id();
            let mut path = scratch_dir.join(format!("{stem}_{stamp}_{pid}.{default_ext}"));
            if path.exists() {
                path = next_free(&path);
            }
            Ok(OutputPlan {
                final_path: path.clone(),
                staging_path: path,
                requires_atomic_replace: false,
            })
        }
        Some(req) => {
            if is_same_file(req, input) {
                let staging = staging_sibling(req);
                Ok(OutputPlan {
                    final_path: req.to_path_buf(),
                    staging_path: staging,
                    requires_atomic_replace: true,
                })
            } else if req.exists() {
                let free = next_free(req);
                Ok(OutputPlan {
                    final_path: free.clone(),
                    staging_path: free,
                    requires_atomic_replace: false,
                })
            } else {
                Ok(OutputPlan {
                    final_path: req.to_path_buf(),
                    staging_path: req.to_path_buf(),
                    requires_atomic_replace: false,
                })
            }
        }
    }
}

/// Perform the atomic replace for plans that need one: delete the original,
/// then move the staged file into its place.
///
/// A failure here is a [`Error::Finalize`], distinct from a transcode
/// failure: the encoded data exists but could not be moved into place.
pub fn apply(plan: &OutputPlan) -> Result<PathBuf> {
    if !plan.requires_atomic_replace {
        return Ok(plan.final_path.clone());
    }

    if !plan.staging_path.exists() {
        return Err(Error::finalize(format!(
            "staged output does not exist: {}",
            plan.staging_path.display()
        )));
    }

    if plan.final_path.exists() {
        std::fs::remove_file(&plan.final_path).map_err(|e| {
            Error::finalize(format!(
                "failed to remove original {}: {e}",
                plan.final_path.display()
            ))
        })?;
    }

    // Try rename first (same filesystem), fall back to copy+remove.
    if std::fs::rename(&plan.staging_path, &plan.final_path).is_err() {
        std::fs::copy(&plan.staging_path, &plan.final_path).map_err(|e| {
            Error::finalize(format!(
                "failed to move staged output into place: {e}"
            ))
        })?;
        let _ = std::fs::remove_file(&plan.staging_path);
    }

    Ok(plan.final_path.clone())
}

/// Two paths count as the same file if they are textually equal or
/// canonicalize to the same location.
fn is_same_file(a: &Path, b: &Path) -> bool {
    if a == b {
        return true;
    }
    match (std::fs::canonicalize(a), std::fs::canonicalize(b)) {
        (Ok(ca), Ok(cb)) => ca == cb,
        _ => false,
    }
}

/// Sibling staging path for a same-file replace, keeping the extension so the
/// container format is unchanged.
fn staging_sibling(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    let ext = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    let pid = std::process::id();

    let mut candidate = parent.join(format!("{stem}_staging_{pid}{ext}"));
    let mut n = 1;
    while candidate.exists() {
        candidate = parent.join(format!("{stem}_staging_{pid}_{n}{ext}"));
        n += 1;
    }
    candidate
}

/// First `"name (n).ext"` variant that does not exist yet.
fn next_free(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    let ext = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    let parent = path.parent().unwrap_or_else(|| Path::new("."));

    let mut n = 1;
    loop {
        let candidate = parent.join(format!("{stem} ({n}){ext}"));
        if !candidate.exists() {
            return candidate;
        }
        n += 1;
    }
}
