//! Job resolution: derive a title's directory and artefact paths.
//!
//! Every path is a pure function of the title and the archive root, so
//! re-deriving a job always lands on the same files. That is what makes the
//! skip check meaningful across runs.

use crate::config::SkipPolicy;
use crate::error::ArchiveError;
use crate::pipeline::filename::sanitize_filename;
use crate::pipeline::normalize::MARKER_ATTR;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Raw wiki markup.
pub const RAW_SOURCE_EXT: &str = "mwk";
/// Markdown intermediate.
pub const INTERMEDIATE_EXT: &str = "md";
/// Normalised standalone document.
pub const FINAL_DOCUMENT_EXT: &str = "html";

/// Paths for one title. Immutable once derived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveJob {
    pub title: String,
    pub basename: String,
    pub directory: PathBuf,
    pub raw_source_path: PathBuf,
    pub intermediate_path: PathBuf,
    pub final_document_path: PathBuf,
}

impl ArchiveJob {
    /// Derive the job without touching the filesystem.
    pub fn derive(title: &str, root: &Path) -> Self {
        let basename = sanitize_filename(title);
        let directory = root.join(&basename);
        let file = |ext: &str| directory.join(format!("{basename}.{ext}"));
        Self {
            title: title.to_string(),
            raw_source_path: file(RAW_SOURCE_EXT),
            intermediate_path: file(INTERMEDIATE_EXT),
            final_document_path: file(FINAL_DOCUMENT_EXT),
            basename,
            directory,
        }
    }

    /// Whether the completion marker for `policy` is present right now.
    pub async fn is_done(&self, policy: SkipPolicy) -> bool {
        if !self.raw_source_path.exists() {
            return false;
        }
        match policy {
            SkipPolicy::RawSource => true,
            SkipPolicy::FinalDocument => tokio::fs::read_to_string(&self.final_document_path)
                .await
                .map(|doc| doc.contains(MARKER_ATTR))
                .unwrap_or(false),
        }
    }
}

/// A derived job plus the skip decision taken when it was resolved.
#[derive(Debug, Clone)]
pub struct ResolvedJob {
    pub job: ArchiveJob,
    pub already_done: bool,
}

/// Derive the job, create its directory if absent, and check completion.
///
/// The only side effect is directory creation; no file is written.
pub async fn resolve_job(
    title: &str,
    root: &Path,
    policy: SkipPolicy,
) -> Result<ResolvedJob, ArchiveError> {
    let job = ArchiveJob::derive(title, root);
    tokio::fs::create_dir_all(&job.directory)
        .await
        .map_err(|e| ArchiveError::fs(&job.directory, e))?;
    let already_done = job.is_done(policy).await;
    debug!(
        "Resolved '{}' → {} (done: {})",
        title,
        job.directory.display(),
        already_done
    );
    Ok(ResolvedJob { job, already_done })
}
