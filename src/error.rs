//! Error types for the wikiarchive library.
//!
//! Three error types reflect three distinct failure scopes:
//!
//! * [`ArchiveError`]: **Fatal to one title**: the raw source could not be
//!   retrieved, the converter produced nothing, or the filesystem refused a
//!   write. The orchestrator catches it at the title boundary and records it
//!   in [`crate::output::TitleOutcome`]; the batch continues. Raised before
//!   the batch loop (bad config, unreadable title list, browser launch) it is
//!   fatal to the whole run.
//!
//! * [`ImageError`]: **Non-fatal**: a single image could not be fetched or
//!   written. Stored in the title's outcome; the title carries on.
//!
//! * [`SessionError`]: raised by a [`crate::session::BrowserSession`]
//!   implementation. The pipeline maps it into one of the two types above
//!   depending on which stage hit it.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the wikiarchive library.
#[derive(Debug, Error)]
pub enum ArchiveError {
    // ── Retrieval errors ──────────────────────────────────────────────────
    /// The page or its raw export could not be retrieved through the session.
    #[error("Failed to retrieve '{url}': {detail}")]
    Retrieval { url: String, detail: String },

    // ── Conversion errors ─────────────────────────────────────────────────
    /// The converter ran but its output file does not exist afterwards.
    #[error("Conversion produced no output. Command was:\n  {command}")]
    ConversionFailed { command: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Directory or file creation / write failed.
    #[error("Filesystem error on '{path}': {source}")]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The title list file could not be read.
    #[error("Failed to read title list '{path}': {source}")]
    TitleList {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Session errors ────────────────────────────────────────────────────
    /// The browser session could not be started or shut down.
    #[error("Browser session error: {0}")]
    Session(String),

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ArchiveError {
    /// Shorthand for wrapping an `io::Error` with the path it concerns.
    pub fn fs(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ArchiveError::Filesystem {
            path: path.into(),
            source,
        }
    }

    /// The taxonomy bucket this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ArchiveError::Retrieval { .. } => ErrorKind::Retrieval,
            ArchiveError::ConversionFailed { .. } => ErrorKind::ConversionFailed,
            ArchiveError::Filesystem { .. } | ArchiveError::TitleList { .. } => {
                ErrorKind::Filesystem
            }
            ArchiveError::Session(_) => ErrorKind::Session,
            ArchiveError::InvalidConfig(_) => ErrorKind::Config,
            ArchiveError::Internal(_) => ErrorKind::Internal,
        }
    }
}

/// Serialisable error category, used in per-title results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    Retrieval,
    ImageFetch,
    ConversionFailed,
    Filesystem,
    Session,
    Config,
    Internal,
}

/// A non-fatal error for a single image.
///
/// Stored in [`crate::output::TitleOutcome::image_errors`]. Every variant is
/// an [`ErrorKind::ImageFetch`] failure; `reason` tells them apart.
#[derive(Debug, Clone, Error, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum ImageError {
    /// Navigating to the image URL failed.
    #[error("{url}: navigation failed: {detail}")]
    Navigation { url: String, detail: String },

    /// The page loaded but no image element could be read back.
    #[error("{url}: image not rendered: {detail}")]
    NotRendered { url: String, detail: String },

    /// The image never reported a loaded state.
    #[error("{url}: image did not finish loading within {ms}ms")]
    Timeout { url: String, ms: u64 },

    /// The captured pixels could not be encoded into the file's format.
    #[error("{url}: could not encode as {filename}: {detail}")]
    Transcode {
        url: String,
        filename: String,
        detail: String,
    },

    /// Writing the image file failed.
    #[error("{url}: failed to write {path}: {detail}")]
    Write {
        url: String,
        path: String,
        detail: String,
    },
}

impl ImageError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::ImageFetch
    }

    pub fn url(&self) -> &str {
        match self {
            ImageError::Navigation { url, .. }
            | ImageError::NotRendered { url, .. }
            | ImageError::Timeout { url, .. }
            | ImageError::Transcode { url, .. }
            | ImageError::Write { url, .. } => url,
        }
    }
}

/// Errors surfaced by a browser-session collaborator.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("navigation to '{url}' failed: {detail}")]
    Navigation { url: String, detail: String },

    /// The current document has no element matching `selector`.
    #[error("no <{selector}> element on the current page")]
    ElementMissing { selector: String },

    #[error("browser protocol error: {0}")]
    Protocol(String),

    #[error("failed to start browser session: {0}")]
    Launch(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversion_failed_shows_command() {
        let e = ArchiveError::ConversionFailed {
            command: "pandoc -f mediawiki -t html -o a.html a.mwk".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("pandoc -f mediawiki"), "got: {msg}");
        assert_eq!(e.kind(), ErrorKind::ConversionFailed);
    }

    #[test]
    fn filesystem_kind_covers_title_list() {
        let e = ArchiveError::TitleList {
            path: "titles.txt".into(),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert_eq!(e.kind(), ErrorKind::Filesystem);
        assert!(e.to_string().contains("titles.txt"));
    }

    #[test]
    fn image_error_url_accessor() {
        let e = ImageError::Timeout {
            url: "https://x/img.png".into(),
            ms: 250,
        };
        assert_eq!(e.url(), "https://x/img.png");
        assert_eq!(e.kind(), ErrorKind::ImageFetch);
        assert!(e.to_string().contains("250ms"));
    }

    #[test]
    fn error_kind_serialises_screaming() {
        let json = serde_json::to_string(&ErrorKind::ImageFetch).unwrap();
        assert_eq!(json, "\"IMAGE_FETCH\"");
    }

    #[test]
    fn element_missing_display() {
        let e = SessionError::ElementMissing {
            selector: "pre".into(),
        };
        assert_eq!(e.to_string(), "no <pre> element on the current page");
    }
}
