//! Progress-callback trait for per-title archival events.
//!
//! Inject an [`Arc<dyn ArchiveProgressCallback>`] via
//! [`crate::config::ArchiveConfigBuilder::progress_callback`] to receive
//! events as the batch walks its titles. The library itself only logs
//! through `tracing`; anything user-facing (a terminal bar, a report file)
//! hangs off this trait.
//!
//! # Example
//!
//! ```rust
//! use wikiarchive::{ArchiveConfig, ArchiveProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct SkipCounter {
//!     skipped: AtomicUsize,
//! }
//!
//! impl ArchiveProgressCallback for SkipCounter {
//!     fn on_title_skipped(&self, title: &str, _raw_source: &std::path::Path) {
//!         self.skipped.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("{title} already archived");
//!     }
//! }
//!
//! let config = ArchiveConfig::builder()
//!     .progress_callback(Arc::new(SkipCounter { skipped: AtomicUsize::new(0) }))
//!     .build()
//!     .unwrap();
//! ```

use crate::output::BatchSummary;
use std::path::Path;
use std::sync::Arc;

/// Called by the orchestrator as it processes each title.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Titles are processed one at a time, so calls never
/// overlap, but the trait is `Send + Sync` so the callback can be shared
/// with other threads of the host application.
pub trait ArchiveProgressCallback: Send + Sync {
    /// Called once before the first title.
    fn on_batch_start(&self, total_titles: usize) {
        let _ = total_titles;
    }

    /// Called before a title's job is resolved.
    ///
    /// # Arguments
    /// * `index`: 1-indexed position in the batch
    fn on_title_start(&self, index: usize, total_titles: usize, title: &str) {
        let _ = (index, total_titles, title);
    }

    /// Called when a title is already archived and nothing runs for it.
    fn on_title_skipped(&self, title: &str, raw_source: &Path) {
        let _ = (title, raw_source);
    }

    /// Called after an image file has been written.
    fn on_image_saved(&self, title: &str, filename: &str) {
        let _ = (title, filename);
    }

    /// Called when one image failed; the title continues.
    fn on_image_failed(&self, title: &str, error: &str) {
        let _ = (title, error);
    }

    /// Called when the final document has been normalised and written.
    fn on_title_complete(&self, title: &str, final_document: &Path) {
        let _ = (title, final_document);
    }

    /// Called when a title failed; the batch continues.
    fn on_title_error(&self, title: &str, error: &str) {
        let _ = (title, error);
    }

    /// Called once after every title has been attempted.
    fn on_batch_complete(&self, summary: &BatchSummary) {
        let _ = summary;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ArchiveProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ArchiveConfig`].
pub type ProgressCallback = Arc<dyn ArchiveProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct TrackingCallback {
        starts: AtomicUsize,
        skips: AtomicUsize,
        images: AtomicUsize,
        errors: AtomicUsize,
    }

    impl ArchiveProgressCallback for TrackingCallback {
        fn on_title_start(&self, _index: usize, _total: usize, _title: &str) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }

        fn on_title_skipped(&self, _title: &str, _raw_source: &Path) {
            self.skips.fetch_add(1, Ordering::SeqCst);
        }

        fn on_image_saved(&self, _title: &str, _filename: &str) {
            self.images.fetch_add(1, Ordering::SeqCst);
        }

        fn on_title_error(&self, _title: &str, _error: &str) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_batch_start(2);
        cb.on_title_start(1, 2, "Foo");
        cb.on_title_skipped("Foo", Path::new("Foo/Foo.mwk"));
        cb.on_image_saved("Foo", "a.png");
        cb.on_image_failed("Foo", "timeout");
        cb.on_title_complete("Foo", Path::new("Foo/Foo.html"));
        cb.on_title_error("Bar", "no <pre>");
        cb.on_batch_complete(&BatchSummary::default());
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback::default();
        tracker.on_title_start(1, 2, "A");
        tracker.on_title_skipped("A", Path::new("A/A.mwk"));
        tracker.on_title_start(2, 2, "B");
        tracker.on_image_saved("B", "x.png");
        tracker.on_image_saved("B", "y.png");
        tracker.on_title_error("B", "conversion failed");

        assert_eq!(tracker.starts.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.skips.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.images.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.errors.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: ProgressCallback = Arc::new(NoopProgressCallback);
        cb.on_batch_start(10);
        cb.on_title_start(1, 10, "Anonymizer");
    }
}
