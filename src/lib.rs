//! # wikiarchive
//!
//! Archive wiki pages for offline use: raw markup, every referenced image,
//! and a standalone, styled HTML document per page title.
//!
//! ## Pipeline Overview
//!
//! ```text
//! title
//!  │
//!  ├─ 1. Job        title → ./{basename}/{basename}.{mwk,md,html}; skip if done
//!  ├─ 2. Sources    rendered page + raw export through the browser session
//!  ├─ 3. Images     every .png/.jpg/.gif the page shows, saved next to it
//!  ├─ 4. Convert    pandoc: mediawiki → markdown, mediawiki → html
//!  └─ 5. Normalize  html skeleton, stylesheet, heading, no captions
//! ```
//!
//! Titles run one at a time over a single browser session, so a login
//! completed once carries over to the whole batch.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use wikiarchive::{archive_with_chrome, ArchiveConfig, ChromeConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ArchiveConfig::builder().root_dir("archive").build()?;
//!     let titles = vec!["Software:Petrel Plugins".to_string()];
//!     let summary = archive_with_chrome(&titles, &ChromeConfig::default(), &config).await?;
//!     eprintln!(
//!         "{} archived, {} skipped, {} failed",
//!         summary.archived, summary.skipped, summary.failed
//!     );
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `wikiarchive` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! wikiarchive = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod archive;
pub mod config;
pub mod converter;
pub mod error;
pub mod html;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod session;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use archive::{archive_batch, archive_title, archive_with_chrome, archive_with_http};
pub use config::{
    ArchiveConfig, ArchiveConfigBuilder, ChromeConfig, HttpSessionConfig, SkipPolicy,
};
pub use converter::{Converter, ConverterInvocation, OutputFormat, PandocConverter};
pub use error::{ArchiveError, ErrorKind, ImageError, SessionError};
pub use output::{BatchSummary, TitleOutcome, TitleStatus};
pub use pipeline::filename::sanitize_filename;
pub use pipeline::input::resolve_titles;
pub use progress::{ArchiveProgressCallback, NoopProgressCallback, ProgressCallback};
pub use session::{BrowserSession, ChromeSession, HttpSession};
