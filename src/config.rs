//! Configuration types for wiki page archival.
//!
//! All archival behaviour is controlled through [`ArchiveConfig`], built via
//! its [`ArchiveConfigBuilder`]. Browser-session settings live in
//! [`ChromeConfig`] and [`HttpSessionConfig`] because they are consumed once,
//! when the session is acquired, not per title.

use crate::error::ArchiveError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use url::Url;

pub const DEFAULT_WIKI_BASE_URL: &str = "https://wiki.equinor.com";
pub const DEFAULT_HEADING_PREFIX: &str = "Equinor Internal Plugin Documentation";
pub const DEFAULT_STYLESHEET_URL: &str = "https://cdn.eds.equinor.com/font/equinor-font.css";
pub const DEFAULT_INLINE_STYLE: &str = "body { font-family: 'Equinor', Arial, sans-serif; }";

/// Configuration for an archival batch.
///
/// Built via [`ArchiveConfig::builder()`] or using
/// [`ArchiveConfig::default()`].
///
/// # Example
/// ```rust
/// use wikiarchive::ArchiveConfig;
///
/// let config = ArchiveConfig::builder()
///     .root_dir("archive")
///     .wiki_base_url("https://wiki.example.org")
///     .image_timeout_ms(5_000)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ArchiveConfig {
    /// Directory under which one sub-directory per title is created. Default: `.`.
    pub root_dir: PathBuf,

    /// Scheme and host of the wiki. Page and raw-export URLs are built from it.
    /// Default: `https://wiki.equinor.com`.
    pub wiki_base_url: String,

    /// Text before the colon in the injected `<h1>`.
    pub heading_prefix: String,

    /// `href` of the injected `<link rel="stylesheet">`.
    pub stylesheet_url: String,

    /// Body of the injected `<style>` element.
    pub inline_style: String,

    /// Converter executable. Default: `pandoc` (resolved through `PATH`).
    pub pandoc_path: PathBuf,

    /// Also produce the Markdown intermediate. Default: true.
    pub produce_markdown: bool,

    /// Upper bound for an image to report itself loaded. Default: 10 000 ms.
    pub image_timeout_ms: u64,

    /// How often the loaded state is polled. Default: 100 ms.
    pub image_poll_ms: u64,

    /// Which artefact marks a title as done. Default: [`SkipPolicy::RawSource`].
    pub skip_policy: SkipPolicy,

    /// Keep the raw-source file when a later stage fails. Default: false.
    ///
    /// With the default, a failed title leaves no raw-source file behind and
    /// is picked up again by the next run.
    pub keep_source_on_failure: bool,

    /// Receives per-title and per-image events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            root_dir: PathBuf::from("."),
            wiki_base_url: DEFAULT_WIKI_BASE_URL.to_string(),
            heading_prefix: DEFAULT_HEADING_PREFIX.to_string(),
            stylesheet_url: DEFAULT_STYLESHEET_URL.to_string(),
            inline_style: DEFAULT_INLINE_STYLE.to_string(),
            pandoc_path: PathBuf::from("pandoc"),
            produce_markdown: true,
            image_timeout_ms: 10_000,
            image_poll_ms: 100,
            skip_policy: SkipPolicy::default(),
            keep_source_on_failure: false,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ArchiveConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArchiveConfig")
            .field("root_dir", &self.root_dir)
            .field("wiki_base_url", &self.wiki_base_url)
            .field("heading_prefix", &self.heading_prefix)
            .field("stylesheet_url", &self.stylesheet_url)
            .field("pandoc_path", &self.pandoc_path)
            .field("produce_markdown", &self.produce_markdown)
            .field("image_timeout_ms", &self.image_timeout_ms)
            .field("image_poll_ms", &self.image_poll_ms)
            .field("skip_policy", &self.skip_policy)
            .field("keep_source_on_failure", &self.keep_source_on_failure)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn ArchiveProgressCallback>"),
            )
            .finish()
    }
}

impl ArchiveConfig {
    /// Create a new builder for `ArchiveConfig`.
    pub fn builder() -> ArchiveConfigBuilder {
        ArchiveConfigBuilder {
            config: Self::default(),
        }
    }

    /// The wiki base URL, parsed. Validated by the builder.
    pub fn base_url(&self) -> Result<Url, ArchiveError> {
        parse_base_url(&self.wiki_base_url)
    }
}

fn parse_base_url(raw: &str) -> Result<Url, ArchiveError> {
    let url = Url::parse(raw)
        .map_err(|e| ArchiveError::InvalidConfig(format!("wiki base URL '{raw}': {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ArchiveError::InvalidConfig(format!(
            "wiki base URL must be http or https, got '{other}'"
        ))),
    }
}

/// Builder for [`ArchiveConfig`].
#[derive(Debug)]
pub struct ArchiveConfigBuilder {
    config: ArchiveConfig,
}

impl ArchiveConfigBuilder {
    pub fn root_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.root_dir = dir.into();
        self
    }

    pub fn wiki_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.wiki_base_url = url.into();
        self
    }

    pub fn heading_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.heading_prefix = prefix.into();
        self
    }

    pub fn stylesheet_url(mut self, url: impl Into<String>) -> Self {
        self.config.stylesheet_url = url.into();
        self
    }

    pub fn inline_style(mut self, css: impl Into<String>) -> Self {
        self.config.inline_style = css.into();
        self
    }

    pub fn pandoc_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pandoc_path = path.into();
        self
    }

    pub fn produce_markdown(mut self, v: bool) -> Self {
        self.config.produce_markdown = v;
        self
    }

    pub fn image_timeout_ms(mut self, ms: u64) -> Self {
        self.config.image_timeout_ms = ms;
        self
    }

    pub fn image_poll_ms(mut self, ms: u64) -> Self {
        self.config.image_poll_ms = ms;
        self
    }

    pub fn skip_policy(mut self, policy: SkipPolicy) -> Self {
        self.config.skip_policy = policy;
        self
    }

    pub fn keep_source_on_failure(mut self, v: bool) -> Self {
        self.config.keep_source_on_failure = v;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ArchiveConfig, ArchiveError> {
        let c = &self.config;
        parse_base_url(&c.wiki_base_url)?;
        if c.image_timeout_ms < 100 {
            return Err(ArchiveError::InvalidConfig(format!(
                "image timeout must be ≥ 100ms, got {}",
                c.image_timeout_ms
            )));
        }
        if c.image_poll_ms < 10 || c.image_poll_ms > c.image_timeout_ms {
            return Err(ArchiveError::InvalidConfig(format!(
                "image poll interval must be 10ms–{}ms, got {}",
                c.image_timeout_ms, c.image_poll_ms
            )));
        }
        if c.pandoc_path.as_os_str().is_empty() {
            return Err(ArchiveError::InvalidConfig(
                "converter path must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Which artefact decides that a title is already archived.
///
/// | Policy | Done when |
/// |--------|-----------|
/// | `RawSource` | `{basename}.mwk` exists (default) |
/// | `FinalDocument` | `{basename}.mwk` exists **and** `{basename}.html` exists and was normalised |
///
/// Operators refresh a title by deleting its raw-source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SkipPolicy {
    #[default]
    RawSource,
    FinalDocument,
}

// ── Session configs ──────────────────────────────────────────────────────

/// Settings for [`crate::session::ChromeSession`].
#[derive(Debug, Clone)]
pub struct ChromeConfig {
    /// Run without a window. Default: false, so that federated logins can
    /// be completed by hand in the opened browser.
    pub headless: bool,

    /// Chrome/Chromium executable. None → auto-detect.
    pub chrome_path: Option<PathBuf>,

    /// Browser user-data directory holding the profile to reuse.
    pub user_data_dir: Option<PathBuf>,

    /// Profile inside the user-data directory. Default: `Default`.
    pub profile_directory: Option<String>,

    /// Per-navigation timeout. Default: 60 s.
    pub navigation_timeout_secs: u64,
}

impl Default for ChromeConfig {
    fn default() -> Self {
        Self {
            headless: false,
            chrome_path: None,
            user_data_dir: None,
            profile_directory: Some("Default".to_string()),
            navigation_timeout_secs: 60,
        }
    }
}

/// Settings for [`crate::session::HttpSession`].
#[derive(Debug, Clone)]
pub struct HttpSessionConfig {
    /// Per-request timeout. Default: 60 s.
    pub timeout_secs: u64,

    pub user_agent: String,

    /// Raw `Cookie` header sent with every request, e.g. a copied session cookie.
    pub cookie: Option<String>,
}

impl Default for HttpSessionConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 60,
            user_agent: concat!("wikiarchive/", env!("CARGO_PKG_VERSION")).to_string(),
            cookie: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = ArchiveConfig::builder().build().unwrap();
        assert_eq!(config.root_dir, PathBuf::from("."));
        assert_eq!(config.skip_policy, SkipPolicy::RawSource);
        assert!(config.produce_markdown);
        assert_eq!(config.base_url().unwrap().host_str(), Some("wiki.equinor.com"));
    }

    #[test]
    fn rejects_non_http_base_url() {
        let err = ArchiveConfig::builder()
            .wiki_base_url("ftp://wiki.example.org")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("http or https"), "got: {err}");
    }

    #[test]
    fn rejects_unparseable_base_url() {
        assert!(ArchiveConfig::builder()
            .wiki_base_url("not a url")
            .build()
            .is_err());
    }

    #[test]
    fn rejects_poll_longer_than_timeout() {
        let err = ArchiveConfig::builder()
            .image_timeout_ms(500)
            .image_poll_ms(1_000)
            .build()
            .unwrap_err();
        assert!(matches!(err, ArchiveError::InvalidConfig(_)));
    }

    #[test]
    fn rejects_tiny_timeout() {
        assert!(ArchiveConfig::builder().image_timeout_ms(5).build().is_err());
    }

    #[test]
    fn debug_hides_callback() {
        let config = ArchiveConfig::builder()
            .progress_callback(std::sync::Arc::new(crate::progress::NoopProgressCallback))
            .build()
            .unwrap();
        let dbg = format!("{config:?}");
        assert!(dbg.contains("<dyn ArchiveProgressCallback>"));
    }

    #[test]
    fn chrome_defaults_reuse_default_profile() {
        let c = ChromeConfig::default();
        assert!(!c.headless);
        assert_eq!(c.profile_directory.as_deref(), Some("Default"));
    }
}
