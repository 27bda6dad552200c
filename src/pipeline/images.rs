//! Image harvesting: find every raster image a rendered page references and
//! save it next to the archived page.
//!
//! ## Retrieval
//!
//! Images are not downloaded directly. The session navigates to each image
//! URL so that the request carries the login cookies, waits until the image
//! element reports itself loaded, and reads back its pixels. Images are
//! handled one at a time in document order.
//!
//! ## Filtering
//!
//! Only `.png`, `.jpg` and `.gif` URLs (case-insensitive, checked on the
//! resolved URL path) are kept, and the wiki's "powered by" badge is always
//! dropped. Duplicates are not removed: the local filename is a pure
//! function of the URL, so a repeated reference rewrites the same file.

use crate::config::ArchiveConfig;
use crate::error::{ImageError, SessionError};
use crate::html;
use crate::pipeline::encode::encode_for_filename;
use crate::pipeline::job::ArchiveJob;
use crate::session::BrowserSession;
use once_cell::sync::Lazy;
use regex::Regex;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};
use url::Url;

const RASTER_EXTENSIONS: [&str; 3] = [".png", ".jpg", ".gif"];
const EXCLUDED_BADGE: &str = "poweredby_mediawiki";

/// Everything up to the last thumbnail size marker: `300px-`,
/// `page1-300px-`, `lossy-page1-300px-`.
static RE_SIZE_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(?:.*-)?\d+px-").unwrap());

/// One image the page references.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageReference {
    /// The `src` attribute as written in the markup.
    pub source_url: String,
    /// `source_url` resolved against the page URL.
    pub resolved_url: Url,
    /// Last path segment with any size prefix removed.
    pub local_filename: String,
}

/// Collect the retrievable image references of a rendered page, in
/// document order.
pub fn extract_image_references(rendered_markup: &[u8], page_url: &Url) -> Vec<ImageReference> {
    let dom = html::parse_bytes(rendered_markup);
    html::find_all(&dom.document, "img")
        .iter()
        .filter_map(|img| html::attr(img, "src"))
        .filter_map(|src| {
            let resolved = match page_url.join(src.trim()) {
                Ok(u) => u,
                Err(e) => {
                    debug!("Ignoring unresolvable image source '{}': {}", src, e);
                    return None;
                }
            };
            if !is_retrievable(&resolved) {
                return None;
            }
            let local_filename = local_filename(&resolved)?;
            Some(ImageReference {
                source_url: src,
                resolved_url: resolved,
                local_filename,
            })
        })
        .collect()
}

/// Raster extension and not the decorative badge.
pub fn is_retrievable(url: &Url) -> bool {
    let path = url.path().to_ascii_lowercase();
    RASTER_EXTENSIONS.iter().any(|ext| path.ends_with(ext)) && !url.as_str().contains(EXCLUDED_BADGE)
}

/// Filename an image is stored under, or `None` when the URL path has no
/// last segment to name it by.
pub fn local_filename(url: &Url) -> Option<String> {
    let last = url.path_segments()?.next_back()?;
    if last.is_empty() {
        return None;
    }
    let name = RE_SIZE_PREFIX.replace(last, "").into_owned();
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

/// Outcome of harvesting one page's images.
#[derive(Debug, Default)]
pub struct HarvestReport {
    /// Local filenames written, in retrieval order.
    pub saved: Vec<String>,
    pub errors: Vec<ImageError>,
}

/// Retrieve and write every reference in order. Individual failures are
/// logged and collected; they never stop the loop.
pub async fn harvest_images<S: BrowserSession>(
    session: &mut S,
    references: &[ImageReference],
    job: &ArchiveJob,
    config: &ArchiveConfig,
) -> HarvestReport {
    let mut report = HarvestReport::default();
    for reference in references {
        match save_image(session, reference, job, config).await {
            Ok(()) => {
                info!("Downloaded image: {}", reference.local_filename);
                if let Some(ref cb) = config.progress_callback {
                    cb.on_image_saved(&job.title, &reference.local_filename);
                }
                report.saved.push(reference.local_filename.clone());
            }
            Err(e) => {
                warn!("Failed to download {}", e);
                if let Some(ref cb) = config.progress_callback {
                    cb.on_image_failed(&job.title, &e.to_string());
                }
                report.errors.push(e);
            }
        }
    }
    report
}

async fn save_image<S: BrowserSession>(
    session: &mut S,
    reference: &ImageReference,
    job: &ArchiveJob,
    config: &ArchiveConfig,
) -> Result<(), ImageError> {
    let url = reference.resolved_url.as_str();
    let pixels = fetch_image(session, &reference.resolved_url, config).await?;
    let bytes = encode_for_filename(&pixels, &reference.local_filename).map_err(|detail| {
        ImageError::Transcode {
            url: url.to_string(),
            filename: reference.local_filename.clone(),
            detail,
        }
    })?;
    let path = job.directory.join(&reference.local_filename);
    tokio::fs::write(&path, &bytes)
        .await
        .map_err(|e| ImageError::Write {
            url: url.to_string(),
            path: path.display().to_string(),
            detail: e.to_string(),
        })
}

/// Navigate to an image, wait for it to load, and read back its pixels.
pub async fn fetch_image<S: BrowserSession>(
    session: &mut S,
    url: &Url,
    config: &ArchiveConfig,
) -> Result<Vec<u8>, ImageError> {
    session
        .navigate(url)
        .await
        .map_err(|e| ImageError::Navigation {
            url: url.to_string(),
            detail: e.to_string(),
        })?;
    wait_for_image(
        session,
        url,
        Duration::from_millis(config.image_timeout_ms),
        Duration::from_millis(config.image_poll_ms),
    )
    .await?;
    session
        .rendered_pixels_of_first_image()
        .await
        .map_err(|e| not_rendered(url, e))
}

/// Poll [`BrowserSession::image_ready`] until it holds or `timeout` passes.
pub async fn wait_for_image<S: BrowserSession>(
    session: &mut S,
    url: &Url,
    timeout: Duration,
    poll: Duration,
) -> Result<(), ImageError> {
    let deadline = Instant::now() + timeout;
    loop {
        if session.image_ready().await.map_err(|e| not_rendered(url, e))? {
            return Ok(());
        }
        if Instant::now() >= deadline {
            return Err(ImageError::Timeout {
                url: url.to_string(),
                ms: timeout.as_millis() as u64,
            });
        }
        sleep(poll).await;
    }
}

fn not_rendered(url: &Url, e: SessionError) -> ImageError {
    ImageError::NotRendered {
        url: url.to_string(),
        detail: e.to_string(),
    }
}
