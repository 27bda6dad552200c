//! Archive orchestration: one title end to end, and a batch of titles over
//! one shared browser session.
//!
//! Titles run strictly one after another. A title's failure is caught at the
//! title boundary and recorded in its [`TitleOutcome`]; the batch always
//! carries on, and the session is closed exactly once when the batch ends.

use crate::config::{ArchiveConfig, ChromeConfig, HttpSessionConfig};
use crate::converter::{Converter, PandocConverter};
use crate::error::ArchiveError;
use crate::output::{BatchSummary, TitleOutcome, TitleStatus};
use crate::pipeline::convert::{document_invocation, invoke_converter, markdown_invocation};
use crate::pipeline::filename::sanitize_filename;
use crate::pipeline::images::{extract_image_references, harvest_images, HarvestReport};
use crate::pipeline::job::{resolve_job, ArchiveJob, ResolvedJob};
use crate::pipeline::normalize::{normalize_file, NormalizeOptions};
use crate::pipeline::source::{retrieve_sources, PageUrls, RetrievedSources};
use crate::session::{BrowserSession, ChromeSession, HttpSession};
use std::time::Instant;
use tracing::{debug, info, warn};
use url::Url;

/// Archive every title in order over `session`, then close it.
///
/// Returns `Err` only when the batch cannot start (an unusable wiki base
/// URL); per-title failures are in the summary. The session is closed on
/// every path.
pub async fn archive_batch<S: BrowserSession, C: Converter>(
    mut session: S,
    converter: &C,
    titles: &[String],
    config: &ArchiveConfig,
) -> Result<BatchSummary, ArchiveError> {
    let base = match config.base_url() {
        Ok(base) => base,
        Err(e) => {
            close_session(session).await;
            return Err(e);
        }
    };

    let total_start = Instant::now();
    let total = titles.len();
    info!("Archiving {} title(s) under {}", total, config.root_dir.display());
    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_start(total);
    }

    let mut summary = BatchSummary::default();
    for (i, title) in titles.iter().enumerate() {
        info!("[{}/{}] {}", i + 1, total, title);
        if let Some(ref cb) = config.progress_callback {
            cb.on_title_start(i + 1, total, title);
        }
        let outcome = archive_title(&mut session, converter, &base, title, config).await;
        summary.push(outcome);
    }

    close_session(session).await;

    summary.total_duration_ms = total_start.elapsed().as_millis() as u64;
    info!(
        "Batch complete: {} archived, {} skipped, {} failed, {} image(s) saved, {} image(s) failed, {}ms",
        summary.archived,
        summary.skipped,
        summary.failed,
        summary.images_saved,
        summary.images_failed,
        summary.total_duration_ms
    );
    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_complete(&summary);
    }
    Ok(summary)
}

/// Launch Chrome and archive `titles` with pandoc.
pub async fn archive_with_chrome(
    titles: &[String],
    chrome: &ChromeConfig,
    config: &ArchiveConfig,
) -> Result<BatchSummary, ArchiveError> {
    let session = ChromeSession::launch(chrome)
        .await
        .map_err(|e| ArchiveError::Session(e.to_string()))?;
    let converter = PandocConverter::new(&config.pandoc_path);
    archive_batch(session, &converter, titles, config).await
}

/// Archive `titles` over plain HTTP with pandoc.
pub async fn archive_with_http(
    titles: &[String],
    http: &HttpSessionConfig,
    config: &ArchiveConfig,
) -> Result<BatchSummary, ArchiveError> {
    let session = HttpSession::new(http).map_err(|e| ArchiveError::Session(e.to_string()))?;
    let converter = PandocConverter::new(&config.pandoc_path);
    archive_batch(session, &converter, titles, config).await
}

async fn close_session<S: BrowserSession>(session: S) {
    if let Err(e) = session.close().await {
        warn!("Failed to close browser session: {}", e);
    }
}

/// Run the whole pipeline for one title. Never fails: errors end up in the
/// returned outcome.
pub async fn archive_title<S: BrowserSession, C: Converter>(
    session: &mut S,
    converter: &C,
    base: &Url,
    title: &str,
    config: &ArchiveConfig,
) -> TitleOutcome {
    let start = Instant::now();
    let basename = sanitize_filename(title);
    let mut harvest = HarvestReport::default();

    let result = run_title(session, converter, base, title, config, &mut harvest).await;
    let duration_ms = start.elapsed().as_millis() as u64;
    let images_saved = harvest.saved.len();

    match result {
        Ok(status) => {
            if let (TitleStatus::Archived { final_document }, Some(cb)) =
                (&status, &config.progress_callback)
            {
                cb.on_title_complete(title, final_document);
            }
            TitleOutcome {
                title: title.to_string(),
                basename,
                status,
                images_saved,
                image_errors: harvest.errors,
                duration_ms,
            }
        }
        Err(e) => {
            warn!("Failed to archive '{}': {}", title, e);
            if let Some(ref cb) = config.progress_callback {
                cb.on_title_error(title, &e.to_string());
            }
            TitleOutcome::failed(title, &basename, &e, images_saved, harvest.errors, duration_ms)
        }
    }
}

async fn run_title<S: BrowserSession, C: Converter>(
    session: &mut S,
    converter: &C,
    base: &Url,
    title: &str,
    config: &ArchiveConfig,
    harvest: &mut HarvestReport,
) -> Result<TitleStatus, ArchiveError> {
    // ── Step 1: Resolve job ──────────────────────────────────────────────
    let ResolvedJob { job, already_done } =
        resolve_job(title, &config.root_dir, config.skip_policy).await?;
    if already_done {
        info!(
            "Skipping '{}': {} already exists",
            title,
            job.raw_source_path.display()
        );
        if let Some(ref cb) = config.progress_callback {
            cb.on_title_skipped(title, &job.raw_source_path);
        }
        return Ok(TitleStatus::Skipped {
            raw_source: job.raw_source_path,
        });
    }

    // ── Step 2: Retrieve sources ─────────────────────────────────────────
    let urls = PageUrls::for_title(base, title)?;
    let sources = retrieve_sources(session, &urls, &job).await?;

    // The raw source is the completion marker; a failure past this point
    // must not leave it behind.
    let result = finish_title(session, converter, &job, &urls, &sources, config, harvest).await;
    if result.is_err() && !config.keep_source_on_failure {
        match tokio::fs::remove_file(&job.raw_source_path).await {
            Ok(()) => debug!("Rolled back {}", job.raw_source_path.display()),
            Err(e) => warn!(
                "Could not remove {} after failure: {}",
                job.raw_source_path.display(),
                e
            ),
        }
    }
    result
}

async fn finish_title<S: BrowserSession, C: Converter>(
    session: &mut S,
    converter: &C,
    job: &ArchiveJob,
    urls: &PageUrls,
    sources: &RetrievedSources,
    config: &ArchiveConfig,
    harvest: &mut HarvestReport,
) -> Result<TitleStatus, ArchiveError> {
    // ── Step 3: Harvest images ───────────────────────────────────────────
    let references = extract_image_references(&sources.rendered_markup, &urls.page);
    debug!("{} image reference(s) on {}", references.len(), urls.page);
    *harvest = harvest_images(session, &references, job, config).await;

    // ── Step 4: Markdown intermediate (best effort) ──────────────────────
    if config.produce_markdown {
        if let Err(e) = invoke_converter(converter, &markdown_invocation(job)).await {
            warn!("Markdown conversion failed for '{}': {}", job.title, e);
        }
    }

    // ── Step 5: Final document ───────────────────────────────────────────
    invoke_converter(converter, &document_invocation(job)).await?;

    // ── Step 6: Normalize ────────────────────────────────────────────────
    let opts = NormalizeOptions::for_title(config, &job.title);
    normalize_file(&job.final_document_path, &opts).await?;

    Ok(TitleStatus::Archived {
        final_document: job.final_document_path.clone(),
    })
}
