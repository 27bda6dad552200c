//! Source retrieval: the rendered page and its raw wiki markup.
//!
//! Both come through the browser session so that they are fetched with the
//! same credentials. The raw export is displayed by the browser as a single
//! `<pre>` block; its text is written to disk verbatim.

use crate::error::{ArchiveError, SessionError};
use crate::pipeline::job::ArchiveJob;
use crate::session::BrowserSession;
use tracing::info;
use url::Url;

/// The two URLs a title is fetched from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageUrls {
    /// Plain page view; also the base for resolving image references.
    pub page: Url,
    /// `index.php?title=…&action=raw`.
    pub raw: Url,
}

impl PageUrls {
    pub fn for_title(base: &Url, title: &str) -> Result<Self, ArchiveError> {
        let invalid = |e: url::ParseError| ArchiveError::Retrieval {
            url: base.to_string(),
            detail: format!("cannot build URL for '{title}': {e}"),
        };
        let title = title.trim();

        let path_title = title
            .replace(' ', "_")
            .replace('%', "%25")
            .replace('?', "%3F")
            .replace('#', "%23");
        let page = base.join(&format!("/wiki/{path_title}")).map_err(invalid)?;

        let mut raw = base.join("/wiki/index.php").map_err(invalid)?;
        raw.query_pairs_mut()
            .append_pair("title", title)
            .append_pair("action", "raw");

        Ok(Self { page, raw })
    }
}

/// What [`retrieve_sources`] produced.
#[derive(Debug, Clone)]
pub struct RetrievedSources {
    pub rendered_markup: Vec<u8>,
    pub raw_source: String,
}

/// Fetch the rendered page, then the raw export, and write the raw export
/// to `job.raw_source_path`.
///
/// A missing `<pre>` block is a RETRIEVAL error; nothing is written then.
pub async fn retrieve_sources<S: BrowserSession>(
    session: &mut S,
    urls: &PageUrls,
    job: &ArchiveJob,
) -> Result<RetrievedSources, ArchiveError> {
    info!("Page URL {}", urls.page);
    let rendered_markup = fetch_rendered(session, &urls.page).await?;

    info!("Raw wiki in {}", job.raw_source_path.display());
    let raw_source = fetch_raw_source(session, &urls.raw).await?;

    tokio::fs::write(&job.raw_source_path, raw_source.as_bytes())
        .await
        .map_err(|e| ArchiveError::fs(&job.raw_source_path, e))?;

    Ok(RetrievedSources {
        rendered_markup,
        raw_source,
    })
}

pub async fn fetch_rendered<S: BrowserSession>(
    session: &mut S,
    page_url: &Url,
) -> Result<Vec<u8>, ArchiveError> {
    session
        .navigate(page_url)
        .await
        .map_err(|e| retrieval(page_url, e))?;
    session
        .current_rendered_markup()
        .await
        .map_err(|e| retrieval(page_url, e))
}

pub async fn fetch_raw_source<S: BrowserSession>(
    session: &mut S,
    raw_url: &Url,
) -> Result<String, ArchiveError> {
    session
        .navigate(raw_url)
        .await
        .map_err(|e| retrieval(raw_url, e))?;
    session
        .read_preformatted_text()
        .await
        .map_err(|e| retrieval(raw_url, e))
}

fn retrieval(url: &Url, e: SessionError) -> ArchiveError {
    ArchiveError::Retrieval {
        url: url.to_string(),
        detail: e.to_string(),
    }
}
