//! Document normalization: turn whatever the converter produced into a
//! well-formed, styled, caption-free standalone page.
//!
//! ## Steps
//!
//! Applied in this fixed order:
//!
//! 1. **root**: synthesise `<html>` when missing, moving all prior top-level
//!    content into a synthesised `<body>` inside it
//! 2. **head**: synthesise `<head>` as the root's first child when missing
//! 3. **body**: synthesise `<body>` when missing; every other root child is
//!    moved into it in original order
//! 4. **head metadata**: stylesheet `<link>` first, inline `<style>` second
//! 5. **heading**: `<h1>` as the body's first child
//! 6. **captions**: every `<figcaption>` is removed
//!
//! ## Idempotence
//!
//! Injected nodes carry a [`MARKER_ATTR`] attribute. Each pass removes the
//! marked nodes of a previous pass before injecting fresh ones, so
//! normalizing an already-normalized document returns it unchanged.

use crate::config::ArchiveConfig;
use crate::error::ArchiveError;
use crate::html;
use markup5ever_rcdom::{Handle, NodeData, RcDom};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Attribute carried by every node the normalizer injects.
pub const MARKER_ATTR: &str = "data-wikiarchive";

const MARK_STYLESHEET: &str = "stylesheet";
const MARK_STYLE: &str = "style";
const MARK_HEADING: &str = "heading";

/// What gets injected into one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizeOptions {
    /// Full `<h1>` text.
    pub heading: String,
    pub stylesheet_url: String,
    pub inline_style: String,
}

impl NormalizeOptions {
    pub fn for_title(config: &ArchiveConfig, title: &str) -> Self {
        Self {
            heading: heading_text(&config.heading_prefix, title),
            stylesheet_url: config.stylesheet_url.clone(),
            inline_style: config.inline_style.clone(),
        }
    }
}

/// `"{prefix}: {title}"` with underscores shown as spaces.
pub fn heading_text(prefix: &str, title: &str) -> String {
    format!("{}: {}", prefix, title.replace('_', " "))
}

/// Normalize a document held in memory.
pub fn normalize_document(markup: &str, opts: &NormalizeOptions) -> Result<String, ArchiveError> {
    let dom = html::parse(markup);
    normalize_dom(&dom, opts);
    html::serialize_document(&dom)
        .map_err(|e| ArchiveError::Internal(format!("serialising normalized document: {e}")))
}

/// Normalize the document at `path` in place.
///
/// The result is written to a temporary file in the same directory and
/// renamed over `path`, so a failure never leaves a half-written document.
/// The rewritten file keeps the permissions of the one it replaces.
pub async fn normalize_file(path: &Path, opts: &NormalizeOptions) -> Result<(), ArchiveError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| ArchiveError::fs(path, e))?;
    let normalized = normalize_document(&String::from_utf8_lossy(&bytes), opts)?;

    let target = path.to_path_buf();
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    tokio::task::spawn_blocking(move || -> std::io::Result<()> {
        let permissions = std::fs::metadata(&target)?.permissions();
        let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
        tmp.write_all(normalized.as_bytes())?;
        tmp.as_file().set_permissions(permissions)?;
        tmp.persist(&target).map_err(|e| e.error)?;
        Ok(())
    })
    .await
    .map_err(|e| ArchiveError::Internal(format!("normalize task failed: {e}")))?
    .map_err(|e| ArchiveError::fs(path, e))?;

    info!("Normalized {}", path.display());
    Ok(())
}

/// Apply every normalization step to a parsed tree.
pub fn normalize_dom(dom: &RcDom, opts: &NormalizeOptions) {
    let root = ensure_root(dom);
    let head = ensure_head(dom, &root);
    let body = ensure_body(dom, &root, &head);

    remove_marked(dom, &root);
    inject_head_metadata(dom, &head, opts);
    inject_heading(dom, &body, &opts.heading);
    let removed = remove_captions(dom, &root);
    if removed > 0 {
        debug!("Removed {} caption(s)", removed);
    }
}

fn is_doctype(node: &Handle) -> bool {
    matches!(node.data, NodeData::Doctype { .. })
}

fn ensure_root(dom: &RcDom) -> Handle {
    if let Some(root) = html::child_element(&dom.document, "html") {
        return root;
    }
    let root = html::create_element(dom, "html", &[]);
    let body = html::create_element(dom, "body", &[]);
    for child in html::children(&dom.document) {
        if !is_doctype(&child) {
            html::append_child(dom, &body, &child);
        }
    }
    html::append_child(dom, &root, &body);
    html::append_child(dom, &dom.document, &root);
    root
}

/// Fold every extra `local` child of `root` into the first one.
fn merge_duplicates(dom: &RcDom, root: &Handle, keep: &Handle, local: &str) {
    for extra in html::children(root) {
        if html::is_element(&extra, local) && !html::same_node(&extra, keep) {
            for child in html::children(&extra) {
                html::append_child(dom, keep, &child);
            }
            html::detach(dom, &extra);
        }
    }
}

fn ensure_head(dom: &RcDom, root: &Handle) -> Handle {
    let head = html::child_element(root, "head")
        .unwrap_or_else(|| html::create_element(dom, "head", &[]));
    merge_duplicates(dom, root, &head, "head");

    let first = html::children(root).into_iter().next();
    if !first.is_some_and(|f| html::same_node(&f, &head)) {
        html::prepend_child(dom, root, &head);
    }
    head
}

fn ensure_body(dom: &RcDom, root: &Handle, head: &Handle) -> Handle {
    let body = match html::child_element(root, "body") {
        Some(body) => body,
        None => {
            let body = html::create_element(dom, "body", &[]);
            html::append_child(dom, root, &body);
            body
        }
    };
    merge_duplicates(dom, root, &body, "body");

    // Strays before the body go to its start, strays after it to its end.
    let mut before = Vec::new();
    let mut after = Vec::new();
    let mut seen_body = false;
    for child in html::children(root) {
        if html::same_node(&child, head) {
            continue;
        }
        if html::same_node(&child, &body) {
            seen_body = true;
        } else if seen_body {
            after.push(child);
        } else {
            before.push(child);
        }
    }
    for child in before.iter().rev() {
        html::prepend_child(dom, &body, child);
    }
    for child in &after {
        html::append_child(dom, &body, child);
    }
    body
}

fn remove_marked(dom: &RcDom, root: &Handle) {
    for node in html::descendants(root) {
        if html::attr(&node, MARKER_ATTR).is_some() {
            html::detach(dom, &node);
        }
    }
}

fn inject_head_metadata(dom: &RcDom, head: &Handle, opts: &NormalizeOptions) {
    let style = html::create_element(dom, "style", &[(MARKER_ATTR, MARK_STYLE)]);
    html::append_text(dom, &style, &opts.inline_style);
    html::prepend_child(dom, head, &style);

    let link = html::create_element(
        dom,
        "link",
        &[
            ("rel", "stylesheet"),
            ("href", &opts.stylesheet_url),
            (MARKER_ATTR, MARK_STYLESHEET),
        ],
    );
    html::prepend_child(dom, head, &link);
}

fn inject_heading(dom: &RcDom, body: &Handle, text: &str) {
    let h1 = html::create_element(dom, "h1", &[(MARKER_ATTR, MARK_HEADING)]);
    html::append_text(dom, &h1, text);
    html::prepend_child(dom, body, &h1);
}

fn remove_captions(dom: &RcDom, root: &Handle) -> usize {
    let captions = html::find_all(root, "figcaption");
    for caption in &captions {
        html::detach(dom, caption);
    }
    captions.len()
}
