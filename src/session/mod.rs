//! The browser-session capability the pipeline drives.
//!
//! One session is acquired per batch and handed to every retrieval stage by
//! `&mut` reference; nothing in the crate holds it globally. The batch
//! consumes the session at the end through [`BrowserSession::close`], which
//! runs exactly once whatever happened to the individual titles.
//!
//! Two implementations ship with the crate:
//!
//! * [`ChromeSession`]: drives a real Chrome over CDP so that pages behind
//!   a federated login are fetched with the operator's cookies. Images are
//!   read back as rendered pixels.
//! * [`HttpSession`]: plain HTTP with a cookie store, for wikis that are
//!   reachable without an interactive login.
//!
//! Tests substitute in-memory fakes.

pub mod chrome;
pub mod http;

pub use chrome::ChromeSession;
pub use http::HttpSession;

use crate::error::SessionError;
use url::Url;

/// A single-threaded, stateful browsing session.
///
/// Methods act on whatever document the last [`navigate`](Self::navigate)
/// loaded. Calls are strictly sequential; implementations need no locking.
#[allow(async_fn_in_trait)]
pub trait BrowserSession {
    /// Load `url`, replacing the current document.
    async fn navigate(&mut self, url: &Url) -> Result<(), SessionError>;

    /// Markup of the current document as rendered by the wiki engine.
    async fn current_rendered_markup(&mut self) -> Result<Vec<u8>, SessionError>;

    /// Text of the first `<pre>` block (how raw exports are displayed).
    ///
    /// Fails with [`SessionError::ElementMissing`] when there is none.
    async fn read_preformatted_text(&mut self) -> Result<String, SessionError>;

    /// Whether the first image element has finished loading and has pixels.
    ///
    /// `Ok(false)` means "not yet"; callers poll it with a deadline.
    async fn image_ready(&mut self) -> Result<bool, SessionError>;

    /// Pixel content of the first image element in the current document.
    ///
    /// Fails with [`SessionError::ElementMissing`] when there is no image.
    async fn rendered_pixels_of_first_image(&mut self) -> Result<Vec<u8>, SessionError>;

    /// Release the session. Consumes it so it cannot be closed twice.
    async fn close(self) -> Result<(), SessionError>;
}
