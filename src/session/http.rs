//! Plain-HTTP session (reqwest) for wikis that need no interactive login.
//!
//! Each navigation is a GET whose response becomes the "current document".
//! A raw export served as any non-HTML `text/*` type (MediaWiki uses
//! `text/x-wiki`) is returned verbatim by
//! [`read_preformatted_text`](BrowserSession::read_preformatted_text); only
//! an HTML response is searched for its first `<pre>`. Image bytes are the
//! response body itself, so no rendering round-trip is involved.

use crate::config::HttpSessionConfig;
use crate::error::SessionError;
use crate::html;
use crate::session::BrowserSession;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE, COOKIE};
use std::time::Duration;
use tracing::debug;
use url::Url;

struct Loaded {
    content_type: String,
    body: Vec<u8>,
}

impl Loaded {
    fn mime(&self) -> &str {
        self.content_type
            .split(';')
            .next()
            .unwrap_or("")
            .trim()
    }

    /// A missing content type is parsed as HTML.
    fn is_html(&self) -> bool {
        matches!(self.mime(), "" | "text/html" | "application/xhtml+xml")
    }

    /// Served as text but not as a rendered page.
    fn is_raw_text(&self) -> bool {
        self.mime().starts_with("text/") && !self.is_html()
    }
}

pub struct HttpSession {
    client: reqwest::Client,
    current: Option<Loaded>,
}

impl HttpSession {
    pub fn new(config: &HttpSessionConfig) -> Result<Self, SessionError> {
        let mut headers = HeaderMap::new();
        if let Some(ref cookie) = config.cookie {
            let value = HeaderValue::from_str(cookie)
                .map_err(|e| SessionError::Launch(format!("invalid cookie header: {e}")))?;
            headers.insert(COOKIE, value);
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.as_str())
            .default_headers(headers)
            .cookie_store(true)
            .build()
            .map_err(|e| SessionError::Launch(e.to_string()))?;
        Ok(Self {
            client,
            current: None,
        })
    }

    fn current(&self) -> Result<&Loaded, SessionError> {
        self.current
            .as_ref()
            .ok_or_else(|| SessionError::Protocol("no document loaded".to_string()))
    }
}

impl BrowserSession for HttpSession {
    async fn navigate(&mut self, url: &Url) -> Result<(), SessionError> {
        self.current = None;
        let nav_err = |detail: String| SessionError::Navigation {
            url: url.to_string(),
            detail,
        };

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| nav_err(e.to_string()))?;
        if !response.status().is_success() {
            return Err(nav_err(format!("HTTP {}", response.status())));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_ascii_lowercase();
        let body = response
            .bytes()
            .await
            .map_err(|e| nav_err(e.to_string()))?
            .to_vec();
        debug!(url = %url, content_type = %content_type, size = body.len(), "Fetched");

        self.current = Some(Loaded { content_type, body });
        Ok(())
    }

    async fn current_rendered_markup(&mut self) -> Result<Vec<u8>, SessionError> {
        Ok(self.current()?.body.clone())
    }

    async fn read_preformatted_text(&mut self) -> Result<String, SessionError> {
        let loaded = self.current()?;
        if loaded.is_raw_text() {
            return Ok(String::from_utf8_lossy(&loaded.body).into_owned());
        }
        if !loaded.is_html() {
            return Err(SessionError::ElementMissing {
                selector: "pre".to_string(),
            });
        }
        let dom = html::parse_bytes(&loaded.body);
        html::find_all(&dom.document, "pre")
            .first()
            .map(html::text_content)
            .ok_or_else(|| SessionError::ElementMissing {
                selector: "pre".to_string(),
            })
    }

    async fn image_ready(&mut self) -> Result<bool, SessionError> {
        let loaded = self.current()?;
        Ok(loaded.content_type.starts_with("image/") && !loaded.body.is_empty())
    }

    async fn rendered_pixels_of_first_image(&mut self) -> Result<Vec<u8>, SessionError> {
        let loaded = self.current()?;
        if !loaded.content_type.starts_with("image/") {
            return Err(SessionError::ElementMissing {
                selector: "img".to_string(),
            });
        }
        Ok(loaded.body.clone())
    }

    async fn close(self) -> Result<(), SessionError> {
        Ok(())
    }
}
