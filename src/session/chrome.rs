//! Chrome over CDP (chromiumoxide).
//!
//! A single tab is opened at launch and reused for every navigation, so
//! whatever login the operator completes in it carries over to all titles
//! and images of the batch. The browser is headful by default: federated
//! logins usually need a human the first time.

use crate::config::ChromeConfig;
use crate::error::SessionError;
use crate::session::BrowserSession;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::Page;
use futures::StreamExt;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use url::Url;

const IMAGE_READY_JS: &str = "(() => { const img = document.querySelector('img'); \
     return !!img && img.complete && img.naturalWidth > 0; })()";

pub struct ChromeSession {
    browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
    navigation_timeout: Duration,
}

impl ChromeSession {
    /// Launch the browser and open the tab the batch will use.
    pub async fn launch(config: &ChromeConfig) -> Result<Self, SessionError> {
        info!(
            "Launching Chrome ({})",
            if config.headless { "headless" } else { "windowed" }
        );

        let mut builder = BrowserConfig::builder()
            .request_timeout(Duration::from_secs(config.navigation_timeout_secs))
            .arg("--remote-allow-origins=*")
            .arg("--no-first-run")
            .arg("--no-default-browser-check");

        if !config.headless {
            builder = builder.with_head();
        }
        if let Some(ref path) = config.chrome_path {
            builder = builder.chrome_executable(path);
        }
        if let Some(ref dir) = config.user_data_dir {
            builder = builder.user_data_dir(dir);
        }
        if let Some(ref profile) = config.profile_directory {
            builder = builder.arg(format!("--profile-directory={profile}"));
        }

        let browser_config = builder.build().map_err(SessionError::Launch)?;
        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| SessionError::Launch(e.to_string()))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("Browser handler error: {e}");
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| SessionError::Launch(format!("could not open a tab: {e}")))?;

        Ok(Self {
            browser,
            page,
            handler,
            navigation_timeout: Duration::from_secs(config.navigation_timeout_secs),
        })
    }
}

impl BrowserSession for ChromeSession {
    async fn navigate(&mut self, url: &Url) -> Result<(), SessionError> {
        debug!(url = %url, "Navigating");
        let nav_err = |detail: String| SessionError::Navigation {
            url: url.to_string(),
            detail,
        };
        tokio::time::timeout(self.navigation_timeout, self.page.goto(url.as_str()))
            .await
            .map_err(|_| nav_err(format!("timed out after {:?}", self.navigation_timeout)))?
            .map_err(|e| nav_err(e.to_string()))?;
        Ok(())
    }

    async fn current_rendered_markup(&mut self) -> Result<Vec<u8>, SessionError> {
        self.page
            .content()
            .await
            .map(String::into_bytes)
            .map_err(|e| SessionError::Protocol(e.to_string()))
    }

    async fn read_preformatted_text(&mut self) -> Result<String, SessionError> {
        let missing = || SessionError::ElementMissing {
            selector: "pre".to_string(),
        };
        let pre = self.page.find_element("pre").await.map_err(|_| missing())?;
        let text = pre
            .inner_text()
            .await
            .map_err(|e| SessionError::Protocol(e.to_string()))?;
        text.ok_or_else(missing)
    }

    async fn image_ready(&mut self) -> Result<bool, SessionError> {
        self.page
            .evaluate(IMAGE_READY_JS)
            .await
            .map_err(|e| SessionError::Protocol(e.to_string()))?
            .into_value::<bool>()
            .map_err(|e| SessionError::Protocol(e.to_string()))
    }

    async fn rendered_pixels_of_first_image(&mut self) -> Result<Vec<u8>, SessionError> {
        let img = self
            .page
            .find_element("img")
            .await
            .map_err(|_| SessionError::ElementMissing {
                selector: "img".to_string(),
            })?;
        img.screenshot(CaptureScreenshotFormat::Png)
            .await
            .map_err(|e| SessionError::Protocol(e.to_string()))
    }

    async fn close(mut self) -> Result<(), SessionError> {
        let result = self
            .browser
            .close()
            .await
            .map(|_| ())
            .map_err(|e| SessionError::Protocol(format!("close failed: {e}")));
        if let Err(e) = self.browser.wait().await {
            warn!("Browser process did not exit cleanly: {e}");
        }
        self.handler.abort();
        info!("Browser session closed");
        result
    }
}
