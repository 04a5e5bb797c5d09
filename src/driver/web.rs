use crate::driver::{PageDriver, PageSession};
use crate::error::CrawlError;
use fantoccini::elements::Element;
use fantoccini::{Client, ClientBuilder, Locator};
use std::future::Future;
use std::time::Duration;
use tokio::time::timeout;

/// How often the readiness wait polls the document
const READY_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// WebDriver server that hands out one browser session per page
#[derive(Debug, Clone)]
pub struct WebDriverBrowser {
    webdriver_url: String,
    page_load_timeout: Duration,
    settle_delay: Duration,
}

impl WebDriverBrowser {
    pub fn new(webdriver_url: &str) -> Self {
        Self {
            webdriver_url: webdriver_url.to_string(),
            page_load_timeout: Duration::from_secs(20),
            settle_delay: Duration::from_secs(1),
        }
    }

    /// Bound on waiting for `document.readyState == "complete"` and a body
    pub fn with_page_load_timeout(mut self, timeout: Duration) -> Self {
        self.page_load_timeout = timeout;
        self
    }

    /// Pause after the page is ready, for late scripts to render
    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }
}

impl PageDriver for WebDriverBrowser {
    type Session = WebDriverSession;

    async fn connect(&self) -> Result<WebDriverSession, CrawlError> {
        match ClientBuilder::native().connect(&self.webdriver_url).await {
            Ok(client) => {
                ::log::debug!("Connected to WebDriver at {}", self.webdriver_url);
                Ok(WebDriverSession {
                    client,
                    page_load_timeout: self.page_load_timeout,
                    settle_delay: self.settle_delay,
                })
            }
            Err(e) => {
                ::log::error!(
                    "Failed to connect to WebDriver at {}: {}",
                    self.webdriver_url,
                    e
                );
                Err(CrawlError::Connect {
                    addr: self.webdriver_url.clone(),
                    reason: e.to_string(),
                })
            }
        }
    }

    fn address(&self) -> &str {
        &self.webdriver_url
    }
}

/// A single WebDriver browser session
pub struct WebDriverSession {
    client: Client,
    page_load_timeout: Duration,
    settle_delay: Duration,
}

impl WebDriverSession {
    /// Polls until the document is complete and has a body element
    async fn wait_for_ready(&self) -> Result<(), CrawlError> {
        loop {
            let state = self
                .client
                .execute("return document.readyState", vec![])
                .await
                .map_err(|e| driver_error("reading document.readyState", e))?;

            if state.as_str() == Some("complete") {
                let bodies = self
                    .client
                    .find_all(Locator::Css("body"))
                    .await
                    .map_err(|e| driver_error("looking up body", e))?;
                if !bodies.is_empty() {
                    return Ok(());
                }
            }

            tokio::time::sleep(READY_POLL_INTERVAL).await;
        }
    }
}

impl PageSession for WebDriverSession {
    type Element = Element;

    async fn navigate(&self, url: &str) -> Result<(), CrawlError> {
        ::log::info!("Navigating to {}", url);
        bounded_load(url, self.page_load_timeout, async {
            self.client
                .goto(url)
                .await
                .map_err(|e| driver_error("navigating", e))?;
            self.wait_for_ready().await
        })
        .await?;

        if !self.settle_delay.is_zero() {
            tokio::time::sleep(self.settle_delay).await;
        }
        Ok(())
    }

    async fn current_url(&self) -> Result<String, CrawlError> {
        self.client
            .current_url()
            .await
            .map(|url| url.to_string())
            .map_err(|e| driver_error("reading current URL", e))
    }

    async fn find_elements(&self, selector: &str) -> Result<Vec<Element>, CrawlError> {
        self.client
            .find_all(Locator::Css(selector))
            .await
            .map_err(|e| driver_error("finding elements", e))
    }

    async fn attribute(&self, element: &Element, name: &str) -> Result<Option<String>, CrawlError> {
        element
            .attr(name)
            .await
            .map_err(|e| driver_error("reading an attribute", e))
    }

    async fn text(&self, element: &Element) -> Result<String, CrawlError> {
        element
            .text()
            .await
            .map_err(|e| driver_error("reading element text", e))
    }

    async fn page_source(&self) -> Result<String, CrawlError> {
        self.client
            .source()
            .await
            .map_err(|e| driver_error("getting page source", e))
    }

    async fn close(self) -> Result<(), CrawlError> {
        self.client
            .close()
            .await
            .map_err(|e| driver_error("closing session", e))
    }
}

/// Runs a page load, failing with `NavigationTimeout` once `limit` passes
async fn bounded_load<F>(url: &str, limit: Duration, load: F) -> Result<(), CrawlError>
where
    F: Future<Output = Result<(), CrawlError>>,
{
    match timeout(limit, load).await {
        Ok(result) => result,
        Err(_) => Err(CrawlError::NavigationTimeout {
            url: url.to_string(),
            timeout: limit,
        }),
    }
}

/// Converts a WebDriver command error, logging lost sessions
fn driver_error(context: &str, error: fantoccini::error::CmdError) -> CrawlError {
    let message = error.to_string();
    if message.contains("Unable to find session") {
        ::log::warn!("Lost WebDriver session while {}", context);
    }
    CrawlError::from_driver_message(context, &message)
}
