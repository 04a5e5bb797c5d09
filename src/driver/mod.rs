pub mod web;

use crate::error::CrawlError;

pub use web::{WebDriverBrowser, WebDriverSession};

/// Opens browser sessions
pub trait PageDriver {
    type Session: PageSession;

    /// Open a fresh session
    async fn connect(&self) -> Result<Self::Session, CrawlError>;

    /// Address of the browser server, for log messages
    fn address(&self) -> &str;
}

/// One rendered page and the DOM queries the crawler needs
pub trait PageSession {
    type Element;

    /// Load `url` and block until the document is ready
    async fn navigate(&self, url: &str) -> Result<(), CrawlError>;

    async fn current_url(&self) -> Result<String, CrawlError>;

    /// All elements matching a CSS selector, in document order
    async fn find_elements(&self, selector: &str) -> Result<Vec<Self::Element>, CrawlError>;

    async fn attribute(
        &self,
        element: &Self::Element,
        name: &str,
    ) -> Result<Option<String>, CrawlError>;

    /// Visible text of an element
    async fn text(&self, element: &Self::Element) -> Result<String, CrawlError>;

    async fn page_source(&self) -> Result<String, CrawlError>;

    async fn close(self) -> Result<(), CrawlError>;
}
