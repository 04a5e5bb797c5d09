use std::time::Duration;
use thiserror::Error;

/// Errors raised while crawling a career site.
///
/// The variants follow the failure taxonomy the crawler acts on: transient
/// remote failures are retried, stale element references are swallowed at the
/// point of use, and everything else fails the page visit that raised it.
#[derive(Debug, Error)]
pub enum CrawlError {
    /// Could not open a WebDriver session
    #[error("failed to connect to WebDriver at {addr}: {reason}")]
    Connect { addr: String, reason: String },

    /// The page never reached a ready state
    #[error("timed out after {timeout:?} waiting for {url} to load")]
    NavigationTimeout { url: String, timeout: Duration },

    /// An element handle was invalidated by a page mutation
    #[error("stale element reference while {context}")]
    StaleElement { context: String },

    /// Any other WebDriver command failure
    #[error("WebDriver command failed while {context}: {reason}")]
    Driver {
        context: String,
        reason: String,
        transient: bool,
    },

    #[error("invalid URL {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// The language model endpoint could not be reached
    #[error("language model request failed: {0}")]
    OracleTransport(String),

    /// The language model endpoint answered with an error status
    #[error("language model returned HTTP {status}: {body}")]
    OracleApi { status: u16, body: String },

    /// The language model is not usable (missing key, empty choice list, ...)
    #[error("language model unavailable: {0}")]
    OracleUnavailable(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),
}

impl CrawlError {
    /// Whether retrying the failed operation may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            CrawlError::Connect { .. } | CrawlError::NavigationTimeout { .. } => true,
            CrawlError::Driver { transient, .. } => *transient,
            CrawlError::OracleTransport(_) => true,
            CrawlError::OracleApi { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// Whether this error came from an invalidated element handle
    pub fn is_stale(&self) -> bool {
        matches!(self, CrawlError::StaleElement { .. })
    }

    /// Classifies a WebDriver command failure by its message
    pub fn from_driver_message(context: &str, message: &str) -> Self {
        let lowered = message.to_lowercase();
        if lowered.contains("stale element") {
            return CrawlError::StaleElement {
                context: context.to_string(),
            };
        }

        let transient = lowered.contains("timeout")
            || lowered.contains("timed out")
            || lowered.contains("connection")
            || lowered.contains("disconnected")
            || lowered.contains("unable to find session");

        CrawlError::Driver {
            context: context.to_string(),
            reason: message.to_string(),
            transient,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        let connect = CrawlError::Connect {
            addr: "http://localhost:4444".to_string(),
            reason: "refused".to_string(),
        };
        assert!(connect.is_transient());

        let timeout = CrawlError::NavigationTimeout {
            url: "https://example.com".to_string(),
            timeout: Duration::from_secs(20),
        };
        assert!(timeout.is_transient());

        assert!(CrawlError::OracleTransport("reset".to_string()).is_transient());
        assert!(
            CrawlError::OracleApi {
                status: 503,
                body: String::new()
            }
            .is_transient()
        );
        assert!(
            CrawlError::OracleApi {
                status: 429,
                body: String::new()
            }
            .is_transient()
        );
        assert!(
            !CrawlError::OracleApi {
                status: 400,
                body: String::new()
            }
            .is_transient()
        );
        assert!(!CrawlError::Config("bad".to_string()).is_transient());
    }

    #[test]
    fn test_driver_message_classification() {
        let stale = CrawlError::from_driver_message(
            "reading href",
            "stale element reference: element is not attached to the page document",
        );
        assert!(stale.is_stale());
        assert!(!stale.is_transient());

        let lost = CrawlError::from_driver_message("navigating", "Unable to find session with ID");
        assert!(lost.is_transient());

        let other = CrawlError::from_driver_message("navigating", "invalid argument: url");
        assert!(!other.is_transient());
        assert!(!other.is_stale());
    }
}
