use crate::driver::{PageDriver, PageSession};
use crate::error::CrawlError;
use crate::oracle::TextOracle;
use scraper::{Html, Selector};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

type Responder = Box<dyn Fn(&str) -> Result<String, CrawlError> + Send + Sync>;

/// Text oracle answering from a closure and recording every prompt
pub struct ScriptedOracle {
    responder: Responder,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedOracle {
    pub fn new(
        responder: impl Fn(&str) -> Result<String, CrawlError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            responder: Box::new(responder),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Oracle giving the same answer to every prompt
    pub fn replying(answer: &str) -> Self {
        let answer = answer.to_string();
        Self::new(move |_| Ok(answer.clone()))
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

impl TextOracle for ScriptedOracle {
    async fn complete(&self, prompt: &str) -> Result<String, CrawlError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        (self.responder)(prompt)
    }
}

/// Job board language model: links under `/jobs/` are job links, links
/// containing `priority` score 90 and all others 50, and a page's first text
/// line becomes the title of one posting.
pub fn job_board_oracle() -> ScriptedOracle {
    ScriptedOracle::new(|prompt| {
        let url_lines = prompt.lines().filter(|line| line.starts_with("- URL:"));
        if prompt.contains("Determine if the following link") {
            let is_job = url_lines.take(1).any(|line| line.contains("/jobs/"));
            Ok(if is_job { "YES" } else { "" }.to_string())
        } else if prompt.contains("Assign a score") {
            let scores: Vec<_> = url_lines
                .map(|line| if line.contains("priority") { "90" } else { "50" })
                .collect();
            Ok(format!("[{}]", scores.join(", ")))
        } else {
            let title = prompt
                .split_once("Text:\n")
                .and_then(|(_, text)| text.lines().next())
                .unwrap_or_default();
            Ok(format!(r#"[{{"title": "{}"}}]"#, title))
        }
    })
}

#[derive(Debug, Clone)]
struct StaticPage {
    html: String,
    /// Remaining navigation attempts that fail
    failures: usize,
    transient: bool,
}

#[derive(Debug, Default)]
struct SiteLog {
    connects: usize,
    refused_connects: usize,
    closes: usize,
    navigations: Vec<String>,
    remaining_failures: HashMap<String, usize>,
}

/// Page driver serving a fixed map of URL to HTML
#[derive(Clone, Default)]
pub struct StaticSite {
    pages: Arc<HashMap<String, StaticPage>>,
    log: Arc<Mutex<SiteLog>>,
}

impl StaticSite {
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(mut self, url: &str, page: StaticPage) -> Self {
        self.log
            .lock()
            .unwrap()
            .remaining_failures
            .insert(url.to_string(), page.failures);
        Arc::make_mut(&mut self.pages).insert(url.to_string(), page);
        self
    }

    pub fn page(self, url: &str, html: &str) -> Self {
        self.insert(
            url,
            StaticPage {
                html: html.to_string(),
                failures: 0,
                transient: false,
            },
        )
    }

    /// A page whose navigation always fails with a non-transient error
    pub fn broken_page(self, url: &str) -> Self {
        self.insert(
            url,
            StaticPage {
                html: String::new(),
                failures: usize::MAX,
                transient: false,
            },
        )
    }

    /// A page that times out `failures` times before loading
    pub fn flaky_page(self, url: &str, html: &str, failures: usize) -> Self {
        self.insert(
            url,
            StaticPage {
                html: html.to_string(),
                failures,
                transient: true,
            },
        )
    }

    /// Refuse the next `count` connection attempts
    pub fn refuse_connections(self, count: usize) -> Self {
        self.log.lock().unwrap().refused_connects = count;
        self
    }

    pub fn navigations(&self) -> Vec<String> {
        self.log.lock().unwrap().navigations.clone()
    }

    pub fn connects(&self) -> usize {
        self.log.lock().unwrap().connects
    }

    pub fn closes(&self) -> usize {
        self.log.lock().unwrap().closes
    }
}

impl PageDriver for StaticSite {
    type Session = StaticSession;

    async fn connect(&self) -> Result<StaticSession, CrawlError> {
        let mut log = self.log.lock().unwrap();
        log.connects += 1;
        if log.refused_connects > 0 {
            log.refused_connects -= 1;
            return Err(CrawlError::Connect {
                addr: self.address().to_string(),
                reason: "connection refused".to_string(),
            });
        }

        Ok(StaticSession {
            pages: Arc::clone(&self.pages),
            log: Arc::clone(&self.log),
            current: Mutex::new(None),
        })
    }

    fn address(&self) -> &str {
        "static://site"
    }
}

/// Snapshot of an element found on a static page
#[derive(Debug, Clone)]
pub struct StaticElement {
    attrs: HashMap<String, String>,
    text: String,
}

pub struct StaticSession {
    pages: Arc<HashMap<String, StaticPage>>,
    log: Arc<Mutex<SiteLog>>,
    current: Mutex<Option<String>>,
}

impl StaticSession {
    fn current_page(&self) -> Option<&StaticPage> {
        let current = self.current.lock().unwrap().clone()?;
        self.pages.get(&current)
    }
}

impl PageSession for StaticSession {
    type Element = StaticElement;

    async fn navigate(&self, url: &str) -> Result<(), CrawlError> {
        let mut log = self.log.lock().unwrap();
        log.navigations.push(url.to_string());

        let Some(page) = self.pages.get(url) else {
            return Err(CrawlError::Driver {
                context: "navigating".to_string(),
                reason: format!("no page at {}", url),
                transient: false,
            });
        };

        if let Some(remaining) = log.remaining_failures.get_mut(url) {
            if *remaining > 0 {
                *remaining = remaining.saturating_sub(1);
                return Err(CrawlError::Driver {
                    context: "navigating".to_string(),
                    reason: "simulated failure".to_string(),
                    transient: page.transient,
                });
            }
        }

        *self.current.lock().unwrap() = Some(url.to_string());
        Ok(())
    }

    async fn current_url(&self) -> Result<String, CrawlError> {
        Ok(self
            .current
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| "about:blank".to_string()))
    }

    async fn find_elements(&self, selector: &str) -> Result<Vec<StaticElement>, CrawlError> {
        let Some(page) = self.current_page() else {
            return Ok(Vec::new());
        };
        let selector = Selector::parse(selector).map_err(|e| CrawlError::Driver {
            context: "finding elements".to_string(),
            reason: format!("invalid selector: {:?}", e),
            transient: false,
        })?;

        let doc = Html::parse_document(&page.html);
        Ok(doc
            .select(&selector)
            .map(|e| StaticElement {
                attrs: e
                    .value()
                    .attrs()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
                text: e.text().collect::<String>().trim().to_string(),
            })
            .collect())
    }

    async fn attribute(
        &self,
        element: &StaticElement,
        name: &str,
    ) -> Result<Option<String>, CrawlError> {
        if element.attrs.contains_key("data-stale") {
            return Err(CrawlError::StaleElement {
                context: format!("reading {}", name),
            });
        }
        Ok(element.attrs.get(name).cloned())
    }

    async fn text(&self, element: &StaticElement) -> Result<String, CrawlError> {
        Ok(element.text.clone())
    }

    async fn page_source(&self) -> Result<String, CrawlError> {
        Ok(self
            .current_page()
            .map(|page| page.html.clone())
            .unwrap_or_default())
    }

    async fn close(self) -> Result<(), CrawlError> {
        self.log.lock().unwrap().closes += 1;
        Ok(())
    }
}
