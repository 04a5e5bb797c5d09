use career_crawl::CrawlConfig;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "career-crawl")]
#[command(about = "Crawls a career site and extracts job postings with a language model")]
#[command(version)]
pub struct Args {
    /// Career page to start from (overrides the config file)
    pub url: Option<String>,

    /// Path to JSON configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Levels of job links followed below the start page
    #[arg(short = 'd', long)]
    pub max_depth: Option<usize>,

    /// Job links followed from each page
    #[arg(short = 'b', long)]
    pub max_breadth: Option<usize>,

    /// WebDriver server address
    #[arg(long)]
    pub webdriver_url: Option<String>,

    /// Language model identifier
    #[arg(short, long)]
    pub model: Option<String>,

    /// Write postings to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Csv)]
    pub format: OutputFormat,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Csv,
    Json,
}

impl Args {
    /// Build the crawl configuration: defaults, then the config file, then
    /// environment variables, then command-line flags
    pub fn to_config(&self) -> Result<CrawlConfig, career_crawl::CrawlError> {
        let mut config = match &self.config {
            Some(path) => CrawlConfig::from_file(path)?,
            None => CrawlConfig::new(""),
        };
        config = config.with_env_overrides();

        if let Some(url) = &self.url {
            config.start_url = url.clone();
        }
        if let Some(max_depth) = self.max_depth {
            config.max_depth = max_depth;
        }
        if let Some(max_breadth) = self.max_breadth {
            config.max_breadth = max_breadth;
        }
        if let Some(webdriver_url) = &self.webdriver_url {
            config.webdriver_url = webdriver_url.clone();
        }
        if let Some(model) = &self.model {
            config.oracle.model = model.clone();
        }

        config.validate()?;
        Ok(config)
    }
}
