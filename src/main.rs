use career_crawl::CareerCrawl;
use career_crawl::export::{dedup_postings, write_postings_csv, write_postings_json};
use clap::Parser;
use std::error::Error;
use std::fs::File;
use std::io::{self, BufWriter, Write};

mod args;
use args::{Args, OutputFormat};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Pick up OPENAI_API_KEY and friends from a local .env file
    dotenvy::dotenv().ok();

    // Initialize logging
    env_logger::init();

    // Parse command-line arguments
    let args = Args::parse();
    let config = args.to_config()?;

    ::log::info!("Starting career crawl for: {}", config.start_url);
    if config.oracle.api_key.is_none() {
        ::log::warn!("OPENAI_API_KEY is not set, language model requests are unauthenticated");
    }
    ::log::info!(
        "Using WebDriver at {} (a server such as ChromeDriver must be running)",
        config.webdriver_url
    );

    let start_time = std::time::Instant::now();
    let result = CareerCrawl::from_config(config).run().await?;

    let failed = result.failed_urls();
    if !failed.is_empty() {
        ::log::warn!("{} pages could not be crawled: {:?}", failed.len(), failed);
    }

    let postings = dedup_postings(result.postings);
    ::log::info!(
        "Crawling complete - {} unique postings from {} pages in {:.2} seconds",
        postings.len(),
        result
            .visits
            .iter()
            .filter(|v| v.state != career_crawl::VisitState::Skipped)
            .count(),
        start_time.elapsed().as_secs_f64()
    );

    let writer: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(io::stdout().lock()),
    };
    match args.format {
        OutputFormat::Csv => write_postings_csv(&postings, writer)?,
        OutputFormat::Json => write_postings_json(&postings, writer)?,
    }

    Ok(())
}
