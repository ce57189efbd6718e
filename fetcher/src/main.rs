use anyhow::{Context, Result};
use clap::Parser;
use corpus::records::save_jsonl;
use corpus::Manifest;
use fetcher::extract::TextExtractor;
use fetcher::{collect, fetch_all, HttpFetcher, Politeness};
use std::path::Path;
use std::time::Duration;
use tracing_subscriber::{fmt, EnvFilter};
use url::Url;

#[derive(Parser, Debug)]
#[command(name = "fetcher")]
#[command(about = "Fetch the documents of a source manifest, one request at a time")]
struct Cli {
    /// Source manifest (JSON)
    #[arg(long)]
    manifest: String,
    /// Output JSONL file for HTML documents
    #[arg(long, default_value = "./data/docs.jsonl")]
    output: String,
    /// Directory for downloaded PDFs
    #[arg(long, default_value = "./data/pdf")]
    pdf_dir: String,
    /// Seconds to wait between consecutive requests
    #[arg(long, default_value_t = 5)]
    delay_secs: u64,
    /// Extra attempts for a failed request
    #[arg(long, default_value_t = 1)]
    retries: u32,
    /// Request timeout seconds
    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,
    /// User-Agent string sent with every request
    #[arg(long, default_value = "wordscope-fetcher/0.1 (+https://example.com/bot)")]
    user_agent: String,
    /// CSS selector for the HTML elements whose text is kept
    #[arg(long, default_value = "body")]
    selector: String,
    /// Skip robots.txt checks
    #[arg(long, default_value_t = false)]
    ignore_robots: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Cli::parse();

    let report = Manifest::load(&args.manifest)?;
    let manifest = report.manifest;
    let base = manifest
        .base_url
        .as_deref()
        .map(Url::parse)
        .transpose()
        .context("manifest base_url is not a valid URL")?;
    let extractor = TextExtractor::new(&args.selector)?;
    let fetcher = HttpFetcher::new(&args.user_agent, Duration::from_secs(args.timeout_secs))?;
    let politeness = Politeness {
        delay: Duration::from_secs(args.delay_secs),
        retries: args.retries,
        respect_robots: !args.ignore_robots,
    };
    tracing::info!(
        sources = manifest.sources.len(),
        rejected = report.rejected.len(),
        delay_secs = args.delay_secs,
        output = %args.output,
        "starting fetch"
    );

    let outcome = fetch_all(&fetcher, base.as_ref(), &manifest.sources, politeness).await;
    let mut failed: Vec<String> = outcome.failed.iter().map(|(name, _)| name.clone()).collect();
    let collected = collect(outcome, &manifest, &extractor, Path::new(&args.pdf_dir));
    failed.extend(collected.failed.iter().cloned());
    save_jsonl(&args.output, &collected.records)?;

    tracing::info!(
        documents = collected.records.len(),
        pdfs = collected.pdfs.len(),
        empty = collected.empty.len(),
        failed = failed.len(),
        rejected = report.rejected.len(),
        output = %args.output,
        "done"
    );
    for name in &failed {
        tracing::warn!(%name, "not fetched");
    }
    for err in &report.rejected {
        tracing::warn!(error = %err, "not fetched");
    }
    Ok(())
}
