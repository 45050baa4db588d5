use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use tweetdrop::api::SearchClient;
use tweetdrop::config::{AppConfig, CONFIG_PATH, conversation_id_from};
use tweetdrop::engine;
use tweetdrop::logger::EventLogger;
use tweetdrop::output;
use tweetdrop::{DEFAULT_CHUNK_SIZE, DEFAULT_SEARCH_BASE};

#[derive(Parser)]
#[command(
    name = "tweetdrop",
    about = "Scrape a 'drop your address' thread into an airdrop recipient list"
)]
struct Args {
    /// Thread status URL or bare conversation id (the trailing digits of the URL)
    #[arg(long)]
    thread: String,

    /// Tokens per recipient in the disperse output (0 omits the amount column)
    #[arg(long, default_value_t = 0)]
    amount: u64,

    /// Addresses per output chunk
    #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
    chunk_size: usize,

    /// Config file path (missing file falls back to defaults)
    #[arg(long, default_value = CONFIG_PATH)]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    if args.chunk_size == 0 {
        anyhow::bail!("--chunk-size must be positive");
    }

    let config = AppConfig::load_or_default(&args.config)?;
    let conversation_id = conversation_id_from(&args.thread)?;
    info!("Scraping conversation {conversation_id}");

    let bearer = config
        .bearer
        .clone()
        .or_else(|| std::env::var("TWITTER_BEARER").ok());
    let search_base = config
        .search_base
        .clone()
        .unwrap_or_else(|| DEFAULT_SEARCH_BASE.to_string());

    let client = SearchClient::new(search_base, conversation_id, bearer);
    let strategy = config.resolver_strategy()?;
    let mut logger = EventLogger::new();

    let resolved = engine::run_pipeline(&client, &strategy, &mut logger).await?;

    let addresses = output::dedup_addresses(&resolved);
    info!("{} unique addresses after dedup", addresses.len());

    // stdout carries only the two paste-ready renderings; logs go to stderr.
    // An empty run prints nothing.
    let report = output::render_report(&addresses, args.amount, args.chunk_size);
    if !report.is_empty() {
        println!("{report}");
    }

    Ok(())
}
