/// Price Feed Reader
///
/// Reads the latest round of an AggregatorV3 price feed and prints it as
///   (roundId, answer, startedAt, updatedAt, answeredInRound)
///
/// Configured through environment variables (or a .env file):
///   RPC_URL, FEED_NETWORK, PRICE_FEED_ADDRESS, RPC_TIMEOUT_SECS, FEED_OUTPUT, FEED_SHOW_PRICE
/// Logs go to stderr, filtered by RUST_LOG (default: info).
///
/// Usage: price-feed

use anyhow::Result;
use price_feed::{format_answer, FeedConfig, OutputFormat, PriceFeedReader};
use ethers::utils::to_checksum;
use tracing_subscriber::EnvFilter;

// Load .env file on startup
fn init_env() {
    let _ = dotenv::dotenv();
}

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_env();
    init_logging();

    let config = FeedConfig::from_env()?;
    let reader = PriceFeedReader::from_config(&config)?;

    tracing::info!(
        "Price feed {} via {}",
        to_checksum(&reader.address(), None),
        reader.endpoint()
    );
    if let Some(network) = config.network {
        tracing::info!("Network {:?} (chain id {})", network, network.chain_id());
    }

    let round = reader.fetch_latest_round_data().await?;

    // Opt-in: one extra decimals() call
    let price = if config.show_price {
        let decimals = reader.decimals().await?;
        Some((decimals, format_answer(round.answer, decimals)?))
    } else {
        None
    };

    match config.output {
        OutputFormat::Tuple => {
            println!("{}", round);
            if let Some((_, price)) = &price {
                println!("price: {}", price);
            }
        }
        OutputFormat::Json => {
            let mut value = round.to_json();
            if let Some((decimals, price)) = price {
                value["decimals"] = serde_json::json!(decimals);
                value["price"] = serde_json::json!(price);
            }
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
    }

    Ok(())
}
