/// Price Feed Reader Library
///
/// Reads AggregatorV3 price feeds over JSON-RPC:
/// - fetch_latest_round_data: latest round of a feed
/// - get_round_data, decimals, description, version: the rest of the interface
/// - format_answer: scale a raw answer by the feed's decimals

pub mod abi;
pub mod client;
pub mod config;
pub mod error;
pub mod format;
pub mod round;

#[cfg(test)]
mod mock;

pub use abi::{FeedInterface, AGGREGATOR_V3_ABI};
pub use client::PriceFeedReader;
pub use config::{FeedConfig, Network, OutputFormat};
pub use error::{FeedError, Result};
pub use format::format_answer;
pub use round::RoundData;

/// One-shot read of `latestRoundData()` from `contract_address` through `endpoint`
pub async fn fetch_latest_round_data(
    endpoint: &str,
    contract_address: &str,
    interface: &FeedInterface,
) -> Result<RoundData> {
    PriceFeedReader::new(endpoint, contract_address, interface.clone())?
        .fetch_latest_round_data()
        .await
}
