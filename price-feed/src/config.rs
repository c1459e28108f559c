/// Reader configuration
///
/// Endpoint and feed address are compiled-in defaults (the BSC testnet AAVE/USD feed)
/// that can be overridden through the environment or a `.env` file:
/// - RPC_URL:            JSON-RPC endpoint (wins over FEED_NETWORK)
/// - FEED_NETWORK:       bsc-testnet | bsc-mainnet, picks a default endpoint
/// - PRICE_FEED_ADDRESS: aggregator contract address
/// - RPC_TIMEOUT_SECS:   per-request timeout
/// - FEED_OUTPUT:        tuple | json
/// - FEED_SHOW_PRICE:    true | false, also print the answer scaled by decimals()

use ethers::types::Address;
use ethers::utils::to_checksum;
use reqwest::Url;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{FeedError, Result};

pub const DEFAULT_RPC_URL: &str = "https://bsc-testnet-rpc.publicnode.com";
pub const DEFAULT_FEED_ADDRESS: &str = "0x298619601ebCd58d0b526963Deb2365B485Edc74";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Networks with a known public endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Network {
    BscTestnet,
    BscMainnet,
}

impl Network {
    pub fn rpc_url(&self) -> &'static str {
        match self {
            Network::BscTestnet => DEFAULT_RPC_URL,
            Network::BscMainnet => "https://bsc-dataseed.binance.org/",
        }
    }

    pub fn chain_id(&self) -> u64 {
        match self {
            Network::BscTestnet => 97,
            Network::BscMainnet => 56,
        }
    }
}

impl FromStr for Network {
    type Err = FeedError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "bsc-testnet" | "bsctestnet" => Ok(Network::BscTestnet),
            "bsc-mainnet" | "bscmainnet" | "bsc" => Ok(Network::BscMainnet),
            other => Err(FeedError::Config(format!("unknown network: {}", other))),
        }
    }
}

/// How the binary prints a round
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Tuple,
    Json,
}

impl FromStr for OutputFormat {
    type Err = FeedError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "tuple" => Ok(OutputFormat::Tuple),
            "json" => Ok(OutputFormat::Json),
            other => Err(FeedError::Config(format!("unknown output format: {}", other))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FeedConfig {
    /// Preset chosen through FEED_NETWORK, if any
    pub network: Option<Network>,
    pub rpc_url: String,
    pub feed_address: String,
    pub timeout: Duration,
    pub output: OutputFormat,
    pub show_price: bool,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            network: None,
            rpc_url: DEFAULT_RPC_URL.to_string(),
            feed_address: DEFAULT_FEED_ADDRESS.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            output: OutputFormat::Tuple,
            show_price: false,
        }
    }
}

impl FeedConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env` but reads variables through `lookup`
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let network = match lookup("FEED_NETWORK") {
            Some(network) => Some(network.parse::<Network>()?),
            None => None,
        };

        let rpc_url = match (lookup("RPC_URL"), network) {
            (Some(url), _) => url,
            (None, Some(network)) => network.rpc_url().to_string(),
            (None, None) => DEFAULT_RPC_URL.to_string(),
        };

        let feed_address = lookup("PRICE_FEED_ADDRESS")
            .unwrap_or_else(|| DEFAULT_FEED_ADDRESS.to_string());

        let timeout = match lookup("RPC_TIMEOUT_SECS") {
            Some(secs) => {
                let secs = secs
                    .parse::<u64>()
                    .map_err(|e| FeedError::Config(format!("RPC_TIMEOUT_SECS: {}", e)))?;
                if secs == 0 {
                    return Err(FeedError::Config("RPC_TIMEOUT_SECS must be positive".to_string()));
                }
                Duration::from_secs(secs)
            }
            None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        let output = match lookup("FEED_OUTPUT") {
            Some(format) => format.parse()?,
            None => OutputFormat::Tuple,
        };

        let show_price = lookup("FEED_SHOW_PRICE")
            .map(|v| v.to_lowercase() == "true")
            .unwrap_or(false);

        Ok(Self {
            network,
            rpc_url,
            feed_address,
            timeout,
            output,
            show_price,
        })
    }
}

/// Validate a JSON-RPC endpoint: absolute http(s) URL with a host
pub fn parse_endpoint(url: &str) -> Result<Url> {
    let parsed = Url::parse(url)
        .map_err(|e| FeedError::Config(format!("invalid endpoint {:?}: {}", url, e)))?;

    match parsed.scheme() {
        "http" | "https" => {}
        other => {
            return Err(FeedError::Config(format!(
                "unsupported endpoint scheme {:?} (expected http or https)",
                other
            )))
        }
    }

    if parsed.host_str().is_none() {
        return Err(FeedError::Config(format!("endpoint {:?} has no host", url)));
    }

    Ok(parsed)
}

/// Parse a 0x-prefixed 20-byte address.
/// Mixed-case input must carry a valid EIP-55 checksum; single-case input is taken as-is.
pub fn parse_address(value: &str) -> Result<Address> {
    let body = value
        .strip_prefix("0x")
        .ok_or_else(|| FeedError::Config(format!("address {:?} must start with 0x", value)))?;

    if body.len() != 40 || !body.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(FeedError::Config(format!(
            "address {:?} is not 20 hex-encoded bytes",
            value
        )));
    }

    let address = Address::from_str(body)
        .map_err(|e| FeedError::Config(format!("invalid address {:?}: {}", value, e)))?;

    let has_upper = body.chars().any(|c| c.is_ascii_uppercase());
    let has_lower = body.chars().any(|c| c.is_ascii_lowercase());
    if has_upper && has_lower && to_checksum(&address, None) != value {
        return Err(FeedError::Config(format!(
            "address {:?} has an invalid EIP-55 checksum",
            value
        )));
    }

    Ok(address)
}
