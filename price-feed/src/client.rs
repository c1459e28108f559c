/// Price feed client
///
/// `PriceFeedReader` is a caller-owned bundle of endpoint, contract address and
/// validated interface. Every read is one `eth_call` against the latest block:
/// no retries, no batching, nothing cached between calls.

use ethers::abi::{Function, Token};
use ethers::types::{Address, U256};
use ethers::utils::to_checksum;
use reqwest::{Client, Url};
use rpc_protocol::{decode_hex, RpcError, RpcResponse};
use std::time::Duration;

use crate::abi::FeedInterface;
use crate::config::{parse_address, parse_endpoint, FeedConfig, DEFAULT_TIMEOUT_SECS};
use crate::error::{FeedError, Result};
use crate::round::{self, RoundData, UINT80_MAX};

/// Geth/erigon report reverts with this JSON-RPC error code
const EXECUTION_REVERTED: i64 = 3;

pub struct PriceFeedReader {
    http: Client,
    endpoint: Url,
    address: Address,
    interface: FeedInterface,
}

impl PriceFeedReader {
    /// Create a reader with the default request timeout
    pub fn new(endpoint: &str, address: &str, interface: FeedInterface) -> Result<Self> {
        Self::with_timeout(
            endpoint,
            address,
            interface,
            Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        )
    }

    pub fn with_timeout(
        endpoint: &str,
        address: &str,
        interface: FeedInterface,
        timeout: Duration,
    ) -> Result<Self> {
        let endpoint = parse_endpoint(endpoint)?;
        let address = parse_address(address)?;

        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FeedError::Config(format!("cannot build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            endpoint,
            address,
            interface,
        })
    }

    /// Reader for the AggregatorV3 interface using loaded configuration
    pub fn from_config(config: &FeedConfig) -> Result<Self> {
        Self::with_timeout(
            &config.rpc_url,
            &config.feed_address,
            FeedInterface::aggregator_v3()?,
            config.timeout,
        )
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// `latestRoundData()`
    pub async fn fetch_latest_round_data(&self) -> Result<RoundData> {
        let tokens = self.call(self.interface.latest_round_data(), &[]).await?;
        let round = RoundData::from_tokens(tokens)?;
        tracing::info!("✓ Latest round {} answer={}", round.round_id, round.answer);
        Ok(round)
    }

    /// `getRoundData(uint80)`
    pub async fn get_round_data(&self, round_id: u128) -> Result<RoundData> {
        if round_id > UINT80_MAX {
            return Err(FeedError::Config(format!(
                "round id {} does not fit in uint80",
                round_id
            )));
        }

        let function = self.interface.get_round_data()?;
        let tokens = self
            .call(function, &[Token::Uint(U256::from(round_id))])
            .await?;
        RoundData::from_tokens(tokens)
    }

    /// `decimals()`
    pub async fn decimals(&self) -> Result<u8> {
        let tokens = self.call(self.interface.decimals()?, &[]).await?;
        let value = round::uint256(single(tokens)?, "decimals")?;
        if value > U256::from(u8::MAX) {
            return Err(FeedError::Decode(format!(
                "decimals = {} does not fit in uint8",
                value
            )));
        }
        Ok(value.low_u32() as u8)
    }

    /// `description()`
    pub async fn description(&self) -> Result<String> {
        let tokens = self.call(self.interface.description()?, &[]).await?;
        match single(tokens)? {
            Token::String(description) => Ok(description),
            other => Err(FeedError::Decode(format!(
                "description: expected string, got {:?}",
                other
            ))),
        }
    }

    /// `version()`
    pub async fn version(&self) -> Result<U256> {
        let tokens = self.call(self.interface.version()?, &[]).await?;
        round::uint256(single(tokens)?, "version")
    }

    /// Encode, call, decode
    async fn call(&self, function: &Function, args: &[Token]) -> Result<Vec<Token>> {
        let call_data = function
            .encode_input(args)
            .map_err(|e| FeedError::Config(format!("cannot encode {} call: {}", function.name, e)))?;

        tracing::info!(
            "→ {}() on {} via {}",
            function.name,
            to_checksum(&self.address, None),
            self.endpoint
        );

        let data = self.eth_call(&call_data).await?;
        Ok(function.decode_output(&data)?)
    }

    /// One JSON-RPC `eth_call`, returning the raw return data
    async fn eth_call(&self, call_data: &[u8]) -> Result<Vec<u8>> {
        let to = to_checksum(&self.address, None);
        let request = rpc_protocol::eth_call(&to, call_data, 1);
        tracing::debug!("eth_call data: {}", rpc_protocol::encode_hex(call_data));

        let response = self
            .http
            .post(self.endpoint.clone())
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("✗ Request to {} failed: {}", self.endpoint, e);
                FeedError::from(e)
            })?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(FeedError::Transport(format!(
                "HTTP {} from {}: {}",
                status, self.endpoint, body
            )));
        }

        let response: RpcResponse = serde_json::from_str(&body).map_err(|e| {
            FeedError::Transport(format!("malformed JSON-RPC response: {}", e))
        })?;

        let result = match response.into_outcome() {
            Some(Ok(result)) => result,
            Some(Err(error)) => return Err(classify_rpc_error(error)),
            None => {
                return Err(FeedError::Transport(
                    "JSON-RPC response has neither result nor error".to_string(),
                ))
            }
        };

        let hex = result.as_str().ok_or_else(|| {
            FeedError::Decode(format!("eth_call result is not a hex string: {}", result))
        })?;
        let data = decode_hex(hex)
            .map_err(|e| FeedError::Decode(format!("eth_call result is not valid hex: {}", e)))?;
        tracing::debug!("eth_call returned {} bytes", data.len());

        // A call to an address without code succeeds with empty return data
        if data.is_empty() {
            tracing::warn!("⚠ Empty return data from {}", to);
            return Err(FeedError::ContractCall(format!(
                "no contract code at {} (empty return data)",
                to
            )));
        }

        Ok(data)
    }
}

/// Reverts are contract failures; any other node error is a transport problem
fn classify_rpc_error(error: RpcError) -> FeedError {
    if error.code == EXECUTION_REVERTED || error.message.to_lowercase().contains("revert") {
        tracing::error!("✗ Contract call reverted: {}", error);
        FeedError::ContractCall(error.to_string())
    } else {
        tracing::error!("✗ Node rejected eth_call: {}", error);
        FeedError::Transport(format!("node returned error {}", error))
    }
}

fn single(tokens: Vec<Token>) -> Result<Token> {
    let count = tokens.len();
    let mut tokens = tokens.into_iter();
    match (tokens.next(), count) {
        (Some(token), 1) => Ok(token),
        _ => Err(FeedError::Decode(format!(
            "expected 1 return value, got {}",
            count
        ))),
    }
}
