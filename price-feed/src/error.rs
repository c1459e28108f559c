use thiserror::Error;

pub type Result<T> = std::result::Result<T, FeedError>;

/// Everything a price feed read can fail with. None of these are retried.
#[derive(Debug, Error)]
pub enum FeedError {
    /// Endpoint unreachable, timed out, or answered with something that is not a JSON-RPC response
    #[error("transport error: {0}")]
    Transport(String),

    /// Return data does not match the declared output types
    #[error("decode error: {0}")]
    Decode(String),

    /// The node ran the call and it reverted, or there is no contract code at the address
    #[error("contract call failed: {0}")]
    ContractCall(String),

    /// Invalid endpoint, address, interface descriptor or argument, caught before any request
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl From<reqwest::Error> for FeedError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FeedError::Transport(format!("request timed out: {}", err))
        } else {
            FeedError::Transport(err.to_string())
        }
    }
}

impl From<ethers::abi::Error> for FeedError {
    fn from(err: ethers::abi::Error) -> Self {
        FeedError::Decode(err.to_string())
    }
}
