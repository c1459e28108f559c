/// JSON-RPC 2.0 envelope for talking to EVM nodes
/// This library provides the request/response types and hex helpers
/// that both the price feed client and its test endpoints use.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;

pub const JSONRPC_VERSION: &str = "2.0";

/// Block tag every read is issued against
pub const LATEST_BLOCK: &str = "latest";

/// JSON-RPC request sent to the node
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RpcRequest {
    pub jsonrpc: String,
    pub method: String,
    #[serde(default)]
    pub params: Value,
    pub id: Value,
}

impl RpcRequest {
    pub fn new(method: &str, params: Value, id: u64) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            method: method.to_string(),
            params,
            id: json!(id),
        }
    }
}

/// Build a read-only `eth_call` against the latest block
/// `to` is passed through as given; `call_data` is selector + encoded args
pub fn eth_call(to: &str, call_data: &[u8], id: u64) -> RpcRequest {
    RpcRequest::new(
        "eth_call",
        json!([
            {
                "to": to,
                "data": encode_hex(call_data),
            },
            LATEST_BLOCK
        ]),
        id,
    )
}

/// Error object returned by the node (reverts land here)
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
    /// Revert data, usually 0x-hex
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl fmt::Display for RpcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "code {}: {}", self.code, self.message)?;
        if let Some(data) = &self.data {
            write!(f, " (data: {})", data)?;
        }
        Ok(())
    }
}

/// JSON-RPC response from the node
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RpcResponse {
    #[serde(default)]
    pub jsonrpc: String,
    #[serde(default)]
    pub id: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

impl RpcResponse {
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(id: Value, error: RpcError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: None,
            error: Some(error),
        }
    }

    /// Split into the result or the error object.
    /// Returns `None` when the node sent neither, which is a malformed response.
    /// An error object wins over a result if a node sends both.
    pub fn into_outcome(self) -> Option<Result<Value, RpcError>> {
        match (self.error, self.result) {
            (Some(error), _) => Some(Err(error)),
            (None, Some(result)) => Some(Ok(result)),
            (None, None) => None,
        }
    }
}

/// Encode bytes as 0x-prefixed lowercase hex
pub fn encode_hex(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// Decode hex with or without the 0x prefix
pub fn decode_hex(value: &str) -> Result<Vec<u8>, hex::FromHexError> {
    hex::decode(value.strip_prefix("0x").unwrap_or(value))
}
