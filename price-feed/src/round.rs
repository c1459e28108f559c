use ethers::abi::Token;
use ethers::types::{I256, U256};
use serde_json::{json, Value};
use std::fmt;

use crate::error::{FeedError, Result};

/// Largest value a `uint80` can hold
pub const UINT80_MAX: u128 = (1u128 << 80) - 1;

/// One round reported by a price feed.
/// Field order and widths follow `latestRoundData()` / `getRoundData(uint80)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundData {
    /// uint80
    pub round_id: u128,
    /// int256, no range check (a feed may report zero or negative values)
    pub answer: I256,
    /// uint256 unix timestamp
    pub started_at: U256,
    /// uint256 unix timestamp
    pub updated_at: U256,
    /// uint80
    pub answered_in_round: u128,
}

impl RoundData {
    /// Build from the decoded return values of a round accessor
    pub fn from_tokens(tokens: Vec<Token>) -> Result<Self> {
        let [round_id, answer, started_at, updated_at, answered_in_round]: [Token; 5] = tokens
            .try_into()
            .map_err(|tokens: Vec<Token>| {
                FeedError::Decode(format!("expected 5 return values, got {}", tokens.len()))
            })?;

        Ok(Self {
            round_id: uint80(round_id, "roundId")?,
            answer: int256(answer, "answer")?,
            started_at: uint256(started_at, "startedAt")?,
            updated_at: uint256(updated_at, "updatedAt")?,
            answered_in_round: uint80(answered_in_round, "answeredInRound")?,
        })
    }

    /// JSON view with every integer as a decimal string
    pub fn to_json(&self) -> Value {
        json!({
            "roundId": self.round_id.to_string(),
            "answer": self.answer.to_string(),
            "startedAt": self.started_at.to_string(),
            "updatedAt": self.updated_at.to_string(),
            "answeredInRound": self.answered_in_round.to_string(),
        })
    }
}

/// Literal tuple form: (roundId, answer, startedAt, updatedAt, answeredInRound)
impl fmt::Display for RoundData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}, {}, {}, {})",
            self.round_id, self.answer, self.started_at, self.updated_at, self.answered_in_round
        )
    }
}

pub(crate) fn uint80(token: Token, field: &str) -> Result<u128> {
    let value = uint256(token, field)?;
    if value > U256::from(UINT80_MAX) {
        return Err(FeedError::Decode(format!(
            "{} = {} does not fit in uint80",
            field, value
        )));
    }
    Ok(value.as_u128())
}

pub(crate) fn uint256(token: Token, field: &str) -> Result<U256> {
    match token {
        Token::Uint(value) => Ok(value),
        other => Err(FeedError::Decode(format!(
            "{}: expected uint, got {:?}",
            field, other
        ))),
    }
}

fn int256(token: Token, field: &str) -> Result<I256> {
    match token {
        Token::Int(raw) => Ok(I256::from_raw(raw)),
        other => Err(FeedError::Decode(format!(
            "{}: expected int, got {:?}",
            field, other
        ))),
    }
}
