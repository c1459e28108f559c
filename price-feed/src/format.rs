use ethers::types::I256;
use ethers::utils::format_units;

use crate::error::{FeedError, Result};

/// Largest scale `format_units` handles for a signed value (10^77 overflows int256)
pub const MAX_DECIMALS: u8 = 76;

/// Render a raw feed answer as a fixed-point decimal with `decimals` fractional digits.
/// Fails with `Decode` above `MAX_DECIMALS`.
pub fn format_answer(answer: I256, decimals: u8) -> Result<String> {
    if decimals == 0 {
        return Ok(answer.to_string());
    }
    if decimals > MAX_DECIMALS {
        return Err(FeedError::Decode(format!(
            "cannot format answer with {} decimals (max {})",
            decimals, MAX_DECIMALS
        )));
    }

    format_units(answer, u32::from(decimals))
        .map_err(|e| FeedError::Decode(format!("cannot format answer with {} decimals: {}", decimals, e)))
}
