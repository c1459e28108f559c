/// AggregatorV3 interface descriptor
///
/// The ABI is parsed and checked once when a `FeedInterface` is built, so every
/// later call can encode and decode without re-validating signatures.

use ethers::abi::{Abi, Function, ParamType, StateMutability};

use crate::error::{FeedError, Result};

/// AggregatorV3Interface ABI
pub const AGGREGATOR_V3_ABI: &str = r#"[{"inputs":[],"name":"decimals","outputs":[{"internalType":"uint8","name":"","type":"uint8"}],"stateMutability":"view","type":"function"},{"inputs":[],"name":"description","outputs":[{"internalType":"string","name":"","type":"string"}],"stateMutability":"view","type":"function"},{"inputs":[{"internalType":"uint80","name":"_roundId","type":"uint80"}],"name":"getRoundData","outputs":[{"internalType":"uint80","name":"roundId","type":"uint80"},{"internalType":"int256","name":"answer","type":"int256"},{"internalType":"uint256","name":"startedAt","type":"uint256"},{"internalType":"uint256","name":"updatedAt","type":"uint256"},{"internalType":"uint80","name":"answeredInRound","type":"uint80"}],"stateMutability":"view","type":"function"},{"inputs":[],"name":"latestRoundData","outputs":[{"internalType":"uint80","name":"roundId","type":"uint80"},{"internalType":"int256","name":"answer","type":"int256"},{"internalType":"uint256","name":"startedAt","type":"uint256"},{"internalType":"uint256","name":"updatedAt","type":"uint256"},{"internalType":"uint80","name":"answeredInRound","type":"uint80"}],"stateMutability":"view","type":"function"},{"inputs":[],"name":"version","outputs":[{"internalType":"uint256","name":"","type":"uint256"}],"stateMutability":"view","type":"function"}]"#;

/// (roundId, answer, startedAt, updatedAt, answeredInRound)
fn round_outputs() -> Vec<ParamType> {
    vec![
        ParamType::Uint(80),
        ParamType::Int(256),
        ParamType::Uint(256),
        ParamType::Uint(256),
        ParamType::Uint(80),
    ]
}

/// Validated set of read-only feed functions.
/// Only `latestRoundData` is mandatory; the others are checked when present.
#[derive(Debug, Clone)]
pub struct FeedInterface {
    latest_round_data: Function,
    get_round_data: Option<Function>,
    decimals: Option<Function>,
    description: Option<Function>,
    version: Option<Function>,
}

impl FeedInterface {
    /// The standard AggregatorV3 descriptor
    pub fn aggregator_v3() -> Result<Self> {
        Self::from_json(AGGREGATOR_V3_ABI)
    }

    /// Parse a JSON ABI and validate it
    pub fn from_json(json: &str) -> Result<Self> {
        let abi: Abi = serde_json::from_str(json)
            .map_err(|e| FeedError::Config(format!("invalid ABI JSON: {}", e)))?;
        Self::from_abi(&abi)
    }

    pub fn from_abi(abi: &Abi) -> Result<Self> {
        let latest_round_data = lookup(abi, "latestRoundData")?.ok_or_else(|| {
            FeedError::Config("interface does not declare latestRoundData".to_string())
        })?;
        check_signature(&latest_round_data, &[], &round_outputs())?;

        let get_round_data = lookup(abi, "getRoundData")?;
        if let Some(function) = &get_round_data {
            check_signature(function, &[ParamType::Uint(80)], &round_outputs())?;
        }

        let decimals = lookup(abi, "decimals")?;
        if let Some(function) = &decimals {
            check_signature(function, &[], &[ParamType::Uint(8)])?;
        }

        let description = lookup(abi, "description")?;
        if let Some(function) = &description {
            check_signature(function, &[], &[ParamType::String])?;
        }

        let version = lookup(abi, "version")?;
        if let Some(function) = &version {
            check_signature(function, &[], &[ParamType::Uint(256)])?;
        }

        Ok(Self {
            latest_round_data,
            get_round_data,
            decimals,
            description,
            version,
        })
    }

    pub fn latest_round_data(&self) -> &Function {
        &self.latest_round_data
    }

    pub fn get_round_data(&self) -> Result<&Function> {
        declared(&self.get_round_data, "getRoundData")
    }

    pub fn decimals(&self) -> Result<&Function> {
        declared(&self.decimals, "decimals")
    }

    pub fn description(&self) -> Result<&Function> {
        declared(&self.description, "description")
    }

    pub fn version(&self) -> Result<&Function> {
        declared(&self.version, "version")
    }
}

fn declared<'a>(function: &'a Option<Function>, name: &str) -> Result<&'a Function> {
    function
        .as_ref()
        .ok_or_else(|| FeedError::Config(format!("interface does not declare {}", name)))
}

/// Find a function by name. Overloads are rejected since calls are dispatched by name.
fn lookup(abi: &Abi, name: &str) -> Result<Option<Function>> {
    match abi.functions.get(name).map(Vec::as_slice) {
        None | Some([]) => Ok(None),
        Some([function]) => Ok(Some(function.clone())),
        Some(overloads) => Err(FeedError::Config(format!(
            "{} is overloaded ({} variants)",
            name,
            overloads.len()
        ))),
    }
}

/// Pre-0.5 ABI exports only carry `"constant": true`, which ethabi reads as nonpayable
#[allow(deprecated)]
fn is_read_only(function: &Function) -> bool {
    matches!(
        function.state_mutability,
        StateMutability::View | StateMutability::Pure
    ) || function.constant == Some(true)
}

fn check_signature(function: &Function, inputs: &[ParamType], outputs: &[ParamType]) -> Result<()> {
    if !is_read_only(function) {
        return Err(FeedError::Config(format!(
            "{} is not read-only ({:?})",
            function.name, function.state_mutability
        )));
    }

    let declared_inputs: Vec<ParamType> = function.inputs.iter().map(|p| p.kind.clone()).collect();
    if declared_inputs != inputs {
        return Err(FeedError::Config(format!(
            "{} takes {:?}, expected {:?}",
            function.name, declared_inputs, inputs
        )));
    }

    let declared_outputs: Vec<ParamType> = function.outputs.iter().map(|p| p.kind.clone()).collect();
    if declared_outputs != outputs {
        return Err(FeedError::Config(format!(
            "{} returns {:?}, expected {:?}",
            function.name, declared_outputs, outputs
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aggregator_v3_descriptor() {
        let interface = FeedInterface::aggregator_v3().unwrap();

        assert_eq!(interface.latest_round_data().short_signature(), [0xfe, 0xaf, 0x96, 0x8c]);
        assert_eq!(interface.get_round_data().unwrap().short_signature(), [0x9a, 0x6f, 0xc8, 0xf5]);
        assert_eq!(interface.decimals().unwrap().short_signature(), [0x31, 0x3c, 0xe5, 0x67]);
        assert_eq!(interface.description().unwrap().short_signature(), [0x72, 0x84, 0xe4, 0x16]);
        assert_eq!(interface.version().unwrap().short_signature(), [0x54, 0xfd, 0x4d, 0x50]);
    }

    #[test]
    fn test_latest_round_data_is_required() {
        let json = r#"[{"inputs":[],"name":"decimals","outputs":[{"name":"","type":"uint8"}],"stateMutability":"view","type":"function"}]"#;
        let err = FeedInterface::from_json(json).unwrap_err();
        assert!(matches!(err, FeedError::Config(_)));
    }

    #[test]
    fn test_rejects_wrong_output_widths() {
        // answer declared as uint256 instead of int256
        let json = r#"[{"inputs":[],"name":"latestRoundData","outputs":[{"name":"roundId","type":"uint80"},{"name":"answer","type":"uint256"},{"name":"startedAt","type":"uint256"},{"name":"updatedAt","type":"uint256"},{"name":"answeredInRound","type":"uint80"}],"stateMutability":"view","type":"function"}]"#;
        let err = FeedInterface::from_json(json).unwrap_err();
        assert!(err.to_string().contains("latestRoundData returns"));
    }

    #[test]
    fn test_rejects_arguments_on_latest_round_data() {
        let json = r#"[{"inputs":[{"name":"_roundId","type":"uint80"}],"name":"latestRoundData","outputs":[{"name":"roundId","type":"uint80"},{"name":"answer","type":"int256"},{"name":"startedAt","type":"uint256"},{"name":"updatedAt","type":"uint256"},{"name":"answeredInRound","type":"uint80"}],"stateMutability":"view","type":"function"}]"#;
        let err = FeedInterface::from_json(json).unwrap_err();
        assert!(err.to_string().contains("latestRoundData takes"));
    }

    #[test]
    fn test_rejects_state_changing_function() {
        let json = AGGREGATOR_V3_ABI.replace(
            r#""name":"version","outputs":[{"internalType":"uint256","name":"","type":"uint256"}],"stateMutability":"view""#,
            r#""name":"version","outputs":[{"internalType":"uint256","name":"","type":"uint256"}],"stateMutability":"nonpayable""#,
        );
        let err = FeedInterface::from_json(&json).unwrap_err();
        assert!(err.to_string().contains("version is not read-only"));
    }

    #[test]
    fn test_accepts_legacy_constant_flag() {
        let json = r#"[{"constant":true,"inputs":[],"name":"latestRoundData","outputs":[{"name":"roundId","type":"uint80"},{"name":"answer","type":"int256"},{"name":"startedAt","type":"uint256"},{"name":"updatedAt","type":"uint256"},{"name":"answeredInRound","type":"uint80"}],"payable":false,"type":"function"},{"constant":true,"inputs":[],"name":"decimals","outputs":[{"name":"","type":"uint8"}],"payable":false,"type":"function"}]"#;
        let interface = FeedInterface::from_json(json).unwrap();
        assert_eq!(interface.latest_round_data().short_signature(), [0xfe, 0xaf, 0x96, 0x8c]);
        assert!(interface.decimals().is_ok());

        let writable = json.replacen(r#""constant":true"#, r#""constant":false"#, 1);
        assert!(FeedInterface::from_json(&writable).is_err());
    }

    #[test]
    fn test_optional_functions_may_be_missing() {
        let json = r#"[{"inputs":[],"name":"latestRoundData","outputs":[{"name":"roundId","type":"uint80"},{"name":"answer","type":"int256"},{"name":"startedAt","type":"uint256"},{"name":"updatedAt","type":"uint256"},{"name":"answeredInRound","type":"uint80"}],"stateMutability":"view","type":"function"}]"#;
        let interface = FeedInterface::from_json(json).unwrap();
        assert!(interface.decimals().is_err());
        assert!(interface.get_round_data().is_err());
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(
            FeedInterface::from_json("not an abi"),
            Err(FeedError::Config(_))
        ));
    }
}
