//! ABI parsing and constructor encoding
//!
//! Provides the [`Abi`] struct for access to a contract's constructor and
//! turns JSON constructor arguments into ABI-encoded bytes.

use alloy::dyn_abi::{DynSolType, DynSolValue};
use alloy::json_abi::{JsonAbi, Param};
use alloy::primitives::{Address, Bytes, FixedBytes, I256, U256};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

// =============================================================================
// Abi Struct
// =============================================================================

/// Wrapper around alloy's JsonAbi
#[derive(Debug, Clone, Default)]
pub struct Abi(JsonAbi);

impl Abi {
    /// Parse a JSON ABI string into an Abi struct
    pub fn parse(json: &str) -> Result<Self> {
        let abi: JsonAbi = serde_json::from_str(json)
            .map_err(|e| Error::Abi(format!("Failed to parse ABI: {}", e)))?;
        Ok(Self(abi))
    }

    /// Parse from a serde_json::Value
    pub fn from_value(value: &serde_json::Value) -> Result<Self> {
        let abi: JsonAbi = serde_json::from_value(value.clone())
            .map_err(|e| Error::Abi(format!("Failed to parse ABI: {}", e)))?;
        Ok(Self(abi))
    }

    /// Get constructor information if present
    pub fn constructor(&self) -> Option<ConstructorInfo> {
        self.0.constructor.as_ref().map(|c| ConstructorInfo {
            inputs: c.inputs.iter().map(ParamInfo::from_abi_param).collect(),
        })
    }

    /// Check if the contract has a constructor with arguments
    pub fn has_constructor_with_args(&self) -> bool {
        self.0
            .constructor
            .as_ref()
            .is_some_and(|c| !c.inputs.is_empty())
    }

    /// ABI-encode constructor arguments.
    ///
    /// A contract without a constructor accepts only an empty argument list.
    pub fn encode_constructor_args(&self, args: &[serde_json::Value]) -> Result<Vec<u8>> {
        let Some(constructor) = self.constructor() else {
            if args.is_empty() {
                return Ok(Vec::new());
            }
            return Err(Error::InvalidParameter(
                "Contract has no constructor but arguments were provided".to_string(),
            ));
        };

        if args.len() != constructor.inputs.len() {
            return Err(Error::InvalidParameter(format!(
                "Expected {} constructor arguments, got {}",
                constructor.inputs.len(),
                args.len()
            )));
        }

        if args.is_empty() {
            return Ok(Vec::new());
        }

        let mut sol_values = Vec::with_capacity(args.len());
        for (i, (input, value)) in constructor.inputs.iter().zip(args).enumerate() {
            let sol_value = json_to_sol_value(&input.param_type, value).map_err(|e| {
                Error::InvalidParameter(format!("Argument {} ({}): {}", i, input.name, e))
            })?;
            sol_values.push(sol_value);
        }

        Ok(DynSolValue::Tuple(sol_values).abi_encode_params())
    }
}

// =============================================================================
// Constructor Types
// =============================================================================

/// Constructor information extracted from ABI
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConstructorInfo {
    pub inputs: Vec<ParamInfo>,
}

/// Information about a constructor parameter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParamInfo {
    pub name: String,
    pub param_type: String,
}

impl ParamInfo {
    /// Create ParamInfo from an alloy Param
    pub fn from_abi_param(param: &Param) -> Self {
        Self {
            name: param.name.clone(),
            param_type: param.selector_type().into_owned(),
        }
    }
}

// =============================================================================
// JSON -> Solidity values
// =============================================================================

/// Convert a JSON value into a Solidity value of the given type
pub fn json_to_sol_value(
    type_str: &str,
    value: &serde_json::Value,
) -> std::result::Result<DynSolValue, String> {
    let sol_type: DynSolType = type_str
        .parse()
        .map_err(|e| format!("Unknown type '{}': {}", type_str, e))?;
    to_sol_value(&sol_type, value)
}

fn to_sol_value(
    sol_type: &DynSolType,
    value: &serde_json::Value,
) -> std::result::Result<DynSolValue, String> {
    match sol_type {
        DynSolType::Address => {
            let addr_str = value.as_str().ok_or("Expected string for address")?;
            let addr: Address = addr_str
                .parse()
                .map_err(|e| format!("Invalid address '{}': {}", addr_str, e))?;
            Ok(DynSolValue::Address(addr))
        }
        DynSolType::Bool => {
            let b = value.as_bool().ok_or("Expected boolean")?;
            Ok(DynSolValue::Bool(b))
        }
        DynSolType::Uint(bits) => {
            let n = parse_uint(value)?;
            if n.bit_len() > *bits {
                return Err(format!("{} does not fit in uint{}", n, bits));
            }
            Ok(DynSolValue::Uint(n, *bits))
        }
        DynSolType::Int(bits) => {
            let n = parse_int(value)?;
            if !int_fits(n, *bits) {
                return Err(format!("{} does not fit in int{}", n, bits));
            }
            Ok(DynSolValue::Int(n, *bits))
        }
        DynSolType::Bytes => {
            let hex_str = value.as_str().ok_or("Expected hex string for bytes")?;
            let bytes: Bytes = hex_str.parse().map_err(|e| format!("Invalid hex: {}", e))?;
            Ok(DynSolValue::Bytes(bytes.to_vec()))
        }
        DynSolType::String => {
            let s = value.as_str().ok_or("Expected string")?;
            Ok(DynSolValue::String(s.to_string()))
        }
        DynSolType::FixedBytes(size) => {
            let hex_str = value.as_str().ok_or("Expected hex string")?;
            let bytes: Bytes = hex_str.parse().map_err(|e| format!("Invalid hex: {}", e))?;
            if bytes.len() != *size {
                return Err(format!("Expected {} bytes, got {}", size, bytes.len()));
            }
            let mut word = FixedBytes::<32>::ZERO;
            word[..*size].copy_from_slice(&bytes);
            Ok(DynSolValue::FixedBytes(word, *size))
        }
        DynSolType::Array(inner) => {
            let arr = value.as_array().ok_or("Expected array")?;
            let values = arr
                .iter()
                .map(|v| to_sol_value(inner, v))
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(DynSolValue::Array(values))
        }
        DynSolType::Tuple(types) => {
            let arr = value.as_array().ok_or("Expected array for tuple")?;
            if arr.len() != types.len() {
                return Err(format!(
                    "Expected tuple of {} values, got {}",
                    types.len(),
                    arr.len()
                ));
            }
            let values = types
                .iter()
                .zip(arr)
                .map(|(ty, v)| to_sol_value(ty, v))
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(DynSolValue::Tuple(values))
        }
        other => Err(format!("Unsupported type: {}", other)),
    }
}

/// Whether `value` lies in `[-2^(bits-1), 2^(bits-1) - 1]`
fn int_fits(value: I256, bits: usize) -> bool {
    match bits {
        0 => false,
        _ if bits >= 256 => true,
        _ => {
            let limit = U256::from(1) << (bits - 1);
            if value.is_negative() {
                value.unsigned_abs() <= limit
            } else {
                value.into_raw() < limit
            }
        }
    }
}

/// Parse an unsigned integer from a JSON number or decimal/hex string
pub fn parse_uint(value: &serde_json::Value) -> std::result::Result<U256, String> {
    match value {
        serde_json::Value::Number(n) => n
            .as_u64()
            .map(U256::from)
            .ok_or_else(|| "Expected a non-negative integer for uint".to_string()),
        serde_json::Value::String(s) => s
            .parse::<U256>()
            .map_err(|e| format!("Invalid uint: {}", e)),
        _ => Err("Expected number or string for uint".to_string()),
    }
}

/// Parse a signed integer from a JSON number or string
pub fn parse_int(value: &serde_json::Value) -> std::result::Result<I256, String> {
    match value {
        serde_json::Value::Number(n) => {
            let i = n.as_i64().ok_or("Number out of range")?;
            I256::try_from(i).map_err(|e| format!("Invalid int: {}", e))
        }
        serde_json::Value::String(s) => s
            .parse::<I256>()
            .map_err(|e| format!("Invalid int: {}", e)),
        _ => Err("Expected number or string for int".to_string()),
    }
}
