//! Bytecode handling utilities
//!
//! Compiler output for a contract that calls external libraries is not valid
//! hex: every call site carries a 40-character placeholder marker where the
//! library address will go. [`BytecodeTemplate`] holds that unlinked form and
//! [`Bytecode`] holds the fully linked, deployable bytes.

use alloy::primitives::{keccak256, Address};

use crate::error::{Error, Result};

/// Width of a library placeholder marker in hex characters (20 bytes)
pub const PLACEHOLDER_LEN: usize = 40;

/// Prefix shared by every placeholder marker
const PLACEHOLDER_PREFIX: &str = "__";

/// Represents compiled, fully linked contract bytecode
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bytecode {
    bytes: Vec<u8>,
}

impl Bytecode {
    /// Create bytecode from a hex string (with or without 0x prefix)
    pub fn from_hex(hex: &str) -> Result<Self> {
        let clean = hex.trim_start_matches("0x");
        if clean.is_empty() {
            return Ok(Self { bytes: Vec::new() });
        }
        let bytes = hex::decode(clean)?;
        Ok(Self { bytes })
    }

    /// Compute the keccak256 hash of the bytecode
    pub fn hash(&self) -> String {
        if self.bytes.is_empty() {
            return String::new();
        }
        format!("{:x}", keccak256(&self.bytes))
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Get the bytecode length in bytes
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Get the raw bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

}

/// Unlinked bytecode as emitted by the compiler.
///
/// Holds lowercase hex text without the `0x` prefix. Any region starting
/// with `__` on a byte boundary is a placeholder marker spanning
/// [`PLACEHOLDER_LEN`] characters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BytecodeTemplate {
    hex: String,
}

impl BytecodeTemplate {
    /// Parse compiler output, checking that everything outside placeholder
    /// markers is valid hex.
    pub fn parse(hex: &str) -> Result<Self> {
        let clean = hex.trim().trim_start_matches("0x");
        if !clean.is_ascii() {
            return Err(Error::InvalidParameter("bytecode is not ASCII hex".into()));
        }
        if clean.len() % 2 != 0 {
            return Err(Error::InvalidParameter(format!(
                "bytecode has odd length {}",
                clean.len()
            )));
        }

        let text = clean.as_bytes();
        let mut i = 0;
        while i < text.len() {
            if clean[i..].starts_with(PLACEHOLDER_PREFIX) {
                if i + PLACEHOLDER_LEN > text.len() {
                    return Err(Error::InvalidParameter(format!(
                        "truncated placeholder at byte {}",
                        i / 2
                    )));
                }
                i += PLACEHOLDER_LEN;
                continue;
            }
            if !text[i].is_ascii_hexdigit() || !text[i + 1].is_ascii_hexdigit() {
                return Err(Error::InvalidParameter(format!(
                    "invalid hex at byte {}",
                    i / 2
                )));
            }
            i += 2;
        }

        Ok(Self {
            hex: lowercase_outside_markers(clean),
        })
    }

    /// Length of the template in bytes
    pub fn len(&self) -> usize {
        self.hex.len() / 2
    }

    pub fn is_empty(&self) -> bool {
        self.hex.is_empty()
    }

    /// Byte offsets of every placeholder marker, in ascending order
    pub fn placeholder_offsets(&self) -> Vec<usize> {
        let mut offsets = Vec::new();
        let mut i = 0;
        while i < self.hex.len() {
            if self.hex[i..].starts_with(PLACEHOLDER_PREFIX) {
                offsets.push(i / 2);
                i += PLACEHOLDER_LEN;
            } else {
                i += 2;
            }
        }
        offsets
    }

    /// The marker text at a byte offset, if a placeholder starts there
    pub fn marker_at(&self, offset: usize) -> Option<&str> {
        let start = offset.checked_mul(2)?;
        let marker = self.hex.get(start..start.checked_add(PLACEHOLDER_LEN)?)?;
        marker.starts_with(PLACEHOLDER_PREFIX).then_some(marker)
    }

    /// Write each address over the marker at its offset and decode the result.
    ///
    /// Fails if an offset does not hold a marker or if any marker is left
    /// unfilled.
    pub fn substitute(&self, slots: &[(usize, Address)]) -> Result<Bytecode> {
        let mut linked = self.hex.clone();
        for (offset, address) in slots {
            if self.marker_at(*offset).is_none() {
                return Err(Error::InvalidParameter(format!(
                    "no placeholder at byte {}",
                    offset
                )));
            }
            let start = offset * 2;
            linked.replace_range(start..start + PLACEHOLDER_LEN, &encode_address(address));
        }

        if let Some(pos) = linked.find(PLACEHOLDER_PREFIX) {
            return Err(Error::InvalidParameter(format!(
                "unlinked placeholder remains at byte {}",
                pos / 2
            )));
        }

        Bytecode::from_hex(&linked)
    }

    pub fn as_str(&self) -> &str {
        &self.hex
    }
}

// Marker text is case-sensitive (legacy markers embed the library name).
fn lowercase_outside_markers(hex: &str) -> String {
    let mut out = String::with_capacity(hex.len());
    let mut i = 0;
    while i < hex.len() {
        if hex[i..].starts_with(PLACEHOLDER_PREFIX) {
            out.push_str(&hex[i..i + PLACEHOLDER_LEN]);
            i += PLACEHOLDER_LEN;
        } else {
            out.push_str(&hex[i..i + 2].to_ascii_lowercase());
            i += 2;
        }
    }
    out
}

/// Canonical encoding of an address inside bytecode: 40 lowercase hex digits
pub fn encode_address(address: &Address) -> String {
    hex::encode(address.as_slice())
}

/// The solc >= 0.5 placeholder for a fully qualified library name
/// (`path/to/File.sol:Library`).
pub fn placeholder_for(fully_qualified_name: &str) -> String {
    let hash = hex::encode(keccak256(fully_qualified_name.as_bytes()));
    format!("__${}$__", &hash[..34])
}

/// Check a marker against the library it claims to stand for.
///
/// Hashed markers must match [`placeholder_for`]. Legacy markers
/// (`__Name_____...`) only carry a truncated name and are accepted when that
/// name is a prefix of the fully qualified name.
pub fn marker_matches(marker: &str, fully_qualified_name: &str) -> bool {
    if marker.starts_with("__$") {
        return marker == placeholder_for(fully_qualified_name);
    }
    let name = marker.trim_matches('_');
    !name.is_empty() && fully_qualified_name.starts_with(name)
}
