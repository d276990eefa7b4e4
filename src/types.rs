//! Shared types for the Dogecoin engine
//!
//! Small value types that cross module boundaries: the network selector
//! and its constants, spend/sighash tags and the outpoint txid.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{DogecoinError, DogecoinResult};

// =============================================================================
// Network
// =============================================================================

/// Dogecoin network selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    #[default]
    Mainnet,
    Testnet,
}

/// Version bytes for a network
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkParams {
    pub p2pkh_prefix: u8,
    pub p2sh_prefix: u8,
    pub wif_prefix: u8,
}

/// Mainnet: 'D' addresses, '9'/'A' multisig addresses
pub const MAINNET_PARAMS: NetworkParams = NetworkParams {
    p2pkh_prefix: 0x1e,
    p2sh_prefix: 0x16,
    wif_prefix: 0x9e,
};

/// Testnet: 'n' addresses, '2' multisig addresses
pub const TESTNET_PARAMS: NetworkParams = NetworkParams {
    p2pkh_prefix: 0x71,
    p2sh_prefix: 0xc4,
    wif_prefix: 0xf1,
};

impl Network {
    pub const ALL: [Network; 2] = [Network::Mainnet, Network::Testnet];

    pub fn params(&self) -> &'static NetworkParams {
        match self {
            Network::Mainnet => &MAINNET_PARAMS,
            Network::Testnet => &TESTNET_PARAMS,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Network::Mainnet => "mainnet",
            Network::Testnet => "testnet",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Network {
    type Err = DogecoinError;

    fn from_str(s: &str) -> DogecoinResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mainnet" => Ok(Network::Mainnet),
            "testnet" => Ok(Network::Testnet),
            other => Err(DogecoinError::invalid_network(format!(
                "Unsupported network '{}', expected mainnet or testnet",
                other
            ))),
        }
    }
}

// =============================================================================
// Spend and sighash tags
// =============================================================================

/// How the input being signed is locked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpendType {
    /// Pay to public-key hash, script argument is the public key
    P2pkh = 0,
    /// Pay to script hash, script argument is the redeem script
    P2sh = 1,
}

impl SpendType {
    pub fn from_code(code: u64) -> DogecoinResult<Self> {
        match code {
            0 => Ok(SpendType::P2pkh),
            1 => Ok(SpendType::P2sh),
            other => Err(DogecoinError::invalid_spend_type(format!(
                "Unsupported spend type {}, expected 0 (p2pkh) or 1 (p2sh)",
                other
            ))),
        }
    }

    pub fn code(&self) -> u64 {
        *self as u64
    }
}

/// Signature hash types. Only SIGHASH_ALL is supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SighashType {
    #[default]
    All = 0x01,
}

impl SighashType {
    pub fn to_byte(&self) -> u8 {
        *self as u8
    }

    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            0x01 => Some(Self::All),
            _ => None,
        }
    }

    /// 4-byte little-endian tag appended to the sighash pre-image
    pub fn to_u32_le(&self) -> [u8; 4] {
        (self.to_byte() as u32).to_le_bytes()
    }
}

// =============================================================================
// Txid
// =============================================================================

/// Transaction id, stored in wire (internal) byte order.
///
/// The string form is the usual RPC display order, which is the byte
/// reversal of the wire form.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Txid([u8; 32]);

impl Txid {
    pub fn from_wire_bytes(bytes: [u8; 32]) -> Self {
        Txid(bytes)
    }

    pub fn as_wire_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        let mut display = self.0;
        display.reverse();
        hex::encode(display)
    }
}

impl FromStr for Txid {
    type Err = DogecoinError;

    fn from_str(s: &str) -> DogecoinResult<Self> {
        let trimmed = s.trim();
        let bytes = hex::decode(trimmed)
            .map_err(|e| DogecoinError::invalid_txid(format!("Txid is not hex: {}", e)))?;
        let mut wire: [u8; 32] = bytes.try_into().map_err(|v: Vec<u8>| {
            DogecoinError::invalid_txid(format!("Txid must be 32 bytes, got {}", v.len()))
        })?;
        wire.reverse();
        Ok(Txid(wire))
    }
}

impl fmt::Display for Txid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Txid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Txid({})", self.to_hex())
    }
}

impl Serialize for Txid {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Txid {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Txid::from_str(&s).map_err(serde::de::Error::custom)
    }
}
