//! Engine Configuration
//!
//! Defaults used when building transactions and deriving keys. Every
//! operation takes its configuration explicitly; nothing here is global.

use bitcoin::bip32::DerivationPath;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::{DogecoinError, DogecoinResult};
use crate::types::Network;

/// Dogecoin BIP44 path (coin type 3)
pub const DOGE_DERIVATION_PATH: &str = "m/44'/3'/0'/0/0";

/// Sequence number with no relative-locktime meaning
pub const SEQUENCE_FINAL: u32 = 0xffff_ffff;

/// Engine settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Network used when a caller does not name one
    pub network: Network,
    /// Version written into new transactions
    pub tx_version: i32,
    /// Locktime written into new transactions
    pub lock_time: u32,
    /// Sequence written into new inputs
    pub sequence: u32,
    /// Path used by account key derivation
    pub derivation_path: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            network: Network::Mainnet,
            tx_version: 1,
            lock_time: 0,
            sequence: SEQUENCE_FINAL,
            derivation_path: DOGE_DERIVATION_PATH.to_string(),
        }
    }
}

impl EngineConfig {
    /// Testnet preset
    pub fn testnet() -> Self {
        Self {
            network: Network::Testnet,
            ..Self::default()
        }
    }

    /// Parse a JSON document; missing fields take their defaults
    pub fn from_json(json: &str) -> DogecoinResult<Self> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the settings are usable
    pub fn validate(&self) -> DogecoinResult<()> {
        if !(1..=2).contains(&self.tx_version) {
            return Err(DogecoinError::invalid_config(format!(
                "Transaction version must be 1 or 2, got {}",
                self.tx_version
            )));
        }
        self.parsed_derivation_path()?;
        Ok(())
    }

    pub fn parsed_derivation_path(&self) -> DogecoinResult<DerivationPath> {
        DerivationPath::from_str(&self.derivation_path).map_err(|e| {
            DogecoinError::invalid_config(format!(
                "Invalid derivation path '{}': {}",
                self.derivation_path, e
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.network, Network::Mainnet);
        assert_eq!(config.tx_version, 1);
        assert_eq!(config.lock_time, 0);
        assert_eq!(config.sequence, 0xffffffff);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_json_partial() {
        let config = EngineConfig::from_json(r#"{"network":"testnet","lock_time":500}"#).unwrap();
        assert_eq!(config.network, Network::Testnet);
        assert_eq!(config.lock_time, 500);
        assert_eq!(config.tx_version, 1);
    }

    #[test]
    fn test_rejects_bad_values() {
        let err = EngineConfig::from_json(r#"{"tx_version":7}"#).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidConfig);

        let err = EngineConfig::from_json(r#"{"derivation_path":"m/not/a/path"}"#).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidConfig);

        let err = EngineConfig::from_json("{").unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidConfig);
    }
}
