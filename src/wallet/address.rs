//! Dogecoin Addresses
//!
//! Base58Check encoding of `version || hash160 || checksum`, where the
//! checksum is the first four bytes of `SHA256(SHA256(version || hash160))`.

use bitcoin::hashes::{hash160, sha256d, Hash};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{DogecoinError, DogecoinResult};
use crate::script::{p2pkh_script_pubkey, p2sh_script_pubkey, MAX_SCRIPT_ELEMENT_SIZE};
use crate::types::Network;

use super::keys::PublicKey;

/// Checksum length appended by Base58Check
const CHECKSUM_LEN: usize = 4;

/// Decoded address length: version + hash160
const PAYLOAD_LEN: usize = 21;

/// Append the double-SHA256 checksum and Base58 encode
pub(crate) fn base58check_encode(payload: &[u8]) -> String {
    let checksum = sha256d::Hash::hash(payload);
    let mut data = Vec::with_capacity(payload.len() + CHECKSUM_LEN);
    data.extend_from_slice(payload);
    data.extend_from_slice(&checksum[..CHECKSUM_LEN]);
    bs58::encode(data).into_string()
}

/// Base58 decode and verify the trailing checksum, returning the payload
pub(crate) fn base58check_decode(text: &str) -> DogecoinResult<Vec<u8>> {
    let data = bs58::decode(text)
        .into_vec()
        .map_err(|e| DogecoinError::invalid_address(format!("Invalid base58: {}", e)))?;

    if data.len() <= CHECKSUM_LEN {
        return Err(DogecoinError::invalid_address("Base58Check data too short"));
    }

    let (payload, checksum) = data.split_at(data.len() - CHECKSUM_LEN);
    let expected = sha256d::Hash::hash(payload);
    if checksum != &expected[..CHECKSUM_LEN] {
        return Err(DogecoinError::invalid_address("Checksum mismatch"));
    }

    Ok(payload.to_vec())
}

/// What the 20-byte hash of an address commits to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressKind {
    P2pkh,
    P2sh,
}

/// A decoded Dogecoin address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Address {
    pub network: Network,
    pub kind: AddressKind,
    pub hash: [u8; 20],
}

impl Address {
    /// P2PKH address of a compressed public key
    pub fn p2pkh(public_key: &PublicKey, network: Network) -> Self {
        Self {
            network,
            kind: AddressKind::P2pkh,
            hash: public_key.hash160(),
        }
    }

    /// P2SH address of a redeem script
    pub fn p2sh(redeem_script: &[u8], network: Network) -> DogecoinResult<Self> {
        if redeem_script.is_empty() {
            return Err(DogecoinError::invalid_script("Redeem script is empty"));
        }
        if redeem_script.len() > MAX_SCRIPT_ELEMENT_SIZE {
            return Err(DogecoinError::invalid_script(format!(
                "Redeem script is {} bytes, limit is {}",
                redeem_script.len(),
                MAX_SCRIPT_ELEMENT_SIZE
            )));
        }
        Ok(Self {
            network,
            kind: AddressKind::P2sh,
            hash: hash160::Hash::hash(redeem_script).to_byte_array(),
        })
    }

    pub fn version_byte(&self) -> u8 {
        let params = self.network.params();
        match self.kind {
            AddressKind::P2pkh => params.p2pkh_prefix,
            AddressKind::P2sh => params.p2sh_prefix,
        }
    }

    /// Locking script paying to this address
    pub fn script_pubkey(&self) -> Vec<u8> {
        match self.kind {
            AddressKind::P2pkh => p2pkh_script_pubkey(&self.hash),
            AddressKind::P2sh => p2sh_script_pubkey(&self.hash),
        }
    }

    /// Recognize a standard P2PKH or P2SH locking script
    pub fn from_script_pubkey(script: &[u8], network: Network) -> Option<Self> {
        let (kind, hash) = match script {
            [0x76, 0xa9, 0x14, hash @ .., 0x88, 0xac] if hash.len() == 20 => {
                (AddressKind::P2pkh, hash)
            }
            [0xa9, 0x14, hash @ .., 0x87] if hash.len() == 20 => (AddressKind::P2sh, hash),
            _ => return None,
        };
        let mut out = [0u8; 20];
        out.copy_from_slice(hash);
        Some(Self {
            network,
            kind,
            hash: out,
        })
    }

    fn from_version(version: u8) -> Option<(Network, AddressKind)> {
        Network::ALL.into_iter().find_map(|network| {
            let params = network.params();
            if params.p2pkh_prefix == version {
                Some((network, AddressKind::P2pkh))
            } else if params.p2sh_prefix == version {
                Some((network, AddressKind::P2sh))
            } else {
                None
            }
        })
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut payload = Vec::with_capacity(PAYLOAD_LEN);
        payload.push(self.version_byte());
        payload.extend_from_slice(&self.hash);
        f.write_str(&base58check_encode(&payload))
    }
}

impl FromStr for Address {
    type Err = DogecoinError;

    fn from_str(s: &str) -> DogecoinResult<Self> {
        let payload = base58check_decode(s.trim())?;
        if payload.len() != PAYLOAD_LEN {
            return Err(DogecoinError::invalid_address(format!(
                "Address payload must be {} bytes, got {}",
                PAYLOAD_LEN,
                payload.len()
            )));
        }

        let (network, kind) = Self::from_version(payload[0]).ok_or_else(|| {
            DogecoinError::invalid_address(format!("Unknown address version {:02x}", payload[0]))
        })?;

        let mut hash = [0u8; 20];
        hash.copy_from_slice(&payload[1..]);
        Ok(Self { network, kind, hash })
    }
}

/// Encode the P2PKH address of a hex public key
pub fn encode_address(public_key_hex: &str, network: Network) -> DogecoinResult<String> {
    let public_key = PublicKey::from_hex(public_key_hex)?;
    Ok(Address::p2pkh(&public_key, network).to_string())
}

/// Encode the P2SH address of a hex redeem script
pub fn encode_multisig_address(redeem_script_hex: &str, network: Network) -> DogecoinResult<String> {
    let script = hex::decode(redeem_script_hex.trim())
        .map_err(|e| DogecoinError::invalid_script(format!("Redeem script is not hex: {}", e)))?;
    Ok(Address::p2sh(&script, network)?.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    // secp256k1 generator point; its hash160 is the well-known
    // 751e76e8199196d454941c45d1b3a323f1433bd6
    const G_COMPRESSED: &str = "0279be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798";

    #[test]
    fn test_p2pkh_prefixes() {
        let mainnet = encode_address(G_COMPRESSED, Network::Mainnet).unwrap();
        let testnet = encode_address(G_COMPRESSED, Network::Testnet).unwrap();
        assert!(mainnet.starts_with('D'));
        assert!(testnet.starts_with('n'));
        assert_ne!(mainnet.chars().next(), testnet.chars().next());
    }

    #[test]
    fn test_p2pkh_hash() {
        let pk = PublicKey::from_hex(G_COMPRESSED).unwrap();
        let addr = Address::p2pkh(&pk, Network::Mainnet);
        assert_eq!(hex::encode(addr.hash), "751e76e8199196d454941c45d1b3a323f1433bd6");
    }

    #[test]
    fn test_round_trip() {
        let text = encode_address(G_COMPRESSED, Network::Mainnet).unwrap();
        let decoded: Address = text.parse().unwrap();
        assert_eq!(decoded.network, Network::Mainnet);
        assert_eq!(decoded.kind, AddressKind::P2pkh);
        assert_eq!(decoded.to_string(), text);
    }

    #[test]
    fn test_p2sh_prefixes() {
        let script = vec![0x51; 10];
        let mainnet = Address::p2sh(&script, Network::Mainnet).unwrap().to_string();
        let testnet = Address::p2sh(&script, Network::Testnet).unwrap().to_string();
        assert!(mainnet.starts_with('9') || mainnet.starts_with('A'));
        assert!(testnet.starts_with('2'));
        let decoded: Address = mainnet.parse().unwrap();
        assert_eq!(decoded.kind, AddressKind::P2sh);
    }

    #[test]
    fn test_script_pubkey_forms() {
        let pk = PublicKey::from_hex(G_COMPRESSED).unwrap();
        let spk = Address::p2pkh(&pk, Network::Mainnet).script_pubkey();
        assert_eq!(
            hex::encode(spk),
            "76a914751e76e8199196d454941c45d1b3a323f1433bd688ac"
        );

        let p2sh = Address::p2sh(&[0x51], Network::Testnet).unwrap().script_pubkey();
        assert_eq!(p2sh.len(), 23);
        assert_eq!(p2sh[0], 0xa9);
        assert_eq!(p2sh[22], 0x87);
    }

    #[test]
    fn test_recognizes_locking_scripts() {
        let pk = PublicKey::from_hex(G_COMPRESSED).unwrap();
        let p2pkh = Address::p2pkh(&pk, Network::Testnet);
        assert_eq!(
            Address::from_script_pubkey(&p2pkh.script_pubkey(), Network::Testnet),
            Some(p2pkh)
        );

        let p2sh = Address::p2sh(&[0x51], Network::Mainnet).unwrap();
        assert_eq!(
            Address::from_script_pubkey(&p2sh.script_pubkey(), Network::Mainnet),
            Some(p2sh)
        );

        assert_eq!(Address::from_script_pubkey(&[0x51], Network::Mainnet), None);
    }

    #[test]
    fn test_checksum_mismatch_rejected() {
        let mut text = encode_address(G_COMPRESSED, Network::Mainnet).unwrap();
        let last = text.pop().unwrap();
        text.push(if last == 'z' { 'y' } else { 'z' });
        assert_eq!(text.parse::<Address>().unwrap_err().code, ErrorCode::InvalidAddress);
    }

    #[test]
    fn test_rejects_foreign_and_garbage() {
        // Bitcoin mainnet P2PKH of the generator point
        let btc = "1BgGZ9tcN4rm9KBzDn7KprQz87SZ26SAMH";
        assert_eq!(btc.parse::<Address>().unwrap_err().code, ErrorCode::InvalidAddress);
        assert_eq!("0OIl".parse::<Address>().unwrap_err().code, ErrorCode::InvalidAddress);
        assert_eq!("".parse::<Address>().unwrap_err().code, ErrorCode::InvalidAddress);
    }

    #[test]
    fn test_invalid_inputs() {
        assert_eq!(
            encode_address("02abcd", Network::Mainnet).unwrap_err().code,
            ErrorCode::InvalidPubkey
        );
        assert_eq!(
            encode_multisig_address("xyz", Network::Mainnet).unwrap_err().code,
            ErrorCode::InvalidScript
        );
        assert_eq!(
            encode_multisig_address("", Network::Mainnet).unwrap_err().code,
            ErrorCode::InvalidScript
        );
        let oversized = "51".repeat(MAX_SCRIPT_ELEMENT_SIZE + 1);
        assert_eq!(
            encode_multisig_address(&oversized, Network::Mainnet).unwrap_err().code,
            ErrorCode::InvalidScript
        );
    }
}
