//! Key Types
//!
//! Private keys are secp256k1 scalars in `[1, n)`; public keys are always
//! handled in their 33-byte compressed form.

use bitcoin::hashes::{hash160, Hash};
use bitcoin::secp256k1::{self, All, Secp256k1, SecretKey};
use std::fmt;
use std::str::FromStr;

use crate::error::{DogecoinError, DogecoinResult};

/// Length of a compressed public key
pub const COMPRESSED_PUBKEY_LEN: usize = 33;

lazy_static::lazy_static! {
    /// Verification and signing context. Immutable after creation, so it is
    /// shared between threads.
    pub(crate) static ref SECP: Secp256k1<All> = Secp256k1::new();
}

/// A secp256k1 private key
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct PrivateKey(SecretKey);

impl PrivateKey {
    pub fn from_slice(bytes: &[u8]) -> DogecoinResult<Self> {
        if bytes.len() != 32 {
            return Err(DogecoinError::invalid_private_key(format!(
                "Private key must be 32 bytes, got {}",
                bytes.len()
            )));
        }
        SecretKey::from_slice(bytes)
            .map(PrivateKey)
            .map_err(|_| DogecoinError::invalid_private_key("Private key is zero or not below the curve order"))
    }

    pub fn from_hex(s: &str) -> DogecoinResult<Self> {
        let bytes = hex::decode(s.trim())
            .map_err(|e| DogecoinError::invalid_private_key(format!("Private key is not hex: {}", e)))?;
        Self::from_slice(&bytes)
    }

    pub fn secret_bytes(&self) -> [u8; 32] {
        self.0.secret_bytes()
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0.secret_bytes())
    }

    /// Scalar multiplication by the base point
    pub fn public_key(&self) -> PublicKey {
        PublicKey(secp256k1::PublicKey::from_secret_key(&SECP, &self.0))
    }

    pub(crate) fn inner(&self) -> &SecretKey {
        &self.0
    }
}

impl From<SecretKey> for PrivateKey {
    fn from(key: SecretKey) -> Self {
        PrivateKey(key)
    }
}

impl FromStr for PrivateKey {
    type Err = DogecoinError;

    fn from_str(s: &str) -> DogecoinResult<Self> {
        Self::from_hex(s)
    }
}

// Never print key material
impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PrivateKey([REDACTED])")
    }
}

/// A compressed secp256k1 public key
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PublicKey(secp256k1::PublicKey);

impl PublicKey {
    /// Parse a 33-byte compressed point
    pub fn from_slice(bytes: &[u8]) -> DogecoinResult<Self> {
        if bytes.len() != COMPRESSED_PUBKEY_LEN {
            return Err(DogecoinError::invalid_pubkey(format!(
                "Public key must be {} bytes, got {}",
                COMPRESSED_PUBKEY_LEN,
                bytes.len()
            )));
        }
        if bytes[0] != 0x02 && bytes[0] != 0x03 {
            return Err(DogecoinError::invalid_pubkey(format!(
                "Public key prefix must be 02 or 03, got {:02x}",
                bytes[0]
            )));
        }
        secp256k1::PublicKey::from_slice(bytes)
            .map(PublicKey)
            .map_err(|_| DogecoinError::invalid_pubkey("Public key is not a point on secp256k1"))
    }

    pub fn from_hex(s: &str) -> DogecoinResult<Self> {
        let bytes = hex::decode(s.trim())
            .map_err(|e| DogecoinError::invalid_pubkey(format!("Public key is not hex: {}", e)))?;
        Self::from_slice(&bytes)
    }

    pub fn serialize(&self) -> [u8; COMPRESSED_PUBKEY_LEN] {
        self.0.serialize()
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.serialize())
    }

    /// RIPEMD160(SHA256(pubkey))
    pub fn hash160(&self) -> [u8; 20] {
        hash160::Hash::hash(&self.serialize()).to_byte_array()
    }

    pub(crate) fn inner(&self) -> &secp256k1::PublicKey {
        &self.0
    }
}

impl FromStr for PublicKey {
    type Err = DogecoinError;

    fn from_str(s: &str) -> DogecoinResult<Self> {
        Self::from_hex(s)
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", self.to_hex())
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Derive the compressed public key for a hex private key
pub fn derive_public_key(private_key_hex: &str) -> DogecoinResult<PublicKey> {
    Ok(PrivateKey::from_hex(private_key_hex)?.public_key())
}
