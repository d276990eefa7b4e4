//! Key Generation
//!
//! Derives private keys from BIP39 mnemonic phrases and handles the
//! Dogecoin WIF export format.
//!
//! SECURITY: Seeds are wrapped in `Zeroizing` and cleared on drop.

use bip39::Mnemonic;
use bitcoin::bip32::{DerivationPath, Xpriv};
use std::str::FromStr;
use zeroize::Zeroizing;

use crate::error::{DogecoinError, DogecoinResult};
use crate::types::Network;

use super::address::{base58check_decode, base58check_encode};
use super::keys::{PrivateKey, SECP};

/// Check a phrase without deriving anything
pub fn validate_mnemonic(phrase: &str) -> bool {
    Mnemonic::parse(phrase).is_ok()
}

/// BIP39 seed for a phrase and passphrase (PBKDF2-HMAC-SHA512, 2048 rounds,
/// salt "mnemonic" + passphrase)
fn mnemonic_to_seed(phrase: &str, passphrase: &str) -> DogecoinResult<Zeroizing<[u8; 64]>> {
    let mnemonic = Mnemonic::parse(phrase)
        .map_err(|e| DogecoinError::invalid_mnemonic(format!("Invalid mnemonic: {}", e)))?;
    Ok(Zeroizing::new(mnemonic.to_seed(passphrase)))
}

/// BIP32 master key of the phrase's seed
fn master_key(phrase: &str, passphrase: &str) -> DogecoinResult<Xpriv> {
    let seed = mnemonic_to_seed(phrase, passphrase)?;
    // The network only affects xprv serialization, never the key bytes
    Ok(Xpriv::new_master(bitcoin::Network::Bitcoin, seed.as_ref())?)
}

/// Derive the root private key: the BIP32 master key of the BIP39 seed.
///
/// Deterministic in `(phrase, passphrase)`.
pub fn derive_root_key(phrase: &str, passphrase: &str) -> DogecoinResult<PrivateKey> {
    let master = master_key(phrase, passphrase)?;
    Ok(PrivateKey::from(master.private_key))
}

/// Derive the key at `path` below the root, e.g. `m/44'/3'/0'/0/0`
pub fn derive_account_key(phrase: &str, passphrase: &str, path: &str) -> DogecoinResult<PrivateKey> {
    let path = DerivationPath::from_str(path)
        .map_err(|e| DogecoinError::invalid_config(format!("Invalid derivation path: {}", e)))?;
    let master = master_key(phrase, passphrase)?;
    let derived = master.derive_priv(&SECP, &path)?;
    Ok(PrivateKey::from(derived.private_key))
}

/// Encode a private key as Dogecoin WIF (compressed)
pub fn encode_wif(key: &PrivateKey, network: Network) -> String {
    let mut data = Zeroizing::new(Vec::with_capacity(34));
    data.push(network.params().wif_prefix);
    data.extend_from_slice(&key.secret_bytes());
    data.push(0x01); // compressed flag
    base58check_encode(&data)
}

/// Decode Dogecoin WIF. Returns the key, its network and whether the
/// compressed flag was set.
pub fn decode_wif(wif: &str) -> DogecoinResult<(PrivateKey, Network, bool)> {
    let data = Zeroizing::new(
        base58check_decode(wif.trim())
            .map_err(|e| DogecoinError::invalid_private_key(format!("Invalid WIF: {}", e.message)))?,
    );

    let compressed = match data.len() {
        34 if data[33] == 0x01 => true,
        33 => false,
        n => {
            return Err(DogecoinError::invalid_private_key(format!(
                "Invalid WIF payload length {}",
                n
            )))
        }
    };

    let network = Network::ALL
        .into_iter()
        .find(|n| n.params().wif_prefix == data[0])
        .ok_or_else(|| {
            DogecoinError::invalid_private_key(format!("Unknown WIF prefix {:02x}", data[0]))
        })?;

    let key = PrivateKey::from_slice(&data[1..33])?;
    Ok((key, network, compressed))
}
