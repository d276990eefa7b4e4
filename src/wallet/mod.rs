//! Wallet Module
//!
//! Key material and addresses: BIP39/BIP32 derivation, WIF, compressed
//! public keys and Base58Check addresses.

pub mod address;
pub mod keygen;
pub mod keys;

pub use address::{encode_address, encode_multisig_address, Address, AddressKind};
pub use keygen::{
    decode_wif, derive_account_key, derive_root_key, encode_wif, validate_mnemonic,
};
pub use keys::{derive_public_key, PrivateKey, PublicKey};
