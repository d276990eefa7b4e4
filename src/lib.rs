//! Dogecoin Signer Library
//!
//! Offline transaction construction and signing for Dogecoin.
//!
//! # Architecture
//!
//! This crate provides:
//! - **wallet**: BIP39/BIP32 key derivation, public keys, WIF and addresses
//! - **script**: P2PKH/P2SH locking scripts and m-of-n redeem scripts
//! - **tx**: wire codec, unsigned transaction builder, signature assembly
//! - **signing**: legacy sighash and ECDSA signing/verification
//! - **api**: hex-string operation surface with result validation
//! - **ffi**: C-ABI exports
//!
//! # Flow
//!
//! ```text
//! new_transaction -> add_input* -> add_output* -> compute_sighash
//!     -> sign (possibly on another machine) -> finalize_input
//! ```
//!
//! For a P2SH multisig input, `compute_sighash`/`sign`/`finalize_input` run
//! once per signer, each time on the transaction returned by the previous
//! `finalize_input`.
//!
//! # Security
//!
//! Seeds are held in `zeroize` wrappers and private keys never appear in
//! log output.
//!
//! # Example
//!
//! ```rust,ignore
//! use dogecoin_signer::api;
//!
//! let tx = api::new_transaction(&prev_txid, 0)?;
//! let tx = api::add_output(&tx, "D...", 100_000_000)?;
//! let digest = api::compute_sighash(&tx, &prev_txid, 0, 0, &pubkey_hex)?;
//! let sig = api::sign(&digest, &privkey_hex)?;
//! let signed = api::finalize_input(&tx, &sig, &prev_txid, 0, 0, &pubkey_hex)?;
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod ffi;
pub mod script;
pub mod serde_bytes;
pub mod signing;
pub mod tx;
pub mod types;
pub mod utils;
pub mod wallet;

pub use config::EngineConfig;
pub use error::{DogecoinError, DogecoinResult, ErrorCode, ErrorContext};
pub use types::{Network, SighashType, SpendType, Txid};

pub use script::MultisigScript;
pub use signing::{SighashDigest, Signature};
pub use tx::{OutPoint, Transaction, TransactionBuilder};
pub use wallet::{Address, AddressKind, PrivateKey, PublicKey};
