//! Signature hashing and signing
//!
//! Signing is split from assembly: callers compute a digest, sign it here
//! (or on an external device), and hand the signature to
//! [`crate::tx::assembler`].

pub mod ecdsa;
pub mod sighash;

pub use ecdsa::{sign, verify, Signature};
pub use sighash::{compute_sighash, sighash_for_index, substitution_script, SighashDigest};
