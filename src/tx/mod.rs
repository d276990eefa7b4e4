//! Transaction Module
//!
//! Wire codec, unsigned transaction building and signature assembly.

pub mod assembler;
pub mod builder;
pub mod codec;

pub use assembler::{finalize_input, multisig_progress, MultisigProgress};
pub use builder::TransactionBuilder;
pub use codec::{write_varint, CodecError, CodecResult, OutPoint, Transaction, TxInput, TxOutput};
