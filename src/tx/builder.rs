//! Transaction Builder
//!
//! Grows an unsigned transaction one input or output at a time. The
//! builder consumes itself on every step, so each intermediate state is a
//! distinct value.

use crate::config::EngineConfig;
use crate::error::{DogecoinError, DogecoinResult};
use crate::wallet::address::Address;

use super::codec::{OutPoint, Transaction, TxInput, TxOutput};

/// Unsigned transaction builder
#[derive(Debug, Clone)]
pub struct TransactionBuilder {
    tx: Transaction,
    sequence: u32,
}

impl TransactionBuilder {
    /// Start a transaction spending `first`, with default version and locktime
    pub fn new(first: OutPoint) -> Self {
        Self::with_config(first, &EngineConfig::default())
    }

    /// Start a transaction using the version, locktime and sequence in `config`
    pub fn with_config(first: OutPoint, config: &EngineConfig) -> Self {
        let tx = Transaction {
            version: config.tx_version,
            inputs: vec![TxInput {
                previous_output: first,
                script_sig: Vec::new(),
                sequence: config.sequence,
            }],
            outputs: Vec::new(),
            lock_time: config.lock_time,
        };
        Self {
            tx,
            sequence: config.sequence,
        }
    }

    /// Continue building an existing transaction. New inputs take the
    /// sequence of the first input.
    pub fn from_transaction(tx: Transaction) -> DogecoinResult<Self> {
        let sequence = tx
            .inputs
            .first()
            .map(|input| input.sequence)
            .ok_or_else(|| DogecoinError::invalid_transaction("Transaction has no inputs"))?;
        Ok(Self { tx, sequence })
    }

    /// Append an input with an empty script_sig
    pub fn add_input(mut self, outpoint: OutPoint) -> DogecoinResult<Self> {
        if self.tx.find_input(&outpoint).is_some() {
            return Err(DogecoinError::invalid_transaction(format!(
                "Outpoint {}:{} is already spent by this transaction",
                outpoint.txid, outpoint.vout
            )));
        }
        self.tx.inputs.push(TxInput {
            previous_output: outpoint,
            script_sig: Vec::new(),
            sequence: self.sequence,
        });
        Ok(self)
    }

    /// Append an output paying `value` koinu to `address`
    pub fn add_output(mut self, address: &Address, value: u64) -> Self {
        self.tx.outputs.push(TxOutput {
            value,
            script_pubkey: address.script_pubkey(),
        });
        self
    }

    pub fn transaction(&self) -> &Transaction {
        &self.tx
    }

    pub fn build(self) -> Transaction {
        self.tx
    }
}
