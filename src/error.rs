//! Unified error types for the Dogecoin signing engine
//!
//! Every operation reports failure through [`DogecoinError`]. The error
//! carries a closed [`ErrorCode`] plus, where useful, the three pieces of
//! context the calling layer expects: the high-level operation, the
//! sub-operation that failed and the raw offending text.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Main error type for all engine operations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DogecoinError {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<ErrorContext>,
}

/// Where an error was raised and what value triggered it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorContext {
    pub operation: String,
    pub sub_operation: String,
    pub raw: String,
}

impl DogecoinError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            context: None,
        }
    }

    /// Attach operation context, keeping any context already present
    pub fn with_context(
        mut self,
        operation: impl Into<String>,
        sub_operation: impl Into<String>,
        raw: impl Into<String>,
    ) -> Self {
        if self.context.is_none() {
            self.context = Some(ErrorContext {
                operation: operation.into(),
                sub_operation: sub_operation.into(),
                raw: raw.into(),
            });
        }
        self
    }

    /// A value produced by `sub_operation` was not well-formed
    pub fn malformed_result(
        operation: impl Into<String>,
        sub_operation: impl Into<String>,
        raw: impl Into<String>,
    ) -> Self {
        let raw = raw.into();
        Self::new(ErrorCode::MalformedResult, "Result is not well-formed hex")
            .with_context(operation, sub_operation, raw)
    }

    // Convenience constructors
    pub fn invalid_mnemonic(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidMnemonic, msg)
    }

    pub fn invalid_private_key(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidPrivateKey, msg)
    }

    pub fn invalid_pubkey(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidPubkey, msg)
    }

    pub fn invalid_network(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidNetwork, msg)
    }

    pub fn invalid_address(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidAddress, msg)
    }

    pub fn invalid_script(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidScript, msg)
    }

    pub fn invalid_threshold(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidThreshold, msg)
    }

    pub fn input_not_found(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::InputNotFound, msg)
    }

    pub fn length_mismatch(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::LengthMismatch, msg)
    }

    pub fn invalid_txid(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidTxid, msg)
    }

    pub fn invalid_transaction(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidTransaction, msg)
    }

    pub fn invalid_signature(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidSignature, msg)
    }

    pub fn invalid_digest(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidDigest, msg)
    }

    pub fn invalid_spend_type(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidSpendType, msg)
    }

    pub fn invalid_amount(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidAmount, msg)
    }

    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidConfig, msg)
    }

    /// Serialize as a JSON object for the C ABI
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(r#"{{"code":"{}","message":"error serialization failed"}}"#, self.code.as_str())
        })
    }
}

impl fmt::Display for DogecoinError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)?;
        if let Some(ref ctx) = self.context {
            write!(f, " ({} / {}: {:?})", ctx.operation, ctx.sub_operation, ctx.raw)?;
        }
        Ok(())
    }
}

impl std::error::Error for DogecoinError {}

/// Error codes for categorization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    // Key material
    InvalidMnemonic,
    InvalidPrivateKey,
    InvalidPubkey,

    // Addresses and scripts
    InvalidNetwork,
    InvalidAddress,
    InvalidScript,
    InvalidThreshold,

    // Transactions
    InputNotFound,
    LengthMismatch,
    InvalidTxid,
    InvalidTransaction,
    InvalidAmount,
    InvalidSpendType,

    // Signing
    InvalidSignature,
    InvalidDigest,

    // Boundary
    MalformedResult,
    InvalidConfig,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::InvalidMnemonic => "invalid_mnemonic",
            ErrorCode::InvalidPrivateKey => "invalid_private_key",
            ErrorCode::InvalidPubkey => "invalid_pubkey",
            ErrorCode::InvalidNetwork => "invalid_network",
            ErrorCode::InvalidAddress => "invalid_address",
            ErrorCode::InvalidScript => "invalid_script",
            ErrorCode::InvalidThreshold => "invalid_threshold",
            ErrorCode::InputNotFound => "input_not_found",
            ErrorCode::LengthMismatch => "length_mismatch",
            ErrorCode::InvalidTxid => "invalid_txid",
            ErrorCode::InvalidTransaction => "invalid_transaction",
            ErrorCode::InvalidAmount => "invalid_amount",
            ErrorCode::InvalidSpendType => "invalid_spend_type",
            ErrorCode::InvalidSignature => "invalid_signature",
            ErrorCode::InvalidDigest => "invalid_digest",
            ErrorCode::MalformedResult => "malformed_result",
            ErrorCode::InvalidConfig => "invalid_config",
        }
    }
}

/// Result type alias for engine operations
pub type DogecoinResult<T> = Result<T, DogecoinError>;

// Conversions from common error types

impl From<serde_json::Error> for DogecoinError {
    fn from(e: serde_json::Error) -> Self {
        DogecoinError::new(ErrorCode::InvalidConfig, format!("JSON error: {}", e))
    }
}

impl From<bip39::Error> for DogecoinError {
    fn from(e: bip39::Error) -> Self {
        DogecoinError::new(ErrorCode::InvalidMnemonic, format!("BIP39 error: {}", e))
    }
}

impl From<bitcoin::bip32::Error> for DogecoinError {
    fn from(e: bitcoin::bip32::Error) -> Self {
        DogecoinError::new(ErrorCode::InvalidPrivateKey, format!("BIP32 error: {}", e))
    }
}

impl From<crate::tx::CodecError> for DogecoinError {
    fn from(e: crate::tx::CodecError) -> Self {
        DogecoinError::new(ErrorCode::InvalidTransaction, e.to_string())
    }
}
