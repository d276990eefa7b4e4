//! FFI Layer
//!
//! C-ABI exports over [`crate::api`]. Every function takes null-terminated
//! UTF-8 strings plus integers and returns an owned C string that must be
//! released with `dogecoin_free_string`.
//!
//! On success the string is the result itself (hex, or Base58Check for
//! addresses). On failure it is a JSON error object, e.g.
//! `{"code":"input_not_found","message":"...","context":{...}}`, which can
//! never be mistaken for hex or Base58.

use std::ffi::{CStr, CString};
use std::os::raw::c_char;

use crate::api;
use crate::error::{DogecoinError, DogecoinResult, ErrorCode};
use crate::log_error;

// =============================================================================
// Memory Management
// =============================================================================

/// Free a string returned by any function in this module
///
/// # Safety
/// The pointer must have been returned by this library and not freed yet.
#[unsafe(no_mangle)]
pub extern "C" fn dogecoin_free_string(s: *mut c_char) {
    if s.is_null() {
        return;
    }
    unsafe {
        let _ = CString::from_raw(s);
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Borrow a C string argument as `&str`
fn parse_input<'a>(input: *const c_char, name: &str) -> DogecoinResult<&'a str> {
    if input.is_null() {
        return Err(invalid_argument(name, "Null pointer"));
    }
    let c_str = unsafe { CStr::from_ptr(input) };
    c_str
        .to_str()
        .map_err(|_| invalid_argument(name, "Invalid UTF-8 string"))
}

fn invalid_argument(name: &str, message: &str) -> DogecoinError {
    let code = match name {
        "phrase" | "passphrase" => ErrorCode::InvalidMnemonic,
        "private_key" => ErrorCode::InvalidPrivateKey,
        "public_key" | "public_keys" => ErrorCode::InvalidPubkey,
        "network" => ErrorCode::InvalidNetwork,
        "address" => ErrorCode::InvalidAddress,
        "script" | "redeem_script" => ErrorCode::InvalidScript,
        "txid" => ErrorCode::InvalidTxid,
        "signature" => ErrorCode::InvalidSignature,
        "digest" => ErrorCode::InvalidDigest,
        _ => ErrorCode::InvalidTransaction,
    };
    DogecoinError::new(code, format!("{}: {}", name, message))
}

fn parse_index(index: i64) -> DogecoinResult<u32> {
    u32::try_from(index).map_err(|_| {
        DogecoinError::invalid_transaction(format!("Output index {} is out of range", index))
    })
}

fn parse_amount(amount: i64) -> DogecoinResult<u64> {
    u64::try_from(amount)
        .map_err(|_| DogecoinError::invalid_amount(format!("Amount {} is negative", amount)))
}

fn parse_spend_type(sig_type: i64) -> DogecoinResult<u64> {
    u64::try_from(sig_type).map_err(|_| {
        DogecoinError::invalid_spend_type(format!("Unsupported spend type {}", sig_type))
    })
}

/// Convert an operation result into an owned C string
fn respond(result: DogecoinResult<String>) -> *mut c_char {
    let text = match result {
        Ok(value) => value,
        Err(e) => {
            log_error!("ffi", "Operation failed", code = e.code.as_str());
            e.to_json()
        }
    };
    string_to_ptr(text)
}

fn string_to_ptr(s: String) -> *mut c_char {
    match CString::new(s) {
        Ok(c_str) => c_str.into_raw(),
        Err(_) => CString::from(c"{\"code\":\"malformed_result\",\"message\":\"String conversion failed\"}")
            .into_raw(),
    }
}

// =============================================================================
// Keys and Addresses
// =============================================================================

/// Root private key (hex) of a BIP39 phrase and passphrase
#[unsafe(no_mangle)]
pub extern "C" fn generate_my_privkey_dogecoin(
    phrase: *const c_char,
    passphrase: *const c_char,
) -> *mut c_char {
    respond((|| {
        let phrase = parse_input(phrase, "phrase")?;
        let passphrase = parse_input(passphrase, "passphrase")?;
        api::derive_root_key(phrase, passphrase)
    })())
}

/// Compressed public key (hex) of a private key
#[unsafe(no_mangle)]
pub extern "C" fn generate_my_pubkey_dogecoin(private_key: *const c_char) -> *mut c_char {
    respond((|| api::derive_public_key(parse_input(private_key, "private_key")?))())
}

/// P2PKH address of a public key; network is "mainnet" or "testnet"
#[unsafe(no_mangle)]
pub extern "C" fn generate_address_dogecoin(
    public_key: *const c_char,
    network: *const c_char,
) -> *mut c_char {
    respond((|| {
        api::encode_address(
            parse_input(public_key, "public_key")?,
            parse_input(network, "network")?,
        )
    })())
}

/// Redeem script (hex) from concatenated 33-byte public keys
#[unsafe(no_mangle)]
pub extern "C" fn generate_redeem_script_dogecoin(
    public_keys: *const c_char,
    threshold: i64,
) -> *mut c_char {
    respond((|| {
        api::build_redeem_script_concatenated(parse_input(public_keys, "public_keys")?, threshold)
    })())
}

/// P2SH address of a redeem script
#[unsafe(no_mangle)]
pub extern "C" fn generate_multisig_address_dogecoin(
    redeem_script: *const c_char,
    network: *const c_char,
) -> *mut c_char {
    respond((|| {
        api::encode_multisig_address(
            parse_input(redeem_script, "redeem_script")?,
            parse_input(network, "network")?,
        )
    })())
}

// =============================================================================
// Transactions
// =============================================================================

/// Unsigned transaction (hex) spending one outpoint
#[unsafe(no_mangle)]
pub extern "C" fn generate_base_tx_dogecoin(txid: *const c_char, index: i64) -> *mut c_char {
    respond((|| api::new_transaction(parse_input(txid, "txid")?, parse_index(index)?))())
}

#[unsafe(no_mangle)]
pub extern "C" fn add_input_dogecoin(
    base_tx: *const c_char,
    txid: *const c_char,
    index: i64,
) -> *mut c_char {
    respond((|| {
        api::add_input(
            parse_input(base_tx, "base_tx")?,
            parse_input(txid, "txid")?,
            parse_index(index)?,
        )
    })())
}

#[unsafe(no_mangle)]
pub extern "C" fn add_output_dogecoin(
    base_tx: *const c_char,
    address: *const c_char,
    amount: i64,
) -> *mut c_char {
    respond((|| {
        api::add_output(
            parse_input(base_tx, "base_tx")?,
            parse_input(address, "address")?,
            parse_amount(amount)?,
        )
    })())
}

/// Sighash (hex) of an input; `sig_type` 0 = P2PKH, 1 = P2SH
#[unsafe(no_mangle)]
pub extern "C" fn generate_sighash_dogecoin(
    base_tx: *const c_char,
    txid: *const c_char,
    index: i64,
    sig_type: i64,
    script: *const c_char,
) -> *mut c_char {
    respond((|| {
        api::compute_sighash(
            parse_input(base_tx, "base_tx")?,
            parse_input(txid, "txid")?,
            parse_index(index)?,
            parse_spend_type(sig_type)?,
            parse_input(script, "script")?,
        )
    })())
}

/// Signature (hex, DER plus sighash byte) over a digest
#[unsafe(no_mangle)]
pub extern "C" fn generate_signature_dogecoin(
    message: *const c_char,
    private_key: *const c_char,
) -> *mut c_char {
    respond((|| {
        api::sign(
            parse_input(message, "digest")?,
            parse_input(private_key, "private_key")?,
        )
    })())
}

/// Splice a signature into an input and return the transaction (hex)
#[unsafe(no_mangle)]
pub extern "C" fn build_tx_dogecoin(
    base_tx: *const c_char,
    signature: *const c_char,
    txid: *const c_char,
    index: i64,
    sig_type: i64,
    script: *const c_char,
) -> *mut c_char {
    respond((|| {
        api::finalize_input(
            parse_input(base_tx, "base_tx")?,
            parse_input(signature, "signature")?,
            parse_input(txid, "txid")?,
            parse_index(index)?,
            parse_spend_type(sig_type)?,
            parse_input(script, "script")?,
        )
    })())
}
