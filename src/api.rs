//! Hex-string operation surface
//!
//! Every operation takes and returns text: hex for keys, scripts,
//! digests, signatures and transactions, Base58Check for addresses, and
//! display-order hex for txids. Results are checked before they are
//! returned. A value that is not well-formed becomes `MalformedResult`
//! carrying the operation, the sub-operation that produced it and the raw
//! text. Failures raised inside an operation are tagged with the same
//! operation/sub-operation context.
//!
//! All functions are pure; they may be called from any number of threads.

use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::error::{DogecoinError, DogecoinResult};
use crate::script;
use crate::signing::{self, SighashDigest, Signature};
use crate::tx::{self, OutPoint, Transaction, TransactionBuilder};
use crate::types::{Network, SighashType, SpendType, Txid};
use crate::wallet::{self, Address, PrivateKey, PublicKey};
use crate::{log_debug, log_warn};

const MODULE: &str = "api";

/// Accept `value` only if it is non-empty, even-length hex
fn checked_hex(operation: &str, sub_operation: &str, value: String) -> DogecoinResult<String> {
    let well_formed = !value.is_empty()
        && value.len() % 2 == 0
        && value.bytes().all(|b| b.is_ascii_hexdigit());
    if well_formed {
        Ok(value)
    } else {
        log_warn!(MODULE, "Rejected malformed result", operation = operation, sub_operation = sub_operation);
        Err(DogecoinError::malformed_result(operation, sub_operation, value))
    }
}

/// Accept `value` only if it is a non-empty Base58 string
fn checked_base58(operation: &str, sub_operation: &str, value: String) -> DogecoinResult<String> {
    let well_formed = !value.is_empty()
        && value
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() && !matches!(b, b'0' | b'O' | b'I' | b'l'));
    if well_formed {
        Ok(value)
    } else {
        Err(DogecoinError::malformed_result(operation, sub_operation, value))
    }
}

/// Error mapper attaching operation context
fn during<'a>(
    operation: &'a str,
    sub_operation: &'a str,
    raw: &'a str,
) -> impl Fn(DogecoinError) -> DogecoinError + 'a {
    move |e| e.with_context(operation, sub_operation, raw)
}

fn parse_network(operation: &str, network: &str) -> DogecoinResult<Network> {
    network.parse().map_err(during(operation, "parse_network", network))
}

fn parse_outpoint(operation: &str, txid: &str, vout: u32) -> DogecoinResult<OutPoint> {
    let txid: Txid = txid.parse().map_err(during(operation, "parse_txid", txid))?;
    Ok(OutPoint::new(txid, vout))
}

fn parse_transaction(operation: &str, tx_hex: &str) -> DogecoinResult<Transaction> {
    Transaction::from_hex(tx_hex)
        .map_err(|e| DogecoinError::from(e).with_context(operation, "decode_transaction", tx_hex))
}

fn parse_script(operation: &str, script_hex: &str) -> DogecoinResult<Vec<u8>> {
    hex::decode(script_hex.trim()).map_err(|e| {
        DogecoinError::invalid_script(format!("Script is not hex: {}", e))
            .with_context(operation, "decode_script", script_hex)
    })
}

fn parse_threshold(operation: &str, threshold: i64) -> DogecoinResult<usize> {
    usize::try_from(threshold).map_err(|_| {
        DogecoinError::invalid_threshold(format!("Threshold {} is negative", threshold))
            .with_context(operation, "validate_threshold", threshold.to_string())
    })
}

/// Root private key (hex) of a BIP39 phrase and passphrase
pub fn derive_root_key(phrase: &str, passphrase: &str) -> DogecoinResult<String> {
    const OP: &str = "derive_root_key";
    let key = wallet::derive_root_key(phrase, passphrase).map_err(during(OP, "mnemonic_to_seed", ""))?;
    log_debug!(MODULE, "Derived root key");
    checked_hex(OP, "serialize_private_key", key.to_hex())
}

/// Private key (hex) at a BIP32 path below the root
pub fn derive_account_key(phrase: &str, passphrase: &str, path: &str) -> DogecoinResult<String> {
    const OP: &str = "derive_account_key";
    let key = wallet::derive_account_key(phrase, passphrase, path).map_err(during(OP, "derive_path", path))?;
    log_debug!(MODULE, "Derived account key", path = path);
    checked_hex(OP, "serialize_private_key", key.to_hex())
}

/// Compressed public key (hex) of a private key
pub fn derive_public_key(private_key_hex: &str) -> DogecoinResult<String> {
    const OP: &str = "derive_public_key";
    let public_key = wallet::derive_public_key(private_key_hex).map_err(during(OP, "parse_private_key", ""))?;
    checked_hex(OP, "serialize_public_key", public_key.to_hex())
}

/// WIF export of a private key
pub fn private_key_to_wif(private_key_hex: &str, network: &str) -> DogecoinResult<String> {
    const OP: &str = "private_key_to_wif";
    let network = parse_network(OP, network)?;
    let key = PrivateKey::from_hex(private_key_hex).map_err(during(OP, "parse_private_key", ""))?;
    checked_base58(OP, "encode_wif", wallet::encode_wif(&key, network))
}

/// Private key (hex) of a WIF string
pub fn wif_to_private_key(wif: &str) -> DogecoinResult<String> {
    const OP: &str = "wif_to_private_key";
    let (key, _, _) = wallet::decode_wif(wif).map_err(during(OP, "decode_wif", ""))?;
    checked_hex(OP, "serialize_private_key", key.to_hex())
}

/// P2PKH address of a public key
pub fn encode_address(public_key_hex: &str, network: &str) -> DogecoinResult<String> {
    const OP: &str = "encode_address";
    let network = parse_network(OP, network)?;
    let address = wallet::encode_address(public_key_hex, network)
        .map_err(during(OP, "parse_public_key", public_key_hex))?;
    checked_base58(OP, "base58check_encode", address)
}

/// m-of-n redeem script (hex) over ordered public keys
pub fn build_redeem_script(public_keys_hex: &[&str], threshold: i64) -> DogecoinResult<String> {
    const OP: &str = "build_redeem_script";
    let threshold = parse_threshold(OP, threshold)?;
    script::validate_threshold(threshold, public_keys_hex.len())
        .map_err(during(OP, "validate_threshold", ""))?;

    let public_keys = public_keys_hex
        .iter()
        .map(|key| PublicKey::from_hex(key).map_err(during(OP, "parse_public_key", key)))
        .collect::<DogecoinResult<Vec<_>>>()?;

    let redeem = script::build_redeem_script(&public_keys, threshold).map_err(during(OP, "build_script", ""))?;
    checked_hex(OP, "serialize_script", hex::encode(redeem))
}

/// Redeem script over a blob of concatenated 33-byte public keys
pub fn build_redeem_script_concatenated(public_keys_hex: &str, threshold: i64) -> DogecoinResult<String> {
    const OP: &str = "build_redeem_script";
    let threshold = parse_threshold(OP, threshold)?;
    let chunks = script::concatenated_pubkey_chunks(public_keys_hex)
        .map_err(during(OP, "split_public_keys", public_keys_hex))?;
    script::validate_threshold(threshold, chunks.len()).map_err(during(OP, "validate_threshold", ""))?;

    let public_keys = chunks
        .iter()
        .map(|chunk| PublicKey::from_slice(chunk))
        .collect::<DogecoinResult<Vec<_>>>()
        .map_err(during(OP, "parse_public_key", public_keys_hex))?;
    let redeem = script::build_redeem_script(&public_keys, threshold).map_err(during(OP, "build_script", ""))?;
    checked_hex(OP, "serialize_script", hex::encode(redeem))
}

/// P2SH address of a redeem script
pub fn encode_multisig_address(redeem_script_hex: &str, network: &str) -> DogecoinResult<String> {
    const OP: &str = "encode_multisig_address";
    let network = parse_network(OP, network)?;
    let address = wallet::encode_multisig_address(redeem_script_hex, network)
        .map_err(during(OP, "hash_script", redeem_script_hex))?;
    checked_base58(OP, "base58check_encode", address)
}

/// Unsigned transaction spending one outpoint, with default settings
pub fn new_transaction(txid: &str, vout: u32) -> DogecoinResult<String> {
    new_transaction_with_config(txid, vout, &EngineConfig::default())
}

/// Unsigned transaction spending one outpoint
pub fn new_transaction_with_config(txid: &str, vout: u32, config: &EngineConfig) -> DogecoinResult<String> {
    const OP: &str = "new_transaction";
    let outpoint = parse_outpoint(OP, txid, vout)?;
    let tx = TransactionBuilder::with_config(outpoint, config).build();
    log_debug!(MODULE, "Started transaction", txid = txid, vout = vout);
    checked_hex(OP, "serialize_transaction", tx.to_hex())
}

/// Append an input to a serialized transaction
pub fn add_input(tx_hex: &str, txid: &str, vout: u32) -> DogecoinResult<String> {
    const OP: &str = "add_input";
    let tx = parse_transaction(OP, tx_hex)?;
    let outpoint = parse_outpoint(OP, txid, vout)?;
    let tx = TransactionBuilder::from_transaction(tx)
        .and_then(|b| b.add_input(outpoint))
        .map_err(during(OP, "append_input", txid))?
        .build();
    log_debug!(MODULE, "Added input", txid = txid, vout = vout, inputs = tx.inputs.len());
    checked_hex(OP, "serialize_transaction", tx.to_hex())
}

/// Append an output paying `value` koinu to `address`
pub fn add_output(tx_hex: &str, address: &str, value: u64) -> DogecoinResult<String> {
    const OP: &str = "add_output";
    let tx = parse_transaction(OP, tx_hex)?;
    let address: Address = address.parse().map_err(during(OP, "decode_address", address))?;
    let tx = TransactionBuilder::from_transaction(tx)
        .map_err(during(OP, "append_output", ""))?
        .add_output(&address, value)
        .build();
    log_debug!(MODULE, "Added output", address = address, value = value);
    checked_hex(OP, "serialize_transaction", tx.to_hex())
}

/// Sighash (hex) of the input spending `txid:vout`.
///
/// `spend_type` is 0 for P2PKH (`script` is the public key) or 1 for P2SH
/// (`script` is the redeem script).
pub fn compute_sighash(
    tx_hex: &str,
    txid: &str,
    vout: u32,
    spend_type: u64,
    script_hex: &str,
) -> DogecoinResult<String> {
    const OP: &str = "compute_sighash";
    let tx = parse_transaction(OP, tx_hex)?;
    let outpoint = parse_outpoint(OP, txid, vout)?;
    let spend_type = SpendType::from_code(spend_type).map_err(during(OP, "parse_spend_type", ""))?;
    let script = parse_script(OP, script_hex)?;

    let digest = signing::compute_sighash(&tx, &outpoint, spend_type, &script, SighashType::All)
        .map_err(during(OP, "hash_input", txid))?;
    log_debug!(MODULE, "Computed sighash", txid = txid, vout = vout, digest = digest);
    checked_hex(OP, "serialize_digest", digest.to_hex())
}

/// DER signature plus SIGHASH_ALL byte (hex) over a digest
pub fn sign(digest_hex: &str, private_key_hex: &str) -> DogecoinResult<String> {
    const OP: &str = "sign";
    let digest = SighashDigest::from_hex(digest_hex).map_err(during(OP, "parse_digest", digest_hex))?;
    let key = PrivateKey::from_hex(private_key_hex).map_err(during(OP, "parse_private_key", ""))?;
    let signature = signing::sign(&digest, &key);
    checked_hex(OP, "serialize_signature", signature.to_hex())
}

/// Whether `signature_hex` is valid for the digest and public key
pub fn verify(digest_hex: &str, signature_hex: &str, public_key_hex: &str) -> DogecoinResult<bool> {
    const OP: &str = "verify";
    let digest = SighashDigest::from_hex(digest_hex).map_err(during(OP, "parse_digest", digest_hex))?;
    let signature = Signature::from_hex(signature_hex).map_err(during(OP, "parse_signature", signature_hex))?;
    let public_key = PublicKey::from_hex(public_key_hex).map_err(during(OP, "parse_public_key", public_key_hex))?;
    Ok(signature.verify(&digest, &public_key))
}

/// Splice a signature into the input spending `txid:vout`.
///
/// For P2SH, pass the partially signed transaction back in to add the
/// next signature.
pub fn finalize_input(
    tx_hex: &str,
    signature_hex: &str,
    txid: &str,
    vout: u32,
    spend_type: u64,
    script_hex: &str,
) -> DogecoinResult<String> {
    const OP: &str = "finalize_input";
    let tx = parse_transaction(OP, tx_hex)?;
    let outpoint = parse_outpoint(OP, txid, vout)?;
    let spend_type = SpendType::from_code(spend_type).map_err(during(OP, "parse_spend_type", ""))?;
    let signature = hex::decode(signature_hex.trim()).map_err(|e| {
        DogecoinError::invalid_signature(format!("Signature is not hex: {}", e))
            .with_context(OP, "decode_signature", signature_hex)
    })?;
    let script = parse_script(OP, script_hex)?;

    let signed = tx::finalize_input(&tx, &signature, &outpoint, spend_type, &script)
        .map_err(during(OP, "assemble_script_sig", txid))?;
    log_debug!(MODULE, "Finalized input", txid = txid, vout = vout, spend_type = spend_type.code());
    checked_hex(OP, "serialize_transaction", signed.to_hex())
}

/// Compose an unsigned transaction from parallel input and output arrays
pub fn generate_raw_tx(
    txids: &[&str],
    vouts: &[u32],
    addresses: &[&str],
    amounts: &[u64],
    config: &EngineConfig,
) -> DogecoinResult<String> {
    const OP: &str = "generate_raw_tx";
    if txids.len() != vouts.len() {
        return Err(DogecoinError::length_mismatch(format!(
            "{} txids but {} output indexes",
            txids.len(),
            vouts.len()
        ))
        .with_context(OP, "check_inputs", ""));
    }
    if addresses.len() != amounts.len() {
        return Err(DogecoinError::length_mismatch(format!(
            "{} addresses but {} amounts",
            addresses.len(),
            amounts.len()
        ))
        .with_context(OP, "check_outputs", ""));
    }

    let mut outpoints = txids
        .iter()
        .zip(vouts)
        .map(|(txid, vout)| parse_outpoint(OP, txid, *vout));
    let first = outpoints.next().ok_or_else(|| {
        DogecoinError::invalid_transaction("At least one input is required")
            .with_context(OP, "check_inputs", "")
    })??;

    let mut builder = TransactionBuilder::with_config(first, config);
    for outpoint in outpoints {
        builder = builder.add_input(outpoint?).map_err(during(OP, "append_input", ""))?;
    }
    for (address, amount) in addresses.iter().zip(amounts) {
        let parsed: Address = address.parse().map_err(during(OP, "decode_address", address))?;
        builder = builder.add_output(&parsed, *amount);
    }

    let tx = builder.build();
    log_debug!(MODULE, "Composed raw transaction", inputs = tx.inputs.len(), outputs = tx.outputs.len());
    checked_hex(OP, "serialize_transaction", tx.to_hex())
}

/// JSON-friendly view of a transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodedTransaction {
    pub txid: Txid,
    pub version: i32,
    pub lock_time: u32,
    pub size: usize,
    pub inputs: Vec<DecodedInput>,
    pub outputs: Vec<DecodedOutput>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodedInput {
    pub txid: Txid,
    pub vout: u32,
    pub script_sig: String,
    pub sequence: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodedOutput {
    pub value: u64,
    pub script_pubkey: String,
    /// Set for standard P2PKH and P2SH scripts
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

/// Decode a serialized transaction; output addresses use `network`
pub fn decode_transaction(tx_hex: &str, network: &str) -> DogecoinResult<DecodedTransaction> {
    const OP: &str = "decode_transaction";
    let network = parse_network(OP, network)?;
    let tx = parse_transaction(OP, tx_hex)?;

    Ok(DecodedTransaction {
        txid: tx.txid(),
        version: tx.version,
        lock_time: tx.lock_time,
        size: tx.serialize().len(),
        inputs: tx
            .inputs
            .iter()
            .map(|input| DecodedInput {
                txid: input.previous_output.txid,
                vout: input.previous_output.vout,
                script_sig: hex::encode(&input.script_sig),
                sequence: input.sequence,
            })
            .collect(),
        outputs: tx
            .outputs
            .iter()
            .map(|output| DecodedOutput {
                value: output.value,
                script_pubkey: hex::encode(&output.script_pubkey),
                address: Address::from_script_pubkey(&output.script_pubkey, network)
                    .map(|a| a.to_string()),
            })
            .collect(),
    })
}
