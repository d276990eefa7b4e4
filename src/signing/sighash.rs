//! Legacy Sighash
//!
//! The digest a signature commits to. The transaction is copied, the
//! target input's script_sig is replaced by the script being satisfied
//! (the P2PKH locking script, or the P2SH redeem script), every other
//! script_sig is emptied, and `SHA256(SHA256(tx || sighash_type as u32 LE))`
//! is taken over the result.

use bitcoin::hashes::{sha256d, Hash};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{DogecoinError, DogecoinResult};
use crate::script::{p2pkh_script_pubkey, MAX_SCRIPT_ELEMENT_SIZE};
use crate::tx::{OutPoint, Transaction};
use crate::types::{SighashType, SpendType};
use crate::wallet::keys::PublicKey;

/// A 32-byte signature hash
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SighashDigest(#[serde(with = "crate::serde_bytes::hex32")] [u8; 32]);

impl SighashDigest {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Hex in hash output order (not reversed)
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(s: &str) -> DogecoinResult<Self> {
        let bytes = hex::decode(s.trim())
            .map_err(|e| DogecoinError::invalid_digest(format!("Digest is not hex: {}", e)))?;
        let arr: [u8; 32] = bytes.try_into().map_err(|v: Vec<u8>| {
            DogecoinError::invalid_digest(format!("Digest must be 32 bytes, got {}", v.len()))
        })?;
        Ok(Self(arr))
    }
}

impl FromStr for SighashDigest {
    type Err = DogecoinError;

    fn from_str(s: &str) -> DogecoinResult<Self> {
        Self::from_hex(s)
    }
}

impl fmt::Debug for SighashDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SighashDigest({})", self.to_hex())
    }
}

impl fmt::Display for SighashDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Script placed in the signed input during hashing.
///
/// For P2PKH `script` is the spender's compressed public key and the
/// locking script is rebuilt from its hash; for P2SH `script` is the
/// redeem script itself.
pub fn substitution_script(spend_type: SpendType, script: &[u8]) -> DogecoinResult<Vec<u8>> {
    match spend_type {
        SpendType::P2pkh => {
            let public_key = PublicKey::from_slice(script)?;
            Ok(p2pkh_script_pubkey(&public_key.hash160()))
        }
        SpendType::P2sh => {
            if script.is_empty() || script.len() > MAX_SCRIPT_ELEMENT_SIZE {
                return Err(DogecoinError::invalid_script(format!(
                    "Redeem script must be 1 to {} bytes, got {}",
                    MAX_SCRIPT_ELEMENT_SIZE,
                    script.len()
                )));
            }
            Ok(script.to_vec())
        }
    }
}

/// Sighash of input `index` with `script_code` substituted
pub fn sighash_for_index(
    tx: &Transaction,
    index: usize,
    script_code: &[u8],
    sighash_type: SighashType,
) -> DogecoinResult<SighashDigest> {
    if index >= tx.inputs.len() {
        return Err(DogecoinError::input_not_found(format!(
            "Input index {} out of range ({} inputs)",
            index,
            tx.inputs.len()
        )));
    }

    let mut snapshot = tx.clone();
    for (i, input) in snapshot.inputs.iter_mut().enumerate() {
        input.script_sig = if i == index {
            script_code.to_vec()
        } else {
            Vec::new()
        };
    }

    let mut preimage = snapshot.serialize();
    preimage.extend_from_slice(&sighash_type.to_u32_le());

    Ok(SighashDigest(sha256d::Hash::hash(&preimage).to_byte_array()))
}

/// Sighash of the input spending `outpoint`
pub fn compute_sighash(
    tx: &Transaction,
    outpoint: &OutPoint,
    spend_type: SpendType,
    script: &[u8],
    sighash_type: SighashType,
) -> DogecoinResult<SighashDigest> {
    let index = tx.find_input(outpoint).ok_or_else(|| {
        DogecoinError::input_not_found(format!(
            "No input spends {}:{}",
            outpoint.txid, outpoint.vout
        ))
    })?;
    let script_code = substitution_script(spend_type, script)?;
    sighash_for_index(tx, index, &script_code, sighash_type)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::tx::{TxInput, TxOutput};

    const G_COMPRESSED: &str = "0279be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798";

    fn outpoint(byte: &str, vout: u32) -> OutPoint {
        OutPoint::new(byte.repeat(32).parse().unwrap(), vout)
    }

    fn sample_tx() -> Transaction {
        let input = |op: OutPoint| TxInput {
            previous_output: op,
            script_sig: vec![],
            sequence: 0xffffffff,
        };
        Transaction {
            version: 1,
            inputs: vec![input(outpoint("aa", 0)), input(outpoint("bb", 1))],
            outputs: vec![TxOutput {
                value: 100_000_000,
                script_pubkey: p2pkh_script_pubkey(&[0x11; 20]),
            }],
            lock_time: 0,
        }
    }

    fn pubkey() -> Vec<u8> {
        hex::decode(G_COMPRESSED).unwrap()
    }

    #[test]
    fn test_matches_manual_preimage() {
        let tx = sample_tx();
        let digest =
            compute_sighash(&tx, &outpoint("aa", 0), SpendType::P2pkh, &pubkey(), SighashType::All).unwrap();

        let mut manual = tx.clone();
        manual.inputs[0].script_sig =
            hex::decode("76a914751e76e8199196d454941c45d1b3a323f1433bd688ac").unwrap();
        let mut bytes = manual.serialize();
        bytes.extend_from_slice(&[1, 0, 0, 0]);
        let expected = sha256d::Hash::hash(&bytes).to_byte_array();

        assert_eq!(digest.as_bytes(), &expected);
    }

    #[test]
    fn test_deterministic() {
        let tx = sample_tx();
        let a = compute_sighash(&tx, &outpoint("bb", 1), SpendType::P2pkh, &pubkey(), SighashType::All).unwrap();
        let b = compute_sighash(&tx, &outpoint("bb", 1), SpendType::P2pkh, &pubkey(), SighashType::All).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_inputs_get_distinct_digests() {
        let tx = sample_tx();
        let first = compute_sighash(&tx, &outpoint("aa", 0), SpendType::P2pkh, &pubkey(), SighashType::All).unwrap();
        let second = compute_sighash(&tx, &outpoint("bb", 1), SpendType::P2pkh, &pubkey(), SighashType::All).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_existing_script_sigs_are_ignored() {
        let tx = sample_tx();
        let mut signed = tx.clone();
        signed.inputs[0].script_sig = vec![0x01, 0x02];
        signed.inputs[1].script_sig = vec![0x03];
        let op = outpoint("aa", 0);
        assert_eq!(
            compute_sighash(&tx, &op, SpendType::P2pkh, &pubkey(), SighashType::All).unwrap(),
            compute_sighash(&signed, &op, SpendType::P2pkh, &pubkey(), SighashType::All).unwrap()
        );
    }

    #[test]
    fn test_p2sh_uses_script_verbatim() {
        let tx = sample_tx();
        let redeem = vec![0x51, 0x21];
        let digest = compute_sighash(&tx, &outpoint("aa", 0), SpendType::P2sh, &redeem, SighashType::All).unwrap();
        assert_eq!(digest, sighash_for_index(&tx, 0, &redeem, SighashType::All).unwrap());
    }

    #[test]
    fn test_errors() {
        let tx = sample_tx();
        let missing = compute_sighash(&tx, &outpoint("cc", 0), SpendType::P2pkh, &pubkey(), SighashType::All);
        assert_eq!(missing.unwrap_err().code, ErrorCode::InputNotFound);

        let bad_key = compute_sighash(&tx, &outpoint("aa", 0), SpendType::P2pkh, &[0x02; 5], SighashType::All);
        assert_eq!(bad_key.unwrap_err().code, ErrorCode::InvalidPubkey);

        let empty = compute_sighash(&tx, &outpoint("aa", 0), SpendType::P2sh, &[], SighashType::All);
        assert_eq!(empty.unwrap_err().code, ErrorCode::InvalidScript);

        assert_eq!(
            sighash_for_index(&tx, 2, &[], SighashType::All).unwrap_err().code,
            ErrorCode::InputNotFound
        );
    }

    #[test]
    fn test_digest_hex() {
        let digest = SighashDigest::from_bytes([0xab; 32]);
        assert_eq!(SighashDigest::from_hex(&digest.to_hex()).unwrap(), digest);
        assert_eq!(SighashDigest::from_hex("abcd").unwrap_err().code, ErrorCode::InvalidDigest);
    }
}
