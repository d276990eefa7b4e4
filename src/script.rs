//! Script Construction
//!
//! Locking scripts for P2PKH and P2SH outputs, m-of-n multisig redeem
//! scripts, and the push-only unlocking scripts the assembler writes.

use bitcoin::opcodes::all::{
    OP_CHECKMULTISIG, OP_CHECKSIG, OP_DUP, OP_EQUAL, OP_EQUALVERIFY, OP_HASH160, OP_PUSHNUM_1,
    OP_PUSHNUM_16,
};
use bitcoin::opcodes::{Opcode, OP_0};
use bitcoin::script::{Builder, Instruction, PushBytes, Script};

use crate::error::{DogecoinError, DogecoinResult};
use crate::wallet::keys::{PublicKey, COMPRESSED_PUBKEY_LEN};

/// Largest single push, and so the largest P2SH redeem script
pub const MAX_SCRIPT_ELEMENT_SIZE: usize = 520;

/// Most keys a P2SH multisig can hold within the push limit
pub const MAX_MULTISIG_KEYS: usize = 15;

/// `OP_DUP OP_HASH160 <hash> OP_EQUALVERIFY OP_CHECKSIG`
pub fn p2pkh_script_pubkey(pubkey_hash: &[u8; 20]) -> Vec<u8> {
    Builder::new()
        .push_opcode(OP_DUP)
        .push_opcode(OP_HASH160)
        .push_slice(pubkey_hash)
        .push_opcode(OP_EQUALVERIFY)
        .push_opcode(OP_CHECKSIG)
        .into_script()
        .into_bytes()
}

/// `OP_HASH160 <hash> OP_EQUAL`
pub fn p2sh_script_pubkey(script_hash: &[u8; 20]) -> Vec<u8> {
    Builder::new()
        .push_opcode(OP_HASH160)
        .push_slice(script_hash)
        .push_opcode(OP_EQUAL)
        .into_script()
        .into_bytes()
}

/// Check `1 <= threshold <= key_count <= MAX_MULTISIG_KEYS`
pub fn validate_threshold(threshold: usize, key_count: usize) -> DogecoinResult<()> {
    if key_count == 0 || key_count > MAX_MULTISIG_KEYS {
        return Err(DogecoinError::invalid_threshold(format!(
            "Multisig needs 1 to {} public keys, got {}",
            MAX_MULTISIG_KEYS, key_count
        )));
    }
    if threshold < 1 || threshold > key_count {
        return Err(DogecoinError::invalid_threshold(format!(
            "Threshold {} is outside 1..={}",
            threshold, key_count
        )));
    }
    Ok(())
}

/// Cut a concatenation of compressed public keys into 33-byte chunks
/// without checking that they are curve points.
///
/// Any trailing partial key is an error rather than being dropped.
pub fn concatenated_pubkey_chunks(hex_blob: &str) -> DogecoinResult<Vec<Vec<u8>>> {
    let bytes = hex::decode(hex_blob.trim())
        .map_err(|e| DogecoinError::invalid_pubkey(format!("Public keys are not hex: {}", e)))?;
    if bytes.is_empty() || bytes.len() % COMPRESSED_PUBKEY_LEN != 0 {
        return Err(DogecoinError::invalid_pubkey(format!(
            "Concatenated public keys must be a non-empty multiple of {} bytes, got {}",
            COMPRESSED_PUBKEY_LEN,
            bytes.len()
        )));
    }
    Ok(bytes.chunks(COMPRESSED_PUBKEY_LEN).map(<[u8]>::to_vec).collect())
}

/// Split a concatenation of compressed public keys
pub fn split_concatenated_pubkeys(hex_blob: &str) -> DogecoinResult<Vec<PublicKey>> {
    concatenated_pubkey_chunks(hex_blob)?
        .iter()
        .map(|chunk| PublicKey::from_slice(chunk))
        .collect()
}

/// An m-of-n multisig redeem script
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultisigScript {
    pub threshold: usize,
    pub public_keys: Vec<PublicKey>,
}

impl MultisigScript {
    pub fn new(public_keys: Vec<PublicKey>, threshold: usize) -> DogecoinResult<Self> {
        validate_threshold(threshold, public_keys.len())?;
        Ok(Self { threshold, public_keys })
    }

    /// `OP_m <pubkey_1> ... <pubkey_n> OP_n OP_CHECKMULTISIG`, keys in the
    /// order given
    pub fn to_bytes(&self) -> Vec<u8> {
        let builder = self
            .public_keys
            .iter()
            .fold(Builder::new().push_int(self.threshold as i64), |b, key| {
                b.push_slice(key.serialize())
            });
        builder
            .push_int(self.public_keys.len() as i64)
            .push_opcode(OP_CHECKMULTISIG)
            .into_script()
            .into_bytes()
    }

    /// Recover threshold and keys from a serialized redeem script
    pub fn parse(script: &[u8]) -> DogecoinResult<Self> {
        let mut threshold = None;
        let mut keys = Vec::new();
        let mut key_count = None;
        let mut terminated = false;

        for instruction in Script::from_bytes(script).instructions() {
            let instruction = instruction
                .map_err(|e| DogecoinError::invalid_script(format!("Malformed script: {}", e)))?;
            if terminated {
                return Err(DogecoinError::invalid_script("Data after OP_CHECKMULTISIG"));
            }
            match instruction {
                Instruction::Op(op) if threshold.is_none() => {
                    threshold = Some(small_int(op).ok_or_else(not_multisig)?);
                }
                Instruction::PushBytes(data) if threshold.is_some() && key_count.is_none() => {
                    keys.push(PublicKey::from_slice(data.as_bytes()).map_err(|e| {
                        DogecoinError::invalid_script(format!("Bad key in redeem script: {}", e.message))
                    })?);
                }
                Instruction::Op(op) if threshold.is_some() && key_count.is_none() => {
                    key_count = Some(small_int(op).ok_or_else(not_multisig)?);
                }
                Instruction::Op(op) if key_count.is_some() && op == OP_CHECKMULTISIG => {
                    terminated = true;
                }
                _ => return Err(not_multisig()),
            }
        }

        match (threshold, key_count) {
            (Some(m), Some(n)) if terminated && n == keys.len() => Self::new(keys, m),
            _ => Err(not_multisig()),
        }
    }
}

fn not_multisig() -> DogecoinError {
    DogecoinError::invalid_script("Script is not an m-of-n multisig script")
}

/// Value of OP_1..OP_16
fn small_int(op: Opcode) -> Option<usize> {
    let code = op.to_u8();
    if (OP_PUSHNUM_1.to_u8()..=OP_PUSHNUM_16.to_u8()).contains(&code) {
        Some((code - OP_PUSHNUM_1.to_u8() + 1) as usize)
    } else {
        None
    }
}

/// Build a multisig redeem script from ordered keys
pub fn build_redeem_script(public_keys: &[PublicKey], threshold: usize) -> DogecoinResult<Vec<u8>> {
    Ok(MultisigScript::new(public_keys.to_vec(), threshold)?.to_bytes())
}

fn push_data(builder: Builder, data: &[u8]) -> DogecoinResult<Builder> {
    let push: &PushBytes = data.try_into().map_err(|_| {
        DogecoinError::invalid_script(format!("Push of {} bytes exceeds script limits", data.len()))
    })?;
    Ok(builder.push_slice(push))
}

/// `<signature> <pubkey>`
pub fn p2pkh_script_sig(signature: &[u8], public_key: &PublicKey) -> DogecoinResult<Vec<u8>> {
    let builder = push_data(Builder::new(), signature)?;
    Ok(builder.push_slice(public_key.serialize()).into_script().into_bytes())
}

/// `OP_0 <sig_1> ... <sig_k> <redeem_script>`
pub fn p2sh_multisig_script_sig(signatures: &[Vec<u8>], redeem_script: &[u8]) -> DogecoinResult<Vec<u8>> {
    let mut builder = Builder::new().push_opcode(OP_0);
    for signature in signatures {
        builder = push_data(builder, signature)?;
    }
    Ok(push_data(builder, redeem_script)?.into_script().into_bytes())
}

/// Data elements of a push-only script. `OP_0` yields an empty element.
pub fn parse_pushes(script: &[u8]) -> DogecoinResult<Vec<Vec<u8>>> {
    Script::from_bytes(script)
        .instructions()
        .map(|instruction| match instruction {
            Ok(Instruction::PushBytes(data)) => Ok(data.as_bytes().to_vec()),
            Ok(Instruction::Op(op)) => Err(DogecoinError::invalid_script(format!(
                "Unexpected opcode {} in unlocking script",
                op
            ))),
            Err(e) => Err(DogecoinError::invalid_script(format!("Malformed script: {}", e))),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::wallet::keys::PrivateKey;

    fn key(n: u8) -> PublicKey {
        let mut bytes = [0u8; 32];
        bytes[31] = n;
        PrivateKey::from_slice(&bytes).unwrap().public_key()
    }

    #[test]
    fn test_two_of_three_layout() {
        let keys = vec![key(1), key(2), key(3)];
        let script = build_redeem_script(&keys, 2).unwrap();

        assert_eq!(script.len(), 1 + 3 * 34 + 2);
        assert_eq!(script[0], 0x52); // OP_2
        for (i, k) in keys.iter().enumerate() {
            let offset = 1 + i * 34;
            assert_eq!(script[offset], 0x21);
            assert_eq!(&script[offset + 1..offset + 34], &k.serialize()[..]);
        }
        assert_eq!(script[script.len() - 2], 0x53); // OP_3
        assert_eq!(script[script.len() - 1], 0xae); // OP_CHECKMULTISIG
    }

    #[test]
    fn test_key_order_is_preserved() {
        let a = build_redeem_script(&[key(1), key(2)], 1).unwrap();
        let b = build_redeem_script(&[key(2), key(1)], 1).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_threshold_bounds() {
        let keys = vec![key(1), key(2), key(3)];
        assert_eq!(build_redeem_script(&keys, 0).unwrap_err().code, ErrorCode::InvalidThreshold);
        assert_eq!(build_redeem_script(&keys, 4).unwrap_err().code, ErrorCode::InvalidThreshold);
        assert_eq!(build_redeem_script(&[], 1).unwrap_err().code, ErrorCode::InvalidThreshold);
        assert!(build_redeem_script(&keys, 3).is_ok());

        let many: Vec<_> = (1..=16).map(key).collect();
        assert_eq!(build_redeem_script(&many, 2).unwrap_err().code, ErrorCode::InvalidThreshold);
        let fifteen = build_redeem_script(&many[..15], 15).unwrap();
        assert!(fifteen.len() <= MAX_SCRIPT_ELEMENT_SIZE);
    }

    #[test]
    fn test_parse_round_trip() {
        let keys = vec![key(5), key(6), key(7)];
        let script = build_redeem_script(&keys, 2).unwrap();
        let parsed = MultisigScript::parse(&script).unwrap();
        assert_eq!(parsed.threshold, 2);
        assert_eq!(parsed.public_keys, keys);
    }

    #[test]
    fn test_parse_rejects_non_multisig() {
        let spk = p2pkh_script_pubkey(&[0u8; 20]);
        assert_eq!(MultisigScript::parse(&spk).unwrap_err().code, ErrorCode::InvalidScript);

        let mut script = build_redeem_script(&[key(1), key(2)], 1).unwrap();
        let n = script.len();
        script[n - 2] = 0x53; // claims 3 keys
        assert_eq!(MultisigScript::parse(&script).unwrap_err().code, ErrorCode::InvalidScript);

        assert_eq!(MultisigScript::parse(&[]).unwrap_err().code, ErrorCode::InvalidScript);
    }

    #[test]
    fn test_split_concatenated() {
        let blob = format!("{}{}", key(1).to_hex(), key(2).to_hex());
        let keys = split_concatenated_pubkeys(&blob).unwrap();
        assert_eq!(keys, vec![key(1), key(2)]);

        let truncated = &blob[..blob.len() - 2];
        assert_eq!(split_concatenated_pubkeys(truncated).unwrap_err().code, ErrorCode::InvalidPubkey);
        assert_eq!(split_concatenated_pubkeys("").unwrap_err().code, ErrorCode::InvalidPubkey);

        // chunking only looks at the length
        let off_curve = format!("{}02{}", key(1).to_hex(), "ff".repeat(32));
        assert_eq!(concatenated_pubkey_chunks(&off_curve).unwrap().len(), 2);
        assert_eq!(split_concatenated_pubkeys(&off_curve).unwrap_err().code, ErrorCode::InvalidPubkey);
    }

    #[test]
    fn test_script_sig_pushes() {
        let sig = vec![0x30; 71];
        let redeem = build_redeem_script(&[key(1), key(2)], 2).unwrap();
        let script_sig = p2sh_multisig_script_sig(&[sig.clone(), sig.clone()], &redeem).unwrap();
        let pushes = parse_pushes(&script_sig).unwrap();
        assert_eq!(pushes.len(), 4);
        assert!(pushes[0].is_empty());
        assert_eq!(pushes[1], sig);
        assert_eq!(pushes[3], redeem);

        let p2pkh = p2pkh_script_sig(&sig, &key(1)).unwrap();
        assert_eq!(p2pkh[0], 71);
        let pushes = parse_pushes(&p2pkh).unwrap();
        assert_eq!(pushes[1], key(1).serialize().to_vec());
    }

    #[test]
    fn test_large_redeem_script_uses_pushdata2() {
        let keys: Vec<_> = (1..=15).map(key).collect();
        let redeem = build_redeem_script(&keys, 1).unwrap();
        assert!(redeem.len() > 255);
        let script_sig = p2sh_multisig_script_sig(&[], &redeem).unwrap();
        assert_eq!(script_sig[1], 0x4d); // OP_PUSHDATA2
        assert_eq!(parse_pushes(&script_sig).unwrap()[1], redeem);
    }

    #[test]
    fn test_parse_pushes_rejects_opcodes() {
        let spk = p2pkh_script_pubkey(&[0u8; 20]);
        assert_eq!(parse_pushes(&spk).unwrap_err().code, ErrorCode::InvalidScript);
    }
}
