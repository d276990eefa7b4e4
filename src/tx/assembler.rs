//! Signature Assembly
//!
//! Splices signatures into the unlocking script of one input.
//!
//! P2PKH inputs are finalized in a single call. P2SH multisig inputs are
//! signed incrementally: every call reads back the signatures already in
//! the input, adds the new one and re-emits them in redeem-script key
//! order, so the partially signed transaction is threaded through
//! successive calls the same way inputs and outputs are during building.

use crate::error::{DogecoinError, DogecoinResult};
use crate::script::{p2pkh_script_sig, p2sh_multisig_script_sig, parse_pushes, MultisigScript};
use crate::signing::{sighash_for_index, substitution_script, Signature};
use crate::types::SpendType;
use crate::wallet::keys::PublicKey;

use super::codec::{OutPoint, Transaction};

/// Signatures present on a multisig input, one slot per redeem-script key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultisigProgress {
    pub threshold: usize,
    pub slots: Vec<Option<Vec<u8>>>,
}

impl MultisigProgress {
    pub fn signature_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_complete(&self) -> bool {
        self.signature_count() >= self.threshold
    }

    fn ordered_signatures(&self) -> Vec<Vec<u8>> {
        self.slots.iter().flatten().cloned().collect()
    }
}

/// Return `tx` with `signature` applied to the input spending `outpoint`.
///
/// `script` is the signer's public key for P2PKH or the redeem script for
/// P2SH. The signature is verified against the input's sighash before it
/// is accepted.
pub fn finalize_input(
    tx: &Transaction,
    signature: &[u8],
    outpoint: &OutPoint,
    spend_type: SpendType,
    script: &[u8],
) -> DogecoinResult<Transaction> {
    let index = locate(tx, outpoint)?;
    let parsed = Signature::from_slice(signature)?;

    let script_sig = match spend_type {
        SpendType::P2pkh => {
            let public_key = PublicKey::from_slice(script)?;
            let script_code = substitution_script(spend_type, script)?;
            let digest = sighash_for_index(tx, index, &script_code, parsed.sighash_type())?;
            if !parsed.verify(&digest, &public_key) {
                return Err(DogecoinError::invalid_signature(
                    "Signature does not match the public key for this input",
                ));
            }
            p2pkh_script_sig(signature, &public_key)?
        }
        SpendType::P2sh => {
            let multisig = MultisigScript::parse(script)?;
            let mut progress =
                read_progress(tx, index, &tx.inputs[index].script_sig, script, &multisig)?;

            let slot = matching_slot(tx, index, script, &multisig, &progress, &parsed)?.ok_or_else(|| {
                DogecoinError::invalid_signature("Signature matches no key in the redeem script")
            })?;

            if progress.slots[slot].is_none() && progress.is_complete() {
                return Err(DogecoinError::invalid_signature(format!(
                    "Input already carries the {} required signatures",
                    multisig.threshold
                )));
            }
            progress.slots[slot] = Some(signature.to_vec());

            p2sh_multisig_script_sig(&progress.ordered_signatures(), script)?
        }
    };

    let mut signed = tx.clone();
    signed.inputs[index].script_sig = script_sig;
    Ok(signed)
}

/// Signatures already collected on a P2SH multisig input
pub fn multisig_progress(
    tx: &Transaction,
    outpoint: &OutPoint,
    redeem_script: &[u8],
) -> DogecoinResult<MultisigProgress> {
    let index = locate(tx, outpoint)?;
    let multisig = MultisigScript::parse(redeem_script)?;
    read_progress(tx, index, &tx.inputs[index].script_sig, redeem_script, &multisig)
}

fn locate(tx: &Transaction, outpoint: &OutPoint) -> DogecoinResult<usize> {
    tx.find_input(outpoint).ok_or_else(|| {
        DogecoinError::input_not_found(format!(
            "No input spends {}:{}",
            outpoint.txid, outpoint.vout
        ))
    })
}

/// Slot for `signature`: the first empty slot whose key verifies it, else
/// the first slot whose key verifies it.
///
/// A key listed more than once owns one slot per listing.
fn matching_slot(
    tx: &Transaction,
    index: usize,
    redeem_script: &[u8],
    multisig: &MultisigScript,
    progress: &MultisigProgress,
    signature: &Signature,
) -> DogecoinResult<Option<usize>> {
    let digest = sighash_for_index(tx, index, redeem_script, signature.sighash_type())?;
    let matches: Vec<usize> = multisig
        .public_keys
        .iter()
        .enumerate()
        .filter(|(_, key)| signature.verify(&digest, key))
        .map(|(slot, _)| slot)
        .collect();
    Ok(matches
        .iter()
        .find(|&&slot| progress.slots[slot].is_none())
        .or_else(|| matches.first())
        .copied())
}

fn read_progress(
    tx: &Transaction,
    index: usize,
    script_sig: &[u8],
    redeem_script: &[u8],
    multisig: &MultisigScript,
) -> DogecoinResult<MultisigProgress> {
    let mut progress = MultisigProgress {
        threshold: multisig.threshold,
        slots: vec![None; multisig.public_keys.len()],
    };
    if script_sig.is_empty() {
        return Ok(progress);
    }

    let pushes = parse_pushes(script_sig)?;
    let (last, rest) = pushes
        .split_last()
        .ok_or_else(|| DogecoinError::invalid_script("Unlocking script is empty"))?;
    if last.as_slice() != redeem_script {
        return Err(DogecoinError::invalid_script(
            "Input is already signed against a different redeem script",
        ));
    }
    let (dummy, existing) = rest
        .split_first()
        .ok_or_else(|| DogecoinError::invalid_script("Unlocking script lacks the OP_0 element"))?;
    if !dummy.is_empty() {
        return Err(DogecoinError::invalid_script(
            "Unlocking script must start with OP_0",
        ));
    }

    for bytes in existing {
        let signature = Signature::from_slice(bytes)?;
        let slot = matching_slot(tx, index, redeem_script, multisig, &progress, &signature)?.ok_or_else(|| {
            DogecoinError::invalid_signature("Existing signature matches no key in the redeem script")
        })?;
        progress.slots[slot] = Some(bytes.clone());
    }
    Ok(progress)
}
