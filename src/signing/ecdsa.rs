//! ECDSA signatures over sighash digests
//!
//! Nonces are RFC 6979 deterministic and `s` is always in the lower half
//! of the curve order. The serialized form is a strict DER signature
//! followed by one sighash-type byte.

use bitcoin::secp256k1::{ecdsa, Message};
use std::fmt;

use crate::error::{DogecoinError, DogecoinResult};
use crate::types::SighashType;
use crate::wallet::keys::{PrivateKey, PublicKey, SECP};

use super::sighash::SighashDigest;

/// Longest DER encoding of a secp256k1 signature
pub const MAX_DER_SIGNATURE_LEN: usize = 72;

/// A DER signature tagged with its sighash type
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Signature {
    signature: ecdsa::Signature,
    sighash_type: SighashType,
}

impl Signature {
    /// Parse `DER || sighash_type`. High-S and non-strict DER are rejected.
    pub fn from_slice(bytes: &[u8]) -> DogecoinResult<Self> {
        let (type_byte, der) = bytes
            .split_last()
            .ok_or_else(|| DogecoinError::invalid_signature("Signature is empty"))?;

        let sighash_type = SighashType::from_byte(*type_byte).ok_or_else(|| {
            DogecoinError::invalid_signature(format!(
                "Unsupported sighash type 0x{:02x}",
                type_byte
            ))
        })?;

        if der.len() > MAX_DER_SIGNATURE_LEN {
            return Err(DogecoinError::invalid_signature(format!(
                "DER signature is {} bytes, max {}",
                der.len(),
                MAX_DER_SIGNATURE_LEN
            )));
        }

        let signature = ecdsa::Signature::from_der(der)
            .map_err(|e| DogecoinError::invalid_signature(format!("Bad DER encoding: {}", e)))?;

        let mut normalized = signature;
        normalized.normalize_s();
        if normalized != signature {
            return Err(DogecoinError::invalid_signature("Signature has high S value"));
        }

        Ok(Self {
            signature,
            sighash_type,
        })
    }

    pub fn from_hex(s: &str) -> DogecoinResult<Self> {
        let bytes = hex::decode(s.trim())
            .map_err(|e| DogecoinError::invalid_signature(format!("Signature is not hex: {}", e)))?;
        Self::from_slice(&bytes)
    }

    pub fn sighash_type(&self) -> SighashType {
        self.sighash_type
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = self.signature.serialize_der().to_vec();
        out.push(self.sighash_type.to_byte());
        out
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    /// Check against a digest and public key
    pub fn verify(&self, digest: &SighashDigest, public_key: &PublicKey) -> bool {
        let message = Message::from_digest(*digest.as_bytes());
        SECP.verify_ecdsa(&message, &self.signature, public_key.inner())
            .is_ok()
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({})", self.to_hex())
    }
}

/// Sign a digest with SIGHASH_ALL
pub fn sign(digest: &SighashDigest, private_key: &PrivateKey) -> Signature {
    sign_with_type(digest, private_key, SighashType::All)
}

pub fn sign_with_type(
    digest: &SighashDigest,
    private_key: &PrivateKey,
    sighash_type: SighashType,
) -> Signature {
    let message = Message::from_digest(*digest.as_bytes());
    let mut signature = SECP.sign_ecdsa(&message, private_key.inner());
    signature.normalize_s();
    Signature {
        signature,
        sighash_type,
    }
}

/// Verify serialized signature bytes. Malformed input is an error, a
/// well-formed signature that does not match is `Ok(false)`.
pub fn verify(
    digest: &SighashDigest,
    signature: &[u8],
    public_key: &PublicKey,
) -> DogecoinResult<bool> {
    Ok(Signature::from_slice(signature)?.verify(digest, public_key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    fn key(last: u8) -> PrivateKey {
        let mut bytes = [0u8; 32];
        bytes[31] = last;
        PrivateKey::from_slice(&bytes).unwrap()
    }

    fn digest(fill: u8) -> SighashDigest {
        SighashDigest::from_bytes([fill; 32])
    }

    #[test]
    fn test_sign_is_deterministic() {
        let a = sign(&digest(7), &key(1));
        let b = sign(&digest(7), &key(1));
        assert_eq!(a.to_bytes(), b.to_bytes());
    }

    #[test]
    fn test_encoding_shape() {
        let bytes = sign(&digest(9), &key(3)).to_bytes();
        assert_eq!(bytes[0], 0x30);
        assert_eq!(*bytes.last().unwrap(), 0x01);
        assert!(bytes.len() >= 9 && bytes.len() <= MAX_DER_SIGNATURE_LEN + 1);
        assert_eq!(bytes[1] as usize, bytes.len() - 3);
    }

    #[test]
    fn test_verify() {
        let private_key = key(5);
        let signature = sign(&digest(1), &private_key);
        assert!(signature.verify(&digest(1), &private_key.public_key()));
        assert!(!signature.verify(&digest(2), &private_key.public_key()));
        assert!(!signature.verify(&digest(1), &key(6).public_key()));
    }

    #[test]
    fn test_parse_roundtrip() {
        let signature = sign(&digest(4), &key(2));
        let parsed = Signature::from_hex(&signature.to_hex()).unwrap();
        assert_eq!(parsed, signature);
        assert_eq!(parsed.sighash_type(), SighashType::All);
    }

    #[test]
    fn test_rejects_bad_sighash_byte() {
        let mut bytes = sign(&digest(4), &key(2)).to_bytes();
        *bytes.last_mut().unwrap() = 0x02;
        assert_eq!(
            Signature::from_slice(&bytes).unwrap_err().code,
            ErrorCode::InvalidSignature
        );
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(Signature::from_slice(&[]).is_err());
        assert!(Signature::from_slice(&[0x01]).is_err());
        assert!(Signature::from_slice(&[0x30, 0x00, 0x01]).is_err());
        assert!(Signature::from_hex("zz").is_err());
    }

    #[test]
    fn test_rejects_high_s() {
        let signature = sign(&digest(8), &key(9));
        let compact = signature.signature.serialize_compact();

        // s' = n - s
        const N: [u8; 32] = [
            0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
            0xff, 0xfe, 0xba, 0xae, 0xdc, 0xe6, 0xaf, 0x48, 0xa0, 0x3b, 0xbf, 0xd2, 0x5e, 0x8c,
            0xd0, 0x36, 0x41, 0x41,
        ];
        let mut high = compact;
        let mut borrow = 0i16;
        for i in (0..32).rev() {
            let diff = N[i] as i16 - compact[32 + i] as i16 - borrow;
            borrow = if diff < 0 { 1 } else { 0 };
            high[32 + i] = diff.rem_euclid(256) as u8;
        }

        let flipped = ecdsa::Signature::from_compact(&high).unwrap();
        let mut bytes = flipped.serialize_der().to_vec();
        bytes.push(0x01);
        let err = Signature::from_slice(&bytes).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidSignature);
        assert!(err.message.contains("high S"));
    }

    #[test]
    fn test_verify_fn() {
        let private_key = key(11);
        let bytes = sign(&digest(3), &private_key).to_bytes();
        assert!(verify(&digest(3), &bytes, &private_key.public_key()).unwrap());
        assert!(!verify(&digest(4), &bytes, &private_key.public_key()).unwrap());
        assert!(verify(&digest(3), &[0x00], &private_key.public_key()).is_err());
    }
}
