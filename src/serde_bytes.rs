//! Serde helpers for byte fields
//!
//! Scripts and digests travel as lowercase hex strings in JSON.

use serde::{Deserialize, Deserializer, Serializer};

/// Serialize/deserialize Vec<u8> as hex string
pub mod hex_vec {
    use super::*;

    pub fn serialize<S>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        hex::decode(&s).map_err(serde::de::Error::custom)
    }
}

/// Serialize/deserialize [u8; 32] as hex string
pub mod hex32 {
    use super::*;

    pub fn serialize<S>(bytes: &[u8; 32], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<[u8; 32], D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let bytes = hex::decode(&s).map_err(serde::de::Error::custom)?;
        bytes
            .try_into()
            .map_err(|_| serde::de::Error::custom("expected 32 bytes"))
    }
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Holder {
        #[serde(with = "super::hex_vec")]
        script: Vec<u8>,
        #[serde(with = "super::hex32")]
        digest: [u8; 32],
    }

    #[test]
    fn test_hex_fields() {
        let holder = Holder {
            script: vec![0x76, 0xa9],
            digest: [0xab; 32],
        };
        let json = serde_json::to_string(&holder).unwrap();
        assert!(json.contains(r#""script":"76a9""#));
        let back: Holder = serde_json::from_str(&json).unwrap();
        assert_eq!(back, holder);
    }

    #[test]
    fn test_wrong_digest_length() {
        let json = r#"{"script":"","digest":"abcd"}"#;
        assert!(serde_json::from_str::<Holder>(json).is_err());
    }
}
