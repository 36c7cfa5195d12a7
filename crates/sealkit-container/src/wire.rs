use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};

use crate::container::ContainerError;

/// Persisted form of an encrypted container: base64 IV and ciphertext,
/// never any plaintext field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SealedBlob {
    pub iv: String,
    pub ciphertext: String,
}

impl SealedBlob {
    pub fn new(iv: &[u8], ciphertext: &[u8]) -> Self {
        Self {
            iv: STANDARD.encode(iv),
            ciphertext: STANDARD.encode(ciphertext),
        }
    }

    pub fn to_json(&self) -> Result<String, ContainerError> {
        serde_json::to_string(self).map_err(|err| ContainerError::Malformed {
            reason: format!("blob serialization failed: {err}"),
        })
    }

    /// Parse a JSON blob. Missing or unparsable fields fail here, before
    /// any container is constructed.
    pub fn from_json(text: &str) -> Result<Self, ContainerError> {
        serde_json::from_str(text).map_err(|err| ContainerError::Malformed {
            reason: err.to_string(),
        })
    }

    pub fn iv_bytes(&self) -> Result<Vec<u8>, ContainerError> {
        STANDARD.decode(&self.iv).map_err(|err| ContainerError::Malformed {
            reason: format!("iv is not valid base64: {err}"),
        })
    }

    pub fn ciphertext_bytes(&self) -> Result<Vec<u8>, ContainerError> {
        STANDARD
            .decode(&self.ciphertext)
            .map_err(|err| ContainerError::Malformed {
                reason: format!("ciphertext is not valid base64: {err}"),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_round_trips_raw_bytes() {
        let blob = SealedBlob::new(&[1, 2, 3], &[4, 5, 6]);
        let text = blob.to_json().expect("to json");

        let back = SealedBlob::from_json(&text).expect("from json");
        assert_eq!(back.iv_bytes().expect("iv"), [1, 2, 3]);
        assert_eq!(back.ciphertext_bytes().expect("ciphertext"), [4, 5, 6]);
    }

    #[test]
    fn missing_ciphertext_field_is_malformed() {
        let err = SealedBlob::from_json(r#"{"iv":"AAAA"}"#).expect_err("should reject");
        assert!(matches!(err, ContainerError::Malformed { .. }));
    }

    #[test]
    fn invalid_base64_is_malformed() {
        let blob = SealedBlob {
            iv: "%%%".to_string(),
            ciphertext: "AAAA".to_string(),
        };
        let err = blob.iv_bytes().expect_err("should reject");
        assert!(matches!(err, ContainerError::Malformed { .. }));
    }

    #[test]
    fn field_order_does_not_matter() {
        let text = r#"{"ciphertext":"BAUG","iv":"AQID"}"#;
        let blob = SealedBlob::from_json(text).expect("from json");
        assert_eq!(blob.iv_bytes().expect("iv"), [1, 2, 3]);
    }
}
