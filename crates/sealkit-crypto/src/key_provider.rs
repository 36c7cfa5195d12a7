use std::sync::{Arc, Mutex};

use base64::{engine::general_purpose, Engine as _};
use rand::{rngs::OsRng, RngCore};
use sealkit_core::key_provider::{KeyError, KeyMaterial, KeyProvider};

/// Default symmetric key length (AES-256).
const DEFAULT_KEY_LEN: usize = 32;

/// OS keyring-backed provider. Uses the `keyring` crate to store the key
/// as base64 under (service, account).
pub struct KeyringProvider {
    service: String,
    account: String,
}

impl KeyringProvider {
    pub fn new(service: impl Into<String>, account: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            account: account.into(),
        }
    }
}

impl KeyProvider for KeyringProvider {
    fn get_or_create(&self) -> Result<KeyMaterial, KeyError> {
        match keyring::Entry::new(&self.service, &self.account) {
            Ok(entry) => {
                if let Ok(secret) = entry.get_password() {
                    return decode_key(&secret);
                }

                let material = generate_key();
                entry
                    .set_password(&encode_key(&material))
                    .map_err(|e| KeyError::Keyring(e.to_string()))?;
                Ok(material)
            }
            Err(err) => Err(KeyError::Keyring(err.to_string())),
        }
    }
}

/// In-memory key provider for tests and ephemeral sessions.
#[derive(Debug, Default, Clone)]
pub struct InMemoryKeyProvider {
    inner: Arc<Mutex<Option<KeyMaterial>>>,
}

impl KeyProvider for InMemoryKeyProvider {
    fn get_or_create(&self) -> Result<KeyMaterial, KeyError> {
        let mut guard = self
            .inner
            .lock()
            .map_err(|err| KeyError::Generation(format!("lock poisoned: {err}")))?;

        if let Some(existing) = guard.clone() {
            return Ok(existing);
        }

        let material = generate_key();
        *guard = Some(material.clone());
        Ok(material)
    }
}

fn generate_key() -> KeyMaterial {
    let mut bytes = vec![0u8; DEFAULT_KEY_LEN];
    OsRng.fill_bytes(&mut bytes);
    KeyMaterial {
        id: "default".to_string(),
        bytes,
    }
}

fn encode_key(material: &KeyMaterial) -> String {
    general_purpose::STANDARD.encode(&material.bytes)
}

fn decode_key(secret: &str) -> Result<KeyMaterial, KeyError> {
    let bytes = general_purpose::STANDARD
        .decode(secret)
        .map_err(|e| KeyError::Decode(e.to_string()))?;

    if !matches!(bytes.len(), 16 | 24 | 32) {
        return Err(KeyError::Decode(format!(
            "expected an AES key length, got {} bytes",
            bytes.len()
        )));
    }

    Ok(KeyMaterial {
        id: "default".to_string(),
        bytes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_provider_returns_same_key() {
        let provider = InMemoryKeyProvider::default();
        let first = provider.get_or_create().expect("first");
        let second = provider.get_or_create().expect("second");

        assert_eq!(first.bytes, second.bytes);
        assert_eq!(first.id, second.id);
        assert_eq!(first.bytes.len(), DEFAULT_KEY_LEN);
    }

    #[test]
    fn decode_rejects_wrong_length() {
        let err = decode_key("abcd").expect_err("should reject wrong length");
        assert!(matches!(err, KeyError::Decode(_)));
    }

    #[test]
    fn decode_rejects_invalid_base64() {
        let err = decode_key("%%not-base64%%").expect_err("should reject");
        assert!(matches!(err, KeyError::Decode(_)));
    }
}
