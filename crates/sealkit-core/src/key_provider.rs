use thiserror::Error;

/// Key material used for encryption at rest.
#[derive(Clone, PartialEq, Eq)]
pub struct KeyMaterial {
    /// Identifier for logging/rotation (never log key bytes).
    pub id: String,
    /// Symmetric key bytes (16, 24, or 32 for the AES family).
    pub bytes: Vec<u8>,
}

impl std::fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Key bytes must never end up in logs.
        f.debug_struct("KeyMaterial")
            .field("id", &self.id)
            .field("len", &self.bytes.len())
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum KeyError {
    #[error("keyring error: {0}")]
    Keyring(String),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("generation error: {0}")]
    Generation(String),
}

/// Provides access to encryption keys (OS keychain in production; memory or
/// fixed bytes in tests). The container calls this on every encrypt/decrypt.
pub trait KeyProvider: Send + Sync {
    fn get_or_create(&self) -> Result<KeyMaterial, KeyError>;
}

/// Provider over fixed key bytes, for deployments with externally managed
/// keys and for tests.
#[derive(Debug, Clone)]
pub struct StaticKeyProvider {
    material: KeyMaterial,
}

impl StaticKeyProvider {
    pub fn new(id: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            material: KeyMaterial {
                id: id.into(),
                bytes: bytes.into(),
            },
        }
    }
}

impl KeyProvider for StaticKeyProvider {
    fn get_or_create(&self) -> Result<KeyMaterial, KeyError> {
        Ok(self.material.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_provider_returns_configured_bytes() {
        let provider = StaticKeyProvider::new("fixed", [7u8; 32]);
        let material = provider.get_or_create().expect("get");
        assert_eq!(material.id, "fixed");
        assert_eq!(material.bytes, vec![7u8; 32]);
    }

    #[test]
    fn debug_output_hides_key_bytes() {
        let provider = StaticKeyProvider::new("fixed", [7u8; 32]);
        let material = provider.get_or_create().expect("get");
        let rendered = format!("{material:?}");
        assert!(!rendered.contains('7'), "key bytes must not be printed");
        assert!(rendered.contains("fixed"));
    }
}
