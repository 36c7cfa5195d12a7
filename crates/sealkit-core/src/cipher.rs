use thiserror::Error;

/// Errors produced by cipher implementations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CipherError {
    /// The instance lacks the key material the operation needs
    /// (e.g. decrypt on a public-only keypair).
    #[error("operation not supported: {reason}")]
    Unsupported { reason: String },
    /// Ciphertext length or padding inconsistent with the cipher.
    #[error("invalid ciphertext: {reason}")]
    InvalidCiphertext { reason: String },
    /// Key or IV material is the wrong length or cannot be parsed.
    #[error("invalid key material: {reason}")]
    InvalidKey { reason: String },
    /// Encryption-side failure (e.g. input too long for the modulus).
    #[error("encryption failed: {reason}")]
    Encrypt { reason: String },
    /// Backing key store (OS keyring) failure while loading or saving keys.
    #[error("key store failure: {reason}")]
    KeyStore { reason: String },
}

/// Capability contract for encryption/decryption, symmetric or asymmetric.
/// Symmetric implementations are deterministic for fixed (key, IV, input);
/// asymmetric encryption may be probabilistic per the padding scheme.
pub trait Cipher: Send + Sync {
    /// Whether this instance can encrypt.
    fn can_encrypt(&self) -> bool;

    /// Whether this instance holds the material needed to decrypt.
    fn can_decrypt(&self) -> bool;

    /// Encrypt plaintext bytes.
    fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>, CipherError>;

    /// Decrypt ciphertext bytes. Fails with [`CipherError::Unsupported`]
    /// when `can_decrypt` is false.
    fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>, CipherError>;
}
