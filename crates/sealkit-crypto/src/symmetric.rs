use aes::{Aes128, Aes192, Aes256};
use cbc::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use rand::{rngs::OsRng, RngCore};
use sealkit_core::cipher::{Cipher, CipherError};

/// AES block size in bytes; also the IV length for CBC.
pub const BLOCK_SIZE: usize = 16;

/// AES cipher in CBC mode with PKCS#7 padding.
///
/// Deterministic for a fixed (key, IV, input). Key sizes 128, 192, and 256
/// bits are supported; the IV is always one block.
pub struct AesCbcCipher {
    key: Vec<u8>,
    iv: [u8; BLOCK_SIZE],
}

impl std::fmt::Debug for AesCbcCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AesCbcCipher").finish_non_exhaustive()
    }
}

impl AesCbcCipher {
    /// Generate a fresh random key of the given size (bits) and a fresh IV.
    pub fn with_key_size(bits: usize) -> Result<Self, CipherError> {
        if !matches!(bits, 128 | 192 | 256) {
            return Err(CipherError::InvalidKey {
                reason: format!("unsupported key size: {bits} bits"),
            });
        }

        let mut cipher = Self {
            key: vec![0u8; bits / 8],
            iv: [0u8; BLOCK_SIZE],
        };
        cipher.generate_key();
        cipher.generate_iv();
        Ok(cipher)
    }

    /// Use the given key and generate a fresh random IV.
    pub fn from_key(key: &[u8]) -> Result<Self, CipherError> {
        let mut cipher = Self::from_key_iv(key, &[0u8; BLOCK_SIZE])?;
        cipher.generate_iv();
        Ok(cipher)
    }

    /// Use the given key and IV; fully deterministic.
    pub fn from_key_iv(key: &[u8], iv: &[u8]) -> Result<Self, CipherError> {
        if !matches!(key.len(), 16 | 24 | 32) {
            return Err(CipherError::InvalidKey {
                reason: format!("key must be 16, 24, or 32 bytes, got {}", key.len()),
            });
        }
        let iv: [u8; BLOCK_SIZE] = iv.try_into().map_err(|_| CipherError::InvalidKey {
            reason: format!("iv must be {BLOCK_SIZE} bytes, got {}", iv.len()),
        })?;

        Ok(Self {
            key: key.to_vec(),
            iv,
        })
    }

    /// Replace the key with fresh random bytes of the same size.
    pub fn generate_key(&mut self) {
        OsRng.fill_bytes(&mut self.key);
    }

    /// Replace the IV with fresh random bytes.
    pub fn generate_iv(&mut self) {
        OsRng.fill_bytes(&mut self.iv);
    }

    pub fn key(&self) -> &[u8] {
        &self.key
    }

    pub fn iv(&self) -> &[u8] {
        &self.iv
    }

    /// Key size in bits.
    pub fn key_size(&self) -> usize {
        self.key.len() * 8
    }
}

impl Cipher for AesCbcCipher {
    fn can_encrypt(&self) -> bool {
        true
    }

    fn can_decrypt(&self) -> bool {
        true
    }

    fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>, CipherError> {
        let ciphertext = match self.key.len() {
            16 => cbc::Encryptor::<Aes128>::new_from_slices(&self.key, &self.iv)
                .map_err(invalid_key)?
                .encrypt_padded_vec_mut::<Pkcs7>(plaintext),
            24 => cbc::Encryptor::<Aes192>::new_from_slices(&self.key, &self.iv)
                .map_err(invalid_key)?
                .encrypt_padded_vec_mut::<Pkcs7>(plaintext),
            32 => cbc::Encryptor::<Aes256>::new_from_slices(&self.key, &self.iv)
                .map_err(invalid_key)?
                .encrypt_padded_vec_mut::<Pkcs7>(plaintext),
            other => {
                return Err(CipherError::InvalidKey {
                    reason: format!("key must be 16, 24, or 32 bytes, got {other}"),
                })
            }
        };
        Ok(ciphertext)
    }

    fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>, CipherError> {
        if ciphertext.is_empty() || ciphertext.len() % BLOCK_SIZE != 0 {
            return Err(CipherError::InvalidCiphertext {
                reason: format!(
                    "length {} is not a positive multiple of the block size",
                    ciphertext.len()
                ),
            });
        }

        let plaintext = match self.key.len() {
            16 => cbc::Decryptor::<Aes128>::new_from_slices(&self.key, &self.iv)
                .map_err(invalid_key)?
                .decrypt_padded_vec_mut::<Pkcs7>(ciphertext),
            24 => cbc::Decryptor::<Aes192>::new_from_slices(&self.key, &self.iv)
                .map_err(invalid_key)?
                .decrypt_padded_vec_mut::<Pkcs7>(ciphertext),
            32 => cbc::Decryptor::<Aes256>::new_from_slices(&self.key, &self.iv)
                .map_err(invalid_key)?
                .decrypt_padded_vec_mut::<Pkcs7>(ciphertext),
            other => {
                return Err(CipherError::InvalidKey {
                    reason: format!("key must be 16, 24, or 32 bytes, got {other}"),
                })
            }
        };

        plaintext.map_err(|_| CipherError::InvalidCiphertext {
            reason: "bad padding".to_string(),
        })
    }
}

fn invalid_key<E: ToString>(err: E) -> CipherError {
    CipherError::InvalidKey {
        reason: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_key_zero_iv_round_trips_test_vector() {
        // 256-bit all-zero key, all-zero IV, plaintext "test" as UTF-8.
        let cipher = AesCbcCipher::from_key_iv(&[0u8; 32], &[0u8; 16]).expect("cipher");
        let ciphertext = cipher.encrypt(&[0x74, 0x65, 0x73, 0x74]).expect("encrypt");

        assert_eq!(ciphertext.len(), BLOCK_SIZE);
        let plaintext = cipher.decrypt(&ciphertext).expect("decrypt");
        assert_eq!(plaintext, [0x74, 0x65, 0x73, 0x74]);
    }

    #[test]
    fn round_trips_all_key_sizes() {
        for bits in [128, 192, 256] {
            let cipher = AesCbcCipher::with_key_size(bits).expect("cipher");
            assert_eq!(cipher.key_size(), bits);

            let ciphertext = cipher.encrypt(b"payload bytes").expect("encrypt");
            assert_eq!(cipher.decrypt(&ciphertext).expect("decrypt"), b"payload bytes");
        }
    }

    #[test]
    fn fixed_key_and_iv_encrypt_deterministically() {
        let cipher = AesCbcCipher::from_key_iv(&[9u8; 32], &[3u8; 16]).expect("cipher");
        let first = cipher.encrypt(b"same input").expect("encrypt");
        let second = cipher.encrypt(b"same input").expect("encrypt again");
        assert_eq!(first, second);
    }

    #[test]
    fn from_key_generates_distinct_ivs() {
        let a = AesCbcCipher::from_key(&[1u8; 32]).expect("cipher a");
        let b = AesCbcCipher::from_key(&[1u8; 32]).expect("cipher b");
        assert_ne!(a.iv(), b.iv());
    }

    #[test]
    fn wrong_key_fails_or_garbles() {
        let cipher = AesCbcCipher::from_key_iv(&[1u8; 32], &[0u8; 16]).expect("cipher");
        let ciphertext = cipher.encrypt(b"sensitive").expect("encrypt");

        let other = AesCbcCipher::from_key_iv(&[2u8; 32], &[0u8; 16]).expect("other");
        match other.decrypt(&ciphertext) {
            Err(CipherError::InvalidCiphertext { .. }) => {}
            Ok(garbled) => assert_ne!(garbled, b"sensitive"),
            Err(err) => panic!("unexpected error: {err}"),
        }
    }

    #[test]
    fn decrypt_rejects_partial_block() {
        let cipher = AesCbcCipher::from_key_iv(&[0u8; 16], &[0u8; 16]).expect("cipher");
        let err = cipher.decrypt(&[1, 2, 3]).expect_err("should reject");
        assert!(matches!(err, CipherError::InvalidCiphertext { .. }));

        let err = cipher.decrypt(&[]).expect_err("should reject empty");
        assert!(matches!(err, CipherError::InvalidCiphertext { .. }));
    }

    #[test]
    fn rejects_bad_key_and_iv_lengths() {
        let err = AesCbcCipher::from_key(&[0u8; 15]).expect_err("bad key");
        assert!(matches!(err, CipherError::InvalidKey { .. }));

        let err = AesCbcCipher::from_key_iv(&[0u8; 32], &[0u8; 8]).expect_err("bad iv");
        assert!(matches!(err, CipherError::InvalidKey { .. }));

        let err = AesCbcCipher::with_key_size(512).expect_err("bad size");
        assert!(matches!(err, CipherError::InvalidKey { .. }));
    }

    #[test]
    fn symmetric_cipher_reports_both_capabilities() {
        let cipher = AesCbcCipher::with_key_size(256).expect("cipher");
        assert!(cipher.can_encrypt());
        assert!(cipher.can_decrypt());
    }
}
