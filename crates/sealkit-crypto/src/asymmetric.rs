use rand::rngs::OsRng;
use rsa::{
    pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey, LineEnding},
    Pkcs1v15Encrypt, RsaPrivateKey, RsaPublicKey,
};
use sealkit_core::cipher::{Cipher, CipherError};
use tracing::warn;

/// RSA cipher over a full keypair or a public key only.
///
/// Public-only instances can encrypt for the keypair holder but never
/// decrypt. Key material travels as PEM: PKCS#8 for keypairs, SPKI for
/// public keys.
pub struct RsaCipher {
    public: RsaPublicKey,
    private: Option<RsaPrivateKey>,
}

impl std::fmt::Debug for RsaCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RsaCipher").finish_non_exhaustive()
    }
}

impl RsaCipher {
    /// Generate a fresh keypair of the given modulus size (bits).
    pub fn generate(bits: usize) -> Result<Self, CipherError> {
        let private = RsaPrivateKey::new(&mut OsRng, bits).map_err(|err| CipherError::InvalidKey {
            reason: format!("keypair generation failed: {err}"),
        })?;
        Ok(Self {
            public: RsaPublicKey::from(&private),
            private: Some(private),
        })
    }

    /// Open the keypair stored in the OS keyring under (service, account),
    /// generating and storing a fresh one on first use. Repeated calls with
    /// the same identity reuse the same machine-level key material.
    pub fn open_named(service: &str, account: &str, bits: usize) -> Result<Self, CipherError> {
        let entry = keyring::Entry::new(service, account).map_err(keystore_err)?;

        if let Ok(pem) = entry.get_password() {
            let private =
                RsaPrivateKey::from_pkcs8_pem(&pem).map_err(|err| CipherError::InvalidKey {
                    reason: format!("stored keypair is not valid PKCS#8 PEM: {err}"),
                })?;
            return Ok(Self {
                public: RsaPublicKey::from(&private),
                private: Some(private),
            });
        }

        let cipher = Self::generate(bits)?;
        let pem = cipher.export_key_pair()?;
        entry.set_password(&pem).map_err(keystore_err)?;
        Ok(cipher)
    }

    /// Install key material from a PEM blob: a PKCS#8 keypair, or an SPKI
    /// public key (which yields a public-only instance).
    pub fn from_pem(blob: &str) -> Result<Self, CipherError> {
        if let Ok(private) = RsaPrivateKey::from_pkcs8_pem(blob) {
            return Ok(Self {
                public: RsaPublicKey::from(&private),
                private: Some(private),
            });
        }

        let public = RsaPublicKey::from_public_key_pem(blob).map_err(|err| {
            CipherError::InvalidKey {
                reason: format!("blob is neither a PKCS#8 keypair nor an SPKI public key: {err}"),
            }
        })?;
        Ok(Self {
            public,
            private: None,
        })
    }

    /// Whether this instance holds only the public half of the keypair.
    pub fn public_key_only(&self) -> bool {
        self.private.is_none()
    }

    /// Export the public key as SPKI PEM. Always available.
    pub fn export_public_key(&self) -> Result<String, CipherError> {
        self.public
            .to_public_key_pem(LineEnding::LF)
            .map_err(|err| CipherError::InvalidKey {
                reason: format!("public key export failed: {err}"),
            })
    }

    /// Export the full keypair as PKCS#8 PEM. Fails when only the public
    /// key is held.
    pub fn export_key_pair(&self) -> Result<String, CipherError> {
        let private = self.private.as_ref().ok_or_else(|| CipherError::Unsupported {
            reason: "cannot export a keypair from a public-only cipher".to_string(),
        })?;
        private
            .to_pkcs8_pem(LineEnding::LF)
            .map(|pem| pem.to_string())
            .map_err(|err| CipherError::InvalidKey {
                reason: format!("keypair export failed: {err}"),
            })
    }
}

impl Cipher for RsaCipher {
    fn can_encrypt(&self) -> bool {
        true
    }

    fn can_decrypt(&self) -> bool {
        !self.public_key_only()
    }

    fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>, CipherError> {
        self.public
            .encrypt(&mut OsRng, Pkcs1v15Encrypt, plaintext)
            .map_err(|err| CipherError::Encrypt {
                reason: err.to_string(),
            })
    }

    fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>, CipherError> {
        let Some(private) = self.private.as_ref() else {
            // Reaching this is a caller bug: capability flags say no.
            warn!("decrypt requested on a public-only RSA cipher");
            return Err(CipherError::Unsupported {
                reason: "decrypt requires the private key".to_string(),
            });
        };

        private
            .decrypt(Pkcs1v15Encrypt, ciphertext)
            .map_err(|err| CipherError::InvalidCiphertext {
                reason: err.to_string(),
            })
    }
}

fn keystore_err(err: keyring::Error) -> CipherError {
    CipherError::KeyStore {
        reason: err.to_string(),
    }
}
