use std::sync::RwLock;

use sealkit_core::{
    cipher::{Cipher, CipherError},
    codec::{CodecError, PlaintextCodec},
    key_provider::{KeyMaterial, KeyProvider},
};
use sealkit_crypto::symmetric::AesCbcCipher;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::wire::SealedBlob;

/// Errors produced by the encrypted container.
#[derive(Debug, Error)]
pub enum ContainerError {
    /// Wire-format fields missing, not validly encoded, or unparsable.
    #[error("malformed persisted form: {reason}")]
    Malformed { reason: String },
    #[error(transparent)]
    Cipher(#[from] CipherError),
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error("key provider failure: {reason}")]
    Key { reason: String },
    #[error("container lock poisoned: {reason}")]
    Poisoned { reason: String },
}

/// Which side of the container is authoritative. The IV survives the
/// `Sealed` → `Plain` transition so later persists reuse it.
enum State<T> {
    Plain {
        value: T,
        iv: Option<Vec<u8>>,
    },
    Sealed {
        iv: Option<Vec<u8>>,
        ciphertext: Option<Vec<u8>>,
    },
}

/// Generic wrapper holding a plaintext value alongside its encrypted form.
///
/// The payload codec and the key source are injected at construction. After
/// restoration from a persisted blob the ciphertext is decrypted lazily, on
/// first read, at most once per instance regardless of concurrent readers.
/// Every persist re-encrypts the current plaintext; nothing is cached
/// between persists.
///
/// A decrypt or encrypt failure is terminal for the instance: callers must
/// discard it and reconstruct from the persisted form.
pub struct EncryptedContainer<C: PlaintextCodec, P: KeyProvider> {
    state: RwLock<State<C::Value>>,
    codec: C,
    key_provider: P,
}

impl<C: PlaintextCodec, P: KeyProvider> std::fmt::Debug for EncryptedContainer<C, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptedContainer").finish_non_exhaustive()
    }
}

impl<C, P> EncryptedContainer<C, P>
where
    C: PlaintextCodec,
    P: KeyProvider,
{
    /// Wrap an in-memory value. No ciphertext exists until the first persist.
    pub fn from_value(value: C::Value, codec: C, key_provider: P) -> Self {
        Self {
            state: RwLock::new(State::Plain { value, iv: None }),
            codec,
            key_provider,
        }
    }

    /// Reconstruct from raw persisted parts without decrypting. Reading the
    /// plaintext of a container missing either part yields the payload
    /// type's default value.
    pub fn from_parts(
        iv: Option<Vec<u8>>,
        ciphertext: Option<Vec<u8>>,
        codec: C,
        key_provider: P,
    ) -> Self {
        Self {
            state: RwLock::new(State::Sealed { iv, ciphertext }),
            codec,
            key_provider,
        }
    }

    /// Reconstruct from a persisted blob. Field decoding happens here;
    /// decryption is deferred until the plaintext is first read.
    pub fn restore(blob: &SealedBlob, codec: C, key_provider: P) -> Result<Self, ContainerError> {
        let iv = blob.iv_bytes()?;
        let ciphertext = blob.ciphertext_bytes()?;
        Ok(Self::from_parts(Some(iv), Some(ciphertext), codec, key_provider))
    }

    /// Reconstruct from the JSON wire form.
    pub fn restore_json(text: &str, codec: C, key_provider: P) -> Result<Self, ContainerError> {
        let blob = SealedBlob::from_json(text)?;
        Self::restore(&blob, codec, key_provider)
    }

    /// Whether the plaintext side is currently authoritative.
    pub fn is_decrypted(&self) -> bool {
        match self.state.read() {
            Ok(guard) => matches!(&*guard, State::Plain { .. }),
            Err(_) => false,
        }
    }

    /// Overwrite the plaintext. Always leaves the container decrypted; any
    /// stale ciphertext is discarded and recomputed on the next persist.
    pub fn set_plaintext(&self, value: C::Value) -> Result<(), ContainerError> {
        let mut guard = self.state.write().map_err(poisoned)?;
        let iv = match &mut *guard {
            State::Plain { iv, .. } | State::Sealed { iv, .. } => iv.take(),
        };
        *guard = State::Plain { value, iv };
        Ok(())
    }

    /// Read the plaintext, decrypting on first access after restoration.
    ///
    /// The fast path takes a shared lock; the decrypt path takes the
    /// exclusive lock and re-checks the state, so concurrent first reads
    /// run the decrypt transform exactly once.
    #[instrument(skip_all)]
    pub fn plaintext(&self) -> Result<C::Value, ContainerError>
    where
        C::Value: Clone + Default,
    {
        {
            let guard = self.state.read().map_err(poisoned)?;
            if let State::Plain { value, .. } = &*guard {
                return Ok(value.clone());
            }
        }

        let mut guard = self.state.write().map_err(poisoned)?;
        self.materialize(&mut guard)
    }

    /// Serialize and encrypt the current plaintext into a persistable blob.
    ///
    /// A still-sealed container is materialized first (the same lazy-decrypt
    /// path a read takes). The held IV is reused when present; otherwise the
    /// cipher generates a fresh one, which is captured for future persists.
    #[instrument(skip_all)]
    pub fn persist(&self) -> Result<SealedBlob, ContainerError>
    where
        C::Value: Clone + Default,
    {
        let mut guard = self.state.write().map_err(poisoned)?;
        let value = self.materialize(&mut guard)?;

        let held_iv = match &*guard {
            State::Plain { iv, .. } => iv.clone(),
            State::Sealed { iv, .. } => iv.clone(),
        };

        let key = self.key_material()?;
        let cipher = match &held_iv {
            Some(iv) => AesCbcCipher::from_key_iv(&key.bytes, iv)?,
            None => {
                let cipher = AesCbcCipher::from_key(&key.bytes)?;
                debug!("generated fresh iv for first persist");
                cipher
            }
        };
        let iv = cipher.iv().to_vec();

        let bytes = self.codec.encode(&value)?;
        let ciphertext = cipher.encrypt(&bytes)?;

        if let State::Plain { iv: held, .. } = &mut *guard {
            *held = Some(iv.clone());
        }

        Ok(SealedBlob::new(&iv, &ciphertext))
    }

    /// Persist to the JSON wire form.
    pub fn persist_json(&self) -> Result<String, ContainerError>
    where
        C::Value: Clone + Default,
    {
        self.persist()?.to_json()
    }

    /// Ensure the plaintext side is authoritative, decrypting if needed.
    /// Returns a clone of the current value.
    fn materialize(&self, state: &mut State<C::Value>) -> Result<C::Value, ContainerError>
    where
        C::Value: Clone + Default,
    {
        let (iv, ciphertext) = match &*state {
            State::Plain { value, .. } => return Ok(value.clone()),
            State::Sealed { iv, ciphertext } => (iv.clone(), ciphertext.clone()),
        };

        let value = match (&iv, &ciphertext) {
            (Some(iv_bytes), Some(ciphertext)) => {
                let key = self.key_material()?;
                let cipher = AesCbcCipher::from_key_iv(&key.bytes, iv_bytes)?;
                let bytes = cipher.decrypt(ciphertext)?;
                debug!("materialized plaintext from ciphertext");
                self.codec.decode(&bytes)?
            }
            _ => C::Value::default(),
        };

        *state = State::Plain {
            value: value.clone(),
            iv,
        };
        Ok(value)
    }

    fn key_material(&self) -> Result<KeyMaterial, ContainerError> {
        self.key_provider
            .get_or_create()
            .map_err(|err| ContainerError::Key {
                reason: err.to_string(),
            })
    }
}

fn poisoned<E: ToString>(err: E) -> ContainerError {
    ContainerError::Poisoned {
        reason: err.to_string(),
    }
}
