use std::marker::PhantomData;

use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

/// Errors produced by payload codecs.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    #[error("serialize failed: {reason}")]
    Serialize { reason: String },
    #[error("deserialize failed: {reason}")]
    Deserialize { reason: String },
}

/// Serialize/deserialize strategy for a container payload. Injected at
/// container construction instead of being a subclass hook.
pub trait PlaintextCodec: Send + Sync {
    type Value;

    fn encode(&self, value: &Self::Value) -> Result<Vec<u8>, CodecError>;
    fn decode(&self, bytes: &[u8]) -> Result<Self::Value, CodecError>;
}

/// JSON codec for any serde-serializable payload.
#[derive(Debug, Default, Clone)]
pub struct JsonCodec<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonCodec<T> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> PlaintextCodec for JsonCodec<T>
where
    T: Serialize + DeserializeOwned + Send + Sync,
{
    type Value = T;

    fn encode(&self, value: &T) -> Result<Vec<u8>, CodecError> {
        serde_json::to_vec(value).map_err(|err| CodecError::Serialize {
            reason: err.to_string(),
        })
    }

    fn decode(&self, bytes: &[u8]) -> Result<T, CodecError> {
        serde_json::from_slice(bytes).map_err(|err| CodecError::Deserialize {
            reason: err.to_string(),
        })
    }
}

/// Identity codec for raw byte payloads.
#[derive(Debug, Default, Clone)]
pub struct BytesCodec;

impl PlaintextCodec for BytesCodec {
    type Value = Vec<u8>;

    fn encode(&self, value: &Vec<u8>) -> Result<Vec<u8>, CodecError> {
        Ok(value.clone())
    }

    fn decode(&self, bytes: &[u8]) -> Result<Vec<u8>, CodecError> {
        Ok(bytes.to_vec())
    }
}
