//! Encrypted container: a generic wrapper that serializes its payload,
//! encrypts it before persistence, and lazily decrypts on first access
//! after restoration.

pub mod container;
pub mod wire;

pub use container::{ContainerError, EncryptedContainer};
pub use wire::SealedBlob;
