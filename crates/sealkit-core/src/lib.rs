//! Core contracts for sealkit: cipher capabilities, payload codecs, and key sources.
//! This crate is intentionally small to keep dependency surface minimal.

pub mod cipher;
pub mod codec;
pub mod key_provider;
