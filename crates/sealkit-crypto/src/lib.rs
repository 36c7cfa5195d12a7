//! Concrete cipher implementations and key sources.
//! AES-CBC for symmetric work, RSA for asymmetric, keys from the OS keyring
//! (or test doubles).

pub mod asymmetric;
pub mod key_provider;
pub mod symmetric;

#[cfg(test)]
mod tests {
    use sealkit_core::cipher::Cipher;

    use crate::{asymmetric::RsaCipher, symmetric::AesCbcCipher};

    #[test]
    fn capability_flags_follow_key_material() {
        let keypair = RsaCipher::generate(1024).expect("rsa");
        let public_pem = keypair.export_public_key().expect("export");

        let full: Vec<Box<dyn Cipher>> = vec![
            Box::new(AesCbcCipher::with_key_size(256).expect("aes")),
            Box::new(keypair),
        ];
        for cipher in &full {
            assert!(cipher.can_encrypt());
            assert!(cipher.can_decrypt());
        }

        let public_only: Box<dyn Cipher> =
            Box::new(RsaCipher::from_pem(&public_pem).expect("import"));
        assert!(public_only.can_encrypt());
        assert!(!public_only.can_decrypt());
    }
}
