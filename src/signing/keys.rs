//! Ed25519 key material.
//!
//! Private keys travel as base64-encoded PKCS8 DER, public keys as
//! base64-encoded SPKI DER, signatures as base64 raw 64-byte Ed25519.
//! All three encodings survive a sign-then-verify round trip.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use ring::rand::SystemRandom;
use ring::signature::{Ed25519KeyPair, KeyPair as _, UnparsedPublicKey, ED25519};

use crate::error::{KkError, Result};

/// DER prefix of an Ed25519 SubjectPublicKeyInfo (RFC 8410).
const SPKI_PREFIX: [u8; 12] = [
    0x30, 0x2a, 0x30, 0x05, 0x06, 0x03, 0x2b, 0x65, 0x70, 0x03, 0x21, 0x00,
];

/// The catalog authority's signing keypair.
pub struct Keypair {
    inner: Ed25519KeyPair,
    pkcs8: Vec<u8>,
}

impl Keypair {
    /// Generate a fresh keypair.
    pub fn generate() -> Result<Self> {
        let rng = SystemRandom::new();
        let pkcs8 = Ed25519KeyPair::generate_pkcs8(&rng)
            .map_err(|_| KkError::Invalid("key generation failed".to_string()))?;
        Self::from_pkcs8(pkcs8.as_ref())
    }

    /// Load a keypair from base64 PKCS8 DER.
    pub fn from_base64(encoded: &str) -> Result<Self> {
        let der = BASE64
            .decode(encoded.trim())
            .map_err(|err| KkError::Invalid(format!("private key is not valid base64: {err}")))?;
        Self::from_pkcs8(&der)
    }

    fn from_pkcs8(der: &[u8]) -> Result<Self> {
        let inner = Ed25519KeyPair::from_pkcs8_maybe_unchecked(der)
            .map_err(|_| KkError::Invalid("private key is not valid PKCS8 DER".to_string()))?;
        Ok(Self {
            inner,
            pkcs8: der.to_vec(),
        })
    }

    /// Base64 PKCS8 DER form of the private key.
    pub fn to_base64(&self) -> String {
        BASE64.encode(&self.pkcs8)
    }

    /// The corresponding public key.
    pub fn public_key(&self) -> PublicKey {
        let mut raw = [0u8; 32];
        raw.copy_from_slice(self.inner.public_key().as_ref());
        PublicKey { raw }
    }

    /// Sign raw bytes; returns a base64 signature.
    pub fn sign(&self, data: &[u8]) -> String {
        BASE64.encode(self.inner.sign(data).as_ref())
    }
}

/// An Ed25519 verification key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKey {
    raw: [u8; 32],
}

impl PublicKey {
    /// Load from base64 SPKI DER.
    pub fn from_base64(encoded: &str) -> Result<Self> {
        let der = BASE64
            .decode(encoded.trim())
            .map_err(|err| KkError::Invalid(format!("public key is not valid base64: {err}")))?;
        if der.len() != 44 || der[..12] != SPKI_PREFIX {
            return Err(KkError::Invalid(
                "public key is not Ed25519 SPKI DER".to_string(),
            ));
        }
        let mut raw = [0u8; 32];
        raw.copy_from_slice(&der[12..]);
        Ok(Self { raw })
    }

    /// Base64 SPKI DER form.
    pub fn to_base64(&self) -> String {
        let mut der = Vec::with_capacity(44);
        der.extend_from_slice(&SPKI_PREFIX);
        der.extend_from_slice(&self.raw);
        BASE64.encode(&der)
    }

    /// Verify a base64 signature over raw bytes. Returns false for any
    /// well-formed input that does not verify; malformed base64 is also
    /// just a failed verification, never an error.
    pub fn verify(&self, data: &[u8], signature_b64: &str) -> bool {
        let Ok(signature) = BASE64.decode(signature_b64.trim()) else {
            return false;
        };
        UnparsedPublicKey::new(&ED25519, &self.raw)
            .verify(data, &signature)
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keypair_round_trips_through_base64() {
        let keypair = Keypair::generate().unwrap();
        let reloaded = Keypair::from_base64(&keypair.to_base64()).unwrap();
        assert_eq!(
            keypair.public_key().to_base64(),
            reloaded.public_key().to_base64()
        );
    }

    #[test]
    fn public_key_round_trips_through_spki() {
        let keypair = Keypair::generate().unwrap();
        let public = keypair.public_key();
        let reloaded = PublicKey::from_base64(&public.to_base64()).unwrap();
        assert_eq!(public, reloaded);
    }

    #[test]
    fn sign_then_verify() {
        let keypair = Keypair::generate().unwrap();
        let sig = keypair.sign(b"payload");
        assert!(keypair.public_key().verify(b"payload", &sig));
        assert!(!keypair.public_key().verify(b"tampered", &sig));
    }

    #[test]
    fn verify_rejects_malformed_signature_without_error() {
        let keypair = Keypair::generate().unwrap();
        assert!(!keypair.public_key().verify(b"payload", "not base64 !!!"));
        assert!(!keypair.public_key().verify(b"payload", ""));
    }

    #[test]
    fn rejects_garbage_key_material() {
        assert!(Keypair::from_base64("AAAA").is_err());
        assert!(PublicKey::from_base64("AAAA").is_err());
        assert!(PublicKey::from_base64("!!not-base64!!").is_err());
    }
}
