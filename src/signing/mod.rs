//! Canonical serialization and the Ed25519 signing surface.
//!
//! The catalog authority signs three things: archive digests, the catalog
//! index body, and the revocation entry list. Everything signed goes
//! through [`canonical_json`] first so signatures are deterministic.

mod canonical;
mod keys;

pub use canonical::canonical_json;
pub use keys::{Keypair, PublicKey};

use std::path::Path;

use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::error::Result;

/// SHA-256 of a byte slice, lowercase hex.
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// SHA-256 of a byte slice, raw 32-byte digest.
pub fn sha256_digest(data: &[u8]) -> [u8; 32] {
    Sha256::digest(data).into()
}

/// Sign raw bytes; returns a base64 signature.
pub fn sign_bytes(data: &[u8], keypair: &Keypair) -> String {
    keypair.sign(data)
}

/// Verify a base64 signature over raw bytes. Returns false for any
/// input that does not verify; never an error.
pub fn verify_bytes(data: &[u8], signature: &str, public: &PublicKey) -> bool {
    public.verify(data, signature)
}

/// Hash a file and sign the 32-byte digest.
pub fn sign_file(path: &Path, keypair: &Keypair) -> Result<String> {
    let data = std::fs::read(path)?;
    Ok(keypair.sign(&sha256_digest(&data)))
}

/// Symmetric to [`sign_file`]: hash, then verify the digest signature.
pub fn verify_file(path: &Path, signature: &str, public: &PublicKey) -> Result<bool> {
    let data = std::fs::read(path)?;
    Ok(public.verify(&sha256_digest(&data), signature))
}

/// Sign a JSON body over its canonical serialization.
pub fn sign_object(body: &Value, keypair: &Keypair) -> String {
    keypair.sign(canonical_json(body).as_bytes())
}

/// Verify a signature over the canonical serialization of a JSON body.
pub fn verify_object(body: &Value, signature: &str, public: &PublicKey) -> bool {
    public.verify(canonical_json(body).as_bytes(), signature)
}
