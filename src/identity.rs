//! Process signing identity
//!
//! The shell owns exactly one Ed25519 keypair for its whole lifetime:
//! - Generated once at startup from the OS RNG (no re-initialization path)
//! - Never persisted, never rotated
//! - Zeroized when the store is dropped at process exit
//!
//! Only the public half ever leaves this module. Signing happens inside
//! the store so the secret key is never handed out, formatted or logged.

use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use ed25519_dalek::{Signature, Signer, SigningKey, VerifyingKey};
use rand_core::CryptoRngCore;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::entropy::OsEntropy;
use crate::error::Result;

/// Owner of the process keypair
#[derive(ZeroizeOnDrop)]
pub struct IdentityStore {
    #[zeroize(skip)] // ed25519_dalek::SigningKey implements ZeroizeOnDrop itself
    signing_key: SigningKey,
}

impl IdentityStore {
    /// Generate the process identity from the OS RNG
    ///
    /// An unavailable random source is returned as an error; the binary
    /// treats it as fatal.
    pub fn initialize() -> Result<Self> {
        let mut rng = OsEntropy::new()?;
        Ok(Self::generate(&mut rng))
    }

    pub fn generate<R: CryptoRngCore + ?Sized>(rng: &mut R) -> Self {
        Self {
            signing_key: SigningKey::generate(rng),
        }
    }

    /// Deterministic identity for fixtures
    pub fn from_seed(mut seed: [u8; 32]) -> Self {
        let signing_key = SigningKey::from_bytes(&seed);
        seed.zeroize();
        Self { signing_key }
    }

    pub fn public_key(&self) -> VerifyingKey {
        self.signing_key.verifying_key()
    }

    pub fn public_key_bytes(&self) -> [u8; 32] {
        self.public_key().to_bytes()
    }

    /// Public key in the base64 form exchanged with userland
    pub fn public_key_base64(&self) -> String {
        STANDARD.encode(self.public_key_bytes())
    }

    pub(crate) fn sign(&self, message: &[u8]) -> Signature {
        self.signing_key.sign(message)
    }
}

impl fmt::Debug for IdentityStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdentityStore")
            .field("public_key", &self.public_key_base64())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_identity_is_stable() {
        let a = IdentityStore::from_seed([7u8; 32]);
        let b = IdentityStore::from_seed([7u8; 32]);
        assert_eq!(a.public_key_bytes(), b.public_key_bytes());
    }

    #[test]
    fn fresh_identities_differ() {
        let a = IdentityStore::initialize().unwrap();
        let b = IdentityStore::initialize().unwrap();
        assert_ne!(a.public_key_bytes(), b.public_key_bytes());
    }

    #[test]
    fn public_key_base64_decodes_to_32_bytes() {
        let id = IdentityStore::from_seed([1u8; 32]);
        let decoded = STANDARD.decode(id.public_key_base64()).unwrap();
        assert_eq!(decoded.as_slice(), &id.public_key_bytes());
    }

    #[test]
    fn debug_output_omits_secret() {
        let seed = [9u8; 32];
        let id = IdentityStore::from_seed(seed);
        let rendered = format!("{id:?}");
        assert!(rendered.contains(&id.public_key_base64()));
        assert!(!rendered.contains(&STANDARD.encode(seed)));
    }
}
