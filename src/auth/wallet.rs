//! Wallet derivation
//!
//! A wallet binds a panel to the (identity, resource) pair that authorized
//! it: SHA-512 over `public_key_base64 || resource_locator`, base64-encoded,
//! first 32 characters. It is an identifier, not a 256-bit secret, and no
//! collision resistance is claimed for it.

use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use sha2::{Digest, Sha512};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Length of a derived wallet in characters
pub const WALLET_LEN: usize = 32;

/// Derived wallet value. `Debug` is redacted so it never lands in logs.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct DerivedSecret(String);

impl DerivedSecret {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for DerivedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DerivedSecret(..)")
    }
}

pub fn derive(public_key: &str, resource_locator: &str) -> DerivedSecret {
    let mut hasher = Sha512::new();
    hasher.update(public_key.as_bytes());
    hasher.update(resource_locator.as_bytes());
    let digest = hasher.finalize();

    let mut encoded = STANDARD.encode(digest);
    // base64 output is ASCII, so truncating at a byte index is safe
    encoded.truncate(WALLET_LEN);
    DerivedSecret(encoded)
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &str = "0dQdJDEfTw8ZsYkGxEXaO4lcQ6Rk5OrkWQGtQ1uDPNg=";

    #[test]
    fn same_inputs_same_wallet() {
        let a = derive(KEY, "https://example.com");
        let b = derive(KEY, "https://example.com");
        assert_eq!(a, b);
        assert_eq!(a.len(), WALLET_LEN);
    }

    #[test]
    fn either_input_changes_wallet() {
        let base = derive(KEY, "https://example.com");
        assert_ne!(base, derive(KEY, "https://example.org"));
        assert_ne!(base, derive("AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA=", "https://example.com"));
    }

    #[test]
    fn concatenation_has_no_separator() {
        // Inputs are hashed back to back, so moving the split point is invisible
        assert_eq!(derive("ab", "c"), derive("a", "bc"));
    }

    #[test]
    fn matches_prefix_of_full_digest() {
        let full = STANDARD.encode(Sha512::digest(format!("{KEY}https://example.com")));
        assert_eq!(derive(KEY, "https://example.com").as_str(), &full[..WALLET_LEN]);
    }

    #[test]
    fn debug_is_redacted() {
        let secret = derive(KEY, "https://example.com");
        assert!(!format!("{secret:?}").contains(secret.as_str()));
    }
}
