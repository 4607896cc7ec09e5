//! Sign and verify over UTF-8 messages
//!
//! Signing uses the process [`IdentityStore`]. Verification is total: every
//! decode failure, length mismatch or scheme violation maps to `false` at a
//! single boundary ([`check`]), so callers can treat "any problem" as "deny".

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use ed25519_dalek::{Signature, SignatureError, VerifyingKey, PUBLIC_KEY_LENGTH};
use log::debug;

use crate::error::{GateError, Result};
use crate::identity::IdentityStore;

/// Why a verification failed. Only used for local diagnostics; callers see `false`.
#[derive(Debug)]
enum VerifyFailure {
    Base64(base64::DecodeError),
    KeyLength(usize),
    Scheme(SignatureError),
}

impl From<base64::DecodeError> for VerifyFailure {
    fn from(e: base64::DecodeError) -> Self {
        Self::Base64(e)
    }
}

impl From<SignatureError> for VerifyFailure {
    fn from(e: SignatureError) -> Self {
        Self::Scheme(e)
    }
}

pub fn sign(identity: &IdentityStore, message: &str) -> Signature {
    identity.sign(message.as_bytes())
}

/// Sign raw bytes, rejecting anything that is not UTF-8 text
pub fn sign_utf8(identity: &IdentityStore, message: &[u8]) -> Result<Signature> {
    let text = std::str::from_utf8(message)
        .map_err(|e| GateError::InvalidInput(format!("message is not UTF-8 text: {e}")))?;
    Ok(sign(identity, text))
}

/// Sign and base64-encode, the form returned over `sign-message`
pub fn sign_base64(identity: &IdentityStore, message: &str) -> String {
    STANDARD.encode(sign(identity, message).to_bytes())
}

/// Verify a raw signature over `message` against a raw public key
pub fn verify(message: &str, signature: &[u8], public_key: &[u8]) -> bool {
    report(check(message.as_bytes(), signature, public_key))
}

/// Verify base64-encoded signature and public key, as received over IPC
pub fn verify_base64(message: &str, signature: &str, public_key: &str) -> bool {
    let decoded = STANDARD
        .decode(signature)
        .map_err(VerifyFailure::from)
        .and_then(|sig| Ok((sig, STANDARD.decode(public_key)?)));

    match decoded {
        Ok((sig, key)) => verify(message, &sig, &key),
        Err(failure) => report(Err(failure)),
    }
}

fn check(message: &[u8], signature: &[u8], public_key: &[u8]) -> std::result::Result<(), VerifyFailure> {
    let key: &[u8; PUBLIC_KEY_LENGTH] = public_key
        .try_into()
        .map_err(|_| VerifyFailure::KeyLength(public_key.len()))?;
    let key = VerifyingKey::from_bytes(key)?;
    let signature = Signature::from_slice(signature)?;
    key.verify_strict(message, &signature)?;
    Ok(())
}

fn report(outcome: std::result::Result<(), VerifyFailure>) -> bool {
    match outcome {
        Ok(()) => true,
        Err(failure) => {
            debug!("signature rejected: {:?}", failure);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn fixture() -> IdentityStore {
        IdentityStore::from_seed([42u8; 32])
    }

    #[test]
    fn signing_is_deterministic() {
        let id = fixture();
        assert_eq!(sign(&id, "hello").to_bytes(), sign(&id, "hello").to_bytes());
    }

    #[test]
    fn rejects_non_utf8_bytes() {
        let id = fixture();
        let err = sign_utf8(&id, &[0xff, 0xfe, 0x00]).unwrap_err();
        assert!(matches!(err, GateError::InvalidInput(_)));
        assert!(sign_utf8(&id, b"https://example.com").is_ok());
    }

    #[test]
    fn wrong_message_fails() {
        let id = fixture();
        let sig = sign(&id, "https://a.example");
        assert!(!verify("https://b.example", &sig.to_bytes(), &id.public_key_bytes()));
    }

    #[test]
    fn malformed_inputs_are_false_not_errors() {
        let id = fixture();
        let sig = sign(&id, "m").to_bytes();
        let key = id.public_key_bytes();

        assert!(!verify("m", &sig[..63], &key));
        assert!(!verify("m", &sig, &key[..31]));
        assert!(!verify("m", &[], &[]));
        assert!(!verify_base64("m", "not base64!!", &id.public_key_base64()));
        assert!(!verify_base64("m", &sign_base64(&id, "m"), "%%%"));
        assert!(!verify_base64("m", "", ""));
    }

    #[test]
    fn base64_round_trip_verifies() {
        let id = fixture();
        let sig = sign_base64(&id, "https://example.com");
        assert!(verify_base64("https://example.com", &sig, &id.public_key_base64()));
    }

    proptest! {
        #[test]
        fn signature_verifies_under_own_key(message in ".*") {
            let id = fixture();
            let sig = sign(&id, &message);
            prop_assert!(verify(&message, &sig.to_bytes(), &id.public_key_bytes()));
        }

        #[test]
        fn signature_fails_under_other_key(message in ".*", seed in any::<[u8; 32]>()) {
            prop_assume!(seed != [42u8; 32]);
            let id = fixture();
            let other = IdentityStore::from_seed(seed);
            let sig = sign(&id, &message);
            prop_assert!(!verify(&message, &sig.to_bytes(), &other.public_key_bytes()));
        }

        #[test]
        fn any_single_byte_mutation_fails(
            message in ".{0,64}",
            index in 0usize..64,
            flip in 1u8..=255,
        ) {
            let id = fixture();
            let mut sig = sign(&id, &message).to_bytes();
            sig[index] ^= flip;
            prop_assert!(!verify(&message, &sig, &id.public_key_bytes()));
        }
    }
}
