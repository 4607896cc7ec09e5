//! OS random number generator wrapper
//!
//! Key generation draws from the operating system CSPRNG (`getrandom`
//! underneath `rand_core::OsRng`). A desktop host has no degraded mode: if
//! the source cannot produce bytes at startup, the shell refuses to start.

use rand_core::{CryptoRng, OsRng, RngCore};

use crate::error::{GateError, Result};

/// Handle to the OS entropy source
pub struct OsEntropy {
    // Zero-sized - all state is in the kernel
    _private: (),
}

impl OsEntropy {
    /// Probe the OS RNG and return a handle to it
    ///
    /// Fails if the source errors or hands back an all-zero probe.
    pub fn new() -> Result<Self> {
        let mut test = [0u8; 4];
        OsRng
            .try_fill_bytes(&mut test)
            .map_err(|e| GateError::Entropy(e.to_string()))?;

        // Basic sanity check (not all zeros - would indicate RNG failure)
        if test == [0, 0, 0, 0] {
            return Err(GateError::Entropy(
                "sanity check failed - returned all zeros".into(),
            ));
        }

        Ok(Self { _private: () })
    }
}

// rand_core traits so the handle can drive ed25519-dalek key generation
impl RngCore for OsEntropy {
    fn next_u32(&mut self) -> u32 {
        OsRng.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        OsRng.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        OsRng.fill_bytes(dest)
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> std::result::Result<(), rand_core::Error> {
        OsRng.try_fill_bytes(dest)
    }
}

impl CryptoRng for OsEntropy {}
