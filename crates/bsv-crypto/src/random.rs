//! Operating-system randomness.
//!
//! Fresh keys and Shamir coefficients draw from here. Signing never does;
//! nonces come from the deterministic generator in [`crate::drbg`].

#![forbid(unsafe_code)]

use rand::rngs::OsRng;
use rand::RngCore;

/// `n` bytes from the OS CSPRNG.
pub fn random_bytes(n: usize) -> Vec<u8> {
    let mut out = vec![0u8; n];
    fill(&mut out);
    out
}

/// Fill `buf` from the OS CSPRNG.
pub fn fill(buf: &mut [u8]) {
    OsRng.fill_bytes(buf);
}
