//! Cryptographic core for the bsv-sdk.
//!
//! Big integers, modular reduction, secp256k1 point arithmetic, ECDSA with
//! key recovery, HMAC-DRBG nonces and Shamir key sharing. Everything is
//! implemented here; reference crates (k256, sha2, hmac, bs58) are
//! dev-dependencies used only to cross-check results.

#![forbid(unsafe_code)]

pub mod base58;
pub mod base64;
pub mod bigint;
pub mod drbg;
pub mod hmac;
pub mod random;
pub mod red;
pub mod secp256k1;
pub mod sha256;

pub use bigint::BigInt;
pub use red::{RedBigInt, ReductionContext};
