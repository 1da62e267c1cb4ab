//! secp256k1: curve arithmetic, ECDSA, keys and Shamir key sharing.

#![forbid(unsafe_code)]

pub mod curve;
pub mod ecdsa;
pub mod point;
pub mod polynomial;
pub mod precomp;
pub mod private_key;
pub mod public_key;
pub mod signature;

pub use curve::{field, scalar_field, secp256k1, Curve, FieldElement};
pub use ecdsa::SignOptions;
pub use point::{AffinePoint, CurvePoint, JacobianPoint, Point};
pub use polynomial::{KeyShares, PointInFiniteField, Polynomial};
pub use private_key::{PrivateKey, UncheckedPrivateKey};
pub use public_key::PublicKey;
pub use signature::{Signature, TxSignature};
