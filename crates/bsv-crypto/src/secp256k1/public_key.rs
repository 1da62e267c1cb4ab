//! Public keys: validated curve points with SEC1 serialization.

#![forbid(unsafe_code)]

use std::fmt;

use bsv_core::{Error, Result};

use crate::bigint::BigInt;

use super::curve::secp256k1;
use super::ecdsa;
use super::point::{AffinePoint, CurvePoint};
use super::private_key::PrivateKey;
use super::signature::Signature;

/// Compressed SEC1 length.
pub const COMPRESSED_LEN: usize = 33;

#[derive(Clone, PartialEq, Eq)]
pub struct PublicKey(AffinePoint);

impl PublicKey {
    /// k·G.
    pub fn from_private_key(key: &PrivateKey) -> Self {
        Self(secp256k1().generator().mul(key.scalar()))
    }

    /// Fails with `PointAtInfinity` or `InvalidPoint` unless `point` is a
    /// finite curve point.
    pub fn from_point(point: AffinePoint) -> Result<Self> {
        if point.is_infinity() {
            return Err(Error::PointAtInfinity);
        }
        if !point.validate() {
            return Err(Error::InvalidPoint);
        }
        Ok(Self(point))
    }

    /// Wrap a point without checking it. Operations that depend on curve
    /// membership (ECDH, verification) still check before use.
    pub fn from_point_unchecked(point: AffinePoint) -> Self {
        Self(point)
    }

    /// SEC1 compressed, uncompressed or hybrid.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::from_point(AffinePoint::decode(bytes)?)
    }

    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = BigInt::from_hex(s)?.to_bytes_be_padded(s.len() / 2)?;
        Self::from_bytes(&bytes)
    }

    pub fn point(&self) -> &AffinePoint {
        &self.0
    }

    pub fn to_bytes(&self, compressed: bool) -> Vec<u8> {
        self.0.encode(compressed)
    }

    pub fn to_compressed(&self) -> [u8; COMPRESSED_LEN] {
        let mut out = [0u8; COMPRESSED_LEN];
        out.copy_from_slice(&self.0.encode(true));
        out
    }

    /// Compressed form as hex.
    pub fn to_hex(&self) -> String {
        self.to_compressed().iter().map(|b| format!("{b:02x}")).collect()
    }

    /// ECDSA verification over a message digest. Never fails.
    pub fn verify(&self, digest: &[u8], sig: &Signature) -> bool {
        ecdsa::verify(&BigInt::from_bytes_be(digest), sig, &self.0)
    }

    /// ECDH from the other side: k·Q for our point Q.
    pub fn derive_shared_secret(&self, key: &PrivateKey) -> Result<AffinePoint> {
        key.derive_shared_secret(self)
    }

    /// The signer's key from a digest, signature and recovery id.
    pub fn recover(digest: &[u8], sig: &Signature, recovery_id: u8) -> Result<Self> {
        let point = ecdsa::recover_public_key(recovery_id, &BigInt::from_bytes_be(digest), sig)?;
        Ok(Self(point))
    }

    /// Recover using the id carried by a compact signature.
    pub fn recover_compact(digest: &[u8], compact: &[u8]) -> Result<Self> {
        let sig = Signature::from_compact(compact)?;
        let id = sig
            .recovery_id()
            .ok_or_else(|| Error::InvalidEncoding("compact signature has no recovery id".into()))?;
        Self::recover(digest, &sig, id)
    }

    /// The recovery id tying `sig` over `digest` to this key.
    pub fn recovery_factor(&self, digest: &[u8], sig: &Signature) -> Result<u8> {
        ecdsa::calculate_recovery_factor(&self.0, &BigInt::from_bytes_be(digest), sig)
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", self.to_hex())
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}
