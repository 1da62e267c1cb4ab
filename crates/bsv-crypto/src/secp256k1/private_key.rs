//! Private keys.
//!
//! [`PrivateKey`] always holds a scalar in [1, n-1]. Values that may be out
//! of range (legacy imports) live in [`UncheckedPrivateKey`] until they are
//! explicitly normalized.

#![forbid(unsafe_code)]

use std::fmt;

use bsv_core::{Error, Result};
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};

use crate::base58;
use crate::bigint::BigInt;

use super::curve::secp256k1;
use super::ecdsa::{self, SignOptions};
use super::point::{AffinePoint, CurvePoint};
use super::polynomial::{KeyShares, Polynomial};
use super::public_key::PublicKey;
use super::signature::Signature;

/// WIF version byte for mainnet keys.
pub const WIF_PREFIX: u8 = 0x80;

/// Marks a WIF payload whose public key is compressed.
const COMPRESSED_FLAG: u8 = 0x01;

const KEY_BYTES: usize = 32;

/// A secp256k1 secret scalar.
#[derive(Clone, PartialEq, Eq)]
pub struct PrivateKey(BigInt);

impl PrivateKey {
    /// Fails with `OutOfRange` unless 1 <= k < n.
    pub fn new(k: BigInt) -> Result<Self> {
        if k.is_neg() || k.is_zero() || k >= secp256k1().n {
            return Err(Error::OutOfRange("private key not in [1, n-1]".into()));
        }
        Ok(Self(k))
    }

    /// A fresh key from the OS CSPRNG.
    pub fn from_random() -> Self {
        Self::from_rng(&mut OsRng)
    }

    /// A fresh key from `rng`, redrawing until the scalar is in range.
    pub fn from_rng<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        let mut bytes = [0u8; KEY_BYTES];
        loop {
            rng.fill_bytes(&mut bytes);
            if let Ok(key) = Self::new(BigInt::from_bytes_be(&bytes)) {
                return key;
            }
        }
    }

    /// 32 big-endian bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != KEY_BYTES {
            return Err(Error::InvalidEncoding(format!(
                "private key must be {KEY_BYTES} bytes, got {}",
                bytes.len()
            )));
        }
        Self::new(BigInt::from_bytes_be(bytes))
    }

    pub fn from_hex(s: &str) -> Result<Self> {
        Self::new(BigInt::from_hex(s)?)
    }

    /// Parse base58check `prefix ‖ key[32] ‖ 01?`.
    pub fn from_wif(s: &str) -> Result<Self> {
        let payload = base58::decode_check(s)?;
        match payload.len() {
            33 => {}
            34 if payload[33] == COMPRESSED_FLAG => {}
            34 => {
                return Err(Error::InvalidEncoding(
                    "WIF compression flag must be 0x01".into(),
                ))
            }
            len => {
                return Err(Error::InvalidEncoding(format!(
                    "WIF payload must be 33 or 34 bytes, got {len}"
                )))
            }
        }
        Self::from_bytes(&payload[1..33])
    }

    /// Mainnet WIF with the compression flag.
    pub fn to_wif(&self) -> String {
        self.to_wif_with_prefix(WIF_PREFIX)
    }

    pub fn to_wif_with_prefix(&self, prefix: u8) -> String {
        wif(prefix, &self.0)
    }

    pub fn scalar(&self) -> &BigInt {
        &self.0
    }

    pub fn to_bytes(&self) -> [u8; KEY_BYTES] {
        self.0.to_be_fixed::<KEY_BYTES>()
    }

    /// 64 lowercase hex digits.
    pub fn to_hex(&self) -> String {
        format!("{:064x}", self.0)
    }

    pub fn to_public_key(&self) -> PublicKey {
        PublicKey::from_private_key(self)
    }

    /// Deterministic low-S signature over a message digest.
    pub fn sign(&self, digest: &[u8]) -> Result<Signature> {
        self.sign_with_options(digest, SignOptions::default())
    }

    pub fn sign_with_options(&self, digest: &[u8], options: SignOptions) -> Result<Signature> {
        ecdsa::sign(&BigInt::from_bytes_be(digest), &self.0, options)
    }

    /// Like [`PrivateKey::sign`], with the recovery id attached.
    pub fn sign_recoverable(&self, digest: &[u8]) -> Result<Signature> {
        ecdsa::sign_recoverable(&BigInt::from_bytes_be(digest), &self.0, SignOptions::default())
    }

    pub fn verify(&self, digest: &[u8], sig: &Signature) -> bool {
        self.to_public_key().verify(digest, sig)
    }

    /// ECDH: the shared point k·Q. Rejects public keys off the curve.
    pub fn derive_shared_secret(&self, public: &PublicKey) -> Result<AffinePoint> {
        let point = public.point();
        if point.is_infinity() || !point.validate() {
            tracing::debug!("rejected shared-secret derivation with an invalid public point");
            return Err(Error::InvalidPoint);
        }
        Ok(point.mul(&self.0))
    }

    /// Split into `total` Shamir shares, any `threshold` of which rebuild
    /// the key.
    pub fn to_key_shares(&self, threshold: usize, total: usize) -> Result<KeyShares> {
        self.to_key_shares_with_rng(threshold, total, &mut OsRng)
    }

    pub fn to_key_shares_with_rng<R: RngCore + CryptoRng>(
        &self,
        threshold: usize,
        total: usize,
        rng: &mut R,
    ) -> Result<KeyShares> {
        if threshold < 2 || threshold > total {
            return Err(Error::InvalidThreshold { threshold, total });
        }
        let poly = Polynomial::from_private_key_with_rng(self, threshold, rng);
        poly.to_key_shares(total, rng)
    }

    /// Rebuild from at least `threshold` shares.
    pub fn from_key_shares(shares: &KeyShares) -> Result<Self> {
        let secret = shares.reconstruct()?;
        Self::new(secret).map_err(|e| {
            tracing::debug!("key shares reconstructed a value outside the scalar range");
            e
        })
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PrivateKey(<redacted>)")
    }
}

impl std::str::FromStr for PrivateKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_wif(s)
    }
}

fn wif(prefix: u8, k: &BigInt) -> String {
    let mut payload = Vec::with_capacity(KEY_BYTES + 2);
    payload.push(prefix);
    payload.extend_from_slice(&k.to_be_fixed::<KEY_BYTES>());
    payload.push(COMPRESSED_FLAG);
    base58::encode_check(&payload)
}

/// A scalar that has not been checked against n.
///
/// Holds any non-negative integer. Export fails until the value is
/// brought into range with [`UncheckedPrivateKey::normalize`].
#[derive(Clone, PartialEq, Eq)]
pub struct UncheckedPrivateKey(BigInt);

impl UncheckedPrivateKey {
    pub fn new(k: BigInt) -> Result<Self> {
        if k.is_neg() {
            return Err(Error::OutOfRange("private key must be non-negative".into()));
        }
        Ok(Self(k))
    }

    pub fn from_hex(s: &str) -> Result<Self> {
        Self::new(BigInt::from_hex(s)?)
    }

    pub fn value(&self) -> &BigInt {
        &self.0
    }

    /// Fails with `OutOfRange` unless the value is already a valid key.
    pub fn to_wif(&self) -> Result<String> {
        Ok(self.check()?.to_wif())
    }

    /// The in-range key, without reducing.
    pub fn check(&self) -> Result<PrivateKey> {
        PrivateKey::new(self.0.clone())
    }

    /// Reduce mod n. A multiple of n is still rejected.
    pub fn normalize(&self) -> Result<PrivateKey> {
        PrivateKey::new(self.0.umod(&secp256k1().n))
    }
}

impl fmt::Debug for UncheckedPrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("UncheckedPrivateKey(<redacted>)")
    }
}

impl From<PrivateKey> for UncheckedPrivateKey {
    fn from(key: PrivateKey) -> Self {
        Self(key.0)
    }
}
