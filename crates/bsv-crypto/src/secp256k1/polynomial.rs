//! Shamir secret sharing over GF(p).
//!
//! A polynomial of degree t-1 is stored as t points, with the secret at
//! x = 0. Evaluating anywhere else is Lagrange interpolation through
//! those points, so shares and reconstruction use the same routine.

#![forbid(unsafe_code)]

use std::fmt;
use std::str::FromStr;

use bsv_core::{Error, Result};
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};

use crate::bigint::BigInt;

use super::curve::{field, FieldElement};
use super::private_key::PrivateKey;

/// A point (x, y) with both coordinates in [0, p).
#[derive(Clone, PartialEq, Eq)]
pub struct PointInFiniteField {
    pub x: BigInt,
    pub y: BigInt,
}

impl PointInFiniteField {
    /// Coordinates are reduced mod p.
    pub fn new(x: &BigInt, y: &BigInt) -> Self {
        let p = field().modulus();
        Self {
            x: x.umod(p),
            y: y.umod(p),
        }
    }

    fn x_red(&self) -> FieldElement {
        field().reduce(&self.x)
    }
}

/// `base58(x).base58(y)`.
impl fmt::Display for PointInFiniteField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.x.to_base58(), self.y.to_base58())
    }
}

impl fmt::Debug for PointInFiniteField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PointInFiniteField({self})")
    }
}

impl FromStr for PointInFiniteField {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (x, y) = s
            .split_once('.')
            .ok_or_else(|| Error::InvalidEncoding(format!("share point {s:?} has no separator")))?;
        Ok(Self::new(&BigInt::from_base58(x)?, &BigInt::from_base58(y)?))
    }
}

/// The interpolating polynomial through `threshold` points.
#[derive(Clone, Debug)]
pub struct Polynomial {
    points: Vec<PointInFiniteField>,
    threshold: usize,
}

impl Polynomial {
    /// Uses the first `threshold` points. Fails with `InsufficientShares`
    /// when fewer are given and `DuplicateShare` when two share an x.
    pub fn new(points: Vec<PointInFiniteField>, threshold: usize) -> Result<Self> {
        if points.len() < threshold || threshold == 0 {
            return Err(Error::InsufficientShares {
                got: points.len(),
                threshold,
            });
        }
        let mut points = points;
        points.truncate(threshold);
        for (i, a) in points.iter().enumerate() {
            if points[i + 1..].iter().any(|b| b.x == a.x) {
                return Err(Error::DuplicateShare);
            }
        }
        Ok(Self { points, threshold })
    }

    /// Secret at x = 0 plus `threshold - 1` random points.
    pub fn from_private_key(key: &PrivateKey, threshold: usize) -> Self {
        Self::from_private_key_with_rng(key, threshold, &mut OsRng)
    }

    pub fn from_private_key_with_rng<R: RngCore + CryptoRng>(
        key: &PrivateKey,
        threshold: usize,
        rng: &mut R,
    ) -> Self {
        let mut points = Vec::with_capacity(threshold);
        points.push(PointInFiniteField::new(&BigInt::zero(), key.scalar()));
        while points.len() < threshold {
            let x = random_element(rng);
            if points.iter().any(|p| p.x == x) {
                continue;
            }
            points.push(PointInFiniteField::new(&x, &random_element(rng)));
        }
        Self {
            points,
            threshold: threshold.max(1),
        }
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    pub fn points(&self) -> &[PointInFiniteField] {
        &self.points
    }

    /// Lagrange interpolation at `x`:
    /// Σ y_i · Π_{j≠i} (x - x_j) / (x_i - x_j)
    pub fn value_at(&self, x: &BigInt) -> Result<BigInt> {
        let fp = field();
        let x = fp.reduce(x);
        let mut sum = fp.zero();
        for (i, pi) in self.points.iter().enumerate() {
            let xi = pi.x_red();
            let mut num = fp.one();
            let mut den = fp.one();
            for (j, pj) in self.points.iter().enumerate() {
                if i == j {
                    continue;
                }
                let xj = pj.x_red();
                num = num.red_mul(&x.red_sub(&xj));
                den = den.red_mul(&xi.red_sub(&xj));
            }
            let den_inv = den.red_invm().ok_or(Error::DuplicateShare)?;
            let term = fp.reduce(&pi.y).red_mul(&num).red_mul(&den_inv);
            sum = sum.red_add(&term);
        }
        Ok(sum.from_red())
    }

    /// `total` shares at distinct random non-zero x.
    pub(crate) fn to_key_shares<R: RngCore + CryptoRng>(
        &self,
        total: usize,
        rng: &mut R,
    ) -> Result<KeyShares> {
        let mut points: Vec<PointInFiniteField> = Vec::with_capacity(total);
        while points.len() < total {
            let x = random_element(rng);
            if x.is_zero() || points.iter().any(|p| p.x == x) {
                continue;
            }
            let y = self.value_at(&x)?;
            points.push(PointInFiniteField::new(&x, &y));
        }
        Ok(KeyShares::new(points, self.threshold))
    }
}

fn random_element<R: RngCore + CryptoRng>(rng: &mut R) -> BigInt {
    let mut bytes = [0u8; 32];
    rng.fill_bytes(&mut bytes);
    BigInt::from_bytes_be(&bytes).umod(field().modulus())
}

/// Shares of a split private key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyShares {
    pub points: Vec<PointInFiniteField>,
    pub threshold: usize,
}

impl KeyShares {
    pub fn new(points: Vec<PointInFiniteField>, threshold: usize) -> Self {
        Self { points, threshold }
    }

    /// The value at x = 0.
    pub(crate) fn reconstruct(&self) -> Result<BigInt> {
        let poly = Polynomial::new(self.points.clone(), self.threshold).map_err(|e| {
            tracing::debug!(
                shares = self.points.len(),
                threshold = self.threshold,
                error = %e,
                "key share reconstruction refused"
            );
            e
        })?;
        poly.value_at(&BigInt::zero())
    }

    /// One `x.y.threshold` line per share.
    pub fn to_backup_format(&self) -> Vec<String> {
        self.points
            .iter()
            .map(|p| format!("{p}.{}", self.threshold))
            .collect()
    }

    pub fn from_backup_format<S: AsRef<str>>(lines: &[S]) -> Result<Self> {
        let mut points = Vec::with_capacity(lines.len());
        let mut threshold = None;
        for line in lines {
            let line = line.as_ref();
            let (point, t) = line
                .rsplit_once('.')
                .ok_or_else(|| Error::InvalidEncoding(format!("share {line:?} has no threshold")))?;
            let t: usize = t
                .parse()
                .map_err(|_| Error::InvalidEncoding(format!("bad threshold in share {line:?}")))?;
            if *threshold.get_or_insert(t) != t {
                return Err(Error::InvalidEncoding("shares disagree on threshold".into()));
            }
            points.push(point.parse()?);
        }
        let threshold =
            threshold.ok_or_else(|| Error::InvalidEncoding("no shares given".into()))?;
        Ok(Self { points, threshold })
    }
}
