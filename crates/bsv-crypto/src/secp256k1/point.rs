//! Elliptic curve points in affine and Jacobian coordinates.
//!
//! secp256k1 curve: y² = x³ + 7 over GF(p)
//! Jacobian: (X, Y, Z) represents affine (X/Z², Y/Z³)
//!
//! Arithmetic runs in Jacobian coordinates and converts to affine only at
//! the edges (encoding, comparison, coordinate access).

#![forbid(unsafe_code)]

use std::fmt;
use std::sync::{Arc, OnceLock};

use bsv_core::{Error, Result};

use crate::bigint::BigInt;

use super::curve::{field, secp256k1, FieldElement};
use super::precomp::{self, Precomputed, Table, WnafTerm, NAF_WINDOW};

/// wNAF window for points without a precomputation cache.
pub const DEFAULT_WNAF_WINDOW: usize = 4;

/// SEC1 prefix bytes.
const PREFIX_EVEN: u8 = 0x02;
const PREFIX_ODD: u8 = 0x03;
const PREFIX_UNCOMPRESSED: u8 = 0x04;
const PREFIX_HYBRID_EVEN: u8 = 0x06;
const PREFIX_HYBRID_ODD: u8 = 0x07;

/// Operations shared by both coordinate systems.
pub trait CurvePoint: Clone {
    fn is_infinity(&self) -> bool;

    /// Group addition.
    fn add(&self, other: &Self) -> Self;

    /// Point doubling: 2P.
    fn dbl(&self) -> Self;

    fn neg(&self) -> Self;

    fn to_affine(&self) -> AffinePoint;

    fn to_jacobian(&self) -> JacobianPoint;

    /// SEC1 encoding: `02/03 ‖ x` compressed, `04 ‖ x ‖ y` uncompressed,
    /// and the single byte `00` for the point at infinity.
    fn encode(&self, compressed: bool) -> Vec<u8> {
        self.to_affine().encode_sec1(compressed)
    }

    /// Whether the point satisfies the curve equation.
    fn validate(&self) -> bool {
        self.to_affine().is_on_curve()
    }
}

/// Point in affine coordinates, optionally carrying a lazily built
/// precomputation cache shared between its clones.
#[derive(Clone)]
pub struct AffinePoint {
    x: FieldElement,
    y: FieldElement,
    infinity: bool,
    precomputed: Option<Arc<OnceLock<Precomputed>>>,
}

impl AffinePoint {
    /// Point at infinity (identity element).
    pub fn infinity() -> Self {
        Self {
            x: field().zero(),
            y: field().zero(),
            infinity: true,
            precomputed: None,
        }
    }

    /// Validated point from integer coordinates.
    pub fn new(x: &BigInt, y: &BigInt) -> Result<Self> {
        let point = Self::from_field_unchecked(to_field(x)?, to_field(y)?);
        if !point.is_on_curve() {
            return Err(Error::InvalidPoint);
        }
        Ok(point)
    }

    /// Point from coordinates reduced mod p, without checking the curve
    /// equation. Only for callers that validate separately.
    pub fn from_xy_unchecked(x: &BigInt, y: &BigInt) -> Self {
        Self::from_field_unchecked(field().reduce(x), field().reduce(y))
    }

    pub(crate) fn from_field_unchecked(x: FieldElement, y: FieldElement) -> Self {
        Self {
            x,
            y,
            infinity: false,
            precomputed: None,
        }
    }

    /// Decompress: the point with x-coordinate `x` and the requested
    /// y parity.
    pub fn from_x(x: &BigInt, odd: bool) -> Result<Self> {
        let x = to_field(x)?;
        let y2 = x.red_sqr().red_mul(&x).red_add(&secp256k1().b);
        let mut y = y2.red_sqrt().ok_or(Error::InvalidPoint)?;
        if y.is_odd() != odd {
            y = y.red_neg();
        }
        Ok(Self::from_field_unchecked(x, y))
    }

    /// Decode SEC1 compressed, uncompressed or hybrid bytes, or `00` for
    /// infinity.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        match (bytes.first().copied(), bytes.len()) {
            (Some(0x00), 1) => Ok(Self::infinity()),
            (Some(prefix @ (PREFIX_EVEN | PREFIX_ODD)), 33) => {
                Self::from_x(&BigInt::from_bytes_be(&bytes[1..]), prefix == PREFIX_ODD)
            }
            (
                Some(prefix @ (PREFIX_UNCOMPRESSED | PREFIX_HYBRID_EVEN | PREFIX_HYBRID_ODD)),
                65,
            ) => {
                let x = BigInt::from_bytes_be(&bytes[1..33]);
                let y = BigInt::from_bytes_be(&bytes[33..]);
                if prefix != PREFIX_UNCOMPRESSED && y.is_odd() != (prefix == PREFIX_HYBRID_ODD) {
                    return Err(Error::InvalidEncoding(
                        "hybrid prefix does not match y parity".into(),
                    ));
                }
                Self::new(&x, &y)
            }
            (Some(prefix), len) => Err(Error::InvalidEncoding(format!(
                "unrecognized point encoding: prefix {prefix:#04x}, {len} bytes"
            ))),
            (None, _) => Err(Error::InvalidEncoding("empty point encoding".into())),
        }
    }

    pub fn x(&self) -> &FieldElement {
        &self.x
    }

    pub fn y(&self) -> &FieldElement {
        &self.y
    }

    /// Affine x as an integer.
    pub fn get_x(&self) -> BigInt {
        self.x.from_red()
    }

    /// Affine y as an integer.
    pub fn get_y(&self) -> BigInt {
        self.y.from_red()
    }

    /// y² = x³ + 7. Infinity counts as on the curve.
    pub fn is_on_curve(&self) -> bool {
        if self.infinity {
            return true;
        }
        let rhs = self.x.red_sqr().red_mul(&self.x).red_add(&secp256k1().b);
        self.y.red_sqr() == rhs
    }

    /// On the curve, not infinity, and of order n.
    pub fn validate_order(&self) -> bool {
        !self.infinity
            && self.is_on_curve()
            && self.mul_double_and_add(&secp256k1().n).is_infinity()
    }

    fn encode_sec1(&self, compressed: bool) -> Vec<u8> {
        if self.infinity {
            return vec![0x00];
        }
        let x = self.x.value().to_be_fixed::<32>();
        if compressed {
            let mut out = Vec::with_capacity(33);
            out.push(if self.y.is_odd() { PREFIX_ODD } else { PREFIX_EVEN });
            out.extend_from_slice(&x);
            return out;
        }
        let mut out = Vec::with_capacity(65);
        out.push(PREFIX_UNCOMPRESSED);
        out.extend_from_slice(&x);
        out.extend_from_slice(&self.y.value().to_be_fixed::<32>());
        out
    }

    /// SEC1 hybrid form: `06/07 ‖ x ‖ y`.
    pub fn encode_hybrid(&self) -> Vec<u8> {
        let mut out = self.encode_sec1(false);
        if !self.infinity {
            out[0] = if self.y.is_odd() {
                PREFIX_HYBRID_ODD
            } else {
                PREFIX_HYBRID_EVEN
            };
        }
        out
    }

    /// Attach an empty precomputation cache; tables are built on first
    /// multiplication.
    pub fn with_precomputation(mut self) -> Self {
        if self.precomputed.is_none() && !self.infinity {
            self.precomputed = Some(Arc::new(OnceLock::new()));
        }
        self
    }

    pub fn has_precomputation(&self) -> bool {
        self.precomputed.is_some()
    }

    /// The cached tables, built by the first caller.
    pub(crate) fn precomputed(&self) -> Option<&Precomputed> {
        self.precomputed
            .as_ref()
            .map(|cell| cell.get_or_init(|| Precomputed::build(self)))
    }

    /// The same point without a cache.
    pub(crate) fn plain(&self) -> Self {
        Self {
            precomputed: None,
            ..self.clone()
        }
    }

    /// Scalar multiplication k * P.
    ///
    /// Scalars wider than 256 bits use plain double-and-add. Otherwise a
    /// point whose cached doubling table covers k uses the fixed-base
    /// method, and every other case goes through the GLV split.
    pub fn mul(&self, k: &BigInt) -> AffinePoint {
        if k.is_zero() || self.infinity {
            return Self::infinity();
        }
        if k.bit_length() > 256 {
            return self.mul_double_and_add(k);
        }
        if let Some(result) = self.mul_fixed(k) {
            return result;
        }
        self.mul_endo(k)
    }

    /// Fixed-base windowed NAF multiplication from the cached doubling
    /// table. `None` without a cache or when the NAF of k is longer than
    /// the doubling table (66 entries at step 4).
    pub fn mul_fixed(&self, k: &BigInt) -> Option<AffinePoint> {
        let pre = self.precomputed()?;
        if !pre.covers(k) {
            return None;
        }
        let result = precomp::fixed_naf_mul(pre, &k.abs());
        Some(signed(result.to_affine(), k))
    }

    /// GLV multiplication: k = k1 + k2 * lambda, then a joint wNAF pass over
    /// (k1, P) and (k2, beta(P)).
    pub fn mul_endo(&self, k: &BigInt) -> AffinePoint {
        if k.is_zero() || self.infinity {
            return Self::infinity();
        }
        precomp::wnaf_mul_add(&self.glv_terms(k)).to_affine()
    }

    /// Right-to-left double-and-add over the bits of |k|.
    pub fn mul_double_and_add(&self, k: &BigInt) -> AffinePoint {
        if k.is_zero() || self.infinity {
            return Self::infinity();
        }
        let mut result = JacobianPoint::infinity();
        let mut base = self.to_jacobian();
        let bits = k.bit_length();
        for i in 0..bits {
            if k.testn(i) {
                result = result.add(&base);
            }
            if i + 1 < bits {
                base = base.dbl();
            }
        }
        signed(result.to_affine(), k)
    }

    /// k1 * self + k2 * q in one joint wNAF pass.
    pub fn mul_add(&self, k1: &BigInt, q: &AffinePoint, k2: &BigInt) -> AffinePoint {
        let mut terms = Vec::with_capacity(4);
        if !self.infinity && !k1.is_zero() {
            terms.extend(self.glv_terms(k1));
        }
        if !q.infinity && !k2.is_zero() {
            terms.extend(q.glv_terms(k2));
        }
        precomp::wnaf_mul_add(&terms).to_affine()
    }

    fn glv_terms(&self, k: &BigInt) -> [WnafTerm<'_>; 2] {
        let curve = secp256k1();
        let (k1, k2) = curve.endo_split(k);
        match self.precomputed() {
            Some(pre) => [
                WnafTerm::new(&k1, Table::Affine(&pre.naf), NAF_WINDOW),
                WnafTerm::new(&k2, Table::Affine(&pre.beta_naf), NAF_WINDOW),
            ],
            None => {
                let table = precomp::odd_multiples(self, DEFAULT_WNAF_WINDOW);
                let beta_table = table.iter().map(|p| p.endo(&curve.beta)).collect();
                [
                    WnafTerm::new(&k1, Table::Jacobian(table), DEFAULT_WNAF_WINDOW),
                    WnafTerm::new(&k2, Table::Jacobian(beta_table), DEFAULT_WNAF_WINDOW),
                ]
            }
        }
    }
}

/// -P when k is negative.
fn signed(p: AffinePoint, k: &BigInt) -> AffinePoint {
    if k.is_neg() {
        p.neg()
    } else {
        p
    }
}

fn to_field(v: &BigInt) -> Result<FieldElement> {
    let fp = field();
    if v.is_neg() || v >= fp.modulus() {
        return Err(Error::InvalidPoint);
    }
    Ok(fp.reduce(v))
}

impl CurvePoint for AffinePoint {
    fn is_infinity(&self) -> bool {
        self.infinity
    }

    fn add(&self, other: &Self) -> Self {
        self.to_jacobian().mixed_add(other).to_affine()
    }

    fn dbl(&self) -> Self {
        self.to_jacobian().dbl().to_affine()
    }

    fn neg(&self) -> Self {
        if self.infinity {
            return self.plain();
        }
        Self::from_field_unchecked(self.x.clone(), self.y.red_neg())
    }

    fn to_affine(&self) -> AffinePoint {
        self.clone()
    }

    fn to_jacobian(&self) -> JacobianPoint {
        if self.infinity {
            return JacobianPoint::infinity();
        }
        JacobianPoint {
            x: self.x.clone(),
            y: self.y.clone(),
            z: field().one(),
        }
    }
}

impl PartialEq for AffinePoint {
    fn eq(&self, other: &Self) -> bool {
        match (self.infinity, other.infinity) {
            (true, true) => true,
            (false, false) => self.x == other.x && self.y == other.y,
            _ => false,
        }
    }
}

impl Eq for AffinePoint {}

impl fmt::Debug for AffinePoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.infinity {
            return f.write_str("AffinePoint(infinity)");
        }
        write!(f, "AffinePoint({:x}, {:x})", self.x.value(), self.y.value())
    }
}

/// Point on secp256k1 in Jacobian coordinates.
/// Point at infinity has Z = 0.
#[derive(Clone)]
pub struct JacobianPoint {
    x: FieldElement,
    y: FieldElement,
    z: FieldElement,
}

impl JacobianPoint {
    pub fn infinity() -> Self {
        Self {
            x: field().one(),
            y: field().one(),
            z: field().zero(),
        }
    }

    pub fn new(x: FieldElement, y: FieldElement, z: FieldElement) -> Self {
        Self { x, y, z }
    }

    /// Add an affine point (Z2 = 1), saving the Z2 products.
    pub fn mixed_add(&self, other: &AffinePoint) -> Self {
        if other.infinity {
            return self.clone();
        }
        if self.is_infinity() {
            return other.to_jacobian();
        }

        let z1_2 = self.z.red_sqr();
        let z1_3 = z1_2.red_mul(&self.z);

        // U1 = X1, U2 = X2*Z1², S1 = Y1, S2 = Y2*Z1³
        let u2 = other.x.red_mul(&z1_2);
        let s2 = other.y.red_mul(&z1_3);

        let h = u2.red_sub(&self.x);
        let r = s2.red_sub(&self.y);

        if h.is_zero() {
            if r.is_zero() {
                return self.dbl();
            }
            return Self::infinity();
        }

        let h2 = h.red_sqr();
        let h3 = h2.red_mul(&h);
        let v = self.x.red_mul(&h2);

        // X3 = R² - H³ - 2*U1*H²
        let x3 = r.red_sqr().red_sub(&h3).red_sub(&v).red_sub(&v);
        // Y3 = R*(U1*H² - X3) - S1*H³
        let y3 = r.red_mul(&v.red_sub(&x3)).red_sub(&self.y.red_mul(&h3));
        // Z3 = H*Z1
        let z3 = h.red_mul(&self.z);

        Self {
            x: x3,
            y: y3,
            z: z3,
        }
    }

    /// 2^n * P.
    pub fn dbl_n(&self, n: usize) -> Self {
        let mut p = self.clone();
        for _ in 0..n {
            p = p.dbl();
        }
        p
    }

    /// (beta * X, Y, Z): multiplication by lambda.
    pub(crate) fn endo(&self, beta: &FieldElement) -> Self {
        Self {
            x: self.x.red_mul(beta),
            y: self.y.clone(),
            z: self.z.clone(),
        }
    }
}

impl CurvePoint for JacobianPoint {
    fn is_infinity(&self) -> bool {
        self.z.is_zero()
    }

    /// Standard Jacobian addition formulas.
    fn add(&self, other: &Self) -> Self {
        if self.is_infinity() {
            return other.clone();
        }
        if other.is_infinity() {
            return self.clone();
        }

        let z1_2 = self.z.red_sqr();
        let z2_2 = other.z.red_sqr();
        let z1_3 = z1_2.red_mul(&self.z);
        let z2_3 = z2_2.red_mul(&other.z);

        // U1 = X1*Z2², U2 = X2*Z1²
        let u1 = self.x.red_mul(&z2_2);
        let u2 = other.x.red_mul(&z1_2);

        // S1 = Y1*Z2³, S2 = Y2*Z1³
        let s1 = self.y.red_mul(&z2_3);
        let s2 = other.y.red_mul(&z1_3);

        let h = u2.red_sub(&u1);
        let r = s2.red_sub(&s1);

        if h.is_zero() {
            if r.is_zero() {
                return self.dbl();
            }
            return Self::infinity();
        }

        let h2 = h.red_sqr();
        let h3 = h2.red_mul(&h);

        // X3 = R² - H³ - 2*U1*H²
        let u1_h2 = u1.red_mul(&h2);
        let x3 = r.red_sqr().red_sub(&h3).red_sub(&u1_h2).red_sub(&u1_h2);

        // Y3 = R*(U1*H² - X3) - S1*H³
        let y3 = r.red_mul(&u1_h2.red_sub(&x3)).red_sub(&s1.red_mul(&h3));

        // Z3 = H*Z1*Z2
        let z3 = h.red_mul(&self.z).red_mul(&other.z);

        Self {
            x: x3,
            y: y3,
            z: z3,
        }
    }

    /// Doubling for a = 0 curves.
    fn dbl(&self) -> Self {
        if self.is_infinity() || self.y.is_zero() {
            return Self::infinity();
        }

        // S = 4*X*Y²
        let y2 = self.y.red_sqr();
        let s = self.x.red_mul(&y2).red_mul_small(4);

        // M = 3*X²
        let m = self.x.red_sqr().red_mul_small(3);

        // X3 = M² - 2*S
        let x3 = m.red_sqr().red_sub(&s).red_sub(&s);

        // Y3 = M*(S - X3) - 8*Y⁴
        let y4_8 = y2.red_sqr().red_mul_small(8);
        let y3 = m.red_mul(&s.red_sub(&x3)).red_sub(&y4_8);

        // Z3 = 2*Y*Z
        let z3 = self.y.red_mul(&self.z).red_mul_small(2);

        Self {
            x: x3,
            y: y3,
            z: z3,
        }
    }

    fn neg(&self) -> Self {
        Self {
            x: self.x.clone(),
            y: self.y.red_neg(),
            z: self.z.clone(),
        }
    }

    fn to_affine(&self) -> AffinePoint {
        let Some(z_inv) = self.z.red_invm() else {
            return AffinePoint::infinity();
        };
        let z_inv2 = z_inv.red_sqr();
        let z_inv3 = z_inv2.red_mul(&z_inv);
        AffinePoint::from_field_unchecked(self.x.red_mul(&z_inv2), self.y.red_mul(&z_inv3))
    }

    fn to_jacobian(&self) -> JacobianPoint {
        self.clone()
    }
}

impl PartialEq for JacobianPoint {
    fn eq(&self, other: &Self) -> bool {
        if self.is_infinity() && other.is_infinity() {
            return true;
        }
        if self.is_infinity() || other.is_infinity() {
            return false;
        }

        // Cross-multiply: X1*Z2² = X2*Z1² and Y1*Z2³ = Y2*Z1³
        let z1_2 = self.z.red_sqr();
        let z2_2 = other.z.red_sqr();
        let z1_3 = z1_2.red_mul(&self.z);
        let z2_3 = z2_2.red_mul(&other.z);

        self.x.red_mul(&z2_2) == other.x.red_mul(&z1_2)
            && self.y.red_mul(&z2_3) == other.y.red_mul(&z1_3)
    }
}

impl Eq for JacobianPoint {}

impl fmt::Debug for JacobianPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.to_affine(), f)
    }
}

/// A point in either coordinate system.
#[derive(Clone, Debug)]
pub enum Point {
    Affine(AffinePoint),
    Jacobian(JacobianPoint),
}

impl Point {
    /// Scalar multiplication; the result is affine.
    pub fn mul(&self, k: &BigInt) -> Self {
        match self {
            Point::Affine(p) => Point::Affine(p.mul(k)),
            Point::Jacobian(p) => Point::Affine(p.to_affine().mul(k)),
        }
    }
}

impl CurvePoint for Point {
    fn is_infinity(&self) -> bool {
        match self {
            Point::Affine(p) => p.is_infinity(),
            Point::Jacobian(p) => p.is_infinity(),
        }
    }

    /// Mixed sums stay Jacobian.
    fn add(&self, other: &Self) -> Self {
        match (self, other) {
            (Point::Affine(a), Point::Affine(b)) => Point::Affine(a.add(b)),
            (Point::Jacobian(a), Point::Affine(b)) | (Point::Affine(b), Point::Jacobian(a)) => {
                Point::Jacobian(a.mixed_add(b))
            }
            (Point::Jacobian(a), Point::Jacobian(b)) => Point::Jacobian(a.add(b)),
        }
    }

    fn dbl(&self) -> Self {
        match self {
            Point::Affine(p) => Point::Affine(p.dbl()),
            Point::Jacobian(p) => Point::Jacobian(p.dbl()),
        }
    }

    fn neg(&self) -> Self {
        match self {
            Point::Affine(p) => Point::Affine(p.neg()),
            Point::Jacobian(p) => Point::Jacobian(p.neg()),
        }
    }

    fn to_affine(&self) -> AffinePoint {
        match self {
            Point::Affine(p) => p.clone(),
            Point::Jacobian(p) => p.to_affine(),
        }
    }

    fn to_jacobian(&self) -> JacobianPoint {
        match self {
            Point::Affine(p) => p.to_jacobian(),
            Point::Jacobian(p) => p.clone(),
        }
    }
}

impl PartialEq for Point {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Point::Jacobian(a), Point::Jacobian(b)) => a == b,
            _ => self.to_affine() == other.to_affine(),
        }
    }
}

impl Eq for Point {}

impl From<AffinePoint> for Point {
    fn from(p: AffinePoint) -> Self {
        Point::Affine(p)
    }
}

impl From<JacobianPoint> for Point {
    fn from(p: JacobianPoint) -> Self {
        Point::Jacobian(p)
    }
}
