//! Precomputed tables and windowed NAF multiplication.
//!
//! A point carrying a cache (the generator always does) gets two tables the
//! first time it is multiplied:
//!
//! - `doubles`: P, 2^4 P, 2^8 P, ... covering a full scalar, for the
//!   fixed-base method
//! - `naf` / `beta_naf`: odd multiples P, 3P, ..., 15P and their images
//!   under the endomorphism, for GLV
//!
//! Points without a cache build a small Jacobian odd-multiple table per
//! multiplication instead.

#![forbid(unsafe_code)]

use crate::bigint::BigInt;

use super::curve::secp256k1;
use super::point::{AffinePoint, CurvePoint, JacobianPoint};

/// Doublings between consecutive `doubles` entries.
pub const DOUBLES_STEP: usize = 4;

/// wNAF window for cached odd-multiple tables (2^(w-2) = 8 entries).
pub const NAF_WINDOW: usize = 5;

/// Lazily built tables for one point.
#[derive(Debug)]
pub struct Precomputed {
    pub(crate) step: usize,
    pub(crate) doubles: Vec<AffinePoint>,
    pub(crate) naf: Vec<AffinePoint>,
    pub(crate) beta_naf: Vec<AffinePoint>,
}

impl Precomputed {
    pub(crate) fn build(p: &AffinePoint) -> Self {
        let curve = secp256k1();
        let base = p.plain();

        let power = curve.n.bit_length() + 1;
        let mut doubles = Vec::with_capacity(power / DOUBLES_STEP + 2);
        doubles.push(base.clone());
        let mut acc = base.to_jacobian();
        for _ in (0..power).step_by(DOUBLES_STEP) {
            acc = acc.dbl_n(DOUBLES_STEP);
            doubles.push(acc.to_affine());
        }

        let naf: Vec<AffinePoint> = odd_multiples(&base, NAF_WINDOW)
            .iter()
            .map(CurvePoint::to_affine)
            .collect();
        let beta_naf = naf
            .iter()
            .map(|q| AffinePoint::from_field_unchecked(q.x().red_mul(&curve.beta), q.y().clone()))
            .collect();

        tracing::debug!(
            step = DOUBLES_STEP,
            doubles = doubles.len(),
            naf = naf.len(),
            "built point precomputation tables"
        );

        Self {
            step: DOUBLES_STEP,
            doubles,
            naf,
            beta_naf,
        }
    }

    /// Whether the doubling table spans every NAF digit of `k`.
    pub(crate) fn covers(&self, k: &BigInt) -> bool {
        let digits = k.bit_length() + 1;
        self.doubles.len() >= digits.div_ceil(self.step)
    }
}

/// Width-`w` NAF of a non-negative scalar, least significant digit first.
///
/// Every non-zero digit is odd with |d| < 2^(w-1), and any w consecutive
/// digits hold at most one non-zero.
pub fn wnaf(k: &BigInt, w: usize) -> Vec<i32> {
    debug_assert!(!k.is_neg());
    debug_assert!((2..=8).contains(&w));

    let width = 1i32 << w;
    let mask = (width - 1) as u32;
    let mut k = k.clone();
    let mut digits = Vec::with_capacity(k.bit_length() + 1);
    while !k.is_zero() {
        let mut d = 0;
        if k.is_odd() {
            d = k.andln(mask) as i32;
            if d >= width / 2 {
                d -= width;
            }
            if d < 0 {
                k.iaddn(d.unsigned_abs());
            } else {
                k.isubn(d as u32);
            }
        }
        digits.push(d);
        k.iushrn(1);
    }
    digits
}

/// P, 3P, 5P, ..., (2^(w-1) - 1)P in Jacobian coordinates.
pub(crate) fn odd_multiples(p: &AffinePoint, w: usize) -> Vec<JacobianPoint> {
    let count = 1 << (w - 2);
    let mut table = Vec::with_capacity(count);
    table.push(p.to_jacobian());
    let twice = p.to_jacobian().dbl();
    for i in 1..count {
        let next = table[i - 1].add(&twice);
        table.push(next);
    }
    table
}

/// Fixed-base multiplication over the doubling table.
///
/// The NAF of k is cut into `step`-digit windows; window j contributes its
/// signed value times `doubles[j]`. Summing per magnitude from the largest
/// down lets every magnitude reuse the running partial sum.
pub(crate) fn fixed_naf_mul(pre: &Precomputed, k: &BigInt) -> JacobianPoint {
    let naf = wnaf(k, 2);
    let repr: Vec<i32> = naf
        .chunks(pre.step)
        .map(|window| window.iter().rev().fold(0, |acc, &d| acc * 2 + d))
        .collect();

    let max = ((1i32 << (pre.step + 1)) - if pre.step % 2 == 0 { 2 } else { 1 }) / 3;

    let mut a = JacobianPoint::infinity();
    let mut b = JacobianPoint::infinity();
    for i in (1..=max).rev() {
        for (j, &w) in repr.iter().enumerate() {
            if w == i {
                b = b.mixed_add(&pre.doubles[j]);
            } else if w == -i {
                b = b.mixed_add(&pre.doubles[j].neg());
            }
        }
        a = a.add(&b);
    }
    a
}

/// Odd-multiple table backing one wNAF term.
pub(crate) enum Table<'a> {
    Affine(&'a [AffinePoint]),
    Jacobian(Vec<JacobianPoint>),
}

/// One (scalar, point) pair of a multi-scalar sum.
pub(crate) struct WnafTerm<'a> {
    digits: Vec<i32>,
    table: Table<'a>,
}

impl<'a> WnafTerm<'a> {
    /// Negative scalars negate every digit.
    pub(crate) fn new(k: &BigInt, table: Table<'a>, window: usize) -> Self {
        let mut digits = wnaf(&k.abs(), window);
        if k.is_neg() {
            digits.iter_mut().for_each(|d| *d = -*d);
        }
        Self { digits, table }
    }

    fn add_digit(&self, acc: &JacobianPoint, d: i32) -> JacobianPoint {
        let idx = ((d.unsigned_abs() - 1) / 2) as usize;
        match &self.table {
            Table::Affine(t) if d > 0 => acc.mixed_add(&t[idx]),
            Table::Affine(t) => acc.mixed_add(&t[idx].neg()),
            Table::Jacobian(t) if d > 0 => acc.add(&t[idx]),
            Table::Jacobian(t) => acc.add(&t[idx].neg()),
        }
    }
}

/// Sum of k_i * P_i with one shared doubling chain.
pub(crate) fn wnaf_mul_add(terms: &[WnafTerm<'_>]) -> JacobianPoint {
    let len = terms.iter().map(|t| t.digits.len()).max().unwrap_or(0);
    let mut acc = JacobianPoint::infinity();
    for i in (0..len).rev() {
        acc = acc.dbl();
        for term in terms {
            match term.digits.get(i) {
                Some(&d) if d != 0 => acc = term.add_digit(&acc, d),
                _ => {}
            }
        }
    }
    acc
}
