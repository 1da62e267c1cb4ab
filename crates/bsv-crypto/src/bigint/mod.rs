//! Arbitrary-precision signed integers.
//!
//! Values are a sign flag plus little-endian base-2^26 limbs. The limb vector
//! is always trimmed, and zero is the empty vector with a positive sign, so
//! every value has exactly one representation and derived equality is exact.
//!
//! Modular arithmetic does not live here; see [`crate::red`].

#![forbid(unsafe_code)]

mod arith;
mod bitwise;
mod radix;
mod script_num;

use std::cmp::Ordering;
use std::fmt;

use bsv_core::{Error, Result};

pub use script_num::Endian;

/// Bits per limb.
pub(crate) const LIMB_BITS: usize = 26;

/// Mask selecting one limb.
pub(crate) const LIMB_MASK: u32 = (1 << LIMB_BITS) - 1;

/// Largest magnitude a 53-bit float carries without rounding.
pub const MAX_SAFE_INTEGER: i64 = (1 << 53) - 1;

/// Arbitrary-precision signed integer.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct BigInt {
    negative: bool,
    words: Vec<u32>,
}

impl BigInt {
    /// Build from a sign and raw limbs, restoring the canonical form.
    pub(crate) fn from_parts(negative: bool, words: Vec<u32>) -> Self {
        let words = arith::trim(words);
        let negative = negative && !words.is_empty();
        Self { negative, words }
    }

    pub(crate) fn words(&self) -> &[u32] {
        &self.words
    }

    /// Zero.
    pub fn zero() -> Self {
        Self::default()
    }

    /// One.
    pub fn one() -> Self {
        Self::from(1u32)
    }

    /// Build from a native integer, rejecting magnitudes a 53-bit float
    /// would round.
    pub fn from_number(n: i64) -> Result<Self> {
        if n.unsigned_abs() > MAX_SAFE_INTEGER as u64 {
            return Err(Error::UnsafeIntegerInput(n));
        }
        let mut v = Self::from(n.unsigned_abs());
        v.negative = n < 0;
        Ok(v)
    }

    /// Convert to a native integer, failing when the value needs more than 53 bits.
    pub fn to_number(&self) -> Result<i64> {
        if self.bit_length() > 53 {
            return Err(Error::PrecisionLoss);
        }
        let mag = self
            .words
            .iter()
            .rev()
            .fold(0i64, |acc, &w| (acc << LIMB_BITS) | w as i64);
        Ok(if self.negative { -mag } else { mag })
    }

    pub fn is_zero(&self) -> bool {
        self.words.is_empty()
    }

    pub fn is_neg(&self) -> bool {
        self.negative
    }

    pub fn is_odd(&self) -> bool {
        self.words.first().map_or(false, |w| w & 1 == 1)
    }

    pub fn is_even(&self) -> bool {
        !self.is_odd()
    }

    /// Number of significant bits in the magnitude.
    pub fn bit_length(&self) -> usize {
        match self.words.last() {
            None => 0,
            Some(&top) => (self.words.len() - 1) * LIMB_BITS + arith::limb_bits(top),
        }
    }

    /// Number of bytes needed for the magnitude.
    pub fn byte_length(&self) -> usize {
        (self.bit_length() + 7) / 8
    }

    /// Count of trailing zero bits (zero for the value zero).
    pub fn zero_bits(&self) -> usize {
        for (i, &w) in self.words.iter().enumerate() {
            if w != 0 {
                return i * LIMB_BITS + w.trailing_zeros() as usize;
            }
        }
        0
    }

    /// Compare magnitudes, ignoring sign.
    pub fn ucmp(&self, other: &Self) -> Ordering {
        arith::cmp(&self.words, &other.words)
    }

    pub fn abs(&self) -> Self {
        Self {
            negative: false,
            words: self.words.clone(),
        }
    }

    /// Signed addition.
    pub fn add(&self, other: &Self) -> Self {
        if self.negative == other.negative {
            return Self::from_parts(self.negative, arith::add(&self.words, &other.words));
        }
        match self.ucmp(other) {
            Ordering::Equal => Self::zero(),
            Ordering::Greater => {
                Self::from_parts(self.negative, arith::sub(&self.words, &other.words))
            }
            Ordering::Less => {
                Self::from_parts(other.negative, arith::sub(&other.words, &self.words))
            }
        }
    }

    /// Signed subtraction.
    pub fn sub(&self, other: &Self) -> Self {
        self.add(&other.neg())
    }

    pub fn neg(&self) -> Self {
        Self::from_parts(!self.negative, self.words.clone())
    }

    /// Signed multiplication.
    pub fn mul(&self, other: &Self) -> Self {
        Self::from_parts(
            self.negative != other.negative,
            arith::mul(&self.words, &other.words),
        )
    }

    /// Square; cheaper than `mul(self, self)`.
    pub fn sqr(&self) -> Self {
        Self::from_parts(false, arith::sqr(&self.words))
    }

    /// Add a small unsigned value.
    pub fn add_small(&self, n: u32) -> Self {
        self.add(&Self::from(n))
    }

    /// Subtract a small unsigned value.
    pub fn sub_small(&self, n: u32) -> Self {
        self.sub(&Self::from(n))
    }

    /// Multiply by a small unsigned value.
    pub fn mul_small(&self, n: u32) -> Self {
        Self::from_parts(self.negative, arith::mul_small(&self.words, n))
    }

    /// Truncating division by a small value: (quotient, remainder magnitude).
    ///
    /// # Panics
    /// If `n` is zero.
    pub fn div_small(&self, n: u32) -> (Self, u32) {
        let (q, r) = arith::div_small(&self.words, n);
        (Self::from_parts(self.negative, q), r)
    }

    /// Truncating division: the quotient rounds toward zero and the remainder
    /// takes the dividend's sign.
    ///
    /// # Panics
    /// If `divisor` is zero.
    pub fn div_rem(&self, divisor: &Self) -> (Self, Self) {
        let (q, r) = arith::div_rem(&self.words, &divisor.words);
        (
            Self::from_parts(self.negative != divisor.negative, q),
            Self::from_parts(self.negative, r),
        )
    }

    /// Like [`div_rem`](Self::div_rem) but returns `None` for a zero divisor.
    pub fn checked_div_rem(&self, divisor: &Self) -> Option<(Self, Self)> {
        if divisor.is_zero() {
            None
        } else {
            Some(self.div_rem(divisor))
        }
    }

    /// Truncating quotient.
    pub fn div(&self, divisor: &Self) -> Self {
        self.div_rem(divisor).0
    }

    /// Truncating remainder (sign of the dividend).
    pub fn rem(&self, divisor: &Self) -> Self {
        self.div_rem(divisor).1
    }

    /// Remainder in `[0, |m|)`.
    pub fn umod(&self, m: &Self) -> Self {
        let r = self.rem(m);
        if r.negative {
            r.add(&m.abs())
        } else {
            r
        }
    }

    /// Quotient rounded to the nearest integer, halves rounding up.
    pub fn div_round(&self, divisor: &Self) -> Self {
        let (q, r) = self.div_rem(divisor);
        if r.is_zero() {
            return q;
        }
        // Work with the remainder as a floor-division remainder in [0, |d|).
        let d = divisor.abs();
        let (floor_q, floor_r) = if self.negative != divisor.negative {
            (q.sub_small(1), d.sub(&r.abs()))
        } else {
            (q, r.abs())
        };
        let twice = floor_r.shl(1);
        match twice.ucmp(&d) {
            Ordering::Less => floor_q,
            _ => floor_q.add_small(1),
        }
    }

    /// `self^exp` by square-and-multiply.
    pub fn pow(&self, exp: u32) -> Self {
        let mut result = Self::one();
        let mut base = self.clone();
        let mut e = exp;
        while e > 0 {
            if e & 1 == 1 {
                result = result.mul(&base);
            }
            e >>= 1;
            if e > 0 {
                base = base.sqr();
            }
        }
        result
    }

    /// Greatest common divisor of the magnitudes.
    pub fn gcd(&self, other: &Self) -> Self {
        let mut a = self.abs();
        let mut b = other.abs();
        while !b.is_zero() {
            let r = a.rem(&b);
            a = b;
            b = r;
        }
        a
    }

    /// Modular inverse in `[0, m)` via the extended Euclidean algorithm.
    /// Returns `None` when `gcd(self, m) != 1` or `m` is zero.
    pub fn invm(&self, m: &Self) -> Option<Self> {
        let m = m.abs();
        if m.is_zero() {
            return None;
        }
        // a = x0 * self (mod m), b = x1 * self (mod m)
        let mut a = self.umod(&m);
        let mut b = m.clone();
        let mut x0 = Self::one();
        let mut x1 = Self::zero();
        while !b.is_zero() {
            let (q, r) = a.div_rem(&b);
            a = b;
            b = r;
            let next = x0.sub(&q.mul(&x1));
            x0 = x1;
            x1 = next;
        }
        if a != Self::one() {
            return None;
        }
        Some(x0.umod(&m))
    }

    /// Low bits of the magnitude selected by `mask` (`mask` < 2^26).
    pub fn andln(&self, mask: u32) -> u32 {
        debug_assert!(mask <= LIMB_MASK);
        self.words.first().copied().unwrap_or(0) & mask
    }

    /// In-place `self += n` for non-negative values.
    pub(crate) fn iaddn(&mut self, n: u32) {
        debug_assert!(!self.negative);
        self.words = arith::add_small(&self.words, n);
    }

    /// In-place `self -= n` for values `>= n`.
    pub(crate) fn isubn(&mut self, n: u32) {
        debug_assert!(!self.negative);
        self.words = arith::sub_small(&self.words, n);
    }

    /// In-place magnitude shift right.
    pub(crate) fn iushrn(&mut self, bits: usize) {
        self.words = arith::shr(&self.words, bits);
        if self.words.is_empty() {
            self.negative = false;
        }
    }
}

impl From<u32> for BigInt {
    fn from(n: u32) -> Self {
        Self::from(n as u64)
    }
}

impl From<u64> for BigInt {
    fn from(n: u64) -> Self {
        let mut words = Vec::with_capacity(3);
        let mut v = n;
        while v != 0 {
            words.push((v as u32) & LIMB_MASK);
            v >>= LIMB_BITS;
        }
        Self {
            negative: false,
            words,
        }
    }
}

impl From<i32> for BigInt {
    fn from(n: i32) -> Self {
        let mut v = Self::from(n.unsigned_abs());
        v.negative = n < 0;
        v
    }
}

impl Ord for BigInt {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.negative, other.negative) {
            (false, true) => Ordering::Greater,
            (true, false) => Ordering::Less,
            (false, false) => self.ucmp(other),
            (true, true) => other.ucmp(self),
        }
    }
}

impl PartialOrd for BigInt {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Debug for BigInt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BigInt({})", self.to_hex())
    }
}

macro_rules! forward_binop {
    ($trait:ident, $method:ident) => {
        impl std::ops::$trait<&BigInt> for &BigInt {
            type Output = BigInt;
            fn $method(self, rhs: &BigInt) -> BigInt {
                BigInt::$method(self, rhs)
            }
        }

        impl std::ops::$trait<BigInt> for BigInt {
            type Output = BigInt;
            fn $method(self, rhs: BigInt) -> BigInt {
                BigInt::$method(&self, &rhs)
            }
        }

        impl std::ops::$trait<&BigInt> for BigInt {
            type Output = BigInt;
            fn $method(self, rhs: &BigInt) -> BigInt {
                BigInt::$method(&self, rhs)
            }
        }
    };
}

forward_binop!(Add, add);
forward_binop!(Sub, sub);
forward_binop!(Mul, mul);
forward_binop!(Div, div);
forward_binop!(Rem, rem);

impl std::ops::Neg for BigInt {
    type Output = BigInt;
    fn neg(self) -> BigInt {
        BigInt::neg(&self)
    }
}

impl std::ops::Neg for &BigInt {
    type Output = BigInt;
    fn neg(self) -> BigInt {
        BigInt::neg(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn big(s: &str) -> BigInt {
        s.parse().unwrap()
    }

    #[test]
    fn test_canonical_zero() {
        let a = big("12345");
        let z = a.sub(&a);
        assert_eq!(z, BigInt::zero());
        assert!(!z.is_neg());
        assert_eq!(BigInt::from(-0i32), BigInt::zero());
        assert_eq!(big("-0"), BigInt::zero());
    }

    #[test]
    fn test_from_number_guard() {
        assert_eq!(BigInt::from_number(MAX_SAFE_INTEGER).unwrap().to_number(), Ok(MAX_SAFE_INTEGER));
        assert_eq!(
            BigInt::from_number(-MAX_SAFE_INTEGER).unwrap().to_number(),
            Ok(-MAX_SAFE_INTEGER)
        );
        assert_eq!(
            BigInt::from_number(MAX_SAFE_INTEGER + 1),
            Err(Error::UnsafeIntegerInput(MAX_SAFE_INTEGER + 1))
        );
        assert_eq!(BigInt::from(1u64 << 53).to_number(), Err(Error::PrecisionLoss));
    }

    #[test]
    fn test_signed_add_sub() {
        assert_eq!(big("-5") + big("3"), big("-2"));
        assert_eq!(big("5") + big("-8"), big("-3"));
        assert_eq!(big("-5") - big("-5"), BigInt::zero());
        assert_eq!(big("-5") - big("7"), big("-12"));
    }

    #[test]
    fn test_mul_sign() {
        assert_eq!(big("-3") * big("4"), big("-12"));
        assert_eq!(big("-3") * big("-4"), big("12"));
        assert_eq!(big("-3") * BigInt::zero(), BigInt::zero());
        assert_eq!(big("-123456789").sqr(), big("15241578750190521"));
    }

    #[test]
    fn test_truncating_division() {
        assert_eq!(big("7").div_rem(&big("2")), (big("3"), big("1")));
        assert_eq!(big("-7").div_rem(&big("2")), (big("-3"), big("-1")));
        assert_eq!(big("7").div_rem(&big("-2")), (big("-3"), big("1")));
        assert_eq!(big("-7").umod(&big("2")), big("1"));
        assert!(big("7").checked_div_rem(&BigInt::zero()).is_none());
    }

    #[test]
    fn test_div_round() {
        assert_eq!(big("7").div_round(&big("2")), big("4"));
        assert_eq!(big("5").div_round(&big("3")), big("2"));
        assert_eq!(big("4").div_round(&big("3")), big("1"));
        assert_eq!(big("-7").div_round(&big("2")), big("-3"));
        assert_eq!(big("-5").div_round(&big("3")), big("-2"));
        assert_eq!(big("6").div_round(&big("3")), big("2"));
    }

    #[test]
    fn test_large_division_identity() {
        let a = BigInt::from_hex("fffffffffffffffffffffffffffffffebaaedce6af48a03bbfd25e8cd0364141ff00ff00ff00")
            .unwrap();
        let b = BigInt::from_hex("1234567890abcdef1234567890abcdef").unwrap();
        let (q, r) = a.div_rem(&b);
        assert!(r < b);
        assert_eq!(q * &b + r, a);
    }

    #[test]
    fn test_pow_gcd_invm() {
        assert_eq!(big("3").pow(5), big("243"));
        assert_eq!(big("2").pow(100).to_hex(), format!("1{}", "0".repeat(25)));
        assert_eq!(big("462").gcd(&big("1071")), big("21"));
        let m = big("1000000007");
        let inv = big("12345").invm(&m).unwrap();
        assert_eq!((inv * big("12345")).umod(&m), BigInt::one());
        assert!(big("6").invm(&big("9")).is_none());
        assert_eq!(big("-3").invm(&big("7")), Some(big("2")));
    }

    #[test]
    fn test_ordering() {
        let mut values = vec![big("5"), big("-10"), BigInt::zero(), big("-2"), big("100")];
        values.sort();
        assert_eq!(
            values,
            vec![big("-10"), big("-2"), BigInt::zero(), big("5"), big("100")]
        );
        assert_eq!(big("-10").ucmp(&big("5")), Ordering::Greater);
    }

    #[test]
    fn test_bit_and_byte_length() {
        assert_eq!(BigInt::zero().bit_length(), 0);
        assert_eq!(big("1").bit_length(), 1);
        assert_eq!(BigInt::from(1u64 << 26).bit_length(), 27);
        assert_eq!(BigInt::from(0xffffu32).byte_length(), 2);
        assert_eq!(BigInt::from(0x10000u32).byte_length(), 3);
        assert_eq!(BigInt::from(0b1011000u32).zero_bits(), 3);
    }
}
