//! Modular reduction contexts.
//!
//! A [`ReductionContext`] owns a modulus and a reduction strategy. Values
//! reduced into it are [`RedBigInt`]s, which borrow the context they belong
//! to, so a reduced value cannot outlive its modulus or be confused with a
//! plain integer without an explicit [`RedBigInt::from_red`].
//!
//! The secp256k1 prime p = 2^256 - 2^32 - 977 reduces with the sparse-prime
//! identity 2^256 = 2^32 + 977 (mod p). Every other modulus uses Barrett
//! reduction.

#![forbid(unsafe_code)]

use std::fmt;

use crate::bigint::BigInt;

/// 2^256 - p for the secp256k1 field prime.
const K256_C: u64 = 0x1_0000_03D1;

#[derive(Clone, Debug)]
enum Strategy {
    /// k = bit length of the modulus, mu = floor(4^k / m).
    Barrett { k: usize, mu: BigInt },
    /// p = 2^256 - 2^32 - 977.
    K256,
}

/// A modulus together with its reduction strategy.
#[derive(Clone, Debug)]
pub struct ReductionContext {
    modulus: BigInt,
    strategy: Strategy,
}

impl ReductionContext {
    /// Generic Barrett context for an arbitrary modulus.
    ///
    /// # Panics
    /// If `modulus < 2`.
    pub fn new(modulus: BigInt) -> Self {
        assert!(modulus > BigInt::one(), "modulus must be at least 2");
        let k = modulus.bit_length();
        let mu = BigInt::one().ushl(2 * k).div(&modulus);
        Self {
            modulus,
            strategy: Strategy::Barrett { k, mu },
        }
    }

    /// Context for the secp256k1 field prime with the fast reduction.
    pub fn k256() -> Self {
        let modulus = BigInt::one().ushl(256).sub(&BigInt::from(K256_C));
        Self {
            modulus,
            strategy: Strategy::K256,
        }
    }

    pub fn modulus(&self) -> &BigInt {
        &self.modulus
    }

    /// Project any integer, negative included, into this context.
    pub fn reduce(&self, x: &BigInt) -> RedBigInt<'_> {
        RedBigInt {
            value: self.reduce_raw(x.clone()),
            ctx: self,
        }
    }

    /// Reduce a small constant.
    pub fn small(&self, n: u32) -> RedBigInt<'_> {
        self.reduce(&BigInt::from(n))
    }

    pub fn zero(&self) -> RedBigInt<'_> {
        RedBigInt {
            value: BigInt::zero(),
            ctx: self,
        }
    }

    pub fn one(&self) -> RedBigInt<'_> {
        self.small(1)
    }

    /// Full reduction of `x` into `[0, m)`.
    fn reduce_raw(&self, x: BigInt) -> BigInt {
        if x.is_neg() {
            return x.umod(&self.modulus);
        }
        match &self.strategy {
            Strategy::K256 => self.reduce_k256(x),
            Strategy::Barrett { k, mu } => self.reduce_barrett(x, *k, mu),
        }
    }

    fn reduce_k256(&self, mut x: BigInt) -> BigInt {
        let c = BigInt::from(K256_C);
        while x.bit_length() > 256 {
            let hi = x.ushr(256);
            x = x.maskn(256).add(&hi.mul(&c));
        }
        if x >= self.modulus {
            x = x.sub(&self.modulus);
        }
        x
    }

    fn reduce_barrett(&self, x: BigInt, k: usize, mu: &BigInt) -> BigInt {
        if x.bit_length() > 2 * k {
            return x.umod(&self.modulus);
        }
        let q = x.ushr(k - 1).mul(mu).ushr(k + 1);
        let mut r = x.sub(&q.mul(&self.modulus));
        // q underestimates by at most two
        while r >= self.modulus {
            r = r.sub(&self.modulus);
        }
        r
    }
}

/// An integer in `[0, m)` tagged with the context that produced it.
#[derive(Clone)]
pub struct RedBigInt<'c> {
    value: BigInt,
    ctx: &'c ReductionContext,
}

impl<'c> RedBigInt<'c> {
    /// The context this value belongs to.
    pub fn ctx(&self) -> &'c ReductionContext {
        self.ctx
    }

    /// Borrow the reduced representative.
    pub fn value(&self) -> &BigInt {
        &self.value
    }

    /// Lift back to an ordinary integer.
    pub fn from_red(&self) -> BigInt {
        self.value.clone()
    }

    pub fn is_zero(&self) -> bool {
        self.value.is_zero()
    }

    pub fn is_odd(&self) -> bool {
        self.value.is_odd()
    }

    fn same_ctx(&self, other: &Self) {
        debug_assert!(
            std::ptr::eq(self.ctx, other.ctx),
            "reduced values from different contexts"
        );
    }

    fn wrap(&self, value: BigInt) -> Self {
        Self {
            value,
            ctx: self.ctx,
        }
    }

    pub fn red_add(&self, other: &Self) -> Self {
        self.same_ctx(other);
        let mut v = self.value.add(&other.value);
        if v >= self.ctx.modulus {
            v = v.sub(&self.ctx.modulus);
        }
        self.wrap(v)
    }

    pub fn red_sub(&self, other: &Self) -> Self {
        self.same_ctx(other);
        let mut v = self.value.sub(&other.value);
        if v.is_neg() {
            v = v.add(&self.ctx.modulus);
        }
        self.wrap(v)
    }

    pub fn red_neg(&self) -> Self {
        if self.is_zero() {
            return self.clone();
        }
        self.wrap(self.ctx.modulus.sub(&self.value))
    }

    pub fn red_mul(&self, other: &Self) -> Self {
        self.same_ctx(other);
        self.wrap(self.ctx.reduce_raw(self.value.mul(&other.value)))
    }

    pub fn red_sqr(&self) -> Self {
        self.wrap(self.ctx.reduce_raw(self.value.sqr()))
    }

    /// Multiply by a small constant.
    pub fn red_mul_small(&self, n: u32) -> Self {
        self.wrap(self.ctx.reduce_raw(self.value.mul_small(n)))
    }

    /// `self^exp` for a non-negative exponent, left-to-right sliding window.
    pub fn red_pow(&self, exp: &BigInt) -> Self {
        debug_assert!(!exp.is_neg(), "negative exponent");
        let bits = exp.bit_length();
        if bits == 0 {
            return self.ctx.one();
        }
        let window = match bits {
            0..=8 => 1,
            9..=64 => 3,
            65..=256 => 4,
            _ => 5,
        };

        // Odd powers self^1, self^3, ..., self^(2^window - 1).
        let sq = self.red_sqr();
        let mut table = Vec::with_capacity(1 << (window - 1));
        table.push(self.clone());
        for i in 1..(1 << (window - 1)) {
            let next = table[i - 1].red_mul(&sq);
            table.push(next);
        }

        let mut acc = self.ctx.one();
        let mut i = bits as isize - 1;
        while i >= 0 {
            if !exp.testn(i as usize) {
                acc = acc.red_sqr();
                i -= 1;
                continue;
            }
            let mut j = (i - window as isize + 1).max(0);
            while !exp.testn(j as usize) {
                j += 1;
            }
            let mut digit = 0usize;
            for b in (j..=i).rev() {
                digit = (digit << 1) | usize::from(exp.testn(b as usize));
            }
            for _ in j..=i {
                acc = acc.red_sqr();
            }
            acc = acc.red_mul(&table[digit >> 1]);
            i = j - 1;
        }
        acc
    }

    /// Multiplicative inverse, `None` for values sharing a factor with the
    /// modulus (including zero).
    pub fn red_invm(&self) -> Option<Self> {
        self.value.invm(&self.ctx.modulus).map(|v| self.wrap(v))
    }

    /// A square root for a prime modulus, `None` for non-residues.
    pub fn red_sqrt(&self) -> Option<Self> {
        if self.is_zero() {
            return Some(self.clone());
        }
        let m = &self.ctx.modulus;
        let root = if m.andln(3) == 3 {
            self.red_pow(&m.add_small(1).ushr(2))
        } else {
            self.tonelli_shanks()?
        };
        if root.red_sqr().value == self.value {
            Some(root)
        } else {
            None
        }
    }

    fn tonelli_shanks(&self) -> Option<Self> {
        let ctx = self.ctx;
        let one = ctx.one();
        let p_minus_1 = ctx.modulus.sub_small(1);
        let half = p_minus_1.ushr(1);
        if self.red_pow(&half).value != one.value {
            return None;
        }

        let s = p_minus_1.zero_bits();
        let q = p_minus_1.ushr(s);

        let minus_one = one.red_neg();
        let mut z = 2u32;
        while ctx.small(z).red_pow(&half).value != minus_one.value {
            z += 1;
        }

        let mut c = ctx.small(z).red_pow(&q);
        let mut r = self.red_pow(&q.add_small(1).ushr(1));
        let mut t = self.red_pow(&q);
        let mut m = s;
        while t.value != one.value {
            let mut i = 0;
            let mut t2 = t.clone();
            while t2.value != one.value {
                t2 = t2.red_sqr();
                i += 1;
                if i == m {
                    return None;
                }
            }
            let mut b = c.clone();
            for _ in 0..(m - i - 1) {
                b = b.red_sqr();
            }
            m = i;
            c = b.red_sqr();
            t = t.red_mul(&c);
            r = r.red_mul(&b);
        }
        Some(r)
    }
}

impl PartialEq for RedBigInt<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value && self.ctx.modulus == other.ctx.modulus
    }
}

impl Eq for RedBigInt<'_> {}

impl fmt::Debug for RedBigInt<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RedBigInt({:x})", self.value)
    }
}

impl BigInt {
    /// Reduce into `ctx`.
    pub fn to_red<'c>(&self, ctx: &'c ReductionContext) -> RedBigInt<'c> {
        ctx.reduce(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const N_HEX: &str = "fffffffffffffffffffffffffffffffebaaedce6af48a03bbfd25e8cd0364141";

    fn n_ctx() -> ReductionContext {
        ReductionContext::new(BigInt::from_hex(N_HEX).unwrap())
    }

    fn hex(s: &str) -> BigInt {
        BigInt::from_hex(s).unwrap()
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "different contexts")]
    fn test_mixed_contexts_panic() {
        let k256 = ReductionContext::k256();
        let small = ReductionContext::new(BigInt::from(13u32));
        let _ = k256.small(3).red_add(&small.small(4));
    }

    #[test]
    fn test_p_constant() {
        let ctx = ReductionContext::k256();
        assert_eq!(
            ctx.modulus().to_hex(),
            "fffffffffffffffffffffffffffffffffffffffffffffffffffffffefffffc2f"
        );
        assert!(ctx.reduce(ctx.modulus()).is_zero());
    }

    #[test]
    fn test_reduce_negative_and_wide() {
        let ctx = n_ctx();
        let n = ctx.modulus().clone();
        assert_eq!(ctx.reduce(&BigInt::from(-1i32)).from_red(), n.sub_small(1));
        let wide = n.sqr().mul_small(12345).add_small(7);
        assert_eq!(ctx.reduce(&wide).from_red(), BigInt::from(7u32));
    }

    #[test]
    fn test_barrett_matches_division() {
        let ctx = ReductionContext::new(BigInt::from(1_000_003u32));
        for v in [0u64, 1, 1_000_002, 1_000_003, 999_999_999_999, 1 << 39] {
            let expected = v % 1_000_003;
            assert_eq!(
                ctx.reduce(&BigInt::from(v)).from_red(),
                BigInt::from(expected),
                "v = {v}"
            );
        }
        let n = n_ctx();
        let a = hex("deadbeefcafebabedeadbeefcafebabedeadbeefcafebabedeadbeefcafebabe");
        let b = hex("1234567890abcdef1234567890abcdef1234567890abcdef1234567890abcdef");
        let prod = a.mul(&b);
        assert_eq!(
            a.to_red(&n).red_mul(&b.to_red(&n)).from_red(),
            prod.umod(n.modulus())
        );
    }

    #[test]
    fn test_k256_reduction_matches_division() {
        let ctx = ReductionContext::k256();
        let p = ctx.modulus().clone();
        let a = hex("fffffffffffffffffffffffffffffffffffffffffffffffffffffffeffff0000");
        let prod = a.sqr();
        assert_eq!(a.to_red(&ctx).red_sqr().from_red(), prod.umod(&p));
        let just_over = p.add_small(5);
        assert_eq!(ctx.reduce(&just_over).from_red(), BigInt::from(5u32));
    }

    #[test]
    fn test_add_sub_wrap() {
        let ctx = n_ctx();
        let almost = ctx.reduce(&hex(N_HEX).sub_small(1));
        let two = ctx.small(2);
        assert_eq!(almost.red_add(&two), ctx.one());
        assert_eq!(ctx.one().red_sub(&two), almost);
        assert!(almost.red_add(&almost.red_neg()).is_zero());
        assert!(ctx.zero().red_neg().is_zero());
    }

    #[test]
    fn test_pow_and_inverse() {
        let ctx = ReductionContext::k256();
        let a = ctx.reduce(&hex("deadbeefcafebabedeadbeefcafebabedeadbeefcafebabedeadbeefcafebabe"));
        let inv = a.red_invm().unwrap();
        assert_eq!(a.red_mul(&inv), ctx.one());
        // Fermat: a^(p-2) = a^-1
        assert_eq!(a.red_pow(&ctx.modulus().sub_small(2)), inv);
        assert_eq!(ctx.small(3).red_pow(&BigInt::from(5u32)), ctx.small(243));
        assert_eq!(a.red_pow(&BigInt::zero()), ctx.one());
        assert!(ctx.zero().red_invm().is_none());
    }

    #[test]
    fn test_sqrt_both_branches() {
        // p = 3 mod 4
        let p = ReductionContext::k256();
        let x = p.small(7).red_pow(&BigInt::from(77u32));
        let root = x.red_sqr().red_sqrt().unwrap();
        assert!(root == x || root == x.red_neg());

        // n = 1 mod 4 goes through Tonelli-Shanks
        let n = n_ctx();
        let y = n.reduce(&hex("1234567890abcdef1234567890abcdef"));
        let root = y.red_sqr().red_sqrt().unwrap();
        assert_eq!(root.red_sqr(), y.red_sqr());

        let small = ReductionContext::new(BigInt::from(13u32));
        // 5 is a non-residue mod 13
        assert!(small.small(5).red_sqrt().is_none());
        assert_eq!(small.small(10).red_sqrt().map(|r| r.red_sqr()), Some(small.small(10)));
    }

    #[test]
    fn test_field_against_k256() {
        use k256::elliptic_curve::ff::PrimeField;
        use k256::{FieldBytes, FieldElement as K256Fe};

        fn k256_from_bytes(b: [u8; 32]) -> K256Fe {
            Option::<K256Fe>::from(K256Fe::from_repr(FieldBytes::from(b))).unwrap()
        }

        let ctx = ReductionContext::k256();
        let test_values = [
            "01",
            "02",
            "deadbeefcafebabedeadbeefcafebabedeadbeefcafebabedeadbeefcafebabe",
            "1234567890abcdef1234567890abcdef1234567890abcdef1234567890abcdef",
            "fffffffffffffffffffffffffffffffffffffffffffffffffffffffeffff0000",
        ];

        for hex_a in &test_values {
            for hex_b in &test_values {
                let a = ctx.reduce(&hex(hex_a));
                let b = ctx.reduce(&hex(hex_b));
                let ka = k256_from_bytes(a.value().to_be_fixed::<32>());
                let kb = k256_from_bytes(b.value().to_be_fixed::<32>());

                let k_mul: [u8; 32] = (ka * kb).to_repr().into();
                assert_eq!(a.red_mul(&b).value().to_be_fixed::<32>(), k_mul, "{hex_a} * {hex_b}");

                let k_add: [u8; 32] = (ka + kb).to_repr().into();
                assert_eq!(a.red_add(&b).value().to_be_fixed::<32>(), k_add, "{hex_a} + {hex_b}");

                let k_sub: [u8; 32] = (ka - kb).to_repr().into();
                assert_eq!(a.red_sub(&b).value().to_be_fixed::<32>(), k_sub, "{hex_a} - {hex_b}");
            }
        }
    }

    #[test]
    fn test_scalar_against_k256() {
        use k256::elliptic_curve::ff::{Field, PrimeField};
        use k256::{FieldBytes, Scalar as K256Scalar};

        fn k256_from_bytes(b: [u8; 32]) -> K256Scalar {
            Option::<K256Scalar>::from(K256Scalar::from_repr(FieldBytes::from(b))).unwrap()
        }

        let ctx = n_ctx();
        let test_values = [
            "01",
            "03",
            "deadbeefcafebabedeadbeefcafebabedeadbeefcafebabedeadbeefcafebabe",
            "1234567890abcdef1234567890abcdef1234567890abcdef1234567890abcdef",
            "fffffffffffffffffffffffffffffffebaaedce6af48a03bbfd25e8cd0364140",
        ];

        for hex_a in &test_values {
            for hex_b in &test_values {
                let a = ctx.reduce(&hex(hex_a));
                let b = ctx.reduce(&hex(hex_b));
                let ka = k256_from_bytes(a.value().to_be_fixed::<32>());
                let kb = k256_from_bytes(b.value().to_be_fixed::<32>());

                let k_mul: [u8; 32] = (ka * kb).to_repr().into();
                assert_eq!(a.red_mul(&b).value().to_be_fixed::<32>(), k_mul, "{hex_a} * {hex_b}");

                let k_sub: [u8; 32] = (ka - kb).to_repr().into();
                assert_eq!(a.red_sub(&b).value().to_be_fixed::<32>(), k_sub, "{hex_a} - {hex_b}");

                let k_inv: [u8; 32] = Option::<K256Scalar>::from(ka.invert()).unwrap().to_repr().into();
                assert_eq!(a.red_invm().unwrap().value().to_be_fixed::<32>(), k_inv, "1 / {hex_a}");
            }
        }
    }
}
