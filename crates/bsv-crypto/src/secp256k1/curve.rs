//! secp256k1 domain parameters and the GLV endomorphism.
//!
//! secp256k1: y² = x³ + 7 over GF(p), p = 2^256 - 2^32 - 977, group order n.
//!
//! The curve, its base field and its scalar field are process-wide values
//! built once on first use and shared by reference afterwards.

#![forbid(unsafe_code)]

use std::sync::OnceLock;

use crate::bigint::BigInt;
use crate::red::{RedBigInt, ReductionContext};

use super::point::AffinePoint;

/// An element of GF(p).
pub type FieldElement = RedBigInt<'static>;

/// Group order n.
const N: [u64; 4] = [
    0xBFD25E8CD0364141,
    0xBAAEDCE6AF48A03B,
    0xFFFFFFFFFFFFFFFE,
    0xFFFFFFFFFFFFFFFF,
];

/// Generator point G (affine x-coordinate).
const GX: [u64; 4] = [
    0x59F2815B16F81798,
    0x029BFCDB2DCE28D9,
    0x55A06295CE870B07,
    0x79BE667EF9DCBBAC,
];

/// Generator point G (affine y-coordinate).
const GY: [u64; 4] = [
    0x9C47D08FFB10D4B8,
    0xFD17B448A6855419,
    0x5DA4FBFC0E1108A8,
    0x483ADA7726A3C465,
];

/// Cube root of unity in GF(p): (x, y) -> (beta * x, y) is multiplication by lambda.
const BETA: [u64; 4] = [
    0xC1396C28719501EE,
    0x9CF0497512F58995,
    0x6E64479EAC3434E9,
    0x7AE96A2B657C0710,
];

/// Cube root of unity mod n matching BETA.
const LAMBDA: [u64; 4] = [
    0xDF02967C1B23BD72,
    0x122E22EA20816678,
    0xA5261C028812645A,
    0x5363AD4CC05C30E0,
];

/// Short lattice basis for splitting scalars: a1 = b2.
const A1: [u64; 2] = [0xE86C90E49284EB15, 0x3086D221A7D46BCD];
/// |b1|; b1 itself is negative.
const MINUS_B1: [u64; 2] = [0x6F547FA90ABFE4C3, 0xE4437ED6010E8828];
const A2: [u64; 3] = [0x57C1108D9D44CFD8, 0x14CA50F7A8E2F3F6, 0x1];

static FIELD: OnceLock<ReductionContext> = OnceLock::new();
static SCALAR: OnceLock<ReductionContext> = OnceLock::new();
static CURVE: OnceLock<Curve> = OnceLock::new();

/// GF(p) with the sparse-prime reduction.
pub fn field() -> &'static ReductionContext {
    FIELD.get_or_init(ReductionContext::k256)
}

/// Integers mod n with Barrett reduction.
pub fn scalar_field() -> &'static ReductionContext {
    SCALAR.get_or_init(|| ReductionContext::new(BigInt::from_u64_limbs(&N)))
}

/// The shared secp256k1 instance.
pub fn secp256k1() -> &'static Curve {
    CURVE.get_or_init(Curve::new)
}

/// One vector of the splitting lattice: a + b * lambda = 0 (mod n).
#[derive(Debug, Clone)]
pub struct Basis {
    pub a: BigInt,
    pub b: BigInt,
}

/// Domain parameters.
#[derive(Debug)]
pub struct Curve {
    pub p: BigInt,
    pub n: BigInt,
    /// floor(n / 2), the low-S bound.
    pub n_half: BigInt,
    pub a: FieldElement,
    pub b: FieldElement,
    pub g: AffinePoint,
    pub beta: FieldElement,
    pub lambda: BigInt,
    pub basis: [Basis; 2],
}

impl Curve {
    fn new() -> Self {
        let fp = field();
        let n = scalar_field().modulus().clone();
        let a1 = BigInt::from_u64_limbs(&A1);

        let g = AffinePoint::from_field_unchecked(
            fp.reduce(&BigInt::from_u64_limbs(&GX)),
            fp.reduce(&BigInt::from_u64_limbs(&GY)),
        )
        .with_precomputation();

        Self {
            p: fp.modulus().clone(),
            n_half: n.ushr(1),
            n,
            a: fp.zero(),
            b: fp.small(7),
            g,
            beta: fp.reduce(&BigInt::from_u64_limbs(&BETA)),
            lambda: BigInt::from_u64_limbs(&LAMBDA),
            basis: [
                Basis {
                    a: a1.clone(),
                    b: BigInt::from_u64_limbs(&MINUS_B1).neg(),
                },
                Basis {
                    a: BigInt::from_u64_limbs(&A2),
                    b: a1,
                },
            ],
        }
    }

    /// The generator.
    pub fn generator(&self) -> &AffinePoint {
        &self.g
    }

    /// Split `k` into (k1, k2) with k1 + k2 * lambda = k (mod n), each about
    /// half the bit length of n, by rounding k onto the lattice basis.
    pub fn endo_split(&self, k: &BigInt) -> (BigInt, BigInt) {
        let [v1, v2] = &self.basis;

        let c1 = v2.b.mul(k).div_round(&self.n);
        let c2 = v1.b.neg().mul(k).div_round(&self.n);

        let p1 = c1.mul(&v1.a);
        let p2 = c2.mul(&v2.a);
        let q1 = c1.mul(&v1.b);
        let q2 = c2.mul(&v2.b);

        let k1 = k.sub(&p1).sub(&p2);
        let k2 = q1.add(&q2).neg();
        (k1, k2)
    }
}
