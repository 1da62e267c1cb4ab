//! Shifts, single-bit access and two's-complement logic.
//!
//! Logical operators treat negative values as infinitely sign-extended
//! two's complement, so `-1 & x == x` and `-2 | 1 == -1`.

#![forbid(unsafe_code)]

use super::{arith, BigInt, LIMB_BITS, LIMB_MASK};

/// `2^bit` as limbs.
fn power_of_two(bit: usize) -> Vec<u32> {
    let mut words = vec![0u32; bit / LIMB_BITS + 1];
    words[bit / LIMB_BITS] = 1 << (bit % LIMB_BITS);
    words
}

#[derive(Clone, Copy)]
enum Logic {
    And,
    Or,
    Xor,
}

impl BigInt {
    /// Signed shift left: the magnitude moves, the sign stays.
    pub fn shl(&self, bits: usize) -> Self {
        Self::from_parts(self.negative, arith::shl(&self.words, bits))
    }

    /// Arithmetic shift right, rounding toward negative infinity like `>>`
    /// on primitive signed integers.
    pub fn shr(&self, bits: usize) -> Self {
        if !self.negative {
            return Self::from_parts(false, arith::shr(&self.words, bits));
        }
        // floor(-m / 2^b) = -(((m - 1) >> b) + 1)
        let m1 = arith::sub_small(&self.words, 1);
        let q = arith::add_small(&arith::shr(&m1, bits), 1);
        Self::from_parts(true, q)
    }

    /// Shift the magnitude left; the result is non-negative.
    pub fn ushl(&self, bits: usize) -> Self {
        Self::from_parts(false, arith::shl(&self.words, bits))
    }

    /// Shift the magnitude right; the result is non-negative.
    pub fn ushr(&self, bits: usize) -> Self {
        Self::from_parts(false, arith::shr(&self.words, bits))
    }

    /// Whether bit `bit` of the magnitude is set.
    pub fn testn(&self, bit: usize) -> bool {
        self.words
            .get(bit / LIMB_BITS)
            .map_or(false, |w| (w >> (bit % LIMB_BITS)) & 1 == 1)
    }

    /// Copy with bit `bit` of the magnitude set or cleared.
    pub fn setn(&self, bit: usize, value: bool) -> Self {
        let idx = bit / LIMB_BITS;
        let mut words = self.words.clone();
        if words.len() <= idx {
            if !value {
                return self.clone();
            }
            words.resize(idx + 1, 0);
        }
        let mask = 1u32 << (bit % LIMB_BITS);
        if value {
            words[idx] |= mask;
        } else {
            words[idx] &= !mask;
        }
        Self::from_parts(self.negative, words)
    }

    /// `self + 2^bit`.
    pub fn bincn(&self, bit: usize) -> Self {
        self.add(&Self::from_parts(false, power_of_two(bit)))
    }

    /// Low `bits` bits of the magnitude.
    pub fn maskn(&self, bits: usize) -> Self {
        let mut out = self.clone();
        out.imaskn(bits);
        out
    }

    /// Keep only the low `bits` bits of the magnitude, in place. The sign is
    /// kept unless the result is zero.
    pub fn imaskn(&mut self, bits: usize) {
        let full = bits / LIMB_BITS;
        let rem = bits % LIMB_BITS;
        if self.words.len() > full {
            self.words.truncate(full + usize::from(rem != 0));
            if rem != 0 {
                self.words[full] &= LIMB_MASK >> (LIMB_BITS - rem);
            }
        }
        let words = std::mem::take(&mut self.words);
        *self = Self::from_parts(self.negative, words);
    }

    /// Flip the low `width` bits of the magnitude; higher bits are dropped.
    pub fn notn(&self, width: usize) -> Self {
        let mask = arith::sub_small(&power_of_two(width), 1);
        let low = self.abs().maskn(width);
        Self::from_parts(false, xor_words(&low.words, &mask))
    }

    /// Two's-complement image in `width` bits: negative values map to
    /// `2^width - |self|`.
    pub fn to_twos(&self, width: usize) -> Self {
        if self.negative {
            Self::from_parts(false, power_of_two(width)).sub(&self.abs())
        } else {
            self.clone()
        }
    }

    /// Inverse of [`to_twos`](Self::to_twos): a set bit `width - 1` marks a
    /// negative value.
    pub fn from_twos(&self, width: usize) -> Self {
        if width > 0 && self.testn(width - 1) {
            self.maskn(width).sub(&Self::from_parts(false, power_of_two(width)))
        } else {
            self.clone()
        }
    }

    pub fn and(&self, other: &Self) -> Self {
        self.logic(other, Logic::And)
    }

    pub fn or(&self, other: &Self) -> Self {
        self.logic(other, Logic::Or)
    }

    pub fn xor(&self, other: &Self) -> Self {
        self.logic(other, Logic::Xor)
    }

    fn logic(&self, other: &Self, op: Logic) -> Self {
        if !self.negative && !other.negative {
            return Self::from_parts(false, apply(&self.words, &other.words, op));
        }
        // One spare bit carries the sign of the wider operand.
        let width = self.bit_length().max(other.bit_length()) + 1;
        let a = self.to_twos(width);
        let b = other.to_twos(width);
        let raw = Self::from_parts(false, apply(&a.words, &b.words, op));
        raw.maskn(width).from_twos(width)
    }
}

fn apply(a: &[u32], b: &[u32], op: Logic) -> Vec<u32> {
    let len = a.len().max(b.len());
    (0..len)
        .map(|i| {
            let x = a.get(i).copied().unwrap_or(0);
            let y = b.get(i).copied().unwrap_or(0);
            match op {
                Logic::And => x & y,
                Logic::Or => x | y,
                Logic::Xor => x ^ y,
            }
        })
        .collect()
}

fn xor_words(a: &[u32], b: &[u32]) -> Vec<u32> {
    apply(a, b, Logic::Xor)
}

macro_rules! forward_logic {
    ($trait:ident, $method:ident, $inherent:ident) => {
        impl std::ops::$trait<&BigInt> for &BigInt {
            type Output = BigInt;
            fn $method(self, rhs: &BigInt) -> BigInt {
                BigInt::$inherent(self, rhs)
            }
        }

        impl std::ops::$trait<BigInt> for BigInt {
            type Output = BigInt;
            fn $method(self, rhs: BigInt) -> BigInt {
                BigInt::$inherent(&self, &rhs)
            }
        }
    };
}

forward_logic!(BitAnd, bitand, and);
forward_logic!(BitOr, bitor, or);
forward_logic!(BitXor, bitxor, xor);

impl std::ops::Shl<usize> for &BigInt {
    type Output = BigInt;
    fn shl(self, bits: usize) -> BigInt {
        BigInt::shl(self, bits)
    }
}

impl std::ops::Shl<usize> for BigInt {
    type Output = BigInt;
    fn shl(self, bits: usize) -> BigInt {
        BigInt::shl(&self, bits)
    }
}

impl std::ops::Shr<usize> for &BigInt {
    type Output = BigInt;
    fn shr(self, bits: usize) -> BigInt {
        BigInt::shr(self, bits)
    }
}

impl std::ops::Shr<usize> for BigInt {
    type Output = BigInt;
    fn shr(self, bits: usize) -> BigInt {
        BigInt::shr(&self, bits)
    }
}
