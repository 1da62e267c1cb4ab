//! Magnitude kernels over little-endian base-2^26 limbs.
//!
//! Every function here takes and returns trimmed limb vectors (no zero limb at
//! the most-significant end). Signs are handled one level up in `BigInt`.

#![forbid(unsafe_code)]

use std::cmp::Ordering;

use super::{LIMB_BITS, LIMB_MASK};

/// Operands up to this many limbs use column-wise (comba) multiplication.
/// Column sums stay below 2^63 well past this size; the bound keeps the
/// working set in cache.
const COMBA_LIMIT: usize = 64;

const MASK: u64 = LIMB_MASK as u64;

/// Drop most-significant zero limbs.
pub(crate) fn trim(mut v: Vec<u32>) -> Vec<u32> {
    while v.last() == Some(&0) {
        v.pop();
    }
    v
}

/// Bit length of a single limb value.
pub(crate) fn limb_bits(w: u32) -> usize {
    32 - w.leading_zeros() as usize
}

/// Compare two magnitudes.
pub(crate) fn cmp(a: &[u32], b: &[u32]) -> Ordering {
    if a.len() != b.len() {
        return a.len().cmp(&b.len());
    }
    for i in (0..a.len()).rev() {
        match a[i].cmp(&b[i]) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    Ordering::Equal
}

/// a + b
pub(crate) fn add(a: &[u32], b: &[u32]) -> Vec<u32> {
    let (long, short) = if a.len() >= b.len() { (a, b) } else { (b, a) };
    let mut out = Vec::with_capacity(long.len() + 1);
    let mut carry = 0u32;
    for i in 0..long.len() {
        let s = long[i] + short.get(i).copied().unwrap_or(0) + carry;
        out.push(s & LIMB_MASK);
        carry = s >> LIMB_BITS;
    }
    if carry != 0 {
        out.push(carry);
    }
    out
}

/// a - b, requires a >= b.
pub(crate) fn sub(a: &[u32], b: &[u32]) -> Vec<u32> {
    debug_assert!(cmp(a, b) != Ordering::Less, "magnitude underflow");
    let mut out = Vec::with_capacity(a.len());
    let mut borrow = 0i64;
    for i in 0..a.len() {
        let t = a[i] as i64 - b.get(i).copied().unwrap_or(0) as i64 - borrow;
        if t < 0 {
            out.push((t + (1 << LIMB_BITS)) as u32);
            borrow = 1;
        } else {
            out.push(t as u32);
            borrow = 0;
        }
    }
    trim(out)
}

/// a + s for a small addend.
pub(crate) fn add_small(a: &[u32], s: u32) -> Vec<u32> {
    let mut out = a.to_vec();
    let mut carry = s as u64;
    let mut i = 0;
    while carry != 0 {
        if i == out.len() {
            out.push(0);
        }
        let t = out[i] as u64 + carry;
        out[i] = (t & MASK) as u32;
        carry = t >> LIMB_BITS;
        i += 1;
    }
    out
}

/// a - s for a small subtrahend, requires a >= s.
pub(crate) fn sub_small(a: &[u32], s: u32) -> Vec<u32> {
    let mut out = a.to_vec();
    let mut borrow = s as i64;
    let mut i = 0;
    while borrow != 0 {
        debug_assert!(i < out.len(), "magnitude underflow");
        let t = out[i] as i64 - borrow;
        if t < 0 {
            // t >= -2^32, so at most a few limbs of borrow
            let limbs = (-t + MASK as i64) >> LIMB_BITS;
            out[i] = (t + (limbs << LIMB_BITS)) as u32;
            borrow = limbs;
        } else {
            out[i] = t as u32;
            borrow = 0;
        }
        i += 1;
    }
    trim(out)
}

/// a * m for a single-word multiplier.
pub(crate) fn mul_small(a: &[u32], m: u32) -> Vec<u32> {
    if m == 0 || a.is_empty() {
        return Vec::new();
    }
    let mut out = Vec::with_capacity(a.len() + 2);
    let mut carry = 0u64;
    for &w in a {
        let t = w as u64 * m as u64 + carry;
        out.push((t & MASK) as u32);
        carry = t >> LIMB_BITS;
    }
    while carry != 0 {
        out.push((carry & MASK) as u32);
        carry >>= LIMB_BITS;
    }
    out
}

/// a * b, dispatching on operand size.
pub(crate) fn mul(a: &[u32], b: &[u32]) -> Vec<u32> {
    if a.is_empty() || b.is_empty() {
        return Vec::new();
    }
    if a.len() == 1 {
        return mul_small(b, a[0]);
    }
    if b.len() == 1 {
        return mul_small(a, b[0]);
    }
    if a.len() <= COMBA_LIMIT && b.len() <= COMBA_LIMIT {
        mul_comba(a, b)
    } else {
        mul_schoolbook(a, b)
    }
}

/// Column-wise product: each output limb is the sum of one anti-diagonal.
fn mul_comba(a: &[u32], b: &[u32]) -> Vec<u32> {
    let len = a.len() + b.len();
    let mut out = Vec::with_capacity(len);
    let mut carry = 0u64;
    for k in 0..len - 1 {
        let lo = k.saturating_sub(b.len() - 1);
        let hi = k.min(a.len() - 1);
        let mut col = carry;
        for i in lo..=hi {
            col += a[i] as u64 * b[k - i] as u64;
        }
        out.push((col & MASK) as u32);
        carry = col >> LIMB_BITS;
    }
    out.push(carry as u32);
    trim(out)
}

/// Row-wise product for large operands.
fn mul_schoolbook(a: &[u32], b: &[u32]) -> Vec<u32> {
    let mut out = vec![0u32; a.len() + b.len()];
    for (i, &x) in a.iter().enumerate() {
        if x == 0 {
            continue;
        }
        let mut carry = 0u64;
        for (j, &y) in b.iter().enumerate() {
            let t = out[i + j] as u64 + x as u64 * y as u64 + carry;
            out[i + j] = (t & MASK) as u32;
            carry = t >> LIMB_BITS;
        }
        let mut k = i + b.len();
        while carry != 0 {
            let t = out[k] as u64 + carry;
            out[k] = (t & MASK) as u32;
            carry = t >> LIMB_BITS;
            k += 1;
        }
    }
    trim(out)
}

/// a^2. Cross products are computed once and doubled.
pub(crate) fn sqr(a: &[u32]) -> Vec<u32> {
    if a.is_empty() {
        return Vec::new();
    }
    if a.len() > COMBA_LIMIT {
        return mul_schoolbook(a, a);
    }
    let len = 2 * a.len();
    let mut out = Vec::with_capacity(len);
    let mut carry = 0u64;
    for k in 0..len - 1 {
        let lo = k.saturating_sub(a.len() - 1);
        let hi = k.min(a.len() - 1);
        let mut cross = 0u64;
        let mut i = lo;
        let mut j = hi;
        while i < j {
            cross += a[i] as u64 * a[j] as u64;
            i += 1;
            j -= 1;
        }
        let mut col = carry + 2 * cross;
        if i == j {
            col += a[i] as u64 * a[i] as u64;
        }
        out.push((col & MASK) as u32);
        carry = col >> LIMB_BITS;
    }
    out.push(carry as u32);
    trim(out)
}

/// Shift left by `bits`.
pub(crate) fn shl(a: &[u32], bits: usize) -> Vec<u32> {
    if a.is_empty() {
        return Vec::new();
    }
    let words = bits / LIMB_BITS;
    let r = bits % LIMB_BITS;
    let mut out = vec![0u32; words];
    out.reserve(a.len() + 1);
    if r == 0 {
        out.extend_from_slice(a);
        return out;
    }
    let mut carry = 0u32;
    for &w in a {
        let t = ((w as u64) << r) | carry as u64;
        out.push((t & MASK) as u32);
        carry = (t >> LIMB_BITS) as u32;
    }
    if carry != 0 {
        out.push(carry);
    }
    out
}

/// Shift right by `bits`, discarding the shifted-out bits.
pub(crate) fn shr(a: &[u32], bits: usize) -> Vec<u32> {
    let words = bits / LIMB_BITS;
    if words >= a.len() {
        return Vec::new();
    }
    let r = bits % LIMB_BITS;
    let src = &a[words..];
    if r == 0 {
        return src.to_vec();
    }
    let mut out = Vec::with_capacity(src.len());
    for i in 0..src.len() {
        let hi = src.get(i + 1).copied().unwrap_or(0) as u64;
        let t = ((src[i] as u64) >> r) | (hi << (LIMB_BITS - r));
        out.push((t & MASK) as u32);
    }
    trim(out)
}

/// Divide by a single word, returning (quotient, remainder).
pub(crate) fn div_small(a: &[u32], d: u32) -> (Vec<u32>, u32) {
    assert!(d != 0, "division by zero");
    let mut q = vec![0u32; a.len()];
    let mut rem = 0u64;
    for i in (0..a.len()).rev() {
        let cur = (rem << LIMB_BITS) | a[i] as u64;
        q[i] = (cur / d as u64) as u32;
        rem = cur % d as u64;
    }
    (trim(q), rem as u32)
}

/// Long division (Knuth, TAOCP vol. 2, algorithm D).
pub(crate) fn div_rem(a: &[u32], b: &[u32]) -> (Vec<u32>, Vec<u32>) {
    assert!(!b.is_empty(), "division by zero");
    if cmp(a, b) == Ordering::Less {
        return (Vec::new(), a.to_vec());
    }
    if b.len() == 1 {
        let (q, r) = div_small(a, b[0]);
        return (q, trim(vec![r]));
    }

    // Normalize so the divisor's top limb has its high bit set.
    let s = LIMB_BITS - limb_bits(b[b.len() - 1]);
    let v = shl(b, s);
    debug_assert_eq!(v.len(), b.len());
    let mut u = shl(a, s);
    u.resize(a.len() + 1, 0);

    let n = v.len();
    let m = u.len() - n;
    let mut q = vec![0u32; m];
    let vt = v[n - 1] as u64;
    let vt2 = v[n - 2] as u64;

    for j in (0..m).rev() {
        let num = ((u[j + n] as u64) << LIMB_BITS) | u[j + n - 1] as u64;
        let mut qhat = num / vt;
        let mut rhat = num % vt;
        while qhat > MASK || qhat * vt2 > ((rhat << LIMB_BITS) | u[j + n - 2] as u64) {
            qhat -= 1;
            rhat += vt;
            if rhat > MASK {
                break;
            }
        }

        // u[j..j+n+1] -= qhat * v
        let mut borrow = 0i64;
        let mut carry = 0u64;
        for i in 0..n {
            let p = qhat * v[i] as u64 + carry;
            carry = p >> LIMB_BITS;
            let t = u[i + j] as i64 - borrow - (p & MASK) as i64;
            u[i + j] = (t & MASK as i64) as u32;
            borrow = (t < 0) as i64;
        }
        let t = u[j + n] as i64 - borrow - carry as i64;
        u[j + n] = (t & MASK as i64) as u32;

        if t < 0 {
            // qhat was one too large: add the divisor back
            qhat -= 1;
            let mut c = 0u64;
            for i in 0..n {
                let s = u[i + j] as u64 + v[i] as u64 + c;
                u[i + j] = (s & MASK) as u32;
                c = s >> LIMB_BITS;
            }
            u[j + n] = ((u[j + n] as u64 + c) & MASK) as u32;
        }
        q[j] = qhat as u32;
    }

    let r = shr(&trim(u[..n].to_vec()), s);
    (trim(q), r)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limbs(v: u128) -> Vec<u32> {
        let mut out = Vec::new();
        let mut v = v;
        while v != 0 {
            out.push((v & MASK as u128) as u32);
            v >>= LIMB_BITS;
        }
        out
    }

    fn value(a: &[u32]) -> u128 {
        a.iter()
            .rev()
            .fold(0u128, |acc, &w| (acc << LIMB_BITS) | w as u128)
    }

    #[test]
    fn test_add_sub() {
        let a = limbs(0x1234_5678_9abc_def0_1122_3344);
        let b = limbs(0xffff_ffff_ffff);
        assert_eq!(value(&add(&a, &b)), 0x1234_5678_9abc_def0_1122_3344 + 0xffff_ffff_ffff);
        assert_eq!(value(&sub(&a, &b)), 0x1234_5678_9abc_def0_1122_3344 - 0xffff_ffff_ffff);
        assert!(sub(&a, &a).is_empty());
    }

    #[test]
    fn test_small_ops() {
        let a = limbs(1 << 52);
        assert_eq!(value(&sub_small(&a, 1)), (1 << 52) - 1);
        assert_eq!(value(&add_small(&limbs((1 << 52) - 1), 1)), 1 << 52);
        assert_eq!(value(&mul_small(&a, 0xffff_ffff)), (1u128 << 52) * 0xffff_ffff);
        let (q, r) = div_small(&limbs(1_000_000_007 * 97 + 5), 97);
        assert_eq!((value(&q), r), (1_000_000_007, 5));
    }

    #[test]
    fn test_mul_paths_agree() {
        let a: Vec<u32> = (1..80u32).map(|i| (i * 7919) & LIMB_MASK).collect();
        let b: Vec<u32> = (1..70u32).map(|i| (i * 104_729) & LIMB_MASK).collect();
        assert_eq!(mul_comba(&a[..30], &b[..20]), mul_schoolbook(&a[..30], &b[..20]));
        assert_eq!(sqr(&a[..40]), mul_schoolbook(&a[..40], &a[..40]));
        assert_eq!(sqr(&a), mul_schoolbook(&a, &a));
        assert_eq!(mul(&a, &b), mul_schoolbook(&a, &b));
    }

    #[test]
    fn test_div_rem_small_values() {
        let a = 0xdead_beef_cafe_babe_1234_5678_9abc_u128;
        let b = 0x1_0000_0001_u128;
        let (q, r) = div_rem(&limbs(a), &limbs(b));
        assert_eq!(value(&q), a / b);
        assert_eq!(value(&r), a % b);
    }

    #[test]
    fn test_div_rem_reconstructs() {
        let a = trim((1..30u32).map(|i| (i * 0x2f_1234) & LIMB_MASK).collect());
        let b: Vec<u32> = vec![LIMB_MASK, 0, 3, 0x155_5555];
        let (q, r) = div_rem(&a, &b);
        assert_eq!(cmp(&r, &b), Ordering::Less);
        assert_eq!(add(&mul(&q, &b), &r), a);
    }

    #[test]
    fn test_shifts() {
        let a = limbs(0x1030301000);
        assert_eq!(value(&shl(&a, 13)), 0x2060602000000);
        assert_eq!(value(&shr(&a, 12)), 0x1030301);
        assert!(shr(&a, 256).is_empty());
    }
}
