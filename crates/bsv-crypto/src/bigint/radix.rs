//! Text and byte conversions for `BigInt`.

#![forbid(unsafe_code)]

use std::fmt;
use std::str::FromStr;

use bsv_core::{Error, Result};

use super::{arith, BigInt, LIMB_BITS, LIMB_MASK};
use crate::{base58, base64};

/// Digits per chunk and radix^digits, the largest power of `radix` that fits
/// one limb. Conversions process one chunk per multiply/divide.
fn chunk(radix: u32) -> (usize, u32) {
    let mut digits = 1;
    let mut power = radix;
    while (power as u64) * (radix as u64) <= LIMB_MASK as u64 + 1 {
        power *= radix;
        digits += 1;
    }
    (digits, power)
}

fn check_radix(radix: u32) -> Result<()> {
    if (2..=36).contains(&radix) {
        Ok(())
    } else {
        Err(Error::InvalidRadix(radix))
    }
}

impl BigInt {
    /// Parse a signed integer in any radix from 2 to 36. A single leading
    /// `-` marks a negative value; digits are case-insensitive.
    pub fn from_str_radix(s: &str, radix: u32) -> Result<Self> {
        check_radix(radix)?;
        let (negative, digits) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s),
        };
        if digits.is_empty() {
            return Err(Error::InvalidEncoding("empty number string".into()));
        }

        let (chunk_digits, chunk_power) = chunk(radix);
        let chars: Vec<char> = digits.chars().collect();
        let mut words: Vec<u32> = Vec::new();

        // The first chunk takes the remainder so every later chunk is full.
        let first = match chars.len() % chunk_digits {
            0 => chunk_digits,
            r => r,
        };
        let mut start = 0;
        let mut len = first;
        while start < chars.len() {
            let mut value = 0u32;
            for &ch in &chars[start..start + len] {
                let d = ch.to_digit(radix).ok_or(Error::InvalidCharacter { ch, radix })?;
                value = value * radix + d;
            }
            let scale = if start == 0 { 1 } else { chunk_power };
            words = arith::add_small(&arith::mul_small(&words, scale), value);
            start += len;
            len = chunk_digits;
        }

        Ok(Self::from_parts(negative, words))
    }

    /// Render in any radix from 2 to 36 with lowercase digits.
    ///
    /// # Panics
    /// If `radix` is outside 2..=36.
    pub fn to_str_radix(&self, radix: u32) -> String {
        assert!((2..=36).contains(&radix), "radix must be in 2..=36");
        if self.is_zero() {
            return "0".to_string();
        }

        let (chunk_digits, chunk_power) = chunk(radix);
        let mut chunks = Vec::new();
        let mut rest = self.words.clone();
        while !rest.is_empty() {
            let (q, r) = arith::div_small(&rest, chunk_power);
            chunks.push(r);
            rest = q;
        }

        let mut out = String::new();
        if self.negative {
            out.push('-');
        }
        for (i, &c) in chunks.iter().rev().enumerate() {
            let mut digits = Vec::with_capacity(chunk_digits);
            let mut v = c;
            while v != 0 {
                digits.push(std::char::from_digit(v % radix, radix).unwrap_or('?'));
                v /= radix;
            }
            // Inner chunks are zero-padded to full width.
            if i != 0 {
                while digits.len() < chunk_digits {
                    digits.push('0');
                }
            }
            out.extend(digits.iter().rev());
        }
        out
    }

    pub fn from_hex(s: &str) -> Result<Self> {
        Self::from_str_radix(s, 16)
    }

    /// Lowercase hex without padding; zero renders as `"0"`.
    pub fn to_hex(&self) -> String {
        self.to_str_radix(16)
    }

    /// Magnitude from big-endian bytes.
    pub fn from_bytes_be(bytes: &[u8]) -> Self {
        let mut words = Vec::with_capacity(bytes.len() * 8 / LIMB_BITS + 1);
        let mut acc = 0u64;
        let mut bits = 0;
        for &b in bytes.iter().rev() {
            acc |= (b as u64) << bits;
            bits += 8;
            if bits >= LIMB_BITS {
                words.push((acc as u32) & LIMB_MASK);
                acc >>= LIMB_BITS;
                bits -= LIMB_BITS;
            }
        }
        if bits > 0 {
            words.push(acc as u32);
        }
        Self::from_parts(false, words)
    }

    /// Magnitude from little-endian 64-bit limbs, the layout used for the
    /// curve constants.
    pub fn from_u64_limbs(limbs: &[u64]) -> Self {
        let bytes: Vec<u8> = limbs.iter().flat_map(|l| l.to_le_bytes()).collect();
        Self::from_bytes_le(&bytes)
    }

    /// Magnitude from little-endian bytes.
    pub fn from_bytes_le(bytes: &[u8]) -> Self {
        let reversed: Vec<u8> = bytes.iter().rev().copied().collect();
        Self::from_bytes_be(&reversed)
    }

    /// Minimal little-endian magnitude bytes; zero encodes as `[0]`.
    pub fn to_bytes_le(&self) -> Vec<u8> {
        let len = self.byte_length().max(1);
        let mut out = Vec::with_capacity(len);
        let mut acc = 0u64;
        let mut bits = 0;
        for &w in &self.words {
            acc |= (w as u64) << bits;
            bits += LIMB_BITS;
            while bits >= 8 {
                out.push(acc as u8);
                acc >>= 8;
                bits -= 8;
            }
        }
        if bits > 0 {
            out.push(acc as u8);
        }
        out.resize(len, 0);
        out
    }

    /// Minimal big-endian magnitude bytes; zero encodes as `[0]`.
    pub fn to_bytes_be(&self) -> Vec<u8> {
        let mut out = self.to_bytes_le();
        out.reverse();
        out
    }

    /// Big-endian magnitude left-padded to `len` bytes.
    pub fn to_bytes_be_padded(&self, len: usize) -> Result<Vec<u8>> {
        let bytes = self.to_bytes_be();
        if self.byte_length() > len {
            return Err(Error::OutOfRange(format!(
                "{} bytes do not fit in {len}",
                self.byte_length()
            )));
        }
        let mut out = vec![0u8; len];
        let skip = bytes.len().saturating_sub(len);
        out[len - (bytes.len() - skip)..].copy_from_slice(&bytes[skip..]);
        Ok(out)
    }

    /// Fixed-width big-endian export for values known to fit, such as
    /// reduced field elements and scalars.
    pub(crate) fn to_be_fixed<const N: usize>(&self) -> [u8; N] {
        debug_assert!(self.byte_length() <= N, "value wider than {N} bytes");
        let le = self.to_bytes_le();
        let mut out = [0u8; N];
        for (i, b) in le.iter().take(N).enumerate() {
            out[N - 1 - i] = *b;
        }
        out
    }

    /// Decode base58 (Bitcoin alphabet) into a magnitude.
    pub fn from_base58(s: &str) -> Result<Self> {
        Ok(Self::from_bytes_be(&base58::decode(s)?))
    }

    /// Base58 (Bitcoin alphabet) of the big-endian magnitude.
    pub fn to_base58(&self) -> String {
        base58::encode(&self.to_bytes_be())
    }

    /// Decode standard base64 into a magnitude.
    pub fn from_base64(s: &str) -> Result<Self> {
        Ok(Self::from_bytes_be(&base64::decode(s)?))
    }

    /// Standard padded base64 of the big-endian magnitude.
    pub fn to_base64(&self) -> String {
        base64::encode(&self.to_bytes_be())
    }
}

impl FromStr for BigInt {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_str_radix(s, 10)
    }
}

impl fmt::Display for BigInt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad_integral(!self.is_neg(), "", &self.abs().to_str_radix(10))
    }
}

impl fmt::LowerHex for BigInt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad_integral(!self.is_neg(), "0x", &self.abs().to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decimal_round_trip() {
        let s = "-115792089237316195423570985008687907852837564279074904382605163141518161494337";
        let n: BigInt = s.parse().unwrap();
        assert!(n.is_neg());
        assert_eq!(n.to_string(), s);
    }

    #[test]
    fn test_hex() {
        let n = BigInt::from_hex("FFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFEBAAEDCE6AF48A03BBFD25E8CD0364141").unwrap();
        assert_eq!(
            n.to_hex(),
            "fffffffffffffffffffffffffffffffebaaedce6af48a03bbfd25e8cd0364141"
        );
        assert_eq!(format!("{:x}", BigInt::from(255u32)), "ff");
        assert_eq!(BigInt::zero().to_hex(), "0");
        // inner chunks keep their zero padding
        assert_eq!(BigInt::from_hex("1000000000001").unwrap().to_hex(), "1000000000001");
    }

    #[test]
    fn test_other_radixes() {
        let n = BigInt::from(123_456_789u32);
        for radix in 2..=36 {
            let s = n.to_str_radix(radix);
            assert_eq!(BigInt::from_str_radix(&s, radix).unwrap(), n, "radix {radix}");
        }
        assert_eq!(BigInt::from(35u32).to_str_radix(36), "z");
        assert_eq!(BigInt::from_str_radix("-101", 2).unwrap(), BigInt::from(-5i32));
    }

    #[test]
    fn test_invalid_input() {
        assert_eq!(
            BigInt::from_str_radix("12z4", 10),
            Err(Error::InvalidCharacter { ch: 'z', radix: 10 })
        );
        assert_eq!(
            BigInt::from_hex("0xff"),
            Err(Error::InvalidCharacter { ch: 'x', radix: 16 })
        );
        assert_eq!(BigInt::from_str_radix("1", 37), Err(Error::InvalidRadix(37)));
        assert!(matches!(BigInt::from_str_radix("-", 10), Err(Error::InvalidEncoding(_))));
    }

    #[test]
    fn test_bytes() {
        let bytes = hex::decode("0102030405060708090a0b0c0d0e0f").unwrap();
        let n = BigInt::from_bytes_be(&bytes);
        assert_eq!(n.to_hex(), "102030405060708090a0b0c0d0e0f");
        assert_eq!(n.to_bytes_be(), bytes);
        let mut le = bytes.clone();
        le.reverse();
        assert_eq!(n.to_bytes_le(), le);
        assert_eq!(BigInt::from_bytes_le(&le), n);
        assert_eq!(BigInt::zero().to_bytes_be(), vec![0]);
        assert_eq!(BigInt::from_bytes_be(&[0, 0, 1]), BigInt::one());
        assert_eq!(
            BigInt::from_u64_limbs(&[0x0123_4567_89ab_cdef, 0x1]).to_hex(),
            "10123456789abcdef"
        );
    }

    #[test]
    fn test_padded_bytes() {
        let n = BigInt::from(0x0102u32);
        assert_eq!(n.to_bytes_be_padded(4).unwrap(), vec![0, 0, 1, 2]);
        assert!(matches!(n.to_bytes_be_padded(1), Err(Error::OutOfRange(_))));
        assert_eq!(BigInt::zero().to_bytes_be_padded(2).unwrap(), vec![0, 0]);
        assert_eq!(n.to_be_fixed::<3>(), [0, 1, 2]);
    }

    #[test]
    fn test_base58_and_base64() {
        let n = BigInt::from_hex("00010966776006953d5567439e5e39f86a0d273bee").unwrap();
        let b58 = n.to_base58();
        assert_eq!(BigInt::from_base58(&b58).unwrap(), n);
        assert_eq!(BigInt::from(0x0666u32).to_base64(), "BmY=");
        assert_eq!(BigInt::from_base64("BmY=").unwrap(), BigInt::from(0x0666u32));
    }
}
