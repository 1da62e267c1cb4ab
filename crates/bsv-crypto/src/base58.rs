//! Base58 and base58check with the Bitcoin alphabet (no 0, O, I, l).

#![forbid(unsafe_code)]

use bsv_core::{Error, Result};

use crate::sha256;

/// Checksum bytes appended by base58check.
pub const CHECKSUM_LEN: usize = 4;

/// Base58 alphabet (Bitcoin style).
const ALPHABET: &[u8; 58] = b"123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

/// Encode bytes to Base58 string.
pub fn encode(data: &[u8]) -> String {
    if data.is_empty() {
        return String::new();
    }

    // Count leading zeros
    let leading_zeros = data.iter().take_while(|&&b| b == 0).count();

    // Allocate enough space for result (log(256)/log(58) ≈ 1.37)
    let size = (data.len() * 138 / 100) + 1;
    let mut buf = vec![0u8; size];

    // Convert to base58
    for &byte in data {
        let mut carry = byte as u32;
        for digit in buf.iter_mut().rev() {
            carry += (*digit as u32) * 256;
            *digit = (carry % 58) as u8;
            carry /= 58;
        }
    }

    // Skip leading zeros in result buffer
    let first_non_zero = buf.iter().position(|&b| b != 0).unwrap_or(buf.len());

    // Build result string
    let mut result = String::with_capacity(leading_zeros + buf.len() - first_non_zero);

    // Add '1' for each leading zero byte
    for _ in 0..leading_zeros {
        result.push('1');
    }

    // Add encoded characters
    for &digit in &buf[first_non_zero..] {
        result.push(ALPHABET[digit as usize] as char);
    }

    result
}

/// Decode a base58 string; each leading '1' becomes a zero byte.
pub fn decode(s: &str) -> Result<Vec<u8>> {
    let leading_ones = s.bytes().take_while(|&b| b == b'1').count();

    // log(58)/log(256) ~ 0.733
    let size = s.len() * 733 / 1000 + 1;
    let mut buf = vec![0u8; size];

    for ch in s.chars() {
        let mut carry = ALPHABET
            .iter()
            .position(|&a| a as char == ch)
            .ok_or(Error::InvalidCharacter { ch, radix: 58 })? as u32;
        for byte in buf.iter_mut().rev() {
            carry += (*byte as u32) * 58;
            *byte = (carry & 0xff) as u8;
            carry >>= 8;
        }
    }

    let first_non_zero = buf.iter().position(|&b| b != 0).unwrap_or(buf.len());
    let mut out = vec![0u8; leading_ones];
    out.extend_from_slice(&buf[first_non_zero..]);
    Ok(out)
}

/// Base58 of `payload` followed by the first four bytes of its double SHA-256.
pub fn encode_check(payload: &[u8]) -> String {
    let checksum = sha256::double_digest(payload);
    let mut data = Vec::with_capacity(payload.len() + CHECKSUM_LEN);
    data.extend_from_slice(payload);
    data.extend_from_slice(&checksum[..CHECKSUM_LEN]);
    encode(&data)
}

/// Decode base58check, verifying and stripping the checksum.
pub fn decode_check(s: &str) -> Result<Vec<u8>> {
    let mut data = decode(s)?;
    if data.len() < CHECKSUM_LEN {
        return Err(Error::InvalidEncoding(format!(
            "base58check payload of {} bytes is shorter than its checksum",
            data.len()
        )));
    }
    let split = data.len() - CHECKSUM_LEN;
    let checksum = sha256::double_digest(&data[..split]);
    if checksum[..CHECKSUM_LEN] != data[split..] {
        return Err(Error::InvalidChecksum);
    }
    data.truncate(split);
    Ok(data)
}
