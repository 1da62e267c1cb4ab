//! Signed-magnitude and script-number byte codecs.
//!
//! Both formats store the absolute value with the sign in the top bit of the
//! most significant byte. Script numbers are the little-endian flavour used
//! by the script interpreter; zero is the empty byte string.

#![forbid(unsafe_code)]

use bsv_core::{Error, Result};

use super::BigInt;

/// Byte order for signed-magnitude encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endian {
    Big,
    Little,
}

impl BigInt {
    /// Decode signed-magnitude bytes. An empty slice decodes to zero.
    pub fn from_sm(bytes: &[u8], endian: Endian) -> Self {
        let mut be = bytes.to_vec();
        if endian == Endian::Little {
            be.reverse();
        }
        let Some(first) = be.first_mut() else {
            return Self::zero();
        };
        let negative = *first & 0x80 != 0;
        *first &= 0x7f;
        let magnitude = Self::from_bytes_be(&be);
        if negative {
            magnitude.neg()
        } else {
            magnitude
        }
    }

    /// Encode as signed-magnitude bytes. Zero encodes as the empty vector;
    /// a padding byte is added when the top bit is needed for the sign.
    pub fn to_sm(&self, endian: Endian) -> Vec<u8> {
        if self.is_zero() {
            return Vec::new();
        }
        let mut be = self.to_bytes_be();
        if be[0] & 0x80 != 0 {
            be.insert(0, 0);
        }
        if self.is_neg() {
            be[0] |= 0x80;
        }
        if endian == Endian::Little {
            be.reverse();
        }
        be
    }

    /// Decode a script number.
    ///
    /// With `require_minimal`, encodings that carry a redundant high byte
    /// fail with [`Error::NonMinimalEncoding`]. With `max_num_size`, inputs
    /// longer than the limit fail with [`Error::Overflow`]; without it any
    /// length is accepted.
    pub fn from_script_num(
        bytes: &[u8],
        require_minimal: bool,
        max_num_size: Option<usize>,
    ) -> Result<Self> {
        if let Some(max) = max_num_size {
            if bytes.len() > max {
                return Err(Error::Overflow {
                    len: bytes.len(),
                    max,
                });
            }
        }
        if require_minimal {
            if let Some(&last) = bytes.last() {
                // The top byte may only be 0x00/0x80 when it holds the sign
                // for a magnitude whose high bit is already set.
                let len = bytes.len();
                if last & 0x7f == 0 && (len <= 1 || bytes[len - 2] & 0x80 == 0) {
                    return Err(Error::NonMinimalEncoding);
                }
            }
        }
        Ok(Self::from_sm(bytes, Endian::Little))
    }

    /// Minimal script-number encoding.
    pub fn to_script_num(&self) -> Vec<u8> {
        self.to_sm(Endian::Little)
    }
}
