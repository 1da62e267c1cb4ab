//! ECDSA signatures and their wire encodings.
//!
//! - DER: `30 len 02 rlen r 02 slen s`, strictly minimal
//! - compact: `r ‖ s` (64 bytes) or `r ‖ s ‖ recovery id` (65 bytes)
//! - checksig: DER followed by the one-byte sighash scope

#![forbid(unsafe_code)]

use bsv_core::{Error, Result};

use crate::bigint::BigInt;

use super::curve::secp256k1;

/// Sighash scope flags.
pub const SIGHASH_ALL: u8 = 0x01;
pub const SIGHASH_NONE: u8 = 0x02;
pub const SIGHASH_SINGLE: u8 = 0x03;
pub const SIGHASH_FORKID: u8 = 0x40;
pub const SIGHASH_ANYONECANPAY: u8 = 0x80;

const DER_SEQUENCE: u8 = 0x30;
const DER_INTEGER: u8 = 0x02;

/// An (r, s) pair with both values in [1, n-1], plus the recovery id when
/// the signer recorded one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    r: BigInt,
    s: BigInt,
    recovery_id: Option<u8>,
}

impl Signature {
    pub fn new(r: BigInt, s: BigInt) -> Result<Self> {
        check_range(&r, "r")?;
        check_range(&s, "s")?;
        Ok(Self {
            r,
            s,
            recovery_id: None,
        })
    }

    /// Attach a recovery id (0..=3).
    pub fn with_recovery_id(mut self, recovery_id: u8) -> Result<Self> {
        if recovery_id > 3 {
            return Err(Error::InvalidRecoveryId(recovery_id));
        }
        self.recovery_id = Some(recovery_id);
        Ok(self)
    }

    pub fn r(&self) -> &BigInt {
        &self.r
    }

    pub fn s(&self) -> &BigInt {
        &self.s
    }

    pub fn recovery_id(&self) -> Option<u8> {
        self.recovery_id
    }

    /// s <= n/2.
    pub fn has_low_s(&self) -> bool {
        self.s <= secp256k1().n_half
    }

    /// Replace a high s with n - s. The recovery id's parity bit flips with
    /// it, since negating s negates the recovered point.
    pub fn to_low_s(&self) -> Self {
        if self.has_low_s() {
            return self.clone();
        }
        Self {
            r: self.r.clone(),
            s: secp256k1().n.sub(&self.s),
            recovery_id: self.recovery_id.map(|id| id ^ 1),
        }
    }

    /// Strict DER. The recovery id is not part of the encoding.
    pub fn to_der(&self) -> Vec<u8> {
        let r = der_integer(&self.r);
        let s = der_integer(&self.s);
        let mut out = Vec::with_capacity(6 + r.len() + s.len());
        out.push(DER_SEQUENCE);
        out.push((4 + r.len() + s.len()) as u8);
        out.push(DER_INTEGER);
        out.push(r.len() as u8);
        out.extend_from_slice(&r);
        out.push(DER_INTEGER);
        out.push(s.len() as u8);
        out.extend_from_slice(&s);
        out
    }

    pub fn from_der(bytes: &[u8]) -> Result<Self> {
        let mut reader = DerReader { bytes, pos: 0 };
        if reader.byte()? != DER_SEQUENCE {
            return Err(Error::MalformedDer("expected sequence tag"));
        }
        let len = reader.length()?;
        if len != bytes.len() - reader.pos {
            return Err(Error::MalformedDer("sequence length mismatch"));
        }
        let r = reader.integer()?;
        let s = reader.integer()?;
        if reader.pos != bytes.len() {
            return Err(Error::MalformedDer("trailing bytes"));
        }
        Self::new(r, s)
    }

    /// `r ‖ s`, followed by the recovery id when present.
    pub fn to_compact(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(65);
        out.extend_from_slice(&self.r.to_be_fixed::<32>());
        out.extend_from_slice(&self.s.to_be_fixed::<32>());
        if let Some(id) = self.recovery_id {
            out.push(id);
        }
        out
    }

    pub fn from_compact(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != 64 && bytes.len() != 65 {
            return Err(Error::InvalidEncoding(format!(
                "compact signature must be 64 or 65 bytes, got {}",
                bytes.len()
            )));
        }
        let sig = Self::new(
            BigInt::from_bytes_be(&bytes[..32]),
            BigInt::from_bytes_be(&bytes[32..64]),
        )?;
        match bytes.get(64) {
            Some(&id) => sig.with_recovery_id(id),
            None => Ok(sig),
        }
    }

    pub fn to_der_hex(&self) -> String {
        self.to_der().iter().map(|b| format!("{b:02x}")).collect()
    }
}

fn check_range(v: &BigInt, name: &str) -> Result<()> {
    if v.is_neg() || v.is_zero() || v >= &secp256k1().n {
        return Err(Error::OutOfRange(format!("signature {name} not in [1, n-1]")));
    }
    Ok(())
}

/// Minimal big-endian bytes with a zero pad when the top bit is set.
fn der_integer(v: &BigInt) -> Vec<u8> {
    let mut bytes = v.to_bytes_be();
    if bytes[0] & 0x80 != 0 {
        bytes.insert(0, 0x00);
    }
    bytes
}

struct DerReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl DerReader<'_> {
    fn byte(&mut self) -> Result<u8> {
        let b = *self
            .bytes
            .get(self.pos)
            .ok_or(Error::MalformedDer("unexpected end of input"))?;
        self.pos += 1;
        Ok(b)
    }

    /// Short-form lengths only; a signature never needs more.
    fn length(&mut self) -> Result<usize> {
        let len = self.byte()?;
        if len & 0x80 != 0 {
            return Err(Error::MalformedDer("long-form length"));
        }
        Ok(len as usize)
    }

    fn integer(&mut self) -> Result<BigInt> {
        if self.byte()? != DER_INTEGER {
            return Err(Error::MalformedDer("expected integer tag"));
        }
        let len = self.length()?;
        if len == 0 {
            return Err(Error::MalformedDer("empty integer"));
        }
        let end = self.pos + len;
        let body = self
            .bytes
            .get(self.pos..end)
            .ok_or(Error::MalformedDer("integer runs past end"))?;
        if body[0] & 0x80 != 0 {
            return Err(Error::MalformedDer("negative integer"));
        }
        if len > 1 && body[0] == 0x00 && body[1] & 0x80 == 0 {
            return Err(Error::MalformedDer("integer not minimally encoded"));
        }
        self.pos = end;
        Ok(BigInt::from_bytes_be(body))
    }
}

/// A signature as it appears in an unlocking script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxSignature {
    pub signature: Signature,
    pub scope: u8,
}

impl TxSignature {
    pub fn new(signature: Signature, scope: u8) -> Self {
        Self { signature, scope }
    }

    /// DER ‖ scope.
    pub fn to_checksig_format(&self) -> Vec<u8> {
        let mut out = self.signature.to_der();
        out.push(self.scope);
        out
    }

    pub fn from_checksig_format(bytes: &[u8]) -> Result<Self> {
        let (&scope, der) = bytes
            .split_last()
            .ok_or_else(|| Error::InvalidEncoding("empty checksig signature".into()))?;
        Ok(Self {
            signature: Signature::from_der(der)?,
            scope,
        })
    }
}
