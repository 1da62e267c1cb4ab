use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("invalid character {ch:?} for radix {radix}")]
    InvalidCharacter { ch: char, radix: u32 },

    #[error("invalid radix {0}: expected 2..=36")]
    InvalidRadix(u32),

    #[error("invalid encoding: {0}")]
    InvalidEncoding(String),

    #[error("number {0} exceeds the 53-bit safe integer range")]
    UnsafeIntegerInput(i64),

    #[error("value does not fit in 53 bits without precision loss")]
    PrecisionLoss,

    #[error("value out of range: {0}")]
    OutOfRange(String),

    #[error("point is not on the curve")]
    InvalidPoint,

    #[error("point at infinity")]
    PointAtInfinity,

    #[error("script number is not minimally encoded")]
    NonMinimalEncoding,

    #[error("script number of {len} bytes exceeds maximum of {max}")]
    Overflow { len: usize, max: usize },

    #[error("invalid recovery id {0}: expected 0..=3")]
    InvalidRecoveryId(u8),

    #[error("no recovery id reproduces the public key")]
    RecoveryFactorNotFound,

    #[error("malformed DER signature: {0}")]
    MalformedDer(&'static str),

    #[error("DRBG reseed required after {0} requests")]
    ReseedRequired(u64),

    #[error("insufficient entropy: got {got} bytes, need at least {min}")]
    InsufficientEntropy { got: usize, min: usize },

    #[error("invalid checksum")]
    InvalidChecksum,

    #[error("invalid threshold {threshold} for {total} shares")]
    InvalidThreshold { threshold: usize, total: usize },

    #[error("insufficient shares: got {got}, threshold is {threshold}")]
    InsufficientShares { got: usize, threshold: usize },

    #[error("duplicate share x-coordinate")]
    DuplicateShare,
}
