//! HMAC-DRBG over SHA-256 (NIST SP 800-90A, section 10.1.2).
//!
//! ECDSA nonces come from a generator seeded with the private key and the
//! message digest, so signing is deterministic and never reuses a nonce
//! across messages. A constructed [`Drbg`] is always seeded; there is no
//! uninstantiated state to misuse.

#![forbid(unsafe_code)]

use std::fmt;

use bsv_core::{Error, Result};
use serde::{Deserialize, Serialize};

use crate::hmac::HmacSha256;
use crate::sha256::OUTPUT_LEN;

/// Generate requests allowed per seed before [`Error::ReseedRequired`].
pub const DEFAULT_RESEED_INTERVAL: u64 = 1 << 32;

/// Minimum entropy input accepted by [`Drbg::new`] and [`Drbg::reseed`]
/// (192 bits).
pub const MIN_ENTROPY_BYTES: usize = 24;

/// Tunables for a [`Drbg`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DrbgConfig {
    /// Generate calls permitted between reseeds.
    pub reseed_interval: u64,
}

impl Default for DrbgConfig {
    fn default() -> Self {
        Self {
            reseed_interval: DEFAULT_RESEED_INTERVAL,
        }
    }
}

/// Seeded HMAC-DRBG state.
#[derive(Clone)]
pub struct Drbg {
    k: [u8; OUTPUT_LEN],
    v: [u8; OUTPUT_LEN],
    reseed_counter: u64,
    config: DrbgConfig,
}

impl fmt::Debug for Drbg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Drbg")
            .field("reseed_counter", &self.reseed_counter)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Drbg {
    /// Instantiate from entropy, nonce and optional personalization string.
    pub fn new(entropy: &[u8], nonce: &[u8], personalization: Option<&[u8]>) -> Result<Self> {
        Self::with_config(entropy, nonce, personalization, DrbgConfig::default())
    }

    pub fn with_config(
        entropy: &[u8],
        nonce: &[u8],
        personalization: Option<&[u8]>,
        config: DrbgConfig,
    ) -> Result<Self> {
        check_entropy(entropy)?;
        let mut drbg = Self {
            k: [0x00; OUTPUT_LEN],
            v: [0x01; OUTPUT_LEN],
            reseed_counter: 1,
            config,
        };
        let pers = personalization.unwrap_or(&[]);
        drbg.update(&[entropy, nonce, pers]);
        Ok(drbg)
    }

    /// Mix in fresh entropy and reset the request counter.
    pub fn reseed(&mut self, entropy: &[u8], additional: Option<&[u8]>) -> Result<()> {
        check_entropy(entropy)?;
        self.update(&[entropy, additional.unwrap_or(&[])]);
        self.reseed_counter = 1;
        Ok(())
    }

    /// Produce `len` pseudorandom bytes.
    pub fn generate(&mut self, len: usize, additional: Option<&[u8]>) -> Result<Vec<u8>> {
        if self.reseed_counter > self.config.reseed_interval {
            tracing::warn!(
                requests = self.reseed_counter - 1,
                "DRBG refused to generate: reseed required"
            );
            return Err(Error::ReseedRequired(self.reseed_counter - 1));
        }

        let additional = additional.filter(|a| !a.is_empty());
        if let Some(add) = additional {
            self.update(&[add]);
        }

        let mut out = Vec::with_capacity(len + OUTPUT_LEN);
        while out.len() < len {
            self.v = self.mac(&[&self.v[..]]);
            out.extend_from_slice(&self.v);
        }
        out.truncate(len);

        self.update(&[additional.unwrap_or(&[])]);
        self.reseed_counter += 1;
        Ok(out)
    }

    /// Generate calls made since the last (re)seed.
    pub fn requests(&self) -> u64 {
        self.reseed_counter - 1
    }

    fn mac(&self, parts: &[&[u8]]) -> [u8; OUTPUT_LEN] {
        let mut mac = HmacSha256::new(&self.k);
        for part in parts {
            mac.update(part);
        }
        mac.finalize()
    }

    /// HMAC_DRBG_Update. `data` is the concatenation of `parts`; the second
    /// round runs only when it is non-empty.
    fn update(&mut self, parts: &[&[u8]]) {
        let round = |this: &mut Self, sep: u8| {
            let mut mac = HmacSha256::new(&this.k);
            mac.update(&this.v);
            mac.update(&[sep]);
            for part in parts {
                mac.update(part);
            }
            this.k = mac.finalize();
            this.v = this.mac(&[&this.v[..]]);
        };
        round(self, 0x00);
        if parts.iter().any(|p| !p.is_empty()) {
            round(self, 0x01);
        }
    }
}

fn check_entropy(entropy: &[u8]) -> Result<()> {
    if entropy.len() < MIN_ENTROPY_BYTES {
        return Err(Error::InsufficientEntropy {
            got: entropy.len(),
            min: MIN_ENTROPY_BYTES,
        });
    }
    Ok(())
}
