//! HMAC-SHA256 (RFC 2104).

#![forbid(unsafe_code)]

use crate::sha256::{self, Sha256, BLOCK_LEN, OUTPUT_LEN};

/// Keyed HMAC-SHA256 state.
///
/// HMAC(K, m) = H((K' XOR opad) || H((K' XOR ipad) || m))
/// where K' is the key padded/hashed to block size.
#[derive(Clone)]
pub struct HmacSha256 {
    inner: Sha256,
    outer: Sha256,
}

impl HmacSha256 {
    pub fn new(key: &[u8]) -> Self {
        let mut key_block = [0u8; BLOCK_LEN];
        if key.len() > BLOCK_LEN {
            key_block[..OUTPUT_LEN].copy_from_slice(&sha256::digest(key));
        } else {
            key_block[..key.len()].copy_from_slice(key);
        }

        let mut i_key_pad = [0x36u8; BLOCK_LEN];
        let mut o_key_pad = [0x5cu8; BLOCK_LEN];
        for i in 0..BLOCK_LEN {
            i_key_pad[i] ^= key_block[i];
            o_key_pad[i] ^= key_block[i];
        }

        let mut inner = Sha256::new();
        inner.update(&i_key_pad);
        let mut outer = Sha256::new();
        outer.update(&o_key_pad);
        Self { inner, outer }
    }

    pub fn update(&mut self, data: &[u8]) {
        self.inner.update(data);
    }

    pub fn finalize(self) -> [u8; OUTPUT_LEN] {
        let Self { inner, mut outer } = self;
        outer.update(&inner.finalize());
        outer.finalize()
    }
}

/// One-shot HMAC-SHA256.
pub fn hmac_sha256(key: &[u8], data: &[u8]) -> [u8; OUTPUT_LEN] {
    let mut mac = HmacSha256::new(key);
    mac.update(data);
    mac.finalize()
}
