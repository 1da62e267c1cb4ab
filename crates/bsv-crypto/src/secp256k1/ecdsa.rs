//! ECDSA over secp256k1 with deterministic nonces and key recovery.
//!
//! Signing seeds an HMAC-DRBG with the private key and the digest (RFC 6979
//! style), so the same key and message always give the same signature and
//! distinct messages never share a nonce.
//!
//! Digests are integers here. A digest wider than n is truncated to its
//! leftmost bits, then reduced once.

#![forbid(unsafe_code)]

use bsv_core::{Error, Result};
use serde::{Deserialize, Serialize};

use crate::bigint::BigInt;
use crate::drbg::Drbg;

use super::curve::secp256k1;
use super::point::{AffinePoint, CurvePoint};
use super::signature::Signature;

/// Byte length of a scalar.
const SCALAR_BYTES: usize = 32;

/// Signing behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignOptions {
    /// Replace s > n/2 with n - s.
    pub force_low_s: bool,
}

impl Default for SignOptions {
    fn default() -> Self {
        Self { force_low_s: true }
    }
}

/// Leftmost bits of `msg` up to the width of n; reduced below n unless
/// `truncate_only`.
pub fn truncate_to_n(msg: &BigInt, truncate_only: bool) -> BigInt {
    let n = &secp256k1().n;
    let delta = (msg.byte_length() * 8).saturating_sub(n.bit_length());
    let mut msg = if delta > 0 { msg.ushr(delta) } else { msg.clone() };
    if !truncate_only && &msg >= n {
        msg = msg.sub(n);
    }
    msg
}

fn check_key(key: &BigInt) -> Result<()> {
    if key.is_neg() || key.is_zero() || key >= &secp256k1().n {
        return Err(Error::OutOfRange("private key not in [1, n-1]".into()));
    }
    Ok(())
}

/// Sign `msg` with the scalar `key` using a DRBG-derived nonce.
pub fn sign(msg: &BigInt, key: &BigInt, options: SignOptions) -> Result<Signature> {
    check_key(key)?;
    let n = &secp256k1().n;
    let msg = truncate_to_n(msg, false);

    let entropy = key.to_be_fixed::<SCALAR_BYTES>();
    let nonce = msg.to_be_fixed::<SCALAR_BYTES>();
    let mut drbg = Drbg::new(&entropy, &nonce, None)?;
    let n_minus_1 = n.sub_small(1);

    loop {
        let k = truncate_to_n(&BigInt::from_bytes_be(&drbg.generate(SCALAR_BYTES, None)?), true);
        if k <= BigInt::one() || k >= n_minus_1 {
            tracing::trace!("nonce candidate out of range, drawing again");
            continue;
        }
        match try_sign(&msg, key, &k, options) {
            Some(sig) => return Ok(sig),
            None => tracing::trace!("nonce candidate produced a zero component, drawing again"),
        }
    }
}

/// Sign with a caller-chosen nonce. Fails with `OutOfRange` when the nonce
/// is outside [1, n-1] or yields r = 0 or s = 0.
pub fn sign_with_nonce(
    msg: &BigInt,
    key: &BigInt,
    k: &BigInt,
    options: SignOptions,
) -> Result<Signature> {
    check_key(key)?;
    if k.is_neg() || k.is_zero() || k >= &secp256k1().n {
        return Err(Error::OutOfRange("nonce not in [1, n-1]".into()));
    }
    let msg = truncate_to_n(msg, false);
    try_sign(&msg, key, k, options)
        .ok_or_else(|| Error::OutOfRange("nonce yields a degenerate signature".into()))
}

/// r = (kG).x mod n, s = k⁻¹(msg + r·key) mod n. `None` if r or s is zero.
fn try_sign(msg: &BigInt, key: &BigInt, k: &BigInt, options: SignOptions) -> Option<Signature> {
    let curve = secp256k1();
    let n = &curve.n;

    let kp = curve.generator().mul(k);
    if kp.is_infinity() {
        return None;
    }
    let r = kp.get_x().umod(n);
    if r.is_zero() {
        return None;
    }

    let k_inv = k.invm(n)?;
    let s = k_inv.mul(&r.mul(key).add(msg)).umod(n);
    if s.is_zero() {
        return None;
    }

    let s = if options.force_low_s && s > curve.n_half {
        n.sub(&s)
    } else {
        s
    };
    Signature::new(r, s).ok()
}

/// Sign and attach the recovery id that reproduces the signer's key.
pub fn sign_recoverable(msg: &BigInt, key: &BigInt, options: SignOptions) -> Result<Signature> {
    let sig = sign(msg, key, options)?;
    let public = secp256k1().generator().mul(key);
    let id = calculate_recovery_factor(&public, msg, &sig)?;
    sig.with_recovery_id(id)
}

/// Check u1·G + u2·Q against r. Never fails: anything malformed is `false`.
pub fn verify(msg: &BigInt, sig: &Signature, key: &AffinePoint) -> bool {
    let curve = secp256k1();
    let n = &curve.n;

    if key.is_infinity() || !key.validate() {
        tracing::trace!("verify: public key is not a curve point");
        return false;
    }

    let msg = truncate_to_n(msg, false);
    let Some(s_inv) = sig.s().invm(n) else {
        tracing::trace!("verify: s has no inverse");
        return false;
    };
    let u1 = s_inv.mul(&msg).umod(n);
    let u2 = s_inv.mul(sig.r()).umod(n);

    let p = curve.generator().mul_add(&u1, key, &u2);
    if p.is_infinity() {
        tracing::trace!("verify: u1*G + u2*Q is infinity");
        return false;
    }
    p.get_x().umod(n) == *sig.r()
}

/// The public key that produced `sig` over `msg`, given the recovery id.
///
/// Bit 0 of the id is the parity of R's y; bit 1 says R.x = r + n.
pub fn recover_public_key(recovery_id: u8, msg: &BigInt, sig: &Signature) -> Result<AffinePoint> {
    if recovery_id > 3 {
        return Err(Error::InvalidRecoveryId(recovery_id));
    }
    let curve = secp256k1();
    let n = &curve.n;
    let r = sig.r();

    let y_odd = recovery_id & 1 == 1;
    let second_key = recovery_id >> 1 == 1;

    let x = if second_key {
        if r >= &curve.p.sub(n) {
            return Err(Error::InvalidPoint);
        }
        r.add(n)
    } else {
        r.clone()
    };
    let big_r = AffinePoint::from_x(&x, y_odd)?;

    let msg = truncate_to_n(msg, false);
    let r_inv = r
        .invm(n)
        .ok_or_else(|| Error::OutOfRange("signature r has no inverse".into()))?;

    // Q = r⁻¹(sR - eG) = (-e·r⁻¹)G + (s·r⁻¹)R
    let u1 = n.sub(&msg.mul(&r_inv).umod(n)).umod(n);
    let u2 = sig.s().mul(&r_inv).umod(n);
    let q = curve.generator().mul_add(&u1, &big_r, &u2);
    if q.is_infinity() {
        return Err(Error::PointAtInfinity);
    }
    Ok(q)
}

/// Scan ids 0..=3 for the one whose recovered key equals `key`.
pub fn calculate_recovery_factor(key: &AffinePoint, msg: &BigInt, sig: &Signature) -> Result<u8> {
    for id in 0..4u8 {
        match recover_public_key(id, msg, sig) {
            Ok(candidate) if candidate == *key => return Ok(id),
            Ok(_) => tracing::trace!(id, "recovery id yields a different key"),
            Err(e) => tracing::trace!(id, error = %e, "recovery id does not apply"),
        }
    }
    Err(Error::RecoveryFactorNotFound)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sha256;

    fn digest(msg: &[u8]) -> BigInt {
        BigInt::from_bytes_be(&sha256::digest(msg))
    }

    fn key(hex_str: &str) -> BigInt {
        BigInt::from_hex(hex_str).unwrap()
    }

    #[test]
    fn test_rfc6979_satoshi_vector() {
        let msg = digest(b"Satoshi Nakamoto");
        let sig = sign_recoverable(&msg, &BigInt::one(), SignOptions::default()).unwrap();
        assert_eq!(
            hex::encode(&sig.to_compact()[..64]),
            "934b1ea10a4b3c1757e2b0c017d0b6143ce3c9a7e6a4a49860d7a6ab210ee3d8\
             2442ce9d2b916064108014783e923ec36b49743e2ffa1c4496f01a512aafd9e5"
        );
        assert_eq!(sig.recovery_id(), Some(1));

        // the same signature from the nonce directly
        let k = key("8f8a276c19f4149656b280621e358cce24f5f52542772691ee69063b74f15d15");
        let direct = sign_with_nonce(&msg, &BigInt::one(), &k, SignOptions::default()).unwrap();
        assert_eq!(direct.r(), sig.r());
        assert_eq!(direct.s(), sig.s());
    }

    #[test]
    fn test_hello_world_vector() {
        let sk = key("deadbeefcafebabedeadbeefcafebabedeadbeefcafebabedeadbeefcafebabe");
        let msg = digest(b"hello world");
        let sig = sign_recoverable(&msg, &sk, SignOptions::default()).unwrap();
        assert_eq!(
            hex::encode(&sig.to_compact()[..64]),
            "2259003606168a7d2a53d36a22ffa9205af250c37bcc049305424ef5417ff2aa\
             79553b9786d7ed302789263a7f2bd777850f0397a0315a586624a169d83e29c8"
        );
        assert_eq!(sig.recovery_id(), Some(0));

        let public = secp256k1().generator().mul(&sk);
        assert_eq!(
            hex::encode(public.encode(true)),
            "028f8e6fb0c7a3dad35bd857867064230803246f2471925f145d615271875bdf00"
        );
        assert!(verify(&msg, &sig, &public));
        assert_eq!(recover_public_key(0, &msg, &sig).unwrap(), public);
    }

    #[test]
    fn test_matches_k256() {
        use k256::ecdsa::{signature::hazmat::PrehashSigner, Signature as K256Signature, SigningKey};

        for (sk_hex, msg) in [
            ("0000000000000000000000000000000000000000000000000000000000000001", &b"Satoshi Nakamoto"[..]),
            ("c9afa9d845ba75166b5c215767b1d6934e50c3db36e89b127b8a622b120f6721", b"sample"),
            ("fffffffffffffffffffffffffffffffebaaedce6af48a03bbfd25e8cd0364140", b"test"),
        ] {
            let sk_bytes = hex::decode(sk_hex).unwrap();
            let h = sha256::digest(msg);
            let signing = SigningKey::from_slice(&sk_bytes).unwrap();
            let expected: K256Signature = signing.sign_prehash(&h).unwrap();

            let ours = sign(&BigInt::from_bytes_be(&h), &key(sk_hex), SignOptions::default()).unwrap();
            assert_eq!(ours.to_compact(), expected.to_bytes().to_vec(), "key {sk_hex}");
        }
    }

    #[test]
    fn test_high_s_when_not_forced() {
        let sk = key("deadbeefcafebabedeadbeefcafebabedeadbeefcafebabedeadbeefcafebabe");
        let public = secp256k1().generator().mul(&sk);
        let options = SignOptions { force_low_s: false };
        // at least one of a handful of messages lands on a high s
        let high = (0u32..16)
            .map(|i| digest(&i.to_be_bytes()))
            .find_map(|msg| {
                let sig = sign(&msg, &sk, options).unwrap();
                (!sig.has_low_s()).then_some((msg, sig))
            });
        let (msg, sig) = high.unwrap();
        assert!(verify(&msg, &sig, &public));
        assert!(verify(&msg, &sig.to_low_s(), &public));

        let low = sign(&msg, &sk, SignOptions::default()).unwrap();
        assert_eq!(low, sig.to_low_s());
    }

    #[test]
    fn test_verify_fails_closed() {
        let sk = key("01020304");
        let public = secp256k1().generator().mul(&sk);
        let msg = digest(b"fail closed");
        let sig = sign(&msg, &sk, SignOptions::default()).unwrap();
        assert!(verify(&msg, &sig, &public));

        // wrong message, wrong key, tampered r
        assert!(!verify(&msg.add_small(1), &sig, &public));
        assert!(!verify(&msg, &sig, &public.dbl()));
        let tampered = Signature::new(sig.r().add_small(1), sig.s().clone()).unwrap();
        assert!(!verify(&msg, &tampered, &public));

        // off-curve and infinite keys
        let twist = AffinePoint::from_xy_unchecked(&BigInt::from(14u32), &BigInt::from(16u32));
        assert!(!verify(&msg, &sig, &twist));
        assert!(!verify(&msg, &sig, &AffinePoint::infinity()));
    }

    #[test]
    fn test_recovery_ids() {
        let sk = key("4242");
        let public = secp256k1().generator().mul(&sk);
        let msg = digest(b"recover me");
        let sig = sign_recoverable(&msg, &sk, SignOptions::default()).unwrap();
        let id = sig.recovery_id().unwrap();
        assert_eq!(recover_public_key(id, &msg, &sig).unwrap(), public);
        assert_eq!(calculate_recovery_factor(&public, &msg, &sig).unwrap(), id);

        // the other parity recovers a different key
        let other = recover_public_key(id ^ 1, &msg, &sig).unwrap();
        assert_ne!(other, public);

        assert_eq!(recover_public_key(4, &msg, &sig), Err(Error::InvalidRecoveryId(4)));
        assert_eq!(
            calculate_recovery_factor(&public.dbl(), &msg, &sig),
            Err(Error::RecoveryFactorNotFound)
        );
    }

    #[test]
    fn test_second_key_ids_need_small_r() {
        // r near n cannot have x = r + n below p
        let n = &secp256k1().n;
        let sig = Signature::new(n.sub_small(5), BigInt::one()).unwrap();
        let msg = digest(b"x overflow");
        assert_eq!(recover_public_key(2, &msg, &sig), Err(Error::InvalidPoint));
        assert_eq!(recover_public_key(3, &msg, &sig), Err(Error::InvalidPoint));
    }

    #[test]
    fn test_key_and_nonce_range() {
        let msg = digest(b"range");
        let n = secp256k1().n.clone();
        assert!(matches!(sign(&msg, &BigInt::zero(), SignOptions::default()), Err(Error::OutOfRange(_))));
        assert!(matches!(sign(&msg, &n, SignOptions::default()), Err(Error::OutOfRange(_))));
        assert!(matches!(
            sign_with_nonce(&msg, &BigInt::one(), &BigInt::zero(), SignOptions::default()),
            Err(Error::OutOfRange(_))
        ));
    }

    #[test]
    fn test_truncate_to_n() {
        let n = secp256k1().n.clone();
        assert_eq!(truncate_to_n(&n, true), n);
        assert!(truncate_to_n(&n, false).is_zero());
        // 33-byte digests keep the leftmost 256 bits
        let wide = BigInt::from_bytes_be(&[0xff; 33]);
        assert_eq!(truncate_to_n(&wide, true), BigInt::from_bytes_be(&[0xff; 32]));
    }
}
