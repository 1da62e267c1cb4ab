//! Property tests for signing, verification, recovery and key sharing.

use proptest::prelude::*;
use rand_chacha::rand_core::SeedableRng;
use rand_chacha::ChaCha20Rng;

use bsv_core::Error;
use bsv_crypto::bigint::BigInt;
use bsv_crypto::secp256k1::{
    secp256k1, AffinePoint, KeyShares, PrivateKey, PublicKey, Signature, TxSignature,
    UncheckedPrivateKey,
};
use bsv_crypto::sha256;

fn private_key() -> impl Strategy<Value = PrivateKey> {
    any::<u64>().prop_map(|seed| PrivateKey::from_rng(&mut ChaCha20Rng::seed_from_u64(seed)))
}

fn flip(v: &BigInt, bit: usize) -> BigInt {
    v.xor(&BigInt::one().shl(bit))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn sign_verify_round_trip(key in private_key(), msg in prop::collection::vec(any::<u8>(), 0..64)) {
        let digest = sha256::digest(&msg);
        let sig = key.sign(&digest).unwrap();
        let public = key.to_public_key();
        prop_assert!(sig.has_low_s());
        prop_assert!(public.verify(&digest, &sig));

        // encodings carry the same signature
        prop_assert_eq!(Signature::from_der(&sig.to_der()).unwrap(), sig.clone());
        prop_assert_eq!(Signature::from_compact(&sig.to_compact()).unwrap(), sig.clone());
        let tx_sig = TxSignature::new(sig.clone(), 0x41);
        prop_assert_eq!(TxSignature::from_checksig_format(&tx_sig.to_checksig_format()).unwrap(), tx_sig);
    }

    #[test]
    fn bit_flips_break_verification(key in private_key(), bit in 0usize..256) {
        let digest = sha256::digest(b"bit flip");
        let sig = key.sign(&digest).unwrap();
        let public = key.to_public_key();

        let mut tampered_digest = digest;
        tampered_digest[bit / 8] ^= 1 << (bit % 8);
        prop_assert!(!public.verify(&tampered_digest, &sig));

        // a flipped r or s is either out of range or fails verification
        if let Ok(bad_r) = Signature::new(flip(sig.r(), bit), sig.s().clone()) {
            prop_assert!(!public.verify(&digest, &bad_r));
        }
        if let Ok(bad_s) = Signature::new(sig.r().clone(), flip(sig.s(), bit)) {
            prop_assert!(!public.verify(&digest, &bad_s));
        }
    }

    #[test]
    fn recovery_returns_signer(key in private_key(), msg in any::<[u8; 16]>()) {
        let digest = sha256::digest(&msg);
        let sig = key.sign_recoverable(&digest).unwrap();
        let id = sig.recovery_id().unwrap();
        prop_assert_eq!(PublicKey::recover(&digest, &sig, id).unwrap(), key.to_public_key());
        prop_assert_eq!(PublicKey::recover_compact(&digest, &sig.to_compact()).unwrap(), key.to_public_key());
    }

    #[test]
    fn shamir_threshold_subsets(seed in any::<u64>(), threshold in 2usize..5, extra in 0usize..3) {
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        let key = PrivateKey::from_rng(&mut rng);
        let total = threshold + extra;
        let shares = key.to_key_shares_with_rng(threshold, total, &mut rng).unwrap();

        // the last `threshold` shares
        let tail = KeyShares::new(shares.points[extra..].to_vec(), threshold);
        prop_assert_eq!(PrivateKey::from_key_shares(&tail).unwrap(), key.clone());

        let short = KeyShares::new(shares.points[..threshold - 1].to_vec(), threshold);
        prop_assert_eq!(
            PrivateKey::from_key_shares(&short),
            Err(Error::InsufficientShares { got: threshold - 1, threshold })
        );
    }
}

#[test]
fn twist_point_rejected_by_ecdh() {
    let key = PrivateKey::from_random();
    let twist = PublicKey::from_point_unchecked(AffinePoint::from_xy_unchecked(
        &BigInt::from(14u32),
        &BigInt::from(16u32),
    ));
    assert_eq!(key.derive_shared_secret(&twist), Err(Error::InvalidPoint));
}

#[test]
fn unchecked_key_one_past_order() {
    let unchecked = UncheckedPrivateKey::new(secp256k1().n.add_small(1)).unwrap();
    let reduced = PrivateKey::new(BigInt::one()).unwrap();

    assert_ne!(unchecked.value(), reduced.scalar());
    assert!(matches!(unchecked.to_wif(), Err(Error::OutOfRange(_))));
    assert_eq!(unchecked.normalize().unwrap().to_wif(), reduced.to_wif());
}

#[test]
fn duplicate_shares_rejected() {
    let key = PrivateKey::from_random();
    let shares = key.to_key_shares(2, 3).unwrap();
    let dup = KeyShares::new(vec![shares.points[0].clone(), shares.points[0].clone()], 2);
    assert_eq!(PrivateKey::from_key_shares(&dup), Err(Error::DuplicateShare));
}
