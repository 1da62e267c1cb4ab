//! Property tests for big-integer encodings and scalar multiplication.
//!
//! Every multiplication path must agree with plain double-and-add, and the
//! GLV split must recombine to the original scalar.

use proptest::prelude::*;

use bsv_crypto::bigint::{BigInt, Endian};
use bsv_crypto::secp256k1::{secp256k1, AffinePoint, CurvePoint};

fn scalar() -> impl Strategy<Value = BigInt> {
    any::<[u8; 32]>().prop_map(|b| BigInt::from_bytes_be(&b).umod(&secp256k1().n))
}

fn signed_int() -> impl Strategy<Value = BigInt> {
    (any::<bool>(), prop::collection::vec(any::<u8>(), 0..48)).prop_map(|(neg, bytes)| {
        let v = BigInt::from_bytes_be(&bytes);
        if neg {
            v.neg()
        } else {
            v
        }
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn bigint_text_round_trips(v in signed_int()) {
        prop_assert_eq!(BigInt::from_str_radix(&v.to_str_radix(10), 10).unwrap(), v.clone());
        prop_assert_eq!(BigInt::from_str_radix(&v.to_str_radix(36), 36).unwrap(), v.clone());
        prop_assert_eq!(BigInt::from_hex(&v.to_hex()).unwrap(), v.clone());
        prop_assert_eq!(v.to_string().parse::<BigInt>().unwrap(), v);
    }

    #[test]
    fn bigint_byte_round_trips(v in signed_int()) {
        let mag = v.abs();
        prop_assert_eq!(BigInt::from_bytes_be(&mag.to_bytes_be()), mag.clone());
        prop_assert_eq!(BigInt::from_bytes_le(&mag.to_bytes_le()), mag.clone());
        prop_assert_eq!(BigInt::from_base58(&mag.to_base58()).unwrap(), mag.clone());
        prop_assert_eq!(BigInt::from_base64(&mag.to_base64()).unwrap(), mag);
        prop_assert_eq!(BigInt::from_sm(&v.to_sm(Endian::Big), Endian::Big), v.clone());
        prop_assert_eq!(BigInt::from_sm(&v.to_sm(Endian::Little), Endian::Little), v.clone());
        prop_assert_eq!(BigInt::from_script_num(&v.to_script_num(), true, None).unwrap(), v);
    }

    #[test]
    fn bigint_division_identity(a in signed_int(), b in signed_int()) {
        prop_assume!(!b.is_zero());
        let (q, r) = a.div_rem(&b);
        prop_assert_eq!(q.mul(&b).add(&r), a.clone());
        prop_assert!(r.abs() < b.abs());
        let m = a.umod(&b);
        prop_assert!(!m.is_neg() && m < b.abs());
    }

    #[test]
    fn point_encodings_round_trip(k in scalar()) {
        prop_assume!(!k.is_zero());
        let p = secp256k1().generator().mul(&k);
        for bytes in [p.encode(true), p.encode(false), p.encode_hybrid()] {
            prop_assert_eq!(AffinePoint::decode(&bytes).unwrap(), p.clone());
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn multiplication_paths_agree(k in scalar()) {
        let g = secp256k1().generator();
        let reference = g.mul_double_and_add(&k);
        prop_assert_eq!(g.mul(&k), reference.clone());
        prop_assert_eq!(g.mul_endo(&k), reference.clone());
        if let Some(fixed) = g.mul_fixed(&k) {
            prop_assert_eq!(fixed, reference.clone());
        }

        // a point without a cache takes the GLV path with on-the-fly tables
        let q = reference.dbl();
        let k2 = k.add_small(3);
        prop_assert_eq!(q.mul(&k2), q.mul_double_and_add(&k2));
    }

    #[test]
    fn glv_split_recombines(k in scalar()) {
        let curve = secp256k1();
        let (k1, k2) = curve.endo_split(&k);
        prop_assert_eq!(k1.add(&k2.mul(&curve.lambda)).umod(&curve.n), k.clone());
        prop_assert!(k1.bit_length() <= 129);
        prop_assert!(k2.bit_length() <= 129);
    }

    #[test]
    fn mul_add_matches_separate_products(a in scalar(), b in scalar(), c in scalar()) {
        prop_assume!(!c.is_zero());
        let g = secp256k1().generator();
        let q = g.mul(&c);
        let joint = g.mul_add(&a, &q, &b);
        prop_assert_eq!(joint, g.mul(&a).add(&q.mul(&b)));
    }
}

#[test]
fn shift_scenario() {
    let v: BigInt = "69527932928".parse().unwrap();
    assert_eq!(v.shl(13).to_hex(), "2060602000000");
    assert!(v.shr(256).is_zero());
}

#[test]
fn script_num_scenarios() {
    assert_eq!(BigInt::from_script_num(&[0x80, 0x00], true, None).unwrap(), BigInt::from(128u32));
    assert!(BigInt::from_script_num(&[0x00, 0x00, 0x00, 0x00], false, None).unwrap().is_zero());
    assert_eq!(
        BigInt::from_script_num(&[0x80, 0x00, 0x00, 0x00], true, None),
        Err(bsv_core::Error::NonMinimalEncoding)
    );
}
