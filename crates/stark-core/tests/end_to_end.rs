use proptest::prelude::*;
use stark_core::field::{self, Felt, Scalar};
use stark_core::params::CurveParameters;
use stark_core::{
    compute_hash_on_elements, pedersen_hash, verify, verify_xy, DomainError, KeyPair, Signature,
    StarkPoint, TypedData, VerifyResult,
};

const FIXTURE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/data/pedersen_params.json");

fn curve() -> &'static CurveParameters {
    CurveParameters::shared_stark()
}

#[test]
fn fixture_matches_builtin_parameters() {
    let loaded = CurveParameters::from_json_file(FIXTURE).unwrap();
    let builtin = curve();

    assert_eq!(loaded.prime(), builtin.prime());
    assert_eq!(loaded.order(), builtin.order());
    assert_eq!(loaded.beta(), builtin.beta());
    assert_eq!(loaded.constant_points().len(), 506);
    assert_eq!(loaded.constant_points(), builtin.constant_points());
    assert_eq!(loaded.hash_slots(), 2);
}

#[test]
fn fixture_parameters_hash_identically() {
    let loaded = CurveParameters::from_json_file(FIXTURE).unwrap();
    let a = Felt::from(0x1234u64);
    let b = Felt::from(0x5678u64);
    assert_eq!(
        pedersen_hash(&loaded, &a, &b).unwrap(),
        pedersen_hash(curve(), &a, &b).unwrap()
    );
}

#[test]
fn missing_params_file_is_resource_error() {
    let err = CurveParameters::from_json_file("/nonexistent/pedersen_params.json").unwrap_err();
    assert!(err.is_resource());
}

#[test]
fn typed_data_hash_sign_verify() {
    let typed = TypedData::from_json_str(
        r#"{
            "types": {
                "StarkNetDomain": [
                    {"name": "name", "type": "felt"},
                    {"name": "version", "type": "felt"},
                    {"name": "chainId", "type": "felt"}
                ],
                "Message": [{"name": "message", "type": "felt"}]
            },
            "primaryType": "Message",
            "domain": {"name": "Example DApp", "version": "1", "chainId": 1},
            "message": {"message": "test msg"}
        }"#,
    )
    .unwrap();
    let account =
        field::parse_felt("0x02039385c3fc65cfd45e06e78d257d52e3141e590f253c1c5be09bb9dad24b5c")
            .unwrap();
    let hash = typed.message_hash(curve(), Some(&account)).unwrap();
    assert_eq!(
        field::to_hex(&hash),
        "0x9d6d42d41503637bd91d30f9e75595c7c1b1719c5823908436c6c73b7dfdd6"
    );

    let kp = KeyPair::from_hex(
        "0x0139fe4d6f02e666e86a6f58e65060f115cd3c185bd9e98bd829636931458f79",
        curve(),
    )
    .unwrap();
    let sig = Signature::sign(curve(), &kp, &hash).unwrap();
    let (x, y) = kp.pk.coords();
    assert!(verify_xy(curve(), &hash, &sig.r, &sig.s, &x, &y).unwrap());

    // Same message on another chain must not verify.
    let mut other_chain = typed.clone();
    other_chain.domain["chainId"] = serde_json::json!(2);
    let replayed = other_chain.message_hash(curve(), Some(&account)).unwrap();
    assert_ne!(replayed, hash);
    assert!(!verify_xy(curve(), &replayed, &sig.r, &sig.s, &x, &y).unwrap());
}

#[test]
fn array_hash_chains_pairwise() {
    let elements = [Felt::from(1u64), Felt::from(2u64)];
    let h0 = pedersen_hash(curve(), &Felt::from(0u64), &elements[0]).unwrap();
    let h1 = pedersen_hash(curve(), &h0, &elements[1]).unwrap();
    let expected = pedersen_hash(curve(), &h1, &Felt::from(2u64)).unwrap();
    assert_eq!(compute_hash_on_elements(curve(), &elements).unwrap(), expected);
}

#[test]
fn malformed_inputs_are_domain_errors() {
    assert!(matches!(
        field::parse_felt("0xzz"),
        Err(DomainError::InvalidNumber(_))
    ));
    assert!(matches!(
        StarkPoint::from_coords(Felt::from(0u64), Felt::from(0u64), curve()),
        Err(DomainError::PointNotOnCurve { .. })
    ));
    assert_eq!(
        field::invert(&Felt::from(0u64)),
        Err(DomainError::NotInvertible)
    );
}

fn scalar_strategy() -> impl Strategy<Value = Scalar> {
    (1u64..u64::MAX, any::<u64>()).prop_map(|(lo, hi)| {
        Scalar::from(hi) * Scalar::from(u64::MAX) + Scalar::from(lo)
    })
}

fn hash_strategy() -> impl Strategy<Value = Felt> {
    prop::array::uniform4(any::<u64>()).prop_map(|limbs| {
        let mut acc = Felt::from(0u64);
        for limb in limbs {
            acc = acc * Felt::from(1u64 << 32) * Felt::from(1u64 << 30) + Felt::from(limb >> 2);
        }
        acc
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(8))]

    #[test]
    fn sign_then_verify(sk in scalar_strategy(), hash in hash_strategy()) {
        prop_assume!(sk != Scalar::from(0u64));
        let kp = KeyPair::from_private_key(sk, curve()).unwrap();
        let sig = Signature::sign(curve(), &kp, &hash).unwrap();
        prop_assert_eq!(verify(curve(), &hash, &sig, &kp.pk).unwrap(), VerifyResult::Valid);
    }

    #[test]
    fn flipped_bit_fails(sk in scalar_strategy(), hash in hash_strategy(), bit in 0u32..200) {
        prop_assume!(sk != Scalar::from(0u64));
        let kp = KeyPair::from_private_key(sk, curve()).unwrap();
        let sig = Signature::sign(curve(), &kp, &hash).unwrap();

        let flip = |value: &Felt| -> Felt {
            let flipped = field::to_biguint(value) ^ (num_bigint::BigUint::from(1u32) << bit);
            field::from_biguint(&flipped).unwrap()
        };

        prop_assert_eq!(
            verify(curve(), &flip(&hash), &sig, &kp.pk).unwrap(),
            VerifyResult::Invalid
        );
        // A flipped r or s may leave [1, n); either outcome is a rejection.
        let bad_r = Signature { r: flip(&sig.r), ..sig };
        prop_assert!(!matches!(verify(curve(), &hash, &bad_r, &kp.pk), Ok(VerifyResult::Valid)));
        let bad_s = Signature { s: flip(&sig.s), ..sig };
        prop_assert!(!matches!(verify(curve(), &hash, &bad_s, &kp.pk), Ok(VerifyResult::Valid)));
    }

    #[test]
    fn scalar_mul_is_linear(a in 1u64..1_000_000, b in 1u64..1_000_000) {
        let g = curve().generator();
        let sum = g
            .mul_scalar(&Scalar::from(a), curve())
            .add(&g.mul_scalar(&Scalar::from(b), curve()), curve());
        prop_assert_eq!(sum, g.mul_scalar(&(Scalar::from(a) + Scalar::from(b)), curve()));
    }
}
