use stark_core::field;
use stark_core::{CurveParameters, KeyPair, Signature, TypedData, VerifyResult};
use stark_signer::payload_builder::{build_signing_payload, export_payload_json, read_payload_json};

const PARAMS: &str = concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/../stark-core/tests/data/pedersen_params.json"
);

const EXAMPLE_DAPP: &str = r#"{
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
}"#;

#[test]
fn sign_with_loaded_parameters_and_reverify() {
    let curve = CurveParameters::from_json_file(PARAMS).unwrap();
    let typed = TypedData::from_json_str(EXAMPLE_DAPP).unwrap();
    let account =
        field::parse_felt("0x02039385c3fc65cfd45e06e78d257d52e3141e590f253c1c5be09bb9dad24b5c")
            .unwrap();
    let kp = KeyPair::from_hex(
        "0x0139fe4d6f02e666e86a6f58e65060f115cd3c185bd9e98bd829636931458f79",
        &curve,
    )
    .unwrap();

    let hash = typed.message_hash(&curve, Some(&account)).unwrap();
    let sig = Signature::sign(&curve, &kp, &hash).unwrap();
    let payload = build_signing_payload(&curve, &typed, Some(&account), &sig, &kp.pk).unwrap();
    assert_eq!(
        payload.message_hash,
        "0x9d6d42d41503637bd91d30f9e75595c7c1b1719c5823908436c6c73b7dfdd6"
    );

    let path = std::env::temp_dir()
        .join(format!("stark-signer-flow-{}", std::process::id()))
        .join("payload.json");
    export_payload_json(&payload, &path).unwrap();
    let read_back = read_payload_json(&path).unwrap();
    std::fs::remove_dir_all(path.parent().unwrap()).ok();

    // The built-in parameters must agree with the loaded ones.
    assert_eq!(
        read_back.verify(CurveParameters::shared_stark()).unwrap(),
        VerifyResult::Valid
    );
}
