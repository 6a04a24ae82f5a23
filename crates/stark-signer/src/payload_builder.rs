use serde::{Deserialize, Serialize};
use std::path::Path;

use stark_core::field::{self, Felt};
use stark_core::keypair::PublicKey;
use stark_core::params::CurveParameters;
use stark_core::sign::Signature;
use stark_core::typed_data::TypedData;
use stark_core::verify::{verify, VerifyResult};
use stark_core::DomainError;

/// Everything an external wallet or verifier needs, as `0x` hex strings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SigningPayload {
    pub primary_type: String,
    pub domain_hash: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,
    pub message_hash: String,
    pub r: String,
    pub s: String,
    pub public_key_x: String,
    pub public_key_y: String,
}

pub fn build_signing_payload(
    curve: &CurveParameters,
    typed: &TypedData,
    account: Option<&Felt>,
    sig: &Signature,
    pk: &PublicKey,
) -> Result<SigningPayload, DomainError> {
    let message_hash = typed.message_hash(curve, account)?;
    let (r, s) = sig.to_hex();
    let (public_key_x, public_key_y) = pk.to_hex();

    Ok(SigningPayload {
        primary_type: typed.primary_type.clone(),
        domain_hash: field::to_hex(&typed.domain_hash(curve)?),
        account: account.map(field::to_hex),
        message_hash: field::to_hex(&message_hash),
        r,
        s,
        public_key_x,
        public_key_y,
    })
}

impl SigningPayload {
    /// Re-check the recorded signature against the recorded hash and key.
    pub fn verify(&self, curve: &CurveParameters) -> Result<VerifyResult, DomainError> {
        let hash = field::parse_felt(&self.message_hash)?;
        let sig = Signature::from_hex(&self.r, &self.s)?;
        let pk = PublicKey::from_coords(
            field::parse_felt(&self.public_key_x)?,
            field::parse_felt(&self.public_key_y)?,
            curve,
        )?;
        verify(curve, &hash, &sig, &pk)
    }
}

/// Write the payload as pretty JSON, creating parent directories.
pub fn export_payload_json(payload: &SigningPayload, output_path: &Path) -> std::io::Result<()> {
    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let json_str = serde_json::to_string_pretty(payload)?;
    std::fs::write(output_path, json_str)
}

pub fn read_payload_json(path: &Path) -> std::io::Result<SigningPayload> {
    let text = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
