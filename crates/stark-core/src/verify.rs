// ECDSA verification over the STARK curve.
//
// Given signature (r, s), public key Q and hash z:
//   1. w  = s⁻¹ mod n
//   2. R' = (z·w) · G + (r·w) · Q
//   3. Accept iff R'.x == r
//
// Wallets often publish only the x-coordinate of Q, so step 2 is repeated
// with -Q before rejecting. A signature that does not match is a normal
// `VerifyResult::Invalid`; only malformed inputs produce errors.

use num_traits::Zero;
#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::error::DomainError;
use crate::field::{self, Felt, Scalar};
use crate::keypair::PublicKey;
use crate::params::CurveParameters;
use crate::sign::Signature;

/// Result of signature verification.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VerifyResult {
    Valid,
    Invalid,
}

impl VerifyResult {
    pub fn is_valid(self) -> bool {
        self == VerifyResult::Valid
    }
}

impl From<bool> for VerifyResult {
    fn from(ok: bool) -> Self {
        if ok {
            VerifyResult::Valid
        } else {
            VerifyResult::Invalid
        }
    }
}

/// One entry of a batch verification.
#[derive(Clone, Copy, Debug)]
pub struct VerifyRequest {
    pub hash: Felt,
    pub signature: Signature,
    pub public_key: PublicKey,
}

/// Verify a signature against a public key and hash.
pub fn verify(
    curve: &CurveParameters,
    hash: &Felt,
    sig: &Signature,
    pk: &PublicKey,
) -> Result<VerifyResult, DomainError> {
    if !field::fits_ecdsa_bits(hash) {
        return Err(DomainError::ValueOutOfRange {
            what: "message hash",
            value: field::to_hex(hash),
        });
    }
    let r = component_scalar(&sig.r, "r")?;
    let s = component_scalar(&sig.s, "s")?;

    // Valid signers never emit r or w of 2^251 or more.
    if !field::fits_ecdsa_bits(&sig.r) {
        return Ok(VerifyResult::Invalid);
    }
    let w = field::invert(&s)?;
    if !field::fits_ecdsa_bits(&w) {
        return Ok(VerifyResult::Invalid);
    }

    let u1 = field::felt_to_scalar(hash) * w;
    let u2 = r * w;
    let g_part = curve.generator().mul_scalar(&u1, curve);
    let q = pk.point();

    for candidate in [q, q.neg()] {
        let r_prime = g_part.add(&candidate.mul_scalar(&u2, curve), curve);
        if r_prime.x() == Some(sig.r) {
            return Ok(VerifyResult::Valid);
        }
    }
    Ok(VerifyResult::Invalid)
}

/// Verify from raw components: `verify(hash, r, s, x, y) -> bool`.
///
/// `(x, y)` must lie on the curve.
pub fn verify_xy(
    curve: &CurveParameters,
    hash: &Felt,
    r: &Felt,
    s: &Felt,
    x: &Felt,
    y: &Felt,
) -> Result<bool, DomainError> {
    let pk = PublicKey::from_coords(*x, *y, curve)?;
    let sig = Signature { r: *r, s: *s };
    Ok(verify(curve, hash, &sig, &pk)?.is_valid())
}

/// Verify independent signatures, in parallel with the `parallel` feature.
/// Results line up with `requests`.
pub fn verify_batch(
    curve: &CurveParameters,
    requests: &[VerifyRequest],
) -> Vec<Result<VerifyResult, DomainError>> {
    let check = |req: &VerifyRequest| verify(curve, &req.hash, &req.signature, &req.public_key);

    #[cfg(feature = "parallel")]
    {
        requests.par_iter().map(check).collect()
    }
    #[cfg(not(feature = "parallel"))]
    {
        requests.iter().map(check).collect()
    }
}

/// Signature components must lie in [1, n).
fn component_scalar(value: &Felt, name: &'static str) -> Result<Scalar, DomainError> {
    let as_int = field::to_biguint(value);
    if as_int.is_zero() || as_int >= field::modulus::<Scalar>() {
        return Err(DomainError::InvalidSignatureComponent(name));
    }
    Ok(field::from_biguint_reduced(&as_int))
}
