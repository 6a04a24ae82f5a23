// ECDSA signing over the STARK curve.
//
// Signing a hash z (< 2^251) with private key d:
//   1. k = rfc6979(z, d, seed)     deterministic, seed = None, 1, 2, ...
//   2. r = (k · G).x               must lie in [1, 2^251)
//   3. w = k / (z + r·d)  mod n    must lie in [1, 2^251)
//   4. s = w⁻¹ = (z + r·d) / k
//   5. Signature = (r, s)
//
// A nonce that breaks step 2 or 3 is replaced by the next seed. The bounds on
// r and w are what the on-chain verifier accepts, so they are enforced here
// rather than only the r != 0, s != 0 conditions of textbook ECDSA.

use rand::{CryptoRng, RngCore};

use crate::error::{DomainError, ResourceError, Result};
use crate::field::{self, Felt, Scalar};
use crate::keypair::{self, KeyPair};
use crate::params::CurveParameters;
use crate::rfc6979::generate_k;

/// Nonces tried before signing gives up. A nonce is rejected only when r or w
/// lands in [2^251, n), about 17·2^-59 each, so even one retry is rare.
pub const MAX_SIGN_ATTEMPTS: usize = 64;

/// An ECDSA signature (r, s) over the STARK curve.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Signature {
    /// x-coordinate of k · G.
    pub r: Felt,
    /// (z + r·d) / k mod n.
    pub s: Felt,
}

impl Signature {
    /// Sign with the keypair's private key (deterministic nonce).
    pub fn sign(curve: &CurveParameters, keypair: &KeyPair, hash: &Felt) -> Result<Self> {
        sign(curve, hash, &keypair.sk)
    }

    /// Sign with an explicit nonce. **Only for testing**: reusing a nonce
    /// across two hashes leaks the private key.
    pub fn sign_with_nonce(
        curve: &CurveParameters,
        keypair: &KeyPair,
        hash: &Felt,
        k: &Scalar,
    ) -> std::result::Result<Self, DomainError> {
        sign_with_nonce(curve, hash, &keypair.sk, k)
    }

    /// Parse decimal or `0x` hex components. Range checks happen in `verify`.
    pub fn from_hex(r: &str, s: &str) -> std::result::Result<Self, DomainError> {
        Ok(Signature {
            r: field::parse_felt(r)?,
            s: field::parse_felt(s)?,
        })
    }

    pub fn to_hex(&self) -> (String, String) {
        (field::to_hex(&self.r), field::to_hex(&self.s))
    }
}

/// Sign `hash` with `private_key`, deriving nonces per RFC 6979.
pub fn sign(curve: &CurveParameters, hash: &Felt, private_key: &Scalar) -> Result<Signature> {
    check_hash(hash)?;
    let z = field::to_biguint(hash);
    sign_loop(curve, hash, private_key, |attempt| {
        let seed = if attempt == 0 {
            None
        } else {
            Some(attempt as u64)
        };
        Ok(generate_k(&z, private_key, seed))
    })
}

/// Sign with nonces drawn from `rng` instead of RFC 6979.
pub fn sign_with_rng<R: RngCore + CryptoRng>(
    curve: &CurveParameters,
    hash: &Felt,
    private_key: &Scalar,
    rng: &mut R,
) -> Result<Signature> {
    check_hash(hash)?;
    sign_loop(curve, hash, private_key, |_| keypair::random_scalar(rng))
}

/// Try nonces from `next_k` until one yields a usable signature, at most
/// `MAX_SIGN_ATTEMPTS` times.
fn sign_loop(
    curve: &CurveParameters,
    hash: &Felt,
    private_key: &Scalar,
    mut next_k: impl FnMut(usize) -> Result<Scalar>,
) -> Result<Signature> {
    for attempt in 0..MAX_SIGN_ATTEMPTS {
        let k = next_k(attempt)?;
        match try_sign(curve, hash, private_key, &k) {
            Some(signature) => return Ok(signature),
            None => log::trace!("nonce rejected on attempt {}, retrying", attempt + 1),
        }
    }
    Err(ResourceError::RetriesExhausted {
        operation: "signing",
        attempts: MAX_SIGN_ATTEMPTS,
    }
    .into())
}

/// Single signing attempt with a caller-chosen nonce.
pub fn sign_with_nonce(
    curve: &CurveParameters,
    hash: &Felt,
    private_key: &Scalar,
    k: &Scalar,
) -> std::result::Result<Signature, DomainError> {
    check_hash(hash)?;
    try_sign(curve, hash, private_key, k).ok_or(DomainError::DegenerateNonce)
}

fn check_hash(hash: &Felt) -> std::result::Result<(), DomainError> {
    if field::fits_ecdsa_bits(hash) {
        Ok(())
    } else {
        Err(DomainError::ValueOutOfRange {
            what: "message hash",
            value: field::to_hex(hash),
        })
    }
}

/// `None` when `k` produces an unusable r or w.
fn try_sign(curve: &CurveParameters, hash: &Felt, d: &Scalar, k: &Scalar) -> Option<Signature> {
    let r = curve.generator().mul_scalar(k, curve).x()?;
    if r == Felt::from(0u64) || !field::fits_ecdsa_bits(&r) {
        return None;
    }

    // z and r are below 2^251 < n, so the conversions do not reduce
    let z_rd = field::felt_to_scalar(hash) + field::felt_to_scalar(&r) * d;
    let w = *k * field::invert(&z_rd).ok()?;
    if w == Scalar::from(0u64) || !field::fits_ecdsa_bits(&w) {
        return None;
    }

    let s = field::invert(&w).ok()?;
    Some(Signature {
        r,
        s: field::scalar_to_felt(&s),
    })
}
