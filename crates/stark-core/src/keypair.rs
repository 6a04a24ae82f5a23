// Key generation for ECDSA over the STARK curve.
//
// Private key: random scalar d in [1, n)
// Public key:  Q = d · G

use std::fmt;

use ark_ff::Zero;
use num_bigint::BigUint;
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};

use crate::curve::StarkPoint;
use crate::error::{DomainError, ResourceError, Result};
use crate::field::{self, Felt, Scalar};
use crate::params::CurveParameters;

/// Rejection-sampling budget for random scalars. Each draw succeeds with
/// probability about 1/2.
const MAX_SAMPLE_ATTEMPTS: usize = 128;

/// A STARK curve keypair.
#[derive(Clone)]
pub struct KeyPair {
    /// Secret scalar d in [1, n).
    pub sk: Scalar,
    /// Public key Q = d · G.
    pub pk: PublicKey,
}

/// A public key: an affine point other than the identity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PublicKey {
    x: Felt,
    y: Felt,
}

impl KeyPair {
    /// Generate a fresh keypair from the operating system's entropy source.
    pub fn generate(curve: &CurveParameters) -> Result<Self> {
        Self::generate_with_rng(curve, &mut OsRng)
    }

    pub fn generate_with_rng<R: RngCore + CryptoRng>(
        curve: &CurveParameters,
        rng: &mut R,
    ) -> Result<Self> {
        let sk = random_scalar(rng)?;
        Ok(Self::from_private_key(sk, curve)?)
    }

    /// Derive a keypair from an existing private scalar.
    pub fn from_private_key(
        sk: Scalar,
        curve: &CurveParameters,
    ) -> std::result::Result<Self, DomainError> {
        let pk = derive_public_key(&sk, curve)?;
        Ok(KeyPair { sk, pk })
    }

    /// Parse a decimal or 0x-prefixed private key.
    pub fn from_hex(text: &str, curve: &CurveParameters) -> std::result::Result<Self, DomainError> {
        Self::from_private_key(field::parse_scalar(text)?, curve)
    }

    pub fn private_key_hex(&self) -> String {
        field::to_hex(&self.sk)
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("sk", &"<redacted>")
            .field("pk", &self.pk)
            .finish()
    }
}

impl PublicKey {
    /// Validate externally supplied coordinates.
    pub fn from_coords(
        x: Felt,
        y: Felt,
        curve: &CurveParameters,
    ) -> std::result::Result<Self, DomainError> {
        StarkPoint::from_coords(x, y, curve)?;
        Ok(PublicKey { x, y })
    }

    /// Recover a key from its x-coordinate alone, taking the even root.
    /// Verification accepts either root, so this loses nothing there.
    pub fn from_x(x: Felt, curve: &CurveParameters) -> std::result::Result<Self, DomainError> {
        let y = crate::curve::y_from_x(&x, curve)?;
        Ok(PublicKey { x, y })
    }

    pub fn from_hex(
        x: &str,
        y: &str,
        curve: &CurveParameters,
    ) -> std::result::Result<Self, DomainError> {
        Self::from_coords(field::parse_felt(x)?, field::parse_felt(y)?, curve)
    }

    pub fn coords(&self) -> (Felt, Felt) {
        (self.x, self.y)
    }

    pub fn point(&self) -> StarkPoint {
        StarkPoint::new_unchecked(self.x, self.y)
    }

    pub fn to_hex(&self) -> (String, String) {
        (field::to_hex(&self.x), field::to_hex(&self.y))
    }
}

/// Q = d · G. Zero has no public key.
pub fn derive_public_key(
    sk: &Scalar,
    curve: &CurveParameters,
) -> std::result::Result<PublicKey, DomainError> {
    if sk.is_zero() {
        return Err(DomainError::ValueOutOfRange {
            what: "private key",
            value: "0x0".into(),
        });
    }
    let (x, y) = curve
        .generator()
        .mul_scalar(sk, curve)
        .coords()
        .ok_or(DomainError::NotInvertible)?;
    Ok(PublicKey { x, y })
}

/// A private key drawn from the operating system's entropy source.
pub fn generate_private_key() -> Result<Scalar> {
    random_scalar(&mut OsRng)
}

/// Uniform scalar in [1, n): 252-bit draws with rejection.
pub fn random_scalar<R: RngCore + CryptoRng>(rng: &mut R) -> Result<Scalar> {
    let order = field::modulus::<Scalar>();
    let mut buf = [0u8; 32];
    for _ in 0..MAX_SAMPLE_ATTEMPTS {
        rng.try_fill_bytes(&mut buf).map_err(ResourceError::Entropy)?;
        buf[0] &= 0x0f;
        let candidate = BigUint::from_bytes_be(&buf);
        if !candidate.is_zero() && candidate < order {
            return Ok(field::from_biguint_reduced(&candidate));
        }
    }
    Err(ResourceError::RetriesExhausted {
        operation: "scalar sampling",
        attempts: MAX_SAMPLE_ATTEMPTS,
    }
    .into())
}
