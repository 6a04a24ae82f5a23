// crates/stark-core/src/field.rs
//
// Prime fields of the STARK curve.
//
//   Felt   = F_p, p = 2^251 + 17·2^192 + 1   (coordinates, hashes)
//   Scalar = Z_n, n = curve order              (private keys, nonces, r, s)
//
// Both are fixed-width 256-bit Montgomery fields, so every value produced by
// the ark-ff operators is already reduced. Numbers cross the API boundary as
// decimal or 0x-prefixed hex strings; output is always 0x-prefixed hex.

use ark_ff::fields::{Fp256, MontBackend, MontConfig};
use ark_ff::{BigInteger, Field, PrimeField};
use num_bigint::BigUint;
use num_traits::Num;

use crate::error::DomainError;

#[derive(MontConfig)]
#[modulus = "3618502788666131213697322783095070105623107215331596699973092056135872020481"]
#[generator = "3"]
pub struct FeltConfig;
pub type Felt = Fp256<MontBackend<FeltConfig, 4>>;

#[derive(MontConfig)]
#[modulus = "3618502788666131213697322783095070105526743751716087489154079457884512865583"]
#[generator = "3"]
pub struct ScalarConfig;
pub type Scalar = Fp256<MontBackend<ScalarConfig, 4>>;

/// Field prime p (decimal).
pub const FIELD_PRIME: &str =
    "3618502788666131213697322783095070105623107215331596699973092056135872020481";

/// Curve order n (decimal).
pub const EC_ORDER: &str =
    "3618502788666131213697322783095070105526743751716087489154079457884512865583";

/// Message hashes, r and w must be below 2^251.
pub const N_ELEMENT_BITS_ECDSA: u64 = 251;

/// Bits consumed per Pedersen input slot.
pub const N_ELEMENT_BITS_HASH: usize = 252;

/// Parse a non-negative integer from decimal or `0x`-prefixed hex text.
pub fn parse_biguint(text: &str) -> Result<BigUint, DomainError> {
    let trimmed = text.trim();
    let (digits, radix) = match trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        Some(hex) => (hex, 16),
        None => (trimmed, 10),
    };

    // from_str_radix tolerates '+' and '_', which are not valid interchange
    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return Err(DomainError::InvalidNumber(text.to_string()));
    }
    BigUint::from_str_radix(digits, radix)
        .map_err(|_| DomainError::InvalidNumber(text.to_string()))
}

/// The modulus of `F` as a `BigUint`.
pub fn modulus<F: PrimeField>() -> BigUint {
    BigUint::from_bytes_le(&F::MODULUS.to_bytes_le())
}

pub fn to_biguint<F: PrimeField>(f: &F) -> BigUint {
    BigUint::from_bytes_le(&f.into_bigint().to_bytes_le())
}

/// Convert without reduction; values at or above the modulus are rejected.
pub fn from_biguint<F: PrimeField>(value: &BigUint) -> Result<F, DomainError> {
    if *value >= modulus::<F>() {
        return Err(DomainError::ValueOutOfRange {
            what: "field element",
            value: format!("{value:#x}"),
        });
    }
    Ok(F::from_le_bytes_mod_order(&value.to_bytes_le()))
}

pub fn from_biguint_reduced<F: PrimeField>(value: &BigUint) -> F {
    F::from_le_bytes_mod_order(&value.to_bytes_le())
}

pub fn parse_felt(text: &str) -> Result<Felt, DomainError> {
    from_biguint(&parse_biguint(text)?)
}

pub fn parse_scalar(text: &str) -> Result<Scalar, DomainError> {
    from_biguint(&parse_biguint(text)?)
}

/// Lowercase `0x` hex with no leading zeros (`0x0` for zero).
pub fn to_hex<F: PrimeField>(f: &F) -> String {
    format!("{:#x}", to_biguint(f))
}

pub fn to_dec_string<F: PrimeField>(f: &F) -> String {
    to_biguint(f).to_string()
}

/// Multiplicative inverse; zero has none.
pub fn invert<F: Field>(x: &F) -> Result<F, DomainError> {
    x.inverse().ok_or(DomainError::NotInvertible)
}

/// Reduce a field element modulo the curve order.
pub fn felt_to_scalar(f: &Felt) -> Scalar {
    Scalar::from_le_bytes_mod_order(&f.into_bigint().to_bytes_le())
}

/// Every scalar is below n < p, so this never reduces.
pub fn scalar_to_felt(s: &Scalar) -> Felt {
    Felt::from_le_bytes_mod_order(&s.into_bigint().to_bytes_le())
}

/// True when the integer value of `f` is below 2^251.
pub fn fits_ecdsa_bits<F: PrimeField>(f: &F) -> bool {
    to_biguint(f).bits() <= N_ELEMENT_BITS_ECDSA
}

pub fn is_odd<F: PrimeField>(f: &F) -> bool {
    f.into_bigint().is_odd()
}
