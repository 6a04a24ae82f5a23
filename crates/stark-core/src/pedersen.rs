// crates/stark-core/src/pedersen.rs
//
// Pedersen hash over the STARK curve.
//
//   H(a_0, .., a_k) = x( shift + sum_i sum_j bit_j(a_i) * C[2 + 252*i + j] )
//
// where C is the constant point table from `CurveParameters`. The common
// two-input form uses slots 0 and 1; longer inputs are folded pairwise by
// `hash_elements` / `compute_hash_on_elements`, which is the array hash used
// by typed data.

use ark_ff::{BigInteger, PrimeField, Zero};

use crate::curve::JacobianPoint;
use crate::error::DomainError;
use crate::field::{Felt, N_ELEMENT_BITS_HASH};
use crate::params::{table_size_for, CurveParameters};

/// Pedersen hash of two field elements.
pub fn pedersen_hash(curve: &CurveParameters, a: &Felt, b: &Felt) -> Result<Felt, DomainError> {
    pedersen_hash_slots(curve, &[*a, *b])
}

/// Pedersen hash with one table slot per element.
///
/// Fails when the constant table is too small for `elements.len()` slots;
/// that signals misconfigured parameters rather than a bad input.
pub fn pedersen_hash_slots(
    curve: &CurveParameters,
    elements: &[Felt],
) -> Result<Felt, DomainError> {
    let table = curve.constant_points();
    let needed = table_size_for(elements.len());
    if table.len() < needed {
        return Err(DomainError::ConstantTableTooSmall {
            needed,
            available: table.len(),
        });
    }

    let mut acc = JacobianPoint::from_affine(&curve.shift_point());
    for (slot, element) in elements.iter().enumerate() {
        let start = 2 + slot * N_ELEMENT_BITS_HASH;
        let points = &table[start..start + N_ELEMENT_BITS_HASH];
        // elements are < p < 2^252, so the zip drops only zero bits
        let bits = element.into_bigint().to_bits_le();
        for (point, bit) in points.iter().zip(bits) {
            if bit {
                acc = acc.add_affine(point, curve);
            }
        }
    }

    acc.to_affine().x().ok_or_else(|| {
        DomainError::InvalidParameters("pedersen accumulation reached the identity".into())
    })
}

/// Left fold `h = H(h, e)` starting from zero.
pub fn hash_elements(curve: &CurveParameters, elements: &[Felt]) -> Result<Felt, DomainError> {
    elements
        .iter()
        .try_fold(Felt::zero(), |acc, element| pedersen_hash(curve, &acc, element))
}

/// `hash_elements` with the element count appended.
pub fn compute_hash_on_elements(
    curve: &CurveParameters,
    elements: &[Felt],
) -> Result<Felt, DomainError> {
    let mut chain = HashChain::new(curve);
    for element in elements {
        chain.update(element)?;
    }
    chain.finalize()
}

/// Incremental form of `compute_hash_on_elements`.
#[derive(Clone, Debug)]
pub struct HashChain<'a> {
    curve: &'a CurveParameters,
    hash: Felt,
    count: u64,
}

impl<'a> HashChain<'a> {
    pub fn new(curve: &'a CurveParameters) -> Self {
        HashChain {
            curve,
            hash: Felt::zero(),
            count: 0,
        }
    }

    pub fn update(&mut self, value: &Felt) -> Result<(), DomainError> {
        self.hash = pedersen_hash(self.curve, &self.hash, value)?;
        self.count += 1;
        Ok(())
    }

    pub fn len(&self) -> u64 {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn finalize(self) -> Result<Felt, DomainError> {
        pedersen_hash(self.curve, &self.hash, &Felt::from(self.count))
    }
}
