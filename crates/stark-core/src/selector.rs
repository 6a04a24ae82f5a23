// crates/stark-core/src/selector.rs
//
// StarkNet keccak: keccak-256 truncated to its low 250 bits, used for type
// hashes in typed data and for entry-point selectors.

use ark_ff::PrimeField;
use sha3::{Digest, Keccak256};

use crate::field::Felt;

pub fn starknet_keccak(data: &[u8]) -> Felt {
    let mut digest = Keccak256::digest(data);
    // big-endian: clear the top 6 bits
    digest[0] &= 0x03;
    Felt::from_be_bytes_mod_order(&digest)
}

pub fn get_selector_from_name(name: &str) -> Felt {
    starknet_keccak(name.as_bytes())
}
