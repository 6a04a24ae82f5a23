// crates/stark-core/src/rfc6979.rs
//
// Deterministic nonces (RFC 6979, HMAC-SHA256) over the curve order n.
//
// Two details keep the output identical to the StarkWare reference signer:
//   - a hash one nibble short of a byte boundary (bit length >= 248 and
//     bit length mod 8 in 1..=4) is shifted left by 4 bits first;
//   - the retry seed is passed as extra entropy in minimal big-endian form
//     (no seed on the first attempt, then 1, 2, ...).

use hmac::{Hmac, Mac};
use num_bigint::BigUint;
use num_traits::Zero;
use sha2::Sha256;

use crate::field::{self, Scalar};

type HmacSha256 = Hmac<Sha256>;

/// Bit length of n.
const QLEN: u64 = 252;

/// Byte length of n.
const ROLEN: usize = 32;

/// Generate the nonce for `message_hash` under `private_key`.
pub fn generate_k(message_hash: &BigUint, private_key: &Scalar, seed: Option<u64>) -> Scalar {
    let order = field::modulus::<Scalar>();

    let mut msg = message_hash.clone();
    let bits = msg.bits();
    if bits >= 248 && (1..=4).contains(&(bits % 8)) {
        msg <<= 4;
    }
    let data = minimal_be_bytes(&msg);
    let extra = seed
        .map(|s| minimal_be_bytes(&BigUint::from(s)))
        .unwrap_or_default();

    // bits2octets
    let z1 = bits2int(&data);
    let z2 = if z1 >= order { z1 - &order } else { z1 };

    let mut bx = Vec::with_capacity(2 * ROLEN + extra.len());
    bx.extend_from_slice(&fixed_be_bytes(&field::to_biguint(private_key)));
    bx.extend_from_slice(&fixed_be_bytes(&z2));
    bx.extend_from_slice(&extra);

    let mut v = [0x01u8; 32];
    let mut k = [0x00u8; 32];
    k = hmac_sha256(&k, &[&v[..], &[0x00u8][..], &bx[..]]);
    v = hmac_sha256(&k, &[&v[..]]);
    k = hmac_sha256(&k, &[&v[..], &[0x01u8][..], &bx[..]]);
    v = hmac_sha256(&k, &[&v[..]]);

    loop {
        v = hmac_sha256(&k, &[&v[..]]);
        let candidate = bits2int(&v);
        if !candidate.is_zero() && candidate < order {
            return field::from_biguint_reduced(&candidate);
        }
        k = hmac_sha256(&k, &[&v[..], &[0x00u8][..]]);
        v = hmac_sha256(&k, &[&v[..]]);
    }
}

fn hmac_sha256(key: &[u8], parts: &[&[u8]]) -> [u8; 32] {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC takes keys of any length");
    for part in parts {
        mac.update(part);
    }
    let mut out = [0u8; 32];
    out.copy_from_slice(&mac.finalize().into_bytes());
    out
}

/// Big-endian integer from the leftmost QLEN bits of `data`.
fn bits2int(data: &[u8]) -> BigUint {
    let value = BigUint::from_bytes_be(data);
    let len = data.len() as u64 * 8;
    if len > QLEN {
        value >> (len - QLEN)
    } else {
        value
    }
}

/// Zero has no bytes.
fn minimal_be_bytes(value: &BigUint) -> Vec<u8> {
    if value.is_zero() {
        Vec::new()
    } else {
        value.to_bytes_be()
    }
}

fn fixed_be_bytes(value: &BigUint) -> [u8; ROLEN] {
    let bytes = value.to_bytes_be();
    let mut out = [0u8; ROLEN];
    let start = ROLEN.saturating_sub(bytes.len());
    out[start..].copy_from_slice(&bytes[bytes.len().saturating_sub(ROLEN)..]);
    out
}
