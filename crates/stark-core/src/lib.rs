pub mod curve;
pub mod error;
pub mod field;
pub mod keypair;
pub mod params;
pub mod pedersen;
pub mod rfc6979;
pub mod selector;
pub mod sign;
pub mod typed_data;
pub mod verify;

// Re-exports for convenience
pub use curve::{is_on_curve, y_from_x, StarkPoint};
pub use error::{DomainError, ResourceError, Result, StarkError};
pub use field::{Felt, Scalar};
pub use keypair::{derive_public_key, generate_private_key, KeyPair, PublicKey};
pub use params::CurveParameters;
pub use pedersen::{compute_hash_on_elements, hash_elements, pedersen_hash, HashChain};
pub use selector::{get_selector_from_name, starknet_keccak};
pub use sign::{sign, Signature};
pub use typed_data::{TypeMember, TypedData};
pub use verify::{verify, verify_batch, verify_xy, VerifyRequest, VerifyResult};
