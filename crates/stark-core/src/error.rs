// crates/stark-core/src/error.rs
//
// Error kinds surfaced by the engine.
//
// `DomainError` covers malformed mathematical input and misconfigured curve
// parameters. `ResourceError` covers entropy, parameter files and retry
// budgets. A signature that simply does not verify is never an error: `verify`
// returns `VerifyResult::Invalid` for that case.

use thiserror::Error;

/// Invalid mathematical input or inconsistent configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("element has no multiplicative inverse")]
    NotInvertible,

    #[error("point ({x}, {y}) is not on the curve")]
    PointNotOnCurve { x: String, y: String },

    #[error("{x} is not the x-coordinate of a curve point")]
    NoSquareRoot { x: String },

    #[error("cannot parse numeric string {0:?}")]
    InvalidNumber(String),

    #[error("{what} is out of range: {value}")]
    ValueOutOfRange { what: &'static str, value: String },

    #[error("signature component {0} must lie in [1, N)")]
    InvalidSignatureComponent(&'static str),

    #[error("nonce yields a zero or oversized signature component")]
    DegenerateNonce,

    #[error("type {type_name:?} has no value for field {field:?}")]
    MissingField { type_name: String, field: String },

    #[error("unknown type {0:?}")]
    UnknownType(String),

    #[error("value for field {field:?} does not match its type {expected}")]
    TypeMismatch { field: String, expected: String },

    #[error("malformed typed data: {0}")]
    InvalidTypedData(String),

    #[error("constant point table holds {available} points, {needed} required")]
    ConstantTableTooSmall { needed: usize, available: usize },

    #[error("invalid curve parameters: {0}")]
    InvalidParameters(String),
}

/// Failure to obtain a resource the operation cannot proceed without.
#[derive(Error, Debug)]
pub enum ResourceError {
    #[error("entropy source unavailable: {0}")]
    Entropy(#[from] rand::Error),

    #[error("cannot read curve parameters from {path}: {source}")]
    ParamsFile {
        path: String,
        source: std::io::Error,
    },

    #[error("{operation} gave up after {attempts} attempts")]
    RetriesExhausted {
        operation: &'static str,
        attempts: usize,
    },
}

#[derive(Error, Debug)]
pub enum StarkError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Resource(#[from] ResourceError),
}

impl StarkError {
    pub fn is_domain(&self) -> bool {
        matches!(self, StarkError::Domain(_))
    }

    pub fn is_resource(&self) -> bool {
        matches!(self, StarkError::Resource(_))
    }
}

pub type Result<T> = std::result::Result<T, StarkError>;
