// crates/stark-core/src/params.rs
//
// Curve parameters shared read-only by every operation.
//
// The constant point table uses the `pedersen_params.json` layout:
//
//   [0]                      shift point
//   [1]                      generator G
//   [2 + 252*i ..+248]       2^j * P_{2i}     (low 248 bits of input slot i)
//   [2 + 252*i + 248 ..+4]   2^j * P_{2i+1}   (high 4 bits of input slot i)
//
// `CurveParameters::stark()` derives the table from the four published base
// points; `from_json_str` / `from_json_file` accept a table from elsewhere and
// validate it before use.

use std::path::Path;

use ark_ff::MontFp;
use num_bigint::BigUint;
use once_cell::sync::Lazy;
use serde::Deserialize;
use serde_json::Value;

use crate::curve::StarkPoint;
use crate::error::{DomainError, ResourceError, Result};
use crate::field::{self, Felt, Scalar, N_ELEMENT_BITS_HASH};

/// Bits of each input slot taken from the first base point.
pub const LOW_PART_BITS: usize = 248;

/// Input slots covered by the standard table.
pub const STANDARD_SLOTS: usize = 2;

pub const CURVE_ALPHA: Felt = MontFp!("1");

pub const CURVE_BETA: Felt =
    MontFp!("3141592653589793238462643383279502884197169399375105820974944592307816406665");

pub const GENERATOR_X: Felt =
    MontFp!("874739451078007766457464989774322083649278607533249481151382481072868806602");
pub const GENERATOR_Y: Felt =
    MontFp!("152666792071518830868575557812948353041420400780739481342941381225525861407");

pub const SHIFT_POINT_X: Felt =
    MontFp!("2089986280348253421170679821480865132823066470938446095505822317253594081284");
pub const SHIFT_POINT_Y: Felt =
    MontFp!("1713931329540660377023406109199410414810705867260802078187082345529207694986");

/// Pedersen base points P0..P3.
pub const PEDERSEN_POINTS: [(Felt, Felt); 4] = [
    (
        MontFp!("996781205833008774514500082376783249102396023663454813447423147977397232763"),
        MontFp!("1668503676786377725805489344771023921079126552019160156920634619255970485781"),
    ),
    (
        MontFp!("2251563274489750535117886426533222435294046428347329203627021249169616184184"),
        MontFp!("1798716007562728905295480679789526322175868328062420237419143593021674992973"),
    ),
    (
        MontFp!("2138414695194151160943305727036575959195309218611738193261179310511854807447"),
        MontFp!("113410276730064486255102093846540133784865286929052426931474106396135072156"),
    ),
    (
        MontFp!("2379962749567351885752724891227938183011949129833673362440656643086021394946"),
        MontFp!("776496453633298175483985398648758586525933812536653089401905292063708816422"),
    ),
];

static SHARED_STARK: Lazy<CurveParameters> = Lazy::new(CurveParameters::stark);

/// Number of constant points needed to hash `slots` elements at once.
pub fn table_size_for(slots: usize) -> usize {
    2 + N_ELEMENT_BITS_HASH * slots
}

/// Immutable curve configuration.
#[derive(Clone, Debug)]
pub struct CurveParameters {
    prime: BigUint,
    order: BigUint,
    field_gen: BigUint,
    alpha: Felt,
    beta: Felt,
    constant_points: Vec<StarkPoint>,
}

/// `pedersen_params.json` as found on disk. Scalars may be JSON numbers of
/// any size or numeric strings.
#[derive(Deserialize)]
struct RawParams {
    #[serde(rename = "FIELD_PRIME")]
    field_prime: Value,
    #[serde(rename = "FIELD_GEN", default)]
    field_gen: Option<Value>,
    #[serde(rename = "EC_ORDER")]
    ec_order: Value,
    #[serde(rename = "ALPHA")]
    alpha: Value,
    #[serde(rename = "BETA")]
    beta: Value,
    #[serde(rename = "CONSTANT_POINTS")]
    constant_points: Vec<[Value; 2]>,
}

impl CurveParameters {
    /// Built-in STARK curve parameters with the standard two-slot table.
    pub fn stark() -> Self {
        let mut constant_points = Vec::with_capacity(table_size_for(STANDARD_SLOTS));
        constant_points.push(StarkPoint::new_unchecked(SHIFT_POINT_X, SHIFT_POINT_Y));
        constant_points.push(StarkPoint::new_unchecked(GENERATOR_X, GENERATOR_Y));

        let mut params = CurveParameters {
            prime: field::modulus::<Felt>(),
            order: field::modulus::<Scalar>(),
            field_gen: BigUint::from(3u32),
            alpha: CURVE_ALPHA,
            beta: CURVE_BETA,
            constant_points,
        };

        let mut table = Vec::with_capacity(N_ELEMENT_BITS_HASH * STANDARD_SLOTS);
        for pair in PEDERSEN_POINTS.chunks(2) {
            let counts = [LOW_PART_BITS, N_ELEMENT_BITS_HASH - LOW_PART_BITS];
            for (&(x, y), count) in pair.iter().zip(counts) {
                let mut point = StarkPoint::new_unchecked(x, y);
                for _ in 0..count {
                    table.push(point);
                    point = point.double(&params);
                }
            }
        }
        params.constant_points.extend(table);
        params
    }

    /// Process-wide built-in parameters, constructed on first use.
    pub fn shared_stark() -> &'static CurveParameters {
        &SHARED_STARK
    }

    /// Assemble and validate parameters from raw integers.
    pub fn from_parts(
        prime: BigUint,
        order: BigUint,
        field_gen: Option<BigUint>,
        alpha: BigUint,
        beta: BigUint,
        points: Vec<(BigUint, BigUint)>,
    ) -> std::result::Result<Self, DomainError> {
        let constant_points = points
            .iter()
            .map(|(x, y)| {
                Ok(StarkPoint::new_unchecked(
                    field::from_biguint(x)?,
                    field::from_biguint(y)?,
                ))
            })
            .collect::<std::result::Result<Vec<_>, DomainError>>()?;

        let params = CurveParameters {
            prime,
            order,
            field_gen: field_gen.unwrap_or_else(|| BigUint::from(3u32)),
            alpha: field::from_biguint(&alpha)?,
            beta: field::from_biguint(&beta)?,
            constant_points,
        };
        params.validate()?;
        Ok(params)
    }

    pub fn from_json_str(text: &str) -> std::result::Result<Self, DomainError> {
        let raw: RawParams = serde_json::from_str(text)
            .map_err(|e| DomainError::InvalidParameters(format!("malformed parameter JSON: {e}")))?;

        let points = raw
            .constant_points
            .iter()
            .map(|[x, y]| {
                Ok((
                    json_integer(x, "CONSTANT_POINTS")?,
                    json_integer(y, "CONSTANT_POINTS")?,
                ))
            })
            .collect::<std::result::Result<Vec<_>, DomainError>>()?;

        let field_gen = raw
            .field_gen
            .as_ref()
            .map(|v| json_integer(v, "FIELD_GEN"))
            .transpose()?;

        Self::from_parts(
            json_integer(&raw.field_prime, "FIELD_PRIME")?,
            json_integer(&raw.ec_order, "EC_ORDER")?,
            field_gen,
            json_integer(&raw.alpha, "ALPHA")?,
            json_integer(&raw.beta, "BETA")?,
            points,
        )
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        log::debug!("loading curve parameters from {}", path.display());
        let text = std::fs::read_to_string(path).map_err(|source| ResourceError::ParamsFile {
            path: path.display().to_string(),
            source,
        })?;
        Ok(Self::from_json_str(&text)?)
    }

    /// Check internal consistency: compiled fields, table shape, every
    /// constant on the curve, and a generator of order n.
    pub fn validate(&self) -> std::result::Result<(), DomainError> {
        if self.prime != field::modulus::<Felt>() {
            return Err(DomainError::InvalidParameters(format!(
                "field prime {:#x} is not the STARK prime",
                self.prime
            )));
        }
        if self.order != field::modulus::<Scalar>() {
            return Err(DomainError::InvalidParameters(format!(
                "curve order {:#x} is not the STARK curve order",
                self.order
            )));
        }
        if self.field_gen != BigUint::from(3u32) {
            return Err(DomainError::InvalidParameters(format!(
                "field generator {} does not match the compiled field",
                self.field_gen
            )));
        }

        let needed = table_size_for(STANDARD_SLOTS);
        let available = self.constant_points.len();
        if available < needed {
            return Err(DomainError::ConstantTableTooSmall { needed, available });
        }
        if (available - 2) % N_ELEMENT_BITS_HASH != 0 {
            return Err(DomainError::InvalidParameters(format!(
                "constant table of {available} points is not 2 + {N_ELEMENT_BITS_HASH}*k"
            )));
        }

        for (index, point) in self.constant_points.iter().enumerate() {
            if point.is_identity() || !point.is_on_curve(self) {
                return Err(DomainError::InvalidParameters(format!(
                    "constant point {index} is not on the curve"
                )));
            }
        }

        // (n-1)*G + G must close the group; n itself reduces to zero
        let generator = self.generator();
        let n_minus_one = generator.mul_biguint(&(self.order.clone() - 1u32), self);
        if n_minus_one != generator.neg() {
            return Err(DomainError::InvalidParameters(
                "generator does not have the curve order".into(),
            ));
        }

        log::debug!(
            "curve parameters valid: {} constant points, {} hash slots",
            available,
            self.hash_slots()
        );
        Ok(())
    }

    pub fn prime(&self) -> &BigUint {
        &self.prime
    }

    pub fn order(&self) -> &BigUint {
        &self.order
    }

    pub fn alpha(&self) -> Felt {
        self.alpha
    }

    pub fn beta(&self) -> Felt {
        self.beta
    }

    pub fn generator(&self) -> StarkPoint {
        self.constant_points[1]
    }

    pub fn shift_point(&self) -> StarkPoint {
        self.constant_points[0]
    }

    pub fn constant_points(&self) -> &[StarkPoint] {
        &self.constant_points
    }

    /// How many elements a single Pedersen evaluation can absorb.
    pub fn hash_slots(&self) -> usize {
        self.constant_points.len().saturating_sub(2) / N_ELEMENT_BITS_HASH
    }
}

fn json_integer(value: &Value, key: &'static str) -> std::result::Result<BigUint, DomainError> {
    match value {
        Value::String(text) => field::parse_biguint(text),
        Value::Number(number) => field::parse_biguint(&number.to_string()),
        other => Err(DomainError::InvalidParameters(format!(
            "{key}: expected an integer, found {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_parameters_validate() {
        let params = CurveParameters::stark();
        params.validate().expect("built-in parameters are consistent");
        assert_eq!(params.constant_points().len(), 506);
        assert_eq!(params.hash_slots(), 2);
    }

    #[test]
    fn table_entries_are_doublings() {
        let params = CurveParameters::shared_stark();
        let table = params.constant_points();
        let (p0x, p0y) = PEDERSEN_POINTS[0];
        let p0 = StarkPoint::new_unchecked(p0x, p0y);

        assert_eq!(table[2], p0);
        assert_eq!(table[3], p0.double(params));
        assert_eq!(
            table[2 + 10],
            p0.mul_scalar(&Scalar::from(1u64 << 10), params)
        );

        let (p3x, p3y) = PEDERSEN_POINTS[3];
        assert_eq!(table[2 + 252 + 248], StarkPoint::new_unchecked(p3x, p3y));
    }

    #[test]
    fn wrong_prime_is_rejected() {
        let params = CurveParameters::shared_stark();
        let err = CurveParameters::from_parts(
            params.prime().clone() + 2u32,
            params.order().clone(),
            None,
            BigUint::from(1u32),
            field::to_biguint(&params.beta()),
            vec![],
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::InvalidParameters(_)));
    }

    #[test]
    fn undersized_table_is_rejected() {
        let params = CurveParameters::shared_stark();
        let points = params.constant_points()[..300]
            .iter()
            .map(|p| {
                let (x, y) = p.coords().unwrap();
                (field::to_biguint(&x), field::to_biguint(&y))
            })
            .collect();
        let err = CurveParameters::from_parts(
            params.prime().clone(),
            params.order().clone(),
            None,
            BigUint::from(1u32),
            field::to_biguint(&params.beta()),
            points,
        )
        .unwrap_err();
        assert_eq!(
            err,
            DomainError::ConstantTableTooSmall {
                needed: 506,
                available: 300
            }
        );
    }

    #[test]
    fn off_curve_constant_is_rejected() {
        let params = CurveParameters::shared_stark();
        let mut points: Vec<(BigUint, BigUint)> = params
            .constant_points()
            .iter()
            .map(|p| {
                let (x, y) = p.coords().unwrap();
                (field::to_biguint(&x), field::to_biguint(&y))
            })
            .collect();
        points[7].1 += 1u32;

        let err = CurveParameters::from_parts(
            params.prime().clone(),
            params.order().clone(),
            Some(BigUint::from(3u32)),
            BigUint::from(1u32),
            field::to_biguint(&params.beta()),
            points,
        )
        .unwrap_err();
        assert_eq!(
            err,
            DomainError::InvalidParameters("constant point 7 is not on the curve".into())
        );
    }

    #[test]
    fn short_json_table_is_rejected() {
        let text = r#"{
            "FIELD_PRIME": 3618502788666131213697322783095070105623107215331596699973092056135872020481,
            "FIELD_GEN": 3,
            "EC_ORDER": "0x800000000000010ffffffffffffffffb781126dcae7b2321e66a241adc64d2f",
            "ALPHA": 1,
            "BETA": "0x6f21413efbe40de150e596d72f7a8c5609ad26c15c915c1f4cdfcb99cee9e89",
            "CONSTANT_POINTS": [["0x1", "0x2"]]
        }"#;
        // Table size is checked before point validity.
        let err = CurveParameters::from_json_str(text).unwrap_err();
        assert!(matches!(err, DomainError::ConstantTableTooSmall { .. }));
    }

    #[test]
    fn malformed_json_is_rejected() {
        let err = CurveParameters::from_json_str("{\"FIELD_PRIME\": true}").unwrap_err();
        assert!(matches!(err, DomainError::InvalidParameters(_)));
    }

    #[test]
    fn missing_file_is_a_resource_error() {
        let err = CurveParameters::from_json_file("/nonexistent/pedersen_params.json").unwrap_err();
        assert!(err.is_resource());
    }
}
