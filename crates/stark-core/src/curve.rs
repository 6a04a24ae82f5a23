// crates/stark-core/src/curve.rs
//
// STARK curve arithmetic.
//
// Short Weierstrass curve over F_p:   y^2 = x^3 + alpha*x + beta
//   alpha = 1
//   beta  = 0x06f21413efbe40de150e596d72f7a8c5609ad26c15c915c1f4cdfcb99cee9e89
//   prime order n, cofactor 1
//
// Public points are affine with an explicit identity. Scalar multiplication
// and Pedersen accumulation run in Jacobian coordinates and pay for a single
// inversion when converting back.

use ark_ff::{BigInteger, Field, PrimeField, Zero};
use num_bigint::BigUint;

use crate::error::DomainError;
use crate::field::{self, Felt, Scalar};
use crate::params::CurveParameters;

/// A point on the STARK curve, or the point at infinity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StarkPoint {
    Identity,
    Affine { x: Felt, y: Felt },
}

impl StarkPoint {
    pub fn identity() -> Self {
        StarkPoint::Identity
    }

    /// Build a point without checking the curve equation.
    ///
    /// Only for constants that are known to be valid.
    pub const fn new_unchecked(x: Felt, y: Felt) -> Self {
        StarkPoint::Affine { x, y }
    }

    /// Build a point from externally supplied coordinates.
    pub fn from_coords(x: Felt, y: Felt, curve: &CurveParameters) -> Result<Self, DomainError> {
        if !is_on_curve(&x, &y, curve) {
            return Err(DomainError::PointNotOnCurve {
                x: field::to_hex(&x),
                y: field::to_hex(&y),
            });
        }
        Ok(StarkPoint::Affine { x, y })
    }

    /// Recover the point with the given x-coordinate and y parity.
    pub fn from_x(x: Felt, odd: bool, curve: &CurveParameters) -> Result<Self, DomainError> {
        let even_y = y_from_x(&x, curve)?;
        let y = if odd && !even_y.is_zero() { -even_y } else { even_y };
        Ok(StarkPoint::Affine { x, y })
    }

    pub fn is_identity(&self) -> bool {
        matches!(self, StarkPoint::Identity)
    }

    pub fn coords(&self) -> Option<(Felt, Felt)> {
        match self {
            StarkPoint::Identity => None,
            StarkPoint::Affine { x, y } => Some((*x, *y)),
        }
    }

    pub fn x(&self) -> Option<Felt> {
        self.coords().map(|(x, _)| x)
    }

    /// The identity is treated as on the curve.
    pub fn is_on_curve(&self, curve: &CurveParameters) -> bool {
        match self {
            StarkPoint::Identity => true,
            StarkPoint::Affine { x, y } => is_on_curve(x, y, curve),
        }
    }

    pub fn neg(&self) -> Self {
        match self {
            StarkPoint::Identity => StarkPoint::Identity,
            StarkPoint::Affine { x, y } => StarkPoint::Affine { x: *x, y: -*y },
        }
    }

    /// Affine doubling:
    ///   lambda = (3x^2 + alpha) / 2y
    ///   x3 = lambda^2 - 2x
    ///   y3 = lambda(x - x3) - y
    pub fn double(&self, curve: &CurveParameters) -> Self {
        let (x, y) = match self {
            StarkPoint::Identity => return StarkPoint::Identity,
            StarkPoint::Affine { x, y } => (*x, *y),
        };

        // 2-torsion; the STARK curve has none but the formula needs 2y != 0
        let inv = match y.double().inverse() {
            Some(inv) => inv,
            None => return StarkPoint::Identity,
        };

        let lambda = (x.square() * Felt::from(3u64) + curve.alpha()) * inv;
        let x3 = lambda.square() - x.double();
        let y3 = lambda * (x - x3) - y;
        StarkPoint::Affine { x: x3, y: y3 }
    }

    /// Affine addition. Handles the identity, doubling (P == Q) and the
    /// inverse case (P == -Q, which yields the identity).
    pub fn add(&self, other: &StarkPoint, curve: &CurveParameters) -> Self {
        let ((x1, y1), (x2, y2)) = match (self, other) {
            (StarkPoint::Identity, _) => return *other,
            (_, StarkPoint::Identity) => return *self,
            (StarkPoint::Affine { x: x1, y: y1 }, StarkPoint::Affine { x: x2, y: y2 }) => {
                ((*x1, *y1), (*x2, *y2))
            }
        };

        if x1 == x2 {
            return if y1 == y2 {
                self.double(curve)
            } else {
                StarkPoint::Identity
            };
        }

        let inv = match (x2 - x1).inverse() {
            Some(inv) => inv,
            None => return StarkPoint::Identity,
        };
        let lambda = (y2 - y1) * inv;
        let x3 = lambda.square() - x1 - x2;
        let y3 = lambda * (x1 - x3) - y1;
        StarkPoint::Affine { x: x3, y: y3 }
    }

    /// Scalar multiplication by a scalar already reduced mod n.
    pub fn mul_scalar(&self, k: &Scalar, curve: &CurveParameters) -> Self {
        let bits = k.into_bigint().to_bits_be();
        let mut acc = JacobianPoint::identity();
        for bit in bits.into_iter().skip_while(|b| !b) {
            acc = acc.double(curve);
            if bit {
                acc = acc.add_affine(self, curve);
            }
        }
        acc.to_affine()
    }

    /// Scalar multiplication by an arbitrary integer; `k` is reduced mod n
    /// first, so `k = n` yields the identity.
    pub fn mul_biguint(&self, k: &BigUint, curve: &CurveParameters) -> Self {
        let reduced: Scalar = field::from_biguint_reduced(k);
        self.mul_scalar(&reduced, curve)
    }
}

/// Check `y^2 = x^3 + alpha*x + beta`.
pub fn is_on_curve(x: &Felt, y: &Felt, curve: &CurveParameters) -> bool {
    y.square() == curve_rhs(x, curve)
}

/// Recover a y-coordinate for `x`.
///
/// Returns the even root (least-significant bit 0); the odd root is its
/// negation.
pub fn y_from_x(x: &Felt, curve: &CurveParameters) -> Result<Felt, DomainError> {
    let y = curve_rhs(x, curve)
        .sqrt()
        .ok_or_else(|| DomainError::NoSquareRoot {
            x: field::to_hex(x),
        })?;
    Ok(if field::is_odd(&y) { -y } else { y })
}

fn curve_rhs(x: &Felt, curve: &CurveParameters) -> Felt {
    x.square() * x + curve.alpha() * x + curve.beta()
}

/// Jacobian point (X, Y, Z) for x = X/Z^2, y = Y/Z^3. Z = 0 is the identity.
#[derive(Clone, Copy, Debug)]
pub(crate) struct JacobianPoint {
    x: Felt,
    y: Felt,
    z: Felt,
}

impl JacobianPoint {
    pub(crate) fn identity() -> Self {
        JacobianPoint {
            x: Felt::from(1u64),
            y: Felt::from(1u64),
            z: Felt::zero(),
        }
    }

    pub(crate) fn from_affine(p: &StarkPoint) -> Self {
        match p {
            StarkPoint::Identity => Self::identity(),
            StarkPoint::Affine { x, y } => JacobianPoint {
                x: *x,
                y: *y,
                z: Felt::from(1u64),
            },
        }
    }

    fn is_identity(&self) -> bool {
        self.z.is_zero()
    }

    // dbl-2007-bl
    pub(crate) fn double(&self, curve: &CurveParameters) -> Self {
        if self.is_identity() || self.y.is_zero() {
            return Self::identity();
        }
        let xx = self.x.square();
        let yy = self.y.square();
        let yyyy = yy.square();
        let zz = self.z.square();
        let s = ((self.x + yy).square() - xx - yyyy).double();
        let m = xx * Felt::from(3u64) + curve.alpha() * zz.square();
        let x3 = m.square() - s.double();
        let y3 = m * (s - x3) - yyyy.double().double().double();
        let z3 = (self.y + self.z).square() - yy - zz;
        JacobianPoint {
            x: x3,
            y: y3,
            z: z3,
        }
    }

    // madd-2007-bl
    pub(crate) fn add_affine(&self, other: &StarkPoint, curve: &CurveParameters) -> Self {
        let (x2, y2) = match other {
            StarkPoint::Identity => return *self,
            StarkPoint::Affine { x, y } => (*x, *y),
        };
        if self.is_identity() {
            return Self::from_affine(other);
        }

        let z1z1 = self.z.square();
        let u2 = x2 * z1z1;
        let s2 = y2 * self.z * z1z1;
        let h = u2 - self.x;
        let r = (s2 - self.y).double();

        if h.is_zero() {
            return if r.is_zero() {
                self.double(curve)
            } else {
                Self::identity()
            };
        }

        let hh = h.square();
        let i = hh.double().double();
        let j = h * i;
        let v = self.x * i;
        let x3 = r.square() - j - v.double();
        let y3 = r * (v - x3) - (self.y * j).double();
        let z3 = (self.z + h).square() - z1z1 - hh;
        JacobianPoint {
            x: x3,
            y: y3,
            z: z3,
        }
    }

    pub(crate) fn to_affine(&self) -> StarkPoint {
        let z_inv = match self.z.inverse() {
            Some(inv) => inv,
            None => return StarkPoint::Identity,
        };
        let z_inv2 = z_inv.square();
        StarkPoint::Affine {
            x: self.x * z_inv2,
            y: self.y * z_inv2 * z_inv,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{modulus, parse_felt};
    use crate::params::CurveParameters;

    fn curve() -> &'static CurveParameters {
        CurveParameters::shared_stark()
    }

    #[test]
    fn generator_is_on_curve() {
        let g = curve().generator();
        assert!(g.is_on_curve(curve()), "generator must be on curve");
    }

    #[test]
    fn identity_is_on_curve() {
        assert!(StarkPoint::identity().is_on_curve(curve()));
    }

    #[test]
    fn add_identity() {
        let g = curve().generator();
        let id = StarkPoint::identity();
        assert_eq!(g.add(&id, curve()), g, "G + 0 = G");
        assert_eq!(id.add(&g, curve()), g, "0 + G = G");
    }

    #[test]
    fn add_inverse_gives_identity() {
        let g = curve().generator();
        assert!(g.add(&g.neg(), curve()).is_identity());
    }

    #[test]
    fn scalar_mul_by_one() {
        let g = curve().generator();
        assert_eq!(g.mul_scalar(&Scalar::from(1u64), curve()), g, "1*G = G");
    }

    #[test]
    fn scalar_mul_by_zero() {
        let g = curve().generator();
        assert!(
            g.mul_scalar(&Scalar::zero(), curve()).is_identity(),
            "0*G = identity"
        );
    }

    #[test]
    fn identity_times_scalar_is_identity() {
        let id = StarkPoint::identity();
        assert!(id.mul_scalar(&Scalar::from(77u64), curve()).is_identity());
    }

    #[test]
    fn five_g_matches_repeated_addition() {
        let g = curve().generator();
        let mut sum = StarkPoint::identity();
        for _ in 0..5 {
            sum = sum.add(&g, curve());
        }
        let five_g = g.mul_scalar(&Scalar::from(5u64), curve());
        assert_eq!(sum, five_g);

        let expected_x =
            parse_felt("0x788435d61046d3eec54d77d25bd194525f4fa26ebe6575536bc6f656656b74c")
                .unwrap();
        let expected_y =
            parse_felt("0x13926386b9e5e908c359519eaa68c44a2430f4b4ca5d0dbdcb4231f031eb18b")
                .unwrap();
        assert_eq!(five_g.coords(), Some((expected_x, expected_y)));
    }

    #[test]
    fn scalar_mul_associative() {
        let g = curve().generator();
        let a = Scalar::from(7u64);
        let b = Scalar::from(13u64);

        let sum_points = g
            .mul_scalar(&a, curve())
            .add(&g.mul_scalar(&b, curve()), curve());
        let sum_scalar = g.mul_scalar(&(a + b), curve());

        assert!(sum_points.is_on_curve(curve()));
        assert_eq!(sum_points, sum_scalar);
    }

    #[test]
    fn double_equals_add_self() {
        let g = curve().generator();
        assert_eq!(g.double(curve()), g.add(&g, curve()));
        assert_eq!(g.double(curve()), g.mul_scalar(&Scalar::from(2u64), curve()));
    }

    #[test]
    fn order_times_generator_is_identity() {
        let g = curve().generator();
        assert!(g.mul_biguint(&modulus::<Scalar>(), curve()).is_identity());

        let n_minus_one = modulus::<Scalar>() - 1u32;
        assert_eq!(g.mul_biguint(&n_minus_one, curve()), g.neg());
    }

    #[test]
    fn y_from_x_roundtrip() {
        let p = curve()
            .generator()
            .mul_scalar(&Scalar::from(123456789u64), curve());
        let (x, y) = p.coords().unwrap();

        let recovered = y_from_x(&x, curve()).unwrap();
        assert!(recovered == y || recovered == -y);
        assert!(is_on_curve(&x, &recovered, curve()));
        assert!(!field::is_odd(&recovered), "canonical root is even");
    }

    #[test]
    fn from_x_selects_parity() {
        let (x, _) = curve().generator().coords().unwrap();
        let odd = StarkPoint::from_x(x, true, curve()).unwrap();
        let even = StarkPoint::from_x(x, false, curve()).unwrap();
        assert_eq!(odd, even.neg());
        assert!(field::is_odd(&odd.coords().unwrap().1));
    }

    #[test]
    fn y_from_x_rejects_non_residue() {
        // Half of all x values are not on the curve; find one among small x.
        let missing = (0u64..64)
            .map(Felt::from)
            .find(|x| y_from_x(x, curve()).is_err())
            .expect("some small x has no curve point");
        assert!(matches!(
            y_from_x(&missing, curve()),
            Err(DomainError::NoSquareRoot { .. })
        ));
    }

    #[test]
    fn from_coords_rejects_off_curve() {
        let (x, y) = curve().generator().coords().unwrap();
        let err = StarkPoint::from_coords(x, y + Felt::from(1u64), curve()).unwrap_err();
        assert!(matches!(err, DomainError::PointNotOnCurve { .. }));
        assert!(StarkPoint::from_coords(x, y, curve()).is_ok());
    }

    #[test]
    fn jacobian_matches_affine() {
        let g = curve().generator();
        let three_g = g.double(curve()).add(&g, curve());

        let jac = JacobianPoint::from_affine(&g)
            .double(curve())
            .add_affine(&g, curve());
        assert_eq!(jac.to_affine(), three_g);

        let back_to_identity = JacobianPoint::from_affine(&g).add_affine(&g.neg(), curve());
        assert!(back_to_identity.to_affine().is_identity());
    }
}
