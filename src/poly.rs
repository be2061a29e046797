//! Shamir sharing over the BLS12-381 scalar field.
//!
//! A [`SecretPoly`] of degree `t - 1` hides the master secret in its constant
//! term; server `i` receives its evaluation at `x = i` (indices start at 1).
//! The matching [`PublicPoly`] commits to the coefficients in a key group so
//! anyone can compute the public key share of a server.

use crate::error::{Error, Result};
use crate::group::Point;
use crate::utils::random_nonzero_scalar;
use blstrs::Scalar;
use ff::Field;
use rand_core::RngCore;
use std::collections::HashSet;
use std::fmt;

/// Position of a server in a sharing, in `[1, n]`.
pub type Index = u16;

pub struct SecretPoly {
    coeffs: Vec<Scalar>,
}

impl SecretPoly {
    /// Random polynomial of the given degree with `secret` as constant term.
    pub fn with_secret<R: RngCore>(degree: usize, secret: Scalar, rng: &mut R) -> Self {
        let mut coeffs = Vec::with_capacity(degree + 1);
        coeffs.push(secret);
        for _ in 0..degree {
            coeffs.push(random_nonzero_scalar(rng));
        }
        Self { coeffs }
    }

    pub fn degree(&self) -> usize {
        self.coeffs.len() - 1
    }

    pub fn evaluate(&self, index: Index) -> Scalar {
        let x = Scalar::from(index as u64);
        self.coeffs
            .iter()
            .rev()
            .fold(Scalar::ZERO, |acc, coeff| acc * x + coeff)
    }

    /// Shares for indices `1..=n`.
    pub fn shares(&self, n: Index) -> Vec<SecretKeyShare> {
        (1..=n)
            .map(|index| SecretKeyShare {
                index,
                secret: self.evaluate(index),
            })
            .collect()
    }

    /// Commits every coefficient in the group of `P`.
    pub fn commit<P: Point>(&self) -> PublicPoly<P> {
        let base = P::generator();
        PublicPoly {
            coeffs: self.coeffs.iter().map(|c| base.mul(c)).collect(),
        }
    }
}

impl fmt::Debug for SecretPoly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretPoly(degree {})", self.degree())
    }
}

/// One server's evaluation of a secret polynomial.
#[derive(Clone)]
pub struct SecretKeyShare {
    index: Index,
    secret: Scalar,
}

impl SecretKeyShare {
    pub fn index(&self) -> Index {
        self.index
    }

    pub(crate) fn secret(&self) -> &Scalar {
        &self.secret
    }

    /// Public key share `x_i * B` in the group of `P`.
    pub fn public_key_share<P: Point>(&self) -> P {
        P::generator().mul(&self.secret)
    }
}

impl fmt::Debug for SecretKeyShare {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretKeyShare {{ index: {}, .. }}", self.index)
    }
}

/// Public commitment to a secret polynomial.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PublicPoly<P: Point> {
    coeffs: Vec<P>,
}

impl<P: Point> PublicPoly<P> {
    /// Public key share of the server at `index`.
    pub fn evaluate(&self, index: Index) -> P {
        let x = Scalar::from(index as u64);
        self.coeffs
            .iter()
            .rev()
            .fold(P::identity(), |acc, coeff| acc.mul(&x).add(coeff))
    }

    /// The commitment to the master secret.
    pub fn public_key(&self) -> P {
        self.coeffs[0]
    }

    /// Number of shares needed to interpolate.
    pub fn threshold(&self) -> usize {
        self.coeffs.len()
    }
}

/// Lagrange coefficients for interpolating at zero from the given indices.
///
/// `l_i = prod_{j != i} x_j / (x_j - x_i)`
pub(crate) fn lagrange_coefficients_at_zero(indices: &[Index]) -> Result<Vec<Scalar>> {
    let mut seen = HashSet::with_capacity(indices.len());
    for &index in indices {
        if index == 0 || !seen.insert(index) {
            return Err(Error::InvalidShareIndex {
                index,
                n: indices.len(),
            });
        }
    }

    indices
        .iter()
        .map(|&i| {
            let xi = Scalar::from(i as u64);
            let (num, den) = indices.iter().filter(|&&j| j != i).fold(
                (Scalar::ONE, Scalar::ONE),
                |(num, den), &j| {
                    let xj = Scalar::from(j as u64);
                    (num * xj, den * (xj - xi))
                },
            );
            let inv = Option::<Scalar>::from(den.invert()).ok_or(Error::InvalidShareIndex {
                index: i,
                n: indices.len(),
            })?;
            Ok(num * inv)
        })
        .collect()
}

/// Interpolates the value at zero of the polynomial "in the exponent" whose
/// evaluations are the given indexed points.
pub fn interpolate_at_zero<P: Point>(points: &[(Index, P)]) -> Result<P> {
    let indices: Vec<Index> = points.iter().map(|(i, _)| *i).collect();
    let lambdas = lagrange_coefficients_at_zero(&indices)?;
    Ok(points
        .iter()
        .zip(lambdas.iter())
        .fold(P::identity(), |acc, ((_, point), lambda)| acc.add(&point.mul(lambda))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use blstrs::{G1Projective, G2Projective};

    #[test]
    fn shares_interpolate_to_the_secret() -> Result<()> {
        let mut rng = rand::thread_rng();
        let secret = Scalar::random(&mut rng);
        let poly = SecretPoly::with_secret(2, secret, &mut rng);
        let shares = poly.shares(6);

        assert_eq!(poly.evaluate(0), secret);
        for subset in [[0usize, 1, 2], [3, 4, 5], [0, 2, 5]] {
            let points: Vec<(Index, G1Projective)> = subset
                .iter()
                .map(|&k| (shares[k].index(), shares[k].public_key_share::<G1Projective>()))
                .collect();
            assert_eq!(
                interpolate_at_zero(&points)?,
                Point::mul(&<G1Projective as Point>::generator(), &secret)
            );
        }
        Ok(())
    }

    #[test]
    fn commitment_matches_public_key_shares() {
        let mut rng = rand::thread_rng();
        let poly = SecretPoly::with_secret(3, Scalar::random(&mut rng), &mut rng);
        let public = poly.commit::<G2Projective>();

        assert_eq!(public.threshold(), 4);
        for share in poly.shares(5) {
            assert_eq!(
                public.evaluate(share.index()),
                share.public_key_share::<G2Projective>()
            );
        }
        assert_eq!(public.public_key(), public.evaluate(0));
    }

    #[test]
    fn duplicate_or_zero_indices_are_rejected() {
        assert!(matches!(
            lagrange_coefficients_at_zero(&[1, 2, 2]),
            Err(Error::InvalidShareIndex { index: 2, .. })
        ));
        assert!(matches!(
            lagrange_coefficients_at_zero(&[0, 1]),
            Err(Error::InvalidShareIndex { index: 0, .. })
        ));
    }
}
