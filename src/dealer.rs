//! Key setup for the threshold servers.
//!
//! Servers would ideally run a DKG. Instead a [`TrustedDealer`] picks (or is
//! handed) the master secret and splits it into two independent sharings, one
//! per signing group. Anything implementing [`TrustedSetup`] can replace it.

use crate::config::Parameters;
use crate::error::Result;
use crate::poly::{Index, PublicPoly, SecretKeyShare, SecretPoly};
use crate::scheme::{G1Scheme, G2Scheme, Scheme};
use crate::utils::random_nonzero_scalar;
use blstrs::Scalar;
use tracing::info;

/// Public commitment polynomials for both sharings, published at setup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PublicCommitments {
    /// Key shares in G2, checking signatures on G1 identity points.
    pub left: PublicPoly<<G1Scheme as Scheme>::Key>,
    /// Key shares in G1, checking signatures on G2 identity points.
    pub right: PublicPoly<<G2Scheme as Scheme>::Key>,
}

/// The two secret shares of one server, under the same index.
#[derive(Clone, Debug)]
pub struct ServerKeys {
    pub left: SecretKeyShare,
    pub right: SecretKeyShare,
}

impl ServerKeys {
    pub fn index(&self) -> Index {
        self.left.index()
    }
}

#[derive(Debug)]
pub struct Setup {
    pub commitments: PublicCommitments,
    /// Ordered by index, starting at 1.
    pub server_keys: Vec<ServerKeys>,
}

pub trait TrustedSetup {
    fn run(&self, params: &Parameters) -> Result<Setup>;
}

pub struct TrustedDealer {
    master_secret: Scalar,
}

impl TrustedDealer {
    pub fn new(master_secret: Scalar) -> Self {
        Self { master_secret }
    }

    pub fn random() -> Self {
        let mut rng = rand::thread_rng();
        Self::new(random_nonzero_scalar(&mut rng))
    }
}

impl TrustedSetup for TrustedDealer {
    fn run(&self, params: &Parameters) -> Result<Setup> {
        params.validate()?;
        let mut rng = rand::thread_rng();
        let degree = params.threshold - 1;
        let n = params.total_servers as Index;

        let left = SecretPoly::with_secret(degree, self.master_secret, &mut rng);
        let right = SecretPoly::with_secret(degree, self.master_secret, &mut rng);

        let commitments = PublicCommitments {
            left: left.commit(),
            right: right.commit(),
        };
        let server_keys = left
            .shares(n)
            .into_iter()
            .zip(right.shares(n))
            .map(|(left, right)| ServerKeys { left, right })
            .collect();

        info!(
            threshold = params.threshold,
            total_servers = params.total_servers,
            "master secret shared between threshold servers"
        );

        Ok(Setup {
            commitments,
            server_keys,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::group::Point;
    use crate::poly::interpolate_at_zero;
    use blstrs::{G1Projective, G2Projective};
    use ff::Field;

    #[test]
    fn both_sharings_hide_the_same_secret() -> Result<()> {
        let params = Parameters::new(5, 3)?;
        let secret = Scalar::random(&mut rand::thread_rng());
        let setup = TrustedDealer::new(secret).run(&params)?;

        assert_eq!(setup.server_keys.len(), 5);
        for (i, keys) in setup.server_keys.iter().enumerate() {
            assert_eq!(keys.index() as usize, i + 1);
            assert_eq!(keys.right.index(), keys.index());
        }

        assert_eq!(
            setup.commitments.left.public_key(),
            Point::mul(&<G2Projective as Point>::generator(), &secret)
        );
        assert_eq!(
            setup.commitments.right.public_key(),
            Point::mul(&<G1Projective as Point>::generator(), &secret)
        );

        let points: Vec<_> = setup.server_keys[2..]
            .iter()
            .map(|k| (k.index(), k.right.public_key_share::<G1Projective>()))
            .collect();
        assert_eq!(interpolate_at_zero(&points)?, setup.commitments.right.public_key());
        Ok(())
    }

    #[test]
    fn sharings_use_independent_polynomials() -> Result<()> {
        let params = Parameters::new(3, 2)?;
        let setup = TrustedDealer::random().run(&params)?;

        let left = setup.server_keys[0].left.public_key_share::<G1Projective>();
        let right = setup.server_keys[0].right.public_key_share::<G1Projective>();
        assert_ne!(left, right);
        Ok(())
    }
}
