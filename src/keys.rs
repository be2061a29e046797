//! Per-user key material.
//!
//! - [`PublicKeys`]: the identity points `(H1(id), H2(id))`, computable by anyone.
//! - [`ConstrainingKeys`]: `(x * H1(id), x * H2(id))`, obtained from the
//!   threshold servers and known only to the user.
//! - [`SharedKeys`]: the two pairings a user computes for one contact.
//! - [`KeyMaterial`]: the symmetric value both sides of a pair agree on.

use crate::config::G2Hashing;
use crate::error::{Error, Result};
use crate::group::{gt_to_bytes, GroupTag};
use crate::scheme::{G1Scheme, G2Scheme, Scheme};
use blstrs::{G1Projective, G2Projective, Gt};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::fmt;

const KDF_KEY: &[u8] = b"contact-discovery/kdf/v1";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PublicKeys {
    pub left: G1Projective,
    pub right: G2Projective,
}

impl PublicKeys {
    pub fn derive(identity: &str, g2_hashing: G2Hashing) -> Result<Self> {
        Ok(Self {
            left: G1Scheme::hash_to_message(identity.as_bytes(), g2_hashing)?,
            right: G2Scheme::hash_to_message(identity.as_bytes(), g2_hashing)?,
        })
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
pub struct ConstrainingKeys {
    left: G1Projective,
    right: G2Projective,
}

impl ConstrainingKeys {
    pub(crate) fn new(left: G1Projective, right: G2Projective) -> Self {
        Self { left, right }
    }

    pub fn left(&self) -> &G1Projective {
        &self.left
    }

    pub fn right(&self) -> &G2Projective {
        &self.right
    }
}

impl fmt::Debug for ConstrainingKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ConstrainingKeys(..)")
    }
}

/// `outgoing = e(my_left, their_right)` and `incoming = e(their_left, my_right)`.
///
/// For two users A and B, A's outgoing key is B's incoming key and the other
/// way around.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct SharedKeys {
    pub outgoing: Gt,
    pub incoming: Gt,
}

impl SharedKeys {
    pub fn derive(mine: &ConstrainingKeys, theirs: &PublicKeys) -> Self {
        Self {
            outgoing: G1Scheme::pair(&mine.left, &theirs.right),
            incoming: G1Scheme::pair(&theirs.left, &mine.right),
        }
    }

    /// HMAC-SHA256 under a fixed key over both pairings, smaller encoding
    /// first, so that both users of a pair get the same bytes.
    pub fn key_material(&self) -> Result<KeyMaterial> {
        let outgoing = gt_to_bytes(&self.outgoing)?;
        let incoming = gt_to_bytes(&self.incoming)?;
        let (first, second) = if outgoing <= incoming {
            (outgoing, incoming)
        } else {
            (incoming, outgoing)
        };

        let mut mac = Hmac::<Sha256>::new_from_slice(KDF_KEY).map_err(|e| Error::Encoding {
            group: GroupTag::Gt,
            reason: e.to_string(),
        })?;
        mac.update(&first);
        mac.update(&second);
        Ok(KeyMaterial(mac.finalize().into_bytes().into()))
    }
}

impl fmt::Debug for SharedKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SharedKeys(..)")
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
pub struct KeyMaterial([u8; 32]);

impl KeyMaterial {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KeyMaterial(..)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::group::Point;
    use blstrs::Scalar;
    use ff::Field;

    fn constrain(public: &PublicKeys, x: &Scalar) -> ConstrainingKeys {
        ConstrainingKeys::new(Point::mul(&public.left, x), Point::mul(&public.right, x))
    }

    #[test]
    fn pairings_are_symmetric() -> Result<()> {
        let x = Scalar::random(&mut rand::thread_rng());
        let electra = PublicKeys::derive("electra", G2Hashing::SeededPick)?;
        let thaumas = PublicKeys::derive("thaumas", G2Hashing::SeededPick)?;

        let a = SharedKeys::derive(&constrain(&electra, &x), &thaumas);
        let b = SharedKeys::derive(&constrain(&thaumas, &x), &electra);

        assert_eq!(a.outgoing, b.incoming);
        assert_eq!(a.incoming, b.outgoing);
        assert_ne!(a.outgoing, a.incoming);
        assert_eq!(a.key_material()?, b.key_material()?);
        Ok(())
    }

    #[test]
    fn key_material_depends_on_the_master_secret() -> Result<()> {
        let mut rng = rand::thread_rng();
        let (x, y) = (Scalar::random(&mut rng), Scalar::random(&mut rng));
        let electra = PublicKeys::derive("electra", G2Hashing::HashToCurve)?;
        let thaumas = PublicKeys::derive("thaumas", G2Hashing::HashToCurve)?;

        let honest = SharedKeys::derive(&constrain(&electra, &x), &thaumas);
        let other = SharedKeys::derive(&constrain(&electra, &y), &thaumas);
        assert_ne!(honest.key_material()?, other.key_material()?);
        Ok(())
    }

    #[test]
    fn third_party_gets_unrelated_keys() -> Result<()> {
        let x = Scalar::random(&mut rand::thread_rng());
        let electra = PublicKeys::derive("electra", G2Hashing::SeededPick)?;
        let thaumas = PublicKeys::derive("thaumas", G2Hashing::SeededPick)?;
        let rando = PublicKeys::derive("rando", G2Hashing::SeededPick)?;

        let pair = SharedKeys::derive(&constrain(&electra, &x), &thaumas);
        let rando_electra = SharedKeys::derive(&constrain(&rando, &x), &electra);
        let rando_thaumas = SharedKeys::derive(&constrain(&rando, &x), &thaumas);

        for theirs in [rando_electra, rando_thaumas] {
            for value in [theirs.outgoing, theirs.incoming] {
                assert_ne!(value, pair.outgoing);
                assert_ne!(value, pair.incoming);
            }
            assert_ne!(theirs.key_material()?, pair.key_material()?);
        }
        Ok(())
    }

    #[test]
    fn secrets_are_redacted() {
        let x = Scalar::ONE;
        let keys = ConstrainingKeys::new(
            Point::mul(&<G1Projective as Point>::generator(), &x),
            Point::mul(&<G2Projective as Point>::generator(), &x),
        );
        assert_eq!(format!("{:?}", keys), "ConstrainingKeys(..)");
    }
}
