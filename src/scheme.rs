//! The two orientations of BLS used by the protocol.
//!
//! `G1Scheme` hashes and signs in G1 with public keys in G2; `G2Scheme` is the
//! mirror image. Blinding, share signing and recovery are written once against
//! [`Scheme`] and instantiated for both.

use crate::config::G2Hashing;
use crate::error::Result;
use crate::group::Point;
use crate::utils::{hash_to_g1, hash_to_g2};
use blstrs::{Bls12, G1Projective, G2Projective, Gt};
use group::Curve;
use pairing::Engine;

pub trait Scheme: Send + Sync + 'static {
    /// Group of hashed messages and signatures.
    type Message: Point;
    /// Group of public keys and public key shares.
    type Key: Point;

    fn hash_to_message(msg: &[u8], g2_hashing: G2Hashing) -> Result<Self::Message>;

    /// Pairs a message-group element with a key-group element, in whichever
    /// argument order the pairing requires.
    fn pair(message: &Self::Message, key: &Self::Key) -> Gt;
}

#[derive(Clone, Copy, Debug)]
pub struct G1Scheme;

#[derive(Clone, Copy, Debug)]
pub struct G2Scheme;

impl Scheme for G1Scheme {
    type Message = G1Projective;
    type Key = G2Projective;

    fn hash_to_message(msg: &[u8], _g2_hashing: G2Hashing) -> Result<G1Projective> {
        hash_to_g1(msg)
    }

    fn pair(message: &G1Projective, key: &G2Projective) -> Gt {
        Bls12::pairing(&message.to_affine(), &key.to_affine())
    }
}

impl Scheme for G2Scheme {
    type Message = G2Projective;
    type Key = G1Projective;

    fn hash_to_message(msg: &[u8], g2_hashing: G2Hashing) -> Result<G2Projective> {
        hash_to_g2(msg, g2_hashing)
    }

    fn pair(message: &G2Projective, key: &G1Projective) -> Gt {
        Bls12::pairing(&key.to_affine(), &message.to_affine())
    }
}
