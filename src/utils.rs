use crate::config::G2Hashing;
use crate::error::{Error, Result};
use crate::group::{GroupTag, Point, G1_SIZE, G2_SIZE};
use blst::{blst_hash_to_g1, blst_hash_to_g2, blst_p1, blst_p1_compress, blst_p2, blst_p2_compress};
use blstrs::{G1Projective, G2Projective, Scalar};
use ff::Field;
use group::Group;
use rand_chacha::ChaCha20Rng;
use rand_core::{RngCore, SeedableRng};
use sha2::{Digest, Sha256};

pub(crate) const G1_DST: &[u8] = b"BLS_SIG_BLS12381G1_XMD:SHA-256_SSWU_RO_NUL_";
pub(crate) const G2_DST: &[u8] = b"BLS_SIG_BLS12381G2_XMD:SHA-256_SSWU_RO_NUL_";
const G2_PICK_DST: &[u8] = b"BLSDISCO_INSECURE_G2_PICK_";

pub(crate) fn hash_to_g1(msg: &[u8]) -> Result<G1Projective> {
    let mut msg_hash: blst_p1 = Default::default();
    let aug = b"";
    unsafe {
        blst_hash_to_g1(
            &mut msg_hash,
            msg.as_ptr(),
            msg.len(),
            G1_DST.as_ptr(),
            G1_DST.len(),
            aug.as_ptr(),
            aug.len(),
        )
    };
    let mut msg_g1_bytes = [0u8; G1_SIZE];
    unsafe { blst_p1_compress(msg_g1_bytes.as_mut_ptr(), &msg_hash) }
    <G1Projective as Point>::from_bytes(&msg_g1_bytes)
}

pub(crate) fn hash_to_g2(msg: &[u8], mode: G2Hashing) -> Result<G2Projective> {
    match mode {
        G2Hashing::SeededPick => Ok(insecure_pick_g2(msg)),
        G2Hashing::HashToCurve => hash_g2_with_dst(msg),
    }
}

// Uses the message as the seed of a point picker. The output is a known
// multiple of the generator: anyone can recompute its discrete log, so the
// result is not a random oracle. Kept as the default for parity with the
// deployed proof of concept; `G2Hashing::HashToCurve` is the proper construction.
fn insecure_pick_g2(msg: &[u8]) -> G2Projective {
    let seed: [u8; 32] = Sha256::new()
        .chain_update(G2_PICK_DST)
        .chain_update(msg)
        .finalize()
        .into();
    let mut rng = ChaCha20Rng::from_seed(seed);
    <G2Projective as Group>::random(&mut rng)
}

fn hash_g2_with_dst(msg: &[u8]) -> Result<G2Projective> {
    let mut msg_hash: blst_p2 = Default::default();
    let aug = b"";
    unsafe {
        blst_hash_to_g2(
            &mut msg_hash,
            msg.as_ptr(),
            msg.len(),
            G2_DST.as_ptr(),
            G2_DST.len(),
            aug.as_ptr(),
            aug.len(),
        )
    };
    let mut msg_g2_bytes = [0u8; G2_SIZE];
    unsafe { blst_p2_compress(msg_g2_bytes.as_mut_ptr(), &msg_hash) }
    <G2Projective as Point>::from_bytes(&msg_g2_bytes)
}

pub(crate) fn scalar_from_be_bytes(bytes: [u8; 32]) -> Result<Scalar> {
    Option::<Scalar>::from(Scalar::from_bytes_be(&bytes)).ok_or_else(|| Error::Decoding {
        group: GroupTag::G1,
        reason: "scalar is not reduced modulo the group order".into(),
    })
}

pub(crate) fn random_nonzero_scalar<R: RngCore>(rng: &mut R) -> Scalar {
    loop {
        let s = Scalar::random(&mut *rng);
        if !bool::from(s.is_zero()) {
            return s;
        }
    }
}
