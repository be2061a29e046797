//! Typed group elements for BLS12-381.
//!
//! Every point carries its group in its type: `G1Projective` and
//! `G2Projective` both implement [`Point`], and an operation expecting one
//! cannot be handed the other. Bytes crossing a process boundary travel as a
//! [`TaggedPoint`] so the receiver can check the group before decoding.

use crate::error::{Error, Result};
use blstrs::{Compress, G1Affine, G1Projective, G2Affine, G2Projective, Gt, Scalar};
use group::{Curve, Group};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Size of a compressed G1 point.
pub const G1_SIZE: usize = 48;

/// Size of a compressed G2 point.
pub const G2_SIZE: usize = 96;

/// Size of a compressed GT element.
pub const GT_SIZE: usize = 288;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GroupTag {
    G1,
    G2,
    Gt,
}

impl fmt::Display for GroupTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupTag::G1 => write!(f, "bls12_381.G1"),
            GroupTag::G2 => write!(f, "bls12_381.G2"),
            GroupTag::Gt => write!(f, "bls12_381.GT"),
        }
    }
}

/// A point on one of the two source groups of the pairing.
pub trait Point: Copy + fmt::Debug + PartialEq + Eq + Send + Sync + 'static {
    const TAG: GroupTag;
    const ENCODED_LEN: usize;

    fn identity() -> Self;

    fn generator() -> Self;

    fn add(&self, other: &Self) -> Self;

    fn mul(&self, scalar: &Scalar) -> Self;

    fn is_identity(&self) -> bool;

    /// Canonical compressed encoding.
    fn to_bytes(&self) -> Vec<u8>;

    /// Decodes a compressed point, rejecting points outside the prime-order subgroup.
    fn from_bytes(bytes: &[u8]) -> Result<Self>;
}

fn decoding_error(group: GroupTag, reason: impl Into<String>) -> Error {
    Error::Decoding {
        group,
        reason: reason.into(),
    }
}

impl Point for G1Projective {
    const TAG: GroupTag = GroupTag::G1;
    const ENCODED_LEN: usize = G1_SIZE;

    fn identity() -> Self {
        <G1Projective as Group>::identity()
    }

    fn generator() -> Self {
        <G1Projective as Group>::generator()
    }

    fn add(&self, other: &Self) -> Self {
        self + other
    }

    fn mul(&self, scalar: &Scalar) -> Self {
        self * scalar
    }

    fn is_identity(&self) -> bool {
        <Self as Group>::is_identity(self).into()
    }

    fn to_bytes(&self) -> Vec<u8> {
        self.to_affine().to_compressed().to_vec()
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let compressed: [u8; G1_SIZE] = bytes.try_into().map_err(|_| {
            decoding_error(
                Self::TAG,
                format!("expected {} bytes, got {}", G1_SIZE, bytes.len()),
            )
        })?;
        Option::<G1Affine>::from(G1Affine::from_compressed(&compressed))
            .map(G1Projective::from)
            .ok_or_else(|| decoding_error(Self::TAG, "not a valid compressed point"))
    }
}

impl Point for G2Projective {
    const TAG: GroupTag = GroupTag::G2;
    const ENCODED_LEN: usize = G2_SIZE;

    fn identity() -> Self {
        <G2Projective as Group>::identity()
    }

    fn generator() -> Self {
        <G2Projective as Group>::generator()
    }

    fn add(&self, other: &Self) -> Self {
        self + other
    }

    fn mul(&self, scalar: &Scalar) -> Self {
        self * scalar
    }

    fn is_identity(&self) -> bool {
        <Self as Group>::is_identity(self).into()
    }

    fn to_bytes(&self) -> Vec<u8> {
        self.to_affine().to_compressed().to_vec()
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let compressed: [u8; G2_SIZE] = bytes.try_into().map_err(|_| {
            decoding_error(
                Self::TAG,
                format!("expected {} bytes, got {}", G2_SIZE, bytes.len()),
            )
        })?;
        Option::<G2Affine>::from(G2Affine::from_compressed(&compressed))
            .map(G2Projective::from)
            .ok_or_else(|| decoding_error(Self::TAG, "not a valid compressed point"))
    }
}

/// Encodes a pairing output.
pub fn gt_to_bytes(gt: &Gt) -> Result<Vec<u8>> {
    let mut bytes = Vec::with_capacity(GT_SIZE);
    gt.write_compressed(&mut bytes).map_err(|e| Error::Encoding {
        group: GroupTag::Gt,
        reason: e.to_string(),
    })?;
    Ok(bytes)
}

/// Encoded point labelled with the group it claims to belong to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaggedPoint {
    pub tag: GroupTag,
    pub bytes: Vec<u8>,
}

impl TaggedPoint {
    pub fn new<P: Point>(bytes: Vec<u8>) -> Self {
        Self {
            tag: P::TAG,
            bytes,
        }
    }

    pub fn from_point<P: Point>(point: &P) -> Self {
        Self::new::<P>(point.to_bytes())
    }

    /// Returns the encoding if the tag names the group of `P`.
    pub fn expect<P: Point>(&self) -> Result<&[u8]> {
        match self.tag {
            GroupTag::Gt => Err(Error::UnsupportedGroup(GroupTag::Gt)),
            tag if tag != P::TAG => Err(Error::GroupMismatch {
                expected: P::TAG,
                found: tag,
            }),
            _ => Ok(&self.bytes),
        }
    }

    pub fn decode<P: Point>(&self) -> Result<P> {
        P::from_bytes(self.expect::<P>()?)
    }
}
