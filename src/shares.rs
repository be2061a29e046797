use crate::blind_sigs::{sign, verify, BlindingFactor};
use crate::error::{Error, Result};
use crate::group::Point;
use crate::poly::{interpolate_at_zero, Index, PublicPoly, SecretKeyShare};
use crate::scheme::Scheme;
use std::collections::HashSet;
use tracing::debug;

/// Width of the big-endian index prefix of an encoded share.
pub const INDEX_SIZE: usize = 2;

/// A partial signature together with the index of the server that made it.
///
/// The wire form is the big-endian index followed by the point encoding, so
/// a share can be routed and aggregated without outside bookkeeping.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SignatureShare<P: Point> {
    pub index: Index,
    pub point: P,
}

impl<P: Point> SignatureShare<P> {
    pub fn new(index: Index, point: P) -> Self {
        Self { index, point }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        encode_share(self.index, &self.point)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        decode_share(bytes)
    }
}

pub fn encode_share<P: Point>(index: Index, point: &P) -> Vec<u8> {
    encode_raw(index, &point.to_bytes())
}

fn encode_raw(index: Index, point: &[u8]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(INDEX_SIZE + point.len());
    bytes.extend_from_slice(&index.to_be_bytes());
    bytes.extend_from_slice(point);
    bytes
}

pub fn decode_share<P: Point>(bytes: &[u8]) -> Result<SignatureShare<P>> {
    let expected = INDEX_SIZE + P::ENCODED_LEN;
    if bytes.len() != expected {
        return Err(Error::MalformedShare {
            expected,
            actual: bytes.len(),
        });
    }
    let (index, point) = bytes.split_at(INDEX_SIZE);
    let index = Index::from_be_bytes([index[0], index[1]]);
    Ok(SignatureShare {
        index,
        point: P::from_bytes(point)?,
    })
}

/// Signs a blinded point with a secret key share: `x_i * (r * H(m))`, prefixed
/// with the share's index.
pub fn sign_share<P: Point>(share: &SecretKeyShare, blinded: &[u8]) -> Result<Vec<u8>> {
    let sig = sign::<P>(share.secret(), blinded)?;
    Ok(encode_raw(share.index(), &sig))
}

/// Removes the blinding from one signature share, keeping its index.
///
/// Shares unblinded this way verify against the clear message and can be
/// handed to [`recover`] directly.
pub fn unblind_share<P: Point>(
    blinding_factor: &BlindingFactor<P>,
    share: &SignatureShare<P>,
) -> Result<SignatureShare<P>> {
    Ok(SignatureShare::new(
        share.index,
        blinding_factor.unblind_point(&share.point)?,
    ))
}

/// Checks a signature share against the public key share of its server,
/// obtained by evaluating the public polynomial at the share's index.
pub fn verify_share<S: Scheme>(
    public: &PublicPoly<S::Key>,
    message: &S::Message,
    share: &SignatureShare<S::Message>,
) -> Result<()> {
    let public_key_share = public.evaluate(share.index);
    verify::<S>(&public_key_share, message, &share.point).map_err(|e| match e {
        Error::InvalidSignature => Error::InvalidShare { index: share.index },
        other => other,
    })
}

/// Reconstructs the full signature `x * H(m)` from `t` signature shares.
///
/// Every supplied share is verified first and the first invalid one aborts
/// the recovery. Interpolation uses the first `t` shares.
pub fn recover<S: Scheme>(
    public: &PublicPoly<S::Key>,
    message: &S::Message,
    shares: &[SignatureShare<S::Message>],
    t: usize,
    n: usize,
) -> Result<Vec<u8>> {
    if t == 0 || shares.len() < t {
        return Err(Error::InsufficientShares {
            required: t,
            provided: shares.len(),
        });
    }

    let mut seen = HashSet::with_capacity(shares.len());
    for share in shares {
        if share.index == 0 || share.index as usize > n || !seen.insert(share.index) {
            return Err(Error::InvalidShareIndex {
                index: share.index,
                n,
            });
        }
    }

    for share in shares {
        verify_share::<S>(public, message, share)?;
        debug!(index = share.index, group = %<S::Message as Point>::TAG, "signature share verified");
    }

    let points: Vec<(Index, S::Message)> = shares[..t].iter().map(|s| (s.index, s.point)).collect();
    Ok(interpolate_at_zero(&points)?.to_bytes())
}
