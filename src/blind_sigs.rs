use crate::error::{Error, Result};
use crate::group::Point;
use crate::scheme::Scheme;
use crate::utils::{random_nonzero_scalar, scalar_from_be_bytes};
use blstrs::Scalar;
use ff::Field;
use std::convert::TryFrom;
use std::fmt;
use std::marker::PhantomData;
use tracing::debug;

/// Random scalar hiding a point from the signer.
///
/// Bound to the group of the point it blinds. Draw a fresh one per request
/// and keep it until the signature comes back: only the same factor unblinds.
pub struct BlindingFactor<P: Point> {
    scalar: Scalar,
    _group: PhantomData<P>,
}

impl<P: Point> BlindingFactor<P> {
    pub fn random() -> Self {
        let mut rng = rand::thread_rng();
        Self {
            scalar: random_nonzero_scalar(&mut rng),
            _group: PhantomData,
        }
    }

    pub fn from_scalar(scalar: Scalar) -> Result<Self> {
        if bool::from(scalar.is_zero()) {
            return Err(Error::InvalidBlindingFactor);
        }
        Ok(Self {
            scalar,
            _group: PhantomData,
        })
    }

    /// `r * point`
    pub fn blind_point(&self, point: &P) -> P {
        point.mul(&self.scalar)
    }

    /// `1/r * point`
    pub fn unblind_point(&self, point: &P) -> Result<P> {
        let inverse =
            Option::<Scalar>::from(self.scalar.invert()).ok_or(Error::InvalidBlindingFactor)?;
        Ok(point.mul(&inverse))
    }
}

impl<P: Point> Clone for BlindingFactor<P> {
    fn clone(&self) -> Self {
        Self {
            scalar: self.scalar,
            _group: PhantomData,
        }
    }
}

impl<P: Point> fmt::Debug for BlindingFactor<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlindingFactor<{}>(..)", P::TAG)
    }
}

impl<P: Point> TryFrom<[u8; 32]> for BlindingFactor<P> {
    type Error = Error;

    fn try_from(b: [u8; 32]) -> Result<Self> {
        Self::from_scalar(scalar_from_be_bytes(b)?)
    }
}

/// Blinds `point` and returns its encoding, ready to be sent to a signer.
pub fn blind<P: Point>(blinding_factor: &BlindingFactor<P>, point: &P) -> Result<Vec<u8>> {
    Ok(blinding_factor.blind_point(point).to_bytes())
}

/// Signs an encoded point without learning what it hides: `x * point`.
pub fn sign<P: Point>(secret: &Scalar, blinded: &[u8]) -> Result<Vec<u8>> {
    // Note we are signing a point, not message bytes: whatever was blinded
    // has already been hashed by the requester.
    let blinded_point = P::from_bytes(blinded)?;
    Ok(blinded_point.mul(secret).to_bytes())
}

/// Recovers `x * H` from the signature on the blinded point.
///
/// There is no way to tell from the output whether `blinding_factor` is the
/// one used to blind; a wrong factor yields an unrelated point.
pub fn unblind<P: Point>(blinding_factor: &BlindingFactor<P>, signature: &[u8]) -> Result<P> {
    let blinded_sig = P::from_bytes(signature)?;
    blinding_factor.unblind_point(&blinded_sig)
}

/// Checks a BLS signature on an already hashed message.
///
/// Identity keys, messages and signatures are rejected outright.
///
/// For [`G1Scheme`](crate::G1Scheme) this is `e(H, X) == e(S, B2)`, for
/// [`G2Scheme`](crate::G2Scheme) `e(X, H) == e(B1, S)`.
pub fn verify<S: Scheme>(
    public_key: &S::Key,
    message: &S::Message,
    signature: &S::Message,
) -> Result<()> {
    if public_key.is_identity() || message.is_identity() || signature.is_identity() {
        debug!(group = %<S::Message as Point>::TAG, "identity element in signature check");
        return Err(Error::InvalidSignature);
    }
    let left = S::pair(message, public_key);
    let right = S::pair(signature, &<S::Key as Point>::generator());
    if left != right {
        debug!(group = %<S::Message as Point>::TAG, "signature rejected");
        return Err(Error::InvalidSignature);
    }
    Ok(())
}

/// Holds a single secret key and signs blinded points with it.
pub struct BlindSigner<S: Scheme> {
    sk: Scalar,
    _scheme: PhantomData<S>,
}

impl<S: Scheme> BlindSigner<S> {
    pub fn new() -> Self {
        let mut rng = rand::thread_rng();
        Self::from(random_nonzero_scalar(&mut rng))
    }

    pub fn public_key(&self) -> S::Key {
        <S::Key as Point>::generator().mul(&self.sk)
    }

    pub fn sign_blinded(&self, blinded: &[u8]) -> Result<Vec<u8>> {
        sign::<S::Message>(&self.sk, blinded)
    }
}

impl<S: Scheme> Default for BlindSigner<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Scheme> From<Scalar> for BlindSigner<S> {
    fn from(sk: Scalar) -> Self {
        Self {
            sk,
            _scheme: PhantomData,
        }
    }
}
