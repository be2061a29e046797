//! Client side of the constraining-key derivation.
//!
//! The client blinds both identity points, sends them to every server of the
//! roster at once and keeps the first `t` replies that check out against the
//! public commitments. Servers that time out, fail or return bad shares are
//! left out of the round.

use crate::blind_sigs::{unblind, verify, BlindingFactor};
use crate::config::Parameters;
use crate::dealer::PublicCommitments;
use crate::error::{Error, Result};
use crate::group::TaggedPoint;
use crate::keys::ConstrainingKeys;
use crate::poly::Index;
use crate::scheme::{G1Scheme, G2Scheme, Scheme};
use crate::server::{SessionId, SignRequest, SignResponse, SigningService};
use crate::shares::{decode_share, recover, verify_share, SignatureShare};
use futures_util::stream::{FuturesUnordered, StreamExt};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::time::timeout;
use tracing::{debug, info, instrument, warn};

type G1Share = SignatureShare<<G1Scheme as Scheme>::Message>;
type G2Share = SignatureShare<<G2Scheme as Scheme>::Message>;

/// What the client expects back for one session.
struct Round<'a> {
    session: SessionId,
    total_servers: usize,
    commitments: &'a PublicCommitments,
    left: <G1Scheme as Scheme>::Message,
    right: <G2Scheme as Scheme>::Message,
}

impl Round<'_> {
    /// Checks one reply, returning its pair of verified shares.
    fn accept(&self, index: Index, response: SignResponse) -> Result<(G1Share, G2Share)> {
        if response.session != self.session || response.index != index {
            return Err(Error::SessionMismatch { index });
        }
        let partials = response
            .outcome
            .map_err(|reason| Error::ServerFailure { index, reason })?;

        let left: G1Share = decode_share(&partials.left)?;
        let right: G2Share = decode_share(&partials.right)?;
        for share_index in [left.index, right.index] {
            if share_index != index {
                return Err(Error::InvalidShareIndex {
                    index: share_index,
                    n: self.total_servers,
                });
            }
        }

        verify_share::<G1Scheme>(&self.commitments.left, &self.left, &left)?;
        verify_share::<G2Scheme>(&self.commitments.right, &self.right, &right)?;
        Ok((left, right))
    }
}

/// Obtains `(x * H1(identity), x * H2(identity))` from the threshold servers
/// without revealing `identity` to any of them.
#[instrument(skip_all, fields(identity = %identity))]
pub async fn request_constraining_keys(
    identity: &str,
    roster: &[Arc<dyn SigningService>],
    commitments: &PublicCommitments,
    params: &Parameters,
) -> Result<ConstrainingKeys> {
    params.validate()?;
    let (t, n) = (params.threshold, params.total_servers);
    if roster.len() < t {
        return Err(Error::InsufficientServers {
            required: t,
            available: roster.len(),
        });
    }

    let h1 = G1Scheme::hash_to_message(identity.as_bytes(), params.g2_hashing)?;
    let h2 = G2Scheme::hash_to_message(identity.as_bytes(), params.g2_hashing)?;

    let left_factor = BlindingFactor::<<G1Scheme as Scheme>::Message>::random();
    let right_factor = BlindingFactor::<<G2Scheme as Scheme>::Message>::random();
    let round = Round {
        session: rand::random(),
        total_servers: n,
        commitments,
        left: left_factor.blind_point(&h1),
        right: right_factor.blind_point(&h2),
    };
    let request = SignRequest {
        session: round.session,
        left: TaggedPoint::from_point(&round.left),
        right: TaggedPoint::from_point(&round.right),
    };

    let request_timeout = params.request_timeout();
    let mut pending: FuturesUnordered<_> = roster
        .iter()
        .map(|server| {
            let request = request.clone();
            async move {
                let index = server.index();
                let reply = match timeout(request_timeout, server.sign(request)).await {
                    Ok(reply) => reply,
                    Err(_) => Err(Error::ServerUnavailable { index }),
                };
                (index, reply)
            }
        })
        .collect();

    let mut accepted = HashSet::with_capacity(t);
    let mut lefts = Vec::with_capacity(t);
    let mut rights = Vec::with_capacity(t);
    while let Some((index, reply)) = pending.next().await {
        match reply.and_then(|response| round.accept(index, response)) {
            Ok((left, right)) => {
                if !accepted.insert(index) {
                    warn!(index, "duplicate index excluded from the round");
                    continue;
                }
                debug!(index, "server contributed to the round");
                lefts.push(left);
                rights.push(right);
                if lefts.len() == t {
                    break;
                }
            }
            Err(e) => warn!(index, error = %e, "server excluded from the round"),
        }
    }
    if lefts.len() < t {
        return Err(Error::InsufficientShares {
            required: t,
            provided: lefts.len(),
        });
    }

    let left_sig = recover::<G1Scheme>(&commitments.left, &round.left, &lefts, t, n)?;
    let right_sig = recover::<G2Scheme>(&commitments.right, &round.right, &rights, t, n)?;
    let left = unblind(&left_factor, &left_sig)?;
    let right = unblind(&right_factor, &right_sig)?;

    verify::<G1Scheme>(&commitments.left.public_key(), &h1, &left)?;
    verify::<G2Scheme>(&commitments.right.public_key(), &h2, &right)?;

    info!("constraining keys derived");
    Ok(ConstrainingKeys::new(left, right))
}

/// Shorthand for an in-process roster.
pub fn roster<S: SigningService + 'static>(
    servers: impl IntoIterator<Item = S>,
) -> Vec<Arc<dyn SigningService>> {
    servers
        .into_iter()
        .map(|server| Arc::new(server) as Arc<dyn SigningService>)
        .collect()
}
