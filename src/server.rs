//! Threshold servers and the request/response exchange with them.
//!
//! A server holds the two secret shares of one index and blind-signs whatever
//! pair of points it is sent. It keeps no state between requests. Clients
//! talk to servers through [`SigningService`]; [`ThresholdServer`] answers
//! in-process and [`ServerHandle`] forwards to a server running as its own
//! tokio task.

use crate::dealer::ServerKeys;
use crate::error::{Error, Result};
use crate::group::TaggedPoint;
use crate::poly::Index;
use crate::scheme::{G1Scheme, G2Scheme, Scheme};
use crate::shares::sign_share;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

/// Identifies one derivation round of one client.
pub type SessionId = [u8; 16];

/// Pending requests a spawned server buffers before senders wait.
const CHANNEL_CAPACITY: usize = 64;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SignRequest {
    pub session: SessionId,
    /// Blinded `H1(id)`, expected in G1.
    pub left: TaggedPoint,
    /// Blinded `H2(id)`, expected in G2.
    pub right: TaggedPoint,
}

/// Indexed signature shares, encoded as by [`encode_share`](crate::encode_share).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialSignatures {
    pub left: Vec<u8>,
    pub right: Vec<u8>,
}

/// Reply envelope. A signing failure is reported in `outcome` rather than
/// as a transport error.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SignResponse {
    pub session: SessionId,
    pub index: Index,
    pub outcome: std::result::Result<PartialSignatures, String>,
}

/// Given a pair of blinded points, returns a pair of partial signatures or
/// the server's failure.
#[async_trait]
pub trait SigningService: Send + Sync {
    fn index(&self) -> Index;

    /// `Err` only when the server could not be reached.
    async fn sign(&self, request: SignRequest) -> Result<SignResponse>;
}

#[derive(Debug)]
pub struct ThresholdServer {
    keys: ServerKeys,
}

impl ThresholdServer {
    pub fn new(keys: ServerKeys) -> Self {
        Self { keys }
    }

    pub fn index(&self) -> Index {
        self.keys.index()
    }

    fn sign_pair(&self, request: &SignRequest) -> Result<PartialSignatures> {
        let left = request.left.expect::<<G1Scheme as Scheme>::Message>()?;
        let right = request.right.expect::<<G2Scheme as Scheme>::Message>()?;
        Ok(PartialSignatures {
            left: sign_share::<<G1Scheme as Scheme>::Message>(&self.keys.left, left)?,
            right: sign_share::<<G2Scheme as Scheme>::Message>(&self.keys.right, right)?,
        })
    }

    pub fn handle(&self, request: &SignRequest) -> SignResponse {
        let outcome = self.sign_pair(request).map_err(|e| {
            warn!(index = self.index(), error = %e, "refusing to sign");
            e.to_string()
        });
        debug!(index = self.index(), ok = outcome.is_ok(), "answered signing request");
        SignResponse {
            session: request.session,
            index: self.index(),
            outcome,
        }
    }

    /// Moves the server onto its own task. It runs until every handle is dropped.
    pub fn spawn(self) -> ServerHandle {
        let index = self.index();
        let (tx, mut rx) =
            mpsc::channel::<(SignRequest, oneshot::Sender<SignResponse>)>(CHANNEL_CAPACITY);

        tokio::spawn(async move {
            while let Some((request, reply)) = rx.recv().await {
                let response = self.handle(&request);
                if reply.send(response).is_err() {
                    debug!(index, "client went away before the reply");
                }
            }
            debug!(index, "threshold server stopped");
        });

        ServerHandle { index, tx }
    }
}

#[async_trait]
impl SigningService for ThresholdServer {
    fn index(&self) -> Index {
        ThresholdServer::index(self)
    }

    async fn sign(&self, request: SignRequest) -> Result<SignResponse> {
        Ok(self.handle(&request))
    }
}

/// Client side of a spawned [`ThresholdServer`].
#[derive(Clone, Debug)]
pub struct ServerHandle {
    index: Index,
    tx: mpsc::Sender<(SignRequest, oneshot::Sender<SignResponse>)>,
}

#[async_trait]
impl SigningService for ServerHandle {
    fn index(&self) -> Index {
        self.index
    }

    async fn sign(&self, request: SignRequest) -> Result<SignResponse> {
        let index = self.index;
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send((request, reply_tx))
            .await
            .map_err(|_| Error::ServerUnavailable { index })?;
        reply_rx.await.map_err(|_| Error::ServerUnavailable { index })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blind_sigs::{blind, BlindingFactor};
    use crate::config::{G2Hashing, Parameters};
    use crate::dealer::{TrustedDealer, TrustedSetup};
    use crate::group::{GroupTag, Point};
    use crate::shares::{decode_share, verify_share};
    use blstrs::{G1Projective, G2Projective};

    fn request(session: SessionId) -> Result<(SignRequest, G1Projective, G2Projective)> {
        let h1 = G1Scheme::hash_to_message(b"electra", G2Hashing::SeededPick)?;
        let h2 = G2Scheme::hash_to_message(b"electra", G2Hashing::SeededPick)?;
        let bf1 = BlindingFactor::<G1Projective>::random();
        let bf2 = BlindingFactor::<G2Projective>::random();
        let req = SignRequest {
            session,
            left: TaggedPoint::new::<G1Projective>(blind(&bf1, &h1)?),
            right: TaggedPoint::new::<G2Projective>(blind(&bf2, &h2)?),
        };
        Ok((req, bf1.blind_point(&h1), bf2.blind_point(&h2)))
    }

    #[tokio::test]
    async fn spawned_server_signs_both_groups() -> Result<()> {
        let params = Parameters::new(3, 2)?;
        let setup = TrustedDealer::random().run(&params)?;
        let keys = setup.server_keys[1].clone();
        let handle = ThresholdServer::new(keys).spawn();

        let (req, blinded_left, blinded_right) = request([7u8; 16])?;
        let response = handle.sign(req).await?;

        assert_eq!(response.session, [7u8; 16]);
        assert_eq!(response.index, 2);
        let partials = response.outcome.expect("server signed");

        let left = decode_share::<G1Projective>(&partials.left)?;
        let right = decode_share::<G2Projective>(&partials.right)?;
        assert_eq!((left.index, right.index), (2, 2));
        verify_share::<G1Scheme>(&setup.commitments.left, &blinded_left, &left)?;
        verify_share::<G2Scheme>(&setup.commitments.right, &blinded_right, &right)
    }

    #[tokio::test]
    async fn swapped_groups_are_reported_in_the_envelope() -> Result<()> {
        let params = Parameters::new(3, 2)?;
        let setup = TrustedDealer::random().run(&params)?;
        let server = ThresholdServer::new(setup.server_keys[0].clone());

        let (mut req, _, _) = request([1u8; 16])?;
        std::mem::swap(&mut req.left, &mut req.right);

        let response = server.sign(req).await?;
        let reason = response.outcome.expect_err("server must refuse");
        assert!(reason.contains(&GroupTag::G2.to_string()));
        Ok(())
    }

    #[tokio::test]
    async fn malformed_points_are_reported_in_the_envelope() -> Result<()> {
        let params = Parameters::new(3, 2)?;
        let setup = TrustedDealer::random().run(&params)?;
        let server = ThresholdServer::new(setup.server_keys[0].clone());

        let (mut req, _, _) = request([2u8; 16])?;
        req.left.bytes.truncate(10);
        assert!(server.sign(req.clone()).await?.outcome.is_err());

        req.left = TaggedPoint {
            tag: GroupTag::Gt,
            bytes: Point::to_bytes(&<G1Projective as Point>::generator()),
        };
        assert!(server.sign(req).await?.outcome.is_err());
        Ok(())
    }

    #[tokio::test]
    async fn stopped_server_is_unavailable() -> Result<()> {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let handle = ServerHandle { index: 4, tx };

        let (req, _, _) = request([3u8; 16])?;
        assert!(matches!(
            handle.sign(req).await,
            Err(Error::ServerUnavailable { index: 4 })
        ));
        Ok(())
    }
}
