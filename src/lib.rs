//! Privacy preserving contact discovery.
//!
//! Threshold servers jointly hold a BLS master secret `x`. A user obtains
//! `x * H1(id)` and `x * H2(id)` through a blind threshold signature, so no
//! server learns `id` and no coalition below the threshold learns `x`. Two
//! users who list each other pair these keys with each other's identity
//! points, agree on the same key material and meet at its digest.

mod blind_sigs;
mod client;
mod config;
mod dealer;
mod error;
mod group;
mod keys;
mod meeting;
mod poly;
mod scheme;
mod server;
mod shares;
mod user;
mod utils;

pub use crate::blind_sigs::{blind, sign, unblind, verify, BlindSigner, BlindingFactor};
pub use crate::client::{request_constraining_keys, roster};
pub use crate::config::{G2Hashing, Parameters, MAX_SERVERS};
pub use crate::dealer::{PublicCommitments, ServerKeys, Setup, TrustedDealer, TrustedSetup};
pub use crate::error::{DiscoveryError, Error, Result};
pub use crate::group::{gt_to_bytes, GroupTag, Point, TaggedPoint, G1_SIZE, G2_SIZE, GT_SIZE};
pub use crate::keys::{ConstrainingKeys, KeyMaterial, PublicKeys, SharedKeys};
pub use crate::meeting::{meeting_point, MeetOutcome, MeetingPlatform};
pub use crate::poly::{interpolate_at_zero, Index, PublicPoly, SecretKeyShare, SecretPoly};
pub use crate::scheme::{G1Scheme, G2Scheme, Scheme};
pub use crate::server::{
    PartialSignatures, ServerHandle, SessionId, SignRequest, SignResponse, SigningService,
    ThresholdServer,
};
pub use crate::shares::{
    decode_share, encode_share, recover, sign_share, unblind_share, verify_share, SignatureShare,
    INDEX_SIZE,
};
pub use crate::user::User;
