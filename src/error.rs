use crate::group::GroupTag;
use crate::poly::Index;
use thiserror::Error;

/// Specialisation of `std::Result`.
pub type Result<T, E = DiscoveryError> = std::result::Result<T, E>;
pub type Error = DiscoveryError;

#[derive(Error, Debug)]
/// error variants.
pub enum DiscoveryError {
    #[error("point belongs to {found}, expected a {expected} point")]
    GroupMismatch { expected: GroupTag, found: GroupTag },

    #[error("operation is not defined over {0}")]
    UnsupportedGroup(GroupTag),

    #[error("failed to encode {group} element: {reason}")]
    Encoding { group: GroupTag, reason: String },

    #[error("failed to decode {group} element: {reason}")]
    Decoding { group: GroupTag, reason: String },

    #[error("malformed share: expected {expected} bytes, got {actual}")]
    MalformedShare { expected: usize, actual: usize },

    #[error("share index {index} is not usable with {n} servers")]
    InvalidShareIndex { index: Index, n: usize },

    #[error("bls: invalid signature")]
    InvalidSignature,

    #[error("signature share {index} failed verification")]
    InvalidShare { index: Index },

    #[error("not enough signature shares: required {required}, provided {provided}")]
    InsufficientShares { required: usize, provided: usize },

    #[error("not enough servers to meet the threshold: required {required}, available {available}")]
    InsufficientServers { required: usize, available: usize },

    #[error("blinding factor must be a non-zero scalar")]
    InvalidBlindingFactor,

    #[error("constraining keys have not been requested yet")]
    MissingConstrainingKeys,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("server {index} is unavailable")]
    ServerUnavailable { index: Index },

    #[error("server {index} failed to sign: {reason}")]
    ServerFailure { index: Index, reason: String },

    #[error("server {index} answered for a different session")]
    SessionMismatch { index: Index },

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
