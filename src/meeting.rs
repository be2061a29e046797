//! The public lookup where contacts find each other.
//!
//! Both users of a mutual pair derive the same [`KeyMaterial`] and thus the
//! same meeting point. The first one to arrive publishes the material under
//! the point. The second one finds it, recognises its own material and
//! replaces it with an acknowledgement, which the first one picks up on its
//! next visit. A user never counts its own publication as a match.

use crate::keys::KeyMaterial;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use sha2::{Digest, Sha256};
use std::sync::Arc;

const ACK_TAG: &[u8] = b"contact-discovery/ack";

/// Hex encoded SHA-256 of the key material.
pub fn meeting_point(material: &KeyMaterial) -> String {
    hex::encode(Sha256::digest(material.as_bytes()))
}

fn acknowledgement(material: &KeyMaterial) -> Vec<u8> {
    Sha256::new()
        .chain_update(ACK_TAG)
        .chain_update(material.as_bytes())
        .finalize()
        .to_vec()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MeetOutcome {
    /// Nothing was there; our material is now published.
    Published,
    /// Our contact published first; we left an acknowledgement.
    Matched,
    /// Our contact found our publication.
    Acknowledged,
    /// Our publication is still waiting for the contact.
    Pending,
    /// Something else is stored under the point.
    Mismatch,
}

impl MeetOutcome {
    pub fn is_present(&self) -> bool {
        matches!(self, MeetOutcome::Matched | MeetOutcome::Acknowledged)
    }
}

/// Concurrent map from meeting point to stored bytes. Clones share the map.
#[derive(Clone, Debug, Default)]
pub struct MeetingPlatform {
    points: Arc<DashMap<String, Vec<u8>>>,
}

impl MeetingPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, point: &str) -> Option<Vec<u8>> {
        self.points.get(point).map(|value| value.value().clone())
    }

    pub fn put(&self, point: String, value: Vec<u8>) {
        self.points.insert(point, value);
    }

    /// Atomically publishes, matches or acknowledges at `point`.
    ///
    /// `published` tells whether the caller already put its material there.
    pub fn meet(&self, point: &str, material: &KeyMaterial, published: bool) -> MeetOutcome {
        let ack = acknowledgement(material);
        match self.points.entry(point.to_string()) {
            Entry::Vacant(entry) => {
                entry.insert(material.as_bytes().to_vec());
                MeetOutcome::Published
            }
            Entry::Occupied(mut entry) => {
                if entry.get().as_slice() == material.as_bytes() {
                    if published {
                        MeetOutcome::Pending
                    } else {
                        entry.insert(ack);
                        MeetOutcome::Matched
                    }
                } else if *entry.get() == ack {
                    MeetOutcome::Acknowledged
                } else {
                    MeetOutcome::Mismatch
                }
            }
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::G2Hashing;
    use crate::error::Result;
    use crate::group::Point;
    use crate::keys::{ConstrainingKeys, PublicKeys, SharedKeys};
    use blstrs::Scalar;
    use ff::Field;

    fn material(me: &str, them: &str, x: &Scalar) -> Result<KeyMaterial> {
        let mine = PublicKeys::derive(me, G2Hashing::SeededPick)?;
        let theirs = PublicKeys::derive(them, G2Hashing::SeededPick)?;
        let keys = ConstrainingKeys::new(Point::mul(&mine.left, x), Point::mul(&mine.right, x));
        SharedKeys::derive(&keys, &theirs).key_material()
    }

    #[test]
    fn meeting_point_is_a_sha256_digest() -> Result<()> {
        let x = Scalar::random(&mut rand::thread_rng());
        let point = meeting_point(&material("electra", "thaumas", &x)?);
        assert_eq!(point.len(), 64);
        assert!(point.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(point, meeting_point(&material("thaumas", "electra", &x)?));
        Ok(())
    }

    #[test]
    fn both_sides_learn_of_each_other() -> Result<()> {
        let x = Scalar::random(&mut rand::thread_rng());
        let electra = material("electra", "thaumas", &x)?;
        let thaumas = material("thaumas", "electra", &x)?;
        let point = meeting_point(&electra);
        let platform = MeetingPlatform::new();

        assert_eq!(platform.meet(&point, &electra, false), MeetOutcome::Published);
        assert_eq!(platform.meet(&point, &electra, true), MeetOutcome::Pending);
        assert_eq!(platform.meet(&point, &thaumas, false), MeetOutcome::Matched);
        assert_eq!(platform.meet(&point, &electra, true), MeetOutcome::Acknowledged);
        assert_eq!(platform.meet(&point, &thaumas, false), MeetOutcome::Acknowledged);
        assert_eq!(platform.len(), 1);
        Ok(())
    }

    #[test]
    fn foreign_value_is_a_mismatch() -> Result<()> {
        let x = Scalar::random(&mut rand::thread_rng());
        let electra = material("electra", "thaumas", &x)?;
        let point = meeting_point(&electra);
        let platform = MeetingPlatform::new();

        platform.put(point.clone(), vec![0u8; 32]);
        assert_eq!(platform.meet(&point, &electra, false), MeetOutcome::Mismatch);
        assert_eq!(platform.get(&point), Some(vec![0u8; 32]));
        assert_eq!(platform.get("absent"), None);
        Ok(())
    }
}
