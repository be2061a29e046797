//! A participant of contact discovery and their address book.
//!
//! ```rust
//! use blsdisco::{Parameters, User};
//!
//! let user = User::new("electra", ["arke", "thaumas"], &Parameters::default()).expect("valid user");
//! assert_eq!(user.contacts().len(), 2);
//! assert!(user.present_contacts().is_empty());
//! ```

use crate::client;
use crate::config::{G2Hashing, Parameters};
use crate::dealer::PublicCommitments;
use crate::error::{Error, Result};
use crate::keys::{ConstrainingKeys, PublicKeys, SharedKeys};
use crate::meeting::{meeting_point, MeetOutcome, MeetingPlatform};
use crate::server::SigningService;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug)]
pub struct User {
    identifier: String,
    contacts: Vec<String>,
    g2_hashing: G2Hashing,
    public_keys: PublicKeys,
    constraining_keys: Option<ConstrainingKeys>,
    shared_keys: HashMap<String, SharedKeys>,
    presence: HashMap<String, bool>,
    /// Meeting points we put our own material at.
    published: HashSet<String>,
}

impl User {
    /// Creates a user whose contacts are all initially absent.
    pub fn new<I, C>(identifier: impl Into<String>, contacts: I, params: &Parameters) -> Result<Self>
    where
        I: IntoIterator<Item = C>,
        C: Into<String>,
    {
        let identifier = identifier.into();
        let contacts: Vec<String> = contacts.into_iter().map(Into::into).collect();
        let presence = contacts.iter().map(|c| (c.clone(), false)).collect();
        Ok(Self {
            public_keys: PublicKeys::derive(&identifier, params.g2_hashing)?,
            identifier,
            contacts,
            g2_hashing: params.g2_hashing,
            constraining_keys: None,
            shared_keys: HashMap::new(),
            presence,
            published: HashSet::new(),
        })
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn contacts(&self) -> &[String] {
        &self.contacts
    }

    pub fn public_keys(&self) -> &PublicKeys {
        &self.public_keys
    }

    pub fn constraining_keys(&self) -> Option<&ConstrainingKeys> {
        self.constraining_keys.as_ref()
    }

    pub fn shared_keys(&self, contact: &str) -> Option<&SharedKeys> {
        self.shared_keys.get(contact)
    }

    /// Runs the derivation protocol once; later calls keep the first result.
    pub async fn request_constraining_keys(
        &mut self,
        roster: &[Arc<dyn SigningService>],
        commitments: &PublicCommitments,
        params: &Parameters,
    ) -> Result<&ConstrainingKeys> {
        if self.constraining_keys.is_none() {
            let keys =
                client::request_constraining_keys(&self.identifier, roster, commitments, params)
                    .await?;
            self.constraining_keys = Some(keys);
        }
        self.constraining_keys
            .as_ref()
            .ok_or(Error::MissingConstrainingKeys)
    }

    fn derive_shared_keys(&self, contact: &str) -> Result<SharedKeys> {
        let mine = self
            .constraining_keys
            .as_ref()
            .ok_or(Error::MissingConstrainingKeys)?;
        let theirs = PublicKeys::derive(contact, self.g2_hashing)?;
        Ok(SharedKeys::derive(mine, &theirs))
    }

    /// Computes the shared keys with every contact.
    pub fn compute_shared_keys(&mut self) -> Result<()> {
        for contact in &self.contacts {
            let keys = self.derive_shared_keys(contact)?;
            self.shared_keys.insert(contact.clone(), keys);
        }
        debug!(user = %self.identifier, contacts = self.contacts.len(), "shared keys computed");
        Ok(())
    }

    /// Visits the meeting point shared with `contact` and returns whether the
    /// contact is known to be present.
    pub fn meet(&mut self, contact: &str, platform: &MeetingPlatform) -> Result<bool> {
        let keys = match self.shared_keys.get(contact) {
            Some(keys) => *keys,
            None => {
                let keys = self.derive_shared_keys(contact)?;
                self.shared_keys.insert(contact.to_string(), keys);
                keys
            }
        };
        let material = keys.key_material()?;
        let point = meeting_point(&material);

        let outcome = platform.meet(&point, &material, self.published.contains(&point));
        debug!(user = %self.identifier, meeting_point = %point, ?outcome, "visited meeting point");
        match outcome {
            MeetOutcome::Published => {
                self.published.insert(point);
            }
            MeetOutcome::Mismatch => {
                warn!(user = %self.identifier, meeting_point = %point, "unexpected value at meeting point")
            }
            _ => {}
        }

        let present = self.presence.entry(contact.to_string()).or_insert(false);
        if outcome.is_present() && !*present {
            info!(user = %self.identifier, contact, "contact is present");
            *present = true;
        }
        Ok(*present)
    }

    /// Meets every contact and returns how many are present.
    pub fn meet_all(&mut self, platform: &MeetingPlatform) -> Result<usize> {
        let contacts = self.contacts.clone();
        let mut found = 0;
        for contact in &contacts {
            if self.meet(contact, platform)? {
                found += 1;
            }
        }
        Ok(found)
    }

    pub fn is_present(&self, contact: &str) -> bool {
        self.presence.get(contact).copied().unwrap_or(false)
    }

    /// Present contacts, in address book order.
    pub fn present_contacts(&self) -> Vec<&str> {
        self.contacts
            .iter()
            .filter(|c| self.is_present(c))
            .map(String::as_str)
            .collect()
    }
}
