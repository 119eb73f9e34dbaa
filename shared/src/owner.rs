//! Peer identity.
//!
//! Every connected peer has a numeric controller id. The authority is always
//! [`AUTHORITY_ID`]. Components receive a [`PeerContext`] at construction and
//! ask it who they are instead of looking anything up at runtime.

use crate::constants::AUTHORITY_ID;
use serde::{Deserialize, Serialize};

/// Network identity of a peer; also names the actor that peer controls.
pub type ControllerId = u32;

/// The local peer's view of one actor.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerContext {
    /// Id of the peer running this code.
    pub local: ControllerId,
    /// Id of the peer that controls the actor.
    pub controller: ControllerId,
}

impl PeerContext {
    pub fn new(local: ControllerId, controller: ControllerId) -> Self {
        Self { local, controller }
    }

    /// True on the authority peer, for every actor.
    pub fn is_authority(&self) -> bool {
        self.local == AUTHORITY_ID
    }

    /// True when the local peer controls the actor.
    pub fn is_owner(&self) -> bool {
        self.local == self.controller
    }

    /// Owner that is not also the authority; its mutations must travel as requests.
    pub fn is_remote_owner(&self) -> bool {
        self.is_owner() && !self.is_authority()
    }

    /// Equipped-item transforms are driven only by the authority and the owning peer.
    pub fn drives_attachments(&self) -> bool {
        self.is_authority() || self.is_owner()
    }
}
