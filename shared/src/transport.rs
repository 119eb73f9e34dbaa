use std::collections::VecDeque;

use crate::messages::Envelope;
use crate::replication::Replication;

/// Message plumbing between peers.
///
/// Delivery is reliable and ordered per sender. Serialization and the actual
/// socket live behind this trait.
pub trait Transport {
    /// Non-authority peers: deliver a request to the authority.
    fn send_to_authority(&mut self, envelope: Envelope);

    /// Authority: deliver an update to every peer.
    fn broadcast(&mut self, update: Replication);
}

/// In-process transport that just queues messages for a harness to shuttle.
#[derive(Default, Debug)]
pub struct MemoryTransport {
    outbound: VecDeque<Envelope>,
    broadcasts: VecDeque<Replication>,
}

impl MemoryTransport {
    pub fn drain_outbound(&mut self) -> Vec<Envelope> {
        self.outbound.drain(..).collect()
    }

    pub fn drain_broadcasts(&mut self) -> Vec<Replication> {
        self.broadcasts.drain(..).collect()
    }
}

impl Transport for MemoryTransport {
    fn send_to_authority(&mut self, envelope: Envelope) {
        self.outbound.push_back(envelope);
    }

    fn broadcast(&mut self, update: Replication) {
        self.broadcasts.push_back(update);
    }
}
