//! Peer connection lifecycle.
//!
//! - On join: the peer gets an Idle actor at the next spawn point, announced
//!   to everyone. Joining twice or past `max_players` is refused.
//! - On leave: the actor unequips everything (items drop in place, unfrozen),
//!   the slot changes are broadcast, then the actor is despawned.

use shared::model::AssetResolver;
use shared::owner::ControllerId;
use shared::replication::Replication;
use shared::transport::Transport;

use crate::error::SessionError;
use crate::session::ServerSession;

impl<T: Transport, R: AssetResolver> ServerSession<T, R> {
    pub fn peer_joined(
        &mut self,
        peer: ControllerId,
        display_name: impl Into<String>,
    ) -> Result<(), SessionError> {
        let display_name = display_name.into();
        log::info!("peer {peer} joined as {display_name}");
        self.spawn_actor(peer, display_name)
    }

    pub fn peer_left(&mut self, peer: ControllerId) -> Result<(), SessionError> {
        let mut actor = self
            .actors
            .remove(&peer)
            .ok_or(SessionError::UnknownPeer(peer))?;

        actor.release_equipment(&mut self.world);
        for update in actor.take_changes() {
            self.transport.broadcast(Replication::Field(update));
        }
        self.transport
            .broadcast(Replication::ActorDespawned { actor: peer });
        log::info!("peer {peer} left, despawned {}", actor.display_name());
        Ok(())
    }
}
