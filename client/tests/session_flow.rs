//! Server and clients wired together through the in-memory transport.

use client::ClientSession;
use nalgebra::{Isometry3, Vector3};
use server::{ServerConfig, ServerSession};
use shared::authority::{DropReason, RequestOutcome};
use shared::config::GameplayConfig;
use shared::equipment::Slot;
use shared::input::InputIntent;
use shared::item::Item;
use shared::messages::{Envelope, Request};
use shared::model::BuiltinModels;
use shared::owner::ControllerId;
use shared::probe::FlatSurface;
use shared::replication::{FieldUpdate, FieldValue, Replication};
use shared::state::StateId;
use shared::transport::MemoryTransport;
use shared::utils::pose_from_yaw;

const DT: f32 = 1.0 / 60.0;

type Server = ServerSession<MemoryTransport, BuiltinModels>;
type Client = ClientSession<MemoryTransport, BuiltinModels>;

fn init_logs() {
    let _ = env_logger::builder().is_test(true).try_init();
}

struct Harness {
    server: Server,
    clients: Vec<Client>,
    outcomes: Vec<RequestOutcome>,
}

impl Harness {
    fn new() -> Self {
        init_logs();
        let mut server = ServerSession::new(
            ServerConfig::default(),
            MemoryTransport::default(),
            BuiltinModels,
            Box::new(FlatSurface::world_floor(0.0)),
        );
        server.start().unwrap();
        // Peer 2 spawns at x = 2, facing -Z, right next to it.
        server.spawn_item(Item::blaster(
            "blaster",
            pose_from_yaw(Vector3::new(2.0, 0.0, -1.0), 0.0),
        ));
        server.transport_mut().drain_broadcasts();
        Self {
            server,
            clients: Vec::new(),
            outcomes: Vec::new(),
        }
    }

    fn join(&mut self, peer: ControllerId) {
        self.server.peer_joined(peer, format!("Peer {peer}")).unwrap();
        let mut client = ClientSession::new(
            peer,
            GameplayConfig::default(),
            MemoryTransport::default(),
            BuiltinModels,
            Box::new(FlatSurface::world_floor(0.0)),
        );
        for update in self.server.snapshot() {
            client.apply_update(update);
        }
        self.clients.push(client);
        self.pump_broadcasts();
    }

    fn client(&self, peer: ControllerId) -> &Client {
        self.clients
            .iter()
            .find(|client| client.local() == peer)
            .unwrap()
    }

    fn pump_broadcasts(&mut self) {
        for update in self.server.transport_mut().drain_broadcasts() {
            for client in &mut self.clients {
                client.apply_update(update.clone());
            }
        }
    }

    /// One frame everywhere. `intents` maps peers to their input for this frame.
    fn step(&mut self, intents: &[(ControllerId, InputIntent)]) {
        for client in &mut self.clients {
            let intent = intents
                .iter()
                .find(|(peer, _)| *peer == client.local())
                .map(|(_, intent)| intent.clone())
                .unwrap_or_default();
            client.local_input(intent);
            client.frame_tick(DT);
            client.physics_tick(DT);
            for envelope in client.transport_mut().drain_outbound() {
                self.server.enqueue(envelope);
            }
        }

        self.server.frame_tick(DT);
        self.outcomes = self.server.physics_tick(DT);
        self.pump_broadcasts();
    }
}

fn interact() -> InputIntent {
    InputIntent {
        interact: true,
        ..Default::default()
    }
}

fn close(a: &Isometry3<f32>, b: &Isometry3<f32>) -> bool {
    (a.translation.vector - b.translation.vector).norm() < 1.0e-4
}

#[test]
fn remote_walk_reaches_observers() {
    let mut harness = Harness::new();
    harness.join(2);
    harness.join(3);

    for _ in 0..10 {
        harness.step(&[(2, InputIntent::moving(0.0, 1.0))]);
    }

    let authority = harness.server.actor(2).unwrap();
    assert_eq!(authority.state(), StateId::WALKING);
    assert!(authority.transform().translation.vector.z < 0.0);

    let owner = harness.client(2).local_actor().unwrap();
    assert_eq!(owner.state(), StateId::WALKING);
    assert_eq!(owner.state_version(), authority.state_version());

    let observed = harness.client(3).actor(2).unwrap();
    assert_eq!(observed.state(), StateId::WALKING);
    assert!(close(&observed.transform(), &authority.transform()));
    assert!(harness.outcomes.iter().all(RequestOutcome::is_applied));
}

#[test]
fn pickup_then_drop_round_trip() {
    let mut harness = Harness::new();
    harness.join(2);
    harness.step(&[]);

    let guest = harness.client(2);
    assert_eq!(guest.local_actor().unwrap().current_target(), Some("blaster"));
    assert_eq!(guest.interaction_prompt().as_deref(), Some("Pick up blaster"));

    harness.step(&[(2, interact())]);
    let held = harness.server.world().items.get("blaster").unwrap();
    assert!(held.frozen);
    assert_eq!(held.holder, Some(2));

    let guest = harness.client(2);
    assert_eq!(guest.local_actor().unwrap().item_in(Slot::RightHand), Some("blaster"));
    assert!(guest.world().items.get("blaster").unwrap().frozen);
    assert_eq!(guest.overlay(2).unwrap().snapshot().hold_blend, 1.0);

    let drop = InputIntent {
        drop: true,
        ..Default::default()
    };
    harness.step(&[(2, drop)]);

    let guest = harness.client(2);
    assert_eq!(guest.local_actor().unwrap().item_in(Slot::RightHand), None);
    let mirrored = guest.world().items.get("blaster").unwrap();
    assert!(!mirrored.frozen);
    let at = mirrored.position();
    assert!((at - Vector3::new(2.0, 0.05, -1.0)).norm() < 1.0e-3, "dropped at {at:?}");
    assert_eq!(
        *mirrored.transform.get(),
        *harness.server.world().items.get("blaster").unwrap().transform.get()
    );
}

#[test]
fn spoofed_requests_change_nothing() {
    let mut harness = Harness::new();
    harness.join(2);
    harness.join(3);
    harness.step(&[]);

    harness.server.enqueue(Envelope {
        sender: 3,
        actor: 2,
        request: Request::Equip {
            item: "blaster".into(),
            slot: "RightHand".into(),
        },
    });
    harness.step(&[]);

    assert_eq!(
        harness.outcomes,
        vec![RequestOutcome::Dropped(DropReason::Unauthorized {
            sender: 3,
            controller: 2
        })]
    );
    assert_eq!(harness.server.actor(2).unwrap().item_in(Slot::RightHand), None);
    assert_eq!(harness.client(3).actor(2).unwrap().item_in(Slot::RightHand), None);
}

#[test]
fn stale_updates_are_ignored() {
    let mut harness = Harness::new();
    harness.join(2);
    harness.join(3);
    harness.step(&[(2, InputIntent::default().with_jump())]);
    assert_eq!(harness.client(3).actor(2).unwrap().state(), StateId::JUMPING);

    let stale = Replication::Field(FieldUpdate {
        actor: 2,
        version: 0,
        value: FieldValue::StateId(StateId::IDLE),
    });
    let observer = harness.clients.iter_mut().find(|c| c.local() == 3).unwrap();
    assert!(!observer.apply_update(stale));
    assert_eq!(observer.actor(2).unwrap().state(), StateId::JUMPING);
}

#[test]
fn late_joiners_see_held_items() {
    let mut harness = Harness::new();
    harness.join(2);
    harness.step(&[]);
    harness.step(&[(2, interact())]);

    harness.join(3);
    let late = harness.client(3);
    assert_eq!(late.actor(2).unwrap().item_in(Slot::RightHand), Some("blaster"));
    assert!(late.world().items.get("blaster").unwrap().frozen);
}

#[test]
fn leaving_peer_releases_items_everywhere() {
    let mut harness = Harness::new();
    harness.join(2);
    harness.join(3);
    harness.step(&[]);
    harness.step(&[(2, interact())]);
    assert!(harness.client(3).world().items.get("blaster").unwrap().frozen);

    harness.server.peer_left(2).unwrap();
    harness.clients.retain(|client| client.local() != 2);
    harness.pump_broadcasts();

    let observer = harness.client(3);
    assert!(observer.actor(2).is_none());
    assert!(!observer.world().items.get("blaster").unwrap().frozen);
}

fn owner_request(peer: ControllerId, request: Request) -> Envelope {
    Envelope {
        sender: peer,
        actor: peer,
        request,
    }
}

fn equip_blaster() -> Request {
    Request::Equip {
        item: "blaster".into(),
        slot: "RightHand".into(),
    }
}

#[test]
fn same_tick_handoff_keeps_the_item_frozen() {
    let mut harness = Harness::new();
    harness.join(2);
    harness.join(3);
    harness.server.enqueue(owner_request(3, equip_blaster()));
    harness.step(&[]);
    assert_eq!(harness.client(2).actor(3).unwrap().item_in(Slot::RightHand), Some("blaster"));

    // Actor 2's slot update is broadcast before actor 3's release.
    harness.server.enqueue(owner_request(3, Request::Drop));
    harness.server.enqueue(owner_request(2, equip_blaster()));
    harness.step(&[]);
    assert_eq!(harness.outcomes, vec![RequestOutcome::Applied; 2]);

    let held = harness.server.world().items.get("blaster").unwrap();
    assert!(held.frozen);
    assert_eq!(held.holder, Some(2));
    for peer in [2, 3] {
        let client = harness.client(peer);
        assert_eq!(client.actor(2).unwrap().item_in(Slot::RightHand), Some("blaster"));
        assert_eq!(client.actor(3).unwrap().item_in(Slot::RightHand), None);
        let mirrored = client.world().items.get("blaster").unwrap();
        assert!(mirrored.frozen, "peer {peer} released a held item");
        assert_eq!(mirrored.holder, Some(2));
    }
}

#[test]
fn darts_fly_on_every_peer() {
    let mut harness = Harness::new();
    harness.join(2);
    harness.join(3);
    harness.step(&[]);
    harness.step(&[(2, interact())]);

    let fire = InputIntent {
        primary_use: true,
        ..Default::default()
    };
    harness.step(&[(2, fire)]);
    assert_eq!(harness.server.world().projectiles().len(), 1);
    assert_eq!(harness.client(3).world().projectiles().len(), 1);

    for _ in 0..200 {
        harness.step(&[]);
    }
    assert!(harness.server.world().projectiles().is_empty());
    assert!(harness.client(3).world().projectiles().is_empty());
}
