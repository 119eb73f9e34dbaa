pub mod actor;
pub mod authority;
pub mod bitmask_flags;
pub mod body;
pub mod config;
pub mod constants;
pub mod equipment;
pub mod error;
pub mod hooks;
pub mod input;
pub mod interaction;
pub mod item;
pub mod messages;
pub mod model;
pub mod owner;
pub mod probe;
pub mod proximity;
pub mod rapier_world;
pub mod replication;
pub mod state;
pub mod transport;
pub mod utils;
pub mod world;

pub use actor::{Actor, ActorParts};
pub use authority::{DropReason, OpClass, RequestOutcome, Route};
pub use bitmask_flags::{CollisionLayer, LayerMask};
pub use body::{CharacterBody, FlatGroundBody, SlideCollision};
pub use config::GameplayConfig;
pub use constants::AUTHORITY_ID;
pub use equipment::{Equipment, Slot};
pub use error::{ConfigError, InteractionError, SetupError, UseError};
pub use hooks::{ActorHooks, AnimationOverlay, NoopHooks};
pub use input::InputIntent;
pub use interaction::{Interactable, InteractionTargeting, PickupInteractable};
pub use item::{Item, ItemName, ItemRegistry};
pub use messages::{Envelope, Inbox, Request};
pub use model::{AssetResolver, BuiltinModels, ModelCache, ModelHandle, ModelId};
pub use owner::{ControllerId, PeerContext};
pub use probe::{FlatSurface, NoSurface, SurfaceProbe};
pub use rapier_world::{ColliderShapeDef, RapierQueryWorld, WorldStaticDef};
pub use replication::{ActorSnapshot, FieldUpdate, FieldValue, ItemSnapshot, Replicated, Replication};
pub use state::{StateId, StateMachine, StatePayload};
pub use transport::{MemoryTransport, Transport};
pub use world::{Projectile, ProjectileEvent, World};
