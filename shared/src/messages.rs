use std::collections::VecDeque;

use nalgebra::{Isometry3, Vector3};
use serde::{Deserialize, Serialize};

use crate::item::ItemName;
use crate::owner::ControllerId;
use crate::state::{StateId, StatePayload};

/// A mutation a non-authority peer asks the authority to perform on an actor.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Request {
    SetState {
        state: StateId,
        payload: Option<StatePayload>,
    },
    /// Slot names travel as text; the authority rejects names it does not know.
    Equip {
        item: ItemName,
        slot: String,
    },
    Unequip {
        slot: String,
    },
    PrimaryUse,
    SecondaryUse,
    Drop,
    Interact {
        target: String,
    },
    PushProp {
        item: ItemName,
        impulse: Vector3<f32>,
    },
    /// The owner drives its own body and reports where it ended up.
    ReportTransform {
        transform: Isometry3<f32>,
    },
}

impl Request {
    /// Short label for logs.
    pub fn label(&self) -> &'static str {
        match self {
            Request::SetState { .. } => "set_state",
            Request::Equip { .. } => "equip",
            Request::Unequip { .. } => "unequip",
            Request::PrimaryUse => "primary_use",
            Request::SecondaryUse => "secondary_use",
            Request::Drop => "drop",
            Request::Interact { .. } => "interact",
            Request::PushProp { .. } => "push_prop",
            Request::ReportTransform { .. } => "report_transform",
        }
    }
}

/// A request as delivered to the authority, stamped with the transport-level sender.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub sender: ControllerId,
    pub actor: ControllerId,
    pub request: Request,
}

/// Arrival-ordered queue of inbound requests, drained once per authority tick.
#[derive(Default, Debug)]
pub struct Inbox {
    queue: VecDeque<Envelope>,
}

impl Inbox {
    pub fn push(&mut self, envelope: Envelope) {
        self.queue.push_back(envelope);
    }

    /// Everything received so far, oldest first.
    pub fn drain(&mut self) -> impl Iterator<Item = Envelope> + '_ {
        self.queue.drain(..)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
