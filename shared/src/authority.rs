//! Authority gate.
//!
//! Every mutating operation on an actor is routed through [`route`] before it
//! touches state, and every inbound request is checked with [`authorize`]
//! before it is applied.
//!
//! Notes:
//! - State transitions are predicted locally by the owner and also sent to the
//!   authority, which has the final say.
//! - Equipment, use, drop and interaction effects are authority-exclusive: a
//!   non-authority owner only sends the request.
//! - Peers that neither own nor host an actor never originate anything for it.

use crate::owner::{ControllerId, PeerContext};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Mutation category, which decides where an operation may run.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum OpClass {
    /// Owner predicts locally and also asks the authority.
    StateTransition,
    /// Only the authority applies; everyone else asks.
    AuthorityExclusive,
}

/// Where a locally-invoked operation goes.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Route {
    pub apply_locally: bool,
    pub send_to_authority: bool,
}

impl Route {
    const NOWHERE: Route = Route {
        apply_locally: false,
        send_to_authority: false,
    };

    pub fn is_dropped(&self) -> bool {
        !self.apply_locally && !self.send_to_authority
    }
}

/// Decides whether an operation is applied here, forwarded, or both.
pub fn route(ctx: &PeerContext, class: OpClass) -> Route {
    if ctx.is_authority() {
        return Route {
            apply_locally: true,
            send_to_authority: false,
        };
    }
    if !ctx.is_owner() {
        return Route::NOWHERE;
    }
    match class {
        OpClass::StateTransition => Route {
            apply_locally: true,
            send_to_authority: true,
        },
        OpClass::AuthorityExclusive => Route {
            apply_locally: false,
            send_to_authority: true,
        },
    }
}

/// Why an inbound request or local operation produced no change.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DropReason {
    /// Requests are only honoured on the authority.
    NotAuthority,
    /// The sender does not control the target actor.
    Unauthorized {
        sender: ControllerId,
        controller: ControllerId,
    },
    UnknownActor(ControllerId),
    UnknownState(u8),
    UnknownSlot(String),
    UnknownItem(String),
    /// The item is held by another actor.
    ItemHeld(String),
    UnknownTarget(String),
    /// Interact was requested with no current target.
    NoTarget,
    NothingEquipped,
    NotUsable(String),
    /// A usable or interactable effect raised an error; it was logged.
    EffectFailed(String),
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DropReason::NotAuthority => write!(f, "not the authority"),
            DropReason::Unauthorized { sender, controller } => {
                write!(f, "sender {sender} does not control actor {controller}")
            }
            DropReason::UnknownActor(id) => write!(f, "no actor {id}"),
            DropReason::UnknownState(tag) => write!(f, "unknown state tag {tag}"),
            DropReason::UnknownSlot(name) => write!(f, "unknown slot {name:?}"),
            DropReason::UnknownItem(name) => write!(f, "unknown item {name:?}"),
            DropReason::ItemHeld(name) => write!(f, "item {name:?} is held by another actor"),
            DropReason::UnknownTarget(id) => write!(f, "{id:?} is not an interaction candidate"),
            DropReason::NoTarget => write!(f, "no interaction target"),
            DropReason::NothingEquipped => write!(f, "nothing equipped"),
            DropReason::NotUsable(name) => write!(f, "item {name:?} is not usable"),
            DropReason::EffectFailed(msg) => write!(f, "effect failed: {msg}"),
        }
    }
}

/// Result of handling one request or operation.
///
/// Dropping is not an error: the tick carries on and the caller only logs it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RequestOutcome {
    Applied,
    /// Forwarded to the authority for a decision.
    Sent,
    Dropped(DropReason),
}

impl RequestOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, RequestOutcome::Applied)
    }
}

/// Checks that a request arriving at `local` from `sender` may mutate the
/// actor controlled by `controller`.
pub fn authorize(local: &PeerContext, sender: ControllerId) -> Result<(), DropReason> {
    if !local.is_authority() {
        return Err(DropReason::NotAuthority);
    }
    if sender != local.controller {
        return Err(DropReason::Unauthorized {
            sender,
            controller: local.controller,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::AUTHORITY_ID;

    #[test]
    fn authority_always_applies_locally() {
        let ctx = PeerContext::new(AUTHORITY_ID, 5);
        for class in [OpClass::StateTransition, OpClass::AuthorityExclusive] {
            let r = route(&ctx, class);
            assert!(r.apply_locally);
            assert!(!r.send_to_authority);
        }
    }

    #[test]
    fn remote_owner_predicts_transitions_only() {
        let ctx = PeerContext::new(5, 5);
        let transition = route(&ctx, OpClass::StateTransition);
        assert!(transition.apply_locally && transition.send_to_authority);

        let exclusive = route(&ctx, OpClass::AuthorityExclusive);
        assert!(!exclusive.apply_locally);
        assert!(exclusive.send_to_authority);
    }

    #[test]
    fn observer_routes_nowhere() {
        let ctx = PeerContext::new(5, 6);
        assert!(route(&ctx, OpClass::StateTransition).is_dropped());
        assert!(route(&ctx, OpClass::AuthorityExclusive).is_dropped());
    }

    #[test]
    fn authorize_rejects_foreign_sender() {
        // Authority's replica of actor 3 receiving a request that claims to come from peer 2.
        let ctx = PeerContext::new(AUTHORITY_ID, 3);
        assert_eq!(
            authorize(&ctx, 2),
            Err(DropReason::Unauthorized {
                sender: 2,
                controller: 3
            })
        );
        assert_eq!(authorize(&ctx, 3), Ok(()));
    }

    #[test]
    fn authorize_rejects_on_non_authority() {
        let ctx = PeerContext::new(3, 3);
        assert_eq!(authorize(&ctx, 3), Err(DropReason::NotAuthority));
    }
}
