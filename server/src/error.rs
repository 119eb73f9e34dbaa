use shared::error::SetupError;
use shared::owner::ControllerId;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("server is full ({max} players)")]
    Full { max: usize },
    #[error("peer {0} already has an actor")]
    AlreadyJoined(ControllerId),
    #[error("no actor for peer {0}")]
    UnknownPeer(ControllerId),
    #[error(transparent)]
    Setup(#[from] SetupError),
}
