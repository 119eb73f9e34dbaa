pub mod config;
mod connection;
pub mod error;
pub mod session;

pub use config::ServerConfig;
pub use error::SessionError;
pub use session::ServerSession;
