mod replication;
pub mod session;

pub use session::ClientSession;
