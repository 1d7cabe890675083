//! Peer node runtime: the server link with its receive/dispatch loop, the
//! embedded peer server, and the supporting transport and cache pieces.

pub mod cache;
pub mod config;
pub mod handler;
pub mod link;
pub mod server;
pub mod transport;

pub use cache::MemoryCache;
pub use handler::{ResourceHandler, SharedHandler};
pub use link::PeerLink;
pub use server::PeerServer;
pub use transport::{MessageSink, MessageSource, TcpTransport, Transport, TransportError};
