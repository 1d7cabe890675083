//! Wire protocol: message types and version.

use serde::{Deserialize, Serialize};

use crate::resource::{Range, ResourceInfo};

/// Current protocol version.
pub const PROTOCOL_VERSION: u8 = 1;

/// All wire message types. Encoding is bincode; framing is length-prefix (see wire module).
///
/// A link dispatches only `TellInfo` and `Transfer` to its handler; every
/// other inbound variant is discarded. The remaining variants exist for the
/// link's owner to send.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Message {
    /// Ask the remote side for metadata about a URL.
    AskInfo { url: String },
    /// Metadata for a URL. Size 0 means "nothing known"; dispatch drops it.
    TellInfo(ResourceInfo),
    /// Request bytes for a URL, optionally a sub-range.
    Request { url: String, range: Option<Range> },
    /// Instruction to move a chunk to or from a peer. Opaque to the link.
    Transfer(TransferCommand),
    /// Report that a chunk transfer finished.
    Completed { url: String, chunk_id: u64 },
    /// Advertise the local peer server's listening port. Sent once at
    /// link construction when peer serving is enabled.
    ChangePort { port: u16 },
}

/// A transfer instruction. The link forwards this to the handler verbatim
/// and never inspects it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TransferCommand {
    pub url: String,
    pub chunk_id: u64,
    pub peer: PeerAddr,
    pub direction: Direction,
}

/// Host/port of a remote peer's server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PeerAddr {
    pub host: String,
    pub port: u16,
}

/// Which way the bytes flow for a transfer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Direction {
    /// Receive the chunk from the peer.
    Inbound,
    /// Send the chunk to the peer.
    Outbound,
}
