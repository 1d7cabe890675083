//! Resource handler: the cache/fetch policy behind the link and peer server.

use std::sync::Arc;

use peerlink_core::{Resource, ResourceInfo, TransferCommand};
use tokio::sync::Mutex;

/// Cache/fetch policy consumed by the link (notifications) and the peer
/// server (lookups). Implementations must tolerate concurrent calls: server
/// requests race with the dispatch loop.
pub trait ResourceHandler: Send + Sync {
    /// An informative `TellInfo` arrived over the link.
    fn info_received(&self, info: ResourceInfo);

    /// A transfer instruction arrived over the link. Delivered exactly once
    /// per command, in receipt order.
    fn transfer_command(&self, cmd: TransferCommand);

    /// Metadata for a URL, if cached. Absence is a normal outcome.
    fn cached_info(&self, url: &str) -> Option<ResourceInfo>;

    /// Bytes for a resource, if cached. None is a cache miss, not an error.
    fn cached_bytes(&self, resource: &Resource) -> Option<Vec<u8>>;
}

/// The one handler slot a link and its embedded server share. The lock
/// serializes dispatch; the server only clones the inner `Arc` out, so
/// lookups never wait on an in-flight dispatch.
pub type SharedHandler = Arc<Mutex<Option<Arc<dyn ResourceHandler>>>>;
