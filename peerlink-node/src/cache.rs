//! In-memory resource cache: the default handler for a node.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use peerlink_core::{Resource, ResourceInfo, TransferCommand};

use crate::handler::ResourceHandler;

/// Map-backed cache. Info is keyed by URL, bytes by the full resource
/// identity (URL plus range), so overlapping ranges coexist. Transfer
/// commands are queued for the owner to drain and act on.
#[derive(Default)]
pub struct MemoryCache {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    infos: HashMap<String, ResourceInfo>,
    bytes: HashMap<Resource, Vec<u8>>,
    commands: Vec<TransferCommand>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store metadata for a URL.
    pub fn put_info(&self, info: ResourceInfo) {
        self.lock().infos.insert(info.url.clone(), info);
    }

    /// Store bytes for a resource.
    pub fn put_bytes(&self, resource: Resource, data: Vec<u8>) {
        self.lock().bytes.insert(resource, data);
    }

    /// Take all transfer commands received so far, in receipt order.
    pub fn drain_commands(&self) -> Vec<TransferCommand> {
        std::mem::take(&mut self.lock().commands)
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A panicked writer leaves plain maps behind; keep serving them.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl ResourceHandler for MemoryCache {
    fn info_received(&self, info: ResourceInfo) {
        self.put_info(info);
    }

    fn transfer_command(&self, cmd: TransferCommand) {
        self.lock().commands.push(cmd);
    }

    fn cached_info(&self, url: &str) -> Option<ResourceInfo> {
        self.lock().infos.get(url).cloned()
    }

    fn cached_bytes(&self, resource: &Resource) -> Option<Vec<u8>> {
        self.lock().bytes.get(resource).cloned()
    }
}
