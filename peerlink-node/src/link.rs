//! Peer link: owns a transport, runs the receive/dispatch loop, and
//! optionally embeds a peer server whose port it announces at startup.

use std::sync::Arc;

use peerlink_core::Message;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use crate::handler::{ResourceHandler, SharedHandler};
use crate::server::PeerServer;
use crate::transport::{MessageSink, MessageSource, Transport, TransportError};

/// One connection to the coordination server: a dedicated receive/dispatch
/// task, a shared sending half, and (when enabled) an embedded peer server.
///
/// The receive task is the sole reader of the transport. It stops
/// permanently on the first transport failure; `closed()` observes that.
pub struct PeerLink<S: MessageSink> {
    sink: Arc<S>,
    handler: SharedHandler,
    peer_port: Option<u16>,
    closed: watch::Receiver<bool>,
    recv_task: JoinHandle<()>,
    // Held so the accept loop lives exactly as long as the link.
    _server: Option<PeerServer>,
}

impl<S: MessageSink> PeerLink<S> {
    /// Split the transport, start peer serving if `peer_port` is positive,
    /// and spawn the receive loop.
    ///
    /// A failure to bind the peer port or to announce it is logged and the
    /// link continues pull-only; `peer_port()` reports whether serving is
    /// actually live.
    pub async fn start<T>(transport: T, peer_port: u16) -> Self
    where
        T: Transport<Sink = S>,
    {
        let (mut source, sink) = transport.split();
        let sink = Arc::new(sink);
        let handler: SharedHandler = Arc::new(Mutex::new(None));

        let mut server = None;
        let mut serving_port = None;
        if peer_port > 0 {
            match PeerServer::bind(peer_port, handler.clone()).await {
                Ok(s) => {
                    let port = s.local_addr().port();
                    match sink.send(&Message::ChangePort { port }).await {
                        Ok(()) => {
                            serving_port = Some(port);
                            server = Some(s);
                        }
                        Err(e) => {
                            warn!(port, error = %e, "peer port announcement failed; serving disabled");
                        }
                    }
                }
                Err(e) => {
                    warn!(port = peer_port, error = %e, "peer server bind failed; serving disabled");
                }
            }
        }

        let (closed_tx, closed) = watch::channel(false);
        let loop_handler = handler.clone();
        let recv_task = tokio::spawn(async move {
            loop {
                match source.recv().await {
                    Ok(msg) => dispatch(&loop_handler, msg).await,
                    Err(e) => {
                        error!(error = %e, "transport failed; receive loop stopping");
                        break;
                    }
                }
            }
            let _ = closed_tx.send(true);
        });

        Self {
            sink,
            handler,
            peer_port: serving_port,
            closed,
            recv_task,
            _server: server,
        }
    }

    /// Send a message over the transport. A failure propagates to the
    /// caller; it does not affect the receive loop.
    pub async fn send(&self, msg: &Message) -> Result<(), TransportError> {
        self.sink.send(msg).await
    }

    /// Install or replace the handler. Takes effect between dispatches.
    pub async fn set_handler(&self, handler: Arc<dyn ResourceHandler>) {
        *self.handler.lock().await = Some(handler);
    }

    /// Port the embedded peer server is serving on, or None when the link
    /// runs pull-only (disabled, bind failure, or announcement failure).
    pub fn peer_port(&self) -> Option<u16> {
        self.peer_port
    }

    /// Whether the receive loop is still running.
    pub fn is_running(&self) -> bool {
        !*self.closed.borrow()
    }

    /// Watch that flips to true once the receive loop has stopped.
    pub fn closed(&self) -> watch::Receiver<bool> {
        self.closed.clone()
    }
}

impl<S: MessageSink> Drop for PeerLink<S> {
    fn drop(&mut self) {
        self.recv_task.abort();
    }
}

/// Route one inbound message. The slot lock makes dispatch single-flight
/// per link; with no handler installed the message is dropped, not queued.
async fn dispatch(handler: &SharedHandler, msg: Message) {
    let guard = handler.lock().await;
    let Some(h) = guard.as_ref() else {
        debug!("no handler installed; dropping message");
        return;
    };
    match msg {
        Message::TellInfo(info) if info.is_informative() => h.info_received(info),
        Message::TellInfo(info) => debug!(url = %info.url, "dropping size-0 info"),
        Message::Transfer(cmd) => h.transfer_command(cmd),
        other => debug!(?other, "dropping unhandled message"),
    }
}
