//! Message transport: framed, ordered message source/sink over a connection.
//!
//! The link's receive loop owns the source half exclusively; the sink half
//! is shared and may be used by concurrent senders, which serialize on the
//! writer lock.

use std::future::Future;
use std::io;

use peerlink_core::wire::{self, HEADER_SIZE};
use peerlink_core::{FrameError, Message};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::Mutex;

/// Receiving half of a transport. Sole property of the receive loop.
pub trait MessageSource: Send + 'static {
    /// Fetch the next message, waiting for it. Fails on transport error;
    /// a clean remote close is `TransportError::Closed`.
    fn recv(&mut self) -> impl Future<Output = Result<Message, TransportError>> + Send;
}

/// Sending half of a transport. Shared; concurrent sends are allowed.
pub trait MessageSink: Send + Sync + 'static {
    /// Send one message. Failures propagate to the caller.
    fn send(&self, msg: &Message) -> impl Future<Output = Result<(), TransportError>> + Send;
}

/// An ordered message channel to a remote peer, splittable into its two halves.
pub trait Transport {
    type Source: MessageSource;
    type Sink: MessageSink;

    fn split(self) -> (Self::Source, Self::Sink);
}

/// Transport failure: I/O error, framing violation, or closed connection.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("connection closed")]
    Closed,
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
    #[error("frame error: {0}")]
    Frame(#[from] FrameError),
}

/// TCP transport carrying length-prefixed bincode frames.
pub struct TcpTransport {
    stream: TcpStream,
}

impl TcpTransport {
    pub fn new(stream: TcpStream) -> Self {
        Self { stream }
    }

    /// Connect to a remote endpoint (usually the coordination server).
    pub async fn connect(addr: &str) -> io::Result<Self> {
        Ok(Self::new(TcpStream::connect(addr).await?))
    }
}

impl Transport for TcpTransport {
    type Source = FrameSource;
    type Sink = FrameSink;

    fn split(self) -> (FrameSource, FrameSink) {
        let (reader, writer) = self.stream.into_split();
        (
            FrameSource { reader },
            FrameSink {
                writer: Mutex::new(writer),
            },
        )
    }
}

/// Reads framed messages off the read half of a TCP stream.
pub struct FrameSource {
    reader: OwnedReadHalf,
}

impl MessageSource for FrameSource {
    fn recv(&mut self) -> impl Future<Output = Result<Message, TransportError>> + Send {
        async move {
            let mut header = [0u8; HEADER_SIZE];
            self.reader.read_exact(&mut header).await.map_err(map_eof)?;
            let len = wire::frame_len(header)?;
            let mut payload = vec![0u8; len];
            self.reader
                .read_exact(&mut payload)
                .await
                .map_err(map_eof)?;
            Ok(wire::decode_payload(&payload)?)
        }
    }
}

/// Writes framed messages to the write half of a TCP stream. Concurrent
/// senders serialize on the internal lock so frames never interleave.
pub struct FrameSink {
    writer: Mutex<OwnedWriteHalf>,
}

impl MessageSink for FrameSink {
    fn send(&self, msg: &Message) -> impl Future<Output = Result<(), TransportError>> + Send {
        async move {
            let frame = wire::encode_frame(msg)?;
            let mut writer = self.writer.lock().await;
            writer.write_all(&frame).await?;
            writer.flush().await?;
            Ok(())
        }
    }
}

fn map_eof(e: io::Error) -> TransportError {
    if e.kind() == io::ErrorKind::UnexpectedEof {
        TransportError::Closed
    } else {
        TransportError::Io(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use peerlink_core::Range;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn tcp_roundtrip() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let (mut source, sink) = TcpTransport::new(stream).split();
            let msg = source.recv().await.unwrap();
            sink.send(&msg).await.unwrap();
        });

        let transport = TcpTransport::connect(&addr.to_string()).await.unwrap();
        let (mut source, sink) = transport.split();
        let sent = Message::Request {
            url: "pdtp://host/f".into(),
            range: Some(Range::new(0, 99)),
        };
        sink.send(&sent).await.unwrap();
        let echoed = source.recv().await.unwrap();
        match echoed {
            Message::Request { url, range } => {
                assert_eq!(url, "pdtp://host/f");
                assert_eq!(range, Some(Range::new(0, 99)));
            }
            other => panic!("expected Request, got {other:?}"),
        }
        server.await.unwrap();
    }

    #[tokio::test]
    async fn remote_close_is_closed_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            drop(stream);
        });

        let transport = TcpTransport::connect(&addr.to_string()).await.unwrap();
        let (mut source, _sink) = transport.split();
        assert!(matches!(source.recv().await, Err(TransportError::Closed)));
        server.await.unwrap();
    }
}
