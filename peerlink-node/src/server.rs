//! Peer server: answers HTTP GETs for cached resources, with byte ranges.
//!
//! Embedded in a link; the handler is injected at bind time. Each request
//! runs in its own task, concurrently with other requests and with the
//! link's receive loop.

use std::io;
use std::net::SocketAddr;

use peerlink_core::{Range, Resource};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::handler::SharedHandler;

const MAX_REQUEST_LEN: usize = 64 * 1024;

/// Listening socket plus its accept loop. Dropping the server stops the
/// loop; in-flight responses run to completion on their own tasks.
pub struct PeerServer {
    local_addr: SocketAddr,
    accept_task: JoinHandle<()>,
}

impl PeerServer {
    /// Bind the serving port (0 for ephemeral) and start accepting.
    /// The bind error is returned to the caller; the link decides whether
    /// that is fatal.
    pub async fn bind(port: u16, handler: SharedHandler) -> io::Result<Self> {
        let listener = TcpListener::bind(("0.0.0.0", port)).await?;
        let local_addr = listener.local_addr()?;
        let accept_task = tokio::spawn(async move {
            loop {
                match listener.accept().await {
                    Ok((stream, peer)) => {
                        let handler = handler.clone();
                        tokio::spawn(async move {
                            if let Err(e) = handle_request(stream, handler).await {
                                debug!(peer = %peer, error = %e, "peer request dropped");
                            }
                        });
                    }
                    Err(e) => {
                        warn!(error = %e, "accept failed; peer server stopping");
                        break;
                    }
                }
            }
        });
        Ok(Self {
            local_addr,
            accept_task,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}

impl Drop for PeerServer {
    fn drop(&mut self) {
        self.accept_task.abort();
    }
}

struct Reply {
    status: &'static str,
    content_type: Option<String>,
    content_range: Option<String>,
    body: Vec<u8>,
}

impl Reply {
    fn text(status: &'static str, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            content_type: Some("text/plain".into()),
            content_range: None,
            body: body.into(),
        }
    }
}

/// Read one request, answer it, close the connection.
async fn handle_request(mut stream: TcpStream, handler: SharedHandler) -> io::Result<()> {
    let mut buf = Vec::with_capacity(4096);
    let mut chunk = [0u8; 4096];
    let (method, path, range_header) = loop {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            return Ok(());
        }
        buf.extend_from_slice(&chunk[..n]);
        if buf.len() > MAX_REQUEST_LEN {
            let reply = Reply::text("500 Internal Server Error", "request too large");
            return write_reply(&mut stream, reply).await;
        }
        let mut headers = [httparse::EMPTY_HEADER; 32];
        let mut req = httparse::Request::new(&mut headers);
        match req.parse(&buf) {
            Ok(httparse::Status::Complete(_)) => {
                let method = req.method.unwrap_or("").to_string();
                let path = req.path.unwrap_or("/").to_string();
                let range = req
                    .headers
                    .iter()
                    .find(|h| h.name.eq_ignore_ascii_case("Range"))
                    .and_then(|h| std::str::from_utf8(h.value).ok())
                    .map(|s| s.to_string());
                break (method, path, range);
            }
            Ok(httparse::Status::Partial) => continue,
            Err(e) => {
                let reply = Reply::text("500 Internal Server Error", e.to_string());
                return write_reply(&mut stream, reply).await;
            }
        }
    };

    if !method.eq_ignore_ascii_case("GET") {
        let reply = Reply::text(
            "501 Not Implemented",
            format!("Method {method} unsupported."),
        );
        return write_reply(&mut stream, reply).await;
    }

    let reply = match respond(&path, range_header.as_deref(), &handler).await {
        Ok(reply) => reply,
        Err(e) => Reply::text("500 Internal Server Error", e.to_string()),
    };
    write_reply(&mut stream, reply).await
}

/// The GET algorithm: decode the URL, consult cached info, resolve the
/// range, then look the resource up. A cache miss is a 404, never an error.
async fn respond(
    path: &str,
    range_header: Option<&str>,
    handler: &SharedHandler,
) -> Result<Reply, RequestError> {
    let url = percent_decode(path.strip_prefix('/').unwrap_or(path))?;

    // Clone the handler out; holding the slot lock here would serialize
    // requests against the dispatch loop.
    let handler = handler.lock().await.clone();
    let Some(handler) = handler else {
        // Nothing to look anything up in: every resource is a miss.
        return Ok(Reply::text("404 Not Found", "Not found."));
    };

    let info = handler.cached_info(&url);
    let header_range = range_header.and_then(Range::parse_http);

    let (status, range, content_range) = match header_range {
        Some(r) => (
            "206 Partial Content",
            Some(r),
            Some(r.content_range(info.as_ref().map(|i| i.size))),
        ),
        None => match &info {
            Some(i) => ("200 OK", Some(Range::full(i.size)), None),
            None => ("200 OK", None, None),
        },
    };
    let content_type = info.map(|i| i.mime_type);

    match handler.cached_bytes(&Resource::new(url, range)) {
        Some(body) => Ok(Reply {
            status,
            content_type,
            content_range,
            body,
        }),
        None => Ok(Reply {
            status: "404 Not Found",
            content_type,
            content_range,
            body: b"Not found.".to_vec(),
        }),
    }
}

async fn write_reply(stream: &mut TcpStream, reply: Reply) -> io::Result<()> {
    let mut head = format!("HTTP/1.1 {}\r\n", reply.status);
    if let Some(ct) = &reply.content_type {
        head.push_str(&format!("Content-Type: {ct}\r\n"));
    }
    if let Some(cr) = &reply.content_range {
        head.push_str(&format!("Content-Range: {cr}\r\n"));
    }
    head.push_str(&format!(
        "Content-Length: {}\r\nConnection: close\r\n\r\n",
        reply.body.len()
    ));
    stream.write_all(head.as_bytes()).await?;
    stream.write_all(&reply.body).await?;
    stream.flush().await
}

/// Decode %XX escapes (and '+' as space) into UTF-8.
fn percent_decode(s: &str) -> Result<String, RequestError> {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'%' => {
                let hi = bytes.get(i + 1).and_then(|b| (*b as char).to_digit(16));
                let lo = bytes.get(i + 2).and_then(|b| (*b as char).to_digit(16));
                match (hi, lo) {
                    (Some(h), Some(l)) => {
                        out.push((h * 16 + l) as u8);
                        i += 3;
                    }
                    _ => return Err(RequestError::BadEncoding),
                }
            }
            b'+' => {
                out.push(b' ');
                i += 1;
            }
            b => {
                out.push(b);
                i += 1;
            }
        }
    }
    String::from_utf8(out).map_err(|_| RequestError::BadUtf8)
}

#[derive(Debug, thiserror::Error)]
enum RequestError {
    #[error("invalid percent-encoding in request path")]
    BadEncoding,
    #[error("request path is not valid utf-8")]
    BadUtf8,
}
