//! Framing: length-prefix (4 bytes BE) + bincode payload.

use crate::protocol::Message;

/// Size of the length header.
pub const HEADER_SIZE: usize = 4;

const MAX_FRAME_LEN: usize = 8 * 1024 * 1024; // 8 MiB

/// Encode a message into a single frame: 4 bytes BE length + bincode payload.
pub fn encode_frame(msg: &Message) -> Result<Vec<u8>, FrameError> {
    let payload = bincode::serialize(msg)?;
    if payload.len() > MAX_FRAME_LEN {
        return Err(FrameError::TooLarge(payload.len()));
    }
    let mut out = Vec::with_capacity(HEADER_SIZE + payload.len());
    out.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    out.extend_from_slice(&payload);
    Ok(out)
}

/// Validate a length header and return the payload length to read next.
pub fn frame_len(header: [u8; HEADER_SIZE]) -> Result<usize, FrameError> {
    let len = u32::from_be_bytes(header) as usize;
    if len > MAX_FRAME_LEN {
        return Err(FrameError::TooLarge(len));
    }
    Ok(len)
}

/// Decode a complete frame payload (the bytes after the length header).
pub fn decode_payload(payload: &[u8]) -> Result<Message, FrameError> {
    Ok(bincode::deserialize(payload)?)
}

/// Framing failure: oversized frame or bincode codec error.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("frame of {0} bytes exceeds limit")]
    TooLarge(usize),
    #[error("codec error: {0}")]
    Codec(#[from] bincode::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{Direction, PeerAddr, TransferCommand};
    use crate::resource::ResourceInfo;

    fn sample_info() -> Message {
        Message::TellInfo(ResourceInfo {
            url: "pdtp://host/test2.txt".into(),
            size: 100,
            mime_type: "text/plain".into(),
            chunk_size: 65536,
        })
    }

    #[test]
    fn roundtrip_tell_info() {
        let frame = encode_frame(&sample_info()).unwrap();
        let len = frame_len([frame[0], frame[1], frame[2], frame[3]]).unwrap();
        assert_eq!(len, frame.len() - HEADER_SIZE);
        let msg = decode_payload(&frame[HEADER_SIZE..]).unwrap();
        match msg {
            Message::TellInfo(info) => {
                assert_eq!(info.url, "pdtp://host/test2.txt");
                assert_eq!(info.size, 100);
            }
            other => panic!("expected TellInfo, got {other:?}"),
        }
    }

    #[test]
    fn roundtrip_transfer() {
        let msg = Message::Transfer(TransferCommand {
            url: "pdtp://host/a".into(),
            chunk_id: 7,
            peer: PeerAddr {
                host: "10.0.0.2".into(),
                port: 8000,
            },
            direction: Direction::Inbound,
        });
        let frame = encode_frame(&msg).unwrap();
        let decoded = decode_payload(&frame[HEADER_SIZE..]).unwrap();
        match decoded {
            Message::Transfer(cmd) => {
                assert_eq!(cmd.chunk_id, 7);
                assert_eq!(cmd.direction, Direction::Inbound);
            }
            other => panic!("expected Transfer, got {other:?}"),
        }
    }

    #[test]
    fn oversized_header_rejected() {
        let header = (64u32 * 1024 * 1024).to_be_bytes();
        assert!(matches!(frame_len(header), Err(FrameError::TooLarge(_))));
    }

    #[test]
    fn truncated_payload_fails_decode() {
        let frame = encode_frame(&sample_info()).unwrap();
        assert!(decode_payload(&frame[HEADER_SIZE..frame.len() - 1]).is_err());
    }
}
