//! Peer distribution protocol reference types.
//! I/O-free: message definitions, framing, and the resource/range model.

pub mod protocol;
pub mod resource;
pub mod wire;

pub use protocol::{Direction, Message, PeerAddr, TransferCommand, PROTOCOL_VERSION};
pub use resource::{Range, Resource, ResourceInfo};
pub use wire::{decode_payload, encode_frame, frame_len, FrameError};
