//! Chunk framing for the UA binary secure-channel protocol.
//!
//! Every chunk starts with a size-tracked header:
//! - 3-byte message type tag (`HEL`, `ACK`, `ERR`, `MSG`, `OPN`, `CLO`)
//! - 1-byte chunk role (`F` final, `C` intermediate, `A` abort)
//! - 4-byte little-endian total size, this header included
//! - 4-byte channel id (secure message types only)
//!
//! The size is derived from the bytes actually written by [`encode_chunk`],
//! so a header can never disagree with the body that follows it.

pub mod codec;
pub mod error;
pub mod header;
pub mod message_type;
pub mod security;

#[cfg(feature = "async")]
pub mod async_codec;

#[cfg(feature = "async")]
pub use async_codec::ChunkCodec;
pub use codec::{
    decode_chunk, encode_chunk, encode_message, Chunk, ChunkHeader, FrameConfig,
    DEFAULT_MAX_CHUNK_SIZE,
};
pub use error::{FrameError, Result};
pub use header::{FrameHeader, MessageHeader, SecureHeader, MESSAGE_HEADER_SIZE, SECURE_HEADER_SIZE};
pub use message_type::{ChunkType, MessageType};
pub use security::{
    AsymmetricSecurityHeader, SequenceHeader, SequenceNumbers, SymmetricSecurityHeader,
    SEQUENCE_HEADER_SIZE, SEQUENCE_WRAP_LIMIT, SYMMETRIC_SECURITY_HEADER_SIZE,
};
