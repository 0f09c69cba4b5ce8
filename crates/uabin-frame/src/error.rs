use crate::message_type::{ChunkType, MessageType};

/// Errors that can occur during chunk encoding/decoding.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The 3-byte message type tag is not a known message type.
    #[error("unknown message type {:?}", String::from_utf8_lossy(.0))]
    UnknownMessageType([u8; 3]),

    /// The chunk role byte is not `F`, `C` or `A`.
    #[error("unknown chunk type 0x{0:02x}")]
    UnknownChunkType(u8),

    /// Handshake messages are always sent as a single final chunk.
    #[error("{message_type} message cannot use chunk type {chunk_type}")]
    InvalidChunkType {
        message_type: MessageType,
        chunk_type: ChunkType,
    },

    /// The header form does not match the message type: secure types need
    /// the 12-byte header with a channel id, handshake types the 8-byte one.
    #[error("{message_type} message cannot use a {header_size}-byte header")]
    HeaderMismatch {
        message_type: MessageType,
        header_size: usize,
    },

    /// The size field is smaller than the header it belongs to.
    #[error("chunk size {size} is smaller than its header ({min} bytes)")]
    InvalidSize { size: usize, min: usize },

    /// The chunk exceeds the configured maximum size.
    #[error("chunk too large ({size} bytes, max {max})")]
    ChunkTooLarge { size: usize, max: usize },

    /// A header or body field failed to encode or decode.
    #[error("encoding error: {0}")]
    Encoding(#[from] uabin_types::EncodingError),

    /// An I/O error occurred while reading or writing chunks.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, FrameError>;
