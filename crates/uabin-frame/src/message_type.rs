//! Message type and chunk role tags.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::FrameError;

/// Kind of message a chunk belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageType {
    /// Client connection request (handshake).
    Hello,
    /// Server connection acknowledgement (handshake).
    Acknowledge,
    /// Connection-level error, sent before closing.
    Error,
    /// Service message on an open secure channel.
    Message,
    /// Open or renew a secure channel.
    OpenChannel,
    /// Close a secure channel.
    CloseChannel,
}

impl MessageType {
    /// The 3-byte ASCII wire tag.
    pub const fn tag(self) -> [u8; 3] {
        match self {
            MessageType::Hello => *b"HEL",
            MessageType::Acknowledge => *b"ACK",
            MessageType::Error => *b"ERR",
            MessageType::Message => *b"MSG",
            MessageType::OpenChannel => *b"OPN",
            MessageType::CloseChannel => *b"CLO",
        }
    }

    /// Returns true if chunks of this type carry a channel id.
    pub fn is_secure(self) -> bool {
        matches!(
            self,
            MessageType::Message | MessageType::OpenChannel | MessageType::CloseChannel
        )
    }

    /// Returns true for connection-negotiation messages.
    pub fn is_handshake(self) -> bool {
        !self.is_secure()
    }
}

impl TryFrom<[u8; 3]> for MessageType {
    type Error = FrameError;

    fn try_from(tag: [u8; 3]) -> Result<Self, FrameError> {
        match &tag {
            b"HEL" => Ok(MessageType::Hello),
            b"ACK" => Ok(MessageType::Acknowledge),
            b"ERR" => Ok(MessageType::Error),
            b"MSG" => Ok(MessageType::Message),
            b"OPN" => Ok(MessageType::OpenChannel),
            b"CLO" => Ok(MessageType::CloseChannel),
            _ => Err(FrameError::UnknownMessageType(tag)),
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = self.tag();
        f.write_str(std::str::from_utf8(&tag).map_err(|_| fmt::Error)?)
    }
}

/// Role of a chunk within its message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChunkType {
    /// Last (or only) chunk of a message.
    Final,
    /// More chunks of the same message follow.
    Intermediate,
    /// The sender abandoned the message; earlier chunks are discarded.
    Abort,
}

impl ChunkType {
    /// The 1-byte ASCII wire tag.
    pub const fn tag(self) -> u8 {
        match self {
            ChunkType::Final => b'F',
            ChunkType::Intermediate => b'C',
            ChunkType::Abort => b'A',
        }
    }
}

impl TryFrom<u8> for ChunkType {
    type Error = FrameError;

    fn try_from(tag: u8) -> Result<Self, FrameError> {
        match tag {
            b'F' => Ok(ChunkType::Final),
            b'C' => Ok(ChunkType::Intermediate),
            b'A' => Ok(ChunkType::Abort),
            other => Err(FrameError::UnknownChunkType(other)),
        }
    }
}

impl fmt::Display for ChunkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", char::from(self.tag()))
    }
}
