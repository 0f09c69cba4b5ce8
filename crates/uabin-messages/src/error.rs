use uabin_frame::{FrameError, MessageType};
use uabin_types::{EncodingError, NodeId, ServiceKind, StatusCode};

use crate::handshake::ErrorMessage;

/// Errors that can occur while building or reading protocol messages.
#[derive(Debug, thiserror::Error)]
pub enum MessageError {
    /// Chunk-level error.
    #[error("frame error: {0}")]
    Frame(#[from] FrameError),

    /// Field-level encoding error.
    #[error("encoding error: {0}")]
    Encoding(#[from] EncodingError),

    /// The envelope type id does not resolve to a known service.
    #[error("unknown service type id {0}")]
    UnknownService(NodeId),

    /// The envelope is a known service, but not the one expected.
    #[error("expected {expected} message, got {actual}")]
    UnexpectedService {
        expected: ServiceKind,
        actual: ServiceKind,
    },

    /// The chunk carries a different message type than expected.
    #[error("expected {expected} chunk, got {actual}")]
    UnexpectedMessageType {
        expected: MessageType,
        actual: MessageType,
    },

    /// The security header does not fit the chunk's message type.
    #[error("{0} chunk carries the wrong kind of security header")]
    SecurityHeaderMismatch(MessageType),

    /// Connection negotiation failed.
    #[error("handshake failed: {reason} ({code})")]
    HandshakeFailed { code: StatusCode, reason: String },
}

impl MessageError {
    /// Status code to report to the peer for this failure.
    pub fn status_code(&self) -> StatusCode {
        match self {
            MessageError::Frame(FrameError::UnknownMessageType(_))
            | MessageError::Frame(FrameError::UnknownChunkType(_))
            | MessageError::Frame(FrameError::InvalidChunkType { .. })
            | MessageError::Frame(FrameError::HeaderMismatch { .. })
            | MessageError::UnexpectedMessageType { .. } => StatusCode::BAD_TCP_MESSAGE_TYPE_INVALID,
            MessageError::Frame(FrameError::ChunkTooLarge { .. }) => {
                StatusCode::BAD_TCP_MESSAGE_TOO_LARGE
            }
            MessageError::Frame(FrameError::InvalidSize { .. })
            | MessageError::Frame(FrameError::Encoding(_))
            | MessageError::Encoding(_) => StatusCode::BAD_DECODING_ERROR,
            MessageError::Frame(FrameError::Io(_)) => StatusCode::BAD_TCP_INTERNAL_ERROR,
            MessageError::UnknownService(_) | MessageError::UnexpectedService { .. } => {
                StatusCode::BAD_SERVICE_UNSUPPORTED
            }
            MessageError::SecurityHeaderMismatch(_) => StatusCode::BAD_SECURITY_CHECKS_FAILED,
            MessageError::HandshakeFailed { code, .. } => *code,
        }
    }

    /// The `ERR` record that reports this failure to the peer.
    pub fn to_error_message(&self) -> ErrorMessage {
        ErrorMessage::new(self.status_code(), self.to_string())
    }
}

pub type Result<T> = std::result::Result<T, MessageError>;
