//! Connection negotiation records (`HEL`, `ACK`, `ERR`).
//!
//! The client opens with a [`Hello`] carrying its buffer limits and endpoint
//! URL; the server answers with an [`Acknowledge`] holding the revised limits
//! or an [`ErrorMessage`] before closing the connection. The negotiated
//! limits are exposed through [`NegotiatedLimits`] for the transport to
//! enforce.

use bytes::{Buf, BufMut, BytesMut};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uabin_frame::{encode_message, Chunk, ChunkType, FrameConfig, MessageHeader, MessageType};
use uabin_types::{BinaryDecode, BinaryEncode, StatusCode};

use crate::error::{MessageError, Result};

/// Protocol version this implementation speaks.
pub const PROTOCOL_VERSION: u32 = 0;

/// Smallest send or receive buffer a peer may announce.
pub const MIN_BUFFER_SIZE: u32 = 8192;

/// Longest endpoint URL accepted in a `HEL`.
pub const MAX_ENDPOINT_URL_LEN: usize = 4096;

/// A record exchanged as a single `HEL`/`ACK`/`ERR` chunk.
pub trait HandshakeMessage: BinaryEncode + BinaryDecode {
    const MESSAGE_TYPE: MessageType;
}

/// Client connection request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hello {
    pub protocol_version: u32,
    pub receive_buffer_size: u32,
    pub send_buffer_size: u32,
    /// `0` = no limit.
    pub max_message_size: u32,
    /// `0` = no limit.
    pub max_chunk_count: u32,
    pub endpoint_url: String,
}

/// Server reply to a [`Hello`] with the revised limits.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Acknowledge {
    pub protocol_version: u32,
    pub receive_buffer_size: u32,
    pub send_buffer_size: u32,
    pub max_message_size: u32,
    pub max_chunk_count: u32,
}

/// Connection-level error, sent before the connection is closed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorMessage {
    pub code: StatusCode,
    pub reason: String,
}

impl ErrorMessage {
    pub fn new(code: StatusCode, reason: impl Into<String>) -> Self {
        Self {
            code,
            reason: reason.into(),
        }
    }
}

impl HandshakeMessage for Hello {
    const MESSAGE_TYPE: MessageType = MessageType::Hello;
}

impl HandshakeMessage for Acknowledge {
    const MESSAGE_TYPE: MessageType = MessageType::Acknowledge;
}

impl HandshakeMessage for ErrorMessage {
    const MESSAGE_TYPE: MessageType = MessageType::Error;
}

impl BinaryEncode for Hello {
    fn byte_len(&self) -> usize {
        20 + self.endpoint_url.byte_len()
    }

    fn encode<B: BufMut>(&self, buf: &mut B) -> uabin_types::Result<()> {
        self.protocol_version.encode(buf)?;
        self.receive_buffer_size.encode(buf)?;
        self.send_buffer_size.encode(buf)?;
        self.max_message_size.encode(buf)?;
        self.max_chunk_count.encode(buf)?;
        self.endpoint_url.encode(buf)
    }
}

impl BinaryDecode for Hello {
    fn decode<B: Buf>(buf: &mut B) -> uabin_types::Result<Self> {
        Ok(Self {
            protocol_version: u32::decode(buf)?,
            receive_buffer_size: u32::decode(buf)?,
            send_buffer_size: u32::decode(buf)?,
            max_message_size: u32::decode(buf)?,
            max_chunk_count: u32::decode(buf)?,
            endpoint_url: String::decode(buf)?,
        })
    }
}

impl BinaryEncode for Acknowledge {
    fn byte_len(&self) -> usize {
        20
    }

    fn encode<B: BufMut>(&self, buf: &mut B) -> uabin_types::Result<()> {
        self.protocol_version.encode(buf)?;
        self.receive_buffer_size.encode(buf)?;
        self.send_buffer_size.encode(buf)?;
        self.max_message_size.encode(buf)?;
        self.max_chunk_count.encode(buf)
    }
}

impl BinaryDecode for Acknowledge {
    fn decode<B: Buf>(buf: &mut B) -> uabin_types::Result<Self> {
        Ok(Self {
            protocol_version: u32::decode(buf)?,
            receive_buffer_size: u32::decode(buf)?,
            send_buffer_size: u32::decode(buf)?,
            max_message_size: u32::decode(buf)?,
            max_chunk_count: u32::decode(buf)?,
        })
    }
}

impl BinaryEncode for ErrorMessage {
    fn byte_len(&self) -> usize {
        self.code.byte_len() + self.reason.byte_len()
    }

    fn encode<B: BufMut>(&self, buf: &mut B) -> uabin_types::Result<()> {
        self.code.encode(buf)?;
        self.reason.encode(buf)
    }
}

impl BinaryDecode for ErrorMessage {
    fn decode<B: Buf>(buf: &mut B) -> uabin_types::Result<Self> {
        Ok(Self {
            code: StatusCode::decode(buf)?,
            reason: String::decode(buf)?,
        })
    }
}

/// Encode a handshake record as one final chunk.
pub fn encode_handshake<M: HandshakeMessage>(message: &M, dst: &mut BytesMut) -> Result<usize> {
    let mut header = MessageHeader::new(M::MESSAGE_TYPE, ChunkType::Final);
    Ok(encode_message(&mut header, message, dst)?)
}

/// Decode a handshake record from a chunk of the matching type.
pub fn decode_handshake<M: HandshakeMessage>(chunk: &Chunk) -> Result<M> {
    let actual = chunk.header.message_type();
    if actual != M::MESSAGE_TYPE {
        return Err(MessageError::UnexpectedMessageType {
            expected: M::MESSAGE_TYPE,
            actual,
        });
    }
    let mut body = chunk.body.clone();
    Ok(M::decode(&mut body)?)
}

/// Local transport limits announced or enforced during negotiation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandshakeConfig {
    pub protocol_version: u32,
    pub receive_buffer_size: u32,
    pub send_buffer_size: u32,
    /// `0` = no limit.
    pub max_message_size: u32,
    /// `0` = no limit.
    pub max_chunk_count: u32,
}

impl Default for HandshakeConfig {
    fn default() -> Self {
        Self {
            protocol_version: PROTOCOL_VERSION,
            receive_buffer_size: 65_535,
            send_buffer_size: 65_535,
            max_message_size: 0,
            max_chunk_count: 0,
        }
    }
}

impl HandshakeConfig {
    /// The `HEL` a client with these limits sends.
    pub fn hello(&self, endpoint_url: impl Into<String>) -> Hello {
        Hello {
            protocol_version: self.protocol_version,
            receive_buffer_size: self.receive_buffer_size,
            send_buffer_size: self.send_buffer_size,
            max_message_size: self.max_message_size,
            max_chunk_count: self.max_chunk_count,
            endpoint_url: endpoint_url.into(),
        }
    }
}

/// Server side of the negotiation: validate a `HEL` and build the `ACK`.
///
/// The server never receives more than the client can send, nor sends more
/// than the client can receive.
pub fn negotiate(hello: &Hello, config: &HandshakeConfig) -> Result<Acknowledge> {
    if hello.protocol_version < config.protocol_version {
        return Err(handshake_failed(
            StatusCode::BAD_PROTOCOL_VERSION_UNSUPPORTED,
            format!(
                "client protocol version {} (server {})",
                hello.protocol_version, config.protocol_version
            ),
        ));
    }

    if hello.endpoint_url.len() > MAX_ENDPOINT_URL_LEN {
        return Err(handshake_failed(
            StatusCode::BAD_TCP_ENDPOINT_URL_INVALID,
            format!(
                "endpoint url too long: {} (max {})",
                hello.endpoint_url.len(),
                MAX_ENDPOINT_URL_LEN
            ),
        ));
    }

    if hello.receive_buffer_size < MIN_BUFFER_SIZE || hello.send_buffer_size < MIN_BUFFER_SIZE {
        return Err(handshake_failed(
            StatusCode::BAD_TCP_NOT_ENOUGH_RESOURCES,
            format!(
                "client buffers too small: receive {}, send {} (min {})",
                hello.receive_buffer_size, hello.send_buffer_size, MIN_BUFFER_SIZE
            ),
        ));
    }

    let ack = Acknowledge {
        protocol_version: config.protocol_version,
        receive_buffer_size: config.receive_buffer_size.min(hello.send_buffer_size),
        send_buffer_size: config.send_buffer_size.min(hello.receive_buffer_size),
        max_message_size: config.max_message_size,
        max_chunk_count: config.max_chunk_count,
    };

    debug!(
        endpoint_url = %hello.endpoint_url,
        receive_buffer_size = ack.receive_buffer_size,
        send_buffer_size = ack.send_buffer_size,
        max_message_size = ack.max_message_size,
        max_chunk_count = ack.max_chunk_count,
        "negotiated transport limits"
    );

    Ok(ack)
}

fn handshake_failed(code: StatusCode, reason: String) -> MessageError {
    debug!(%code, %reason, "rejecting hello");
    MessageError::HandshakeFailed { code, reason }
}

/// Limits in force after the handshake, as seen by the server.
///
/// Exposed for the transport to enforce; nothing in this crate rejects
/// messages against them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NegotiatedLimits {
    pub receive_buffer_size: u32,
    pub send_buffer_size: u32,
    /// `0` = no limit.
    pub max_message_size: u32,
    /// `0` = no limit.
    pub max_chunk_count: u32,
}

impl NegotiatedLimits {
    /// Chunk-decoder settings for incoming chunks.
    pub fn frame_config(&self) -> FrameConfig {
        FrameConfig {
            max_chunk_size: self.receive_buffer_size as usize,
        }
    }

    /// Returns true if a message of `message_size` body bytes split into
    /// `chunk_count` chunks stays within the limits.
    pub fn permits(&self, message_size: usize, chunk_count: usize) -> bool {
        let size_ok = self.max_message_size == 0 || message_size <= self.max_message_size as usize;
        let count_ok = self.max_chunk_count == 0 || chunk_count <= self.max_chunk_count as usize;
        size_ok && count_ok
    }
}

impl From<&Acknowledge> for NegotiatedLimits {
    fn from(ack: &Acknowledge) -> Self {
        Self {
            receive_buffer_size: ack.receive_buffer_size,
            send_buffer_size: ack.send_buffer_size,
            max_message_size: ack.max_message_size,
            max_chunk_count: ack.max_chunk_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use uabin_frame::{decode_chunk, ChunkHeader, FrameHeader, DEFAULT_MAX_CHUNK_SIZE};

    use super::*;

    fn client_hello() -> Hello {
        HandshakeConfig {
            receive_buffer_size: 32_768,
            send_buffer_size: 16_384,
            max_message_size: 1 << 20,
            max_chunk_count: 64,
            ..HandshakeConfig::default()
        }
        .hello("opc.tcp://plc.local:4840/UA/Server")
    }

    #[test]
    fn defaults_are_zero() {
        let hello = Hello::default();
        assert_eq!(hello.protocol_version, 0);
        assert_eq!(hello.receive_buffer_size, 0);
        assert_eq!(hello.max_chunk_count, 0);
        assert!(hello.endpoint_url.is_empty());
        assert_eq!(Acknowledge::default().send_buffer_size, 0);
        assert_eq!(ErrorMessage::default().code, StatusCode::GOOD);
    }

    #[test]
    fn hello_chunk_layout() {
        let hello = client_hello();
        let mut buf = BytesMut::new();
        let size = encode_handshake(&hello, &mut buf).unwrap();

        assert_eq!(size, 8 + 20 + 4 + hello.endpoint_url.len());
        assert_eq!(&buf[..4], b"HELF");
        assert_eq!(&buf[4..8], &(size as u32).to_le_bytes());
        assert_eq!(&buf[8..12], &0u32.to_le_bytes());
        assert_eq!(&buf[12..16], &32_768u32.to_le_bytes());

        let chunk = decode_chunk(&mut buf, DEFAULT_MAX_CHUNK_SIZE).unwrap().unwrap();
        match &chunk.header {
            ChunkHeader::Plain(header) => assert_eq!(header.message_size(), size - 8),
            other => panic!("unexpected header {other:?}"),
        }
        assert_eq!(decode_handshake::<Hello>(&chunk).unwrap(), hello);
    }

    #[test]
    fn decode_handshake_checks_message_type() {
        let mut buf = BytesMut::new();
        encode_handshake(&Acknowledge::default(), &mut buf).unwrap();
        let chunk = decode_chunk(&mut buf, DEFAULT_MAX_CHUNK_SIZE).unwrap().unwrap();

        let err = decode_handshake::<Hello>(&chunk).unwrap_err();
        assert!(matches!(
            err,
            MessageError::UnexpectedMessageType {
                expected: MessageType::Hello,
                actual: MessageType::Acknowledge,
            }
        ));
    }

    #[test]
    fn error_message_chunk() {
        let message = ErrorMessage::new(StatusCode::BAD_TCP_MESSAGE_TOO_LARGE, "chunk too big");
        let mut buf = BytesMut::new();
        encode_handshake(&message, &mut buf).unwrap();
        assert_eq!(&buf[..4], b"ERRF");

        let chunk = decode_chunk(&mut buf, DEFAULT_MAX_CHUNK_SIZE).unwrap().unwrap();
        assert_eq!(decode_handshake::<ErrorMessage>(&chunk).unwrap(), message);
    }

    #[test]
    fn negotiation_crosses_buffer_sizes() {
        let config = HandshakeConfig::default();
        let ack = negotiate(&client_hello(), &config).unwrap();

        assert_eq!(ack.protocol_version, PROTOCOL_VERSION);
        // server receive <= client send, server send <= client receive
        assert_eq!(ack.receive_buffer_size, 16_384);
        assert_eq!(ack.send_buffer_size, 32_768);
        assert_eq!(ack.max_message_size, 0);
        assert_eq!(ack.max_chunk_count, 0);
    }

    #[test]
    fn negotiation_rejects_small_buffers() {
        let mut hello = client_hello();
        hello.send_buffer_size = 1024;
        let err = negotiate(&hello, &HandshakeConfig::default()).unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_TCP_NOT_ENOUGH_RESOURCES);
    }

    #[test]
    fn negotiation_rejects_old_protocol_version() {
        let config = HandshakeConfig {
            protocol_version: 1,
            ..HandshakeConfig::default()
        };
        let err = negotiate(&client_hello(), &config).unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_PROTOCOL_VERSION_UNSUPPORTED);
        assert_eq!(
            err.to_error_message().code,
            StatusCode::BAD_PROTOCOL_VERSION_UNSUPPORTED
        );
    }

    #[test]
    fn negotiation_rejects_long_url() {
        let mut hello = client_hello();
        hello.endpoint_url = "x".repeat(MAX_ENDPOINT_URL_LEN + 1);
        let err = negotiate(&hello, &HandshakeConfig::default()).unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_TCP_ENDPOINT_URL_INVALID);
    }

    #[test]
    fn negotiated_limits_exposed() {
        let ack = Acknowledge {
            protocol_version: 0,
            receive_buffer_size: 8192,
            send_buffer_size: 8192,
            max_message_size: 4096,
            max_chunk_count: 2,
        };
        let limits = NegotiatedLimits::from(&ack);
        assert_eq!(limits.frame_config().max_chunk_size, 8192);
        assert!(limits.permits(4096, 2));
        assert!(!limits.permits(4097, 1));
        assert!(!limits.permits(10, 3));

        let unlimited = NegotiatedLimits {
            max_message_size: 0,
            max_chunk_count: 0,
            ..limits
        };
        assert!(unlimited.permits(usize::MAX, usize::MAX));
    }

    #[test]
    fn limits_serialize_for_diagnostics() {
        let limits = NegotiatedLimits::from(&Acknowledge {
            receive_buffer_size: 8192,
            ..Acknowledge::default()
        });
        let json = serde_json::to_value(limits).unwrap();
        assert_eq!(json["receive_buffer_size"], 8192);
        assert_eq!(json["max_chunk_count"], 0);
    }
}
