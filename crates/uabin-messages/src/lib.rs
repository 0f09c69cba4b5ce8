//! Handshake records and service envelopes of the UA binary secure channel.
//!
//! - [`handshake`]: `HEL`/`ACK`/`ERR` records and transport-limit negotiation
//! - [`envelope`]: request/response headers shared by every service
//! - [`channel`]: open/close secure-channel messages with their stamped type ids
//! - [`dispatch`]: type-id based identification and service chunk framing

pub mod channel;
pub mod dispatch;
pub mod envelope;
pub mod error;
pub mod handshake;

pub use channel::{
    ChannelSecurityToken, CloseSecureChannelRequest, MessageSecurityMode, OpenSecureChannelRequest,
    OpenSecureChannelResponse, SecurityTokenRequestType, ServiceMessage,
};
pub use dispatch::{
    decode_service_body, decode_service_chunk, encode_service_body, encode_service_chunk,
    identify, SecurityHeader, ServiceChunk,
};
pub use envelope::{DiagnosticInfo, ExtensionBody, ExtensionObject, RequestHeader, ResponseHeader};
pub use error::{MessageError, Result};
pub use handshake::{
    decode_handshake, encode_handshake, negotiate, Acknowledge, ErrorMessage, HandshakeConfig,
    HandshakeMessage, Hello, NegotiatedLimits, MAX_ENDPOINT_URL_LEN, MIN_BUFFER_SIZE,
    PROTOCOL_VERSION,
};
