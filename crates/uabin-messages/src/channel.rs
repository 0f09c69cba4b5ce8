//! Open/Close-Secure-Channel envelopes.
//!
//! Each envelope is stamped with its type id when constructed. The type id
//! is derived from the envelope's [`ServiceKind`], so it always resolves back
//! to that kind, and no setter exists to change it afterwards. The
//! [`BinaryEncode`]/[`BinaryDecode`] impls cover the body only; the type id
//! is written ahead of it by [`encode_service_body`](crate::encode_service_body).

use bytes::{Buf, BufMut, Bytes};
use serde::{Deserialize, Serialize};
use uabin_types::{
    BinaryDecode, BinaryEncode, Clock, DateTime, EncodingError, NodeId, ServiceKind, SystemClock,
};

use crate::envelope::{RequestHeader, ResponseHeader};
use crate::handshake::PROTOCOL_VERSION;

/// A service envelope with a fixed, self-describing type id.
pub trait ServiceMessage: BinaryEncode + BinaryDecode {
    const KIND: ServiceKind;

    /// The type id stamped at construction.
    fn type_id(&self) -> &NodeId;
}

macro_rules! u32_enum {
    ($name:ident, $label:literal { $($variant:ident = $value:literal),+ $(,)? }) => {
        impl $name {
            pub fn value(self) -> u32 {
                self as u32
            }
        }

        impl TryFrom<u32> for $name {
            type Error = EncodingError;

            fn try_from(value: u32) -> Result<Self, Self::Error> {
                match value {
                    $($value => Ok($name::$variant),)+
                    other => Err(EncodingError::InvalidEnumValue {
                        name: $label,
                        value: other,
                    }),
                }
            }
        }

        impl BinaryEncode for $name {
            fn byte_len(&self) -> usize {
                4
            }

            fn encode<B: BufMut>(&self, buf: &mut B) -> uabin_types::Result<()> {
                self.value().encode(buf)
            }
        }

        impl BinaryDecode for $name {
            fn decode<B: Buf>(buf: &mut B) -> uabin_types::Result<Self> {
                $name::try_from(u32::decode(buf)?)
            }
        }
    };
}

/// Whether an `OPN` request creates a new token or renews the current one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u32)]
pub enum SecurityTokenRequestType {
    #[default]
    Issue = 0,
    Renew = 1,
}

u32_enum!(SecurityTokenRequestType, "SecurityTokenRequestType" {
    Issue = 0,
    Renew = 1,
});

/// Protection applied to messages on the channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u32)]
pub enum MessageSecurityMode {
    #[default]
    Invalid = 0,
    None = 1,
    Sign = 2,
    SignAndEncrypt = 3,
}

u32_enum!(MessageSecurityMode, "MessageSecurityMode" {
    Invalid = 0,
    None = 1,
    Sign = 2,
    SignAndEncrypt = 3,
});

/// Token issued by the server for a secure channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelSecurityToken {
    pub channel_id: u32,
    pub token_id: u32,
    pub created_at: DateTime,
    /// Milliseconds.
    pub revised_lifetime: u32,
}

impl BinaryEncode for ChannelSecurityToken {
    fn byte_len(&self) -> usize {
        4 + 4 + self.created_at.byte_len() + 4
    }

    fn encode<B: BufMut>(&self, buf: &mut B) -> uabin_types::Result<()> {
        self.channel_id.encode(buf)?;
        self.token_id.encode(buf)?;
        self.created_at.encode(buf)?;
        self.revised_lifetime.encode(buf)
    }
}

impl BinaryDecode for ChannelSecurityToken {
    fn decode<B: Buf>(buf: &mut B) -> uabin_types::Result<Self> {
        Ok(Self {
            channel_id: u32::decode(buf)?,
            token_id: u32::decode(buf)?,
            created_at: DateTime::decode(buf)?,
            revised_lifetime: u32::decode(buf)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenSecureChannelRequest {
    type_id: NodeId,
    pub request_header: RequestHeader,
    pub client_protocol_version: u32,
    pub request_type: SecurityTokenRequestType,
    pub security_mode: MessageSecurityMode,
    pub client_nonce: Bytes,
    /// Milliseconds.
    pub requested_lifetime: u32,
}

impl OpenSecureChannelRequest {
    pub fn new() -> Self {
        Self::with_clock(&SystemClock)
    }

    pub fn with_clock(clock: &impl Clock) -> Self {
        Self::from_header(RequestHeader::with_clock(clock))
    }

    fn from_header(request_header: RequestHeader) -> Self {
        Self {
            type_id: NodeId::from(Self::KIND),
            request_header,
            client_protocol_version: PROTOCOL_VERSION,
            request_type: SecurityTokenRequestType::Issue,
            security_mode: MessageSecurityMode::Invalid,
            client_nonce: Bytes::new(),
            requested_lifetime: 0,
        }
    }
}

impl Default for OpenSecureChannelRequest {
    fn default() -> Self {
        Self::new()
    }
}

impl ServiceMessage for OpenSecureChannelRequest {
    const KIND: ServiceKind = ServiceKind::OpenSecureChannelRequest;

    fn type_id(&self) -> &NodeId {
        &self.type_id
    }
}

impl BinaryEncode for OpenSecureChannelRequest {
    fn byte_len(&self) -> usize {
        self.request_header.byte_len()
            + 4
            + self.request_type.byte_len()
            + self.security_mode.byte_len()
            + self.client_nonce.byte_len()
            + 4
    }

    fn encode<B: BufMut>(&self, buf: &mut B) -> uabin_types::Result<()> {
        self.request_header.encode(buf)?;
        self.client_protocol_version.encode(buf)?;
        self.request_type.encode(buf)?;
        self.security_mode.encode(buf)?;
        self.client_nonce.encode(buf)?;
        self.requested_lifetime.encode(buf)
    }
}

impl BinaryDecode for OpenSecureChannelRequest {
    fn decode<B: Buf>(buf: &mut B) -> uabin_types::Result<Self> {
        let mut request = Self::from_header(RequestHeader::decode(buf)?);
        request.client_protocol_version = u32::decode(buf)?;
        request.request_type = SecurityTokenRequestType::decode(buf)?;
        request.security_mode = MessageSecurityMode::decode(buf)?;
        request.client_nonce = Bytes::decode(buf)?;
        request.requested_lifetime = u32::decode(buf)?;
        Ok(request)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenSecureChannelResponse {
    type_id: NodeId,
    pub response_header: ResponseHeader,
    pub server_protocol_version: u32,
    pub security_token: ChannelSecurityToken,
    pub server_nonce: Bytes,
}

impl OpenSecureChannelResponse {
    pub fn new() -> Self {
        Self::with_clock(&SystemClock)
    }

    pub fn with_clock(clock: &impl Clock) -> Self {
        Self::from_header(ResponseHeader::with_clock(clock))
    }

    fn from_header(response_header: ResponseHeader) -> Self {
        Self {
            type_id: NodeId::from(Self::KIND),
            response_header,
            server_protocol_version: PROTOCOL_VERSION,
            security_token: ChannelSecurityToken::default(),
            server_nonce: Bytes::new(),
        }
    }
}

impl Default for OpenSecureChannelResponse {
    fn default() -> Self {
        Self::new()
    }
}

impl ServiceMessage for OpenSecureChannelResponse {
    const KIND: ServiceKind = ServiceKind::OpenSecureChannelResponse;

    fn type_id(&self) -> &NodeId {
        &self.type_id
    }
}

impl BinaryEncode for OpenSecureChannelResponse {
    fn byte_len(&self) -> usize {
        self.response_header.byte_len()
            + 4
            + self.security_token.byte_len()
            + self.server_nonce.byte_len()
    }

    fn encode<B: BufMut>(&self, buf: &mut B) -> uabin_types::Result<()> {
        self.response_header.encode(buf)?;
        self.server_protocol_version.encode(buf)?;
        self.security_token.encode(buf)?;
        self.server_nonce.encode(buf)
    }
}

impl BinaryDecode for OpenSecureChannelResponse {
    fn decode<B: Buf>(buf: &mut B) -> uabin_types::Result<Self> {
        let mut response = Self::from_header(ResponseHeader::decode(buf)?);
        response.server_protocol_version = u32::decode(buf)?;
        response.security_token = ChannelSecurityToken::decode(buf)?;
        response.server_nonce = Bytes::decode(buf)?;
        Ok(response)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloseSecureChannelRequest {
    type_id: NodeId,
    pub request_header: RequestHeader,
}

impl CloseSecureChannelRequest {
    pub fn new() -> Self {
        Self::with_clock(&SystemClock)
    }

    pub fn with_clock(clock: &impl Clock) -> Self {
        Self::from_header(RequestHeader::with_clock(clock))
    }

    fn from_header(request_header: RequestHeader) -> Self {
        Self {
            type_id: NodeId::from(Self::KIND),
            request_header,
        }
    }
}

impl Default for CloseSecureChannelRequest {
    fn default() -> Self {
        Self::new()
    }
}

impl ServiceMessage for CloseSecureChannelRequest {
    const KIND: ServiceKind = ServiceKind::CloseSecureChannelRequest;

    fn type_id(&self) -> &NodeId {
        &self.type_id
    }
}

impl BinaryEncode for CloseSecureChannelRequest {
    fn byte_len(&self) -> usize {
        self.request_header.byte_len()
    }

    fn encode<B: BufMut>(&self, buf: &mut B) -> uabin_types::Result<()> {
        self.request_header.encode(buf)
    }
}

impl BinaryDecode for CloseSecureChannelRequest {
    fn decode<B: Buf>(buf: &mut B) -> uabin_types::Result<Self> {
        Ok(Self::from_header(RequestHeader::decode(buf)?))
    }
}
