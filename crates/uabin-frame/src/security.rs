//! Per-chunk security and ordering headers.
//!
//! On the wire a secure chunk is laid out as
//! `SecureHeader | security header | SequenceHeader | body`, where the
//! security header is asymmetric on `OPN` chunks and symmetric (a token id)
//! on `MSG` and `CLO` chunks.

use bytes::{Buf, BufMut, Bytes};
use serde::{Deserialize, Serialize};
use uabin_types::{BinaryDecode, BinaryEncode};

/// Wire length of a sequence header.
pub const SEQUENCE_HEADER_SIZE: usize = 8;

/// Wire length of a symmetric security header.
pub const SYMMETRIC_SECURITY_HEADER_SIZE: usize = 4;

/// Highest sequence number issued before wrapping back to 1.
pub const SEQUENCE_WRAP_LIMIT: u32 = u32::MAX - 1024;

/// Ordering tags of one chunk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SequenceHeader {
    /// Increases by one per chunk sent on the channel.
    pub sequence_number: u32,
    /// Shared by every chunk of one request/response exchange.
    pub request_id: u32,
}

impl SequenceHeader {
    pub fn new(sequence_number: u32, request_id: u32) -> Self {
        Self {
            sequence_number,
            request_id,
        }
    }
}

impl BinaryEncode for SequenceHeader {
    fn byte_len(&self) -> usize {
        SEQUENCE_HEADER_SIZE
    }

    fn encode<B: BufMut>(&self, buf: &mut B) -> uabin_types::Result<()> {
        self.sequence_number.encode(buf)?;
        self.request_id.encode(buf)
    }
}

impl BinaryDecode for SequenceHeader {
    fn decode<B: Buf>(buf: &mut B) -> uabin_types::Result<Self> {
        Ok(Self {
            sequence_number: u32::decode(buf)?,
            request_id: u32::decode(buf)?,
        })
    }
}

/// Key-set selector of a `MSG`/`CLO` chunk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SymmetricSecurityHeader {
    /// `0` until a token has been negotiated.
    pub token_id: u32,
}

impl SymmetricSecurityHeader {
    pub fn new(token_id: u32) -> Self {
        Self { token_id }
    }
}

impl BinaryEncode for SymmetricSecurityHeader {
    fn byte_len(&self) -> usize {
        SYMMETRIC_SECURITY_HEADER_SIZE
    }

    fn encode<B: BufMut>(&self, buf: &mut B) -> uabin_types::Result<()> {
        self.token_id.encode(buf)
    }
}

impl BinaryDecode for SymmetricSecurityHeader {
    fn decode<B: Buf>(buf: &mut B) -> uabin_types::Result<Self> {
        u32::decode(buf).map(Self::new)
    }
}

/// Security header of an `OPN` chunk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AsymmetricSecurityHeader {
    pub security_policy_uri: String,
    pub sender_certificate: Bytes,
    pub receiver_certificate_thumbprint: Bytes,
}

impl AsymmetricSecurityHeader {
    /// URI of the policy that applies no security.
    pub const POLICY_NONE: &'static str = "http://opcfoundation.org/UA/SecurityPolicy#None";

    /// Header for an unsecured channel: no certificates, policy `None`.
    pub fn none() -> Self {
        Self {
            security_policy_uri: Self::POLICY_NONE.to_string(),
            ..Self::default()
        }
    }
}

impl BinaryEncode for AsymmetricSecurityHeader {
    fn byte_len(&self) -> usize {
        self.security_policy_uri.byte_len()
            + self.sender_certificate.byte_len()
            + self.receiver_certificate_thumbprint.byte_len()
    }

    fn encode<B: BufMut>(&self, buf: &mut B) -> uabin_types::Result<()> {
        self.security_policy_uri.encode(buf)?;
        self.sender_certificate.encode(buf)?;
        self.receiver_certificate_thumbprint.encode(buf)
    }
}

impl BinaryDecode for AsymmetricSecurityHeader {
    fn decode<B: Buf>(buf: &mut B) -> uabin_types::Result<Self> {
        Ok(Self {
            security_policy_uri: String::decode(buf)?,
            sender_certificate: Bytes::decode(buf)?,
            receiver_certificate_thumbprint: Bytes::decode(buf)?,
        })
    }
}

/// Issues sequence headers for the chunks sent on one channel.
///
/// Numbers start at 1, grow by one per chunk and wrap back to 1 after
/// [`SEQUENCE_WRAP_LIMIT`].
#[derive(Debug, Clone)]
pub struct SequenceNumbers {
    next: u32,
}

impl SequenceNumbers {
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    pub fn starting_at(first: u32) -> Self {
        Self { next: first }
    }

    /// The number the next chunk will carry.
    pub fn peek(&self) -> u32 {
        self.next
    }

    /// Sequence header for the next chunk of request `request_id`.
    pub fn next_header(&mut self, request_id: u32) -> SequenceHeader {
        let sequence_number = self.next;
        self.next = if sequence_number >= SEQUENCE_WRAP_LIMIT {
            1
        } else {
            sequence_number + 1
        };
        SequenceHeader::new(sequence_number, request_id)
    }
}

impl Default for SequenceNumbers {
    fn default() -> Self {
        Self::new()
    }
}
