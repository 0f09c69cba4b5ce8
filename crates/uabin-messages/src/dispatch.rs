//! Service envelopes inside secure chunks.
//!
//! A service body is the envelope's type id followed by the envelope
//! fields. A receiver peeks the type id with [`identify`] to pick the
//! envelope type before decoding the rest.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use tracing::debug;
use uabin_frame::{
    encode_chunk, AsymmetricSecurityHeader, Chunk, ChunkHeader, FrameHeader, MessageType,
    SecureHeader, SequenceHeader, SymmetricSecurityHeader,
};
use uabin_types::{resolve, BinaryDecode, BinaryEncode, NodeId, ServiceKind};

use crate::channel::ServiceMessage;
use crate::error::{MessageError, Result};

/// Resolve the service kind of a body without consuming it.
///
/// Fails with [`MessageError::UnknownService`] if the type id does not
/// resolve, so the caller can answer with an `ERR` instead of faulting.
pub fn identify(body: &[u8]) -> Result<ServiceKind> {
    let mut peek = body;
    let type_id = NodeId::decode(&mut peek)?;
    match resolve(&type_id) {
        ServiceKind::Invalid => Err(MessageError::UnknownService(type_id)),
        kind => Ok(kind),
    }
}

/// Write the envelope's type id followed by its fields.
pub fn encode_service_body<M: ServiceMessage, B: BufMut>(message: &M, buf: &mut B) -> Result<()> {
    message.type_id().encode(buf)?;
    message.encode(buf)?;
    Ok(())
}

/// Read a type id and the envelope it announces, which must be `M`.
pub fn decode_service_body<M: ServiceMessage, B: Buf>(buf: &mut B) -> Result<M> {
    let type_id = NodeId::decode(buf)?;
    match resolve(&type_id) {
        ServiceKind::Invalid => Err(MessageError::UnknownService(type_id)),
        kind if kind != M::KIND => Err(MessageError::UnexpectedService {
            expected: M::KIND,
            actual: kind,
        }),
        _ => Ok(M::decode(buf)?),
    }
}

/// Security header following the secure chunk header.
///
/// `OPN` chunks carry the asymmetric form; `MSG` and `CLO` chunks carry the
/// token id of the symmetric form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecurityHeader {
    Asymmetric(AsymmetricSecurityHeader),
    Symmetric(SymmetricSecurityHeader),
}

impl SecurityHeader {
    fn fits(&self, message_type: MessageType) -> bool {
        match (self, message_type) {
            (SecurityHeader::Asymmetric(_), MessageType::OpenChannel) => true,
            (SecurityHeader::Symmetric(_), MessageType::Message | MessageType::CloseChannel) => {
                true
            }
            _ => false,
        }
    }

    fn read<B: Buf>(message_type: MessageType, buf: &mut B) -> Result<Self> {
        match message_type {
            MessageType::OpenChannel => Ok(SecurityHeader::Asymmetric(
                AsymmetricSecurityHeader::decode(buf)?,
            )),
            MessageType::Message | MessageType::CloseChannel => Ok(SecurityHeader::Symmetric(
                SymmetricSecurityHeader::decode(buf)?,
            )),
            other => Err(MessageError::SecurityHeaderMismatch(other)),
        }
    }
}

impl BinaryEncode for SecurityHeader {
    fn byte_len(&self) -> usize {
        match self {
            SecurityHeader::Asymmetric(header) => header.byte_len(),
            SecurityHeader::Symmetric(header) => header.byte_len(),
        }
    }

    fn encode<B: BufMut>(&self, buf: &mut B) -> uabin_types::Result<()> {
        match self {
            SecurityHeader::Asymmetric(header) => header.encode(buf),
            SecurityHeader::Symmetric(header) => header.encode(buf),
        }
    }
}

/// A decoded secure chunk split into its headers and service body.
#[derive(Debug, Clone)]
pub struct ServiceChunk {
    pub header: SecureHeader,
    pub security: SecurityHeader,
    pub sequence: SequenceHeader,
    /// Envelope bytes. Only the first chunk of a request starts with a type id.
    pub body: Bytes,
}

impl ServiceChunk {
    pub fn service_kind(&self) -> Result<ServiceKind> {
        identify(&self.body)
    }

    pub fn decode_message<M: ServiceMessage>(&self) -> Result<M> {
        let mut body = self.body.clone();
        decode_service_body(&mut body)
    }
}

/// Encode one secure chunk carrying a whole service envelope.
///
/// The security header must match the chunk's message type, see
/// [`SecurityHeader`].
pub fn encode_service_chunk<M: ServiceMessage>(
    header: &mut SecureHeader,
    security: &SecurityHeader,
    sequence: SequenceHeader,
    message: &M,
    dst: &mut BytesMut,
) -> Result<usize> {
    if !security.fits(header.message_type) {
        return Err(MessageError::SecurityHeaderMismatch(header.message_type));
    }

    dst.reserve(
        SecureHeader::RAW_SIZE
            + security.byte_len()
            + sequence.byte_len()
            + message.type_id().byte_len()
            + message.byte_len(),
    );
    let size = encode_chunk(header, dst, |buf| {
        security.encode(buf)?;
        sequence.encode(buf)?;
        encode_service_body(message, buf)
    })?;

    debug!(
        message_type = %header.message_type,
        channel_id = header.channel_id,
        sequence_number = sequence.sequence_number,
        request_id = sequence.request_id,
        service = %M::KIND,
        size,
        "encoded service chunk"
    );

    Ok(size)
}

/// Split a decoded secure chunk into its security and sequence headers.
pub fn decode_service_chunk(chunk: Chunk) -> Result<ServiceChunk> {
    let header = match chunk.header {
        ChunkHeader::Secure(header) => header,
        ChunkHeader::Plain(header) => {
            return Err(MessageError::UnexpectedMessageType {
                expected: MessageType::Message,
                actual: header.message_type,
            })
        }
    };

    let mut body = chunk.body;
    let security = SecurityHeader::read(header.message_type, &mut body)?;
    let sequence = SequenceHeader::decode(&mut body)?;

    Ok(ServiceChunk {
        header,
        security,
        sequence,
        body,
    })
}
