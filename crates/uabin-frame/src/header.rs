//! Size-tracked chunk headers.
//!
//! A header's `size` starts at the header's own wire length and only grows
//! until the next [`FrameHeader::reset_size`]. [`FrameHeader::message_size`]
//! is the number of body bytes accounted so far and can never underflow:
//! `size` is private and every constructor and decoder, serde included,
//! keeps it at or above the raw header length.

use bytes::{Buf, BufMut};
use serde::{de, Deserialize, Deserializer, Serialize};
use uabin_types::encoding::ensure_remaining;
use uabin_types::{BinaryEncode, EncodingError};

use crate::error::{FrameError, Result};
use crate::message_type::{ChunkType, MessageType};

/// Wire length of a plain header: type (3) + chunk (1) + size (4).
pub const MESSAGE_HEADER_SIZE: usize = 8;

/// Wire length of a secure header: plain header + channel id (4).
pub const SECURE_HEADER_SIZE: usize = 12;

/// Common size accounting of plain and secure headers.
pub trait FrameHeader: BinaryEncode {
    /// Wire length of the header itself.
    const RAW_SIZE: usize;

    fn message_type(&self) -> MessageType;

    fn chunk_type(&self) -> ChunkType;

    /// Total chunk size accounted so far, this header included.
    fn size(&self) -> usize;

    /// Account `n` more body bytes and return the new total.
    fn add_size(&mut self, n: usize) -> usize;

    /// Drop all accounted body bytes.
    fn reset_size(&mut self);

    /// Body bytes accounted so far.
    fn message_size(&self) -> usize {
        debug_assert!(self.size() >= Self::RAW_SIZE, "header size below its raw length");
        self.size().saturating_sub(Self::RAW_SIZE)
    }

    /// Fail unless the message type is framed with this header form.
    fn check_form(&self) -> Result<()> {
        let secure_form = Self::RAW_SIZE == SECURE_HEADER_SIZE;
        if self.message_type().is_secure() != secure_form {
            return Err(FrameError::HeaderMismatch {
                message_type: self.message_type(),
                header_size: Self::RAW_SIZE,
            });
        }
        Ok(())
    }

    /// Account one serialized field by its exact encoded length.
    fn account<T: BinaryEncode + ?Sized>(&mut self, field: &T) -> usize {
        self.add_size(field.byte_len())
    }
}

/// Header of a handshake chunk (`HEL`, `ACK`, `ERR`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageHeader {
    pub message_type: MessageType,
    pub chunk_type: ChunkType,
    size: usize,
}

impl MessageHeader {
    pub fn new(message_type: MessageType, chunk_type: ChunkType) -> Self {
        Self {
            message_type,
            chunk_type,
            size: MESSAGE_HEADER_SIZE,
        }
    }

    /// Read a header from the front of `buf`, validating tags and size.
    pub fn read<B: Buf>(buf: &mut B) -> Result<Self> {
        ensure_remaining(buf, MESSAGE_HEADER_SIZE)?;
        let mut tag = [0u8; 3];
        buf.copy_to_slice(&mut tag);
        let message_type = MessageType::try_from(tag)?;
        let chunk_type = ChunkType::try_from(buf.get_u8())?;
        let size = buf.get_u32_le() as usize;

        if message_type.is_handshake() && chunk_type != ChunkType::Final {
            return Err(FrameError::InvalidChunkType {
                message_type,
                chunk_type,
            });
        }

        let min = if message_type.is_secure() {
            SECURE_HEADER_SIZE
        } else {
            MESSAGE_HEADER_SIZE
        };
        if size < min {
            return Err(FrameError::InvalidSize { size, min });
        }

        Ok(Self {
            message_type,
            chunk_type,
            size,
        })
    }
}

impl FrameHeader for MessageHeader {
    const RAW_SIZE: usize = MESSAGE_HEADER_SIZE;

    fn message_type(&self) -> MessageType {
        self.message_type
    }

    fn chunk_type(&self) -> ChunkType {
        self.chunk_type
    }

    fn size(&self) -> usize {
        self.size
    }

    fn add_size(&mut self, n: usize) -> usize {
        self.size = self.size.saturating_add(n);
        self.size
    }

    fn reset_size(&mut self) {
        self.size = MESSAGE_HEADER_SIZE;
    }
}

impl BinaryEncode for MessageHeader {
    fn byte_len(&self) -> usize {
        MESSAGE_HEADER_SIZE
    }

    fn encode<B: BufMut>(&self, buf: &mut B) -> uabin_types::Result<()> {
        write_common(self.message_type, self.chunk_type, self.size, buf)
    }
}

/// Header of a channel-scoped chunk (`MSG`, `OPN`, `CLO`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SecureHeader {
    pub message_type: MessageType,
    pub chunk_type: ChunkType,
    size: usize,
    /// Assigned by the channel layer; `0` until the server has issued one.
    pub channel_id: u32,
}

impl SecureHeader {
    pub fn new(message_type: MessageType, chunk_type: ChunkType, channel_id: u32) -> Self {
        Self {
            message_type,
            chunk_type,
            size: SECURE_HEADER_SIZE,
            channel_id,
        }
    }

    /// Read a secure header from the front of `buf`.
    pub fn read<B: Buf>(buf: &mut B) -> Result<Self> {
        let plain = MessageHeader::read(buf)?;
        if plain.size < SECURE_HEADER_SIZE {
            return Err(FrameError::InvalidSize {
                size: plain.size,
                min: SECURE_HEADER_SIZE,
            });
        }
        ensure_remaining(buf, 4)?;
        let channel_id = buf.get_u32_le();
        Ok(Self {
            message_type: plain.message_type,
            chunk_type: plain.chunk_type,
            size: plain.size,
            channel_id,
        })
    }
}

impl FrameHeader for SecureHeader {
    const RAW_SIZE: usize = SECURE_HEADER_SIZE;

    fn message_type(&self) -> MessageType {
        self.message_type
    }

    fn chunk_type(&self) -> ChunkType {
        self.chunk_type
    }

    fn size(&self) -> usize {
        self.size
    }

    fn add_size(&mut self, n: usize) -> usize {
        self.size = self.size.saturating_add(n);
        self.size
    }

    fn reset_size(&mut self) {
        self.size = SECURE_HEADER_SIZE;
    }
}

impl BinaryEncode for SecureHeader {
    fn byte_len(&self) -> usize {
        SECURE_HEADER_SIZE
    }

    fn encode<B: BufMut>(&self, buf: &mut B) -> uabin_types::Result<()> {
        write_common(self.message_type, self.chunk_type, self.size, buf)?;
        buf.put_u32_le(self.channel_id);
        Ok(())
    }
}

#[derive(Deserialize)]
struct RawMessageHeader {
    message_type: MessageType,
    chunk_type: ChunkType,
    size: usize,
}

#[derive(Deserialize)]
struct RawSecureHeader {
    message_type: MessageType,
    chunk_type: ChunkType,
    size: usize,
    channel_id: u32,
}

impl<'de> Deserialize<'de> for MessageHeader {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = RawMessageHeader::deserialize(deserializer)?;
        let header = Self {
            message_type: raw.message_type,
            chunk_type: raw.chunk_type,
            size: raw.size,
        };
        validate(&header).map_err(de::Error::custom)?;
        Ok(header)
    }
}

impl<'de> Deserialize<'de> for SecureHeader {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = RawSecureHeader::deserialize(deserializer)?;
        let header = Self {
            message_type: raw.message_type,
            chunk_type: raw.chunk_type,
            size: raw.size,
            channel_id: raw.channel_id,
        };
        validate(&header).map_err(de::Error::custom)?;
        Ok(header)
    }
}

/// Invariants a header built outside its constructors must still hold.
fn validate<H: FrameHeader>(header: &H) -> Result<()> {
    if header.size() < H::RAW_SIZE {
        return Err(FrameError::InvalidSize {
            size: header.size(),
            min: H::RAW_SIZE,
        });
    }
    header.check_form()
}

fn write_common<B: BufMut>(
    message_type: MessageType,
    chunk_type: ChunkType,
    size: usize,
    buf: &mut B,
) -> uabin_types::Result<()> {
    let size = u32::try_from(size).map_err(|_| EncodingError::LengthOverflow(size))?;
    buf.put_slice(&message_type.tag());
    buf.put_u8(chunk_type.tag());
    buf.put_u32_le(size);
    Ok(())
}

#[cfg(test)]
mod tests {
    use bytes::{Bytes, BytesMut};
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn fresh_headers_have_no_message_bytes() {
        let plain = MessageHeader::new(MessageType::Hello, ChunkType::Final);
        assert_eq!(plain.size(), MESSAGE_HEADER_SIZE);
        assert_eq!(plain.message_size(), 0);

        let secure = SecureHeader::new(MessageType::Message, ChunkType::Intermediate, 7);
        assert_eq!(secure.size(), SECURE_HEADER_SIZE);
        assert_eq!(secure.message_size(), 0);
        assert_eq!(secure.channel_id, 7);
    }

    #[test]
    fn add_size_returns_running_total() {
        let mut header = SecureHeader::new(MessageType::OpenChannel, ChunkType::Final, 0);
        assert_eq!(header.add_size(8), 20);
        assert_eq!(header.add_size(4), 24);
        assert_eq!(header.message_size(), 12);

        header.reset_size();
        assert_eq!(header.size(), SECURE_HEADER_SIZE);
        assert_eq!(header.message_size(), 0);
    }

    #[test]
    fn account_uses_exact_field_length() {
        let mut header = MessageHeader::new(MessageType::Hello, ChunkType::Final);
        header.account(&0u32);
        header.account(&"opc.tcp://host:4840".to_string());
        assert_eq!(header.message_size(), 4 + 4 + 19);
    }

    #[test]
    fn secure_header_wire_layout() {
        let mut header = SecureHeader::new(MessageType::Message, ChunkType::Final, 0x0A0B0C0D);
        header.add_size(4);
        let mut buf = BytesMut::new();
        header.encode(&mut buf).unwrap();
        assert_eq!(
            buf.as_ref(),
            &[b'M', b'S', b'G', b'F', 16, 0, 0, 0, 0x0D, 0x0C, 0x0B, 0x0A]
        );

        let decoded = SecureHeader::read(&mut buf.freeze()).unwrap();
        assert_eq!(decoded, header);
    }

    #[test]
    fn read_rejects_size_below_header() {
        let mut buf = Bytes::from_static(&[b'H', b'E', b'L', b'F', 4, 0, 0, 0]);
        assert!(matches!(
            MessageHeader::read(&mut buf),
            Err(FrameError::InvalidSize { size: 4, min: 8 })
        ));

        let mut buf = Bytes::from_static(&[b'M', b'S', b'G', b'F', 8, 0, 0, 0, 1, 0, 0, 0]);
        assert!(matches!(
            SecureHeader::read(&mut buf),
            Err(FrameError::InvalidSize { size: 8, min: 12 })
        ));
    }

    #[test]
    fn read_rejects_chunked_handshake() {
        let mut buf = Bytes::from_static(&[b'A', b'C', b'K', b'C', 28, 0, 0, 0]);
        assert!(matches!(
            MessageHeader::read(&mut buf),
            Err(FrameError::InvalidChunkType {
                message_type: MessageType::Acknowledge,
                chunk_type: ChunkType::Intermediate,
            })
        ));
    }

    #[test]
    fn read_needs_full_header() {
        let mut buf = Bytes::from_static(&[b'H', b'E', b'L']);
        assert!(matches!(
            MessageHeader::read(&mut buf),
            Err(FrameError::Encoding(EncodingError::UnexpectedEof { .. }))
        ));
    }

    #[test]
    fn deserialize_rejects_size_below_header() {
        let err = serde_json::from_str::<SecureHeader>(
            r#"{"message_type":"Message","chunk_type":"Final","size":0,"channel_id":1}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("smaller than its header"));

        let err = serde_json::from_str::<MessageHeader>(
            r#"{"message_type":"Hello","chunk_type":"Final","size":7}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("smaller than its header"));
    }

    #[test]
    fn deserialize_rejects_wrong_header_form() {
        let err = serde_json::from_str::<MessageHeader>(
            r#"{"message_type":"Message","chunk_type":"Final","size":12}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("8-byte header"));
    }

    #[test]
    fn serde_keeps_valid_headers() {
        let mut header = SecureHeader::new(MessageType::CloseChannel, ChunkType::Final, 4);
        header.add_size(20);
        let json = serde_json::to_string(&header).unwrap();
        let back: SecureHeader = serde_json::from_str(&json).unwrap();
        assert_eq!(back, header);
        assert_eq!(back.message_size(), 20);
    }

    #[test]
    fn check_form_matches_message_type() {
        assert!(MessageHeader::new(MessageType::Hello, ChunkType::Final)
            .check_form()
            .is_ok());
        assert!(SecureHeader::new(MessageType::OpenChannel, ChunkType::Final, 0)
            .check_form()
            .is_ok());
        assert!(matches!(
            MessageHeader::new(MessageType::Message, ChunkType::Final).check_form(),
            Err(FrameError::HeaderMismatch {
                message_type: MessageType::Message,
                header_size: MESSAGE_HEADER_SIZE,
            })
        ));
        assert!(matches!(
            SecureHeader::new(MessageType::Acknowledge, ChunkType::Final, 0).check_form(),
            Err(FrameError::HeaderMismatch {
                header_size: SECURE_HEADER_SIZE,
                ..
            })
        ));
    }

    proptest! {
        #[test]
        fn message_size_is_sum_of_added_sizes(sizes in prop::collection::vec(0usize..65_536, 0..32)) {
            let mut header = SecureHeader::new(MessageType::Message, ChunkType::Final, 1);
            let mut previous = header.size();
            for &n in &sizes {
                let total = header.add_size(n);
                prop_assert!(total >= previous);
                previous = total;
            }
            prop_assert_eq!(header.message_size(), sizes.iter().sum::<usize>());
        }
    }
}
