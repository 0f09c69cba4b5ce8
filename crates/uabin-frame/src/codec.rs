//! Chunk encoding and decoding.
//!
//! [`encode_chunk`] writes one chunk in two passes; [`decode_chunk`] splits
//! one complete chunk off the front of a receive buffer.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use tracing::debug;
use uabin_types::BinaryEncode;

use crate::error::{FrameError, Result};
use crate::header::{FrameHeader, MessageHeader, SecureHeader, MESSAGE_HEADER_SIZE};
use crate::message_type::{ChunkType, MessageType};

/// Default maximum chunk size: 16 MiB.
pub const DEFAULT_MAX_CHUNK_SIZE: usize = 16 * 1024 * 1024;

/// Header of a decoded chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChunkHeader {
    Plain(MessageHeader),
    Secure(SecureHeader),
}

impl ChunkHeader {
    pub fn message_type(&self) -> MessageType {
        match self {
            ChunkHeader::Plain(header) => header.message_type,
            ChunkHeader::Secure(header) => header.message_type,
        }
    }

    pub fn chunk_type(&self) -> ChunkType {
        match self {
            ChunkHeader::Plain(header) => header.chunk_type,
            ChunkHeader::Secure(header) => header.chunk_type,
        }
    }

    /// Total chunk size, header included.
    pub fn size(&self) -> usize {
        match self {
            ChunkHeader::Plain(header) => header.size(),
            ChunkHeader::Secure(header) => header.size(),
        }
    }

    /// Channel id of a secure chunk.
    pub fn channel_id(&self) -> Option<u32> {
        match self {
            ChunkHeader::Plain(_) => None,
            ChunkHeader::Secure(header) => Some(header.channel_id),
        }
    }
}

/// One complete chunk: its header and the bytes following it.
#[derive(Debug, Clone)]
pub struct Chunk {
    pub header: ChunkHeader,
    pub body: Bytes,
}

impl Chunk {
    /// The total wire size of this chunk (header + body).
    pub fn wire_size(&self) -> usize {
        self.header.size()
    }

    /// Size [`encode`](Self::encode) writes: the raw header plus the body,
    /// whatever the header has accounted.
    pub fn encoded_size(&self) -> usize {
        let raw = match &self.header {
            ChunkHeader::Plain(_) => MessageHeader::RAW_SIZE,
            ChunkHeader::Secure(_) => SecureHeader::RAW_SIZE,
        };
        raw + self.body.len()
    }

    /// Re-encode the chunk, deriving the size from the body length.
    pub fn encode(&self, dst: &mut BytesMut) -> Result<usize> {
        let body = &self.body;
        match &self.header {
            ChunkHeader::Plain(header) => {
                let mut header = header.clone();
                encode_chunk(&mut header, dst, |buf| {
                    buf.put_slice(body);
                    Ok::<(), FrameError>(())
                })
            }
            ChunkHeader::Secure(header) => {
                let mut header = header.clone();
                encode_chunk(&mut header, dst, |buf| {
                    buf.put_slice(body);
                    Ok::<(), FrameError>(())
                })
            }
        }
    }
}

/// Encode one chunk in two passes.
///
/// Space for the header is reserved first, `write_body` appends the body,
/// and the header is then patched in with its size set from the bytes the
/// body actually occupied. On error `dst` is left as it was.
///
/// Fails with [`FrameError::HeaderMismatch`] before writing anything if the
/// header form does not suit its message type.
///
/// Wire format:
/// ```text
/// ┌──────────┬───────┬───────────┬─────────────────┬──────────────────┐
/// │ Type     │ Chunk │ Size      │ Channel id      │ Body             │
/// │ 3B ASCII │ 1B    │ 4B LE     │ 4B LE (secure)  │                  │
/// └──────────┴───────┴───────────┴─────────────────┴──────────────────┘
/// ```
pub fn encode_chunk<H, F, E>(
    header: &mut H,
    dst: &mut BytesMut,
    write_body: F,
) -> std::result::Result<usize, E>
where
    H: FrameHeader,
    F: FnOnce(&mut BytesMut) -> std::result::Result<(), E>,
    E: From<FrameError>,
{
    header.check_form()?;

    let start = dst.len();
    header.reset_size();
    dst.put_bytes(0, H::RAW_SIZE);

    if let Err(err) = write_body(dst) {
        dst.truncate(start);
        return Err(err);
    }

    let written = dst.len() - start - H::RAW_SIZE;
    header.add_size(written);

    let mut slot = &mut dst[start..start + H::RAW_SIZE];
    if let Err(err) = header.encode(&mut slot) {
        dst.truncate(start);
        return Err(FrameError::from(err).into());
    }

    Ok(header.size())
}

/// Encode one chunk whose body is a single encodable value.
pub fn encode_message<H, T>(header: &mut H, body: &T, dst: &mut BytesMut) -> Result<usize>
where
    H: FrameHeader,
    T: BinaryEncode + ?Sized,
{
    dst.reserve(H::RAW_SIZE + body.byte_len());
    encode_chunk(header, dst, |buf| body.encode(buf).map_err(FrameError::from))
}

/// Decode one chunk from a buffer.
///
/// Returns `Ok(None)` if the buffer doesn't contain a complete chunk yet.
/// On success, consumes the chunk bytes from the buffer.
pub fn decode_chunk(src: &mut BytesMut, max_chunk_size: usize) -> Result<Option<Chunk>> {
    if src.len() < MESSAGE_HEADER_SIZE {
        return Ok(None); // Need more data
    }

    let mut peek = &src[..MESSAGE_HEADER_SIZE];
    let header = match MessageHeader::read(&mut peek) {
        Ok(header) => header,
        Err(err) => {
            debug!(error = %err, "rejecting chunk header");
            return Err(err);
        }
    };

    let size = header.size();
    if size > max_chunk_size {
        debug!(
            message_type = %header.message_type,
            size,
            max = max_chunk_size,
            "chunk exceeds maximum size"
        );
        return Err(FrameError::ChunkTooLarge {
            size,
            max: max_chunk_size,
        });
    }

    if src.len() < size {
        return Ok(None); // Need more data
    }

    let mut raw = src.split_to(size).freeze();
    let header = if header.message_type.is_secure() {
        ChunkHeader::Secure(SecureHeader::read(&mut raw)?)
    } else {
        raw.advance(MESSAGE_HEADER_SIZE);
        ChunkHeader::Plain(header)
    };

    debug!(
        message_type = %header.message_type(),
        chunk_type = %header.chunk_type(),
        size,
        channel_id = ?header.channel_id(),
        "decoded chunk"
    );

    Ok(Some(Chunk { header, body: raw }))
}

/// Configuration for the chunk codec.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Maximum size of one chunk in bytes, header included. Default: 16 MiB.
    pub max_chunk_size: usize,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_chunk_size: DEFAULT_MAX_CHUNK_SIZE,
        }
    }
}
