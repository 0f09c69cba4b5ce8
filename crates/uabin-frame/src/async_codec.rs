use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};

use crate::codec::{decode_chunk, Chunk, FrameConfig};
use crate::error::FrameError;

/// `tokio_util` codec delimiting chunks on a byte stream.
#[derive(Debug, Clone, Default)]
pub struct ChunkCodec {
    config: FrameConfig,
}

impl ChunkCodec {
    pub fn new(config: FrameConfig) -> Self {
        Self { config }
    }

    /// Update the chunk ceiling, e.g. after the handshake negotiated limits.
    pub fn set_max_chunk_size(&mut self, max_chunk_size: usize) {
        self.config.max_chunk_size = max_chunk_size;
    }

    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

impl Decoder for ChunkCodec {
    type Item = Chunk;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        decode_chunk(src, self.config.max_chunk_size)
    }
}

impl Encoder<Chunk> for ChunkCodec {
    type Error = FrameError;

    fn encode(&mut self, item: Chunk, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let size = item.encoded_size();
        if size > self.config.max_chunk_size {
            return Err(FrameError::ChunkTooLarge {
                size,
                max: self.config.max_chunk_size,
            });
        }
        item.encode(dst)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;
    use crate::codec::ChunkHeader;
    use crate::header::SecureHeader;
    use crate::message_type::{ChunkType, MessageType};

    fn chunk(body: &'static [u8]) -> Chunk {
        Chunk {
            header: ChunkHeader::Secure(SecureHeader::new(MessageType::Message, ChunkType::Final, 3)),
            body: Bytes::from_static(body),
        }
    }

    #[test]
    fn codec_round_trip() {
        let mut codec = ChunkCodec::default();
        let mut buf = BytesMut::new();

        codec.encode(chunk(b"first"), &mut buf).unwrap();
        codec.encode(chunk(b"second"), &mut buf).unwrap();

        let first = codec.decode(&mut buf).unwrap().unwrap();
        let second = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(first.body.as_ref(), b"first");
        assert_eq!(second.body.as_ref(), b"second");
        assert!(codec.decode(&mut buf).unwrap().is_none());
    }

    #[test]
    fn codec_enforces_configured_ceiling() {
        let mut codec = ChunkCodec::default();
        codec.set_max_chunk_size(16);

        let mut buf = BytesMut::new();
        let err = codec.encode(chunk(&[0; 1000]), &mut buf).unwrap_err();
        assert!(matches!(
            err,
            FrameError::ChunkTooLarge {
                size: 1012,
                max: 16
            }
        ));
        assert!(buf.is_empty());

        codec.encode(chunk(b"four"), &mut buf).unwrap();
        assert_eq!(buf.len(), 16);
    }
}
