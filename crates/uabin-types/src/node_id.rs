//! Node identifiers.
//!
//! A [`NodeId`] is a tagged union: the [`Identifier`] variant selects the
//! encoding and owns only that encoding's payload. Wire layout:
//!
//! ```text
//! ┌───────────────┬──────────────────────────────┬──────────────┬──────────────┐
//! │ Encoding (1B) │ Payload (variant dependent)  │ NS URI (opt) │ Server (opt) │
//! │ low 6 bits =  │ TwoByte:    u8               │ flag 0x80    │ flag 0x40    │
//! │ variant       │ FourByte:   u8 ns + u16      │ i32-prefixed │ u32 LE       │
//! │               │ Numeric:    u16 ns + u32     │ string       │              │
//! │               │ String:     u16 ns + string  │              │              │
//! │               │ Guid:       u16 ns + 16B     │              │              │
//! │               │ ByteString: u16 ns + bytes   │              │              │
//! └───────────────┴──────────────────────────────┴──────────────┴──────────────┘
//! ```

use std::fmt;

use bytes::{Buf, BufMut, Bytes};
use serde::{Deserialize, Serialize};

use crate::encoding::{BinaryDecode, BinaryEncode};
use crate::error::{EncodingError, Result};
use crate::guid::{Guid, GUID_SIZE};

/// Encoding-byte flag: a namespace URI follows the payload.
pub const NAMESPACE_URI_FLAG: u8 = 0x80;

/// Encoding-byte flag: a server index follows the payload.
pub const SERVER_INDEX_FLAG: u8 = 0x40;

const ENCODING_MASK: u8 = 0x3F;

/// Discriminant of a node identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum NodeIdEncoding {
    TwoByte = 0,
    FourByte = 1,
    Numeric = 2,
    String = 3,
    Guid = 4,
    ByteString = 5,
}

impl NodeIdEncoding {
    /// Wire value of the discriminant (without flags).
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for NodeIdEncoding {
    type Error = EncodingError;

    fn try_from(value: u8) -> Result<Self> {
        match value & ENCODING_MASK {
            0 => Ok(Self::TwoByte),
            1 => Ok(Self::FourByte),
            2 => Ok(Self::Numeric),
            3 => Ok(Self::String),
            4 => Ok(Self::Guid),
            5 => Ok(Self::ByteString),
            _ => Err(EncodingError::InvalidNodeIdEncoding(value)),
        }
    }
}

/// Payload of a node identifier, one variant per encoding.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Identifier {
    TwoByte(u8),
    FourByte { namespace: u8, value: u16 },
    Numeric { namespace: u16, value: u32 },
    String { namespace: u16, value: String },
    Guid { namespace: u16, value: Guid },
    ByteString { namespace: u16, value: Bytes },
}

impl Identifier {
    /// The encoding selected by this variant.
    pub fn encoding(&self) -> NodeIdEncoding {
        match self {
            Identifier::TwoByte(_) => NodeIdEncoding::TwoByte,
            Identifier::FourByte { .. } => NodeIdEncoding::FourByte,
            Identifier::Numeric { .. } => NodeIdEncoding::Numeric,
            Identifier::String { .. } => NodeIdEncoding::String,
            Identifier::Guid { .. } => NodeIdEncoding::Guid,
            Identifier::ByteString { .. } => NodeIdEncoding::ByteString,
        }
    }

    /// Namespace index, widened to `u16`. Two-byte identifiers live in namespace 0.
    pub fn namespace_index(&self) -> u16 {
        match self {
            Identifier::TwoByte(_) => 0,
            Identifier::FourByte { namespace, .. } => u16::from(*namespace),
            Identifier::Numeric { namespace, .. }
            | Identifier::String { namespace, .. }
            | Identifier::Guid { namespace, .. }
            | Identifier::ByteString { namespace, .. } => *namespace,
        }
    }

    fn payload_len(&self) -> usize {
        match self {
            Identifier::TwoByte(_) => 1,
            Identifier::FourByte { .. } => 3,
            Identifier::Numeric { .. } => 6,
            Identifier::String { value, .. } => 2 + value.byte_len(),
            Identifier::Guid { .. } => 2 + GUID_SIZE,
            Identifier::ByteString { value, .. } => 2 + value.byte_len(),
        }
    }
}

impl Default for Identifier {
    fn default() -> Self {
        Identifier::TwoByte(0)
    }
}

/// A node identifier, optionally expanded with a namespace URI and a server index.
///
/// Equality and ordering compare the encoding first: `TwoByte(5)`,
/// `FourByte { 0, 5 }` and `Numeric { 0, 5 }` are three different identifiers.
/// The default value is the null identifier (`TwoByte(0)`, local server).
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId {
    identifier: Identifier,
    namespace_uri: Option<String>,
    server_index: u32,
}

impl NodeId {
    /// Build an identifier from a payload variant.
    pub fn new(identifier: Identifier) -> Self {
        Self {
            identifier,
            namespace_uri: None,
            server_index: 0,
        }
    }

    /// The null identifier.
    pub fn null() -> Self {
        Self::default()
    }

    pub fn two_byte(value: u8) -> Self {
        Self::new(Identifier::TwoByte(value))
    }

    pub fn four_byte(namespace: u8, value: u16) -> Self {
        Self::new(Identifier::FourByte { namespace, value })
    }

    pub fn numeric(namespace: u16, value: u32) -> Self {
        Self::new(Identifier::Numeric { namespace, value })
    }

    pub fn string(namespace: u16, value: impl Into<String>) -> Self {
        Self::new(Identifier::String {
            namespace,
            value: value.into(),
        })
    }

    pub fn guid(namespace: u16, value: Guid) -> Self {
        Self::new(Identifier::Guid { namespace, value })
    }

    pub fn byte_string(namespace: u16, value: impl Into<Bytes>) -> Self {
        Self::new(Identifier::ByteString {
            namespace,
            value: value.into(),
        })
    }

    /// Point the identifier at a remote server (`0` = local).
    pub fn with_server_index(mut self, server_index: u32) -> Self {
        self.server_index = server_index;
        self
    }

    /// Qualify the identifier with an explicit namespace URI.
    pub fn with_namespace_uri(mut self, uri: impl Into<String>) -> Self {
        self.namespace_uri = Some(uri.into());
        self
    }

    /// The payload variant, for exhaustive matching.
    pub fn identifier(&self) -> &Identifier {
        &self.identifier
    }

    pub fn encoding(&self) -> NodeIdEncoding {
        self.identifier.encoding()
    }

    pub fn namespace_index(&self) -> u16 {
        self.identifier.namespace_index()
    }

    pub fn namespace_uri(&self) -> Option<&str> {
        self.namespace_uri.as_deref()
    }

    pub fn server_index(&self) -> u32 {
        self.server_index
    }

    /// Returns true for a local two-byte identifier with value 0.
    pub fn is_null(&self) -> bool {
        *self == Self::null()
    }

    /// Two-byte payload, or [`EncodingError::WrongEncoding`].
    pub fn as_two_byte(&self) -> Result<u8> {
        match &self.identifier {
            Identifier::TwoByte(value) => Ok(*value),
            _ => Err(self.wrong_encoding(NodeIdEncoding::TwoByte)),
        }
    }

    /// Four-byte payload as `(namespace, value)`.
    pub fn as_four_byte(&self) -> Result<(u8, u16)> {
        match &self.identifier {
            Identifier::FourByte { namespace, value } => Ok((*namespace, *value)),
            _ => Err(self.wrong_encoding(NodeIdEncoding::FourByte)),
        }
    }

    /// Numeric payload as `(namespace, value)`.
    pub fn as_numeric(&self) -> Result<(u16, u32)> {
        match &self.identifier {
            Identifier::Numeric { namespace, value } => Ok((*namespace, *value)),
            _ => Err(self.wrong_encoding(NodeIdEncoding::Numeric)),
        }
    }

    /// String payload as `(namespace, value)`.
    pub fn as_string(&self) -> Result<(u16, &str)> {
        match &self.identifier {
            Identifier::String { namespace, value } => Ok((*namespace, value.as_str())),
            _ => Err(self.wrong_encoding(NodeIdEncoding::String)),
        }
    }

    /// GUID payload as `(namespace, value)`.
    pub fn as_guid(&self) -> Result<(u16, Guid)> {
        match &self.identifier {
            Identifier::Guid { namespace, value } => Ok((*namespace, *value)),
            _ => Err(self.wrong_encoding(NodeIdEncoding::Guid)),
        }
    }

    /// Byte-string payload as `(namespace, value)`.
    pub fn as_byte_string(&self) -> Result<(u16, &Bytes)> {
        match &self.identifier {
            Identifier::ByteString { namespace, value } => Ok((*namespace, value)),
            _ => Err(self.wrong_encoding(NodeIdEncoding::ByteString)),
        }
    }

    fn wrong_encoding(&self, expected: NodeIdEncoding) -> EncodingError {
        EncodingError::WrongEncoding {
            expected,
            actual: self.encoding(),
        }
    }

    fn encoding_byte(&self) -> u8 {
        let mut byte = self.encoding().as_u8();
        if self.namespace_uri.is_some() {
            byte |= NAMESPACE_URI_FLAG;
        }
        if self.server_index != 0 {
            byte |= SERVER_INDEX_FLAG;
        }
        byte
    }
}

impl From<Identifier> for NodeId {
    fn from(identifier: Identifier) -> Self {
        Self::new(identifier)
    }
}

impl BinaryEncode for NodeId {
    fn byte_len(&self) -> usize {
        let mut len = 1 + self.identifier.payload_len();
        if let Some(uri) = &self.namespace_uri {
            len += uri.byte_len();
        }
        if self.server_index != 0 {
            len += 4;
        }
        len
    }

    fn encode<B: BufMut>(&self, buf: &mut B) -> Result<()> {
        buf.put_u8(self.encoding_byte());
        match &self.identifier {
            Identifier::TwoByte(value) => buf.put_u8(*value),
            Identifier::FourByte { namespace, value } => {
                buf.put_u8(*namespace);
                buf.put_u16_le(*value);
            }
            Identifier::Numeric { namespace, value } => {
                buf.put_u16_le(*namespace);
                buf.put_u32_le(*value);
            }
            Identifier::String { namespace, value } => {
                buf.put_u16_le(*namespace);
                value.encode(buf)?;
            }
            Identifier::Guid { namespace, value } => {
                buf.put_u16_le(*namespace);
                value.encode(buf)?;
            }
            Identifier::ByteString { namespace, value } => {
                buf.put_u16_le(*namespace);
                value.encode(buf)?;
            }
        }
        if let Some(uri) = &self.namespace_uri {
            uri.encode(buf)?;
        }
        if self.server_index != 0 {
            buf.put_u32_le(self.server_index);
        }
        Ok(())
    }
}

impl BinaryDecode for NodeId {
    fn decode<B: Buf>(buf: &mut B) -> Result<Self> {
        let byte = u8::decode(buf)?;
        let identifier = match NodeIdEncoding::try_from(byte)? {
            NodeIdEncoding::TwoByte => Identifier::TwoByte(u8::decode(buf)?),
            NodeIdEncoding::FourByte => Identifier::FourByte {
                namespace: u8::decode(buf)?,
                value: u16::decode(buf)?,
            },
            NodeIdEncoding::Numeric => Identifier::Numeric {
                namespace: u16::decode(buf)?,
                value: u32::decode(buf)?,
            },
            NodeIdEncoding::String => Identifier::String {
                namespace: u16::decode(buf)?,
                value: String::decode(buf)?,
            },
            NodeIdEncoding::Guid => Identifier::Guid {
                namespace: u16::decode(buf)?,
                value: Guid::decode(buf)?,
            },
            NodeIdEncoding::ByteString => Identifier::ByteString {
                namespace: u16::decode(buf)?,
                value: Bytes::decode(buf)?,
            },
        };

        let namespace_uri = if byte & NAMESPACE_URI_FLAG != 0 {
            Some(String::decode(buf)?)
        } else {
            None
        };
        let server_index = if byte & SERVER_INDEX_FLAG != 0 {
            u32::decode(buf)?
        } else {
            0
        };

        Ok(Self {
            identifier,
            namespace_uri,
            server_index,
        })
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.server_index != 0 {
            write!(f, "svr={};", self.server_index)?;
        }
        if let Some(uri) = &self.namespace_uri {
            write!(f, "nsu={uri};")?;
        } else if self.namespace_index() != 0 {
            write!(f, "ns={};", self.namespace_index())?;
        }
        match &self.identifier {
            Identifier::TwoByte(value) => write!(f, "i={value}"),
            Identifier::FourByte { value, .. } => write!(f, "i={value}"),
            Identifier::Numeric { value, .. } => write!(f, "i={value}"),
            Identifier::String { value, .. } => write!(f, "s={value}"),
            Identifier::Guid { value, .. } => write!(f, "g={value}"),
            Identifier::ByteString { value, .. } => {
                f.write_str("b=0x")?;
                for byte in value.iter() {
                    write!(f, "{byte:02x}")?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use bytes::BytesMut;
    use proptest::prelude::*;

    use super::*;

    fn encode(id: &NodeId) -> BytesMut {
        let mut buf = BytesMut::new();
        id.encode(&mut buf).unwrap();
        assert_eq!(buf.len(), id.byte_len());
        buf
    }

    #[test]
    fn default_is_null_two_byte() {
        let id = NodeId::default();
        assert_eq!(id.encoding(), NodeIdEncoding::TwoByte);
        assert_eq!(id.as_two_byte().unwrap(), 0);
        assert_eq!(id.server_index(), 0);
        assert!(id.is_null());
        assert_eq!(encode(&id).as_ref(), &[0x00, 0x00]);
    }

    #[test]
    fn equality_is_encoding_aware() {
        let two = NodeId::two_byte(5);
        let four = NodeId::four_byte(0, 5);
        let numeric = NodeId::numeric(0, 5);

        assert_ne!(two, four);
        assert_ne!(four, numeric);
        assert_ne!(two, numeric);
        assert_eq!(four, NodeId::four_byte(0, 5));
    }

    #[test]
    fn ordering_compares_encoding_first() {
        assert!(NodeId::two_byte(200) < NodeId::four_byte(0, 1));
        assert!(NodeId::four_byte(0, 60000) < NodeId::numeric(0, 0));
        assert!(NodeId::numeric(0, 1) < NodeId::numeric(0, 2));
    }

    #[test]
    fn wrong_variant_access_fails() {
        let id = NodeId::four_byte(0, 446);
        assert_eq!(id.as_four_byte().unwrap(), (0, 446));
        assert_eq!(
            id.as_numeric().unwrap_err(),
            EncodingError::WrongEncoding {
                expected: NodeIdEncoding::Numeric,
                actual: NodeIdEncoding::FourByte,
            }
        );
        assert!(id.as_two_byte().is_err());
        assert!(id.as_string().is_err());
        assert!(id.as_guid().is_err());
        assert!(id.as_byte_string().is_err());
    }

    #[test]
    fn four_byte_wire_layout() {
        let buf = encode(&NodeId::four_byte(2, 0x01BE));
        assert_eq!(buf.as_ref(), &[0x01, 0x02, 0xBE, 0x01]);
    }

    #[test]
    fn numeric_wire_layout() {
        let buf = encode(&NodeId::numeric(1, 0x0102_0304));
        assert_eq!(buf.as_ref(), &[0x02, 0x01, 0x00, 0x04, 0x03, 0x02, 0x01]);
    }

    #[test]
    fn string_and_byte_string_decode() {
        for id in [
            NodeId::string(3, "Demo.Static.Scalar"),
            NodeId::byte_string(4, Bytes::from_static(&[0xDE, 0xAD])),
            NodeId::guid(1, Guid::new(1, 2, 3, [4; 8])),
        ] {
            let mut wire = encode(&id).freeze();
            assert_eq!(NodeId::decode(&mut wire).unwrap(), id);
            assert!(wire.is_empty());
        }
    }

    #[test]
    fn expanded_flags_written_only_when_set() {
        let id = NodeId::numeric(0, 85)
            .with_namespace_uri("urn:example")
            .with_server_index(3);
        let buf = encode(&id);
        assert_eq!(buf[0], 0x02 | NAMESPACE_URI_FLAG | SERVER_INDEX_FLAG);
        assert_eq!(&buf[buf.len() - 4..], &3u32.to_le_bytes());

        let decoded = NodeId::decode(&mut buf.freeze()).unwrap();
        assert_eq!(decoded.namespace_uri(), Some("urn:example"));
        assert_eq!(decoded.server_index(), 3);

        let local = NodeId::numeric(0, 85).with_server_index(0);
        assert_eq!(encode(&local)[0], 0x02);
    }

    #[test]
    fn unknown_encoding_byte_rejected() {
        let mut buf = Bytes::from_static(&[0x07, 0x00]);
        assert_eq!(
            NodeId::decode(&mut buf).unwrap_err(),
            EncodingError::InvalidNodeIdEncoding(0x07)
        );
    }

    #[test]
    fn truncated_payload_rejected() {
        let mut buf = Bytes::from_static(&[0x02, 0x00, 0x00, 0x01]);
        assert!(matches!(
            NodeId::decode(&mut buf),
            Err(EncodingError::UnexpectedEof { .. })
        ));
    }

    #[test]
    fn display_forms() {
        assert_eq!(NodeId::two_byte(7).to_string(), "i=7");
        assert_eq!(NodeId::numeric(2, 1001).to_string(), "ns=2;i=1001");
        assert_eq!(NodeId::string(1, "Pump").to_string(), "ns=1;s=Pump");
        assert_eq!(
            NodeId::byte_string(0, Bytes::from_static(&[0xAB, 0x01])).to_string(),
            "b=0xab01"
        );
        assert_eq!(
            NodeId::numeric(0, 85).with_server_index(2).to_string(),
            "svr=2;i=85"
        );
    }

    proptest! {
        #[test]
        fn decode_never_panics(data in prop::collection::vec(any::<u8>(), 0..64)) {
            let mut buf = Bytes::from(data);
            let _ = NodeId::decode(&mut buf);
        }

        #[test]
        fn numeric_identifiers_survive_the_wire(namespace in any::<u16>(), value in any::<u32>()) {
            let id = NodeId::numeric(namespace, value);
            let mut wire = encode(&id).freeze();
            prop_assert_eq!(NodeId::decode(&mut wire).unwrap(), id);
        }
    }
}
