use crate::node_id::NodeIdEncoding;

/// Errors that can occur while encoding or decoding binary primitives.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EncodingError {
    /// The buffer ended before the value was complete.
    #[error("unexpected end of input ({needed} bytes needed, {remaining} remaining)")]
    UnexpectedEof { needed: usize, remaining: usize },

    /// The node identifier encoding byte is not a known variant.
    #[error("invalid node id encoding byte 0x{0:02x}")]
    InvalidNodeIdEncoding(u8),

    /// A node identifier payload was accessed under the wrong encoding.
    #[error("node id has {actual:?} encoding, expected {expected:?}")]
    WrongEncoding {
        expected: NodeIdEncoding,
        actual: NodeIdEncoding,
    },

    /// A length prefix is negative (other than the null marker) or otherwise invalid.
    #[error("invalid length prefix {0}")]
    InvalidLength(i32),

    /// A string payload is not valid UTF-8.
    #[error("string is not valid utf-8")]
    InvalidUtf8,

    /// A value is too long to be described by an `i32` length prefix.
    #[error("length {0} does not fit the wire length prefix")]
    LengthOverflow(usize),

    /// An enumerated field holds a value outside its defined set.
    #[error("invalid {name} value {value}")]
    InvalidEnumValue { name: &'static str, value: u32 },

    /// A recursive structure nests deeper than allowed.
    #[error("nesting deeper than {max} levels")]
    NestingTooDeep { max: usize },
}

pub type Result<T> = std::result::Result<T, EncodingError>;
