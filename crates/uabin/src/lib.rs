//! Binary framing layer of an OPC UA style secure channel.
//!
//! uabin turns protocol values into chunks and back. It does not own a
//! socket, keep session state, or apply cryptography; a transport feeds it
//! bytes and sends what it produces.
//!
//! # Crate Structure
//!
//! - [`types`]: Node identifiers, service kinds and their resolver, status codes, clock source
//! - [`frame`]: Size-tracked chunk headers, security and sequence headers, chunk codec
//! - [`messages`]: Hello/Acknowledge/Error negotiation and secure-channel envelopes
//!
//! # Example
//!
//! ```
//! use uabin::frame::{decode_chunk, DEFAULT_MAX_CHUNK_SIZE};
//! use uabin::messages::{decode_handshake, encode_handshake, negotiate, HandshakeConfig, Hello};
//!
//! let config = HandshakeConfig::default();
//! let mut wire = Default::default();
//! encode_handshake(&config.hello("opc.tcp://localhost:4840"), &mut wire).unwrap();
//!
//! let chunk = decode_chunk(&mut wire, DEFAULT_MAX_CHUNK_SIZE).unwrap().unwrap();
//! let hello: Hello = decode_handshake(&chunk).unwrap();
//! let ack = negotiate(&hello, &config).unwrap();
//! assert_eq!(ack.receive_buffer_size, 65_535);
//! ```

/// Re-export primitive types.
pub mod types {
    pub use uabin_types::*;
}

/// Re-export frame types.
pub mod frame {
    pub use uabin_frame::*;
}

/// Re-export handshake and envelope types.
pub mod messages {
    pub use uabin_messages::*;
}
