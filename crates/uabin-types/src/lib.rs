//! Identifier and primitive layer of the UA binary secure-channel protocol.
//!
//! Every higher layer builds on the types defined here:
//! - [`NodeId`], the tagged node-identifier union used both as object
//!   references and as service type tags
//! - [`ServiceKind`] and [`resolve`], which turn a decoded type tag into a
//!   dispatchable kind (or [`ServiceKind::Invalid`])
//! - [`DateTime`] and the [`Clock`] seam producing protocol timestamps
//! - [`BinaryEncode`] / [`BinaryDecode`], the little-endian primitive codec

pub mod clock;
pub mod encoding;
pub mod error;
pub mod guid;
pub mod node_id;
pub mod reference;
pub mod service;
pub mod status;

pub use clock::{Clock, DateTime, FixedClock, SystemClock, EPOCH_OFFSET_SECS, TICKS_PER_SECOND};
pub use encoding::{BinaryDecode, BinaryEncode};
pub use error::{EncodingError, Result};
pub use guid::Guid;
pub use node_id::{Identifier, NodeId, NodeIdEncoding};
pub use reference::ReferenceId;
pub use service::{resolve, ServiceKind};
pub use status::StatusCode;
