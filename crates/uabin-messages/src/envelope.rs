//! Request and response headers shared by every service envelope.

use bytes::{Buf, BufMut, Bytes};
use serde::{Deserialize, Serialize};
use uabin_types::{
    BinaryDecode, BinaryEncode, Clock, DateTime, EncodingError, NodeId, StatusCode, SystemClock,
};

/// Deepest chain of inner diagnostics accepted when decoding.
pub const MAX_DIAGNOSTIC_DEPTH: usize = 100;

const ENCODING_NONE: u8 = 0x00;
const ENCODING_BINARY: u8 = 0x01;
const ENCODING_XML: u8 = 0x02;

/// Encoded payload of an [`ExtensionObject`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExtensionBody {
    #[default]
    None,
    Binary(Bytes),
    Xml(String),
}

/// A type id followed by an opaque, already-encoded body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionObject {
    pub type_id: NodeId,
    pub body: ExtensionBody,
}

impl ExtensionObject {
    /// Null object: null type id, no body.
    pub fn null() -> Self {
        Self::default()
    }

    pub fn binary(type_id: NodeId, body: impl Into<Bytes>) -> Self {
        Self {
            type_id,
            body: ExtensionBody::Binary(body.into()),
        }
    }

    pub fn is_null(&self) -> bool {
        self.type_id.is_null() && self.body == ExtensionBody::None
    }
}

impl BinaryEncode for ExtensionObject {
    fn byte_len(&self) -> usize {
        let body = match &self.body {
            ExtensionBody::None => 0,
            ExtensionBody::Binary(bytes) => bytes.byte_len(),
            ExtensionBody::Xml(xml) => xml.byte_len(),
        };
        self.type_id.byte_len() + 1 + body
    }

    fn encode<B: BufMut>(&self, buf: &mut B) -> uabin_types::Result<()> {
        self.type_id.encode(buf)?;
        match &self.body {
            ExtensionBody::None => ENCODING_NONE.encode(buf),
            ExtensionBody::Binary(bytes) => {
                ENCODING_BINARY.encode(buf)?;
                bytes.encode(buf)
            }
            ExtensionBody::Xml(xml) => {
                ENCODING_XML.encode(buf)?;
                xml.encode(buf)
            }
        }
    }
}

impl BinaryDecode for ExtensionObject {
    fn decode<B: Buf>(buf: &mut B) -> uabin_types::Result<Self> {
        let type_id = NodeId::decode(buf)?;
        let body = match u8::decode(buf)? {
            ENCODING_NONE => ExtensionBody::None,
            ENCODING_BINARY => ExtensionBody::Binary(Bytes::decode(buf)?),
            ENCODING_XML => ExtensionBody::Xml(String::decode(buf)?),
            other => {
                return Err(EncodingError::InvalidEnumValue {
                    name: "ExtensionObject encoding",
                    value: u32::from(other),
                })
            }
        };
        Ok(Self { type_id, body })
    }
}

const HAS_SYMBOLIC_ID: u8 = 0x01;
const HAS_NAMESPACE_URI: u8 = 0x02;
const HAS_LOCALIZED_TEXT: u8 = 0x04;
const HAS_LOCALE: u8 = 0x08;
const HAS_ADDITIONAL_INFO: u8 = 0x10;
const HAS_INNER_STATUS_CODE: u8 = 0x20;
const HAS_INNER_DIAGNOSTIC_INFO: u8 = 0x40;

/// Vendor diagnostics attached to a response.
///
/// The integer fields index into the response header's string table. Each
/// field is present on the wire only if its bit is set in the leading mask
/// byte, so an empty value costs one byte.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticInfo {
    pub symbolic_id: Option<i32>,
    pub namespace_uri: Option<i32>,
    pub locale: Option<i32>,
    pub localized_text: Option<i32>,
    pub additional_info: Option<String>,
    pub inner_status_code: Option<StatusCode>,
    pub inner_diagnostic_info: Option<Box<DiagnosticInfo>>,
}

impl DiagnosticInfo {
    pub fn is_empty(&self) -> bool {
        self.mask() == 0
    }

    fn mask(&self) -> u8 {
        let mut mask = 0;
        if self.symbolic_id.is_some() {
            mask |= HAS_SYMBOLIC_ID;
        }
        if self.namespace_uri.is_some() {
            mask |= HAS_NAMESPACE_URI;
        }
        if self.localized_text.is_some() {
            mask |= HAS_LOCALIZED_TEXT;
        }
        if self.locale.is_some() {
            mask |= HAS_LOCALE;
        }
        if self.additional_info.is_some() {
            mask |= HAS_ADDITIONAL_INFO;
        }
        if self.inner_status_code.is_some() {
            mask |= HAS_INNER_STATUS_CODE;
        }
        if self.inner_diagnostic_info.is_some() {
            mask |= HAS_INNER_DIAGNOSTIC_INFO;
        }
        mask
    }

    fn decode_nested<B: Buf>(buf: &mut B, depth: usize) -> uabin_types::Result<Self> {
        if depth > MAX_DIAGNOSTIC_DEPTH {
            return Err(EncodingError::NestingTooDeep {
                max: MAX_DIAGNOSTIC_DEPTH,
            });
        }

        let mask = u8::decode(buf)?;
        let mut info = DiagnosticInfo::default();
        if mask & HAS_SYMBOLIC_ID != 0 {
            info.symbolic_id = Some(i32::decode(buf)?);
        }
        if mask & HAS_NAMESPACE_URI != 0 {
            info.namespace_uri = Some(i32::decode(buf)?);
        }
        if mask & HAS_LOCALE != 0 {
            info.locale = Some(i32::decode(buf)?);
        }
        if mask & HAS_LOCALIZED_TEXT != 0 {
            info.localized_text = Some(i32::decode(buf)?);
        }
        if mask & HAS_ADDITIONAL_INFO != 0 {
            info.additional_info = Some(String::decode(buf)?);
        }
        if mask & HAS_INNER_STATUS_CODE != 0 {
            info.inner_status_code = Some(StatusCode::decode(buf)?);
        }
        if mask & HAS_INNER_DIAGNOSTIC_INFO != 0 {
            info.inner_diagnostic_info = Some(Box::new(Self::decode_nested(buf, depth + 1)?));
        }
        Ok(info)
    }
}

impl BinaryEncode for DiagnosticInfo {
    fn byte_len(&self) -> usize {
        let ints = [
            self.symbolic_id,
            self.namespace_uri,
            self.locale,
            self.localized_text,
        ]
        .iter()
        .filter(|field| field.is_some())
        .count();

        1 + ints * 4
            + self.additional_info.as_ref().map_or(0, BinaryEncode::byte_len)
            + self.inner_status_code.map_or(0, |code| code.byte_len())
            + self
                .inner_diagnostic_info
                .as_ref()
                .map_or(0, |inner| inner.byte_len())
    }

    fn encode<B: BufMut>(&self, buf: &mut B) -> uabin_types::Result<()> {
        self.mask().encode(buf)?;
        // Wire order differs from mask bit order: locale precedes localized text.
        for value in [
            self.symbolic_id,
            self.namespace_uri,
            self.locale,
            self.localized_text,
        ]
        .into_iter()
        .flatten()
        {
            value.encode(buf)?;
        }
        if let Some(info) = &self.additional_info {
            info.encode(buf)?;
        }
        if let Some(code) = self.inner_status_code {
            code.encode(buf)?;
        }
        if let Some(inner) = &self.inner_diagnostic_info {
            inner.encode(buf)?;
        }
        Ok(())
    }
}

impl BinaryDecode for DiagnosticInfo {
    fn decode<B: Buf>(buf: &mut B) -> uabin_types::Result<Self> {
        Self::decode_nested(buf, 0)
    }
}

/// Header carried at the start of every request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestHeader {
    /// Null until a session is activated.
    pub session_authentication_token: NodeId,
    pub utc_time: DateTime,
    pub request_handle: u32,
    /// Bit mask of the diagnostics the server should return.
    pub return_diagnostics: u32,
    pub audit_entry_id: String,
    /// Milliseconds; `0` = no timeout.
    pub timeout: u32,
    pub additional_header: ExtensionObject,
}

impl RequestHeader {
    /// Header stamped with the current wall-clock time.
    pub fn new() -> Self {
        Self::with_clock(&SystemClock)
    }

    pub fn with_clock(clock: &impl Clock) -> Self {
        Self {
            session_authentication_token: NodeId::null(),
            utc_time: clock.now(),
            request_handle: 0,
            return_diagnostics: 0,
            audit_entry_id: String::new(),
            timeout: 0,
            additional_header: ExtensionObject::null(),
        }
    }
}

impl Default for RequestHeader {
    fn default() -> Self {
        Self::new()
    }
}

impl BinaryEncode for RequestHeader {
    fn byte_len(&self) -> usize {
        self.session_authentication_token.byte_len()
            + self.utc_time.byte_len()
            + 4
            + 4
            + self.audit_entry_id.byte_len()
            + 4
            + self.additional_header.byte_len()
    }

    fn encode<B: BufMut>(&self, buf: &mut B) -> uabin_types::Result<()> {
        self.session_authentication_token.encode(buf)?;
        self.utc_time.encode(buf)?;
        self.request_handle.encode(buf)?;
        self.return_diagnostics.encode(buf)?;
        self.audit_entry_id.encode(buf)?;
        self.timeout.encode(buf)?;
        self.additional_header.encode(buf)
    }
}

impl BinaryDecode for RequestHeader {
    fn decode<B: Buf>(buf: &mut B) -> uabin_types::Result<Self> {
        Ok(Self {
            session_authentication_token: NodeId::decode(buf)?,
            utc_time: DateTime::decode(buf)?,
            request_handle: u32::decode(buf)?,
            return_diagnostics: u32::decode(buf)?,
            audit_entry_id: String::decode(buf)?,
            timeout: u32::decode(buf)?,
            additional_header: ExtensionObject::decode(buf)?,
        })
    }
}

/// Header carried at the start of every response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseHeader {
    pub timestamp: DateTime,
    /// Echo of the request's handle.
    pub request_handle: u32,
    pub service_result: StatusCode,
    pub service_diagnostics: DiagnosticInfo,
    pub string_table: Vec<String>,
    pub additional_header: ExtensionObject,
}

impl ResponseHeader {
    /// Successful header stamped with the current wall-clock time.
    pub fn new() -> Self {
        Self::with_clock(&SystemClock)
    }

    pub fn with_clock(clock: &impl Clock) -> Self {
        Self {
            timestamp: clock.now(),
            request_handle: 0,
            service_result: StatusCode::GOOD,
            service_diagnostics: DiagnosticInfo::default(),
            string_table: Vec::new(),
            additional_header: ExtensionObject::null(),
        }
    }

    /// Header answering `request`, echoing its handle.
    pub fn for_request(request: &RequestHeader, clock: &impl Clock) -> Self {
        Self {
            request_handle: request.request_handle,
            ..Self::with_clock(clock)
        }
    }
}

impl Default for ResponseHeader {
    fn default() -> Self {
        Self::new()
    }
}

impl BinaryEncode for ResponseHeader {
    fn byte_len(&self) -> usize {
        self.timestamp.byte_len()
            + 4
            + self.service_result.byte_len()
            + self.service_diagnostics.byte_len()
            + self.string_table.byte_len()
            + self.additional_header.byte_len()
    }

    fn encode<B: BufMut>(&self, buf: &mut B) -> uabin_types::Result<()> {
        self.timestamp.encode(buf)?;
        self.request_handle.encode(buf)?;
        self.service_result.encode(buf)?;
        self.service_diagnostics.encode(buf)?;
        self.string_table.encode(buf)?;
        self.additional_header.encode(buf)
    }
}

impl BinaryDecode for ResponseHeader {
    fn decode<B: Buf>(buf: &mut B) -> uabin_types::Result<Self> {
        Ok(Self {
            timestamp: DateTime::decode(buf)?,
            request_handle: u32::decode(buf)?,
            service_result: StatusCode::decode(buf)?,
            service_diagnostics: DiagnosticInfo::decode(buf)?,
            string_table: Vec::<String>::decode(buf)?,
            additional_header: ExtensionObject::decode(buf)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, SystemTime};

    use bytes::BytesMut;
    use uabin_types::{FixedClock, Identifier};

    use super::*;

    fn clock() -> FixedClock {
        FixedClock::at(SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000))
    }

    fn encoded<T: BinaryEncode>(value: &T) -> BytesMut {
        let mut buf = BytesMut::new();
        value.encode(&mut buf).unwrap();
        assert_eq!(buf.len(), value.byte_len());
        buf
    }

    #[test]
    fn request_header_defaults() {
        let header = RequestHeader::with_clock(&clock());
        assert_eq!(header.session_authentication_token, NodeId::default());
        assert_eq!(
            header.session_authentication_token.identifier(),
            &Identifier::TwoByte(0)
        );
        assert_eq!(header.additional_header.type_id, NodeId::default());
        assert_eq!(header.utc_time, clock().now());
        assert_eq!(header.request_handle, 0);
        assert_eq!(header.timeout, 0);
    }

    #[test]
    fn request_header_stamps_wall_clock() {
        let before = DateTime::now();
        let header = RequestHeader::new();
        let after = DateTime::now();
        assert!(before <= header.utc_time && header.utc_time <= after);
    }

    #[test]
    fn response_header_defaults_to_good() {
        let header = ResponseHeader::with_clock(&clock());
        assert_eq!(header.service_result, StatusCode::GOOD);
        assert!(header.service_diagnostics.is_empty());
        assert_eq!(header.timestamp, clock().now());
    }

    #[test]
    fn response_echoes_request_handle() {
        let mut request = RequestHeader::with_clock(&clock());
        request.request_handle = 77;
        let response = ResponseHeader::for_request(&request, &clock());
        assert_eq!(response.request_handle, 77);
    }

    #[test]
    fn default_request_header_layout() {
        let header = RequestHeader::with_clock(&clock());
        let buf = encoded(&header);

        // token (2) + time (8) + handle (4) + diagnostics (4) + audit (4)
        // + timeout (4) + additional header (2 + 1)
        assert_eq!(buf.len(), 29);
        assert_eq!(&buf[..2], &[0x00, 0x00]);
        assert_eq!(&buf[2..10], &clock().now().ticks().to_le_bytes());

        let mut slice = &buf[..];
        assert_eq!(RequestHeader::decode(&mut slice).unwrap(), header);
        assert!(slice.is_empty());
    }

    #[test]
    fn response_header_decodes() {
        let mut header = ResponseHeader::with_clock(&clock());
        header.service_result = StatusCode::BAD_SERVICE_UNSUPPORTED;
        header.string_table = vec!["vendor".into(), "detail".into()];
        header.service_diagnostics = DiagnosticInfo {
            symbolic_id: Some(0),
            localized_text: Some(1),
            ..DiagnosticInfo::default()
        };

        let buf = encoded(&header);
        let mut slice = &buf[..];
        assert_eq!(ResponseHeader::decode(&mut slice).unwrap(), header);
    }

    #[test]
    fn diagnostic_locale_precedes_localized_text() {
        let info = DiagnosticInfo {
            locale: Some(3),
            localized_text: Some(4),
            ..DiagnosticInfo::default()
        };
        let buf = encoded(&info);
        assert_eq!(buf[0], HAS_LOCALE | HAS_LOCALIZED_TEXT);
        assert_eq!(&buf[1..5], &3i32.to_le_bytes());
        assert_eq!(&buf[5..9], &4i32.to_le_bytes());
    }

    #[test]
    fn nested_diagnostics() {
        let info = DiagnosticInfo {
            additional_info: Some("outer".into()),
            inner_status_code: Some(StatusCode::BAD_DECODING_ERROR),
            inner_diagnostic_info: Some(Box::new(DiagnosticInfo {
                symbolic_id: Some(9),
                ..DiagnosticInfo::default()
            })),
            ..DiagnosticInfo::default()
        };
        let buf = encoded(&info);
        let mut slice = &buf[..];
        assert_eq!(DiagnosticInfo::decode(&mut slice).unwrap(), info);
    }

    #[test]
    fn diagnostics_depth_is_bounded() {
        // Every byte sets only the inner-diagnostics bit.
        let buf = vec![HAS_INNER_DIAGNOSTIC_INFO; MAX_DIAGNOSTIC_DEPTH + 2];
        let mut slice = &buf[..];
        assert_eq!(
            DiagnosticInfo::decode(&mut slice).unwrap_err(),
            EncodingError::NestingTooDeep {
                max: MAX_DIAGNOSTIC_DEPTH
            }
        );
    }

    #[test]
    fn extension_object_bodies() {
        let binary = ExtensionObject::binary(NodeId::numeric(0, 1), &b"\x01\x02"[..]);
        let xml = ExtensionObject {
            type_id: NodeId::numeric(0, 2),
            body: ExtensionBody::Xml("<a/>".into()),
        };
        for object in [ExtensionObject::null(), binary, xml] {
            let buf = encoded(&object);
            let mut slice = &buf[..];
            assert_eq!(ExtensionObject::decode(&mut slice).unwrap(), object);
        }
        assert!(ExtensionObject::null().is_null());
    }

    #[test]
    fn extension_object_rejects_unknown_encoding() {
        let mut slice = &[0x00, 0x00, 0x07][..];
        assert!(matches!(
            ExtensionObject::decode(&mut slice),
            Err(EncodingError::InvalidEnumValue { value: 7, .. })
        ));
    }
}
