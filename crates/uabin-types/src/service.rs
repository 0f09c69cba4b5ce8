//! Known service message kinds and the type-id resolver.
//!
//! The kind ↔ discriminant mapping is generated from a single table, so the
//! direction that stamps an envelope's type id and the direction that
//! resolves it cannot disagree.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::node_id::{Identifier, NodeId};

macro_rules! service_kinds {
    ($($(#[$doc:meta])* $kind:ident = $value:literal, $name:literal;)*) => {
        /// Closed set of service messages this layer can dispatch.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[repr(u16)]
        pub enum ServiceKind {
            /// Sentinel for identifiers that are not a known service.
            Invalid = 0,
            $($(#[$doc])* $kind = $value,)*
        }

        impl ServiceKind {
            /// Every known kind, excluding [`ServiceKind::Invalid`].
            pub const ALL: &'static [ServiceKind] = &[$(ServiceKind::$kind,)*];

            /// Numeric binary-encoding id of the message.
            pub const fn type_id_value(self) -> u16 {
                self as u16
            }

            /// Kind for a numeric id, or [`ServiceKind::Invalid`].
            pub const fn from_type_id_value(value: u16) -> ServiceKind {
                match value {
                    $($value => ServiceKind::$kind,)*
                    _ => ServiceKind::Invalid,
                }
            }

            /// Human-readable message name.
            pub const fn name(self) -> &'static str {
                match self {
                    ServiceKind::Invalid => "Invalid",
                    $(ServiceKind::$kind => $name,)*
                }
            }
        }
    };
}

service_kinds! {
    GetEndpointsRequest = 0x01AC, "GetEndpointsRequest";
    GetEndpointsResponse = 0x01AF, "GetEndpointsResponse";
    OpenSecureChannelRequest = 0x01BE, "OpenSecureChannelRequest";
    OpenSecureChannelResponse = 0x01C1, "OpenSecureChannelResponse";
    CloseSecureChannelRequest = 0x01C4, "CloseSecureChannelRequest";
    CreateSessionRequest = 0x01CD, "CreateSessionRequest";
    CreateSessionResponse = 0x01D0, "CreateSessionResponse";
    ActivateSessionRequest = 0x01D3, "ActivateSessionRequest";
    ActivateSessionResponse = 0x01D6, "ActivateSessionResponse";
    CloseSessionRequest = 0x01D9, "CloseSessionRequest";
    CloseSessionResponse = 0x01DC, "CloseSessionResponse";
    BrowseRequest = 0x020F, "BrowseRequest";
    BrowseResponse = 0x0212, "BrowseResponse";
    BrowseNextRequest = 0x0215, "BrowseNextRequest";
    BrowseNextResponse = 0x0218, "BrowseNextResponse";
    ReadRequest = 0x0277, "ReadRequest";
    ReadResponse = 0x027A, "ReadResponse";
    WriteRequest = 0x02A1, "WriteRequest";
    WriteResponse = 0x02A4, "WriteResponse";
}

impl ServiceKind {
    /// Returns false only for [`ServiceKind::Invalid`].
    pub fn is_valid(self) -> bool {
        self != ServiceKind::Invalid
    }
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<ServiceKind> for NodeId {
    /// Four-byte identifier in namespace 0 carrying the service discriminant.
    fn from(kind: ServiceKind) -> Self {
        NodeId::four_byte(0, kind.type_id_value())
    }
}

/// Resolve a decoded type id to a known service kind.
///
/// Anything other than a local, four-byte identifier in namespace 0 whose
/// value is one of the known discriminants resolves to
/// [`ServiceKind::Invalid`]. This is stricter than matching on the encoding
/// and value alone: a four-byte id in another namespace, or one carrying a
/// server index or namespace URI, never names a service.
pub fn resolve(id: &NodeId) -> ServiceKind {
    let value = match id.identifier() {
        Identifier::FourByte {
            namespace: 0,
            value,
        } if id.server_index() == 0 && id.namespace_uri().is_none() => *value,
        _ => {
            trace!(type_id = %id, encoding = ?id.encoding(), "type id is not a local four-byte id");
            return ServiceKind::Invalid;
        }
    };

    let kind = ServiceKind::from_type_id_value(value);
    if !kind.is_valid() {
        trace!(value, "unknown service discriminant");
    }
    kind
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::node_id::NodeIdEncoding;

    #[test]
    fn nineteen_known_kinds() {
        assert_eq!(ServiceKind::ALL.len(), 19);
        assert!(!ServiceKind::ALL.contains(&ServiceKind::Invalid));
    }

    #[test]
    fn every_kind_round_trips_through_node_id() {
        for &kind in ServiceKind::ALL {
            let id = NodeId::from(kind);
            assert_eq!(id.encoding(), NodeIdEncoding::FourByte);
            assert_eq!(resolve(&id), kind, "{kind}");
        }
    }

    #[test]
    fn discriminants_match_binary_encoding_ids() {
        assert_eq!(ServiceKind::GetEndpointsRequest.type_id_value(), 428);
        assert_eq!(ServiceKind::OpenSecureChannelRequest.type_id_value(), 446);
        assert_eq!(ServiceKind::OpenSecureChannelResponse.type_id_value(), 449);
        assert_eq!(ServiceKind::CloseSecureChannelRequest.type_id_value(), 452);
        assert_eq!(ServiceKind::ActivateSessionRequest.type_id_value(), 467);
        assert_eq!(ServiceKind::BrowseNextResponse.type_id_value(), 536);
        assert_eq!(ServiceKind::ReadRequest.type_id_value(), 631);
        assert_eq!(ServiceKind::WriteResponse.type_id_value(), 676);
    }

    #[test]
    fn zero_four_byte_id_is_invalid() {
        assert_eq!(resolve(&NodeId::four_byte(0, 0)), ServiceKind::Invalid);
        assert_eq!(resolve(&NodeId::from(ServiceKind::Invalid)), ServiceKind::Invalid);
    }

    #[test]
    fn same_value_in_other_encodings_is_invalid() {
        let value = ServiceKind::ReadRequest.type_id_value();
        assert_eq!(resolve(&NodeId::numeric(0, u32::from(value))), ServiceKind::Invalid);
        assert_eq!(resolve(&NodeId::two_byte(0)), ServiceKind::Invalid);
        assert_eq!(
            resolve(&NodeId::string(0, value.to_string())),
            ServiceKind::Invalid
        );
    }

    #[test]
    fn non_zero_namespace_or_remote_server_is_invalid() {
        let value = ServiceKind::ReadRequest.type_id_value();
        assert_eq!(resolve(&NodeId::four_byte(1, value)), ServiceKind::Invalid);
        assert_eq!(
            resolve(&NodeId::four_byte(0, value).with_server_index(1)),
            ServiceKind::Invalid
        );
        assert_eq!(
            resolve(&NodeId::four_byte(0, value).with_namespace_uri("urn:vendor")),
            ServiceKind::Invalid
        );
    }

    #[test]
    fn names() {
        assert_eq!(ServiceKind::BrowseRequest.to_string(), "BrowseRequest");
        assert_eq!(ServiceKind::Invalid.name(), "Invalid");
    }

    proptest! {
        #[test]
        fn unknown_four_byte_values_resolve_invalid(value in any::<u16>()) {
            let id = NodeId::four_byte(0, value);
            let kind = resolve(&id);
            if ServiceKind::ALL.iter().any(|k| k.type_id_value() == value) {
                prop_assert_eq!(kind.type_id_value(), value);
            } else {
                prop_assert_eq!(kind, ServiceKind::Invalid);
            }
        }

        #[test]
        fn numeric_ids_never_resolve(namespace in any::<u16>(), value in any::<u32>()) {
            prop_assert_eq!(resolve(&NodeId::numeric(namespace, value)), ServiceKind::Invalid);
        }

        #[test]
        fn two_byte_ids_never_resolve(value in any::<u8>()) {
            prop_assert_eq!(resolve(&NodeId::two_byte(value)), ServiceKind::Invalid);
        }
    }
}
