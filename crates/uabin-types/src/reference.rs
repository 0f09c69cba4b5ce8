//! Standard reference-type identifiers (namespace 0).

use serde::{Deserialize, Serialize};

use crate::node_id::NodeId;

/// Standard reference types, by numeric id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u32)]
pub enum ReferenceId {
    References = 31,
    NonHierarchicalReferences = 32,
    HierarchicalReferences = 33,
    HasChild = 34,
    Organizes = 35,
    HasEventSource = 36,
    HasModellingRule = 37,
    HasEncoding = 38,
    HasDescription = 39,
    HasTypeDefinition = 40,
    GeneratesEvent = 41,
    Aggregates = 44,
    HasSubtype = 45,
    HasProperty = 46,
    HasComponent = 47,
    HasNotifier = 48,
    HasOrderedComponent = 49,
}

impl ReferenceId {
    pub fn value(self) -> u32 {
        self as u32
    }
}

impl From<ReferenceId> for NodeId {
    /// Numeric identifier in namespace 0, regardless of how small the value is.
    fn from(reference: ReferenceId) -> Self {
        NodeId::numeric(0, reference.value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node_id::NodeIdEncoding;

    #[test]
    fn reference_ids_are_numeric() {
        for reference in [
            ReferenceId::References,
            ReferenceId::Organizes,
            ReferenceId::HasSubtype,
            ReferenceId::HasOrderedComponent,
        ] {
            let id = NodeId::from(reference);
            assert_eq!(id.encoding(), NodeIdEncoding::Numeric);
            assert_eq!(id.as_numeric().unwrap(), (0, reference.value()));
        }
    }

    #[test]
    fn small_value_still_not_two_byte() {
        let id = NodeId::from(ReferenceId::HasComponent);
        assert_ne!(id, NodeId::two_byte(47));
    }
}
