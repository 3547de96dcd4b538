//! The unit of work for batch resolution.

use serde::{Deserialize, Serialize};

use crate::sid::SecurityIdentifier;
use crate::types::{MappingStatus, UnixId};

/// One identifier-mapping request.
///
/// Carries whichever sides of the mapping the caller already knows; the
/// engine fills in the missing side and settles the status. A request list
/// is owned by the caller and mutated in place for exactly one engine call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingRequest {
    /// The directory principal, when known.
    pub object_ref: Option<SecurityIdentifier>,
    /// The unix-style identifier, when known.
    pub id: Option<UnixId>,
    /// Resolution state; authoritative once an engine call returns.
    #[serde(default)]
    pub status: MappingStatus,
}

impl MappingRequest {
    /// Request refresh of the directory object behind a known identifier.
    ///
    /// The object reference is the query key in this direction too, so the
    /// principal being refreshed rides along with the identifier.
    pub fn for_id(id: UnixId, object_ref: SecurityIdentifier) -> Self {
        Self {
            object_ref: Some(object_ref),
            id: Some(id),
            status: MappingStatus::Unknown,
        }
    }

    /// Request resolution of an identifier for a known directory object.
    pub fn for_object(object_ref: SecurityIdentifier) -> Self {
        Self {
            object_ref: Some(object_ref),
            id: None,
            status: MappingStatus::Unknown,
        }
    }

    /// Whether the request resolved to a complete mapping.
    pub fn is_mapped(&self) -> bool {
        self.status == MappingStatus::Mapped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::IdKind;

    fn sid() -> SecurityIdentifier {
        "S-1-5-21-1-2-3-500".parse().unwrap()
    }

    #[test]
    fn constructors_start_unknown() {
        let by_object = MappingRequest::for_object(sid());
        assert_eq!(by_object.status, MappingStatus::Unknown);
        assert!(by_object.id.is_none());
        assert!(!by_object.is_mapped());

        let by_id = MappingRequest::for_id(UnixId::new(IdKind::Account, 500), sid());
        assert_eq!(by_id.status, MappingStatus::Unknown);
        assert_eq!(by_id.id, Some(UnixId::Account(500)));
        assert_eq!(by_id.object_ref, Some(sid()));
    }
}
