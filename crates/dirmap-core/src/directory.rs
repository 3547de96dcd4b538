//! Directory-search collaborator contract.
//!
//! The engine runs against anything implementing [`DirectoryService`]: a
//! live LDAP channel in production, an in-memory fixture in tests. The
//! service owns connection lifecycle and caching; the engine only borrows
//! it per call.

use async_trait::async_trait;
use std::collections::HashMap;
use uuid::Uuid;

use crate::error::DirectoryError;
use crate::sid::SecurityIdentifier;

/// Attribute holding a principal's security identifier.
pub const ATTR_OBJECT_SID: &str = "objectSid";

/// Attribute holding a principal's account-type code.
pub const ATTR_ACCOUNT_TYPE: &str = "sAMAccountType";

/// Attribute holding a principal's object GUID.
pub const ATTR_OBJECT_GUID: &str = "objectGUID";

/// The attributes every mapping search requests.
pub const MAPPING_ATTRS: [&str; 3] = [ATTR_ACCOUNT_TYPE, ATTR_OBJECT_SID, ATTR_OBJECT_GUID];

/// One opaque directory search result.
///
/// Attribute values arrive as text or as raw octets depending on the
/// directory schema; both maps are keyed by attribute name.
#[derive(Debug, Clone, Default)]
pub struct DirectoryEntry {
    /// Distinguished name of the entry.
    pub dn: String,
    /// Textual attribute values.
    pub attrs: HashMap<String, Vec<String>>,
    /// Binary attribute values.
    pub bin_attrs: HashMap<String, Vec<Vec<u8>>>,
}

impl DirectoryEntry {
    /// Create an empty entry with the given distinguished name.
    pub fn new(dn: impl Into<String>) -> Self {
        Self {
            dn: dn.into(),
            ..Default::default()
        }
    }

    /// Add a textual attribute value.
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.entry(name.into()).or_default().push(value.into());
        self
    }

    /// Add a binary attribute value.
    pub fn with_bin_attr(mut self, name: impl Into<String>, value: Vec<u8>) -> Self {
        self.bin_attrs.entry(name.into()).or_default().push(value);
        self
    }

    /// First textual value of an attribute.
    pub fn first(&self, name: &str) -> Option<&str> {
        self.attrs.get(name)?.first().map(String::as_str)
    }

    /// First binary value of an attribute.
    pub fn first_bin(&self, name: &str) -> Option<&[u8]> {
        self.bin_attrs.get(name)?.first().map(Vec::as_slice)
    }
}

/// A finite, forward-only set of search results.
///
/// Consumed by iteration; re-reading requires a fresh search.
#[derive(Debug, Default)]
pub struct SearchReply {
    entries: Vec<DirectoryEntry>,
}

impl SearchReply {
    /// Wrap a list of result entries.
    pub fn new(entries: Vec<DirectoryEntry>) -> Self {
        Self { entries }
    }

    /// Number of result entries.
    pub fn count(&self) -> usize {
        self.entries.len()
    }

    /// Whether the reply holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl IntoIterator for SearchReply {
    type Item = DirectoryEntry;
    type IntoIter = std::vec::IntoIter<DirectoryEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// The directory-search channel the mapping engine runs against.
#[async_trait]
pub trait DirectoryService: Send + Sync {
    /// Whether the subsystem is known to be offline. Cheap; performs no I/O.
    fn is_offline(&self) -> bool;

    /// Execute one bounded query and return its results.
    async fn search(
        &self,
        filter: &str,
        attributes: &[&str],
    ) -> Result<SearchReply, DirectoryError>;

    /// Decode a principal's security identifier from an entry.
    ///
    /// Absence or a malformed value yields `None`, never an error.
    fn decode_object_ref(&self, entry: &DirectoryEntry) -> Option<SecurityIdentifier> {
        match entry.first_bin(ATTR_OBJECT_SID) {
            Some(raw) => SecurityIdentifier::from_bytes(raw),
            None => entry.first(ATTR_OBJECT_SID)?.parse().ok(),
        }
    }

    /// Decode the account-type code from an entry.
    fn decode_type_code(&self, entry: &DirectoryEntry) -> Option<u32> {
        entry.first(ATTR_ACCOUNT_TYPE)?.parse().ok()
    }

    /// Decode the object GUID from an entry.
    ///
    /// The directory stores GUIDs in little-endian group order; textual
    /// values are accepted as a fallback for non-binary schemas.
    fn decode_guid(&self, entry: &DirectoryEntry) -> Option<Uuid> {
        match entry.first_bin(ATTR_OBJECT_GUID) {
            Some(raw) => {
                let bytes: [u8; 16] = raw.try_into().ok()?;
                Some(Uuid::from_bytes_le(bytes))
            }
            None => entry.first(ATTR_OBJECT_GUID)?.parse().ok(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DirectoryError;

    struct Decoders;

    #[async_trait]
    impl DirectoryService for Decoders {
        fn is_offline(&self) -> bool {
            false
        }

        async fn search(
            &self,
            _filter: &str,
            _attributes: &[&str],
        ) -> Result<SearchReply, DirectoryError> {
            Ok(SearchReply::default())
        }
    }

    #[test]
    fn decodes_sid_from_binary_and_text() {
        let sid: SecurityIdentifier = "S-1-5-32-544".parse().unwrap();

        let binary = DirectoryEntry::new("cn=admins")
            .with_bin_attr(ATTR_OBJECT_SID, sid.to_bytes());
        assert_eq!(Decoders.decode_object_ref(&binary), Some(sid.clone()));

        let textual = DirectoryEntry::new("cn=admins").with_attr(ATTR_OBJECT_SID, "S-1-5-32-544");
        assert_eq!(Decoders.decode_object_ref(&textual), Some(sid));

        let absent = DirectoryEntry::new("cn=admins");
        assert_eq!(Decoders.decode_object_ref(&absent), None);

        let garbage =
            DirectoryEntry::new("cn=admins").with_bin_attr(ATTR_OBJECT_SID, vec![0xff; 3]);
        assert_eq!(Decoders.decode_object_ref(&garbage), None);
    }

    #[test]
    fn decodes_type_code() {
        let entry = DirectoryEntry::new("cn=user").with_attr(ATTR_ACCOUNT_TYPE, "805306368");
        assert_eq!(Decoders.decode_type_code(&entry), Some(0x3000_0000));

        let unparseable = DirectoryEntry::new("cn=user").with_attr(ATTR_ACCOUNT_TYPE, "not-a-code");
        assert_eq!(Decoders.decode_type_code(&unparseable), None);
    }

    #[test]
    fn decodes_guid_from_wire_order() {
        let guid: Uuid = "aabbccdd-eeff-0011-2233-445566778899".parse().unwrap();
        let entry = DirectoryEntry::new("cn=user")
            .with_bin_attr(ATTR_OBJECT_GUID, guid.to_bytes_le().to_vec());
        assert_eq!(Decoders.decode_guid(&entry), Some(guid));

        let short = DirectoryEntry::new("cn=user").with_bin_attr(ATTR_OBJECT_GUID, vec![1, 2, 3]);
        assert_eq!(Decoders.decode_guid(&short), None);
    }

    #[test]
    fn reply_is_counted_then_consumed() {
        let reply = SearchReply::new(vec![
            DirectoryEntry::new("cn=a"),
            DirectoryEntry::new("cn=b"),
        ]);
        assert_eq!(reply.count(), 2);
        assert!(!reply.is_empty());
        let dns: Vec<String> = reply.into_iter().map(|e| e.dn).collect();
        assert_eq!(dns, vec!["cn=a", "cn=b"]);
    }
}
