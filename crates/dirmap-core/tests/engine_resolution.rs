//! End-to-end engine behavior against an in-memory directory.

use std::sync::Mutex;

use dirmap_core::async_trait;
use dirmap_core::prelude::*;
use dirmap_core::types::{SAM_NORMAL_ACCOUNT, SAM_SECURITY_GLOBAL_GROUP};
use uuid::Uuid;

/// One principal the fixture directory knows about. Optional fields model
/// entries with missing or undecodable attributes.
struct FixtureObject {
    sid: SecurityIdentifier,
    type_code: Option<u32>,
    guid: Option<Uuid>,
}

/// In-memory directory: answers searches by matching each object's encoded
/// reference against the filter text, and records every filter it sees.
#[derive(Default)]
struct MockDirectory {
    offline: bool,
    objects: Vec<FixtureObject>,
    filters: Mutex<Vec<String>>,
    /// Fail every search after this many successful ones, when set.
    fail_after: Option<usize>,
}

impl MockDirectory {
    fn with_objects(objects: Vec<FixtureObject>) -> Self {
        Self {
            objects,
            ..Default::default()
        }
    }

    fn recorded_filters(&self) -> Vec<String> {
        self.filters.lock().unwrap().clone()
    }
}

#[async_trait]
impl DirectoryService for MockDirectory {
    fn is_offline(&self) -> bool {
        self.offline
    }

    async fn search(
        &self,
        filter: &str,
        _attributes: &[&str],
    ) -> Result<SearchReply, DirectoryError> {
        let mut filters = self.filters.lock().unwrap();
        if let Some(limit) = self.fail_after {
            if filters.len() >= limit {
                return Err(DirectoryError::search_failed("connection reset by peer"));
            }
        }
        filters.push(filter.to_string());

        let entries = self
            .objects
            .iter()
            .filter(|o| filter.contains(&format!("(objectSid={})", o.sid.ldap_encoded())))
            .map(|o| {
                let mut entry = DirectoryEntry::new("cn=fixture,dc=example,dc=com")
                    .with_bin_attr(ATTR_OBJECT_SID, o.sid.to_bytes());
                if let Some(code) = o.type_code {
                    entry = entry.with_attr(ATTR_ACCOUNT_TYPE, code.to_string());
                }
                if let Some(guid) = o.guid {
                    entry = entry.with_bin_attr(ATTR_OBJECT_GUID, guid.to_bytes_le().to_vec());
                }
                entry
            })
            .collect();
        Ok(SearchReply::new(entries))
    }
}

fn sid(rid: u32) -> SecurityIdentifier {
    SecurityIdentifier::new(1, 5, vec![21, 100, 200, rid]).unwrap()
}

fn guid(n: u32) -> Uuid {
    Uuid::from_u128((0xfeed_face_u128 << 96) | n as u128)
}

fn account(rid: u32) -> FixtureObject {
    FixtureObject {
        sid: sid(rid),
        type_code: Some(SAM_NORMAL_ACCOUNT),
        guid: Some(guid(rid)),
    }
}

fn group(rid: u32) -> FixtureObject {
    FixtureObject {
        sid: sid(rid),
        type_code: Some(SAM_SECURITY_GLOBAL_GROUP),
        guid: Some(guid(rid)),
    }
}

#[tokio::test]
async fn resolves_ids_for_objects() {
    let directory = MockDirectory::with_objects(vec![account(1000), group(512)]);
    let engine = MappingEngine::new(&directory);

    let mut requests = vec![
        MappingRequest::for_object(sid(1000)),
        MappingRequest::for_object(sid(512)),
    ];
    engine.resolve_ids_for_objects(&mut requests).await.unwrap();

    assert_eq!(requests[0].id, Some(UnixId::Account(derive_id(&guid(1000)))));
    assert!(requests[0].is_mapped());
    assert_eq!(requests[1].id, Some(UnixId::Group(derive_id(&guid(512)))));
    assert!(requests[1].is_mapped());
}

#[tokio::test]
async fn resolves_objects_for_ids() {
    let directory = MockDirectory::with_objects(vec![account(1000)]);
    let engine = MappingEngine::new(&directory);

    let derived = derive_id(&guid(1000));
    let mut requests = vec![MappingRequest::for_id(UnixId::Account(derived), sid(1000))];
    engine.resolve_objects_for_ids(&mut requests).await.unwrap();

    assert!(requests[0].is_mapped());
    assert_eq!(requests[0].object_ref, Some(sid(1000)));
    assert_eq!(requests[0].id, Some(UnixId::Account(derived)));
}

#[tokio::test]
async fn completion_invariant_holds_for_mixed_batches() {
    let directory = MockDirectory::with_objects(vec![account(1)]);
    let engine = MappingEngine::new(&directory);

    let mut requests = vec![
        MappingRequest::for_object(sid(1)),
        // Not present in the directory.
        MappingRequest::for_object(sid(2)),
        // No object reference at all.
        MappingRequest {
            object_ref: None,
            id: None,
            status: MappingStatus::Unknown,
        },
    ];
    engine.resolve_ids_for_objects(&mut requests).await.unwrap();

    for request in &requests {
        assert_ne!(request.status, MappingStatus::Unknown);
    }
    assert!(requests[0].is_mapped());
    assert_eq!(requests[1].status, MappingStatus::Unmapped);
    assert_eq!(requests[2].status, MappingStatus::Unmapped);
}

#[tokio::test]
async fn empty_batch_is_a_no_op() {
    let directory = MockDirectory::default();
    let engine = MappingEngine::new(&directory);

    let mut requests: Vec<MappingRequest> = Vec::new();
    engine.resolve_ids_for_objects(&mut requests).await.unwrap();
    engine.resolve_objects_for_ids(&mut requests).await.unwrap();
    assert!(directory.recorded_filters().is_empty());
}

#[tokio::test]
async fn offline_directory_short_circuits_without_mutation() {
    let directory = MockDirectory {
        offline: true,
        ..MockDirectory::with_objects(vec![account(1000)])
    };
    let engine = MappingEngine::new(&directory);

    let mut requests = vec![MappingRequest::for_object(sid(1000))];
    requests[0].status = MappingStatus::Mapped;
    let before = requests.clone();

    let err = engine.resolve_ids_for_objects(&mut requests).await.unwrap_err();
    assert!(matches!(err, IdmapError::ServiceUnavailable));
    assert_eq!(requests, before);
    assert!(directory.recorded_filters().is_empty());
}

#[tokio::test]
async fn unrecognized_kind_is_never_queried() {
    let directory = MockDirectory::with_objects(vec![account(1000), account(77)]);
    let engine = MappingEngine::new(&directory);

    let kindless = MappingRequest {
        object_ref: Some(sid(77)),
        id: None,
        status: MappingStatus::Unknown,
    };
    let mut requests = vec![
        MappingRequest::for_id(UnixId::Account(derive_id(&guid(1000))), sid(1000)),
        kindless,
    ];
    engine.resolve_objects_for_ids(&mut requests).await.unwrap();

    let excluded = format!("(objectSid={})", sid(77).ldap_encoded());
    for filter in directory.recorded_filters() {
        assert!(!filter.contains(&excluded));
    }
    assert!(requests[0].is_mapped());
    assert_eq!(requests[1].status, MappingStatus::Unmapped);
}

#[tokio::test]
async fn decode_failures_skip_entries_not_batches() {
    let broken = FixtureObject {
        sid: sid(2),
        type_code: None,
        guid: Some(guid(2)),
    };
    let directory = MockDirectory::with_objects(vec![account(1), broken, group(3)]);
    let engine = MappingEngine::new(&directory);

    let mut requests = vec![
        MappingRequest::for_object(sid(1)),
        MappingRequest::for_object(sid(2)),
        MappingRequest::for_object(sid(3)),
    ];
    engine.resolve_ids_for_objects(&mut requests).await.unwrap();

    assert!(requests[0].is_mapped());
    assert_eq!(requests[1].status, MappingStatus::Unmapped);
    assert!(requests[2].is_mapped());
}

#[tokio::test]
async fn search_failure_aborts_but_keeps_earlier_mappings() {
    let objects: Vec<FixtureObject> = (0..(MAX_BATCH as u32 + 1)).map(account).collect();
    let directory = MockDirectory {
        fail_after: Some(1),
        ..MockDirectory::with_objects(objects)
    };
    let engine = MappingEngine::new(&directory);

    let mut requests: Vec<MappingRequest> = (0..(MAX_BATCH as u32 + 1))
        .map(|rid| MappingRequest::for_object(sid(rid)))
        .collect();
    let err = engine.resolve_ids_for_objects(&mut requests).await.unwrap_err();
    assert!(matches!(err, IdmapError::DirectoryUnavailable(_)));

    // First chunk resolved before the failure; the rest were swept.
    for request in &requests[..MAX_BATCH] {
        assert!(request.is_mapped());
    }
    assert_eq!(requests[MAX_BATCH].status, MappingStatus::Unmapped);
}

#[tokio::test]
async fn chunking_is_transparent() {
    let total = 2 * MAX_BATCH + 1;
    // Only even-numbered principals exist in the directory.
    let objects: Vec<FixtureObject> = (0..total as u32).filter(|n| n % 2 == 0).map(account).collect();

    let whole = MockDirectory::with_objects(objects);
    let engine = MappingEngine::new(&whole);
    let mut full: Vec<MappingRequest> = (0..total as u32)
        .map(|rid| MappingRequest::for_object(sid(rid)))
        .collect();
    engine.resolve_ids_for_objects(&mut full).await.unwrap();

    let filters = whole.recorded_filters();
    assert_eq!(filters.len(), 3);
    for filter in &filters {
        assert!(filter.matches("(objectSid=").count() <= MAX_BATCH);
    }

    // The same requests resolved as three separate sub-batches.
    let mut pieces: Vec<MappingRequest> = (0..total as u32)
        .map(|rid| MappingRequest::for_object(sid(rid)))
        .collect();
    for range in [0..MAX_BATCH, MAX_BATCH..2 * MAX_BATCH, 2 * MAX_BATCH..total] {
        engine
            .resolve_ids_for_objects(&mut pieces[range])
            .await
            .unwrap();
    }

    for (a, b) in full.iter().zip(pieces.iter()) {
        assert_eq!(a.status, b.status);
        assert_eq!(a.id, b.id);
    }
}

#[tokio::test]
async fn round_trip_reproduces_the_derived_id() {
    let directory = MockDirectory::with_objects(vec![account(1000)]);
    let engine = MappingEngine::new(&directory);

    let mut forward = vec![MappingRequest::for_object(sid(1000))];
    engine.resolve_ids_for_objects(&mut forward).await.unwrap();
    let id = forward[0].id.expect("object resolved to an id");

    let mut back = vec![MappingRequest::for_id(id, sid(1000))];
    engine.resolve_objects_for_ids(&mut back).await.unwrap();

    assert!(back[0].is_mapped());
    assert_eq!(back[0].object_ref, Some(sid(1000)));
    assert_eq!(back[0].id, Some(id));
}
