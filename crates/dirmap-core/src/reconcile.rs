//! Reconciliation of search replies onto request chunks.
//!
//! Every reply entry is decoded, classified, and correlated back to the
//! request that asked for it; entries that fail any step are dropped and
//! logged, never turned into batch failures. Correlation uses an index
//! built once per chunk, keyed by object reference or by (kind, id).

use std::collections::HashMap;
use tracing::{debug, warn};

use crate::derive::derive_id;
use crate::directory::{DirectoryEntry, DirectoryService, SearchReply};
use crate::request::MappingRequest;
use crate::sid::SecurityIdentifier;
use crate::types::{classify_type_code, IdKind, MappingStatus, UnixId};

/// Fold one reply into a chunk resolved in the identifier→object direction.
///
/// Results correlate by (kind, derived id); on a match the request gains
/// its object reference and becomes `Mapped`.
pub fn reconcile_ids<D: DirectoryService + ?Sized>(
    directory: &D,
    chunk: &mut [MappingRequest],
    reply: SearchReply,
) {
    let mut index: HashMap<(IdKind, u32), usize> = HashMap::with_capacity(chunk.len());
    for (pos, request) in chunk.iter().enumerate() {
        if let Some(id) = request.id {
            index.entry((id.kind(), id.value())).or_insert(pos);
        }
    }

    for entry in reply {
        let Some((sid, kind)) = decode_and_classify(directory, &entry) else {
            continue;
        };
        let Some(guid) = directory.decode_guid(&entry) else {
            debug!(%sid, "result entry carries no decodable GUID");
            continue;
        };
        let id = derive_id(&guid);
        let Some(&pos) = index.get(&(kind, id)) else {
            warn!(%sid, id, "directory result does not match any requested identifier");
            continue;
        };
        let request = &mut chunk[pos];
        request.object_ref = Some(sid);
        request.status = MappingStatus::Mapped;
        debug!(id, ?kind, "mapped identifier to directory object");
    }
}

/// Fold one reply into a chunk resolved in the object→identifier direction.
///
/// Results correlate by security identifier; on a match the request gains
/// its derived identifier and becomes `Mapped`.
pub fn reconcile_objects<D: DirectoryService + ?Sized>(
    directory: &D,
    chunk: &mut [MappingRequest],
    reply: SearchReply,
) {
    let mut index: HashMap<SecurityIdentifier, usize> = HashMap::with_capacity(chunk.len());
    for (pos, request) in chunk.iter().enumerate() {
        if let Some(object_ref) = &request.object_ref {
            index.entry(object_ref.clone()).or_insert(pos);
        }
    }

    for entry in reply {
        let Some((sid, kind)) = decode_and_classify(directory, &entry) else {
            continue;
        };
        let Some(&pos) = index.get(&sid) else {
            warn!(%sid, "directory returned an object that was not requested");
            continue;
        };
        let Some(guid) = directory.decode_guid(&entry) else {
            debug!(%sid, "result entry carries no decodable GUID");
            continue;
        };
        let id = derive_id(&guid);
        let request = &mut chunk[pos];
        request.id = Some(UnixId::new(kind, id));
        request.status = MappingStatus::Mapped;
        debug!(%sid, id, ?kind, "mapped directory object to identifier");
    }
}

/// Shared decode prefix: object reference, type code, category. `None`
/// skips the entry.
fn decode_and_classify<D: DirectoryService + ?Sized>(
    directory: &D,
    entry: &DirectoryEntry,
) -> Option<(SecurityIdentifier, IdKind)> {
    let Some(sid) = directory.decode_object_ref(entry) else {
        debug!(dn = %entry.dn, "result entry carries no decodable security identifier");
        return None;
    };
    let Some(code) = directory.decode_type_code(entry) else {
        debug!(dn = %entry.dn, "result entry carries no account-type code");
        return None;
    };
    let Some(kind) = classify_type_code(code) else {
        debug!(dn = %entry.dn, type_code = code, "unrecognized account-type category");
        return None;
    };
    Some((sid, kind))
}
