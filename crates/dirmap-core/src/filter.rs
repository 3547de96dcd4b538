//! Search-filter construction for request chunks.
//!
//! Filters are plain LDAP filter strings. Object-reference values are the
//! escaped wire form produced by [`SecurityIdentifier::ldap_encoded`], so
//! no further escaping applies. Growth is checked so exhaustion surfaces
//! as [`IdmapError::AllocationFailure`] instead of aborting.

use tracing::debug;

use crate::directory::{ATTR_ACCOUNT_TYPE, ATTR_OBJECT_SID};
use crate::error::{IdmapError, IdmapResult};
use crate::request::MappingRequest;
use crate::types::{
    IdKind, SAM_INTERDOMAIN_TRUST, SAM_NORMAL_ACCOUNT, SAM_SECURITY_GLOBAL_GROUP,
    SAM_SECURITY_LOCAL_GROUP, SAM_WORKSTATION_TRUST,
};

/// Maximum number of object-reference clauses in one physical query.
pub const MAX_BATCH: usize = 200;

/// Filter for a chunk resolved in the identifier→object direction.
///
/// Account-kind and group-kind requests contribute to independent
/// fragments, each restricting the matching account-type codes to the
/// chunk's object references; a fragment is omitted when no request of
/// that kind is present. Requests without a recognized kind, or without an
/// object reference to query by, contribute nothing and are left for the
/// final sweep. Returns `Ok(None)` when the whole chunk is unqueryable.
pub fn filter_for_ids(chunk: &[MappingRequest]) -> IdmapResult<Option<String>> {
    debug_assert!(chunk.len() <= MAX_BATCH);

    let mut account_clauses = String::new();
    let mut group_clauses = String::new();
    for request in chunk {
        let (Some(id), Some(object_ref)) = (request.id, request.object_ref.as_ref()) else {
            continue;
        };
        let target = match id.kind() {
            IdKind::Account => &mut account_clauses,
            IdKind::Group => &mut group_clauses,
        };
        push_clause(target, ATTR_OBJECT_SID, &object_ref.ldap_encoded())?;
    }

    if account_clauses.is_empty() && group_clauses.is_empty() {
        return Ok(None);
    }

    let mut filter = String::new();
    try_push(&mut filter, "(|")?;
    if !account_clauses.is_empty() {
        push_fragment(&mut filter, &account_type_clauses(), &account_clauses)?;
    }
    if !group_clauses.is_empty() {
        push_fragment(&mut filter, &group_type_clauses(), &group_clauses)?;
    }
    try_push(&mut filter, ")")?;

    debug!(filter = %filter, "built identifier-direction filter");
    Ok(Some(filter))
}

/// Filter for a chunk resolved in the object→identifier direction: any of
/// the five known principal categories, restricted to the chunk's object
/// references.
pub fn filter_for_objects(chunk: &[MappingRequest]) -> IdmapResult<Option<String>> {
    debug_assert!(chunk.len() <= MAX_BATCH);

    let mut clauses = String::new();
    for request in chunk {
        let Some(object_ref) = request.object_ref.as_ref() else {
            continue;
        };
        push_clause(&mut clauses, ATTR_OBJECT_SID, &object_ref.ldap_encoded())?;
    }

    if clauses.is_empty() {
        return Ok(None);
    }

    let mut filter = String::new();
    try_push(&mut filter, "(&(|")?;
    try_push(&mut filter, &account_type_clauses())?;
    try_push(&mut filter, &group_type_clauses())?;
    try_push(&mut filter, ")(|")?;
    try_push(&mut filter, &clauses)?;
    try_push(&mut filter, "))")?;

    debug!(filter = %filter, "built object-direction filter");
    Ok(Some(filter))
}

fn account_type_clauses() -> String {
    format!(
        "({a}={})({a}={})({a}={})",
        SAM_NORMAL_ACCOUNT,
        SAM_WORKSTATION_TRUST,
        SAM_INTERDOMAIN_TRUST,
        a = ATTR_ACCOUNT_TYPE
    )
}

fn group_type_clauses() -> String {
    format!(
        "({a}={})({a}={})",
        SAM_SECURITY_GLOBAL_GROUP,
        SAM_SECURITY_LOCAL_GROUP,
        a = ATTR_ACCOUNT_TYPE
    )
}

/// Append `(&(|<types>)(|<clauses>))` to the filter under construction.
fn push_fragment(buf: &mut String, type_clauses: &str, clauses: &str) -> IdmapResult<()> {
    try_push(buf, "(&(|")?;
    try_push(buf, type_clauses)?;
    try_push(buf, ")(|")?;
    try_push(buf, clauses)?;
    try_push(buf, "))")
}

fn push_clause(buf: &mut String, attribute: &str, value: &str) -> IdmapResult<()> {
    try_push(buf, "(")?;
    try_push(buf, attribute)?;
    try_push(buf, "=")?;
    try_push(buf, value)?;
    try_push(buf, ")")
}

fn try_push(buf: &mut String, part: &str) -> IdmapResult<()> {
    buf.try_reserve(part.len())
        .map_err(|_| IdmapError::AllocationFailure)?;
    buf.push_str(part);
    Ok(())
}
