//! # dirmap core
//!
//! Batched, bidirectional resolution between directory principals and
//! unix-style identifiers.
//!
//! A directory names each principal twice: by a 128-bit object GUID and by
//! a security identifier. A local access-control subsystem wants small
//! integers instead. This crate bridges the two spaces:
//!
//! - [`derive::derive_id`] turns a GUID into a deterministic `u32` with no
//!   directory round-trip.
//! - [`engine::MappingEngine`] resolves batches of [`request::MappingRequest`]s
//!   against a directory in either direction, chunking them into bounded
//!   queries and reconciling replies back onto the batch.
//!
//! The directory itself is abstracted behind [`directory::DirectoryService`];
//! a production LDAP implementation lives in the `dirmap-ldap` crate.
//!
//! ## Example
//!
//! ```ignore
//! use dirmap_core::prelude::*;
//!
//! let engine = MappingEngine::new(&directory);
//! let mut requests = vec![MappingRequest::for_object(sid)];
//! engine.resolve_ids_for_objects(&mut requests).await?;
//! assert!(matches!(requests[0].status, MappingStatus::Mapped | MappingStatus::Unmapped));
//! ```
//!
//! ## Crate organization
//!
//! - [`types`] - identifier model and account-type classification
//! - [`sid`] - security identifiers (text, wire, and filter encodings)
//! - [`request`] - the unit of work
//! - [`error`] - engine and collaborator errors
//! - [`directory`] - the directory-search contract
//! - [`derive`] - GUID → id derivation
//! - [`filter`] - search-filter construction
//! - [`reconcile`] - reply reconciliation
//! - [`engine`] - the batch resolution engine

pub mod derive;
pub mod directory;
pub mod engine;
pub mod error;
pub mod filter;
pub mod reconcile;
pub mod request;
pub mod sid;
pub mod types;

/// Prelude module for convenient imports.
///
/// ```
/// use dirmap_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::derive::derive_id;
    pub use crate::directory::{
        DirectoryEntry, DirectoryService, SearchReply, ATTR_ACCOUNT_TYPE, ATTR_OBJECT_GUID,
        ATTR_OBJECT_SID, MAPPING_ATTRS,
    };
    pub use crate::engine::MappingEngine;
    pub use crate::error::{DirectoryError, IdmapError, IdmapResult};
    pub use crate::filter::MAX_BATCH;
    pub use crate::request::MappingRequest;
    pub use crate::sid::{SecurityIdentifier, SidError};
    pub use crate::types::{classify_type_code, IdKind, MappingStatus, UnixId};
}

// Re-export async_trait for DirectoryService implementors.
pub use async_trait::async_trait;

#[cfg(test)]
mod tests {
    use super::prelude::*;

    #[test]
    fn prelude_imports() {
        let sid: SecurityIdentifier = "S-1-5-32-544".parse().unwrap();
        let request = MappingRequest::for_object(sid);
        assert_eq!(request.status, MappingStatus::Unknown);
        let _kind = classify_type_code(0x3000_0000);
        assert!(MAX_BATCH > 0);
    }
}
