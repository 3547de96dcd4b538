//! Batched bidirectional resolution between identifiers and directory
//! objects.

use tracing::{debug, instrument};

use crate::directory::{DirectoryService, MAPPING_ATTRS};
use crate::error::{IdmapError, IdmapResult};
use crate::filter::{filter_for_ids, filter_for_objects, MAX_BATCH};
use crate::reconcile::{reconcile_ids, reconcile_objects};
use crate::request::MappingRequest;
use crate::types::MappingStatus;

/// The batch resolution engine.
///
/// Borrows a directory-search channel for the duration of one call and
/// holds no connection state of its own. Chunks are processed strictly
/// sequentially: the channel is not assumed safe for concurrent use, and
/// the only suspension points are the searches themselves. The engine
/// performs no retries; transient directory failures surface to the
/// caller.
pub struct MappingEngine<'d, D: DirectoryService + ?Sized> {
    directory: &'d D,
}

#[derive(Clone, Copy)]
enum Direction {
    IdsToObjects,
    ObjectsToIds,
}

impl<'d, D: DirectoryService + ?Sized> MappingEngine<'d, D> {
    /// Create an engine over a borrowed directory service.
    pub fn new(directory: &'d D) -> Self {
        Self { directory }
    }

    /// Resolve the directory object for every request carrying an
    /// identifier.
    #[instrument(skip_all, fields(requests = requests.len()))]
    pub async fn resolve_objects_for_ids(
        &self,
        requests: &mut [MappingRequest],
    ) -> IdmapResult<()> {
        self.resolve(requests, Direction::IdsToObjects).await
    }

    /// Resolve the identifier for every request carrying an object
    /// reference.
    #[instrument(skip_all, fields(requests = requests.len()))]
    pub async fn resolve_ids_for_objects(
        &self,
        requests: &mut [MappingRequest],
    ) -> IdmapResult<()> {
        self.resolve(requests, Direction::ObjectsToIds).await
    }

    async fn resolve(
        &self,
        requests: &mut [MappingRequest],
        direction: Direction,
    ) -> IdmapResult<()> {
        if self.directory.is_offline() {
            return Err(IdmapError::ServiceUnavailable);
        }

        for request in requests.iter_mut() {
            request.status = MappingStatus::Unknown;
        }

        let outcome = self.run_chunks(requests, direction).await;

        // Whatever the chunk loop reached, nothing may exit as Unknown.
        for request in requests.iter_mut() {
            if request.status != MappingStatus::Mapped {
                request.status = MappingStatus::Unmapped;
            }
        }

        outcome
    }

    async fn run_chunks(
        &self,
        requests: &mut [MappingRequest],
        direction: Direction,
    ) -> IdmapResult<()> {
        for chunk in requests.chunks_mut(MAX_BATCH) {
            let filter = match direction {
                Direction::IdsToObjects => filter_for_ids(chunk)?,
                Direction::ObjectsToIds => filter_for_objects(chunk)?,
            };
            let Some(filter) = filter else {
                debug!("chunk contributes no queryable request, skipping search");
                continue;
            };

            let reply = self.directory.search(&filter, &MAPPING_ATTRS).await?;
            if reply.is_empty() {
                debug!("search returned no entries for chunk");
            }

            match direction {
                Direction::IdsToObjects => reconcile_ids(self.directory, chunk, reply),
                Direction::ObjectsToIds => reconcile_objects(self.directory, chunk, reply),
            }
        }
        Ok(())
    }
}
