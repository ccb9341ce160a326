use crate::api::{PointApi, PointId};
use foxtail_error::{Error, PointError};
use parking_lot::RwLock;
use std::sync::Arc;

/// Dense map from point id to point handle.
///
/// Populated single-threaded at node-build time and structurally read-only
/// afterwards; point *values* change concurrently but each point guards its
/// own stateful slot.
pub struct PointDatabase {
    inner: RwLock<Inner>,
}

struct Inner {
    points: Vec<Option<Arc<dyn PointApi>>>,
    /// Ids registered since the last `mark_node_create_start`, so a failed
    /// node build can be scrubbed without touching earlier registrations.
    journal: Option<Vec<PointId>>,
}

impl PointDatabase {
    /// `max_points` bounds the id space: valid ids are `0..max_points`.
    pub fn new(max_points: usize) -> Self {
        PointDatabase {
            inner: RwLock::new(Inner {
                points: vec![None; max_points],
                journal: None,
            }),
        }
    }

    pub fn max_points(&self) -> usize {
        self.inner.read().points.len()
    }

    pub fn add(&self, point: Arc<dyn PointApi>) -> Result<(), Error> {
        let id = point.id();
        let mut inner = self.inner.write();
        let slot = inner
            .points
            .get_mut(id as usize)
            .ok_or(PointError::IdOutOfRange)?;
        if slot.is_some() {
            return Err(PointError::DuplicateId.into());
        }
        *slot = Some(point);
        if let Some(journal) = inner.journal.as_mut() {
            journal.push(id);
        }
        Ok(())
    }

    pub fn lookup_by_id(&self, id: PointId) -> Option<Arc<dyn PointApi>> {
        self.inner.read().points.get(id as usize)?.clone()
    }

    /// Ids currently registered, ascending.
    pub fn point_ids(&self) -> Vec<PointId> {
        self.inner
            .read()
            .points
            .iter()
            .enumerate()
            .filter_map(|(id, p)| p.as_ref().map(|_| id as PointId))
            .collect()
    }

    /// Begin journaling registrations for a node build.
    pub fn mark_node_create_start(&self) {
        self.inner.write().journal = Some(Vec::new());
    }

    /// The node build succeeded; keep everything and stop journaling.
    pub fn commit_node_create(&self) {
        self.inner.write().journal = None;
    }

    /// Drop every point registered by the failed (half-built) node.
    pub fn cleanup_points_after_node_create_failure(&self) {
        let mut inner = self.inner.write();
        if let Some(journal) = inner.journal.take() {
            for id in journal {
                inner.points[id as usize] = None;
            }
        }
    }

    /// Remove every entry.
    pub fn clear_points(&self) {
        let mut inner = self.inner.write();
        inner.points.iter_mut().for_each(|p| *p = None);
        inner.journal = None;
    }
}
