//! Ordered, lock-protected store of scene objects.
//!
//! [`SceneGraph`] stands in for the host's scene. All objects live in one
//! `Vec` behind a [`tokio::sync::RwLock`]: snapshot builds take the read
//! lock, mutations take the write lock. Insertion order is preserved, so
//! snapshots list objects in the order the host added them.

use tokio::sync::RwLock;

use super::{ObjectId, SceneObject};
use crate::error::SyncError;

/// Central store for all scene objects.
///
/// # Concurrency
///
/// - Any number of snapshot builds may read concurrently.
/// - Mutations are serialized with each other and with reads.
#[derive(Debug, Default)]
pub struct SceneGraph {
    objects: RwLock<Vec<SceneObject>>,
}

impl SceneGraph {
    /// Creates an empty scene.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a scene pre-populated with `objects`, keeping their order.
    ///
    /// Later duplicates of an id are dropped.
    #[must_use]
    pub fn with_objects(objects: Vec<SceneObject>) -> Self {
        let mut unique: Vec<SceneObject> = Vec::with_capacity(objects.len());
        for object in objects {
            if unique.iter().any(|o| o.id == object.id) {
                tracing::warn!(object_id = %object.id, "duplicate object id in scene seed, skipped");
                continue;
            }
            unique.push(object);
        }
        Self {
            objects: RwLock::new(unique),
        }
    }

    /// Appends an object to the scene.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::InvalidRequest`] if an object with the same id
    /// already exists.
    pub async fn insert(&self, object: SceneObject) -> Result<ObjectId, SyncError> {
        let mut objects = self.objects.write().await;
        if objects.iter().any(|o| o.id == object.id) {
            return Err(SyncError::InvalidRequest(format!(
                "object {} already exists",
                object.id
            )));
        }
        let id = object.id.clone();
        objects.push(object);
        Ok(id)
    }

    /// Returns a copy of the object with the given id.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::ObjectNotFound`] if no such object exists.
    pub async fn get(&self, id: &ObjectId) -> Result<SceneObject, SyncError> {
        let objects = self.objects.read().await;
        objects
            .iter()
            .find(|o| &o.id == id)
            .cloned()
            .ok_or_else(|| SyncError::ObjectNotFound(id.clone()))
    }

    /// Runs `f` on the object with the given id under the write lock.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::ObjectNotFound`] if no such object exists.
    pub async fn update<R>(
        &self,
        id: &ObjectId,
        f: impl FnOnce(&mut SceneObject) -> R,
    ) -> Result<R, SyncError> {
        let mut objects = self.objects.write().await;
        let object = objects
            .iter_mut()
            .find(|o| &o.id == id)
            .ok_or_else(|| SyncError::ObjectNotFound(id.clone()))?;
        Ok(f(object))
    }

    /// Runs `f` over all objects, in scene order, under the read lock.
    pub async fn read<R>(&self, f: impl FnOnce(&[SceneObject]) -> R) -> R {
        let objects = self.objects.read().await;
        f(&objects)
    }

    /// Returns the number of objects in the scene.
    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    /// Returns `true` if the scene contains no objects.
    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }
}
