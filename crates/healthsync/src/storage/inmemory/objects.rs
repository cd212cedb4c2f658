//! In-memory object store.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use healthsync_core::storage::{ObjectRef, ObjectStore, Result, StoreError};

/// In-memory object store for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryObjectStore {
    objects: Arc<RwLock<HashMap<ObjectRef, Vec<u8>>>>,
    undeletable: Arc<RwLock<HashSet<ObjectRef>>>,
}

impl InMemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn put(&self, object: &ObjectRef, contents: impl Into<Vec<u8>>) {
        self.objects
            .write()
            .await
            .insert(object.clone(), contents.into());
    }

    pub async fn contains(&self, object: &ObjectRef) -> bool {
        self.objects.read().await.contains_key(object)
    }

    /// Makes `delete` fail for `object` while leaving reads intact.
    pub async fn protect(&self, object: &ObjectRef) {
        self.undeletable.write().await.insert(object.clone());
    }
}

fn not_found(object: &ObjectRef) -> StoreError {
    StoreError::NotFound {
        entity_type: "Object",
        id: object.to_string(),
    }
}

#[async_trait]
impl ObjectStore for InMemoryObjectStore {
    async fn read(&self, object: &ObjectRef) -> Result<Vec<u8>> {
        self.objects
            .read()
            .await
            .get(object)
            .cloned()
            .ok_or_else(|| not_found(object))
    }

    async fn delete(&self, object: &ObjectRef) -> Result<()> {
        if self.undeletable.read().await.contains(object) {
            return Err(StoreError::PermissionDenied(format!(
                "{object} is protected"
            )));
        }

        self.objects
            .write()
            .await
            .remove(object)
            .map(|_| ())
            .ok_or_else(|| not_found(object))
    }
}
