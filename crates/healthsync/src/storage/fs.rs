//! Filesystem object store.
//!
//! Buckets are directories under a root and object names are paths inside
//! them, so `healthapp/members.csv` lives at `<root>/healthapp/members.csv`.

use std::io;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;

use healthsync_core::storage::{ObjectRef, ObjectStore, Result, StoreError};

#[derive(Debug, Clone)]
pub struct FsObjectStore {
    root: PathBuf,
}

impl FsObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves an object to a path under the root.
    ///
    /// Only plain relative components are accepted; `..`, absolute paths and
    /// empty names are rejected.
    pub fn path_for(&self, object: &ObjectRef) -> Result<PathBuf> {
        let bucket = Path::new(&object.bucket);
        let name = Path::new(&object.name);

        if !is_plain_relative(bucket) || !is_plain_relative(name) {
            return Err(StoreError::InvalidData(format!(
                "Invalid object path: {object}"
            )));
        }

        Ok(self.root.join(bucket).join(name))
    }
}

fn is_plain_relative(path: &Path) -> bool {
    let mut components = path.components().peekable();
    components.peek().is_some() && components.all(|c| matches!(c, Component::Normal(_)))
}

/// Maps an I/O error to a StoreError.
fn map_io_error(err: io::Error, object: &ObjectRef) -> StoreError {
    match err.kind() {
        io::ErrorKind::NotFound => StoreError::NotFound {
            entity_type: "Object",
            id: object.to_string(),
        },
        io::ErrorKind::PermissionDenied => {
            StoreError::PermissionDenied(format!("{object}: {err}"))
        }
        _ => StoreError::QueryFailed(format!("{object}: {err}")),
    }
}

#[async_trait]
impl ObjectStore for FsObjectStore {
    async fn read(&self, object: &ObjectRef) -> Result<Vec<u8>> {
        let path = self.path_for(object)?;
        tokio::fs::read(&path)
            .await
            .map_err(|e| map_io_error(e, object))
    }

    async fn delete(&self, object: &ObjectRef) -> Result<()> {
        let path = self.path_for(object)?;
        tokio::fs::remove_file(&path)
            .await
            .map_err(|e| map_io_error(e, object))
    }
}
