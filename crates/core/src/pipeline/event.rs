use serde::{Deserialize, Serialize};

use crate::storage::ObjectRef;

use super::error::RunFailure;

/// `resourceState` value the object store sends when an object was removed.
pub const DELETED_RESOURCE_STATE: &str = "not_exists";

/// Object-change notification that triggers a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageEvent {
    #[serde(default)]
    pub bucket: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub resource_state: Option<String>,
}

impl StorageEvent {
    pub fn new(bucket: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            bucket: Some(bucket.into()),
            name: Some(name.into()),
            resource_state: None,
        }
    }

    pub fn is_deletion(&self) -> bool {
        self.resource_state.as_deref() == Some(DELETED_RESOURCE_STATE)
    }

    /// Resolves the object this event refers to.
    ///
    /// Returns `Ok(None)` for deletion events, which carry nothing to ingest.
    pub fn source(&self) -> Result<Option<ObjectRef>, RunFailure> {
        if self.is_deletion() {
            return Ok(None);
        }

        let bucket = non_blank(self.bucket.as_deref())
            .ok_or_else(|| RunFailure::InvalidEvent("missing bucket".to_string()))?;
        let name = non_blank(self.name.as_deref())
            .ok_or_else(|| RunFailure::InvalidEvent("missing object name".to_string()))?;

        Ok(Some(ObjectRef::new(bucket, name)))
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}
