//! Reference table sources.

use std::sync::Arc;

use async_trait::async_trait;

use healthsync_core::reference::{
    bundled_calorie_bands, bundled_sleep_bands, CalorieBand, ReferenceError, ReferenceTables,
    SleepBand, CALORIE_TABLE, SLEEP_TABLE,
};
use healthsync_core::storage::{ObjectRef, ObjectStore, ReferenceSource};

use crate::decode::{decode_calorie_bands, decode_sleep_bands};

/// Serves the reference tables compiled into the binary.
#[derive(Debug, Clone, Copy, Default)]
pub struct BundledReferences;

#[async_trait]
impl ReferenceSource for BundledReferences {
    async fn sleep_bands(&self) -> Result<Vec<SleepBand>, ReferenceError> {
        Ok(bundled_sleep_bands())
    }

    async fn calorie_bands(&self) -> Result<Vec<CalorieBand>, ReferenceError> {
        Ok(bundled_calorie_bands())
    }
}

/// Reads the reference tables as CSV objects from an object store.
pub struct ObjectReferences {
    store: Arc<dyn ObjectStore>,
    sleep: ObjectRef,
    calorie: ObjectRef,
}

impl ObjectReferences {
    pub fn new(store: Arc<dyn ObjectStore>, sleep: ObjectRef, calorie: ObjectRef) -> Self {
        Self {
            store,
            sleep,
            calorie,
        }
    }

    async fn fetch(&self, table: &'static str, object: &ObjectRef) -> Result<Vec<u8>, ReferenceError> {
        self.store
            .read(object)
            .await
            .map_err(|e| ReferenceError::Unavailable {
                table,
                reason: e.to_string(),
            })
    }
}

#[async_trait]
impl ReferenceSource for ObjectReferences {
    async fn sleep_bands(&self) -> Result<Vec<SleepBand>, ReferenceError> {
        let bytes = self.fetch(SLEEP_TABLE, &self.sleep).await?;
        decode_sleep_bands(&bytes)
    }

    async fn calorie_bands(&self) -> Result<Vec<CalorieBand>, ReferenceError> {
        let bytes = self.fetch(CALORIE_TABLE, &self.calorie).await?;
        decode_calorie_bands(&bytes)
    }
}

/// Fetches both tables concurrently, then validates them together.
pub async fn load_reference_tables(
    source: &dyn ReferenceSource,
) -> Result<ReferenceTables, ReferenceError> {
    let (sleep, calorie) = tokio::try_join!(source.sleep_bands(), source.calorie_bands())?;

    tracing::debug!(
        sleep_bands = sleep.len(),
        calorie_bands = calorie.len(),
        "Reference tables loaded"
    );

    ReferenceTables::new(sleep, calorie)
}
