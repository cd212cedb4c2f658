//! Pipeline orchestration.
//!
//! Drives one run through its stages: load references, parse the source,
//! enrich, partition, persist every partition concurrently, and delete the
//! source only if every partition committed.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::{timeout_at, Instant};
use tracing::Instrument;
use uuid::Uuid;

use healthsync_core::pipeline::{
    enrich_all, partition, EventOutcome, InsertOutcome, Partition, PartitionError,
    PartitionFailure, PartitionReport, PipelineConfig, PipelineStage, RunFailure, RunSummary,
    StorageEvent,
};
use healthsync_core::storage::{ObjectRef, ObjectStore, ReferenceSource, TableBackend, TableId};

use crate::decode::decode_members;
use crate::provision::MemberTables;
use crate::references::load_reference_tables;

/// The ingestion pipeline.
///
/// A single `Pipeline` may serve overlapping runs; they share one
/// `MemberTables`, so table provisioning stays single-flight across them.
pub struct Pipeline {
    config: PipelineConfig,
    references: Arc<dyn ReferenceSource>,
    objects: Arc<dyn ObjectStore>,
    tables: Arc<MemberTables>,
}

impl Pipeline {
    pub fn new(
        config: PipelineConfig,
        references: Arc<dyn ReferenceSource>,
        objects: Arc<dyn ObjectStore>,
        backend: Arc<dyn TableBackend>,
    ) -> Self {
        Self {
            config,
            references,
            objects,
            tables: Arc::new(MemberTables::new(backend)),
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Entry point for object-change notifications.
    ///
    /// Deletion events are skipped; anything else must name a bucket and an
    /// object and triggers a run.
    pub async fn handle_event(&self, event: &StorageEvent) -> Result<EventOutcome, RunFailure> {
        match event.source()? {
            Some(source) => self.run(source).await.map(EventOutcome::Completed),
            None => {
                let name = event.name.as_deref().unwrap_or("<unnamed>");
                tracing::info!(object = name, "Skipping deletion event");
                Ok(EventOutcome::Skipped {
                    reason: format!("{name} was deleted"),
                })
            }
        }
    }

    /// Runs the pipeline for `source` with the configured deadline.
    pub async fn run(&self, source: ObjectRef) -> Result<RunSummary, RunFailure> {
        self.run_until(source, Instant::now() + self.config.run_timeout())
            .await
    }

    /// Runs the pipeline for `source`, giving up at `deadline`.
    pub async fn run_until(
        &self,
        source: ObjectRef,
        deadline: Instant,
    ) -> Result<RunSummary, RunFailure> {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!(
            "pipeline_run",
            %run_id,
            bucket = %source.bucket,
            name = %source.name
        );

        async move {
            let result = self.execute(run_id, source, deadline).await;

            match &result {
                Ok(summary) => tracing::info!(
                    stage = %PipelineStage::Done,
                    rows = summary.rows_committed,
                    partitions = summary.partitions.len(),
                    misses = summary.lookup_misses.len(),
                    "Run finished"
                ),
                Err(error) => tracing::error!(
                    stage = %PipelineStage::Failed,
                    %error,
                    "Run failed"
                ),
            }

            result
        }
        .instrument(span)
        .await
    }

    async fn execute(
        &self,
        run_id: Uuid,
        source: ObjectRef,
        deadline: Instant,
    ) -> Result<RunSummary, RunFailure> {
        enter(PipelineStage::LoadingReferences);
        let references = before_deadline(
            deadline,
            PipelineStage::LoadingReferences,
            load_reference_tables(self.references.as_ref()),
        )
        .await??;

        enter(PipelineStage::Parsing);
        let bytes = before_deadline(deadline, PipelineStage::Parsing, self.objects.read(&source))
            .await?
            .map_err(|cause| RunFailure::SourceUnavailable {
                object: source.clone(),
                cause,
            })?;
        let records = decode_members(&bytes)?;
        let rows_parsed = records.len();
        tracing::info!(rows = rows_parsed, "Source parsed");

        enter(PipelineStage::Enriching);
        check_deadline(deadline, PipelineStage::Enriching)?;
        let enrichment = enrich_all(&records, &references);
        for miss in &enrichment.misses {
            tracing::warn!(
                member_id = miss.member_id,
                row = miss.row,
                "Lookup miss: {miss}"
            );
        }
        let rows_enriched = enrichment.enriched.len();

        enter(PipelineStage::Partitioning);
        check_deadline(deadline, PipelineStage::Partitioning)?;
        let partitions = partition(enrichment.enriched);

        enter(PipelineStage::Persisting);
        check_deadline(deadline, PipelineStage::Persisting)?;
        let (reports, failures) = self.persist(partitions, deadline).await?;

        enter(PipelineStage::Finalizing);
        if !failures.is_empty() {
            for failure in &failures {
                tracing::error!(
                    member_id = failure.member_id,
                    table_id = %failure.table_id,
                    error = %failure.error,
                    "Partition failed"
                );
            }
            return Err(RunFailure::Persistence {
                failed: failures,
                committed: reports.len(),
            });
        }

        let source_deleted = self.delete_source(&source, deadline).await;

        Ok(RunSummary {
            run_id,
            rows_parsed,
            rows_enriched,
            rows_committed: reports.iter().map(|r| r.committed).sum(),
            rows_rejected: reports.iter().map(|r| r.rejected.len()).sum(),
            lookup_misses: enrichment.misses,
            partitions: reports,
            source,
            source_deleted,
        })
    }

    /// Persists every partition with at most `max_concurrency` in flight.
    ///
    /// Every partition's outcome is collected; one failure never cancels its
    /// siblings. Past the deadline no new partition starts, and tasks already
    /// writing are detached rather than aborted.
    async fn persist(
        &self,
        partitions: Vec<Partition>,
        deadline: Instant,
    ) -> Result<(Vec<PartitionReport>, Vec<PartitionFailure>), RunFailure> {
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrency()));
        let mut join_set = JoinSet::new();
        let mut keys: HashMap<tokio::task::Id, (i64, TableId)> = HashMap::new();

        for partition in partitions {
            let member_id = partition.member_id;
            let table_id = self.config.table_id(member_id);
            let tables = Arc::clone(&self.tables);
            let semaphore = Arc::clone(&semaphore);
            let task_table = table_id.clone();

            let handle = join_set.spawn(
                async move {
                    let _permit = semaphore
                        .acquire_owned()
                        .await
                        .map_err(|e| PartitionError::Aborted(e.to_string()))?;
                    if Instant::now() >= deadline {
                        return Err(PartitionError::Aborted(
                            "deadline passed before start".to_string(),
                        ));
                    }
                    persist_partition(&tables, task_table, partition).await
                }
                .in_current_span(),
            );
            keys.insert(handle.id(), (member_id, table_id));
        }

        let mut reports = Vec::new();
        let mut failures = Vec::new();

        loop {
            let joined = match timeout_at(deadline, join_set.join_next_with_id()).await {
                Ok(Some(joined)) => joined,
                Ok(None) => break,
                Err(_) => {
                    tracing::warn!(
                        pending = join_set.len(),
                        committed = reports.len(),
                        "Deadline reached while persisting"
                    );
                    join_set.detach_all();
                    return Err(RunFailure::Timeout {
                        stage: PipelineStage::Persisting,
                    });
                }
            };

            let (id, result) = match joined {
                Ok((id, result)) => (id, result),
                Err(join_error) => (
                    join_error.id(),
                    Err(PartitionError::Aborted(join_error.to_string())),
                ),
            };
            let Some((member_id, table_id)) = keys.remove(&id) else {
                continue;
            };

            match result {
                Ok(report) => reports.push(report),
                Err(error) => failures.push(PartitionFailure {
                    member_id,
                    table_id,
                    error,
                }),
            }
        }

        reports.sort_by_key(|r| r.member_id);
        failures.sort_by_key(|f| f.member_id);
        Ok((reports, failures))
    }

    /// Deletes the source after a fully committed run.
    ///
    /// Rows are already committed at this point, so a failed delete is logged
    /// and reported in the summary instead of failing the run.
    async fn delete_source(&self, source: &ObjectRef, deadline: Instant) -> bool {
        match timeout_at(deadline, self.objects.delete(source)).await {
            Ok(Ok(())) => {
                tracing::info!(source = %source, "Source deleted");
                true
            }
            Ok(Err(error)) => {
                tracing::error!(source = %source, %error, "Failed to delete source");
                false
            }
            Err(_) => {
                tracing::error!(source = %source, "Deadline reached while deleting source");
                false
            }
        }
    }
}

/// Ensures the partition's table, then writes the partition as one batch.
async fn persist_partition(
    tables: &MemberTables,
    table_id: TableId,
    partition: Partition,
) -> Result<PartitionReport, PartitionError> {
    tables
        .ensure_table(&table_id)
        .await
        .map_err(PartitionError::Provision)?;

    let (committed, rejected) = match tables.insert_batch(&table_id, &partition.records).await {
        InsertOutcome::Committed { rows } => (rows, Vec::new()),
        InsertOutcome::CommittedWithPartialFailures { rows, failed } => (rows, failed),
        InsertOutcome::Failed(error) => return Err(PartitionError::Insert(error)),
    };

    Ok(PartitionReport {
        member_id: partition.member_id,
        table_id,
        committed,
        rejected,
    })
}

fn enter(stage: PipelineStage) {
    tracing::debug!(stage = %stage, "Entering stage");
}

fn check_deadline(deadline: Instant, stage: PipelineStage) -> Result<(), RunFailure> {
    if Instant::now() >= deadline {
        return Err(RunFailure::Timeout { stage });
    }
    Ok(())
}

async fn before_deadline<F: Future>(
    deadline: Instant,
    stage: PipelineStage,
    future: F,
) -> Result<F::Output, RunFailure> {
    timeout_at(deadline, future)
        .await
        .map_err(|_| RunFailure::Timeout { stage })
}
