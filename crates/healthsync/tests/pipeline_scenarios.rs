//! End-to-end pipeline scenarios against the in-memory backends.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use tokio::time::Instant;

use healthsync::references::{BundledReferences, ObjectReferences};
use healthsync::storage::{InMemoryObjectStore, InMemoryTableBackend};
use healthsync::Pipeline;
use healthsync_core::pipeline::{
    EventOutcome, MissingBand, PartitionError, PipelineConfig, PipelineStage, RunFailure,
    StorageEvent, DELETED_RESOURCE_STATE,
};
use healthsync_core::reference::ReferenceError;
use healthsync_core::storage::{ObjectRef, ReferenceSource, StoreError, TableId};

const HEADER: &str = "Member_ID,First_Name,Last_Name,Gender,Age,Height,Weight,Hours_Sleep,Calories_Consumed,Exercise_Calories_Burned,Date";

fn export(rows: &[&str]) -> String {
    let mut contents = String::from(HEADER);
    for row in rows {
        contents.push('\n');
        contents.push_str(row);
    }
    contents.push('\n');
    contents
}

/// One row per member id, all valid against the bundled references.
fn members(ids: impl IntoIterator<Item = i64>) -> String {
    let rows: Vec<String> = ids
        .into_iter()
        .map(|id| format!("{id},First{id},Last{id},M,40,1.80,80,7,2400,400,05/20/2020"))
        .collect();
    let rows: Vec<&str> = rows.iter().map(String::as_str).collect();
    export(&rows)
}

fn source() -> ObjectRef {
    ObjectRef::new("healthapp", "member_fitness_tracker_history.csv")
}

fn table(member_id: i64) -> TableId {
    TableId::for_member("Member_", member_id)
}

struct Harness {
    objects: InMemoryObjectStore,
    backend: InMemoryTableBackend,
    pipeline: Pipeline,
}

impl Harness {
    async fn new(backend: InMemoryTableBackend, contents: &str) -> Self {
        Self::with(backend, PipelineConfig::with_defaults(), Arc::new(BundledReferences), contents)
            .await
    }

    async fn with(
        backend: InMemoryTableBackend,
        config: PipelineConfig,
        references: Arc<dyn ReferenceSource>,
        contents: &str,
    ) -> Self {
        let objects = InMemoryObjectStore::new();
        objects.put(&source(), contents).await;
        let pipeline = Pipeline::new(
            config,
            references,
            Arc::new(objects.clone()),
            Arc::new(backend.clone()),
        );

        Self {
            objects,
            backend,
            pipeline,
        }
    }

    async fn source_exists(&self) -> bool {
        self.objects.contains(&source()).await
    }
}

#[tokio::test]
async fn test_two_rows_of_one_member_land_in_one_batch() {
    let contents = export(&[
        "1,Ana,Silva,F,30,\"1,70\",62,7,1900,300,05/20/2020",
        "1,Ana,Silva,F,70,\"1,70\",60,8,1700,150,05/21/2020",
    ]);
    let harness = Harness::new(InMemoryTableBackend::new(), &contents).await;

    let summary = harness.pipeline.run(source()).await.unwrap();

    assert_eq!(summary.rows_parsed, 2);
    assert_eq!(summary.rows_committed, 2);
    assert!(summary.lookup_misses.is_empty());
    assert_eq!(summary.partitions.len(), 1);
    assert_eq!(summary.partitions[0].table_id, table(1));
    assert_eq!(harness.backend.insert_calls(), 1);

    let rows = harness.backend.rows(&table(1)).await;
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].recommendations.recommended_sedentary_calories, 1800);
    assert!((rows[0].member.height - 1.70).abs() < f64::EPSILON);
    assert_eq!(
        rows[0].member.date,
        NaiveDate::from_ymd_opt(2020, 5, 20).unwrap()
    );
    assert_eq!(rows[1].recommendations.recommended_sedentary_calories, 1600);

    assert!(summary.source_deleted);
    assert!(!harness.source_exists().await);
}

#[tokio::test]
async fn test_lookup_miss_does_not_block_other_records() {
    let contents = export(&[
        "1,Ana,Silva,F,30,1.70,62,7,1900,300,05/20/2020",
        "2,Old,Timer,M,200,1.75,70,6,2000,100,05/20/2020",
        "3,Bruno,Costa,M,45,1.82,85,6,2500,450,05/20/2020",
    ]);
    let harness = Harness::new(InMemoryTableBackend::new(), &contents).await;

    let summary = harness.pipeline.run(source()).await.unwrap();

    assert_eq!(summary.lookup_misses.len(), 1);
    assert_eq!(summary.lookup_misses[0].member_id, 2);
    assert_eq!(
        summary.lookup_misses[0].missing,
        MissingBand::Sleep { age: 200 }
    );
    assert_eq!(summary.rows_enriched, 2);
    assert_eq!(summary.rows_committed, 2);
    assert_eq!(harness.backend.table_ids().await, vec![table(1), table(3)]);
    assert!(summary.source_deleted);
}

#[tokio::test]
async fn test_failed_partition_does_not_block_siblings_and_keeps_source() {
    let backend = InMemoryTableBackend::new();
    backend
        .fail_inserts(table(2), StoreError::QuotaExceeded("insert rate".to_string()))
        .await;
    let harness = Harness::new(backend, &members([1, 2, 3])).await;

    let failure = harness.pipeline.run(source()).await.unwrap_err();

    match &failure {
        RunFailure::Persistence { failed, committed } => {
            assert_eq!(*committed, 2);
            assert_eq!(failed.len(), 1);
            assert_eq!(failed[0].table_id, table(2));
            assert!(matches!(failed[0].error, PartitionError::Insert(_)));
        }
        other => panic!("Expected persistence failure, got {other:?}"),
    }
    assert_eq!(failure.failed_members(), vec![2]);
    assert_eq!(harness.backend.rows(&table(1)).await.len(), 1);
    assert_eq!(harness.backend.rows(&table(3)).await.len(), 1);
    assert!(harness.source_exists().await);
}

#[tokio::test]
async fn test_provisioning_failure_is_partition_fatal() {
    let backend = InMemoryTableBackend::new();
    backend
        .fail_creates(table(1), StoreError::PermissionDenied("read-only".to_string()))
        .await;
    let harness = Harness::new(backend, &members([1, 2])).await;

    let failure = harness.pipeline.run(source()).await.unwrap_err();

    match failure {
        RunFailure::Persistence { failed, committed } => {
            assert_eq!(committed, 1);
            assert!(matches!(failed[0].error, PartitionError::Provision(_)));
        }
        other => panic!("Expected persistence failure, got {other:?}"),
    }
    assert!(harness.source_exists().await);
}

#[tokio::test]
async fn test_rerun_appends_without_duplicate_table_errors() {
    let backend = InMemoryTableBackend::new();
    let contents = members([1, 2]);
    let first = Harness::new(backend.clone(), &contents).await;
    first.pipeline.run(source()).await.unwrap();

    // A fresh process sees the tables already present.
    let second = Harness::new(backend.clone(), &contents).await;
    let summary = second.pipeline.run(source()).await.unwrap();

    assert_eq!(summary.rows_committed, 2);
    assert_eq!(backend.create_calls(), 2);
    assert_eq!(backend.rows(&table(1)).await.len(), 2);
    assert_eq!(backend.rows(&table(2)).await.len(), 2);
}

#[tokio::test]
async fn test_overlapping_runs_create_each_table_once() {
    let backend = InMemoryTableBackend::new().with_latency(Duration::from_millis(20));
    let harness = Harness::new(backend, &members([1, 2, 3])).await;
    let other = ObjectRef::new("healthapp", "second_export.csv");
    harness.objects.put(&other, members([1, 2, 3])).await;

    let (a, b) = tokio::join!(
        harness.pipeline.run(source()),
        harness.pipeline.run(other.clone())
    );

    assert!(a.is_ok());
    assert!(b.is_ok());
    assert_eq!(harness.backend.create_calls(), 3);
    assert_eq!(harness.backend.rows(&table(2)).await.len(), 2);
}

#[tokio::test]
async fn test_fan_out_respects_max_concurrency() {
    let backend = InMemoryTableBackend::new().with_latency(Duration::from_millis(10));
    let config = PipelineConfig::new("Member_", 3, Duration::from_secs(30)).unwrap();
    let harness = Harness::with(
        backend,
        config,
        Arc::new(BundledReferences),
        &members(1..=12),
    )
    .await;

    let summary = harness.pipeline.run(source()).await.unwrap();

    assert_eq!(summary.partitions.len(), 12);
    let peak = harness.backend.peak_concurrent_inserts();
    assert!((1..=3).contains(&peak), "peak was {peak}");
}

#[tokio::test]
async fn test_deadline_during_persisting_keeps_source() {
    let backend = InMemoryTableBackend::new().with_latency(Duration::from_millis(300));
    let harness = Harness::new(backend, &members([1, 2])).await;

    let failure = harness
        .pipeline
        .run_until(source(), Instant::now() + Duration::from_millis(50))
        .await
        .unwrap_err();

    assert_eq!(
        failure,
        RunFailure::Timeout {
            stage: PipelineStage::Persisting
        }
    );
    assert!(harness.source_exists().await);
}

#[tokio::test]
async fn test_partial_row_failures_still_commit() {
    let backend = InMemoryTableBackend::new().with_row_filter(|r| {
        (r.member.hours_sleep > 24).then(|| "hours_sleep out of range".to_string())
    });
    let contents = export(&[
        "1,Ana,Silva,F,30,1.70,62,7,1900,300,05/20/2020",
        "1,Ana,Silva,F,30,1.70,62,30,1900,300,05/21/2020",
    ]);
    let harness = Harness::new(backend, &contents).await;

    let summary = harness.pipeline.run(source()).await.unwrap();

    assert_eq!(summary.rows_committed, 1);
    assert_eq!(summary.rows_rejected, 1);
    assert_eq!(summary.partitions[0].rejected[0].row, 1);
    assert!(summary.source_deleted);
}

#[tokio::test]
async fn test_parse_failure_keeps_source() {
    let contents = export(&["1,Ana,Silva,F,thirty,1.70,62,7,1900,300,05/20/2020"]);
    let harness = Harness::new(InMemoryTableBackend::new(), &contents).await;

    let failure = harness.pipeline.run(source()).await.unwrap_err();

    assert!(matches!(failure, RunFailure::Parse(ref e) if e.row == Some(1)));
    assert_eq!(harness.backend.create_calls(), 0);
    assert!(harness.source_exists().await);
}

#[tokio::test]
async fn test_missing_source_is_reported() {
    let harness = Harness::new(InMemoryTableBackend::new(), &members([1])).await;

    let failure = harness
        .pipeline
        .run(ObjectRef::new("healthapp", "nope.csv"))
        .await
        .unwrap_err();

    assert!(matches!(
        failure,
        RunFailure::SourceUnavailable {
            cause: StoreError::NotFound { .. },
            ..
        }
    ));
}

#[tokio::test]
async fn test_failed_source_delete_still_completes() {
    let harness = Harness::new(InMemoryTableBackend::new(), &members([1])).await;
    harness.objects.protect(&source()).await;

    let summary = harness.pipeline.run(source()).await.unwrap();

    assert_eq!(summary.rows_committed, 1);
    assert!(!summary.source_deleted);
    assert!(harness.source_exists().await);
}

#[tokio::test]
async fn test_deletion_event_is_skipped() {
    let harness = Harness::new(InMemoryTableBackend::new(), &members([1])).await;
    let event = StorageEvent {
        resource_state: Some(DELETED_RESOURCE_STATE.to_string()),
        ..StorageEvent::new("healthapp", "member_fitness_tracker_history.csv")
    };

    let outcome = harness.pipeline.handle_event(&event).await.unwrap();

    assert!(matches!(outcome, EventOutcome::Skipped { .. }));
    assert_eq!(harness.backend.create_calls(), 0);
    assert!(harness.source_exists().await);
}

#[tokio::test]
async fn test_event_triggers_run() {
    let harness = Harness::new(InMemoryTableBackend::new(), &members([4])).await;
    let event: StorageEvent = serde_json::from_str(
        r#"{"bucket": "healthapp", "name": "member_fitness_tracker_history.csv", "resourceState": "exists"}"#,
    )
    .unwrap();

    let outcome = harness.pipeline.handle_event(&event).await.unwrap();

    match outcome {
        EventOutcome::Completed(summary) => assert_eq!(summary.partitions[0].member_id, 4),
        other => panic!("Expected a completed run, got {other:?}"),
    }
}

#[tokio::test]
async fn test_event_without_bucket_is_invalid() {
    let harness = Harness::new(InMemoryTableBackend::new(), &members([1])).await;
    let event = StorageEvent {
        bucket: None,
        ..StorageEvent::new("", "member_fitness_tracker_history.csv")
    };

    let failure = harness.pipeline.handle_event(&event).await.unwrap_err();

    assert!(matches!(failure, RunFailure::InvalidEvent(_)));
}

#[tokio::test]
async fn test_malformed_references_fail_before_parsing() {
    let objects = InMemoryObjectStore::new();
    let sleep = ObjectRef::new("healthapp", "cdc_sleep_hours_lookup.csv");
    let calorie = ObjectRef::new("healthapp", "cdc_calorie_needs_lookup.csv");
    objects
        .put(
            &sleep,
            "Min_Age,Max_Age,Min_Sleep_Hours_Per_Day,Max_Sleep_Hours_Per_Day\n0,17,9,12\n25,117,7,9\n",
        )
        .await;
    objects
        .put(
            &calorie,
            "Gender,Min_Age,Max_Age,Sedentary,Moderately_Active,Active\nM,0,117,2000,2200,2600\n",
        )
        .await;
    let references = Arc::new(ObjectReferences::new(Arc::new(objects), sleep, calorie));
    let backend = InMemoryTableBackend::new();
    let harness = Harness::with(
        backend,
        PipelineConfig::with_defaults(),
        references,
        &members([1]),
    )
    .await;

    let failure = harness.pipeline.run(source()).await.unwrap_err();

    assert!(matches!(
        failure,
        RunFailure::ReferenceLoad(ReferenceError::Gap { .. })
    ));
    assert!(harness.backend.table_ids().await.is_empty());
    assert!(harness.source_exists().await);
}

#[cfg(feature = "sqlite")]
#[tokio::test]
async fn test_sqlite_backend_end_to_end() {
    use healthsync::storage::SqliteTableBackend;
    use healthsync_core::storage::TableBackend;

    let backend = Arc::new(SqliteTableBackend::new_in_memory().await.unwrap());
    let objects = InMemoryObjectStore::new();
    objects
        .put(
            &source(),
            export(&[
                "1,Ana,Silva,F,30,\"1,70\",62,7,1900,300,05/20/2020",
                "1,Ana,Silva,F,30,\"1,70\",62,30,1900,300,05/21/2020",
                "2,Bruno,Costa,M,45,1.82,85,6,2500,450,05/20/2020",
            ]),
        )
        .await;
    let pipeline = Pipeline::new(
        PipelineConfig::with_defaults(),
        Arc::new(BundledReferences),
        Arc::new(objects.clone()),
        backend.clone(),
    );

    let summary = pipeline.run(source()).await.unwrap();

    assert_eq!(summary.rows_committed, 2);
    assert_eq!(summary.rows_rejected, 1);
    assert!(backend.table_exists(&table(2)).await.unwrap());
    let rows = backend.rows(&table(1)).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].recommendations.recommended_sedentary_calories, 1800);
    assert!(!objects.contains(&source()).await);
}
