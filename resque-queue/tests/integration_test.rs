//! Integration tests for resque-queue

use resque_queue::*;
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

fn memory_resque(config: ResqueConfig) -> Resque {
    init_tracing();
    Resque::new(Arc::new(MemoryStore::new()), config)
}

/// Route log output through the test harness; `RUST_LOG=resque_queue=debug`
/// shows every store interaction.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

async fn push_failure(resque: &Resque, queue: &str, class: &str, args: serde_json::Value) -> String {
    let args = match args {
        serde_json::Value::Object(args) => args,
        _ => JobArgs::new(),
    };
    let record = FailedJob::new(queue, QueuedPayload::new(class, args))
        .with_error("RuntimeException", "boom")
        .with_worker("host:1:q");
    let id = record.id().to_string();

    resque
        .store()
        .list_push(&resque.keys().failed(), &serde_json::to_string(&record).unwrap())
        .await
        .unwrap();
    id
}

#[derive(Serialize)]
struct SendWelcome {
    user_id: u64,
}

impl JobType for SendWelcome {
    const CLASS: &'static str = "App\\Job\\SendWelcome";
    const QUEUE: &'static str = "emails";
}

#[tokio::test]
async fn test_no_strategy_means_no_retry_key() {
    let resque = memory_resque(ResqueConfig::default());

    resque
        .enqueue(&Job::new("q", "Plain").with_arg("x", 1), false)
        .await
        .unwrap();
    resque.enqueue_at(100, &Job::new("q", "Plain")).await.unwrap();

    assert!(!resque.queue("q").jobs().await.unwrap()[0]
        .args
        .contains_key(RETRY_STRATEGY_KEY));
    assert!(!resque.jobs_at(100).await.unwrap()[0]
        .args
        .contains_key(RETRY_STRATEGY_KEY));
}

#[tokio::test]
async fn test_class_strategy_beats_global() {
    let resque = memory_resque(
        ResqueConfig::builder()
            .global_retry_strategy(vec![5, 30])
            .job_retry_strategy("Report", Vec::<u64>::new())
            .job_retry_strategy("Mail", vec![1])
            .build(),
    );

    resque.enqueue(&Job::new("q", "Report"), false).await.unwrap();
    resque.enqueue(&Job::new("q", "Mail"), false).await.unwrap();
    resque.enqueue(&Job::new("q", "Other"), false).await.unwrap();

    let jobs = resque.queue("q").jobs().await.unwrap();
    assert_eq!(jobs[0].args[RETRY_STRATEGY_KEY], json!([]));
    assert_eq!(jobs[1].args[RETRY_STRATEGY_KEY], json!([1]));
    assert_eq!(jobs[2].args[RETRY_STRATEGY_KEY], json!([5, 30]));
}

#[tokio::test]
async fn test_enqueue_once_twice_leaves_one_payload() {
    let resque = memory_resque(ResqueConfig::default());
    let job = Job::typed(&SendWelcome { user_id: 7 }).unwrap();

    resque.enqueue_once(&job, false).await.unwrap();
    resque.enqueue_once(&job, false).await.unwrap();

    assert_eq!(resque.queue("emails").size().await.unwrap(), 1);
}

#[tokio::test]
async fn test_enqueue_once_matching_is_exact() {
    let resque = memory_resque(ResqueConfig::default());
    let a = Job::new("q", "C").with_arg("x", 1);
    let b = Job::new("q", "C").with_arg("x", 1).with_arg("y", 2);

    resque.enqueue(&b, false).await.unwrap();

    // A strict subset is not a duplicate.
    assert!(resque.enqueue_once(&a, false).await.unwrap().is_some());
    assert_eq!(resque.queue("q").size().await.unwrap(), 2);

    // Equal size and equal values is.
    assert!(resque.enqueue_once(&a, false).await.unwrap().is_none());
    assert!(resque.enqueue_once(&b, false).await.unwrap().is_none());
    assert_eq!(resque.queue("q").size().await.unwrap(), 2);
}

#[tokio::test]
async fn test_delayed_round_trip() {
    let resque = memory_resque(ResqueConfig::default());
    let job = Job::new("reports", "Nightly").with_arg("day", "monday");

    let at = resque.enqueue_in(Duration::from_secs(60), &job).await.unwrap();

    let due = resque.jobs_at(at).await.unwrap();
    assert_eq!(due.len(), 1);
    assert_eq!(due[0].class, "Nightly");
    assert_eq!(due[0].args["day"], "monday");

    let timestamps: Vec<i64> = resque
        .delayed_timestamps()
        .await
        .unwrap()
        .into_iter()
        .map(|bucket| bucket.timestamp)
        .collect();
    assert!(timestamps.contains(&at));
}

#[tokio::test]
async fn test_remove_from_timestamp_drops_empty_bucket() {
    let resque = memory_resque(ResqueConfig::default());
    let first = Job::new("q", "C").with_arg("n", 1);
    let second = Job::new("q", "C").with_arg("n", 2);

    resque.enqueue_at(500, &first).await.unwrap();
    resque.enqueue_at(500, &second).await.unwrap();

    assert_eq!(resque.remove_from_timestamp(500, &first).await.unwrap(), 1);
    assert_eq!(
        resque.first_delayed_timestamp().await.unwrap(),
        Some(ScheduledBucket {
            timestamp: 500,
            size: 1
        })
    );

    assert_eq!(resque.remove_from_timestamp(500, &second).await.unwrap(), 1);
    assert!(resque.delayed_timestamps().await.unwrap().is_empty());
    assert!(resque.first_delayed_timestamp().await.unwrap().is_none());
}

#[tokio::test]
async fn test_failed_retry_gating() {
    let resque = memory_resque(ResqueConfig::default());
    push_failure(
        &resque,
        "q",
        "Mid",
        json!({"resque.retry_strategy": [5, 30, 120], "resque.retry_attempt": 1}),
    )
    .await;
    push_failure(
        &resque,
        "q",
        "Last",
        json!({"resque.retry_strategy": [5, 30, 120], "resque.retry_attempt": 2}),
    )
    .await;

    assert_eq!(resque.retry_failed_jobs(false).await.unwrap(), 1);

    let jobs = resque.queue("q").jobs().await.unwrap();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].class, "Last");
    assert_eq!(jobs[0].args[RETRY_ATTEMPT_KEY], 0);
    assert_eq!(jobs[0].args[RETRY_STRATEGY_KEY], json!([5, 30, 120]));
}

#[tokio::test]
async fn test_clear_failed_jobs() {
    let resque = memory_resque(ResqueConfig::default());
    assert_eq!(resque.clear_failed_jobs().await.unwrap(), 0);
    assert_eq!(resque.failed_job_count().await.unwrap(), 0);

    for i in 0..4 {
        push_failure(&resque, "q", "C", json!({"i": i})).await;
    }
    assert_eq!(resque.clear_failed_jobs().await.unwrap(), 4);
    assert_eq!(resque.failed_job_count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_clear_failed_job() {
    let resque = memory_resque(ResqueConfig::default());
    let first = push_failure(&resque, "q", "C", json!({"i": 1})).await;
    push_failure(&resque, "q", "C", json!({"i": 2})).await;

    assert!(!resque.clear_failed_job("nope").await.unwrap());
    assert_eq!(resque.failed_job_count().await.unwrap(), 2);

    assert!(resque.clear_failed_job(&first).await.unwrap());
    assert_eq!(resque.failed_job_count().await.unwrap(), 1);
    assert!(!resque.clear_failed_job(&first).await.unwrap());
}

#[tokio::test]
async fn test_running_workers_subset() {
    let resque = memory_resque(ResqueConfig::default());
    let store = resque.store();
    let keys = resque.keys();

    for id in ["a:1:q", "b:2:q", "c:3:q"] {
        store.set_add(&keys.workers(), id).await.unwrap();
    }
    let current = WorkerJob {
        queue: "q".to_string(),
        run_at: None,
        payload: QueuedPayload::new("C", JobArgs::new()),
    };
    store
        .set(&keys.worker("b:2:q"), &serde_json::to_string(&current).unwrap())
        .await
        .unwrap();

    let workers = resque.workers().await.unwrap();
    let running = resque.running_workers().await.unwrap();

    assert!(running.iter().all(|worker| workers.contains(worker)));
    assert_eq!(resque.working_worker_count().await.unwrap(), running.len());
    assert_eq!(running[0].id, "b:2:q");
}

#[tokio::test]
async fn test_queue_listing_ignores_case() {
    let resque = memory_resque(ResqueConfig::default());
    resque.enqueue(&Job::new("Zqueue", "C"), false).await.unwrap();
    resque.enqueue(&Job::new("aqueue", "C"), false).await.unwrap();

    let names: Vec<String> = resque
        .queues()
        .await
        .unwrap()
        .iter()
        .map(|queue| queue.name().to_string())
        .collect();
    assert_eq!(names, vec!["aqueue", "Zqueue"]);
}

#[tokio::test]
async fn test_strict_registry_guards_enqueue_and_retry() {
    let resque = memory_resque(
        ResqueConfig::builder()
            .registry(JobRegistry::strict())
            .register::<SendWelcome>()
            .build(),
    );

    let err = resque
        .enqueue(&Job::new("q", "Unknown"), false)
        .await
        .unwrap_err();
    assert!(matches!(err, QueueError::UnknownJobClass(_)));

    push_failure(&resque, "q", "Unknown", json!({})).await;
    push_failure(&resque, "emails", SendWelcome::CLASS, json!({"user_id": 1})).await;

    assert_eq!(resque.retry_failed_jobs(false).await.unwrap(), 1);
    assert_eq!(resque.queue("emails").size().await.unwrap(), 1);
    assert_eq!(resque.queue("q").size().await.unwrap(), 0);
}

#[test]
fn test_queue_error_display() {
    let err = QueueError::UnknownJobClass("App\\Job\\Missing".to_string());
    let display = format!("{}", err);
    assert!(display.contains("App\\Job\\Missing"));
}

// Note: These tests would require Redis running
// They are disabled by default but can be run with: cargo test -- --ignored

#[tokio::test]
#[ignore = "requires Redis"]
async fn test_redis_enqueue_once() {
    let redis = resque_redis::RedisConfig::from_env().build();
    let resque = Resque::connect(redis, ResqueConfig::builder().prefix("resque-test").build())
        .await
        .unwrap();

    resque.clear_queue("integration").await.unwrap();
    let job = Job::new("integration", "Probe").with_arg("n", 1);

    resque.enqueue_once(&job, false).await.unwrap();
    resque.enqueue_once(&job, false).await.unwrap();

    assert_eq!(resque.queue("integration").size().await.unwrap(), 1);
    resque.clear_queue("integration").await.unwrap();
}
